use std::error::Error;
use std::sync::Arc;

use dotenv::dotenv;
use structopt::StructOpt;

use handup::clock::SystemClock;
use handup::environment::Config;
use handup::fingerprint::fingerprint;
use handup::marker::MarkerCodec;
use handup::timestamp;
use log::{debug, info, initialize_logger, o};

#[derive(Debug, StructOpt)]
#[structopt(
    name = "fingerprints",
    about = "Print slot fingerprints and explain existing marker tags"
)]
struct Opt {
    /// Print the fingerprint of every configured slot hour
    #[structopt(short, long)]
    hours: bool,

    /// Marker tags to decode
    tags: Vec<String>,
}

fn main() -> Result<(), Box<dyn Error>> {
    dotenv().ok();

    let opt = Opt::from_args();

    let logger = Arc::new(initialize_logger());

    let config = Config::from_env()?;
    let markers = MarkerCodec::new(
        config.tag_prefix.clone(),
        config.slot_hours.clone(),
        Arc::new(SystemClock),
        logger.clone(),
    );

    if opt.hours {
        info!(logger, "Listing fingerprints"; "slot_hours" => %config.slot_hours);

        for hour in config.slot_hours.iter() {
            println!("{:>2}:00\t{}", hour, fingerprint(hour));
        }
    }

    for tag in &opt.tags {
        let logger = logger.new(o!("tag" => tag.clone()));
        debug!(logger, "Decoding tag...");

        match markers.parse(tag) {
            None => println!("{}\tnot a marker", tag),
            Some(parts) => {
                let created_at = timestamp::decode(parts.timestamp);
                let hour = config.slot_hours.hour_of(parts.fingerprint);

                match (created_at, hour) {
                    (Ok(created_at), Some(hour)) => {
                        println!("{}\t{}:00\tcreated at {}", tag, hour, created_at)
                    }
                    (Err(e), _) => println!("{}\tbad timestamp: {}", tag, e),
                    (_, None) => println!("{}\tunknown slot", tag),
                }
            }
        }
    }

    Ok(())
}
