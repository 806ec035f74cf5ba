use std::error::Error;
use std::sync::Arc;
use std::time::Duration;

use futures::future::FutureExt;
use tokio::sync::mpsc;
use warp::Filter;

use handup::announce::LogAnnouncer;
use handup::bot::Bot;
use handup::clock::{Clock, SystemClock};
use handup::config::get_variable;
use handup::environment::{Config, Environment};
use handup::routes;
use handup::routes::admin::TerminationFunctionWrapper;
use handup::store::MemoryStore;
use log::{debug, info, initialize_logger, o, warn};

const SCHEDULER_PERIOD: Duration = Duration::from_secs(30);

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    dotenv::dotenv().ok();

    let logger = initialize_logger();

    let main_port: u16 = get_variable("HANDUP_PORT")
        .parse()
        .expect("parse HANDUP_PORT as u16");
    let admin_port: u16 = get_variable("HANDUP_ADMIN_PORT")
        .parse()
        .expect("parse HANDUP_ADMIN_PORT as u16");

    info!(logger, "Starting..."; "main_port" => main_port, "admin_port" => admin_port);
    let logger = Arc::new(logger);

    let config = Config::from_env().expect("read configuration from environment");
    info!(logger, "Loaded configuration"; "slot_hours" => %config.slot_hours, "tag_prefix" => &config.tag_prefix, "exclusion_policy" => ?config.exclusion_policy);

    let teams_file = get_variable("HANDUP_TEAMS_FILE");
    let store = Arc::new(MemoryStore::from_file(&teams_file).expect("load teams from HANDUP_TEAMS_FILE"));

    let clock = Arc::new(SystemClock);
    let announcer = Arc::new(LogAnnouncer::new(logger.clone()));
    let bot = Arc::new(Bot::new(config, store, clock.clone(), announcer, logger.clone()));

    let environment = Environment::new(logger.clone(), bot.clone());

    let (termination_sender, mut termination_receiver) = mpsc::channel::<()>(1);

    let terminate: TerminationFunctionWrapper<'static> = Arc::new(move || {
        let termination_sender = termination_sender.clone();

        async move {
            let _ = termination_sender.send(()).await;
        }
        .boxed()
    });

    let should_terminate = async move {
        termination_receiver.recv().await;
    }
    .shared();

    let ctrlc = {
        let should_terminate = should_terminate.clone();
        let terminate = terminate.clone();

        let signal = tokio::signal::ctrl_c();

        async move {
            tokio::select! {
                _ = should_terminate => {},
                _ = signal => {
                    terminate().await;
                }
            }
        }
    };

    let scheduler = {
        let should_terminate = should_terminate.clone();
        let logger = logger.new(o!("component" => "scheduler"));

        async move {
            let mut interval = tokio::time::interval(SCHEDULER_PERIOD);
            let mut previous = clock.now();

            loop {
                tokio::select! {
                    _ = should_terminate.clone() => break,
                    _ = interval.tick() => {
                        let now = clock.now();

                        for (at, trigger) in bot.schedule().due(previous, now) {
                            debug!(logger, "Firing job"; "trigger" => ?trigger, "scheduled_for" => %at);

                            if let Err(e) = bot.fire(trigger).await {
                                warn!(logger, "Job failed"; "trigger" => ?trigger, "error" => ?e, "message" => %e);
                            }
                        }

                        previous = now;
                    }
                }
            }
        }
    };

    let main_server = {
        let should_terminate = should_terminate.clone();

        let logger2 = logger.clone();

        let routes = routes::make_public_routes(environment.clone())
            .recover(move |r| routes::format_rejection(logger2.clone(), r));

        let (_, main_server) =
            warp::serve(routes).bind_with_graceful_shutdown(([0, 0, 0, 0], main_port), async {
                should_terminate.await;
            });

        main_server
    };

    let admin_server = {
        let should_terminate = should_terminate.clone();
        let terminate = terminate.clone();

        let logger2 = logger.clone();

        let routes = routes::admin::make_healthz_route(environment.clone())
            .or(routes::admin::make_termination_route(
                environment.clone(),
                terminate,
            ))
            .or(routes::make_hand_list_route(environment.clone()))
            .or(routes::make_admin_handup_route(environment.clone()))
            .or(routes::make_admin_handdown_route(environment.clone()))
            .or(routes::make_all_handdown_route(environment.clone()))
            .or(routes::make_match_route(environment.clone()))
            .recover(move |r| routes::format_rejection(logger2.clone(), r));

        let (_, admin_server) =
            warp::serve(routes).bind_with_graceful_shutdown(([0, 0, 0, 0], admin_port), async {
                should_terminate.await;
            });

        admin_server
    };

    tokio::join!(ctrlc, scheduler, main_server, admin_server);

    info!(logger, "Exiting gracefully...");

    Ok(())
}
