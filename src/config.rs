use std::env;
use std::str::FromStr;

use crate::errors::ConfigError;
use crate::fingerprint::SlotHours;

/// Returns the value of the named environment variable if it exists or panics.
pub fn get_variable(name: &str) -> String {
    env::var(name).unwrap_or_else(|_| panic!("must define {} environment variable", name))
}

/// Parses the variable `name` as looked up by `lookup`, falling back to
/// `default` if it isn't set.
pub fn parse_or<T: FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    name: &'static str,
    default: T,
) -> Result<T, ConfigError> {
    match lookup(name) {
        None => Ok(default),
        Some(value) => value
            .trim()
            .parse()
            .map_err(|_| ConfigError::Unparseable { name, value }),
    }
}

/// Parses a comma-separated list of hours such as `19,20,21`.
pub fn parse_hours(name: &'static str, value: &str) -> Result<SlotHours, ConfigError> {
    let hours = value
        .split(',')
        .map(str::trim)
        .filter(|h| !h.is_empty())
        .map(|h| {
            h.parse::<i64>().map_err(|_| ConfigError::Unparseable {
                name,
                value: value.to_owned(),
            })
        })
        .collect::<Result<Vec<_>, _>>()?;

    SlotHours::new(hours)
}
