use std::env;
use std::sync::Arc;

use log::Logger;
use time::UtcOffset;

use crate::bot::Bot;
use crate::config::{parse_hours, parse_or};
use crate::errors::ConfigError;
use crate::fingerprint::SlotHours;
use crate::matching::ExclusionPolicy;
use crate::schedule::TimeOfDay;

/// Everything a route handler needs.
#[derive(Clone)]
pub struct Environment {
    pub logger: Arc<Logger>,
    pub bot: Arc<Bot>,
}

impl Environment {
    pub fn new(logger: Arc<Logger>, bot: Arc<Bot>) -> Self {
        Self { logger, bot }
    }
}

/// Settings fixed for the lifetime of the process.
#[derive(Clone, Debug, PartialEq)]
pub struct Config {
    /// The hours hands can be raised for.
    pub slot_hours: SlotHours,

    /// The prefix every marker tag starts with.
    pub tag_prefix: String,

    /// When the daily sweep runs and recruitment opens.
    pub recruitment: TimeOfDay,

    /// How many minutes before a slot hands close and matching runs.
    pub close_minutes: u8,

    /// The offset of the local time zone from UTC.
    pub utc_offset: UtcOffset,

    /// Which team sits out when the count is odd.
    pub exclusion_policy: ExclusionPolicy,

    /// Shown next to lowest-priority teams in announcements.
    pub deprioritized_label: String,
}

impl Default for Config {
    fn default() -> Self {
        Self::from_lookup(|_| None).expect("default configuration is valid")
    }
}

impl Config {
    /// Reads the configuration from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let slot_hours = match lookup("HANDUP_SLOT_HOURS") {
            Some(value) => parse_hours("HANDUP_SLOT_HOURS", &value)?,
            None => SlotHours::new(vec![19, 20, 21, 22, 23])?,
        };

        let tag_prefix = lookup("HANDUP_TAG_PREFIX").unwrap_or_else(|| "time:".to_owned());
        if tag_prefix.is_empty() {
            return Err(ConfigError::EmptyPrefix);
        }
        if tag_prefix.contains(crate::marker::SEPARATOR) {
            return Err(ConfigError::PrefixContainsSeparator(tag_prefix));
        }

        let recruitment = TimeOfDay {
            hour: bounded(&lookup, "HANDUP_RECRUITMENT_HOUR", 12, 0, 23)?,
            minute: bounded(&lookup, "HANDUP_RECRUITMENT_MINUTE", 38, 0, 59)?,
        };

        let close_minutes = bounded(&lookup, "HANDUP_CLOSE_MINUTES", 13, 1, 60)?;

        let offset_hours: i8 = parse_or(&lookup, "HANDUP_UTC_OFFSET_HOURS", 9)?;
        let utc_offset =
            UtcOffset::from_hms(offset_hours, 0, 0).map_err(|_| ConfigError::Unparseable {
                name: "HANDUP_UTC_OFFSET_HOURS",
                value: offset_hours.to_string(),
            })?;

        let exclusion_policy = parse_or(&lookup, "HANDUP_EXCLUSION_POLICY", ExclusionPolicy::default())?;

        let deprioritized_label =
            lookup("HANDUP_DEPRIORITIZED_LABEL").unwrap_or_else(|| "fewest matches".to_owned());

        Ok(Config {
            slot_hours,
            tag_prefix,
            recruitment,
            close_minutes,
            utc_offset,
            exclusion_policy,
            deprioritized_label,
        })
    }
}

fn bounded(
    lookup: &impl Fn(&str) -> Option<String>,
    name: &'static str,
    default: u8,
    min: u8,
    max: u8,
) -> Result<u8, ConfigError> {
    let value = parse_or(lookup, name, default)?;

    if value < min || value > max {
        return Err(ConfigError::Unparseable {
            name,
            value: value.to_string(),
        });
    }

    Ok(value)
}
