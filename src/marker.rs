//! Marker tags: the strings attached to a team to say "this team raised
//! its hand for slot H at time T".
//!
//! A tag is `prefix + encode(now) + "-" + fingerprint(hour)`. Neither the
//! hex ciphertext nor the hex fingerprint can contain `-`, so the first
//! `-` after the prefix always separates the two parts.

use std::cmp::Ordering;
use std::sync::Arc;

use log::Logger;

use crate::clock::Clock;
use crate::fingerprint::{fingerprint, SlotHours};
use crate::timestamp;

pub const SEPARATOR: char = '-';

/// The raw halves of a tag, before either is validated.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct MarkerParts<'a> {
    pub timestamp: &'a str,
    pub fingerprint: &'a str,
}

/// A validated tag.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Marker {
    /// When the hand was raised, in Unix seconds.
    pub created_at: u64,

    /// The slot the hand was raised for.
    pub hour: u8,
}

/// Creates and interprets marker tags for one configuration.
///
/// Validity is recomputed against the configured hours on every call, so
/// a tag for an hour that has since been removed from the configuration
/// is no longer valid.
#[derive(Clone)]
pub struct MarkerCodec {
    prefix: String,
    hours: SlotHours,
    clock: Arc<dyn Clock>,
    logger: Arc<Logger>,
}

impl MarkerCodec {
    pub fn new(
        prefix: impl Into<String>,
        hours: SlotHours,
        clock: Arc<dyn Clock>,
        logger: Arc<Logger>,
    ) -> Self {
        Self {
            prefix: prefix.into(),
            hours,
            clock,
            logger,
        }
    }

    pub fn hours(&self) -> &SlotHours {
        &self.hours
    }

    /// Builds a new tag for `hour`, stamped with the current time.
    pub fn create(&self, hour: u8) -> String {
        format!(
            "{}{}{}{}",
            self.prefix,
            timestamp::encode(self.clock.unix_seconds()),
            SEPARATOR,
            fingerprint(hour)
        )
    }

    /// Splits `tag` into its timestamp and fingerprint parts. Returns
    /// `None` if the prefix or the separator is missing.
    pub fn parse<'a>(&self, tag: &'a str) -> Option<MarkerParts<'a>> {
        let rest = tag.strip_prefix(self.prefix.as_str())?;
        let (timestamp, fingerprint) = rest.split_once(SEPARATOR)?;

        Some(MarkerParts {
            timestamp,
            fingerprint,
        })
    }

    /// Validates `tag` and recovers what it says.
    pub fn decode(&self, tag: &str) -> Option<Marker> {
        let parts = self.parse(tag)?;
        let created_at = timestamp::decode_or_invalid(parts.timestamp, &self.logger)?;
        let hour = self.hours.hour_of(parts.fingerprint)?;

        Some(Marker { created_at, hour })
    }

    /// Whether `tag` carries a decodable timestamp and the fingerprint of a
    /// configured hour.
    pub fn is_valid(&self, tag: &str) -> bool {
        self.decode(tag).is_some()
    }

    pub fn is_for_hour(&self, tag: &str, hour: u8) -> bool {
        self.decode(tag).map(|m| m.hour == hour).unwrap_or(false)
    }

    /// The time the tag was created, if the tag is valid.
    pub fn creation_time(&self, tag: &str) -> Option<u64> {
        self.decode(tag).map(|m| m.created_at)
    }

    pub fn hour_of(&self, tag: &str) -> Option<u8> {
        self.decode(tag).map(|m| m.hour)
    }

    /// Orders tags oldest first. Invalid tags sort after every valid one.
    pub fn compare_by_creation(&self, a: &str, b: &str) -> Ordering {
        match (self.creation_time(a), self.creation_time(b)) {
            (Some(a), Some(b)) => a.cmp(&b),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => a.cmp(b),
        }
    }
}
