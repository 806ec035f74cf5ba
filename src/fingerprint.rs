use std::collections::BTreeSet;
use std::convert::TryFrom;
use std::fmt;

use sha2::{Digest, Sha256};

use crate::errors::ConfigError;

/// The number of hex characters of the digest that make up a fingerprint.
pub const FINGERPRINT_LENGTH: usize = 32;

/// Returns the fingerprint of `hour`: the SHA-256 digest of its decimal
/// representation, hex-encoded and cut to the first 32 characters.
///
/// ```
/// use handup::fingerprint::fingerprint;
/// assert_eq!(fingerprint(19), "9400f1b21cb527d7fa3d3eabba93557a");
/// ```
pub fn fingerprint(hour: u8) -> String {
    let digest = Sha256::digest(hour.to_string().as_bytes());
    let mut encoded = hex::encode(digest);
    encoded.truncate(FINGERPRINT_LENGTH);
    encoded
}

/// The hours for which hands may be raised. Never empty, every member in
/// `0..=23`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SlotHours(BTreeSet<u8>);

impl SlotHours {
    pub fn new(hours: impl IntoIterator<Item = i64>) -> Result<Self, ConfigError> {
        let hours = hours
            .into_iter()
            .map(|h| u8::try_from(h).ok().filter(|h| *h < 24).ok_or(ConfigError::HourOutOfRange(h)))
            .collect::<Result<BTreeSet<_>, _>>()?;

        if hours.is_empty() {
            return Err(ConfigError::NoSlotHours);
        }

        Ok(SlotHours(hours))
    }

    pub fn contains(&self, hour: i64) -> bool {
        u8::try_from(hour)
            .map(|h| self.0.contains(&h))
            .unwrap_or(false)
    }

    /// Iterates over the hours in ascending order.
    pub fn iter(&self) -> impl Iterator<Item = u8> + '_ {
        self.0.iter().copied()
    }

    /// Whether `candidate` is the fingerprint of any configured hour.
    pub fn is_known_fingerprint(&self, candidate: &str) -> bool {
        self.hour_of(candidate).is_some()
    }

    /// Recovers the configured hour whose fingerprint is `candidate`.
    pub fn hour_of(&self, candidate: &str) -> Option<u8> {
        if candidate.len() != FINGERPRINT_LENGTH {
            return None;
        }

        self.iter().find(|hour| fingerprint(*hour) == candidate)
    }
}

impl fmt::Display for SlotHours {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let hours = self.iter().map(|h| h.to_string()).collect::<Vec<_>>();
        write!(f, "{}", hours.join(","))
    }
}
