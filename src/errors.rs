use thiserror::Error;

/// Enumerates the ways a ciphertext can fail to decode into a timestamp.
#[derive(Debug, Error, PartialEq)]
pub enum DecodeError {
    /// Represents input that is not lower- or upper-case hex.
    #[error("Ciphertext is not valid hex")]
    NotHex { source: hex::FromHexError },

    /// Represents a ciphertext that is empty, misaligned or badly padded.
    #[error("Ciphertext could not be decrypted")]
    Decryption,

    /// Represents a plaintext that is not UTF-8.
    #[error("Plaintext is not UTF-8")]
    NotUtf8,

    /// Represents a plaintext that is not a decimal integer.
    #[error("Plaintext {0:?} is not an integer")]
    NotInteger(String),
}

/// Enumerates errors returned by the team store.
#[derive(Clone, Debug, Error, PartialEq)]
pub enum StoreError {
    /// Represents a team ID that the store doesn't know.
    #[error("No team with ID {0}")]
    UnknownTeam(String),

    /// Represents a failure to attach a tag to a team.
    #[error("Could not attach {tag} to {team}: {reason}")]
    AttachFailed {
        team: String,
        tag: String,
        reason: String,
    },

    /// Represents a failure to detach a tag from a team.
    #[error("Could not detach {tag} from {team}: {reason}")]
    DetachFailed {
        team: String,
        tag: String,
        reason: String,
    },

    /// Represents a failure to read the team roster.
    #[error("Could not list teams: {0}")]
    ListFailed(String),
}

/// Enumerates errors returned by the match engine.
#[derive(Debug, Error, PartialEq)]
pub enum MatchError {
    /// Represents a slot with fewer than two participating teams.
    #[error("Need at least two participating teams, found {0}")]
    InsufficientParticipants(usize),

    /// Represents an odd number of teams left over after exclusion. This
    /// can only happen if the exclusion logic itself is broken.
    #[error("{0} teams left to pair after exclusion")]
    UnpairedRemainder(usize),
}

/// Enumerates errors returned while reading configuration.
#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    /// Represents a variable whose value couldn't be parsed.
    #[error("Could not parse {name}={value:?}")]
    Unparseable { name: &'static str, value: String },

    /// Represents a slot hour outside `0..=23`.
    #[error("Hour {0} is not between 0 and 23")]
    HourOutOfRange(i64),

    /// Represents an empty slot hour list.
    #[error("At least one slot hour must be configured")]
    NoSlotHours,

    /// Represents an empty tag prefix, which would make every string a
    /// candidate tag.
    #[error("Tag prefix must not be empty")]
    EmptyPrefix,

    /// Represents a tag prefix containing the separator.
    #[error("Tag prefix {0:?} must not contain '-'")]
    PrefixContainsSeparator(String),
}

/// Enumerates high-level errors returned by the bot's commands.
#[derive(Debug, Error, PartialEq)]
pub enum BotError {
    /// Represents an hour that isn't a configured slot.
    #[error("{0}:00 is not a recruitment slot")]
    UnknownHour(i64),

    /// Represents a team that isn't on the roster.
    #[error("Team {0} is not allowed to raise a hand")]
    UnknownTeam(String),

    /// Represents a hand raised outside the acceptance window.
    #[error("Hands for {0}:00 are not being accepted right now")]
    OutsideWindow(u8),

    /// Represents a hand raised twice for the same slot.
    #[error("Team {team} has already raised a hand for {hour}:00")]
    AlreadyRaised { team: String, hour: u8 },

    /// Represents an error from the team store.
    #[error("Team store error")]
    Store {
        #[from]
        source: StoreError,
    },

    /// Represents an error from the match engine.
    #[error("Matching failed")]
    Match {
        #[from]
        source: MatchError,
    },
}
