//! Pairing of the teams that raised a hand for a slot.

use std::fmt::Write;
use std::str::FromStr;

use rand::seq::SliceRandom;
use rand::Rng;

use crate::errors::{ConfigError, MatchError};
use crate::team::Team;

/// Which end of the creation-time ordering sits out when the number of
/// teams is odd.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ExclusionPolicy {
    /// The most recently created candidate sits out.
    Newest,

    /// The earliest created candidate sits out.
    Oldest,
}

impl Default for ExclusionPolicy {
    fn default() -> Self {
        ExclusionPolicy::Newest
    }
}

impl FromStr for ExclusionPolicy {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "newest" => Ok(ExclusionPolicy::Newest),
            "oldest" => Ok(ExclusionPolicy::Oldest),
            _ => Err(ConfigError::Unparseable {
                name: "HANDUP_EXCLUSION_POLICY",
                value: s.to_owned(),
            }),
        }
    }
}

/// The pairings for one slot.
#[derive(Clone, Debug, PartialEq)]
pub struct MatchResult {
    pub hour: u8,
    pub pairs: Vec<(Team, Team)>,
    pub excluded: Option<Team>,
}

impl MatchResult {
    /// Renders the pairings as a Markdown message. Teams flagged as lowest
    /// priority are suffixed with `label` in parentheses.
    pub fn describe(&self, label: &str) -> String {
        let name = |team: &Team| {
            if team.lowest_priority {
                format!("{} ({})", team.name, label)
            } else {
                team.name.clone()
            }
        };

        let mut message = format!("## Matches for {}:00\n", self.hour);

        for (a, b) in &self.pairs {
            let _ = writeln!(message, "- **{}** vs **{}**", name(a), name(b));
        }

        if let Some(team) = &self.excluded {
            let _ = writeln!(
                message,
                "**{}** sits out because the number of teams is odd",
                name(team)
            );
        }

        message
    }
}

/// Splits participating teams into matches.
#[derive(Clone, Copy, Debug, Default)]
pub struct MatchEngine {
    policy: ExclusionPolicy,
}

impl MatchEngine {
    pub fn new(policy: ExclusionPolicy) -> Self {
        Self { policy }
    }

    /// Pairs `teams` using the thread-local generator.
    pub fn pair_random(&self, hour: u8, teams: Vec<Team>) -> Result<MatchResult, MatchError> {
        self.pair(hour, teams, &mut rand::thread_rng())
    }

    /// Pairs `teams` for `hour`. Teams are identified by ID; duplicates are
    /// counted once.
    ///
    /// If the count is odd, one team sits out: a lowest-priority team if
    /// there is one, otherwise any team, chosen among those candidates by
    /// creation time according to the policy. The rest are shuffled with
    /// `rng` and paired off in order.
    pub fn pair<R: Rng + ?Sized>(
        &self,
        hour: u8,
        mut teams: Vec<Team>,
        rng: &mut R,
    ) -> Result<MatchResult, MatchError> {
        teams.sort_by(|a, b| a.id.cmp(&b.id));
        teams.dedup_by(|a, b| a.id == b.id);

        if teams.len() < 2 {
            return Err(MatchError::InsufficientParticipants(teams.len()));
        }

        let excluded = if teams.len() % 2 == 1 {
            self.pick_excluded(&teams).map(|i| teams.remove(i))
        } else {
            None
        };

        if teams.len() % 2 != 0 {
            return Err(MatchError::UnpairedRemainder(teams.len()));
        }

        teams.shuffle(rng);

        let mut pairs = Vec::with_capacity(teams.len() / 2);
        let mut remaining = teams.into_iter();

        while let (Some(a), Some(b)) = (remaining.next(), remaining.next()) {
            pairs.push((a, b));
        }

        Ok(MatchResult {
            hour,
            pairs,
            excluded,
        })
    }

    /// The index of the team that sits out.
    fn pick_excluded(&self, teams: &[Team]) -> Option<usize> {
        let any_deprioritized = teams.iter().any(|t| t.lowest_priority);

        let candidates = teams
            .iter()
            .enumerate()
            .filter(|(_, t)| t.lowest_priority || !any_deprioritized);

        // ties on creation time fall back to ID so the choice is stable
        let key = |(_, t): &(usize, &Team)| (t.created_at, t.id.clone());

        let chosen = match self.policy {
            ExclusionPolicy::Newest => candidates.max_by_key(key),
            ExclusionPolicy::Oldest => candidates.min_by_key(key),
        };

        chosen.map(|(i, _)| i)
    }
}
