use std::collections::BTreeSet;
use std::sync::Arc;

use futures::future::join_all;
use log::{debug, o, warn, Logger};

use crate::errors::StoreError;
use crate::marker::MarkerCodec;
use crate::store::TeamStore;
use crate::team::Team;

/// The result of trying to detach one tag from one team.
#[derive(Clone, Debug, PartialEq)]
pub struct DetachOutcome {
    pub team: String,
    pub tag: String,
    pub result: Result<(), StoreError>,
}

/// Every detach attempted by one batch, successful or not.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct DetachReport {
    pub outcomes: Vec<DetachOutcome>,
}

impl DetachReport {
    /// The distinct tags that were confirmed removed from at least one team.
    pub fn removed(&self) -> BTreeSet<String> {
        self.outcomes
            .iter()
            .filter(|o| o.result.is_ok())
            .map(|o| o.tag.clone())
            .collect()
    }

    /// The attempts the store refused.
    pub fn failed(&self) -> impl Iterator<Item = &DetachOutcome> {
        self.outcomes.iter().filter(|o| o.result.is_err())
    }

    pub fn is_complete(&self) -> bool {
        self.failed().next().is_none()
    }
}

/// The teams that raised a hand for one slot, each with its live tags for
/// that slot, oldest first.
#[derive(Clone, Debug, PartialEq)]
pub struct SlotHands {
    pub hour: u8,
    pub teams: Vec<(Team, Vec<String>)>,
}

/// Reads and changes hand-raise state through the team store.
pub struct Registry {
    markers: MarkerCodec,
    store: Arc<dyn TeamStore>,
    logger: Arc<Logger>,
}

impl Registry {
    pub fn new(markers: MarkerCodec, store: Arc<dyn TeamStore>, logger: Arc<Logger>) -> Self {
        Self {
            markers,
            store,
            logger,
        }
    }

    pub fn store(&self) -> &Arc<dyn TeamStore> {
        &self.store
    }

    pub fn has_raised_hand(&self, team: &Team, hour: u8) -> bool {
        team.tags.iter().any(|tag| self.markers.is_for_hour(tag, hour))
    }

    /// Attaches a fresh tag for `hour` to `team` and returns it. Callers
    /// must check `has_raised_hand` first.
    pub async fn raise_hand(&self, team: &Team, hour: u8) -> Result<String, StoreError> {
        let tag = self.markers.create(hour);

        self.store.attach(&team.id, &tag).await?;

        debug!(self.logger, "Raised hand"; "team" => &team.id, "hour" => hour, "tag" => &tag);

        Ok(tag)
    }

    /// Detaches every tag for `hour` from every team in `teams`.
    pub async fn lower_hands_for_hour(&self, teams: &[Team], hour: u8) -> DetachReport {
        let logger = self.logger.new(o!("hour" => hour));

        self.detach_matching(&logger, teams, |tag| self.markers.is_for_hour(tag, hour))
            .await
    }

    /// Detaches every valid tag, whatever its hour, from every team in
    /// `teams`.
    pub async fn lower_all_known_hands(&self, teams: &[Team]) -> DetachReport {
        let logger = self.logger.new(o!("hour" => "all"));

        self.detach_matching(&logger, teams, |tag| self.markers.is_valid(tag))
            .await
    }

    /// The teams in `teams` that currently carry a valid tag for `hour`.
    pub fn participants(&self, teams: &[Team], hour: u8) -> Vec<Team> {
        teams
            .iter()
            .filter(|team| self.has_raised_hand(team, hour))
            .cloned()
            .collect()
    }

    /// Groups the raised hands in `teams` by configured hour. Hours without
    /// any hands are left out.
    pub fn hand_list(&self, teams: &[Team]) -> Vec<SlotHands> {
        self.markers
            .hours()
            .iter()
            .filter_map(|hour| {
                let raised = teams
                    .iter()
                    .filter_map(|team| {
                        let mut tags = team
                            .tags
                            .iter()
                            .filter(|tag| self.markers.is_for_hour(tag, hour))
                            .cloned()
                            .collect::<Vec<_>>();

                        if tags.is_empty() {
                            return None;
                        }

                        tags.sort_by(|a, b| self.markers.compare_by_creation(a, b));
                        Some((team.clone(), tags))
                    })
                    .collect::<Vec<_>>();

                if raised.is_empty() {
                    None
                } else {
                    Some(SlotHands {
                        hour,
                        teams: raised,
                    })
                }
            })
            .collect()
    }

    async fn detach_matching(
        &self,
        logger: &Logger,
        teams: &[Team],
        matches: impl Fn(&str) -> bool,
    ) -> DetachReport {
        let mut targets = vec![];

        for team in teams {
            for tag in team.tags.iter().filter(|tag| matches(tag)) {
                targets.push((team.id.clone(), tag.clone()));
            }
        }

        let attempts = targets.into_iter().map(|(team, tag)| async move {
            let result = self.store.detach(&team, &tag).await;

            if let Err(e) = &result {
                warn!(logger, "Failed to detach tag"; "team" => &team, "tag" => &tag, "error" => %e);
            }

            DetachOutcome { team, tag, result }
        });

        let report = DetachReport {
            outcomes: join_all(attempts).await,
        };

        debug!(logger, "Lowered hands"; "attempted" => report.outcomes.len(), "removed" => report.removed().len());

        report
    }
}
