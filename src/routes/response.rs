use serde::Serialize;

use crate::matching::MatchResult;
use crate::registry::{DetachReport, SlotHands};
use crate::team::Team;

#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum SuccessResponse<'a> {
    Hands {
        slots: Vec<SlotView>,
    },
    Healthz {
        revision: Option<&'a str>,
        timestamp: Option<&'a str>,
        version: &'a str,
    },
    Lowered {
        removed: Vec<String>,
        failed: Vec<FailedDetach>,
    },
    Match {
        hour: u8,
        pairs: Vec<(TeamView, TeamView)>,
        excluded: Option<TeamView>,
        description: String,
    },
    Raised {
        team: String,
        hour: i64,
        tag: String,
    },
}

impl<'a> SuccessResponse<'a> {
    pub fn hands(slots: Vec<SlotHands>) -> Self {
        SuccessResponse::Hands {
            slots: slots.into_iter().map(SlotView::from).collect(),
        }
    }

    pub fn lowered(report: &DetachReport) -> Self {
        SuccessResponse::Lowered {
            removed: report.removed().into_iter().collect(),
            failed: report
                .failed()
                .map(|o| FailedDetach {
                    team: o.team.clone(),
                    tag: o.tag.clone(),
                    message: o
                        .result
                        .as_ref()
                        .err()
                        .map(|e| e.to_string())
                        .unwrap_or_default(),
                })
                .collect(),
        }
    }

    pub fn matched(result: MatchResult, label: &str) -> Self {
        let description = result.describe(label);

        SuccessResponse::Match {
            hour: result.hour,
            pairs: result
                .pairs
                .into_iter()
                .map(|(a, b)| (TeamView::from(a), TeamView::from(b)))
                .collect(),
            excluded: result.excluded.map(TeamView::from),
            description,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct SlotView {
    hour: u8,
    teams: Vec<RaisedView>,
}

impl From<SlotHands> for SlotView {
    fn from(slot: SlotHands) -> Self {
        SlotView {
            hour: slot.hour,
            teams: slot
                .teams
                .into_iter()
                .map(|(team, tags)| RaisedView {
                    team: TeamView::from(team),
                    tags,
                })
                .collect(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct RaisedView {
    #[serde(flatten)]
    team: TeamView,
    tags: Vec<String>,
}

/// A team without its tags.
#[derive(Debug, Serialize)]
pub struct TeamView {
    id: String,
    name: String,
    lowest_priority: bool,
}

impl From<Team> for TeamView {
    fn from(team: Team) -> Self {
        TeamView {
            id: team.id,
            name: team.name,
            lowest_priority: team.lowest_priority,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct FailedDetach {
    team: String,
    tag: String,
    message: String,
}
