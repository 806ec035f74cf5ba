use serde::Serialize;
use warp::reject;

use crate::errors::BotError;

#[derive(Debug)]
pub struct Rejection {
    pub(crate) context: Context,
    pub(crate) error: BotError,
}

impl Rejection {
    pub fn new(context: Context, error: BotError) -> Self {
        Rejection { context, error }
    }

    pub fn flatten(&self) -> FlattenedRejection {
        FlattenedRejection {
            context: self.context.clone(),
            message: format!("{}", self.error),
        }
    }
}

impl reject::Reject for Rejection {}

#[derive(Debug, Serialize)]
pub struct FlattenedRejection {
    #[serde(flatten)]
    pub(crate) context: Context,
    pub(crate) message: String,
}

#[derive(Clone, Debug, Serialize)]
#[serde(untagged)]
pub enum Context {
    AllHanddown,
    HandList,
    Hand { team: String, hour: i64 },
    Match { hour: i64 },
}

impl Context {
    pub fn all_handdown() -> Context {
        Context::AllHanddown
    }

    pub fn hand_list() -> Context {
        Context::HandList
    }

    pub fn hand(team: String, hour: i64) -> Context {
        Context::Hand { team, hour }
    }

    pub fn match_slot(hour: i64) -> Context {
        Context::Match { hour }
    }
}
