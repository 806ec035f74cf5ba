use std::collections::BTreeSet;

use serde::Deserialize;

/// A team as seen through the team store.
#[derive(Clone, Debug, Deserialize, PartialEq, Eq)]
pub struct Team {
    /// The stable identifier of the team.
    pub id: String,

    /// The display name.
    pub name: String,

    /// When the team was created, in Unix seconds.
    pub created_at: i64,

    /// Whether the team should be the first to sit out when the number
    /// of teams is odd.
    #[serde(default)]
    pub lowest_priority: bool,

    /// The opaque tags currently attached to the team.
    #[serde(default)]
    pub tags: BTreeSet<String>,
}

impl Team {
    pub fn new(id: impl Into<String>, name: impl Into<String>, created_at: i64) -> Self {
        Team {
            id: id.into(),
            name: name.into(),
            created_at,
            lowest_priority: false,
            tags: BTreeSet::new(),
        }
    }

    pub fn deprioritized(mut self) -> Self {
        self.lowest_priority = true;
        self
    }

    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.tags.insert(tag.into());
        self
    }
}
