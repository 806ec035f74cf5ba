use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::io;
use std::path::Path;
use std::sync::RwLock;

use futures::future::{BoxFuture, FutureExt};

use crate::errors::StoreError;
use crate::store::TeamStore;
use crate::team::Team;

/// A store that keeps the roster in memory. Nothing survives a restart.
#[derive(Debug, Default)]
pub struct MemoryStore {
    teams: RwLock<BTreeMap<String, Team>>,
    failing_detaches: RwLock<BTreeSet<String>>,
}

impl MemoryStore {
    pub fn new(teams: impl IntoIterator<Item = Team>) -> Self {
        MemoryStore {
            teams: RwLock::new(teams.into_iter().map(|t| (t.id.clone(), t)).collect()),
            ..Default::default()
        }
    }

    /// Reads the roster from a JSON array of teams.
    pub fn from_file(path: impl AsRef<Path>) -> io::Result<Self> {
        let contents = fs::read_to_string(path)?;
        let teams: Vec<Team> = serde_json::from_str(&contents)?;

        Ok(Self::new(teams))
    }

    /// Makes every subsequent detach from `team` fail.
    pub fn fail_detaches_for(&self, team: impl Into<String>) {
        self.failing_detaches.write().unwrap().insert(team.into());
    }

    /// The tags currently attached to `team`, or `None` if it doesn't exist.
    pub fn tags_of(&self, team: &str) -> Option<BTreeSet<String>> {
        self.teams.read().unwrap().get(team).map(|t| t.tags.clone())
    }
}

impl TeamStore for MemoryStore {
    fn teams(&self) -> BoxFuture<Result<Vec<Team>, StoreError>> {
        async move { Ok(self.teams.read().unwrap().values().cloned().collect()) }.boxed()
    }

    fn team(&self, id: &str) -> BoxFuture<Result<Option<Team>, StoreError>> {
        let id = id.to_owned();

        async move { Ok(self.teams.read().unwrap().get(&id).cloned()) }.boxed()
    }

    fn attach(&self, team: &str, tag: &str) -> BoxFuture<Result<(), StoreError>> {
        let team = team.to_owned();
        let tag = tag.to_owned();

        async move {
            let mut teams = self.teams.write().unwrap();
            let entry = teams.get_mut(&team).ok_or(StoreError::UnknownTeam(team))?;
            entry.tags.insert(tag);

            Ok(())
        }
        .boxed()
    }

    fn detach(&self, team: &str, tag: &str) -> BoxFuture<Result<(), StoreError>> {
        let team = team.to_owned();
        let tag = tag.to_owned();

        async move {
            if self.failing_detaches.read().unwrap().contains(&team) {
                return Err(StoreError::DetachFailed {
                    team,
                    tag,
                    reason: "missing permissions".to_owned(),
                });
            }

            let mut teams = self.teams.write().unwrap();
            let entry = teams.get_mut(&team).ok_or(StoreError::UnknownTeam(team))?;
            entry.tags.remove(&tag);

            Ok(())
        }
        .boxed()
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    #[tokio::test]
    async fn attaches_and_detaches() {
        let store = MemoryStore::new(vec![Team::new("ut", "UT", 100)]);

        store.attach("ut", "time:a-b").await.unwrap();
        assert_eq!(store.tags_of("ut").unwrap().len(), 1);

        store.detach("ut", "time:a-b").await.unwrap();
        store.detach("ut", "time:a-b").await.unwrap();
        assert!(store.tags_of("ut").unwrap().is_empty());

        assert_eq!(
            store.attach("nobody", "time:a-b").await,
            Err(StoreError::UnknownTeam("nobody".to_owned()))
        );
    }

    #[tokio::test]
    async fn injected_failures_only_affect_detaches() {
        let store = MemoryStore::new(vec![Team::new("ut", "UT", 100)]);
        store.fail_detaches_for("ut");

        store.attach("ut", "time:a-b").await.unwrap();
        assert!(matches!(
            store.detach("ut", "time:a-b").await,
            Err(StoreError::DetachFailed { .. })
        ));
        assert_eq!(store.tags_of("ut").unwrap().len(), 1);
    }

    #[tokio::test]
    async fn loads_roster_from_json() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"[
                {{"id": "ut", "name": "UT", "created_at": 100}},
                {{"id": "hu", "name": "HU", "created_at": 200, "lowest_priority": true, "tags": ["KMU"]}}
            ]"#
        )
        .unwrap();

        let store = MemoryStore::from_file(file.path()).unwrap();
        let teams = store.teams().await.unwrap();

        assert_eq!(teams.len(), 2);
        let hu = store.team("hu").await.unwrap().unwrap();
        assert!(hu.lowest_priority);
        assert!(hu.tags.contains("KMU"));
        assert_eq!(store.team("kmu").await.unwrap(), None);
    }
}
