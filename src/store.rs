use futures::future::BoxFuture;

use crate::errors::StoreError;
use crate::team::Team;

pub mod memory;

pub use memory::MemoryStore;

/// The membership system that owns teams and their tags. Every call may
/// fail independently of the others.
pub trait TeamStore: Send + Sync {
    /// Lists every team on the roster.
    fn teams(&self) -> BoxFuture<Result<Vec<Team>, StoreError>>;

    /// Looks up a single team.
    fn team(&self, id: &str) -> BoxFuture<Result<Option<Team>, StoreError>>;

    /// Attaches `tag` to the given team.
    fn attach(&self, team: &str, tag: &str) -> BoxFuture<Result<(), StoreError>>;

    /// Detaches `tag` from the given team. Detaching a tag the team doesn't
    /// carry succeeds.
    fn detach(&self, team: &str, tag: &str) -> BoxFuture<Result<(), StoreError>>;
}
