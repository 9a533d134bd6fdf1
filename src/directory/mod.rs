use async_trait::async_trait;

use crate::model::person::{Person, PersonKind, PersonRef};
use crate::store::StoreResult;

pub mod memory;
pub mod mysql;

pub use memory::MemoryPersonDirectory;
pub use mysql::MySqlPersonDirectory;

/// Read access to learner and coach records owned by the user service.
#[async_trait]
pub trait PersonDirectory: Send + Sync {
    /// Maps a badge/QR identifier to the person carrying it.
    async fn resolve(&self, identifier: &str) -> StoreResult<Option<Person>>;

    async fn find(&self, person: PersonRef) -> StoreResult<Option<Person>>;

    async fn list(&self, kind: PersonKind, active_only: bool) -> StoreResult<Vec<Person>>;

    /// Every member of a group, active or not.
    async fn group_members(&self, kind: PersonKind, group_id: u64) -> StoreResult<Vec<Person>>;
}

/// Name to show in messages, falling back to the kind and id.
pub fn display_name(person: Option<&Person>, fallback: PersonRef) -> String {
    match person {
        Some(p) => p.display_name.clone(),
        None => match fallback.kind {
            PersonKind::Learner => format!("Learner #{}", fallback.id),
            PersonKind::Coach => format!("Coach #{}", fallback.id),
        },
    }
}
