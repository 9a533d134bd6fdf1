use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use derive_more::{Display, From};
use uuid::Uuid;

use crate::model::attendance::{
    AttendanceRecord, Justification, JustificationStatus, NewAttendance,
};
use crate::model::person::{PersonKind, PersonRef};

pub mod memory;
pub mod mysql;

pub use memory::MemoryAttendanceStore;
pub use mysql::MySqlAttendanceStore;

#[derive(Debug, Display, From)]
pub enum StoreError {
    #[display(fmt = "database error: {}", _0)]
    Database(sqlx::Error),

    #[display(fmt = "corrupt attendance row {}: {}", id, reason)]
    #[from(ignore)]
    Corrupt { id: String, reason: String },

    #[display(fmt = "{}", _0)]
    #[from(ignore)]
    Unavailable(String),
}

impl std::error::Error for StoreError {}

pub type StoreResult<T> = Result<T, StoreError>;

/// Outcome of an atomic create-if-absent.
#[derive(Debug, Clone, PartialEq)]
pub enum Insertion {
    Created(AttendanceRecord),
    /// A record already held the `(person, date)` key; nothing was written.
    Existing(AttendanceRecord),
}

/// Persistence over attendance records. Implementations guarantee at most one
/// record per `(person, date)`, enforced by the storage engine itself.
#[async_trait]
pub trait AttendanceStore: Send + Sync {
    /// Writes the record unless one already exists for the same person and
    /// day. The existence check and the write are a single atomic operation.
    async fn create_if_absent(&self, new: NewAttendance) -> StoreResult<Insertion>;

    async fn find_by_id(&self, id: Uuid) -> StoreResult<Option<AttendanceRecord>>;

    async fn find_by_person_and_date(
        &self,
        person: PersonRef,
        date: NaiveDate,
    ) -> StoreResult<Option<AttendanceRecord>>;

    /// Records of one kind with `from <= date <= to`.
    async fn query_range(
        &self,
        kind: PersonKind,
        from: NaiveDate,
        to: NaiveDate,
    ) -> StoreResult<Vec<AttendanceRecord>>;

    /// Stores the learner's evidence and sets the status to PENDING in one
    /// write, leaving the disposition comment as it was.
    /// Returns `None` when no learner record has this id.
    async fn submit_justification(
        &self,
        id: Uuid,
        text: Option<String>,
        document_url: Option<String>,
    ) -> StoreResult<Option<AttendanceRecord>>;

    /// Sets status and comment of a learner record. With `expected`, the write
    /// only happens while the stored status, text and document still equal
    /// it. Returns `None` when nothing matched.
    async fn set_disposition(
        &self,
        id: Uuid,
        expected: Option<&Justification>,
        status: JustificationStatus,
        comment: Option<String>,
    ) -> StoreResult<Option<AttendanceRecord>>;

    /// Sets `check_out` on a coach's record for `date` if it has an open
    /// check-in. Returns `None` when there is nothing to close.
    async fn close_check_in(
        &self,
        person: PersonRef,
        date: NaiveDate,
        at: DateTime<Utc>,
    ) -> StoreResult<Option<AttendanceRecord>>;

    /// Creates absence rows for `persons` on `date`, skipping any key that
    /// already has a record, and returns how many rows were written.
    ///
    /// The default goes row by row through `create_if_absent`; engines with a
    /// set-based conflict-skipping insert override it.
    async fn insert_absences(&self, date: NaiveDate, persons: &[PersonRef]) -> StoreResult<u64> {
        let results = futures::future::join_all(
            persons
                .iter()
                .map(|p| self.create_if_absent(NewAttendance::absent(*p, date))),
        )
        .await;

        let mut created = 0;
        let mut first_error = None;
        for result in results {
            match result {
                Ok(Insertion::Created(_)) => created += 1,
                Ok(Insertion::Existing(_)) => {}
                Err(e) => {
                    tracing::warn!(error = %e, %date, "Absence insert failed");
                    first_error.get_or_insert(e);
                }
            }
        }

        match first_error {
            Some(e) => {
                tracing::warn!(created, %date, "Absence batch stopped with partial progress");
                Err(e)
            }
            None => Ok(created),
        }
    }
}
