use std::collections::HashSet;
use std::sync::Arc;

use chrono::NaiveDate;
use serde::Serialize;
use tracing::{error, info, instrument};

use crate::directory::PersonDirectory;
use crate::error::AttendanceError;
use crate::model::person::{Person, PersonKind, PersonRef};
use crate::store::AttendanceStore;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SweepReport {
    pub date: NaiveDate,
    pub learners: u64,
    pub coaches: u64,
}

impl SweepReport {
    pub fn created(&self) -> u64 {
        self.learners + self.coaches
    }
}

/// Materializes absence records for everyone who did not scan on a day.
/// Safe to re-run: existing records are skipped, never duplicated.
pub struct AbsenteeSweeper {
    store: Arc<dyn AttendanceStore>,
    directory: Arc<dyn PersonDirectory>,
}

impl AbsenteeSweeper {
    pub fn new(store: Arc<dyn AttendanceStore>, directory: Arc<dyn PersonDirectory>) -> Self {
        Self { store, directory }
    }

    /// Active learners and all coaches without a record for `as_of` get one
    /// marked absent. Rows written before a failure are kept.
    #[instrument(name = "absentee_sweep", skip(self))]
    pub async fn sweep(&self, as_of: NaiveDate) -> Result<SweepReport, AttendanceError> {
        let learners = self.sweep_kind(PersonKind::Learner, as_of, true).await;
        let coaches = self.sweep_kind(PersonKind::Coach, as_of, false).await;

        match (learners, coaches) {
            (Ok(learners), Ok(coaches)) => {
                let report = SweepReport {
                    date: as_of,
                    learners,
                    coaches,
                };
                info!(created = report.created(), learners, coaches, "Absentee sweep complete");
                Ok(report)
            }
            (Err(e), _) | (_, Err(e)) => {
                error!(error = %e, %as_of, "Absentee sweep failed; a re-run will resume it");
                Err(e)
            }
        }
    }

    async fn sweep_kind(
        &self,
        kind: PersonKind,
        date: NaiveDate,
        active_only: bool,
    ) -> Result<u64, AttendanceError> {
        let persons = self.directory.list(kind, active_only).await?;
        let seen: HashSet<u64> = self
            .store
            .query_range(kind, date, date)
            .await?
            .into_iter()
            .map(|r| r.person_id)
            .collect();

        let missing: Vec<PersonRef> = persons
            .iter()
            .filter(|p| !seen.contains(&p.id))
            .map(Person::person_ref)
            .collect();
        if missing.is_empty() {
            return Ok(0);
        }

        let created = self.store.insert_absences(date, &missing).await?;
        info!(%kind, %date, missing = missing.len(), created, "Absences recorded");
        Ok(created)
    }
}
