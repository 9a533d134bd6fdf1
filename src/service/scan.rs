use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{info, instrument};

use crate::directory::{PersonDirectory, display_name};
use crate::error::AttendanceError;
use crate::model::attendance::{AttendanceRecord, NewAttendance};
use crate::model::person::{Person, PersonKind, PersonRef};
use crate::store::{AttendanceStore, Insertion};
use crate::utils::calendar::FacilityClock;

/// Turns scan events into attendance records, one per person per day.
pub struct ScanProcessor {
    store: Arc<dyn AttendanceStore>,
    directory: Arc<dyn PersonDirectory>,
    clock: FacilityClock,
}

impl ScanProcessor {
    pub fn new(
        store: Arc<dyn AttendanceStore>,
        directory: Arc<dyn PersonDirectory>,
        clock: FacilityClock,
    ) -> Self {
        Self {
            store,
            directory,
            clock,
        }
    }

    pub async fn resolve(&self, identifier: &str) -> Result<Person, AttendanceError> {
        self.directory
            .resolve(identifier)
            .await?
            .ok_or_else(|| AttendanceError::NotFound(format!("Unknown badge {}", identifier)))
    }

    /// Resolves a badge and records the scan.
    #[instrument(name = "scan_badge", skip(self, at))]
    pub async fn scan_badge(
        &self,
        identifier: &str,
        at: DateTime<Utc>,
    ) -> Result<AttendanceRecord, AttendanceError> {
        let person = self.resolve(identifier).await?;
        self.scan_person(&person, at).await
    }

    /// Same as `scan` for an already resolved person.
    pub async fn scan_person(
        &self,
        person: &Person,
        at: DateTime<Utc>,
    ) -> Result<AttendanceRecord, AttendanceError> {
        self.record_scan(person.person_ref(), Some(person), at).await
    }

    /// Records a scan for `person` at `at`. The first scan of the day creates
    /// the record; any later scan fails with `DuplicateScan`.
    pub async fn scan(
        &self,
        person: PersonRef,
        at: DateTime<Utc>,
    ) -> Result<AttendanceRecord, AttendanceError> {
        self.record_scan(person, None, at).await
    }

    async fn record_scan(
        &self,
        person: PersonRef,
        known: Option<&Person>,
        at: DateTime<Utc>,
    ) -> Result<AttendanceRecord, AttendanceError> {
        let date = self.clock.day_of(at);
        let is_late = self.clock.is_late(at);

        match self
            .store
            .create_if_absent(NewAttendance::scanned(person, date, at, is_late))
            .await?
        {
            Insertion::Created(record) => {
                info!(
                    person_id = person.id,
                    kind = %person.kind,
                    %date,
                    is_late,
                    "Scan recorded"
                );
                Ok(record)
            }
            Insertion::Existing(existing) => {
                let who = match known {
                    Some(p) => p.display_name.clone(),
                    None => {
                        let found = self.directory.find(person).await.ok().flatten();
                        display_name(found.as_ref(), person)
                    }
                };
                // a sweeper row has no scan time; its creation time stands in
                let first = existing.scanned_at().unwrap_or(existing.created_at);
                info!(person_id = person.id, %date, "Duplicate scan rejected");
                Err(AttendanceError::duplicate_scan(
                    who,
                    self.clock.time_of(first),
                ))
            }
        }
    }

    /// Closes a coach's open check-in for the day of `at`.
    pub async fn check_out(
        &self,
        person: PersonRef,
        at: DateTime<Utc>,
    ) -> Result<AttendanceRecord, AttendanceError> {
        if person.kind != PersonKind::Coach {
            return Err(AttendanceError::InvalidTransition(
                "Only coaches check out".into(),
            ));
        }

        let date = self.clock.day_of(at);
        match self.store.close_check_in(person, date, at).await? {
            Some(record) => {
                info!(person_id = person.id, %date, "Check-out recorded");
                Ok(record)
            }
            None => Err(AttendanceError::NotFound(
                "No active check-in found for today".into(),
            )),
        }
    }

    #[instrument(name = "check_out_badge", skip(self, at))]
    pub async fn check_out_badge(
        &self,
        identifier: &str,
        at: DateTime<Utc>,
    ) -> Result<AttendanceRecord, AttendanceError> {
        let person = self.resolve(identifier).await?;
        self.check_out(person.person_ref(), at).await
    }
}
