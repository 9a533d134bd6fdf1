use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use uuid::Uuid;

use super::{AttendanceStore, Insertion, StoreError, StoreResult};
use crate::model::attendance::{
    AttendanceDetail, AttendanceRecord, Justification, JustificationStatus, NewAttendance,
};
use crate::model::person::{PersonKind, PersonRef};

#[derive(Default)]
struct State {
    records: HashMap<Uuid, AttendanceRecord>,
    by_day: HashMap<(PersonRef, NaiveDate), Uuid>,
}

/// Process-local store. The `(person, date)` index is checked and written
/// under one lock, which gives the same guarantee as a unique key.
#[derive(Default)]
pub struct MemoryAttendanceStore {
    state: Mutex<State>,
    offline: AtomicBool,
}

impl MemoryAttendanceStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every operation fail as if the backing storage were down.
    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    pub fn len(&self) -> usize {
        self.lock().map(|s| s.records.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lock(&self) -> StoreResult<MutexGuard<'_, State>> {
        if self.offline.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("attendance storage is offline".into()));
        }
        self.state
            .lock()
            .map_err(|_| StoreError::Unavailable("attendance store lock poisoned".into()))
    }
}

#[async_trait]
impl AttendanceStore for MemoryAttendanceStore {
    async fn create_if_absent(&self, new: NewAttendance) -> StoreResult<Insertion> {
        let mut state = self.lock()?;
        let key = (new.person, new.date);

        if let Some(existing) = state.by_day.get(&key).and_then(|id| state.records.get(id)) {
            return Ok(Insertion::Existing(existing.clone()));
        }

        let record = new.into_record(Utc::now());
        state.by_day.insert(key, record.id);
        state.records.insert(record.id, record.clone());
        Ok(Insertion::Created(record))
    }

    async fn find_by_id(&self, id: Uuid) -> StoreResult<Option<AttendanceRecord>> {
        Ok(self.lock()?.records.get(&id).cloned())
    }

    async fn find_by_person_and_date(
        &self,
        person: PersonRef,
        date: NaiveDate,
    ) -> StoreResult<Option<AttendanceRecord>> {
        let state = self.lock()?;
        Ok(state
            .by_day
            .get(&(person, date))
            .and_then(|id| state.records.get(id))
            .cloned())
    }

    async fn query_range(
        &self,
        kind: PersonKind,
        from: NaiveDate,
        to: NaiveDate,
    ) -> StoreResult<Vec<AttendanceRecord>> {
        let state = self.lock()?;
        let mut records: Vec<AttendanceRecord> = state
            .records
            .values()
            .filter(|r| r.detail.kind() == kind && r.date >= from && r.date <= to)
            .cloned()
            .collect();
        records.sort_by_key(|r| (r.date, r.person_id));
        Ok(records)
    }

    async fn submit_justification(
        &self,
        id: Uuid,
        text: Option<String>,
        document_url: Option<String>,
    ) -> StoreResult<Option<AttendanceRecord>> {
        let mut state = self.lock()?;
        let Some(record) = state.records.get_mut(&id) else {
            return Ok(None);
        };
        let Some(justification) = record.justification_mut() else {
            return Ok(None);
        };

        justification.text = text;
        justification.document_url = document_url;
        justification.status = JustificationStatus::Pending;
        record.updated_at = Utc::now();
        Ok(Some(record.clone()))
    }

    async fn set_disposition(
        &self,
        id: Uuid,
        expected: Option<&Justification>,
        status: JustificationStatus,
        comment: Option<String>,
    ) -> StoreResult<Option<AttendanceRecord>> {
        let mut state = self.lock()?;
        let Some(record) = state.records.get_mut(&id) else {
            return Ok(None);
        };
        let Some(justification) = record.justification_mut() else {
            return Ok(None);
        };
        if expected.is_some_and(|e| !justification.same_submission(e)) {
            return Ok(None);
        }

        justification.status = status;
        justification.comment = comment;
        record.updated_at = Utc::now();
        Ok(Some(record.clone()))
    }

    async fn close_check_in(
        &self,
        person: PersonRef,
        date: NaiveDate,
        at: DateTime<Utc>,
    ) -> StoreResult<Option<AttendanceRecord>> {
        let mut state = self.lock()?;
        let Some(id) = state.by_day.get(&(person, date)).copied() else {
            return Ok(None);
        };
        let Some(record) = state.records.get_mut(&id) else {
            return Ok(None);
        };

        match &mut record.detail {
            AttendanceDetail::Coach {
                check_in: Some(_),
                check_out,
            } if check_out.is_none() => {
                *check_out = Some(at);
                record.updated_at = Utc::now();
                Ok(Some(record.clone()))
            }
            _ => Ok(None),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 3, 2).unwrap()
    }

    #[actix_web::test]
    async fn second_insert_for_same_day_returns_existing() {
        let store = MemoryAttendanceStore::new();
        let learner = PersonRef::learner(1);

        let first = store
            .create_if_absent(NewAttendance::absent(learner, day()))
            .await
            .unwrap();
        let second = store
            .create_if_absent(NewAttendance::absent(learner, day()))
            .await
            .unwrap();

        let Insertion::Created(created) = first else {
            panic!("first insert should create");
        };
        assert_eq!(second, Insertion::Existing(created));
        assert_eq!(store.len(), 1);
    }

    #[actix_web::test]
    async fn same_id_different_kind_is_a_different_key() {
        let store = MemoryAttendanceStore::new();
        store
            .create_if_absent(NewAttendance::absent(PersonRef::learner(5), day()))
            .await
            .unwrap();
        let coach = store
            .create_if_absent(NewAttendance::absent(PersonRef::coach(5), day()))
            .await
            .unwrap();

        assert!(matches!(coach, Insertion::Created(_)));
        assert_eq!(
            store
                .query_range(PersonKind::Coach, day(), day())
                .await
                .unwrap()
                .len(),
            1
        );
    }

    #[actix_web::test]
    async fn offline_store_fails_every_call() {
        let store = MemoryAttendanceStore::new();
        store.set_offline(true);
        let err = store.find_by_id(Uuid::new_v4()).await.unwrap_err();
        assert!(matches!(err, StoreError::Unavailable(_)));
    }

    #[actix_web::test]
    async fn stale_disposition_is_not_applied() {
        let store = MemoryAttendanceStore::new();
        let Insertion::Created(record) = store
            .create_if_absent(NewAttendance::absent(PersonRef::learner(1), day()))
            .await
            .unwrap()
        else {
            panic!("first insert should create");
        };
        let seen = record.justification().cloned().unwrap();

        store
            .submit_justification(record.id, Some("sick".into()), None)
            .await
            .unwrap()
            .unwrap();
        let stale = store
            .set_disposition(record.id, Some(&seen), JustificationStatus::Approved, None)
            .await
            .unwrap();
        assert!(stale.is_none());

        let stored = store.find_by_id(record.id).await.unwrap().unwrap();
        let justification = stored.justification().unwrap();
        assert_eq!(justification.status, JustificationStatus::Pending);
        assert_eq!(justification.text.as_deref(), Some("sick"));
    }

    #[actix_web::test]
    async fn default_absence_batch_skips_existing_rows() {
        let store = MemoryAttendanceStore::new();
        let people = [PersonRef::learner(1), PersonRef::learner(2)];
        store
            .create_if_absent(NewAttendance::absent(people[0], day()))
            .await
            .unwrap();

        assert_eq!(store.insert_absences(day(), &people).await.unwrap(), 1);
        assert_eq!(store.insert_absences(day(), &people).await.unwrap(), 0);
        assert_eq!(store.len(), 2);
    }
}
