use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use futures_util::TryStreamExt;
use sqlx::{FromRow, MySql, MySqlPool, QueryBuilder};
use uuid::Uuid;

use super::{AttendanceStore, Insertion, StoreError, StoreResult};
use crate::model::attendance::{
    AttendanceDetail, AttendanceRecord, Justification, JustificationStatus, NewAttendance,
};
use crate::model::person::{PersonKind, PersonRef};

const SELECT_COLUMNS: &str = r#"
    SELECT id, person_kind, person_id, date, is_present, is_late, scan_time, check_out,
           status, justification, document_url, justification_comment, created_at, updated_at
    FROM attendance
"#;

// MySQL allows 65535 placeholders per statement; 9 columns per absence row
const ABSENCE_CHUNK: usize = 1000;

const DUPLICATE_KEY_STATE: &str = "23000";

/// MySQL reports duplicate keys as SQLSTATE 23000.
fn is_duplicate_key(e: &sqlx::Error) -> bool {
    match e {
        sqlx::Error::Database(db_err) => is_duplicate_state(db_err.code().as_deref()),
        _ => false,
    }
}

fn is_duplicate_state(code: Option<&str>) -> bool {
    code == Some(DUPLICATE_KEY_STATE)
}

/// One `attendance` row. `scan_time` holds the learner's scan or the coach's
/// check-in; the justification columns are NULL for coaches.
#[derive(Debug, FromRow)]
struct AttendanceRow {
    id: String,
    person_kind: String,
    person_id: u64,
    date: NaiveDate,
    is_present: bool,
    is_late: bool,
    scan_time: Option<NaiveDateTime>,
    check_out: Option<NaiveDateTime>,
    status: Option<String>,
    justification: Option<String>,
    document_url: Option<String>,
    justification_comment: Option<String>,
    created_at: NaiveDateTime,
    updated_at: NaiveDateTime,
}

impl TryFrom<AttendanceRow> for AttendanceRecord {
    type Error = StoreError;

    fn try_from(row: AttendanceRow) -> Result<Self, Self::Error> {
        let corrupt = |reason: String| StoreError::Corrupt {
            id: row.id.clone(),
            reason,
        };

        let id = Uuid::parse_str(&row.id).map_err(|e| corrupt(e.to_string()))?;
        let kind: PersonKind = row
            .person_kind
            .parse()
            .map_err(|_| corrupt(format!("unknown person kind {}", row.person_kind)))?;

        let detail = match kind {
            PersonKind::Learner => {
                let raw = row
                    .status
                    .as_deref()
                    .ok_or_else(|| corrupt("learner row without status".into()))?;
                let status: JustificationStatus = raw
                    .parse()
                    .map_err(|_| corrupt(format!("unknown status {}", raw)))?;
                AttendanceDetail::Learner {
                    scan_time: row.scan_time.map(|t| t.and_utc()),
                    justification: Justification {
                        status,
                        text: row.justification.clone(),
                        document_url: row.document_url.clone(),
                        comment: row.justification_comment.clone(),
                    },
                }
            }
            PersonKind::Coach => AttendanceDetail::Coach {
                check_in: row.scan_time.map(|t| t.and_utc()),
                check_out: row.check_out.map(|t| t.and_utc()),
            },
        };

        Ok(AttendanceRecord {
            id,
            person_id: row.person_id,
            date: row.date,
            is_present: row.is_present,
            is_late: row.is_late,
            detail,
            created_at: row.created_at.and_utc(),
            updated_at: row.updated_at.and_utc(),
        })
    }
}

pub struct MySqlAttendanceStore {
    pool: MySqlPool,
}

impl MySqlAttendanceStore {
    pub fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }

    async fn fetch_one_by_id(&self, id: Uuid) -> StoreResult<Option<AttendanceRecord>> {
        let sql = format!("{} WHERE id = ?", SELECT_COLUMNS);
        sqlx::query_as::<_, AttendanceRow>(&sql)
            .bind(id.to_string())
            .fetch_optional(&self.pool)
            .await?
            .map(AttendanceRecord::try_from)
            .transpose()
    }
}

#[async_trait]
impl AttendanceStore for MySqlAttendanceStore {
    async fn create_if_absent(&self, new: NewAttendance) -> StoreResult<Insertion> {
        let person = new.person;
        let record = new.into_record(Utc::now());

        let (scan_time, check_out) = match &record.detail {
            AttendanceDetail::Learner { scan_time, .. } => (*scan_time, None),
            AttendanceDetail::Coach {
                check_in,
                check_out,
            } => (*check_in, *check_out),
        };
        let justification = record.justification();

        // The unique key on (person_kind, person_id, date) makes this insert
        // the existence check.
        let result = sqlx::query(
            r#"
            INSERT INTO attendance
                (id, person_kind, person_id, date, is_present, is_late, scan_time, check_out,
                 status, justification, document_url, justification_comment, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(record.id.to_string())
        .bind(person.kind.as_ref())
        .bind(person.id)
        .bind(record.date)
        .bind(record.is_present)
        .bind(record.is_late)
        .bind(scan_time.map(|t| t.naive_utc()))
        .bind(check_out.map(|t| t.naive_utc()))
        .bind(justification.map(|j| j.status.as_ref().to_string()))
        .bind(justification.and_then(|j| j.text.clone()))
        .bind(justification.and_then(|j| j.document_url.clone()))
        .bind(justification.and_then(|j| j.comment.clone()))
        .bind(record.created_at.naive_utc())
        .bind(record.updated_at.naive_utc())
        .execute(&self.pool)
        .await;

        match result {
            Ok(_) => Ok(Insertion::Created(record)),
            Err(e) if is_duplicate_key(&e) => {
                match self.find_by_person_and_date(person, record.date).await? {
                    Some(existing) => Ok(Insertion::Existing(existing)),
                    None => Err(StoreError::Database(e)),
                }
            }
            Err(e) => {
                tracing::error!(error = %e, person_id = person.id, "Attendance insert failed");
                Err(e.into())
            }
        }
    }

    async fn find_by_id(&self, id: Uuid) -> StoreResult<Option<AttendanceRecord>> {
        self.fetch_one_by_id(id).await
    }

    async fn find_by_person_and_date(
        &self,
        person: PersonRef,
        date: NaiveDate,
    ) -> StoreResult<Option<AttendanceRecord>> {
        let sql = format!(
            "{} WHERE person_kind = ? AND person_id = ? AND date = ?",
            SELECT_COLUMNS
        );
        sqlx::query_as::<_, AttendanceRow>(&sql)
            .bind(person.kind.as_ref())
            .bind(person.id)
            .bind(date)
            .fetch_optional(&self.pool)
            .await?
            .map(AttendanceRecord::try_from)
            .transpose()
    }

    async fn query_range(
        &self,
        kind: PersonKind,
        from: NaiveDate,
        to: NaiveDate,
    ) -> StoreResult<Vec<AttendanceRecord>> {
        let sql = format!(
            "{} WHERE person_kind = ? AND date BETWEEN ? AND ? ORDER BY date, person_id",
            SELECT_COLUMNS
        );
        let mut stream = sqlx::query_as::<_, AttendanceRow>(&sql)
            .bind(kind.as_ref())
            .bind(from)
            .bind(to)
            .fetch(&self.pool);

        let mut records = Vec::new();
        while let Some(row) = stream.try_next().await? {
            records.push(AttendanceRecord::try_from(row)?);
        }
        Ok(records)
    }

    async fn submit_justification(
        &self,
        id: Uuid,
        text: Option<String>,
        document_url: Option<String>,
    ) -> StoreResult<Option<AttendanceRecord>> {
        let result = sqlx::query(
            r#"
            UPDATE attendance
            SET status = ?, justification = ?, document_url = ?, updated_at = ?
            WHERE id = ?
            AND person_kind = 'LEARNER'
            "#,
        )
        .bind(JustificationStatus::Pending.to_string())
        .bind(text)
        .bind(document_url)
        .bind(Utc::now().naive_utc())
        .bind(id.to_string())
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Ok(None);
        }
        self.fetch_one_by_id(id).await
    }

    async fn set_disposition(
        &self,
        id: Uuid,
        expected: Option<&Justification>,
        status: JustificationStatus,
        comment: Option<String>,
    ) -> StoreResult<Option<AttendanceRecord>> {
        let mut builder: QueryBuilder<MySql> =
            QueryBuilder::new("UPDATE attendance SET status = ");
        builder
            .push_bind(status.to_string())
            .push(", justification_comment = ")
            .push_bind(comment)
            .push(", updated_at = ")
            .push_bind(Utc::now().naive_utc())
            .push(" WHERE id = ")
            .push_bind(id.to_string())
            .push(" AND person_kind = 'LEARNER'");

        // NULL-safe equality so an absent document compares equal to NULL
        if let Some(expected) = expected {
            builder
                .push(" AND status = ")
                .push_bind(expected.status.to_string())
                .push(" AND justification <=> ")
                .push_bind(expected.text.clone())
                .push(" AND document_url <=> ")
                .push_bind(expected.document_url.clone());
        }

        let result = builder.build().execute(&self.pool).await?;
        if result.rows_affected() == 0 {
            return Ok(None);
        }
        self.fetch_one_by_id(id).await
    }

    async fn close_check_in(
        &self,
        person: PersonRef,
        date: NaiveDate,
        at: DateTime<Utc>,
    ) -> StoreResult<Option<AttendanceRecord>> {
        let result = sqlx::query(
            r#"
            UPDATE attendance
            SET check_out = ?, updated_at = ?
            WHERE person_kind = 'COACH'
            AND person_id = ?
            AND date = ?
            AND scan_time IS NOT NULL
            AND check_out IS NULL
            "#,
        )
        .bind(at.naive_utc())
        .bind(Utc::now().naive_utc())
        .bind(person.id)
        .bind(date)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Ok(None);
        }
        self.find_by_person_and_date(person, date).await
    }

    /// `INSERT IGNORE` skips rows whose key already exists, so concurrent
    /// scans and re-runs never produce duplicates.
    async fn insert_absences(&self, date: NaiveDate, persons: &[PersonRef]) -> StoreResult<u64> {
        let mut created = 0;

        for chunk in persons.chunks(ABSENCE_CHUNK) {
            let now = Utc::now().naive_utc();
            let mut builder: QueryBuilder<MySql> = QueryBuilder::new(
                "INSERT IGNORE INTO attendance \
                 (id, person_kind, person_id, date, is_present, is_late, status, created_at, updated_at) ",
            );
            builder.push_values(chunk, |mut row, person| {
                let status = match person.kind {
                    PersonKind::Learner => Some(JustificationStatus::ToJustify.to_string()),
                    PersonKind::Coach => None,
                };
                row.push_bind(Uuid::new_v4().to_string())
                    .push_bind(person.kind.to_string())
                    .push_bind(person.id)
                    .push_bind(date)
                    .push_bind(false)
                    .push_bind(false)
                    .push_bind(status)
                    .push_bind(now)
                    .push_bind(now);
            });

            match builder.build().execute(&self.pool).await {
                Ok(result) => created += result.rows_affected(),
                Err(e) => {
                    tracing::error!(error = %e, created, %date, "Absence batch insert failed");
                    return Err(e.into());
                }
            }
        }

        Ok(created)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(kind: &str, status: Option<&str>) -> AttendanceRow {
        let at = NaiveDate::from_ymd_opt(2026, 3, 2)
            .unwrap()
            .and_hms_opt(8, 40, 0)
            .unwrap();
        AttendanceRow {
            id: "1b4e28ba-2fa1-11d2-883f-0016d3cca427".into(),
            person_kind: kind.into(),
            person_id: 7,
            date: at.date(),
            is_present: true,
            is_late: true,
            scan_time: Some(at),
            check_out: None,
            status: status.map(str::to_string),
            justification: Some("Bus strike".into()),
            document_url: None,
            justification_comment: None,
            created_at: at,
            updated_at: at,
        }
    }

    #[test]
    fn learner_row_keeps_scan_and_justification() {
        let record = AttendanceRecord::try_from(row("LEARNER", Some("TO_JUSTIFY"))).unwrap();

        assert_eq!(record.person(), PersonRef::learner(7));
        assert_eq!(record.scanned_at(), Some(record.created_at));
        let justification = record.justification().unwrap();
        assert_eq!(justification.status, JustificationStatus::ToJustify);
        assert_eq!(justification.text.as_deref(), Some("Bus strike"));
    }

    #[test]
    fn coach_row_maps_scan_time_to_check_in() {
        let record = AttendanceRecord::try_from(row("COACH", None)).unwrap();

        assert!(record.justification().is_none());
        match record.detail {
            AttendanceDetail::Coach {
                check_in,
                check_out,
            } => {
                assert_eq!(check_in, Some(record.created_at));
                assert_eq!(check_out, None);
            }
            other => panic!("expected a coach detail, got {:?}", other),
        }
    }

    #[test]
    fn bad_rows_are_reported_as_corrupt() {
        let unknown_kind = AttendanceRecord::try_from(row("VISITOR", None)).unwrap_err();
        assert!(matches!(unknown_kind, StoreError::Corrupt { .. }));

        let no_status = AttendanceRecord::try_from(row("LEARNER", None)).unwrap_err();
        assert!(matches!(no_status, StoreError::Corrupt { .. }));

        let bad_status = AttendanceRecord::try_from(row("LEARNER", Some("MAYBE"))).unwrap_err();
        assert!(matches!(bad_status, StoreError::Corrupt { .. }));
    }

    #[test]
    fn only_sqlstate_23000_is_a_duplicate() {
        assert!(is_duplicate_state(Some("23000")));
        assert!(!is_duplicate_state(Some("42S02")));
        assert!(!is_duplicate_state(None));
        assert!(!is_duplicate_key(&sqlx::Error::RowNotFound));
    }
}
