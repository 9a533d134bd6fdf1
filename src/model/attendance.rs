use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};
use utoipa::ToSchema;
use uuid::Uuid;

use super::person::{Person, PersonKind, PersonRef};

/// Justification status of a learner record.
#[derive(
    Debug, Copy, Clone, Eq, PartialEq, Serialize, Deserialize, Display, EnumString, AsRefStr,
    ToSchema,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum JustificationStatus {
    Pending,
    ToJustify,
    Approved,
    Rejected,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Justification {
    pub status: JustificationStatus,
    pub text: Option<String>,
    pub document_url: Option<String>,
    /// Administrator's note on the disposition
    pub comment: Option<String>,
}

impl Justification {
    pub fn new(status: JustificationStatus) -> Self {
        Self {
            status,
            text: None,
            document_url: None,
            comment: None,
        }
    }

    /// Same status and evidence; the comment is not compared.
    pub fn same_submission(&self, other: &Justification) -> bool {
        self.status == other.status
            && self.text == other.text
            && self.document_url == other.document_url
    }

    /// True when there is something for an administrator to evaluate.
    pub fn has_evidence(&self) -> bool {
        let filled = |v: &Option<String>| v.as_deref().is_some_and(|s| !s.trim().is_empty());
        filled(&self.text) || filled(&self.document_url)
    }
}

/// Kind-specific part of a record. Only learners go through the
/// justification workflow; coaches carry check-in/check-out times.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "personKind", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AttendanceDetail {
    #[serde(rename_all = "camelCase")]
    Learner {
        scan_time: Option<DateTime<Utc>>,
        justification: Justification,
    },
    #[serde(rename_all = "camelCase")]
    Coach {
        check_in: Option<DateTime<Utc>>,
        check_out: Option<DateTime<Utc>>,
    },
}

impl AttendanceDetail {
    pub fn kind(&self) -> PersonKind {
        match self {
            AttendanceDetail::Learner { .. } => PersonKind::Learner,
            AttendanceDetail::Coach { .. } => PersonKind::Coach,
        }
    }
}

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum Outcome {
    Present,
    Late,
    Absent,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttendanceRecord {
    pub id: Uuid,
    pub person_id: u64,
    /// Facility-local calendar day
    pub date: NaiveDate,
    pub is_present: bool,
    pub is_late: bool,
    #[serde(flatten)]
    pub detail: AttendanceDetail,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl AttendanceRecord {
    pub fn person(&self) -> PersonRef {
        PersonRef {
            kind: self.detail.kind(),
            id: self.person_id,
        }
    }

    /// Instant of the physical event: the learner's scan or the coach's check-in.
    pub fn scanned_at(&self) -> Option<DateTime<Utc>> {
        match &self.detail {
            AttendanceDetail::Learner { scan_time, .. } => *scan_time,
            AttendanceDetail::Coach { check_in, .. } => *check_in,
        }
    }

    pub fn justification(&self) -> Option<&Justification> {
        match &self.detail {
            AttendanceDetail::Learner { justification, .. } => Some(justification),
            AttendanceDetail::Coach { .. } => None,
        }
    }

    pub fn justification_mut(&mut self) -> Option<&mut Justification> {
        match &mut self.detail {
            AttendanceDetail::Learner { justification, .. } => Some(justification),
            AttendanceDetail::Coach { .. } => None,
        }
    }

    /// An on-time learner scan is stored as PENDING too; this tells such a
    /// record apart from one holding evidence that waits for a decision.
    pub fn awaiting_review(&self) -> bool {
        self.justification()
            .is_some_and(|j| j.status == JustificationStatus::Pending && j.has_evidence())
    }

    pub fn outcome(&self) -> Outcome {
        match (self.is_present, self.is_late) {
            (false, _) => Outcome::Absent,
            (true, true) => Outcome::Late,
            (true, false) => Outcome::Present,
        }
    }
}

/// A record about to be written. The store assigns identity and timestamps.
#[derive(Debug, Clone, PartialEq)]
pub struct NewAttendance {
    pub person: PersonRef,
    pub date: NaiveDate,
    pub is_present: bool,
    pub is_late: bool,
    pub detail: AttendanceDetail,
}

impl NewAttendance {
    pub fn scanned(person: PersonRef, date: NaiveDate, at: DateTime<Utc>, is_late: bool) -> Self {
        let detail = match person.kind {
            PersonKind::Learner => AttendanceDetail::Learner {
                scan_time: Some(at),
                justification: Justification::new(if is_late {
                    JustificationStatus::ToJustify
                } else {
                    JustificationStatus::Pending
                }),
            },
            PersonKind::Coach => AttendanceDetail::Coach {
                check_in: Some(at),
                check_out: None,
            },
        };

        Self {
            person,
            date,
            is_present: true,
            is_late,
            detail,
        }
    }

    pub fn absent(person: PersonRef, date: NaiveDate) -> Self {
        let detail = match person.kind {
            PersonKind::Learner => AttendanceDetail::Learner {
                scan_time: None,
                justification: Justification::new(JustificationStatus::ToJustify),
            },
            PersonKind::Coach => AttendanceDetail::Coach {
                check_in: None,
                check_out: None,
            },
        };

        Self {
            person,
            date,
            is_present: false,
            is_late: false,
            detail,
        }
    }

    pub fn into_record(self, now: DateTime<Utc>) -> AttendanceRecord {
        AttendanceRecord {
            id: Uuid::new_v4(),
            person_id: self.person.id,
            date: self.date,
            is_present: self.is_present,
            is_late: self.is_late,
            detail: self.detail,
            created_at: now,
            updated_at: now,
        }
    }
}

/// A record with its person relation populated.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AttendanceView {
    #[serde(flatten)]
    pub record: AttendanceRecord,
    pub person: Option<Person>,
}
