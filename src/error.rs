use actix_web::{HttpResponse, ResponseError, http::StatusCode};
use chrono::{NaiveTime, Timelike};
use derive_more::Display;
use serde_json::json;
use tracing::error;

use crate::store::StoreError;

/// Errors surfaced by the attendance core. Every variant except
/// `StorageUnavailable` is an expected outcome and is never retried.
#[derive(Debug, Display)]
pub enum AttendanceError {
    #[display(fmt = "{}", _0)]
    NotFound(String),

    #[display(fmt = "{} already scanned today at {}", who, scanned_at)]
    DuplicateScan { who: String, scanned_at: NaiveTime },

    #[display(fmt = "{}", _0)]
    PreconditionFailed(String),

    #[display(fmt = "{}", _0)]
    InvalidTransition(String),

    #[display(fmt = "{}", _0)]
    InvalidQuery(String),

    #[display(fmt = "{}", _0)]
    Forbidden(String),

    #[display(fmt = "Storage unavailable: {}", _0)]
    StorageUnavailable(String),
}

impl std::error::Error for AttendanceError {}

impl AttendanceError {
    pub fn duplicate_scan(who: impl Into<String>, scanned_at: NaiveTime) -> Self {
        AttendanceError::DuplicateScan {
            who: who.into(),
            scanned_at: scanned_at.with_nanosecond(0).unwrap_or(scanned_at),
        }
    }

    pub fn record_not_found(id: impl std::fmt::Display) -> Self {
        AttendanceError::NotFound(format!("Attendance record {} not found", id))
    }
}

impl From<StoreError> for AttendanceError {
    fn from(e: StoreError) -> Self {
        error!(error = %e, "Attendance storage failure");
        AttendanceError::StorageUnavailable(e.to_string())
    }
}

impl ResponseError for AttendanceError {
    fn status_code(&self) -> StatusCode {
        match self {
            AttendanceError::NotFound(_) => StatusCode::NOT_FOUND,
            AttendanceError::DuplicateScan { .. } => StatusCode::CONFLICT,
            AttendanceError::PreconditionFailed(_)
            | AttendanceError::InvalidTransition(_)
            | AttendanceError::InvalidQuery(_) => StatusCode::BAD_REQUEST,
            AttendanceError::Forbidden(_) => StatusCode::FORBIDDEN,
            AttendanceError::StorageUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
        }
    }

    fn error_response(&self) -> HttpResponse {
        // storage details stay in the logs
        let message = match self {
            AttendanceError::StorageUnavailable(_) => "Storage temporarily unavailable".to_string(),
            other => other.to_string(),
        };

        HttpResponse::build(self.status_code()).json(json!({ "message": message }))
    }
}
