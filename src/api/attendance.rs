use crate::auth::auth::AuthUser;
use crate::model::attendance::{
    AttendanceDetail, AttendanceRecord, AttendanceView, JustificationStatus,
};
use crate::model::person::{Person, PersonKind};
use crate::service::{JustificationWorkflow, ScanProcessor};
use actix_web::{HttpResponse, Responder, web};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(Deserialize, ToSchema)]
pub struct ScanRequest {
    /// Decoded badge or QR identifier
    #[schema(example = "LRN-0042")]
    pub identifier: String,
}

#[derive(Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct JustificationRequest {
    #[schema(example = "Medical appointment")]
    pub text: String,
    #[schema(example = "https://files.school.example/justif/42.pdf", nullable = true)]
    pub document_url: Option<String>,
}

#[derive(Deserialize, ToSchema)]
pub struct DispositionRequest {
    #[schema(example = "APPROVED")]
    pub status: JustificationStatus,
    #[schema(example = "Certificate checked", nullable = true)]
    pub comment: Option<String>,
}

#[derive(Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AttendanceResponse {
    #[schema(example = "1b4e28ba-2fa1-11d2-883f-0016d3cca427")]
    pub id: String,
    #[schema(example = 42)]
    pub person_id: u64,
    pub person_kind: PersonKind,
    #[schema(example = "2026-03-02", format = "date", value_type = String)]
    pub date: NaiveDate,
    pub is_present: bool,
    pub is_late: bool,
    /// Learner scan time
    #[schema(example = "2026-03-02T08:10:00Z", format = "date-time", value_type = String, nullable = true)]
    pub scan_time: Option<DateTime<Utc>>,
    #[schema(format = "date-time", value_type = String, nullable = true)]
    pub check_in: Option<DateTime<Utc>>,
    #[schema(format = "date-time", value_type = String, nullable = true)]
    pub check_out: Option<DateTime<Utc>>,
    #[schema(nullable = true)]
    pub status: Option<JustificationStatus>,
    #[schema(nullable = true)]
    pub justification: Option<String>,
    #[schema(nullable = true)]
    pub document_url: Option<String>,
    #[schema(nullable = true)]
    pub justification_comment: Option<String>,
    /// Evidence submitted and waiting for an administrator
    pub awaiting_review: bool,
    #[schema(nullable = true)]
    pub person: Option<Person>,
}

impl From<AttendanceView> for AttendanceResponse {
    fn from(view: AttendanceView) -> Self {
        let AttendanceView { record, person } = view;
        let awaiting_review = record.awaiting_review();
        let person_kind = record.detail.kind();

        let mut response = AttendanceResponse {
            id: record.id.to_string(),
            person_id: record.person_id,
            person_kind,
            date: record.date,
            is_present: record.is_present,
            is_late: record.is_late,
            scan_time: None,
            check_in: None,
            check_out: None,
            status: None,
            justification: None,
            document_url: None,
            justification_comment: None,
            awaiting_review,
            person,
        };

        match record.detail {
            AttendanceDetail::Learner {
                scan_time,
                justification,
            } => {
                response.scan_time = scan_time;
                response.status = Some(justification.status);
                response.justification = justification.text;
                response.document_url = justification.document_url;
                response.justification_comment = justification.comment;
            }
            AttendanceDetail::Coach {
                check_in,
                check_out,
            } => {
                response.check_in = check_in;
                response.check_out = check_out;
            }
        }
        response
    }
}

impl From<AttendanceRecord> for AttendanceResponse {
    fn from(record: AttendanceRecord) -> Self {
        AttendanceView {
            record,
            person: None,
        }
        .into()
    }
}

/// Badge scan endpoint
#[utoipa::path(
    post,
    path = "/api/attendance/scan",
    request_body(
        content = ScanRequest,
        description = "Decoded badge identifier",
        content_type = "application/json"
    ),
    responses(
        (status = 200, description = "Scan recorded", body = AttendanceResponse),
        (status = 400, description = "Missing identifier"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Unknown badge", body = Object, example = json!({
            "message": "Unknown badge LRN-9999"
        })),
        (status = 409, description = "Already scanned today", body = Object, example = json!({
            "message": "Awa Diop already scanned today at 08:10:00"
        })),
        (status = 503, description = "Storage unavailable")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Attendance"
)]
pub async fn scan(
    auth: AuthUser,
    scanner: web::Data<ScanProcessor>,
    payload: web::Json<ScanRequest>,
) -> actix_web::Result<impl Responder> {
    auth.require_scanner()?;

    let identifier = payload.identifier.trim();
    if identifier.is_empty() {
        return Ok(HttpResponse::BadRequest().json(json!({
            "message": "identifier is required"
        })));
    }

    let person = scanner.resolve(identifier).await?;
    let record = scanner.scan_person(&person, Utc::now()).await?;

    Ok(HttpResponse::Ok().json(AttendanceResponse::from(AttendanceView {
        record,
        person: Some(person),
    })))
}

/// Coach check-out endpoint
#[utoipa::path(
    post,
    path = "/api/attendance/check-out",
    request_body = ScanRequest,
    responses(
        (status = 200, description = "Checked out successfully", body = AttendanceResponse),
        (status = 400, description = "Badge does not belong to a coach"),
        (status = 404, description = "No active check-in found for today", body = Object, example = json!({
            "message": "No active check-in found for today"
        })),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Attendance"
)]
pub async fn check_out(
    auth: AuthUser,
    scanner: web::Data<ScanProcessor>,
    payload: web::Json<ScanRequest>,
) -> actix_web::Result<impl Responder> {
    auth.require_scanner()?;

    let record = scanner
        .check_out_badge(payload.identifier.trim(), Utc::now())
        .await?;

    Ok(HttpResponse::Ok().json(AttendanceResponse::from(record)))
}

/// Fetch one attendance record with its person
#[utoipa::path(
    get,
    path = "/api/attendance/{attendance_id}",
    params(
        ("attendance_id" = String, Path, description = "Attendance record id")
    ),
    responses(
        (status = 200, description = "Attendance record", body = AttendanceResponse),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Attendance record not found")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Attendance"
)]
pub async fn get_attendance(
    auth: AuthUser,
    workflow: web::Data<JustificationWorkflow>,
    path: web::Path<Uuid>,
) -> actix_web::Result<impl Responder> {
    let view = workflow.view(path.into_inner()).await?;
    auth.require_access_to(view.record.person())?;

    Ok(HttpResponse::Ok().json(AttendanceResponse::from(view)))
}

/// Submit a justification for an absence or late arrival
#[utoipa::path(
    post,
    path = "/api/attendance/{attendance_id}/justification",
    params(
        ("attendance_id" = String, Path, description = "Attendance record id")
    ),
    request_body = JustificationRequest,
    responses(
        (status = 200, description = "Justification submitted, awaiting review", body = AttendanceResponse),
        (status = 400, description = "Empty justification or coach record"),
        (status = 403, description = "Not your attendance"),
        (status = 404, description = "Attendance record not found")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Justification"
)]
pub async fn submit_justification(
    auth: AuthUser,
    workflow: web::Data<JustificationWorkflow>,
    path: web::Path<Uuid>,
    payload: web::Json<JustificationRequest>,
) -> actix_web::Result<impl Responder> {
    let id = path.into_inner();
    let record = workflow.record(id).await?;
    auth.require_access_to(record.person())?;

    let payload = payload.into_inner();
    let updated = workflow
        .submit(id, payload.text, payload.document_url)
        .await?;

    Ok(HttpResponse::Ok().json(AttendanceResponse::from(updated)))
}

/// Approve or reject a submitted justification (Staff/Admin)
#[utoipa::path(
    put,
    path = "/api/attendance/{attendance_id}/disposition",
    params(
        ("attendance_id" = String, Path, description = "Attendance record id")
    ),
    request_body = DispositionRequest,
    responses(
        (status = 200, description = "Disposition recorded", body = AttendanceResponse),
        (status = 400, description = "Nothing to evaluate or already approved", body = Object, example = json!({
            "message": "This attendance is already approved"
        })),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Attendance record not found")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Justification"
)]
pub async fn dispose_justification(
    auth: AuthUser,
    workflow: web::Data<JustificationWorkflow>,
    path: web::Path<Uuid>,
    payload: web::Json<DispositionRequest>,
) -> actix_web::Result<impl Responder> {
    auth.require_staff_or_admin()?;

    let payload = payload.into_inner();
    let view = workflow
        .dispose(path.into_inner(), payload.status, payload.comment)
        .await?;

    Ok(HttpResponse::Ok().json(AttendanceResponse::from(view)))
}

/// Approve without a justification (Admin)
#[utoipa::path(
    post,
    path = "/api/attendance/{attendance_id}/force-approve",
    params(
        ("attendance_id" = String, Path, description = "Attendance record id")
    ),
    responses(
        (status = 200, description = "Attendance approved", body = AttendanceResponse),
        (status = 403, description = "Admin only"),
        (status = 404, description = "Attendance record not found")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Justification"
)]
pub async fn force_approve(
    auth: AuthUser,
    workflow: web::Data<JustificationWorkflow>,
    path: web::Path<Uuid>,
) -> actix_web::Result<impl Responder> {
    auth.require_admin()?;

    let view = workflow.force_approve(path.into_inner()).await?;

    Ok(HttpResponse::Ok().json(AttendanceResponse::from(view)))
}
