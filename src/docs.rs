use crate::api::attendance::{
    AttendanceResponse, DispositionRequest, JustificationRequest, ScanRequest,
};
use crate::model::attendance::JustificationStatus;
use crate::model::person::{Person, PersonKind};
use crate::model::stats::{
    Counts, DailyStats, DayBucket, MonthBucket, MonthlyStats, WeekBucket, WeeklyStats, YearlyStats,
};
use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "School Attendance API",
        version = "1.0.0",
        description = r#"
## School attendance tracking

Badge scans, late arrivals, absence justifications and attendance statistics
for learners and coaches.

### Key features
- **Scanning**: one record per person per day; scans after 08:15 are late
- **Coach check-out**: closes the day's open check-in
- **Justifications**: learners explain absences and late arrivals, staff approve or reject
- **Absentee sweep**: every weekday evening, everyone who did not scan is marked absent
- **Statistics**: daily, weekly, monthly and yearly present/late/absent counts

### Security
All endpoints require a **JWT Bearer** access token issued by the user service.
Scans come from badge readers (device role) or staff; dispositions need staff or admin.
"#,
    ),
    paths(
        crate::api::attendance::scan,
        crate::api::attendance::check_out,
        crate::api::attendance::get_attendance,
        crate::api::attendance::submit_justification,
        crate::api::attendance::dispose_justification,
        crate::api::attendance::force_approve,

        crate::api::stats::daily,
        crate::api::stats::weekly,
        crate::api::stats::monthly,
        crate::api::stats::yearly
    ),
    components(
        schemas(
            ScanRequest,
            JustificationRequest,
            DispositionRequest,
            AttendanceResponse,
            JustificationStatus,
            Person,
            PersonKind,
            Counts,
            DailyStats,
            WeekBucket,
            WeeklyStats,
            DayBucket,
            MonthlyStats,
            MonthBucket,
            YearlyStats
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Attendance", description = "Scan and check-out APIs"),
        (name = "Justification", description = "Absence and lateness justification APIs"),
        (name = "Stats", description = "Attendance statistics APIs"),
    )
)]
pub struct ApiDoc;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}
