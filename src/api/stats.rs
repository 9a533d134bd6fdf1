use crate::auth::auth::AuthUser;
use crate::model::person::PersonKind;
use crate::model::stats::{DailyStats, MonthlyStats, WeeklyStats, YearlyStats};
use crate::service::StatsAggregator;
use actix_web::{HttpResponse, Responder, web};
use chrono::NaiveDate;
use serde::Deserialize;
use utoipa::IntoParams;

#[derive(Deserialize, IntoParams)]
pub struct DailyQuery {
    /// Day to report on
    #[param(value_type = String, example = "2026-03-02")]
    pub date: NaiveDate,
    /// Restrict to one promotion / group
    #[param(example = 3)]
    pub group: Option<u64>,
    /// LEARNER (default) or COACH
    #[param(value_type = Option<String>, example = "LEARNER")]
    pub kind: Option<PersonKind>,
}

#[derive(Deserialize, IntoParams)]
pub struct YearQuery {
    #[param(example = 2026)]
    pub year: i32,
    /// LEARNER (default) or COACH
    #[param(value_type = Option<String>, example = "LEARNER")]
    pub kind: Option<PersonKind>,
}

#[derive(Deserialize, IntoParams)]
pub struct MonthQuery {
    #[param(example = 2026)]
    pub year: i32,
    /// 1-12
    #[param(example = 3)]
    pub month: u32,
    /// LEARNER (default) or COACH
    #[param(value_type = Option<String>, example = "LEARNER")]
    pub kind: Option<PersonKind>,
}

fn kind_or_default(kind: Option<PersonKind>) -> PersonKind {
    kind.unwrap_or(PersonKind::Learner)
}

#[utoipa::path(
    get,
    path = "/api/stats/daily",
    params(DailyQuery),
    responses(
        (status = 200, description = "Counts for one day", body = DailyStats),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Stats"
)]
pub async fn daily(
    auth: AuthUser,
    stats: web::Data<StatsAggregator>,
    query: web::Query<DailyQuery>,
) -> actix_web::Result<impl Responder> {
    auth.require_staff_or_admin()?;

    let report = stats
        .daily(kind_or_default(query.kind), query.date, query.group)
        .await?;

    Ok(HttpResponse::Ok().json(report))
}

#[utoipa::path(
    get,
    path = "/api/stats/weekly",
    params(YearQuery),
    responses(
        (status = 200, description = "52 weekly buckets", body = WeeklyStats),
        (status = 400, description = "Year out of range"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Stats"
)]
pub async fn weekly(
    auth: AuthUser,
    stats: web::Data<StatsAggregator>,
    query: web::Query<YearQuery>,
) -> actix_web::Result<impl Responder> {
    auth.require_staff_or_admin()?;

    let report = stats.weekly(kind_or_default(query.kind), query.year).await?;

    Ok(HttpResponse::Ok().json(report))
}

#[utoipa::path(
    get,
    path = "/api/stats/monthly",
    params(MonthQuery),
    responses(
        (status = 200, description = "One bucket per day of the month", body = MonthlyStats),
        (status = 400, description = "Invalid year or month"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Stats"
)]
pub async fn monthly(
    auth: AuthUser,
    stats: web::Data<StatsAggregator>,
    query: web::Query<MonthQuery>,
) -> actix_web::Result<impl Responder> {
    auth.require_staff_or_admin()?;

    let report = stats
        .monthly(kind_or_default(query.kind), query.year, query.month)
        .await?;

    Ok(HttpResponse::Ok().json(report))
}

#[utoipa::path(
    get,
    path = "/api/stats/yearly",
    params(YearQuery),
    responses(
        (status = 200, description = "One bucket per month", body = YearlyStats),
        (status = 400, description = "Year out of range"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Stats"
)]
pub async fn yearly(
    auth: AuthUser,
    stats: web::Data<StatsAggregator>,
    query: web::Query<YearQuery>,
) -> actix_web::Result<impl Responder> {
    auth.require_staff_or_admin()?;

    let report = stats.yearly(kind_or_default(query.kind), query.year).await?;

    Ok(HttpResponse::Ok().json(report))
}
