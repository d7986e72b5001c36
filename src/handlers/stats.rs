use crate::config::sla::SlaPolicy;
use crate::error::{AppError, AppResult};
use crate::response::{ApiResponse, AppQuery};
use crate::services::stats::{DashboardStats, Report, ReportFilters, ReportQuery, StatsService};
use axum::{response::IntoResponse, Extension};
use sea_orm::DatabaseConnection;

#[utoipa::path(
    get,
    path = "/api/v1/stats",
    security(("jwt_token" = [])),
    responses(
        (status = 200, description = "Open ticket count and per-staff workload", body = DashboardStats),
        (status = 403, description = "Admin only", body = AppError),
    ),
    tag = "stats"
)]
pub async fn dashboard(
    Extension(db): Extension<DatabaseConnection>,
) -> AppResult<impl IntoResponse> {
    let stats = StatsService::new(db).dashboard().await?;
    Ok(ApiResponse::ok(stats))
}

/// Filters are combined with AND. Blank parameters are ignored.
#[utoipa::path(
    get,
    path = "/api/v1/stats/reports",
    security(("jwt_token" = [])),
    params(
        ("start_date" = Option<String>, Query, description = "Inclusive, YYYY-MM-DD"),
        ("end_date" = Option<String>, Query, description = "Inclusive, YYYY-MM-DD"),
        ("status" = Option<String>, Query, description = "OPEN, IN_PROGRESS or RESOLVED"),
        ("priority" = Option<String>, Query, description = "HIGH, MEDIUM or LOW"),
        ("assignee_id" = Option<String>, Query, description = "User id or 'unassigned'"),
        ("category_id" = Option<String>, Query, description = "Category id"),
    ),
    responses(
        (status = 200, description = "Operational report", body = Report),
        (status = 400, description = "Malformed filters", body = AppError),
        (status = 403, description = "Staff only", body = AppError),
    ),
    tag = "stats"
)]
pub async fn reports(
    Extension(db): Extension<DatabaseConnection>,
    Extension(sla): Extension<SlaPolicy>,
    AppQuery(params): AppQuery<ReportQuery>,
) -> AppResult<impl IntoResponse> {
    let filters = ReportFilters::parse(&params)?;
    let report = StatsService::new(db).report(&filters, &sla).await?;
    Ok(ApiResponse::ok(report))
}
