use crate::error::{AppError, AppResult};
use crate::middleware::AuthUser;
use crate::models::TicketModel;
use crate::response::{ApiResponse, AppJson, AppQuery, PaginatedResponse, PaginationQuery};
use crate::services::ticket::{
    AssigneeFilter, CreateNoteRequest, CreateTicketRequest, HistoryView, NoteView, TicketDetail,
    TicketListFilter, TicketService, TicketSort, TicketView, UpdateTicketRequest,
};
use axum::{
    extract::Path,
    response::IntoResponse,
    Extension,
};
use sea_orm::DatabaseConnection;
use serde::Deserialize;
use std::str::FromStr;
use utoipa::ToSchema;
use validator::Validate;

#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct TicketListQuery {
    /// OPEN, IN_PROGRESS or RESOLVED
    pub status: Option<String>,
    /// HIGH, MEDIUM or LOW
    pub priority: Option<String>,
    /// User id or `unassigned`
    pub assignee_id: Option<String>,
    /// `priority`, `date_asc`, default newest first
    pub sort: Option<String>,
    pub page: Option<u64>,
    pub per_page: Option<u64>,
}

fn parse_filter<T: FromStr>(raw: Option<&str>, field: &str) -> AppResult<Option<T>> {
    match raw.map(str::trim).filter(|v| !v.is_empty()) {
        None => Ok(None),
        Some(value) => value
            .parse()
            .map(Some)
            .map_err(|_| AppError::validation(format!("{field}: unknown value '{value}'"))),
    }
}

#[utoipa::path(
    get,
    path = "/api/v1/tickets",
    security(("jwt_token" = [])),
    params(
        ("status" = Option<String>, Query, description = "OPEN, IN_PROGRESS or RESOLVED"),
        ("priority" = Option<String>, Query, description = "HIGH, MEDIUM or LOW"),
        ("assignee_id" = Option<String>, Query, description = "User id or 'unassigned'"),
        ("sort" = Option<String>, Query, description = "priority, date_asc; newest first by default"),
        ("page" = Option<u64>, Query, description = "Page number"),
        ("per_page" = Option<u64>, Query, description = "Items per page"),
    ),
    responses(
        (status = 200, description = "Tickets visible to the caller", body = PaginatedResponse<TicketView>),
        (status = 400, description = "Invalid filter", body = AppError),
    ),
    tag = "tickets"
)]
pub async fn list_tickets(
    Extension(db): Extension<DatabaseConnection>,
    auth_user: AuthUser,
    AppQuery(params): AppQuery<TicketListQuery>,
) -> AppResult<impl IntoResponse> {
    let filter = TicketListFilter {
        status: parse_filter(params.status.as_deref(), "status")?,
        priority: parse_filter(params.priority.as_deref(), "priority")?,
        assignee: match params.assignee_id.as_deref().map(str::trim) {
            Some(raw) if !raw.is_empty() => Some(AssigneeFilter::parse(raw)?),
            _ => None,
        },
        sort: TicketSort::parse(params.sort.as_deref()),
    };
    let (page, per_page) = PaginationQuery {
        page: params.page,
        per_page: params.per_page,
    }
    .resolve()?;

    let (items, total) = TicketService::new(db)
        .list(&auth_user, &filter, page, per_page)
        .await?;

    Ok(ApiResponse::ok(PaginatedResponse::new(
        items, total, page, per_page,
    )))
}

#[utoipa::path(
    get,
    path = "/api/v1/tickets/{id}",
    security(("jwt_token" = [])),
    params(("id" = i32, Path, description = "Ticket ID")),
    responses(
        (status = 200, description = "Ticket with custom field values", body = TicketDetail),
        (status = 403, description = "Not the ticket's creator", body = AppError),
        (status = 404, description = "Ticket not found", body = AppError),
    ),
    tag = "tickets"
)]
pub async fn get_ticket(
    Extension(db): Extension<DatabaseConnection>,
    auth_user: AuthUser,
    Path(id): Path<i32>,
) -> AppResult<impl IntoResponse> {
    let detail = TicketService::new(db).get_detail(&auth_user, id).await?;
    Ok(ApiResponse::ok(detail))
}

#[utoipa::path(
    post,
    path = "/api/v1/tickets",
    security(("jwt_token" = [])),
    request_body = CreateTicketRequest,
    responses(
        (status = 201, description = "Ticket created with status OPEN", body = TicketModel),
        (status = 400, description = "Validation, taxonomy or profile error", body = AppError),
    ),
    tag = "tickets"
)]
pub async fn create_ticket(
    Extension(db): Extension<DatabaseConnection>,
    auth_user: AuthUser,
    AppJson(payload): AppJson<CreateTicketRequest>,
) -> AppResult<impl IntoResponse> {
    payload.validate()?;
    let ticket = TicketService::new(db).create(&auth_user, payload).await?;
    Ok(ApiResponse::with_message(ticket, "Ticket created").created())
}

#[utoipa::path(
    patch,
    path = "/api/v1/tickets/{id}",
    security(("jwt_token" = [])),
    params(("id" = i32, Path, description = "Ticket ID")),
    request_body = UpdateTicketRequest,
    responses(
        (status = 200, description = "Ticket updated", body = TicketModel),
        (status = 400, description = "No changes or invalid assignee", body = AppError),
        (status = 403, description = "Staff only", body = AppError),
        (status = 404, description = "Ticket not found", body = AppError),
    ),
    tag = "tickets"
)]
pub async fn update_ticket(
    Extension(db): Extension<DatabaseConnection>,
    auth_user: AuthUser,
    Path(id): Path<i32>,
    AppJson(payload): AppJson<UpdateTicketRequest>,
) -> AppResult<impl IntoResponse> {
    payload.validate()?;
    let ticket = TicketService::new(db).update(&auth_user, id, payload).await?;
    Ok(ApiResponse::with_message(ticket, "Ticket updated"))
}

#[utoipa::path(
    get,
    path = "/api/v1/tickets/{id}/notes",
    security(("jwt_token" = [])),
    params(("id" = i32, Path, description = "Ticket ID")),
    responses(
        (status = 200, description = "Internal notes, oldest first", body = Vec<NoteView>),
        (status = 403, description = "Staff only", body = AppError),
        (status = 404, description = "Ticket not found", body = AppError),
    ),
    tag = "tickets"
)]
pub async fn list_notes(
    Extension(db): Extension<DatabaseConnection>,
    Path(id): Path<i32>,
) -> AppResult<impl IntoResponse> {
    Ok(ApiResponse::ok(TicketService::new(db).list_notes(id).await?))
}

#[utoipa::path(
    post,
    path = "/api/v1/tickets/{id}/notes",
    security(("jwt_token" = [])),
    params(("id" = i32, Path, description = "Ticket ID")),
    request_body = CreateNoteRequest,
    responses(
        (status = 201, description = "Note added", body = NoteView),
        (status = 403, description = "Staff only", body = AppError),
        (status = 404, description = "Ticket not found", body = AppError),
    ),
    tag = "tickets"
)]
pub async fn add_note(
    Extension(db): Extension<DatabaseConnection>,
    auth_user: AuthUser,
    Path(id): Path<i32>,
    AppJson(payload): AppJson<CreateNoteRequest>,
) -> AppResult<impl IntoResponse> {
    payload.validate()?;
    let note = TicketService::new(db)
        .add_note(&auth_user, id, &payload.note)
        .await?;
    Ok(ApiResponse::ok(note).created())
}

#[utoipa::path(
    get,
    path = "/api/v1/tickets/{id}/history",
    security(("jwt_token" = [])),
    params(("id" = i32, Path, description = "Ticket ID")),
    responses(
        (status = 200, description = "Status and assignee changes, oldest first", body = Vec<HistoryView>),
        (status = 403, description = "Staff only", body = AppError),
        (status = 404, description = "Ticket not found", body = AppError),
    ),
    tag = "tickets"
)]
pub async fn list_history(
    Extension(db): Extension<DatabaseConnection>,
    Path(id): Path<i32>,
) -> AppResult<impl IntoResponse> {
    Ok(ApiResponse::ok(TicketService::new(db).list_history(id).await?))
}
