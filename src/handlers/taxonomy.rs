use crate::error::{AppError, AppResult};
use crate::middleware::AuthUser;
use crate::models::{TicketCategoryModel, TicketSubcategoryModel, UserRole};
use crate::response::{ApiResponse, AppJson, AppQuery};
use crate::services::taxonomy::{
    CreateCategoryRequest, CreateFieldRequest, CreateSubcategoryRequest, FieldDefinitionView,
    TaxonomyService, UpdateCategoryRequest, UpdateFieldRequest, UpdateSubcategoryRequest,
};
use axum::{
    extract::Path,
    response::IntoResponse,
    Extension,
};
use sea_orm::DatabaseConnection;
use serde::Deserialize;
use utoipa::ToSchema;
use validator::Validate;

#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct ListTaxonomyQuery {
    /// Include soft-deleted entries (ADMIN only, ignored otherwise)
    #[serde(default)]
    pub include_inactive: bool,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct FieldScopeQuery {
    pub category_id: i32,
    pub subcategory_id: Option<i32>,
}

#[utoipa::path(
    get,
    path = "/api/v1/ticket-meta/categories",
    security(("jwt_token" = [])),
    params(("include_inactive" = Option<bool>, Query, description = "ADMIN only")),
    responses((status = 200, description = "Ticket categories", body = Vec<TicketCategoryModel>)),
    tag = "ticket-meta"
)]
pub async fn list_categories(
    Extension(db): Extension<DatabaseConnection>,
    auth_user: AuthUser,
    AppQuery(params): AppQuery<ListTaxonomyQuery>,
) -> AppResult<impl IntoResponse> {
    let include_inactive = params.include_inactive && auth_user.role == UserRole::Admin;
    let categories = TaxonomyService::new(db)
        .list_categories(include_inactive)
        .await?;
    Ok(ApiResponse::ok(categories))
}

#[utoipa::path(
    get,
    path = "/api/v1/ticket-meta/categories/{id}/subcategories",
    security(("jwt_token" = [])),
    params(
        ("id" = i32, Path, description = "Category ID"),
        ("include_inactive" = Option<bool>, Query, description = "ADMIN only"),
    ),
    responses(
        (status = 200, description = "Subcategories of the category", body = Vec<TicketSubcategoryModel>),
        (status = 404, description = "Category not found", body = AppError),
    ),
    tag = "ticket-meta"
)]
pub async fn list_subcategories(
    Extension(db): Extension<DatabaseConnection>,
    auth_user: AuthUser,
    Path(id): Path<i32>,
    AppQuery(params): AppQuery<ListTaxonomyQuery>,
) -> AppResult<impl IntoResponse> {
    let include_inactive = params.include_inactive && auth_user.role == UserRole::Admin;
    let subcategories = TaxonomyService::new(db)
        .list_subcategories(id, include_inactive)
        .await?;
    Ok(ApiResponse::ok(subcategories))
}

#[utoipa::path(
    get,
    path = "/api/v1/ticket-meta/fields",
    security(("jwt_token" = [])),
    params(
        ("category_id" = i32, Query, description = "Category ID"),
        ("subcategory_id" = Option<i32>, Query, description = "Adds fields pinned to this subcategory"),
    ),
    responses((status = 200, description = "Active custom field definitions", body = Vec<FieldDefinitionView>)),
    tag = "ticket-meta"
)]
pub async fn list_fields(
    Extension(db): Extension<DatabaseConnection>,
    AppQuery(params): AppQuery<FieldScopeQuery>,
) -> AppResult<impl IntoResponse> {
    let fields = TaxonomyService::new(db)
        .list_fields(params.category_id, params.subcategory_id)
        .await?;
    Ok(ApiResponse::ok(fields))
}

#[utoipa::path(
    post,
    path = "/api/v1/ticket-meta/categories",
    security(("jwt_token" = [])),
    request_body = CreateCategoryRequest,
    responses(
        (status = 201, description = "Category created", body = TicketCategoryModel),
        (status = 400, description = "Validation error", body = AppError),
        (status = 409, description = "Category already exists", body = AppError),
    ),
    tag = "ticket-meta"
)]
pub async fn create_category(
    Extension(db): Extension<DatabaseConnection>,
    AppJson(payload): AppJson<CreateCategoryRequest>,
) -> AppResult<impl IntoResponse> {
    payload.validate()?;
    let category = TaxonomyService::new(db).create_category(payload).await?;
    Ok(ApiResponse::ok(category).created())
}

#[utoipa::path(
    patch,
    path = "/api/v1/ticket-meta/categories/{id}",
    security(("jwt_token" = [])),
    params(("id" = i32, Path, description = "Category ID")),
    request_body = UpdateCategoryRequest,
    responses(
        (status = 200, description = "Category updated", body = TicketCategoryModel),
        (status = 404, description = "Category not found", body = AppError),
        (status = 409, description = "Category already exists", body = AppError),
    ),
    tag = "ticket-meta"
)]
pub async fn update_category(
    Extension(db): Extension<DatabaseConnection>,
    Path(id): Path<i32>,
    AppJson(payload): AppJson<UpdateCategoryRequest>,
) -> AppResult<impl IntoResponse> {
    payload.validate()?;
    let category = TaxonomyService::new(db).update_category(id, payload).await?;
    Ok(ApiResponse::ok(category))
}

#[utoipa::path(
    post,
    path = "/api/v1/ticket-meta/subcategories",
    security(("jwt_token" = [])),
    request_body = CreateSubcategoryRequest,
    responses(
        (status = 201, description = "Subcategory created", body = TicketSubcategoryModel),
        (status = 400, description = "Validation error or inactive category", body = AppError),
        (status = 409, description = "Subcategory already exists for this category", body = AppError),
    ),
    tag = "ticket-meta"
)]
pub async fn create_subcategory(
    Extension(db): Extension<DatabaseConnection>,
    AppJson(payload): AppJson<CreateSubcategoryRequest>,
) -> AppResult<impl IntoResponse> {
    payload.validate()?;
    let subcategory = TaxonomyService::new(db).create_subcategory(payload).await?;
    Ok(ApiResponse::ok(subcategory).created())
}

#[utoipa::path(
    patch,
    path = "/api/v1/ticket-meta/subcategories/{id}",
    security(("jwt_token" = [])),
    params(("id" = i32, Path, description = "Subcategory ID")),
    request_body = UpdateSubcategoryRequest,
    responses(
        (status = 200, description = "Subcategory updated", body = TicketSubcategoryModel),
        (status = 404, description = "Subcategory not found", body = AppError),
    ),
    tag = "ticket-meta"
)]
pub async fn update_subcategory(
    Extension(db): Extension<DatabaseConnection>,
    Path(id): Path<i32>,
    AppJson(payload): AppJson<UpdateSubcategoryRequest>,
) -> AppResult<impl IntoResponse> {
    payload.validate()?;
    let subcategory = TaxonomyService::new(db)
        .update_subcategory(id, payload)
        .await?;
    Ok(ApiResponse::ok(subcategory))
}

#[utoipa::path(
    post,
    path = "/api/v1/ticket-meta/fields",
    security(("jwt_token" = [])),
    request_body = CreateFieldRequest,
    responses(
        (status = 201, description = "Custom field created", body = FieldDefinitionView),
        (status = 400, description = "Validation error", body = AppError),
        (status = 409, description = "Field key already exists in this scope", body = AppError),
    ),
    tag = "ticket-meta"
)]
pub async fn create_field(
    Extension(db): Extension<DatabaseConnection>,
    AppJson(payload): AppJson<CreateFieldRequest>,
) -> AppResult<impl IntoResponse> {
    payload.validate()?;
    let field = TaxonomyService::new(db).create_field(payload).await?;
    Ok(ApiResponse::ok(field).created())
}

#[utoipa::path(
    patch,
    path = "/api/v1/ticket-meta/fields/{id}",
    security(("jwt_token" = [])),
    params(("id" = i32, Path, description = "Field definition ID")),
    request_body = UpdateFieldRequest,
    responses(
        (status = 200, description = "Custom field updated", body = FieldDefinitionView),
        (status = 404, description = "Field not found", body = AppError),
    ),
    tag = "ticket-meta"
)]
pub async fn update_field(
    Extension(db): Extension<DatabaseConnection>,
    Path(id): Path<i32>,
    AppJson(payload): AppJson<UpdateFieldRequest>,
) -> AppResult<impl IntoResponse> {
    payload.validate()?;
    let field = TaxonomyService::new(db).update_field(id, payload).await?;
    Ok(ApiResponse::ok(field))
}
