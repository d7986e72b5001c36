use crate::error::{AppError, AppResult};
use crate::middleware::AuthUser;
use crate::models::UserModel;
use crate::response::{ApiResponse, AppJson};
use crate::services::user::{CreateUserRequest, StaffMember, UpdateUserRequest, UserService};
use axum::{extract::Path, response::IntoResponse, Extension};
use sea_orm::DatabaseConnection;
use validator::Validate;

#[utoipa::path(
    get,
    path = "/api/v1/users",
    security(("jwt_token" = [])),
    responses(
        (status = 200, description = "ADMIN and AGENT accounts", body = Vec<StaffMember>),
        (status = 403, description = "Staff only", body = AppError),
    ),
    tag = "users"
)]
pub async fn list_staff(
    Extension(db): Extension<DatabaseConnection>,
) -> AppResult<impl IntoResponse> {
    Ok(ApiResponse::ok(UserService::new(db).list_staff().await?))
}

#[utoipa::path(
    get,
    path = "/api/v1/users/end-users",
    security(("jwt_token" = [])),
    responses(
        (status = 200, description = "END_USER accounts", body = Vec<UserModel>),
        (status = 403, description = "Staff only", body = AppError),
    ),
    tag = "users"
)]
pub async fn list_end_users(
    Extension(db): Extension<DatabaseConnection>,
) -> AppResult<impl IntoResponse> {
    Ok(ApiResponse::ok(UserService::new(db).list_end_users().await?))
}

#[utoipa::path(
    post,
    path = "/api/v1/users",
    security(("jwt_token" = [])),
    request_body = CreateUserRequest,
    responses(
        (status = 201, description = "User created", body = UserModel),
        (status = 400, description = "Validation error", body = AppError),
        (status = 403, description = "Role not allowed to create this account", body = AppError),
        (status = 409, description = "Username already exists", body = AppError),
    ),
    tag = "users"
)]
pub async fn create_user(
    Extension(db): Extension<DatabaseConnection>,
    auth_user: AuthUser,
    AppJson(payload): AppJson<CreateUserRequest>,
) -> AppResult<impl IntoResponse> {
    payload.validate()?;
    let user = UserService::new(db).create(&auth_user, payload).await?;
    Ok(ApiResponse::ok(user).created())
}

#[utoipa::path(
    patch,
    path = "/api/v1/users/{id}",
    security(("jwt_token" = [])),
    params(("id" = i32, Path, description = "User ID")),
    request_body = UpdateUserRequest,
    responses(
        (status = 200, description = "User updated", body = UserModel),
        (status = 400, description = "Validation error or nothing to change", body = AppError),
        (status = 403, description = "Not allowed to edit this account", body = AppError),
        (status = 404, description = "User not found", body = AppError),
    ),
    tag = "users"
)]
pub async fn update_user(
    Extension(db): Extension<DatabaseConnection>,
    auth_user: AuthUser,
    Path(id): Path<i32>,
    AppJson(payload): AppJson<UpdateUserRequest>,
) -> AppResult<impl IntoResponse> {
    payload.validate()?;
    let user = UserService::new(db).update(&auth_user, id, payload).await?;
    Ok(ApiResponse::ok(user))
}

#[utoipa::path(
    delete,
    path = "/api/v1/users/{id}",
    security(("jwt_token" = [])),
    params(("id" = i32, Path, description = "User ID")),
    responses(
        (status = 200, description = "User deleted"),
        (status = 403, description = "Not allowed to delete this account", body = AppError),
        (status = 404, description = "User not found", body = AppError),
        (status = 409, description = "User still referenced by tickets", body = AppError),
    ),
    tag = "users"
)]
pub async fn delete_user(
    Extension(db): Extension<DatabaseConnection>,
    auth_user: AuthUser,
    Path(id): Path<i32>,
) -> AppResult<impl IntoResponse> {
    UserService::new(db).delete(&auth_user, id).await?;
    Ok(ApiResponse::with_message((), "User deleted"))
}
