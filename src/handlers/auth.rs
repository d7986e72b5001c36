use crate::error::{AppError, AppResult};
use crate::middleware::AuthUser;
use crate::models::UserModel;
use crate::response::{ApiResponse, AppJson};
use crate::services::auth::{AuthResponse, AuthService, LoginRequest, RegisterRequest};
use axum::{response::IntoResponse, Extension};
use sea_orm::DatabaseConnection;
use validator::Validate;

#[utoipa::path(
    post,
    path = "/api/v1/auth/register",
    request_body = RegisterRequest,
    responses(
        (status = 201, description = "End user registered", body = AuthResponse),
        (status = 400, description = "Validation error", body = AppError),
        (status = 403, description = "Self registration disabled", body = AppError),
        (status = 409, description = "Username already exists", body = AppError),
    ),
    tag = "auth"
)]
pub async fn register(
    Extension(db): Extension<DatabaseConnection>,
    AppJson(payload): AppJson<RegisterRequest>,
) -> AppResult<impl IntoResponse> {
    payload.validate()?;

    let response = AuthService::new(db).register(payload).await?;
    Ok(ApiResponse::with_message(response, "Registration successful.").created())
}

#[utoipa::path(
    post,
    path = "/api/v1/auth/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Login successful", body = AuthResponse),
        (status = 401, description = "Invalid credentials", body = AppError),
    ),
    tag = "auth"
)]
pub async fn login(
    Extension(db): Extension<DatabaseConnection>,
    AppJson(payload): AppJson<LoginRequest>,
) -> AppResult<impl IntoResponse> {
    let response = AuthService::new(db)
        .login(&payload.username, &payload.password)
        .await?;
    Ok(ApiResponse::ok(response))
}

#[utoipa::path(
    get,
    path = "/api/v1/auth/me",
    security(("jwt_token" = [])),
    responses(
        (status = 200, description = "Current user profile", body = UserModel),
        (status = 401, description = "Not authenticated", body = AppError),
    ),
    tag = "auth"
)]
pub async fn me(
    Extension(db): Extension<DatabaseConnection>,
    auth_user: AuthUser,
) -> AppResult<impl IntoResponse> {
    let user = AuthService::new(db).get_user_by_id(auth_user.id).await?;
    Ok(ApiResponse::ok(user))
}
