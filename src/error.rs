use axum::{
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use sea_orm::SqlErr;
use serde_json::json;
use thiserror::Error;

/// Rejections produced while checking a ticket's category/subcategory scope
/// and its custom field values.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TaxonomyError {
    #[error("Category or subcategory is invalid, inactive, or mismatched")]
    InvalidSelection,

    #[error("Missing required field: {label}")]
    MissingRequiredField { field_id: i32, label: String },

    #[error("Invalid value for field '{label}': {reason}")]
    InvalidFieldValue {
        field_id: i32,
        label: String,
        reason: String,
    },

    #[error("Unknown custom field: {0}")]
    UnknownField(i32),

    #[error("Custom field submitted more than once: {0}")]
    DuplicateField(i32),
}

impl TaxonomyError {
    pub fn code(&self) -> &'static str {
        match self {
            TaxonomyError::InvalidSelection => "INVALID_SELECTION",
            TaxonomyError::MissingRequiredField { .. } => "MISSING_REQUIRED_FIELD",
            TaxonomyError::InvalidFieldValue { .. } => "INVALID_FIELD_VALUE",
            TaxonomyError::UnknownField(_) => "UNKNOWN_FIELD",
            TaxonomyError::DuplicateField(_) => "DUPLICATE_FIELD",
        }
    }
}

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Database error: {0}")]
    Database(#[from] sea_orm::DbErr),

    #[error("Authentication failed")]
    Unauthorized,

    #[error("JWT error: {0}")]
    Jwt(#[from] jsonwebtoken::errors::Error),

    #[error("Not found")]
    NotFound,

    #[error("Forbidden")]
    Forbidden,

    #[error("Validation failed: {}", .0.join("; "))]
    Validation(Vec<String>),

    #[error(transparent)]
    Taxonomy(#[from] TaxonomyError),

    #[error("Assignee must be an existing ADMIN or AGENT user")]
    InvalidAssignee,

    #[error("No changes to apply")]
    NoChanges,

    #[error("User profile has no department set")]
    MissingProfileData,

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Dependency error: {0}")]
    Dependency(String),

    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    /// Single-message validation failure.
    pub fn validation(message: impl Into<String>) -> Self {
        AppError::Validation(vec![message.into()])
    }

    fn code(&self) -> &'static str {
        match self {
            AppError::Database(_) | AppError::Internal(_) => "INTERNAL",
            AppError::Unauthorized | AppError::Jwt(_) => "UNAUTHENTICATED",
            AppError::NotFound => "NOT_FOUND",
            AppError::Forbidden => "FORBIDDEN",
            AppError::Validation(_) => "VALIDATION_FAILED",
            AppError::Taxonomy(e) => e.code(),
            AppError::InvalidAssignee => "INVALID_ASSIGNEE",
            AppError::NoChanges => "NO_CHANGES",
            AppError::MissingProfileData => "MISSING_PROFILE_DATA",
            AppError::Conflict(_) => "CONFLICT",
            AppError::Dependency(_) => "DEPENDENCY_ERROR",
        }
    }
}

impl From<validator::ValidationErrors> for AppError {
    fn from(errors: validator::ValidationErrors) -> Self {
        let mut messages: Vec<String> = errors
            .field_errors()
            .into_iter()
            .flat_map(|(field, errs)| {
                errs.iter().map(move |err| match &err.message {
                    Some(message) => format!("{field}: {message}"),
                    None => format!("{field}: invalid ({})", err.code),
                })
            })
            .collect();
        messages.sort();
        AppError::Validation(messages)
    }
}

#[derive(serde::Serialize, utoipa::ToSchema)]
pub struct ErrorResponse {
    pub error: String,
    pub code: String,
    pub errors: Vec<String>,
}

impl utoipa::ToSchema for AppError {
    fn name() -> std::borrow::Cow<'static, str> {
        "ErrorResponse".into()
    }
}

impl utoipa::PartialSchema for AppError {
    fn schema() -> utoipa::openapi::RefOr<utoipa::openapi::schema::Schema> {
        <ErrorResponse as utoipa::PartialSchema>::schema()
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let code = self.code();
        let (status, code, error_message, errors) = match self {
            AppError::Database(e) => match e.sql_err() {
                Some(SqlErr::UniqueConstraintViolation(detail)) => {
                    tracing::debug!("Unique constraint violation: {}", detail);
                    (
                        StatusCode::CONFLICT,
                        "CONFLICT",
                        "Resource already exists".to_string(),
                        Vec::new(),
                    )
                }
                Some(SqlErr::ForeignKeyConstraintViolation(detail)) => {
                    tracing::debug!("Foreign key violation: {}", detail);
                    (
                        StatusCode::CONFLICT,
                        "DEPENDENCY_ERROR",
                        "Resource is referenced by other records".to_string(),
                        Vec::new(),
                    )
                }
                _ => {
                    tracing::error!("Database error: {:?}", e);
                    (
                        StatusCode::INTERNAL_SERVER_ERROR,
                        code,
                        "Internal server error".to_string(),
                        Vec::new(),
                    )
                }
            },
            AppError::Unauthorized => (
                StatusCode::UNAUTHORIZED,
                code,
                "Unauthorized".to_string(),
                Vec::new(),
            ),
            AppError::Jwt(e) => {
                tracing::debug!("JWT error: {:?}", e);
                (
                    StatusCode::UNAUTHORIZED,
                    code,
                    "Invalid token".to_string(),
                    Vec::new(),
                )
            }
            AppError::NotFound => (
                StatusCode::NOT_FOUND,
                code,
                "Resource not found".to_string(),
                Vec::new(),
            ),
            AppError::Forbidden => (
                StatusCode::FORBIDDEN,
                code,
                "Forbidden".to_string(),
                Vec::new(),
            ),
            AppError::Validation(messages) => (
                StatusCode::BAD_REQUEST,
                code,
                "Validation failed".to_string(),
                messages,
            ),
            AppError::Internal(e) => {
                tracing::error!("Internal error: {:?}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    code,
                    "Internal server error".to_string(),
                    Vec::new(),
                )
            }
            AppError::Conflict(msg) | AppError::Dependency(msg) => {
                (StatusCode::CONFLICT, code, msg.clone(), vec![msg])
            }
            other => {
                let msg = other.to_string();
                (StatusCode::BAD_REQUEST, code, msg.clone(), vec![msg])
            }
        };

        let body = json!({
            "error": error_message,
            "code": code,
            "errors": errors,
        });

        (status, Json(body)).into_response()
    }
}

pub type AppResult<T> = Result<T, AppError>;

/// Maps a unique-constraint violation to `Conflict(message)` and passes every
/// other database error through.
pub fn conflict_on_unique(message: &'static str) -> impl FnOnce(sea_orm::DbErr) -> AppError {
    move |err| match err.sql_err() {
        Some(SqlErr::UniqueConstraintViolation(_)) => AppError::Conflict(message.to_string()),
        _ => AppError::Database(err),
    }
}
