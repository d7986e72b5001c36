use crate::{
    error::{AppError, AppResult},
    models::{User, UserModel, UserRole},
    utils::jwt::decode_jwt,
};
use axum::{
    extract::{FromRequestParts, Request, State},
    http::HeaderMap,
    middleware::Next,
    response::Response,
    Extension,
};
use sea_orm::{DatabaseConnection, EntityTrait};

/// Identity of the caller, attached to the request by [`auth_middleware`]
/// and passed explicitly into the services.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub id: i32,
    pub username: String,
    pub role: UserRole,
    pub name: String,
}

impl From<&UserModel> for AuthUser {
    fn from(user: &UserModel) -> Self {
        Self {
            id: user.id,
            username: user.username.clone(),
            role: user.role,
            name: user.name.clone(),
        }
    }
}

impl AuthUser {
    pub fn is_staff(&self) -> bool {
        self.role.is_staff()
    }

    /// Fails with `Forbidden` unless the caller's role is in `allowed`.
    pub fn ensure(&self, allowed: AllowedRoles) -> AppResult<()> {
        if allowed.permits(self.role) {
            Ok(())
        } else {
            Err(AppError::Forbidden)
        }
    }
}

/// Role allow-list for a group of routes.
#[derive(Debug, Clone, Copy)]
pub struct AllowedRoles(pub &'static [UserRole]);

impl AllowedRoles {
    pub const ANY: AllowedRoles =
        AllowedRoles(&[UserRole::Admin, UserRole::Agent, UserRole::EndUser]);
    pub const STAFF: AllowedRoles = AllowedRoles(&[UserRole::Admin, UserRole::Agent]);
    pub const ADMIN: AllowedRoles = AllowedRoles(&[UserRole::Admin]);

    pub fn permits(&self, role: UserRole) -> bool {
        self.0.contains(&role)
    }
}

/// Verifies the bearer token, re-reads the user row so role changes and
/// deletions apply immediately, and stores an [`AuthUser`] in the request
/// extensions.
pub async fn auth_middleware(
    Extension(db): Extension<DatabaseConnection>,
    headers: HeaderMap,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let token = extract_bearer_token(&headers).ok_or(AppError::Unauthorized)?;

    let claims = decode_jwt(&token).map_err(|_| AppError::Unauthorized)?;
    let user_id = claims.user_id().ok_or(AppError::Unauthorized)?;

    let user = User::find_by_id(user_id)
        .one(&db)
        .await?
        .ok_or(AppError::Unauthorized)?;

    request.extensions_mut().insert(AuthUser::from(&user));

    Ok(next.run(request).await)
}

/// Route layer enforcing an [`AllowedRoles`] list. Must sit inside
/// [`auth_middleware`].
pub async fn require_roles(
    State(allowed): State<AllowedRoles>,
    request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let auth_user = request
        .extensions()
        .get::<AuthUser>()
        .ok_or(AppError::Unauthorized)?;

    if !allowed.permits(auth_user.role) {
        tracing::debug!(
            user_id = auth_user.id,
            role = auth_user.role.as_str(),
            "Role not permitted for {}",
            request.uri().path()
        );
        return Err(AppError::Forbidden);
    }

    Ok(next.run(request).await)
}

fn extract_bearer_token(headers: &HeaderMap) -> Option<String> {
    let auth_header = headers
        .get(axum::http::header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok())?;

    let token = auth_header.strip_prefix("Bearer ")?.trim();
    if token.is_empty() {
        None
    } else {
        Some(token.to_string())
    }
}

impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut axum::http::request::Parts,
        _state: &S,
    ) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthUser>()
            .cloned()
            .ok_or(AppError::Unauthorized)
    }
}
