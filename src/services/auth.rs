use crate::{
    config::auth::AuthConfig,
    error::{conflict_on_unique, AppError, AppResult},
    models::{user, User, UserModel, UserRole},
    utils::{encode_token, hash_password, password::MIN_PASSWORD_LEN, verify_password},
};
use sea_orm::{ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, Set};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct RegisterRequest {
    /// Username (3-50 characters)
    #[validate(length(min = 3, max = 50))]
    pub username: String,
    /// Password (min 8 characters)
    #[validate(length(min = MIN_PASSWORD_LEN))]
    pub password: String,
    /// Display name
    #[validate(length(min = 1, max = 100))]
    pub name: String,
    /// Department, copied onto every ticket this user files
    #[validate(length(min = 1, max = 100))]
    pub department: String,
    #[validate(length(max = 30))]
    pub phone: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

/// The identity returned alongside a token.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct SessionUser {
    pub id: i32,
    pub username: String,
    pub name: String,
    pub role: UserRole,
}

impl From<&UserModel> for SessionUser {
    fn from(user: &UserModel) -> Self {
        Self {
            id: user.id,
            username: user.username.clone(),
            name: user.name.clone(),
            role: user.role,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct AuthResponse {
    /// JWT access token
    pub token: String,
    pub user: SessionUser,
}

pub struct AuthService {
    db: DatabaseConnection,
    config: AuthConfig,
}

impl AuthService {
    pub fn new(db: DatabaseConnection) -> Self {
        Self {
            db,
            config: AuthConfig::from_env(),
        }
    }

    /// Self-service sign-up. Always creates an END_USER account.
    pub async fn register(&self, req: RegisterRequest) -> AppResult<AuthResponse> {
        if !self.config.allow_self_registration {
            return Err(AppError::Forbidden);
        }

        let password_hash = hash_password(&req.password)?;
        let now = chrono::Utc::now().naive_utc();

        let user = user::ActiveModel {
            username: Set(req.username.trim().to_string()),
            password_hash: Set(password_hash),
            role: Set(UserRole::EndUser),
            name: Set(req.name.trim().to_string()),
            department: Set(Some(req.department.trim().to_string())),
            phone: Set(req
                .phone
                .map(|p| p.trim().to_string())
                .filter(|p| !p.is_empty())),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        }
        .insert(&self.db)
        .await
        .map_err(conflict_on_unique("Username already exists"))?;

        tracing::info!(user_id = user.id, "End user registered");
        self.issue(&user)
    }

    pub async fn login(&self, username: &str, password: &str) -> AppResult<AuthResponse> {
        let user = User::find()
            .filter(user::Column::Username.eq(username.trim()))
            .one(&self.db)
            .await?
            .ok_or(AppError::Unauthorized)?;

        if !verify_password(password, &user.password_hash)? {
            tracing::debug!(user_id = user.id, "Login rejected: bad password");
            return Err(AppError::Unauthorized);
        }

        self.issue(&user)
    }

    pub async fn get_user_by_id(&self, id: i32) -> AppResult<UserModel> {
        User::find_by_id(id)
            .one(&self.db)
            .await?
            .ok_or(AppError::NotFound)
    }

    fn issue(&self, user: &UserModel) -> AppResult<AuthResponse> {
        Ok(AuthResponse {
            token: encode_token(user.id, user.role)?,
            user: SessionUser::from(user),
        })
    }
}
