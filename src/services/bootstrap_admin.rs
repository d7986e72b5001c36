use crate::error::AppResult;
use crate::models::{user, User, UserRole};
use crate::utils::{hash_password, password::MIN_PASSWORD_LEN};
use sea_orm::{ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, Set};
use std::env;

#[derive(Debug, Clone)]
pub struct BootstrapAdminConfig {
    pub username: String,
    pub password: String,
    pub name: String,
}

impl BootstrapAdminConfig {
    /// `None` unless both `BOOTSTRAP_ADMIN_USERNAME` and
    /// `BOOTSTRAP_ADMIN_PASSWORD` are set.
    pub fn from_env() -> Option<Self> {
        let username = env::var("BOOTSTRAP_ADMIN_USERNAME")
            .ok()
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())?;
        let password = env::var("BOOTSTRAP_ADMIN_PASSWORD").ok()?;
        let name = env::var("BOOTSTRAP_ADMIN_NAME").unwrap_or_else(|_| "Administrator".to_string());

        Some(Self {
            username,
            password,
            name,
        })
    }
}

/// 启动时自动创建/提升管理员：
/// - 若库中已存在任意 ADMIN：不做任何事
/// - 否则若配置的 username 已存在：提升为 ADMIN
/// - 否则创建一个新的 ADMIN
pub async fn ensure_bootstrap_admin(db: &DatabaseConnection) -> AppResult<()> {
    let Some(cfg) = BootstrapAdminConfig::from_env() else {
        return Ok(());
    };

    let admin_exists = User::find()
        .filter(user::Column::Role.eq(UserRole::Admin))
        .one(db)
        .await?
        .is_some();
    if admin_exists {
        return Ok(());
    }

    let existing = User::find()
        .filter(user::Column::Username.eq(cfg.username.clone()))
        .one(db)
        .await?;

    let now = chrono::Utc::now().naive_utc();

    if let Some(existing) = existing {
        let user_id = existing.id;
        let mut active: user::ActiveModel = existing.into();
        active.role = Set(UserRole::Admin);
        active.updated_at = Set(now);
        active.update(db).await?;
        tracing::info!(user_id, "Promoted existing user to ADMIN");
        return Ok(());
    }

    if (cfg.password.len() as u64) < MIN_PASSWORD_LEN {
        tracing::warn!(
            "BOOTSTRAP_ADMIN_PASSWORD is shorter than {} characters; skipping admin bootstrap",
            MIN_PASSWORD_LEN
        );
        return Ok(());
    }

    let password_hash = hash_password(&cfg.password)?;

    let admin = user::ActiveModel {
        username: Set(cfg.username),
        password_hash: Set(password_hash),
        role: Set(UserRole::Admin),
        name: Set(cfg.name),
        department: Set(None),
        phone: Set(None),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    }
    .insert(db)
    .await?;

    tracing::info!(user_id = admin.id, "Bootstrap ADMIN account created");
    Ok(())
}
