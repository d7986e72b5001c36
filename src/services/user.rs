use crate::{
    error::{conflict_on_unique, AppError, AppResult},
    middleware::AuthUser,
    models::{ticket, user, Ticket, User, UserModel, UserRole},
    utils::{double_option, hash_password, password::MIN_PASSWORD_LEN},
};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, DatabaseConnection, EntityTrait, PaginatorTrait,
    QueryFilter, QueryOrder, Set,
};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateUserRequest {
    #[validate(length(min = 3, max = 50))]
    pub username: String,
    #[validate(length(min = MIN_PASSWORD_LEN))]
    pub password: String,
    #[validate(length(min = 1, max = 100))]
    pub name: String,
    pub role: UserRole,
    /// Required for END_USER accounts
    #[validate(length(max = 100))]
    pub department: Option<String>,
    #[validate(length(max = 30))]
    pub phone: Option<String>,
}

#[derive(Debug, Default, Deserialize, Validate, ToSchema)]
pub struct UpdateUserRequest {
    #[validate(length(min = 1, max = 100))]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "double_option")]
    #[schema(value_type = Option<String>)]
    pub department: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    #[schema(value_type = Option<String>)]
    pub phone: Option<Option<String>>,
    pub role: Option<UserRole>,
    #[validate(length(min = MIN_PASSWORD_LEN))]
    pub password: Option<String>,
}

/// Entry of the assignee picker.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct StaffMember {
    pub id: i32,
    pub name: String,
    pub role: UserRole,
}

fn clean(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// AGENT accounts manage END_USER accounts only; ADMIN manages everyone.
fn ensure_can_manage(caller: &AuthUser, target_role: UserRole) -> AppResult<()> {
    match caller.role {
        UserRole::Admin => Ok(()),
        UserRole::Agent if target_role == UserRole::EndUser => Ok(()),
        _ => Err(AppError::Forbidden),
    }
}

fn ensure_department(role: UserRole, department: Option<&str>) -> AppResult<()> {
    if role == UserRole::EndUser && department.is_none() {
        return Err(AppError::validation(
            "department: Department is required for END_USER accounts",
        ));
    }
    Ok(())
}

pub struct UserService {
    db: DatabaseConnection,
}

impl UserService {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    pub async fn list_staff(&self) -> AppResult<Vec<StaffMember>> {
        let staff = User::find()
            .filter(user::Column::Role.is_in([UserRole::Admin, UserRole::Agent]))
            .order_by_asc(user::Column::Name)
            .all(&self.db)
            .await?;

        Ok(staff
            .into_iter()
            .map(|u| StaffMember {
                id: u.id,
                name: u.name,
                role: u.role,
            })
            .collect())
    }

    pub async fn list_end_users(&self) -> AppResult<Vec<UserModel>> {
        Ok(User::find()
            .filter(user::Column::Role.eq(UserRole::EndUser))
            .order_by_asc(user::Column::Name)
            .all(&self.db)
            .await?)
    }

    pub async fn create(&self, caller: &AuthUser, req: CreateUserRequest) -> AppResult<UserModel> {
        ensure_can_manage(caller, req.role)?;

        let department = clean(req.department);
        ensure_department(req.role, department.as_deref())?;

        let password_hash = hash_password(&req.password)?;
        let now = chrono::Utc::now().naive_utc();

        let created = user::ActiveModel {
            username: Set(req.username.trim().to_string()),
            password_hash: Set(password_hash),
            role: Set(req.role),
            name: Set(req.name.trim().to_string()),
            department: Set(department),
            phone: Set(clean(req.phone)),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        }
        .insert(&self.db)
        .await
        .map_err(conflict_on_unique("Username already exists"))?;

        tracing::info!(
            user_id = created.id,
            role = created.role.as_str(),
            created_by = caller.id,
            "User created"
        );
        Ok(created)
    }

    pub async fn update(&self, caller: &AuthUser, id: i32, req: UpdateUserRequest) -> AppResult<UserModel> {
        let existing = User::find_by_id(id)
            .one(&self.db)
            .await?
            .ok_or(AppError::NotFound)?;
        ensure_can_manage(caller, existing.role)?;

        let role = match req.role {
            Some(role) if role != existing.role => {
                if caller.role != UserRole::Admin || caller.id == id {
                    return Err(AppError::Forbidden);
                }
                Some(role)
            }
            _ => None,
        };
        let department = req.department.map(clean);
        let final_department = match &department {
            Some(d) => d.clone(),
            None => existing.department.clone(),
        };
        ensure_department(role.unwrap_or(existing.role), final_department.as_deref())?;

        // Assignees must stay staff.
        if role.is_some_and(|r| !r.is_staff()) {
            let assigned = Ticket::find()
                .filter(ticket::Column::AssigneeId.eq(id))
                .count(&self.db)
                .await?;
            if assigned > 0 {
                return Err(AppError::Dependency(format!(
                    "User is assigned to {assigned} ticket(s); reassign them first"
                )));
            }
        }

        let mut active: user::ActiveModel = existing.into();
        let mut changed = false;
        if let Some(name) = req.name {
            active.name = Set(name.trim().to_string());
            changed = true;
        }
        if let Some(department) = department {
            active.department = Set(department);
            changed = true;
        }
        if let Some(phone) = req.phone {
            active.phone = Set(clean(phone));
            changed = true;
        }
        if let Some(role) = role {
            active.role = Set(role);
            changed = true;
        }
        if let Some(password) = req.password {
            active.password_hash = Set(hash_password(&password)?);
            changed = true;
        }
        if !changed {
            return Err(AppError::NoChanges);
        }
        active.updated_at = Set(chrono::Utc::now().naive_utc());

        let updated = active.update(&self.db).await?;
        tracing::info!(user_id = id, updated_by = caller.id, "User updated");
        Ok(updated)
    }

    /// Refuses while any ticket still names the user as creator or assignee.
    pub async fn delete(&self, caller: &AuthUser, id: i32) -> AppResult<()> {
        if caller.id == id {
            return Err(AppError::validation("You cannot delete your own account"));
        }

        let existing = User::find_by_id(id)
            .one(&self.db)
            .await?
            .ok_or(AppError::NotFound)?;
        ensure_can_manage(caller, existing.role)?;

        let referencing = Ticket::find()
            .filter(
                Condition::any()
                    .add(ticket::Column::AssigneeId.eq(id))
                    .add(ticket::Column::CreatedBy.eq(id)),
            )
            .count(&self.db)
            .await?;
        if referencing > 0 {
            return Err(AppError::Dependency(format!(
                "User is referenced by {referencing} ticket(s); reassign them first"
            )));
        }

        User::delete_by_id(id).exec(&self.db).await?;
        tracing::info!(user_id = id, deleted_by = caller.id, "User deleted");
        Ok(())
    }
}
