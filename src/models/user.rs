use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    EnumIter,
    DeriveActiveEnum,
    Serialize,
    Deserialize,
    ToSchema,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(20))")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum UserRole {
    #[sea_orm(string_value = "ADMIN")]
    Admin,
    #[sea_orm(string_value = "AGENT")]
    Agent,
    #[sea_orm(string_value = "END_USER")]
    EndUser,
}

impl UserRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            UserRole::Admin => "ADMIN",
            UserRole::Agent => "AGENT",
            UserRole::EndUser => "END_USER",
        }
    }

    /// ADMIN and AGENT accounts work tickets; END_USER accounts only file them.
    pub fn is_staff(&self) -> bool {
        matches!(self, UserRole::Admin | UserRole::Agent)
    }
}

impl std::str::FromStr for UserRole {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "ADMIN" => Ok(UserRole::Admin),
            "AGENT" => Ok(UserRole::Agent),
            "END_USER" => Ok(UserRole::EndUser),
            _ => Err(()),
        }
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize, ToSchema)]
#[sea_orm(table_name = "users")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    #[sea_orm(unique)]
    pub username: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub role: UserRole,
    pub name: String,
    pub department: Option<String>,
    pub phone: Option<String>,
    pub created_at: DateTime,
    pub updated_at: DateTime,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

#[cfg(test)]
mod tests {
    use super::*;
    use sea_orm::Iterable;

    #[test]
    fn role_strings_round_trip() {
        for role in UserRole::iter() {
            assert_eq!(role.as_str().parse::<UserRole>(), Ok(role));
        }
        assert!("SUPERUSER".parse::<UserRole>().is_err());
    }

    #[test]
    fn only_admins_and_agents_are_staff() {
        assert!(UserRole::Admin.is_staff());
        assert!(UserRole::Agent.is_staff());
        assert!(!UserRole::EndUser.is_staff());
    }

    #[test]
    fn role_serializes_in_screaming_case() {
        assert_eq!(
            serde_json::to_value(UserRole::EndUser).unwrap(),
            serde_json::json!("END_USER")
        );
    }
}
