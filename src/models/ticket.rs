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
pub enum TicketStatus {
    #[sea_orm(string_value = "OPEN")]
    Open,
    #[sea_orm(string_value = "IN_PROGRESS")]
    InProgress,
    #[sea_orm(string_value = "RESOLVED")]
    Resolved,
}

impl TicketStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TicketStatus::Open => "OPEN",
            TicketStatus::InProgress => "IN_PROGRESS",
            TicketStatus::Resolved => "RESOLVED",
        }
    }

    pub fn is_active(&self) -> bool {
        matches!(self, TicketStatus::Open | TicketStatus::InProgress)
    }
}

impl std::str::FromStr for TicketStatus {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "OPEN" => Ok(TicketStatus::Open),
            "IN_PROGRESS" => Ok(TicketStatus::InProgress),
            "RESOLVED" => Ok(TicketStatus::Resolved),
            _ => Err(()),
        }
    }
}

#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    EnumIter,
    DeriveActiveEnum,
    Serialize,
    Deserialize,
    ToSchema,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(20))")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TicketPriority {
    #[sea_orm(string_value = "HIGH")]
    High,
    #[sea_orm(string_value = "MEDIUM")]
    Medium,
    #[sea_orm(string_value = "LOW")]
    Low,
}

impl TicketPriority {
    pub fn as_str(&self) -> &'static str {
        match self {
            TicketPriority::High => "HIGH",
            TicketPriority::Medium => "MEDIUM",
            TicketPriority::Low => "LOW",
        }
    }
}

impl std::str::FromStr for TicketPriority {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "HIGH" => Ok(TicketPriority::High),
            "MEDIUM" => Ok(TicketPriority::Medium),
            "LOW" => Ok(TicketPriority::Low),
            _ => Err(()),
        }
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize, ToSchema)]
#[sea_orm(table_name = "tickets")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub caller_name: String,
    pub department: String,
    pub phone: Option<String>,
    #[sea_orm(column_type = "Text")]
    pub description: String,
    pub priority: TicketPriority,
    pub status: TicketStatus,
    pub assignee_id: Option<i32>,
    pub created_by: i32,
    pub category_id: Option<i32>,
    pub subcategory_id: Option<i32>,
    #[sea_orm(column_type = "Text", nullable)]
    pub resolution_note: Option<String>,
    pub created_at: DateTime,
    pub updated_at: DateTime,
    pub closed_at: Option<DateTime>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::CreatedBy",
        to = "super::user::Column::Id"
    )]
    Creator,
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::AssigneeId",
        to = "super::user::Column::Id"
    )]
    Assignee,
    #[sea_orm(
        belongs_to = "super::ticket_category::Entity",
        from = "Column::CategoryId",
        to = "super::ticket_category::Column::Id"
    )]
    Category,
    #[sea_orm(
        belongs_to = "super::ticket_subcategory::Entity",
        from = "Column::SubcategoryId",
        to = "super::ticket_subcategory::Column::Id"
    )]
    Subcategory,
    #[sea_orm(has_many = "super::ticket_note::Entity")]
    Notes,
    #[sea_orm(has_many = "super::ticket_history::Entity")]
    History,
    #[sea_orm(has_many = "super::custom_field_value::Entity")]
    CustomFieldValues,
}

impl Related<super::ticket_category::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Category.def()
    }
}

impl Related<super::ticket_subcategory::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Subcategory.def()
    }
}

impl Related<super::ticket_note::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Notes.def()
    }
}

impl Related<super::ticket_history::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::History.def()
    }
}

impl Related<super::custom_field_value::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::CustomFieldValues.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

#[cfg(test)]
mod tests {
    use super::*;
    use sea_orm::Iterable;

    #[test]
    fn status_strings_round_trip() {
        for status in TicketStatus::iter() {
            assert_eq!(status.as_str().parse::<TicketStatus>(), Ok(status));
        }
    }

    #[test]
    fn priority_strings_round_trip() {
        for priority in TicketPriority::iter() {
            assert_eq!(priority.as_str().parse::<TicketPriority>(), Ok(priority));
        }
        assert!("URGENT".parse::<TicketPriority>().is_err());
    }

    #[test]
    fn only_open_and_in_progress_are_active() {
        assert!(TicketStatus::Open.is_active());
        assert!(TicketStatus::InProgress.is_active());
        assert!(!TicketStatus::Resolved.is_active());
    }

    #[test]
    fn priority_orders_high_first() {
        let mut priorities = vec![
            TicketPriority::Low,
            TicketPriority::High,
            TicketPriority::Medium,
        ];
        priorities.sort();
        assert_eq!(
            priorities,
            vec![
                TicketPriority::High,
                TicketPriority::Medium,
                TicketPriority::Low
            ]
        );
    }
}
