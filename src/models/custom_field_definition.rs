use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize, ToSchema,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(20))")]
#[serde(rename_all = "lowercase")]
pub enum FieldType {
    #[sea_orm(string_value = "text")]
    Text,
    #[sea_orm(string_value = "number")]
    Number,
    #[sea_orm(string_value = "date")]
    Date,
    #[sea_orm(string_value = "checkbox")]
    Checkbox,
    #[sea_orm(string_value = "select")]
    Select,
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize, ToSchema)]
#[sea_orm(table_name = "ticket_custom_field_definitions")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub category_id: i32,
    /// `None` applies the field to every subcategory of the category.
    pub subcategory_id: Option<i32>,
    pub field_key: String,
    pub label: String,
    pub field_type: FieldType,
    pub required: bool,
    pub placeholder: Option<String>,
    #[sea_orm(column_type = "JsonBinary")]
    pub options_json: Json,
    pub sort_order: i32,
    pub is_active: bool,
    pub created_at: DateTime,
    pub updated_at: DateTime,
}

impl Model {
    /// Options of a `select` field; anything that is not a JSON string array
    /// yields an empty list.
    pub fn options(&self) -> Vec<String> {
        self.options_json
            .as_array()
            .map(|items| {
                items
                    .iter()
                    .filter_map(|v| v.as_str().map(str::to_string))
                    .collect()
            })
            .unwrap_or_default()
    }
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
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
}

impl ActiveModelBehavior for ActiveModel {}
