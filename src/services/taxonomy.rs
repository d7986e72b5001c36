use crate::error::{conflict_on_unique, AppError, AppResult, TaxonomyError};
use crate::models::{
    custom_field_definition, ticket_category, ticket_subcategory, CustomFieldDefinition,
    CustomFieldDefinitionModel, FieldType, TicketCategory, TicketCategoryModel, TicketSubcategory,
    TicketSubcategoryModel,
};
use crate::utils::double_option;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, ConnectionTrait, DatabaseConnection, EntityTrait,
    QueryFilter, QueryOrder, Set,
};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use utoipa::ToSchema;
use validator::{Validate, ValidationError};

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateCategoryRequest {
    #[serde(deserialize_with = "crate::utils::trimmed")]
    #[validate(length(min = 2, max = 100, message = "Category name must be 2-100 characters"))]
    pub name: String,
    #[validate(length(max = 400))]
    pub description: Option<String>,
    #[validate(range(min = 0))]
    pub sort_order: Option<i32>,
}

#[derive(Debug, Default, Deserialize, Validate, ToSchema)]
pub struct UpdateCategoryRequest {
    #[serde(default, deserialize_with = "crate::utils::trimmed_option")]
    #[validate(length(min = 2, max = 100, message = "Category name must be 2-100 characters"))]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "double_option")]
    #[schema(value_type = Option<String>)]
    pub description: Option<Option<String>>,
    #[validate(range(min = 0))]
    pub sort_order: Option<i32>,
    pub is_active: Option<bool>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateSubcategoryRequest {
    pub category_id: i32,
    #[serde(deserialize_with = "crate::utils::trimmed")]
    #[validate(length(min = 2, max = 120, message = "Subcategory name must be 2-120 characters"))]
    pub name: String,
    #[validate(length(max = 400))]
    pub description: Option<String>,
    #[validate(range(min = 0))]
    pub sort_order: Option<i32>,
}

#[derive(Debug, Default, Deserialize, Validate, ToSchema)]
pub struct UpdateSubcategoryRequest {
    #[serde(default, deserialize_with = "crate::utils::trimmed_option")]
    #[validate(length(min = 2, max = 120, message = "Subcategory name must be 2-120 characters"))]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "double_option")]
    #[schema(value_type = Option<String>)]
    pub description: Option<Option<String>>,
    #[validate(range(min = 0))]
    pub sort_order: Option<i32>,
    pub is_active: Option<bool>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateFieldRequest {
    pub category_id: i32,
    pub subcategory_id: Option<i32>,
    #[validate(
        length(min = 2, max = 120),
        custom(function = "validate_field_key")
    )]
    pub field_key: String,
    #[validate(length(min = 2, max = 120))]
    pub label: String,
    pub field_type: FieldType,
    #[serde(default)]
    pub required: bool,
    #[validate(length(max = 255))]
    pub placeholder: Option<String>,
    #[serde(default)]
    pub options: Vec<String>,
    #[validate(range(min = 0))]
    pub sort_order: Option<i32>,
}

/// `field_key`, `field_type` and the scope are fixed once a field exists;
/// values already stored against it depend on them.
#[derive(Debug, Default, Deserialize, Validate, ToSchema)]
pub struct UpdateFieldRequest {
    #[validate(length(min = 2, max = 120))]
    pub label: Option<String>,
    pub required: Option<bool>,
    #[serde(default, deserialize_with = "double_option")]
    #[schema(value_type = Option<String>)]
    pub placeholder: Option<Option<String>>,
    pub options: Option<Vec<String>>,
    #[validate(range(min = 0))]
    pub sort_order: Option<i32>,
    pub is_active: Option<bool>,
}

fn validate_field_key(key: &str) -> Result<(), ValidationError> {
    if key
        .chars()
        .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_')
    {
        Ok(())
    } else {
        let mut err = ValidationError::new("field_key");
        err.message = Some("field_key must be lowercase snake_case".into());
        Err(err)
    }
}

/// A field definition as shown to clients picking values for a ticket.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct FieldDefinitionView {
    pub id: i32,
    pub category_id: i32,
    pub subcategory_id: Option<i32>,
    pub subcategory_name: Option<String>,
    pub field_key: String,
    pub label: String,
    pub field_type: FieldType,
    pub required: bool,
    pub placeholder: Option<String>,
    pub options: Vec<String>,
    pub sort_order: i32,
    pub is_active: bool,
}

impl FieldDefinitionView {
    fn new(def: CustomFieldDefinitionModel, subcategory_name: Option<String>) -> Self {
        let options = def.options();
        Self {
            id: def.id,
            category_id: def.category_id,
            subcategory_id: def.subcategory_id,
            subcategory_name,
            field_key: def.field_key,
            label: def.label,
            field_type: def.field_type,
            required: def.required,
            placeholder: def.placeholder,
            options,
            sort_order: def.sort_order,
            is_active: def.is_active,
        }
    }
}

/// Confirms that the category and subcategory exist, are active and belong
/// together, then returns the active field definitions visible at that
/// scope: category-wide ones plus those pinned to the subcategory, ordered
/// by `sort_order, id`.
pub async fn resolve_scope<C: ConnectionTrait>(
    conn: &C,
    category_id: i32,
    subcategory_id: i32,
) -> AppResult<Vec<CustomFieldDefinitionModel>> {
    let category_ok = TicketCategory::find_by_id(category_id)
        .filter(ticket_category::Column::IsActive.eq(true))
        .one(conn)
        .await?
        .is_some();
    let subcategory_ok = TicketSubcategory::find_by_id(subcategory_id)
        .filter(ticket_subcategory::Column::IsActive.eq(true))
        .filter(ticket_subcategory::Column::CategoryId.eq(category_id))
        .one(conn)
        .await?
        .is_some();

    if !category_ok || !subcategory_ok {
        return Err(TaxonomyError::InvalidSelection.into());
    }

    Ok(active_definitions(conn, category_id, Some(subcategory_id)).await?)
}

async fn active_definitions<C: ConnectionTrait>(
    conn: &C,
    category_id: i32,
    subcategory_id: Option<i32>,
) -> Result<Vec<CustomFieldDefinitionModel>, sea_orm::DbErr> {
    let scope = match subcategory_id {
        Some(id) => Condition::any()
            .add(custom_field_definition::Column::SubcategoryId.is_null())
            .add(custom_field_definition::Column::SubcategoryId.eq(id)),
        None => Condition::all().add(custom_field_definition::Column::SubcategoryId.is_null()),
    };

    CustomFieldDefinition::find()
        .filter(custom_field_definition::Column::CategoryId.eq(category_id))
        .filter(custom_field_definition::Column::IsActive.eq(true))
        .filter(scope)
        .order_by_asc(custom_field_definition::Column::SortOrder)
        .order_by_asc(custom_field_definition::Column::Id)
        .all(conn)
        .await
}

fn clean_options(options: Vec<String>) -> AppResult<Vec<String>> {
    let options: Vec<String> = options
        .into_iter()
        .map(|o| o.trim().to_string())
        .filter(|o| !o.is_empty())
        .collect();
    if options.is_empty() {
        return Err(AppError::validation(
            "Select fields require at least one option",
        ));
    }
    Ok(options)
}

fn trimmed(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

pub struct TaxonomyService {
    db: DatabaseConnection,
}

impl TaxonomyService {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    pub async fn list_categories(&self, include_inactive: bool) -> AppResult<Vec<TicketCategoryModel>> {
        let mut query = TicketCategory::find();
        if !include_inactive {
            query = query.filter(ticket_category::Column::IsActive.eq(true));
        }
        Ok(query
            .order_by_asc(ticket_category::Column::SortOrder)
            .order_by_asc(ticket_category::Column::Name)
            .all(&self.db)
            .await?)
    }

    pub async fn list_subcategories(
        &self,
        category_id: i32,
        include_inactive: bool,
    ) -> AppResult<Vec<TicketSubcategoryModel>> {
        TicketCategory::find_by_id(category_id)
            .one(&self.db)
            .await?
            .ok_or(AppError::NotFound)?;

        let mut query =
            TicketSubcategory::find().filter(ticket_subcategory::Column::CategoryId.eq(category_id));
        if !include_inactive {
            query = query.filter(ticket_subcategory::Column::IsActive.eq(true));
        }
        Ok(query
            .order_by_asc(ticket_subcategory::Column::SortOrder)
            .order_by_asc(ticket_subcategory::Column::Name)
            .all(&self.db)
            .await?)
    }

    /// Active definitions for a category; with a subcategory, its pinned
    /// definitions are included alongside the category-wide ones.
    pub async fn list_fields(
        &self,
        category_id: i32,
        subcategory_id: Option<i32>,
    ) -> AppResult<Vec<FieldDefinitionView>> {
        let definitions = active_definitions(&self.db, category_id, subcategory_id).await?;

        let subcategory_ids: Vec<i32> = definitions.iter().filter_map(|d| d.subcategory_id).collect();
        let names: HashMap<i32, String> = if subcategory_ids.is_empty() {
            HashMap::new()
        } else {
            TicketSubcategory::find()
                .filter(ticket_subcategory::Column::Id.is_in(subcategory_ids))
                .all(&self.db)
                .await?
                .into_iter()
                .map(|s| (s.id, s.name))
                .collect()
        };

        Ok(definitions
            .into_iter()
            .map(|def| {
                let name = def.subcategory_id.and_then(|id| names.get(&id).cloned());
                FieldDefinitionView::new(def, name)
            })
            .collect())
    }

    pub async fn create_category(&self, req: CreateCategoryRequest) -> AppResult<TicketCategoryModel> {
        let now = chrono::Utc::now().naive_utc();
        let category = ticket_category::ActiveModel {
            name: Set(req.name.trim().to_string()),
            description: Set(trimmed(req.description)),
            sort_order: Set(req.sort_order.unwrap_or(0)),
            is_active: Set(true),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        }
        .insert(&self.db)
        .await
        .map_err(conflict_on_unique("Category already exists"))?;

        tracing::info!(category_id = category.id, "Ticket category created");
        Ok(category)
    }

    pub async fn update_category(
        &self,
        id: i32,
        req: UpdateCategoryRequest,
    ) -> AppResult<TicketCategoryModel> {
        let existing = TicketCategory::find_by_id(id)
            .one(&self.db)
            .await?
            .ok_or(AppError::NotFound)?;

        let mut active: ticket_category::ActiveModel = existing.into();
        let mut changed = false;
        if let Some(name) = req.name {
            active.name = Set(name.trim().to_string());
            changed = true;
        }
        if let Some(description) = req.description {
            active.description = Set(trimmed(description));
            changed = true;
        }
        if let Some(sort_order) = req.sort_order {
            active.sort_order = Set(sort_order);
            changed = true;
        }
        if let Some(is_active) = req.is_active {
            active.is_active = Set(is_active);
            changed = true;
        }
        if !changed {
            return Err(AppError::NoChanges);
        }
        active.updated_at = Set(chrono::Utc::now().naive_utc());

        Ok(active
            .update(&self.db)
            .await
            .map_err(conflict_on_unique("Category already exists"))?)
    }

    pub async fn create_subcategory(
        &self,
        req: CreateSubcategoryRequest,
    ) -> AppResult<TicketSubcategoryModel> {
        TicketCategory::find_by_id(req.category_id)
            .filter(ticket_category::Column::IsActive.eq(true))
            .one(&self.db)
            .await?
            .ok_or_else(|| AppError::validation("Category not found or inactive"))?;

        let now = chrono::Utc::now().naive_utc();
        let subcategory = ticket_subcategory::ActiveModel {
            category_id: Set(req.category_id),
            name: Set(req.name.trim().to_string()),
            description: Set(trimmed(req.description)),
            sort_order: Set(req.sort_order.unwrap_or(0)),
            is_active: Set(true),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        }
        .insert(&self.db)
        .await
        .map_err(conflict_on_unique("Subcategory already exists for this category"))?;

        tracing::info!(
            subcategory_id = subcategory.id,
            category_id = subcategory.category_id,
            "Ticket subcategory created"
        );
        Ok(subcategory)
    }

    pub async fn update_subcategory(
        &self,
        id: i32,
        req: UpdateSubcategoryRequest,
    ) -> AppResult<TicketSubcategoryModel> {
        let existing = TicketSubcategory::find_by_id(id)
            .one(&self.db)
            .await?
            .ok_or(AppError::NotFound)?;

        let mut active: ticket_subcategory::ActiveModel = existing.into();
        let mut changed = false;
        if let Some(name) = req.name {
            active.name = Set(name.trim().to_string());
            changed = true;
        }
        if let Some(description) = req.description {
            active.description = Set(trimmed(description));
            changed = true;
        }
        if let Some(sort_order) = req.sort_order {
            active.sort_order = Set(sort_order);
            changed = true;
        }
        if let Some(is_active) = req.is_active {
            active.is_active = Set(is_active);
            changed = true;
        }
        if !changed {
            return Err(AppError::NoChanges);
        }
        active.updated_at = Set(chrono::Utc::now().naive_utc());

        Ok(active
            .update(&self.db)
            .await
            .map_err(conflict_on_unique("Subcategory already exists for this category"))?)
    }

    pub async fn create_field(&self, req: CreateFieldRequest) -> AppResult<FieldDefinitionView> {
        let options = if req.field_type == FieldType::Select {
            clean_options(req.options)?
        } else {
            Vec::new()
        };

        TicketCategory::find_by_id(req.category_id)
            .filter(ticket_category::Column::IsActive.eq(true))
            .one(&self.db)
            .await?
            .ok_or_else(|| AppError::validation("Category not found or inactive"))?;

        let subcategory_name = match req.subcategory_id {
            Some(subcategory_id) => {
                let subcategory = TicketSubcategory::find_by_id(subcategory_id)
                    .filter(ticket_subcategory::Column::CategoryId.eq(req.category_id))
                    .one(&self.db)
                    .await?
                    .ok_or_else(|| {
                        AppError::validation("Subcategory does not belong to selected category")
                    })?;
                Some(subcategory.name)
            }
            None => None,
        };

        let now = chrono::Utc::now().naive_utc();
        let definition = custom_field_definition::ActiveModel {
            category_id: Set(req.category_id),
            subcategory_id: Set(req.subcategory_id),
            field_key: Set(req.field_key),
            label: Set(req.label.trim().to_string()),
            field_type: Set(req.field_type),
            required: Set(req.required),
            placeholder: Set(trimmed(req.placeholder)),
            options_json: Set(serde_json::json!(options)),
            sort_order: Set(req.sort_order.unwrap_or(0)),
            is_active: Set(true),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        }
        .insert(&self.db)
        .await
        .map_err(conflict_on_unique(
            "Field key already exists for this category/subcategory scope",
        ))?;

        tracing::info!(
            field_id = definition.id,
            field_key = %definition.field_key,
            "Custom field definition created"
        );
        Ok(FieldDefinitionView::new(definition, subcategory_name))
    }

    pub async fn update_field(&self, id: i32, req: UpdateFieldRequest) -> AppResult<FieldDefinitionView> {
        let existing = CustomFieldDefinition::find_by_id(id)
            .one(&self.db)
            .await?
            .ok_or(AppError::NotFound)?;
        let field_type = existing.field_type;
        let subcategory_id = existing.subcategory_id;

        let mut active: custom_field_definition::ActiveModel = existing.into();
        let mut changed = false;
        if let Some(label) = req.label {
            active.label = Set(label.trim().to_string());
            changed = true;
        }
        if let Some(required) = req.required {
            active.required = Set(required);
            changed = true;
        }
        if let Some(placeholder) = req.placeholder {
            active.placeholder = Set(trimmed(placeholder));
            changed = true;
        }
        if let Some(options) = req.options {
            if field_type != FieldType::Select {
                return Err(AppError::validation("Only select fields have options"));
            }
            active.options_json = Set(serde_json::json!(clean_options(options)?));
            changed = true;
        }
        if let Some(sort_order) = req.sort_order {
            active.sort_order = Set(sort_order);
            changed = true;
        }
        if let Some(is_active) = req.is_active {
            active.is_active = Set(is_active);
            changed = true;
        }
        if !changed {
            return Err(AppError::NoChanges);
        }
        active.updated_at = Set(chrono::Utc::now().naive_utc());

        let definition = active.update(&self.db).await?;
        let subcategory_name = match subcategory_id {
            Some(sid) => TicketSubcategory::find_by_id(sid)
                .one(&self.db)
                .await?
                .map(|s| s.name),
            None => None,
        };
        Ok(FieldDefinitionView::new(definition, subcategory_name))
    }
}
