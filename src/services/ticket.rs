use crate::error::{AppError, AppResult};
use crate::middleware::AuthUser;
use crate::models::{
    custom_field_definition, custom_field_value, ticket, ticket_category, ticket_history,
    ticket_note, ticket_subcategory, user, CustomFieldDefinition, CustomFieldValue, FieldType,
    HistoryAction, Ticket, TicketCategory, TicketModel, TicketPriority, TicketStatus,
    TicketSubcategory, User, UserModel, UserRole,
};
use crate::services::custom_fields::{validate_submission, SubmittedFieldValue};
use crate::services::taxonomy::resolve_scope;
use crate::utils::double_option;
use chrono::NaiveDateTime;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait,
    FromQueryResult, Order, PaginatorTrait, QueryFilter, QueryOrder, Select, Set, Statement,
    TransactionTrait,
};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use utoipa::ToSchema;
use validator::Validate;

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateTicketRequest {
    /// Ignored for END_USER callers; taken from their profile.
    #[validate(length(max = 100))]
    pub caller_name: Option<String>,
    /// Ignored for END_USER callers; taken from their profile.
    #[validate(length(max = 100))]
    pub department: Option<String>,
    #[validate(length(max = 30))]
    pub phone: Option<String>,
    #[validate(length(min = 1, max = 5000, message = "Description is required"))]
    pub description: String,
    pub priority: TicketPriority,
    pub category_id: i32,
    pub subcategory_id: i32,
    #[serde(default)]
    pub custom_fields: Vec<SubmittedFieldValue>,
}

#[derive(Debug, Default, Deserialize, Validate, ToSchema)]
pub struct UpdateTicketRequest {
    pub status: Option<TicketStatus>,
    /// `null` unassigns the ticket.
    #[serde(default, deserialize_with = "double_option")]
    #[schema(value_type = Option<i32>)]
    pub assignee_id: Option<Option<i32>>,
    /// Stored verbatim; an empty string is still a change.
    #[validate(length(max = 5000))]
    pub resolution_note: Option<String>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateNoteRequest {
    #[validate(length(min = 1, max = 5000, message = "Note is required"))]
    pub note: String,
}

/// Assignee filter shared by the ticket list and the reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssigneeFilter {
    Unassigned,
    User(i32),
}

impl AssigneeFilter {
    /// Accepts a user id or the literal `unassigned`.
    pub fn parse(raw: &str) -> AppResult<Self> {
        let raw = raw.trim();
        if raw.eq_ignore_ascii_case("unassigned") {
            return Ok(AssigneeFilter::Unassigned);
        }
        raw.parse()
            .map(AssigneeFilter::User)
            .map_err(|_| AppError::validation("assignee_id must be a user id or 'unassigned'"))
    }

    pub fn as_query_value(&self) -> String {
        match self {
            AssigneeFilter::Unassigned => "unassigned".to_string(),
            AssigneeFilter::User(id) => id.to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TicketSort {
    /// HIGH first, newest first within a priority.
    Priority,
    DateAsc,
    #[default]
    Newest,
}

impl TicketSort {
    pub fn parse(raw: Option<&str>) -> Self {
        match raw {
            Some("priority") => TicketSort::Priority,
            Some("date_asc") => TicketSort::DateAsc,
            _ => TicketSort::Newest,
        }
    }
}

#[derive(Debug, Default, Clone)]
pub struct TicketListFilter {
    pub status: Option<TicketStatus>,
    pub priority: Option<TicketPriority>,
    pub assignee: Option<AssigneeFilter>,
    pub sort: TicketSort,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct TicketView {
    pub id: i32,
    pub caller_name: String,
    pub department: String,
    pub phone: Option<String>,
    pub description: String,
    pub priority: TicketPriority,
    pub status: TicketStatus,
    pub assignee_id: Option<i32>,
    pub assignee_name: Option<String>,
    pub created_by: i32,
    pub created_by_name: Option<String>,
    pub category_id: Option<i32>,
    pub category_name: Option<String>,
    pub subcategory_id: Option<i32>,
    pub subcategory_name: Option<String>,
    pub resolution_note: Option<String>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
    pub closed_at: Option<NaiveDateTime>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct CustomFieldEntry {
    pub field_definition_id: i32,
    pub field_key: String,
    pub label: String,
    pub field_type: FieldType,
    pub value_text: String,
    #[schema(value_type = Object)]
    pub value: serde_json::Value,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct TicketDetail {
    #[serde(flatten)]
    pub ticket: TicketView,
    pub custom_fields: Vec<CustomFieldEntry>,
}

#[derive(Debug, Clone, Serialize, FromQueryResult, ToSchema)]
pub struct NoteView {
    pub id: i32,
    pub ticket_id: i32,
    pub user_id: i32,
    pub author_name: Option<String>,
    pub note: String,
    pub created_at: NaiveDateTime,
}

#[derive(Debug, Clone, Serialize, FromQueryResult, ToSchema)]
pub struct HistoryView {
    pub id: i32,
    pub ticket_id: i32,
    pub user_id: i32,
    pub actor_name: Option<String>,
    pub action: HistoryAction,
    pub old_value: Option<String>,
    pub new_value: Option<String>,
    pub created_at: NaiveDateTime,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingHistory {
    pub action: HistoryAction,
    pub old_value: String,
    pub new_value: String,
}

/// Staged changes for one ticket update. Outer `None` means "leave as is".
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UpdatePlan {
    pub status: Option<TicketStatus>,
    pub closed_at: Option<Option<NaiveDateTime>>,
    pub assignee_id: Option<Option<i32>>,
    pub resolution_note: Option<String>,
    pub history: Vec<PendingHistory>,
}

impl UpdatePlan {
    pub fn is_empty(&self) -> bool {
        self.status.is_none() && self.assignee_id.is_none() && self.resolution_note.is_none()
    }
}

fn assignee_repr(assignee: Option<i32>) -> String {
    assignee.map_or_else(|| "null".to_string(), |id| id.to_string())
}

/// Works out which fields of `current` the request actually changes, with
/// the `closed_at` transition and the history rows those changes produce.
pub fn plan_update(
    current: &TicketModel,
    req: &UpdateTicketRequest,
    now: NaiveDateTime,
) -> AppResult<UpdatePlan> {
    let mut plan = UpdatePlan::default();

    if let Some(status) = req.status.filter(|s| *s != current.status) {
        plan.status = Some(status);
        if status == TicketStatus::Resolved {
            plan.closed_at = Some(Some(now));
        } else if current.status == TicketStatus::Resolved {
            plan.closed_at = Some(None);
        }
        plan.history.push(PendingHistory {
            action: HistoryAction::StatusChange,
            old_value: current.status.as_str().to_string(),
            new_value: status.as_str().to_string(),
        });
    }

    if let Some(assignee) = req.assignee_id.filter(|a| *a != current.assignee_id) {
        plan.assignee_id = Some(assignee);
        plan.history.push(PendingHistory {
            action: HistoryAction::AssigneeChange,
            old_value: assignee_repr(current.assignee_id),
            new_value: assignee_repr(assignee),
        });
    }

    if let Some(note) = &req.resolution_note {
        plan.resolution_note = Some(note.clone());
    }

    if plan.is_empty() {
        return Err(AppError::NoChanges);
    }
    Ok(plan)
}

struct CallerDetails {
    caller_name: String,
    department: String,
    phone: Option<String>,
}

fn non_blank(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

/// END_USER tickets always carry the creator's own name and department;
/// staff file tickets on someone else's behalf and must supply both.
fn resolve_caller(creator: &UserModel, req: &CreateTicketRequest) -> AppResult<CallerDetails> {
    let phone = non_blank(req.phone.as_deref());

    if creator.role == UserRole::EndUser {
        let department =
            non_blank(creator.department.as_deref()).ok_or(AppError::MissingProfileData)?;
        return Ok(CallerDetails {
            caller_name: creator.name.clone(),
            department,
            phone: phone.or_else(|| non_blank(creator.phone.as_deref())),
        });
    }

    let caller_name = non_blank(req.caller_name.as_deref());
    let department = non_blank(req.department.as_deref());
    let mut missing = Vec::new();
    if caller_name.is_none() {
        missing.push("caller_name: Caller name is required".to_string());
    }
    if department.is_none() {
        missing.push("department: Department is required".to_string());
    }

    match (caller_name, department) {
        (Some(caller_name), Some(department)) => Ok(CallerDetails {
            caller_name,
            department,
            phone,
        }),
        _ => Err(AppError::Validation(missing)),
    }
}

pub struct TicketService {
    db: DatabaseConnection,
}

impl TicketService {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    pub async fn list(
        &self,
        caller: &AuthUser,
        filter: &TicketListFilter,
        page: u64,
        per_page: u64,
    ) -> AppResult<(Vec<TicketView>, u64)> {
        let mut query = Ticket::find();
        if caller.role == UserRole::EndUser {
            query = query.filter(ticket::Column::CreatedBy.eq(caller.id));
        }
        if let Some(status) = filter.status {
            query = query.filter(ticket::Column::Status.eq(status));
        }
        if let Some(priority) = filter.priority {
            query = query.filter(ticket::Column::Priority.eq(priority));
        }
        query = match filter.assignee {
            Some(AssigneeFilter::Unassigned) => query.filter(ticket::Column::AssigneeId.is_null()),
            Some(AssigneeFilter::User(id)) => query.filter(ticket::Column::AssigneeId.eq(id)),
            None => query,
        };

        let paginator = apply_sort(query, filter.sort).paginate(&self.db, per_page);
        let total = paginator.num_items().await?;
        let tickets = paginator.fetch_page(page.saturating_sub(1)).await?;

        Ok((self.to_views(tickets).await?, total))
    }

    pub async fn get_detail(&self, caller: &AuthUser, id: i32) -> AppResult<TicketDetail> {
        let ticket = self.find_visible(caller, id).await?;
        let custom_fields = self.custom_fields(ticket.id).await?;
        let ticket = self
            .to_views(vec![ticket])
            .await?
            .into_iter()
            .next()
            .ok_or(AppError::NotFound)?;

        Ok(TicketDetail {
            ticket,
            custom_fields,
        })
    }

    /// Loads a ticket, enforcing that END_USER callers only see their own.
    pub async fn find_visible(&self, caller: &AuthUser, id: i32) -> AppResult<TicketModel> {
        let ticket = Ticket::find_by_id(id)
            .one(&self.db)
            .await?
            .ok_or(AppError::NotFound)?;

        if caller.role == UserRole::EndUser && ticket.created_by != caller.id {
            return Err(AppError::Forbidden);
        }
        Ok(ticket)
    }

    pub async fn create(&self, caller: &AuthUser, req: CreateTicketRequest) -> AppResult<TicketModel> {
        let description = req.description.trim().to_string();
        if description.is_empty() {
            return Err(AppError::validation("description: Description is required"));
        }

        let creator = User::find_by_id(caller.id)
            .one(&self.db)
            .await?
            .ok_or(AppError::Unauthorized)?;
        let details = resolve_caller(&creator, &req)?;

        let txn = self.db.begin().await?;

        let definitions = resolve_scope(&txn, req.category_id, req.subcategory_id).await?;
        let values = validate_submission(&definitions, &req.custom_fields)?;

        let now = chrono::Utc::now().naive_utc();
        let ticket = ticket::ActiveModel {
            caller_name: Set(details.caller_name),
            department: Set(details.department),
            phone: Set(details.phone),
            description: Set(description),
            priority: Set(req.priority),
            status: Set(TicketStatus::Open),
            assignee_id: Set(None),
            created_by: Set(caller.id),
            category_id: Set(Some(req.category_id)),
            subcategory_id: Set(Some(req.subcategory_id)),
            resolution_note: Set(None),
            created_at: Set(now),
            updated_at: Set(now),
            closed_at: Set(None),
            ..Default::default()
        }
        .insert(&txn)
        .await?;

        for value in &values {
            custom_field_value::ActiveModel {
                ticket_id: Set(ticket.id),
                field_definition_id: Set(value.field_definition_id),
                value_text: Set(value.value.to_text()),
                value_json: Set(value.value.to_json()),
                created_at: Set(now),
                ..Default::default()
            }
            .insert(&txn)
            .await?;
        }

        txn.commit().await?;

        tracing::info!(
            ticket_id = ticket.id,
            created_by = caller.id,
            custom_fields = values.len(),
            "Ticket created"
        );
        Ok(ticket)
    }

    pub async fn update(
        &self,
        caller: &AuthUser,
        id: i32,
        req: UpdateTicketRequest,
    ) -> AppResult<TicketModel> {
        let txn = self.db.begin().await?;

        let current = Ticket::find_by_id(id)
            .one(&txn)
            .await?
            .ok_or(AppError::NotFound)?;

        let now = chrono::Utc::now().naive_utc();
        let plan = plan_update(&current, &req, now)?;

        if let Some(Some(assignee_id)) = plan.assignee_id {
            let assignable = User::find_by_id(assignee_id)
                .one(&txn)
                .await?
                .is_some_and(|u| u.role.is_staff());
            if !assignable {
                return Err(AppError::InvalidAssignee);
            }
        }

        let mut active: ticket::ActiveModel = current.into();
        if let Some(status) = plan.status {
            active.status = Set(status);
        }
        if let Some(closed_at) = plan.closed_at {
            active.closed_at = Set(closed_at);
        }
        if let Some(assignee_id) = plan.assignee_id {
            active.assignee_id = Set(assignee_id);
        }
        if let Some(note) = plan.resolution_note {
            active.resolution_note = Set(Some(note));
        }
        active.updated_at = Set(now);
        let updated = active.update(&txn).await?;

        for entry in &plan.history {
            ticket_history::ActiveModel {
                ticket_id: Set(id),
                user_id: Set(caller.id),
                action: Set(entry.action),
                old_value: Set(Some(entry.old_value.clone())),
                new_value: Set(Some(entry.new_value.clone())),
                created_at: Set(now),
                ..Default::default()
            }
            .insert(&txn)
            .await?;
        }

        txn.commit().await?;

        tracing::info!(
            ticket_id = id,
            user_id = caller.id,
            history_entries = plan.history.len(),
            "Ticket updated"
        );
        Ok(updated)
    }

    pub async fn add_note(&self, caller: &AuthUser, ticket_id: i32, note: &str) -> AppResult<NoteView> {
        let note = note.trim();
        if note.is_empty() {
            return Err(AppError::validation("note: Note is required"));
        }
        Ticket::find_by_id(ticket_id)
            .one(&self.db)
            .await?
            .ok_or(AppError::NotFound)?;

        let created = ticket_note::ActiveModel {
            ticket_id: Set(ticket_id),
            user_id: Set(caller.id),
            note: Set(note.to_string()),
            created_at: Set(chrono::Utc::now().naive_utc()),
            ..Default::default()
        }
        .insert(&self.db)
        .await?;

        Ok(NoteView {
            id: created.id,
            ticket_id: created.ticket_id,
            user_id: created.user_id,
            author_name: Some(caller.name.clone()),
            note: created.note,
            created_at: created.created_at,
        })
    }

    pub async fn list_notes(&self, ticket_id: i32) -> AppResult<Vec<NoteView>> {
        self.ensure_exists(ticket_id).await?;
        let notes = NoteView::find_by_statement(Statement::from_sql_and_values(
            sea_orm::DatabaseBackend::Postgres,
            "SELECT n.id, n.ticket_id, n.user_id, u.name AS author_name, n.note, n.created_at \
                FROM ticket_notes n \
                LEFT JOIN users u ON u.id = n.user_id \
                WHERE n.ticket_id = $1 \
                ORDER BY n.created_at ASC, n.id ASC",
            vec![ticket_id.into()],
        ))
        .all(&self.db)
        .await?;
        Ok(notes)
    }

    pub async fn list_history(&self, ticket_id: i32) -> AppResult<Vec<HistoryView>> {
        self.ensure_exists(ticket_id).await?;
        let history = HistoryView::find_by_statement(Statement::from_sql_and_values(
            sea_orm::DatabaseBackend::Postgres,
            "SELECT h.id, h.ticket_id, h.user_id, u.name AS actor_name, h.action, \
                h.old_value, h.new_value, h.created_at \
                FROM ticket_history h \
                LEFT JOIN users u ON u.id = h.user_id \
                WHERE h.ticket_id = $1 \
                ORDER BY h.created_at ASC, h.id ASC",
            vec![ticket_id.into()],
        ))
        .all(&self.db)
        .await?;
        Ok(history)
    }

    async fn ensure_exists(&self, ticket_id: i32) -> AppResult<()> {
        Ticket::find_by_id(ticket_id)
            .one(&self.db)
            .await?
            .map(|_| ())
            .ok_or(AppError::NotFound)
    }

    async fn custom_fields(&self, ticket_id: i32) -> AppResult<Vec<CustomFieldEntry>> {
        let values = CustomFieldValue::find()
            .filter(custom_field_value::Column::TicketId.eq(ticket_id))
            .all(&self.db)
            .await?;
        if values.is_empty() {
            return Ok(Vec::new());
        }

        let definition_ids: Vec<i32> = values.iter().map(|v| v.field_definition_id).collect();
        let definitions = CustomFieldDefinition::find()
            .filter(custom_field_definition::Column::Id.is_in(definition_ids))
            .order_by_asc(custom_field_definition::Column::SortOrder)
            .order_by_asc(custom_field_definition::Column::Id)
            .all(&self.db)
            .await?;

        let mut by_definition: HashMap<i32, custom_field_value::Model> = values
            .into_iter()
            .map(|v| (v.field_definition_id, v))
            .collect();

        Ok(definitions
            .into_iter()
            .filter_map(|def| {
                let value = by_definition.remove(&def.id)?;
                Some(CustomFieldEntry {
                    field_definition_id: def.id,
                    field_key: def.field_key,
                    label: def.label,
                    field_type: def.field_type,
                    value_text: value.value_text,
                    value: value.value_json,
                })
            })
            .collect())
    }

    /// Attaches user, category and subcategory names with one lookup per table.
    async fn to_views(&self, tickets: Vec<TicketModel>) -> AppResult<Vec<TicketView>> {
        if tickets.is_empty() {
            return Ok(Vec::new());
        }

        let mut user_ids: Vec<i32> = tickets
            .iter()
            .flat_map(|t| [Some(t.created_by), t.assignee_id])
            .flatten()
            .collect();
        user_ids.sort_unstable();
        user_ids.dedup();
        let category_ids: Vec<i32> = tickets.iter().filter_map(|t| t.category_id).collect();
        let subcategory_ids: Vec<i32> = tickets.iter().filter_map(|t| t.subcategory_id).collect();

        let users: HashMap<i32, String> = User::find()
            .filter(user::Column::Id.is_in(user_ids))
            .all(&self.db)
            .await?
            .into_iter()
            .map(|u| (u.id, u.name))
            .collect();
        let categories: HashMap<i32, String> = if category_ids.is_empty() {
            HashMap::new()
        } else {
            TicketCategory::find()
                .filter(ticket_category::Column::Id.is_in(category_ids))
                .all(&self.db)
                .await?
                .into_iter()
                .map(|c| (c.id, c.name))
                .collect()
        };
        let subcategories: HashMap<i32, String> = if subcategory_ids.is_empty() {
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

        Ok(tickets
            .into_iter()
            .map(|t| TicketView {
                assignee_name: t.assignee_id.and_then(|id| users.get(&id).cloned()),
                created_by_name: users.get(&t.created_by).cloned(),
                category_name: t.category_id.and_then(|id| categories.get(&id).cloned()),
                subcategory_name: t.subcategory_id.and_then(|id| subcategories.get(&id).cloned()),
                id: t.id,
                caller_name: t.caller_name,
                department: t.department,
                phone: t.phone,
                description: t.description,
                priority: t.priority,
                status: t.status,
                assignee_id: t.assignee_id,
                created_by: t.created_by,
                category_id: t.category_id,
                subcategory_id: t.subcategory_id,
                resolution_note: t.resolution_note,
                created_at: t.created_at,
                updated_at: t.updated_at,
                closed_at: t.closed_at,
            })
            .collect())
    }
}

fn apply_sort(query: Select<Ticket>, sort: TicketSort) -> Select<Ticket> {
    match sort {
        TicketSort::Priority => query
            .order_by(
                Expr::cust(
                    "CASE priority WHEN 'HIGH' THEN 1 WHEN 'MEDIUM' THEN 2 WHEN 'LOW' THEN 3 ELSE 4 END",
                ),
                Order::Asc,
            )
            .order_by_desc(ticket::Column::CreatedAt)
            .order_by_desc(ticket::Column::Id),
        TicketSort::DateAsc => query
            .order_by_asc(ticket::Column::CreatedAt)
            .order_by_asc(ticket::Column::Id),
        TicketSort::Newest => query
            .order_by_desc(ticket::Column::CreatedAt)
            .order_by_desc(ticket::Column::Id),
    }
}
