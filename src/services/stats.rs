//! Dashboard counters and the filtered operational report.
//!
//! Loading is done with a couple of plain queries; everything derived from
//! the loaded rows (distributions, response/resolution times, reopen and SLA
//! rates) is computed by the pure functions in this module.

use crate::config::sla::SlaPolicy;
use crate::error::{AppError, AppResult};
use crate::models::{
    ticket, ticket_category, ticket_history, user, HistoryAction, Ticket, TicketCategory,
    TicketHistory, TicketHistoryModel, TicketModel, TicketPriority, TicketStatus, User, UserRole,
};
use crate::services::ticket::AssigneeFilter;
use chrono::{Days, NaiveDate, NaiveDateTime};
use sea_orm::entity::prelude::*;
use sea_orm::{FromQueryResult, QueryOrder, Statement};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use utoipa::ToSchema;

const UNCATEGORIZED: &str = "Uncategorized";

#[derive(Debug, Clone, Serialize, FromQueryResult, ToSchema)]
pub struct StaffStat {
    pub id: i32,
    pub name: String,
    pub active_tickets: i64,
    pub resolved_tickets: i64,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct DashboardStats {
    pub total_open: u64,
    pub staff_stats: Vec<StaffStat>,
}

/// Raw report filters as sent by the client; blank values mean "no filter".
#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct ReportQuery {
    /// Inclusive, `YYYY-MM-DD`
    pub start_date: Option<String>,
    /// Inclusive, `YYYY-MM-DD`
    pub end_date: Option<String>,
    pub status: Option<String>,
    pub priority: Option<String>,
    /// User id or `unassigned`
    pub assignee_id: Option<String>,
    pub category_id: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReportFilters {
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub status: Option<TicketStatus>,
    pub priority: Option<TicketPriority>,
    pub assignee: Option<AssigneeFilter>,
    pub category_id: Option<i32>,
}

fn present(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

impl ReportFilters {
    /// Parses every filter and reports all malformed ones together.
    pub fn parse(query: &ReportQuery) -> AppResult<Self> {
        let mut errors = Vec::new();
        let mut filters = ReportFilters::default();

        let parse_date = |raw: Option<&str>, name: &str, errors: &mut Vec<String>| {
            raw.and_then(|v| match NaiveDate::parse_from_str(v, "%Y-%m-%d") {
                Ok(date) => Some(date),
                Err(_) => {
                    errors.push(format!("{name}: expected YYYY-MM-DD"));
                    None
                }
            })
        };
        filters.start_date = parse_date(present(&query.start_date), "start_date", &mut errors);
        filters.end_date = parse_date(present(&query.end_date), "end_date", &mut errors);
        if let (Some(start), Some(end)) = (filters.start_date, filters.end_date) {
            if start > end {
                errors.push("start_date: must not be after end_date".to_string());
            }
        }

        if let Some(raw) = present(&query.status) {
            match raw.parse::<TicketStatus>() {
                Ok(status) => filters.status = Some(status),
                Err(()) => errors.push("status: expected OPEN, IN_PROGRESS or RESOLVED".to_string()),
            }
        }
        if let Some(raw) = present(&query.priority) {
            match raw.parse::<TicketPriority>() {
                Ok(priority) => filters.priority = Some(priority),
                Err(()) => errors.push("priority: expected HIGH, MEDIUM or LOW".to_string()),
            }
        }
        if let Some(raw) = present(&query.assignee_id) {
            match AssigneeFilter::parse(raw) {
                Ok(assignee) => filters.assignee = Some(assignee),
                Err(_) => errors.push("assignee_id: expected a user id or 'unassigned'".to_string()),
            }
        }
        if let Some(raw) = present(&query.category_id) {
            match raw.parse() {
                Ok(id) => filters.category_id = Some(id),
                Err(_) => errors.push("category_id: expected a category id".to_string()),
            }
        }

        if errors.is_empty() {
            Ok(filters)
        } else {
            Err(AppError::Validation(errors))
        }
    }

    fn applied(&self) -> FiltersApplied {
        FiltersApplied {
            start_date: self.start_date.map(|d| d.format("%Y-%m-%d").to_string()),
            end_date: self.end_date.map(|d| d.format("%Y-%m-%d").to_string()),
            status: self.status,
            priority: self.priority,
            assignee_id: self.assignee.map(|a| a.as_query_value()),
            category_id: self.category_id,
        }
    }
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct FiltersApplied {
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    pub status: Option<TicketStatus>,
    pub priority: Option<TicketPriority>,
    pub assignee_id: Option<String>,
    pub category_id: Option<i32>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct NamedOption {
    pub id: i32,
    pub name: String,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct FilterOptions {
    pub assignees: Vec<NamedOption>,
    pub categories: Vec<NamedOption>,
    pub statuses: Vec<TicketStatus>,
    pub priorities: Vec<TicketPriority>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, ToSchema)]
pub struct ReportSummary {
    pub total_tickets: u64,
    pub open_tickets: u64,
    pub in_progress_tickets: u64,
    pub resolved_tickets: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct StatusCount {
    pub status: TicketStatus,
    pub count: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct PriorityCount {
    pub priority: TicketPriority,
    pub count: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct CategoryCount {
    pub category: String,
    pub count: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct DateCount {
    pub date: String,
    pub count: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, ToSchema)]
pub struct OperationalMetrics {
    pub first_response_hours_avg: Option<f64>,
    pub resolution_hours_avg: Option<f64>,
    pub backlog_age_hours_avg: Option<f64>,
    pub reopened_tickets: u64,
    pub ever_resolved_tickets: u64,
    pub reopened_rate_pct: f64,
    pub sla_eligible_tickets: u64,
    pub sla_breached_tickets: u64,
    pub sla_breach_rate_pct: f64,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct Report {
    pub filters_applied: FiltersApplied,
    pub filter_options: FilterOptions,
    pub summary: ReportSummary,
    pub status_distribution: Vec<StatusCount>,
    pub priority_distribution: Vec<PriorityCount>,
    pub category_distribution: Vec<CategoryCount>,
    pub tickets_over_time: Vec<DateCount>,
    pub operational_metrics: OperationalMetrics,
    /// Target hours keyed by priority; priorities without a target are absent.
    pub sla_threshold_hours: BTreeMap<String, f64>,
}

const STATUSES: [TicketStatus; 3] = [
    TicketStatus::Open,
    TicketStatus::InProgress,
    TicketStatus::Resolved,
];
const PRIORITIES: [TicketPriority; 3] = [
    TicketPriority::High,
    TicketPriority::Medium,
    TicketPriority::Low,
];

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

fn hours_between(from: NaiveDateTime, to: NaiveDateTime) -> f64 {
    (to - from).num_milliseconds() as f64 / 3_600_000.0
}

fn average(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        None
    } else {
        Some(round2(values.iter().sum::<f64>() / values.len() as f64))
    }
}

fn percentage(numerator: u64, denominator: u64) -> f64 {
    if denominator == 0 {
        0.0
    } else {
        round2(numerator as f64 * 100.0 / denominator as f64)
    }
}

pub fn summarize(tickets: &[TicketModel]) -> ReportSummary {
    let count = |status| tickets.iter().filter(|t| t.status == status).count() as u64;
    ReportSummary {
        total_tickets: tickets.len() as u64,
        open_tickets: count(TicketStatus::Open),
        in_progress_tickets: count(TicketStatus::InProgress),
        resolved_tickets: count(TicketStatus::Resolved),
    }
}

pub fn status_distribution(tickets: &[TicketModel]) -> Vec<StatusCount> {
    STATUSES
        .iter()
        .map(|&status| StatusCount {
            status,
            count: tickets.iter().filter(|t| t.status == status).count() as u64,
        })
        .collect()
}

pub fn priority_distribution(tickets: &[TicketModel]) -> Vec<PriorityCount> {
    PRIORITIES
        .iter()
        .map(|&priority| PriorityCount {
            priority,
            count: tickets.iter().filter(|t| t.priority == priority).count() as u64,
        })
        .collect()
}

/// Largest bucket first, ties by name. Tickets without a category, or with
/// a category that no longer resolves to a name, count as "Uncategorized".
pub fn category_distribution(
    tickets: &[TicketModel],
    category_names: &HashMap<i32, String>,
) -> Vec<CategoryCount> {
    let mut counts: HashMap<&str, u64> = HashMap::new();
    for ticket in tickets {
        let name = ticket
            .category_id
            .and_then(|id| category_names.get(&id))
            .map(String::as_str)
            .unwrap_or(UNCATEGORIZED);
        *counts.entry(name).or_default() += 1;
    }

    let mut distribution: Vec<CategoryCount> = counts
        .into_iter()
        .map(|(category, count)| CategoryCount {
            category: category.to_string(),
            count,
        })
        .collect();
    distribution.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.category.cmp(&b.category)));
    distribution
}

pub fn tickets_over_time(tickets: &[TicketModel]) -> Vec<DateCount> {
    let mut per_day: BTreeMap<NaiveDate, u64> = BTreeMap::new();
    for ticket in tickets {
        *per_day.entry(ticket.created_at.date()).or_default() += 1;
    }
    per_day
        .into_iter()
        .map(|(date, count)| DateCount {
            date: date.format("%Y-%m-%d").to_string(),
            count,
        })
        .collect()
}

fn is_status_change_to(entry: &TicketHistoryModel, status: TicketStatus) -> bool {
    entry.action == HistoryAction::StatusChange && entry.new_value.as_deref() == Some(status.as_str())
}

fn is_reopen(entry: &TicketHistoryModel) -> bool {
    entry.action == HistoryAction::StatusChange
        && entry.old_value.as_deref() == Some(TicketStatus::Resolved.as_str())
        && (is_status_change_to(entry, TicketStatus::Open)
            || is_status_change_to(entry, TicketStatus::InProgress))
}

/// Derives the time-based KPIs from the tickets and their history rows.
/// `history` may contain rows for tickets outside `tickets`; they are ignored.
pub fn operational_metrics(
    tickets: &[TicketModel],
    history: &[TicketHistoryModel],
    sla: &SlaPolicy,
    now: NaiveDateTime,
) -> OperationalMetrics {
    let mut by_ticket: HashMap<i32, Vec<&TicketHistoryModel>> = HashMap::new();
    for entry in history {
        by_ticket.entry(entry.ticket_id).or_default().push(entry);
    }

    let mut first_response = Vec::new();
    let mut resolution = Vec::new();
    let mut backlog = Vec::new();
    let mut metrics = OperationalMetrics::default();

    for ticket in tickets {
        let entries = by_ticket.get(&ticket.id).map(Vec::as_slice).unwrap_or(&[]);

        if let Some(first) = entries
            .iter()
            .map(|e| e.created_at)
            .filter(|at| *at >= ticket.created_at)
            .min()
        {
            first_response.push(hours_between(ticket.created_at, first));
        }

        let resolved_at = ticket.closed_at.or_else(|| {
            entries
                .iter()
                .filter(|e| is_status_change_to(e, TicketStatus::Resolved))
                .map(|e| e.created_at)
                .min()
        });
        if let Some(resolved_at) = resolved_at.filter(|at| *at >= ticket.created_at) {
            resolution.push(hours_between(ticket.created_at, resolved_at));
        }

        if ticket.status.is_active() {
            backlog.push(hours_between(ticket.created_at, now));
        }

        if entries.iter().any(|e| is_reopen(e)) {
            metrics.reopened_tickets += 1;
        }
        if ticket.status == TicketStatus::Resolved
            || entries
                .iter()
                .any(|e| is_status_change_to(e, TicketStatus::Resolved))
        {
            metrics.ever_resolved_tickets += 1;
        }

        if let Some(target) = sla.target_hours(ticket.priority) {
            metrics.sla_eligible_tickets += 1;
            let end = resolved_at.unwrap_or(now);
            if hours_between(ticket.created_at, end) > target {
                metrics.sla_breached_tickets += 1;
            }
        }
    }

    metrics.first_response_hours_avg = average(&first_response);
    metrics.resolution_hours_avg = average(&resolution);
    metrics.backlog_age_hours_avg = average(&backlog);
    metrics.reopened_rate_pct = percentage(metrics.reopened_tickets, metrics.ever_resolved_tickets);
    metrics.sla_breach_rate_pct =
        percentage(metrics.sla_breached_tickets, metrics.sla_eligible_tickets);
    metrics
}

pub struct StatsService {
    db: DatabaseConnection,
}

impl StatsService {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    pub async fn dashboard(&self) -> AppResult<DashboardStats> {
        let total_open = Ticket::find()
            .filter(ticket::Column::Status.eq(TicketStatus::Open))
            .count(&self.db)
            .await?;

        let staff_stats = StaffStat::find_by_statement(Statement::from_string(
            sea_orm::DatabaseBackend::Postgres,
            "SELECT u.id, u.name, \
                COUNT(t.id) FILTER (WHERE t.status IN ('OPEN', 'IN_PROGRESS')) AS active_tickets, \
                COUNT(t.id) FILTER (WHERE t.status = 'RESOLVED') AS resolved_tickets \
                FROM users u \
                LEFT JOIN tickets t ON t.assignee_id = u.id \
                WHERE u.role IN ('ADMIN', 'AGENT') \
                GROUP BY u.id, u.name \
                ORDER BY u.name, u.id",
        ))
        .all(&self.db)
        .await?;

        Ok(DashboardStats {
            total_open,
            staff_stats,
        })
    }

    pub async fn report(&self, filters: &ReportFilters, sla: &SlaPolicy) -> AppResult<Report> {
        let tickets = self.filtered_tickets(filters).await?;

        let ticket_ids: Vec<i32> = tickets.iter().map(|t| t.id).collect();
        let history = if ticket_ids.is_empty() {
            Vec::new()
        } else {
            TicketHistory::find()
                .filter(ticket_history::Column::TicketId.is_in(ticket_ids))
                .order_by_asc(ticket_history::Column::CreatedAt)
                .all(&self.db)
                .await?
        };

        let categories = TicketCategory::find()
            .order_by_asc(ticket_category::Column::SortOrder)
            .order_by_asc(ticket_category::Column::Name)
            .all(&self.db)
            .await?;
        let category_names: HashMap<i32, String> =
            categories.iter().map(|c| (c.id, c.name.clone())).collect();

        let assignees = User::find()
            .filter(user::Column::Role.is_in([UserRole::Admin, UserRole::Agent]))
            .order_by_asc(user::Column::Name)
            .all(&self.db)
            .await?;

        let now = chrono::Utc::now().naive_utc();
        let operational_metrics = operational_metrics(&tickets, &history, sla, now);

        tracing::debug!(
            tickets = tickets.len(),
            history = history.len(),
            "Report computed"
        );

        Ok(Report {
            filters_applied: filters.applied(),
            filter_options: FilterOptions {
                assignees: assignees
                    .into_iter()
                    .map(|u| NamedOption { id: u.id, name: u.name })
                    .collect(),
                categories: categories
                    .into_iter()
                    .map(|c| NamedOption { id: c.id, name: c.name })
                    .collect(),
                statuses: STATUSES.to_vec(),
                priorities: PRIORITIES.to_vec(),
            },
            summary: summarize(&tickets),
            status_distribution: status_distribution(&tickets),
            priority_distribution: priority_distribution(&tickets),
            category_distribution: category_distribution(&tickets, &category_names),
            tickets_over_time: tickets_over_time(&tickets),
            operational_metrics,
            sla_threshold_hours: sla
                .thresholds()
                .iter()
                .map(|(priority, hours)| (priority.as_str().to_string(), *hours))
                .collect(),
        })
    }

    async fn filtered_tickets(&self, filters: &ReportFilters) -> AppResult<Vec<TicketModel>> {
        let mut query = Ticket::find();

        if let Some(start) = filters.start_date {
            query = query.filter(ticket::Column::CreatedAt.gte(start.and_time(chrono::NaiveTime::MIN)));
        }
        if let Some(end) = filters.end_date {
            let next_day = end
                .checked_add_days(Days::new(1))
                .ok_or_else(|| AppError::validation("end_date: out of range"))?;
            query = query.filter(ticket::Column::CreatedAt.lt(next_day.and_time(chrono::NaiveTime::MIN)));
        }
        if let Some(status) = filters.status {
            query = query.filter(ticket::Column::Status.eq(status));
        }
        if let Some(priority) = filters.priority {
            query = query.filter(ticket::Column::Priority.eq(priority));
        }
        query = match filters.assignee {
            Some(AssigneeFilter::Unassigned) => query.filter(ticket::Column::AssigneeId.is_null()),
            Some(AssigneeFilter::User(id)) => query.filter(ticket::Column::AssigneeId.eq(id)),
            None => query,
        };
        if let Some(category_id) = filters.category_id {
            query = query.filter(ticket::Column::CategoryId.eq(category_id));
        }

        Ok(query
            .order_by_asc(ticket::Column::CreatedAt)
            .all(&self.db)
            .await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(day: u32, hour: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 6, day)
            .unwrap()
            .and_hms_opt(hour, 0, 0)
            .unwrap()
    }

    fn ticket(id: i32, priority: TicketPriority, status: TicketStatus, created: NaiveDateTime) -> TicketModel {
        TicketModel {
            id,
            caller_name: "Caller".into(),
            department: "Ops".into(),
            phone: None,
            description: "Issue".into(),
            priority,
            status,
            assignee_id: None,
            created_by: 1,
            category_id: None,
            subcategory_id: None,
            resolution_note: None,
            created_at: created,
            updated_at: created,
            closed_at: None,
        }
    }

    fn status_change(ticket_id: i32, old: TicketStatus, new: TicketStatus, at: NaiveDateTime) -> TicketHistoryModel {
        TicketHistoryModel {
            id: 0,
            ticket_id,
            user_id: 2,
            action: HistoryAction::StatusChange,
            old_value: Some(old.as_str().into()),
            new_value: Some(new.as_str().into()),
            created_at: at,
        }
    }

    fn assignment(ticket_id: i32, at: NaiveDateTime) -> TicketHistoryModel {
        TicketHistoryModel {
            id: 0,
            ticket_id,
            user_id: 2,
            action: HistoryAction::AssigneeChange,
            old_value: Some("null".into()),
            new_value: Some("2".into()),
            created_at: at,
        }
    }

    #[test]
    fn empty_input_yields_null_averages_and_zero_rates() {
        let metrics = operational_metrics(&[], &[], &SlaPolicy::default(), at(1, 0));
        assert_eq!(metrics, OperationalMetrics::default());
        assert_eq!(metrics.first_response_hours_avg, None);
        assert_eq!(metrics.reopened_rate_pct, 0.0);
    }

    #[test]
    fn first_response_uses_earliest_history_entry_of_any_kind() {
        let tickets = vec![ticket(1, TicketPriority::Low, TicketStatus::InProgress, at(1, 8))];
        let history = vec![
            status_change(1, TicketStatus::Open, TicketStatus::InProgress, at(1, 11)),
            assignment(1, at(1, 10)),
        ];
        let metrics = operational_metrics(&tickets, &history, &SlaPolicy::default(), at(1, 12));
        assert_eq!(metrics.first_response_hours_avg, Some(2.0));
        assert_eq!(metrics.backlog_age_hours_avg, Some(4.0));
        assert_eq!(metrics.resolution_hours_avg, None);
    }

    #[test]
    fn resolution_prefers_closed_at_and_falls_back_to_history() {
        let mut closed = ticket(1, TicketPriority::High, TicketStatus::Resolved, at(1, 8));
        closed.closed_at = Some(at(1, 11));
        let reopened = ticket(2, TicketPriority::High, TicketStatus::Open, at(1, 8));
        let history = vec![
            status_change(2, TicketStatus::Open, TicketStatus::Resolved, at(1, 9)),
            status_change(2, TicketStatus::Resolved, TicketStatus::Open, at(1, 10)),
        ];

        let metrics = operational_metrics(&[closed, reopened], &history, &SlaPolicy::default(), at(2, 0));
        // (3h + 1h) / 2
        assert_eq!(metrics.resolution_hours_avg, Some(2.0));
        assert_eq!(metrics.ever_resolved_tickets, 2);
        assert_eq!(metrics.reopened_tickets, 1);
        assert_eq!(metrics.reopened_rate_pct, 50.0);
    }

    #[test]
    fn sla_breach_measures_open_tickets_against_now() {
        let fast = {
            let mut t = ticket(1, TicketPriority::High, TicketStatus::Resolved, at(1, 8));
            t.closed_at = Some(at(1, 10));
            t
        };
        let slow_open = ticket(2, TicketPriority::High, TicketStatus::Open, at(1, 8));
        let low_open = ticket(3, TicketPriority::Low, TicketStatus::Open, at(1, 8));

        let metrics = operational_metrics(
            &[fast, slow_open, low_open],
            &[],
            &SlaPolicy::default(),
            at(1, 20),
        );
        assert_eq!(metrics.sla_eligible_tickets, 3);
        assert_eq!(metrics.sla_breached_tickets, 1);
        assert_eq!(metrics.sla_breach_rate_pct, 33.33);
    }

    #[test]
    fn priorities_without_target_are_not_eligible() {
        let policy = SlaPolicy::new([(TicketPriority::High, 4.0)]);
        let tickets = vec![ticket(1, TicketPriority::Low, TicketStatus::Open, at(1, 8))];
        let metrics = operational_metrics(&tickets, &[], &policy, at(3, 8));
        assert_eq!(metrics.sla_eligible_tickets, 0);
        assert_eq!(metrics.sla_breach_rate_pct, 0.0);
    }

    #[test]
    fn history_before_creation_is_ignored_for_timings() {
        let tickets = vec![ticket(1, TicketPriority::Medium, TicketStatus::Open, at(1, 8))];
        let history = vec![assignment(1, at(1, 7))];
        let metrics = operational_metrics(&tickets, &history, &SlaPolicy::default(), at(1, 9));
        assert_eq!(metrics.first_response_hours_avg, None);
    }

    #[test]
    fn averages_are_rounded_to_two_decimals() {
        let tickets = vec![ticket(1, TicketPriority::Low, TicketStatus::Open, at(1, 8))];
        let history = vec![TicketHistoryModel {
            created_at: at(1, 8) + chrono::Duration::minutes(20),
            ..assignment(1, at(1, 8))
        }];
        let metrics = operational_metrics(&tickets, &history, &SlaPolicy::default(), at(1, 9));
        assert_eq!(metrics.first_response_hours_avg, Some(0.33));
    }

    #[test]
    fn distributions_follow_fixed_orders() {
        let mut hardware = ticket(1, TicketPriority::Low, TicketStatus::Open, at(2, 8));
        hardware.category_id = Some(1);
        let mut hardware2 = ticket(2, TicketPriority::High, TicketStatus::Resolved, at(1, 8));
        hardware2.category_id = Some(1);
        let loose = ticket(3, TicketPriority::High, TicketStatus::Open, at(1, 9));
        let tickets = vec![hardware, hardware2, loose];
        let names = HashMap::from([(1, "Hardware".to_string())]);

        let summary = summarize(&tickets);
        assert_eq!(summary.total_tickets, 3);
        assert_eq!(summary.open_tickets, 2);
        assert_eq!(summary.resolved_tickets, 1);

        let statuses = status_distribution(&tickets);
        assert_eq!(statuses[0].status, TicketStatus::Open);
        assert_eq!(statuses[0].count, 2);
        assert_eq!(statuses[1].count, 0);

        let priorities = priority_distribution(&tickets);
        assert_eq!(priorities[0].priority, TicketPriority::High);
        assert_eq!(priorities[0].count, 2);

        let categories = category_distribution(&tickets, &names);
        assert_eq!(categories[0].category, "Hardware");
        assert_eq!(categories[0].count, 2);
        assert_eq!(categories[1].category, UNCATEGORIZED);

        let days = tickets_over_time(&tickets);
        assert_eq!(days.len(), 2);
        assert_eq!(days[0].date, "2024-06-01");
        assert_eq!(days[0].count, 2);
    }

    #[test]
    fn report_filters_parse_and_validate() {
        let filters = ReportFilters::parse(&ReportQuery {
            start_date: Some("2024-06-01".into()),
            end_date: Some("2024-06-30".into()),
            status: Some("".into()),
            priority: Some("HIGH".into()),
            assignee_id: Some("unassigned".into()),
            category_id: Some("3".into()),
        })
        .unwrap();
        assert_eq!(filters.status, None);
        assert_eq!(filters.priority, Some(TicketPriority::High));
        assert_eq!(filters.assignee, Some(AssigneeFilter::Unassigned));
        assert_eq!(filters.category_id, Some(3));

        let err = ReportFilters::parse(&ReportQuery {
            start_date: Some("2024-07-01".into()),
            end_date: Some("2024-06-01".into()),
            status: Some("CLOSED".into()),
            ..Default::default()
        })
        .unwrap_err();
        match err {
            AppError::Validation(messages) => assert_eq!(messages.len(), 2),
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
