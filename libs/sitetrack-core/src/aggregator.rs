//! Pure join and reduce functions over raw entity lists
//!
//! Nothing here performs I/O or mutates its inputs; every result is a
//! deterministic function of the slices passed in. Missing foreign references
//! never match anything.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};

use crate::models::{
    refers_to, Client, Equipment, EquipmentStatus, FinancialRecord, FinancialSummary, Material,
    ProgressReport, Project, ProjectStatus, Task, TaskStatus, TransactionType, User,
};
use crate::snapshot::Snapshot;

/// Revenue and outstanding balance for one client
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct ClientFinancials {
    pub revenue: f64,
    pub pending_payment: f64,
}

/// Task counts for one assignee
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct TaskBreakdown {
    pub assigned: usize,
    pub completed: usize,
    pub pending: usize,
}

/// Headline counts shown at the top of a dashboard
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct DashboardStats {
    pub total_users: usize,
    pub active_users: usize,
    pub total_projects: usize,
    pub active_projects: usize,
    pub completed_projects: usize,
    pub total_tasks: usize,
    pub pending_tasks: usize,
    pub in_progress_tasks: usize,
    pub completed_tasks: usize,
    pub cancelled_tasks: usize,
    pub total_clients: usize,
    pub average_progress: u8,
}

/// Stock and equipment overview
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct InventoryStats {
    pub total_materials: usize,
    pub low_stock_materials: usize,
    pub total_stock_value: f64,
    pub total_equipment: usize,
    pub equipment_by_status: BTreeMap<EquipmentStatus, usize>,
}

/// Number of tasks with the given status
#[must_use]
pub fn count_by_status(tasks: &[Task], status: TaskStatus) -> usize {
    tasks.iter().filter(|t| t.status == status).count()
}

/// Completion percentage of a project, rounded to the nearest integer
///
/// Counts only tasks that reference the project; a project without tasks is at 0.
#[must_use]
pub fn project_progress(project: &Project, tasks: &[Task]) -> u8 {
    let (total, completed) = project_task_counts(project, tasks);
    percent(completed, total)
}

/// `(total, completed)` task counts for a project
#[must_use]
pub fn project_task_counts(project: &Project, tasks: &[Task]) -> (usize, usize) {
    tasks
        .iter()
        .filter(|t| t.belongs_to(&project.id))
        .fold((0, 0), |(total, completed), t| {
            let done = usize::from(t.status == TaskStatus::Completed);
            (total + 1, completed + done)
        })
}

/// Revenue and pending payment for a client
///
/// Revenue sums Income records tied to the client's projects. Pending payment
/// is the combined budget of those projects minus revenue, never below zero.
#[must_use]
pub fn client_financials(
    client: &Client,
    projects: &[Project],
    records: &[FinancialRecord],
) -> ClientFinancials {
    let client_projects: Vec<&Project> = projects
        .iter()
        .filter(|p| refers_to(p.client.as_ref(), &client.id))
        .collect();
    let project_ids: HashSet<&str> = client_projects.iter().map(|p| p.id.as_str()).collect();

    let revenue: f64 = records
        .iter()
        .filter(|r| r.record_type == TransactionType::Income)
        .filter(|r| {
            r.project
                .as_ref()
                .is_some_and(|p| project_ids.contains(p.id.as_str()))
        })
        .map(|r| r.amount)
        .sum();
    let budget: f64 = client_projects.iter().map(|p| p.budget).sum();

    ClientFinancials {
        revenue,
        pending_payment: (budget - revenue).max(0.0),
    }
}

/// Assigned, completed and pending task counts for a user
///
/// "Pending" counts open work, i.e. tasks that are Pending or In Progress.
#[must_use]
pub fn user_task_breakdown(user: &User, tasks: &[Task]) -> TaskBreakdown {
    task_breakdown(&user.id, tasks)
}

/// [`user_task_breakdown`] keyed by user id, for users absent from the snapshot
#[must_use]
pub fn task_breakdown(user_id: &str, tasks: &[Task]) -> TaskBreakdown {
    tasks
        .iter()
        .filter(|t| t.is_assigned_to(user_id))
        .fold(TaskBreakdown::default(), |mut acc, t| {
            acc.assigned += 1;
            if t.status == TaskStatus::Completed {
                acc.completed += 1;
            } else if t.status.is_open() {
                acc.pending += 1;
            }
            acc
        })
}

/// Most recent progress report for a project
///
/// Reports without a date rank below dated ones; ties keep the later entry in input order.
#[must_use]
pub fn latest_progress<'a>(
    project: &Project,
    reports: &'a [ProgressReport],
) -> Option<&'a ProgressReport> {
    reports
        .iter()
        .filter(|r| refers_to(r.project.as_ref(), &project.id))
        .max_by_key(|r| r.date)
}

/// Income, expense and per-category totals reduced from raw records
///
/// Used when the server does not provide `/financials/summary`. Category
/// totals are signed: income adds, expense subtracts.
#[must_use]
pub fn financial_summary(records: &[FinancialRecord]) -> FinancialSummary {
    let mut summary = FinancialSummary::default();
    for record in records {
        let signed = match record.record_type {
            TransactionType::Income => {
                summary.total_income += record.amount;
                record.amount
            }
            TransactionType::Expense => {
                summary.total_expense += record.amount;
                -record.amount
            }
            TransactionType::Unknown => continue,
        };
        let key = if record.category.trim().is_empty() {
            "Uncategorized".to_string()
        } else {
            record.category.clone()
        };
        *summary.by_category.entry(key).or_insert(0.0) += signed;
    }
    summary.net_profit = summary.total_income - summary.total_expense;
    summary
}

/// Headline counts over a snapshot
#[must_use]
pub fn dashboard_stats(snapshot: &Snapshot) -> DashboardStats {
    stats_for(
        &snapshot.users,
        &snapshot.projects,
        &snapshot.tasks,
        snapshot.clients.len(),
    )
}

/// Headline counts over explicit slices
///
/// Lets scoped dashboards compute the same figures over a subset of projects.
#[must_use]
pub fn stats_for(
    users: &[User],
    projects: &[Project],
    tasks: &[Task],
    client_count: usize,
) -> DashboardStats {
    let average_progress = if projects.is_empty() {
        0
    } else {
        let sum: usize = projects
            .iter()
            .map(|p| usize::from(project_progress(p, tasks)))
            .sum();
        percent(sum, projects.len() * 100)
    };

    DashboardStats {
        total_users: users.len(),
        active_users: users.iter().filter(|u| u.is_active).count(),
        total_projects: projects.len(),
        active_projects: projects.iter().filter(|p| p.status.is_active()).count(),
        completed_projects: projects
            .iter()
            .filter(|p| p.status == ProjectStatus::Completed)
            .count(),
        total_tasks: tasks.len(),
        pending_tasks: count_by_status(tasks, TaskStatus::Pending),
        in_progress_tasks: count_by_status(tasks, TaskStatus::InProgress),
        completed_tasks: count_by_status(tasks, TaskStatus::Completed),
        cancelled_tasks: count_by_status(tasks, TaskStatus::Cancelled),
        total_clients: client_count,
        average_progress,
    }
}

/// Stock levels and equipment availability
///
/// `low_stock_threshold` replaces each material's own reorder level when set.
#[must_use]
pub fn inventory_stats(
    materials: &[Material],
    equipment: &[Equipment],
    low_stock_threshold: Option<f64>,
) -> InventoryStats {
    let mut equipment_by_status = BTreeMap::new();
    for item in equipment {
        *equipment_by_status.entry(item.status).or_insert(0) += 1;
    }

    InventoryStats {
        total_materials: materials.len(),
        low_stock_materials: materials
            .iter()
            .filter(|m| m.is_low_stock_at(low_stock_threshold))
            .count(),
        total_stock_value: materials.iter().map(|m| m.quantity * m.unit_price).sum(),
        total_equipment: equipment.len(),
        equipment_by_status,
    }
}

/// `round(part / whole * 100)` clamped to 0..=100, and 0 for an empty whole
#[allow(
    clippy::cast_precision_loss,
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss
)]
fn percent(part: usize, whole: usize) -> u8 {
    if whole == 0 {
        return 0;
    }
    let ratio = part as f64 / whole as f64;
    (ratio * 100.0).round().clamp(0.0, 100.0) as u8
}
