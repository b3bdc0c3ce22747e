//! Role-specific dashboards composed from a snapshot
//!
//! A dashboard is the complete, render-ready state for one viewer. It is
//! rebuilt from scratch on every refresh and never patched in place.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::aggregator::{
    client_financials, dashboard_stats, financial_summary, inventory_stats, stats_for,
    task_breakdown, ClientFinancials, DashboardStats, InventoryStats, TaskBreakdown,
};
use crate::error::{Result, SiteTrackError};
use crate::models::{
    refers_to, Equipment, FinancialSummary, Material, ProgressReport, Project, SummarySource, Task,
    User,
};
use crate::roles::{DashboardKind, Role};
use crate::snapshot::Snapshot;
use crate::view_models::{
    build_client_views, build_project_views, build_task_views, build_user_views, ClientView,
    ProjectView, TaskView, UserView,
};

/// Number of progress reports listed on the admin dashboard
const RECENT_PROGRESS_LIMIT: usize = 5;

/// Who is looking at the dashboard
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Viewer {
    pub role: Role,
    /// Backend id of the signed-in user
    pub user_id: Option<String>,
    /// Email of the signed-in user; client accounts are matched on it
    pub email: Option<String>,
}

impl Viewer {
    #[must_use]
    pub fn new(role: Role) -> Self {
        Self {
            role,
            user_id: None,
            email: None,
        }
    }

    #[must_use]
    pub fn with_user_id(mut self, user_id: impl Into<String>) -> Self {
        self.user_id = Some(user_id.into());
        self
    }

    #[must_use]
    pub fn with_email(mut self, email: impl Into<String>) -> Self {
        self.email = Some(email.into());
        self
    }

    /// Dashboard kind for this viewer's role
    ///
    /// # Errors
    /// Returns `SiteTrackError::Validation` for roles without a dashboard
    pub fn dashboard_kind(&self) -> Result<DashboardKind> {
        self.role.dashboard_kind().ok_or_else(|| {
            SiteTrackError::validation(format!("Role {} has no dashboard", self.role))
        })
    }

    fn require_user_id(&self) -> Result<&str> {
        self.user_id.as_deref().ok_or_else(|| {
            SiteTrackError::validation(format!("The {} dashboard needs a user id", self.role))
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdminDashboard {
    pub stats: DashboardStats,
    pub financial_summary: FinancialSummary,
    pub summary_source: SummarySource,
    pub projects: Vec<ProjectView>,
    pub users: Vec<UserView>,
    pub clients: Vec<ClientView>,
    pub recent_progress: Vec<ProgressReport>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectManagerDashboard {
    pub manager_id: String,
    pub stats: DashboardStats,
    pub projects: Vec<ProjectView>,
    pub tasks: Vec<TaskView>,
    pub overdue_tasks: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SupervisorDashboard {
    pub supervisor_id: String,
    pub breakdown: TaskBreakdown,
    pub assigned_tasks: Vec<TaskView>,
    pub active_projects: Vec<ProjectView>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InventoryDashboard {
    pub stats: InventoryStats,
    pub materials: Vec<Material>,
    pub low_stock: Vec<Material>,
    pub equipment: Vec<Equipment>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClientDashboard {
    pub client: ClientView,
    pub financials: ClientFinancials,
    pub projects: Vec<ProjectView>,
}

/// Knobs that change how dashboards are composed
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardOptions {
    /// Replaces each material's own reorder level in low-stock checks
    pub low_stock_threshold: Option<f64>,
}

/// Render-ready state for one viewer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Dashboard {
    Admin(AdminDashboard),
    ProjectManager(ProjectManagerDashboard),
    SiteSupervisor(SupervisorDashboard),
    Inventory(InventoryDashboard),
    Client(ClientDashboard),
}

impl Dashboard {
    #[must_use]
    pub fn kind(&self) -> DashboardKind {
        match self {
            Dashboard::Admin(_) => DashboardKind::Admin,
            Dashboard::ProjectManager(_) => DashboardKind::ProjectManager,
            Dashboard::SiteSupervisor(_) => DashboardKind::SiteSupervisor,
            Dashboard::Inventory(_) => DashboardKind::Inventory,
            Dashboard::Client(_) => DashboardKind::Client,
        }
    }
}

/// Compose the dashboard for `viewer` from `snapshot` with default options
///
/// # Errors
/// Returns `SiteTrackError::Validation` when the role has no dashboard or the
/// viewer lacks the identity the dashboard is scoped by, and
/// `SiteTrackError::NotFound` when a client viewer has no client record
pub fn build_dashboard(viewer: &Viewer, snapshot: &Snapshot) -> Result<Dashboard> {
    build_dashboard_with(viewer, snapshot, DashboardOptions::default())
}

/// Compose the dashboard for `viewer` from `snapshot`
///
/// # Errors
/// Same as [`build_dashboard`]
pub fn build_dashboard_with(
    viewer: &Viewer,
    snapshot: &Snapshot,
    options: DashboardOptions,
) -> Result<Dashboard> {
    let kind = viewer.dashboard_kind()?;
    debug!(?kind, "Building dashboard");

    Ok(match kind {
        DashboardKind::Admin => Dashboard::Admin(admin_dashboard(snapshot)),
        DashboardKind::ProjectManager => {
            Dashboard::ProjectManager(manager_dashboard(viewer.require_user_id()?, snapshot))
        }
        DashboardKind::SiteSupervisor => {
            Dashboard::SiteSupervisor(supervisor_dashboard(viewer.require_user_id()?, snapshot))
        }
        DashboardKind::Inventory => {
            Dashboard::Inventory(inventory_dashboard(snapshot, options.low_stock_threshold))
        }
        DashboardKind::Client => Dashboard::Client(client_dashboard(viewer, snapshot)?),
    })
}

/// The server summary when present, otherwise one reduced from the records
#[must_use]
pub fn effective_financial_summary(snapshot: &Snapshot) -> (FinancialSummary, SummarySource) {
    match &snapshot.server_summary {
        Some(summary) => (summary.clone(), SummarySource::Server),
        None => (
            financial_summary(&snapshot.financials),
            SummarySource::Computed,
        ),
    }
}

fn admin_dashboard(snapshot: &Snapshot) -> AdminDashboard {
    let (financial_summary, summary_source) = effective_financial_summary(snapshot);

    let mut recent_progress = snapshot.progress.clone();
    recent_progress.sort_by(|a, b| b.date.cmp(&a.date));
    recent_progress.truncate(RECENT_PROGRESS_LIMIT);

    AdminDashboard {
        stats: dashboard_stats(snapshot),
        financial_summary,
        summary_source,
        projects: build_project_views(&snapshot.projects, snapshot),
        users: build_user_views(&snapshot.users, snapshot),
        clients: build_client_views(&snapshot.clients, snapshot),
        recent_progress,
    }
}

fn manager_dashboard(manager_id: &str, snapshot: &Snapshot) -> ProjectManagerDashboard {
    let projects: Vec<Project> = snapshot
        .projects
        .iter()
        .filter(|p| refers_to(p.manager.as_ref(), manager_id))
        .cloned()
        .collect();
    let tasks: Vec<_> = snapshot
        .tasks
        .iter()
        .filter(|t| projects.iter().any(|p| t.belongs_to(&p.id)))
        .cloned()
        .collect();
    let members: Vec<User> = snapshot
        .users
        .iter()
        .filter(|u| tasks.iter().any(|t| t.is_assigned_to(&u.id)))
        .cloned()
        .collect();

    let client_count = {
        let mut ids: Vec<&str> = projects.iter().filter_map(Project::client_id).collect();
        ids.sort_unstable();
        ids.dedup();
        ids.len()
    };

    let overdue_tasks = snapshot.fetched_at.map_or(0, |now| overdue_count(&tasks, now));

    ProjectManagerDashboard {
        manager_id: manager_id.to_string(),
        stats: stats_for(&members, &projects, &tasks, client_count),
        projects: build_project_views(&projects, snapshot),
        tasks: build_task_views(&tasks, snapshot),
        overdue_tasks,
    }
}

fn supervisor_dashboard(supervisor_id: &str, snapshot: &Snapshot) -> SupervisorDashboard {
    let assigned: Vec<_> = snapshot
        .tasks
        .iter()
        .filter(|t| t.is_assigned_to(supervisor_id))
        .cloned()
        .collect();
    let active: Vec<Project> = snapshot
        .projects
        .iter()
        .filter(|p| p.status.is_active())
        .cloned()
        .collect();

    let breakdown = task_breakdown(supervisor_id, &snapshot.tasks);

    SupervisorDashboard {
        supervisor_id: supervisor_id.to_string(),
        breakdown,
        assigned_tasks: build_task_views(&assigned, snapshot),
        active_projects: build_project_views(&active, snapshot),
    }
}

fn inventory_dashboard(snapshot: &Snapshot, threshold: Option<f64>) -> InventoryDashboard {
    InventoryDashboard {
        stats: inventory_stats(&snapshot.materials, &snapshot.equipment, threshold),
        materials: snapshot.materials.clone(),
        low_stock: snapshot
            .materials
            .iter()
            .filter(|m| m.is_low_stock_at(threshold))
            .cloned()
            .collect(),
        equipment: snapshot.equipment.clone(),
    }
}

fn client_dashboard(viewer: &Viewer, snapshot: &Snapshot) -> Result<ClientDashboard> {
    let client = snapshot
        .clients
        .iter()
        .find(|c| {
            let email_match = viewer
                .email
                .as_deref()
                .is_some_and(|e| !e.is_empty() && c.email.eq_ignore_ascii_case(e));
            let id_match = viewer.user_id.as_deref() == Some(c.id.as_str());
            email_match || id_match
        })
        .ok_or_else(|| {
            let key = viewer
                .email
                .clone()
                .or_else(|| viewer.user_id.clone())
                .unwrap_or_default();
            SiteTrackError::not_found("Client", key)
        })?;

    let projects: Vec<Project> = snapshot
        .projects
        .iter()
        .filter(|p| refers_to(p.client.as_ref(), &client.id))
        .cloned()
        .collect();
    let view = build_client_views(std::slice::from_ref(client), snapshot)
        .into_iter()
        .next()
        .ok_or_else(|| SiteTrackError::not_found("Client", client.id.clone()))?;

    Ok(ClientDashboard {
        financials: client_financials(client, &snapshot.projects, &snapshot.financials),
        client: view,
        projects: build_project_views(&projects, snapshot),
    })
}

fn overdue_count(tasks: &[Task], now: DateTime<Utc>) -> usize {
    tasks
        .iter()
        .filter(|t| t.status.is_open() && t.due_date.is_some_and(|due| due < now))
        .count()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{EntityRef, TaskPriority, TaskStatus};

    fn task_for(id: &str, assignee: &str) -> Task {
        Task {
            id: id.to_string(),
            title: format!("Task {id}"),
            description: String::new(),
            status: TaskStatus::Pending,
            priority: TaskPriority::Medium,
            project: None,
            assigned_to: Some(EntityRef::new(assignee)),
            due_date: None,
        }
    }

    #[test]
    fn test_viewer_without_dashboard() {
        let viewer = Viewer::new(Role::Worker);
        assert!(viewer.dashboard_kind().is_err());
        assert!(build_dashboard(&viewer, &Snapshot::default()).is_err());
    }

    #[test]
    fn test_scoped_dashboards_need_user_id() {
        let snapshot = Snapshot::default();
        for role in [Role::ProjectManager, Role::SiteSupervisor] {
            let err = build_dashboard(&Viewer::new(role), &snapshot).unwrap_err();
            assert!(err.to_string().contains("needs a user id"));
        }
    }

    #[test]
    fn test_supervisor_missing_from_user_list() {
        let snapshot = Snapshot {
            tasks: vec![
                Task {
                    status: TaskStatus::Completed,
                    ..task_for("t1", "u-ghost")
                },
                task_for("t2", "u-ghost"),
                task_for("t3", "u-other"),
            ],
            ..Snapshot::default()
        };
        let viewer = Viewer::new(Role::SiteSupervisor).with_user_id("u-ghost");

        let Dashboard::SiteSupervisor(sup) = build_dashboard(&viewer, &snapshot).unwrap() else {
            panic!("Expected supervisor dashboard");
        };
        assert_eq!(sup.breakdown.assigned, 2);
        assert_eq!(sup.breakdown.completed, 1);
        assert_eq!(sup.breakdown.pending, 1);
        assert_eq!(sup.assigned_tasks.len(), 2);
    }

    #[test]
    fn test_admin_dashboard_on_empty_snapshot() {
        let dashboard = build_dashboard(&Viewer::new(Role::Admin), &Snapshot::default()).unwrap();
        assert_eq!(dashboard.kind(), DashboardKind::Admin);
        match dashboard {
            Dashboard::Admin(admin) => {
                assert_eq!(admin.summary_source, SummarySource::Computed);
                assert!(admin.projects.is_empty());
            }
            other => panic!("Expected admin dashboard, got {other:?}"),
        }
    }

    #[test]
    fn test_server_summary_wins() {
        let snapshot = Snapshot {
            server_summary: Some(FinancialSummary {
                total_income: 10.0,
                ..FinancialSummary::default()
            }),
            ..Snapshot::default()
        };
        let (summary, source) = effective_financial_summary(&snapshot);
        assert_eq!(source, SummarySource::Server);
        assert!((summary.total_income - 10.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_client_viewer_without_record() {
        let viewer = Viewer::new(Role::Client).with_email("nobody@example.com");
        match build_dashboard(&viewer, &Snapshot::default()) {
            Err(SiteTrackError::NotFound { entity, id }) => {
                assert_eq!(entity, "Client");
                assert_eq!(id, "nobody@example.com");
            }
            other => panic!("Expected NotFound, got {other:?}"),
        }
    }

    #[test]
    fn test_dashboard_serializes_with_kind_tag() {
        let dashboard = build_dashboard(&Viewer::new(Role::InventoryManager), &Snapshot::default())
            .unwrap();
        let json = serde_json::to_value(&dashboard).unwrap();
        assert_eq!(json["kind"], "inventory");
        assert_eq!(json["stats"]["totalMaterials"], 0);
    }
}
