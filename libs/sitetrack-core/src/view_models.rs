//! View-models: base entities enriched with derived fields
//!
//! Each builder takes the base list to enrich plus the snapshot used for joins.
//! Builders clone their inputs and return one view per input entity, in input
//! order.

use serde::{Deserialize, Serialize};
use sitetrack_common::{NOT_AVAILABLE, UNASSIGNED};

use crate::aggregator::{
    client_financials, latest_progress, project_progress, project_task_counts,
    user_task_breakdown,
};
use crate::models::{refers_to, Client, EntityRef, ProgressReport, Project, Task, User};
use crate::snapshot::Snapshot;

/// Project with task counts, progress and resolved names
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectView {
    #[serde(flatten)]
    pub project: Project,
    pub total_tasks: usize,
    pub completed_tasks: usize,
    pub calculated_progress: u8,
    pub latest_progress: Option<ProgressReport>,
    pub client_name: String,
    pub manager_name: String,
}

/// User with task counts
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserView {
    #[serde(flatten)]
    pub user: User,
    pub assigned_tasks: usize,
    pub completed_tasks: usize,
    pub pending_tasks: usize,
}

/// Client with revenue figures
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClientView {
    #[serde(flatten)]
    pub client: Client,
    pub project_count: usize,
    pub revenue: f64,
    pub pending_payment: f64,
}

/// Task with resolved project and assignee names
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskView {
    #[serde(flatten)]
    pub task: Task,
    pub project_name: String,
    pub assignee_name: String,
}

/// Enrich projects with task counts, progress, latest report and display names
#[must_use]
pub fn build_project_views(projects: &[Project], snapshot: &Snapshot) -> Vec<ProjectView> {
    projects
        .iter()
        .map(|project| {
            let (total_tasks, completed_tasks) = project_task_counts(project, &snapshot.tasks);
            let calculated_progress = project_progress(project, &snapshot.tasks);
            ProjectView {
                total_tasks,
                completed_tasks,
                calculated_progress,
                latest_progress: latest_progress(project, &snapshot.progress).cloned(),
                client_name: resolve_name(
                    project.client.as_ref(),
                    |id| snapshot.client(id).map(|c| c.name.clone()),
                    NOT_AVAILABLE,
                ),
                manager_name: resolve_name(
                    project.manager.as_ref(),
                    |id| snapshot.user(id).map(|u| u.name.clone()),
                    UNASSIGNED,
                ),
                project: project.clone(),
            }
        })
        .collect()
}

/// Enrich users with their task breakdown
#[must_use]
pub fn build_user_views(users: &[User], snapshot: &Snapshot) -> Vec<UserView> {
    users
        .iter()
        .map(|user| {
            let breakdown = user_task_breakdown(user, &snapshot.tasks);
            UserView {
                user: user.clone(),
                assigned_tasks: breakdown.assigned,
                completed_tasks: breakdown.completed,
                pending_tasks: breakdown.pending,
            }
        })
        .collect()
}

/// Enrich clients with project count, revenue and pending payment
#[must_use]
pub fn build_client_views(clients: &[Client], snapshot: &Snapshot) -> Vec<ClientView> {
    clients
        .iter()
        .map(|client| {
            let financials = client_financials(client, &snapshot.projects, &snapshot.financials);
            ClientView {
                client: client.clone(),
                project_count: snapshot
                    .projects
                    .iter()
                    .filter(|p| refers_to(p.client.as_ref(), &client.id))
                    .count(),
                revenue: financials.revenue,
                pending_payment: financials.pending_payment,
            }
        })
        .collect()
}

/// Enrich tasks with project and assignee names
#[must_use]
pub fn build_task_views(tasks: &[Task], snapshot: &Snapshot) -> Vec<TaskView> {
    tasks
        .iter()
        .map(|task| TaskView {
            project_name: resolve_name(
                task.project.as_ref(),
                |id| snapshot.project(id).map(|p| p.name.clone()),
                NOT_AVAILABLE,
            ),
            assignee_name: resolve_name(
                task.assigned_to.as_ref(),
                |id| snapshot.user(id).map(|u| u.name.clone()),
                UNASSIGNED,
            ),
            task: task.clone(),
        })
        .collect()
}

/// Display name for a reference: populated name, then lookup, then `fallback`
fn resolve_name<F>(reference: Option<&EntityRef>, lookup: F, fallback: &str) -> String
where
    F: Fn(&str) -> Option<String>,
{
    let Some(reference) = reference else {
        return fallback.to_string();
    };
    reference
        .name
        .clone()
        .filter(|n| !n.trim().is_empty())
        .or_else(|| lookup(&reference.id))
        .filter(|n| !n.trim().is_empty())
        .unwrap_or_else(|| fallback.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ProjectStatus, TaskPriority, TaskStatus};
    use crate::roles::Role;

    fn snapshot() -> Snapshot {
        let user = |id: &str, name: &str| User {
            id: id.to_string(),
            name: name.to_string(),
            email: String::new(),
            role: Role::ProjectManager,
            is_active: true,
            phone: String::new(),
        };
        let project = |id: &str, manager: Option<EntityRef>| Project {
            id: id.to_string(),
            name: format!("Site {id}"),
            location: String::new(),
            description: String::new(),
            status: ProjectStatus::Active,
            budget: 100.0,
            client: Some(EntityRef::new("c1")),
            manager,
            start_date: None,
            end_date: None,
        };
        let task = |id: &str, status, project: Option<&str>, assignee: Option<EntityRef>| Task {
            id: id.to_string(),
            title: id.to_string(),
            description: String::new(),
            status,
            priority: TaskPriority::Low,
            project: project.map(EntityRef::new),
            assigned_to: assignee,
            due_date: None,
        };

        Snapshot {
            users: vec![user("u1", "Morgan"), user("u2", "")],
            projects: vec![
                project("p1", Some(EntityRef::new("u1"))),
                project("p2", None),
                project("p3", Some(EntityRef::new("u404"))),
            ],
            tasks: vec![
                task("t1", TaskStatus::Completed, Some("p1"), Some(EntityRef::new("u1"))),
                task("t2", TaskStatus::Pending, Some("p1"), None),
                task(
                    "t3",
                    TaskStatus::Pending,
                    Some("p404"),
                    Some(EntityRef::named("u9", "Populated Name")),
                ),
            ],
            clients: vec![Client {
                id: "c1".to_string(),
                name: "Acme".to_string(),
                company: String::new(),
                email: String::new(),
                phone: String::new(),
                address: String::new(),
                is_active: true,
            }],
            ..Snapshot::default()
        }
    }

    #[test]
    fn test_project_views_preserve_order_and_length() {
        let snap = snapshot();
        let views = build_project_views(&snap.projects, &snap);
        let ids: Vec<&str> = views.iter().map(|v| v.project.id.as_str()).collect();
        assert_eq!(ids, vec!["p1", "p2", "p3"]);
    }

    #[test]
    fn test_project_view_fields() {
        let snap = snapshot();
        let views = build_project_views(&snap.projects, &snap);

        assert_eq!(views[0].total_tasks, 2);
        assert_eq!(views[0].completed_tasks, 1);
        assert_eq!(views[0].calculated_progress, 50);
        assert_eq!(views[0].manager_name, "Morgan");
        assert_eq!(views[0].client_name, "Acme");

        assert_eq!(views[1].calculated_progress, 0);
        assert_eq!(views[1].manager_name, UNASSIGNED);
        assert_eq!(views[2].manager_name, UNASSIGNED);
    }

    #[test]
    fn test_builders_do_not_mutate_inputs() {
        let snap = snapshot();
        let before = snap.projects.clone();
        let _ = build_project_views(&snap.projects, &snap);
        assert_eq!(snap.projects, before);
    }

    #[test]
    fn test_user_views() {
        let snap = snapshot();
        let views = build_user_views(&snap.users, &snap);
        assert_eq!(views.len(), 2);
        assert_eq!(views[0].assigned_tasks, 1);
        assert_eq!(views[0].completed_tasks, 1);
        assert_eq!(views[1].assigned_tasks, 0);
    }

    #[test]
    fn test_client_views() {
        let snap = snapshot();
        let views = build_client_views(&snap.clients, &snap);
        assert_eq!(views[0].project_count, 3);
        assert!((views[0].pending_payment - 300.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_task_views_resolve_names() {
        let snap = snapshot();
        let views = build_task_views(&snap.tasks, &snap);

        assert_eq!(views[0].project_name, "Site p1");
        assert_eq!(views[0].assignee_name, "Morgan");
        assert_eq!(views[1].assignee_name, UNASSIGNED);
        assert_eq!(views[2].project_name, NOT_AVAILABLE);
        assert_eq!(views[2].assignee_name, "Populated Name");
    }

    #[test]
    fn test_blank_lookup_name_falls_back() {
        let snap = snapshot();
        let task = Task {
            assigned_to: Some(EntityRef::new("u2")),
            ..snap.tasks[0].clone()
        };
        let views = build_task_views(&[task], &snap);
        assert_eq!(views[0].assignee_name, UNASSIGNED);
    }

    #[test]
    fn test_view_serialization_is_flat_camel_case() {
        let snap = snapshot();
        let views = build_project_views(&snap.projects[..1], &snap);
        let json = serde_json::to_value(&views[0]).unwrap();

        assert_eq!(json["_id"], "p1");
        assert_eq!(json["calculatedProgress"], 50);
        assert_eq!(json["totalTasks"], 2);
        assert_eq!(json["managerName"], "Morgan");
    }
}
