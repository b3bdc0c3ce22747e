//! Export of enriched projects, users and clients

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fmt;
use std::str::FromStr;

use crate::error::{Result, SiteTrackError};
use crate::snapshot::{Resource, Snapshot};
use crate::view_models::{
    build_client_views, build_project_views, build_user_views, ClientView, ProjectView, UserView,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    Json,
    Csv,
}

impl FromStr for ExportFormat {
    type Err = SiteTrackError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "json" => Ok(Self::Json),
            "csv" => Ok(Self::Csv),
            _ => Err(SiteTrackError::validation(format!(
                "Unsupported export format: {s}"
            ))),
        }
    }
}

/// Which entity list to export
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ExportEntity {
    Projects,
    Users,
    Clients,
}

impl ExportEntity {
    /// Resources that must be fetched to build this entity's views
    #[must_use]
    pub fn resources(self) -> &'static [Resource] {
        match self {
            ExportEntity::Projects => &[
                Resource::Projects,
                Resource::Tasks,
                Resource::Users,
                Resource::Clients,
                Resource::Progress,
            ],
            ExportEntity::Users => &[Resource::Users, Resource::Tasks],
            ExportEntity::Clients => &[Resource::Clients, Resource::Projects, Resource::Financials],
        }
    }
}

impl fmt::Display for ExportEntity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ExportEntity::Projects => "projects",
            ExportEntity::Users => "users",
            ExportEntity::Clients => "clients",
        };
        f.write_str(name)
    }
}

impl FromStr for ExportEntity {
    type Err = SiteTrackError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "projects" | "project" => Ok(Self::Projects),
            "users" | "user" => Ok(Self::Users),
            "clients" | "client" => Ok(Self::Clients),
            _ => Err(SiteTrackError::validation(format!(
                "Unsupported export entity: {s}"
            ))),
        }
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct JsonExport<'a, T: Serialize> {
    entity: ExportEntity,
    exported_at: DateTime<Utc>,
    count: usize,
    items: &'a [T],
}

/// Render the views of `entity` built from `snapshot`
///
/// # Errors
/// Returns a serialization error, or `SiteTrackError::Validation` for CSV when
/// the `export-csv` feature is disabled
pub fn export(snapshot: &Snapshot, entity: ExportEntity, format: ExportFormat) -> Result<String> {
    match entity {
        ExportEntity::Projects => {
            let views = build_project_views(&snapshot.projects, snapshot);
            let rows: Vec<_> = views.iter().map(project_row).collect();
            render(entity, &views, &rows, format)
        }
        ExportEntity::Users => {
            let views = build_user_views(&snapshot.users, snapshot);
            let rows: Vec<_> = views.iter().map(user_row).collect();
            render(entity, &views, &rows, format)
        }
        ExportEntity::Clients => {
            let views = build_client_views(&snapshot.clients, snapshot);
            let rows: Vec<_> = views.iter().map(client_row).collect();
            render(entity, &views, &rows, format)
        }
    }
}

/// JSON carries the full views, CSV the flat rows
fn render<T: Serialize, R: Serialize>(
    entity: ExportEntity,
    views: &[T],
    rows: &[R],
    format: ExportFormat,
) -> Result<String> {
    match format {
        ExportFormat::Json => Ok(serde_json::to_string_pretty(&JsonExport {
            entity,
            exported_at: Utc::now(),
            count: views.len(),
            items: views,
        })?),
        ExportFormat::Csv => csv_rows(rows),
    }
}

#[cfg(feature = "export-csv")]
fn csv_rows<R: Serialize>(rows: &[R]) -> Result<String> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    for row in rows {
        writer
            .serialize(row)
            .map_err(|e| SiteTrackError::validation(format!("CSV export failed: {e}")))?;
    }
    let bytes = writer
        .into_inner()
        .map_err(|e| SiteTrackError::validation(format!("CSV export failed: {e}")))?;
    String::from_utf8(bytes)
        .map_err(|e| SiteTrackError::validation(format!("CSV export produced invalid UTF-8: {e}")))
}

#[cfg(not(feature = "export-csv"))]
fn csv_rows<R: Serialize>(_rows: &[R]) -> Result<String> {
    Err(SiteTrackError::validation(
        "CSV export requires the export-csv feature",
    ))
}

#[derive(Serialize)]
struct ProjectRow<'a> {
    id: &'a str,
    name: &'a str,
    status: &'a str,
    location: &'a str,
    budget: f64,
    client: &'a str,
    manager: &'a str,
    total_tasks: usize,
    completed_tasks: usize,
    progress: u8,
}

fn project_row(view: &ProjectView) -> ProjectRow<'_> {
    ProjectRow {
        id: &view.project.id,
        name: &view.project.name,
        status: view.project.status.label(),
        location: &view.project.location,
        budget: view.project.budget,
        client: &view.client_name,
        manager: &view.manager_name,
        total_tasks: view.total_tasks,
        completed_tasks: view.completed_tasks,
        progress: view.calculated_progress,
    }
}

#[derive(Serialize)]
struct UserRow<'a> {
    id: &'a str,
    name: &'a str,
    email: &'a str,
    role: &'a str,
    active: bool,
    assigned_tasks: usize,
    completed_tasks: usize,
    pending_tasks: usize,
}

fn user_row(view: &UserView) -> UserRow<'_> {
    UserRow {
        id: &view.user.id,
        name: &view.user.name,
        email: &view.user.email,
        role: view.user.role.label(),
        active: view.user.is_active,
        assigned_tasks: view.assigned_tasks,
        completed_tasks: view.completed_tasks,
        pending_tasks: view.pending_tasks,
    }
}

#[derive(Serialize)]
struct ClientRow<'a> {
    id: &'a str,
    name: &'a str,
    company: &'a str,
    email: &'a str,
    project_count: usize,
    revenue: f64,
    pending_payment: f64,
}

fn client_row(view: &ClientView) -> ClientRow<'_> {
    ClientRow {
        id: &view.client.id,
        name: &view.client.name,
        company: &view.client.company,
        email: &view.client.email,
        project_count: view.project_count,
        revenue: view.revenue,
        pending_payment: view.pending_payment,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::create_mock_snapshot;

    #[test]
    fn test_format_and_entity_parsing() {
        assert_eq!("JSON".parse::<ExportFormat>().unwrap(), ExportFormat::Json);
        assert_eq!("csv".parse::<ExportFormat>().unwrap(), ExportFormat::Csv);
        assert!("xml".parse::<ExportFormat>().is_err());
        assert_eq!("client".parse::<ExportEntity>().unwrap(), ExportEntity::Clients);
        assert_eq!(ExportEntity::Users.to_string(), "users");
    }

    #[test]
    fn test_json_export() {
        let snapshot = create_mock_snapshot();
        let out = export(&snapshot, ExportEntity::Projects, ExportFormat::Json).unwrap();
        let json: serde_json::Value = serde_json::from_str(&out).unwrap();

        assert_eq!(json["entity"], "projects");
        assert_eq!(json["count"], 2);
        assert_eq!(json["items"][0]["_id"], "p-tower");
        assert_eq!(json["items"][0]["calculatedProgress"], 67);
    }

    #[cfg(feature = "export-csv")]
    #[test]
    fn test_csv_export() {
        let snapshot = create_mock_snapshot();
        let out = export(&snapshot, ExportEntity::Users, ExportFormat::Csv).unwrap();
        let mut lines = out.lines();

        assert_eq!(
            lines.next(),
            Some("id,name,email,role,active,assigned_tasks,completed_tasks,pending_tasks")
        );
        assert_eq!(lines.count(), 3);
    }

    #[cfg(feature = "export-csv")]
    #[test]
    fn test_csv_export_projects_and_clients() {
        let snapshot = create_mock_snapshot();

        let out = export(&snapshot, ExportEntity::Projects, ExportFormat::Csv).unwrap();
        let mut lines = out.lines();
        assert_eq!(
            lines.next(),
            Some("id,name,status,location,budget,client,manager,total_tasks,completed_tasks,progress")
        );
        let tower = lines.next().unwrap();
        assert!(tower.starts_with("p-tower,Project p-tower,Active,"));
        assert!(tower.ends_with(",3,2,67"));

        let out = export(&snapshot, ExportEntity::Clients, ExportFormat::Csv).unwrap();
        let row = out.lines().nth(1).unwrap();
        assert!(row.starts_with("c-harbour,Harbour Board,"));
        assert!(row.contains(",2,"));
    }

    #[cfg(not(feature = "export-csv"))]
    #[test]
    fn test_csv_requires_feature() {
        let snapshot = create_mock_snapshot();
        assert!(export(&snapshot, ExportEntity::Clients, ExportFormat::Csv).is_err());
    }
}
