//! Raw entity snapshots and the concurrent fetch that produces them

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use futures::future::try_join_all;
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::{debug, instrument};

use crate::error::Result;
use crate::models::{
    Client, Equipment, FinancialRecord, FinancialSummary, Material, ProgressReport, Project,
    Report, Task, User,
};

/// A list endpoint of the REST API
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Resource {
    Users,
    Projects,
    Tasks,
    Clients,
    Progress,
    Financials,
    FinancialSummary,
    Materials,
    Equipment,
    Reports,
}

impl Resource {
    /// Path of the list endpoint, relative to the API base URL
    #[must_use]
    pub fn path(self) -> &'static str {
        match self {
            Resource::Users => "users",
            Resource::Projects => "projects",
            Resource::Tasks => "tasks",
            Resource::Clients => "clients",
            Resource::Progress => "progress/latest",
            Resource::Financials => "financials",
            Resource::FinancialSummary => "financials/summary",
            Resource::Materials => "materials",
            Resource::Equipment => "equipment",
            Resource::Reports => "reports",
        }
    }

    /// Envelope keys under which the list may arrive, in lookup order
    #[must_use]
    pub fn envelope_keys(self) -> &'static [&'static str] {
        match self {
            Resource::Users => &["users"],
            Resource::Projects => &["projects"],
            Resource::Tasks => &["tasks"],
            Resource::Clients => &["clients"],
            Resource::Progress => &["reports", "progress"],
            Resource::Financials => &["financials", "records", "transactions"],
            Resource::FinancialSummary => &["summary"],
            Resource::Materials => &["materials"],
            Resource::Equipment => &["equipment"],
            Resource::Reports => &["reports"],
        }
    }
}

impl fmt::Display for Resource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "/{}", self.path())
    }
}

/// The parsed payload of one resource fetch
#[derive(Debug, Clone)]
pub enum SnapshotPart {
    Users(Vec<User>),
    Projects(Vec<Project>),
    Tasks(Vec<Task>),
    Clients(Vec<Client>),
    Progress(Vec<ProgressReport>),
    Financials(Vec<FinancialRecord>),
    /// `None` when the server does not provide a summary
    FinancialSummary(Option<FinancialSummary>),
    Materials(Vec<Material>),
    Equipment(Vec<Equipment>),
    Reports(Vec<Report>),
}

/// Raw entity lists from one successful fetch cycle
///
/// Lists for resources that were not requested stay empty.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Snapshot {
    pub users: Vec<User>,
    pub projects: Vec<Project>,
    pub tasks: Vec<Task>,
    pub clients: Vec<Client>,
    pub progress: Vec<ProgressReport>,
    pub financials: Vec<FinancialRecord>,
    pub server_summary: Option<FinancialSummary>,
    pub materials: Vec<Material>,
    pub equipment: Vec<Equipment>,
    pub reports: Vec<Report>,
    pub fetched_at: Option<DateTime<Utc>>,
}

impl Snapshot {
    /// Store a fetched part in its slot
    pub fn absorb(&mut self, part: SnapshotPart) {
        match part {
            SnapshotPart::Users(users) => self.users = users,
            SnapshotPart::Projects(projects) => self.projects = projects,
            SnapshotPart::Tasks(tasks) => self.tasks = tasks,
            SnapshotPart::Clients(clients) => self.clients = clients,
            SnapshotPart::Progress(reports) => self.progress = reports,
            SnapshotPart::Financials(records) => self.financials = records,
            SnapshotPart::FinancialSummary(summary) => self.server_summary = summary,
            SnapshotPart::Materials(materials) => self.materials = materials,
            SnapshotPart::Equipment(equipment) => self.equipment = equipment,
            SnapshotPart::Reports(reports) => self.reports = reports,
        }
    }

    /// Look up a user by id
    #[must_use]
    pub fn user(&self, id: &str) -> Option<&User> {
        self.users.iter().find(|u| u.id == id)
    }

    /// Look up a project by id
    #[must_use]
    pub fn project(&self, id: &str) -> Option<&Project> {
        self.projects.iter().find(|p| p.id == id)
    }

    /// Look up a client by id
    #[must_use]
    pub fn client(&self, id: &str) -> Option<&Client> {
        self.clients.iter().find(|c| c.id == id)
    }
}

/// Anything that can produce snapshot parts
///
/// Implemented by [`crate::api::ApiClient`]; tests substitute in-memory sources.
#[async_trait]
pub trait EntitySource: Send + Sync {
    /// Fetch and parse one resource
    async fn fetch(&self, resource: Resource) -> Result<SnapshotPart>;
}

/// Fetch all `resources` concurrently and join them into a snapshot
///
/// All-or-nothing: the first failure aborts the whole snapshot.
///
/// # Errors
/// Returns the first error reported by the source
#[instrument(skip(source), fields(resources = resources.len()))]
pub async fn fetch_snapshot<S>(source: &S, resources: &[Resource]) -> Result<Snapshot>
where
    S: EntitySource + ?Sized,
{
    let parts = try_join_all(resources.iter().map(|&r| source.fetch(r))).await?;

    let mut snapshot = Snapshot::default();
    for part in parts {
        snapshot.absorb(part);
    }
    snapshot.fetched_at = Some(Utc::now());

    debug!(
        users = snapshot.users.len(),
        projects = snapshot.projects.len(),
        tasks = snapshot.tasks.len(),
        "Snapshot assembled"
    );
    Ok(snapshot)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SiteTrackError;
    use crate::models::EntityRef;

    struct StaticSource {
        fail_on: Option<Resource>,
    }

    #[async_trait]
    impl EntitySource for StaticSource {
        async fn fetch(&self, resource: Resource) -> Result<SnapshotPart> {
            if self.fail_on == Some(resource) {
                return Err(SiteTrackError::Status {
                    status: 503,
                    endpoint: resource.to_string(),
                    message: "unavailable".to_string(),
                });
            }
            Ok(match resource {
                Resource::Projects => SnapshotPart::Projects(vec![Project {
                    id: "p1".to_string(),
                    name: "Depot".to_string(),
                    location: String::new(),
                    description: String::new(),
                    status: crate::models::ProjectStatus::Active,
                    budget: 10.0,
                    client: Some(EntityRef::new("c1")),
                    manager: None,
                    start_date: None,
                    end_date: None,
                }]),
                Resource::FinancialSummary => SnapshotPart::FinancialSummary(None),
                _ => SnapshotPart::Users(Vec::new()),
            })
        }
    }

    #[test]
    fn test_resource_paths() {
        assert_eq!(Resource::Progress.path(), "progress/latest");
        assert_eq!(Resource::FinancialSummary.to_string(), "/financials/summary");
        assert_eq!(Resource::Users.envelope_keys(), &["users"]);
    }

    #[tokio::test]
    async fn test_fetch_snapshot_joins_parts() {
        let source = StaticSource { fail_on: None };
        let snapshot = fetch_snapshot(
            &source,
            &[Resource::Projects, Resource::FinancialSummary],
        )
        .await
        .unwrap();

        assert_eq!(snapshot.projects.len(), 1);
        assert!(snapshot.project("p1").is_some());
        assert!(snapshot.server_summary.is_none());
        assert!(snapshot.fetched_at.is_some());
    }

    #[tokio::test]
    async fn test_fetch_snapshot_is_all_or_nothing() {
        let source = StaticSource {
            fail_on: Some(Resource::Tasks),
        };
        let result = fetch_snapshot(
            &source,
            &[Resource::Projects, Resource::Tasks, Resource::Users],
        )
        .await;

        match result {
            Err(SiteTrackError::Status { status, .. }) => assert_eq!(status, 503),
            other => panic!("Expected status error, got {other:?}"),
        }
    }

    #[test]
    fn test_lookup_helpers_on_empty_snapshot() {
        let snapshot = Snapshot::default();
        assert!(snapshot.user("u1").is_none());
        assert!(snapshot.client("c1").is_none());
    }
}
