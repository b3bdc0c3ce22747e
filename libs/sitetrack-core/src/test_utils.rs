//! Test utilities and mock data for SiteTrack

use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;
use tokio::sync::RwLock;

use crate::error::{Result, SiteTrackError};
use crate::models::{
    Client, EntityRef, Equipment, EquipmentStatus, FinancialRecord, Material, ProgressReport,
    Project, ProjectStatus, Task, TaskPriority, TaskStatus, TransactionType, User,
};
use crate::roles::Role;
use crate::snapshot::{EntitySource, Resource, Snapshot, SnapshotPart};

#[must_use]
pub fn create_mock_user(id: &str, name: &str, role: Role) -> User {
    User {
        id: id.to_string(),
        name: name.to_string(),
        email: format!("{id}@sitetrack.test"),
        role,
        is_active: true,
        phone: String::new(),
    }
}

#[must_use]
pub fn create_mock_project(
    id: &str,
    status: ProjectStatus,
    client: Option<&str>,
    manager: Option<&str>,
    budget: f64,
) -> Project {
    Project {
        id: id.to_string(),
        name: format!("Project {id}"),
        location: "Harbour Rd".to_string(),
        description: String::new(),
        status,
        budget,
        client: client.map(EntityRef::new),
        manager: manager.map(EntityRef::new),
        start_date: None,
        end_date: None,
    }
}

#[must_use]
pub fn create_mock_task(
    id: &str,
    status: TaskStatus,
    project: Option<&str>,
    assignee: Option<&str>,
) -> Task {
    Task {
        id: id.to_string(),
        title: format!("Task {id}"),
        description: String::new(),
        status,
        priority: TaskPriority::Medium,
        project: project.map(EntityRef::new),
        assigned_to: assignee.map(EntityRef::new),
        due_date: None,
    }
}

#[must_use]
pub fn create_mock_client(id: &str, name: &str, email: &str) -> Client {
    Client {
        id: id.to_string(),
        name: name.to_string(),
        company: format!("{name} Ltd"),
        email: email.to_string(),
        phone: String::new(),
        address: String::new(),
        is_active: true,
    }
}

/// Progress report dated `day` days into 2024
#[must_use]
pub fn create_mock_progress(id: &str, project: &str, percent: f64, day: u32) -> ProgressReport {
    ProgressReport {
        id: id.to_string(),
        project: Some(EntityRef::new(project)),
        reported_by: None,
        percent_complete: percent,
        work_description: format!("Report {id}"),
        images: Vec::new(),
        date: Utc.with_ymd_and_hms(2024, 1, day.clamp(1, 28), 9, 0, 0).single(),
    }
}

#[must_use]
pub fn create_mock_financial(
    record_type: TransactionType,
    category: &str,
    amount: f64,
    project: Option<&str>,
) -> FinancialRecord {
    FinancialRecord {
        id: format!("f-{category}-{amount}"),
        record_type,
        category: category.to_string(),
        amount,
        project: project.map(EntityRef::new),
        description: String::new(),
        date: None,
    }
}

#[must_use]
pub fn create_mock_material(name: &str, quantity: f64, min_stock_level: f64) -> Material {
    Material {
        id: format!("m-{name}"),
        name: name.to_string(),
        category: "General".to_string(),
        quantity,
        unit: "unit".to_string(),
        min_stock_level,
        unit_price: 10.0,
        supplier: String::new(),
        project: None,
    }
}

#[must_use]
pub fn create_mock_equipment(name: &str, status: EquipmentStatus) -> Equipment {
    Equipment {
        id: format!("e-{name}"),
        name: name.to_string(),
        equipment_type: "Heavy".to_string(),
        status,
        assigned_project: None,
        last_maintenance: None,
    }
}

/// A small but complete site: two projects, one client, staff and records
#[must_use]
pub fn create_mock_snapshot() -> Snapshot {
    Snapshot {
        users: vec![
            create_mock_user("u-admin", "Avery Admin", Role::Admin),
            create_mock_user("u-pm", "Parker Manager", Role::ProjectManager),
            create_mock_user("u-sup", "Sam Supervisor", Role::SiteSupervisor),
        ],
        projects: vec![
            create_mock_project(
                "p-tower",
                ProjectStatus::Active,
                Some("c-harbour"),
                Some("u-pm"),
                1000.0,
            ),
            create_mock_project(
                "p-bridge",
                ProjectStatus::Planning,
                Some("c-harbour"),
                None,
                2000.0,
            ),
        ],
        tasks: vec![
            create_mock_task("t1", TaskStatus::Completed, Some("p-tower"), Some("u-sup")),
            create_mock_task("t2", TaskStatus::Completed, Some("p-tower"), Some("u-sup")),
            create_mock_task("t3", TaskStatus::Pending, Some("p-tower"), Some("u-sup")),
            create_mock_task("t4", TaskStatus::InProgress, Some("p-bridge"), None),
        ],
        clients: vec![create_mock_client(
            "c-harbour",
            "Harbour Board",
            "board@harbour.test",
        )],
        progress: vec![
            create_mock_progress("r1", "p-tower", 20.0, 3),
            create_mock_progress("r2", "p-tower", 55.0, 17),
        ],
        financials: vec![
            create_mock_financial(TransactionType::Income, "Billing", 400.0, Some("p-tower")),
            create_mock_financial(TransactionType::Expense, "Labour", 150.0, Some("p-tower")),
        ],
        materials: vec![
            create_mock_material("cement", 4.0, 10.0),
            create_mock_material("gravel", 80.0, 20.0),
        ],
        equipment: vec![
            create_mock_equipment("crane", EquipmentStatus::InUse),
            create_mock_equipment("mixer", EquipmentStatus::Available),
        ],
        ..Snapshot::default()
    }
}

/// In-memory [`EntitySource`] serving a replaceable snapshot
///
/// Can be switched into a failing mode and slowed down to exercise the
/// refresher's error and cancellation paths.
#[derive(Debug, Default)]
pub struct MockSource {
    snapshot: RwLock<Snapshot>,
    failing: AtomicBool,
    delay: Option<Duration>,
    fetches: AtomicUsize,
}

impl MockSource {
    #[must_use]
    pub fn new(snapshot: Snapshot) -> Self {
        Self {
            snapshot: RwLock::new(snapshot),
            ..Self::default()
        }
    }

    /// Delay every fetch by `delay`
    #[must_use]
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    pub async fn replace_snapshot(&self, snapshot: Snapshot) {
        *self.snapshot.write().await = snapshot;
    }

    /// Number of resource fetches served so far, failed ones included
    #[must_use]
    pub fn fetch_count(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl EntitySource for MockSource {
    async fn fetch(&self, resource: Resource) -> Result<SnapshotPart> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        if self.failing.load(Ordering::SeqCst) {
            return Err(SiteTrackError::Status {
                status: 503,
                endpoint: resource.to_string(),
                message: "Service Unavailable".to_string(),
            });
        }

        let snapshot = self.snapshot.read().await;
        Ok(match resource {
            Resource::Users => SnapshotPart::Users(snapshot.users.clone()),
            Resource::Projects => SnapshotPart::Projects(snapshot.projects.clone()),
            Resource::Tasks => SnapshotPart::Tasks(snapshot.tasks.clone()),
            Resource::Clients => SnapshotPart::Clients(snapshot.clients.clone()),
            Resource::Progress => SnapshotPart::Progress(snapshot.progress.clone()),
            Resource::Financials => SnapshotPart::Financials(snapshot.financials.clone()),
            Resource::FinancialSummary => {
                SnapshotPart::FinancialSummary(snapshot.server_summary.clone())
            }
            Resource::Materials => SnapshotPart::Materials(snapshot.materials.clone()),
            Resource::Equipment => SnapshotPart::Equipment(snapshot.equipment.clone()),
            Resource::Reports => SnapshotPart::Reports(snapshot.reports.clone()),
        })
    }
}
