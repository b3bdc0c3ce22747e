//! SiteTrack Core - dashboard aggregation for the SiteTrack construction backend
//!
//! This library fetches users, projects, tasks, clients, progress reports and
//! financial records from the SiteTrack REST API and turns them into
//! role-specific dashboards that stay current through a polling refresher.
//!
//! # Features
//!
//! - **Typed REST client**: bearer-authenticated `reqwest` client with lenient decoding
//! - **Aggregator**: pure joins and reductions over one snapshot
//! - **View-models**: entities enriched with counts, progress and resolved names
//! - **Dashboards**: one per role, built from the resources that role needs
//! - **Polling refresher**: periodic rebuilds with broadcast events and stale-on-error state
//! - **Export Support**: JSON and CSV
//!
//! # Quick Start
//!
//! ```no_run
//! use sitetrack_core::{fetch_snapshot, build_dashboard, ApiClient, Role, Session, SiteTrackError, Viewer};
//!
//! # async fn example() -> Result<(), SiteTrackError> {
//! let viewer = Viewer::new(Role::Admin);
//! let client = ApiClient::new("http://localhost:5000/api", Session::new("token", viewer.clone()))?;
//!
//! let kind = viewer.dashboard_kind()?;
//! let snapshot = fetch_snapshot(&client, kind.resources()).await?;
//! let dashboard = build_dashboard(&viewer, &snapshot)?;
//! println!("{}", serde_json::to_string_pretty(&dashboard)?);
//! # Ok(())
//! # }
//! ```
//!
//! # Crate Features
//!
//! - `export-csv`: CSV export through the `csv` crate
//! - `test-utils`: Enable test utilities (for testing only)

pub mod aggregator;
pub mod api;
pub mod config;
pub mod dashboard;
pub mod error;
pub mod export;
mod lenient;
pub mod models;
pub mod refresher;
pub mod roles;
pub mod snapshot;
pub mod view_models;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

pub use aggregator::{
    client_financials, count_by_status, dashboard_stats, financial_summary, inventory_stats,
    latest_progress, project_progress, project_task_counts, stats_for, task_breakdown,
    user_task_breakdown,
    ClientFinancials, DashboardStats, InventoryStats, TaskBreakdown,
};
pub use api::{ApiClient, Session};
pub use config::{ConfigLoader, ConfigOverlay, SiteTrackConfig};
pub use dashboard::{
    build_dashboard, build_dashboard_with, effective_financial_summary, AdminDashboard,
    ClientDashboard, Dashboard, DashboardOptions, InventoryDashboard, ProjectManagerDashboard,
    SupervisorDashboard, Viewer,
};
pub use error::{Result, SiteTrackError};
pub use export::{export, ExportEntity, ExportFormat};
pub use models::*;
pub use refresher::{
    PollingRefresher, RefreshEvent, RefreshEventKind, RefreshPhase, RefreshStatus,
    RefresherHandle,
};
pub use roles::{DashboardKind, Role};
pub use snapshot::{fetch_snapshot, EntitySource, Resource, Snapshot, SnapshotPart};
pub use view_models::{
    build_client_views, build_project_views, build_task_views, build_user_views, ClientView,
    ProjectView, TaskView, UserView,
};

/// Re-export commonly used types
pub use chrono::{DateTime, Utc};
