//! SiteTrack CLI library
//! Command definitions, configuration resolution and plain-text rendering

pub mod dashboard;
pub mod logging;

use clap::{Args, Parser, Subcommand};
use sitetrack_common::{
    format_currency, format_optional_date, truncate_string, DEFAULT_SERVE_PORT, NOT_AVAILABLE,
};
use sitetrack_core::{
    ClientView, ConfigLoader, ConfigOverlay, Dashboard, DashboardOptions, ExportEntity,
    ExportFormat, ProjectView, RefreshEvent, RefreshEventKind, Resource, Result, Role,
    SiteTrackConfig, SiteTrackError, TaskStatus, TaskView, UserView, Viewer,
};
use std::io::Write;
use std::path::PathBuf;

/// Resources needed to list tasks with resolved names
pub const TASK_LIST_RESOURCES: &[Resource] = &[Resource::Tasks, Resource::Projects, Resource::Users];

#[derive(Parser, Debug)]
#[command(name = "sitetrack")]
#[command(about = "SiteTrack construction dashboards from the command line")]
#[command(version)]
pub struct Cli {
    /// Base URL of the SiteTrack API (overrides config files and environment)
    #[arg(long)]
    pub api_url: Option<String>,

    /// Bearer token for the API
    #[arg(long)]
    pub token: Option<String>,

    /// Configuration file (YAML or JSON)
    #[arg(long, short)]
    pub config: Option<PathBuf>,

    /// Verbose output
    #[arg(long, short)]
    pub verbose: bool,

    /// Emit logs as JSON lines
    #[arg(long)]
    pub json_logs: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// Who is looking at the dashboard
#[derive(Args, Debug, Clone, PartialEq, Eq)]
pub struct ViewerArgs {
    /// Role of the viewer (admin, project-manager, site-supervisor, inventory-manager, client)
    #[arg(long, short, default_value = "admin")]
    pub role: Role,
    /// User id, required by the project manager and supervisor dashboards
    #[arg(long, short)]
    pub user: Option<String>,
    /// Email, used to find the client record of a client viewer
    #[arg(long)]
    pub email: Option<String>,
}

impl ViewerArgs {
    #[must_use]
    pub fn viewer(&self) -> Viewer {
        let mut viewer = Viewer::new(self.role);
        if let Some(id) = &self.user {
            viewer = viewer.with_user_id(id.clone());
        }
        if let Some(email) = &self.email {
            viewer = viewer.with_email(email.clone());
        }
        viewer
    }
}

#[derive(Subcommand, Debug, PartialEq, Eq)]
pub enum Commands {
    /// Build a dashboard once and print it
    Dashboard {
        #[command(flatten)]
        viewer: ViewerArgs,
        /// Print the dashboard as JSON
        #[arg(long)]
        json: bool,
    },
    /// Keep a dashboard current and print every refresh
    Watch {
        #[command(flatten)]
        viewer: ViewerArgs,
        /// Poll interval in seconds (defaults to the configured interval for the role)
        #[arg(long, short)]
        interval: Option<u64>,
    },
    /// List projects with progress and resolved names
    Projects {
        /// Limit number of results
        #[arg(long, short)]
        limit: Option<usize>,
    },
    /// List users with task counts
    Users {
        /// Limit number of results
        #[arg(long, short)]
        limit: Option<usize>,
    },
    /// List tasks
    Tasks {
        /// Only tasks of this project
        #[arg(long, short)]
        project: Option<String>,
        /// Limit number of results
        #[arg(long, short)]
        limit: Option<usize>,
    },
    /// List clients with revenue and pending payment
    Clients {
        /// Limit number of results
        #[arg(long, short)]
        limit: Option<usize>,
    },
    /// Change the status of a task
    TaskStatus {
        /// Task id
        id: String,
        /// New status (pending, in-progress, completed, cancelled)
        status: TaskStatus,
    },
    /// Activate or deactivate a user account
    UserStatus {
        /// User id
        id: String,
        /// Activate the account
        #[arg(long, conflicts_with = "inactive", required_unless_present = "inactive")]
        active: bool,
        /// Deactivate the account
        #[arg(long)]
        inactive: bool,
    },
    /// Delete a task
    DeleteTask {
        /// Task id
        id: String,
    },
    /// Export projects, users or clients
    Export {
        /// Export format (json, csv)
        #[arg(long, short, default_value = "json")]
        format: ExportFormat,
        /// Entity to export (projects, users, clients)
        #[arg(long, short, default_value = "projects")]
        entity: ExportEntity,
        /// Write to this file instead of stdout
        #[arg(long, short)]
        output: Option<PathBuf>,
    },
    /// Serve a live dashboard over HTTP
    Serve {
        /// Port to listen on
        #[arg(long, short, default_value_t = DEFAULT_SERVE_PORT)]
        port: u16,
        #[command(flatten)]
        viewer: ViewerArgs,
    },
}

/// Resolve configuration from files, the environment and command-line overrides
///
/// Command-line values win over the environment, which wins over files.
///
/// # Errors
/// Returns an error if an explicitly given file is missing or malformed, or
/// the merged configuration is invalid
pub fn resolve_config(cli: &Cli) -> Result<SiteTrackConfig> {
    let mut loader = ConfigLoader::new().with_validation(false);
    if let Some(path) = &cli.config {
        if !path.exists() {
            return Err(SiteTrackError::configuration(format!(
                "Configuration file not found: {}",
                path.display()
            )));
        }
        loader = loader.with_config_paths(vec![path.clone()]);
    }

    let mut config = loader.load()?;
    config.apply(&ConfigOverlay {
        api_base_url: cli.api_url.clone(),
        api_token: cli.token.clone(),
        ..ConfigOverlay::default()
    });
    config.validate()?;
    Ok(config)
}

/// Dashboard options derived from configuration
#[must_use]
pub fn dashboard_options(config: &SiteTrackConfig) -> DashboardOptions {
    DashboardOptions {
        low_stock_threshold: config.low_stock_threshold_override,
    }
}

/// Keep at most `limit` items
#[must_use]
pub fn limited<T>(items: Vec<T>, limit: Option<usize>) -> Vec<T> {
    match limit {
        Some(limit) => items.into_iter().take(limit).collect(),
        None => items,
    }
}

/// Print a dashboard as a plain-text summary
///
/// # Errors
/// Returns an error if writing fails
pub fn print_dashboard<W: Write>(dashboard: &Dashboard, writer: &mut W) -> Result<()> {
    match dashboard {
        Dashboard::Admin(admin) => {
            let stats = &admin.stats;
            writeln!(writer, "Admin dashboard")?;
            writeln!(
                writer,
                "  Users: {} ({} active)",
                stats.total_users, stats.active_users
            )?;
            writeln!(
                writer,
                "  Projects: {} ({} active, {} completed)",
                stats.total_projects, stats.active_projects, stats.completed_projects
            )?;
            writeln!(
                writer,
                "  Tasks: {} pending, {} in progress, {} completed",
                stats.pending_tasks, stats.in_progress_tasks, stats.completed_tasks
            )?;
            writeln!(writer, "  Clients: {}", stats.total_clients)?;
            writeln!(writer, "  Average progress: {}%", stats.average_progress)?;
            let summary = &admin.financial_summary;
            writeln!(
                writer,
                "  Income {} / Expense {} / Net {} ({:?})",
                format_currency(summary.total_income),
                format_currency(summary.total_expense),
                format_currency(summary.net_profit),
                admin.summary_source
            )?;
            writeln!(writer)?;
            print_projects(&admin.projects, writer)?;
        }
        Dashboard::ProjectManager(pm) => {
            writeln!(writer, "Project manager dashboard ({})", pm.manager_id)?;
            writeln!(
                writer,
                "  Projects: {}  Tasks: {}  Overdue: {}",
                pm.stats.total_projects, pm.stats.total_tasks, pm.overdue_tasks
            )?;
            writeln!(writer)?;
            print_projects(&pm.projects, writer)?;
            print_tasks(&pm.tasks, writer)?;
        }
        Dashboard::SiteSupervisor(sup) => {
            let b = &sup.breakdown;
            writeln!(writer, "Site supervisor dashboard ({})", sup.supervisor_id)?;
            writeln!(
                writer,
                "  Assigned: {}  Completed: {}  Pending: {}",
                b.assigned, b.completed, b.pending
            )?;
            writeln!(writer)?;
            print_tasks(&sup.assigned_tasks, writer)?;
            print_projects(&sup.active_projects, writer)?;
        }
        Dashboard::Inventory(inv) => {
            writeln!(writer, "Inventory dashboard")?;
            writeln!(
                writer,
                "  Materials: {} ({} low on stock)  Stock value: {}",
                inv.stats.total_materials,
                inv.stats.low_stock_materials,
                format_currency(inv.stats.total_stock_value)
            )?;
            writeln!(writer, "  Equipment: {}", inv.stats.total_equipment)?;
            for (status, count) in &inv.stats.equipment_by_status {
                writeln!(writer, "    {status:?}: {count}")?;
            }
            if !inv.low_stock.is_empty() {
                writeln!(writer, "  Low stock:")?;
                for material in &inv.low_stock {
                    writeln!(
                        writer,
                        "    • {} {} {} (reorder at {})",
                        material.name, material.quantity, material.unit, material.min_stock_level
                    )?;
                }
            }
        }
        Dashboard::Client(client) => {
            writeln!(writer, "Client dashboard: {}", client.client.client.name)?;
            writeln!(
                writer,
                "  Revenue: {}  Pending payment: {}",
                format_currency(client.financials.revenue),
                format_currency(client.financials.pending_payment)
            )?;
            writeln!(writer)?;
            print_projects(&client.projects, writer)?;
        }
    }
    Ok(())
}

/// Print enriched projects to the given writer
///
/// # Errors
/// Returns an error if writing fails
pub fn print_projects<W: Write>(projects: &[ProjectView], writer: &mut W) -> Result<()> {
    if projects.is_empty() {
        writeln!(writer, "No projects found")?;
        return Ok(());
    }

    writeln!(writer, "Found {} projects:", projects.len())?;
    for view in projects {
        let project = &view.project;
        writeln!(
            writer,
            "  • {} ({}) {}%",
            project.name,
            project.status.label(),
            view.calculated_progress
        )?;
        writeln!(
            writer,
            "    Client: {}  Manager: {}",
            view.client_name, view.manager_name
        )?;
        writeln!(
            writer,
            "    Tasks: {}/{} completed  Budget: {}",
            view.completed_tasks,
            view.total_tasks,
            format_currency(project.budget)
        )?;
        if let Some(report) = &view.latest_progress {
            writeln!(
                writer,
                "    Last report: {} ({}%)",
                format_optional_date(report.date.as_ref()),
                report.percent_complete
            )?;
        }
        writeln!(writer)?;
    }
    Ok(())
}

/// Print users with their task counts
///
/// # Errors
/// Returns an error if writing fails
pub fn print_users<W: Write>(users: &[UserView], writer: &mut W) -> Result<()> {
    if users.is_empty() {
        writeln!(writer, "No users found")?;
        return Ok(());
    }

    writeln!(writer, "Found {} users:", users.len())?;
    for view in users {
        let user = &view.user;
        let state = if user.is_active { "" } else { " [inactive]" };
        writeln!(writer, "  • {} <{}> {}{state}", user.name, user.email, user.role)?;
        writeln!(
            writer,
            "    Tasks: {} assigned, {} completed, {} pending",
            view.assigned_tasks, view.completed_tasks, view.pending_tasks
        )?;
    }
    Ok(())
}

/// Print tasks with project and assignee names
///
/// # Errors
/// Returns an error if writing fails
pub fn print_tasks<W: Write>(tasks: &[TaskView], writer: &mut W) -> Result<()> {
    if tasks.is_empty() {
        writeln!(writer, "No tasks found")?;
        return Ok(());
    }

    writeln!(writer, "Found {} tasks:", tasks.len())?;
    for view in tasks {
        let task = &view.task;
        writeln!(
            writer,
            "  • {} ({}, {:?})",
            task.title,
            task.status.label(),
            task.priority
        )?;
        writeln!(
            writer,
            "    Project: {}  Assignee: {}",
            view.project_name, view.assignee_name
        )?;
        if task.due_date.is_some() {
            writeln!(
                writer,
                "    Due: {}",
                format_optional_date(task.due_date.as_ref())
            )?;
        }
        if !task.description.is_empty() {
            writeln!(writer, "    {}", truncate_string(&task.description, 72))?;
        }
    }
    Ok(())
}

/// Print clients with revenue and pending payment
///
/// # Errors
/// Returns an error if writing fails
pub fn print_clients<W: Write>(clients: &[ClientView], writer: &mut W) -> Result<()> {
    if clients.is_empty() {
        writeln!(writer, "No clients found")?;
        return Ok(());
    }

    writeln!(writer, "Found {} clients:", clients.len())?;
    for view in clients {
        let client = &view.client;
        let company = if client.company.is_empty() {
            NOT_AVAILABLE
        } else {
            client.company.as_str()
        };
        writeln!(writer, "  • {} ({company})", client.name)?;
        writeln!(
            writer,
            "    Projects: {}  Revenue: {}  Pending: {}",
            view.project_count,
            format_currency(view.revenue),
            format_currency(view.pending_payment)
        )?;
    }
    Ok(())
}

/// Print one refresher lifecycle event as a single line
///
/// # Errors
/// Returns an error if writing fails
pub fn print_event<W: Write>(event: &RefreshEvent, writer: &mut W) -> Result<()> {
    let at = event.timestamp.format("%H:%M:%S");
    match &event.kind {
        RefreshEventKind::Started { cycle } => writeln!(writer, "[{at}] refresh #{cycle} started")?,
        RefreshEventKind::Completed { cycle, duration_ms } => {
            writeln!(writer, "[{at}] refresh #{cycle} completed in {duration_ms}ms")?;
        }
        RefreshEventKind::Failed { cycle, message } => {
            writeln!(writer, "[{at}] refresh #{cycle} failed: {message}")?;
        }
    }
    Ok(())
}
