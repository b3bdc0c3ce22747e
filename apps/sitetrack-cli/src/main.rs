//! SiteTrack CLI - construction dashboards from the command line

use anyhow::Context;
use clap::Parser;
use sitetrack_cli::dashboard::DashboardServer;
use sitetrack_cli::logging::init_tracing;
use sitetrack_cli::{
    dashboard_options, limited, print_clients, print_dashboard, print_event, print_projects,
    print_tasks, print_users, resolve_config, Cli, Commands, ViewerArgs,
    TASK_LIST_RESOURCES,
};
use sitetrack_core::{
    build_client_views, build_dashboard_with, build_project_views, build_task_views,
    build_user_views, export, fetch_snapshot, ApiClient, EntitySource, ExportEntity,
    PollingRefresher, RefreshEventKind, Resource, Session, SiteTrackConfig,
};
use std::io::Write;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast::error::RecvError;
use tracing::{info, warn};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose, cli.json_logs)?;

    let config = resolve_config(&cli)?;
    let mut stdout = std::io::stdout();

    match cli.command {
        Commands::Dashboard { viewer, json } => {
            let client = client_for(&config, &viewer)?;
            let viewer = viewer.viewer();
            let kind = viewer.dashboard_kind()?;
            let snapshot = fetch_snapshot(&client, kind.resources()).await?;
            let dashboard = build_dashboard_with(&viewer, &snapshot, dashboard_options(&config))?;
            if json {
                serde_json::to_writer_pretty(&mut stdout, &dashboard)?;
                writeln!(stdout)?;
            } else {
                print_dashboard(&dashboard, &mut stdout)?;
            }
        }
        Commands::Watch { viewer, interval } => {
            let client = client_for(&config, &viewer)?;
            let viewer = viewer.viewer();
            let kind = viewer.dashboard_kind()?;
            let interval = interval
                .map_or_else(|| config.poll_interval_for(kind), Duration::from_secs);
            let refresher = Arc::new(
                PollingRefresher::new(Arc::new(client), viewer, interval)?
                    .with_options(dashboard_options(&config)),
            );
            watch(&refresher, &mut stdout).await?;
        }
        Commands::Projects { limit } => {
            let client = api_client(&config)?;
            let snapshot = fetch_snapshot(&client, ExportEntity::Projects.resources()).await?;
            let views = build_project_views(&snapshot.projects, &snapshot);
            print_projects(&limited(views, limit), &mut stdout)?;
        }
        Commands::Users { limit } => {
            let client = api_client(&config)?;
            let snapshot = fetch_snapshot(&client, ExportEntity::Users.resources()).await?;
            let views = build_user_views(&snapshot.users, &snapshot);
            print_users(&limited(views, limit), &mut stdout)?;
        }
        Commands::Tasks { project, limit } => {
            let client = api_client(&config)?;
            let snapshot = fetch_snapshot(&client, TASK_LIST_RESOURCES).await?;
            let tasks: Vec<_> = match &project {
                Some(id) => snapshot
                    .tasks
                    .iter()
                    .filter(|t| t.belongs_to(id))
                    .cloned()
                    .collect(),
                None => snapshot.tasks.clone(),
            };
            let views = build_task_views(&tasks, &snapshot);
            print_tasks(&limited(views, limit), &mut stdout)?;
        }
        Commands::Clients { limit } => {
            let client = api_client(&config)?;
            let snapshot = fetch_snapshot(&client, ExportEntity::Clients.resources()).await?;
            let views = build_client_views(&snapshot.clients, &snapshot);
            print_clients(&limited(views, limit), &mut stdout)?;
        }
        Commands::TaskStatus { id, status } => {
            let task = api_client(&config)?
                .set_task_status(&id, status)
                .await?;
            writeln!(stdout, "Task {} is now {}", task.id, task.status.label())?;
        }
        Commands::UserStatus { id, active, .. } => {
            let user = api_client(&config)?
                .set_user_status(&id, active)
                .await?;
            let label = if user.is_active { "active" } else { "inactive" };
            writeln!(stdout, "User {} is now {label}", user.id)?;
        }
        Commands::DeleteTask { id } => {
            api_client(&config)?
                .delete(Resource::Tasks, &id)
                .await?;
            writeln!(stdout, "Deleted task {id}")?;
        }
        Commands::Export {
            format,
            entity,
            output,
        } => {
            let client = api_client(&config)?;
            let snapshot = fetch_snapshot(&client, entity.resources()).await?;
            let rendered = export(&snapshot, entity, format)?;
            match output {
                Some(path) => {
                    std::fs::write(&path, rendered)
                        .with_context(|| format!("Failed to write {}", path.display()))?;
                    info!("Exported {entity} to {}", path.display());
                }
                None => writeln!(stdout, "{rendered}")?,
            }
        }
        Commands::Serve { port, viewer } => {
            let client = client_for(&config, &viewer)?;
            let viewer = viewer.viewer();
            let interval = config.poll_interval_for(viewer.dashboard_kind()?);
            let source: Arc<dyn EntitySource> = Arc::new(client);
            let refresher = Arc::new(
                PollingRefresher::new(source, viewer, interval)?
                    .with_options(dashboard_options(&config)),
            );
            DashboardServer::new(port, refresher)
                .start(async {
                    let _ = tokio::signal::ctrl_c().await;
                })
                .await?;
        }
    }

    Ok(())
}

/// API client acting as the given viewer
fn client_for(config: &SiteTrackConfig, viewer: &ViewerArgs) -> anyhow::Result<ApiClient> {
    let session = Session {
        token: None,
        viewer: viewer.viewer(),
    };
    Ok(ApiClient::from_config(config, session)?)
}

/// API client authenticated by the configured token, with no viewer
fn api_client(config: &SiteTrackConfig) -> anyhow::Result<ApiClient> {
    Ok(ApiClient::from_config(config, Session::anonymous())?)
}

/// Print every refresh until Ctrl-C
async fn watch<W: Write>(
    refresher: &Arc<PollingRefresher<ApiClient>>,
    writer: &mut W,
) -> anyhow::Result<()> {
    let mut events = refresher.subscribe();
    let handle = refresher.spawn();
    let shutdown = tokio::signal::ctrl_c();
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            _ = &mut shutdown => break,
            event = events.recv() => match event {
                Ok(event) => {
                    print_event(&event, writer)?;
                    if matches!(event.kind, RefreshEventKind::Completed { .. }) {
                        if let Some(dashboard) = refresher.dashboard().await {
                            print_dashboard(&dashboard, writer)?;
                        }
                    }
                    writer.flush()?;
                }
                Err(RecvError::Lagged(skipped)) => warn!("Skipped {skipped} refresh events"),
                Err(RecvError::Closed) => break,
            },
        }
    }

    handle.stop().await;
    Ok(())
}
