//! Polling refresher: keeps one viewer's dashboard current
//!
//! Each cycle fetches the resources the dashboard needs, rebuilds it and swaps
//! it in. A failed cycle records its error and keeps the previous dashboard.
//! Cycles are announced on a broadcast channel.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::{broadcast, watch, Notify, RwLock};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use crate::dashboard::{build_dashboard_with, Dashboard, DashboardOptions, Viewer};
use crate::error::{Result, SiteTrackError};
use crate::roles::DashboardKind;
use crate::snapshot::{fetch_snapshot, EntitySource};

const EVENT_CHANNEL_CAPACITY: usize = 64;

/// What the refresher is doing right now
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RefreshPhase {
    Idle,
    Fetching,
}

/// Point-in-time view of the refresher
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RefreshStatus {
    pub phase: RefreshPhase,
    #[serde(skip)]
    pub dashboard: Option<Arc<Dashboard>>,
    /// Message of the most recent failed cycle, cleared by the next success
    pub last_error: Option<String>,
    pub last_success: Option<DateTime<Utc>>,
    /// Cycles started, including failed and abandoned ones
    pub cycles: u64,
    pub failures: u64,
}

/// Lifecycle notification for one refresh cycle
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event_type", rename_all = "snake_case")]
pub enum RefreshEventKind {
    Started { cycle: u64 },
    Completed { cycle: u64, duration_ms: u64 },
    Failed { cycle: u64, message: String },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RefreshEvent {
    pub id: Uuid,
    pub timestamp: DateTime<Utc>,
    #[serde(flatten)]
    pub kind: RefreshEventKind,
}

impl RefreshEvent {
    /// Stamp `kind` with a fresh id and the current time
    #[must_use]
    pub fn new(kind: RefreshEventKind) -> Self {
        Self {
            id: Uuid::new_v4(),
            timestamp: Utc::now(),
            kind,
        }
    }
}

#[derive(Debug)]
struct RefreshState {
    phase: RefreshPhase,
    dashboard: Option<Arc<Dashboard>>,
    last_error: Option<String>,
    last_success: Option<DateTime<Utc>>,
    cycles: u64,
    failures: u64,
}

/// Re-fetches and rebuilds a dashboard on a fixed interval
pub struct PollingRefresher<S: EntitySource + ?Sized> {
    source: Arc<S>,
    viewer: Viewer,
    kind: DashboardKind,
    options: DashboardOptions,
    interval: Duration,
    state: RwLock<RefreshState>,
    events: broadcast::Sender<RefreshEvent>,
    trigger: Notify,
}

impl<S: EntitySource + ?Sized> PollingRefresher<S> {
    /// Create a refresher for `viewer`
    ///
    /// # Errors
    /// Returns `SiteTrackError::Validation` when the viewer's role has no
    /// dashboard, and `SiteTrackError::Configuration` for a zero interval
    pub fn new(source: Arc<S>, viewer: Viewer, interval: Duration) -> Result<Self> {
        let kind = viewer.dashboard_kind()?;
        if interval.is_zero() {
            return Err(SiteTrackError::configuration(
                "refresh interval must be greater than 0",
            ));
        }
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);

        Ok(Self {
            source,
            viewer,
            kind,
            options: DashboardOptions::default(),
            interval,
            state: RwLock::new(RefreshState {
                phase: RefreshPhase::Idle,
                dashboard: None,
                last_error: None,
                last_success: None,
                cycles: 0,
                failures: 0,
            }),
            events,
            trigger: Notify::new(),
        })
    }

    #[must_use]
    pub fn with_options(mut self, options: DashboardOptions) -> Self {
        self.options = options;
        self
    }

    #[must_use]
    pub fn kind(&self) -> DashboardKind {
        self.kind
    }

    #[must_use]
    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Subscribe to cycle events
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<RefreshEvent> {
        self.events.subscribe()
    }

    /// Ask the running loop for an immediate cycle
    ///
    /// Requests made while a cycle is in flight collapse into one follow-up cycle.
    pub fn request_refresh(&self) {
        self.trigger.notify_one();
    }

    pub async fn status(&self) -> RefreshStatus {
        let state = self.state.read().await;
        RefreshStatus {
            phase: state.phase,
            dashboard: state.dashboard.clone(),
            last_error: state.last_error.clone(),
            last_success: state.last_success,
            cycles: state.cycles,
            failures: state.failures,
        }
    }

    /// Most recent successfully built dashboard
    pub async fn dashboard(&self) -> Option<Arc<Dashboard>> {
        self.state.read().await.dashboard.clone()
    }

    /// Run one fetch-and-rebuild cycle
    ///
    /// # Errors
    /// Returns the fetch or build error; the previous dashboard is kept
    #[instrument(skip(self), fields(kind = ?self.kind))]
    pub async fn refresh_once(&self) -> Result<Arc<Dashboard>> {
        let cycle = {
            let mut state = self.state.write().await;
            state.phase = RefreshPhase::Fetching;
            state.cycles += 1;
            state.cycles
        };
        self.publish(RefreshEventKind::Started { cycle });
        let started = Instant::now();

        let result = fetch_snapshot(self.source.as_ref(), self.kind.resources())
            .await
            .and_then(|snapshot| build_dashboard_with(&self.viewer, &snapshot, self.options));

        let mut state = self.state.write().await;
        state.phase = RefreshPhase::Idle;
        match result {
            Ok(dashboard) => {
                let dashboard = Arc::new(dashboard);
                state.dashboard = Some(Arc::clone(&dashboard));
                state.last_error = None;
                state.last_success = Some(Utc::now());
                drop(state);

                let duration_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);
                info!(cycle, duration_ms, "Dashboard refreshed");
                self.publish(RefreshEventKind::Completed { cycle, duration_ms });
                Ok(dashboard)
            }
            Err(e) => {
                let message = e.to_string();
                state.last_error = Some(message.clone());
                state.failures += 1;
                drop(state);

                warn!(cycle, error = %message, "Refresh failed, keeping previous dashboard");
                self.publish(RefreshEventKind::Failed { cycle, message });
                Err(e)
            }
        }
    }

    fn publish(&self, kind: RefreshEventKind) {
        // No subscribers is fine.
        let _ = self.events.send(RefreshEvent::new(kind));
    }

    async fn run(&self, mut shutdown: watch::Receiver<bool>) {
        let mut ticker = tokio::time::interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = shutdown.changed() => break,
                _ = ticker.tick() => {}
                () = self.trigger.notified() => {
                    debug!("Manual refresh requested");
                    ticker.reset();
                }
            }

            tokio::select! {
                _ = shutdown.changed() => break,
                // Failures are already recorded in the state.
                _ = self.refresh_once() => {}
            }
        }

        // A cycle dropped mid-fetch leaves the phase at Fetching.
        self.state.write().await.phase = RefreshPhase::Idle;
        debug!("Refresher stopped");
    }
}

impl<S: EntitySource + ?Sized + 'static> PollingRefresher<S> {
    /// Start the polling loop; the first cycle runs immediately
    #[must_use]
    pub fn spawn(self: &Arc<Self>) -> RefresherHandle {
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let refresher = Arc::clone(self);
        let task = tokio::spawn(async move { refresher.run(shutdown_rx).await });
        info!(interval_secs = self.interval.as_secs(), kind = ?self.kind, "Refresher started");

        RefresherHandle {
            task,
            shutdown: shutdown_tx,
        }
    }
}

/// Handle to a running refresher loop
#[derive(Debug)]
pub struct RefresherHandle {
    task: JoinHandle<()>,
    shutdown: watch::Sender<bool>,
}

impl RefresherHandle {
    /// Stop the loop and wait for it to exit
    ///
    /// A fetch in flight is dropped and its result discarded.
    pub async fn stop(self) {
        let _ = self.shutdown.send(true);
        if let Err(e) = self.task.await {
            warn!(error = %e, "Refresher task ended abnormally");
        }
    }

    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }
}
