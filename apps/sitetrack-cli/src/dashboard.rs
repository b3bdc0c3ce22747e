//! Live dashboard over HTTP
//!
//! Serves the refresher's current dashboard as JSON. The refresher runs in the
//! background for as long as the server does.

use axum::{
    extract::State,
    http::StatusCode,
    response::Json,
    routing::{get, post},
    Router,
};
use serde_json::Value;
use sitetrack_core::{EntitySource, PollingRefresher, RefreshStatus};
use std::future::Future;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::cors::CorsLayer;
use tracing::{info, instrument};

/// Shared handler state
#[derive(Clone)]
pub struct DashboardState {
    pub refresher: Arc<PollingRefresher<dyn EntitySource>>,
}

/// Current dashboard, or 503 until the first refresh succeeds
async fn get_dashboard(State(state): State<DashboardState>) -> Result<Json<Value>, StatusCode> {
    let dashboard = state
        .refresher
        .dashboard()
        .await
        .ok_or(StatusCode::SERVICE_UNAVAILABLE)?;
    serde_json::to_value(dashboard.as_ref())
        .map(Json)
        .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)
}

async fn get_health(State(state): State<DashboardState>) -> Json<RefreshStatus> {
    Json(state.refresher.status().await)
}

async fn trigger_refresh(State(state): State<DashboardState>) -> StatusCode {
    state.refresher.request_refresh();
    StatusCode::ACCEPTED
}

/// Routes served by [`DashboardServer`]
pub fn router(state: DashboardState) -> Router {
    Router::new()
        .route("/", get(get_dashboard))
        .route("/health", get(get_health))
        .route("/refresh", post(trigger_refresh))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Dashboard server
pub struct DashboardServer {
    port: u16,
    refresher: Arc<PollingRefresher<dyn EntitySource>>,
}

impl DashboardServer {
    #[must_use]
    pub fn new(port: u16, refresher: Arc<PollingRefresher<dyn EntitySource>>) -> Self {
        Self { port, refresher }
    }

    #[must_use]
    pub fn port(&self) -> u16 {
        self.port
    }

    /// Start polling and serve until `shutdown` resolves
    ///
    /// # Errors
    /// Returns the I/O error if the port cannot be bound or serving fails
    #[instrument(skip(self, shutdown), fields(port = self.port))]
    pub async fn start<F>(self, shutdown: F) -> std::io::Result<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let listener = TcpListener::bind(format!("0.0.0.0:{}", self.port)).await?;
        info!("Dashboard server running on port {}", self.port);

        let handle = self.refresher.spawn();
        let app = router(DashboardState {
            refresher: Arc::clone(&self.refresher),
        });

        let served = axum::serve(listener, app)
            .with_graceful_shutdown(shutdown)
            .await;
        handle.stop().await;
        served?;
        Ok(())
    }
}
