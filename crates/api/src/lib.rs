//! Fraud Decision API Server
//!
//! REST API over the decision workflow, plus the pieces the `fraud-shield`
//! binary needs to start it: configuration, logging and workflow assembly.

use axum::{
    routing::{get, post},
    Router,
};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use std::net::SocketAddr;
use std::sync::atomic::AtomicU64;
use std::sync::Arc;
use std::time::Instant;
use tower_governor::GovernorLayer;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::info;
use tracing_subscriber::EnvFilter;
use workflow::DecisionWorkflow;

pub mod config;
mod error;
pub mod rate_limit;
mod routes;
pub mod startup;

pub use config::{AppConfig, LogFormat, LoggingConfig};
pub use error::ApiError;

use rate_limit::{create_governor_config, DefaultGovernorConfig};

/// Application state shared across handlers
pub struct AppState {
    pub workflow: Arc<DecisionWorkflow>,
    /// Concurrent workers per batch request
    pub batch_workers: usize,
    pub max_batch_size: usize,
    /// Prometheus render handle, when a recorder is installed
    pub metrics: Option<PrometheusHandle>,
    pub version: String,
    pub start_time: Instant,
    /// Transactions decided since startup
    pub decisions: AtomicU64,
}

impl AppState {
    pub fn new(workflow: Arc<DecisionWorkflow>, config: &AppConfig) -> Self {
        Self {
            workflow,
            batch_workers: config.batch.workers,
            max_batch_size: config.server.max_batch_size,
            metrics: None,
            version: env!("CARGO_PKG_VERSION").to_string(),
            start_time: Instant::now(),
            decisions: AtomicU64::new(0),
        }
    }

    pub fn with_metrics(mut self, handle: PrometheusHandle) -> Self {
        self.metrics = Some(handle);
        self
    }
}

/// Create the application router, without rate limiting
pub fn create_router(state: Arc<AppState>) -> Router {
    build_router(state, None)
}

fn build_router(state: Arc<AppState>, governor: Option<Arc<DefaultGovernorConfig>>) -> Router {
    let mut scoring = Router::new()
        .route("/api/v1/transactions/score", post(routes::transactions::score_handler))
        .route("/api/v1/transactions/batch", post(routes::transactions::batch_handler));
    if let Some(config) = governor {
        scoring = scoring.layer(GovernorLayer { config });
    }

    Router::new()
        .route("/api/v1/health", get(routes::health::health_handler))
        .route("/api/v1/model", get(routes::model::model_handler))
        .route("/metrics", get(routes::prometheus::metrics_handler))
        .merge(scoring)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Initialize logging.
///
/// `RUST_LOG` takes precedence over the configured level.
pub fn init_logging(config: &LoggingConfig) -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.level))
        .map_err(|e| anyhow::anyhow!("Invalid log filter '{}': {}", config.level, e))?;

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true);
    let result = match config.format {
        LogFormat::Json => builder.json().try_init(),
        LogFormat::Pretty => builder.try_init(),
    };
    result.map_err(|e| anyhow::anyhow!("Failed to set tracing subscriber: {}", e))
}

/// Install the global Prometheus recorder
pub fn install_metrics() -> anyhow::Result<PrometheusHandle> {
    PrometheusBuilder::new()
        .install_recorder()
        .map_err(|e| anyhow::anyhow!("Failed to install metrics recorder: {}", e))
}

/// Run the server
pub async fn run_server(config: &AppConfig, workflow: Arc<DecisionWorkflow>) -> anyhow::Result<()> {
    let handle = install_metrics()?;
    let state = Arc::new(AppState::new(workflow, config).with_metrics(handle));
    let limits = &config.server.rate_limit;
    let governor = create_governor_config(limits)
        .ok_or_else(|| anyhow::anyhow!("Rate limit values must be non-zero: {:?}", limits))?;
    let app = build_router(state, Some(governor));

    info!("Starting API server on {}", config.server.addr);

    let listener = tokio::net::TcpListener::bind(&config.server.addr).await?;
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await?;

    Ok(())
}
