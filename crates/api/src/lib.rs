//! Pump Fault Prediction API Server
//!
//! Accepts CSV uploads of pump sensor readings, labels every row with a
//! fault type, and serves summaries, trends, and annotated downloads.

use anyhow::Context;
use axum::{
    extract::{DefaultBodyLimit, State},
    http::header,
    response::IntoResponse,
    routing::{delete, get, post},
    Json, Router,
};
use fallback::RuleOverrideEngine;
use inference_engine::{ArtifactBundle, BundleDescriptor, FaultClassifier, InferenceEngine};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use pipeline::{PredictionPipeline, PredictionSummary};
use serde::Serialize;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;
use storage::ResultStore;
use tower_governor::GovernorLayer;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::info;
use tracing_subscriber::EnvFilter;

pub mod config;
pub mod error;
pub mod rate_limit;
mod routes;

pub use config::ServiceConfig;
pub use error::ApiError;

use rate_limit::{create_governor_config, UploadGovernorConfig};

/// Banner served at `/`
pub const BANNER: &str = "Predictive Maintenance API Running";

/// Application state shared across handlers
pub struct AppState {
    pub pipeline: Arc<PredictionPipeline>,
    /// Production results by handle
    pub results: ResultStore<PredictionSummary>,
    /// Prometheus render handle, when a recorder is installed
    pub metrics: Option<PrometheusHandle>,
    pub max_upload_bytes: usize,
    pub version: String,
    pub start_time: Instant,
}

pub type SharedState = Arc<AppState>;

impl AppState {
    pub fn new(pipeline: PredictionPipeline, results: ResultStore<PredictionSummary>, max_upload_bytes: usize) -> Self {
        Self {
            pipeline: Arc::new(pipeline),
            results,
            metrics: None,
            max_upload_bytes,
            version: env!("CARGO_PKG_VERSION").to_string(),
            start_time: Instant::now(),
        }
    }

    pub fn with_metrics(mut self, handle: PrometheusHandle) -> Self {
        self.metrics = Some(handle);
        self
    }
}

/// Health response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub uptime_seconds: u64,
    pub override_policy: fallback::OverridePolicy,
    pub bundles: BundleStatus,
    pub stored_results: usize,
}

#[derive(Debug, Serialize)]
pub struct BundleStatus {
    pub production: BundleDescriptor,
    pub simulator: BundleDescriptor,
}

/// Create the application router.
///
/// With `rate_limit` set, the upload routes need peer addresses from
/// `into_make_service_with_connect_info::<SocketAddr>()`.
pub fn create_router(state: SharedState, rate_limit: Option<Arc<UploadGovernorConfig>>) -> Router {
    let mut uploads = Router::new()
        .route("/api/v1/predict", post(routes::upload::predict))
        .route("/api/v1/simulate", post(routes::upload::simulate))
        .layer(DefaultBodyLimit::max(state.max_upload_bytes));
    if let Some(config) = rate_limit {
        uploads = uploads.layer(GovernorLayer { config });
    }

    Router::new()
        .route("/", get(banner_handler))
        .route("/api/v1/health", get(health_handler))
        .route("/metrics", get(metrics_handler))
        .route("/api/v1/results/:id/trend", get(routes::results::trend))
        .route("/api/v1/results/:id", delete(routes::results::reset))
        .route("/api/v1/download/:file_name", get(routes::download::download))
        .merge(uploads)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

async fn banner_handler() -> &'static str {
    BANNER
}

/// Health check handler
async fn health_handler(State(state): State<SharedState>) -> impl IntoResponse {
    let pipeline = &state.pipeline;
    Json(HealthResponse {
        status: "healthy".to_string(),
        version: state.version.clone(),
        uptime_seconds: state.start_time.elapsed().as_secs(),
        override_policy: pipeline.overrides().policy(),
        bundles: BundleStatus {
            production: pipeline.production().describe(),
            simulator: pipeline.simulator().describe(),
        },
        stored_results: state.results.len(),
    })
}

async fn metrics_handler(State(state): State<SharedState>) -> impl IntoResponse {
    let body = state.metrics.as_ref().map(PrometheusHandle::render).unwrap_or_default();
    ([(header::CONTENT_TYPE, "text/plain; version=0.0.4")], body)
}

/// Initialize logging; `RUST_LOG` overrides the default `info` filter
pub fn init_logging(json: bool) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt().with_env_filter(filter).with_target(true);
    if json {
        builder.json().try_init()
    } else {
        builder.try_init()
    }
}

/// Load both bundles and build the pipeline
pub fn build_pipeline(config: &ServiceConfig) -> anyhow::Result<PredictionPipeline> {
    let load = |name: &str, location: &crate::config::BundleLocation| -> anyhow::Result<Arc<dyn FaultClassifier>> {
        let paths = location.paths(name);
        let bundle = ArtifactBundle::load(&paths)
            .with_context(|| format!("loading {name} bundle from {}", paths.dir.display()))?;
        Ok(Arc::new(InferenceEngine::new(Arc::new(bundle))))
    };

    let production = load("production", &config.production_bundle)?;
    let simulator = load("simulator", &config.simulator_bundle)?;
    Ok(PredictionPipeline::new(
        production,
        simulator,
        RuleOverrideEngine::with_policy(config.override_policy),
    ))
}

/// Run the server until it fails
pub async fn run_server(config: ServiceConfig) -> anyhow::Result<()> {
    let pipeline = build_pipeline(&config)?;
    let results = ResultStore::open(&config.output_dir, config.max_results)
        .with_context(|| format!("opening output directory {}", config.output_dir.display()))?;
    let recorder = PrometheusBuilder::new()
        .install_recorder()
        .context("installing Prometheus recorder")?;

    let state = Arc::new(AppState::new(pipeline, results, config.max_upload_bytes).with_metrics(recorder));
    let app = create_router(state, create_governor_config(&config.rate_limit));

    info!("Starting API server on {}", config.bind_addr);
    let listener = tokio::net::TcpListener::bind(&config.bind_addr)
        .await
        .with_context(|| format!("binding {}", config.bind_addr))?;
    axum::serve(listener, app.into_make_service_with_connect_info::<SocketAddr>()).await?;

    Ok(())
}
