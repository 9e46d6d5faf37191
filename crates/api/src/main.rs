//! Pump Fault Prediction Service - Main Entry Point

use anyhow::Context;
use api::{init_logging, run_server, ServiceConfig};
use tracing::info;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = ServiceConfig::load().context("loading configuration")?;
    init_logging(config.log_json).map_err(|e| anyhow::anyhow!("initializing logging: {e}"))?;

    info!("=== Pump Fault Prediction Service v{} ===", env!("CARGO_PKG_VERSION"));
    info!(
        "Bundles: production={} simulator={}{}",
        config.production_bundle.dir.display(),
        config.simulator_bundle.dir.display(),
        config.simulator_bundle.prefix
    );

    run_server(config).await
}
