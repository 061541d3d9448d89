//! EcoMarket purchase pipeline — service entry point.
//!
//! Loads configuration from the environment, initializes structured
//! logging, and starts the `axum` gateway.

use ecomarket_pipeline::config::AppConfig;
use ecomarket_pipeline::gateway;
use ecomarket_pipeline::logging;

#[tokio::main]
async fn main() {
    let config = AppConfig::from_env();
    let _guard = logging::init_logging(&config);

    tracing::info!(git_hash = env!("GIT_HASH"), "starting ecomarket purchase pipeline");

    gateway::run_server(config).await;
}
