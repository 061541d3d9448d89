//! Service configuration
//!
//! A typed configuration struct built from environment variables with sane
//! defaults, following the reference gateway's settings-struct convention
//! rather than a bespoke parser. Nothing here is hot-reloaded; the process
//! reads its environment once at startup.

use std::env;

pub use crate::core_types::ProductId;

/// Complete service configuration.
///
/// Loaded once at startup via [`AppConfig::from_env`]; every field has a
/// working default so the service runs unconfigured out of the box.
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Address the HTTP server binds to, e.g. "0.0.0.0:8080"
    pub bind_addr: String,
    /// Path to the single-file JSON inventory document (§4.2, §6)
    pub inventory_path: String,
    /// Directory tracing-appender writes log files into
    pub log_dir: String,
    /// Base file name for the rolling log file
    pub log_file: String,
    /// "hourly" | "daily" | anything else => never-rotating
    pub rotation: String,
    /// Master switch: when false, the crate's own target is silenced
    pub enable_tracing: bool,
    /// EnvFilter directive used when `RUST_LOG` is not set
    pub log_level: String,
    /// true => structured JSON file logs, false => human-readable text
    pub use_json: bool,
    /// Destination name used by the durable broker backend (§6)
    pub broker_destination: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            bind_addr: "0.0.0.0:8080".to_string(),
            inventory_path: "data/productos.json".to_string(),
            log_dir: "logs".to_string(),
            log_file: "ecomarket-pipeline.log".to_string(),
            rotation: "daily".to_string(),
            enable_tracing: true,
            log_level: "info".to_string(),
            use_json: false,
            broker_destination: "compras_ecomarket".to_string(),
        }
    }
}

impl AppConfig {
    /// Build configuration from environment variables, falling back to
    /// [`Default`] for anything unset. Never panics: a malformed boolean or
    /// missing variable just keeps the default.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            bind_addr: env::var("ECOMARKET_BIND_ADDR").unwrap_or(defaults.bind_addr),
            inventory_path: env::var("ECOMARKET_INVENTORY_PATH")
                .unwrap_or(defaults.inventory_path),
            log_dir: env::var("ECOMARKET_LOG_DIR").unwrap_or(defaults.log_dir),
            log_file: env::var("ECOMARKET_LOG_FILE").unwrap_or(defaults.log_file),
            rotation: env::var("ECOMARKET_LOG_ROTATION").unwrap_or(defaults.rotation),
            enable_tracing: env::var("ECOMARKET_ENABLE_TRACING")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.enable_tracing),
            log_level: env::var("RUST_LOG_LEVEL").unwrap_or(defaults.log_level),
            use_json: env::var("ECOMARKET_LOG_JSON")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.use_json),
            broker_destination: env::var("ECOMARKET_BROKER_DESTINATION")
                .unwrap_or(defaults.broker_destination),
        }
    }
}
