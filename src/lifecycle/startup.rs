//! Startup orchestration.
//!
//! # Responsibilities
//! - Load and validate configuration
//! - Initialize logging and metrics
//! - Bind the listener
//!
//! # Design Decisions
//! - Fail fast: any startup error is fatal
//! - Subsystems initialize in order, not concurrently
//! - The listener is bound last (traffic only when ready)

use std::io;
use std::path::Path;
use tokio::net::TcpListener;

use crate::config::{load_config, AppConfig, ConfigError, ServerConfig};
use crate::observability::{init_logging, init_metrics};

/// Load the configuration file, or the defaults when no path is given.
pub fn load_or_default(path: Option<&Path>) -> Result<AppConfig, ConfigError> {
    match path {
        Some(path) => load_config(path),
        None => Ok(AppConfig::default()),
    }
}

/// Install logging and, when enabled, the metrics exporter.
///
/// Must run inside a Tokio runtime.
pub fn init_observability(config: &AppConfig) {
    if let Err(e) = init_logging(&config.observability) {
        tracing::warn!(error = %e, "Logging already initialized");
    }

    if !config.observability.metrics_enabled {
        return;
    }
    match config.observability.metrics_address.parse() {
        Ok(addr) => {
            if let Err(e) = init_metrics(addr) {
                tracing::error!(error = %e, "Failed to install metrics exporter");
            }
        }
        Err(e) => tracing::error!(
            metrics_address = %config.observability.metrics_address,
            error = %e,
            "Failed to parse metrics address"
        ),
    }
}

/// Bind the HTTP listener on the configured host and port.
pub async fn bind_listener(config: &ServerConfig) -> io::Result<TcpListener> {
    let listener = TcpListener::bind(config.bind_address()).await?;
    tracing::info!(
        address = %listener.local_addr()?,
        protocol = %config.protocol,
        "Listening for connections"
    );
    Ok(listener)
}
