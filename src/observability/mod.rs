//! # Observability
//!
//! Logging bootstrap for the library and the `vault-config` binary.

pub mod logging;

pub use logging::log_config_info;

use serde::{Deserialize, Serialize};
use tracing_subscriber::EnvFilter;

use crate::errors::{Error, Result};

/// Logging settings. `RUST_LOG` takes precedence over `level`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingOptions {
    pub level: String,
    /// Emit JSON lines instead of human-readable output
    pub json: bool,
}

impl Default for LoggingOptions {
    fn default() -> Self {
        Self { level: "info".to_string(), json: false }
    }
}

/// Install the global `tracing` subscriber.
///
/// Returns `Ok(false)` if a subscriber was already installed, for example by a
/// test harness.
pub fn init_logging(options: &LoggingOptions) -> Result<bool> {
    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::try_new(&options.level).map_err(|e| {
            Error::configuration(format!("Invalid log level '{}': {}", options.level, e))
        })?,
    };

    let installed = if options.json {
        tracing::subscriber::set_global_default(
            tracing_subscriber::fmt().json().with_env_filter(filter).with_target(true).finish(),
        )
    } else {
        tracing::subscriber::set_global_default(
            tracing_subscriber::fmt().with_env_filter(filter).with_target(false).finish(),
        )
    };

    Ok(installed.is_ok())
}
