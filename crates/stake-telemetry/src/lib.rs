//! # Stake Telemetry
//!
//! Logging and metrics for the Stake-Sync engine.
//!
//! ## Components
//!
//! - **Logs**: `tracing` + `tracing-subscriber` (pretty or JSON lines)
//! - **Metrics**: Prometheus counters and histograms, scraped by the embedding host
//!
//! ## Usage
//!
//! ```rust,ignore
//! use stake_telemetry::{init_telemetry, TelemetryConfig};
//!
//! let config = TelemetryConfig::from_env();
//! let _guard = init_telemetry(config)?;
//! ```
//!
//! ## Environment Variables
//!
//! | Variable | Default | Description |
//! |----------|---------|-------------|
//! | `SS_SERVICE_NAME` | `stake-sync` | Service name in logs |
//! | `SS_LOG_LEVEL` | `info` | Log level filter (falls back to `RUST_LOG`) |
//! | `SS_JSON_LOGS` | `false` | JSON formatted logs |
//! | `SS_CONSOLE_OUTPUT` | `true` | Console output |
//! | `SS_NETWORK` | `devnet` | Network label |

#![warn(missing_docs)]

mod config;
mod logging;
mod metrics;

pub use config::TelemetryConfig;
pub use logging::{init_logging, init_test_logging};
pub use metrics::{
    encode_metrics, register_metrics, HistogramTimer, CONFIRMATION_DURATION, ENGINE_ERRORS,
    REFRESHES, REFRESH_DURATION, REGISTRY, SESSION_EVENTS, SNAPSHOT_VERSION, SUBMISSIONS,
};

use thiserror::Error;

/// Telemetry initialization errors
#[derive(Error, Debug)]
pub enum TelemetryError {
    /// The global subscriber could not be installed.
    #[error("Failed to initialize logging: {0}")]
    LoggingInit(String),

    /// A metric could not be registered or encoded.
    #[error("Failed to initialize Prometheus metrics: {0}")]
    MetricsInit(String),
}

/// Initialize logging and metrics.
///
/// Returns a guard that should be held for the lifetime of the host.
pub fn init_telemetry(config: TelemetryConfig) -> Result<TelemetryGuard, TelemetryError> {
    // Initialize metrics first (cannot fail on repeat)
    register_metrics()?;

    init_logging(&config)?;

    Ok(TelemetryGuard {
        service_name: config.service_name,
    })
}

/// Guard that keeps telemetry active.
pub struct TelemetryGuard {
    service_name: String,
}

impl Drop for TelemetryGuard {
    fn drop(&mut self) {
        tracing::info!(service = %self.service_name, "Shutting down telemetry");
    }
}
