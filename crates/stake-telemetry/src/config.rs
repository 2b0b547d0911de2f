//! Telemetry configuration from environment variables.

use std::env;

/// Configuration for logging and metrics.
#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    /// Service name attached to every log line.
    pub service_name: String,

    /// Log level filter (trace, debug, info, warn, error) or a full
    /// `EnvFilter` directive such as `ss_04_staking_sync=debug,info`.
    pub log_level: String,

    /// Whether to enable console output.
    pub console_output: bool,

    /// Whether to emit JSON formatted logs.
    pub json_logs: bool,

    /// Network label (mainnet, polygon, arbitrum, devnet).
    pub network: String,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            service_name: "stake-sync".to_string(),
            log_level: "info".to_string(),
            console_output: true,
            json_logs: false,
            network: "devnet".to_string(),
        }
    }
}

impl TelemetryConfig {
    /// Create configuration from environment variables.
    ///
    /// # Environment Variables
    ///
    /// - `SS_SERVICE_NAME`: Service name (default: stake-sync)
    /// - `SS_LOG_LEVEL` or `RUST_LOG`: Log level (default: info)
    /// - `SS_CONSOLE_OUTPUT`: Enable console output (default: true)
    /// - `SS_JSON_LOGS`: Enable JSON logs (default: false)
    /// - `SS_NETWORK`: Network label (default: devnet)
    pub fn from_env() -> Self {
        Self {
            service_name: env::var("SS_SERVICE_NAME").unwrap_or_else(|_| "stake-sync".to_string()),

            log_level: env::var("SS_LOG_LEVEL")
                .or_else(|_| env::var("RUST_LOG"))
                .unwrap_or_else(|_| "info".to_string()),

            console_output: env::var("SS_CONSOLE_OUTPUT")
                .map(|v| v.to_lowercase() != "false" && v != "0")
                .unwrap_or(true),

            json_logs: env::var("SS_JSON_LOGS")
                .map(|v| v.to_lowercase() == "true" || v == "1")
                .unwrap_or(false),

            network: env::var("SS_NETWORK").unwrap_or_else(|_| "devnet".to_string()),
        }
    }

    /// Configuration used by test harnesses: quiet unless `RUST_LOG` says otherwise.
    pub fn for_testing() -> Self {
        Self {
            log_level: env::var("RUST_LOG").unwrap_or_else(|_| "warn".to_string()),
            ..Self::default()
        }
    }
}
