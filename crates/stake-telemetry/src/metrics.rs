//! Prometheus metrics for the Stake-Sync engine.
//!
//! All metrics follow the naming convention: `ss_<component>_<metric>_<unit>`
//!
//! ## Metric Types
//!
//! - **Counter**: Monotonically increasing value (e.g., submissions_total)
//! - **Gauge**: Value that can go up or down (e.g., snapshot_version)
//! - **Histogram**: Distribution of values (e.g., confirmation_duration_seconds)

use lazy_static::lazy_static;
use prometheus::{
    exponential_buckets, CounterVec, Encoder, Gauge, Histogram, HistogramOpts, HistogramVec,
    Opts, Registry, TextEncoder,
};

use crate::TelemetryError;

lazy_static! {
    /// Global metrics registry
    pub static ref REGISTRY: Registry = Registry::new();

    // =========================================================================
    // SESSION METRICS
    // =========================================================================

    /// Wallet session transitions
    pub static ref SESSION_EVENTS: CounterVec = CounterVec::new(
        Opts::new("ss_session_events_total", "Wallet session transitions"),
        &["event"]  // event: connected/reused/failed/disconnected
    ).expect("metric creation failed");

    // =========================================================================
    // TRANSACTION METRICS
    // =========================================================================

    /// Mutating operations by kind and outcome
    pub static ref SUBMISSIONS: CounterVec = CounterVec::new(
        Opts::new("ss_contract_submissions_total", "Stake/unstake submissions"),
        &["kind", "outcome"]  // outcome: confirmed/failed/rejected/invalid
    ).expect("metric creation failed");

    /// Time from submission to confirmation
    pub static ref CONFIRMATION_DURATION: HistogramVec = HistogramVec::new(
        HistogramOpts::new(
            "ss_contract_confirmation_duration_seconds",
            "Time spent waiting for transaction confirmation"
        ).buckets(exponential_buckets(0.01, 2.0, 16).expect("bucket layout")),
        &["kind"]
    ).expect("metric creation failed");

    // =========================================================================
    // BALANCE METRICS
    // =========================================================================

    /// Balance refreshes by outcome
    pub static ref REFRESHES: CounterVec = CounterVec::new(
        Opts::new("ss_sync_refreshes_total", "Balance refreshes"),
        &["outcome"]  // outcome: fresh/coalesced/failed
    ).expect("metric creation failed");

    /// Duration of a two-read balance refresh
    pub static ref REFRESH_DURATION: Histogram = Histogram::with_opts(
        HistogramOpts::new(
            "ss_sync_refresh_duration_seconds",
            "Time spent re-reading balances"
        ).buckets(exponential_buckets(0.001, 2.0, 14).expect("bucket layout"))
    ).expect("metric creation failed");

    /// Version of the latest published balance snapshot
    pub static ref SNAPSHOT_VERSION: Gauge = Gauge::new(
        "ss_sync_snapshot_version",
        "Version of the latest balance snapshot"
    ).expect("metric creation failed");

    // =========================================================================
    // ERROR METRICS
    // =========================================================================

    /// Engine errors by category
    pub static ref ENGINE_ERRORS: CounterVec = CounterVec::new(
        Opts::new("ss_engine_errors_total", "Errors recorded into engine state"),
        &["category"]  // category: validation/session/contract/sync
    ).expect("metric creation failed");
}

/// Register all metrics with the global registry.
///
/// Repeated calls are harmless.
pub fn register_metrics() -> Result<(), TelemetryError> {
    let metrics: Vec<Box<dyn prometheus::core::Collector>> = vec![
        Box::new(SESSION_EVENTS.clone()),
        Box::new(SUBMISSIONS.clone()),
        Box::new(CONFIRMATION_DURATION.clone()),
        Box::new(REFRESHES.clone()),
        Box::new(REFRESH_DURATION.clone()),
        Box::new(SNAPSHOT_VERSION.clone()),
        Box::new(ENGINE_ERRORS.clone()),
    ];

    for metric in metrics {
        match REGISTRY.register(metric) {
            Ok(()) | Err(prometheus::Error::AlreadyReg) => {}
            Err(e) => return Err(TelemetryError::MetricsInit(e.to_string())),
        }
    }

    Ok(())
}

/// Encode all metrics as Prometheus text format.
pub fn encode_metrics() -> Result<String, TelemetryError> {
    let encoder = TextEncoder::new();
    let metric_families = REGISTRY.gather();
    let mut buffer = Vec::new();
    encoder
        .encode(&metric_families, &mut buffer)
        .map_err(|e| TelemetryError::MetricsInit(e.to_string()))?;
    String::from_utf8(buffer).map_err(|e| TelemetryError::MetricsInit(e.to_string()))
}

/// Timer guard for automatic histogram observation.
pub struct HistogramTimer {
    histogram: Histogram,
    start: std::time::Instant,
}

impl HistogramTimer {
    /// Start a new timer for the given histogram.
    pub fn new(histogram: &Histogram) -> Self {
        Self {
            histogram: histogram.clone(),
            start: std::time::Instant::now(),
        }
    }
}

impl Drop for HistogramTimer {
    fn drop(&mut self) {
        self.histogram.observe(self.start.elapsed().as_secs_f64());
    }
}
