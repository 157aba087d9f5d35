//! Prometheus-compatible metrics for the Quarry pipeline.
//!
//! Counters and latency histograms for every pipeline stage, plus the
//! health/readiness types served by the REST surface.

use prometheus::{
    self, Histogram, HistogramOpts, IntCounter, IntCounterVec, IntGauge, Opts, Registry,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Instant;

use parking_lot::RwLock;

/// Global metrics instance.
static METRICS: std::sync::OnceLock<Arc<Metrics>> = std::sync::OnceLock::new();

/// Get or initialize the global metrics instance.
pub fn get_metrics() -> Arc<Metrics> {
    METRICS.get_or_init(|| Arc::new(Metrics::new())).clone()
}

/// Default histogram buckets for latency tracking (in seconds).
/// Covers from 1ms to 60s; completions and executions sit at the slow end.
fn default_latency_buckets() -> Vec<f64> {
    vec![
        0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0, 30.0, 60.0,
    ]
}

/// All metrics for the Quarry server.
pub struct Metrics {
    /// Prometheus registry for all metrics.
    pub registry: Registry,

    // Counters
    /// Total number of questions accepted by the pipeline.
    pub queries_total: IntCounter,
    /// Pipeline failures, labelled by the stage that failed.
    pub query_failures_total: IntCounterVec,
    /// Total number of direct-synthesis fallbacks taken.
    pub fallback_total: IntCounter,
    /// Total number of corrective plan retries issued.
    pub plan_retries_total: IntCounter,
    /// Total number of statements rejected by the read-only gate.
    pub unsafe_statements_total: IntCounter,
    /// Total number of schema cache hits.
    pub schema_cache_hits_total: IntCounter,
    /// Total number of schema cache misses.
    pub schema_cache_misses_total: IntCounter,

    // Gauges
    /// Uptime in seconds.
    pub uptime_seconds: IntGauge,

    // Histograms (durations in seconds)
    /// End-to-end pipeline duration.
    pub pipeline_duration_seconds: Histogram,
    /// Engine execution duration.
    pub execution_duration_seconds: Histogram,
    /// Completion API round-trip duration.
    pub completion_duration_seconds: Histogram,

    /// Server start time.
    start_time: RwLock<Instant>,
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}

impl Metrics {
    /// Create a new metrics instance with all metrics registered.
    pub fn new() -> Self {
        let registry = Registry::new();

        let queries_total = IntCounter::new(
            "quarry_queries_total",
            "Total number of questions accepted by the pipeline",
        )
        .expect("failed to create counter");

        let query_failures_total = IntCounterVec::new(
            Opts::new(
                "quarry_query_failures_total",
                "Pipeline failures by failing stage",
            ),
            &["stage"],
        )
        .expect("failed to create counter");

        let fallback_total = IntCounter::new(
            "quarry_fallback_total",
            "Total number of direct-synthesis fallbacks taken",
        )
        .expect("failed to create counter");

        let plan_retries_total = IntCounter::new(
            "quarry_plan_retries_total",
            "Total number of corrective plan retries issued",
        )
        .expect("failed to create counter");

        let unsafe_statements_total = IntCounter::new(
            "quarry_unsafe_statements_total",
            "Total number of statements rejected by the read-only gate",
        )
        .expect("failed to create counter");

        let schema_cache_hits_total = IntCounter::new(
            "quarry_schema_cache_hits_total",
            "Total number of schema cache hits",
        )
        .expect("failed to create counter");

        let schema_cache_misses_total = IntCounter::new(
            "quarry_schema_cache_misses_total",
            "Total number of schema cache misses",
        )
        .expect("failed to create counter");

        let uptime_seconds = IntGauge::new("quarry_uptime_seconds", "Server uptime in seconds")
            .expect("failed to create gauge");

        let pipeline_duration_seconds = Histogram::with_opts(
            HistogramOpts::new(
                "quarry_pipeline_duration_seconds",
                "End-to-end pipeline duration in seconds",
            )
            .buckets(default_latency_buckets()),
        )
        .expect("failed to create histogram");

        let execution_duration_seconds = Histogram::with_opts(
            HistogramOpts::new(
                "quarry_execution_duration_seconds",
                "Engine execution duration in seconds",
            )
            .buckets(default_latency_buckets()),
        )
        .expect("failed to create histogram");

        let completion_duration_seconds = Histogram::with_opts(
            HistogramOpts::new(
                "quarry_completion_duration_seconds",
                "Completion API round-trip duration in seconds",
            )
            .buckets(default_latency_buckets()),
        )
        .expect("failed to create histogram");

        registry
            .register(Box::new(queries_total.clone()))
            .expect("failed to register metric");
        registry
            .register(Box::new(query_failures_total.clone()))
            .expect("failed to register metric");
        registry
            .register(Box::new(fallback_total.clone()))
            .expect("failed to register metric");
        registry
            .register(Box::new(plan_retries_total.clone()))
            .expect("failed to register metric");
        registry
            .register(Box::new(unsafe_statements_total.clone()))
            .expect("failed to register metric");
        registry
            .register(Box::new(schema_cache_hits_total.clone()))
            .expect("failed to register metric");
        registry
            .register(Box::new(schema_cache_misses_total.clone()))
            .expect("failed to register metric");
        registry
            .register(Box::new(uptime_seconds.clone()))
            .expect("failed to register metric");
        registry
            .register(Box::new(pipeline_duration_seconds.clone()))
            .expect("failed to register metric");
        registry
            .register(Box::new(execution_duration_seconds.clone()))
            .expect("failed to register metric");
        registry
            .register(Box::new(completion_duration_seconds.clone()))
            .expect("failed to register metric");

        Self {
            registry,
            queries_total,
            query_failures_total,
            fallback_total,
            plan_retries_total,
            unsafe_statements_total,
            schema_cache_hits_total,
            schema_cache_misses_total,
            uptime_seconds,
            pipeline_duration_seconds,
            execution_duration_seconds,
            completion_duration_seconds,
            start_time: RwLock::new(Instant::now()),
        }
    }

    /// Update the uptime gauge.
    pub fn update_uptime(&self) {
        let uptime = self.start_time.read().elapsed();
        self.uptime_seconds.set(uptime.as_secs() as i64);
    }

    /// Uptime in whole seconds.
    pub fn uptime(&self) -> u64 {
        self.start_time.read().elapsed().as_secs()
    }

    /// Export metrics in Prometheus text format.
    pub fn export_prometheus(&self) -> String {
        use prometheus::Encoder;
        self.update_uptime();

        let encoder = prometheus::TextEncoder::new();
        let metric_families = self.registry.gather();
        let mut buffer = Vec::new();
        encoder.encode(&metric_families, &mut buffer).unwrap_or_default();
        String::from_utf8(buffer).unwrap_or_default()
    }
}

/// Health status for the server.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthStatus {
    pub status: HealthState,
    pub version: String,
    pub uptime_seconds: u64,
    pub checks: Vec<HealthCheck>,
}

/// Health state enum.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HealthState {
    Healthy,
    Degraded,
    Unhealthy,
}

impl HealthState {
    /// Convert to HTTP status code.
    pub fn to_status_code(self) -> u16 {
        match self {
            HealthState::Healthy => 200,
            HealthState::Degraded => 200, // Still operational
            HealthState::Unhealthy => 503,
        }
    }
}

/// Individual health check result.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthCheck {
    pub name: String,
    pub status: HealthState,
    pub message: Option<String>,
}

impl HealthCheck {
    /// Create a healthy check.
    pub fn healthy(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            status: HealthState::Healthy,
            message: None,
        }
    }

    /// Create an unhealthy check.
    pub fn unhealthy(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            status: HealthState::Unhealthy,
            message: Some(message.into()),
        }
    }
}
