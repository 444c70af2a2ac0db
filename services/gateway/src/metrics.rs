// Prometheus metrics for the Tracker Tokens gateway

use once_cell::sync::Lazy;
use prometheus::{
    register_counter_with_registry, register_histogram_with_registry, Counter, Encoder, Histogram,
    HistogramOpts, Opts, Registry, TextEncoder,
};
use std::sync::Arc;

pub struct Metrics {
    pub registry: Registry,

    // Request metrics
    pub http_requests_total: Counter,
    pub http_request_duration_seconds: Histogram,

    // Business metrics
    pub transactions_appended_total: Counter,
    pub tokens_minted_total: Counter,
    pub visits_recorded_total: Counter,
    pub notifications_created_total: Counter,
    pub breach_checks_total: Counter,
    pub breach_hits_total: Counter,
}

impl Metrics {
    pub fn new() -> anyhow::Result<Self> {
        let registry = Registry::new();

        let http_requests_total = register_counter_with_registry!(
            Opts::new("tracker_http_requests_total", "Total HTTP requests processed"),
            registry
        )?;

        let http_request_duration_seconds = register_histogram_with_registry!(
            HistogramOpts::new(
                "tracker_http_request_duration_seconds",
                "HTTP request duration in seconds"
            )
            .buckets(vec![0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0]),
            registry
        )?;

        let transactions_appended_total = register_counter_with_registry!(
            Opts::new(
                "tracker_transactions_appended_total",
                "Ledger transactions appended"
            ),
            registry
        )?;

        let tokens_minted_total = register_counter_with_registry!(
            Opts::new("tracker_tokens_minted_total", "Tokens minted for engagement"),
            registry
        )?;

        let visits_recorded_total = register_counter_with_registry!(
            Opts::new("tracker_visits_recorded_total", "Site visits recorded"),
            registry
        )?;

        let notifications_created_total = register_counter_with_registry!(
            Opts::new(
                "tracker_notifications_created_total",
                "Notifications created"
            ),
            registry
        )?;

        let breach_checks_total = register_counter_with_registry!(
            Opts::new("tracker_breach_checks_total", "Breach checks performed"),
            registry
        )?;

        let breach_hits_total = register_counter_with_registry!(
            Opts::new("tracker_breach_hits_total", "Breach checks with hits"),
            registry
        )?;

        Ok(Self {
            registry,
            http_requests_total,
            http_request_duration_seconds,
            transactions_appended_total,
            tokens_minted_total,
            visits_recorded_total,
            notifications_created_total,
            breach_checks_total,
            breach_hits_total,
        })
    }

    /// Export all metrics in Prometheus text format
    pub fn export(&self) -> anyhow::Result<String> {
        let encoder = TextEncoder::new();
        let metric_families = self.registry.gather();
        let mut buffer = Vec::new();
        encoder.encode(&metric_families, &mut buffer)?;
        Ok(String::from_utf8(buffer)?)
    }
}

// Global metrics instance
pub static METRICS: Lazy<Arc<Metrics>> = Lazy::new(|| {
    Arc::new(Metrics::new().expect("Failed to initialize metrics"))
});
