//! Prometheus metrics for verification outcomes.

use crate::models::VerificationError;
use prometheus::{CounterVec, Histogram, HistogramOpts, Opts, Registry, TextEncoder};
use std::time::Duration;

/// Verification outcome counters and latency histogram
#[derive(Clone)]
pub struct VerificationMetrics {
    pub registry: Registry,
    pub requests_total: CounterVec,
    pub duration_seconds: Histogram,
}

impl VerificationMetrics {
    /// Create a collector with its own registry
    pub fn new() -> Result<Self, prometheus::Error> {
        let registry = Registry::new();

        // Decisions by outcome and rejection reason
        let requests_total = CounterVec::new(
            Opts::new(
                "slack_verification_requests_total",
                "Total number of Slack requests verified",
            ),
            &["outcome", "reason"],
        )?;

        // Time spent verifying, body read included
        let duration_seconds = Histogram::with_opts(
            HistogramOpts::new(
                "slack_verification_duration_seconds",
                "Slack request verification duration in seconds",
            )
            .buckets(vec![0.0001, 0.0005, 0.001, 0.005, 0.01, 0.05, 0.1, 0.5, 1.0]),
        )?;

        registry.register(Box::new(requests_total.clone()))?;
        registry.register(Box::new(duration_seconds.clone()))?;

        Ok(Self {
            registry,
            requests_total,
            duration_seconds,
        })
    }

    /// Record a forwarded request
    pub fn record_accepted(&self, duration: Duration) {
        self.requests_total
            .with_label_values(&["accepted", "none"])
            .inc();
        self.duration_seconds.observe(duration.as_secs_f64());
    }

    /// Record a rejected request
    pub fn record_rejected(&self, error: &VerificationError, duration: Duration) {
        self.requests_total
            .with_label_values(&["rejected", error.reason()])
            .inc();
        self.duration_seconds.observe(duration.as_secs_f64());
    }

    /// Render metrics in Prometheus text format
    pub fn render(&self) -> Result<String, prometheus::Error> {
        let encoder = TextEncoder::new();
        let metric_families = self.registry.gather();
        encoder.encode_to_string(&metric_families)
    }
}
