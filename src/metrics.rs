//! Metrics collection and export module

use prometheus::{Histogram, HistogramOpts, IntCounter, IntGauge, Opts, Registry, TextEncoder};
use std::time::Instant;

/// Global metrics registry
pub struct Metrics {
    registry: Registry,

    // Counters
    pub submissions_total: IntCounter,
    pub submissions_confirmed: IntCounter,
    pub submissions_failed: IntCounter,
    pub stale_rebuilds: IntCounter,
    pub transport_retries: IntCounter,
    pub blockhash_fetch_retries: IntCounter,

    // Bulk-run counters
    pub bulk_runs_total: IntCounter,
    pub bulk_holders_discovered: IntCounter,
    pub bulk_pipeline_failures: IntCounter,

    // Gauges
    pub active_pipelines: IntGauge,

    // Histograms
    pub assemble_latency: Histogram,
    pub submit_latency: Histogram,
    pub pipeline_latency: Histogram,
}

impl Metrics {
    /// Create new metrics instance
    pub fn new() -> anyhow::Result<Self> {
        let registry = Registry::new();

        let submissions_total = IntCounter::with_opts(Opts::new(
            "submissions_total",
            "Total number of transaction submissions attempted",
        ))?;

        let submissions_confirmed = IntCounter::with_opts(Opts::new(
            "submissions_confirmed",
            "Number of submissions the node accepted",
        ))?;

        let submissions_failed = IntCounter::with_opts(Opts::new(
            "submissions_failed",
            "Number of submissions that failed after all recovery",
        ))?;

        let stale_rebuilds = IntCounter::with_opts(Opts::new(
            "stale_rebuilds",
            "Number of transactions rebuilt after expiring in flight",
        ))?;

        let transport_retries = IntCounter::with_opts(Opts::new(
            "transport_retries",
            "Number of submissions retried after a transport failure",
        ))?;

        let blockhash_fetch_retries = IntCounter::with_opts(Opts::new(
            "blockhash_fetch_retries",
            "Number of freshness token fetches that needed a retry",
        ))?;

        // Bulk-run counters
        let bulk_runs_total = IntCounter::with_opts(Opts::new(
            "bulk_runs_total",
            "Number of bulk operations started",
        ))?;

        let bulk_holders_discovered = IntCounter::with_opts(Opts::new(
            "bulk_holders_discovered",
            "Number of ticket holders discovered by scans",
        ))?;

        let bulk_pipeline_failures = IntCounter::with_opts(Opts::new(
            "bulk_pipeline_failures",
            "Number of per-holder pipelines that ended in failure",
        ))?;

        let active_pipelines = IntGauge::with_opts(Opts::new(
            "active_pipelines",
            "Number of per-holder pipelines currently running",
        ))?;

        let assemble_latency = Histogram::with_opts(
            HistogramOpts::new("assemble_latency_seconds", "Transaction assembly latency")
                .buckets(vec![0.001, 0.005, 0.01, 0.05, 0.1, 0.5, 1.0, 2.0]),
        )?;

        let submit_latency = Histogram::with_opts(
            HistogramOpts::new("submit_latency_seconds", "Transaction submission latency")
                .buckets(vec![0.01, 0.05, 0.1, 0.5, 1.0, 2.0, 5.0]),
        )?;

        let pipeline_latency = Histogram::with_opts(
            HistogramOpts::new(
                "pipeline_latency_seconds",
                "End-to-end per-holder pipeline latency",
            )
            .buckets(vec![0.05, 0.1, 0.5, 1.0, 2.0, 5.0, 10.0, 30.0]),
        )?;

        // Register all metrics
        registry.register(Box::new(submissions_total.clone()))?;
        registry.register(Box::new(submissions_confirmed.clone()))?;
        registry.register(Box::new(submissions_failed.clone()))?;
        registry.register(Box::new(stale_rebuilds.clone()))?;
        registry.register(Box::new(transport_retries.clone()))?;
        registry.register(Box::new(blockhash_fetch_retries.clone()))?;
        registry.register(Box::new(bulk_runs_total.clone()))?;
        registry.register(Box::new(bulk_holders_discovered.clone()))?;
        registry.register(Box::new(bulk_pipeline_failures.clone()))?;
        registry.register(Box::new(active_pipelines.clone()))?;
        registry.register(Box::new(assemble_latency.clone()))?;
        registry.register(Box::new(submit_latency.clone()))?;
        registry.register(Box::new(pipeline_latency.clone()))?;

        Ok(Self {
            registry,
            submissions_total,
            submissions_confirmed,
            submissions_failed,
            stale_rebuilds,
            transport_retries,
            blockhash_fetch_retries,
            bulk_runs_total,
            bulk_holders_discovered,
            bulk_pipeline_failures,
            active_pipelines,
            assemble_latency,
            submit_latency,
            pipeline_latency,
        })
    }

    /// Get the registry for exporting
    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Render the current values in the Prometheus text format.
    pub fn export(&self) -> anyhow::Result<String> {
        let encoder = TextEncoder::new();
        Ok(encoder.encode_to_string(&self.registry.gather())?)
    }
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new().expect("Failed to create metrics")
    }
}

/// Global metrics instance
pub fn metrics() -> &'static Metrics {
    static METRICS: once_cell::sync::Lazy<Metrics> =
        once_cell::sync::Lazy::new(|| Metrics::new().expect("Failed to initialize metrics"));
    &METRICS
}

/// Timer helper for measuring operation duration
pub struct Timer {
    start: Instant,
}

impl Timer {
    pub fn new() -> Self {
        Self {
            start: Instant::now(),
        }
    }

    pub fn observe_duration(&self, histogram: &Histogram) {
        let duration = self.start.elapsed();
        histogram.observe(duration.as_secs_f64());
    }

    pub fn elapsed_secs(&self) -> f64 {
        self.start.elapsed().as_secs_f64()
    }
}

impl Default for Timer {
    fn default() -> Self {
        Self::new()
    }
}
