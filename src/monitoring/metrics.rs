// src/monitoring/metrics.rs - Prometheus metrics for the inspection endpoints

use anyhow::Result;
use prometheus::{
    Encoder, Histogram, HistogramOpts, HistogramTimer, IntCounter, Registry, TextEncoder,
};

/// Content type of the Prometheus text exposition format
pub const PROMETHEUS_CONTENT_TYPE: &str = "text/plain; version=0.0.4";

/// Latency buckets in seconds
const LATENCY_BUCKETS: &[f64] = &[0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0, 20.0, 30.0, 60.0, 120.0];

/// Request counters and timers exposed on `/metrics`
///
/// Each instance owns a private registry.
#[derive(Clone)]
pub struct ServiceMetrics {
    registry: Registry,
    request_processing_seconds: Histogram,
    predictions_total: IntCounter,
    prediction_errors_total: IntCounter,
}

impl ServiceMetrics {
    pub fn new() -> Result<Self> {
        let registry = Registry::new();

        let request_processing_seconds = Histogram::with_opts(
            HistogramOpts::new(
                "request_processing_seconds",
                "Time spent processing inspection requests",
            )
            .buckets(LATENCY_BUCKETS.to_vec()),
        )?;
        let predictions_total =
            IntCounter::new("predictions_total", "Total number of predictions made")?;
        let prediction_errors_total = IntCounter::new(
            "prediction_errors_total",
            "Total number of inspection requests that failed",
        )?;

        registry.register(Box::new(request_processing_seconds.clone()))?;
        registry.register(Box::new(predictions_total.clone()))?;
        registry.register(Box::new(prediction_errors_total.clone()))?;

        Ok(Self {
            registry,
            request_processing_seconds,
            predictions_total,
            prediction_errors_total,
        })
    }

    /// Observes the elapsed time into `request_processing_seconds` when dropped
    pub fn start_request_timer(&self) -> HistogramTimer {
        self.request_processing_seconds.start_timer()
    }

    pub fn record_prediction(&self) {
        self.predictions_total.inc();
    }

    pub fn record_error(&self) {
        self.prediction_errors_total.inc();
    }

    pub fn predictions(&self) -> u64 {
        self.predictions_total.get()
    }

    pub fn errors(&self) -> u64 {
        self.prediction_errors_total.get()
    }

    pub fn observed_requests(&self) -> u64 {
        self.request_processing_seconds.get_sample_count()
    }

    /// Render every registered metric in the Prometheus text format
    pub fn render(&self) -> Result<String> {
        let mut buffer = Vec::new();
        TextEncoder::new().encode(&self.registry.gather(), &mut buffer)?;
        Ok(String::from_utf8(buffer)?)
    }
}
