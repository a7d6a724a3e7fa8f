use prometheus::{HistogramOpts, HistogramVec, Registry};
use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

/// Body of the `/healthz` response.
#[derive(Debug, Default, Serialize)]
pub struct MetricsSnapshot {
    pub response_time_ms: BTreeMap<String, f64>,
    pub requests_count: BTreeMap<String, u64>,
}

/// Per-route request latency. The histogram count doubles as the request count.
#[derive(Clone)]
pub struct Metrics {
    request_latency: HistogramVec,
    registry: Arc<Registry>,
}

impl Metrics {
    pub fn new() -> Result<Self, prometheus::Error> {
        let registry = Registry::new();

        let request_latency = HistogramVec::new(
            HistogramOpts::new("revindex_request_latency_seconds", "Successful request latency by route")
                .buckets(vec![0.0001, 0.0005, 0.001, 0.005, 0.01, 0.05, 0.1, 0.5, 1.0]),
            &["route"],
        )?;
        registry.register(Box::new(request_latency.clone()))?;

        Ok(Self { request_latency, registry: Arc::new(registry) })
    }

    pub fn registry(&self) -> Arc<Registry> {
        self.registry.clone()
    }

    pub fn record(&self, route: &str, elapsed: Duration) {
        self.request_latency.with_label_values(&[route]).observe(elapsed.as_secs_f64());
    }

    /// Average latency in milliseconds and request count per route seen so far.
    pub fn snapshot(&self) -> MetricsSnapshot {
        let mut snapshot = MetricsSnapshot::default();
        for family in self.registry.gather() {
            for metric in family.get_metric() {
                let Some(route) = metric.get_label().iter().find(|l| l.get_name() == "route") else {
                    continue;
                };
                let histogram = metric.get_histogram();
                let count = histogram.get_sample_count();
                let avg_ms = if count == 0 { 0.0 } else { histogram.get_sample_sum() / count as f64 * 1000.0 };
                snapshot.response_time_ms.insert(route.get_value().to_string(), avg_ms);
                snapshot.requests_count.insert(route.get_value().to_string(), count);
            }
        }
        snapshot
    }

    /// Prometheus text exposition of every registered metric.
    pub fn encode(&self) -> Result<String, prometheus::Error> {
        use prometheus::Encoder;
        let encoder = prometheus::TextEncoder::new();
        let mut buffer = Vec::new();
        encoder.encode(&self.registry.gather(), &mut buffer)?;
        String::from_utf8(buffer).map_err(|e| prometheus::Error::Msg(e.to_string()))
    }
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new().expect("Failed to create metrics")
    }
}
