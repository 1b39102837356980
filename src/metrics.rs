use axum::{routing::get, Router};
use metrics::{describe_counter, describe_histogram, gauge};
use metrics_exporter_prometheus::{BuildError, PrometheusBuilder, PrometheusHandle};

pub struct Metrics {
    pub handle: PrometheusHandle,
}

impl Metrics {
    /// Install the global Prometheus recorder. Fails if a recorder is already set.
    pub fn init(cache_ttl_secs: u64) -> Result<Self, BuildError> {
        let handle = PrometheusBuilder::new().install_recorder()?;

        describe_counter!("backend_calls_total", "External scoring calls issued");
        describe_counter!("backend_dropped_total", "Backend results dropped (error, timeout, out of range)");
        describe_counter!("heuristic_fallback_total", "Category scores that fell back to the heuristic");
        describe_counter!("cache_hits_total", "Content cache hits");
        describe_counter!("cache_misses_total", "Content cache misses");
        describe_counter!("cache_errors_total", "Content cache operations that failed");
        describe_histogram!("category_score", "Aggregated category scores");

        // entries expire this long after their write; reads do not extend it
        gauge!("content_cache_ttl_secs").set(cache_ttl_secs as f64);

        Ok(Self { handle })
    }

    /// Returns a router exposing `/metrics` with the Prometheus exposition format.
    pub fn router(&self) -> Router {
        let handle = self.handle.clone();
        Router::new().route(
            "/metrics",
            get(move || {
                let h = handle.clone();
                async move { h.render() }
            }),
        )
    }
}
