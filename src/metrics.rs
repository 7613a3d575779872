use axum::{routing::get, Router};
use metrics::{describe_counter, describe_gauge, gauge};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};

pub struct Metrics {
    pub handle: PrometheusHandle,
}

impl Metrics {
    /// Initialize the Prometheus recorder and register the fetch series.
    pub fn init(poll_interval_secs: u64) -> anyhow::Result<Self> {
        // Use default buckets to avoid API differences across crate versions.
        let builder = PrometheusBuilder::new();
        let handle = builder.install_recorder()?;

        describe_counter!("rate_fetch_total", "Extraction attempts started.");
        describe_counter!("rate_fetch_errors_total", "Extraction attempts that failed.");
        describe_gauge!("rate_rows", "Row count of the last successful rate table.");
        describe_gauge!("rate_last_refresh_ts", "Unix ts of the last successful refresh.");

        // Static gauge with the configured interval; 0 means polling disabled.
        gauge!("rate_poll_interval_secs").set(poll_interval_secs as f64);

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
