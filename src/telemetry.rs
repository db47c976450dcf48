use anyhow::{Context, Result};
use axum::{routing::get, Router};
use metrics::{describe_counter, describe_gauge, describe_histogram};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use once_cell::sync::OnceCell;

pub struct Metrics {
    pub handle: PrometheusHandle,
}

impl Metrics {
    /// Install the Prometheus recorder and register metric descriptions.
    pub fn init() -> Result<Self> {
        let handle = PrometheusBuilder::new()
            .install_recorder()
            .context("prometheus: install recorder")?;
        ensure_metrics_described();
        Ok(Self { handle })
    }

    /// Router exposing `/metrics` in the Prometheus exposition format.
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

/// One-time metrics registration (so series show up on /metrics).
pub fn ensure_metrics_described() {
    static ONCE: OnceCell<()> = OnceCell::new();
    ONCE.get_or_init(|| {
        describe_counter!("feed_polls_total", "Source polls attempted.");
        describe_counter!("feed_ticks_total", "Scheduler ticks completed.");
        describe_counter!("feed_fetch_errors_total", "Feed fetch/parse failures.");
        describe_counter!("feed_entries_parsed_total", "Raw entries parsed from feeds.");
        describe_counter!("feed_fetch_bytes_total", "Feed body bytes downloaded.");
        describe_counter!("feed_items_new_total", "Items detected as new.");
        describe_counter!(
            "feed_items_forwarded_total",
            "Items delivered to their destination."
        );
        describe_counter!(
            "feed_items_suppressed_total",
            "Items suppressed by the dispatch filter, by reason."
        );
        describe_counter!("feed_delivery_errors_total", "Failed deliveries.");
        describe_counter!(
            "feed_enrich_errors_total",
            "Page classifications that failed (item forwarded anyway)."
        );
        describe_counter!(
            "feed_items_evicted_total",
            "Items dropped from retention after the window."
        );
        describe_gauge!("feed_retained_items", "Items currently retained per destination.");
        describe_gauge!("feed_last_tick_ts", "Unix ts of the last scheduler tick.");
        describe_histogram!("feed_fetch_ms", "Feed download time in milliseconds.");
        describe_histogram!("feed_parse_ms", "Feed parse time in milliseconds.");
    });
}
