//! feed-herald — Binary Entrypoint
//! Loads config, wires fetcher/classifier/notifier into the poller, spawns
//! the scheduler and optionally serves the HTTP status surface.

use std::sync::Arc;

use anyhow::{Context, Result};
use chrono::Utc;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use feed_herald::api::{self, AppState};
use feed_herald::config;
use feed_herald::dispatch::DispatchFilter;
use feed_herald::enrich::{Classifier, HttpClassifier};
use feed_herald::ingest::providers::HttpFeedFetcher;
use feed_herald::notify::{self, Notifier};
use feed_herald::registry::Registry;
use feed_herald::scheduler::{spawn_scheduler, Poller};
use feed_herald::telemetry::Metrics;

/// Compact logs by default; `FEED_HERALD_LOG_JSON=1` switches to JSON lines.
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("feed_herald=info,warn"));

    let json = std::env::var("FEED_HERALD_LOG_JSON")
        .ok()
        .is_some_and(|v| v == "1");

    if json {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().compact())
            .init();
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env in local/dev; no-op when absent.
    let _ = dotenvy::dotenv();
    init_tracing();

    let cfg = config::load_default()?;
    tracing::info!(
        sources = cfg.sources.len(),
        interval_secs = cfg.interval_secs,
        retention_hours = cfg.retention_hours,
        "config loaded"
    );

    let metrics = match Metrics::init() {
        Ok(m) => Some(m),
        Err(e) => {
            tracing::warn!(error = ?e, "metrics disabled");
            None
        }
    };

    let registry = Arc::new(Registry::new(cfg.sources.clone(), Utc::now()));
    let fetcher = Arc::new(HttpFeedFetcher::new().with_timeout(cfg.fetch_timeout_secs));
    let notifier: Arc<dyn Notifier> =
        notify::notifier_from_env(cfg.delivery.max_retries, cfg.delivery.timeout_secs).into();

    let mut poller = Poller::new(
        registry.clone(),
        fetcher,
        notifier,
        DispatchFilter::new(cfg.block_terms.clone()),
        cfg.retention_window(),
    )
    .with_concurrency(cfg.concurrency);

    if cfg.sources.iter().any(|s| s.enrich) {
        let classifier: Arc<dyn Classifier> = Arc::new(
            HttpClassifier::new(
                cfg.enrichment.paywall_markers.clone(),
                cfg.enrichment.full_view_pattern.as_deref(),
            )?
            .with_timeout(cfg.enrichment.timeout_secs),
        );
        poller = poller.with_classifier(classifier);
    }

    let scheduler = spawn_scheduler(Arc::new(poller), cfg.interval());

    if let Some(addr) = cfg.status_addr.as_deref() {
        let state = AppState {
            registry,
            window: cfg.retention_window(),
        };
        let mut app = api::router(state);
        if let Some(m) = &metrics {
            app = app.merge(m.router());
        }
        let listener = tokio::net::TcpListener::bind(addr)
            .await
            .with_context(|| format!("binding status surface on {addr}"))?;
        tracing::info!(%addr, "status surface listening");
        tokio::spawn(async move {
            if let Err(e) = axum::serve(listener, app).await {
                tracing::error!(error = ?e, "status surface stopped");
            }
        });
    }

    tokio::signal::ctrl_c().await.context("waiting for ctrl-c")?;
    tracing::info!("shutting down; in-flight deliveries are abandoned");
    scheduler.abort();
    Ok(())
}
