// src/scheduler.rs
//! Fixed-interval poll loop: fetch → detect → filter → deliver → retain.
//!
//! Per source and tick: `Idle → Fetching → {Initializing | DiffAndDispatch} → Idle`.
//! A fetch error returns the source to idle untouched; a delivery error
//! only affects the one item.

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use futures::future::join_all;
use metrics::{counter, gauge};
use serde::Serialize;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use crate::dispatch::{Decision, DispatchFilter};
use crate::enrich::Classifier;
use crate::ingest::types::FeedFetcher;
use crate::notify::Notifier;
use crate::novelty::{self, DetectStatus};
use crate::registry::{Registry, SourceSlot};
use crate::retention::{Retention, SourceState};

/// What one source did during one tick.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum TickOutcome {
    Failed,
    Initialized {
        baseline: usize,
    },
    Delta {
        new: usize,
        forwarded: usize,
        suppressed: usize,
        delivery_failures: usize,
        evicted: usize,
    },
}

pub struct Poller {
    registry: Arc<Registry>,
    fetcher: Arc<dyn FeedFetcher>,
    notifier: Arc<dyn Notifier>,
    classifier: Option<Arc<dyn Classifier>>,
    filter: DispatchFilter,
    window: Duration,
    concurrency: usize,
}

impl Poller {
    pub fn new(
        registry: Arc<Registry>,
        fetcher: Arc<dyn FeedFetcher>,
        notifier: Arc<dyn Notifier>,
        filter: DispatchFilter,
        window: Duration,
    ) -> Self {
        Self {
            registry,
            fetcher,
            notifier,
            classifier: None,
            filter,
            window,
            concurrency: 1,
        }
    }

    /// Classifier used for sources with `enrich = true`.
    pub fn with_classifier(mut self, classifier: Arc<dyn Classifier>) -> Self {
        self.classifier = Some(classifier);
        self
    }

    /// Max sources processed at once within a tick (min 1).
    pub fn with_concurrency(mut self, n: usize) -> Self {
        self.concurrency = n.max(1);
        self
    }

    pub fn registry(&self) -> &Arc<Registry> {
        &self.registry
    }

    pub fn window(&self) -> Duration {
        self.window
    }

    /// Poll every source once. Outcomes are in registry order.
    pub async fn tick(&self, now: DateTime<Utc>) -> Vec<TickOutcome> {
        let mut out = Vec::with_capacity(self.registry.len());
        for chunk in self.registry.slots().chunks(self.concurrency) {
            let results = join_all(chunk.iter().map(|slot| self.poll_source(slot, now))).await;
            out.extend(results);
        }
        out
    }

    /// One source, one tick. Never fails; errors are logged and counted.
    pub async fn poll_source(&self, slot: &SourceSlot, now: DateTime<Utc>) -> TickOutcome {
        let cfg = slot.config();
        counter!("feed_polls_total").increment(1);

        let fetched = match self.fetcher.fetch(&cfg.feed_url).await {
            Ok(v) => v,
            Err(e) => {
                tracing::warn!(target: "poll", destination = %cfg.destination, feed = %cfg.feed_url, error = ?e, "fetch failed; source left unchanged");
                counter!("feed_fetch_errors_total").increment(1);
                return TickOutcome::Failed;
            }
        };

        // Forget expired items before diffing, so an entry that aged out
        // during a fetch outage is new again when it reappears.
        let mut state = slot.snapshot();
        let mut evicted = 0;
        if let SourceState::Initialized(ret) = &mut state {
            evicted = ret.evict(now, self.window);
        }
        let detection = novelty::detect(&fetched, &state, now);

        let mut ret = match state {
            SourceState::Unpolled => {
                debug_assert_eq!(detection.status, DetectStatus::Initializing);
                let baseline = detection.new_items.len();
                tracing::info!(target: "poll", destination = %cfg.destination, baseline, "first poll; baseline recorded");
                slot.commit(SourceState::Initialized(Retention::from_baseline(
                    detection.new_items,
                    now,
                )));
                gauge!("feed_retained_items", "destination" => cfg.destination.clone())
                    .set(baseline as f64);
                return TickOutcome::Initialized { baseline };
            }
            SourceState::Initialized(ret) => ret,
        };

        let new_items = detection.new_items;
        if !new_items.is_empty() {
            let links: Vec<&str> = new_items.iter().map(|i| i.link.as_str()).collect();
            tracing::info!(target: "poll", destination = %cfg.destination, new = new_items.len(), ?links, "new items");
            counter!("feed_items_new_total").increment(new_items.len() as u64);
        }

        let classifier = if cfg.enrich {
            self.classifier.as_deref()
        } else {
            None
        };

        let (mut forwarded, mut suppressed, mut delivery_failures) = (0usize, 0usize, 0usize);
        for item in &new_items {
            match self.filter.decide(item, classifier).await {
                Decision::Forward(fw) => {
                    match self.notifier.deliver(&cfg.destination, &fw.render()).await {
                        Ok(()) => {
                            forwarded += 1;
                            counter!("feed_items_forwarded_total").increment(1);
                        }
                        Err(e) => {
                            delivery_failures += 1;
                            counter!("feed_delivery_errors_total").increment(1);
                            tracing::warn!(target: "deliver", destination = %cfg.destination, link = %item.link, error = ?e, "delivery failed");
                        }
                    }
                }
                Decision::Suppress(reason) => {
                    suppressed += 1;
                    counter!("feed_items_suppressed_total", "reason" => reason.as_str())
                        .increment(1);
                    tracing::debug!(target: "dispatch", destination = %cfg.destination, link = %item.link, reason = reason.as_str(), "suppressed");
                }
            }
        }

        // Seen once detected, whatever happened to the delivery.
        let new = new_items.len();
        ret.admit(new_items);
        evicted += ret.evict(now, self.window);
        let retained = ret.len();
        slot.commit(SourceState::Initialized(ret));

        counter!("feed_items_evicted_total").increment(evicted as u64);
        gauge!("feed_retained_items", "destination" => cfg.destination.clone())
            .set(retained as f64);

        TickOutcome::Delta {
            new,
            forwarded,
            suppressed,
            delivery_failures,
            evicted,
        }
    }
}

/// Run [`Poller::tick`] every `every`. Ticks never overlap; a slow tick
/// delays the next one.
pub fn spawn_scheduler(poller: Arc<Poller>, every: std::time::Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(every);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        loop {
            ticker.tick().await;
            let now = Utc::now();
            let outcomes = poller.tick(now).await;

            counter!("feed_ticks_total").increment(1);
            gauge!("feed_last_tick_ts").set(now.timestamp() as f64);

            let failed = outcomes
                .iter()
                .filter(|o| matches!(o, TickOutcome::Failed))
                .count();
            tracing::debug!(target: "poll", sources = outcomes.len(), failed, "tick done");
        }
    })
}
