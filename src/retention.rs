//! # Retention
//! Per-source memory of seen items, bounded by a fixed age window.
//!
//! Items are kept most-recent-first. A source that has never been polled
//! is [`SourceState::Unpolled`]; the first successful poll turns it into
//! [`SourceState::Initialized`] carrying the baseline used by the rate
//! reporter.

use std::collections::VecDeque;

use chrono::{DateTime, Duration, Utc};

use crate::ingest::Item;

/// Default retention window (300h).
pub const DEFAULT_RETENTION_HOURS: i64 = 300;

#[derive(Debug, Clone, Default)]
pub enum SourceState {
    #[default]
    Unpolled,
    Initialized(Retention),
}

impl SourceState {
    pub fn retention(&self) -> Option<&Retention> {
        match self {
            SourceState::Unpolled => None,
            SourceState::Initialized(r) => Some(r),
        }
    }

    pub fn retained_len(&self) -> usize {
        self.retention().map(Retention::len).unwrap_or(0)
    }

    pub fn baseline_count(&self) -> Option<usize> {
        self.retention().map(Retention::baseline_count)
    }

    /// Items still inside `window` at `now`; 0 for an unpolled source.
    pub fn live_len(&self, now: DateTime<Utc>, window: Duration) -> usize {
        self.retention()
            .map(|r| r.live_len(now, window))
            .unwrap_or(0)
    }
}

/// Seen items of one initialized source.
#[derive(Debug, Clone)]
pub struct Retention {
    retained: VecDeque<Item>,
    baseline_count: usize,
    first_polled_at: DateTime<Utc>,
}

impl Retention {
    /// Record the first poll. Nothing from it is ever dispatched.
    pub fn from_baseline(items: Vec<Item>, now: DateTime<Utc>) -> Self {
        Self {
            baseline_count: items.len(),
            retained: items.into(),
            first_polled_at: now,
        }
    }

    /// Prepend `new_items` keeping their order, so after admitting
    /// `[A, B, C]` the store reads `[A, B, C, ..previous..]`.
    pub fn admit(&mut self, new_items: Vec<Item>) {
        for item in new_items.into_iter().rev() {
            self.retained.push_front(item);
        }
    }

    /// Drop every item older than `window` at `now`. Returns how many went.
    ///
    /// An item seen exactly `window` ago is still kept.
    pub fn evict(&mut self, now: DateTime<Utc>, window: Duration) -> usize {
        let before = self.retained.len();
        self.retained
            .retain(|it| now.signed_duration_since(it.first_seen_at) <= window);
        before - self.retained.len()
    }

    /// Count of items [`Retention::evict`] would keep, without mutating.
    pub fn live_len(&self, now: DateTime<Utc>, window: Duration) -> usize {
        self.retained
            .iter()
            .filter(|it| now.signed_duration_since(it.first_seen_at) <= window)
            .count()
    }

    pub fn items(&self) -> impl Iterator<Item = &Item> {
        self.retained.iter()
    }

    pub fn len(&self) -> usize {
        self.retained.len()
    }

    pub fn is_empty(&self) -> bool {
        self.retained.is_empty()
    }

    pub fn baseline_count(&self) -> usize {
        self.baseline_count
    }

    pub fn first_polled_at(&self) -> DateTime<Utc> {
        self.first_polled_at
    }
}
