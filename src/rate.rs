//! # Rate reporter
//! Delivered-items-per-24h since a source's first poll, plus the status
//! report built from it.
//!
//! The elapsed-hours divisor is clamped to `[1 minute, W]`: the floor avoids
//! blow-ups right after startup, the ceiling keeps the figure from being
//! diluted once the process has outlived the retention window.

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;

use crate::registry::Registry;
use crate::retention::SourceState;

/// Smallest divisor used for the rate, in hours.
pub const MIN_EPOCH_HOURS: f64 = 1.0 / 60.0;

fn hours(d: Duration) -> f64 {
    d.num_milliseconds() as f64 / 3_600_000.0
}

/// Items per 24h for one source, `None` until its first poll completed.
///
/// Only items inside the window at `now` count, even if the source has not
/// been polled (and so not evicted) for a while.
pub fn rate(state: &SourceState, now: DateTime<Utc>, window: Duration) -> Option<f64> {
    let ret = state.retention()?;
    let ceiling = hours(window).max(MIN_EPOCH_HOURS);
    let elapsed = hours(now.signed_duration_since(ret.first_polled_at())).clamp(MIN_EPOCH_HOURS, ceiling);
    let delta = ret.live_len(now, window) as f64 - ret.baseline_count() as f64;
    Some(delta / elapsed * 24.0)
}

/// Days since process start, clamped to the window length.
pub fn elapsed_days(started_at: DateTime<Utc>, now: DateTime<Utc>, window: Duration) -> f64 {
    let days = hours(now.signed_duration_since(started_at)).max(0.0) / 24.0;
    days.min(hours(window) / 24.0)
}

fn round_to(v: f64, decimals: i32) -> f64 {
    let f = 10f64.powi(decimals);
    (v * f).round() / f
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct SourceStatus {
    pub destination: String,
    pub retained: usize,
    pub baseline: Option<usize>,
    pub rate_per_24h: Option<f64>,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct StatusReport {
    pub elapsed_days: f64,
    pub sources: Vec<SourceStatus>,
}

impl StatusReport {
    pub fn collect(registry: &Registry, now: DateTime<Utc>, window: Duration) -> Self {
        let sources = registry
            .slots()
            .iter()
            .map(|slot| {
                slot.inspect(|state| SourceStatus {
                    destination: slot.config().destination.clone(),
                    retained: state.live_len(now, window),
                    baseline: state.baseline_count(),
                    rate_per_24h: rate(state, now, window).map(|r| round_to(r, 2)),
                })
            })
            .collect();

        Self {
            elapsed_days: round_to(elapsed_days(registry.started_at(), now, window), 1),
            sources,
        }
    }

    /// Operator-facing text block, one line per source.
    pub fn render_text(&self) -> String {
        let mut out = format!("avg/24h last {} days:\n", self.elapsed_days);
        for s in &self.sources {
            out.push_str(&format!(
                "{}: {} ({} - {})\n",
                s.destination,
                s.rate_per_24h.unwrap_or(0.0),
                s.retained,
                s.baseline.unwrap_or(0)
            ));
        }
        out
    }
}
