// src/lib.rs
// Public library surface for the binary and integration tests.

pub mod api;
pub mod config;
pub mod dispatch;
pub mod enrich;
pub mod ingest;
pub mod notify;
pub mod novelty;
pub mod rate;
pub mod registry;
pub mod retention;
pub mod scheduler;
pub mod telemetry;

// ---- Re-exports for stable public API ----
pub use crate::config::{AppConfig, SourceConfig};
pub use crate::dispatch::{Decision, DispatchFilter, Forward, SuppressReason};
pub use crate::enrich::{Classification, Classifier};
pub use crate::ingest::types::{FeedFetcher, RawEntry};
pub use crate::ingest::Item;
pub use crate::notify::Notifier;
pub use crate::novelty::{detect, DetectStatus, Detection};
pub use crate::rate::StatusReport;
pub use crate::registry::Registry;
pub use crate::retention::{Retention, SourceState};
pub use crate::scheduler::{spawn_scheduler, Poller, TickOutcome};
