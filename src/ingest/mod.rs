// src/ingest/mod.rs
//! Feed entry ingestion: fetcher contract, XML parsing and the entry
//! normalizer that turns raw entries into canonical [`Item`]s.

pub mod providers;
pub mod rss;
pub mod types;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::ingest::types::RawEntry;

/// Canonical representation of one feed entry.
///
/// `first_seen_at` is the observation time of this process, never the
/// publish date carried by the feed.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct Item {
    pub first_seen_at: DateTime<Utc>,
    pub link: String,
    pub id: Option<String>,
    pub title: String,
    pub categories: Vec<String>,
}

impl Item {
    /// Link with the query string removed; primary identity key.
    pub fn identity_link(&self) -> &str {
        strip_query(&self.link)
    }

    /// Source-provided id, if present and non-empty.
    pub fn identity_id(&self) -> Option<&str> {
        self.id.as_deref().filter(|id| !id.is_empty())
    }

    /// Two items are the same entry when their links match after query
    /// stripping, or when both carry the same non-empty id.
    pub fn same_entry(&self, other: &Item) -> bool {
        if self.identity_link() == other.identity_link() {
            return true;
        }
        matches!(
            (self.identity_id(), other.identity_id()),
            (Some(a), Some(b)) if a == b
        )
    }
}

/// Cut everything from the first `?` on.
pub fn strip_query(link: &str) -> &str {
    match link.find('?') {
        Some(idx) => &link[..idx],
        None => link,
    }
}

/// Map a raw entry into an [`Item`] observed at `now`.
///
/// Returns `None` when link or title is missing or blank.
pub fn normalize(raw: &RawEntry, now: DateTime<Utc>) -> Option<Item> {
    let link = raw.link.as_deref().map(str::trim).filter(|s| !s.is_empty())?;
    let title = raw.title.as_deref().map(str::trim).filter(|s| !s.is_empty())?;

    Some(Item {
        first_seen_at: now,
        link: link.to_string(),
        id: raw.id.clone(),
        title: title.to_string(),
        categories: raw.categories.clone(),
    })
}

/// Normalize a batch, keeping fetch order and dropping malformed entries.
pub fn normalize_all(raw: &[RawEntry], now: DateTime<Utc>) -> Vec<Item> {
    raw.iter().filter_map(|r| normalize(r, now)).collect()
}
