//! Novelty detection: splits a freshly fetched feed into entries that are
//! new for a source and entries it already knows.

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::ingest::{normalize_all, types::RawEntry, Item};
use crate::retention::SourceState;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum DetectStatus {
    /// First poll: the items form the baseline and must not be dispatched.
    Initializing,
    /// Regular poll: the items are new and should be dispatched.
    Delta,
}

#[derive(Debug, Clone)]
pub struct Detection {
    pub status: DetectStatus,
    pub new_items: Vec<Item>,
}

/// Link/id lookup equivalent to testing every pair with [`Item::same_entry`].
#[derive(Debug, Default)]
struct SeenIndex {
    links: HashSet<String>,
    ids: HashSet<String>,
}

impl SeenIndex {
    fn from_items<'a>(items: impl Iterator<Item = &'a Item>) -> Self {
        let mut idx = Self::default();
        for it in items {
            idx.insert(it);
        }
        idx
    }

    fn contains(&self, it: &Item) -> bool {
        self.links.contains(it.identity_link())
            || it.identity_id().is_some_and(|id| self.ids.contains(id))
    }

    fn insert(&mut self, it: &Item) {
        self.links.insert(it.identity_link().to_string());
        if let Some(id) = it.identity_id() {
            self.ids.insert(id.to_string());
        }
    }
}

/// Keep the first occurrence of every identity among `items`, skipping
/// anything already in `seen`. Order is preserved.
fn first_unseen(items: Vec<Item>, mut seen: SeenIndex) -> Vec<Item> {
    let mut out = Vec::with_capacity(items.len());
    for it in items {
        if seen.contains(&it) {
            continue;
        }
        seen.insert(&it);
        out.push(it);
    }
    out
}

/// Diff `fetched` against the source's retained items.
///
/// Entries failing normalization are ignored. Repeated identities inside one
/// fetch count once, at their first position.
pub fn detect(fetched: &[RawEntry], state: &SourceState, now: DateTime<Utc>) -> Detection {
    match state {
        SourceState::Unpolled => Detection {
            status: DetectStatus::Initializing,
            new_items: first_unseen(normalize_all(fetched, now), SeenIndex::default()),
        },
        SourceState::Initialized(ret) => {
            let seen = SeenIndex::from_items(ret.items());
            Detection {
                status: DetectStatus::Delta,
                new_items: first_unseen(normalize_all(fetched, now), seen),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::retention::Retention;
    use chrono::TimeZone;

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 9, 6, 9, 0, 0).unwrap()
    }

    fn state_with(entries: &[RawEntry]) -> SourceState {
        SourceState::Initialized(Retention::from_baseline(normalize_all(entries, t0()), t0()))
    }

    #[test]
    fn unpolled_source_initializes() {
        let fetched = vec![RawEntry::new("https://a/1", "1"), RawEntry::new("https://a/2", "2")];
        let d = detect(&fetched, &SourceState::Unpolled, t0());
        assert_eq!(d.status, DetectStatus::Initializing);
        assert_eq!(d.new_items.len(), 2);
    }

    #[test]
    fn delta_matches_by_link_or_id() {
        let state = state_with(&[
            RawEntry::new("https://a/1", "1"),
            RawEntry::new("https://a/2", "2").with_id("g2"),
        ]);
        let fetched = vec![
            RawEntry::new("https://a/1?utm=feed", "1 (edited)"),
            RawEntry::new("https://a/2-moved", "2").with_id("g2"),
            RawEntry::new("https://a/3", "3"),
        ];
        let d = detect(&fetched, &state, t0());
        assert_eq!(d.status, DetectStatus::Delta);
        let links: Vec<_> = d.new_items.iter().map(|i| i.link.as_str()).collect();
        assert_eq!(links, vec!["https://a/3"]);
    }

    #[test]
    fn duplicates_within_one_fetch_count_once() {
        let state = state_with(&[]);
        let fetched = vec![
            RawEntry::new("https://a/9", "first"),
            RawEntry::new("https://a/9?x=1", "second"),
        ];
        let d = detect(&fetched, &state, t0());
        assert_eq!(d.new_items.len(), 1);
        assert_eq!(d.new_items[0].title, "first");
    }

    #[test]
    fn baseline_counts_repeated_links_once() {
        let fetched = vec![
            RawEntry::new("https://a/1", "1"),
            RawEntry::new("https://a/2", "2"),
            RawEntry::new("https://a/1?ref=top", "1 again"),
            RawEntry::new("https://a/3", "3").with_id("g2"),
            RawEntry::new("https://a/2-amp", "2 amp").with_id("g2"),
        ];
        let d = detect(&fetched, &SourceState::Unpolled, t0());
        assert_eq!(d.status, DetectStatus::Initializing);
        let links: Vec<_> = d.new_items.iter().map(|i| i.link.as_str()).collect();
        assert_eq!(links, vec!["https://a/1", "https://a/2", "https://a/3"]);
    }

    #[test]
    fn malformed_entries_are_skipped() {
        let state = state_with(&[]);
        let fetched = vec![RawEntry::new("https://a/1", ""), RawEntry::new("https://a/2", "ok")];
        let d = detect(&fetched, &state, t0());
        assert_eq!(d.new_items.len(), 1);
        assert_eq!(d.new_items[0].link, "https://a/2");
    }
}
