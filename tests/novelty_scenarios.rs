// tests/novelty_scenarios.rs
//
// Detector + retention store without the scheduler around them.

use chrono::{DateTime, Duration, TimeZone, Utc};
use feed_herald::ingest::types::RawEntry;
use feed_herald::novelty::{detect, DetectStatus};
use feed_herald::retention::{Retention, SourceState};

fn t0() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2020, 10, 23, 10, 0, 0).unwrap()
}

fn abc() -> Vec<RawEntry> {
    vec![
        RawEntry::new("https://n.example/a", "A"),
        RawEntry::new("https://n.example/b", "B"),
        RawEntry::new("https://n.example/c", "C"),
    ]
}

fn links(state: &SourceState) -> Vec<String> {
    state
        .retention()
        .map(|r| r.items().map(|i| i.link.clone()).collect())
        .unwrap_or_default()
}

#[test]
fn first_poll_baselines_then_delta_finds_only_d() {
    let d0 = detect(&abc(), &SourceState::Unpolled, t0());
    assert_eq!(d0.status, DetectStatus::Initializing);
    let state = SourceState::Initialized(Retention::from_baseline(d0.new_items, t0()));
    assert_eq!(state.baseline_count(), Some(3));
    assert_eq!(state.retained_len(), 3);

    let mut second = abc();
    second.push(RawEntry::new("https://n.example/d", "D"));
    let t1 = t0() + Duration::seconds(5);
    let d1 = detect(&second, &state, t1);
    assert_eq!(d1.status, DetectStatus::Delta);
    assert_eq!(d1.new_items.len(), 1);
    assert_eq!(d1.new_items[0].title, "D");
    assert_eq!(d1.new_items[0].first_seen_at, t1);
}

#[test]
fn new_items_keep_fetch_order_and_are_prepended() {
    let base = vec![RawEntry::new("https://n.example/old", "old")];
    let d0 = detect(&base, &SourceState::Unpolled, t0());
    let mut ret = Retention::from_baseline(d0.new_items, t0());

    let d1 = detect(&abc(), &SourceState::Initialized(ret.clone()), t0());
    let titles: Vec<_> = d1.new_items.iter().map(|i| i.title.as_str()).collect();
    assert_eq!(titles, vec!["A", "B", "C"]);

    ret.admit(d1.new_items);
    assert_eq!(
        links(&SourceState::Initialized(ret)),
        vec![
            "https://n.example/a",
            "https://n.example/b",
            "https://n.example/c",
            "https://n.example/old"
        ]
    );
}

#[test]
fn same_link_is_a_duplicate_regardless_of_title_and_categories() {
    let d0 = detect(&abc(), &SourceState::Unpolled, t0());
    let state = SourceState::Initialized(Retention::from_baseline(d0.new_items, t0()));

    let refetched = vec![RawEntry::new("https://n.example/a?ref=home", "A, rewritten")
        .with_categories(["Other"])];
    assert!(detect(&refetched, &state, t0()).new_items.is_empty());
}

#[test]
fn entry_with_empty_title_never_counts() {
    let fetched = vec![
        RawEntry::new("https://n.example/a", "A"),
        RawEntry::new("https://n.example/untitled", ""),
    ];
    let d0 = detect(&fetched, &SourceState::Unpolled, t0());
    assert_eq!(d0.new_items.len(), 1);
    let state = SourceState::Initialized(Retention::from_baseline(d0.new_items, t0()));

    let d1 = detect(&fetched, &state, t0());
    assert!(d1.new_items.is_empty());
    assert_eq!(state.retained_len(), 1);
}

#[test]
fn window_eviction_boundary_for_several_windows() {
    for w_hours in [1, 24, 300] {
        let w = Duration::hours(w_hours);
        let d0 = detect(&abc(), &SourceState::Unpolled, t0());
        let mut ret = Retention::from_baseline(vec![], t0());
        ret.admit(d0.new_items);

        let mut at_edge = ret.clone();
        assert_eq!(at_edge.evict(t0() + w, w), 0, "present at T+W (W={w_hours}h)");
        assert_eq!(at_edge.len(), 3);

        assert_eq!(ret.evict(t0() + w + Duration::milliseconds(1), w), 3);
        assert!(ret.is_empty(), "absent after T+W (W={w_hours}h)");
    }
}
