// tests/feed_parse.rs
use feed_herald::ingest::providers::StaticFeedFetcher;
use feed_herald::ingest::rss::parse_feed;
use feed_herald::ingest::types::FeedFetcher;

const POLITIK_XML: &str = include_str!("fixtures/politik_rss.xml");
const TECH_ATOM: &str = include_str!("fixtures/tech_atom.xml");

#[tokio::test]
async fn rss_fixture_parses_every_item_in_order() {
    let fetcher = StaticFeedFetcher::new();
    fetcher.set_xml("https://news.example/politik.rss", POLITIK_XML);

    let entries = fetcher
        .fetch("https://news.example/politik.rss")
        .await
        .expect("rss parse ok");

    assert_eq!(entries.len(), 4, "malformed entries are kept for the normalizer");
    assert_eq!(entries[0].id.as_deref(), Some("news-1001"));
    assert_eq!(entries[0].categories, vec!["Politik", "Brandenburg"]);
    assert_eq!(
        entries[1].title.as_deref(),
        Some("Morning briefing - what matters today")
    );
    assert!(entries[3].title.is_none(), "empty <title/> stays empty");
}

#[test]
fn atom_fixture_prefers_alternate_link_and_decodes_title() {
    let entries = parse_feed(TECH_ATOM).expect("atom parse ok");
    assert_eq!(entries.len(), 2);

    assert_eq!(entries[0].link.as_deref(), Some("https://tech.example/posts/rust-148"));
    assert_eq!(entries[0].title.as_deref(), Some("Rust 1.48 & friends"));
    assert_eq!(entries[0].id.as_deref(), Some("urn:tech:1"));
    assert_eq!(entries[0].categories, vec!["Rust", "Releases"]);

    assert_eq!(entries[1].link.as_deref(), Some("https://tech.example/posts/kernel"));
    assert!(entries[1].categories.is_empty());
}

#[tokio::test]
async fn unknown_url_and_registered_failure_are_errors() {
    let fetcher = StaticFeedFetcher::new();
    assert!(fetcher.fetch("https://nowhere.example/rss").await.is_err());

    fetcher.set_failure("https://down.example/rss", "503");
    let err = fetcher.fetch("https://down.example/rss").await.unwrap_err();
    assert!(err.to_string().contains("503"));
}
