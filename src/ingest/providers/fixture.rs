// src/ingest/providers/fixture.rs
use std::collections::HashMap;

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use parking_lot::RwLock;

use crate::ingest::rss::parse_feed;
use crate::ingest::types::{FeedFetcher, RawEntry};

#[derive(Debug, Clone)]
enum Fixture {
    Xml(String),
    Entries(Vec<RawEntry>),
    Failure(String),
}

/// In-memory fetcher keyed by feed URL. Fixtures can be swapped between
/// polls to simulate a feed changing over time.
#[derive(Debug, Default)]
pub struct StaticFeedFetcher {
    feeds: RwLock<HashMap<String, Fixture>>,
}

impl StaticFeedFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_xml(&self, url: &str, xml: &str) {
        self.feeds
            .write()
            .insert(url.to_string(), Fixture::Xml(xml.to_string()));
    }

    pub fn set_entries(&self, url: &str, entries: Vec<RawEntry>) {
        self.feeds
            .write()
            .insert(url.to_string(), Fixture::Entries(entries));
    }

    pub fn set_failure(&self, url: &str, msg: &str) {
        self.feeds
            .write()
            .insert(url.to_string(), Fixture::Failure(msg.to_string()));
    }
}

#[async_trait]
impl FeedFetcher for StaticFeedFetcher {
    async fn fetch(&self, url: &str) -> Result<Vec<RawEntry>> {
        let fixture = self.feeds.read().get(url).cloned();
        match fixture {
            Some(Fixture::Xml(xml)) => parse_feed(&xml),
            Some(Fixture::Entries(v)) => Ok(v),
            Some(Fixture::Failure(msg)) => Err(anyhow!("fixture failure for {url}: {msg}")),
            None => Err(anyhow!("no fixture registered for {url}")),
        }
    }
}
