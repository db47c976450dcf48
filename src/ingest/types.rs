// src/ingest/types.rs
use anyhow::Result;

/// One entry as handed over by a feed fetcher, before normalization.
#[derive(Debug, Clone, Default, serde::Serialize, serde::Deserialize, PartialEq, Eq)]
pub struct RawEntry {
    pub link: Option<String>,
    pub title: Option<String>,
    pub id: Option<String>,
    #[serde(default)]
    pub categories: Vec<String>,
}

impl RawEntry {
    pub fn new(link: &str, title: &str) -> Self {
        Self {
            link: Some(link.to_string()),
            title: Some(title.to_string()),
            id: None,
            categories: Vec::new(),
        }
    }

    pub fn with_id(mut self, id: &str) -> Self {
        self.id = Some(id.to_string());
        self
    }

    pub fn with_categories<I, S>(mut self, cats: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.categories = cats.into_iter().map(Into::into).collect();
        self
    }
}

/// Fetches and parses one feed address into raw entries.
#[async_trait::async_trait]
pub trait FeedFetcher: Send + Sync {
    async fn fetch(&self, url: &str) -> Result<Vec<RawEntry>>;
}
