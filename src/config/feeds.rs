// src/config/feeds.rs
use anyhow::{bail, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use crate::dispatch::default_block_terms;
use crate::enrich::default_paywall_markers;
use crate::retention::DEFAULT_RETENTION_HOURS;

pub const ENV_INTERVAL_SECS: &str = "FEED_HERALD_INTERVAL_SECS";
pub const ENV_RETENTION_HOURS: &str = "FEED_HERALD_RETENTION_HOURS";

/// Ten years; far beyond any useful window and well inside `chrono::Duration`.
pub const MAX_RETENTION_HOURS: i64 = 24 * 365 * 10;
pub const MAX_DELIVERY_RETRIES: u8 = 10;

fn default_interval_secs() -> u64 {
    5
}
fn default_retention_hours() -> i64 {
    DEFAULT_RETENTION_HOURS
}
fn default_concurrency() -> usize {
    1
}
fn default_fetch_timeout_secs() -> u64 {
    15
}
fn default_enrich_timeout_secs() -> u64 {
    10
}
fn default_delivery_retries() -> u8 {
    3
}
fn default_delivery_timeout_secs() -> u64 {
    5
}

/// One feed to poll and where its new entries go.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceConfig {
    pub destination: String,
    pub feed_url: String,
    /// Run page classification before forwarding.
    #[serde(default)]
    pub enrich: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnrichmentConfig {
    #[serde(default = "default_paywall_markers")]
    pub paywall_markers: Vec<String>,
    /// Regex whose first capture group is the full-view URL.
    #[serde(default)]
    pub full_view_pattern: Option<String>,
    #[serde(default = "default_enrich_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for EnrichmentConfig {
    fn default() -> Self {
        Self {
            paywall_markers: default_paywall_markers(),
            full_view_pattern: None,
            timeout_secs: default_enrich_timeout_secs(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeliveryConfig {
    #[serde(default = "default_delivery_retries")]
    pub max_retries: u8,
    #[serde(default = "default_delivery_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for DeliveryConfig {
    fn default() -> Self {
        Self {
            max_retries: default_delivery_retries(),
            timeout_secs: default_delivery_timeout_secs(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default = "default_interval_secs")]
    pub interval_secs: u64,
    #[serde(default = "default_retention_hours")]
    pub retention_hours: i64,
    #[serde(default = "default_block_terms")]
    pub block_terms: Vec<String>,
    /// Sources processed in parallel per tick; 1 means sequential.
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,
    #[serde(default = "default_fetch_timeout_secs")]
    pub fetch_timeout_secs: u64,
    /// Bind address of the HTTP status surface, e.g. `127.0.0.1:8080`.
    #[serde(default)]
    pub status_addr: Option<String>,
    #[serde(default)]
    pub enrichment: EnrichmentConfig,
    #[serde(default)]
    pub delivery: DeliveryConfig,
    #[serde(default)]
    pub sources: Vec<SourceConfig>,
}

impl AppConfig {
    /// Config with defaults for everything but the sources.
    pub fn with_sources(sources: Vec<SourceConfig>) -> Self {
        Self {
            interval_secs: default_interval_secs(),
            retention_hours: default_retention_hours(),
            block_terms: default_block_terms(),
            concurrency: default_concurrency(),
            fetch_timeout_secs: default_fetch_timeout_secs(),
            status_addr: None,
            enrichment: EnrichmentConfig::default(),
            delivery: DeliveryConfig::default(),
            sources,
        }
    }

    pub fn retention_window(&self) -> chrono::Duration {
        chrono::Duration::hours(self.retention_hours)
    }

    pub fn interval(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.interval_secs)
    }

    /// Trim/dedup lists and reject unusable values.
    pub fn validated(mut self) -> Result<Self> {
        if self.interval_secs == 0 {
            bail!("interval_secs must be > 0");
        }
        if self.retention_hours <= 0 || self.retention_hours > MAX_RETENTION_HOURS {
            bail!(
                "retention_hours must be in 1..={MAX_RETENTION_HOURS}, got {}",
                self.retention_hours
            );
        }
        if self.delivery.max_retries > MAX_DELIVERY_RETRIES {
            bail!(
                "delivery.max_retries must be <= {MAX_DELIVERY_RETRIES}, got {}",
                self.delivery.max_retries
            );
        }
        if self.sources.is_empty() {
            bail!("no sources configured");
        }
        for (i, s) in self.sources.iter_mut().enumerate() {
            s.destination = s.destination.trim().to_string();
            s.feed_url = s.feed_url.trim().to_string();
            if s.destination.is_empty() || s.feed_url.is_empty() {
                bail!("source #{i} needs a destination and a feed_url");
            }
        }
        self.block_terms = clean_list(std::mem::take(&mut self.block_terms));
        self.concurrency = self.concurrency.max(1);
        Ok(self)
    }

    /// Apply `FEED_HERALD_*` overrides. Unparseable values are logged and ignored.
    pub fn with_env_overrides(mut self) -> Self {
        if let Some(v) = env_parse::<u64>(ENV_INTERVAL_SECS) {
            self.interval_secs = v;
        }
        if let Some(v) = env_parse::<i64>(ENV_RETENTION_HOURS) {
            self.retention_hours = v;
        }
        self
    }
}

fn env_parse<T: std::str::FromStr>(key: &str) -> Option<T> {
    let raw = std::env::var(key).ok()?;
    match raw.trim().parse::<T>() {
        Ok(v) => Some(v),
        Err(_) => {
            tracing::warn!(key, value = %raw, "ignoring unparseable env override");
            None
        }
    }
}

/// Trimmed, non-empty, de-duplicated; first occurrence wins.
fn clean_list(items: Vec<String>) -> Vec<String> {
    let mut seen = BTreeSet::new();
    items
        .into_iter()
        .map(|it| it.trim().to_string())
        .filter(|t| !t.is_empty() && seen.insert(t.clone()))
        .collect()
}

/// `channels.json` of the first deployment: `[{"chatId": .., "rssUrl": ..}]`.
#[derive(Debug, Deserialize)]
pub(crate) struct LegacyChannel {
    #[serde(rename = "chatId")]
    chat_id: ChatId,
    #[serde(rename = "rssUrl")]
    rss_url: String,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ChatId {
    Num(i64),
    Str(String),
}

impl From<LegacyChannel> for SourceConfig {
    fn from(c: LegacyChannel) -> Self {
        let destination = match c.chat_id {
            ChatId::Num(n) => n.to_string(),
            ChatId::Str(s) => s,
        };
        SourceConfig {
            destination,
            feed_url: c.rss_url,
            enrich: false,
        }
    }
}
