// src/enrich.rs
//! Optional per-source page classification (paywall marker, full-view
//! variant). The dispatch filter only sees [`Classification`].

use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use regex::Regex;
use reqwest::{Client, Url};
use serde::Serialize;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Classification {
    pub paywalled: bool,
    pub full_view_url: Option<String>,
}

impl Classification {
    pub fn full_view_available(&self) -> bool {
        self.full_view_url.is_some()
    }
}

#[async_trait]
pub trait Classifier: Send + Sync {
    async fn classify(&self, url: &str) -> Result<Classification>;
}

/// Markers commonly present on paywalled article pages.
pub fn default_paywall_markers() -> Vec<String> {
    vec![
        r#""isAccessibleForFree":false"#.to_string(),
        r#""isAccessibleForFree": false"#.to_string(),
        "data-paywall".to_string(),
    ]
}

/// Fetches the linked page and scans its HTML.
pub struct HttpClassifier {
    client: Client,
    timeout: Duration,
    paywall_markers: Vec<String>,
    full_view: Option<Regex>,
}

impl HttpClassifier {
    /// `full_view_pattern` must contain one capture group holding the URL.
    pub fn new(paywall_markers: Vec<String>, full_view_pattern: Option<&str>) -> Result<Self> {
        let full_view = full_view_pattern
            .map(Regex::new)
            .transpose()
            .context("compiling full_view_pattern")?;
        Ok(Self {
            client: Client::new(),
            timeout: Duration::from_secs(10),
            paywall_markers,
            full_view,
        })
    }

    pub fn with_timeout(mut self, secs: u64) -> Self {
        self.timeout = Duration::from_secs(secs);
        self
    }

    /// Classification of an already fetched page body.
    pub fn classify_html(&self, page_url: &str, html: &str) -> Classification {
        let paywalled = self
            .paywall_markers
            .iter()
            .any(|m| !m.is_empty() && html.contains(m.as_str()));

        let full_view_url = self
            .full_view
            .as_ref()
            .and_then(|re| re.captures(html))
            .and_then(|caps| caps.get(1))
            .map(|m| html_escape::decode_html_entities(m.as_str()).to_string())
            .and_then(|href| resolve(page_url, &href));

        Classification {
            paywalled,
            full_view_url,
        }
    }
}

fn resolve(base: &str, href: &str) -> Option<String> {
    match Url::parse(href) {
        Ok(u) => Some(u.to_string()),
        Err(_) => Url::parse(base)
            .ok()
            .and_then(|b| b.join(href).ok())
            .map(|u| u.to_string()),
    }
}

#[async_trait]
impl Classifier for HttpClassifier {
    async fn classify(&self, url: &str) -> Result<Classification> {
        let html = self
            .client
            .get(url)
            .timeout(self.timeout)
            .send()
            .await
            .with_context(|| format!("classify http get {url}"))?
            .error_for_status()
            .context("classify non-2xx")?
            .text()
            .await
            .context("classify .text()")?;
        Ok(self.classify_html(url, &html))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn classifier() -> HttpClassifier {
        HttpClassifier::new(
            default_paywall_markers(),
            Some(r#"<a[^>]+class="full-view"[^>]+href="([^"]+)""#),
        )
        .unwrap()
    }

    #[test]
    fn detects_paywall_marker() {
        let html = r#"<script type="application/ld+json">{"isAccessibleForFree":false}</script>"#;
        let c = classifier().classify_html("https://news.example/a", html);
        assert!(c.paywalled);
        assert!(!c.full_view_available());
    }

    #[test]
    fn resolves_relative_full_view_link() {
        let html = r#"<a id="x" class="full-view" href="/a/full?page=all&amp;x=1">all</a>"#;
        let c = classifier().classify_html("https://news.example/politik/a.html", html);
        assert!(!c.paywalled);
        assert_eq!(
            c.full_view_url.as_deref(),
            Some("https://news.example/a/full?page=all&x=1")
        );
    }

    #[test]
    fn bad_pattern_is_rejected() {
        assert!(HttpClassifier::new(vec![], Some("(unclosed")).is_err());
    }
}
