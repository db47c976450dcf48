// src/dispatch.rs
//! Per-item forward/suppress decision and MarkdownV2 message rendering.
//!
//! Category blocking is a substring test on the *escaped* category line,
//! so a block term containing a markup character (`.`, `-`, ...) only ever
//! matches its escaped form.

use metrics::counter;
use serde::Serialize;

use crate::enrich::Classifier;
use crate::ingest::{strip_query, Item};

/// Default block terms (news digests).
pub fn default_block_terms() -> Vec<String> {
    vec!["News".to_string(), "zett".to_string()]
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SuppressReason {
    CategoryBlocked,
    Paywalled,
}

impl SuppressReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            SuppressReason::CategoryBlocked => "category_blocked",
            SuppressReason::Paywalled => "paywalled",
        }
    }
}

/// Everything the notifier needs; title and categories are already escaped.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Forward {
    pub title: String,
    pub categories: String,
    pub link: String,
}

impl Forward {
    /// `*title*`, `_categories_`, blank line, link.
    pub fn render(&self) -> String {
        format!(
            "*{}*\n_{}_\n\n{}",
            self.title,
            self.categories,
            escape_markdown(&self.link)
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decision {
    Forward(Forward),
    Suppress(SuppressReason),
}

const MARKDOWN_V2_SPECIAL: &[char] = &[
    '\\', '_', '*', '[', ']', '(', ')', '~', '`', '>', '#', '+', '-', '=', '|', '{', '}', '.', '!',
];

/// Backslash-escape Telegram MarkdownV2 structural characters.
pub fn escape_markdown(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 8);
    for ch in s.chars() {
        if MARKDOWN_V2_SPECIAL.contains(&ch) {
            out.push('\\');
        }
        out.push(ch);
    }
    out
}

/// Categories joined with `", "`, then escaped.
pub fn render_categories(categories: &[String]) -> String {
    escape_markdown(&categories.join(", "))
}

#[derive(Debug, Clone)]
pub struct DispatchFilter {
    block_terms: Vec<String>,
}

impl DispatchFilter {
    pub fn new(block_terms: Vec<String>) -> Self {
        let block_terms = block_terms.into_iter().filter(|t| !t.is_empty()).collect();
        Self { block_terms }
    }

    pub fn block_terms(&self) -> &[String] {
        &self.block_terms
    }

    /// Synchronous part of the decision: render and test categories.
    pub fn check_categories(&self, item: &Item) -> Result<String, SuppressReason> {
        let rendered = render_categories(&item.categories);
        if self
            .block_terms
            .iter()
            .any(|term| rendered.contains(term.as_str()))
        {
            return Err(SuppressReason::CategoryBlocked);
        }
        Ok(rendered)
    }

    /// Decide whether `item` is forwarded. `classifier` is passed only for
    /// sources with enrichment enabled. A classification failure never
    /// suppresses; only a positive paywall signal does.
    pub async fn decide(&self, item: &Item, classifier: Option<&dyn Classifier>) -> Decision {
        let categories = match self.check_categories(item) {
            Ok(c) => c,
            Err(reason) => return Decision::Suppress(reason),
        };

        let mut link = strip_query(&item.link).to_string();

        if let Some(classifier) = classifier {
            match classifier.classify(&item.link).await {
                Ok(c) if c.paywalled => return Decision::Suppress(SuppressReason::Paywalled),
                Ok(c) => {
                    if let Some(full) = c.full_view_url {
                        link = full;
                    }
                }
                Err(e) => {
                    tracing::warn!(target: "dispatch", error = ?e, link = %item.link, "classification failed; forwarding unenriched");
                    counter!("feed_enrich_errors_total").increment(1);
                }
            }
        }

        Decision::Forward(Forward {
            title: escape_markdown(&item.title),
            categories,
            link,
        })
    }
}

impl Default for DispatchFilter {
    fn default() -> Self {
        Self::new(default_block_terms())
    }
}
