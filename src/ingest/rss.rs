// src/ingest/rss.rs
//! RSS 2.0 / RSS 1.0 (RDF) / Atom body parsing into [`RawEntry`] lists.
//!
//! The root element picks the format. Anything else (an HTML error page
//! served with 200, a truncated body) is an error, never an empty feed.

use anyhow::{anyhow, bail, Context, Result};
use metrics::{counter, histogram};
use quick_xml::de::from_str;
use quick_xml::events::Event;
use quick_xml::Reader;
use serde::Deserialize;

use crate::ingest::types::RawEntry;

#[derive(Debug, Deserialize)]
struct Rss {
    channel: Channel,
}

#[derive(Debug, Deserialize)]
struct Channel {
    #[serde(default, rename = "item")]
    item: Vec<RssItem>,
}

/// RSS 1.0: items are siblings of `channel` under `rdf:RDF`.
#[derive(Debug, Deserialize)]
struct Rdf {
    #[serde(default, rename = "item")]
    item: Vec<RssItem>,
}

// Namespaced extensions (`atom:link`, `media:title`) arrive under the same
// local name, so every text field is a list and the first non-empty wins.
#[derive(Debug, Deserialize)]
struct RssItem {
    #[serde(default, rename = "title")]
    title: Vec<Text>,
    #[serde(default, rename = "link")]
    link: Vec<Text>,
    #[serde(default, rename = "guid")]
    guid: Vec<Text>,
    #[serde(default, rename = "category")]
    category: Vec<Text>,
}

#[derive(Debug, Deserialize)]
struct AtomFeed {
    #[serde(default, rename = "entry")]
    entry: Vec<AtomEntry>,
}

#[derive(Debug, Deserialize)]
struct AtomEntry {
    #[serde(default, rename = "title")]
    title: Vec<Text>,
    #[serde(default, rename = "link")]
    link: Vec<AtomLink>,
    #[serde(default, rename = "id")]
    id: Vec<Text>,
    #[serde(default, rename = "category")]
    category: Vec<AtomCategory>,
}

#[derive(Debug, Deserialize)]
struct AtomLink {
    #[serde(rename = "@href")]
    href: Option<String>,
    #[serde(rename = "@rel")]
    rel: Option<String>,
}

#[derive(Debug, Deserialize)]
struct AtomCategory {
    #[serde(rename = "@term")]
    term: Option<String>,
}

/// Element text; attributes such as `isPermaLink` or `type` are ignored.
#[derive(Debug, Deserialize)]
struct Text {
    #[serde(rename = "$text", default)]
    value: Option<String>,
}

impl Text {
    fn into_trimmed(self) -> Option<String> {
        self.value
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
    }
}

fn first_text(values: Vec<Text>) -> Option<String> {
    values.into_iter().find_map(Text::into_trimmed)
}

/// Local name of the document element, e.g. `rss`, `feed`, `RDF`.
fn root_element(xml: &str) -> Result<String> {
    let mut reader = Reader::from_str(xml);
    loop {
        match reader.read_event().context("reading feed xml")? {
            Event::Start(e) | Event::Empty(e) => {
                return Ok(String::from_utf8_lossy(e.local_name().as_ref()).into_owned());
            }
            Event::Eof => bail!("feed body has no root element"),
            _ => {}
        }
    }
}

/// Parse a feed body.
pub fn parse_feed(body: &str) -> Result<Vec<RawEntry>> {
    let t0 = std::time::Instant::now();
    let xml_clean = scrub_html_entities_for_xml(body);

    let out: Vec<RawEntry> = match root_element(&xml_clean)?.as_str() {
        "rss" => {
            let rss: Rss = from_str(&xml_clean).context("parsing rss 2.0 feed")?;
            rss.channel.item.into_iter().map(from_rss_item).collect()
        }
        "RDF" => {
            let rdf: Rdf = from_str(&xml_clean).context("parsing rss 1.0 feed")?;
            rdf.item.into_iter().map(from_rss_item).collect()
        }
        "feed" => {
            let atom: AtomFeed = from_str(&xml_clean).context("parsing atom feed")?;
            atom.entry.into_iter().map(from_atom_entry).collect()
        }
        other => return Err(anyhow!("not a feed: root element <{other}>")),
    };

    let ms = t0.elapsed().as_secs_f64() * 1_000.0;
    histogram!("feed_parse_ms").record(ms);
    counter!("feed_entries_parsed_total").increment(out.len() as u64);
    Ok(out)
}

fn from_rss_item(it: RssItem) -> RawEntry {
    RawEntry {
        link: first_text(it.link),
        title: first_text(it.title).map(|t| decode_title(&t)),
        id: first_text(it.guid),
        categories: it
            .category
            .into_iter()
            .filter_map(Text::into_trimmed)
            .collect(),
    }
}

fn from_atom_entry(en: AtomEntry) -> RawEntry {
    // Prefer rel="alternate" (or no rel, which means alternate), else first href.
    let link = en
        .link
        .iter()
        .find(|l| matches!(l.rel.as_deref(), None | Some("alternate")))
        .or_else(|| en.link.first())
        .and_then(|l| l.href.as_deref())
        .map(|h| h.trim().to_string())
        .filter(|h| !h.is_empty());

    RawEntry {
        link,
        title: first_text(en.title).map(|t| decode_title(&t)),
        id: first_text(en.id),
        categories: en
            .category
            .into_iter()
            .filter_map(|c| c.term)
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty())
            .collect(),
    }
}

/// Titles frequently arrive double-escaped (`&amp;#8217;`).
fn decode_title(s: &str) -> String {
    html_escape::decode_html_entities(s).trim().to_string()
}

/// HTML entities that are not defined in XML and would break the parser.
fn scrub_html_entities_for_xml(s: &str) -> String {
    s.replace("&nbsp;", " ")
        .replace("&ndash;", "-")
        .replace("&mdash;", "-")
        .replace("&ldquo;", "\"")
        .replace("&rdquo;", "\"")
        .replace("&bdquo;", "\"")
        .replace("&lsquo;", "'")
        .replace("&rsquo;", "'")
        .replace("&hellip;", "...")
}
