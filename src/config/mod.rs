// src/config/mod.rs
//! Configuration loading: TOML or JSON, located via env var + fallbacks.

pub mod feeds;

use anyhow::{anyhow, Context, Result};
use std::fs;
use std::path::{Path, PathBuf};

pub use feeds::{AppConfig, DeliveryConfig, EnrichmentConfig, SourceConfig};

use feeds::LegacyChannel;

pub const ENV_CONFIG_PATH: &str = "FEED_HERALD_CONFIG";

const FALLBACK_PATHS: &[&str] = &["config/feeds.toml", "config/feeds.json", "channels.json"];

/// Load and validate config from an explicit path.
pub fn load_from(path: &Path) -> Result<AppConfig> {
    let content =
        fs::read_to_string(path).with_context(|| format!("reading config from {}", path.display()))?;
    let ext = path
        .extension()
        .and_then(|s| s.to_str())
        .unwrap_or_default()
        .to_ascii_lowercase();
    parse_config(&content, ext.as_str())
        .with_context(|| format!("parsing config {}", path.display()))?
        .validated()
}

/// Load config using env var + fallbacks, then apply env overrides:
/// 1) $FEED_HERALD_CONFIG
/// 2) config/feeds.toml
/// 3) config/feeds.json
/// 4) channels.json (legacy channel list)
pub fn load_default() -> Result<AppConfig> {
    let path = resolve_path()?;
    tracing::info!(path = %path.display(), "loading config");
    load_from(&path)?.with_env_overrides().validated()
}

fn resolve_path() -> Result<PathBuf> {
    if let Ok(p) = std::env::var(ENV_CONFIG_PATH) {
        let pb = PathBuf::from(p);
        if pb.exists() {
            return Ok(pb);
        }
        return Err(anyhow!("{ENV_CONFIG_PATH} points to non-existent path"));
    }
    FALLBACK_PATHS
        .iter()
        .map(PathBuf::from)
        .find(|p| p.exists())
        .ok_or_else(|| anyhow!("no config found (tried {})", FALLBACK_PATHS.join(", ")))
}

fn parse_config(s: &str, hint_ext: &str) -> Result<AppConfig> {
    // Legacy files are a bare JSON array.
    if s.trim_start().starts_with('[') {
        return parse_legacy(s);
    }
    let try_toml = hint_ext == "toml" || !s.trim_start().starts_with('{');
    if try_toml {
        return toml::from_str(s).context("invalid TOML config");
    }
    serde_json::from_str(s).context("invalid JSON config")
}

fn parse_legacy(s: &str) -> Result<AppConfig> {
    let channels: Vec<LegacyChannel> =
        serde_json::from_str(s).context("invalid legacy channel list")?;
    Ok(AppConfig::with_sources(
        channels.into_iter().map(SourceConfig::from).collect(),
    ))
}
