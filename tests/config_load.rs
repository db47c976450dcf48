// tests/config_load.rs
use feed_herald::config::{load_default, load_from, ENV_CONFIG_PATH};
use feed_herald::config::feeds::{ENV_INTERVAL_SECS, ENV_RETENTION_HOURS};
use std::{env, fs};

fn clear_env() {
    env::remove_var(ENV_CONFIG_PATH);
    env::remove_var(ENV_INTERVAL_SECS);
    env::remove_var(ENV_RETENTION_HOURS);
}

#[test]
fn parse_toml_json_and_legacy_paths() {
    let dir = tempfile::tempdir().unwrap();

    let p_toml = dir.path().join("feeds.toml");
    fs::write(
        &p_toml,
        r#"
interval_secs = 30
retention_hours = 48
block_terms = [" News ", "", "zett"]
status_addr = "127.0.0.1:8080"

[enrichment]
full_view_pattern = 'href="([^"]+\?view=all)"'

[[sources]]
destination = "-100123"
feed_url = " https://news.example/politik.rss "
enrich = true

[[sources]]
destination = "@tech"
feed_url = "https://tech.example/atom.xml"
"#,
    )
    .unwrap();
    let c = load_from(&p_toml).unwrap();
    assert_eq!(c.interval_secs, 30);
    assert_eq!(c.retention_window(), chrono::Duration::hours(48));
    assert_eq!(c.block_terms, vec!["News".to_string(), "zett".to_string()]);
    assert_eq!(c.sources.len(), 2);
    assert_eq!(c.sources[0].feed_url, "https://news.example/politik.rss");
    assert!(c.sources[0].enrich && !c.sources[1].enrich);
    assert!(c.enrichment.full_view_pattern.is_some());
    assert!(!c.enrichment.paywall_markers.is_empty());
    assert_eq!(c.delivery.max_retries, 3);

    let p_legacy = dir.path().join("channels.json");
    fs::write(
        &p_legacy,
        r#"[{"chatId": -1001234, "rssUrl": "https://a/rss"}, {"chatId": "@b", "rssUrl": "https://b/rss"}]"#,
    )
    .unwrap();
    let l = load_from(&p_legacy).unwrap();
    assert_eq!(l.sources[0].destination, "-1001234");
    assert_eq!(l.sources[1].destination, "@b");
    assert_eq!(l.retention_hours, 300);

    let p_bad = dir.path().join("empty.json");
    fs::write(&p_bad, r#"{"sources": []}"#).unwrap();
    assert!(load_from(&p_bad).is_err());
}

#[serial_test::serial]
#[test]
fn default_uses_env_then_fallbacks_then_overrides() {
    // Isolate CWD so the repo's own config/ is not picked up.
    let old = env::current_dir().unwrap();
    let tmp = tempfile::tempdir().unwrap();
    env::set_current_dir(tmp.path()).unwrap();
    clear_env();

    // 1) Nothing anywhere → error
    assert!(load_default().is_err());

    // 2) Legacy channels.json in CWD
    fs::write(
        tmp.path().join("channels.json"),
        r#"[{"chatId": 1, "rssUrl": "https://legacy/rss"}]"#,
    )
    .unwrap();
    assert_eq!(load_default().unwrap().sources[0].feed_url, "https://legacy/rss");

    // 3) config/feeds.toml wins over channels.json
    fs::create_dir_all(tmp.path().join("config")).unwrap();
    fs::write(
        tmp.path().join("config/feeds.toml"),
        "[[sources]]\ndestination = \"@t\"\nfeed_url = \"https://toml/rss\"\n",
    )
    .unwrap();
    assert_eq!(load_default().unwrap().sources[0].feed_url, "https://toml/rss");

    // 4) Env path wins, env overrides apply, bad override is ignored
    let p_env = tmp.path().join("other.json");
    fs::write(
        &p_env,
        r#"{"sources": [{"destination": "@e", "feed_url": "https://env/rss"}]}"#,
    )
    .unwrap();
    env::set_var(ENV_CONFIG_PATH, p_env.display().to_string());
    env::set_var(ENV_INTERVAL_SECS, "60");
    env::set_var(ENV_RETENTION_HOURS, "not-a-number");
    let c = load_default().unwrap();
    assert_eq!(c.sources[0].feed_url, "https://env/rss");
    assert_eq!(c.interval_secs, 60);
    assert_eq!(c.retention_hours, 300);

    // 5) Env path pointing nowhere is an error
    env::set_var(ENV_CONFIG_PATH, tmp.path().join("missing.toml").display().to_string());
    assert!(load_default().is_err());

    clear_env();
    env::set_current_dir(&old).unwrap();
}
