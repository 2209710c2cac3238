// src/ingest/config.rs
use anyhow::{anyhow, bail, Context, Result};
use serde::Deserialize;
use std::fs;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::classify::{ProductClassifier, ProductPattern, DEFAULT_FALLBACK_LABEL};

const ENV_PATH: &str = "STATUS_WATCH_CONFIG";
const ENV_FEED_URL: &str = "STATUS_FEED_URL";
const ENV_INTERVAL: &str = "POLL_INTERVAL_SECS";
const ENV_TIMEOUT: &str = "REQUEST_TIMEOUT_SECS";
const ENV_SUPPRESS: &str = "SUPPRESS_INITIAL_BACKLOG";
const ENV_METRICS_ADDR: &str = "METRICS_ADDR";

pub const DEFAULT_FEED_URL: &str = "https://status.openai.com/history.atom";

fn default_feed_url() -> String {
    DEFAULT_FEED_URL.to_string()
}
fn default_poll_interval_secs() -> u64 {
    60
}
fn default_request_timeout_secs() -> u64 {
    20
}
fn default_fallback_label() -> String {
    DEFAULT_FALLBACK_LABEL.to_string()
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct WatcherConfig {
    #[serde(default = "default_feed_url")]
    pub feed_url: String,
    #[serde(default = "default_poll_interval_secs")]
    pub poll_interval_secs: u64,
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
    /// Mark the first document's entries as seen without printing them.
    #[serde(default)]
    pub suppress_initial_backlog: bool,
    /// Serve Prometheus metrics on this address when set.
    #[serde(default)]
    pub metrics_addr: Option<SocketAddr>,
    #[serde(default = "default_fallback_label")]
    pub fallback_label: String,
    /// Ordered product table; `None` keeps the built-in one.
    #[serde(default)]
    pub patterns: Option<Vec<ProductPattern>>,
}

impl Default for WatcherConfig {
    fn default() -> Self {
        Self {
            feed_url: default_feed_url(),
            poll_interval_secs: default_poll_interval_secs(),
            request_timeout_secs: default_request_timeout_secs(),
            suppress_initial_backlog: false,
            metrics_addr: None,
            fallback_label: default_fallback_label(),
            patterns: None,
        }
    }
}

impl WatcherConfig {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs)
    }

    /// Request timeout, capped one second below the poll interval (min 1s).
    pub fn request_timeout(&self) -> Duration {
        let cap = self.poll_interval_secs.saturating_sub(1).max(1);
        Duration::from_secs(self.request_timeout_secs.clamp(1, cap))
    }

    pub fn classifier(&self) -> ProductClassifier {
        match &self.patterns {
            Some(p) => ProductClassifier::new(p.clone(), self.fallback_label.clone()),
            None => {
                let default = ProductClassifier::default();
                ProductClassifier::new(default.patterns().to_vec(), self.fallback_label.clone())
            }
        }
    }

    fn validate(self) -> Result<Self> {
        if self.poll_interval_secs == 0 {
            bail!("poll_interval_secs must be > 0");
        }
        if self.feed_url.trim().is_empty() {
            bail!("feed_url must not be empty");
        }
        Ok(self)
    }
}

/// Load config from an explicit path (TOML or JSON by extension), then apply env overrides.
pub fn load_config_from(path: &Path) -> Result<WatcherConfig> {
    let cfg = read_file(path)?;
    apply_env(cfg)?.validate()
}

/// Load config using env var + fallbacks:
/// 1) $STATUS_WATCH_CONFIG
/// 2) config/status_watch.toml
/// 3) config/status_watch.json
/// 4) built-in defaults
///
/// Env overrides (`STATUS_FEED_URL`, `POLL_INTERVAL_SECS`, ...) apply last.
pub fn load_config_default() -> Result<WatcherConfig> {
    let base = if let Ok(p) = std::env::var(ENV_PATH) {
        let pb = PathBuf::from(p);
        if !pb.exists() {
            return Err(anyhow!("{ENV_PATH} points to non-existent path"));
        }
        read_file(&pb)?
    } else {
        let toml_p = PathBuf::from("config/status_watch.toml");
        let json_p = PathBuf::from("config/status_watch.json");
        if toml_p.exists() {
            read_file(&toml_p)?
        } else if json_p.exists() {
            read_file(&json_p)?
        } else {
            WatcherConfig::default()
        }
    };
    apply_env(base)?.validate()
}

fn read_file(path: &Path) -> Result<WatcherConfig> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("reading watcher config from {}", path.display()))?;
    let ext = path
        .extension()
        .and_then(|s| s.to_str())
        .unwrap_or_default()
        .to_ascii_lowercase();
    parse_config(&content, &ext).with_context(|| format!("parsing {}", path.display()))
}

fn parse_config(s: &str, hint_ext: &str) -> Result<WatcherConfig> {
    match hint_ext {
        "json" => Ok(serde_json::from_str(s)?),
        _ => Ok(toml::from_str(s)?),
    }
}

fn env_parse<T: std::str::FromStr>(key: &str) -> Result<Option<T>>
where
    T::Err: std::fmt::Display,
{
    match std::env::var(key) {
        Ok(v) if !v.trim().is_empty() => v
            .trim()
            .parse()
            .map(Some)
            .map_err(|e| anyhow!("invalid {key}={v:?}: {e}")),
        _ => Ok(None),
    }
}

fn env_flag(key: &str) -> Option<bool> {
    let v = std::env::var(key).ok()?;
    match v.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

fn apply_env(mut cfg: WatcherConfig) -> Result<WatcherConfig> {
    if let Ok(url) = std::env::var(ENV_FEED_URL) {
        if !url.trim().is_empty() {
            cfg.feed_url = url.trim().to_string();
        }
    }
    if let Some(v) = env_parse(ENV_INTERVAL)? {
        cfg.poll_interval_secs = v;
    }
    if let Some(v) = env_parse(ENV_TIMEOUT)? {
        cfg.request_timeout_secs = v;
    }
    if let Some(v) = env_flag(ENV_SUPPRESS) {
        cfg.suppress_initial_backlog = v;
    }
    if let Some(v) = env_parse(ENV_METRICS_ADDR)? {
        cfg.metrics_addr = Some(v);
    }
    Ok(cfg)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn toml_and_json_formats_work() {
        let toml = r#"
feed_url = "https://status.example.com/history.atom"
poll_interval_secs = 30
patterns = [{ needle = "Sora", label = "Sora" }]
"#;
        let json = r#"{"poll_interval_secs": 15, "suppress_initial_backlog": true}"#;
        let t = parse_config(toml, "toml").unwrap();
        assert_eq!(t.poll_interval_secs, 30);
        assert_eq!(t.request_timeout_secs, 20);
        assert_eq!(t.patterns.as_ref().map(Vec::len), Some(1));
        let j = parse_config(json, "json").unwrap();
        assert_eq!(j.feed_url, DEFAULT_FEED_URL);
        assert!(j.suppress_initial_backlog);
    }

    #[test]
    fn unknown_keys_are_rejected() {
        assert!(parse_config("poll_interval = 5", "toml").is_err());
    }

    #[test]
    fn timeout_stays_below_interval() {
        let cfg = WatcherConfig {
            poll_interval_secs: 10,
            request_timeout_secs: 60,
            ..Default::default()
        };
        assert_eq!(cfg.request_timeout(), Duration::from_secs(9));

        let tiny = WatcherConfig {
            poll_interval_secs: 1,
            request_timeout_secs: 0,
            ..Default::default()
        };
        assert_eq!(tiny.request_timeout(), Duration::from_secs(1));
    }

    #[test]
    fn zero_interval_is_invalid() {
        let cfg = WatcherConfig {
            poll_interval_secs: 0,
            ..Default::default()
        };
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn classifier_uses_configured_fallback() {
        let cfg = WatcherConfig {
            fallback_label: "API (other)".into(),
            ..Default::default()
        };
        let c = cfg.classifier();
        assert_eq!(c.classify("Batch API slow", "").unwrap().label, "API (other)");
        assert_eq!(
            c.classify("Embeddings latency", "").unwrap().label,
            "OpenAI API - Embeddings"
        );
    }
}
