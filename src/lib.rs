// src/lib.rs
// Public library surface for the binary and integration tests.

pub mod classify;
pub mod ingest;
pub mod metrics;
pub mod notify;
pub mod watcher;

// ---- Re-exports for stable public API ----
pub use crate::classify::{classify, Classification, ProductClassifier, ProductPattern};
pub use crate::ingest::config::WatcherConfig;
pub use crate::ingest::types::{FeedEntry, FeedSource, FetchOutcome, Validators};
pub use crate::notify::{Notification, Notifier, StdoutNotifier};
pub use crate::watcher::{CycleReport, Watcher, WatcherState};

use anyhow::Result;
use crate::ingest::providers::{atom_http::AtomHttpProvider, file::FileFeedProvider};

/// Pick the provider for `cfg.feed_url`: `file://` reads from disk, anything
/// else goes over HTTP with the configured timeout.
pub fn build_source(cfg: &WatcherConfig) -> Result<Box<dyn FeedSource>> {
    if let Some(p) = FileFeedProvider::from_url(&cfg.feed_url) {
        return Ok(Box::new(p));
    }
    Ok(Box::new(AtomHttpProvider::new(
        cfg.feed_url.clone(),
        cfg.request_timeout(),
    )?))
}

/// Wire a stdout-reporting watcher from config.
pub fn build_watcher(cfg: &WatcherConfig) -> Result<Watcher> {
    let source = build_source(cfg)?;
    Ok(Watcher::new(
        source,
        Box::new(StdoutNotifier),
        cfg.classifier(),
        cfg.poll_interval(),
    )
    .with_initial_backlog_suppressed(cfg.suppress_initial_backlog))
}
