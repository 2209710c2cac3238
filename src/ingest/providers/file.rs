use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use std::path::PathBuf;

use crate::ingest::types::{FeedSource, FetchOutcome, Validators};

/// Serves a feed saved on disk (`file://` URLs), for offline runs and replays.
///
/// The file's mtime plays the role of `Last-Modified`: an unchanged mtime is
/// reported as not modified, mirroring the HTTP provider's 304 path.
pub struct FileFeedProvider {
    url: String,
    path: PathBuf,
}

impl FileFeedProvider {
    pub fn from_url(url: &str) -> Option<Self> {
        let path = url.strip_prefix("file://")?;
        Some(Self {
            url: url.to_string(),
            path: PathBuf::from(path),
        })
    }
}

#[async_trait]
impl FeedSource for FileFeedProvider {
    async fn fetch_if_changed(&self, validators: &Validators) -> Result<FetchOutcome> {
        let meta = tokio::fs::metadata(&self.path)
            .await
            .with_context(|| format!("stat feed file {}", self.path.display()))?;
        let stamp = meta
            .modified()
            .ok()
            .map(|t| DateTime::<Utc>::from(t).to_rfc3339_opts(SecondsFormat::Nanos, true));

        if stamp.is_some() && stamp == validators.last_modified {
            return Ok(FetchOutcome::NotModified);
        }

        let body = tokio::fs::read_to_string(&self.path)
            .await
            .with_context(|| format!("reading feed file {}", self.path.display()))?;

        Ok(FetchOutcome::Modified {
            validators: Validators {
                etag: validators.etag.clone(),
                last_modified: stamp.or_else(|| validators.last_modified.clone()),
            },
            body,
        })
    }

    fn endpoint(&self) -> &str {
        &self.url
    }
}
