use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use reqwest::header::{
    HeaderMap, HeaderName, ETAG, IF_MODIFIED_SINCE, IF_NONE_MATCH, LAST_MODIFIED,
};
use reqwest::{Client, StatusCode};
use std::time::Duration;

use crate::ingest::types::{FeedSource, FetchOutcome, Validators};

const USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"));

/// Conditional-GET fetcher for a single Atom endpoint.
///
/// Holds no validator state of its own: the caller passes the last known
/// validators in and stores whatever comes back.
pub struct AtomHttpProvider {
    url: String,
    client: Client,
}

impl AtomHttpProvider {
    pub fn new(url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(USER_AGENT)
            .build()
            .context("building feed http client")?;
        Ok(Self {
            url: url.into(),
            client,
        })
    }
}

fn header_value(headers: &HeaderMap, name: HeaderName) -> Option<String> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
}

#[async_trait]
impl FeedSource for AtomHttpProvider {
    async fn fetch_if_changed(&self, validators: &Validators) -> Result<FetchOutcome> {
        let mut req = self.client.get(&self.url);
        if let Some(etag) = validators.etag.as_deref() {
            req = req.header(IF_NONE_MATCH, etag);
        }
        if let Some(modified) = validators.last_modified.as_deref() {
            req = req.header(IF_MODIFIED_SINCE, modified);
        }

        let resp = req.send().await.context("feed http get()")?;
        if resp.status() == StatusCode::NOT_MODIFIED {
            tracing::debug!(url = %self.url, "feed not modified");
            return Ok(FetchOutcome::NotModified);
        }

        // Redirects reqwest could not follow also land here.
        if !resp.status().is_success() {
            bail!("feed http non-2xx: {}", resp.status());
        }
        let headers = resp.headers();
        let next = Validators {
            etag: header_value(headers, ETAG).or_else(|| validators.etag.clone()),
            last_modified: header_value(headers, LAST_MODIFIED)
                .or_else(|| validators.last_modified.clone()),
        };
        let body = resp.text().await.context("feed http .text()")?;

        Ok(FetchOutcome::Modified {
            validators: next,
            body,
        })
    }

    fn endpoint(&self) -> &str {
        &self.url
    }
}
