// src/ingest/types.rs
use anyhow::Result;

/// Separator between `id` and `updated` in an identity key.
pub const KEY_SEPARATOR: char = '|';

/// One `<entry>` of the status feed, built fresh every cycle.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FeedEntry {
    pub id: String,      // may be empty, the feed does not guarantee it
    pub updated: String, // opaque feed timestamp, may be empty
    pub title: String,
    pub summary: Option<String>,
    pub content: Option<String>,
}

impl FeedEntry {
    /// Key used to recognise an entry across polls.
    ///
    /// `id|updated` when both are present, so an edited incident (same id,
    /// newer `updated`) counts as a fresh event. Otherwise whichever half is
    /// present, or `""`; the empty key dedupes like any other, so only the
    /// first fully anonymous entry is ever reported.
    pub fn identity_key(&self) -> String {
        match (self.id.is_empty(), self.updated.is_empty()) {
            (false, false) => format!("{}{}{}", self.id, KEY_SEPARATOR, self.updated),
            (false, true) => self.id.clone(),
            (true, false) => self.updated.clone(),
            (true, true) => String::new(),
        }
    }

    /// Raw (un-normalized) body: summary, then content, then title.
    pub fn body_raw(&self) -> &str {
        [self.summary.as_deref(), self.content.as_deref()]
            .into_iter()
            .flatten()
            .find(|s| !s.is_empty())
            .unwrap_or(&self.title)
    }
}

/// HTTP cache validators remembered from the last successful fetch.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Validators {
    pub etag: Option<String>,
    pub last_modified: Option<String>,
}

/// Result of a conditional fetch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchOutcome {
    /// Server answered 304; keep the current validators.
    NotModified,
    /// Fresh document plus the validators to send next time.
    Modified { validators: Validators, body: String },
}

#[async_trait::async_trait]
pub trait FeedSource: Send + Sync {
    /// Conditionally retrieve the feed. Non-2xx (other than 304) is an error.
    async fn fetch_if_changed(&self, validators: &Validators) -> Result<FetchOutcome>;
    fn endpoint(&self) -> &str;
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(id: &str, updated: &str) -> FeedEntry {
        FeedEntry {
            id: id.into(),
            updated: updated.into(),
            ..Default::default()
        }
    }

    #[test]
    fn identity_key_variants() {
        assert_eq!(entry("a", "t1").identity_key(), "a|t1");
        assert_eq!(entry("a", "").identity_key(), "a");
        assert_eq!(entry("", "t1").identity_key(), "t1");
        assert_eq!(entry("", "").identity_key(), "");
    }

    #[test]
    fn body_prefers_summary_then_content_then_title() {
        let mut e = FeedEntry {
            title: "T".into(),
            summary: Some(String::new()),
            content: Some("C".into()),
            ..Default::default()
        };
        assert_eq!(e.body_raw(), "C");
        e.summary = Some("S".into());
        assert_eq!(e.body_raw(), "S");
        e.summary = None;
        e.content = None;
        assert_eq!(e.body_raw(), "T");
    }
}
