// src/ingest/mod.rs
pub mod atom;
pub mod config;
pub mod providers;
pub mod types;

use crate::ingest::types::FeedEntry;
use metrics::{counter, describe_counter, describe_gauge, describe_histogram};
use once_cell::sync::OnceCell;
use std::collections::HashSet;

/// One-time metrics registration (so series show up on /metrics).
pub(crate) fn ensure_metrics_described() {
    static ONCE: OnceCell<()> = OnceCell::new();
    ONCE.get_or_init(|| {
        describe_counter!("feed_polls_total", "Poll cycles started.");
        describe_counter!(
            "feed_not_modified_total",
            "Poll cycles answered with 304 Not Modified."
        );
        describe_counter!(
            "feed_poll_errors_total",
            "Poll cycles aborted by a fetch/parse error."
        );
        describe_counter!(
            "feed_entries_parsed_total",
            "Entries parsed from fetched documents."
        );
        describe_counter!(
            "feed_entries_new_total",
            "Entries not seen in any earlier cycle."
        );
        describe_counter!(
            "feed_notifications_total",
            "Notifications handed to the sink."
        );
        describe_histogram!("feed_parse_ms", "Atom parse time in milliseconds.");
        describe_gauge!("feed_seen_keys", "Identity keys remembered so far.");
        describe_gauge!("feed_last_poll_ts", "Unix ts of the last finished poll.");
    });
}

/// Normalize entry body text: drop markup, `&nbsp;` → space, collapse whitespace, trim.
pub fn normalize_text(s: &str) -> String {
    // 1) Tags become a space so "a<br>b" stays two words
    static RE_TAGS: OnceCell<regex::Regex> = OnceCell::new();
    let re_tags = RE_TAGS.get_or_init(|| regex::Regex::new(r"<[^>]+>").unwrap());
    let out = re_tags.replace_all(s, " ");

    // 2) Only the literal nbsp entity; other entities are left as written
    let out = out.replace("&nbsp;", " ");

    // 3) Collapse whitespace (Unicode-aware, so U+00A0 folds too)
    static RE_WS: OnceCell<regex::Regex> = OnceCell::new();
    let re_ws = RE_WS.get_or_init(|| regex::Regex::new(r"\s+").unwrap());
    re_ws.replace_all(&out, " ").trim().to_string()
}

/// Keep only entries whose identity key has not been seen yet, recording the
/// new keys in `seen`.
///
/// `entries` must already be oldest-first: a key that appears twice in one
/// batch is reported at its first (oldest) position only.
pub fn filter_new(entries: Vec<FeedEntry>, seen: &mut HashSet<String>) -> Vec<FeedEntry> {
    let fresh: Vec<FeedEntry> = entries
        .into_iter()
        .filter(|e| seen.insert(e.identity_key()))
        .collect();

    counter!("feed_entries_new_total").increment(fresh.len() as u64);
    fresh
}

/// Feed order is newest-first; the pipeline works oldest-first.
pub fn into_chronological(mut entries: Vec<FeedEntry>) -> Vec<FeedEntry> {
    entries.reverse();
    entries
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
    fn normalize_text_strips_tags_and_nbsp() {
        assert_eq!(normalize_text("<b>Hi</b>&nbsp;there"), "Hi there");
        assert_eq!(normalize_text("  line1\n\n<br/>line2\t "), "line1 line2");
    }

    #[test]
    fn normalize_text_keeps_other_entities_and_bare_brackets() {
        assert_eq!(normalize_text("a &amp; b <> c"), "a &amp; b <> c");
    }

    #[test]
    fn duplicate_key_within_one_batch_reported_once() {
        let mut seen = HashSet::new();
        let out = filter_new(vec![entry("a", "1"), entry("a", "1")], &mut seen);
        assert_eq!(out.len(), 1);
        assert_eq!(seen.len(), 1);
    }

    #[test]
    fn empty_keys_collapse_to_a_single_report() {
        let mut seen = HashSet::new();
        let first = filter_new(vec![entry("", ""), entry("", "")], &mut seen);
        assert_eq!(first.len(), 1);
        let later = filter_new(vec![entry("", "")], &mut seen);
        assert!(later.is_empty());
    }

    #[test]
    fn chronological_reverses_feed_order() {
        let out = into_chronological(vec![entry("new", "2"), entry("old", "1")]);
        assert_eq!(out[0].id, "old");
        assert_eq!(out[1].id, "new");
    }
}
