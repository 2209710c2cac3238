//! Product classifier: maps an entry's title/body to a product label.
//!
//! The pattern table is an ordered list scanned top to bottom; the first needle
//! found (case-insensitive substring) wins. More specific needles therefore sit
//! above general ones ("chat/completions" before "openai api"). When nothing in
//! the table hits but the text mentions "api" at all, the generic fallback
//! label is used.

use serde::Deserialize;

/// Generic label for API incidents that match no specific product.
pub const DEFAULT_FALLBACK_LABEL: &str = "OpenAI API";

const FALLBACK_NEEDLE: &str = "api";

const DEFAULT_PATTERNS: &[(&str, &str)] = &[
    ("chat/completions", "OpenAI API - Chat Completions"),
    ("chat completions", "OpenAI API - Chat Completions"),
    ("responses api", "OpenAI API - Responses"),
    ("assistants api", "OpenAI API - Assistants"),
    ("realtime api", "OpenAI API - Realtime"),
    ("files api", "OpenAI API - Files"),
    ("file api", "OpenAI API - Files"),
    ("embeddings api", "OpenAI API - Embeddings"),
    ("embeddings", "OpenAI API - Embeddings"),
    ("fine-tuning api", "OpenAI API - Fine-tuning"),
    ("fine tuning api", "OpenAI API - Fine-tuning"),
    ("openai api", "OpenAI API"),
];

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ProductPattern {
    pub needle: String,
    pub label: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Classification {
    pub label: String,
    pub message: String,
}

#[derive(Debug, Clone)]
pub struct ProductClassifier {
    patterns: Vec<ProductPattern>,
    fallback_label: String,
}

impl Default for ProductClassifier {
    fn default() -> Self {
        let patterns = DEFAULT_PATTERNS
            .iter()
            .map(|(needle, label)| ProductPattern {
                needle: (*needle).to_string(),
                label: (*label).to_string(),
            })
            .collect();
        Self::new(patterns, DEFAULT_FALLBACK_LABEL)
    }
}

impl ProductClassifier {
    /// Build from an ordered table. Needles are trimmed and lowercased; blank
    /// needles are dropped since they would match every entry.
    pub fn new(patterns: Vec<ProductPattern>, fallback_label: impl Into<String>) -> Self {
        let patterns = patterns
            .into_iter()
            .filter_map(|p| {
                let needle = p.needle.trim().to_lowercase();
                (!needle.is_empty()).then(|| ProductPattern {
                    needle,
                    label: p.label.trim().to_string(),
                })
            })
            .collect();
        Self {
            patterns,
            fallback_label: fallback_label.into(),
        }
    }

    pub fn patterns(&self) -> &[ProductPattern] {
        &self.patterns
    }

    /// `body` is expected to be normalized already.
    pub fn classify(&self, title: &str, body: &str) -> Option<Classification> {
        let haystack = format!("{title} {body}").to_lowercase();

        let label = self
            .patterns
            .iter()
            .find(|p| haystack.contains(p.needle.as_str()))
            .map(|p| p.label.as_str())
            .or_else(|| {
                haystack
                    .contains(FALLBACK_NEEDLE)
                    .then_some(self.fallback_label.as_str())
            })?;

        let message = match body.trim() {
            "" => title.trim(),
            b => b,
        };

        Some(Classification {
            label: label.to_string(),
            message: message.to_string(),
        })
    }
}

/// Classify with the built-in table.
pub fn classify(title: &str, body: &str) -> Option<Classification> {
    static DEFAULT: once_cell::sync::Lazy<ProductClassifier> =
        once_cell::sync::Lazy::new(ProductClassifier::default);
    DEFAULT.classify(title, body)
}
