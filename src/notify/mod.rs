// src/notify/mod.rs
pub mod stdout;

use anyhow::Result;
use chrono::{DateTime, Local};

pub use stdout::{render_notification, StdoutNotifier};

/// One classified, previously unseen status entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub label: String,   // product, e.g. "OpenAI API - Embeddings"
    pub message: String, // normalized body, or title when the body is empty
    pub ts: DateTime<Local>,
}

#[async_trait::async_trait]
pub trait Notifier: Send + Sync {
    async fn send(&self, n: &Notification) -> Result<()>;
}
