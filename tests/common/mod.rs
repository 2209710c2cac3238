// tests/common/mod.rs
#![allow(dead_code)]

use anyhow::{anyhow, Result};
use parking_lot::Mutex;
use status_feed_watcher::{FeedSource, FetchOutcome, Notification, Notifier, Validators};
use std::collections::VecDeque;
use std::sync::Arc;

/// One scripted answer of [`ScriptedSource`].
pub enum Step {
    Doc { etag: &'static str, body: String },
    NotModified,
    Fail(&'static str),
    /// Never resolves; simulates a hung request.
    Hang,
}

/// Feed source replaying a fixed script; answers `NotModified` once exhausted.
#[derive(Clone, Default)]
pub struct ScriptedSource {
    steps: Arc<Mutex<VecDeque<Step>>>,
    pub requests: Arc<Mutex<Vec<Validators>>>,
}

impl ScriptedSource {
    pub fn new(steps: Vec<Step>) -> Self {
        Self {
            steps: Arc::new(Mutex::new(steps.into())),
            requests: Arc::default(),
        }
    }
}

#[async_trait::async_trait]
impl FeedSource for ScriptedSource {
    async fn fetch_if_changed(&self, validators: &Validators) -> Result<FetchOutcome> {
        self.requests.lock().push(validators.clone());
        let step = self.steps.lock().pop_front();
        match step {
            Some(Step::Doc { etag, body }) => Ok(FetchOutcome::Modified {
                validators: Validators {
                    etag: Some(etag.to_string()),
                    last_modified: validators.last_modified.clone(),
                },
                body,
            }),
            Some(Step::Fail(why)) => Err(anyhow!(why)),
            Some(Step::Hang) => std::future::pending().await,
            Some(Step::NotModified) | None => Ok(FetchOutcome::NotModified),
        }
    }

    fn endpoint(&self) -> &str {
        "scripted://feed"
    }
}

/// Notifier that keeps everything it was asked to send.
#[derive(Clone, Default)]
pub struct CaptureNotifier {
    pub sent: Arc<Mutex<Vec<Notification>>>,
    /// Number of upcoming sends to reject before delivering again.
    pub failures: Arc<Mutex<usize>>,
}

impl CaptureNotifier {
    pub fn failing(times: usize) -> Self {
        Self {
            failures: Arc::new(Mutex::new(times)),
            ..Default::default()
        }
    }

    pub fn pairs(&self) -> Vec<(String, String)> {
        self.sent
            .lock()
            .iter()
            .map(|n| (n.label.clone(), n.message.clone()))
            .collect()
    }
}

#[async_trait::async_trait]
impl Notifier for CaptureNotifier {
    async fn send(&self, n: &Notification) -> Result<()> {
        {
            let mut left = self.failures.lock();
            if *left > 0 {
                *left -= 1;
                return Err(anyhow!("sink unavailable"));
            }
        }
        self.sent.lock().push(n.clone());
        Ok(())
    }
}

/// Minimal Atom document; `entries` are (id, updated, title, summary), newest first.
pub fn atom(entries: &[(&str, &str, &str, &str)]) -> String {
    let mut xml = String::from(r#"<feed xmlns="http://www.w3.org/2005/Atom"><title>Status</title>"#);
    for (id, updated, title, summary) in entries {
        xml.push_str(&format!(
            "<entry><id>{id}</id><updated>{updated}</updated><title>{title}</title><summary>{summary}</summary></entry>"
        ));
    }
    xml.push_str("</feed>");
    xml
}
