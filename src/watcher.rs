//! Poll loop: fetch → parse → dedupe → classify → notify, once per tick.
//!
//! All mutable state lives in [`WatcherState`], owned by the [`Watcher`] and
//! only touched from inside a cycle, so cycles are strictly sequential and no
//! locking is involved. A cycle commits nothing until its document has parsed:
//! a fetch or parse failure leaves both the validators and the seen keys as
//! they were.

use anyhow::{Context, Result};
use chrono::{Local, Utc};
use metrics::{counter, gauge};
use std::collections::HashSet;
use std::time::Duration;
use tokio::time::{self, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, trace, warn};

use crate::classify::ProductClassifier;
use crate::ingest::types::{FeedSource, FetchOutcome, Validators};
use crate::ingest::{
    atom, ensure_metrics_described, filter_new, into_chronological, normalize_text,
};
use crate::notify::{Notification, Notifier};

#[derive(Debug, Clone, Default)]
pub struct WatcherState {
    /// Validators from the last successfully processed document.
    pub validators: Validators,
    /// Every identity key ever observed; only grows.
    pub seen_keys: HashSet<String>,
    /// Set once the first document has been processed.
    pub primed: bool,
}

/// What a single cycle did, for logs and tests.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CycleReport {
    pub not_modified: bool,
    pub parsed: usize,
    pub new: usize,
    pub notified: usize,
}

pub struct Watcher {
    source: Box<dyn FeedSource>,
    notifier: Box<dyn Notifier>,
    classifier: ProductClassifier,
    poll_interval: Duration,
    suppress_initial_backlog: bool,
    state: WatcherState,
}

impl Watcher {
    pub fn new(
        source: Box<dyn FeedSource>,
        notifier: Box<dyn Notifier>,
        classifier: ProductClassifier,
        poll_interval: Duration,
    ) -> Self {
        Self {
            source,
            notifier,
            classifier,
            poll_interval,
            suppress_initial_backlog: false,
            state: WatcherState::default(),
        }
    }

    /// Swallow whatever the feed already holds on the first document instead
    /// of reporting the whole history at startup.
    pub fn with_initial_backlog_suppressed(mut self, suppress: bool) -> Self {
        self.suppress_initial_backlog = suppress;
        self
    }

    pub fn state(&self) -> &WatcherState {
        &self.state
    }

    /// Run one full cycle right now.
    pub async fn poll_once(&mut self) -> Result<CycleReport> {
        let outcome = self
            .source
            .fetch_if_changed(&self.state.validators)
            .await?;
        self.process(outcome).await
    }

    /// Poll on every tick until `cancel` fires.
    ///
    /// The first tick is immediate. A failed cycle is logged and the loop
    /// waits for the next tick; only cancellation ends it, including while a
    /// fetch is in flight.
    pub async fn run(&mut self, cancel: CancellationToken) -> Result<()> {
        ensure_metrics_described();

        let mut ticker = time::interval(self.poll_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        info!(
            url = self.source.endpoint(),
            interval_secs = self.poll_interval.as_secs(),
            "status watcher started"
        );

        loop {
            tokio::select! {
                biased;
                _ = cancel.cancelled() => break,
                _ = ticker.tick() => {}
            }

            counter!("feed_polls_total").increment(1);

            // Only the fetch races cancellation; once a document is in hand the
            // cycle runs to completion so no key is recorded without its report.
            let fetched = tokio::select! {
                biased;
                _ = cancel.cancelled() => break,
                r = self.source.fetch_if_changed(&self.state.validators) => r,
            };

            let result = match fetched {
                Ok(outcome) => self.process(outcome).await,
                Err(e) => Err(e),
            };

            match result {
                Ok(report) if report.not_modified => debug!("feed not modified"),
                Ok(report) => info!(
                    parsed = report.parsed,
                    new = report.new,
                    notified = report.notified,
                    seen = self.state.seen_keys.len(),
                    "feed cycle done"
                ),
                Err(e) => {
                    counter!("feed_poll_errors_total").increment(1);
                    warn!("poll cycle failed: {e:#}");
                }
            }
            gauge!("feed_last_poll_ts").set(Utc::now().timestamp() as f64);
        }

        info!("status watcher stopped");
        Ok(())
    }

    /// Parse, dedupe and report one fetched document.
    ///
    /// A key stays in `seen_keys` only once its entry was either reported or
    /// found to match no product. When the notifier fails the key is dropped
    /// again, so the entry is retried on the next document that is not a 304.
    async fn process(&mut self, outcome: FetchOutcome) -> Result<CycleReport> {
        let (validators, body) = match outcome {
            FetchOutcome::NotModified => {
                counter!("feed_not_modified_total").increment(1);
                return Ok(CycleReport {
                    not_modified: true,
                    ..Default::default()
                });
            }
            FetchOutcome::Modified { validators, body } => (validators, body),
        };

        let entries = atom::parse_entries(&body)
            .with_context(|| format!("parsing feed from {}", self.source.endpoint()))?;

        // Parsed fine: from here on the cycle commits.
        self.state.validators = validators;
        let parsed = entries.len();
        let fresh = filter_new(into_chronological(entries), &mut self.state.seen_keys);

        let first_document = !self.state.primed;
        self.state.primed = true;
        if first_document && self.suppress_initial_backlog {
            gauge!("feed_seen_keys").set(self.state.seen_keys.len() as f64);
            info!(skipped = fresh.len(), "initial backlog marked as seen");
            return Ok(CycleReport {
                parsed,
                new: fresh.len(),
                ..Default::default()
            });
        }

        let mut notified = 0usize;
        for entry in &fresh {
            let body = normalize_text(entry.body_raw());
            let Some(c) = self.classifier.classify(&entry.title, &body) else {
                trace!(key = %entry.identity_key(), title = %entry.title, "no product match");
                continue;
            };

            let n = Notification {
                label: c.label,
                message: c.message,
                ts: Local::now(),
            };
            match self.notifier.send(&n).await {
                Ok(()) => notified += 1,
                Err(e) => {
                    // Forget the key so the entry comes up again with the next
                    // changed document.
                    self.state.seen_keys.remove(&entry.identity_key());
                    warn!(label = %n.label, "notification failed: {e:#}");
                }
            }
        }
        counter!("feed_notifications_total").increment(notified as u64);
        gauge!("feed_seen_keys").set(self.state.seen_keys.len() as f64);

        Ok(CycleReport {
            not_modified: false,
            parsed,
            new: fresh.len(),
            notified,
        })
    }
}
