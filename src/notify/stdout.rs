use anyhow::{Context, Result};
use std::io::Write;

use super::{Notification, Notifier};

const SEPARATOR_WIDTH: usize = 80;

/// Three-line block: timestamp + product, status, dash separator.
pub fn render_notification(n: &Notification) -> String {
    format!(
        "[{}] Product: {}\nStatus: {}\n{}\n",
        n.ts.format("%Y-%m-%d %H:%M:%S"),
        n.label,
        n.message,
        "-".repeat(SEPARATOR_WIDTH)
    )
}

/// Prints notifications to stdout, flushing after each so piped output is live.
#[derive(Debug, Default, Clone, Copy)]
pub struct StdoutNotifier;

#[async_trait::async_trait]
impl Notifier for StdoutNotifier {
    async fn send(&self, n: &Notification) -> Result<()> {
        let mut out = std::io::stdout().lock();
        out.write_all(render_notification(n).as_bytes())
            .context("stdout write")?;
        out.flush().context("stdout flush")?;
        Ok(())
    }
}
