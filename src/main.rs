//! Status Feed Watcher: binary entrypoint
//! Loads config, sets up logging, and polls the status feed until Ctrl-C.
//!
//! Notifications go to stdout; logs go to stderr.

use status_feed_watcher::ingest::config::load_config_default;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Logging to stderr. `RUST_LOG` overrides the filter; `LOG_FORMAT=json`
/// switches to JSON lines.
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("status_feed_watcher=info,warn"));

    let json = std::env::var("LOG_FORMAT")
        .ok()
        .is_some_and(|v| v.eq_ignore_ascii_case("json"));

    let registry = tracing_subscriber::registry().with(filter);
    if json {
        registry
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        registry
            .with(fmt::layer().compact().with_writer(std::io::stderr))
            .init();
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env in local/dev; no-op when absent.
    let _ = dotenvy::dotenv();

    init_tracing();

    let cfg = load_config_default()?;
    if let Some(addr) = cfg.metrics_addr {
        status_feed_watcher::metrics::install_exporter(addr, cfg.poll_interval_secs)?;
    }

    let mut watcher = status_feed_watcher::build_watcher(&cfg)?;

    let cancel = CancellationToken::new();
    {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            match tokio::signal::ctrl_c().await {
                Ok(()) => {
                    tracing::info!("interrupt received, shutting down");
                    cancel.cancel();
                }
                Err(e) => tracing::warn!("cannot listen for Ctrl-C: {e}"),
            }
        });
    }

    watcher.run(cancel).await
}
