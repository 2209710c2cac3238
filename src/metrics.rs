use anyhow::{Context, Result};
use metrics::gauge;
use metrics_exporter_prometheus::PrometheusBuilder;
use std::net::SocketAddr;

/// Install the Prometheus recorder and serve `/metrics` on `addr`.
///
/// Must be called from within the tokio runtime. Without it every
/// `counter!`/`gauge!` in the crate is a no-op.
pub fn install_exporter(addr: SocketAddr, poll_interval_secs: u64) -> Result<()> {
    PrometheusBuilder::new()
        .with_http_listener(addr)
        .install()
        .context("prometheus: install recorder")?;

    crate::ingest::ensure_metrics_described();
    // Static gauge with the configured poll interval
    gauge!("feed_poll_interval_secs").set(poll_interval_secs as f64);

    tracing::info!(%addr, "prometheus exporter listening");
    Ok(())
}
