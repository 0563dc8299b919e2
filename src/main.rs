use anyhow::Result;
use devinfo::aggregator::{AggregatorConfig, NetworkFeed, SnapshotAggregator};
use devinfo::host_probe::{HostProbe, NativeProbe};
use devinfo::models::HostTier;
use devinfo::network::NetworkMonitor;
use devinfo::*;
use std::sync::Arc;
use tokio::sync::{broadcast, mpsc};
use tokio::time::Duration;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt::time::FormatTime;

struct LocalTimer;

impl FormatTime for LocalTimer {
    fn format_time(&self, w: &mut tracing_subscriber::fmt::format::Writer<'_>) -> std::fmt::Result {
        write!(
            w,
            "{}",
            chrono::Local::now().format("%Y-%m-%dT%H:%M:%S%.3f%:z")
        )
    }
}

async fn shutdown_signal() {
    #[cfg(unix)]
    {
        let mut sigterm =
            match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
                Ok(s) => s,
                Err(_) => {
                    let _ = tokio::signal::ctrl_c().await;
                    return;
                }
            };
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {}
            _ = sigterm.recv() => {}
        }
    }
    #[cfg(not(unix))]
    {
        let _ = tokio::signal::ctrl_c().await;
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_timer(LocalTimer)
        .with_env_filter(filter)
        .init();

    let app_config = config::AppConfig::load()?;
    tracing::info!(version = env!("CARGO_PKG_VERSION"), "devinfo starting");

    let probe: Arc<dyn HostProbe> = Arc::new(NativeProbe::new());
    let tier = HostTier::current();

    let aggregator = {
        let probe = probe.clone();
        tokio::task::spawn_blocking(move || SnapshotAggregator::new(probe, tier))
            .await
            .map_err(|e| anyhow::anyhow!("device identity: {}", e))?
    };

    let (state_tx, state_rx) = mpsc::channel(app_config.network.channel_capacity);
    let mut monitor = NetworkMonitor::new(
        probe.clone(),
        tier,
        app_config.network.interface_prefixes.clone(),
    );
    monitor.start_native(
        Duration::from_millis(app_config.network.poll_interval_ms),
        state_tx,
    );

    let mut handle = aggregator::spawn(
        aggregator,
        NetworkFeed {
            states: state_rx,
            monitor: Some(monitor),
        },
        AggregatorConfig {
            refresh_interval: Duration::from_millis(app_config.monitoring.refresh_interval_ms),
            display_poll_interval: Duration::from_millis(
                app_config.monitoring.display_poll_interval_ms,
            ),
            stats_log_interval: Duration::from_secs(app_config.monitoring.stats_log_interval_secs),
            broadcast_capacity: app_config.publishing.broadcast_capacity,
        },
    )
    .await?;

    let first = handle.latest();
    tracing::info!(
        model = %first.identity.model_name,
        chipset = %first.identity.chipset,
        host = %first.host.host_name,
        uptime = %first.clock.uptime,
        "first snapshot collected"
    );

    let mut rx = handle.subscribe();
    let logger = tokio::spawn(async move {
        loop {
            match rx.recv().await {
                Ok(snapshot) => match serde_json::to_string(snapshot.as_ref()) {
                    Ok(json) => tracing::debug!(cycle = snapshot.cycle, snapshot = %json, "snapshot"),
                    Err(e) => {
                        tracing::warn!(error = %e, operation = "serialize_snapshot", "serialize failed")
                    }
                },
                Err(broadcast::error::RecvError::Lagged(n)) => {
                    tracing::debug!(skipped = n, "snapshot logger lagged");
                }
                Err(broadcast::error::RecvError::Closed) => break,
            }
        }
    });

    shutdown_signal().await;
    tracing::info!("Received shutdown signal");
    handle.shutdown().await;
    drop(handle);
    let _ = logger.await;

    Ok(())
}
