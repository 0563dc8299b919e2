// Snapshot aggregator: composes the collectors into one snapshot per cycle and publishes it.
// A single task owns the aggregator; ticks, network changes and on-demand requests are
// serialized through one select loop, so subscribers never observe a partial snapshot.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::{broadcast, mpsc, oneshot, watch};
use tokio::time::{Duration, Instant, MissedTickBehavior, interval, interval_at};
use tracing::Instrument;

use crate::chipset;
use crate::display;
use crate::display_watcher::spawn_display_watcher;
use crate::host_probe::{HostProbe, RawDisplay};
use crate::identifier;
use crate::models::{
    DesktopExtras, DeviceIdentity, DisplaySpec, HostFacts, HostTier, NetworkState, Snapshot,
};
use crate::network::NetworkMonitor;
use crate::uptime;

/// Rate limit for the "no receivers" message (avoid logging every tick when nobody listens).
const NO_RECEIVERS_WARN_INTERVAL: Duration = Duration::from_secs(60);

/// Pending on-demand refresh requests; extra requests coalesce.
const REFRESH_REQUEST_CAPACITY: usize = 4;

/// Collects snapshots. Identity, chipset, PPI and host facts are resolved once in `new`.
/// Displays are read once in `new` too; later changes arrive through `merge_displays`.
pub struct SnapshotAggregator {
    probe: Arc<dyn HostProbe>,
    tier: HostTier,
    identity: Arc<DeviceIdentity>,
    host: Arc<HostFacts>,
    ppi: Option<u32>,
    /// Last enumeration; desktop hosts replace it through `merge_displays`.
    raw_displays: Vec<RawDisplay>,
    displays: Vec<DisplaySpec>,
    network: NetworkState,
    cycle: u64,
}

impl SnapshotAggregator {
    pub fn new(probe: Arc<dyn HostProbe>, tier: HostTier) -> Self {
        let raw_identifier = identifier::resolve_identifier(probe.as_ref(), tier);
        let chipset = chipset::resolve_chipset(tier, &raw_identifier, probe.as_ref());
        let serial_number = if tier.is_desktop() {
            match probe.serial_number() {
                Ok(serial) => Some(serial),
                Err(e) => {
                    tracing::debug!(error = %e, operation = "serial_number", "serial number unavailable");
                    None
                }
            }
        } else {
            None
        };
        let ppi = display::resolve_ppi(&raw_identifier);
        let identity = DeviceIdentity {
            model_name: identifier::simplify_model_name(&raw_identifier),
            identifier: raw_identifier,
            chipset,
            serial_number,
        };
        tracing::info!(
            identifier = %identity.identifier,
            model = %identity.model_name,
            chipset = %identity.chipset,
            tier = ?tier,
            "device identity resolved"
        );

        let host = probe.host_facts();
        let raw_displays = read_displays(probe.as_ref(), tier);
        let displays = display::build_display_specs(&raw_displays, ppi);

        Self {
            probe,
            tier,
            identity: Arc::new(identity),
            host: Arc::new(host),
            ppi,
            raw_displays,
            displays,
            network: NetworkState::default(),
            cycle: 0,
        }
    }

    pub fn tier(&self) -> HostTier {
        self.tier
    }

    pub fn identity(&self) -> &Arc<DeviceIdentity> {
        &self.identity
    }

    pub fn network(&self) -> &NetworkState {
        &self.network
    }

    /// Replaces the network state used by the next `refresh`.
    pub fn merge_network(&mut self, state: NetworkState) {
        self.network = state;
    }

    /// Replaces the display list used by the next `refresh`. Returns whether it changed.
    pub fn merge_displays(&mut self, raw: Vec<RawDisplay>) -> bool {
        if raw == self.raw_displays {
            return false;
        }
        self.displays = display::build_display_specs(&raw, self.ppi);
        self.raw_displays = raw;
        true
    }

    /// Re-enumerates displays synchronously. Blocking; the running loop uses a
    /// `DisplayWatcher` instead.
    pub fn reload_displays(&mut self) -> bool {
        let raw = read_displays(self.probe.as_ref(), self.tier);
        self.merge_displays(raw)
    }

    /// Runs one collection cycle. Never fails; sub-query failures degrade individual fields.
    pub fn refresh(&mut self) -> Snapshot {
        self.cycle += 1;
        let timestamp = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .map(|d| d.as_millis() as u64)
            .unwrap_or_else(|e| {
                tracing::warn!(
                    error = %e,
                    operation = "get_timestamp",
                    "system time error"
                );
                0
            });

        let clock = uptime::system_clock(self.probe.uptime_secs());
        let desktop = self.tier.is_desktop().then(|| self.collect_desktop_extras());

        Snapshot {
            timestamp,
            cycle: self.cycle,
            tier: self.tier,
            identity: self.identity.clone(),
            host: self.host.clone(),
            displays: self.displays.clone(),
            network: self.network.clone(),
            clock,
            desktop,
        }
    }

    fn collect_desktop_extras(&self) -> DesktopExtras {
        let battery_percentage = self.probe.battery_percentage().unwrap_or_else(|e| {
            tracing::debug!(error = %e, operation = "battery_percentage", "power source query failed");
            None
        });
        let user = self.probe.current_user().unwrap_or_else(|e| {
            tracing::debug!(error = %e, operation = "current_user", "user identity query failed");
            Default::default()
        });
        DesktopExtras {
            battery_percentage,
            full_user_name: user.full_name,
            user_name: user.user_name,
        }
    }
}

/// Desktop hosts enumerate every display; handheld hosts only have the main one.
fn read_displays(probe: &dyn HostProbe, tier: HostTier) -> Vec<RawDisplay> {
    let result = match tier {
        HostTier::Desktop => probe.displays(),
        HostTier::Handheld => probe.main_display().map(|main| main.into_iter().collect()),
    };
    result.unwrap_or_else(|e| {
        tracing::debug!(error = %e, operation = "displays", "display enumeration failed");
        Vec::new()
    })
}

/// Loop timing and publication config.
pub struct AggregatorConfig {
    pub refresh_interval: Duration,
    /// Desktop display re-enumeration cadence, independent of `refresh_interval`.
    pub display_poll_interval: Duration,
    /// How often to log publication stats at INFO (real time).
    pub stats_log_interval: Duration,
    pub broadcast_capacity: usize,
}

/// Network inputs of the loop. The monitor (if any) is stopped when the loop exits.
pub struct NetworkFeed {
    pub states: mpsc::Receiver<NetworkState>,
    pub monitor: Option<NetworkMonitor>,
}

/// Subscription side of a running aggregator.
pub struct AggregatorHandle {
    snapshots: broadcast::Sender<Arc<Snapshot>>,
    latest: watch::Receiver<Arc<Snapshot>>,
    refresh_tx: mpsc::Sender<()>,
    published_total: Arc<AtomicU64>,
    shutdown_tx: Option<oneshot::Sender<()>>,
    task: Option<tokio::task::JoinHandle<()>>,
}

impl AggregatorHandle {
    /// Receives every snapshot published after this call.
    pub fn subscribe(&self) -> broadcast::Receiver<Arc<Snapshot>> {
        self.snapshots.subscribe()
    }

    /// Most recently published snapshot.
    pub fn latest(&self) -> Arc<Snapshot> {
        self.latest.borrow().clone()
    }

    pub fn watch(&self) -> watch::Receiver<Arc<Snapshot>> {
        self.latest.clone()
    }

    pub fn published_total(&self) -> u64 {
        self.published_total.load(Ordering::Relaxed)
    }

    /// Asks the owning task for an immediate cycle. Returns false once the loop has stopped.
    pub async fn refresh_now(&self) -> bool {
        self.refresh_tx.send(()).await.is_ok()
    }

    /// Stops the loop and the network monitor. Idempotent; nothing is published after it returns.
    pub async fn shutdown(&mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
        if let Some(task) = self.task.take()
            && let Err(e) = task.await
        {
            tracing::warn!(error = %e, "aggregator task failed");
        }
    }
}

impl Drop for AggregatorHandle {
    fn drop(&mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
    }
}

/// Pending forever when there is no display feed or it has closed.
async fn recv_displays(
    rx: &mut Option<mpsc::Receiver<Vec<RawDisplay>>>,
) -> Option<Vec<RawDisplay>> {
    match rx {
        Some(rx) => match rx.recv().await {
            Some(raw) => Some(raw),
            None => std::future::pending().await,
        },
        None => std::future::pending().await,
    }
}

async fn run_cycle(
    mut aggregator: SnapshotAggregator,
) -> Result<(SnapshotAggregator, Snapshot), tokio::task::JoinError> {
    tokio::task::spawn_blocking(move || {
        let snapshot = aggregator.refresh();
        (aggregator, snapshot)
    })
    .await
}

struct Publisher {
    tx: broadcast::Sender<Arc<Snapshot>>,
    latest_tx: watch::Sender<Arc<Snapshot>>,
    published_total: Arc<AtomicU64>,
    last_no_receivers_warn: Option<Instant>,
}

impl Publisher {
    fn publish(&mut self, snapshot: Snapshot) {
        let snapshot = Arc::new(snapshot);
        self.latest_tx.send_replace(snapshot.clone());
        self.published_total.fetch_add(1, Ordering::Relaxed);
        if self.tx.send(snapshot).is_err() {
            let should_warn = self
                .last_no_receivers_warn
                .is_none_or(|t| t.elapsed() >= NO_RECEIVERS_WARN_INTERVAL);
            if should_warn {
                tracing::debug!(
                    operation = "broadcast_snapshot",
                    "No active subscribers; broadcast channel has no receivers"
                );
                self.last_no_receivers_warn = Some(Instant::now());
            }
        }
    }
}

/// Runs the first cycle, then spawns the owning task. The returned handle already has a snapshot.
pub async fn spawn(
    aggregator: SnapshotAggregator,
    network: NetworkFeed,
    config: AggregatorConfig,
) -> anyhow::Result<AggregatorHandle> {
    let AggregatorConfig {
        refresh_interval,
        display_poll_interval,
        stats_log_interval,
        broadcast_capacity,
    } = config;
    let NetworkFeed {
        states: mut network_rx,
        monitor,
    } = network;

    let (mut aggregator, first) = run_cycle(aggregator)
        .await
        .map_err(|e| anyhow::anyhow!("initial refresh: {}", e))?;
    let first = Arc::new(first);

    let (tx, _) = broadcast::channel(broadcast_capacity);
    let (latest_tx, latest_rx) = watch::channel(first);
    let (refresh_tx, mut refresh_rx) = mpsc::channel(REFRESH_REQUEST_CAPACITY);
    let (shutdown_tx, mut shutdown_rx) = oneshot::channel::<()>();
    let published_total = Arc::new(AtomicU64::new(1));

    let mut publisher = Publisher {
        tx: tx.clone(),
        latest_tx,
        published_total: published_total.clone(),
        last_no_receivers_warn: None,
    };

    let aggregator_span = tracing::span!(
        tracing::Level::DEBUG,
        "aggregator",
        refresh_interval_ms = refresh_interval.as_millis() as u64
    );

    // Handheld displays are fixed for the life of the process.
    let (display_watcher, mut display_rx) = if aggregator.tier.is_desktop() {
        let (watcher, rx) = spawn_display_watcher(
            aggregator.probe.clone(),
            display_poll_interval,
            aggregator.raw_displays.clone(),
        );
        (Some(watcher), Some(rx))
    } else {
        (None, None)
    };

    let task = tokio::spawn(
        async move {
            let mut monitor = monitor;
            let mut display_watcher = display_watcher;
            let mut tick = interval_at(Instant::now() + refresh_interval, refresh_interval);
            tick.set_missed_tick_behavior(MissedTickBehavior::Skip);
            let mut stats_log_tick = interval(stats_log_interval);
            stats_log_tick.set_missed_tick_behavior(MissedTickBehavior::Skip);
            let mut network_open = true;
            let mut network_changes: u64 = 0;

            loop {
                let trigger = tokio::select! {
                    biased;
                    _ = &mut shutdown_rx => {
                        tracing::debug!("Aggregator shutting down");
                        break;
                    }
                    state = network_rx.recv(), if network_open => {
                        match state {
                            Some(state) => {
                                network_changes += 1;
                                aggregator.merge_network(state);
                                "network"
                            }
                            None => {
                                tracing::debug!("network feed closed");
                                network_open = false;
                                continue;
                            }
                        }
                    }
                    Some(raw) = recv_displays(&mut display_rx) => {
                        if !aggregator.merge_displays(raw) {
                            continue;
                        }
                        "displays"
                    }
                    Some(()) = refresh_rx.recv() => "on_demand",
                    _ = tick.tick() => "tick",
                    _ = stats_log_tick.tick() => {
                        tracing::info!(
                            subscribers = publisher.tx.receiver_count(),
                            snapshots_published_total = publisher.published_total.load(Ordering::Relaxed),
                            network_changes,
                            "app stats"
                        );
                        continue;
                    }
                };

                let (next, snapshot) = match run_cycle(aggregator).await {
                    Ok(result) => result,
                    Err(e) => {
                        tracing::error!(error = %e, operation = "refresh", "refresh cycle panicked");
                        break;
                    }
                };
                aggregator = next;
                tracing::trace!(trigger, cycle = snapshot.cycle, "snapshot refreshed");
                publisher.publish(snapshot);
            }

            // Watchers may be blocked handing off a value; closing the feeds releases them.
            drop(network_rx);
            drop(display_rx);
            if let Some(watcher) = display_watcher.take() {
                watcher.stop().await;
            }
            if let Some(monitor) = monitor.as_mut() {
                monitor.stop().await;
            }
        }
        .instrument(aggregator_span),
    );

    Ok(AggregatorHandle {
        snapshots: tx,
        latest: latest_rx,
        refresh_tx,
        published_total,
        shutdown_tx: Some(shutdown_tx),
        task: Some(task),
    })
}
