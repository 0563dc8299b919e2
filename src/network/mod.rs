// Network monitor: path-change subscription, interface enumeration, connectivity classification.
// Computed state is handed to the aggregator over a channel; nothing here touches the snapshot.

mod path_watcher;

pub use path_watcher::{PathKey, PathWatcher, sample_path, sample_path_keyed, spawn_path_watcher};

use std::sync::Arc;
use tokio::sync::{mpsc, oneshot};
use tokio::time::Duration;

use crate::error::ProbeError;
use crate::host_probe::{AddressFamily, HostProbe, InterfaceRecord};
use crate::models::{ConnectionType, HostTier, InterfaceType, NetworkState, PathStatus, PathUpdate};

/// Built-in Wi-Fi / Ethernet ("en*") and cellular data ("pdp_ip*").
pub const DEFAULT_INTERFACE_PREFIXES: &[&str] = &["en", "pdp_ip"];

/// First matching interface type wins, regardless of enumeration order.
const CONNECTION_PRIORITY: [(InterfaceType, ConnectionType); 3] = [
    (InterfaceType::Wifi, ConnectionType::Wifi),
    (InterfaceType::Cellular, ConnectionType::Cellular),
    (InterfaceType::WiredEthernet, ConnectionType::Wired),
];

pub fn classify_connection(path: &PathUpdate) -> ConnectionType {
    CONNECTION_PRIORITY
        .iter()
        .find(|(kind, _)| path.uses_interface_type(*kind))
        .map(|(_, connection)| *connection)
        .unwrap_or(ConnectionType::Unknown)
}

pub fn is_connected(path: &PathUpdate) -> bool {
    path.status == PathStatus::Satisfied
}

/// Name of the first record whose interface name starts with one of `prefixes`.
pub fn select_primary<'a>(records: &'a [InterfaceRecord], prefixes: &[String]) -> Option<&'a str> {
    records
        .iter()
        .find(|r| prefixes.iter().any(|p| r.name.starts_with(p.as_str())))
        .map(|r| r.name.as_str())
}

/// "A4:83:E7:11:22:33"
pub fn format_mac(bytes: &[u8]) -> String {
    bytes
        .iter()
        .map(|b| format!("{b:02X}"))
        .collect::<Vec<_>>()
        .join(":")
}

/// Result of one successful interface enumeration.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InterfaceSummary {
    pub interface_name: Option<String>,
    pub ipv4: Option<String>,
    pub ipv6: Option<String>,
    pub mac_address: Option<String>,
}

/// Enumerates interfaces and extracts the primary interface's numeric addresses.
/// Desktop hosts also resolve the registry's primary hardware address.
pub fn enumerate_interfaces(
    probe: &dyn HostProbe,
    tier: HostTier,
    prefixes: &[String],
) -> Result<InterfaceSummary, ProbeError> {
    let records = probe.interfaces()?;
    let primary = select_primary(&records, prefixes);
    let first_address = |family: AddressFamily| {
        records
            .iter()
            .filter(|r| Some(r.name.as_str()) == primary && r.family == family)
            .find_map(|r| r.address.clone())
    };

    let mac_address = if tier.is_desktop() {
        match probe.primary_mac_address(primary) {
            Ok(mac) => mac.map(|bytes| format_mac(&bytes)),
            Err(e) => {
                tracing::debug!(error = %e, operation = "primary_mac_address", "hardware address unavailable");
                None
            }
        }
    } else {
        None
    };

    Ok(InterfaceSummary {
        interface_name: primary.map(str::to_string),
        ipv4: first_address(AddressFamily::Ipv4),
        ipv6: first_address(AddressFamily::Ipv6),
        mac_address,
    })
}

/// Connectivity and connection type from a path update; interface fields are kept.
pub fn apply_path(state: &NetworkState, path: &PathUpdate) -> NetworkState {
    NetworkState {
        connected: is_connected(path),
        connection_type: classify_connection(path),
        ..state.clone()
    }
}

/// Interface fields from an enumeration. A failed enumeration leaves the previous values in place,
/// and a failed hardware-address lookup keeps the last known address.
pub fn apply_enumeration(
    state: &NetworkState,
    enumeration: Result<InterfaceSummary, ProbeError>,
) -> NetworkState {
    match enumeration {
        Ok(summary) => NetworkState {
            interface_name: summary.interface_name,
            ipv4: summary.ipv4,
            ipv6: summary.ipv6,
            mac_address: summary.mac_address.or_else(|| state.mac_address.clone()),
            ..state.clone()
        },
        Err(e) => {
            tracing::warn!(error = %e, operation = "enumerate_interfaces", "keeping last known interface state");
            state.clone()
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MonitorState {
    Unsubscribed,
    Monitoring,
}

struct Subscription {
    shutdown_tx: oneshot::Sender<()>,
    handle: tokio::task::JoinHandle<()>,
    watcher: Option<PathWatcher>,
}

/// Owns the path-change subscription and the background task that turns path updates into
/// `NetworkState` messages.
pub struct NetworkMonitor {
    probe: Arc<dyn HostProbe>,
    tier: HostTier,
    prefixes: Arc<[String]>,
    subscription: Option<Subscription>,
}

impl NetworkMonitor {
    pub fn new(probe: Arc<dyn HostProbe>, tier: HostTier, prefixes: Vec<String>) -> Self {
        Self {
            probe,
            tier,
            prefixes: prefixes.into(),
            subscription: None,
        }
    }

    pub fn state(&self) -> MonitorState {
        if self.subscription.is_some() {
            MonitorState::Monitoring
        } else {
            MonitorState::Unsubscribed
        }
    }

    /// Subscribes to `path_rx`. An initial enumeration is published before any path update.
    /// Starting an already running monitor is a no-op.
    pub fn start(
        &mut self,
        path_rx: mpsc::Receiver<PathUpdate>,
        state_tx: mpsc::Sender<NetworkState>,
    ) {
        self.subscribe(path_rx, state_tx, None);
    }

    /// Subscribes to the native path watcher, sampling every `poll_interval`.
    pub fn start_native(&mut self, poll_interval: Duration, state_tx: mpsc::Sender<NetworkState>) {
        if self.subscription.is_some() {
            tracing::debug!("network monitor already running");
            return;
        }
        let (watcher, path_rx) = spawn_path_watcher(self.probe.clone(), poll_interval);
        self.subscribe(path_rx, state_tx, Some(watcher));
    }

    fn subscribe(
        &mut self,
        mut path_rx: mpsc::Receiver<PathUpdate>,
        state_tx: mpsc::Sender<NetworkState>,
        watcher: Option<PathWatcher>,
    ) {
        if self.subscription.is_some() {
            tracing::debug!("network monitor already running");
            return;
        }
        let probe = self.probe.clone();
        let tier = self.tier;
        let prefixes = self.prefixes.clone();
        let (shutdown_tx, mut shutdown_rx) = oneshot::channel();

        let handle = tokio::spawn(async move {
            let mut state = enumerate_into(&probe, tier, &prefixes, &NetworkState::default()).await;
            let mut pending = Some(state.clone());

            loop {
                // Cancellation wins over a hand-off blocked on a full channel.
                if let Some(next) = pending.take() {
                    tokio::select! {
                        biased;
                        _ = &mut shutdown_rx => break,
                        sent = state_tx.send(next) => {
                            if sent.is_err() {
                                break;
                            }
                        }
                    }
                }
                tokio::select! {
                    biased;
                    _ = &mut shutdown_rx => break,
                    update = path_rx.recv() => {
                        let Some(update) = update else {
                            tracing::debug!("path source closed");
                            break;
                        };
                        state = apply_path(&state, &update);
                        state = enumerate_into(&probe, tier, &prefixes, &state).await;
                        tracing::debug!(
                            connected = state.connected,
                            connection_type = %state.connection_type,
                            interface = state.interface_name.as_deref().unwrap_or("-"),
                            "network state changed"
                        );
                        pending = Some(state.clone());
                    }
                }
            }
            tracing::debug!("Network monitor shutting down");
        });

        self.subscription = Some(Subscription {
            shutdown_tx,
            handle,
            watcher,
        });
    }

    /// Cancels the subscription. Idempotent; once it returns no further state is sent.
    pub async fn stop(&mut self) {
        let Some(subscription) = self.subscription.take() else {
            return;
        };
        let _ = subscription.shutdown_tx.send(());
        if let Err(e) = subscription.handle.await {
            tracing::warn!(error = %e, "network monitor task failed");
        }
        if let Some(watcher) = subscription.watcher {
            watcher.stop().await;
        }
    }
}

impl Drop for NetworkMonitor {
    fn drop(&mut self) {
        if let Some(subscription) = self.subscription.take() {
            subscription.handle.abort();
            if let Some(watcher) = subscription.watcher {
                watcher.abort();
            }
        }
    }
}

async fn enumerate_into(
    probe: &Arc<dyn HostProbe>,
    tier: HostTier,
    prefixes: &Arc<[String]>,
    state: &NetworkState,
) -> NetworkState {
    let probe = probe.clone();
    let prefixes = prefixes.clone();
    let enumeration =
        tokio::task::spawn_blocking(move || enumerate_interfaces(probe.as_ref(), tier, &prefixes))
            .await
            .unwrap_or_else(|e| {
                Err(ProbeError::QueryFailed {
                    key: "interface enumeration",
                    reason: e.to_string(),
                })
            });
    apply_enumeration(state, enumeration)
}
