// Native path-change source: samples interface state and emits a PathUpdate when it changes

use std::collections::BTreeSet;
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot};
use tokio::time::{Duration, MissedTickBehavior, interval};

use crate::error::ProbeError;
use crate::host_probe::HostProbe;
use crate::models::{PathStatus, PathUpdate};

/// Path updates are edge-triggered, so a small buffer is enough.
const PATH_CHANNEL_CAPACITY: usize = 8;

/// Active (interface, numeric address) pairs. An address change is a path change even when
/// status and interface types stay the same.
pub type PathKey = BTreeSet<(String, String)>;

/// Current reachability: satisfied iff some non-loopback interface is up, running and addressed.
pub fn sample_path(probe: &dyn HostProbe) -> Result<PathUpdate, ProbeError> {
    sample_path_keyed(probe).map(|(update, _)| update)
}

/// `sample_path` plus the address set the watcher compares between polls.
pub fn sample_path_keyed(probe: &dyn HostProbe) -> Result<(PathUpdate, PathKey), ProbeError> {
    let records = probe.interfaces()?;
    let key: PathKey = records
        .iter()
        .filter(|r| r.is_active())
        .filter_map(|r| Some((r.name.clone(), r.address.clone()?)))
        .collect();
    let active: Vec<String> = key
        .iter()
        .map(|(name, _)| name.clone())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect();

    let mut interface_types = probe.interface_kinds(&active);
    interface_types.sort();
    interface_types.dedup();

    let update = PathUpdate {
        status: if active.is_empty() {
            PathStatus::Unsatisfied
        } else {
            PathStatus::Satisfied
        },
        interface_types,
    };
    Ok((update, key))
}

/// Handle to the watcher task; dropping the receiver also ends it.
pub struct PathWatcher {
    shutdown_tx: oneshot::Sender<()>,
    handle: tokio::task::JoinHandle<()>,
}

impl PathWatcher {
    pub async fn stop(self) {
        let _ = self.shutdown_tx.send(());
        if let Err(e) = self.handle.await {
            tracing::warn!(error = %e, "path watcher task failed");
        }
    }

    pub(super) fn abort(self) {
        self.handle.abort();
    }
}

/// Spawns the sampling task. The first sample is always emitted; later samples only when the
/// update or the active address set differs from the previous one.
pub fn spawn_path_watcher(
    probe: Arc<dyn HostProbe>,
    poll_interval: Duration,
) -> (PathWatcher, mpsc::Receiver<PathUpdate>) {
    let (tx, rx) = mpsc::channel(PATH_CHANNEL_CAPACITY);
    let (shutdown_tx, mut shutdown_rx) = oneshot::channel();

    let handle = tokio::spawn(async move {
        let mut tick = interval(poll_interval);
        tick.set_missed_tick_behavior(MissedTickBehavior::Skip);
        let mut last: Option<(PathUpdate, PathKey)> = None;

        loop {
            tokio::select! {
                biased;
                _ = &mut shutdown_rx => break,
                _ = tick.tick() => {
                    let probe = probe.clone();
                    let sample = match tokio::task::spawn_blocking(move || sample_path_keyed(probe.as_ref())).await {
                        Ok(sample) => sample,
                        Err(e) => {
                            tracing::warn!(error = %e, operation = "sample_path", "path sampling task failed");
                            continue;
                        }
                    };
                    let sample = match sample {
                        Ok(sample) => sample,
                        Err(e) => {
                            tracing::debug!(error = %e, operation = "sample_path", "interface list unavailable");
                            continue;
                        }
                    };
                    if last.as_ref() == Some(&sample) {
                        continue;
                    }
                    let update = sample.0.clone();
                    tracing::debug!(
                        status = ?update.status,
                        types = ?update.interface_types,
                        addresses = sample.1.len(),
                        "path changed"
                    );
                    last = Some(sample);
                    if tx.send(update).await.is_err() {
                        break;
                    }
                }
            }
        }
        tracing::debug!("Path watcher shutting down");
    });

    (PathWatcher { shutdown_tx, handle }, rx)
}
