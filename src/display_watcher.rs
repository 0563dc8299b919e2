// Desktop display enumeration off the publication loop: polls the display list on its own
// cadence and emits it only when it changes

use std::sync::Arc;
use tokio::sync::{mpsc, oneshot};
use tokio::time::{Duration, Instant, MissedTickBehavior, interval_at};

use crate::host_probe::{HostProbe, RawDisplay};

/// Display changes are rare; one pending list is the latest one that matters.
const DISPLAY_CHANNEL_CAPACITY: usize = 2;

/// Handle to the polling task.
pub struct DisplayWatcher {
    shutdown_tx: oneshot::Sender<()>,
    handle: tokio::task::JoinHandle<()>,
}

impl DisplayWatcher {
    /// Returns without waiting for an in-flight enumeration; its result is discarded.
    pub async fn stop(self) {
        let _ = self.shutdown_tx.send(());
        if let Err(e) = self.handle.await {
            tracing::warn!(error = %e, "display watcher task failed");
        }
    }
}

/// Spawns the polling task. `initial` is the list the caller already holds, so the first
/// emission is the first real change. Failed enumerations keep the previous list.
pub fn spawn_display_watcher(
    probe: Arc<dyn HostProbe>,
    poll_interval: Duration,
    initial: Vec<RawDisplay>,
) -> (DisplayWatcher, mpsc::Receiver<Vec<RawDisplay>>) {
    let (tx, rx) = mpsc::channel(DISPLAY_CHANNEL_CAPACITY);
    let (shutdown_tx, mut shutdown_rx) = oneshot::channel();

    let handle = tokio::spawn(async move {
        let mut tick = interval_at(Instant::now() + poll_interval, poll_interval);
        tick.set_missed_tick_behavior(MissedTickBehavior::Skip);
        let mut last = initial;

        loop {
            tokio::select! {
                biased;
                _ = &mut shutdown_rx => break,
                _ = tick.tick() => {}
            }

            let probe = probe.clone();
            let query = tokio::task::spawn_blocking(move || probe.displays());
            // A slow enumeration (system_profiler on macOS) must not hold up shutdown.
            let result = tokio::select! {
                biased;
                _ = &mut shutdown_rx => break,
                result = query => result,
            };
            let displays = match result {
                Ok(Ok(displays)) => displays,
                Ok(Err(e)) => {
                    tracing::debug!(error = %e, operation = "displays", "display enumeration failed");
                    continue;
                }
                Err(e) => {
                    tracing::warn!(error = %e, operation = "displays", "display enumeration task failed");
                    continue;
                }
            };
            if displays == last {
                continue;
            }
            tracing::debug!(count = displays.len(), "displays changed");
            last = displays.clone();
            if tx.send(displays).await.is_err() {
                break;
            }
        }
        tracing::debug!("Display watcher shutting down");
    });

    (DisplayWatcher { shutdown_tx, handle }, rx)
}
