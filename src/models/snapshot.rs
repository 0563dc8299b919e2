// Point-in-time aggregate published to subscribers

use serde::{Deserialize, Serialize};
use std::sync::Arc;

use super::{DesktopExtras, DeviceIdentity, DisplaySpec, HostFacts, HostTier, NetworkState, SystemClock};

/// One internally consistent snapshot: every field was observed in the same refresh cycle.
///
/// `identity` and `host` are computed once and shared by every snapshot of the process.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Snapshot {
    /// Milliseconds since the Unix epoch when the cycle ran.
    pub timestamp: u64,
    /// Refresh cycle counter, starting at 1.
    pub cycle: u64,
    pub tier: HostTier,
    pub identity: Arc<DeviceIdentity>,
    pub host: Arc<HostFacts>,
    pub displays: Vec<DisplaySpec>,
    pub network: NetworkState,
    pub clock: SystemClock,
    /// Present only when `tier` is desktop.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub desktop: Option<DesktopExtras>,
}
