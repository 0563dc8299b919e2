// Boot time and uptime

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SystemClock {
    /// Seconds since the Unix epoch.
    pub boot_timestamp: i64,
    /// e.g. "Tuesday, Jan 28, 2025, 9:41 AM" (local time)
    pub boot_time: String,
    pub uptime_secs: u64,
    /// e.g. "1d 1h 1m 1s"
    pub uptime: String,
}
