// Host identity models: tier, hardware identity, static host facts, desktop-only extras

use serde::{Deserialize, Serialize};

/// Category of machine; selects resolution strategies and which optional fields exist.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HostTier {
    Desktop,
    Handheld,
}

impl HostTier {
    /// Tier of the machine this binary was built for.
    pub fn current() -> Self {
        if cfg!(any(target_os = "ios", target_os = "android")) {
            HostTier::Handheld
        } else {
            HostTier::Desktop
        }
    }

    pub fn is_desktop(self) -> bool {
        self == HostTier::Desktop
    }
}

/// Resolved once per process; the hardware identifier cannot change while running.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviceIdentity {
    /// Raw vendor model code, e.g. "iPhone15,3" or "MacBookPro18,3". Empty when the query failed.
    pub identifier: String,
    pub model_name: String,
    pub chipset: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub serial_number: Option<String>,
}

/// Static host facts; fetched once at startup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HostFacts {
    pub host_name: String,
    /// "Mac", "iPhone", "iPad", or the OS's own name on other hosts.
    pub device_type: String,
    pub os_name: String,
    pub os_version: String,
    /// Physical memory in whole GiB (truncated).
    pub physical_memory_gb: u64,
    pub processor_count: u32,
}

/// Fields only desktop-class hosts report. Recomputed every refresh cycle.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DesktopExtras {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub battery_percentage: Option<u8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub full_user_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_name: Option<String>,
}
