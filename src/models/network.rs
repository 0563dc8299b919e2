// Network reachability models: path updates in, published network state out

use serde::{Deserialize, Serialize};
use std::fmt;

/// Reachability status carried by a path-change event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum PathStatus {
    Satisfied,
    Unsatisfied,
    RequiresConnection,
}

/// Link technology of an interface taking part in the current path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum InterfaceType {
    Wifi,
    Cellular,
    WiredEthernet,
    Loopback,
    Other,
}

/// One path-change event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PathUpdate {
    pub status: PathStatus,
    pub interface_types: Vec<InterfaceType>,
}

impl PathUpdate {
    pub fn uses_interface_type(&self, kind: InterfaceType) -> bool {
        self.interface_types.contains(&kind)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConnectionType {
    Wifi,
    Cellular,
    Wired,
    #[default]
    #[serde(other)]
    Unknown,
}

impl fmt::Display for ConnectionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ConnectionType::Wifi => "WiFi",
            ConnectionType::Cellular => "Cellular",
            ConnectionType::Wired => "Ethernet",
            ConnectionType::Unknown => "Unknown",
        })
    }
}

/// Published network state. Replaced as a whole on every path-change event.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NetworkState {
    pub connected: bool,
    pub connection_type: ConnectionType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub interface_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ipv4: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ipv6: Option<String>,
    /// Colon-separated uppercase octets; desktop tier only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mac_address: Option<String>,
}
