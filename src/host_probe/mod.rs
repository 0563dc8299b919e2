// OS adapter boundary: every raw platform query goes through `HostProbe`

#[cfg(unix)]
mod ffi;
mod linux;
mod macos;

use crate::error::ProbeError;
use crate::models::{HostFacts, HostTier, InterfaceType};
use sysinfo::System;
use tracing::instrument;

const GIB: u64 = 1024 * 1024 * 1024;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddressFamily {
    Ipv4,
    Ipv6,
    /// Link-layer entry (AF_LINK / AF_PACKET); carries no numeric host address.
    Link,
    Other,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct InterfaceFlags {
    pub up: bool,
    pub running: bool,
    pub loopback: bool,
}

/// One entry of the OS interface list, already decoded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InterfaceRecord {
    pub name: String,
    pub family: AddressFamily,
    /// Numeric host form ("192.168.1.4", "fe80::1%en0"); never a resolved name.
    pub address: Option<String>,
    pub flags: InterfaceFlags,
}

impl InterfaceRecord {
    /// Up, running, not loopback, and carrying an IP address.
    pub fn is_active(&self) -> bool {
        self.flags.up
            && self.flags.running
            && !self.flags.loopback
            && self.address.is_some()
            && matches!(self.family, AddressFamily::Ipv4 | AddressFamily::Ipv6)
    }
}

/// Display as reported by the OS, before normalization into a `DisplaySpec`.
#[derive(Debug, Clone, PartialEq)]
pub struct RawDisplay {
    pub name: String,
    /// The OS reports the panel as internal to the machine.
    pub internal: bool,
    pub width: u32,
    pub height: u32,
    pub scale_factor: f64,
    pub refresh_rate_hz: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UserIdentity {
    pub user_name: Option<String>,
    pub full_name: Option<String>,
}

/// Raw host queries. Implementations must not block indefinitely; each method is one bounded query.
pub trait HostProbe: Send + Sync {
    /// Raw hardware model identifier (`hw.model` on desktops, `hw.machine` on handhelds).
    fn hardware_model(&self, tier: HostTier) -> Result<String, ProbeError>;

    /// Descriptive processor brand string.
    fn cpu_brand(&self) -> Result<String, ProbeError>;

    fn uptime_secs(&self) -> u64;

    /// Host name, OS, memory and processor count. Individual fields degrade to empty / zero.
    fn host_facts(&self) -> HostFacts;

    /// Flattened OS interface list, one record per (interface, address) pair.
    fn interfaces(&self) -> Result<Vec<InterfaceRecord>, ProbeError>;

    /// Link technology for each of `names`, in the same order.
    fn interface_kinds(&self, names: &[String]) -> Vec<InterfaceType>;

    /// Burned-in address of the primary Ethernet-class interface. `Ok(None)` when there is none.
    fn primary_mac_address(&self, interface: Option<&str>) -> Result<Option<Vec<u8>>, ProbeError>;

    fn serial_number(&self) -> Result<String, ProbeError>;

    /// `Ok(None)` when the host has no battery.
    fn battery_percentage(&self) -> Result<Option<u8>, ProbeError>;

    fn current_user(&self) -> Result<UserIdentity, ProbeError>;

    /// Every attached display.
    fn displays(&self) -> Result<Vec<RawDisplay>, ProbeError>;

    /// The main display only (handheld hosts have exactly one).
    fn main_display(&self) -> Result<Option<RawDisplay>, ProbeError> {
        Ok(self.displays()?.into_iter().next())
    }
}

/// Name-convention fallback when the OS cannot tell us the link technology.
pub fn kind_from_name(name: &str) -> InterfaceType {
    if name.starts_with("lo") {
        InterfaceType::Loopback
    } else if ["pdp_ip", "ww", "rmnet"].iter().any(|p| name.starts_with(p)) {
        InterfaceType::Cellular
    } else if name.starts_with("wl") {
        InterfaceType::Wifi
    } else if name.starts_with("en") || name.starts_with("eth") {
        InterfaceType::WiredEthernet
    } else {
        InterfaceType::Other
    }
}

fn native_device_type(os_name: &str) -> String {
    #[cfg(target_os = "macos")]
    {
        let _ = os_name;
        "Mac".to_string()
    }

    #[cfg(target_os = "ios")]
    {
        ffi::sysctl_string("hw.machine")
            .ok()
            .and_then(|machine| crate::identifier::device_type_label(&machine))
            .map_or_else(|| os_name.to_string(), str::to_string)
    }

    #[cfg(not(any(target_os = "macos", target_os = "ios")))]
    {
        os_name.to_string()
    }
}

/// Probe backed by the running operating system.
pub struct NativeProbe {
    sys: std::sync::Mutex<System>,
}

impl Default for NativeProbe {
    fn default() -> Self {
        Self::new()
    }
}

impl NativeProbe {
    pub fn new() -> Self {
        let mut sys = System::new();
        sys.refresh_memory();
        sys.refresh_cpu_all();
        Self {
            sys: std::sync::Mutex::new(sys),
        }
    }

    #[cfg_attr(any(target_os = "macos", target_os = "ios"), allow(dead_code))]
    fn sysinfo_cpu_brand(&self) -> Option<String> {
        let sys = self.sys.lock().unwrap_or_else(|e| e.into_inner());
        sys.cpus()
            .first()
            .map(|c| c.brand().trim().to_string())
            .filter(|s| !s.is_empty())
    }
}

impl HostProbe for NativeProbe {
    #[instrument(skip(self), fields(probe = "native", operation = "hardware_model"))]
    fn hardware_model(&self, tier: HostTier) -> Result<String, ProbeError> {
        #[cfg(any(target_os = "macos", target_os = "ios"))]
        {
            let key = match tier {
                HostTier::Desktop => "hw.model",
                HostTier::Handheld => "hw.machine",
            };
            ffi::sysctl_string(key)
        }

        #[cfg(target_os = "linux")]
        {
            let _ = tier;
            linux::read_product_name().ok_or(ProbeError::Empty("dmi product_name"))
        }

        #[cfg(not(any(target_os = "macos", target_os = "ios", target_os = "linux")))]
        {
            let _ = tier;
            Err(ProbeError::Unsupported("hardware model query"))
        }
    }

    #[instrument(skip(self), fields(probe = "native", operation = "cpu_brand"))]
    fn cpu_brand(&self) -> Result<String, ProbeError> {
        #[cfg(any(target_os = "macos", target_os = "ios"))]
        {
            ffi::sysctl_string("machdep.cpu.brand_string")
        }

        #[cfg(not(any(target_os = "macos", target_os = "ios")))]
        {
            linux::read_cpu_brand()
                .or_else(|| self.sysinfo_cpu_brand())
                .ok_or(ProbeError::Empty("cpu brand"))
        }
    }

    fn uptime_secs(&self) -> u64 {
        System::uptime()
    }

    #[instrument(skip(self), fields(probe = "native", operation = "host_facts"))]
    fn host_facts(&self) -> HostFacts {
        let mut sys = self.sys.lock().unwrap_or_else(|e| e.into_inner());
        sys.refresh_memory();
        let os_name = System::name().unwrap_or_else(|| std::env::consts::OS.into());
        HostFacts {
            host_name: System::host_name().unwrap_or_default(),
            device_type: native_device_type(&os_name),
            os_name,
            os_version: System::os_version().unwrap_or_default(),
            physical_memory_gb: sys.total_memory() / GIB,
            processor_count: sys.cpus().len().min(u32::MAX as usize) as u32,
        }
    }

    fn interfaces(&self) -> Result<Vec<InterfaceRecord>, ProbeError> {
        #[cfg(unix)]
        {
            ffi::interface_addresses()
        }

        #[cfg(not(unix))]
        {
            Err(ProbeError::Unsupported("interface enumeration"))
        }
    }

    fn interface_kinds(&self, names: &[String]) -> Vec<InterfaceType> {
        #[cfg(target_os = "macos")]
        {
            let ports = macos::hardware_ports().unwrap_or_else(|e| {
                tracing::debug!(error = %e, operation = "hardware_ports", "falling back to interface names");
                Default::default()
            });
            names
                .iter()
                .map(|n| ports.get(n).copied().unwrap_or_else(|| kind_from_name(n)))
                .collect()
        }

        #[cfg(target_os = "ios")]
        {
            // en* is always the Wi-Fi radio on handhelds.
            names
                .iter()
                .map(|n| {
                    if n.starts_with("en") {
                        InterfaceType::Wifi
                    } else {
                        kind_from_name(n)
                    }
                })
                .collect()
        }

        #[cfg(target_os = "linux")]
        {
            names.iter().map(|n| linux::interface_kind(n)).collect()
        }

        #[cfg(not(any(target_os = "macos", target_os = "ios", target_os = "linux")))]
        {
            names.iter().map(|n| kind_from_name(n)).collect()
        }
    }

    #[instrument(skip(self), fields(probe = "native", operation = "primary_mac_address"))]
    fn primary_mac_address(&self, interface: Option<&str>) -> Result<Option<Vec<u8>>, ProbeError> {
        #[cfg(target_os = "macos")]
        {
            let _ = interface;
            macos::primary_mac_from_registry()
        }

        #[cfg(target_os = "linux")]
        {
            Ok(interface.and_then(linux::read_interface_mac))
        }

        #[cfg(not(any(target_os = "macos", target_os = "linux")))]
        {
            let _ = interface;
            Err(ProbeError::Unsupported("device registry"))
        }
    }

    #[instrument(skip(self), fields(probe = "native", operation = "serial_number"))]
    fn serial_number(&self) -> Result<String, ProbeError> {
        #[cfg(target_os = "macos")]
        {
            macos::serial_number()
        }

        #[cfg(target_os = "linux")]
        {
            linux::read_product_serial().ok_or(ProbeError::Empty("dmi product_serial"))
        }

        #[cfg(not(any(target_os = "macos", target_os = "linux")))]
        {
            Err(ProbeError::Unsupported("serial number"))
        }
    }

    fn battery_percentage(&self) -> Result<Option<u8>, ProbeError> {
        #[cfg(not(any(target_os = "ios", target_os = "android")))]
        {
            use starship_battery::Manager;

            let failed = |e: starship_battery::Error| ProbeError::QueryFailed {
                key: "power sources",
                reason: e.to_string(),
            };
            let manager = Manager::new().map_err(failed)?;
            let mut batteries = manager.batteries().map_err(failed)?;
            match batteries.next() {
                Some(battery) => {
                    let battery = battery.map_err(failed)?;
                    let charge = f64::from(battery.state_of_charge().value) * 100.0;
                    Ok(Some(charge.round().clamp(0.0, 100.0) as u8))
                }
                None => Ok(None),
            }
        }

        #[cfg(any(target_os = "ios", target_os = "android"))]
        {
            Err(ProbeError::Unsupported("power sources"))
        }
    }

    fn current_user(&self) -> Result<UserIdentity, ProbeError> {
        #[cfg(unix)]
        {
            ffi::current_user()
        }

        #[cfg(not(unix))]
        {
            Err(ProbeError::Unsupported("user database"))
        }
    }

    #[instrument(skip(self), fields(probe = "native", operation = "displays"))]
    fn displays(&self) -> Result<Vec<RawDisplay>, ProbeError> {
        #[cfg(target_os = "macos")]
        {
            macos::displays()
        }

        #[cfg(target_os = "linux")]
        {
            linux::read_drm_displays(std::path::Path::new(linux::DRM_ROOT))
        }

        #[cfg(not(any(target_os = "macos", target_os = "linux")))]
        {
            Err(ProbeError::Unsupported("display enumeration"))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_from_name_follows_interface_conventions() {
        assert_eq!(kind_from_name("lo0"), InterfaceType::Loopback);
        assert_eq!(kind_from_name("pdp_ip0"), InterfaceType::Cellular);
        assert_eq!(kind_from_name("wwan0"), InterfaceType::Cellular);
        assert_eq!(kind_from_name("wlp2s0"), InterfaceType::Wifi);
        assert_eq!(kind_from_name("en0"), InterfaceType::WiredEthernet);
        assert_eq!(kind_from_name("eth1"), InterfaceType::WiredEthernet);
        assert_eq!(kind_from_name("utun3"), InterfaceType::Other);
    }

    #[test]
    fn active_requires_up_running_and_ip_address() {
        let mut record = InterfaceRecord {
            name: "en0".into(),
            family: AddressFamily::Ipv4,
            address: Some("192.168.1.4".into()),
            flags: InterfaceFlags {
                up: true,
                running: true,
                loopback: false,
            },
        };
        assert!(record.is_active());

        record.flags.running = false;
        assert!(!record.is_active());

        record.flags.running = true;
        record.family = AddressFamily::Link;
        assert!(!record.is_active());
    }
}
