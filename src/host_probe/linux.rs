// Linux-specific helpers: /proc, DMI, /sys/class/net, DRM connectors.
#![cfg_attr(not(target_os = "linux"), allow(dead_code))]

use std::path::Path;

use super::{RawDisplay, kind_from_name};
use crate::error::ProbeError;
use crate::models::InterfaceType;

pub(super) const DRM_ROOT: &str = "/sys/class/drm";

/// Processor brand string for the chipset heuristic. x86 kernels report it as "model name";
/// ARM kernels often have no such line and fall through to sysinfo.
pub(super) fn read_cpu_brand() -> Option<String> {
    #[cfg(target_os = "linux")]
    {
        let content = std::fs::read_to_string("/proc/cpuinfo").ok()?;
        parse_cpu_brand(&content)
    }
    #[cfg(not(target_os = "linux"))]
    {
        None
    }
}

/// First non-placeholder "model name" value.
fn parse_cpu_brand(cpuinfo: &str) -> Option<String> {
    cpuinfo
        .lines()
        .filter(|line| line.starts_with("model name"))
        .filter_map(|line| line.split_once(':'))
        .map(|(_, value)| value.trim())
        .find(|value| !value.is_empty() && !value.starts_with("cpu"))
        .map(str::to_string)
}

/// DMI product name, the closest Linux analogue of `hw.model` (e.g. "MacBookPro11,1" on Apple hardware).
pub(super) fn read_product_name() -> Option<String> {
    read_dmi("product_name")
}

/// DMI serial; usually readable by root only.
pub(super) fn read_product_serial() -> Option<String> {
    read_dmi("product_serial")
}

fn read_dmi(field: &str) -> Option<String> {
    #[cfg(target_os = "linux")]
    {
        let v = std::fs::read_to_string(format!("/sys/class/dmi/id/{field}")).ok()?;
        let v = v.trim();
        if v.is_empty() {
            return None;
        }
        Some(v.to_string())
    }
    #[cfg(not(target_os = "linux"))]
    {
        let _ = field;
        None
    }
}

/// Hardware address of `interface` from /sys/class/net/<interface>/address.
pub(super) fn read_interface_mac(interface: &str) -> Option<Vec<u8>> {
    #[cfg(target_os = "linux")]
    {
        let content = std::fs::read_to_string(format!("/sys/class/net/{interface}/address")).ok()?;
        parse_mac(&content)
    }
    #[cfg(not(target_os = "linux"))]
    {
        let _ = interface;
        None
    }
}

/// "a4:83:e7:11:22:33" -> bytes. All-zero addresses (virtual links) count as absent.
pub(super) fn parse_mac(text: &str) -> Option<Vec<u8>> {
    let bytes = text
        .trim()
        .split(':')
        .map(|octet| u8::from_str_radix(octet, 16).ok())
        .collect::<Option<Vec<u8>>>()?;
    if bytes.len() != 6 || bytes.iter().all(|&b| b == 0) {
        return None;
    }
    Some(bytes)
}

/// Wireless devices expose a `wireless` or `phy80211` node; other physical devices a `device` link.
pub(super) fn interface_kind(name: &str) -> InterfaceType {
    interface_kind_in(Path::new("/sys/class/net"), name)
}

pub(super) fn interface_kind_in(net_root: &Path, name: &str) -> InterfaceType {
    let dir = net_root.join(name);
    if dir.join("wireless").exists() || dir.join("phy80211").exists() {
        return InterfaceType::Wifi;
    }
    match kind_from_name(name) {
        InterfaceType::Other if dir.join("device").exists() => InterfaceType::WiredEthernet,
        kind => kind,
    }
}

/// Connected DRM connectors (`card0-eDP-1`, `card1-HDMI-A-1`, ...) with their preferred mode.
pub(super) fn read_drm_displays(root: &Path) -> Result<Vec<RawDisplay>, ProbeError> {
    let entries = std::fs::read_dir(root).map_err(|e| ProbeError::io("read drm connectors", e))?;
    let mut connectors: Vec<_> = entries
        .filter_map(|e| e.ok())
        .filter_map(|e| e.file_name().into_string().ok())
        .filter(|name| name.starts_with("card") && name.contains('-'))
        .collect();
    connectors.sort();

    let mut displays = Vec::new();
    for connector in connectors {
        let dir = root.join(&connector);
        let status = std::fs::read_to_string(dir.join("status")).unwrap_or_default();
        if status.trim() != "connected" {
            continue;
        }
        let modes = std::fs::read_to_string(dir.join("modes")).unwrap_or_default();
        let Some((width, height)) = modes.lines().next().and_then(parse_mode) else {
            tracing::debug!(connector = %connector, "connected connector without modes");
            continue;
        };
        let port = connector
            .split_once('-')
            .map(|(_, port)| port.to_string())
            .unwrap_or_default();
        displays.push(RawDisplay {
            internal: is_internal_port(&port),
            name: port,
            width,
            height,
            scale_factor: 1.0,
            refresh_rate_hz: None,
        });
    }
    Ok(displays)
}

/// "1920x1080" (optionally suffixed, e.g. "1920x1080i") -> (1920, 1080)
fn parse_mode(line: &str) -> Option<(u32, u32)> {
    let (w, h) = line.trim().split_once('x')?;
    let h: String = h.chars().take_while(|c| c.is_ascii_digit()).collect();
    Some((w.parse().ok()?, h.parse().ok()?))
}

fn is_internal_port(port: &str) -> bool {
    ["eDP", "LVDS", "DSI"].iter().any(|p| port.starts_with(p))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn connector(root: &Path, name: &str, status: &str, modes: &str) {
        let dir = root.join(name);
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(dir.join("status"), status).unwrap();
        std::fs::write(dir.join("modes"), modes).unwrap();
    }

    #[test]
    fn drm_reads_connected_connectors_only() {
        let dir = tempfile::TempDir::new().unwrap();
        connector(dir.path(), "card0-eDP-1", "connected\n", "2256x1504\n1920x1200\n");
        connector(dir.path(), "card0-HDMI-A-1", "connected\n", "3840x2160\n");
        connector(dir.path(), "card0-DP-2", "disconnected\n", "");
        std::fs::create_dir_all(dir.path().join("card0")).unwrap();

        let displays = read_drm_displays(dir.path()).unwrap();
        assert_eq!(displays.len(), 2);
        let edp = displays.iter().find(|d| d.name == "eDP-1").unwrap();
        assert!(edp.internal);
        assert_eq!((edp.width, edp.height), (2256, 1504));
        let hdmi = displays.iter().find(|d| d.name == "HDMI-A-1").unwrap();
        assert!(!hdmi.internal);
        assert_eq!(hdmi.refresh_rate_hz, None);
    }

    #[test]
    fn cpu_brand_skips_placeholder_model_names() {
        let x86 = "processor\t: 0\nmodel name\t: Intel(R) Core(TM) i7-8700 CPU @ 3.20GHz\nflags\t\t: fpu\n";
        assert_eq!(
            parse_cpu_brand(x86).as_deref(),
            Some("Intel(R) Core(TM) i7-8700 CPU @ 3.20GHz")
        );

        let placeholder = "model name\t: cpu0\nmodel name\t: AMD Ryzen 7 5800X 8-Core Processor\n";
        assert_eq!(
            parse_cpu_brand(placeholder).as_deref(),
            Some("AMD Ryzen 7 5800X 8-Core Processor")
        );

        let arm = "processor\t: 0\nBogoMIPS\t: 108.00\nCPU implementer\t: 0x41\n";
        assert_eq!(parse_cpu_brand(arm), None);
        assert_eq!(parse_cpu_brand("model name\t:\n"), None);
    }

    #[test]
    fn drm_missing_root_is_an_error() {
        let dir = tempfile::TempDir::new().unwrap();
        assert!(read_drm_displays(&dir.path().join("nope")).is_err());
    }

    #[test]
    fn parse_mode_handles_interlaced_suffix() {
        assert_eq!(parse_mode("1920x1080i"), Some((1920, 1080)));
        assert_eq!(parse_mode("garbage"), None);
    }

    #[test]
    fn parse_mac_rejects_zero_and_malformed() {
        assert_eq!(
            parse_mac("a4:83:e7:11:22:33\n"),
            Some(vec![0xa4, 0x83, 0xe7, 0x11, 0x22, 0x33])
        );
        assert_eq!(parse_mac("00:00:00:00:00:00"), None);
        assert_eq!(parse_mac("a4:83:zz:11:22:33"), None);
        assert_eq!(parse_mac("a4:83"), None);
    }

    #[test]
    fn sysfs_wireless_node_wins_over_name() {
        let dir = tempfile::TempDir::new().unwrap();
        std::fs::create_dir_all(dir.path().join("enx0/wireless")).unwrap();
        std::fs::create_dir_all(dir.path().join("usb0/device")).unwrap();
        assert_eq!(interface_kind_in(dir.path(), "enx0"), InterfaceType::Wifi);
        assert_eq!(interface_kind_in(dir.path(), "usb0"), InterfaceType::WiredEthernet);
        assert_eq!(interface_kind_in(dir.path(), "docker0"), InterfaceType::Other);
    }
}
