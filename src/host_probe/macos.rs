// macOS helpers: system_profiler, ioreg and networksetup output parsing.
#![cfg_attr(not(target_os = "macos"), allow(dead_code))]

use regex::Regex;
use serde::Deserialize;
use std::collections::HashMap;
use std::process::Command;

use super::RawDisplay;
use crate::error::ProbeError;
use crate::models::InterfaceType;

#[allow(clippy::expect_used)] // good regex, it doesn't panic
static SERIAL_REGEX: std::sync::LazyLock<Regex> = std::sync::LazyLock::new(|| {
    Regex::new(r"Serial Number \(system\):\s*(\S+)").expect("static regex should not panic")
});
#[allow(clippy::expect_used)] // good regex, it doesn't panic
static MAC_REGEX: std::sync::LazyLock<Regex> = std::sync::LazyLock::new(|| {
    Regex::new(r#""IOMACAddress" = <([0-9a-fA-F]{12})>"#).expect("static regex should not panic")
});
#[allow(clippy::expect_used)] // good regex, it doesn't panic
static DIMENSIONS_REGEX: std::sync::LazyLock<Regex> = std::sync::LazyLock::new(|| {
    Regex::new(r"(\d+)\s*x\s*(\d+)").expect("static regex should not panic")
});
#[allow(clippy::expect_used)] // good regex, it doesn't panic
static REFRESH_REGEX: std::sync::LazyLock<Regex> = std::sync::LazyLock::new(|| {
    Regex::new(r"@\s*([\d.]+)\s*Hz").expect("static regex should not panic")
});

fn run(command: &'static str, args: &[&str]) -> Result<String, ProbeError> {
    let output = Command::new(command)
        .args(args)
        .output()
        .map_err(|e| ProbeError::io(command, e))?;
    if !output.status.success() {
        return Err(ProbeError::Command {
            command,
            status: output.status.to_string(),
        });
    }
    Ok(String::from_utf8_lossy(&output.stdout).into_owned())
}

pub(super) fn serial_number() -> Result<String, ProbeError> {
    let output = run("system_profiler", &["SPHardwareDataType"])?;
    parse_serial_number(&output).ok_or(ProbeError::Empty("Serial Number (system)"))
}

pub(super) fn parse_serial_number(output: &str) -> Option<String> {
    SERIAL_REGEX
        .captures(output)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().to_string())
}

/// Ethernet controllers with their attached interfaces one level below.
pub(super) fn primary_mac_from_registry() -> Result<Option<Vec<u8>>, ProbeError> {
    let output = run(
        "ioreg",
        &["-r", "-c", "IOEthernetController", "-l", "-d", "2", "-w", "0"],
    )?;
    Ok(parse_primary_mac(&output))
}

/// Finds the controller whose child interface carries `IOPrimaryInterface = Yes` and returns the
/// controller's `IOMACAddress`. Each controller subtree starts with a top-level `+-o` line.
pub(super) fn parse_primary_mac(output: &str) -> Option<Vec<u8>> {
    let mut blocks: Vec<String> = Vec::new();
    for line in output.lines() {
        if line.starts_with("+-o") || blocks.is_empty() {
            blocks.push(String::new());
        }
        if let Some(block) = blocks.last_mut() {
            block.push_str(line);
            block.push('\n');
        }
    }

    blocks
        .iter()
        .filter(|b| b.contains("\"IOPrimaryInterface\" = Yes"))
        .find_map(|b| MAC_REGEX.captures(b).and_then(|c| c.get(1)))
        .and_then(|hex| decode_hex(hex.as_str()))
}

fn decode_hex(hex: &str) -> Option<Vec<u8>> {
    (0..hex.len())
        .step_by(2)
        .map(|i| hex.get(i..i + 2).and_then(|h| u8::from_str_radix(h, 16).ok()))
        .collect()
}

/// Interface name -> link technology, from the hardware port list.
pub(super) fn hardware_ports() -> Result<HashMap<String, InterfaceType>, ProbeError> {
    let output = run("networksetup", &["-listallhardwareports"])?;
    Ok(parse_hardware_ports(&output))
}

pub(super) fn parse_hardware_ports(output: &str) -> HashMap<String, InterfaceType> {
    let mut ports = HashMap::new();
    let mut port: Option<&str> = None;
    for line in output.lines() {
        if let Some(name) = line.strip_prefix("Hardware Port: ") {
            port = Some(name.trim());
        } else if let Some(device) = line.strip_prefix("Device: ")
            && let Some(name) = port.take()
        {
            ports.insert(device.trim().to_string(), port_kind(name));
        }
    }
    ports
}

fn port_kind(port: &str) -> InterfaceType {
    let port = port.to_lowercase();
    if port.contains("wi-fi") || port.contains("airport") {
        InterfaceType::Wifi
    } else if port.contains("ethernet") || port.contains("lan") || port.contains("thunderbolt") {
        InterfaceType::WiredEthernet
    } else if port.contains("iphone") || port.contains("cellular") || port.contains("wwan") {
        InterfaceType::Cellular
    } else {
        InterfaceType::Other
    }
}

#[derive(Debug, Deserialize)]
struct DisplaysReport {
    #[serde(rename = "SPDisplaysDataType", default)]
    gpus: Vec<GpuEntry>,
}

#[derive(Debug, Deserialize)]
struct GpuEntry {
    #[serde(rename = "spdisplays_ndrvs", default)]
    displays: Vec<DisplayEntry>,
}

#[derive(Debug, Deserialize)]
struct DisplayEntry {
    #[serde(rename = "_name", default)]
    name: String,
    #[serde(rename = "_spdisplays_pixels")]
    pixels: Option<String>,
    #[serde(rename = "_spdisplays_resolution")]
    resolution: Option<String>,
    #[serde(rename = "spdisplays_connection_type")]
    connection_type: Option<String>,
    #[serde(rename = "spdisplays_display_type")]
    display_type: Option<String>,
}

/// Spawns `system_profiler SPDisplaysDataType`, which takes hundreds of milliseconds. Callers
/// poll it from the display watcher, never from a refresh cycle.
pub(super) fn displays() -> Result<Vec<RawDisplay>, ProbeError> {
    let output = run("system_profiler", &["SPDisplaysDataType", "-json"])?;
    parse_displays(&output)
}

pub(super) fn parse_displays(json: &str) -> Result<Vec<RawDisplay>, ProbeError> {
    let report: DisplaysReport = serde_json::from_str(json).map_err(|e| ProbeError::Parse {
        what: "SPDisplaysDataType",
        detail: e.to_string(),
    })?;
    Ok(report
        .gpus
        .into_iter()
        .flat_map(|gpu| gpu.displays)
        .filter_map(raw_display)
        .collect())
}

fn raw_display(entry: DisplayEntry) -> Option<RawDisplay> {
    let looks_like = entry.resolution.as_deref().and_then(dimensions);
    let (width, height) = entry
        .pixels
        .as_deref()
        .and_then(dimensions)
        .or(looks_like)?;
    let scale_factor = match looks_like {
        Some((points, _)) if points > 0 => f64::from(width) / f64::from(points),
        _ => 1.0,
    };
    let refresh_rate_hz = entry
        .resolution
        .as_deref()
        .and_then(|r| REFRESH_REGEX.captures(r))
        .and_then(|c| c.get(1)?.as_str().parse::<f64>().ok());
    let internal = entry.connection_type.as_deref() == Some("spdisplays_internal")
        || entry
            .display_type
            .as_deref()
            .is_some_and(|t| t.to_lowercase().contains("built-in"));
    Some(RawDisplay {
        name: entry.name,
        internal,
        width,
        height,
        scale_factor,
        refresh_rate_hz,
    })
}

fn dimensions(text: &str) -> Option<(u32, u32)> {
    let caps = DIMENSIONS_REGEX.captures(text)?;
    Some((caps.get(1)?.as_str().parse().ok()?, caps.get(2)?.as_str().parse().ok()?))
}

#[cfg(test)]
mod tests {
    use super::*;

    const IOREG: &str = r#"+-o AppleBCMWLANSkywalkInterface  <class AppleBCMWLANSkywalkInterface, id 0x100000a3c>
  | {
  |   "IOMACAddress" = <a483e7112233>
  |   "IOLinkSpeed" = 0
  | }
  |
  +-o en0  <class IO80211SkywalkInterface, id 0x100000a48>
      {
        "BSD Name" = "en0"
        "IOPrimaryInterface" = Yes
      }

+-o AppleThunderboltIPPort  <class AppleThunderboltIPPort, id 0x100000b10>
  | {
  |   "IOMACAddress" = <36a1b2c3d4e5>
  | }
  |
  +-o en1  <class AppleThunderboltIPInterface, id 0x100000b20>
      {
        "IOPrimaryInterface" = No
      }
"#;

    #[test]
    fn primary_mac_comes_from_parent_of_primary_interface() {
        assert_eq!(
            parse_primary_mac(IOREG),
            Some(vec![0xa4, 0x83, 0xe7, 0x11, 0x22, 0x33])
        );
    }

    #[test]
    fn no_primary_interface_means_no_mac() {
        let output = IOREG.replace("\"IOPrimaryInterface\" = Yes", "\"IOPrimaryInterface\" = No");
        assert_eq!(parse_primary_mac(&output), None);
    }

    #[test]
    fn serial_number_line_is_extracted() {
        let output = "Hardware:\n\n    Hardware Overview:\n\n      Model Name: MacBook Pro\n      Serial Number (system): C02XK1ABJGH5\n      Hardware UUID: 1234\n";
        assert_eq!(parse_serial_number(output).as_deref(), Some("C02XK1ABJGH5"));
        assert_eq!(parse_serial_number("Model Name: Mac mini\n"), None);
    }

    #[test]
    fn hardware_ports_map_devices_to_link_types() {
        let output = "\nHardware Port: Ethernet\nDevice: en0\nEthernet Address: 00:11:22:33:44:55\n\nHardware Port: Wi-Fi\nDevice: en1\nEthernet Address: a4:83:e7:11:22:33\n\nHardware Port: Thunderbolt Bridge\nDevice: bridge0\nEthernet Address: N/A\n\nHardware Port: iPhone USB\nDevice: en6\n";
        let ports = parse_hardware_ports(output);
        assert_eq!(ports.get("en0"), Some(&InterfaceType::WiredEthernet));
        assert_eq!(ports.get("en1"), Some(&InterfaceType::Wifi));
        assert_eq!(ports.get("bridge0"), Some(&InterfaceType::WiredEthernet));
        assert_eq!(ports.get("en6"), Some(&InterfaceType::Cellular));
    }

    #[test]
    fn displays_report_is_normalized() {
        let json = r#"{
          "SPDisplaysDataType": [{
            "_name": "Apple M1 Pro",
            "spdisplays_ndrvs": [
              {
                "_name": "Color LCD",
                "_spdisplays_pixels": "3024 x 1964",
                "_spdisplays_resolution": "1512 x 982 @ 120.00Hz",
                "spdisplays_connection_type": "spdisplays_internal",
                "spdisplays_display_type": "spdisplays_built-in-liquid-retina-xdr"
              },
              {
                "_name": "DELL U2720Q",
                "_spdisplays_pixels": "3840 x 2160",
                "_spdisplays_resolution": "1920 x 1080 @ 60.00Hz"
              },
              { "_name": "Placeholder" }
            ]
          }]
        }"#;
        let displays = parse_displays(json).unwrap();
        assert_eq!(displays.len(), 2);

        let builtin = &displays[0];
        assert!(builtin.internal);
        assert_eq!((builtin.width, builtin.height), (3024, 1964));
        assert_eq!(builtin.scale_factor, 2.0);
        assert_eq!(builtin.refresh_rate_hz, Some(120.0));

        let external = &displays[1];
        assert!(!external.internal);
        assert_eq!(external.scale_factor, 2.0);
        assert_eq!(external.refresh_rate_hz, Some(60.0));
    }

    #[test]
    fn malformed_displays_report_is_a_parse_error() {
        assert!(matches!(
            parse_displays("not json"),
            Err(ProbeError::Parse { .. })
        ));
    }
}
