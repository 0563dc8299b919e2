// Raw hardware identifier and simplified model name

use crate::host_probe::HostProbe;
use crate::models::HostTier;

pub const UNKNOWN_DEVICE: &str = "Unknown Device";

/// Family rules in priority order; the first contained token wins.
const FAMILY_RULES: &[(&str, &str)] = &[
    ("MacBook", "MacBook Pro"),
    ("iMac", "iMac"),
    ("Macmini", "Mac mini"),
    ("MacPro", "Mac Pro"),
    ("iPhone", "iPhone"),
    ("iPad", "iPad"),
];

/// Raw model string such as "iPhone15,3". Empty when the OS query fails.
pub fn resolve_identifier(probe: &dyn HostProbe, tier: HostTier) -> String {
    match probe.hardware_model(tier) {
        Ok(identifier) => identifier,
        Err(e) => {
            tracing::warn!(error = %e, operation = "resolve_identifier", "hardware model query failed");
            String::new()
        }
    }
}

/// Device category shown next to the host name. `None` for identifiers outside the Apple families.
pub fn device_type_label(identifier: &str) -> Option<&'static str> {
    if identifier.contains("iPad") {
        Some("iPad")
    } else if identifier.contains("iPhone") {
        Some("iPhone")
    } else if identifier.starts_with("Mac") || identifier.starts_with("iMac") {
        Some("Mac")
    } else {
        None
    }
}

pub fn simplify_model_name(identifier: &str) -> String {
    FAMILY_RULES
        .iter()
        .find(|(token, _)| identifier.contains(token))
        .map(|(_, family)| *family)
        .unwrap_or(UNKNOWN_DEVICE)
        .to_string()
}
