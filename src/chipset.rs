// Chipset resolution: brand-string heuristic on desktops, exact table on handhelds

use std::collections::HashMap;
use std::sync::LazyLock;

use crate::host_probe::HostProbe;
use crate::models::HostTier;

pub const UNKNOWN_CHIPSET: &str = "Unknown Chipset";

/// Handheld identifier -> SoC. Closed set captured at build time; newer devices resolve to unknown.
static HANDHELD_CHIPSETS: LazyLock<HashMap<&'static str, &'static str>> = LazyLock::new(|| {
    HashMap::from([
        // iPhone
        ("iPhone16,1", "Apple A17 Pro"),
        ("iPhone16,2", "Apple A17 Pro"),
        ("iPhone15,4", "Apple A16 Bionic"),
        ("iPhone15,5", "Apple A16 Bionic"),
        ("iPhone15,3", "Apple A16 Bionic"),
        ("iPhone15,2", "Apple A16 Bionic"),
        ("iPhone14,7", "Apple A15 Bionic"),
        ("iPhone14,8", "Apple A15 Bionic"),
        ("iPhone14,5", "Apple A15 Bionic"),
        ("iPhone14,4", "Apple A15 Bionic"),
        ("iPhone13,2", "Apple A14 Bionic"),
        ("iPhone13,1", "Apple A14 Bionic"),
        ("iPhone12,5", "Apple A13 Bionic"),
        ("iPhone12,3", "Apple A13 Bionic"),
        ("iPhone12,1", "Apple A13 Bionic"),
        ("iPhone11,8", "Apple A12 Bionic"),
        ("iPhone11,6", "Apple A12 Bionic"),
        ("iPhone11,4", "Apple A12 Bionic"),
        ("iPhone11,2", "Apple A12 Bionic"),
        ("iPhone10,6", "Apple A11 Bionic"),
        ("iPhone10,3", "Apple A11 Bionic"),
        ("iPhone10,5", "Apple A11 Bionic"),
        ("iPhone10,4", "Apple A11 Bionic"),
        ("iPhone9,2", "Apple A10 Fusion"),
        ("iPhone9,1", "Apple A10 Fusion"),
        ("iPhone9,4", "Apple A10 Fusion"),
        ("iPhone9,3", "Apple A10 Fusion"),
        ("iPhone8,2", "Apple A9"),
        ("iPhone8,1", "Apple A9"),
        ("iPhone7,2", "Apple A8"),
        ("iPhone7,1", "Apple A8"),
        ("iPhone6,2", "Apple A7"),
        ("iPhone6,1", "Apple A7"),
        // iPad
        ("iPad14,1", "Apple M2"),
        ("iPad14,2", "Apple M2"),
        ("iPad13,16", "Apple M1"),
        ("iPad13,17", "Apple M1"),
        ("iPad13,4", "Apple M1"),
        ("iPad13,5", "Apple M1"),
        ("iPad13,6", "Apple M1"),
        ("iPad13,7", "Apple M1"),
        ("iPad13,8", "Apple M1"),
        ("iPad13,9", "Apple M1"),
        ("iPad13,10", "Apple M1"),
        ("iPad13,11", "Apple M1"),
        ("iPad8,1", "Apple A12X Bionic"),
        ("iPad8,2", "Apple A12X Bionic"),
        ("iPad8,3", "Apple A12X Bionic"),
        ("iPad8,4", "Apple A12X Bionic"),
        ("iPad8,5", "Apple A12X Bionic"),
        ("iPad8,6", "Apple A12X Bionic"),
        ("iPad8,7", "Apple A12X Bionic"),
        ("iPad8,8", "Apple A12X Bionic"),
        ("iPad11,1", "Apple A12 Bionic"),
        ("iPad11,2", "Apple A12 Bionic"),
        ("iPad11,3", "Apple A12 Bionic"),
        ("iPad11,4", "Apple A12 Bionic"),
    ])
});

pub fn resolve_chipset(tier: HostTier, identifier: &str, probe: &dyn HostProbe) -> String {
    match tier {
        HostTier::Desktop => match probe.cpu_brand() {
            Ok(brand) => chipset_from_brand(&brand),
            Err(e) => {
                tracing::debug!(error = %e, operation = "resolve_chipset", "processor brand query failed");
                UNKNOWN_CHIPSET.to_string()
            }
        },
        HostTier::Handheld => handheld_chipset(identifier),
    }
}

/// Desktop heuristic over the processor brand string.
pub fn chipset_from_brand(brand: &str) -> String {
    let brand = brand.trim();
    if brand.contains("Intel") {
        "Intel".to_string()
    } else if brand.contains("Apple") {
        format!("Apple Silicon ({brand})")
    } else {
        UNKNOWN_CHIPSET.to_string()
    }
}

pub fn handheld_chipset(identifier: &str) -> String {
    HANDHELD_CHIPSETS
        .get(identifier)
        .copied()
        .unwrap_or(UNKNOWN_CHIPSET)
        .to_string()
}
