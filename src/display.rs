// Display catalog: PPI lookup and normalization of enumerated displays

use std::collections::HashMap;
use std::sync::LazyLock;

use crate::host_probe::RawDisplay;
use crate::models::{DisplayKind, DisplaySpec};

/// Approximate pixel density of common iPhone and Mac panels.
static PPI_BY_IDENTIFIER: LazyLock<HashMap<&'static str, u32>> = LazyLock::new(|| {
    HashMap::from([
        // iPhone
        ("iPhone16,1", 460),
        ("iPhone16,2", 460),
        ("iPhone15,4", 460),
        ("iPhone15,5", 460),
        ("iPhone15,3", 460),
        ("iPhone15,2", 460),
        ("iPhone14,7", 460),
        ("iPhone14,5", 460),
        ("iPhone13,2", 460),
        ("iPhone12,1", 326),
        ("iPhone11,8", 326),
        ("iPhone10,6", 458),
        // Mac
        ("MacBookPro18,3", 254),
        ("MacBookPro18,4", 254),
        ("MacBookPro19,1", 254),
        ("MacBookPro19,2", 254),
        ("iMac21,1", 218),
        ("iMac21,2", 218),
    ])
});

/// `None` for unknown identifiers; callers hide the field rather than show zero.
pub fn resolve_ppi(identifier: &str) -> Option<u32> {
    PPI_BY_IDENTIFIER.get(identifier).copied()
}

/// Built-in iff the OS says so or the localized name says "built-in".
pub fn display_kind(raw: &RawDisplay) -> DisplayKind {
    if raw.internal || raw.name.to_lowercase().contains("built-in") {
        DisplayKind::BuiltIn
    } else {
        DisplayKind::External
    }
}

/// The host's PPI only describes its own panel, so it is attached to built-in displays only.
pub fn build_display_specs(raw: &[RawDisplay], ppi: Option<u32>) -> Vec<DisplaySpec> {
    raw.iter()
        .map(|d| {
            let kind = display_kind(d);
            DisplaySpec {
                kind,
                width: d.width,
                height: d.height,
                scale_factor: d.scale_factor,
                refresh_rate_hz: d
                    .refresh_rate_hz
                    .map(|hz| hz.round() as u32)
                    .filter(|&hz| hz > 0),
                ppi: ppi.filter(|_| kind == DisplayKind::BuiltIn),
            }
        })
        .collect()
}
