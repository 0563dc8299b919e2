// Chipset resolution: handheld table and desktop brand heuristic

mod common;

use common::{FakeProbe, FakeState};
use devinfo::chipset::{UNKNOWN_CHIPSET, chipset_from_brand, handheld_chipset, resolve_chipset};
use devinfo::models::HostTier;

#[test]
fn handheld_table_hits() {
    assert_eq!(handheld_chipset("iPhone16,1"), "Apple A17 Pro");
    assert_eq!(handheld_chipset("iPhone15,3"), "Apple A16 Bionic");
    assert_eq!(handheld_chipset("iPhone6,1"), "Apple A7");
    assert_eq!(handheld_chipset("iPad14,1"), "Apple M2");
}

#[test]
fn handheld_miss_is_unknown() {
    assert_eq!(handheld_chipset("iPhone99,9"), UNKNOWN_CHIPSET);
    assert_eq!(handheld_chipset(""), UNKNOWN_CHIPSET);
}

#[test]
fn handheld_never_queries_brand() {
    let probe = FakeProbe::new(FakeState {
        cpu_brand: Some("Intel(R) Core(TM) i9".into()),
        ..Default::default()
    });
    assert_eq!(
        resolve_chipset(HostTier::Handheld, "iPhone16,2", &probe),
        "Apple A17 Pro"
    );
}

#[test]
fn desktop_brand_heuristic() {
    assert_eq!(chipset_from_brand("Intel(R) Core(TM) i9-9980HK CPU @ 2.40GHz"), "Intel");
    assert_eq!(chipset_from_brand("Apple M1 Pro"), "Apple Silicon (Apple M1 Pro)");
    assert_eq!(chipset_from_brand("AMD Ryzen 9 7950X"), UNKNOWN_CHIPSET);
    assert_eq!(chipset_from_brand(""), UNKNOWN_CHIPSET);
}

#[test]
fn desktop_uses_probe_brand() {
    let probe = FakeProbe::new(FakeState {
        cpu_brand: Some("Apple M2".into()),
        ..Default::default()
    });
    assert_eq!(
        resolve_chipset(HostTier::Desktop, "Mac14,2", &probe),
        "Apple Silicon (Apple M2)"
    );
}

#[test]
fn desktop_brand_query_failure_is_unknown() {
    let probe = FakeProbe::new(FakeState {
        cpu_brand: None,
        ..Default::default()
    });
    assert_eq!(
        resolve_chipset(HostTier::Desktop, "MacBookPro18,3", &probe),
        UNKNOWN_CHIPSET
    );
}
