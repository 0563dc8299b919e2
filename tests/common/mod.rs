// Shared test helpers: a scripted HostProbe and record builders

#![allow(dead_code)]

use devinfo::error::ProbeError;
use devinfo::host_probe::{
    AddressFamily, HostProbe, InterfaceFlags, InterfaceRecord, RawDisplay, UserIdentity,
    kind_from_name,
};
use devinfo::models::{HostFacts, HostTier, InterfaceType};
use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

/// Everything the fake reports. `None` makes the corresponding query fail.
#[derive(Debug, Clone)]
pub struct FakeState {
    pub hardware_model: Option<String>,
    pub cpu_brand: Option<String>,
    pub uptime_secs: u64,
    pub interfaces: Option<Vec<InterfaceRecord>>,
    pub kinds: HashMap<String, InterfaceType>,
    pub mac: Option<Vec<u8>>,
    pub serial: Option<String>,
    pub battery: Option<u8>,
    pub user: Option<UserIdentity>,
    pub displays: Option<Vec<RawDisplay>>,
    /// How long `displays()` blocks before answering.
    pub display_delay: Duration,
}

impl Default for FakeState {
    fn default() -> Self {
        Self {
            hardware_model: Some("MacBookPro18,3".into()),
            cpu_brand: Some("Apple M1 Pro".into()),
            uptime_secs: 3661,
            interfaces: Some(vec![
                record("lo0", AddressFamily::Ipv4, Some("127.0.0.1"), true),
                record("en0", AddressFamily::Link, None, false),
                record("en0", AddressFamily::Ipv4, Some("192.168.1.4"), false),
                record("en0", AddressFamily::Ipv6, Some("fe80::1%en0"), false),
            ]),
            kinds: HashMap::from([("en0".to_string(), InterfaceType::Wifi)]),
            mac: Some(vec![0xa4, 0x83, 0xe7, 0x11, 0x22, 0x33]),
            serial: Some("C02XK0AAJGH5".into()),
            battery: Some(87),
            user: Some(UserIdentity {
                user_name: Some("jdoe".into()),
                full_name: Some("Jane Doe".into()),
            }),
            displays: Some(vec![built_in_display()]),
            display_delay: Duration::ZERO,
        }
    }
}

#[derive(Default)]
pub struct FakeProbe {
    pub state: Mutex<FakeState>,
    pub hardware_model_calls: AtomicUsize,
    pub host_facts_calls: AtomicUsize,
    pub display_calls: AtomicUsize,
    pub interface_calls: AtomicUsize,
}

impl FakeProbe {
    pub fn new(state: FakeState) -> Self {
        Self {
            state: Mutex::new(state),
            ..Default::default()
        }
    }

    pub fn update(&self, f: impl FnOnce(&mut FakeState)) {
        f(&mut self.state.lock().unwrap());
    }

    fn snapshot(&self) -> FakeState {
        self.state.lock().unwrap().clone()
    }
}

impl HostProbe for FakeProbe {
    fn hardware_model(&self, _tier: HostTier) -> Result<String, ProbeError> {
        self.hardware_model_calls.fetch_add(1, Ordering::SeqCst);
        self.snapshot().hardware_model.ok_or(ProbeError::QueryFailed {
            key: "hw.model",
            reason: "scripted failure".into(),
        })
    }

    fn cpu_brand(&self) -> Result<String, ProbeError> {
        self.snapshot()
            .cpu_brand
            .ok_or(ProbeError::Empty("machdep.cpu.brand_string"))
    }

    fn uptime_secs(&self) -> u64 {
        self.snapshot().uptime_secs
    }

    fn host_facts(&self) -> HostFacts {
        self.host_facts_calls.fetch_add(1, Ordering::SeqCst);
        HostFacts {
            host_name: "test-host".into(),
            device_type: "Mac".into(),
            os_name: "macOS".into(),
            os_version: "14.5".into(),
            physical_memory_gb: 16,
            processor_count: 10,
        }
    }

    fn interfaces(&self) -> Result<Vec<InterfaceRecord>, ProbeError> {
        self.interface_calls.fetch_add(1, Ordering::SeqCst);
        self.snapshot()
            .interfaces
            .ok_or(ProbeError::Unsupported("interface enumeration"))
    }

    fn interface_kinds(&self, names: &[String]) -> Vec<InterfaceType> {
        let state = self.snapshot();
        names
            .iter()
            .map(|n| state.kinds.get(n).copied().unwrap_or_else(|| kind_from_name(n)))
            .collect()
    }

    fn primary_mac_address(&self, _interface: Option<&str>) -> Result<Option<Vec<u8>>, ProbeError> {
        self.snapshot()
            .mac
            .map(Some)
            .ok_or(ProbeError::Unsupported("device registry"))
    }

    fn serial_number(&self) -> Result<String, ProbeError> {
        self.snapshot().serial.ok_or(ProbeError::Empty("serial number"))
    }

    fn battery_percentage(&self) -> Result<Option<u8>, ProbeError> {
        Ok(self.snapshot().battery)
    }

    fn current_user(&self) -> Result<UserIdentity, ProbeError> {
        self.snapshot().user.ok_or(ProbeError::Empty("passwd entry"))
    }

    fn displays(&self) -> Result<Vec<RawDisplay>, ProbeError> {
        self.display_calls.fetch_add(1, Ordering::SeqCst);
        let state = self.snapshot();
        if !state.display_delay.is_zero() {
            std::thread::sleep(state.display_delay);
        }
        state
            .displays
            .ok_or(ProbeError::Unsupported("display enumeration"))
    }
}

/// Up and running interface record; `loopback` also sets the loopback flag.
pub fn record(
    name: &str,
    family: AddressFamily,
    address: Option<&str>,
    loopback: bool,
) -> InterfaceRecord {
    InterfaceRecord {
        name: name.into(),
        family,
        address: address.map(str::to_string),
        flags: InterfaceFlags {
            up: true,
            running: true,
            loopback,
        },
    }
}

pub fn built_in_display() -> RawDisplay {
    RawDisplay {
        name: "Color LCD".into(),
        internal: true,
        width: 3024,
        height: 1964,
        scale_factor: 2.0,
        refresh_rate_hz: Some(120.0),
    }
}

pub fn external_display() -> RawDisplay {
    RawDisplay {
        name: "DELL U2720Q".into(),
        internal: false,
        width: 3840,
        height: 2160,
        scale_factor: 1.0,
        refresh_rate_hz: Some(59.94),
    }
}
