// Domain models shared by the collectors, the aggregator and snapshot consumers

mod clock;
mod device;
mod display;
mod network;
mod snapshot;

pub use clock::SystemClock;
pub use device::{DesktopExtras, DeviceIdentity, HostFacts, HostTier};
pub use display::{DisplayKind, DisplaySpec};
pub use network::{ConnectionType, InterfaceType, NetworkState, PathStatus, PathUpdate};
pub use snapshot::Snapshot;
