// Library for tests to access modules

pub mod aggregator;
pub mod chipset;
pub mod config;
pub mod display;
pub mod display_watcher;
pub mod error;
pub mod host_probe;
pub mod identifier;
pub mod models;
pub mod network;
pub mod uptime;
