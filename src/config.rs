use serde::Deserialize;

use crate::network::DEFAULT_INTERFACE_PREFIXES;

const DEFAULT_CONFIG_PATH: &str = "config.toml";

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub monitoring: MonitoringConfig,
    pub network: NetworkConfig,
    pub publishing: PublishingConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct MonitoringConfig {
    /// Periodic snapshot tick.
    pub refresh_interval_ms: u64,
    /// Desktop display re-enumeration. On macOS each poll runs system_profiler.
    pub display_poll_interval_ms: u64,
    /// How often to log app stats (subscribers, snapshots published, network changes) at INFO level.
    pub stats_log_interval_secs: u64,
}

impl Default for MonitoringConfig {
    fn default() -> Self {
        Self {
            refresh_interval_ms: 1000,
            display_poll_interval_ms: 5000,
            stats_log_interval_secs: 60,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct NetworkConfig {
    /// Path watcher sampling period.
    pub poll_interval_ms: u64,
    /// Primary interface = first interface whose name starts with one of these.
    pub interface_prefixes: Vec<String>,
    /// Pending network states between the monitor and the aggregator.
    pub channel_capacity: usize,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            poll_interval_ms: 2000,
            interface_prefixes: default_interface_prefixes(),
            channel_capacity: 8,
        }
    }
}

fn default_interface_prefixes() -> Vec<String> {
    let mut prefixes: Vec<String> = DEFAULT_INTERFACE_PREFIXES
        .iter()
        .map(|p| p.to_string())
        .collect();
    if cfg!(target_os = "linux") {
        prefixes.extend(["eth", "wl", "ww"].map(String::from));
    }
    prefixes
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PublishingConfig {
    /// Max number of snapshots kept in the broadcast channel (slow subscribers may lag).
    pub broadcast_capacity: usize,
}

impl Default for PublishingConfig {
    fn default() -> Self {
        Self {
            broadcast_capacity: 16,
        }
    }
}

impl AppConfig {
    /// Reads `CONFIG_FILE` if set (the file must exist), else `config.toml` when present,
    /// else the built-in defaults.
    pub fn load() -> anyhow::Result<Self> {
        match std::env::var("CONFIG_FILE") {
            Ok(path) => Self::load_from_path(&path),
            Err(_) => match std::fs::read_to_string(DEFAULT_CONFIG_PATH) {
                Ok(s) => Self::load_from_str(&s),
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                    tracing::info!("{} not found, using defaults", DEFAULT_CONFIG_PATH);
                    Ok(Self::default())
                }
                Err(e) => Err(anyhow::anyhow!("{}: {}", DEFAULT_CONFIG_PATH, e)),
            },
        }
    }

    pub fn load_from_path(path: &str) -> anyhow::Result<Self> {
        let s = std::fs::read_to_string(path).map_err(|e| anyhow::anyhow!("{}: {}", path, e))?;
        Self::load_from_str(&s)
    }

    /// Parse and validate config from a string (e.g. for tests).
    pub fn load_from_str(s: &str) -> anyhow::Result<Self> {
        let config: AppConfig = toml::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> anyhow::Result<()> {
        anyhow::ensure!(
            self.monitoring.refresh_interval_ms > 0,
            "monitoring.refresh_interval_ms must be > 0, got {}",
            self.monitoring.refresh_interval_ms
        );
        anyhow::ensure!(
            self.monitoring.display_poll_interval_ms > 0,
            "monitoring.display_poll_interval_ms must be > 0, got {}",
            self.monitoring.display_poll_interval_ms
        );
        anyhow::ensure!(
            self.monitoring.stats_log_interval_secs > 0,
            "monitoring.stats_log_interval_secs must be > 0, got {}",
            self.monitoring.stats_log_interval_secs
        );
        anyhow::ensure!(
            self.network.poll_interval_ms > 0,
            "network.poll_interval_ms must be > 0, got {}",
            self.network.poll_interval_ms
        );
        anyhow::ensure!(
            !self.network.interface_prefixes.is_empty(),
            "network.interface_prefixes must be non-empty"
        );
        anyhow::ensure!(
            self.network.interface_prefixes.iter().all(|p| !p.is_empty()),
            "network.interface_prefixes must not contain empty prefixes"
        );
        anyhow::ensure!(
            self.network.channel_capacity > 0,
            "network.channel_capacity must be > 0, got {}",
            self.network.channel_capacity
        );
        anyhow::ensure!(
            self.publishing.broadcast_capacity > 0,
            "publishing.broadcast_capacity must be > 0, got {}",
            self.publishing.broadcast_capacity
        );
        Ok(())
    }
}
