//! Raw configuration schema (as parsed from TOML)

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Raw configuration as parsed from TOML
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RawConfig {
    /// Config schema version
    #[serde(default = "current_version")]
    pub config_version: u32,

    /// Reconciliation loop settings
    #[serde(default)]
    pub daemon: RawDaemonConfig,

    /// Workload observer settings
    #[serde(default)]
    pub libvirt: RawLibvirtConfig,

    /// Sleep inhibitor settings
    #[serde(default)]
    pub inhibitor: RawInhibitorConfig,
}

impl Default for RawConfig {
    fn default() -> Self {
        Self {
            config_version: crate::CURRENT_CONFIG_VERSION,
            daemon: RawDaemonConfig::default(),
            libvirt: RawLibvirtConfig::default(),
            inhibitor: RawInhibitorConfig::default(),
        }
    }
}

fn current_version() -> u32 {
    crate::CURRENT_CONFIG_VERSION
}

/// Daemon-level settings
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct RawDaemonConfig {
    /// Seconds between reconciliation ticks (default: 10)
    pub tick_interval_seconds: Option<u64>,
}

/// Libvirt connection settings
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct RawLibvirtConfig {
    /// Connection URI (default: qemu:///system)
    pub uri: Option<String>,

    /// Path to the virsh binary (default: looked up in PATH)
    pub virsh_path: Option<PathBuf>,

    /// Upper bound for a single virsh invocation, in seconds (default: 30)
    pub command_timeout_seconds: Option<u64>,
}

/// D-Bus inhibitor settings
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct RawInhibitorConfig {
    /// Which bus to connect to (default: session)
    pub bus: Option<RawBus>,

    /// Reason reported to the power manager
    pub reason: Option<String>,
}

/// Bus selection: `"session"`, `"system"` or `{ address = "..." }`
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(untagged)]
pub enum RawBus {
    Named(String),
    Address { address: String },
}
