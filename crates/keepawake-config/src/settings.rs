//! Validated settings structures

use crate::schema::{RawBus, RawConfig, RawDaemonConfig, RawInhibitorConfig, RawLibvirtConfig};
use std::path::PathBuf;
use std::time::Duration;

/// Default seconds between reconciliation ticks
pub const DEFAULT_TICK_INTERVAL_SECS: u64 = 10;

/// Default libvirt connection URI
pub const DEFAULT_LIBVIRT_URI: &str = "qemu:///system";

/// Default virsh binary, resolved through PATH
pub const DEFAULT_VIRSH_PATH: &str = "virsh";

/// Default upper bound for one virsh invocation
pub const DEFAULT_COMMAND_TIMEOUT_SECS: u64 = 30;

/// Default reason reported alongside each inhibition
pub const DEFAULT_INHIBIT_REASON: &str = "VM is running";

/// Validated configuration ready for use by the daemon
#[derive(Debug, Clone)]
pub struct Config {
    pub daemon: DaemonSettings,
    pub libvirt: LibvirtSettings,
    pub inhibitor: InhibitorSettings,
}

impl Config {
    /// Convert from raw config (after validation)
    pub fn from_raw(raw: RawConfig) -> Self {
        Self {
            daemon: DaemonSettings::from_raw(raw.daemon),
            libvirt: LibvirtSettings::from_raw(raw.libvirt),
            inhibitor: InhibitorSettings::from_raw(raw.inhibitor),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::from_raw(RawConfig::default())
    }
}

/// Reconciliation loop settings
#[derive(Debug, Clone)]
pub struct DaemonSettings {
    pub tick_interval: Duration,
}

impl DaemonSettings {
    fn from_raw(raw: RawDaemonConfig) -> Self {
        Self {
            tick_interval: Duration::from_secs(
                raw.tick_interval_seconds
                    .unwrap_or(DEFAULT_TICK_INTERVAL_SECS),
            ),
        }
    }
}

/// Libvirt observer settings
#[derive(Debug, Clone)]
pub struct LibvirtSettings {
    pub uri: String,
    pub virsh_path: PathBuf,
    pub command_timeout: Duration,
}

impl LibvirtSettings {
    fn from_raw(raw: RawLibvirtConfig) -> Self {
        Self {
            uri: raw.uri.unwrap_or_else(|| DEFAULT_LIBVIRT_URI.to_string()),
            virsh_path: raw
                .virsh_path
                .unwrap_or_else(|| PathBuf::from(DEFAULT_VIRSH_PATH)),
            command_timeout: Duration::from_secs(
                raw.command_timeout_seconds
                    .unwrap_or(DEFAULT_COMMAND_TIMEOUT_SECS),
            ),
        }
    }
}

/// Which message bus the inhibitor connects to
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BusKind {
    Session,
    System,
    /// Explicit bus address, e.g. `unix:path=/run/user/1000/bus`
    Address(String),
}

impl BusKind {
    fn from_raw(raw: RawBus) -> Self {
        match raw {
            RawBus::Named(name) if name.eq_ignore_ascii_case("system") => Self::System,
            RawBus::Named(_) => Self::Session,
            RawBus::Address { address } => Self::Address(address),
        }
    }
}

/// Sleep inhibitor settings
#[derive(Debug, Clone)]
pub struct InhibitorSettings {
    pub bus: BusKind,
    pub reason: String,
}

impl InhibitorSettings {
    fn from_raw(raw: RawInhibitorConfig) -> Self {
        Self {
            bus: raw.bus.map(BusKind::from_raw).unwrap_or(BusKind::Session),
            reason: raw
                .reason
                .unwrap_or_else(|| DEFAULT_INHIBIT_REASON.to_string()),
        }
    }
}
