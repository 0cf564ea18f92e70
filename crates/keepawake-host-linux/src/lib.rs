//! Linux adapters for keepawaked
//!
//! Provides:
//! - Active libvirt domain listing through `virsh`
//! - Sleep inhibition through the `org.freedesktop.PowerManagement` D-Bus service

mod dbus;
mod libvirt;

pub use dbus::*;
pub use libvirt::*;
