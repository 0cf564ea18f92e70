//! Configuration validation

use crate::schema::{RawBus, RawConfig};
use thiserror::Error;

/// Validation error
#[derive(Debug, Clone, Error)]
pub enum ValidationError {
    #[error("{field} must be greater than zero")]
    ZeroDuration { field: &'static str },

    #[error("{field} cannot be empty")]
    EmptyValue { field: &'static str },

    #[error("Unknown bus '{0}': expected \"session\", \"system\" or {{ address = \"...\" }}")]
    UnknownBus(String),
}

/// Validate a raw configuration
pub fn validate_config(config: &RawConfig) -> Vec<ValidationError> {
    let mut errors = Vec::new();

    if config.daemon.tick_interval_seconds == Some(0) {
        errors.push(ValidationError::ZeroDuration {
            field: "daemon.tick_interval_seconds",
        });
    }

    let libvirt = &config.libvirt;
    if libvirt.uri.as_deref().is_some_and(|u| u.trim().is_empty()) {
        errors.push(ValidationError::EmptyValue {
            field: "libvirt.uri",
        });
    }
    if libvirt
        .virsh_path
        .as_ref()
        .is_some_and(|p| p.as_os_str().is_empty())
    {
        errors.push(ValidationError::EmptyValue {
            field: "libvirt.virsh_path",
        });
    }
    if libvirt.command_timeout_seconds == Some(0) {
        errors.push(ValidationError::ZeroDuration {
            field: "libvirt.command_timeout_seconds",
        });
    }

    let inhibitor = &config.inhibitor;
    if let Some(bus) = &inhibitor.bus {
        errors.extend(validate_bus(bus));
    }
    if inhibitor.reason.as_deref().is_some_and(|r| r.trim().is_empty()) {
        errors.push(ValidationError::EmptyValue {
            field: "inhibitor.reason",
        });
    }

    errors
}

fn validate_bus(bus: &RawBus) -> Option<ValidationError> {
    match bus {
        RawBus::Named(name) => match name.to_lowercase().as_str() {
            "session" | "system" => None,
            _ => Some(ValidationError::UnknownBus(name.clone())),
        },
        RawBus::Address { address } if address.trim().is_empty() => {
            Some(ValidationError::EmptyValue {
                field: "inhibitor.bus.address",
            })
        }
        RawBus::Address { .. } => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{RawDaemonConfig, RawInhibitorConfig, RawLibvirtConfig};

    #[test]
    fn default_config_is_valid() {
        assert!(validate_config(&RawConfig::default()).is_empty());
    }

    #[test]
    fn collects_every_error() {
        let config = RawConfig {
            config_version: 1,
            daemon: RawDaemonConfig {
                tick_interval_seconds: Some(0),
            },
            libvirt: RawLibvirtConfig {
                uri: Some("  ".into()),
                virsh_path: None,
                command_timeout_seconds: Some(0),
            },
            inhibitor: RawInhibitorConfig {
                bus: Some(RawBus::Named("user".into())),
                reason: Some(String::new()),
            },
        };

        let errors = validate_config(&config);
        assert_eq!(errors.len(), 5);
        assert!(errors.iter().any(|e| matches!(
            e,
            ValidationError::ZeroDuration { field: "daemon.tick_interval_seconds" }
        )));
        assert!(errors.iter().any(|e| matches!(e, ValidationError::UnknownBus(b) if b == "user")));
    }

    #[test]
    fn bus_names_are_case_insensitive() {
        assert!(validate_bus(&RawBus::Named("System".into())).is_none());
        assert!(validate_bus(&RawBus::Named("SESSION".into())).is_none());
        assert!(validate_bus(&RawBus::Address { address: "".into() }).is_some());
    }
}
