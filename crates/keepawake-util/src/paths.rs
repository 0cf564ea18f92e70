//! Default paths for keepawaked components
//!
//! Paths are user-scoped by default:
//! - Config: `$XDG_CONFIG_HOME/libvirt-keepawake/config.toml` or
//!   `~/.config/libvirt-keepawake/config.toml`

use std::path::PathBuf;

/// Environment variable for overriding the config file path
pub const KEEPAWAKE_CONFIG_ENV: &str = "KEEPAWAKE_CONFIG";

/// Config filename within the config directory
const CONFIG_FILENAME: &str = "config.toml";

/// Application subdirectory name
const APP_DIR: &str = "libvirt-keepawake";

/// Get the default config file path.
///
/// Order of precedence:
/// 1. `$KEEPAWAKE_CONFIG` environment variable (if set)
/// 2. `$XDG_CONFIG_HOME/libvirt-keepawake/config.toml` (if XDG_CONFIG_HOME is set)
/// 3. `~/.config/libvirt-keepawake/config.toml` (fallback)
pub fn default_config_path() -> PathBuf {
    if let Ok(path) = std::env::var(KEEPAWAKE_CONFIG_ENV) {
        return PathBuf::from(path);
    }

    config_dir().join(CONFIG_FILENAME)
}

/// Get the config directory without checking the KEEPAWAKE_CONFIG env var.
pub fn config_dir() -> PathBuf {
    if let Ok(config_home) = std::env::var("XDG_CONFIG_HOME") {
        return PathBuf::from(config_home).join(APP_DIR);
    }

    if let Ok(home) = std::env::var("HOME") {
        return PathBuf::from(home).join(".config").join(APP_DIR);
    }

    // Last resort
    PathBuf::from("/etc").join(APP_DIR)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_dir_contains_app_dir() {
        let dir = config_dir();
        assert!(dir.to_string_lossy().contains("libvirt-keepawake"));
    }

    #[test]
    fn config_path_is_toml() {
        // Only meaningful when the override is absent
        if std::env::var(KEEPAWAKE_CONFIG_ENV).is_err() {
            let path = default_config_path();
            assert_eq!(path.file_name().unwrap(), "config.toml");
            assert_eq!(path.parent().unwrap(), config_dir());
        }
    }
}
