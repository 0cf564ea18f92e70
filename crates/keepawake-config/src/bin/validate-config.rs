//! Config validation CLI tool
//!
//! Validates a keepawaked configuration file and reports any errors.

use keepawake_config::BusKind;
use keepawake_util::default_config_path;
use std::path::PathBuf;
use std::process::ExitCode;

fn main() -> ExitCode {
    let args: Vec<String> = std::env::args().collect();

    let config_path = match args.get(1) {
        Some(path) => PathBuf::from(path),
        None => {
            let default_path = default_config_path();
            eprintln!("Usage: validate-config [config-file]");
            eprintln!();
            eprintln!("Validates a keepawaked configuration file.");
            eprintln!();
            eprintln!("Example:");
            eprintln!("  validate-config {}", default_path.display());
            return ExitCode::from(2);
        }
    };

    if !config_path.exists() {
        eprintln!("Error: Configuration file not found: {}", config_path.display());
        return ExitCode::from(1);
    }

    match keepawake_config::load_config(&config_path) {
        Ok(config) => {
            let bus = match &config.inhibitor.bus {
                BusKind::Session => "session".to_string(),
                BusKind::System => "system".to_string(),
                BusKind::Address(address) => address.clone(),
            };

            println!("✓ Configuration is valid");
            println!();
            println!("Summary:");
            println!("  Config version: {}", keepawake_config::CURRENT_CONFIG_VERSION);
            println!("  Tick interval: {}s", config.daemon.tick_interval.as_secs());
            println!("  Libvirt URI: {}", config.libvirt.uri);
            println!("  virsh: {}", config.libvirt.virsh_path.display());
            println!(
                "  virsh timeout: {}s",
                config.libvirt.command_timeout.as_secs()
            );
            println!("  D-Bus: {}", bus);
            println!("  Inhibit reason: {}", config.inhibitor.reason);

            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("✗ Configuration validation failed");
            eprintln!();
            match &e {
                keepawake_config::ConfigError::ReadError(io_err) => {
                    eprintln!("Failed to read file: {}", io_err);
                }
                keepawake_config::ConfigError::ParseError(parse_err) => {
                    eprintln!("TOML parse error:");
                    eprintln!("  {}", parse_err);
                }
                keepawake_config::ConfigError::ValidationFailed { errors } => {
                    eprintln!("Validation errors ({}):", errors.len());
                    for err in errors {
                        eprintln!("  - {}", err);
                    }
                }
                keepawake_config::ConfigError::UnsupportedVersion(ver) => {
                    eprintln!(
                        "Unsupported config version: {} (expected {})",
                        ver,
                        keepawake_config::CURRENT_CONFIG_VERSION
                    );
                }
            }
            ExitCode::from(1)
        }
    }
}
