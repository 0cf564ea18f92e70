//! keepawaked - Keeps the host awake while virtual machines run
//!
//! This is the main entry point for the keepawaked service.
//! It wires together all the components:
//! - Configuration loading
//! - Libvirt observer (active domains)
//! - D-Bus sleep inhibitor
//! - Reconciliation orchestrator

use anyhow::{Context, Result};
use clap::Parser;
use keepawake_config::{load_config, load_config_or_default, BusKind, Config};
use keepawake_core::{Orchestrator, OrchestratorEvent};
use keepawake_host_api::WorkloadObserver;
use keepawake_host_linux::{DbusSleepInhibitor, LibvirtObserver};
use keepawake_util::default_config_path;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::signal::unix::{signal, SignalKind};
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;

/// keepawaked - Inhibit sleep while libvirt domains are running
#[derive(Parser, Debug)]
#[command(name = "keepawaked")]
#[command(about = "Inhibit sleep while libvirt domains are running", long_about = None)]
struct Args {
    /// Configuration file path (default: ~/.config/libvirt-keepawake/config.toml)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Tick interval in seconds, overrides the config file
    #[arg(short, long, env = "KEEPAWAKE_INTERVAL", value_parser = clap::value_parser!(u64).range(1..))]
    interval: Option<u64>,

    /// Log level
    #[arg(short, long, default_value = "info")]
    log_level: String,

    /// Verbose logging, same as --log-level debug
    #[arg(short, long)]
    verbose: bool,
}

impl Args {
    fn log_level(&self) -> &str {
        if self.verbose {
            "debug"
        } else {
            &self.log_level
        }
    }
}

/// Main service state
struct Service {
    orchestrator: Orchestrator,
}

impl Service {
    async fn new(args: &Args) -> Result<Self> {
        let config = load(args)?;

        let tick_interval = args
            .interval
            .map(Duration::from_secs)
            .unwrap_or(config.daemon.tick_interval);

        let inhibitor = Arc::new(connect_inhibitor(&config).await?);

        let observer = Arc::new(LibvirtObserver::new(
            config.libvirt.uri.clone(),
            &config.libvirt.virsh_path,
            config.libvirt.command_timeout,
        ));

        // Ticks keep retrying, so a broken libvirt is not fatal here
        match observer.list_active().await {
            Ok(domains) => info!(
                uri = observer.uri(),
                active = domains.len(),
                "Libvirt observer ready"
            ),
            Err(e) => warn!(
                uri = observer.uri(),
                error = %e,
                "Can't list libvirt domains, will keep retrying"
            ),
        }

        let orchestrator = Orchestrator::new(observer, inhibitor, tick_interval);

        Ok(Self { orchestrator })
    }

    async fn run(mut self) -> Result<()> {
        let mut events = self
            .orchestrator
            .subscribe()
            .context("Orchestrator events already taken")?;

        self.orchestrator
            .start()
            .context("Failed to start orchestrator")?;

        // Set up signal handlers
        let mut sigterm = signal(SignalKind::terminate())
            .context("Failed to create SIGTERM handler")?;
        let mut sigint = signal(SignalKind::interrupt())
            .context("Failed to create SIGINT handler")?;
        let mut sighup = signal(SignalKind::hangup())
            .context("Failed to create SIGHUP handler")?;

        info!("Service running");

        loop {
            tokio::select! {
                _ = sigterm.recv() => {
                    info!("Received SIGTERM, shutting down gracefully");
                    break;
                }
                _ = sigint.recv() => {
                    info!("Received SIGINT, shutting down gracefully");
                    break;
                }
                _ = sighup.recv() => {
                    info!("Received SIGHUP, shutting down gracefully");
                    break;
                }

                Some(event) = events.recv() => log_event(&event),
            }
        }

        // The D-Bus connection must still be open here; it closes when the
        // service is dropped.
        let report = self.orchestrator.stop().await;
        if !report.failed.is_empty() {
            warn!(failed = ?report.failed, "Some inhibitors could not be released");
        }

        info!("Service stopped");
        Ok(())
    }
}

fn load(args: &Args) -> Result<Config> {
    let config = match &args.config {
        Some(path) => load_config(path)
            .with_context(|| format!("Failed to load config from {:?}", path))?,
        None => {
            let path = default_config_path();
            load_config_or_default(&path)
                .with_context(|| format!("Failed to load config from {:?}", path))?
        }
    };

    info!(
        tick_interval_secs = config.daemon.tick_interval.as_secs(),
        uri = %config.libvirt.uri,
        bus = ?config.inhibitor.bus,
        "Configuration loaded"
    );

    Ok(config)
}

async fn connect_inhibitor(config: &Config) -> Result<DbusSleepInhibitor> {
    let reason = config.inhibitor.reason.clone();

    let inhibitor = match &config.inhibitor.bus {
        BusKind::Session => DbusSleepInhibitor::connect_session(reason)
            .await
            .context("Failed to connect to the session bus")?,
        BusKind::System => DbusSleepInhibitor::connect_system(reason)
            .await
            .context("Failed to connect to the system bus")?,
        BusKind::Address(address) => DbusSleepInhibitor::connect_address(address, reason)
            .await
            .with_context(|| format!("Failed to connect to D-Bus at {}", address))?,
    };

    Ok(inhibitor)
}

fn log_event(event: &OrchestratorEvent) {
    match event {
        OrchestratorEvent::Started { tick_interval } => {
            debug!(tick_interval_ms = tick_interval.as_millis() as u64, "Reconciliation loop started");
        }
        OrchestratorEvent::TickCompleted(report) if !report.is_noop() => {
            info!(
                activated = report.activated.len(),
                deactivated = report.deactivated.len(),
                failed = report.failed_activations.len() + report.failed_deactivations.len(),
                "Inhibitors updated"
            );
        }
        OrchestratorEvent::TickCompleted(_) => {}
        OrchestratorEvent::TickSkipped { error } => {
            debug!(error = %error, "Tick skipped");
        }
        OrchestratorEvent::Stopped(report) => {
            debug!(
                released = report.released.len(),
                failed = report.failed.len(),
                "Reconciliation loop stopped"
            );
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize logging
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(args.log_level()));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .init();

    info!(
        version = env!("CARGO_PKG_VERSION"),
        "keepawaked starting"
    );

    let service = Service::new(&args).await?;
    service.run().await
}
