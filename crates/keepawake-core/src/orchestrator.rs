//! Orchestrator lifecycle and the timer-driven reconciliation loop

use keepawake_host_api::{SleepInhibitor, WorkloadObserver};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, error, info, warn};

use crate::{OrchestratorEvent, Reconciler, ShutdownReport};

/// Errors from orchestrator lifecycle operations
#[derive(Debug, Error)]
pub enum OrchestratorError {
    #[error("Orchestrator is already running")]
    AlreadyRunning,

    #[error("Tick interval must be greater than zero")]
    InvalidInterval,
}

/// Lifecycle state of the orchestrator
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrchestratorState {
    Stopped,
    Running,
    /// Stop requested; the loop is releasing held inhibitions
    Stopping,
}

struct RunningLoop {
    /// Taken once the stop signal was sent
    stop_tx: Option<oneshot::Sender<()>>,
    task: JoinHandle<ShutdownReport>,
}

/// Keeps sleep inhibited while workloads are active.
///
/// `start` spawns a single loop task that owns the registry. The task wakes
/// on the tick timer or the stop signal, never both at once, so at most one
/// reconciliation pass runs at a time. `stop` hands over the stop signal and
/// waits until every held inhibition has been attempted.
pub struct Orchestrator {
    observer: Arc<dyn WorkloadObserver>,
    inhibitor: Arc<dyn SleepInhibitor>,
    tick_interval: Duration,
    state: OrchestratorState,
    running: Option<RunningLoop>,
    event_tx: mpsc::UnboundedSender<OrchestratorEvent>,
    event_rx: Option<mpsc::UnboundedReceiver<OrchestratorEvent>>,
}

impl Orchestrator {
    pub fn new(
        observer: Arc<dyn WorkloadObserver>,
        inhibitor: Arc<dyn SleepInhibitor>,
        tick_interval: Duration,
    ) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();

        Self {
            observer,
            inhibitor,
            tick_interval,
            state: OrchestratorState::Stopped,
            running: None,
            event_tx: tx,
            event_rx: Some(rx),
        }
    }

    pub fn tick_interval(&self) -> Duration {
        self.tick_interval
    }

    pub fn state(&self) -> OrchestratorState {
        self.state
    }

    pub fn is_running(&self) -> bool {
        self.state == OrchestratorState::Running
    }

    /// Take the event receiver. Returns `None` after the first call.
    pub fn subscribe(&mut self) -> Option<mpsc::UnboundedReceiver<OrchestratorEvent>> {
        self.event_rx.take()
    }

    /// Start the reconciliation loop. Must be called from within a tokio
    /// runtime. The first tick runs immediately.
    pub fn start(&mut self) -> Result<(), OrchestratorError> {
        if self.running.is_some() {
            return Err(OrchestratorError::AlreadyRunning);
        }
        if self.tick_interval.is_zero() {
            return Err(OrchestratorError::InvalidInterval);
        }

        let (stop_tx, stop_rx) = oneshot::channel();
        let reconciler = Reconciler::new(self.observer.clone(), self.inhibitor.clone());
        let task = tokio::spawn(run_loop(
            reconciler,
            self.tick_interval,
            stop_rx,
            self.event_tx.clone(),
        ));

        self.running = Some(RunningLoop {
            stop_tx: Some(stop_tx),
            task,
        });
        self.state = OrchestratorState::Running;

        info!(
            tick_interval_ms = self.tick_interval.as_millis() as u64,
            "Orchestrator started"
        );
        Ok(())
    }

    /// Stop the loop and release every held inhibition.
    ///
    /// Resolves only after the loop finished its shutdown cleanup. Calling
    /// this on a stopped orchestrator is a no-op returning an empty report.
    ///
    /// Cancel safe: if the returned future is dropped, the orchestrator stays
    /// `Stopping` and a later `stop` resumes waiting for the same loop.
    pub async fn stop(&mut self) -> ShutdownReport {
        let Some(running) = self.running.as_mut() else {
            debug!("Stop requested but orchestrator is not running");
            return ShutdownReport::default();
        };

        if let Some(stop_tx) = running.stop_tx.take() {
            self.state = OrchestratorState::Stopping;
            info!("Stopping orchestrator");

            // The loop may already be gone if it panicked
            let _ = stop_tx.send(());
        }

        let result = (&mut running.task).await;
        self.running = None;

        let report = match result {
            Ok(report) => report,
            Err(e) => {
                error!(error = %e, "Reconciliation loop terminated abnormally");
                ShutdownReport::default()
            }
        };

        self.state = OrchestratorState::Stopped;
        info!(
            released = report.released.len(),
            failed = report.failed.len(),
            "Orchestrator stopped"
        );
        report
    }
}

impl Drop for Orchestrator {
    fn drop(&mut self) {
        if self.running.is_some() {
            // Dropping the stop sender still triggers cleanup in the loop task
            warn!("Orchestrator dropped while running; cleanup will not be awaited");
        }
    }
}

async fn run_loop(
    mut reconciler: Reconciler,
    tick_interval: Duration,
    mut stop_rx: oneshot::Receiver<()>,
    events: mpsc::UnboundedSender<OrchestratorEvent>,
) -> ShutdownReport {
    let mut ticker = tokio::time::interval(tick_interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    let _ = events.send(OrchestratorEvent::Started { tick_interval });

    loop {
        tokio::select! {
            biased;

            // Either an explicit stop or the orchestrator was dropped
            _ = &mut stop_rx => break,

            _ = ticker.tick() => {
                let event = match reconciler.tick().await {
                    Ok(report) => {
                        if report.has_failures() {
                            warn!(
                                failed_activations = ?report.failed_activations,
                                failed_deactivations = ?report.failed_deactivations,
                                "Tick completed with failures"
                            );
                        }
                        OrchestratorEvent::TickCompleted(report)
                    }
                    Err(e) => OrchestratorEvent::TickSkipped { error: e.to_string() },
                };
                let _ = events.send(event);
            }
        }
    }

    debug!(
        held = ?reconciler.registry(),
        "Got stop signal, releasing all inhibitors"
    );
    let report = reconciler.drain().await;
    let _ = events.send(OrchestratorEvent::Stopped(report.clone()));
    report
}
