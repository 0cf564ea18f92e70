//! Events and reports emitted by the orchestrator

use keepawake_util::InhibitorName;
use std::time::Duration;

/// Outcome of one reconciliation tick
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TickReport {
    /// Names that gained an inhibition
    pub activated: Vec<InhibitorName>,

    /// Names whose inhibition was released
    pub deactivated: Vec<InhibitorName>,

    /// Names whose inhibit call failed; retried next tick
    pub failed_activations: Vec<InhibitorName>,

    /// Names whose uninhibit call failed; still held and retried next tick
    pub failed_deactivations: Vec<InhibitorName>,

    /// Workloads excluded because their name could not be resolved
    pub unresolved: usize,
}

impl TickReport {
    /// Nothing was attempted
    pub fn is_noop(&self) -> bool {
        self.activated.is_empty()
            && self.deactivated.is_empty()
            && !self.has_failures()
    }

    pub fn has_failures(&self) -> bool {
        !self.failed_activations.is_empty() || !self.failed_deactivations.is_empty()
    }
}

/// Outcome of the shutdown drain
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ShutdownReport {
    pub released: Vec<InhibitorName>,
    pub failed: Vec<InhibitorName>,
}

/// Events emitted by the orchestrator loop
#[derive(Debug, Clone)]
pub enum OrchestratorEvent {
    /// Loop started
    Started { tick_interval: Duration },

    /// A tick ran to completion
    TickCompleted(TickReport),

    /// Listing workloads failed; the registry was left untouched
    TickSkipped { error: String },

    /// All held inhibitions were attempted and the loop terminated
    Stopped(ShutdownReport),
}
