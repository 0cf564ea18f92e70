//! Reconciliation core for keepawaked
//!
//! This crate is the heart of keepawaked, containing:
//! - The registry of held inhibitions (name -> handle)
//! - Diff planning between active workloads and held inhibitions
//! - The reconciler that executes a plan and tolerates partial failure
//! - The orchestrator lifecycle (Stopped -> Running -> Stopping -> Stopped)

mod events;
mod orchestrator;
mod plan;
mod reconciler;
mod registry;

pub use events::*;
pub use orchestrator::*;
pub use plan::*;
pub use reconciler::*;
pub use registry::*;
