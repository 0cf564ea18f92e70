//! Reconciliation between active workloads and held inhibitions

use keepawake_host_api::{HostResult, SleepInhibitor, Workload, WorkloadObserver};
use keepawake_util::InhibitorName;
use std::collections::BTreeSet;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

use crate::{ReconcilePlan, Registry, ShutdownReport, TickReport};

/// Loop-owned reconciliation state: the collaborators plus the registry.
///
/// Exactly one reconciler exists per running orchestrator and it is only
/// ever driven from the loop task, so the registry needs no locking.
pub struct Reconciler {
    observer: Arc<dyn WorkloadObserver>,
    inhibitor: Arc<dyn SleepInhibitor>,
    registry: Registry,
}

impl Reconciler {
    pub fn new(observer: Arc<dyn WorkloadObserver>, inhibitor: Arc<dyn SleepInhibitor>) -> Self {
        Self {
            observer,
            inhibitor,
            registry: Registry::new(),
        }
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Run one reconciliation pass.
    ///
    /// Returns the observer's error when listing fails; the registry is left
    /// untouched in that case and the next tick starts over.
    pub async fn tick(&mut self) -> HostResult<TickReport> {
        debug!("Checking for active workloads to inhibit/uninhibit sleep");

        let workloads = match self.observer.list_active().await {
            Ok(workloads) => workloads,
            Err(e) => {
                error!(error = %e, "Can't list active workloads, skipping tick");
                return Err(e);
            }
        };

        // Unresolved workloads are left out of the diff entirely
        let (active, unresolved) = resolve_names(&workloads).await;
        let plan = ReconcilePlan::compute(&self.registry, &active);

        let mut report = TickReport {
            unresolved,
            ..Default::default()
        };

        debug!(
            active = ?active,
            to_activate = ?plan.to_activate,
            to_deactivate = ?plan.to_deactivate,
            held = self.registry.len(),
            "Computed reconcile plan"
        );

        for name in plan.to_activate {
            if self.activate(&name).await {
                report.activated.push(name);
            } else {
                report.failed_activations.push(name);
            }
        }

        for name in plan.to_deactivate {
            if self.deactivate(&name).await {
                report.deactivated.push(name);
            } else {
                report.failed_deactivations.push(name);
            }
        }

        Ok(report)
    }

    /// Attempt to release every held inhibition, once.
    ///
    /// The registry is emptied regardless of the outcome; failures are only
    /// reported since the orchestrator is going away.
    pub async fn drain(&mut self) -> ShutdownReport {
        let mut report = ShutdownReport::default();

        for (name, handle) in self.registry.take_all() {
            match self.inhibitor.uninhibit(handle).await {
                Ok(()) => {
                    info!(name = %name, cookie = handle.cookie(), "Uninhibited sleep on stopping");
                    report.released.push(name);
                }
                Err(e) => {
                    error!(
                        name = %name,
                        cookie = handle.cookie(),
                        error = %e,
                        "Can't uninhibit sleep on stopping"
                    );
                    report.failed.push(name);
                }
            }
        }

        report
    }

    async fn activate(&mut self, name: &InhibitorName) -> bool {
        debug!(name = %name, "Activating inhibitor for workload without one");

        match self.inhibitor.inhibit(name.as_str()).await {
            Ok(handle) => {
                info!(name = %name, cookie = handle.cookie(), "Activated inhibitor");
                self.registry.record(name.clone(), handle);
                true
            }
            Err(e) => {
                error!(name = %name, error = %e, "Can't activate inhibitor, will retry next tick");
                false
            }
        }
    }

    async fn deactivate(&mut self, name: &InhibitorName) -> bool {
        let Some(handle) = self.registry.get(name.as_str()) else {
            return false;
        };

        match self.inhibitor.uninhibit(handle).await {
            Ok(()) => {
                self.registry.release(name.as_str());
                info!(name = %name, cookie = handle.cookie(), "Deactivated inhibitor");
                true
            }
            Err(e) => {
                warn!(
                    name = %name,
                    cookie = handle.cookie(),
                    error = %e,
                    "Can't deactivate inhibitor, keeping it for retry"
                );
                false
            }
        }
    }
}

/// Resolve workload names, deduplicated. Returns the names and the number of
/// workloads whose name could not be resolved.
async fn resolve_names(workloads: &[Box<dyn Workload>]) -> (BTreeSet<InhibitorName>, usize) {
    let mut names = BTreeSet::new();
    let mut unresolved = 0;

    for workload in workloads {
        match workload.name().await {
            Ok(name) => {
                names.insert(InhibitorName::from(name));
            }
            Err(e) => {
                warn!(workload = ?workload, error = %e, "Can't get name of workload");
                unresolved += 1;
            }
        }
    }

    (names, unresolved)
}
