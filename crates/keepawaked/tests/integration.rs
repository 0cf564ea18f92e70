//! Integration tests for keepawaked
//!
//! These tests drive the full orchestrator loop against the mock observer and
//! inhibitor, with tokio's clock paused so ticks happen deterministically.

use keepawake_core::{Orchestrator, OrchestratorEvent, ShutdownReport, TickReport};
use keepawake_host_api::{
    InhibitorCall, InhibitorHandle, MockInhibitor, MockObserver, MockWorkload,
};
use keepawake_util::InhibitorName;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc::UnboundedReceiver;

const TICK: Duration = Duration::from_secs(10);

struct Harness {
    observer: Arc<MockObserver>,
    inhibitor: Arc<MockInhibitor>,
    orchestrator: Orchestrator,
    events: UnboundedReceiver<OrchestratorEvent>,
}

impl Harness {
    fn new(active: &[&str]) -> Self {
        let observer = Arc::new(MockObserver::with_active(active));
        let inhibitor = Arc::new(MockInhibitor::new());
        let mut orchestrator = Orchestrator::new(observer.clone(), inhibitor.clone(), TICK);
        let events = orchestrator.subscribe().unwrap();

        Self {
            observer,
            inhibitor,
            orchestrator,
            events,
        }
    }

    /// Wait for the next tick outcome, skipping lifecycle events
    async fn tick(&mut self) -> Result<TickReport, String> {
        loop {
            match self.events.recv().await.expect("event channel closed") {
                OrchestratorEvent::TickCompleted(report) => return Ok(report),
                OrchestratorEvent::TickSkipped { error } => return Err(error),
                OrchestratorEvent::Started { .. } => continue,
                OrchestratorEvent::Stopped(_) => panic!("loop stopped while waiting for a tick"),
            }
        }
    }

    async fn stop(&mut self) -> ShutdownReport {
        self.orchestrator.stop().await
    }
}

fn names(list: &[&str]) -> Vec<InhibitorName> {
    list.iter().map(|n| InhibitorName::new(*n)).collect()
}

#[tokio::test(start_paused = true)]
async fn test_end_to_end_scenario() {
    let mut h = Harness::new(&[]);
    h.orchestrator.start().unwrap();

    // [] -> nothing held, no calls
    let report = h.tick().await.unwrap();
    assert!(report.is_noop());
    assert!(h.inhibitor.calls().is_empty());

    // ["vm1"] -> Inhibit("vm1")
    h.observer.set_active(&["vm1"]);
    let report = h.tick().await.unwrap();
    assert_eq!(report.activated, names(&["vm1"]));
    let h1 = h.inhibitor.handle_for("vm1").unwrap();

    // ["vm1", "vm2"] -> Inhibit("vm2") only
    h.observer.set_active(&["vm1", "vm2"]);
    let report = h.tick().await.unwrap();
    assert_eq!(report.activated, names(&["vm2"]));
    assert!(report.deactivated.is_empty());
    let h2 = h.inhibitor.handle_for("vm2").unwrap();

    // ["vm2"] -> UnInhibit(h1)
    h.observer.set_active(&["vm2"]);
    let report = h.tick().await.unwrap();
    assert_eq!(report.deactivated, names(&["vm1"]));
    assert_eq!(h.inhibitor.held_names(), vec!["vm2"]);

    // stop -> UnInhibit(h2)
    let report = h.stop().await;
    assert_eq!(report.released, names(&["vm2"]));
    assert!(report.failed.is_empty());
    assert!(h.inhibitor.held_names().is_empty());

    assert_eq!(
        h.inhibitor.calls(),
        vec![
            InhibitorCall::Inhibit("vm1".into()),
            InhibitorCall::Inhibit("vm2".into()),
            InhibitorCall::UnInhibit(h1),
            InhibitorCall::UnInhibit(h2),
        ]
    );
}

#[tokio::test(start_paused = true)]
async fn test_stable_active_set_is_idempotent() {
    let mut h = Harness::new(&["vm1", "vm2"]);
    h.orchestrator.start().unwrap();

    h.tick().await.unwrap();
    let calls = h.inhibitor.calls().len();

    for _ in 0..5 {
        let report = h.tick().await.unwrap();
        assert!(report.is_noop());
    }
    assert_eq!(h.inhibitor.calls().len(), calls);

    h.stop().await;
}

#[tokio::test(start_paused = true)]
async fn test_duplicate_names_collapse() {
    let mut h = Harness::new(&["win11", "win11"]);
    h.orchestrator.start().unwrap();

    let report = h.tick().await.unwrap();
    assert_eq!(report.activated, names(&["win11"]));
    assert_eq!(h.inhibitor.inhibit_calls(), vec!["win11"]);

    h.observer.set_active(&["win11"]);
    assert!(h.tick().await.unwrap().is_noop());

    h.observer.set_active(&[]);
    let report = h.tick().await.unwrap();
    assert_eq!(report.deactivated, names(&["win11"]));
    assert_eq!(h.inhibitor.uninhibit_calls().len(), 1);

    h.stop().await;
}

#[tokio::test(start_paused = true)]
async fn test_partial_failure_is_retried() {
    let mut h = Harness::new(&["A", "B"]);
    h.inhibitor.fail_inhibit_for("A");
    h.orchestrator.start().unwrap();

    let report = h.tick().await.unwrap();
    assert_eq!(report.failed_activations, names(&["A"]));
    assert_eq!(h.inhibitor.held_names(), vec!["B"]);

    h.inhibitor.allow_inhibit("A");
    let report = h.tick().await.unwrap();
    assert_eq!(report.activated, names(&["A"]));
    assert_eq!(h.inhibitor.held_names(), vec!["A", "B"]);

    h.stop().await;
}

#[tokio::test(start_paused = true)]
async fn test_observer_failure_keeps_inhibitions() {
    let mut h = Harness::new(&["vm1"]);
    h.orchestrator.start().unwrap();
    h.tick().await.unwrap();

    h.observer.set_active(&[]);
    h.observer.set_fail_list(true);
    for _ in 0..3 {
        assert!(h.tick().await.is_err());
    }
    assert_eq!(h.inhibitor.held_names(), vec!["vm1"]);
    assert!(h.inhibitor.uninhibit_calls().is_empty());

    h.observer.set_fail_list(false);
    let report = h.tick().await.unwrap();
    assert_eq!(report.deactivated, names(&["vm1"]));

    h.stop().await;
}

#[tokio::test(start_paused = true)]
async fn test_failed_uninhibit_is_retained_until_success() {
    let mut h = Harness::new(&["vm1"]);
    h.orchestrator.start().unwrap();
    h.tick().await.unwrap();
    let handle = h.inhibitor.handle_for("vm1").unwrap();

    h.observer.set_active(&[]);
    h.inhibitor.set_fail_uninhibit(true);
    let report = h.tick().await.unwrap();
    assert_eq!(report.failed_deactivations, names(&["vm1"]));

    h.inhibitor.set_fail_uninhibit(false);
    let report = h.tick().await.unwrap();
    assert_eq!(report.deactivated, names(&["vm1"]));
    assert_eq!(h.inhibitor.uninhibit_calls(), vec![handle, handle]);

    // Nothing left for shutdown
    let report = h.stop().await;
    assert_eq!(report, ShutdownReport::default());
}

#[tokio::test(start_paused = true)]
async fn test_shutdown_drains_with_broken_observer() {
    let mut h = Harness::new(&["A", "B"]);
    h.orchestrator.start().unwrap();
    h.tick().await.unwrap();

    let handles: Vec<InhibitorHandle> = ["A", "B"]
        .iter()
        .map(|n| h.inhibitor.handle_for(n).unwrap())
        .collect();

    h.observer.set_fail_list(true);
    let report = h.stop().await;

    assert_eq!(report.released, names(&["A", "B"]));
    assert_eq!(h.inhibitor.uninhibit_calls(), handles);
    assert!(!h.orchestrator.is_running());
}

#[tokio::test(start_paused = true)]
async fn test_converges_after_churn() {
    let mut h = Harness::new(&[]);
    h.orchestrator.start().unwrap();
    h.tick().await.unwrap();

    let sets: [&[&str]; 4] = [&["a", "b", "c"], &["c", "d"], &["a", "d", "d"], &["e"]];
    for set in sets {
        h.observer.set_active(set);
        h.tick().await.unwrap();

        let mut expected: Vec<String> = set.iter().map(|s| s.to_string()).collect();
        expected.sort();
        expected.dedup();
        assert_eq!(h.inhibitor.held_names(), expected);
    }

    h.stop().await;
    assert!(h.inhibitor.held_names().is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_nameless_domain_does_not_pin_inhibitions() {
    let mut h = Harness::new(&["vm1", "vm2"]);
    h.orchestrator.start().unwrap();
    h.tick().await.unwrap();

    h.observer
        .set_workloads(vec![MockWorkload::named("vm2"), MockWorkload::unnamed()]);
    let report = h.tick().await.unwrap();
    assert_eq!(report.unresolved, 1);
    assert_eq!(report.deactivated, names(&["vm1"]));

    h.observer.set_workloads(vec![MockWorkload::unnamed()]);
    let report = h.tick().await.unwrap();
    assert_eq!(report.deactivated, names(&["vm2"]));
    assert!(h.inhibitor.held_names().is_empty());

    assert_eq!(h.stop().await, ShutdownReport::default());
}

#[tokio::test(start_paused = true)]
async fn test_stop_and_restart() {
    let mut h = Harness::new(&["vm1"]);

    // Stop before start does nothing
    assert_eq!(h.stop().await, ShutdownReport::default());

    h.orchestrator.start().unwrap();
    h.tick().await.unwrap();
    h.stop().await;
    assert!(matches!(
        h.events.recv().await,
        Some(OrchestratorEvent::Stopped(_))
    ));

    h.orchestrator.start().unwrap();
    let report = h.tick().await.unwrap();
    assert_eq!(report.activated, names(&["vm1"]));

    h.stop().await;
    assert_eq!(h.inhibitor.inhibit_calls(), vec!["vm1", "vm1"]);
    assert!(h.inhibitor.held_names().is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_ticks_respect_interval() {
    let mut h = Harness::new(&[]);
    h.orchestrator.start().unwrap();

    let start = tokio::time::Instant::now();
    h.tick().await.unwrap();
    h.tick().await.unwrap();
    h.tick().await.unwrap();
    assert_eq!(start.elapsed(), TICK * 2);

    h.stop().await;
}
