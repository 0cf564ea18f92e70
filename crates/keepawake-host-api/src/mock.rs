//! Mock observer and inhibitor for testing

use async_trait::async_trait;
use std::collections::{BTreeMap, HashSet};
use std::sync::atomic::{AtomicU32, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use crate::{HostError, HostResult, InhibitorHandle, SleepInhibitor, Workload, WorkloadObserver};

/// Mock workload with a fixed name, or none to simulate a failed lookup
#[derive(Debug, Clone)]
pub struct MockWorkload {
    name: Option<String>,
}

impl MockWorkload {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
        }
    }

    /// A workload whose name cannot be resolved
    pub fn unnamed() -> Self {
        Self { name: None }
    }
}

#[async_trait]
impl Workload for MockWorkload {
    async fn name(&self) -> HostResult<String> {
        self.name
            .clone()
            .ok_or_else(|| HostError::NameUnavailable("Mock workload has no name".into()))
    }
}

/// Mock workload observer for unit/integration testing
pub struct MockObserver {
    workloads: Arc<Mutex<Vec<MockWorkload>>>,
    list_calls: AtomicUsize,

    /// Configure listing to fail
    pub fail_list: Arc<Mutex<bool>>,
}

impl MockObserver {
    pub fn new() -> Self {
        Self {
            workloads: Arc::new(Mutex::new(Vec::new())),
            list_calls: AtomicUsize::new(0),
            fail_list: Arc::new(Mutex::new(false)),
        }
    }

    pub fn with_active(names: &[&str]) -> Self {
        let observer = Self::new();
        observer.set_active(names);
        observer
    }

    /// Replace the active set with named workloads
    pub fn set_active(&self, names: &[&str]) {
        let workloads = names.iter().map(|n| MockWorkload::named(*n)).collect();
        self.set_workloads(workloads);
    }

    /// Replace the active set
    pub fn set_workloads(&self, workloads: Vec<MockWorkload>) {
        *self.workloads.lock().unwrap() = workloads;
    }

    /// Configure listing to fail (or succeed again)
    pub fn set_fail_list(&self, fail: bool) {
        *self.fail_list.lock().unwrap() = fail;
    }

    /// Number of times `list_active` was called
    pub fn list_calls(&self) -> usize {
        self.list_calls.load(Ordering::SeqCst)
    }
}

impl Default for MockObserver {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl WorkloadObserver for MockObserver {
    async fn list_active(&self) -> HostResult<Vec<Box<dyn Workload>>> {
        self.list_calls.fetch_add(1, Ordering::SeqCst);

        if *self.fail_list.lock().unwrap() {
            return Err(HostError::Observer("Mock list failure".into()));
        }

        Ok(self
            .workloads
            .lock()
            .unwrap()
            .iter()
            .cloned()
            .map(|w| Box::new(w) as Box<dyn Workload>)
            .collect())
    }
}

/// A call received by [`MockInhibitor`], in arrival order
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InhibitorCall {
    Inhibit(String),
    UnInhibit(InhibitorHandle),
}

/// Mock sleep inhibitor for unit/integration testing
///
/// Hands out sequential cookies starting at 1 and tracks which inhibitions
/// are held, like a power manager would.
pub struct MockInhibitor {
    next_cookie: AtomicU32,
    held: Arc<Mutex<BTreeMap<InhibitorHandle, String>>>,
    calls: Arc<Mutex<Vec<InhibitorCall>>>,

    /// Names for which `inhibit` fails with an error
    pub fail_inhibit: Arc<Mutex<HashSet<String>>>,

    /// Configure `inhibit` to return an explicit non-success result
    pub reject_inhibit: Arc<Mutex<bool>>,

    /// Configure `uninhibit` to fail
    pub fail_uninhibit: Arc<Mutex<bool>>,

    /// Make `inhibit` take this long before answering
    pub inhibit_delay: Arc<Mutex<Option<Duration>>>,
}

impl MockInhibitor {
    pub fn new() -> Self {
        Self {
            next_cookie: AtomicU32::new(1),
            held: Arc::new(Mutex::new(BTreeMap::new())),
            calls: Arc::new(Mutex::new(Vec::new())),
            fail_inhibit: Arc::new(Mutex::new(HashSet::new())),
            reject_inhibit: Arc::new(Mutex::new(false)),
            fail_uninhibit: Arc::new(Mutex::new(false)),
            inhibit_delay: Arc::new(Mutex::new(None)),
        }
    }

    /// Make `inhibit(name)` fail until [`MockInhibitor::allow_inhibit`] is called
    pub fn fail_inhibit_for(&self, name: &str) {
        self.fail_inhibit.lock().unwrap().insert(name.to_string());
    }

    pub fn allow_inhibit(&self, name: &str) {
        self.fail_inhibit.lock().unwrap().remove(name);
    }

    pub fn set_fail_uninhibit(&self, fail: bool) {
        *self.fail_uninhibit.lock().unwrap() = fail;
    }

    pub fn set_reject_inhibit(&self, reject: bool) {
        *self.reject_inhibit.lock().unwrap() = reject;
    }

    /// Simulate a slow power manager. The call is logged before the delay.
    pub fn set_inhibit_delay(&self, delay: Option<Duration>) {
        *self.inhibit_delay.lock().unwrap() = delay;
    }

    /// All calls received so far, including failed ones
    pub fn calls(&self) -> Vec<InhibitorCall> {
        self.calls.lock().unwrap().clone()
    }

    /// Names passed to `inhibit`, in call order
    pub fn inhibit_calls(&self) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                InhibitorCall::Inhibit(name) => Some(name),
                InhibitorCall::UnInhibit(_) => None,
            })
            .collect()
    }

    /// Handles passed to `uninhibit`, in call order
    pub fn uninhibit_calls(&self) -> Vec<InhibitorHandle> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                InhibitorCall::UnInhibit(handle) => Some(handle),
                InhibitorCall::Inhibit(_) => None,
            })
            .collect()
    }

    /// Names of the inhibitions currently held, sorted
    pub fn held_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.held.lock().unwrap().values().cloned().collect();
        names.sort();
        names
    }

    /// Handle of the held inhibition for `name`, if any
    pub fn handle_for(&self, name: &str) -> Option<InhibitorHandle> {
        self.held
            .lock()
            .unwrap()
            .iter()
            .find(|(_, n)| n.as_str() == name)
            .map(|(handle, _)| *handle)
    }
}

impl Default for MockInhibitor {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SleepInhibitor for MockInhibitor {
    async fn inhibit(&self, name: &str) -> HostResult<InhibitorHandle> {
        self.calls
            .lock()
            .unwrap()
            .push(InhibitorCall::Inhibit(name.to_string()));

        let delay = *self.inhibit_delay.lock().unwrap();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        if self.fail_inhibit.lock().unwrap().contains(name) {
            return Err(HostError::Inhibition(format!("Mock inhibit failure for {}", name)));
        }
        if *self.reject_inhibit.lock().unwrap() {
            return Err(HostError::Rejected(format!("Mock rejected inhibit for {}", name)));
        }

        let handle = InhibitorHandle::from_cookie(self.next_cookie.fetch_add(1, Ordering::SeqCst));
        self.held.lock().unwrap().insert(handle, name.to_string());
        Ok(handle)
    }

    async fn uninhibit(&self, handle: InhibitorHandle) -> HostResult<()> {
        self.calls
            .lock()
            .unwrap()
            .push(InhibitorCall::UnInhibit(handle));

        if *self.fail_uninhibit.lock().unwrap() {
            return Err(HostError::Inhibition("Mock uninhibit failure".into()));
        }

        match self.held.lock().unwrap().remove(&handle) {
            Some(_) => Ok(()),
            None => Err(HostError::Inhibition(format!("Invalid cookie {}", handle.cookie()))),
        }
    }

    async fn active_inhibitors(&self) -> HostResult<Vec<String>> {
        Ok(self.held_names())
    }
}
