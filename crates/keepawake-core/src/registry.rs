//! Registry of held inhibitions

use keepawake_host_api::InhibitorHandle;
use keepawake_util::InhibitorName;
use std::collections::BTreeMap;

/// The inhibitions the orchestrator believes are currently held.
///
/// Every entry was created from a successful inhibit call and is removed
/// only after a successful uninhibit (or at shutdown). Mutation is reserved
/// to the reconciler, which owns the registry exclusively.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Registry {
    entries: BTreeMap<InhibitorName, InhibitorHandle>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    pub fn get(&self, name: &str) -> Option<InhibitorHandle> {
        self.entries.get(name).copied()
    }

    /// Held names in sorted order
    pub fn names(&self) -> impl Iterator<Item = &InhibitorName> {
        self.entries.keys()
    }

    pub(crate) fn record(&mut self, name: InhibitorName, handle: InhibitorHandle) {
        self.entries.insert(name, handle);
    }

    pub(crate) fn release(&mut self, name: &str) -> Option<InhibitorHandle> {
        self.entries.remove(name)
    }

    /// Remove and return every entry
    pub(crate) fn take_all(&mut self) -> Vec<(InhibitorName, InhibitorHandle)> {
        std::mem::take(&mut self.entries).into_iter().collect()
    }
}
