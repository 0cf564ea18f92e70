//! Diff between active workload names and held inhibitions

use keepawake_util::InhibitorName;
use std::collections::BTreeSet;

use crate::Registry;

/// Actions needed to bring the registry in line with the active set
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReconcilePlan {
    /// Active names without an inhibition
    pub to_activate: Vec<InhibitorName>,

    /// Held inhibitions whose name is no longer active
    pub to_deactivate: Vec<InhibitorName>,
}

impl ReconcilePlan {
    /// Compute the plan. `active` is already deduplicated, so each name
    /// appears at most once in `to_activate`.
    pub fn compute(registry: &Registry, active: &BTreeSet<InhibitorName>) -> Self {
        let to_activate = active
            .iter()
            .filter(|name| !registry.contains(name.as_str()))
            .cloned()
            .collect();

        let to_deactivate = registry
            .names()
            .filter(|name| !active.contains(*name))
            .cloned()
            .collect();

        Self {
            to_activate,
            to_deactivate,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.to_activate.is_empty() && self.to_deactivate.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use keepawake_host_api::InhibitorHandle;

    fn names(list: &[&str]) -> BTreeSet<InhibitorName> {
        list.iter().map(|n| InhibitorName::new(*n)).collect()
    }

    fn registry_of(list: &[&str]) -> Registry {
        let mut registry = Registry::new();
        for (i, name) in list.iter().enumerate() {
            registry.record(InhibitorName::new(*name), InhibitorHandle::from_cookie(i as u32 + 1));
        }
        registry
    }

    #[test]
    fn empty_everything() {
        let plan = ReconcilePlan::compute(&Registry::new(), &names(&[]));
        assert!(plan.is_empty());
    }

    #[test]
    fn new_names_are_activated() {
        let plan = ReconcilePlan::compute(&registry_of(&["vm1"]), &names(&["vm1", "vm2"]));
        assert_eq!(plan.to_activate, vec![InhibitorName::new("vm2")]);
        assert!(plan.to_deactivate.is_empty());
    }

    #[test]
    fn vanished_names_are_deactivated() {
        let plan = ReconcilePlan::compute(&registry_of(&["vm1", "vm2"]), &names(&["vm2"]));
        assert!(plan.to_activate.is_empty());
        assert_eq!(plan.to_deactivate, vec![InhibitorName::new("vm1")]);
    }

    #[test]
    fn both_directions_in_one_plan() {
        let plan = ReconcilePlan::compute(&registry_of(&["old"]), &names(&["new"]));
        assert_eq!(plan.to_activate, vec![InhibitorName::new("new")]);
        assert_eq!(plan.to_deactivate, vec![InhibitorName::new("old")]);
    }

    #[test]
    fn duplicates_collapse() {
        let active: BTreeSet<InhibitorName> = ["A", "A", "A"]
            .iter()
            .map(|n| InhibitorName::new(*n))
            .collect();
        let plan = ReconcilePlan::compute(&Registry::new(), &active);
        assert_eq!(plan.to_activate, vec![InhibitorName::new("A")]);
    }

    #[test]
    fn stable_set_needs_nothing() {
        let plan = ReconcilePlan::compute(&registry_of(&["a", "b"]), &names(&["b", "a"]));
        assert!(plan.is_empty());
    }
}
