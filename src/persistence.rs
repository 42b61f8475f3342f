//! Persistent workspace rules owned by hyprsplit.
//!
//! With `persistent_workspaces` enabled every id in a monitor's range gets
//! a rule binding it to that monitor, so the compositor keeps the whole
//! range alive.  Rules carry [`RULE_OWNER`] so they are never confused with
//! rules the user wrote.

use crate::command::WorkspaceId;
use crate::range::MonitorRange;
use serde::{Deserialize, Serialize};

/// Marker identifying rules created by hyprsplit.
pub const RULE_OWNER: &str = "hyprsplit";

/// Binds workspace `id` to the monitor named `monitor`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersistentWorkspaceRule {
    pub id: WorkspaceId,
    pub monitor: String,
    pub owner: String,
}

impl PersistentWorkspaceRule {
    pub fn new(id: WorkspaceId, monitor: impl Into<String>) -> Self {
        Self {
            id,
            monitor: monitor.into(),
            owner: RULE_OWNER.to_string(),
        }
    }

    pub fn is_owned(&self) -> bool {
        self.owner == RULE_OWNER
    }
}

/// The rule set hyprsplit maintains.
///
/// Every change marks the set unpublished until
/// [`mark_published`](Self::mark_published) is called after a successful
/// sync, so a failed sync is retried on the next occasion.
#[derive(Debug, Clone, Default)]
pub struct PersistentRules {
    rules: Vec<PersistentWorkspaceRule>,
    unpublished: bool,
}

impl PersistentRules {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind every id of `range` to `monitor`, retargeting existing rules in
    /// place.  Returns `true` if anything changed.
    pub fn claim(&mut self, range: MonitorRange, monitor: &str) -> bool {
        let mut changed = false;
        for id in range.ids() {
            match self
                .rules
                .iter_mut()
                .find(|r| r.is_owned() && r.id == id)
            {
                Some(rule) if rule.monitor == monitor => {}
                Some(rule) => {
                    rule.monitor = monitor.to_string();
                    changed = true;
                }
                None => {
                    self.rules.push(PersistentWorkspaceRule::new(id, monitor));
                    changed = true;
                }
            }
        }
        self.unpublished |= changed;
        changed
    }

    /// Drop the rules bound to `monitor`.  Returns `true` if any were
    /// removed.
    pub fn release_monitor(&mut self, monitor: &str) -> bool {
        let before = self.rules.len();
        self.rules.retain(|r| !(r.is_owned() && r.monitor == monitor));
        let changed = self.rules.len() != before;
        self.unpublished |= changed;
        changed
    }

    /// Drop every hyprsplit rule.  Returns `true` if any were removed.
    pub fn release_all(&mut self) -> bool {
        let before = self.rules.len();
        self.rules.retain(|r| !r.is_owned());
        let changed = self.rules.len() != before;
        self.unpublished |= changed;
        changed
    }

    /// Whether the compositor has not seen the current rules yet.
    pub fn needs_publish(&self) -> bool {
        self.unpublished
    }

    pub fn mark_published(&mut self) {
        self.unpublished = false;
    }

    pub fn rules(&self) -> &[PersistentWorkspaceRule] {
        &self.rules
    }

    /// The monitor `id` is bound to, if any.
    pub fn monitor_for(&self, id: WorkspaceId) -> Option<&str> {
        self.rules
            .iter()
            .find(|r| r.id == id)
            .map(|r| r.monitor.as_str())
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn claim_creates_one_rule_per_id() {
        let mut rules = PersistentRules::new();
        assert!(rules.claim(MonitorRange::new(1, 3), "DP-2"));
        let ids: Vec<_> = rules.rules().iter().map(|r| r.id).collect();
        assert_eq!(ids, vec![4, 5, 6]);
        assert!(rules.rules().iter().all(|r| r.monitor == "DP-2" && r.is_owned()));
    }

    #[test]
    fn claim_twice_changes_nothing() {
        let mut rules = PersistentRules::new();
        rules.claim(MonitorRange::new(0, 3), "DP-1");
        assert!(!rules.claim(MonitorRange::new(0, 3), "DP-1"));
        assert_eq!(rules.rules().len(), 3);
    }

    #[test]
    fn claim_retargets_in_place() {
        let mut rules = PersistentRules::new();
        rules.claim(MonitorRange::new(0, 3), "DP-1");
        assert!(rules.claim(MonitorRange::new(0, 3), "HDMI-A-1"));
        assert_eq!(rules.rules().len(), 3);
        assert_eq!(rules.monitor_for(2), Some("HDMI-A-1"));
    }

    #[test]
    fn release_monitor_keeps_others() {
        let mut rules = PersistentRules::new();
        rules.claim(MonitorRange::new(0, 2), "DP-1");
        rules.claim(MonitorRange::new(1, 2), "DP-2");
        assert!(rules.release_monitor("DP-1"));
        assert!(!rules.release_monitor("DP-1"));
        assert_eq!(rules.monitor_for(1), None);
        assert_eq!(rules.monitor_for(3), Some("DP-2"));
    }

    #[test]
    fn changes_stay_unpublished_until_marked() {
        let mut rules = PersistentRules::new();
        assert!(!rules.needs_publish());
        rules.claim(MonitorRange::new(0, 2), "DP-1");
        assert!(rules.needs_publish());
        // Claiming again changes nothing but keeps the pending sync.
        assert!(!rules.claim(MonitorRange::new(0, 2), "DP-1"));
        assert!(rules.needs_publish());
        rules.mark_published();
        assert!(!rules.needs_publish());
        rules.release_monitor("DP-1");
        assert!(rules.needs_publish());
    }

    #[test]
    fn release_all_empties() {
        let mut rules = PersistentRules::new();
        rules.claim(MonitorRange::new(0, 2), "DP-1");
        assert!(rules.release_all());
        assert!(rules.is_empty());
        assert!(!rules.release_all());
    }
}
