//! Monitor-scoped "previous workspace" bookkeeping.
//!
//! The compositor's own history is global, so jumping to `prev` right
//! after focusing another monitor would leave the current monitor's range.
//! [`PreviousWorkspaces`] only remembers transitions that stay inside one
//! monitor's range.

use crate::command::WorkspaceId;
use crate::range::MonitorRange;
use std::collections::HashMap;

/// Workspace id → the workspace its monitor showed right before it.
#[derive(Debug, Clone, Default)]
pub struct PreviousWorkspaces {
    previous: HashMap<WorkspaceId, WorkspaceId>,
    /// Last active workspace seen per monitor name.
    current: HashMap<String, WorkspaceId>,
}

impl PreviousWorkspaces {
    pub fn new() -> Self {
        Self::default()
    }

    /// Note that `monitor` now shows `to`.
    ///
    /// The workspace it showed before becomes `to`'s predecessor when it
    /// falls inside `range`; cross-monitor jumps are not recorded.
    pub fn record(&mut self, monitor: &str, range: MonitorRange, to: WorkspaceId) {
        let from = self.current.insert(monitor.to_string(), to);
        match from {
            Some(from) if from != to && range.contains(from) => {
                self.previous.insert(to, from);
            }
            _ => {}
        }
    }

    /// The recorded predecessor of `id`, if any.
    pub fn get(&self, id: WorkspaceId) -> Option<WorkspaceId> {
        self.previous.get(&id).copied()
    }

    /// Drop every entry that mentions `id`.
    pub fn forget(&mut self, id: WorkspaceId) {
        self.previous.retain(|k, v| *k != id && *v != id);
    }

    /// Forget the last active workspace of a disconnected monitor.
    pub fn forget_monitor(&mut self, monitor: &str) {
        self.current.remove(monitor);
    }

    pub fn len(&self) -> usize {
        self.previous.len()
    }

    pub fn is_empty(&self) -> bool {
        self.previous.is_empty()
    }

    pub fn clear(&mut self) {
        self.previous.clear();
        self.current.clear();
    }
}
