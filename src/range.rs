//! The contiguous block of workspace ids owned by one monitor.

use crate::command::{MonitorId, WorkspaceId};

/// The `[min, max]` window of global workspace ids reserved for a monitor.
///
/// Monitor `m` with `k` workspaces per monitor owns `m*k + 1 ..= (m+1)*k`.
/// Ranges of distinct monitors never overlap and always hold exactly `k`
/// ids.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MonitorRange {
    min: WorkspaceId,
    max: WorkspaceId,
}

impl MonitorRange {
    /// Compute the range for `monitor` given `num_workspaces` slots per
    /// monitor.
    ///
    /// Callers pass a valid (non-negative) monitor id and a positive
    /// `num_workspaces`.
    pub fn new(monitor: MonitorId, num_workspaces: i32) -> Self {
        Self {
            min: monitor * num_workspaces + 1,
            max: (monitor + 1) * num_workspaces,
        }
    }

    pub fn min(&self) -> WorkspaceId {
        self.min
    }

    pub fn max(&self) -> WorkspaceId {
        self.max
    }

    /// Whether `id` lies within `[min, max]`.
    pub fn contains(&self, id: WorkspaceId) -> bool {
        self.min <= id && id <= self.max
    }

    /// Iterate over every id in the range, lowest first.
    pub fn ids(&self) -> impl Iterator<Item = WorkspaceId> {
        self.min..=self.max
    }

    /// Global id of the 1-based `local` slot in this range.
    pub fn global(&self, local: i32) -> WorkspaceId {
        self.min + local - 1
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_monitor_starts_at_one() {
        let r = MonitorRange::new(0, 10);
        assert_eq!((r.min(), r.max()), (1, 10));
    }

    #[test]
    fn size_is_always_num_workspaces() {
        for k in 1..=12 {
            for m in 0..6 {
                let r = MonitorRange::new(m, k);
                assert_eq!(r.max() - r.min() + 1, k, "monitor {m}, k {k}");
                assert_eq!(r.ids().count() as i32, k);
            }
        }
    }

    #[test]
    fn ranges_do_not_overlap() {
        let k = 7;
        for a in 0..5 {
            for b in 0..5 {
                if a == b {
                    continue;
                }
                let ra = MonitorRange::new(a, k);
                let rb = MonitorRange::new(b, k);
                assert!(ra.ids().all(|id| !rb.contains(id)));
            }
        }
    }

    #[test]
    fn contains_is_inclusive() {
        let r = MonitorRange::new(1, 10);
        assert!(!r.contains(10));
        assert!(r.contains(11));
        assert!(r.contains(20));
        assert!(!r.contains(21));
    }

    #[test]
    fn global_maps_local_slots() {
        let r = MonitorRange::new(2, 5);
        assert_eq!(r.global(1), 11);
        assert_eq!(r.global(5), 15);
    }
}
