//! Workspace reference resolution.
//!
//! Users address workspaces per monitor ("workspace 3" on whichever monitor
//! has focus); the compositor only knows global ids.  [`Resolver`] turns a
//! reference string into the global id it denotes on the focused monitor.
//!
//! # Grammar
//!
//! | Reference        | Meaning                                                      |
//! |------------------|--------------------------------------------------------------|
//! | `N`              | slot `N` of the focused monitor, wrapping past `num_workspaces` |
//! | `+N` / `-N`      | `N` slots from the current one, clamped to `[1, num_workspaces]` |
//! | `r+N` / `r-N`    | `N` ids from the active global id, wrapped into the monitor's slots |
//! | `e+N` / `e-N`    | `N` steps through the existing workspaces of the monitor     |
//! | `empty…`         | first slot that does not exist or holds no windows           |
//! | `prev`           | the workspace this monitor showed before the active one      |
//!
//! Anything else (and any relative expression that does not evaluate) is
//! returned unchanged so the compositor can parse it itself.

use crate::command::{MonitorInfo, WorkspaceId};
use crate::history::PreviousWorkspaces;
use crate::range::MonitorRange;
use crate::traits::Compositor;
use log::{debug, error};

/// A parsed workspace reference.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkspaceReference<'a> {
    /// Monitor-local slot number.
    Absolute(i32),
    /// `+N` / `-N` relative to the current slot.
    Relative(&'a str),
    /// `r+N` / `r-N`; holds the expression without the `r`.
    RoundTrip(&'a str),
    /// `e+N` / `e-N`; holds the expression without the `e`.
    MonitorStep(&'a str),
    Empty,
    Previous,
    PassThrough,
}

impl<'a> WorkspaceReference<'a> {
    pub fn parse(reference: &'a str) -> Self {
        let mut chars = reference.chars();
        match (chars.next(), chars.next()) {
            (None, _) => WorkspaceReference::PassThrough,
            _ if is_digits(reference) => reference
                .parse()
                .map(WorkspaceReference::Absolute)
                .unwrap_or(WorkspaceReference::PassThrough),
            (Some('+' | '-'), _) => WorkspaceReference::Relative(reference),
            (Some('r'), Some('+' | '-')) if is_digits(&reference[2..]) => {
                WorkspaceReference::RoundTrip(&reference[1..])
            }
            (Some('e'), Some('+' | '-')) if is_digits(&reference[2..]) => {
                WorkspaceReference::MonitorStep(&reference[1..])
            }
            _ if reference.starts_with("empty") => WorkspaceReference::Empty,
            _ if reference == "prev" => WorkspaceReference::Previous,
            _ => WorkspaceReference::PassThrough,
        }
    }
}

fn is_digits(s: &str) -> bool {
    !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit())
}

/// Evaluate a `+N` / `-N` expression against `base`.
///
/// Returns `None` when `expr` is not a sign followed by digits, or the sum
/// overflows.
pub fn plus_minus(expr: &str, base: i32) -> Option<i32> {
    let (negative, digits) = match expr.as_bytes().first()? {
        b'+' => (false, &expr[1..]),
        b'-' => (true, &expr[1..]),
        _ => return None,
    };
    if !is_digits(digits) {
        return None;
    }
    let n: i32 = digits.parse().ok()?;
    if negative {
        base.checked_sub(n)
    } else {
        base.checked_add(n)
    }
}

/// Resolves references on the focused monitor of a [`Compositor`].
pub struct Resolver<'a, C: Compositor + ?Sized> {
    compositor: &'a C,
    num_workspaces: i32,
    history: &'a PreviousWorkspaces,
}

impl<'a, C: Compositor + ?Sized> Resolver<'a, C> {
    pub fn new(compositor: &'a C, num_workspaces: i32, history: &'a PreviousWorkspaces) -> Self {
        Self {
            compositor,
            num_workspaces,
            history,
        }
    }

    /// Resolve `reference` to a global workspace id, or return it
    /// unchanged if it is not one hyprsplit handles.
    ///
    /// Without a focused monitor nothing is resolved.
    pub fn resolve(&self, reference: &str) -> Result<String, C::Error> {
        let monitor = match self.compositor.active_monitor()? {
            Some(m) if m.owns_workspaces() => m,
            _ => {
                error!("no focused monitor, cannot resolve {:?}", reference);
                return Ok(reference.to_string());
            }
        };
        self.resolve_on(&monitor, reference)
    }

    /// Resolve `reference` as if `monitor` had focus.
    pub fn resolve_on(&self, monitor: &MonitorInfo, reference: &str) -> Result<String, C::Error> {
        let k = self.num_workspaces;
        let range = MonitorRange::new(monitor.id, k);
        let active = monitor.active_workspace.unwrap_or(range.min());

        let slot = match WorkspaceReference::parse(reference) {
            WorkspaceReference::Absolute(n) => n.max(1),

            WorkspaceReference::Relative(expr) => {
                let current = (active - 1).rem_euclid(k) + 1;
                match plus_minus(expr, current) {
                    Some(v) => v.max(1).min(k),
                    None => return Ok(unresolved(reference)),
                }
            }

            WorkspaceReference::RoundTrip(expr) => match plus_minus(expr, active) {
                Some(v) if v <= 0 => (v - 1).rem_euclid(k) + 1,
                Some(v) => v,
                None => return Ok(unresolved(reference)),
            },

            WorkspaceReference::MonitorStep(expr) => {
                return Ok(self
                    .step_on_monitor(monitor, active, expr)?
                    .map(|id| id.to_string())
                    .unwrap_or_else(|| unresolved(reference)));
            }

            WorkspaceReference::Empty => {
                return Ok(self.first_empty(range)?.unwrap_or_else(|| {
                    debug!("no empty workspace on {}", monitor.name);
                    active
                })
                .to_string());
            }

            WorkspaceReference::Previous => {
                return Ok(self.previous(range, active)?.to_string());
            }

            WorkspaceReference::PassThrough => return Ok(unresolved(reference)),
        };

        let slot = if slot > k { (slot - 1) % k + 1 } else { slot };
        Ok(range.global(slot).to_string())
    }

    /// Step `expr` positions through the sorted ids of the non-special
    /// workspaces on `monitor`, starting from `active`.
    fn step_on_monitor(
        &self,
        monitor: &MonitorInfo,
        active: WorkspaceId,
        expr: &str,
    ) -> Result<Option<WorkspaceId>, C::Error> {
        let mut ids: Vec<WorkspaceId> = self
            .compositor
            .workspaces()?
            .into_iter()
            .filter(|w| w.monitor == monitor.id && !w.is_special)
            .map(|w| w.id)
            .collect();
        ids.sort_unstable();

        let Some(pos) = ids.iter().position(|&id| id == active) else {
            return Ok(None);
        };
        let Some(target) = plus_minus(expr, pos as i32) else {
            return Ok(None);
        };
        let target = target.clamp(0, ids.len() as i32 - 1) as usize;
        Ok(Some(ids[target]))
    }

    /// First id in `range` that has no workspace yet or whose workspace is
    /// empty.
    fn first_empty(&self, range: MonitorRange) -> Result<Option<WorkspaceId>, C::Error> {
        let workspaces = self.compositor.workspaces()?;
        Ok(range.ids().find(|&id| {
            workspaces
                .iter()
                .find(|w| w.id == id)
                .map_or(true, |w| w.windows == 0)
        }))
    }

    /// The predecessor of `active` within `range`: the compositor's record
    /// first, then hyprsplit's own table, else `active` itself.
    fn previous(&self, range: MonitorRange, active: WorkspaceId) -> Result<WorkspaceId, C::Error> {
        let tracked = self
            .compositor
            .workspace(active)?
            .and_then(|w| w.previous)
            .filter(|&p| range.contains(p));
        Ok(tracked
            .or_else(|| self.history.get(active).filter(|&p| range.contains(p)))
            .unwrap_or(active))
    }
}

fn unresolved(reference: &str) -> String {
    debug!("passing {:?} through unchanged", reference);
    reference.to_string()
}
