//! Range invariant repair.
//!
//! Two facts must hold at all times:
//!
//! 1. every monitor shows a workspace from its own range, and
//! 2. every workspace whose id falls in a monitor's range lives on that
//!    monitor.
//!
//! Hot-plugging monitors, changing `num_workspaces`, or other tools moving
//! workspaces around break both.  [`enforce`] puts them back.  It is
//! idempotent: a second run without intervening changes does nothing.

use crate::command::{MonitorInfo, WorkspaceId};
use crate::persistence::PersistentRules;
use crate::range::MonitorRange;
use crate::traits::Compositor;
use log::{debug, info, warn};

/// What a call to [`enforce`] changed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RepairReport {
    /// `(monitor, workspace)` pairs whose active workspace was replaced.
    pub activated: Vec<(String, WorkspaceId)>,
    /// Workspaces that had to be created.
    pub created: Vec<WorkspaceId>,
    /// `(workspace, monitor)` pairs for workspaces moved to their owner.
    pub relocated: Vec<(WorkspaceId, String)>,
    /// Whether the persistent rule set changed.
    pub rules_changed: bool,
}

impl RepairReport {
    pub fn is_empty(&self) -> bool {
        self.activated.is_empty()
            && self.created.is_empty()
            && self.relocated.is_empty()
            && !self.rules_changed
    }
}

/// Restore the range invariants on every monitor that owns workspaces.
///
/// The first pass fixes each monitor's active workspace; only once all
/// monitors show an in-range workspace does the second pass relocate stray
/// workspaces (and, when `rules` is given, keep the persistent rules and
/// their workspaces in step with the monitors).
///
/// Query failures are returned.  A failed mutation is logged and skipped;
/// the next triggering event tries again.
pub fn enforce<C: Compositor + ?Sized>(
    compositor: &C,
    num_workspaces: i32,
    mut rules: Option<&mut PersistentRules>,
) -> Result<RepairReport, C::Error> {
    let mut report = RepairReport::default();

    for monitor in compositor.monitors()?.iter().filter(|m| m.owns_workspaces()) {
        fix_active_workspace(compositor, monitor, num_workspaces, &mut report)?;
    }

    for monitor in compositor.monitors()?.iter().filter(|m| m.owns_workspaces()) {
        let range = MonitorRange::new(monitor.id, num_workspaces);
        relocate_strays(compositor, monitor, range, &mut report)?;
        if let Some(rules) = rules.as_deref_mut() {
            reconcile_rules(compositor, monitor, range, rules, &mut report)?;
        }
    }

    if report.is_empty() {
        debug!("workspace ranges already consistent");
    }
    Ok(report)
}

fn fix_active_workspace<C: Compositor + ?Sized>(
    compositor: &C,
    monitor: &MonitorInfo,
    num_workspaces: i32,
    report: &mut RepairReport,
) -> Result<(), C::Error> {
    let range = MonitorRange::new(monitor.id, num_workspaces);
    if monitor.active_workspace.is_some_and(|id| range.contains(id)) {
        return Ok(());
    }

    let target = range.min();
    info!(
        "{} (id {}) active workspace {:?} out of [{}, {}], switching to {}",
        monitor.name,
        monitor.id,
        monitor.active_workspace,
        range.min(),
        range.max(),
        target
    );

    match compositor.workspace(target)? {
        None => {
            if let Err(e) = compositor.create_workspace(target, monitor) {
                warn!("failed to create workspace {} on {}: {}", target, monitor.name, e);
                return Ok(());
            }
            report.created.push(target);
        }
        Some(ws) if ws.monitor != monitor.id => {
            if let Err(e) = compositor.move_workspace_to_monitor(target, monitor) {
                warn!("failed to move workspace {} to {}: {}", target, monitor.name, e);
                return Ok(());
            }
            report.relocated.push((target, monitor.name.clone()));
        }
        Some(_) => {}
    }

    if let Err(e) = compositor.set_active_workspace(monitor, target) {
        warn!("failed to activate workspace {} on {}: {}", target, monitor.name, e);
        return Ok(());
    }
    report.activated.push((monitor.name.clone(), target));
    Ok(())
}

fn relocate_strays<C: Compositor + ?Sized>(
    compositor: &C,
    monitor: &MonitorInfo,
    range: MonitorRange,
    report: &mut RepairReport,
) -> Result<(), C::Error> {
    let strays = compositor
        .workspaces()?
        .into_iter()
        .filter(|ws| !ws.is_special && range.contains(ws.id) && ws.monitor != monitor.id);

    for ws in strays {
        info!(
            "workspace {} on monitor {} belongs to {} (id {}), moving",
            ws.id, ws.monitor, monitor.name, monitor.id
        );
        match compositor.move_workspace_to_monitor(ws.id, monitor) {
            Ok(()) => report.relocated.push((ws.id, monitor.name.clone())),
            Err(e) => warn!("failed to move workspace {} to {}: {}", ws.id, monitor.name, e),
        }
    }
    Ok(())
}

fn reconcile_rules<C: Compositor + ?Sized>(
    compositor: &C,
    monitor: &MonitorInfo,
    range: MonitorRange,
    rules: &mut PersistentRules,
    report: &mut RepairReport,
) -> Result<(), C::Error> {
    if rules.claim(range, &monitor.name) {
        debug!("persistent rules for {} updated", monitor.name);
        report.rules_changed = true;
    }
    if rules.needs_publish() {
        match compositor.sync_persistent_rules(rules.rules()) {
            Ok(()) => rules.mark_published(),
            Err(e) => warn!("failed to publish persistent workspace rules: {}", e),
        }
    }

    let existing = compositor.workspaces()?;
    for id in range.ids().filter(|id| !existing.iter().any(|w| w.id == *id)) {
        match compositor.create_workspace(id, monitor) {
            Ok(()) => report.created.push(id),
            Err(e) => warn!("failed to create persistent workspace {}: {}", id, e),
        }
    }
    Ok(())
}
