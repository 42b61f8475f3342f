//! In-memory [`Compositor`] used by the unit tests.
//!
//! Monitors are laid out left to right at 1920×1080 and get ids in the
//! order they are added.  Every mutation is appended to `log` so tests can
//! assert on exactly what the splitter asked for.

use crate::command::{MonitorId, MonitorInfo, WindowInfo, WorkspaceId, WorkspaceInfo};
use crate::persistence::PersistentWorkspaceRule;
use crate::traits::{Compositor, LayoutBookkeeping};
use std::cell::RefCell;
use std::collections::HashSet;

#[derive(Debug, thiserror::Error)]
#[error("mock compositor error: {0}")]
pub struct MockError(pub String);

/// Layout double whose node table can be renumbered.
#[derive(Debug, Default)]
pub struct MockLayout {
    /// `(workspace, window address)` per node.
    pub nodes: RefCell<Vec<(WorkspaceId, String)>>,
}

impl LayoutBookkeeping for MockLayout {
    fn name(&self) -> &str {
        "dwindle"
    }

    fn swap_workspace_nodes(&self, a: WorkspaceId, b: WorkspaceId) {
        for (ws, _) in self.nodes.borrow_mut().iter_mut() {
            if *ws == a {
                *ws = b;
            } else if *ws == b {
                *ws = a;
            }
        }
    }
}

#[derive(Debug, Default)]
pub struct MockCompositor {
    pub monitors: RefCell<Vec<MonitorInfo>>,
    /// Stored workspaces.  `windows` holds windows not listed in
    /// [`windows`](Self::windows); listed ones are added on query.
    pub workspaces: RefCell<Vec<WorkspaceInfo>>,
    pub windows: RefCell<Vec<WindowInfo>>,
    pub rules: RefCell<Vec<PersistentWorkspaceRule>>,
    pub layout: Option<MockLayout>,
    pub log: RefCell<Vec<String>>,
    /// Names of mutations that fail.
    pub failing: RefCell<HashSet<&'static str>>,
}

impl MockCompositor {
    pub fn builder() -> MockBuilder {
        MockBuilder::default()
    }

    pub fn monitor(&self, name: &str) -> MonitorInfo {
        self.monitors
            .borrow()
            .iter()
            .find(|m| m.name == name)
            .cloned()
            .unwrap_or_else(|| panic!("no monitor {name}"))
    }

    pub fn active_of(&self, name: &str) -> Option<WorkspaceId> {
        self.monitor(name).active_workspace
    }

    pub fn owner_of(&self, id: WorkspaceId) -> Option<MonitorId> {
        self.workspaces
            .borrow()
            .iter()
            .find(|w| w.id == id)
            .map(|w| w.monitor)
    }

    pub fn window(&self, address: &str) -> WindowInfo {
        self.windows
            .borrow()
            .iter()
            .find(|w| w.address == address)
            .cloned()
            .unwrap_or_else(|| panic!("no window {address}"))
    }

    pub fn take_log(&self) -> Vec<String> {
        std::mem::take(&mut *self.log.borrow_mut())
    }

    pub fn set_active(&self, monitor: &str, id: WorkspaceId) {
        for m in self.monitors.borrow_mut().iter_mut() {
            if m.name == monitor {
                m.active_workspace = Some(id);
            }
        }
    }

    pub fn focus(&self, monitor: &str) {
        for m in self.monitors.borrow_mut().iter_mut() {
            m.focused = m.name == monitor;
        }
    }

    fn record(&self, op: &'static str, entry: String) -> Result<(), MockError> {
        if self.failing.borrow().contains(op) {
            return Err(MockError(entry));
        }
        self.log.borrow_mut().push(entry);
        Ok(())
    }

    fn ensure_workspace(&self, id: WorkspaceId, monitor: MonitorId) {
        let mut workspaces = self.workspaces.borrow_mut();
        if !workspaces.iter().any(|w| w.id == id) {
            workspaces.push(workspace_info(id, monitor, 0));
        }
    }
}

fn workspace_info(id: WorkspaceId, monitor: MonitorId, windows: u32) -> WorkspaceInfo {
    WorkspaceInfo {
        id,
        name: id.to_string(),
        monitor,
        windows,
        is_special: id < 0,
        previous: None,
    }
}

impl Compositor for MockCompositor {
    type Error = MockError;

    fn monitors(&self) -> Result<Vec<MonitorInfo>, MockError> {
        Ok(self.monitors.borrow().clone())
    }

    fn workspaces(&self) -> Result<Vec<WorkspaceInfo>, MockError> {
        let windows = self.windows.borrow();
        Ok(self
            .workspaces
            .borrow()
            .iter()
            .map(|w| {
                let listed = windows.iter().filter(|c| c.workspace == w.id).count() as u32;
                WorkspaceInfo {
                    windows: w.windows + listed,
                    ..w.clone()
                }
            })
            .collect())
    }

    fn windows(&self) -> Result<Vec<WindowInfo>, MockError> {
        Ok(self.windows.borrow().clone())
    }

    fn layout(&self) -> Option<&dyn LayoutBookkeeping> {
        self.layout.as_ref().map(|l| l as &dyn LayoutBookkeeping)
    }

    fn create_workspace(&self, id: WorkspaceId, monitor: &MonitorInfo) -> Result<(), MockError> {
        self.record("create", format!("create {} on {}", id, monitor.name))?;
        self.ensure_workspace(id, monitor.id);
        Ok(())
    }

    fn move_workspace_to_monitor(
        &self,
        id: WorkspaceId,
        monitor: &MonitorInfo,
    ) -> Result<(), MockError> {
        self.record("move", format!("move {} to {}", id, monitor.name))?;
        for w in self.workspaces.borrow_mut().iter_mut() {
            if w.id == id {
                w.monitor = monitor.id;
            }
        }
        Ok(())
    }

    fn set_active_workspace(&self, monitor: &MonitorInfo, id: WorkspaceId) -> Result<(), MockError> {
        self.record("activate", format!("activate {} on {}", id, monitor.name))?;
        self.set_active(&monitor.name, id);
        Ok(())
    }

    fn focus_workspace(&self, reference: &str) -> Result<(), MockError> {
        self.record("focus", format!("focus {}", reference))?;
        let Ok(id) = reference.parse::<WorkspaceId>() else {
            return Ok(());
        };
        let owner = self.owner_of(id);
        let target = match owner {
            Some(owner) => self
                .monitors
                .borrow()
                .iter()
                .find(|m| m.id == owner)
                .map(|m| m.name.clone()),
            None => self
                .monitors
                .borrow()
                .iter()
                .find(|m| m.focused)
                .map(|m| m.name.clone()),
        };
        if let Some(name) = target {
            let monitor = self.monitor(&name);
            self.ensure_workspace(id, monitor.id);
            self.focus(&name);
            self.set_active(&name, id);
        }
        Ok(())
    }

    fn move_to_workspace(&self, args: &str, silent: bool) -> Result<(), MockError> {
        let op = if silent { "movetoworkspacesilent" } else { "movetoworkspace" };
        self.record("movetoworkspace", format!("{} {}", op, args))
    }

    fn move_window_to_workspace_silent(&self, address: &str, id: WorkspaceId) -> Result<(), MockError> {
        self.record("movewindow", format!("movewindow {} to {}", address, id))?;
        for w in self.windows.borrow_mut().iter_mut() {
            if w.address == address {
                w.workspace = id;
            }
        }
        Ok(())
    }

    fn assign_workspace_monitor(&self, id: WorkspaceId, monitor: MonitorId) -> Result<(), MockError> {
        self.record("assign", format!("assign {} to {}", id, monitor))?;
        for w in self.workspaces.borrow_mut().iter_mut() {
            if w.id == id {
                w.monitor = monitor;
            }
        }
        Ok(())
    }

    fn swap_workspace_ids(&self, a: WorkspaceId, b: WorkspaceId) -> Result<(), MockError> {
        self.record("swapids", format!("swapids {} {}", a, b))?;
        let swap = |id: &mut WorkspaceId| {
            if *id == a {
                *id = b;
            } else if *id == b {
                *id = a;
            }
        };
        for w in self.workspaces.borrow_mut().iter_mut() {
            swap(&mut w.id);
            w.name = w.id.to_string();
        }
        for w in self.windows.borrow_mut().iter_mut() {
            swap(&mut w.workspace);
        }
        Ok(())
    }

    fn set_window_geometry(&self, address: &str, at: (i32, i32), size: (i32, i32)) -> Result<(), MockError> {
        self.record("geometry", format!("geometry {} {:?} {:?}", address, at, size))?;
        for w in self.windows.borrow_mut().iter_mut() {
            if w.address == address {
                w.at = at;
                w.size = size;
            }
        }
        Ok(())
    }

    fn recalculate_monitor(&self, monitor: &MonitorInfo) -> Result<(), MockError> {
        self.record("recalculate", format!("recalculate {}", monitor.name))
    }

    fn refocus(&self) -> Result<(), MockError> {
        self.record("refocus", "refocus".into())
    }

    fn sync_persistent_rules(&self, rules: &[PersistentWorkspaceRule]) -> Result<(), MockError> {
        self.record("rules", format!("rules {}", rules.len()))?;
        *self.rules.borrow_mut() = rules.to_vec();
        Ok(())
    }
}

/// Builder for a [`MockCompositor`].
#[derive(Debug, Default)]
pub struct MockBuilder {
    inner: MockCompositor,
}

impl MockBuilder {
    /// Add a monitor showing workspace `active`.  Its id is its position.
    pub fn monitor(self, name: &str, active: WorkspaceId) -> Self {
        let id = self.inner.monitors.borrow().len() as MonitorId;
        self.push_monitor(id, name, active, false)
    }

    /// Add a monitor mirroring another one.
    pub fn mirror(self, name: &str, active: WorkspaceId) -> Self {
        let id = self.inner.monitors.borrow().len() as MonitorId;
        self.push_monitor(id, name, active, true)
    }

    /// Add a monitor whose id is the invalid sentinel.
    pub fn invalid_monitor(self, name: &str, active: WorkspaceId) -> Self {
        self.push_monitor(-1, name, active, false)
    }

    fn push_monitor(self, id: MonitorId, name: &str, active: WorkspaceId, mirror: bool) -> Self {
        let slot = self.inner.monitors.borrow().len() as i32;
        self.inner.monitors.borrow_mut().push(MonitorInfo {
            id,
            name: name.into(),
            active_workspace: Some(active),
            focused: false,
            mirror,
            x: slot * 1920,
            y: 0,
            width: 1920,
            height: 1080,
        });
        self
    }

    pub fn focus(self, name: &str) -> Self {
        self.inner.focus(name);
        self
    }

    /// Add workspace `id` on monitor `monitor` holding `windows` unlisted
    /// windows.
    pub fn workspace(self, id: WorkspaceId, monitor: MonitorId, windows: u32) -> Self {
        self.inner
            .workspaces
            .borrow_mut()
            .push(workspace_info(id, monitor, windows));
        self
    }

    /// Record a compositor-tracked predecessor for workspace `id`.
    pub fn previous(self, id: WorkspaceId, previous: WorkspaceId) -> Self {
        for w in self.inner.workspaces.borrow_mut().iter_mut() {
            if w.id == id {
                w.previous = Some(previous);
            }
        }
        self
    }

    /// Add a mapped, tiled window on workspace `ws`.
    pub fn window(self, address: &str, ws: WorkspaceId) -> Self {
        self.push_window(WindowInfo {
            address: address.into(),
            title: address.into(),
            workspace: ws,
            mapped: true,
            pinned: false,
            floating: false,
            fullscreen: false,
            at: (0, 0),
            size: (800, 600),
        })
    }

    pub fn push_window(self, window: WindowInfo) -> Self {
        self.inner.windows.borrow_mut().push(window);
        self
    }

    pub fn with_layout(mut self) -> Self {
        self.inner.layout = Some(MockLayout::default());
        self
    }

    /// Finish, creating any active workspace that was not added explicitly
    /// on the monitor that shows it.
    pub fn build(self) -> MockCompositor {
        let monitors = self.inner.monitors.borrow().clone();
        for m in monitors {
            if let Some(active) = m.active_workspace {
                self.inner.ensure_workspace(active, m.id);
            }
        }
        self.inner
    }
}
