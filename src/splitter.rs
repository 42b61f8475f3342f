//! The orchestrator that ties the resolver, the enforcer and the
//! compositor together.
//!
//! [`Splitter`] owns the bookkeeping tables and reacts to [`Command`]s by
//! remapping workspace references and issuing calls to the [`Compositor`]
//! trait.

use crate::command::{Command, MonitorInfo, WindowInfo, WorkspaceId};
use crate::config::Config;
use crate::enforcer::{enforce, RepairReport};
use crate::history::PreviousWorkspaces;
use crate::persistence::PersistentRules;
use crate::range::MonitorRange;
use crate::resolver::Resolver;
use crate::traits::Compositor;
use log::{debug, error, info, warn};
use std::collections::HashSet;
use std::path::PathBuf;

/// Possible errors from the splitter.
#[derive(Debug, thiserror::Error)]
pub enum SplitError {
    #[error("no focused monitor")]
    NoMonitor,
    #[error("no active workspace on the focused monitor")]
    NoActiveWorkspace,
    #[error("invalid workspace: {0}")]
    InvalidWorkspace(String),
    #[error("unknown monitor: {0}")]
    UnknownMonitor(String),
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
    /// The compositor returned an error.
    #[error("compositor error: {0}")]
    Compositor(String),
}

fn host<E: std::error::Error>(e: E) -> SplitError {
    SplitError::Compositor(e.to_string())
}

/// Keeps every monitor inside its own slice of the workspace id space.
///
/// The splitter is generic over any [`Compositor`] implementation, making
/// it independent of Hyprland or any other concrete backend.
///
/// # Typical usage
///
/// ```ignore
/// let mut splitter = Splitter::new(HyprlandCompositor::new(), Config::default());
/// splitter.startup()?;
/// splitter.handle(Command::Workspace("3".into()))?;
/// ```
pub struct Splitter<C: Compositor> {
    compositor: C,
    config: Config,
    config_path: Option<PathBuf>,
    history: PreviousWorkspaces,
    rules: PersistentRules,
}

impl<C: Compositor> Splitter<C> {
    pub fn new(compositor: C, config: Config) -> Self {
        Self {
            compositor,
            config,
            config_path: None,
            history: PreviousWorkspaces::new(),
            rules: PersistentRules::new(),
        }
    }

    /// Re-read the configuration from `path` on every
    /// [`ConfigReloaded`](Command::ConfigReloaded).
    pub fn with_config_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.config_path = Some(path.into());
        self
    }

    pub fn compositor(&self) -> &C {
        &self.compositor
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn rules(&self) -> &PersistentRules {
        &self.rules
    }

    pub fn history(&self) -> &PreviousWorkspaces {
        &self.history
    }

    fn num_workspaces(&self) -> i32 {
        self.config.workspaces_per_monitor()
    }

    fn resolver(&self) -> Resolver<'_, C> {
        Resolver::new(&self.compositor, self.num_workspaces(), &self.history)
    }

    /// Seed the history with what every monitor currently shows and repair
    /// the ranges once.
    pub fn startup(&mut self) -> Result<RepairReport, SplitError> {
        let k = self.num_workspaces();
        for m in self.compositor.monitors().map_err(host)? {
            if let (true, Some(active)) = (m.owns_workspaces(), m.active_workspace) {
                self.history.record(&m.name, MonitorRange::new(m.id, k), active);
            }
        }
        self.enforce()
    }

    /// Resolve a workspace reference on the focused monitor without any
    /// side effects.
    pub fn resolve(&self, reference: &str) -> Result<String, SplitError> {
        self.resolver().resolve(reference).map_err(host)
    }

    /// Run the range enforcer now.
    pub fn enforce(&mut self) -> Result<RepairReport, SplitError> {
        self.publish_rules();
        let k = self.num_workspaces();
        let rules = self.config.persistent_workspaces.then_some(&mut self.rules);
        enforce(&self.compositor, k, rules).map_err(host)
    }

    /// Process a single [`Command`].
    ///
    /// Dispatchers return what they resolved to (if anything); lifecycle
    /// events return `None`.
    pub fn handle(&mut self, cmd: Command) -> Result<Option<String>, SplitError> {
        match cmd {
            Command::Workspace(arg) => {
                info!("workspace {}", arg);
                self.focus_workspace(&arg).map(Some)
            }
            Command::MoveToWorkspace(arg) => {
                info!("movetoworkspace {}", arg);
                self.move_to_workspace(&arg, false).map(Some)
            }
            Command::MoveToWorkspaceSilent(arg) => {
                info!("movetoworkspacesilent {}", arg);
                self.move_to_workspace(&arg, true).map(Some)
            }
            Command::SwapActiveWorkspaces(arg) => {
                info!("swapactiveworkspaces {}", arg);
                self.swap_active_workspaces(&arg).map(|_| None)
            }
            Command::GrabRogueWindows(_) => {
                info!("grabroguewindows");
                self.grab_rogue_windows().map(|n| Some(n.to_string()))
            }
            Command::Resolve(arg) => self.resolve(&arg).map(Some),

            Command::MonitorAdded { name } => {
                info!("monitor added {}", name);
                self.enforce().map(|_| None)
            }
            Command::MonitorRemoved { name } => {
                info!("monitor removed {}", name);
                self.history.forget_monitor(&name);
                self.rules.release_monitor(&name);
                self.publish_rules();
                self.enforce().map(|_| None)
            }
            Command::ConfigReloaded => {
                self.reload_config();
                self.enforce().map(|_| None)
            }
            Command::WorkspaceChanged { id } => {
                self.record_workspace_change(id)?;
                Ok(None)
            }
            Command::WorkspaceDestroyed { id } => {
                debug!("workspace {} destroyed", id);
                self.history.forget(id);
                Ok(None)
            }
            Command::Shutdown => {
                info!("shutting down");
                self.rules.release_all();
                self.publish_rules();
                Ok(None)
            }
        }
    }

    //  Dispatchers

    /// The focused monitor, if it owns workspaces.
    fn focused_monitor(&self) -> Result<MonitorInfo, SplitError> {
        match self.compositor.active_monitor().map_err(host)? {
            Some(m) if m.owns_workspaces() => Ok(m),
            _ => {
                error!("no focused monitor");
                Err(SplitError::NoMonitor)
            }
        }
    }

    fn focus_workspace(&mut self, arg: &str) -> Result<String, SplitError> {
        let monitor = self.focused_monitor()?;
        let resolved = self.resolver().resolve_on(&monitor, arg).map_err(host)?;

        let Ok(id) = resolved.parse::<WorkspaceId>() else {
            debug!("letting the compositor handle {:?}", resolved);
            self.compositor.focus_workspace(&resolved).map_err(host)?;
            return Ok(resolved);
        };
        if id <= 0 {
            error!("focus workspace: invalid workspace {}", id);
            return Err(SplitError::InvalidWorkspace(resolved));
        }

        match self.compositor.workspace(id).map_err(host)? {
            None => debug!("workspace {} will be created on {}", id, monitor.name),
            Some(ws) => {
                let range = MonitorRange::new(monitor.id, self.num_workspaces());
                if ws.monitor != monitor.id && range.contains(id) {
                    warn!("workspace {} exists but is on the wrong monitor", id);
                    self.enforce()?;
                }
            }
        }
        self.compositor.focus_workspace(&resolved).map_err(host)?;
        Ok(resolved)
    }

    fn move_to_workspace(&self, arg: &str, silent: bool) -> Result<String, SplitError> {
        let monitor = self.focused_monitor()?;
        let resolver = self.resolver();
        let args = match arg.rsplit_once(',') {
            Some((workspace, selector)) => format!(
                "{},{}",
                resolver.resolve_on(&monitor, workspace).map_err(host)?,
                selector
            ),
            None => resolver.resolve_on(&monitor, arg).map_err(host)?,
        };
        self.compositor
            .move_to_workspace(&args, silent)
            .map_err(host)?;
        Ok(args)
    }

    fn swap_active_workspaces(&mut self, arg: &str) -> Result<(), SplitError> {
        let (a, b) = arg
            .trim()
            .split_once(char::is_whitespace)
            .map(|(a, b)| (a.trim(), b.trim()))
            .filter(|(a, b)| !a.is_empty() && !b.is_empty())
            .ok_or_else(|| {
                SplitError::InvalidArgument(format!("expected \"<monitor> <monitor>\", got {:?}", arg))
            })?;

        let monitors = self.compositor.monitors().map_err(host)?;
        let find = |sel: &str| {
            monitors
                .iter()
                .find(|m| m.matches(sel))
                .cloned()
                .ok_or_else(|| SplitError::UnknownMonitor(sel.to_string()))
        };
        let (mon_a, mon_b) = (find(a)?, find(b)?);
        if mon_a.id == mon_b.id {
            return Err(SplitError::InvalidArgument(format!(
                "cannot swap {} with itself",
                mon_a.name
            )));
        }

        let ws_a = self.existing_active(&mon_a)?;
        let ws_b = self.existing_active(&mon_b)?;
        let windows = self.compositor.windows().map_err(host)?;

        match self.compositor.layout() {
            Some(layout) => {
                debug!("swapping {} and {} in place ({} layout)", ws_a, ws_b, layout.name());
                let c = &self.compositor;
                c.assign_workspace_monitor(ws_a, mon_b.id).map_err(host)?;
                c.assign_workspace_monitor(ws_b, mon_a.id).map_err(host)?;
                for w in windows.iter().filter(|w| !w.pinned) {
                    let (from, to) = match w.workspace {
                        id if id == ws_a => (&mon_a, &mon_b),
                        id if id == ws_b => (&mon_b, &mon_a),
                        _ => continue,
                    };
                    if let Some((at, size)) = translate(w, from, to) {
                        c.set_window_geometry(&w.address, at, size).map_err(host)?;
                    }
                }
                // Ids stay on their monitors, so the history still holds.
                c.swap_workspace_ids(ws_a, ws_b).map_err(host)?;
                layout.swap_workspace_nodes(ws_a, ws_b);
                c.set_active_workspace(&mon_a, ws_a).map_err(host)?;
                c.set_active_workspace(&mon_b, ws_b).map_err(host)?;
            }
            None => {
                debug!("layout cannot be renumbered, moving windows between {} and {}", ws_a, ws_b);
                // Snapshot first: moving a window changes which side it is on.
                for w in &windows {
                    let target = match w.workspace {
                        id if id == ws_a => ws_b,
                        id if id == ws_b => ws_a,
                        _ => continue,
                    };
                    self.compositor
                        .move_window_to_workspace_silent(&w.address, target)
                        .map_err(host)?;
                }
            }
        }

        self.compositor.recalculate_monitor(&mon_a).map_err(host)?;
        self.compositor.recalculate_monitor(&mon_b).map_err(host)?;
        self.compositor.refocus().map_err(host)?;
        Ok(())
    }

    /// The active workspace of `monitor`, provided it exists.
    fn existing_active(&self, monitor: &MonitorInfo) -> Result<WorkspaceId, SplitError> {
        let id = monitor.active_workspace.ok_or(SplitError::NoActiveWorkspace)?;
        match self.compositor.workspace(id).map_err(host)? {
            Some(_) => Ok(id),
            None => Err(SplitError::NoActiveWorkspace),
        }
    }

    /// Move every mapped window outside all monitor ranges onto the focused
    /// monitor's active workspace.  Returns how many windows moved.
    fn grab_rogue_windows(&self) -> Result<usize, SplitError> {
        let monitor = self.focused_monitor()?;
        let target = self.existing_active(&monitor).inspect_err(|_| {
            error!("no active workspace on {}", monitor.name);
        })?;

        let k = self.num_workspaces();
        let ranges: Vec<MonitorRange> = self
            .compositor
            .monitors()
            .map_err(host)?
            .iter()
            .filter(|m| m.owns_workspaces())
            .map(|m| MonitorRange::new(m.id, k))
            .collect();
        let special: HashSet<WorkspaceId> = self
            .compositor
            .workspaces()
            .map_err(host)?
            .into_iter()
            .filter(|w| w.is_special)
            .map(|w| w.id)
            .collect();

        let mut moved = 0;
        for w in self.compositor.windows().map_err(host)? {
            if !w.mapped || special.contains(&w.workspace) {
                continue;
            }
            if ranges.iter().any(|r| r.contains(w.workspace)) {
                continue;
            }
            info!("moving window {} from workspace {} to {}", w.title, w.workspace, target);
            self.compositor
                .move_window_to_workspace_silent(&w.address, target)
                .map_err(host)?;
            moved += 1;
        }
        Ok(moved)
    }

    //  Lifecycle

    fn reload_config(&mut self) {
        if let Some(path) = &self.config_path {
            match Config::load(path) {
                Ok(cfg) => {
                    info!("reloaded config from {}", path.display());
                    self.config = cfg;
                }
                Err(e) => warn!("keeping previous config: {}", e),
            }
        }
        if !self.config.persistent_workspaces {
            self.rules.release_all();
        }
        self.publish_rules();
    }

    /// Send the rule set to the compositor unless it already has it.
    fn publish_rules(&mut self) {
        if !self.rules.needs_publish() {
            return;
        }
        match self.compositor.sync_persistent_rules(self.rules.rules()) {
            Ok(()) => self.rules.mark_published(),
            Err(e) => warn!("failed to publish persistent workspace rules: {}", e),
        }
    }

    /// Credit the switch to `id` to the monitor showing it.
    fn record_workspace_change(&mut self, id: WorkspaceId) -> Result<(), SplitError> {
        let owner = self.compositor.workspace(id).map_err(host)?.map(|ws| ws.monitor);
        let monitor = match owner {
            Some(owner) => self
                .compositor
                .monitors()
                .map_err(host)?
                .into_iter()
                .find(|m| m.id == owner),
            None => self.compositor.active_monitor().map_err(host)?,
        };
        let Some(monitor) = monitor else {
            return Ok(());
        };
        if monitor.owns_workspaces() {
            let range = MonitorRange::new(monitor.id, self.num_workspaces());
            self.history.record(&monitor.name, range, id);
        }
        Ok(())
    }
}

/// New geometry for window `w` moving from `from` to `to`: fullscreen
/// windows take the target's size, floating ones keep their offset.  Tiled
/// windows are placed by the layout.
fn translate(
    w: &WindowInfo,
    from: &MonitorInfo,
    to: &MonitorInfo,
) -> Option<((i32, i32), (i32, i32))> {
    if w.fullscreen {
        Some(((to.x, to.y), (to.width, to.height)))
    } else if w.floating {
        Some(((w.at.0 - from.x + to.x, w.at.1 - from.y + to.y), w.size))
    } else {
        None
    }
}

//  Tests
