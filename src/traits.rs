//! Core traits that decouple hyprsplit from any specific compositor or
//! transport mechanism.
//!
//! Every concrete backend (Hyprland, a Unix-socket listener, a test harness,
//! …) implements one of these traits.  The
//! [`Splitter`](crate::splitter::Splitter), the
//! [`resolver`](crate::resolver) and the [`enforcer`](crate::enforcer) only
//! depend on these abstractions.

use crate::command::{MonitorId, MonitorInfo, Request, WindowInfo, WorkspaceId, WorkspaceInfo};
use crate::persistence::PersistentWorkspaceRule;
use std::sync::mpsc;

/// Abstraction over the compositor that owns monitors, workspaces and
/// windows.
///
/// The splitter never holds on to anything returned here past a single
/// command: every query is a fresh snapshot and every mutation is applied
/// immediately.
pub trait Compositor {
    /// The error type produced by this compositor.
    type Error: std::error::Error + Send + 'static;

    //  Queries

    /// All monitors, in the compositor's order.
    fn monitors(&self) -> Result<Vec<MonitorInfo>, Self::Error>;

    /// All live workspaces, special ones included.
    fn workspaces(&self) -> Result<Vec<WorkspaceInfo>, Self::Error>;

    /// All client windows.
    fn windows(&self) -> Result<Vec<WindowInfo>, Self::Error>;

    /// The monitor that currently has focus, or `None` if no monitor is
    /// focused.
    fn active_monitor(&self) -> Result<Option<MonitorInfo>, Self::Error> {
        Ok(self.monitors()?.into_iter().find(|m| m.focused))
    }

    /// Look up a workspace by id.
    fn workspace(&self, id: WorkspaceId) -> Result<Option<WorkspaceInfo>, Self::Error> {
        Ok(self.workspaces()?.into_iter().find(|w| w.id == id))
    }

    /// Layout-internal bookkeeping of the active tiling layout, when that
    /// layout lets its per-workspace nodes be renumbered.
    ///
    /// `None` makes [`swap_active_workspaces`](crate::splitter::Splitter)
    /// fall back to moving windows one by one.
    fn layout(&self) -> Option<&dyn LayoutBookkeeping> {
        None
    }

    //  Mutations

    /// Create workspace `id` attached to `monitor`.
    fn create_workspace(&self, id: WorkspaceId, monitor: &MonitorInfo) -> Result<(), Self::Error>;

    /// Relocate workspace `id` (and its windows) to `monitor`.
    fn move_workspace_to_monitor(
        &self,
        id: WorkspaceId,
        monitor: &MonitorInfo,
    ) -> Result<(), Self::Error>;

    /// Make `id` the active workspace of `monitor` silently: no focus
    /// change, no animation, no history entry.
    fn set_active_workspace(&self, monitor: &MonitorInfo, id: WorkspaceId)
        -> Result<(), Self::Error>;

    /// Focus a workspace using the compositor's own `workspace` dispatcher.
    ///
    /// `reference` is either a global id or a reference hyprsplit does not
    /// understand, which the compositor parses itself.  A numeric id that
    /// does not exist yet is created on the focused monitor.
    fn focus_workspace(&self, reference: &str) -> Result<(), Self::Error>;

    /// Run the compositor's `movetoworkspace` (or `movetoworkspacesilent`)
    /// dispatcher with already-remapped `args`.
    fn move_to_workspace(&self, args: &str, silent: bool) -> Result<(), Self::Error>;

    /// Move window `address` to workspace `id` without following it.
    fn move_window_to_workspace_silent(
        &self,
        address: &str,
        id: WorkspaceId,
    ) -> Result<(), Self::Error>;

    /// Change which monitor owns workspace `id` without touching its
    /// windows.
    fn assign_workspace_monitor(&self, id: WorkspaceId, monitor: MonitorId)
        -> Result<(), Self::Error>;

    /// Exchange the ids and names of two workspaces.  Windows stay with
    /// their workspace object, so they end up under the other id.
    fn swap_workspace_ids(&self, a: WorkspaceId, b: WorkspaceId) -> Result<(), Self::Error>;

    /// Place window `address` at `at` with `size`.
    fn set_window_geometry(
        &self,
        address: &str,
        at: (i32, i32),
        size: (i32, i32),
    ) -> Result<(), Self::Error>;

    /// Recompute window geometry on `monitor`.
    fn recalculate_monitor(&self, monitor: &MonitorInfo) -> Result<(), Self::Error>;

    /// Re-dispatch focus to whatever should have it now.
    fn refocus(&self) -> Result<(), Self::Error>;

    /// Publish the hyprsplit-owned persistent workspace rules, replacing
    /// the previously published set.
    fn sync_persistent_rules(&self, rules: &[PersistentWorkspaceRule]) -> Result<(), Self::Error>;
}

/// Per-layout bookkeeping that tracks which nodes belong to which
/// workspace id.
///
/// Layouts that implement this can have two workspaces swapped in place;
/// everything else gets its windows moved individually.
pub trait LayoutBookkeeping {
    /// Layout name, e.g. `"dwindle"`.
    fn name(&self) -> &str;

    /// Renumber the layout's nodes so those of `a` belong to `b` and vice
    /// versa.
    fn swap_workspace_nodes(&self, a: WorkspaceId, b: WorkspaceId);
}

//  Command Source

/// A source of [`Request`]s.
///
/// Implementations listen on some transport (a Unix socket, Hyprland's
/// IPC event stream, an in-memory channel) and forward parsed commands
/// into the provided [`mpsc::Sender`].
///
/// # Contract
///
/// * [`run`](CommandSource::run) **blocks** until the source is exhausted or
///   an unrecoverable error occurs.
/// * Each received command must be sent through `sink` exactly once.
/// * Implementations must be [`Send`] so they can run on a dedicated thread.
pub trait CommandSource: Send {
    /// The error type produced by this source.
    type Error: std::error::Error + Send + 'static;

    /// Start listening and forward every incoming request into `sink`.
    ///
    /// This method blocks the calling thread.  To run multiple sources
    /// concurrently, spawn each one on its own thread.
    fn run(&mut self, sink: mpsc::Sender<Request>) -> Result<(), Self::Error>;
}
