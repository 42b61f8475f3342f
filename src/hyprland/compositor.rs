//! [`Compositor`] implementation backed by Hyprland IPC.
//!
//! Communicates directly with Hyprland through its Unix socket at
//! `$XDG_RUNTIME_DIR/hypr/$HYPRLAND_INSTANCE_SIGNATURE/.socket.sock`.
//! Queries use the JSON (`j/`) flavour of the commands, mutations are
//! plain dispatches, batched where Hyprland would otherwise act on the
//! wrong monitor in between.

use super::{instance_dir, HyprlandError};
use crate::command::{
    deserialize_flag, MonitorId, MonitorInfo, WindowInfo, WorkspaceId, WorkspaceInfo,
};
use crate::persistence::PersistentWorkspaceRule;
use crate::traits::Compositor;
use log::{debug, warn};
use serde::Deserialize;
use std::cell::RefCell;
use std::io::{Read, Write};
use std::os::unix::net::UnixStream;

/// Hyprland-backed compositor.
///
/// No connection is held open; each call opens a short-lived IPC request.
/// The only state is the set of persistent workspace rules last published,
/// so rules that are dropped can be switched off again.
#[derive(Debug, Default)]
pub struct HyprlandCompositor {
    published: RefCell<Vec<PersistentWorkspaceRule>>,
}

impl HyprlandCompositor {
    pub fn new() -> Self {
        Self::default()
    }

    /// The running Hyprland version tag, e.g. `"v0.45.2"`.
    pub fn version(&self) -> Result<String, HyprlandError> {
        let json = ipc_json("version")?;
        let v: VersionJson = parse(&json)?;
        Ok(v.tag)
    }

    /// Show an error notification on screen.
    pub fn notify_error(&self, message: &str) -> Result<(), HyprlandError> {
        expect_ok(ipc_request(&format!("/notify 3 10000 0 hyprsplit: {}", message))?)
    }

    /// Focus `monitor`, run `commands` there, then return focus to whatever
    /// monitor had it before.
    fn on_monitor(&self, monitor: &MonitorInfo, commands: &[String]) -> Result<(), HyprlandError> {
        let focused = self.active_monitor()?;
        let mut batch = Vec::with_capacity(commands.len() + 2);
        batch.push(format!("dispatch focusmonitor {}", monitor.name));
        batch.extend(commands.iter().cloned());
        if let Some(f) = focused.filter(|f| f.name != monitor.name) {
            batch.push(format!("dispatch focusmonitor {}", f.name));
        }
        ipc_batch(&batch)
    }
}

//  Direct Hyprland IPC helpers

/// Send a raw command to the Hyprland command socket and return the
/// response as a string.
fn ipc_request(command: &str) -> Result<String, HyprlandError> {
    let path = instance_dir()?.join(".socket.sock");
    let mut stream = UnixStream::connect(&path)
        .map_err(|e| HyprlandError(format!("connect to {}: {}", path.display(), e)))?;

    stream
        .write_all(command.as_bytes())
        .map_err(|e| HyprlandError(format!("write: {}", e)))?;

    let mut response = Vec::new();
    stream
        .read_to_end(&mut response)
        .map_err(|e| HyprlandError(format!("read: {}", e)))?;

    String::from_utf8(response).map_err(|e| HyprlandError(format!("utf-8: {}", e)))
}

/// Send a JSON data query (`j/<command>`) and return the raw JSON string.
fn ipc_json(data_command: &str) -> Result<String, HyprlandError> {
    ipc_request(&format!("j/{}", data_command))
}

/// Send a dispatch command and check for `"ok"`.
fn ipc_dispatch(args: &str) -> Result<(), HyprlandError> {
    debug!("dispatch {}", args);
    expect_ok(ipc_request(&format!("/dispatch {}", args))?)
}

/// Run several commands in one request.  Each answers `"ok"` on success.
fn ipc_batch(commands: &[String]) -> Result<(), HyprlandError> {
    debug!("batch {:?}", commands);
    expect_ok(ipc_request(&format!("[[BATCH]]{}", commands.join(";")))?)
}

fn expect_ok(response: String) -> Result<(), HyprlandError> {
    if batch_ok(&response) {
        Ok(())
    } else {
        Err(HyprlandError(format!("command failed: {}", response.trim())))
    }
}

/// Whether every reply in a (possibly batched) response is `ok`.
fn batch_ok(response: &str) -> bool {
    let mut replies = response.split_whitespace().peekable();
    replies.peek().is_some() && replies.all(|r| r == "ok")
}

fn parse<'a, T: Deserialize<'a>>(json: &'a str) -> Result<T, HyprlandError> {
    serde_json::from_str(json).map_err(|e| HyprlandError(format!("parse: {}", e)))
}

//  Minimal serde structs for the JSON we care about

#[derive(Deserialize)]
struct WorkspaceRefJson {
    id: WorkspaceId,
}

/// Subset of the JSON object returned by `j/monitors`.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct MonitorJson {
    id: MonitorId,
    name: String,
    width: i32,
    height: i32,
    x: i32,
    y: i32,
    active_workspace: Option<WorkspaceRefJson>,
    #[serde(default)]
    focused: bool,
    #[serde(default)]
    mirror_of: Option<String>,
}

/// Subset of the JSON object returned by `j/workspaces`.
#[derive(Deserialize)]
struct WorkspaceJson {
    id: WorkspaceId,
    name: String,
    #[serde(rename = "monitorID")]
    monitor_id: Option<MonitorId>,
    windows: u32,
}

/// Subset of the JSON object returned by `j/clients`.
#[derive(Deserialize)]
struct ClientJson {
    address: String,
    #[serde(default)]
    title: String,
    #[serde(default = "mapped_default")]
    mapped: bool,
    #[serde(default)]
    pinned: bool,
    #[serde(default)]
    floating: bool,
    #[serde(default, deserialize_with = "deserialize_flag")]
    fullscreen: bool,
    at: (i32, i32),
    size: (i32, i32),
    workspace: WorkspaceRefJson,
}

fn mapped_default() -> bool {
    true
}

#[derive(Deserialize)]
struct ActiveWindowJson {
    address: String,
}

#[derive(Deserialize)]
struct VersionJson {
    tag: String,
}

pub(crate) fn parse_monitors(json: &str) -> Result<Vec<MonitorInfo>, HyprlandError> {
    let monitors: Vec<MonitorJson> = parse(json)?;
    Ok(monitors
        .into_iter()
        .map(|m| MonitorInfo {
            id: m.id,
            name: m.name,
            // Hyprland reports -1 while a monitor shows nothing.
            active_workspace: m.active_workspace.map(|w| w.id).filter(|&id| id > 0),
            focused: m.focused,
            mirror: m.mirror_of.is_some_and(|s| s != "none"),
            x: m.x,
            y: m.y,
            width: m.width,
            height: m.height,
        })
        .collect())
}

pub(crate) fn parse_workspaces(json: &str) -> Result<Vec<WorkspaceInfo>, HyprlandError> {
    let workspaces: Vec<WorkspaceJson> = parse(json)?;
    Ok(workspaces
        .into_iter()
        .map(|w| WorkspaceInfo {
            is_special: w.id < 0 || w.name.starts_with("special"),
            id: w.id,
            name: w.name,
            monitor: w.monitor_id.unwrap_or(-1),
            windows: w.windows,
            // Not exposed over IPC.
            previous: None,
        })
        .collect())
}

pub(crate) fn parse_clients(json: &str) -> Result<Vec<WindowInfo>, HyprlandError> {
    let clients: Vec<ClientJson> = parse(json)?;
    Ok(clients
        .into_iter()
        .map(|c| WindowInfo {
            address: c.address,
            title: c.title,
            workspace: c.workspace.id,
            mapped: c.mapped,
            pinned: c.pinned,
            floating: c.floating,
            fullscreen: c.fullscreen,
            at: c.at,
            size: c.size,
        })
        .collect())
}

/// Keyword commands turning `published` into `rules`: dropped ids lose
/// persistence, new or retargeted ones are bound to their monitor.
fn rule_keywords(
    published: &[PersistentWorkspaceRule],
    rules: &[PersistentWorkspaceRule],
) -> Vec<String> {
    let released = published
        .iter()
        .filter(|old| !rules.iter().any(|r| r.id == old.id))
        .map(|old| format!("keyword workspace {}, persistent:false", old.id));
    let claimed = rules
        .iter()
        .filter(|r| !published.contains(r))
        .map(|r| format!("keyword workspace {}, monitor:{}, persistent:true", r.id, r.monitor));
    released.chain(claimed).collect()
}

//  Compositor implementation

impl Compositor for HyprlandCompositor {
    type Error = HyprlandError;

    fn monitors(&self) -> Result<Vec<MonitorInfo>, Self::Error> {
        parse_monitors(&ipc_json("monitors")?)
    }

    fn workspaces(&self) -> Result<Vec<WorkspaceInfo>, Self::Error> {
        parse_workspaces(&ipc_json("workspaces")?)
    }

    fn windows(&self) -> Result<Vec<WindowInfo>, Self::Error> {
        parse_clients(&ipc_json("clients")?)
    }

    fn create_workspace(&self, id: WorkspaceId, monitor: &MonitorInfo) -> Result<(), Self::Error> {
        // Hyprland creates workspaces by showing them, so show it and go
        // back to what the monitor displayed before.
        let mut commands = vec![format!("dispatch focusworkspaceoncurrentmonitor {}", id)];
        if let Some(prev) = monitor.active_workspace.filter(|&prev| prev != id) {
            commands.push(format!("dispatch focusworkspaceoncurrentmonitor {}", prev));
        }
        self.on_monitor(monitor, &commands)
    }

    fn move_workspace_to_monitor(
        &self,
        id: WorkspaceId,
        monitor: &MonitorInfo,
    ) -> Result<(), Self::Error> {
        ipc_dispatch(&format!("moveworkspacetomonitor {} {}", id, monitor.name))
    }

    fn set_active_workspace(&self, monitor: &MonitorInfo, id: WorkspaceId) -> Result<(), Self::Error> {
        self.on_monitor(
            monitor,
            &[format!("dispatch focusworkspaceoncurrentmonitor {}", id)],
        )
    }

    fn focus_workspace(&self, reference: &str) -> Result<(), Self::Error> {
        ipc_dispatch(&format!("workspace {}", reference))
    }

    fn move_to_workspace(&self, args: &str, silent: bool) -> Result<(), Self::Error> {
        let dispatcher = if silent {
            "movetoworkspacesilent"
        } else {
            "movetoworkspace"
        };
        ipc_dispatch(&format!("{} {}", dispatcher, args))
    }

    fn move_window_to_workspace_silent(
        &self,
        address: &str,
        id: WorkspaceId,
    ) -> Result<(), Self::Error> {
        ipc_dispatch(&format!("movetoworkspacesilent {},address:{}", id, address))
    }

    fn assign_workspace_monitor(
        &self,
        id: WorkspaceId,
        monitor: MonitorId,
    ) -> Result<(), Self::Error> {
        ipc_dispatch(&format!("moveworkspacetomonitor {} {}", id, monitor))
    }

    fn swap_workspace_ids(&self, _a: WorkspaceId, _b: WorkspaceId) -> Result<(), Self::Error> {
        Err(HyprlandError(
            "workspaces cannot be renumbered over IPC".into(),
        ))
    }

    fn set_window_geometry(
        &self,
        address: &str,
        at: (i32, i32),
        size: (i32, i32),
    ) -> Result<(), Self::Error> {
        ipc_batch(&[
            format!("dispatch movewindowpixel exact {} {},address:{}", at.0, at.1, address),
            format!("dispatch resizewindowpixel exact {} {},address:{}", size.0, size.1, address),
        ])
    }

    fn recalculate_monitor(&self, monitor: &MonitorInfo) -> Result<(), Self::Error> {
        // Hyprland re-lays out a monitor after every window move on its own.
        debug!("no explicit recalculation needed for {}", monitor.name);
        Ok(())
    }

    fn refocus(&self) -> Result<(), Self::Error> {
        let json = ipc_json("activewindow")?;
        // Hyprland returns an empty object `{}` when no window is focused.
        if json.trim() == "{}" {
            return Ok(());
        }
        let w: ActiveWindowJson = parse(&json)?;
        ipc_dispatch(&format!("focuswindow address:{}", w.address))
    }

    fn sync_persistent_rules(&self, rules: &[PersistentWorkspaceRule]) -> Result<(), Self::Error> {
        let commands = rule_keywords(&self.published.borrow(), rules);
        if commands.is_empty() {
            return Ok(());
        }
        debug!("publishing {} workspace rule changes", commands.len());
        if let Err(e) = ipc_batch(&commands) {
            warn!("workspace rules only partially applied");
            return Err(e);
        }
        *self.published.borrow_mut() = rules.to_vec();
        Ok(())
    }
}
