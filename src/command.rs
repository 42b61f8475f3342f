//! Commands and types used throughout hyprsplit.
//!
//! This module defines the vocabulary that all components share:
//! [`Command`] describes every dispatcher and lifecycle event the
//! [`Splitter`](crate::splitter::Splitter) reacts to, [`Request`] /
//! [`Reply`] carry a command and its outcome across threads, and
//! [`MonitorInfo`] / [`WorkspaceInfo`] / [`WindowInfo`] are the snapshots
//! the compositor hands out.
//!
//! Dispatcher arguments are forwarded raw; the splitter parses workspace
//! references and monitor selectors itself.

use serde::{Deserialize, Deserializer, Serialize};
use std::sync::mpsc;

/// Global workspace id as the compositor numbers it.
pub type WorkspaceId = i32;

/// Compositor monitor id.  Negative values mark an invalid monitor.
pub type MonitorId = i32;

/// Every action the splitter can perform.
///
/// The dispatcher variants keep the external `split:*` names on the wire,
/// so a JSON line such as `{"split:workspace":"3"}` decodes into
/// [`Command::Workspace`].  Lifecycle variants are produced by the
/// compositor event source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Command {
    /// Focus a workspace on the focused monitor.
    #[serde(rename = "split:workspace")]
    Workspace(String),

    /// Move the focused (or selected) window to a workspace and follow it.
    ///
    /// The argument is `<reference>[,<window selector>]`; only the
    /// reference part is remapped.
    #[serde(rename = "split:movetoworkspace")]
    MoveToWorkspace(String),

    /// Like [`MoveToWorkspace`](Command::MoveToWorkspace) but focus stays.
    #[serde(rename = "split:movetoworkspacesilent")]
    MoveToWorkspaceSilent(String),

    /// Exchange the active workspaces of two monitors, `"<mon> <mon>"`.
    #[serde(rename = "split:swapactiveworkspaces")]
    SwapActiveWorkspaces(String),

    /// Pull windows sitting outside every monitor's range onto the focused
    /// monitor.  The argument is ignored.
    #[serde(rename = "split:grabroguewindows")]
    GrabRogueWindows(String),

    /// Resolve a workspace reference without side effects.  The reply
    /// carries the resolved string.
    #[serde(rename = "split:resolve")]
    Resolve(String),

    //  Compositor lifecycle events
    //
    //  Only the compositor event source builds these; the command socket
    //  refuses them.

    /// A monitor was connected.
    #[serde(skip_deserializing)]
    MonitorAdded { name: String },

    /// A monitor was disconnected.
    #[serde(skip_deserializing)]
    MonitorRemoved { name: String },

    /// The compositor reloaded its configuration.
    #[serde(skip_deserializing)]
    ConfigReloaded,

    /// Some monitor switched to workspace `id`.
    #[serde(skip_deserializing)]
    WorkspaceChanged { id: WorkspaceId },

    /// Workspace `id` was destroyed.
    #[serde(skip_deserializing)]
    WorkspaceDestroyed { id: WorkspaceId },

    /// The daemon is shutting down.
    #[serde(skip_deserializing)]
    Shutdown,
}

impl Command {
    /// The dispatcher name as it appears on the wire, or the event name
    /// for lifecycle variants.
    pub fn name(&self) -> &'static str {
        match self {
            Command::Workspace(_) => "split:workspace",
            Command::MoveToWorkspace(_) => "split:movetoworkspace",
            Command::MoveToWorkspaceSilent(_) => "split:movetoworkspacesilent",
            Command::SwapActiveWorkspaces(_) => "split:swapactiveworkspaces",
            Command::GrabRogueWindows(_) => "split:grabroguewindows",
            Command::Resolve(_) => "split:resolve",
            Command::MonitorAdded { .. } => "monitoradded",
            Command::MonitorRemoved { .. } => "monitorremoved",
            Command::ConfigReloaded => "configreloaded",
            Command::WorkspaceChanged { .. } => "workspace",
            Command::WorkspaceDestroyed { .. } => "destroyworkspace",
            Command::Shutdown => "shutdown",
        }
    }

    /// Build a dispatcher command from its wire name and argument.
    ///
    /// Returns `None` for names that are not `split:*` dispatchers.
    pub fn from_dispatcher(name: &str, arg: impl Into<String>) -> Option<Self> {
        let arg = arg.into();
        Some(match name {
            "split:workspace" => Command::Workspace(arg),
            "split:movetoworkspace" => Command::MoveToWorkspace(arg),
            "split:movetoworkspacesilent" => Command::MoveToWorkspaceSilent(arg),
            "split:swapactiveworkspaces" => Command::SwapActiveWorkspaces(arg),
            "split:grabroguewindows" => Command::GrabRogueWindows(arg),
            "split:resolve" => Command::Resolve(arg),
            _ => return None,
        })
    }
}

/// A [`Command`] plus an optional channel for its [`Reply`].
///
/// Event sources that do not care about the outcome leave `reply` empty.
#[derive(Debug)]
pub struct Request {
    pub command: Command,
    pub reply: Option<mpsc::Sender<Reply>>,
}

impl Request {
    /// A fire-and-forget request.
    pub fn new(command: Command) -> Self {
        Self {
            command,
            reply: None,
        }
    }

    /// A request whose outcome is sent back through `reply`.
    pub fn with_reply(command: Command, reply: mpsc::Sender<Reply>) -> Self {
        Self {
            command,
            reply: Some(reply),
        }
    }
}

impl From<Command> for Request {
    fn from(command: Command) -> Self {
        Self::new(command)
    }
}

/// Structured outcome of a dispatcher.
///
/// On the wire: `{"ok":true,"result":"13"}` or
/// `{"ok":false,"error":"no focused monitor"}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reply {
    pub ok: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl Reply {
    pub fn success(result: Option<String>) -> Self {
        Self {
            ok: true,
            result,
            error: None,
        }
    }

    pub fn failure(error: impl Into<String>) -> Self {
        Self {
            ok: false,
            result: None,
            error: Some(error.into()),
        }
    }
}

impl<E: std::fmt::Display> From<Result<Option<String>, E>> for Reply {
    fn from(r: Result<Option<String>, E>) -> Self {
        match r {
            Ok(result) => Reply::success(result),
            Err(e) => Reply::failure(e.to_string()),
        }
    }
}

/// Snapshot of a monitor as the compositor reports it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MonitorInfo {
    /// Compositor id; negative for an invalid monitor.
    pub id: MonitorId,
    /// Connector name (e.g. `"DP-1"`).
    pub name: String,
    /// Id of the workspace currently shown, if any.
    pub active_workspace: Option<WorkspaceId>,
    /// Whether this monitor has input focus.
    pub focused: bool,
    /// Whether this monitor mirrors another one.
    pub mirror: bool,
    /// X position on the virtual desktop (pixels).
    pub x: i32,
    /// Y position on the virtual desktop (pixels).
    pub y: i32,
    /// Horizontal resolution in pixels.
    pub width: i32,
    /// Vertical resolution in pixels.
    pub height: i32,
}

impl MonitorInfo {
    /// Monitors with an invalid id and mirrors do not own workspaces.
    pub fn owns_workspaces(&self) -> bool {
        self.id >= 0 && !self.mirror
    }

    /// Whether `selector` names this monitor, either by connector name or
    /// by numeric id.
    pub fn matches(&self, selector: &str) -> bool {
        self.name == selector || selector.parse::<MonitorId>().ok() == Some(self.id)
    }
}

/// Snapshot of a workspace.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkspaceInfo {
    pub id: WorkspaceId,
    pub name: String,
    /// Id of the owning monitor.
    pub monitor: MonitorId,
    /// Number of windows on the workspace.
    pub windows: u32,
    /// Special (scratchpad) workspaces never take part in ranges.
    pub is_special: bool,
    /// The workspace its monitor showed before this one, when the
    /// compositor tracks it.
    pub previous: Option<WorkspaceId>,
}

/// Snapshot of a client window.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WindowInfo {
    /// Compositor address, e.g. `"0x55d1c3a0"`.
    pub address: String,
    pub title: String,
    /// Id of the workspace the window lives on.
    pub workspace: WorkspaceId,
    pub mapped: bool,
    pub pinned: bool,
    pub floating: bool,
    pub fullscreen: bool,
    /// Top-left corner in global coordinates.
    pub at: (i32, i32),
    pub size: (i32, i32),
}

/// Accept either a JSON bool or an integer (`0` / non-zero) as a flag.
///
/// Compositor-style config files spell booleans as `0`/`1`.
pub(crate) fn deserialize_flag<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    use serde::de::{Error as DeError, Visitor};
    use std::fmt;

    struct V;
    impl<'de> Visitor<'de> for V {
        type Value = bool;
        fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            write!(f, "boolean or 0/1")
        }
        fn visit_bool<E>(self, b: bool) -> Result<bool, E> {
            Ok(b)
        }
        fn visit_u64<E>(self, n: u64) -> Result<bool, E> {
            Ok(n != 0)
        }
        fn visit_i64<E>(self, n: i64) -> Result<bool, E> {
            Ok(n != 0)
        }
        fn visit_str<E>(self, s: &str) -> Result<bool, E>
        where
            E: DeError,
        {
            match s.trim() {
                "1" | "true" | "yes" | "on" => Ok(true),
                "0" | "false" | "no" | "off" => Ok(false),
                other => Err(DeError::custom(format!("invalid flag: {:?}", other))),
            }
        }
    }
    deserializer.deserialize_any(V)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dispatcher_names_on_the_wire() {
        let cmd: Command = serde_json::from_str(r#"{"split:workspace":"3"}"#).unwrap();
        assert_eq!(cmd, Command::Workspace("3".into()));

        let cmd: Command =
            serde_json::from_str(r#"{"split:movetoworkspacesilent":"+1,class:kitty"}"#).unwrap();
        assert_eq!(cmd, Command::MoveToWorkspaceSilent("+1,class:kitty".into()));

        let json = serde_json::to_string(&Command::SwapActiveWorkspaces("DP-1 DP-2".into())).unwrap();
        assert_eq!(json, r#"{"split:swapactiveworkspaces":"DP-1 DP-2"}"#);
    }

    #[test]
    fn lifecycle_events_only_encode() {
        for json in [
            r#""ConfigReloaded""#,
            r#""Shutdown""#,
            r#"{"MonitorAdded":{"name":"HDMI-A-1"}}"#,
            r#"{"WorkspaceChanged":{"id":3}}"#,
        ] {
            assert!(serde_json::from_str::<Command>(json).is_err(), "{json}");
        }
        let json = serde_json::to_string(&Command::MonitorAdded { name: "HDMI-A-1".into() }).unwrap();
        assert_eq!(json, r#"{"MonitorAdded":{"name":"HDMI-A-1"}}"#);
    }

    #[test]
    fn unknown_dispatcher_is_rejected() {
        assert!(serde_json::from_str::<Command>(r#"{"split:nope":"1"}"#).is_err());
        assert_eq!(Command::from_dispatcher("workspace", "1"), None);
    }

    #[test]
    fn from_dispatcher_matches_name() {
        for name in [
            "split:workspace",
            "split:movetoworkspace",
            "split:movetoworkspacesilent",
            "split:swapactiveworkspaces",
            "split:grabroguewindows",
            "split:resolve",
        ] {
            let cmd = Command::from_dispatcher(name, "x").unwrap();
            assert_eq!(cmd.name(), name);
        }
    }

    #[test]
    fn reply_wire_format() {
        let ok = serde_json::to_string(&Reply::success(Some("13".into()))).unwrap();
        assert_eq!(ok, r#"{"ok":true,"result":"13"}"#);
        let err = serde_json::to_string(&Reply::failure("no focused monitor")).unwrap();
        assert_eq!(err, r#"{"ok":false,"error":"no focused monitor"}"#);
    }

    #[test]
    fn monitor_selector_matches_name_or_id() {
        let m = MonitorInfo {
            id: 1,
            name: "DP-2".into(),
            active_workspace: Some(11),
            focused: false,
            mirror: false,
            x: 1920,
            y: 0,
            width: 1920,
            height: 1080,
        };
        assert!(m.matches("DP-2"));
        assert!(m.matches("1"));
        assert!(!m.matches("0"));
        assert!(!m.matches("DP-1"));
    }

    #[test]
    fn invalid_and_mirrored_monitors_own_nothing() {
        let mut m = MonitorInfo {
            id: 0,
            name: "DP-1".into(),
            active_workspace: Some(1),
            focused: true,
            mirror: false,
            x: 0,
            y: 0,
            width: 1920,
            height: 1080,
        };
        assert!(m.owns_workspaces());
        m.mirror = true;
        assert!(!m.owns_workspaces());
        m.mirror = false;
        m.id = -1;
        assert!(!m.owns_workspaces());
    }

    #[derive(Deserialize)]
    struct Flagged {
        #[serde(deserialize_with = "deserialize_flag")]
        flag: bool,
    }

    #[test]
    fn flag_accepts_bool_and_int() {
        assert!(serde_json::from_str::<Flagged>(r#"{"flag":1}"#).unwrap().flag);
        assert!(!serde_json::from_str::<Flagged>(r#"{"flag":0}"#).unwrap().flag);
        assert!(serde_json::from_str::<Flagged>(r#"{"flag":true}"#).unwrap().flag);
        assert!(serde_json::from_str::<Flagged>(r#"{"flag":"2"}"#).is_err());
    }
}
