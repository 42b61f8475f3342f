//! Translates Hyprland's event stream into lifecycle [`Command`]s.
//!
//! Hyprland broadcasts events on its second socket (`socket2`) at
//! `$XDG_RUNTIME_DIR/hypr/$HYPRLAND_INSTANCE_SIGNATURE/.socket2.sock`, one
//! per line in the `EVENT>>DATA` format.  Only a handful matter here:
//!
//! | Event                | Payload          | Command                           |
//! |----------------------|------------------|-----------------------------------|
//! | `monitoraddedv2`     | `<id>,<name>,<description>` | [`Command::MonitorAdded`]   |
//! | `monitorremovedv2`   | `<id>,<name>,<description>` | [`Command::MonitorRemoved`] |
//! | `configreloaded`     |                  | [`Command::ConfigReloaded`]       |
//! | `workspacev2`        | `<id>,<name>`    | [`Command::WorkspaceChanged`]     |
//! | `destroyworkspacev2` | `<id>,<name>`    | [`Command::WorkspaceDestroyed`]   |
//!
//! The older events without the `v2` suffix carry the same information in
//! less detail and are sent alongside, so they are ignored.

use super::{instance_dir, HyprlandError};
use crate::command::{Command, Request, WorkspaceId};
use crate::traits::CommandSource;
use log::{debug, error, info, warn};
use std::io::{BufRead, BufReader};
use std::os::unix::net::UnixStream;
use std::sync::mpsc;

/// A [`CommandSource`] that follows Hyprland's event socket.
#[derive(Debug, Default)]
pub struct HyprlandEventSource;

impl HyprlandEventSource {
    pub fn new() -> Self {
        Self
    }
}

/// Parse a single event line from socket2.
///
/// Lines have the form `EVENT>>DATA`.
fn parse_event_line(line: &str) -> Option<(&str, &str)> {
    line.split_once(">>")
}

/// The second comma-separated field of a `v2` monitor payload.
fn monitor_name(data: &str) -> Option<&str> {
    data.splitn(3, ',').nth(1).filter(|name| !name.is_empty())
}

/// The leading id of a `v2` workspace payload.
fn workspace_id(data: &str) -> Option<WorkspaceId> {
    data.split(',').next()?.trim().parse().ok()
}

/// Map an event to the command it triggers, if any.
pub(crate) fn parse_event(event: &str, data: &str) -> Option<Command> {
    match event {
        "monitoraddedv2" => Some(Command::MonitorAdded {
            name: monitor_name(data)?.to_string(),
        }),
        "monitorremovedv2" => Some(Command::MonitorRemoved {
            name: monitor_name(data)?.to_string(),
        }),
        "configreloaded" => Some(Command::ConfigReloaded),
        "workspacev2" => Some(Command::WorkspaceChanged {
            id: workspace_id(data)?,
        }),
        "destroyworkspacev2" => Some(Command::WorkspaceDestroyed {
            id: workspace_id(data)?,
        }),
        _ => None,
    }
}

impl CommandSource for HyprlandEventSource {
    type Error = HyprlandError;

    /// Connect to Hyprland's event socket and forward lifecycle events.
    ///
    /// Blocks until the socket is closed or a read fails.  Run it on a
    /// dedicated thread.
    fn run(&mut self, sink: mpsc::Sender<Request>) -> Result<(), Self::Error> {
        let path = instance_dir()?.join(".socket2.sock");
        let stream = UnixStream::connect(&path)
            .map_err(|e| HyprlandError(format!("connect to {}: {}", path.display(), e)))?;
        info!("event source connected to {}", path.display());

        for line in BufReader::new(stream).lines() {
            let line = match line {
                Ok(line) => line,
                Err(e) => {
                    error!("socket2 read error: {}", e);
                    return Err(HyprlandError(format!("read error: {}", e)));
                }
            };
            let Some((event, data)) = parse_event_line(&line) else {
                continue;
            };
            if let Some(cmd) = parse_event(event, data) {
                debug!("event {} -> {:?}", event, cmd);
                if sink.send(cmd.into()).is_err() {
                    // Receiver gone: the daemon is shutting down.
                    return Ok(());
                }
            }
        }

        warn!("socket2 stream ended");
        Ok(())
    }
}

//  Tests
