//! **hyprsplit**: per-monitor workspace ranges for Hyprland.
//!
//! Every monitor owns a contiguous slice of the workspace id space: with
//! `num_workspaces = 10`, monitor 0 owns 1–10, monitor 1 owns 11–20, and
//! so on.  Users keep addressing workspaces as `1`…`10` on whichever
//! monitor has focus; hyprsplit turns that into the global id and keeps
//! every workspace on the monitor that owns it.
//!
//! # Architecture
//!
//! The crate is organised around two core traits:
//!
//! * [`traits::Compositor`]: abstracts monitor, workspace and window
//!   queries and mutations so the range logic is not coupled to any
//!   specific compositor.
//! * [`traits::CommandSource`]: abstracts the transport that delivers
//!   requests (the command socket, the compositor's event stream) so the
//!   main loop is not coupled to any specific IPC mechanism.
//!
//! [`resolver`] maps workspace references to global ids, [`enforcer`]
//! repairs the range invariants and [`splitter`] drives both in response
//! to [`command::Command`]s.  Concrete implementations live in
//! [`hyprland`] (Hyprland IPC) and [`ipc`] (Unix-socket command listener).

pub mod command;
pub mod config;
pub mod enforcer;
pub mod history;
pub mod hyprland;
pub mod ipc;
pub mod persistence;
pub mod range;
pub mod resolver;
pub mod splitter;
pub mod traits;

#[cfg(test)]
mod mock;
