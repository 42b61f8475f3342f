//! Hyprland-specific implementations.
//!
//! This module provides concrete backends for the
//! [`Compositor`](crate::traits::Compositor) and
//! [`CommandSource`](crate::traits::CommandSource) traits, powered by
//! Hyprland's IPC sockets.
//!
//! Nothing outside this module should reference Hyprland directly.

pub mod compositor;
pub mod events;

pub use compositor::HyprlandCompositor;
pub use events::HyprlandEventSource;

use std::path::PathBuf;

/// Errors that can occur when talking to Hyprland.
#[derive(Debug, thiserror::Error)]
#[error("hyprland IPC error: {0}")]
pub struct HyprlandError(pub(crate) String);

/// Directory holding the sockets of the running Hyprland instance.
///
/// Hyprland ≥ 0.40 keeps them under
/// `$XDG_RUNTIME_DIR/hypr/$HYPRLAND_INSTANCE_SIGNATURE/`.
pub(crate) fn instance_dir() -> Result<PathBuf, HyprlandError> {
    let runtime_dir = std::env::var("XDG_RUNTIME_DIR")
        .map_err(|_| HyprlandError("XDG_RUNTIME_DIR not set".into()))?;
    let his = std::env::var("HYPRLAND_INSTANCE_SIGNATURE")
        .map_err(|_| HyprlandError("HYPRLAND_INSTANCE_SIGNATURE not set".into()))?;
    Ok(PathBuf::from(runtime_dir).join("hypr").join(his))
}
