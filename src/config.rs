//! Application configuration.
//!
//! The configuration is loaded from `$XDG_CONFIG_HOME/hyprsplit/config.json`
//! and re-read whenever Hyprland reloads its own configuration.  Every key
//! is optional.
//!
//! # Example
//!
//! ```json
//! {
//!   "num_workspaces": 10,
//!   "persistent_workspaces": 1,
//!   "socket_path": "/run/user/1000/hyprsplit.sock"
//! }
//! ```

use crate::command::deserialize_flag;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Upper bound for `num_workspaces`, keeping global ids well inside `i32`.
pub const MAX_NUM_WORKSPACES: u32 = 65_535;

/// Top-level configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Workspace slots reserved per monitor.  Default: `10`.
    pub num_workspaces: u32,

    /// Keep every workspace of every monitor's range alive through
    /// persistent workspace rules.  Accepts `true`/`false` or `1`/`0`.
    /// Default: `false`.
    #[serde(deserialize_with = "deserialize_flag")]
    pub persistent_workspaces: bool,

    /// Command socket path.  Default: `$XDG_RUNTIME_DIR/hyprsplit.sock`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub socket_path: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            num_workspaces: 10,
            persistent_workspaces: false,
            socket_path: None,
        }
    }
}

impl Config {
    /// Load configuration from a JSON file at `path`.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| ConfigError(format!("failed to read {}: {}", path.display(), e)))?;
        let config: Self = serde_json::from_str(&contents)
            .map_err(|e| ConfigError(format!("failed to parse {}: {}", path.display(), e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Reject values the range arithmetic cannot work with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(1..=MAX_NUM_WORKSPACES).contains(&self.num_workspaces) {
            return Err(ConfigError(format!(
                "num_workspaces must be between 1 and {}, got {}",
                MAX_NUM_WORKSPACES, self.num_workspaces
            )));
        }
        Ok(())
    }

    /// `num_workspaces` as used in id arithmetic.
    pub fn workspaces_per_monitor(&self) -> i32 {
        self.num_workspaces.clamp(1, MAX_NUM_WORKSPACES) as i32
    }
}

/// Error from loading or parsing a configuration file.
#[derive(Debug, thiserror::Error)]
#[error("config error: {0}")]
pub struct ConfigError(String);
