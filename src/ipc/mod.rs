//! Command socket for `split:*` dispatchers.
//!
//! Key bindings (through `hyprsplit ctl`) or scripts connect to the socket
//! and send newline-delimited JSON commands; every line is answered with a
//! JSON [`Reply`](crate::command::Reply) line.

pub mod client;
pub mod listener;

pub use client::send;
pub use listener::UnixSocketListener;

/// Errors produced on either end of the command socket.
#[derive(Debug, thiserror::Error)]
pub enum IpcError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("json parse error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("no reply from daemon")]
    NoReply,
}
