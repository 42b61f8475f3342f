//! Unix-socket [`CommandSource`] implementation.
//!
//! Binds a Unix stream socket and accepts one connection at a time.
//! Each line received is parsed as a JSON-encoded [`Command`] and answered
//! with one JSON-encoded [`Reply`] line once the daemon has handled it.
//!
//! # Wire format
//!
//! ```json
//! → {"split:workspace":"3"}
//! ← {"ok":true,"result":"13"}
//! → {"split:swapactiveworkspaces":"DP-1"}
//! ← {"ok":false,"error":"invalid argument: expected \"<monitor> <monitor>\", got \"DP-1\""}
//! ```

use super::IpcError;
use crate::command::{Command, Reply, Request};
use crate::traits::CommandSource;
use log::{debug, error, info};
use std::io::{BufRead, BufReader, Write};
use std::os::unix::net::{UnixListener, UnixStream};
use std::path::{Path, PathBuf};
use std::sync::mpsc;

/// A [`CommandSource`] that listens on a Unix stream socket for
/// JSON-encoded commands.
///
/// Each accepted connection can send multiple newline-delimited commands.
/// When the connection closes, the listener waits for the next one.
pub struct UnixSocketListener {
    path: PathBuf,
}

impl UnixSocketListener {
    /// Create a new listener bound to `path`.
    ///
    /// The socket file is created when [`run`](CommandSource::run) is called.
    /// A stale socket left at `path` is replaced.
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }
}

/// Why a connection stopped being served.
enum Served {
    ClientGone,
    SinkClosed,
}

/// Hand `cmd` to the daemon and wait for the outcome.
fn dispatch(cmd: Command, sink: &mpsc::Sender<Request>) -> Option<Reply> {
    let (reply_tx, reply_rx) = mpsc::channel();
    sink.send(Request::with_reply(cmd, reply_tx)).ok()?;
    Some(
        reply_rx
            .recv()
            .unwrap_or_else(|_| Reply::failure("command dropped")),
    )
}

fn serve(stream: &UnixStream, sink: &mpsc::Sender<Request>) -> Result<Served, IpcError> {
    let mut writer = stream;
    for line in BufReader::new(stream).lines() {
        let text = line?;
        if text.trim().is_empty() {
            continue;
        }
        let reply = match serde_json::from_str::<Command>(&text) {
            Ok(cmd) => {
                debug!("received {:?}", cmd);
                match dispatch(cmd, sink) {
                    Some(reply) => reply,
                    None => return Ok(Served::SinkClosed),
                }
            }
            Err(e) => {
                error!("bad command: {}: {}", text, e);
                Reply::failure(format!("bad command: {}", e))
            }
        };
        let mut out = serde_json::to_string(&reply)?;
        out.push('\n');
        writer.write_all(out.as_bytes())?;
    }
    Ok(Served::ClientGone)
}

impl CommandSource for UnixSocketListener {
    type Error = IpcError;

    /// Bind the socket and start accepting connections.
    ///
    /// This method **blocks** until the receiving end of `sink` is dropped.
    /// Run it on a dedicated thread.
    fn run(&mut self, sink: mpsc::Sender<Request>) -> Result<(), Self::Error> {
        // Remove stale socket if present.
        let _ = std::fs::remove_file(&self.path);

        let listener = UnixListener::bind(&self.path)?;
        info!("listening on {}", self.path.display());

        for stream in listener.incoming() {
            let stream = match stream {
                Ok(stream) => stream,
                Err(e) => {
                    error!("accept error: {}", e);
                    continue;
                }
            };
            debug!("client connected");
            match serve(&stream, &sink) {
                Ok(Served::ClientGone) => debug!("client disconnected"),
                Ok(Served::SinkClosed) => {
                    info!("sink closed, shutting down");
                    break;
                }
                Err(e) => error!("client error: {}", e),
            }
        }
        let _ = std::fs::remove_file(&self.path);
        Ok(())
    }
}

//  Tests
