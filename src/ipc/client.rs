//! Client side of the command socket, used by `hyprsplit ctl`.

use super::IpcError;
use crate::command::{Command, Reply};
use std::io::{BufRead, BufReader, Write};
use std::os::unix::net::UnixStream;
use std::path::Path;

/// Send `cmd` to the daemon listening on `path` and wait for its reply.
pub fn send(path: &Path, cmd: &Command) -> Result<Reply, IpcError> {
    let mut stream = UnixStream::connect(path)?;
    let mut line = serde_json::to_string(cmd)?;
    line.push('\n');
    stream.write_all(line.as_bytes())?;
    stream.shutdown(std::net::Shutdown::Write)?;

    let mut response = String::new();
    if BufReader::new(stream).read_line(&mut response)? == 0 {
        return Err(IpcError::NoReply);
    }
    Ok(serde_json::from_str(&response)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ipc::listener::tests::{spawn_daemon, tmp_socket_path};

    #[test]
    fn send_returns_daemon_reply() {
        let path = tmp_socket_path();
        let seen = spawn_daemon(&path);

        let reply = send(&path, &Command::Workspace("r+1".into())).unwrap();
        assert_eq!(reply, Reply::success(Some("split:workspace".into())));

        let reply = send(&path, &Command::SwapActiveWorkspaces("DP-1 DP-9".into())).unwrap();
        assert!(!reply.ok);

        assert_eq!(seen.try_iter().count(), 2);
        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn send_without_daemon_fails() {
        let path = tmp_socket_path();
        let err = send(&path, &Command::Resolve("1".into())).unwrap_err();
        assert!(matches!(err, IpcError::Io(_)));
    }
}
