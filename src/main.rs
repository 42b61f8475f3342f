//! Entry point for the **hyprsplit** daemon and its `ctl` client.
//!
//! `hyprsplit` runs the daemon: it repairs the workspace ranges once, then
//! follows Hyprland's event stream and the command socket, handling every
//! request on the main thread.
//!
//! `hyprsplit ctl <dispatcher> [arg…]` sends one `split:*` dispatcher to a
//! running daemon and prints the result, e.g.
//!
//! ```text
//! bind = SUPER, 3, exec, hyprsplit ctl split:workspace 3
//! ```

use hyprsplit::command::{Command, Reply, Request};
use hyprsplit::config::Config;
use hyprsplit::hyprland::{HyprlandCompositor, HyprlandEventSource};
use hyprsplit::ipc::{self, UnixSocketListener};
use hyprsplit::splitter::Splitter;
use hyprsplit::traits::{CommandSource, Compositor};
use log::{debug, error, info, warn};
use std::path::PathBuf;
use std::sync::mpsc;

/// Default socket path for the command listener.
fn default_socket_path() -> PathBuf {
    let runtime = std::env::var("XDG_RUNTIME_DIR").unwrap_or_else(|_| "/tmp".into());
    PathBuf::from(runtime).join("hyprsplit.sock")
}

/// Resolve the config directory (`$XDG_CONFIG_HOME/hyprsplit`).
fn config_dir() -> PathBuf {
    let base = std::env::var("XDG_CONFIG_HOME").unwrap_or_else(|_| {
        let home = std::env::var("HOME").unwrap_or_else(|_| "/tmp".into());
        format!("{}/.config", home)
    });
    PathBuf::from(base).join("hyprsplit")
}

fn config_path() -> PathBuf {
    config_dir().join("config.json")
}

/// Try to load the config from `$XDG_CONFIG_HOME/hyprsplit/config.json`,
/// falling back to compiled-in defaults.
fn load_config() -> Config {
    let path = config_path();
    match Config::load(&path) {
        Ok(cfg) => {
            info!("loaded config from {}", path.display());
            cfg
        }
        Err(e) => {
            info!("no usable config ({}), using defaults", e);
            Config::default()
        }
    }
}

//  Main

fn main() {
    env_logger::init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    match args.split_first() {
        Some((mode, rest)) if mode == "ctl" => run_ctl(rest),
        Some((other, _)) => {
            eprintln!("usage: hyprsplit [ctl <dispatcher> [arg...]]");
            eprintln!("unknown argument: {}", other);
            std::process::exit(2);
        }
        None => run_daemon(),
    }
}

/// `hyprsplit ctl` mode.
fn run_ctl(args: &[String]) {
    let Some((name, rest)) = args.split_first() else {
        eprintln!("usage: hyprsplit ctl <dispatcher> [arg...]");
        std::process::exit(2);
    };
    let name = if name.starts_with("split:") {
        name.clone()
    } else {
        format!("split:{}", name)
    };
    let Some(cmd) = Command::from_dispatcher(&name, rest.join(" ")) else {
        eprintln!("unknown dispatcher: {}", name);
        std::process::exit(2);
    };

    let socket = load_config()
        .socket_path
        .unwrap_or_else(default_socket_path);
    match ipc::send(&socket, &cmd) {
        Ok(Reply { ok: true, result, .. }) => {
            if let Some(result) = result {
                println!("{}", result);
            }
        }
        Ok(Reply { error, .. }) => {
            eprintln!("{}: {}", name, error.unwrap_or_else(|| "failed".into()));
            std::process::exit(1);
        }
        Err(e) => {
            eprintln!("cannot reach hyprsplit at {}: {}", socket.display(), e);
            std::process::exit(1);
        }
    }
}

/// Normal daemon mode.
fn run_daemon() {
    let config = load_config();
    let socket = config.socket_path.clone().unwrap_or_else(default_socket_path);

    let compositor = HyprlandCompositor::new();
    match compositor.version() {
        Ok(tag) => info!("connected to Hyprland {}", tag),
        Err(e) => fatal(&compositor, &format!("cannot talk to Hyprland: {}", e)),
    }
    match compositor.monitors() {
        Ok(m) => info!("found {} monitor(s)", m.len()),
        Err(e) => fatal(&compositor, &format!("failed to query monitors: {}", e)),
    }

    let mut splitter = Splitter::new(compositor, config).with_config_path(config_path());
    match splitter.startup() {
        Ok(report) if !report.is_empty() => info!("startup repair: {:?}", report),
        Ok(_) => {}
        Err(e) => fatal(splitter.compositor(), &format!("startup failed: {}", e)),
    }

    let (req_tx, req_rx) = mpsc::channel::<Request>();
    spawn_command_sources(req_tx, socket);

    info!("hyprsplit running");
    for req in req_rx {
        let shutdown = req.command == Command::Shutdown;
        debug!("handling {}", req.command.name());
        let result = splitter.handle(req.command);
        if let Err(e) = &result {
            error!("command error: {}", e);
        }
        if let Some(reply_tx) = req.reply {
            let _ = reply_tx.send(Reply::from(result));
        }
        if shutdown {
            break;
        }
    }
    info!("exiting");
}

/// Report an unrecoverable startup error on screen and in the log, then
/// exit.
fn fatal(compositor: &HyprlandCompositor, message: &str) -> ! {
    error!("{}", message);
    if let Err(e) = compositor.notify_error(message) {
        warn!("could not show notification: {}", e);
    }
    std::process::exit(1);
}

//  Helpers

fn spawn_command_sources(tx: mpsc::Sender<Request>, socket: PathBuf) {
    {
        let tx = tx.clone();
        std::thread::spawn(move || {
            let mut source = UnixSocketListener::new(&socket);
            if let Err(e) = source.run(tx) {
                error!("socket listener error: {}", e);
            }
        });
    }

    // Hyprland closing its event socket means the session is over.
    std::thread::spawn(move || {
        let mut source = HyprlandEventSource::new();
        if let Err(e) = source.run(tx.clone()) {
            error!("event source error: {}", e);
        }
        let _ = tx.send(Command::Shutdown.into());
    });
}
