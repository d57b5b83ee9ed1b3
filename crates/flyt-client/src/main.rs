//! flyt-client: send wire-format commands to a flyt server.
//!
//! # Usage
//!
//! ```text
//! flyt-client [OPTIONS] [COMMAND]...
//!
//! Options:
//!   --config <PATH>       TOML config file [default: flyt-client.toml]
//!   --host <HOST>         Server hostname or IP
//!   --port <PORT>         Server TCP port
//!   --save-frames <DIR>   Write every received camera frame into DIR
//! ```
//!
//! Each `COMMAND` is one request line exactly as it goes on the wire, e.g.
//! `"take_off altitude:12.5"`.  With no commands on the command line, lines
//! are read from stdin (blank lines and lines starting with `#` are skipped).
//!
//! All commands are queued up front and answered in order; each result line
//! is printed as it arrives.
//!
//! # Environment variable overrides
//!
//! | Variable         | Description            |
//! |------------------|------------------------|
//! | `FLYT_CONFIG`    | Config file path       |
//! | `FLYT_HOST`      | Server hostname or IP  |
//! | `FLYT_PORT`      | Server TCP port        |
//! | `FLYT_LOG_LEVEL` | Log level              |
//!
//! `RUST_LOG` takes precedence over every configured log level.

use std::io::BufRead;
use std::net::{SocketAddr, ToSocketAddrs};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use anyhow::{anyhow, Context};
use clap::Parser;
use flyt_core::{Command, Image};
use tokio::sync::oneshot;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use flyt_client::infrastructure::storage::config::{load_config, DEFAULT_CONFIG_FILE};
use flyt_client::{CommandOutcome, Connection, ConnectionConfig, NetworkService, Request};

// ── CLI argument definitions ──────────────────────────────────────────────────

/// Command-line client for the flyt remote-control link.
#[derive(Debug, Parser)]
#[command(
    name = "flyt-client",
    about = "Send flight commands to a flyt server",
    version
)]
struct Cli {
    /// Path of the TOML config file.  A missing file means defaults.
    #[arg(long, default_value = DEFAULT_CONFIG_FILE, env = "FLYT_CONFIG")]
    config: PathBuf,

    /// Server hostname or IP address (overrides the config file).
    #[arg(long, env = "FLYT_HOST")]
    host: Option<String>,

    /// Server TCP port (overrides the config file).
    #[arg(long, env = "FLYT_PORT")]
    port: Option<u16>,

    /// Log level used when `RUST_LOG` is unset (overrides the config file).
    #[arg(long, env = "FLYT_LOG_LEVEL")]
    log_level: Option<String>,

    /// Directory to write received camera frames into.
    #[arg(long)]
    save_frames: Option<PathBuf>,

    /// Request lines to send.  Read from stdin when none are given.
    commands: Vec<String>,
}

// ── Entry point ───────────────────────────────────────────────────────────────

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut config = load_config(&cli.config)
        .with_context(|| format!("loading {}", cli.config.display()))?
        .client;
    if let Some(host) = cli.host {
        config.host = host;
    }
    if let Some(port) = cli.port {
        config.port = port;
    }
    if let Some(level) = cli.log_level {
        config.log_level = level;
    }

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(&config.log_level)),
        )
        .with_writer(std::io::stderr)
        .init();

    let lines = if cli.commands.is_empty() {
        read_stdin_lines()?
    } else {
        cli.commands
    };

    let addr = resolve(&config.host, config.port)?;
    let service = NetworkService::start(config.worker_threads).context("starting network runtime")?;
    let connection = Connection::new(
        &service,
        ConnectionConfig {
            max_line_len: config.max_line_len,
        },
    );
    connection
        .connect(addr)
        .with_context(|| format!("connecting to {addr}"))?;

    let frames = Arc::new(AtomicUsize::new(0));
    let pending = submit_all(&connection, lines, cli.save_frames.as_deref(), &frames);

    for (line, receiver) in pending {
        match receiver.blocking_recv() {
            Ok(Ok(result)) => println!("{line} -> result:{} message:\"{}\"", result.code, result.message),
            Ok(Err(e)) => println!("{line} -> unreadable result: {e}"),
            Err(_) => {
                println!("{line} -> no response (connection lost)");
                break;
            }
        }
    }

    connection.disconnect();
    drop(connection);
    service.shutdown();
    info!(frames = frames.load(Ordering::Relaxed), "done");
    Ok(())
}

/// Queues every parseable line.  Stops early if the session is lost, so the
/// caller can still report the commands that did get queued.
fn submit_all(
    connection: &Connection,
    lines: Vec<String>,
    save_dir: Option<&Path>,
    frames: &Arc<AtomicUsize>,
) -> Vec<(String, oneshot::Receiver<CommandOutcome>)> {
    let mut pending = Vec::with_capacity(lines.len());
    for line in lines {
        let command = match Command::parse(&line) {
            Ok(command) => command,
            Err(e) => {
                warn!("skipping {line:?}: {e}");
                continue;
            }
        };
        match connection.send_command(build_request(command, save_dir, frames)) {
            Ok(receiver) => pending.push((line, receiver)),
            Err(e) => {
                warn!(queued = pending.len(), "stopped submitting at {line:?}: {e}");
                break;
            }
        }
    }
    pending
}

fn read_stdin_lines() -> anyhow::Result<Vec<String>> {
    let mut lines = Vec::new();
    for line in std::io::stdin().lock().lines() {
        let line = line.context("reading stdin")?;
        let trimmed = line.trim();
        if !trimmed.is_empty() && !trimmed.starts_with('#') {
            lines.push(trimmed.to_string());
        }
    }
    Ok(lines)
}

fn resolve(host: &str, port: u16) -> anyhow::Result<SocketAddr> {
    (host, port)
        .to_socket_addrs()
        .with_context(|| format!("resolving {host}:{port}"))?
        .next()
        .ok_or_else(|| anyhow!("{host}:{port} resolved to no address"))
}

fn build_request(command: Command, save_dir: Option<&Path>, frames: &Arc<AtomicUsize>) -> Request {
    let request = Request::new(command);
    let Some(dir) = save_dir else {
        return request;
    };
    let dir = dir.to_path_buf();
    let frames = Arc::clone(frames);
    request.with_image_callback(move |image| {
        let index = frames.fetch_add(1, Ordering::Relaxed);
        match save_frame(&dir, index, &image) {
            Ok(path) => info!(path = %path.display(), width = image.width, height = image.height, "frame saved"),
            Err(e) => warn!("could not save frame {index}: {e}"),
        }
    })
}

/// Writes an RGB frame as binary PPM, anything else as raw bytes.
fn save_frame(dir: &Path, index: usize, image: &Image) -> std::io::Result<PathBuf> {
    std::fs::create_dir_all(dir)?;
    let rgb_len = image.width as usize * image.height as usize * 3;
    if image.data.len() == rgb_len && rgb_len > 0 {
        let path = dir.join(format!("frame-{index:05}.ppm"));
        let mut bytes = format!("P6\n{} {}\n255\n", image.width, image.height).into_bytes();
        bytes.extend_from_slice(&image.data);
        std::fs::write(&path, bytes)?;
        Ok(path)
    } else {
        let path = dir.join(format!("frame-{index:05}.bin"));
        std::fs::write(&path, &image.data)?;
        Ok(path)
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
