//! flyt-server entry point.
//!
//! Wires the simulated vehicle and the camera slot into a dispatcher, binds
//! the command listener, and serves until Ctrl-C.
//!
//! ```text
//! main()
//!  └─ load config (file, then CLI/env overrides)
//!  └─ start services
//!       ├─ synthetic camera  (Tokio task, optional)
//!       └─ CommandServer     (accept loop, one task per connection)
//! ```
//!
//! `RUST_LOG` takes precedence over the configured log level.

use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use flyt_core::StopSource;
use tracing::info;
use tracing_subscriber::EnvFilter;

use flyt_server::application::dispatch::CommandDispatcher;
use flyt_server::infrastructure::camera::synthetic::spawn_synthetic_camera;
use flyt_server::infrastructure::camera::LatestFrame;
use flyt_server::infrastructure::network::server::CommandServer;
use flyt_server::infrastructure::storage::config::{load_config, DEFAULT_CONFIG_FILE};
use flyt_server::infrastructure::vehicle::simulated::SimulatedVehicle;

// ── CLI argument definitions ──────────────────────────────────────────────────

/// Remote-control server for a simulated aerial vehicle.
#[derive(Debug, Parser)]
#[command(
    name = "flyt-server",
    about = "Serve flyt flight commands against a simulated vehicle",
    version
)]
struct Cli {
    /// Path of the TOML config file.  A missing file means defaults.
    #[arg(long, default_value = DEFAULT_CONFIG_FILE, env = "FLYT_CONFIG")]
    config: PathBuf,

    /// IP address to bind (overrides the config file).
    #[arg(long, env = "FLYT_BIND")]
    bind: Option<IpAddr>,

    /// TCP port to listen on (overrides the config file).
    #[arg(long, env = "FLYT_PORT")]
    port: Option<u16>,

    /// Log level used when `RUST_LOG` is unset (overrides the config file).
    #[arg(long, env = "FLYT_LOG_LEVEL")]
    log_level: Option<String>,

    /// Do not run the synthetic camera.
    #[arg(long)]
    no_camera: bool,
}

// ── Entry point ───────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut config = load_config(&cli.config)
        .with_context(|| format!("loading {}", cli.config.display()))?;
    if let Some(bind) = cli.bind {
        config.server.bind_address = bind.to_string();
    }
    if let Some(port) = cli.port {
        config.server.port = port;
    }
    if let Some(level) = cli.log_level {
        config.server.log_level = level;
    }
    if cli.no_camera {
        config.camera.synthetic = false;
    }

    // Initialise structured logging.  Level is overridden by `RUST_LOG`.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(&config.server.log_level)),
        )
        .init();

    info!("flyt server starting");

    let bind_ip: IpAddr = config
        .server
        .bind_address
        .parse()
        .with_context(|| format!("invalid bind address: '{}'", config.server.bind_address))?;
    let addr = SocketAddr::new(bind_ip, config.server.port);

    let (stop, token) = StopSource::new();

    // ── Services ──────────────────────────────────────────────────────────────
    let frames = Arc::new(LatestFrame::new());
    let camera = config.camera.synthetic.then(|| {
        spawn_synthetic_camera(
            Arc::clone(&frames),
            config.camera.width,
            config.camera.height,
            Duration::from_millis(config.camera.interval_ms.max(1)),
            token.clone(),
        )
    });

    let dispatcher = Arc::new(CommandDispatcher::new(Arc::new(SimulatedVehicle::new()), frames));
    let server = CommandServer::bind(addr, dispatcher)
        .await?
        .with_max_line_len(config.server.max_line_len);

    // ── Ctrl-C handler ────────────────────────────────────────────────────────
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("shutdown signal received");
            stop.stop();
        }
    });

    info!("flyt server ready.  Press Ctrl-C to exit.");
    server.run(token).await?;

    if let Some(camera) = camera {
        camera.await.context("camera task panicked")?;
    }
    info!("flyt server stopped");
    Ok(())
}
