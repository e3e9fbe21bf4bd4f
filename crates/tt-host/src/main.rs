//! TT-Host: operator console for interactive classroom activities.
//!
//! Connects to the relaying backend over one TCP session, lets the operator
//! start and end activities and push updates from the console, and prints the
//! clients and answers the backend relays back.
//!
//! # Usage
//!
//! ```text
//! tt-host [OPTIONS]
//!
//! Options:
//!   --config        <PATH>   Config file [default: platform config dir]
//!   --backend-host  <HOST>   Backend hostname or IP
//!   --backend-port  <PORT>   Backend host port
//!   --max-frame-len <BYTES>  Largest inbound frame, 0 disables the limit
//!   --log-level     <FILTER> Log filter when RUST_LOG is unset
//! ```
//!
//! # Configuration precedence
//!
//! CLI arguments and their environment variables override the config file,
//! which overrides the built-in defaults.
//!
//! | Variable            | Config key              |
//! |---------------------|-------------------------|
//! | `TT_HOST_CONFIG`    | –                       |
//! | `TT_BACKEND_HOST`   | `backend.host`          |
//! | `TT_BACKEND_PORT`   | `backend.port`          |
//! | `TT_MAX_FRAME_LEN`  | `session.max_frame_len` |
//! | `TT_LOG_LEVEL`      | `logging.level`         |
//!
//! # Architecture overview
//!
//! ```text
//! stdin ──► console::parse_command ──► ActivityController ──► Session ──► backend
//!                                            ▲                   │
//!                                            └── HostEvent ◄─────┘ (receive thread)
//! ```

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use tt_core::protocol::messages::DISCONNECT_REASON_HOST_CLOSED;
use tt_host::application::activities::ActivityCatalog;
use tt_host::application::run_activity::{ActivityController, ActivityLink, Flow};
use tt_host::infrastructure::console::{parse_command, Command, HELP_TEXT};
use tt_host::infrastructure::network::{ChannelEvents, Session};
use tt_host::infrastructure::storage::config::{
    load_config, load_config_from, ConfigError, HostConfig,
};

// ── CLI argument definitions ──────────────────────────────────────────────────

/// TT-Host operator console.
#[derive(Debug, Parser)]
#[command(
    name = "tt-host",
    about = "Runs interactive activities for clients connected through a TT backend",
    version
)]
struct Cli {
    /// Path of the TOML config file.
    ///
    /// When absent, the platform config directory is used; a missing file
    /// means built-in defaults.
    #[arg(long, env = "TT_HOST_CONFIG")]
    config: Option<PathBuf>,

    /// Hostname or IP address of the backend.
    #[arg(long, env = "TT_BACKEND_HOST")]
    backend_host: Option<String>,

    /// TCP port the backend accepts hosts on.
    #[arg(long, env = "TT_BACKEND_PORT")]
    backend_port: Option<u16>,

    /// Largest inbound frame payload in bytes; 0 disables the limit.
    #[arg(long, env = "TT_MAX_FRAME_LEN")]
    max_frame_len: Option<u32>,

    /// `tracing` filter used when `RUST_LOG` is unset.
    #[arg(long, env = "TT_LOG_LEVEL")]
    log_level: Option<String>,
}

impl Cli {
    /// Loads the config file and applies CLI overrides on top.
    ///
    /// # Errors
    ///
    /// Returns an error if the config file exists but cannot be read or parsed.
    fn resolve_config(&self) -> anyhow::Result<HostConfig> {
        let mut config = match &self.config {
            Some(path) => load_config_from(path)
                .with_context(|| format!("loading config from {}", path.display()))?,
            None => match load_config() {
                Ok(config) => config,
                Err(ConfigError::NoPlatformConfigDir) => HostConfig::default(),
                Err(e) => return Err(e).context("loading config"),
            },
        };

        if let Some(host) = &self.backend_host {
            config.backend.host = host.clone();
        }
        if let Some(port) = self.backend_port {
            config.backend.port = port;
        }
        if let Some(max) = self.max_frame_len {
            config.session.max_frame_len = max;
        }
        if let Some(level) = &self.log_level {
            config.logging.level = level.clone();
        }
        Ok(config)
    }
}

// ── Entry point ───────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = cli.resolve_config()?;

    // Logs go to stderr so console output on stdout stays readable.
    // `RUST_LOG` wins over the configured level.
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .or_else(|_| EnvFilter::try_new(&config.logging.level))
                .unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    info!("TT-Host starting");

    let host = config.backend.host.clone();
    let port = config.backend.port;
    let addr = tokio::net::lookup_host((host.as_str(), port))
        .await
        .with_context(|| format!("resolving backend address {host}:{port}"))?
        .next()
        .with_context(|| format!("{host} did not resolve to any address"))?;

    // ── Session ───────────────────────────────────────────────────────────────
    let (events, mut event_rx) = ChannelEvents::new();
    let options = config.session.to_options();
    let session = tokio::task::spawn_blocking(move || Session::connect(addr, Arc::new(events), options))
        .await
        .context("connect task failed")??;

    let link: Arc<dyn ActivityLink> = Arc::clone(&session) as Arc<dyn ActivityLink>;
    let mut controller = ActivityController::new(link, ActivityCatalog::default());

    println!("connected to {addr}; type `help` for commands");
    print_catalog(&controller);

    // ── Event pump ────────────────────────────────────────────────────────────
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdin_open = true;

    loop {
        tokio::select! {
            line = lines.next_line(), if stdin_open => match line {
                Ok(Some(line)) => {
                    if line.trim().is_empty() {
                        continue;
                    }
                    match parse_command(&line) {
                        Ok(command) => run_command(command, &mut controller, &session),
                        Err(e) => println!("{e}"),
                    }
                }
                Ok(None) => {
                    info!("console input closed");
                    stdin_open = false;
                    run_command(Command::Quit, &mut controller, &session);
                }
                Err(e) => {
                    error!("reading console input failed: {e}");
                    stdin_open = false;
                    run_command(Command::Quit, &mut controller, &session);
                }
            },

            event = event_rx.recv() => match event {
                Some(event) => {
                    if let Flow::Closed { reason } = controller.handle_event(event) {
                        println!("session closed: {reason}");
                        break;
                    }
                }
                None => break,
            },

            signal = tokio::signal::ctrl_c() => {
                match signal {
                    Ok(()) => info!("received Ctrl+C, closing session"),
                    Err(e) => warn!("failed to listen for Ctrl+C: {e}"),
                }
                run_command(Command::Quit, &mut controller, &session);
            }
        }
    }

    let rx_session = Arc::clone(&session);
    if let Err(e) = tokio::task::spawn_blocking(move || rx_session.join()).await {
        warn!("waiting for the receive loop failed: {e}");
    }

    info!("TT-Host stopped");
    Ok(())
}

// ── Console commands ──────────────────────────────────────────────────────────

/// Runs one console command from inside the async event pump.
///
/// Session writes are blocking socket I/O, so the worker thread is handed over
/// to the blocking pool while the command runs.  Requires the multi-threaded
/// runtime.
fn run_command(command: Command, controller: &mut ActivityController, session: &Session) {
    tokio::task::block_in_place(|| execute(command, controller, session));
}

fn execute(command: Command, controller: &mut ActivityController, session: &Session) {
    match command {
        Command::List => print_catalog(controller),
        Command::Start(index) => match controller.start_activity(index) {
            Ok(state_id) => println!("started activity {index} (state {state_id})"),
            Err(e) => println!("could not start activity: {e}"),
        },
        Command::Update(text) => {
            if let Err(e) = controller.send_update(&text) {
                println!("could not send update: {e}");
            }
        }
        Command::End => match controller.end_activity() {
            Ok(()) => println!("activity ended"),
            Err(e) => println!("could not announce idle state: {e}"),
        },
        Command::Clients => {
            let clients = controller.roster().all();
            if clients.is_empty() {
                println!("no clients connected");
            }
            for client in clients {
                println!("  {} ({})", client.name, client.address);
            }
        }
        Command::Status => match controller.status() {
            Some(status) => println!(
                "running {} (index {}, state {})",
                status.name, status.index, status.state_id
            ),
            None => println!("idle"),
        },
        Command::Leave(reason) => {
            let reason = reason.as_deref().unwrap_or(DISCONNECT_REASON_HOST_CLOSED);
            match session.close_send(reason) {
                Ok(()) => println!("stopped sending; waiting for the backend to close"),
                Err(e) => println!("could not leave cleanly: {e}"),
            }
        }
        Command::Quit => session.close_completely(DISCONNECT_REASON_HOST_CLOSED),
        Command::Help => println!("{HELP_TEXT}"),
    }
}

fn print_catalog(controller: &ActivityController) {
    println!("activities:");
    for (index, entry) in controller.catalog().iter() {
        println!("  {index}: {} ({})", entry.label(), entry.name());
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
