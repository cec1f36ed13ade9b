//! `tailon-tui`: terminal dashboard for a TailOn process manager.
//!
//! Built on [ratatui](https://ratatui.rs) on top of `tailon-core`'s
//! [`Dashboard`](tailon_core::Dashboard). Screens are navigable via number
//! keys (1-2): Dashboard and Docs.
//!
//! Logs are written to a file (default `/tmp/tailon-tui.log`) to avoid
//! corrupting the terminal UI. A background data bridge task polls the
//! server and feeds snapshots into the TUI action loop.
//!
//! Entry point: CLI argument parsing, config layering, tracing setup,
//! panic hooks, and app launch.

mod action;
mod app;
mod component;
mod data_bridge;
mod event;
mod screen;
mod screens;
mod theme;
mod tui;
mod widgets;

use std::path::{Path, PathBuf};

use clap::Parser;
use color_eyre::eyre::Result;
use tracing::info;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use tailon_config::Config;
use tailon_core::Controller;

use crate::app::App;

const DEFAULT_LOG_FILE: &str = "/tmp/tailon-tui.log";

/// Terminal dashboard for monitoring and controlling TailOn applications.
#[derive(Parser, Debug)]
#[command(name = "tailon-tui", version, about)]
struct Cli {
    /// TailOn server URL (e.g., http://localhost:8080)
    #[arg(short = 's', long, env = "TAILON_SERVER")]
    server: Option<String>,

    /// Config file (defaults to the platform config directory)
    #[arg(short = 'c', long)]
    config: Option<PathBuf>,

    /// Log file path (defaults to /tmp/tailon-tui.log)
    #[arg(long)]
    log_file: Option<PathBuf>,

    /// Accept invalid TLS certificates
    #[arg(long)]
    insecure: bool,

    /// Write the effective configuration to the config file and exit
    #[arg(long)]
    save_config: bool,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

impl Cli {
    /// Layer CLI flags over the loaded config.
    fn apply(&self, config: &mut Config) {
        if let Some(ref server) = self.server {
            config.server.clone_from(server);
        }
        if let Some(ref log_file) = self.log_file {
            config.log_file = Some(log_file.clone());
        }
        if self.insecure {
            config.insecure = true;
        }
    }
}

/// Set up file-based tracing. We MUST NOT log to stdout/stderr, which would
/// corrupt the TUI output. Returns a guard that must be held for the
/// lifetime of the application to ensure logs are flushed.
fn setup_tracing(verbose: u8, log_file: &Path) -> WorkerGuard {
    let log_level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!(
            "tailon_tui={log_level},tailon_core={log_level},tailon_api={log_level}"
        ))
    });

    let log_dir = log_file.parent().unwrap_or(Path::new("/tmp"));
    let log_filename = log_file
        .file_name()
        .unwrap_or(std::ffi::OsStr::new("tailon-tui.log"));

    let file_appender = tracing_appender::rolling::never(log_dir, log_filename);
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    tracing_subscriber::registry()
        .with(filter)
        .with(
            fmt::layer()
                .with_writer(non_blocking)
                .with_ansi(false)
                .with_target(true)
                .with_thread_ids(true),
        )
        .init();

    guard
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Install panic/error hooks BEFORE entering the terminal
    tui::install_hooks()?;

    // Priority: CLI flags > environment > config file > defaults
    let config_path = cli.config.clone().unwrap_or_else(tailon_config::config_path);
    let mut config = tailon_config::load_config_from(&config_path)?;
    cli.apply(&mut config);
    config.validate()?;

    if cli.save_config {
        tailon_config::save_config_to(&config, &config_path)?;
        println!("wrote {}", config_path.display());
        return Ok(());
    }

    let log_file = config
        .log_file
        .clone()
        .unwrap_or_else(|| PathBuf::from(DEFAULT_LOG_FILE));
    let _log_guard = setup_tracing(cli.verbose, &log_file);

    info!(server = %config.server, "starting tailon-tui");

    let controller = Controller::new(&config.to_remote_config()?)?;
    let mut app = App::new(controller, config.dashboard_settings());
    app.run().await?;

    Ok(())
}
