//! rproxy: a single-hop reverse proxy guarded by a shared API key.
//!
//! # Architecture Overview
//!
//! ```text
//!     Client Request        ┌──────────────────────────────────────────────┐
//!     ──────────────────────┼─▶ listener ─▶ gate ──────────▶ forwarder ────┼──▶ Upstream
//!     (key + host headers)  │   (plain/TLS)  │ key check      │ hop-by-hop  │
//!                           │                │ route lookup   │ stripping   │
//!                           │                │ retarget       │             │
//!     Client Response       │                ▼                ▼             │
//!     ◀─────────────────────┼── 401 / 400 rejections   streamed response ◀──┼───
//!                           │                                               │
//!                           │  config · route table · logging · lifecycle   │
//!                           └──────────────────────────────────────────────┘
//! ```

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;

use rproxy::lifecycle::{startup, Outcome, Shutdown, StartupError, StartupOptions};

#[derive(Parser)]
#[command(name = "rproxy")]
#[command(about = "Reverse proxy that routes by header after a shared-key check", long_about = None)]
struct Cli {
    /// Proxy config file
    #[arg(long)]
    conf: PathBuf,

    /// Dump config and exit
    #[arg(long)]
    dumpconfig: bool,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    let options = StartupOptions {
        config_path: cli.conf,
        dump_config: cli.dumpconfig,
    };

    let shutdown = Shutdown::new();
    let server_shutdown = shutdown.subscribe();
    shutdown.trigger_on_signal();

    match startup::run(&options, server_shutdown).await {
        Ok(outcome) => {
            if outcome == Outcome::Stopped {
                tracing::info!("Shutdown complete");
            }
            ExitCode::from(outcome.exit_status())
        }
        // Config and log sink failures happen before logging is up.
        Err(e @ (StartupError::Config { .. } | StartupError::Logging(_))) => {
            eprintln!("rproxy: {}", e);
            ExitCode::FAILURE
        }
        Err(e) => {
            tracing::error!(error = %e, "Fatal error");
            ExitCode::FAILURE
        }
    }
}
