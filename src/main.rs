//! origin-proxy
//!
//! Serves one fixed upstream web application from this proxy's own origin.
//!
//! # Architecture Overview
//!
//! ```text
//!                      ┌───────────────────────────────────────────────────────┐
//!                      │                     ORIGIN PROXY                       │
//!   Client Request     │  ┌─────────┐   ┌────────────┐   ┌─────────────────┐   │
//!   ───────────────────┼─▶│  http   │──▶│ upstream   │──▶│ security        │   │
//!                      │  │ server  │   │ url builder│   │ header sanitizer│   │
//!                      │  └─────────┘   └────────────┘   └────────┬────────┘   │
//!                      │                                          ▼            │
//!   Client Response    │  ┌──────────────────────┐       ┌─────────────────┐   │
//!   ◀──────────────────┼──│ response rewriter    │◀──────│ forwarder       │◀──┼── Upstream
//!                      │  │ cookies/location/cors│       │ manual redirects│   │
//!                      │  └──────────────────────┘       └─────────────────┘   │
//!                      └───────────────────────────────────────────────────────┘
//! ```

use clap::Parser;
use std::path::PathBuf;
use std::process::ExitCode;
use tokio::net::TcpListener;

use origin_proxy::config::loader::{finalize_config, read_config};
use origin_proxy::config::ProxyConfig;
use origin_proxy::lifecycle::signals::trigger_on_signal;
use origin_proxy::observability::{logging, metrics};
use origin_proxy::{HttpServer, Shutdown};

#[derive(Parser)]
#[command(name = "origin-proxy")]
#[command(about = "Serve a single upstream web app from this proxy's origin", long_about = None)]
struct Cli {
    /// Path to the TOML configuration file.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Upstream target URL (overrides `upstream.target`).
    #[arg(short, long)]
    target: Option<String>,

    /// Bind address (overrides `listener.bind_address`).
    #[arg(short, long)]
    bind: Option<String>,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let config = match load(&cli) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("origin-proxy: {}", e);
            return ExitCode::FAILURE;
        }
    };

    if let Err(e) = logging::init_logging(&config.observability) {
        eprintln!("origin-proxy: failed to initialize logging: {}", e);
        return ExitCode::FAILURE;
    }

    match run(config).await {
        Ok(()) => {
            tracing::info!("Shutdown complete");
            ExitCode::SUCCESS
        }
        Err(e) => {
            tracing::error!(error = %e, "Fatal error");
            ExitCode::FAILURE
        }
    }
}

/// Read the config file (if any), apply CLI overrides, then validate.
fn load(cli: &Cli) -> Result<ProxyConfig, Box<dyn std::error::Error>> {
    let mut config = match &cli.config {
        Some(path) => read_config(path)?,
        None => ProxyConfig::default(),
    };

    if let Some(target) = &cli.target {
        config.upstream.target = target.clone();
    }
    if let Some(bind) = &cli.bind {
        config.listener.bind_address = bind.clone();
    }

    Ok(finalize_config(config)?)
}

async fn run(config: ProxyConfig) -> Result<(), Box<dyn std::error::Error>> {
    tracing::info!(
        bind_address = %config.listener.bind_address,
        upstream = %config.upstream.target,
        entry_marker = %config.upstream.entry_marker,
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        metrics::init_metrics(config.observability.metrics_address.parse()?)?;
    }

    let server = HttpServer::new(config)?;
    let listener = TcpListener::bind(&server.config().listener.bind_address).await?;

    let shutdown = Shutdown::new();
    let server_shutdown = shutdown.subscribe();
    tokio::spawn(trigger_on_signal(shutdown));

    server.run(listener, server_shutdown).await?;
    Ok(())
}
