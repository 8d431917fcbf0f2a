//! HiGlass socket proxy.
//!
//! # Architecture Overview
//!
//! ```text
//!                         ┌──────────────────────────────────────────────┐
//!                         │                 SOCKET PROXY                 │
//!     Client Request      │  ┌─────────┐   ┌────────────┐   ┌─────────┐  │
//!     ────────────────────┼─▶│  http   │──▶│  request   │──▶│   net   │──┼──▶ <sockets_dir>/<id>
//!                         │  │ server  │   │ translator │   │  unix   │  │     (backend)
//!                         │  └─────────┘   └────────────┘   └────┬────┘  │
//!     Client Response     │  ┌──────────────────────────┐        │       │
//!     ◀───────────────────┼──│   response reconciler    │◀───────┘       │
//!                         │  └──────────────────────────┘                │
//!                         └──────────────────────────────────────────────┘
//! ```

use std::path::PathBuf;

use clap::Parser;

use higlass_proxy::lifecycle::startup::{self, Overrides};
use higlass_proxy::observability::logging;
use higlass_proxy::Shutdown;

#[derive(Parser)]
#[command(name = "higlass-proxy")]
#[command(about = "Forward /higlass/<id>/ requests to backends on Unix sockets", long_about = None)]
struct Cli {
    /// TOML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Listen address, e.g. 127.0.0.1:8888
    #[arg(short, long)]
    bind: Option<String>,

    /// Directory holding one socket per backend id
    #[arg(short, long)]
    sockets_dir: Option<PathBuf>,

    /// URL prefix the proxy is mounted under
    #[arg(long)]
    base_url: Option<String>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long)]
    log_level: Option<String>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let overrides = Overrides {
        bind_address: cli.bind,
        sockets_dir: cli.sockets_dir,
        base_url: cli.base_url,
        log_level: cli.log_level,
    };
    let config = startup::resolve_config(cli.config.as_deref(), overrides)?;

    logging::init(&config.observability.log_level);
    tracing::info!("higlass-proxy v{} starting", env!("CARGO_PKG_VERSION"));

    let shutdown = Shutdown::new();
    startup::start(config, &shutdown).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
