//! Session gate: per-client admission control over HTTP.
//!
//! # Architecture Overview
//!
//! ```text
//!     GET /?clientId=N     ┌──────────────────────────────────────────────┐
//!     ─────────────────────┼─▶ http (dispatcher)                          │
//!                          │     │ 400 if the id is missing or malformed   │
//!                          │     ▼                                         │
//!                          │   admission controller                        │
//!                          │     lock → expire → increment → store         │
//!                          │     │ post-increment count                    │
//!                          │     ▼                                         │
//!     200 / 503            │   count > quota ? 503 : 200                   │
//!     ◀────────────────────┼───                                            │
//!                          │                                               │
//!                          │   config · lifecycle · observability          │
//!                          └──────────────────────────────────────────────┘
//! ```

use std::path::PathBuf;

use clap::Parser;
use session_gate::config::{self, ConfigError, GateConfig};
use session_gate::lifecycle::{self, signals, Shutdown};
use session_gate::observability::{logging, metrics};

#[derive(Parser, Debug)]
#[command(name = "session-gate")]
#[command(about = "Per-client admission control endpoint")]
struct Args {
    /// TOML configuration file (defaults are used when omitted)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Override listener.bind_address
    #[arg(short, long)]
    bind: Option<String>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => config::load_config(path)?,
        None => GateConfig::default(),
    };
    if let Some(bind) = args.bind {
        config.listener.bind_address = bind;
        config::validate_config(&config).map_err(ConfigError::Validation)?;
    }

    logging::init_logging(&config.observability)?;
    tracing::info!(version = env!("CARGO_PKG_VERSION"), "session-gate starting");

    if config.observability.metrics_enabled {
        metrics::init_metrics(config.observability.metrics_address.parse()?)?;
    }

    let shutdown = Shutdown::new();
    signals::spawn_signal_listener(shutdown.clone());

    let gate = lifecycle::start(config, shutdown).await?;
    gate.wait().await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
