//! Forwarding proxy (v1)
//!
//! # Architecture Overview
//!
//! ```text
//!                     ┌──────────────────────────────────────────────────┐
//!                     │                  FORWARD PROXY                   │
//!                     │                                                  │
//!   GET /?url=...     │  ┌──────────┐   ┌───────────┐   ┌─────────────┐  │
//!   ──────────────────┼─▶│ security │──▶│   http    │──▶│  forward    │  │
//!                     │  │rate limit│   │  handler  │   │ target/body │  │
//!                     │  └──────────┘   └───────────┘   └──────┬──────┘  │
//!                     │                                        ▼         │
//!                     │                                 ┌─────────────┐  │
//!                     │                                 │  redirect   │  │
//!                     │                                 │  resolver   │  │
//!                     │                                 └──────┬──────┘  │
//!                     │                                        ▼         │
//!   terminal response │  ┌──────────┐   ┌───────────┐   ┌─────────────┐  │
//!   ◀─────────────────┼──│ headers  │◀──│  relay    │◀──│  outbound   │◀─┼── Upstream
//!                     │  │  policy  │   │           │   │ http/https  │  │
//!                     │  └──────────┘   └───────────┘   └─────────────┘  │
//!                     └──────────────────────────────────────────────────┘
//! ```

use std::path::PathBuf;

use clap::Parser;

use forward_proxy::config::loader::load_config;
use forward_proxy::config::validation::validate_config;
use forward_proxy::lifecycle::startup;
use forward_proxy::observability::logging::init_logging;
use forward_proxy::ProxyConfig;

#[derive(Parser)]
#[command(name = "forward-proxy")]
#[command(about = "Single-endpoint HTTP forwarding proxy", long_about = None)]
struct Cli {
    /// TOML configuration file. Defaults apply when omitted.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Override listener.bind_address.
    #[arg(short, long)]
    bind: Option<String>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => load_config(path)?,
        None => ProxyConfig::default(),
    };

    if let Some(bind) = cli.bind {
        config.listener.bind_address = bind;
        if let Err(errors) = validate_config(&config) {
            let joined: Vec<String> = errors.iter().map(|e| e.to_string()).collect();
            return Err(joined.join(", ").into());
        }
    }

    init_logging(&config.observability);
    tracing::info!("forward-proxy v{} starting", env!("CARGO_PKG_VERSION"));

    startup::run(config).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
