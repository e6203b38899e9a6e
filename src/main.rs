//! MCP Relay Proxy
//!
//! A single-hop MCP proxy built with Tokio and Axum.
//!
//! # Architecture Overview
//!
//! ```text
//!                    ┌──────────────────────────────────────────────┐
//!                    │                 MCP RELAY                     │
//!                    │                                               │
//!  Client POST /     │  ┌─────────┐   ┌──────────┐   ┌──────────┐   │
//!  ──────────────────┼─▶│  http   │──▶│ request  │──▶│ upstream │───┼──▶ Upstream
//!                    │  │ server  │   │ planning │   │  client  │   │    MCP endpoint
//!                    │  └─────────┘   └──────────┘   └────┬─────┘   │
//!                    │                                    │         │
//!  Client Response   │  ┌──────────┐                      │         │
//!  ◀─────────────────┼──│ response │◀─────────────────────┘         │
//!                    │  │normalize │  (JSON or SSE-framed JSON)     │
//!                    │  └──────────┘                                │
//!                    │                                               │
//!                    │  config · lifecycle · observability           │
//!                    └──────────────────────────────────────────────┘
//! ```

use std::path::PathBuf;

use clap::Parser;
use tokio::net::TcpListener;

use mcp_relay::config::{self, RelayConfig};
use mcp_relay::lifecycle::{signal_listener, Shutdown};
use mcp_relay::observability::{logging, metrics};
use mcp_relay::HttpServer;

#[derive(Parser, Debug)]
#[command(name = "mcp-relay", version, about = "Single-hop MCP translation proxy")]
struct Cli {
    /// Path to a TOML config file; defaults apply when omitted.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Listen port, overriding the configured bind address's port.
    #[arg(long, env = "PORT")]
    port: Option<u16>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => config::load_config(path)?,
        None => RelayConfig::default(),
    };
    if let Some(port) = cli.port {
        config::apply_port_override(&mut config, port);
    }

    logging::init_logging(&config.observability);

    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        bind_address = %config.listener.bind_address,
        proxy_target = %config.upstream.url,
        "mcp-relay starting"
    );

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse() {
            Ok(addr) => metrics::init_metrics(addr),
            Err(e) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                error = %e,
                "Failed to parse metrics address"
            ),
        }
    }

    let listener = TcpListener::bind(&config.listener.bind_address).await?;
    let local_addr = listener.local_addr()?;
    tracing::info!(address = %local_addr, "Listening for connections");

    let shutdown = Shutdown::new();
    let server_shutdown = shutdown.subscribe();

    tokio::spawn(async move {
        signal_listener().await;
        shutdown.trigger();
    });

    let server = HttpServer::new(config)?;
    server.run(listener, server_shutdown).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
