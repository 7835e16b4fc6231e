//! Natalis MCP Server - Entry Point
//!
//! Serves astrological chart tools over stdio, either as an MCP session or as
//! newline-delimited JSON-RPC envelopes.

use std::sync::Arc;

use anyhow::{Context, Result};
use rmcp::{transport::stdio, ServiceExt};
use tokio::io::BufReader;

use natalis::config::{Settings, Transport};
use natalis::ephemeris::SwissEphemeris;
use natalis::logging::init_logging;
use natalis::server::{serve_lines, Dispatcher};
use natalis::{NatalisServer, Registry};

#[tokio::main]
async fn main() -> Result<()> {
    let settings = Arc::new(Settings::from_env().context("invalid configuration")?);
    init_logging(settings.log_format);

    tracing::info!(
        version = %settings.server_version,
        transport = ?settings.transport,
        "Starting Natalis MCP Server"
    );

    let provider = SwissEphemeris::new(settings.ephemeris_path.as_deref())
        .context("failed to initialize Swiss Ephemeris")?;
    let registry = Arc::new(Registry::new(settings.clone(), Arc::new(provider))?);

    match settings.transport {
        Transport::Mcp => {
            let service = NatalisServer::new(registry).serve(stdio()).await?;
            tracing::info!("Server initialized, waiting for requests...");
            service.waiting().await?;
        }
        Transport::JsonRpc => {
            let dispatcher = Dispatcher::new(registry);
            tracing::info!("Serving JSON-RPC envelopes on stdio");
            serve_lines(&dispatcher, BufReader::new(tokio::io::stdin()), tokio::io::stdout())
                .await?;
        }
    }

    tracing::info!("Server shutting down");

    Ok(())
}
