//! JSON response service (demo binary).
//!
//! Serves a handful of routes that exercise every response path of the
//! library: streamed success bodies, synchronous error envelopes, and the
//! failure mapper for handler errors and panics.
//!
//! # Architecture Overview
//!
//! ```text
//!   Request ──▶ trace ──▶ timeout ──▶ catch-panic ──▶ map_failures ──▶ handler
//!                                         │                 │             │
//!                                         ▼                 ▼             ▼
//!                                  GlobalErrorMapper ◀── Failure    ResponseBuilder
//!                                                                         │
//!                                             ┌───────────────────────────┤
//!                                             ▼                           ▼
//!                                      error envelope            StreamingEncoder
//!                                      (full body)               worker ──▶ pipe ──▶ BodySource
//!   Response ◀────────────────────────────────┴───────────────────────────────────────┘
//! ```

use std::path::PathBuf;

use clap::Parser;
use tokio::net::TcpListener;

use json_stream_response::config::{self, ServiceConfig};
use json_stream_response::http::HttpServer;
use json_stream_response::observability::logging;

#[derive(Parser)]
#[command(name = "json-stream-response")]
#[command(about = "Demo server for streamed JSON responses and error envelopes", long_about = None)]
struct Cli {
    /// TOML configuration file; defaults are used when omitted.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Override `server.bind_address`.
    #[arg(short, long)]
    bind: Option<String>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => config::load_config(path)?,
        None => ServiceConfig::default(),
    };
    if let Some(bind) = cli.bind {
        config.server.bind_address = bind;
        config::validation::validate_config(&config).map_err(config::ConfigError::Validation)?;
    }

    logging::init_logging(&config.observability)?;

    tracing::info!("json-stream-response v{} starting", env!("CARGO_PKG_VERSION"));
    tracing::info!(
        bind_address = %config.server.bind_address,
        pipe_capacity = config.streaming.pipe_capacity,
        chunk_size = config.streaming.chunk_size,
        pretty = config.serializer.pretty,
        "Configuration loaded"
    );

    let listener = TcpListener::bind(&config.server.bind_address).await?;
    let local_addr = listener.local_addr()?;

    tracing::info!(
        address = %local_addr,
        "Listening for connections"
    );

    let server = HttpServer::new(config);
    server.run(listener).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
