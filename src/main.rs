//! Authentication gateway binary.
//!
//! ```text
//!     Client ──▶ correlation ──▶ header dedup ──▶ body limit ──▶ auth ──▶ rate limit ──▶ downstream
//!                    │                                             │
//!                    └── request span, lifecycle logs              └── trusted X-* identity headers
//! ```
//!
//! The downstream is an echo handler that reflects what a backend would
//! receive; deployments embed the library and pass their own router to
//! `build_pipeline`.

use std::net::SocketAddr;
use std::path::PathBuf;

use auth_gateway::config::load_or_default;
use auth_gateway::lifecycle::{shutdown_signal, Shutdown};
use auth_gateway::observability::{logging, metrics};
use auth_gateway::GatewayServer;
use clap::Parser;
use tokio::net::TcpListener;

#[derive(Parser)]
#[command(name = "auth-gateway")]
#[command(about = "Authentication and request-context gateway", long_about = None)]
struct Args {
    /// Path to the TOML configuration file
    #[arg(short, long, default_value = "gateway.toml")]
    config: PathBuf,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();
    let loaded = load_or_default(&args.config);

    // Logging settings come from the config, so a rejected config still logs with defaults.
    let observability = loaded
        .as_ref()
        .map(|config| config.observability.clone())
        .unwrap_or_default();
    logging::init_logging(&observability)?;
    tracing::info!(version = env!("CARGO_PKG_VERSION"), "auth-gateway starting");

    if !args.config.exists() {
        tracing::warn!(path = %args.config.display(), "Config file not found, using defaults");
    }
    let config = match loaded {
        Ok(config) => config,
        Err(e) => {
            tracing::error!(path = %args.config.display(), error = %e, "Configuration rejected");
            return Err(e.into());
        }
    };

    tracing::info!(
        bind_address = %config.listener.bind_address,
        public_paths = config.auth.public_paths.len(),
        rate_limit = config.rate_limit.enabled,
        dedupe_headers = config.dedupe.names.len(),
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse::<SocketAddr>() {
            Ok(addr) => metrics::init_metrics(addr)?,
            Err(_) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            ),
        }
    }

    let listener = TcpListener::bind(&config.listener.bind_address).await?;
    tracing::info!(address = %listener.local_addr()?, "Listening for connections");

    let shutdown = Shutdown::new();
    let server = GatewayServer::new(config)?;
    let server_shutdown = shutdown.subscribe();
    let server_task = tokio::spawn(server.run(listener, server_shutdown));

    shutdown_signal().await;
    shutdown.trigger();

    server_task.await??;
    tracing::info!("Shutdown complete");
    Ok(())
}
