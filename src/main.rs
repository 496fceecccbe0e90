use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

use clap::Parser;

use api_gateway::config::load_config;
use api_gateway::http::ServeError;
use api_gateway::lifecycle::{bootstrap, Shutdown};
use api_gateway::observability;

#[derive(Parser)]
#[command(name = "api-gateway")]
#[command(about = "Edge API gateway with JWT trust and distributed revocation", long_about = None)]
struct Cli {
    /// Path to the gateway config file.
    #[arg(long, default_value = "configs/gateway.yaml")]
    config: PathBuf,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let config = match load_config(&cli.config) {
        Ok(config) => config,
        Err(error) => {
            eprintln!("Failed to load config: {error}");
            return ExitCode::from(1);
        }
    };

    observability::logging::init(&config.logging);

    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        address = %config.server.address(),
        "starting api-gateway"
    );

    let (server, listener) = match bootstrap(&config).await {
        Ok(parts) => parts,
        Err(error) => {
            tracing::error!(%error, "startup failed");
            return ExitCode::from(1);
        }
    };

    let shutdown = std::sync::Arc::new(Shutdown::new());
    shutdown.listen_for_signals();

    let drain = Duration::from_secs(config.server.shutdown_timeout_secs);
    match server.run(listener, shutdown.subscribe(), drain).await {
        Ok(()) => {
            tracing::info!("shutdown complete");
            ExitCode::SUCCESS
        }
        Err(ServeError::DrainTimeout) => {
            tracing::error!("forced shutdown after drain timeout");
            ExitCode::from(1)
        }
        Err(error) => {
            tracing::error!(%error, "server failed");
            ExitCode::from(1)
        }
    }
}
