//! Startup orchestration.
//!
//! # Design Decisions
//! - Fail fast: any startup error is fatal and maps to exit code 1
//! - Subsystems initialize in dependency order: routing config, session
//!   store, server assembly, listener
//! - The listener binds last so traffic arrives only when everything is
//!   ready

use std::sync::Arc;

use tokio::net::TcpListener;

use crate::config::{load_routing_config, ConfigError, GatewayConfig};
use crate::http::{BuildError, GatewayServer};
use crate::session::{RedisSessionRepository, SessionRepository, SessionStoreError};

/// Errors that abort startup.
#[derive(Debug, thiserror::Error)]
pub enum StartupError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("failed to connect to session store: {0}")]
    Session(#[from] SessionStoreError),

    #[error(transparent)]
    Build(#[from] BuildError),

    #[error("failed to bind {address}: {source}")]
    Bind {
        address: String,
        #[source]
        source: std::io::Error,
    },
}

/// Initialize every subsystem and bind the listener.
pub async fn bootstrap(
    config: &GatewayConfig,
) -> Result<(GatewayServer, TcpListener), StartupError> {
    let routing = load_routing_config(std::path::Path::new(&config.routing.config_file))?;

    let sessions: Option<Arc<dyn SessionRepository>> = match &config.redis {
        Some(redis_cfg) => {
            let repo = RedisSessionRepository::connect(redis_cfg).await?;
            Some(Arc::new(repo))
        }
        None => None,
    };

    let server = GatewayServer::new(config, &routing, sessions)?;

    let address = config.server.address();
    let listener = TcpListener::bind(&address)
        .await
        .map_err(|source| StartupError::Bind {
            address: address.clone(),
            source,
        })?;

    tracing::info!(address = %address, "listener bound");
    Ok((server, listener))
}
