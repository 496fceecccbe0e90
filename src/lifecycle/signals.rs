//! OS signal handling.
//!
//! SIGINT and SIGTERM both begin graceful shutdown; there is no reload
//! signal, routing config is immutable for the process lifetime.

/// Wait for SIGINT or SIGTERM.
#[cfg(unix)]
pub async fn wait() {
    use tokio::signal::unix::{signal, SignalKind};

    let mut interrupt = match signal(SignalKind::interrupt()) {
        Ok(signal) => signal,
        Err(error) => {
            tracing::error!(%error, "failed to install SIGINT handler");
            return std::future::pending().await;
        }
    };
    let mut terminate = match signal(SignalKind::terminate()) {
        Ok(signal) => signal,
        Err(error) => {
            tracing::error!(%error, "failed to install SIGTERM handler");
            return std::future::pending().await;
        }
    };

    tokio::select! {
        _ = interrupt.recv() => tracing::info!("SIGINT received"),
        _ = terminate.recv() => tracing::info!("SIGTERM received"),
    }
}

/// Wait for Ctrl+C on platforms without unix signals.
#[cfg(not(unix))]
pub async fn wait() {
    if let Err(error) = tokio::signal::ctrl_c().await {
        tracing::error!(%error, "failed to install Ctrl+C handler");
        return std::future::pending().await;
    }
    tracing::info!("Ctrl+C received");
}
