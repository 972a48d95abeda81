//! Signaling relay entry point
//!
//! Reads configuration from the environment, binds the WebSocket listener
//! and serves until Ctrl+C or SIGTERM.

use mesh_rooms_server::{Config, ServerState, SignalingError, serve};
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::signal;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), SignalingError> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Arc::new(Config::from_env()?);
    tracing::info!(
        "Configuration: listen={}, allowed_origin={}",
        config.listen_addr,
        config.allowed_origin
    );

    let listener = TcpListener::bind(config.listen_addr).await?;
    tracing::info!("Signaling server listening on ws://{}", listener.local_addr()?);

    let state = ServerState::new();
    tokio::select! {
        _ = serve(listener, state, config) => {}
        _ = shutdown_signal() => {
            tracing::info!("Shutdown signal received");
        }
    }

    Ok(())
}

/// Wait for Ctrl+C or SIGTERM
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = signal::ctrl_c().await {
            tracing::error!("Failed to listen for Ctrl+C: {err}");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(err) => {
                tracing::error!("Failed to install SIGTERM handler: {err}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
