//! WebSocket connection handling for the signaling relay
//!
//! Each accepted socket becomes one connection in the hub. Text frames are
//! parsed into client events; events queued for the connection are written
//! back as text frames by a separate task. When the socket closes for any
//! reason the connection is disconnected from the hub.

use crate::config::Config;
use crate::error::SignalingError;
use crate::protocol::{ClientEvent, ServerEvent};
use crate::state::ServerState;
use futures_util::{SinkExt, StreamExt};
use std::sync::Arc;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::mpsc;
use tokio_tungstenite::accept_hdr_async;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::tungstenite::handshake::server::{ErrorResponse, Request, Response};
use tokio_tungstenite::tungstenite::http::{StatusCode, header::ORIGIN};
use tracing::{debug, error, info, warn};

/// Accept connections until the listener fails
pub async fn serve(listener: TcpListener, state: ServerState, config: Arc<Config>) {
    loop {
        let (stream, addr) = match listener.accept().await {
            Ok(accepted) => accepted,
            Err(err) => {
                warn!("Failed to accept connection: {err}");
                continue;
            }
        };

        let state = state.clone();
        let config = Arc::clone(&config);
        tokio::spawn(async move {
            if let Err(err) = handle_connection(stream, state, config).await {
                debug!(%addr, "connection ended with error: {err}");
            }
        });
    }
}

/// Handle a single WebSocket connection
pub async fn handle_connection(
    stream: TcpStream,
    state: ServerState,
    config: Arc<Config>,
) -> Result<(), SignalingError> {
    let addr = stream.peer_addr()?;
    let ws_stream = accept_hdr_async(stream, |request: &Request, response: Response| {
        check_origin(&config, request, response)
    })
    .await?;

    let (mut ws_tx, mut ws_rx) = ws_stream.split();
    let (tx, mut rx) = mpsc::unbounded_channel::<ServerEvent>();
    let connection = state.connect(tx);
    info!(%connection, %addr, "websocket connection established");

    // Task to forward queued events to the socket
    let forward_task = tokio::spawn(async move {
        while let Some(event) = rx.recv().await {
            let text = match event.to_json() {
                Ok(text) => text,
                Err(err) => {
                    error!(%connection, "Failed to encode event: {err}");
                    continue;
                }
            };
            if let Err(err) = ws_tx.send(Message::text(text)).await {
                debug!(%connection, "Failed to send WebSocket message: {err}");
                break;
            }
        }
        let _ = ws_tx.close().await;
    });

    while let Some(message) = ws_rx.next().await {
        match message {
            Ok(Message::Text(text)) => match text.as_str().parse::<ClientEvent>() {
                Ok(event) => state.dispatch(connection, event),
                Err(err) => warn!(%connection, "ignoring malformed event: {err}"),
            },
            Ok(Message::Binary(_)) => warn!(%connection, "ignoring binary frame"),
            Ok(Message::Close(_)) => {
                debug!(%connection, "WebSocket closed by client");
                break;
            }
            Ok(_) => {}
            Err(err) => {
                debug!(%connection, "WebSocket error: {err}");
                break;
            }
        }
    }

    state.disconnect(connection);
    forward_task.abort();
    Ok(())
}

/// Reject browsers whose `Origin` is not the configured one
fn check_origin(
    config: &Config,
    request: &Request,
    response: Response,
) -> Result<Response, ErrorResponse> {
    let Some(origin) = request.headers().get(ORIGIN) else {
        return Ok(response);
    };
    let origin = origin.to_str().unwrap_or_default();
    if config.origin_allowed(origin) {
        return Ok(response);
    }

    warn!(origin, "rejecting connection from disallowed origin");
    let mut rejection = ErrorResponse::new(Some("Origin not allowed".to_string()));
    *rejection.status_mut() = StatusCode::FORBIDDEN;
    Err(rejection)
}
