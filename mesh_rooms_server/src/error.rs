//! Error types for the signaling relay

use thiserror::Error;

/// Membership anomalies reported by the room registry.
///
/// Neither is fatal: the coordinator logs them and carries on, leaving the
/// registry untouched.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MembershipError {
    /// Connection is already a member of the room
    #[error("connection {connection} already joined room {room}")]
    DuplicateJoin { room: String, connection: String },

    /// Connection is not a member of the room it tried to leave
    #[error("connection {connection} is not a member of room {room}")]
    StaleLeave { room: String, connection: String },
}

/// Errors that can occur while relaying events to connections
#[derive(Error, Debug)]
pub enum SignalingError {
    /// Target connection is not (or no longer) open
    #[error("Unknown peer")]
    UnknownPeer,

    /// Failed to hand an event to a connection's outbound queue
    #[error("Failed to send message: {0}")]
    Send(String),

    /// WebSocket error
    #[error("WebSocket error: {0}")]
    WebSocket(#[from] tokio_tungstenite::tungstenite::Error),

    /// JSON parsing error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Socket error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Startup configuration error
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
}

/// Errors from reading startup configuration
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// PORT is not a valid port number
    #[error("invalid PORT value {0:?}")]
    InvalidPort(String),

    /// HOST is not a valid IP address
    #[error("invalid HOST value {0:?}")]
    InvalidHost(String),
}
