//! Identifiers and wire events exchanged with connections
//!
//! Every WebSocket text frame carries one event as
//! `{"event": "<name>", "data": <payload>}`.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Identifier of an open connection, assigned when the connection is accepted
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ConnectionId(pub Uuid);

impl ConnectionId {
    /// Generate a fresh random connection id
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for ConnectionId {
    fn default() -> Self {
        Self::new()
    }
}

impl From<Uuid> for ConnectionId {
    fn from(uuid: Uuid) -> Self {
        Self(uuid)
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Room identifier, chosen by clients
#[derive(Debug, Default, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RoomId(pub String);

impl RoomId {
    /// Whether this room carries the same name as a connection id
    pub fn names(&self, connection: ConnectionId) -> bool {
        self.0 == connection.to_string()
    }
}

impl From<&str> for RoomId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl fmt::Display for RoomId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Application-level user identifier, carried along untouched
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(pub Value);

impl From<&str> for UserId {
    fn from(s: &str) -> Self {
        Self(Value::String(s.to_string()))
    }
}

/// Payload of a `join` request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JoinRoom {
    pub room: RoomId,
    #[serde(rename = "userID", default)]
    pub user_id: UserId,
}

/// Payload of a `relay-sdp` request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelaySessionDescription {
    #[serde(rename = "peerID")]
    pub peer_id: ConnectionId,
    #[serde(rename = "sessionDescription", default)]
    pub session_description: Value,
}

/// Payload of a `relay-ice` request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelayIceCandidate {
    #[serde(rename = "peerID")]
    pub peer_id: ConnectionId,
    #[serde(rename = "iceCandidate", default)]
    pub ice_candidate: Value,
}

/// Events sent by clients
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "kebab-case")]
pub enum ClientEvent {
    Join(JoinRoom),
    /// Leave every room the connection belongs to
    Leave,
    RelaySdp(RelaySessionDescription),
    RelayIce(RelayIceCandidate),
    ToggleVideo(bool),
    ShareRooms,
}

impl FromStr for ClientEvent {
    type Err = serde_json::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        serde_json::from_str(s)
    }
}

/// Events sent to clients
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "kebab-case")]
pub enum ServerEvent {
    /// Your own connection id
    Connected {
        #[serde(rename = "peerID")]
        peer_id: ConnectionId,
    },
    /// Set up a peer connection towards `peer_id`
    AddPeer {
        #[serde(rename = "peerID")]
        peer_id: ConnectionId,
        #[serde(rename = "peerUserID")]
        peer_user_id: UserId,
        #[serde(rename = "createOffer")]
        create_offer: bool,
    },
    /// Tear down the peer connection towards `peer_id`
    RemovePeer {
        #[serde(rename = "peerID")]
        peer_id: ConnectionId,
    },
    SessionDescription {
        #[serde(rename = "peerID")]
        peer_id: ConnectionId,
        #[serde(rename = "sessionDescription")]
        session_description: Value,
    },
    IceCandidate {
        #[serde(rename = "peerID")]
        peer_id: ConnectionId,
        #[serde(rename = "iceCandidate")]
        ice_candidate: Value,
    },
    /// Every room that currently has members
    ShareRooms(Vec<RoomId>),
    /// `(sender, enabled)`
    ToggleVideo(ConnectionId, bool),
}

impl ServerEvent {
    /// Encode as a JSON text frame
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

impl FromStr for ServerEvent {
    type Err = serde_json::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        serde_json::from_str(s)
    }
}
