//! Room-based WebRTC signaling relay
//!
//! Clients connect over WebSocket, join named rooms and are introduced to
//! every other member so they can build a full mesh of peer connections.
//! The relay only brokers metadata: it forwards session descriptions and
//! ICE candidates between two connections and never sees any media.
//!
//! # Protocol
//!
//! Every text frame carries one JSON event:
//!
//! ```json
//! {"event": "<name>", "data": <payload>}
//! ```
//!
//! ## Client → server
//!
//! - `join` `{"room": "<room>", "userID": <any>}` - Join a room
//! - `leave` - Leave every joined room
//! - `relay-sdp` `{"peerID": "<uuid>", "sessionDescription": <any>}`
//! - `relay-ice` `{"peerID": "<uuid>", "iceCandidate": <any>}`
//! - `toggle-video` `<bool>`
//! - `share-rooms` - Ask for the current room list
//!
//! ## Server → client
//!
//! - `connected` `{"peerID": "<uuid>"}` - Your connection id
//! - `add-peer` `{"peerID", "peerUserID", "createOffer"}` - Connect to a peer;
//!   the side with `createOffer: true` sends the offer
//! - `remove-peer` `{"peerID"}` - Tear down a peer connection
//! - `session-description` / `ice-candidate` - Relayed from `peerID`
//! - `share-rooms` `["<room>", ...]` - Rooms that have members
//! - `toggle-video` `["<uuid>", <bool>]`
//!
//! # Example
//!
//! ```bash
//! PORT=5000 ALLOWED_ORIGIN=https://meet.example.com mesh-rooms-signaling
//! ```

#![forbid(unsafe_code)]

pub mod broadcaster;
pub mod config;
pub mod coordinator;
pub mod effect;
pub mod error;
pub mod handler;
pub mod protocol;
pub mod registry;
pub mod relay;
pub mod state;

pub use config::Config;
pub use coordinator::Coordinator;
pub use effect::{Effect, Target};
pub use error::{ConfigError, MembershipError, SignalingError};
pub use handler::{handle_connection, serve};
pub use protocol::{ClientEvent, ConnectionId, RoomId, ServerEvent, UserId};
pub use registry::RoomRegistry;
pub use state::ServerState;
