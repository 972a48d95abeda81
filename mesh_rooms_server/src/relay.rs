//! Forwarding of handshake payloads between two connections
//!
//! Payloads are never inspected. Whether the recipient still exists is
//! decided at delivery time.

use crate::effect::Effect;
use crate::protocol::{ConnectionId, ServerEvent};
use serde_json::Value;

pub fn relay_session_description(
    from: ConnectionId,
    to: ConnectionId,
    session_description: Value,
) -> Effect {
    Effect::to(
        to,
        ServerEvent::SessionDescription {
            peer_id: from,
            session_description,
        },
    )
}

pub fn relay_ice_candidate(from: ConnectionId, to: ConnectionId, ice_candidate: Value) -> Effect {
    Effect::to(
        to,
        ServerEvent::IceCandidate {
            peer_id: from,
            ice_candidate,
        },
    )
}
