//! Outbound notifications produced by the core
//!
//! Core operations never talk to connections directly. They return the
//! events to send and the hub delivers them afterwards.

use crate::protocol::{ConnectionId, ServerEvent};

/// Who receives an event
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Target {
    Connection(ConnectionId),
    All,
    AllExcept(ConnectionId),
}

impl Target {
    pub fn includes(&self, connection: ConnectionId) -> bool {
        match *self {
            Target::Connection(id) => id == connection,
            Target::All => true,
            Target::AllExcept(id) => id != connection,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Effect {
    pub target: Target,
    pub event: ServerEvent,
}

impl Effect {
    pub fn to(connection: ConnectionId, event: ServerEvent) -> Self {
        Self {
            target: Target::Connection(connection),
            event,
        }
    }

    pub fn broadcast(event: ServerEvent) -> Self {
        Self {
            target: Target::All,
            event,
        }
    }

    pub fn broadcast_except(sender: ConnectionId, event: ServerEvent) -> Self {
        Self {
            target: Target::AllExcept(sender),
            event,
        }
    }
}
