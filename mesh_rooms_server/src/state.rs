//! Connection hub for the signaling relay
//!
//! This module tracks open connections and their outbound queues, routes
//! client events to the coordinator and delivers the resulting effects.

use crate::coordinator::Coordinator;
use crate::effect::{Effect, Target};
use crate::error::SignalingError;
use crate::protocol::{ClientEvent, ConnectionId, RoomId, ServerEvent};
use crate::relay;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

/// Outbound queue of one connection
pub type EventSender = mpsc::UnboundedSender<ServerEvent>;

#[derive(Default)]
struct InnerState {
    coordinator: Coordinator,
    /// Map of connection ID -> outbound queue
    connections: HashMap<ConnectionId, EventSender>,
}

impl InnerState {
    /// Queue an event for a connection
    fn queue_event(&self, connection: ConnectionId, event: ServerEvent) -> Result<(), SignalingError> {
        let sender = self
            .connections
            .get(&connection)
            .ok_or(SignalingError::UnknownPeer)?;
        sender
            .send(event)
            .map_err(|err| SignalingError::Send(err.to_string()))
    }

    fn deliver(&self, effects: Vec<Effect>) {
        for Effect { target, event } in effects {
            match target {
                Target::Connection(connection) => {
                    if let Err(err) = self.queue_event(connection, event) {
                        debug!(%connection, "dropping event: {err}");
                    }
                }
                Target::All | Target::AllExcept(_) => {
                    for (connection, sender) in &self.connections {
                        if target.includes(*connection) && sender.send(event.clone()).is_err() {
                            debug!(%connection, "dropping broadcast for closed connection");
                        }
                    }
                }
            }
        }
    }
}

/// Shared server state, cheap to clone
#[derive(Default, Clone)]
pub struct ServerState {
    inner: Arc<Mutex<InnerState>>,
}

impl ServerState {
    /// Create an empty server state
    pub fn new() -> Self {
        Self::default()
    }

    // Every step computes and delivers under this lock, so membership
    // changes never interleave and each connection sees events in order.
    fn lock(&self) -> MutexGuard<'_, InnerState> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Register a new connection and announce the current rooms
    pub fn connect(&self, sender: EventSender) -> ConnectionId {
        let connection = ConnectionId::new();
        let mut state = self.lock();
        state.connections.insert(connection, sender);
        info!(%connection, connections = state.connections.len(), "connection opened");

        let share = state.coordinator.share_rooms();
        state.deliver(vec![
            Effect::to(connection, ServerEvent::Connected { peer_id: connection }),
            share,
        ]);
        connection
    }

    /// Handle one event received from a connection
    pub fn dispatch(&self, connection: ConnectionId, event: ClientEvent) {
        let mut state = self.lock();
        if !state.connections.contains_key(&connection) {
            warn!(%connection, "ignoring event from closed connection");
            return;
        }

        let effects = match event {
            ClientEvent::Join(join) => state.coordinator.join(join.room, connection, join.user_id),
            ClientEvent::Leave => state.coordinator.leave_all(connection),
            ClientEvent::RelaySdp(relay) => {
                debug!(from = %connection, to = %relay.peer_id, "relaying session description");
                vec![relay::relay_session_description(
                    connection,
                    relay.peer_id,
                    relay.session_description,
                )]
            }
            ClientEvent::RelayIce(relay) => {
                debug!(from = %connection, to = %relay.peer_id, "relaying ice candidate");
                vec![relay::relay_ice_candidate(
                    connection,
                    relay.peer_id,
                    relay.ice_candidate,
                )]
            }
            ClientEvent::ToggleVideo(enabled) => {
                vec![state.coordinator.toggle_video(connection, enabled)]
            }
            ClientEvent::ShareRooms => vec![state.coordinator.share_rooms()],
        };
        state.deliver(effects);
    }

    /// Drop a connection and every membership it held
    pub fn disconnect(&self, connection: ConnectionId) {
        let mut state = self.lock();
        if state.connections.remove(&connection).is_none() {
            debug!(%connection, "connection already closed");
        }
        let effects = state.coordinator.disconnect(connection);
        state.deliver(effects);
        info!(%connection, connections = state.connections.len(), "connection closed");
    }

    pub fn connection_count(&self) -> usize {
        self.lock().connections.len()
    }

    pub fn active_rooms(&self) -> Vec<RoomId> {
        self.lock().coordinator.registry().active_room_ids()
    }

    pub fn rooms_of(&self, connection: ConnectionId) -> Vec<RoomId> {
        self.lock().coordinator.rooms_of(connection)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::{JoinRoom, RelaySessionDescription, UserId};
    use serde_json::json;
    use tokio::sync::mpsc::UnboundedReceiver;

    fn open(state: &ServerState) -> (ConnectionId, UnboundedReceiver<ServerEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (state.connect(tx), rx)
    }

    fn drain(rx: &mut UnboundedReceiver<ServerEvent>) -> Vec<ServerEvent> {
        let mut events = Vec::new();
        while let Ok(event) = rx.try_recv() {
            events.push(event);
        }
        events
    }

    fn join(state: &ServerState, connection: ConnectionId, room: &str, user: &str) {
        state.dispatch(
            connection,
            ClientEvent::Join(JoinRoom {
                room: RoomId::from(room),
                user_id: UserId::from(user),
            }),
        );
    }

    #[test]
    fn connect_assigns_id_then_shares_rooms() {
        let state = ServerState::new();
        let (a, mut rx) = open(&state);

        assert_eq!(
            drain(&mut rx),
            vec![
                ServerEvent::Connected { peer_id: a },
                ServerEvent::ShareRooms(Vec::new()),
            ]
        );
        assert_eq!(state.connection_count(), 1);
    }

    #[test]
    fn join_delivers_add_peer_and_room_list() {
        let state = ServerState::new();
        let (a, mut rx_a) = open(&state);
        let (b, mut rx_b) = open(&state);
        join(&state, a, "lobby", "alice");
        drain(&mut rx_a);
        drain(&mut rx_b);

        join(&state, b, "lobby", "bob");

        assert_eq!(
            drain(&mut rx_a),
            vec![
                ServerEvent::AddPeer {
                    peer_id: b,
                    peer_user_id: UserId::from("bob"),
                    create_offer: false,
                },
                ServerEvent::ShareRooms(vec![RoomId::from("lobby")]),
            ]
        );
        assert_eq!(
            drain(&mut rx_b),
            vec![
                ServerEvent::AddPeer {
                    peer_id: a,
                    peer_user_id: UserId::from("alice"),
                    create_offer: true,
                },
                ServerEvent::ShareRooms(vec![RoomId::from("lobby")]),
            ]
        );
    }

    #[test]
    fn relay_to_closed_connection_is_dropped() {
        let state = ServerState::new();
        let (a, mut rx_a) = open(&state);
        let (b, _rx_b) = open(&state);
        state.disconnect(b);
        drain(&mut rx_a);

        state.dispatch(
            a,
            ClientEvent::RelaySdp(RelaySessionDescription {
                peer_id: b,
                session_description: json!({"type": "offer"}),
            }),
        );
        assert!(drain(&mut rx_a).is_empty());
    }

    #[test]
    fn disconnect_notifies_remaining_members() {
        let state = ServerState::new();
        let (a, mut rx_a) = open(&state);
        let (b, _rx_b) = open(&state);
        join(&state, a, "lobby", "alice");
        join(&state, b, "lobby", "bob");
        drain(&mut rx_a);

        state.disconnect(b);

        assert_eq!(
            drain(&mut rx_a),
            vec![
                ServerEvent::RemovePeer { peer_id: b },
                ServerEvent::ShareRooms(vec![RoomId::from("lobby")]),
            ]
        );
        assert!(state.rooms_of(b).is_empty());
        assert_eq!(state.connection_count(), 1);
    }

    #[test]
    fn toggle_video_reaches_everyone_but_sender() {
        let state = ServerState::new();
        let (a, mut rx_a) = open(&state);
        let (_b, mut rx_b) = open(&state);
        drain(&mut rx_a);
        drain(&mut rx_b);

        state.dispatch(a, ClientEvent::ToggleVideo(false));

        assert!(drain(&mut rx_a).is_empty());
        assert_eq!(drain(&mut rx_b), vec![ServerEvent::ToggleVideo(a, false)]);
    }

    #[test]
    fn events_from_closed_connection_are_ignored() {
        let state = ServerState::new();
        let (a, _rx) = open(&state);
        state.disconnect(a);

        join(&state, a, "lobby", "ghost");
        assert!(state.active_rooms().is_empty());
    }

    #[test]
    fn closed_receiver_does_not_break_delivery() {
        let state = ServerState::new();
        let (_a, rx_a) = open(&state);
        let (b, mut rx_b) = open(&state);
        drop(rx_a);
        drain(&mut rx_b);

        state.dispatch(b, ClientEvent::ShareRooms);
        assert_eq!(drain(&mut rx_b), vec![ServerEvent::ShareRooms(Vec::new())]);
    }
}
