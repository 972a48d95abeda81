//! Join, leave and disconnect handling
//!
//! The coordinator is the only owner of the room registry. Alongside it, it
//! keeps a reverse index of the rooms each connection belongs to so that a
//! disconnect can find them without scanning every room.
//!
//! Offer roles are decided on join: the newcomer is told to create offers
//! towards every member already present, and those members are told to wait
//! for the newcomer's offer. Each pair therefore has exactly one initiator.

use crate::broadcaster::publish_rooms;
use crate::effect::Effect;
use crate::error::MembershipError;
use crate::protocol::{ConnectionId, RoomId, ServerEvent, UserId};
use crate::registry::RoomRegistry;
use std::collections::{BTreeSet, HashMap};
use tracing::{debug, info, warn};

#[derive(Debug, Default)]
pub struct Coordinator {
    registry: RoomRegistry,
    /// Connection -> rooms it is a member of
    memberships: HashMap<ConnectionId, BTreeSet<RoomId>>,
}

impl Coordinator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn registry(&self) -> &RoomRegistry {
        &self.registry
    }

    /// Rooms the connection currently belongs to, sorted by name
    pub fn rooms_of(&self, connection: ConnectionId) -> Vec<RoomId> {
        self.memberships
            .get(&connection)
            .map(|rooms| rooms.iter().cloned().collect())
            .unwrap_or_default()
    }

    /// Add `connection` to `room` and introduce it to the members already there
    pub fn join(&mut self, room: RoomId, connection: ConnectionId, user_id: UserId) -> Vec<Effect> {
        if room.names(connection) {
            // A connection is implicitly in the room named after itself.
            warn!(
                "{}",
                MembershipError::DuplicateJoin {
                    room: room.to_string(),
                    connection: connection.to_string(),
                }
            );
            return Vec::new();
        }

        // Snapshot before inserting so nobody is introduced to itself
        let existing = self.registry.members(&room);

        let mut effects = Vec::with_capacity(existing.len() * 2 + 1);
        for (member, member_user_id) in &existing {
            effects.push(Effect::to(
                *member,
                ServerEvent::AddPeer {
                    peer_id: connection,
                    peer_user_id: user_id.clone(),
                    create_offer: false,
                },
            ));
            effects.push(Effect::to(
                connection,
                ServerEvent::AddPeer {
                    peer_id: *member,
                    peer_user_id: member_user_id.clone(),
                    create_offer: true,
                },
            ));
        }

        if let Err(err) = self.registry.add_member(&room, connection, user_id) {
            warn!("{err}");
            return Vec::new();
        }
        self.memberships
            .entry(connection)
            .or_default()
            .insert(room.clone());

        info!(
            %room,
            %connection,
            members = existing.len() + 1,
            "connection joined room"
        );

        effects.push(publish_rooms(&self.registry));
        effects
    }

    /// Remove `connection` from a single room
    pub fn leave(&mut self, connection: ConnectionId, room: &RoomId) -> Vec<Effect> {
        let mut effects = self.leave_room(connection, room);
        effects.push(publish_rooms(&self.registry));
        effects
    }

    /// Remove `connection` from every room it belongs to
    pub fn leave_all(&mut self, connection: ConnectionId) -> Vec<Effect> {
        let mut effects = Vec::new();
        for room in self.rooms_of(connection) {
            effects.extend(self.leave_room(connection, &room));
        }
        effects.push(publish_rooms(&self.registry));
        effects
    }

    /// Forget a connection that has gone away
    pub fn disconnect(&mut self, connection: ConnectionId) -> Vec<Effect> {
        let rooms = self.rooms_of(connection);
        if !rooms.is_empty() {
            info!(%connection, rooms = rooms.len(), "dropping memberships of closed connection");
        }
        self.leave_all(connection)
    }

    /// Tell every other connection that `connection` switched its video
    pub fn toggle_video(&self, connection: ConnectionId, enabled: bool) -> Effect {
        debug!(%connection, enabled, "video toggled");
        Effect::broadcast_except(connection, ServerEvent::ToggleVideo(connection, enabled))
    }

    pub fn share_rooms(&self) -> Effect {
        publish_rooms(&self.registry)
    }

    fn leave_room(&mut self, connection: ConnectionId, room: &RoomId) -> Vec<Effect> {
        if room.names(connection) {
            return Vec::new();
        }

        let members = self.registry.members(room);
        if let Err(err) = self.registry.remove_member(room, connection) {
            warn!("{err}");
            return Vec::new();
        }

        if let Some(rooms) = self.memberships.get_mut(&connection) {
            rooms.remove(room);
            if rooms.is_empty() {
                self.memberships.remove(&connection);
            }
        }

        let mut effects = Vec::new();
        for member in members.keys().filter(|member| **member != connection) {
            effects.push(Effect::to(
                *member,
                ServerEvent::RemovePeer {
                    peer_id: connection,
                },
            ));
            effects.push(Effect::to(
                connection,
                ServerEvent::RemovePeer { peer_id: *member },
            ));
        }

        info!(%room, %connection, remaining = members.len() - 1, "connection left room");
        effects
    }
}
