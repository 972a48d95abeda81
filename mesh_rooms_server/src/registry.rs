//! Room membership registry
//!
//! Maps each room to its members and their user ids. A room exists only
//! while it has at least one member.

use crate::error::MembershipError;
use crate::protocol::{ConnectionId, RoomId, UserId};
use std::collections::{BTreeMap, HashMap};

/// Members of one room, keyed by connection
pub type Members = BTreeMap<ConnectionId, UserId>;

#[derive(Debug, Default, Clone)]
pub struct RoomRegistry {
    rooms: HashMap<RoomId, Members>,
}

impl RoomRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a member, creating the room if needed.
    ///
    /// A connection already present keeps its original user id.
    pub fn add_member(
        &mut self,
        room: &RoomId,
        connection: ConnectionId,
        user_id: UserId,
    ) -> Result<(), MembershipError> {
        let members = self.rooms.entry(room.clone()).or_default();
        if members.contains_key(&connection) {
            return Err(MembershipError::DuplicateJoin {
                room: room.to_string(),
                connection: connection.to_string(),
            });
        }
        members.insert(connection, user_id);
        Ok(())
    }

    /// Remove a member, deleting the room once it is empty
    pub fn remove_member(
        &mut self,
        room: &RoomId,
        connection: ConnectionId,
    ) -> Result<(), MembershipError> {
        let Some(members) = self.rooms.get_mut(room) else {
            return Err(stale(room, connection));
        };
        let removed = members.remove(&connection).is_some();
        if members.is_empty() {
            self.rooms.remove(room);
        }
        if removed {
            Ok(())
        } else {
            Err(stale(room, connection))
        }
    }

    /// Snapshot of a room's members (empty if the room does not exist)
    pub fn members(&self, room: &RoomId) -> Members {
        self.rooms.get(room).cloned().unwrap_or_default()
    }

    pub fn is_member(&self, room: &RoomId, connection: ConnectionId) -> bool {
        self.rooms
            .get(room)
            .is_some_and(|members| members.contains_key(&connection))
    }

    pub fn user_id_for(&self, room: &RoomId, connection: ConnectionId) -> Option<&UserId> {
        self.rooms.get(room)?.get(&connection)
    }

    /// All rooms with at least one member, sorted by name
    pub fn active_room_ids(&self) -> Vec<RoomId> {
        let mut ids: Vec<RoomId> = self.rooms.keys().cloned().collect();
        ids.sort();
        ids
    }

    pub fn is_empty(&self) -> bool {
        self.rooms.is_empty()
    }
}

fn stale(room: &RoomId, connection: ConnectionId) -> MembershipError {
    MembershipError::StaleLeave {
        room: room.to_string(),
        connection: connection.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn room(name: &str) -> RoomId {
        RoomId::from(name)
    }

    #[test]
    fn first_member_creates_room() {
        let mut registry = RoomRegistry::new();
        let a = ConnectionId::new();
        registry.add_member(&room("lobby"), a, UserId::from("alice")).unwrap();

        assert_eq!(registry.active_room_ids(), vec![room("lobby")]);
        assert_eq!(registry.user_id_for(&room("lobby"), a), Some(&UserId::from("alice")));
    }

    #[test]
    fn duplicate_add_keeps_original_user() {
        let mut registry = RoomRegistry::new();
        let a = ConnectionId::new();
        registry.add_member(&room("lobby"), a, UserId::from("alice")).unwrap();

        let err = registry.add_member(&room("lobby"), a, UserId::from("mallory")).unwrap_err();
        assert!(matches!(err, MembershipError::DuplicateJoin { .. }));
        assert_eq!(registry.members(&room("lobby")).len(), 1);
        assert_eq!(registry.user_id_for(&room("lobby"), a), Some(&UserId::from("alice")));
    }

    #[test]
    fn last_member_leaving_deletes_room() {
        let mut registry = RoomRegistry::new();
        let (a, b) = (ConnectionId::new(), ConnectionId::new());
        registry.add_member(&room("lobby"), a, UserId::default()).unwrap();
        registry.add_member(&room("lobby"), b, UserId::default()).unwrap();

        registry.remove_member(&room("lobby"), a).unwrap();
        assert_eq!(registry.active_room_ids(), vec![room("lobby")]);

        registry.remove_member(&room("lobby"), b).unwrap();
        assert!(registry.active_room_ids().is_empty());
        assert!(registry.is_empty());
    }

    #[test]
    fn removing_non_member_is_stale_and_harmless() {
        let mut registry = RoomRegistry::new();
        let (a, b) = (ConnectionId::new(), ConnectionId::new());
        registry.add_member(&room("lobby"), a, UserId::default()).unwrap();

        let err = registry.remove_member(&room("lobby"), b).unwrap_err();
        assert!(matches!(err, MembershipError::StaleLeave { .. }));
        assert!(registry.is_member(&room("lobby"), a));

        let err = registry.remove_member(&room("nowhere"), a).unwrap_err();
        assert!(matches!(err, MembershipError::StaleLeave { .. }));
        assert_eq!(registry.active_room_ids(), vec![room("lobby")]);
    }

    #[test]
    fn members_of_unknown_room_is_empty() {
        let registry = RoomRegistry::new();
        assert!(registry.members(&room("nowhere")).is_empty());
        assert!(registry.user_id_for(&room("nowhere"), ConnectionId::new()).is_none());
    }

    #[test]
    fn registries_are_independent() {
        let mut first = RoomRegistry::new();
        let second = RoomRegistry::new();
        first.add_member(&room("lobby"), ConnectionId::new(), UserId::default()).unwrap();
        assert!(second.is_empty());
    }
}
