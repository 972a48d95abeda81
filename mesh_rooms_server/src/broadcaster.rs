//! Room list publication

use crate::effect::Effect;
use crate::protocol::ServerEvent;
use crate::registry::RoomRegistry;

/// Send the full list of non-empty rooms to every connection
pub fn publish_rooms(registry: &RoomRegistry) -> Effect {
    Effect::broadcast(ServerEvent::ShareRooms(registry.active_room_ids()))
}
