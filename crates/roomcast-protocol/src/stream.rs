//! Text carried on the push stream besides room messages.

use roomcast_core::RoomId;

/// First line every subscriber receives after attaching.
pub fn welcome_line(room_id: &RoomId) -> String {
    format!("Welcome to the chat room {room_id}!")
}
