//! Per-room, append-only message history.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;

use super::msg::Message;

type RoomLog = Arc<RwLock<Vec<Message>>>;

/// In-memory history for every room the process has seen.
///
/// The outer map is only locked long enough to find or create a room's log;
/// appends and reads then contend on that room's lock alone.
#[derive(Default)]
pub struct MessageStore {
    rooms: RwLock<HashMap<String, RoomLog>>,
}

impl MessageStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn log(&self, room_id: &str) -> RoomLog {
        if let Some(log) = self.rooms.read().get(room_id) {
            return Arc::clone(log);
        }
        Arc::clone(self.rooms.write().entry(room_id.to_owned()).or_default())
    }

    /// Creates the room's (empty) history if it does not exist yet.
    pub fn ensure_room(&self, room_id: &str) {
        let _ = self.log(room_id);
    }

    pub fn append(&self, room_id: &str, message: Message) {
        self.log(room_id).write().push(message);
    }

    /// Everything appended to `room_id` so far, oldest first. Unknown rooms are empty.
    pub fn history(&self, room_id: &str) -> Vec<Message> {
        let Some(log) = self.rooms.read().get(room_id).cloned() else {
            return Vec::new();
        };
        log.read().clone()
    }

    pub fn room_count(&self) -> usize {
        self.rooms.read().len()
    }
}
