use std::sync::Arc;

use dashmap::DashMap;
use rand::Rng;
use tokio::sync::Mutex;

use crate::state::room::Room;

/// Characters room codes are drawn from.
const CODE_CHARSET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";
/// Length of a room code.
const CODE_LENGTH: usize = 4;

/// Process-wide map of room code → room.
///
/// Each room sits behind its own `tokio::sync::Mutex`, so every action on a
/// given room (player message or fired timer) runs to completion before the
/// next one is processed. Timer tasks hold the code, not a room reference,
/// and re-resolve it here at fire time.
#[derive(Default)]
pub struct RoomRegistry {
    rooms: DashMap<String, Arc<Mutex<Room>>>,
}

impl RoomRegistry {
    /// Allocate a fresh, collision-checked room code.
    pub fn allocate_code(&self) -> String {
        loop {
            let code = generate_code();
            if !self.rooms.contains_key(&code) {
                return code;
            }
        }
    }

    /// Register a room under its code.
    pub fn insert(&self, room: Room) {
        let code = room.code.clone();
        self.rooms.insert(code, Arc::new(Mutex::new(room)));
    }

    /// Look a room up by code.
    pub fn get(&self, code: &str) -> Option<Arc<Mutex<Room>>> {
        self.rooms.get(code).map(|entry| entry.value().clone())
    }

    /// Delete the room registered under `code`, if any.
    pub fn remove(&self, code: &str) {
        self.rooms.remove(code);
    }

    /// Number of registered rooms.
    pub fn len(&self) -> usize {
        self.rooms.len()
    }

    /// Whether no rooms are registered.
    pub fn is_empty(&self) -> bool {
        self.rooms.is_empty()
    }
}

/// Generate a random 4-character uppercase alphanumeric code.
fn generate_code() -> String {
    let mut rng = rand::rng();
    (0..CODE_LENGTH)
        .map(|_| CODE_CHARSET[rng.random_range(0..CODE_CHARSET.len())] as char)
        .collect()
}
