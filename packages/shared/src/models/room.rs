use chrono::{DateTime, Utc};
use rand::Rng;
use serde::{Deserialize, Serialize};

/// A conversation room. Created once per successful match and never deleted
/// here; an external reaper can expire rooms whose participants stop
/// heartbeating.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Room {
    pub id: String,
    pub created_at: DateTime<Utc>,
}

impl Room {
    pub fn new(id: &str) -> Self {
        Room {
            id: id.to_string(),
            created_at: Utc::now(),
        }
    }

    /// Generates a short human-readable room code, e.g. "kv7m2xna".
    /// The alphabet omits characters that are easy to misread (0/o, 1/l/i).
    pub fn generate_code() -> String {
        const ALPHABET: &[u8] = b"abcdefghjkmnpqrstuvwxyz23456789";
        let mut rng = rand::thread_rng();
        (0..8)
            .map(|_| ALPHABET[rng.gen_range(0..ALPHABET.len())] as char)
            .collect()
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RoomParticipant {
    pub room_id: String,
    pub user_id: String,
    pub joined_at: DateTime<Utc>,
    pub last_seen_at: DateTime<Utc>,
}

impl RoomParticipant {
    pub fn new(room_id: &str, user_id: &str) -> Self {
        let now = Utc::now();
        RoomParticipant {
            room_id: room_id.to_string(),
            user_id: user_id.to_string(),
            joined_at: now,
            last_seen_at: now,
        }
    }
}
