pub mod requests;
pub mod responses;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One user's intent to keep a conversation. Unique per (room, user); the
/// second intent for the same room triggers friendship creation.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SaveIntent {
    pub room_id: String,
    pub user_id: String,
    pub saved_at: DateTime<Utc>,
}

impl SaveIntent {
    pub fn new(room_id: &str, user_id: &str) -> Self {
        SaveIntent {
            room_id: room_id.to_string(),
            user_id: user_id.to_string(),
            saved_at: Utc::now(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FriendshipStatus {
    Active,
}

/// A reciprocal-save record. The pair is stored in canonical order
/// (`user1_id < user2_id`) so both savers write the same key and the upsert
/// stays commutative and idempotent.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Friendship {
    pub user1_id: String,
    pub user2_id: String,
    pub status: FriendshipStatus,
    pub created_at: DateTime<Utc>,
}

impl Friendship {
    pub fn new(user_a: &str, user_b: &str) -> Self {
        let (user1_id, user2_id) = canonical_pair(user_a, user_b);
        Friendship {
            user1_id,
            user2_id,
            status: FriendshipStatus::Active,
            created_at: Utc::now(),
        }
    }

    pub fn pair_key(&self) -> String {
        format!("{}#{}", self.user1_id, self.user2_id)
    }
}

/// Orders a pair of user ids so that the smaller id always comes first.
pub fn canonical_pair(user_a: &str, user_b: &str) -> (String, String) {
    if user_a <= user_b {
        (user_a.to_string(), user_b.to_string())
    } else {
        (user_b.to_string(), user_a.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn canonical_pair_is_order_independent() {
        assert_eq!(canonical_pair("bob", "alice"), canonical_pair("alice", "bob"));
        assert_eq!(
            canonical_pair("bob", "alice"),
            ("alice".to_string(), "bob".to_string())
        );
    }

    #[test]
    fn friendships_from_either_side_share_a_key() {
        let left = Friendship::new("zoe", "abe");
        let right = Friendship::new("abe", "zoe");
        assert_eq!(left.pair_key(), right.pair_key());
        assert_eq!(left.user1_id, "abe");
    }
}
