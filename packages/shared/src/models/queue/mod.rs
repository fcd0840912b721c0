pub mod requests;
pub mod responses;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A user waiting in the plain queue. Each record corresponds to a DynamoDB
/// item partitioned by pool key ("global" or "tag#<interest>").
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct WaitingEntry {
    pub pool_key: String,
    pub member_id: String,
    pub enqueued_at: DateTime<Utc>,
}

impl WaitingEntry {
    pub fn global(user_id: &str) -> Self {
        WaitingEntry {
            pool_key: pool_keys::GLOBAL.to_string(),
            member_id: user_id.to_string(),
            enqueued_at: Utc::now(),
        }
    }

    pub fn for_tag(user_id: &str, tag: &str) -> Self {
        WaitingEntry {
            pool_key: pool_keys::tag(tag),
            member_id: user_id.to_string(),
            enqueued_at: Utc::now(),
        }
    }
}

/// Short-lived "you were matched" record left for the popped side of a pair.
/// `expires_at` doubles as the DynamoDB TTL attribute and as a read-side
/// filter, since DynamoDB expires items lazily.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct MatchNotice {
    pub user_id: String,
    pub room_id: String,
    pub expires_at: i64,
}

/// Pool key naming for the single waiting-pool table.
pub mod pool_keys {
    pub const GLOBAL: &str = "global";

    pub fn tag(tag: &str) -> String {
        format!("tag#{}", tag)
    }

    pub fn notice(user_id: &str) -> String {
        format!("notice#{}", user_id)
    }

    pub fn tag_index(user_id: &str) -> String {
        format!("tags#{}", user_id)
    }
}
