pub mod requests;
pub mod responses;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A row in the compatibility waiting queue. Richer than the plain-queue
/// `WaitingEntry`: it carries the signals the scorer needs. Once matched,
/// `matched_with`/`room_id` are set so a stale row can never be paired twice.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct MatchQueueEntry {
    pub user_id: String,
    pub mode: String,
    pub interests: Vec<String>,
    pub comfort_level: i32,
    pub vibe_score: i32,
    pub waiting_since: DateTime<Utc>,
    // Kept absent (not null) while waiting so that DynamoDB
    // attribute_not_exists() conditions can see an unmatched row.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub matched_with: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub room_id: Option<String>,
}

impl MatchQueueEntry {
    pub fn new(
        user_id: &str,
        mode: &str,
        interests: Vec<String>,
        comfort_level: i32,
        vibe_score: i32,
    ) -> Self {
        MatchQueueEntry {
            user_id: user_id.to_string(),
            mode: mode.to_string(),
            interests,
            comfort_level,
            vibe_score,
            waiting_since: Utc::now(),
            matched_with: None,
            room_id: None,
        }
    }

    pub fn is_waiting(&self) -> bool {
        self.matched_with.is_none()
    }
}

/// Transient scoring input, computed per match attempt and never persisted.
#[derive(Debug, Clone)]
pub struct MatchCandidate {
    pub user_id: String,
    pub similarity_score: f64,
    pub interest_overlap_count: usize,
    pub vibe_score: i32,
    pub waiting_since: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchQuality {
    Excellent,
    Good,
    Fair,
    Random,
}

impl MatchQuality {
    /// Tier boundaries over the blended score in [0, 1].
    pub fn from_score(score: f64) -> Self {
        if score >= 0.75 {
            MatchQuality::Excellent
        } else if score >= 0.5 {
            MatchQuality::Good
        } else if score >= 0.25 {
            MatchQuality::Fair
        } else {
            MatchQuality::Random
        }
    }
}

/// One row of a user's match history, the input to vibe scoring.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct MatchHistoryEvent {
    pub user_id: String,
    pub kind: MatchEventKind,
    pub occurred_at: DateTime<Utc>,
}

impl MatchHistoryEvent {
    pub fn new(user_id: &str, kind: MatchEventKind) -> Self {
        MatchHistoryEvent {
            user_id: user_id.to_string(),
            kind,
            occurred_at: Utc::now(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchEventKind {
    Matched,
    Liked,
    LongMatch,
    MessageRich,
    Skipped,
    Reported,
}
