use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum QueueStatus {
    Matched,
    Waiting,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct FindMatchResponse {
    pub matched: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub room_id: Option<String>,
    pub status: QueueStatus,
}

impl FindMatchResponse {
    pub fn matched(room_id: String) -> Self {
        FindMatchResponse {
            matched: true,
            room_id: Some(room_id),
            status: QueueStatus::Matched,
        }
    }

    pub fn waiting() -> Self {
        FindMatchResponse {
            matched: false,
            room_id: None,
            status: QueueStatus::Waiting,
        }
    }
}
