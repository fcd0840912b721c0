use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct JoinQueueRequest {
    #[serde(default)]
    pub interest_tags: Vec<String>,
}
