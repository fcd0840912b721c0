use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct EnqueueRequest {
    pub mode: String,
    #[serde(default)]
    pub interests: Vec<String>,
    #[serde(default = "default_comfort_level")]
    pub comfort_level: i32,
}

fn default_comfort_level() -> i32 {
    50
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct FindMatchRequest {
    pub mode: String,
}
