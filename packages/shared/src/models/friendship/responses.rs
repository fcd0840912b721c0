use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SaveStatus {
    Pending,
    Mutual,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RegisterSaveResponse {
    pub status: SaveStatus,
}
