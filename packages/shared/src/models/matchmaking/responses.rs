use serde::{Deserialize, Serialize};

use super::MatchQuality;

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct MatchResult {
    pub matched: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub partner_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub room_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub compatibility_score: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub quality: Option<MatchQuality>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

impl MatchResult {
    pub fn matched(
        partner_id: String,
        room_id: String,
        compatibility_score: f64,
        quality: MatchQuality,
    ) -> Self {
        MatchResult {
            matched: true,
            partner_id: Some(partner_id),
            room_id: Some(room_id),
            compatibility_score: Some(compatibility_score),
            quality: Some(quality),
            reason: None,
        }
    }

    pub fn no_candidates() -> Self {
        MatchResult {
            matched: false,
            partner_id: None,
            room_id: None,
            compatibility_score: None,
            quality: None,
            reason: Some("no_candidates_available".to_string()),
        }
    }
}
