use serde::{Deserialize, Serialize};

/// Wire shape of every message carried by the signaling relay. The envelopes
/// exist only on the wire; nothing here is persisted.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(
    tag = "type",
    rename_all = "SCREAMING_SNAKE_CASE",
    rename_all_fields = "camelCase"
)]
pub enum SignalEnvelope {
    Hello {
        sender_id: String,
    },
    HelloBack {
        sender_id: String,
    },
    Offer {
        sender_id: String,
        data: String,
    },
    Answer {
        sender_id: String,
        data: String,
    },
    IceCandidate {
        sender_id: String,
        data: String,
    },
    Reveal {
        sender_id: String,
        data: RevealPayload,
    },
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct RevealPayload {
    pub message: String,
}

impl SignalEnvelope {
    pub fn sender_id(&self) -> &str {
        match self {
            SignalEnvelope::Hello { sender_id }
            | SignalEnvelope::HelloBack { sender_id }
            | SignalEnvelope::Offer { sender_id, .. }
            | SignalEnvelope::Answer { sender_id, .. }
            | SignalEnvelope::IceCandidate { sender_id, .. }
            | SignalEnvelope::Reveal { sender_id, .. } => sender_id,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn envelope_serializes_with_wire_tags() {
        let envelope = SignalEnvelope::IceCandidate {
            sender_id: "user-a".to_string(),
            data: "candidate:0 1 UDP ...".to_string(),
        };

        let json = serde_json::to_value(&envelope).unwrap();
        assert_eq!(json["type"], "ICE_CANDIDATE");
        assert_eq!(json["senderId"], "user-a");
    }

    #[test]
    fn envelope_round_trips_through_json() {
        let envelope = SignalEnvelope::Reveal {
            sender_id: "user-b".to_string(),
            data: RevealPayload {
                message: "both of you saved this chat".to_string(),
            },
        };

        let json = serde_json::to_string(&envelope).unwrap();
        let parsed: SignalEnvelope = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, envelope);
    }
}
