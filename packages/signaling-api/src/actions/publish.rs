use lambda_runtime::Error;
use serde::Deserialize;
use tracing::{debug, error};

use shared::models::signaling::SignalEnvelope;

use crate::{state::AppState, WebSocketEvent, WebSocketResponse};

/// Wire shape of a $default frame: the target room plus the envelope to relay.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PublishFrame {
    pub room_id: String,
    pub envelope: SignalEnvelope,
}

/// $default: relays a signaling envelope to every other connection in the
/// room. The relay does not inspect envelope contents beyond the sender id
/// used for skip-sender fan-out.
pub async fn handle(
    connection_id: &str,
    event: &WebSocketEvent,
    state: AppState,
) -> Result<WebSocketResponse, Error> {
    let Some(body) = &event.body else {
        return Ok(WebSocketResponse::error(400, "No message body"));
    };

    let frame: PublishFrame = match serde_json::from_str(body) {
        Ok(frame) => frame,
        Err(e) => {
            debug!("Rejected malformed frame from {}: {}", connection_id, e);
            return Ok(WebSocketResponse::error(400, "Invalid signal frame"));
        }
    };

    if let Err(e) = state.publisher.publish(&frame.room_id, &frame.envelope).await {
        error!(
            "Failed to relay {:?} envelope to room {}: {}",
            frame.envelope, frame.room_id, e
        );
        return Ok(WebSocketResponse::error(500, "Failed to relay signal"));
    }

    debug!(
        "Relayed envelope from {} to room {}",
        frame.envelope.sender_id(),
        frame.room_id
    );
    Ok(WebSocketResponse::ok())
}
