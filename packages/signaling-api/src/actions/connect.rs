use lambda_runtime::Error;
use tracing::{error, info};

use crate::{state::AppState, WebSocketEvent, WebSocketResponse};

/// $connect: registers the connection under its room so later publishes can
/// fan out to it. Room and user come in as query parameters since WebSocket
/// connects carry no body.
pub async fn handle(
    connection_id: &str,
    event: &WebSocketEvent,
    state: AppState,
) -> Result<WebSocketResponse, Error> {
    let Some(query_params) = &event.query_string_parameters else {
        return Ok(WebSocketResponse::error(
            400,
            "room_id and user_id query parameters are required",
        ));
    };

    let room_id = query_params.get("room_id").and_then(|v| v.as_str());
    let user_id = query_params.get("user_id").and_then(|v| v.as_str());
    let (Some(room_id), Some(user_id)) = (room_id, user_id) else {
        return Ok(WebSocketResponse::error(
            400,
            "room_id and user_id query parameters are required",
        ));
    };

    if let Err(e) = state
        .connections
        .store_connection(room_id, user_id, connection_id)
        .await
    {
        error!("Failed to store connection {}: {}", connection_id, e);
        return Ok(WebSocketResponse::error(500, "Failed to store connection"));
    }

    info!(
        "Signaling connection {} established for user {} in room {}",
        connection_id, user_id, room_id
    );
    Ok(WebSocketResponse::ok())
}
