use lambda_runtime::Error;
use tracing::{error, info};

use crate::{state::AppState, WebSocketResponse};

/// $disconnect: drops the connection from the registry. Removal failure is
/// logged but not surfaced; a dead connection will also fail (and be skipped)
/// at publish time.
pub async fn handle(connection_id: &str, state: AppState) -> Result<WebSocketResponse, Error> {
    if let Err(e) = state.connections.remove_connection_by_id(connection_id).await {
        error!("Failed to remove connection {}: {}", connection_id, e);
    } else {
        info!("Signaling connection {} removed", connection_id);
    }

    Ok(WebSocketResponse::ok())
}
