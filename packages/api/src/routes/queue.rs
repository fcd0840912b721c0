use axum::{extract::State, http::StatusCode, routing::post, Json, Router};

use crate::{error::ApiError, middleware::auth::AuthenticatedUser, state::AppState};
use shared::models::queue::requests::JoinQueueRequest;
use shared::models::queue::responses::FindMatchResponse;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/queue/join", post(join_queue))
        .route("/queue/leave", post(leave_queue))
}

/// Polls the plain queue. Either pops a waiting partner (matched, room id),
/// consumes an outstanding match notice, or enqueues the caller.
async fn join_queue(
    State(state): State<AppState>,
    authenticated_user: AuthenticatedUser,
    Json(payload): Json<JoinQueueRequest>,
) -> Result<Json<FindMatchResponse>, ApiError> {
    let response = state
        .queue_service
        .find_match(&authenticated_user.user_id, &payload.interest_tags)
        .await?;

    Ok(Json(response))
}

async fn leave_queue(
    State(state): State<AppState>,
    authenticated_user: AuthenticatedUser,
) -> Result<StatusCode, ApiError> {
    state
        .queue_service
        .leave_queue(&authenticated_user.user_id)
        .await?;

    Ok(StatusCode::OK)
}
