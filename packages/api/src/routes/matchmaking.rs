use axum::{extract::State, http::StatusCode, routing::post, Json, Router};

use crate::{error::ApiError, middleware::auth::AuthenticatedUser, state::AppState};
use shared::models::matchmaking::requests::{EnqueueRequest, FindMatchRequest};
use shared::models::matchmaking::responses::MatchResult;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/match/enqueue", post(enqueue))
        .route("/match/find", post(find_match))
}

async fn enqueue(
    State(state): State<AppState>,
    authenticated_user: AuthenticatedUser,
    Json(payload): Json<EnqueueRequest>,
) -> Result<StatusCode, ApiError> {
    state
        .matchmaking_service
        .enqueue(
            &authenticated_user.user_id,
            &payload.mode,
            payload.interests,
            payload.comfort_level,
        )
        .await?;

    Ok(StatusCode::OK)
}

async fn find_match(
    State(state): State<AppState>,
    authenticated_user: AuthenticatedUser,
    Json(payload): Json<FindMatchRequest>,
) -> Result<Json<MatchResult>, ApiError> {
    let result = state
        .matchmaking_service
        .find_match(&authenticated_user.user_id, &payload.mode)
        .await?;

    Ok(Json(result))
}
