use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};

use crate::{error::ApiError, middleware::auth::AuthenticatedUser, state::AppState};
use shared::models::friendship::requests::RegisterSaveRequest;
use shared::models::friendship::responses::RegisterSaveResponse;
use shared::models::room::Room;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/rooms/{room_id}", get(get_room))
        .route("/rooms/{room_id}/heartbeat", post(heartbeat))
        .route("/rooms/{room_id}/save", post(register_save))
}

async fn get_room(
    State(state): State<AppState>,
    _authenticated_user: AuthenticatedUser,
    Path(room_id): Path<String>,
) -> Result<Json<Room>, ApiError> {
    let room = state.room_service.get_room(&room_id).await?;
    Ok(Json(room))
}

async fn heartbeat(
    State(state): State<AppState>,
    authenticated_user: AuthenticatedUser,
    Path(room_id): Path<String>,
) -> Result<StatusCode, ApiError> {
    state
        .room_service
        .heartbeat(&room_id, &authenticated_user.user_id)
        .await?;

    Ok(StatusCode::OK)
}

async fn register_save(
    State(state): State<AppState>,
    authenticated_user: AuthenticatedUser,
    Path(room_id): Path<String>,
    Json(payload): Json<RegisterSaveRequest>,
) -> Result<Json<RegisterSaveResponse>, ApiError> {
    let status = state
        .save_service
        .register_save(&room_id, &authenticated_user.user_id, &payload.partner_id)
        .await?;

    Ok(Json(RegisterSaveResponse { status }))
}
