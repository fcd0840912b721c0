use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use shared::services::errors::{
    matchmaking_service_errors::MatchmakingServiceError, queue_service_errors::QueueServiceError,
    room_service_errors::RoomServiceError, save_service_errors::SaveServiceError,
};

#[derive(Debug)]
pub enum ApiError {
    QueueService(QueueServiceError),
    MatchmakingService(MatchmakingServiceError),
    RoomService(RoomServiceError),
    SaveService(SaveServiceError),
    Unauthorized,
}

impl From<QueueServiceError> for ApiError {
    fn from(error: QueueServiceError) -> Self {
        ApiError::QueueService(error)
    }
}

impl From<MatchmakingServiceError> for ApiError {
    fn from(error: MatchmakingServiceError) -> Self {
        ApiError::MatchmakingService(error)
    }
}

impl From<RoomServiceError> for ApiError {
    fn from(error: RoomServiceError) -> Self {
        ApiError::RoomService(error)
    }
}

impl From<SaveServiceError> for ApiError {
    fn from(error: SaveServiceError) -> Self {
        ApiError::SaveService(error)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match self {
            ApiError::QueueService(QueueServiceError::ServiceUnavailable(_)) => {
                StatusCode::SERVICE_UNAVAILABLE
            }

            ApiError::MatchmakingService(MatchmakingServiceError::NotEnqueued) => {
                StatusCode::NOT_FOUND
            }
            ApiError::MatchmakingService(MatchmakingServiceError::RepositoryError(_)) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }

            ApiError::RoomService(
                RoomServiceError::RoomNotFound | RoomServiceError::ParticipantNotFound,
            ) => StatusCode::NOT_FOUND,
            ApiError::RoomService(RoomServiceError::RepositoryError(_)) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }

            ApiError::SaveService(SaveServiceError::RepositoryError(_)) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }

            ApiError::Unauthorized => StatusCode::UNAUTHORIZED,
        };

        status.into_response()
    }
}
