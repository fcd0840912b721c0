use crate::repositories::errors::room_repository_errors::RoomRepositoryError;
use std::fmt;

#[derive(Debug)]
pub enum RoomServiceError {
    RoomNotFound,
    ParticipantNotFound,
    RepositoryError(String),
}

impl fmt::Display for RoomServiceError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            RoomServiceError::RoomNotFound => write!(f, "Room not found"),
            RoomServiceError::ParticipantNotFound => write!(f, "Room participant not found"),
            RoomServiceError::RepositoryError(msg) => write!(f, "Repository error: {}", msg),
        }
    }
}

impl std::error::Error for RoomServiceError {}

impl From<RoomRepositoryError> for RoomServiceError {
    fn from(error: RoomRepositoryError) -> Self {
        match error {
            RoomRepositoryError::ParticipantNotFound => RoomServiceError::ParticipantNotFound,
            other => RoomServiceError::RepositoryError(other.to_string()),
        }
    }
}
