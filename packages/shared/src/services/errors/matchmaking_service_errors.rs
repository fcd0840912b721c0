use crate::repositories::errors::match_queue_repository_errors::MatchQueueRepositoryError;
use crate::repositories::errors::room_repository_errors::RoomRepositoryError;
use std::fmt;

#[derive(Debug)]
pub enum MatchmakingServiceError {
    /// find_match was called for a user that never enqueued for this mode.
    NotEnqueued,
    RepositoryError(String),
}

impl fmt::Display for MatchmakingServiceError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            MatchmakingServiceError::NotEnqueued => {
                write!(f, "User has no waiting queue entry")
            }
            MatchmakingServiceError::RepositoryError(msg) => {
                write!(f, "Repository error: {}", msg)
            }
        }
    }
}

impl std::error::Error for MatchmakingServiceError {}

impl From<MatchQueueRepositoryError> for MatchmakingServiceError {
    fn from(error: MatchQueueRepositoryError) -> Self {
        MatchmakingServiceError::RepositoryError(error.to_string())
    }
}

impl From<RoomRepositoryError> for MatchmakingServiceError {
    fn from(error: RoomRepositoryError) -> Self {
        MatchmakingServiceError::RepositoryError(error.to_string())
    }
}
