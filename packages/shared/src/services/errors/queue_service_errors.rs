use crate::repositories::errors::waiting_pool_repository_errors::WaitingPoolRepositoryError;
use std::fmt;

#[derive(Debug)]
pub enum QueueServiceError {
    /// The waiting-pool store is unreachable. The matcher fails closed: an
    /// in-memory fallback would break the at-most-one-match guarantee across
    /// server instances.
    ServiceUnavailable(String),
}

impl fmt::Display for QueueServiceError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            QueueServiceError::ServiceUnavailable(msg) => {
                write!(f, "Waiting pool unavailable: {}", msg)
            }
        }
    }
}

impl std::error::Error for QueueServiceError {}

impl From<WaitingPoolRepositoryError> for QueueServiceError {
    fn from(error: WaitingPoolRepositoryError) -> Self {
        QueueServiceError::ServiceUnavailable(error.to_string())
    }
}
