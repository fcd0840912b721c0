use crate::repositories::errors::friendship_repository_errors::FriendshipRepositoryError;
use std::fmt;

#[derive(Debug)]
pub enum SaveServiceError {
    RepositoryError(String),
}

impl fmt::Display for SaveServiceError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            SaveServiceError::RepositoryError(msg) => write!(f, "Repository error: {}", msg),
        }
    }
}

impl std::error::Error for SaveServiceError {}

impl From<FriendshipRepositoryError> for SaveServiceError {
    fn from(error: FriendshipRepositoryError) -> Self {
        SaveServiceError::RepositoryError(error.to_string())
    }
}
