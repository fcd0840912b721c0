#[derive(Debug)]
pub enum FriendshipRepositoryError {
    Serialization(String),
    DynamoDb(String),
}

impl std::fmt::Display for FriendshipRepositoryError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FriendshipRepositoryError::Serialization(msg) => {
                write!(f, "Serialization error: {}", msg)
            }
            FriendshipRepositoryError::DynamoDb(msg) => write!(f, "DynamoDB error: {}", msg),
        }
    }
}

impl std::error::Error for FriendshipRepositoryError {}
