#[derive(Debug)]
pub enum WaitingPoolRepositoryError {
    Serialization(String),
    DynamoDb(String),
}

impl std::fmt::Display for WaitingPoolRepositoryError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            WaitingPoolRepositoryError::Serialization(msg) => {
                write!(f, "Serialization error: {}", msg)
            }
            WaitingPoolRepositoryError::DynamoDb(msg) => write!(f, "DynamoDB error: {}", msg),
        }
    }
}

impl std::error::Error for WaitingPoolRepositoryError {}
