#[derive(Debug)]
pub enum MatchQueueRepositoryError {
    Serialization(String),
    DynamoDb(String),
    TransactionError(String),
}

impl std::fmt::Display for MatchQueueRepositoryError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MatchQueueRepositoryError::Serialization(msg) => {
                write!(f, "Serialization error: {}", msg)
            }
            MatchQueueRepositoryError::DynamoDb(msg) => write!(f, "DynamoDB error: {}", msg),
            MatchQueueRepositoryError::TransactionError(msg) => {
                write!(f, "Transaction error: {}", msg)
            }
        }
    }
}

impl std::error::Error for MatchQueueRepositoryError {}
