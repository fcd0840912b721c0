#[derive(Debug)]
pub enum RoomRepositoryError {
    ParticipantNotFound,
    Serialization(String),
    DynamoDb(String),
    TransactionError(String),
}

impl std::fmt::Display for RoomRepositoryError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RoomRepositoryError::ParticipantNotFound => write!(f, "Room participant not found"),
            RoomRepositoryError::Serialization(msg) => write!(f, "Serialization error: {}", msg),
            RoomRepositoryError::DynamoDb(msg) => write!(f, "DynamoDB error: {}", msg),
            RoomRepositoryError::TransactionError(msg) => write!(f, "Transaction error: {}", msg),
        }
    }
}

impl std::error::Error for RoomRepositoryError {}
