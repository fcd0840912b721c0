use async_trait::async_trait;
use aws_sdk_dynamodb::error::SdkError;
use aws_sdk_dynamodb::types::AttributeValue;
use aws_sdk_dynamodb::Client;
use serde_dynamo::aws_sdk_dynamodb_1::{from_item, to_item};
use tracing::debug;

use crate::models::friendship::{canonical_pair, Friendship, SaveIntent};
use crate::repositories::errors::friendship_repository_errors::FriendshipRepositoryError;

/// Storage seam for save intents and friendships. Writes are conditional
/// puts, so repeated saves and both-sides-at-once friendship creation stay
/// idempotent. The partner-intent read is strongly consistent: the second
/// saver must observe the first saver's row or mutual detection can miss.
#[async_trait]
pub trait FriendshipRepository: Send + Sync {
    /// Records the intent if absent; an existing intent is left untouched.
    async fn put_save_intent(&self, intent: &SaveIntent)
        -> Result<(), FriendshipRepositoryError>;

    async fn get_save_intent(
        &self,
        room_id: &str,
        user_id: &str,
    ) -> Result<Option<SaveIntent>, FriendshipRepositoryError>;

    /// Creates the friendship if absent. Returns true if this call created
    /// it, false if it already existed.
    async fn upsert_friendship(
        &self,
        friendship: &Friendship,
    ) -> Result<bool, FriendshipRepositoryError>;

    async fn get_friendship(
        &self,
        user_a: &str,
        user_b: &str,
    ) -> Result<Option<Friendship>, FriendshipRepositoryError>;
}

pub struct DynamoDbFriendshipRepository {
    pub client: Client,
    pub intents_table: String,
    pub friendships_table: String,
}

impl DynamoDbFriendshipRepository {
    pub fn new(client: Client) -> Self {
        let intents_table = std::env::var("SAVE_INTENTS_TABLE")
            .expect("SAVE_INTENTS_TABLE environment variable must be set");
        let friendships_table = std::env::var("FRIENDSHIPS_TABLE")
            .expect("FRIENDSHIPS_TABLE environment variable must be set");
        Self {
            client,
            intents_table,
            friendships_table,
        }
    }
}

#[async_trait]
impl FriendshipRepository for DynamoDbFriendshipRepository {
    async fn put_save_intent(
        &self,
        intent: &SaveIntent,
    ) -> Result<(), FriendshipRepositoryError> {
        let item = to_item(intent)
            .map_err(|e| FriendshipRepositoryError::Serialization(e.to_string()))?;

        let result = self
            .client
            .put_item()
            .table_name(&self.intents_table)
            .set_item(Some(item))
            .condition_expression("attribute_not_exists(room_id)")
            .send()
            .await;

        match result {
            Ok(_) => Ok(()),
            Err(e) => {
                if let SdkError::ServiceError(service_err) = &e {
                    if service_err.err().is_conditional_check_failed_exception() {
                        // Already saved; keep the original saved_at.
                        debug!(
                            "Save intent already recorded for room {} user {}",
                            intent.room_id, intent.user_id
                        );
                        return Ok(());
                    }
                }
                Err(FriendshipRepositoryError::DynamoDb(e.to_string()))
            }
        }
    }

    async fn get_save_intent(
        &self,
        room_id: &str,
        user_id: &str,
    ) -> Result<Option<SaveIntent>, FriendshipRepositoryError> {
        let result = self
            .client
            .get_item()
            .table_name(&self.intents_table)
            .key("room_id", AttributeValue::S(room_id.to_string()))
            .key("user_id", AttributeValue::S(user_id.to_string()))
            .consistent_read(true)
            .send()
            .await
            .map_err(|e| FriendshipRepositoryError::DynamoDb(e.to_string()))?;

        match result.item {
            Some(item) => {
                let intent: SaveIntent = from_item(item)
                    .map_err(|e| FriendshipRepositoryError::Serialization(e.to_string()))?;
                Ok(Some(intent))
            }
            None => Ok(None),
        }
    }

    async fn upsert_friendship(
        &self,
        friendship: &Friendship,
    ) -> Result<bool, FriendshipRepositoryError> {
        let mut item = to_item(friendship)
            .map_err(|e| FriendshipRepositoryError::Serialization(e.to_string()))?;
        item.insert(
            "pair_key".to_string(),
            AttributeValue::S(friendship.pair_key()),
        );

        let result = self
            .client
            .put_item()
            .table_name(&self.friendships_table)
            .set_item(Some(item))
            .condition_expression("attribute_not_exists(pair_key)")
            .send()
            .await;

        match result {
            Ok(_) => Ok(true),
            Err(e) => {
                if let SdkError::ServiceError(service_err) = &e {
                    if service_err.err().is_conditional_check_failed_exception() {
                        // The other saver won the race; the row is identical.
                        return Ok(false);
                    }
                }
                Err(FriendshipRepositoryError::DynamoDb(e.to_string()))
            }
        }
    }

    async fn get_friendship(
        &self,
        user_a: &str,
        user_b: &str,
    ) -> Result<Option<Friendship>, FriendshipRepositoryError> {
        let (user1, user2) = canonical_pair(user_a, user_b);
        let pair_key = format!("{}#{}", user1, user2);

        let result = self
            .client
            .get_item()
            .table_name(&self.friendships_table)
            .key("pair_key", AttributeValue::S(pair_key))
            .consistent_read(true)
            .send()
            .await
            .map_err(|e| FriendshipRepositoryError::DynamoDb(e.to_string()))?;

        match result.item {
            Some(item) => {
                let friendship: Friendship = from_item(item)
                    .map_err(|e| FriendshipRepositoryError::Serialization(e.to_string()))?;
                Ok(Some(friendship))
            }
            None => Ok(None),
        }
    }
}
