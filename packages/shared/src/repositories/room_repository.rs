use async_trait::async_trait;
use aws_sdk_dynamodb::error::SdkError;
use aws_sdk_dynamodb::types::{AttributeValue, Put, TransactWriteItem};
use aws_sdk_dynamodb::Client;
use chrono::Utc;
use serde_dynamo::aws_sdk_dynamodb_1::{from_item, to_item};

use crate::models::room::{Room, RoomParticipant};
use crate::repositories::errors::room_repository_errors::RoomRepositoryError;

const ROOM_META_SK: &str = "room";

fn participant_sk(user_id: &str) -> String {
    format!("participant#{}", user_id)
}

/// Room persistence: one metadata item plus one item per participant, all
/// written in a single transaction so a room never exists half-populated.
#[async_trait]
pub trait RoomRepository: Send + Sync {
    async fn create_room(
        &self,
        room: &Room,
        participants: &[RoomParticipant],
    ) -> Result<(), RoomRepositoryError>;

    async fn get_room(&self, room_id: &str) -> Result<Option<Room>, RoomRepositoryError>;

    /// Updates the participant's last_seen_at liveness timestamp.
    async fn touch_participant(
        &self,
        room_id: &str,
        user_id: &str,
    ) -> Result<(), RoomRepositoryError>;
}

pub struct DynamoDbRoomRepository {
    pub client: Client,
    pub table_name: String,
}

impl DynamoDbRoomRepository {
    pub fn new(client: Client) -> Self {
        let table_name = std::env::var("ROOMS_TABLE")
            .expect("ROOMS_TABLE environment variable must be set");
        Self { client, table_name }
    }

    fn put_for(
        &self,
        room_id: &str,
        sk: &str,
        mut item: std::collections::HashMap<String, AttributeValue>,
    ) -> Result<Put, RoomRepositoryError> {
        item.insert("room_id".to_string(), AttributeValue::S(room_id.to_string()));
        item.insert("sk".to_string(), AttributeValue::S(sk.to_string()));

        Put::builder()
            .table_name(&self.table_name)
            .set_item(Some(item))
            .build()
            .map_err(|e| RoomRepositoryError::TransactionError(e.to_string()))
    }
}

#[async_trait]
impl RoomRepository for DynamoDbRoomRepository {
    async fn create_room(
        &self,
        room: &Room,
        participants: &[RoomParticipant],
    ) -> Result<(), RoomRepositoryError> {
        let room_item = to_item(room)
            .map_err(|e| RoomRepositoryError::Serialization(e.to_string()))?;

        let mut transaction_items = vec![TransactWriteItem::builder()
            .put(self.put_for(&room.id, ROOM_META_SK, room_item)?)
            .build()];

        for participant in participants {
            let item = to_item(participant)
                .map_err(|e| RoomRepositoryError::Serialization(e.to_string()))?;
            transaction_items.push(
                TransactWriteItem::builder()
                    .put(self.put_for(&room.id, &participant_sk(&participant.user_id), item)?)
                    .build(),
            );
        }

        self.client
            .transact_write_items()
            .set_transact_items(Some(transaction_items))
            .send()
            .await
            .map_err(|e| RoomRepositoryError::TransactionError(e.to_string()))?;

        Ok(())
    }

    async fn get_room(&self, room_id: &str) -> Result<Option<Room>, RoomRepositoryError> {
        let result = self
            .client
            .get_item()
            .table_name(&self.table_name)
            .key("room_id", AttributeValue::S(room_id.to_string()))
            .key("sk", AttributeValue::S(ROOM_META_SK.to_string()))
            .send()
            .await
            .map_err(|e| RoomRepositoryError::DynamoDb(e.to_string()))?;

        match result.item {
            Some(item) => {
                let room: Room = from_item(item)
                    .map_err(|e| RoomRepositoryError::Serialization(e.to_string()))?;
                Ok(Some(room))
            }
            None => Ok(None),
        }
    }

    async fn touch_participant(
        &self,
        room_id: &str,
        user_id: &str,
    ) -> Result<(), RoomRepositoryError> {
        let result = self
            .client
            .update_item()
            .table_name(&self.table_name)
            .key("room_id", AttributeValue::S(room_id.to_string()))
            .key("sk", AttributeValue::S(participant_sk(user_id)))
            .update_expression("SET last_seen_at = :now")
            .condition_expression("attribute_exists(room_id)")
            .expression_attribute_values(":now", AttributeValue::S(Utc::now().to_rfc3339()))
            .send()
            .await;

        match result {
            Ok(_) => Ok(()),
            Err(e) => {
                if let SdkError::ServiceError(service_err) = &e {
                    if service_err.err().is_conditional_check_failed_exception() {
                        return Err(RoomRepositoryError::ParticipantNotFound);
                    }
                }
                Err(RoomRepositoryError::DynamoDb(e.to_string()))
            }
        }
    }
}
