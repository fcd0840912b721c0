use async_trait::async_trait;
use aws_sdk_dynamodb::error::SdkError;
use aws_sdk_dynamodb::types::{AttributeValue, TransactWriteItem, Update};
use aws_sdk_dynamodb::Client;
use serde_dynamo::aws_sdk_dynamodb_1::{from_item, to_item};

use crate::models::matchmaking::{MatchHistoryEvent, MatchQueueEntry};
use crate::repositories::errors::match_queue_repository_errors::MatchQueueRepositoryError;

/// Storage seam for the compatibility queue and match history. Pair claiming
/// is a conditional transaction over both queue rows, so a row that has
/// already been matched can never be handed out again.
#[async_trait]
pub trait MatchQueueRepository: Send + Sync {
    async fn upsert_entry(&self, entry: &MatchQueueEntry)
        -> Result<(), MatchQueueRepositoryError>;

    async fn get_entry(
        &self,
        user_id: &str,
    ) -> Result<Option<MatchQueueEntry>, MatchQueueRepositoryError>;

    /// Unmatched rows for the given mode, oldest waiting first, excluding the
    /// requesting user.
    async fn oldest_waiting(
        &self,
        mode: &str,
        exclude_user_id: &str,
        limit: usize,
    ) -> Result<Vec<MatchQueueEntry>, MatchQueueRepositoryError>;

    /// Atomically marks both rows as matched with each other and the room.
    /// Returns false if either row was already matched (claimed concurrently).
    async fn claim_pair(
        &self,
        user_id: &str,
        partner_id: &str,
        room_id: &str,
    ) -> Result<bool, MatchQueueRepositoryError>;

    async fn append_history(
        &self,
        event: &MatchHistoryEvent,
    ) -> Result<(), MatchQueueRepositoryError>;

    /// Most recent history events for the user, newest first.
    async fn recent_history(
        &self,
        user_id: &str,
        limit: usize,
    ) -> Result<Vec<MatchHistoryEvent>, MatchQueueRepositoryError>;
}

pub struct DynamoDbMatchQueueRepository {
    pub client: Client,
    pub queue_table: String,
    pub history_table: String,
}

impl DynamoDbMatchQueueRepository {
    pub fn new(client: Client) -> Self {
        let queue_table = std::env::var("MATCH_QUEUE_TABLE")
            .expect("MATCH_QUEUE_TABLE environment variable must be set");
        let history_table = std::env::var("MATCH_HISTORY_TABLE")
            .expect("MATCH_HISTORY_TABLE environment variable must be set");
        Self {
            client,
            queue_table,
            history_table,
        }
    }

    fn claim_update(&self, user_id: &str, partner_id: &str, room_id: &str) -> Result<Update, MatchQueueRepositoryError> {
        Update::builder()
            .table_name(&self.queue_table)
            .key("user_id", AttributeValue::S(user_id.to_string()))
            .update_expression("SET matched_with = :partner, room_id = :room")
            .condition_expression("attribute_exists(user_id) AND attribute_not_exists(matched_with)")
            .expression_attribute_values(":partner", AttributeValue::S(partner_id.to_string()))
            .expression_attribute_values(":room", AttributeValue::S(room_id.to_string()))
            .build()
            .map_err(|e| MatchQueueRepositoryError::TransactionError(e.to_string()))
    }
}

#[async_trait]
impl MatchQueueRepository for DynamoDbMatchQueueRepository {
    async fn upsert_entry(
        &self,
        entry: &MatchQueueEntry,
    ) -> Result<(), MatchQueueRepositoryError> {
        let item = to_item(entry)
            .map_err(|e| MatchQueueRepositoryError::Serialization(e.to_string()))?;

        self.client
            .put_item()
            .table_name(&self.queue_table)
            .set_item(Some(item))
            .send()
            .await
            .map_err(|e| MatchQueueRepositoryError::DynamoDb(e.to_string()))?;

        Ok(())
    }

    async fn get_entry(
        &self,
        user_id: &str,
    ) -> Result<Option<MatchQueueEntry>, MatchQueueRepositoryError> {
        let result = self
            .client
            .get_item()
            .table_name(&self.queue_table)
            .key("user_id", AttributeValue::S(user_id.to_string()))
            .send()
            .await
            .map_err(|e| MatchQueueRepositoryError::DynamoDb(e.to_string()))?;

        match result.item {
            Some(item) => {
                let entry: MatchQueueEntry = from_item(item)
                    .map_err(|e| MatchQueueRepositoryError::Serialization(e.to_string()))?;
                Ok(Some(entry))
            }
            None => Ok(None),
        }
    }

    async fn oldest_waiting(
        &self,
        mode: &str,
        exclude_user_id: &str,
        limit: usize,
    ) -> Result<Vec<MatchQueueEntry>, MatchQueueRepositoryError> {
        let scan_result = self
            .client
            .scan()
            .table_name(&self.queue_table)
            .filter_expression(
                "#mode = :mode AND attribute_not_exists(matched_with) AND user_id <> :me",
            )
            .expression_attribute_names("#mode", "mode")
            .expression_attribute_values(":mode", AttributeValue::S(mode.to_string()))
            .expression_attribute_values(":me", AttributeValue::S(exclude_user_id.to_string()))
            .send()
            .await
            .map_err(|e| MatchQueueRepositoryError::DynamoDb(e.to_string()))?;

        let mut entries = Vec::new();
        if let Some(items) = scan_result.items {
            for item in items {
                let entry: MatchQueueEntry = from_item(item)
                    .map_err(|e| MatchQueueRepositoryError::Serialization(e.to_string()))?;
                entries.push(entry);
            }
        }

        entries.sort_by_key(|entry| entry.waiting_since);
        entries.truncate(limit);

        Ok(entries)
    }

    async fn claim_pair(
        &self,
        user_id: &str,
        partner_id: &str,
        room_id: &str,
    ) -> Result<bool, MatchQueueRepositoryError> {
        let transaction_items = vec![
            TransactWriteItem::builder()
                .update(self.claim_update(user_id, partner_id, room_id)?)
                .build(),
            TransactWriteItem::builder()
                .update(self.claim_update(partner_id, user_id, room_id)?)
                .build(),
        ];

        let result = self
            .client
            .transact_write_items()
            .set_transact_items(Some(transaction_items))
            .send()
            .await;

        match result {
            Ok(_) => Ok(true),
            Err(e) => {
                if let SdkError::ServiceError(service_err) = &e {
                    if service_err.err().is_transaction_canceled_exception() {
                        // One of the rows was already matched.
                        return Ok(false);
                    }
                }
                Err(MatchQueueRepositoryError::TransactionError(e.to_string()))
            }
        }
    }

    async fn append_history(
        &self,
        event: &MatchHistoryEvent,
    ) -> Result<(), MatchQueueRepositoryError> {
        let item = to_item(event)
            .map_err(|e| MatchQueueRepositoryError::Serialization(e.to_string()))?;

        self.client
            .put_item()
            .table_name(&self.history_table)
            .set_item(Some(item))
            .send()
            .await
            .map_err(|e| MatchQueueRepositoryError::DynamoDb(e.to_string()))?;

        Ok(())
    }

    async fn recent_history(
        &self,
        user_id: &str,
        limit: usize,
    ) -> Result<Vec<MatchHistoryEvent>, MatchQueueRepositoryError> {
        let query_result = self
            .client
            .query()
            .table_name(&self.history_table)
            .key_condition_expression("user_id = :user_id")
            .expression_attribute_values(":user_id", AttributeValue::S(user_id.to_string()))
            .scan_index_forward(false)
            .limit(limit as i32)
            .send()
            .await
            .map_err(|e| MatchQueueRepositoryError::DynamoDb(e.to_string()))?;

        let mut events = Vec::new();
        if let Some(items) = query_result.items {
            for item in items {
                let event: MatchHistoryEvent = from_item(item)
                    .map_err(|e| MatchQueueRepositoryError::Serialization(e.to_string()))?;
                events.push(event);
            }
        }

        Ok(events)
    }
}
