use async_trait::async_trait;
use aws_sdk_dynamodb::error::SdkError;
use aws_sdk_dynamodb::types::{AttributeValue, ReturnValue};
use aws_sdk_dynamodb::Client;
use chrono::Utc;
use serde_dynamo::aws_sdk_dynamodb_1::{from_item, to_item};
use tracing::debug;

use crate::models::queue::{pool_keys, MatchNotice, WaitingEntry};
use crate::repositories::errors::waiting_pool_repository_errors::WaitingPoolRepositoryError;

/// Storage seam for the plain waiting pool: the global FIFO, per-interest
/// candidate sets, the reverse index of a user's tags, and match notices.
///
/// All mutual exclusion lives in the store: a candidate is consumed through a
/// conditional delete, so concurrent matchers can never both claim the same
/// entry. There is deliberately no in-memory fallback; if the store is down
/// the matcher must fail closed.
#[async_trait]
pub trait WaitingPoolRepository: Send + Sync {
    /// Consumes (reads and deletes) the caller's match notice, if one is
    /// outstanding and not expired.
    async fn take_match_notice(
        &self,
        user_id: &str,
    ) -> Result<Option<String>, WaitingPoolRepositoryError>;

    async fn put_match_notice(
        &self,
        user_id: &str,
        room_id: &str,
        ttl_seconds: i64,
    ) -> Result<(), WaitingPoolRepositoryError>;

    async fn delete_match_notice(&self, user_id: &str)
        -> Result<(), WaitingPoolRepositoryError>;

    /// Claims the oldest entry in the pool identified by `pool_key`, skipping
    /// `exclude_user_id`. Returns the claimed user id, or None if the pool
    /// had no claimable entry.
    async fn pop_candidate(
        &self,
        pool_key: &str,
        exclude_user_id: &str,
    ) -> Result<Option<String>, WaitingPoolRepositoryError>;

    async fn push_waiting(&self, entry: &WaitingEntry)
        -> Result<(), WaitingPoolRepositoryError>;

    /// Registers the user under every given tag set and records the tags in
    /// the reverse index so leave_queue can clean up exhaustively.
    async fn register_interest_waiter(
        &self,
        user_id: &str,
        tags: &[String],
    ) -> Result<(), WaitingPoolRepositoryError>;

    async fn interest_tags_for(
        &self,
        user_id: &str,
    ) -> Result<Vec<String>, WaitingPoolRepositoryError>;

    async fn remove_waiting(
        &self,
        pool_key: &str,
        user_id: &str,
    ) -> Result<(), WaitingPoolRepositoryError>;

    async fn clear_interest_index(
        &self,
        user_id: &str,
    ) -> Result<(), WaitingPoolRepositoryError>;
}

pub struct DynamoDbWaitingPoolRepository {
    pub client: Client,
    pub table_name: String,
}

impl DynamoDbWaitingPoolRepository {
    pub fn new(client: Client) -> Self {
        let table_name = std::env::var("WAITING_POOL_TABLE")
            .expect("WAITING_POOL_TABLE environment variable must be set");
        Self { client, table_name }
    }
}

#[async_trait]
impl WaitingPoolRepository for DynamoDbWaitingPoolRepository {
    async fn take_match_notice(
        &self,
        user_id: &str,
    ) -> Result<Option<String>, WaitingPoolRepositoryError> {
        // Delete-with-return is a single atomic consume; two concurrent polls
        // by the same user cannot both observe the notice.
        let result = self
            .client
            .delete_item()
            .table_name(&self.table_name)
            .key(
                "pool_key",
                AttributeValue::S(pool_keys::notice(user_id)),
            )
            .key("member_id", AttributeValue::S(user_id.to_string()))
            .return_values(ReturnValue::AllOld)
            .send()
            .await
            .map_err(|e| WaitingPoolRepositoryError::DynamoDb(e.to_string()))?;

        let Some(item) = result.attributes else {
            return Ok(None);
        };

        let notice: MatchNotice = from_item(item)
            .map_err(|e| WaitingPoolRepositoryError::Serialization(e.to_string()))?;

        // DynamoDB expires TTL'd items lazily, so an expired notice can still
        // be present on read. Treat it as absent.
        if notice.expires_at <= Utc::now().timestamp() {
            debug!("Dropping expired match notice for user {}", user_id);
            return Ok(None);
        }

        Ok(Some(notice.room_id))
    }

    async fn put_match_notice(
        &self,
        user_id: &str,
        room_id: &str,
        ttl_seconds: i64,
    ) -> Result<(), WaitingPoolRepositoryError> {
        self.client
            .put_item()
            .table_name(&self.table_name)
            .item(
                "pool_key",
                AttributeValue::S(pool_keys::notice(user_id)),
            )
            .item("member_id", AttributeValue::S(user_id.to_string()))
            .item("user_id", AttributeValue::S(user_id.to_string()))
            .item("room_id", AttributeValue::S(room_id.to_string()))
            .item(
                "expires_at",
                AttributeValue::N((Utc::now().timestamp() + ttl_seconds).to_string()),
            )
            .send()
            .await
            .map_err(|e| WaitingPoolRepositoryError::DynamoDb(e.to_string()))?;

        Ok(())
    }

    async fn delete_match_notice(
        &self,
        user_id: &str,
    ) -> Result<(), WaitingPoolRepositoryError> {
        self.client
            .delete_item()
            .table_name(&self.table_name)
            .key(
                "pool_key",
                AttributeValue::S(pool_keys::notice(user_id)),
            )
            .key("member_id", AttributeValue::S(user_id.to_string()))
            .send()
            .await
            .map_err(|e| WaitingPoolRepositoryError::DynamoDb(e.to_string()))?;

        Ok(())
    }

    async fn pop_candidate(
        &self,
        pool_key: &str,
        exclude_user_id: &str,
    ) -> Result<Option<String>, WaitingPoolRepositoryError> {
        let query_result = self
            .client
            .query()
            .table_name(&self.table_name)
            .key_condition_expression("pool_key = :pool_key")
            .expression_attribute_values(":pool_key", AttributeValue::S(pool_key.to_string()))
            .send()
            .await
            .map_err(|e| WaitingPoolRepositoryError::DynamoDb(e.to_string()))?;

        let mut entries = Vec::new();
        if let Some(items) = query_result.items {
            for item in items {
                let entry: WaitingEntry = from_item(item)
                    .map_err(|e| WaitingPoolRepositoryError::Serialization(e.to_string()))?;
                if entry.member_id != exclude_user_id {
                    entries.push(entry);
                }
            }
        }

        // Oldest first; best-effort FIFO.
        entries.sort_by_key(|entry| entry.enqueued_at);

        for entry in entries {
            // Conditional delete is the claim. The first matcher to delete an
            // entry wins it; everyone else moves on to the next candidate.
            let claim = self
                .client
                .delete_item()
                .table_name(&self.table_name)
                .key("pool_key", AttributeValue::S(pool_key.to_string()))
                .key("member_id", AttributeValue::S(entry.member_id.clone()))
                .condition_expression("attribute_exists(member_id)")
                .send()
                .await;

            match claim {
                Ok(_) => return Ok(Some(entry.member_id)),
                Err(e) => {
                    if let SdkError::ServiceError(service_err) = &e {
                        if service_err.err().is_conditional_check_failed_exception() {
                            // Entry was claimed by a concurrent matcher.
                            continue;
                        }
                    }
                    return Err(WaitingPoolRepositoryError::DynamoDb(e.to_string()));
                }
            }
        }

        Ok(None)
    }

    async fn push_waiting(
        &self,
        entry: &WaitingEntry,
    ) -> Result<(), WaitingPoolRepositoryError> {
        let item = to_item(entry)
            .map_err(|e| WaitingPoolRepositoryError::Serialization(e.to_string()))?;

        self.client
            .put_item()
            .table_name(&self.table_name)
            .set_item(Some(item))
            .send()
            .await
            .map_err(|e| WaitingPoolRepositoryError::DynamoDb(e.to_string()))?;

        Ok(())
    }

    async fn register_interest_waiter(
        &self,
        user_id: &str,
        tags: &[String],
    ) -> Result<(), WaitingPoolRepositoryError> {
        for tag in tags {
            self.push_waiting(&WaitingEntry::for_tag(user_id, tag)).await?;

            self.client
                .put_item()
                .table_name(&self.table_name)
                .item(
                    "pool_key",
                    AttributeValue::S(pool_keys::tag_index(user_id)),
                )
                .item("member_id", AttributeValue::S(tag.to_string()))
                .send()
                .await
                .map_err(|e| WaitingPoolRepositoryError::DynamoDb(e.to_string()))?;
        }

        Ok(())
    }

    async fn interest_tags_for(
        &self,
        user_id: &str,
    ) -> Result<Vec<String>, WaitingPoolRepositoryError> {
        let query_result = self
            .client
            .query()
            .table_name(&self.table_name)
            .key_condition_expression("pool_key = :pool_key")
            .expression_attribute_values(
                ":pool_key",
                AttributeValue::S(pool_keys::tag_index(user_id)),
            )
            .send()
            .await
            .map_err(|e| WaitingPoolRepositoryError::DynamoDb(e.to_string()))?;

        let mut tags = Vec::new();
        if let Some(items) = query_result.items {
            for item in items {
                if let Some(AttributeValue::S(tag)) = item.get("member_id") {
                    tags.push(tag.clone());
                }
            }
        }

        Ok(tags)
    }

    async fn remove_waiting(
        &self,
        pool_key: &str,
        user_id: &str,
    ) -> Result<(), WaitingPoolRepositoryError> {
        self.client
            .delete_item()
            .table_name(&self.table_name)
            .key("pool_key", AttributeValue::S(pool_key.to_string()))
            .key("member_id", AttributeValue::S(user_id.to_string()))
            .send()
            .await
            .map_err(|e| WaitingPoolRepositoryError::DynamoDb(e.to_string()))?;

        Ok(())
    }

    async fn clear_interest_index(
        &self,
        user_id: &str,
    ) -> Result<(), WaitingPoolRepositoryError> {
        let tags = self.interest_tags_for(user_id).await?;
        for tag in tags {
            self.client
                .delete_item()
                .table_name(&self.table_name)
                .key(
                    "pool_key",
                    AttributeValue::S(pool_keys::tag_index(user_id)),
                )
                .key("member_id", AttributeValue::S(tag))
                .send()
                .await
                .map_err(|e| WaitingPoolRepositoryError::DynamoDb(e.to_string()))?;
        }

        Ok(())
    }
}
