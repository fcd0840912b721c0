use async_trait::async_trait;
use aws_sdk_apigatewaymanagement::{primitives::Blob, Client as ApiGatewayClient};
use aws_sdk_dynamodb::types::AttributeValue;
use aws_sdk_dynamodb::Client as DynamoDbClient;
use std::env;
use tracing::info;

/// A live WebSocket subscriber of a room's signaling channel.
#[derive(Debug, Clone)]
pub struct RoomConnection {
    pub user_id: String,
    pub connection_id: String,
}

/// Registry of room-scoped WebSocket connections plus the push primitive.
/// Connections are ephemeral: stored on $connect, removed on $disconnect,
/// never cleaned up beyond that.
#[async_trait]
pub trait ConnectionRepository: Send + Sync {
    async fn store_connection(
        &self,
        room_id: &str,
        user_id: &str,
        connection_id: &str,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>>;

    async fn remove_connection_by_id(
        &self,
        connection_id: &str,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>>;

    async fn connections_for_room(
        &self,
        room_id: &str,
    ) -> Result<Vec<RoomConnection>, Box<dyn std::error::Error + Send + Sync>>;

    async fn send_message(
        &self,
        connection_id: &str,
        message: &str,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>>;
}

pub struct DynamoDbConnectionRepository {
    dynamodb_client: DynamoDbClient,
    api_gateway_client: ApiGatewayClient,
    table_name: String,
}

impl DynamoDbConnectionRepository {
    pub fn new(dynamodb_client: DynamoDbClient, base_client: ApiGatewayClient) -> Self {
        let table_name = env::var("SIGNALING_CONNECTIONS_TABLE")
            .expect("SIGNALING_CONNECTIONS_TABLE environment variable must be set");
        let endpoint = env::var("SIGNALING_API_ENDPOINT")
            .expect("SIGNALING_API_ENDPOINT environment variable must be set");

        // Management API calls must go to the WebSocket API's own endpoint.
        let config = base_client
            .config()
            .to_builder()
            .endpoint_url(endpoint)
            .build();
        let api_gateway_client = ApiGatewayClient::from_conf(config);

        Self {
            dynamodb_client,
            api_gateway_client,
            table_name,
        }
    }
}

#[async_trait]
impl ConnectionRepository for DynamoDbConnectionRepository {
    async fn store_connection(
        &self,
        room_id: &str,
        user_id: &str,
        connection_id: &str,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        self.dynamodb_client
            .put_item()
            .table_name(&self.table_name)
            .item("room_id", AttributeValue::S(room_id.to_string()))
            .item(
                "connection_id",
                AttributeValue::S(connection_id.to_string()),
            )
            .item("user_id", AttributeValue::S(user_id.to_string()))
            .send()
            .await?;

        info!(
            "Stored signaling connection {} for user {} in room {}",
            connection_id, user_id, room_id
        );
        Ok(())
    }

    async fn remove_connection_by_id(
        &self,
        connection_id: &str,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        // The disconnect event only carries the connection id, so scan for
        // the owning room.
        let scan_result = self
            .dynamodb_client
            .scan()
            .table_name(&self.table_name)
            .filter_expression("connection_id = :connection_id")
            .expression_attribute_values(
                ":connection_id",
                AttributeValue::S(connection_id.to_string()),
            )
            .send()
            .await?;

        if let Some(items) = scan_result.items {
            for item in items {
                if let Some(AttributeValue::S(room_id)) = item.get("room_id") {
                    self.dynamodb_client
                        .delete_item()
                        .table_name(&self.table_name)
                        .key("room_id", AttributeValue::S(room_id.clone()))
                        .key(
                            "connection_id",
                            AttributeValue::S(connection_id.to_string()),
                        )
                        .send()
                        .await?;
                }
            }
        }

        info!("Removed signaling connection: {}", connection_id);
        Ok(())
    }

    async fn connections_for_room(
        &self,
        room_id: &str,
    ) -> Result<Vec<RoomConnection>, Box<dyn std::error::Error + Send + Sync>> {
        let query_result = self
            .dynamodb_client
            .query()
            .table_name(&self.table_name)
            .key_condition_expression("room_id = :room_id")
            .expression_attribute_values(":room_id", AttributeValue::S(room_id.to_string()))
            .send()
            .await?;

        let mut connections = Vec::new();
        if let Some(items) = query_result.items {
            for item in items {
                let connection_id = match item.get("connection_id") {
                    Some(AttributeValue::S(id)) => id.clone(),
                    _ => continue,
                };
                let user_id = match item.get("user_id") {
                    Some(AttributeValue::S(id)) => id.clone(),
                    _ => continue,
                };
                connections.push(RoomConnection {
                    user_id,
                    connection_id,
                });
            }
        }

        Ok(connections)
    }

    async fn send_message(
        &self,
        connection_id: &str,
        message: &str,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        self.api_gateway_client
            .post_to_connection()
            .connection_id(connection_id)
            .data(Blob::new(message.as_bytes()))
            .send()
            .await?;

        Ok(())
    }
}
