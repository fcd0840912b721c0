use lambda_runtime::{run, service_fn, Error, LambdaEvent};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::Arc;
use tracing::{debug, error};

pub mod actions;
pub mod state;

use shared::repositories::connection_repository::DynamoDbConnectionRepository;
use shared::repositories::signaling_relay::ConnectionFanoutPublisher;

#[derive(Debug, Deserialize)]
pub struct WebSocketEvent {
    #[serde(rename = "requestContext")]
    pub request_context: RequestContext,
    pub body: Option<String>,
    #[serde(rename = "queryStringParameters")]
    pub query_string_parameters: Option<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
pub struct RequestContext {
    #[serde(rename = "connectionId")]
    pub connection_id: String,
    #[serde(rename = "routeKey")]
    pub route_key: String,
}

#[derive(Debug, Serialize)]
pub struct WebSocketResponse {
    #[serde(rename = "statusCode")]
    pub status_code: u16,
    pub body: Option<String>,
}

impl WebSocketResponse {
    pub fn ok() -> Self {
        WebSocketResponse {
            status_code: 200,
            body: None,
        }
    }

    pub fn error(status_code: u16, message: &str) -> Self {
        WebSocketResponse {
            status_code,
            body: Some(json!({ "error": message }).to_string()),
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), Error> {
    // required to enable CloudWatch error logging by the runtime
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .init();

    let config = aws_config::load_from_env().await;
    let dynamodb_client = aws_sdk_dynamodb::Client::new(&config);
    let api_gateway_client = aws_sdk_apigatewaymanagement::Client::new(&config);

    let connections = Arc::new(DynamoDbConnectionRepository::new(
        dynamodb_client,
        api_gateway_client,
    ));
    let publisher = Arc::new(ConnectionFanoutPublisher::new(connections.clone()));

    let app_state = state::AppState {
        connections,
        publisher,
    };

    run(service_fn(|event: LambdaEvent<WebSocketEvent>| {
        websocket_handler(event, app_state.clone())
    }))
    .await
}

async fn websocket_handler(
    event: LambdaEvent<WebSocketEvent>,
    state: state::AppState,
) -> Result<WebSocketResponse, Error> {
    let websocket_event = event.payload;
    let route_key = &websocket_event.request_context.route_key;
    let connection_id = &websocket_event.request_context.connection_id;

    debug!(
        "Processing route_key: {}, connection_id: {}",
        route_key, connection_id
    );

    match route_key.as_str() {
        "$connect" => actions::connect::handle(connection_id, &websocket_event, state).await,
        "$disconnect" => actions::disconnect::handle(connection_id, state).await,
        "$default" => actions::publish::handle(connection_id, &websocket_event, state).await,
        _ => {
            error!("Unknown route key: {}", route_key);
            Ok(WebSocketResponse::error(400, "Unknown route"))
        }
    }
}
