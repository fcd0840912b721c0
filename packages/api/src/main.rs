use axum::{routing::get, Router};
use lambda_http::{run, tracing, Error};
use std::env::set_var;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};

pub mod error;
pub mod middleware;
pub mod routes;
pub mod state;

use shared::repositories::friendship_repository::DynamoDbFriendshipRepository;
use shared::repositories::match_queue_repository::DynamoDbMatchQueueRepository;
use shared::repositories::room_repository::DynamoDbRoomRepository;
use shared::repositories::signaling_relay::ConnectionFanoutPublisher;
use shared::repositories::similarity_provider::HttpSimilarityProvider;
use shared::repositories::waiting_pool_repository::DynamoDbWaitingPoolRepository;
use shared::repositories::connection_repository::DynamoDbConnectionRepository;
use shared::services::matchmaking_service::MatchmakingService;
use shared::services::queue_service::QueueService;
use shared::services::room_service::RoomService;
use shared::services::save_service::SaveService;

#[tokio::main]
async fn main() -> Result<(), Error> {
    set_var("AWS_LAMBDA_HTTP_IGNORE_STAGE_IN_PATH", "true");

    // required to enable CloudWatch error logging by the runtime
    tracing::init_default_subscriber();

    let config = aws_config::load_from_env().await;
    let client = aws_sdk_dynamodb::Client::new(&config);
    let api_gateway_client = aws_sdk_apigatewaymanagement::Client::new(&config);

    let waiting_pool = Arc::new(DynamoDbWaitingPoolRepository::new(client.clone()));
    let queue_service = Arc::new(QueueService::new(waiting_pool));

    let match_queue = Arc::new(DynamoDbMatchQueueRepository::new(client.clone()));
    let room_repository = Arc::new(DynamoDbRoomRepository::new(client.clone()));
    let similarity_provider = Arc::new(HttpSimilarityProvider::from_env());
    let matchmaking_service = Arc::new(MatchmakingService::new(
        match_queue,
        room_repository.clone(),
        similarity_provider,
    ));

    let room_service = Arc::new(RoomService::new(room_repository));

    let connections = Arc::new(DynamoDbConnectionRepository::new(
        client.clone(),
        api_gateway_client,
    ));
    let publisher = Arc::new(ConnectionFanoutPublisher::new(connections));
    let friendships = Arc::new(DynamoDbFriendshipRepository::new(client));
    let save_service = Arc::new(SaveService::new(friendships, publisher));

    let app_state = state::AppState {
        queue_service,
        matchmaking_service,
        room_service,
        save_service,
        jwt_secret: std::env::var("JWT_SECRET")
            .expect("JWT_SECRET environment variable must be set"),
    };

    // ToDo: Tighten this up
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let app = Router::new()
        .route("/health", get(routes::health::health_check))
        .merge(routes::queue::routes())
        .merge(routes::matchmaking::routes())
        .merge(routes::rooms::routes())
        .layer(cors)
        .with_state(app_state);

    run(app).await
}
