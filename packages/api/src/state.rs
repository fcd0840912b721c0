use std::sync::Arc;

use shared::services::matchmaking_service::MatchmakingService;
use shared::services::queue_service::QueueService;
use shared::services::room_service::RoomService;
use shared::services::save_service::SaveService;

#[derive(Clone)]
pub struct AppState {
    pub queue_service: Arc<QueueService>,
    pub matchmaking_service: Arc<MatchmakingService>,
    pub room_service: Arc<RoomService>,
    pub save_service: Arc<SaveService>,
    pub jwt_secret: String,
}
