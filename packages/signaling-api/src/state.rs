use std::sync::Arc;

use shared::repositories::connection_repository::ConnectionRepository;
use shared::repositories::signaling_relay::SignalPublisher;

#[derive(Clone)]
pub struct AppState {
    pub connections: Arc<dyn ConnectionRepository>,
    pub publisher: Arc<dyn SignalPublisher>,
}
