pub mod errors;
pub mod matchmaking_service;
pub mod peer_negotiator;
pub mod queue_service;
pub mod room_service;
pub mod save_service;
