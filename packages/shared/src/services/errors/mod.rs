pub mod matchmaking_service_errors;
pub mod peer_negotiator_errors;
pub mod queue_service_errors;
pub mod room_service_errors;
pub mod save_service_errors;
