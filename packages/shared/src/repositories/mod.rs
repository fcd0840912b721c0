pub mod connection_repository;
pub mod errors;
pub mod friendship_repository;
pub mod match_queue_repository;
pub mod room_repository;
pub mod signaling_relay;
pub mod similarity_provider;
pub mod waiting_pool_repository;
