pub mod friendship_repository_errors;
pub mod match_queue_repository_errors;
pub mod room_repository_errors;
pub mod waiting_pool_repository_errors;
