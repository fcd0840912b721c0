pub mod health;
pub mod matchmaking;
pub mod queue;
pub mod rooms;
