pub mod friendship;
pub mod matchmaking;
pub mod queue;
pub mod room;
pub mod signaling;
