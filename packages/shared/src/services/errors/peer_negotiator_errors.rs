use crate::repositories::signaling_relay::SignalingRelayError;
use std::fmt;

#[derive(Debug)]
pub enum PeerNegotiatorError {
    /// Relay failure; recoverable by resubscribing to the room.
    Relay(String),
    /// Local transport failure; surfaces as a disconnected outcome.
    Transport(String),
}

impl fmt::Display for PeerNegotiatorError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            PeerNegotiatorError::Relay(msg) => write!(f, "Relay error: {}", msg),
            PeerNegotiatorError::Transport(msg) => write!(f, "Transport error: {}", msg),
        }
    }
}

impl std::error::Error for PeerNegotiatorError {}

impl From<SignalingRelayError> for PeerNegotiatorError {
    fn from(error: SignalingRelayError) -> Self {
        PeerNegotiatorError::Relay(error.to_string())
    }
}
