use std::collections::HashSet;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::{broadcast, mpsc};
use tracing::{debug, info, warn};

use crate::models::signaling::SignalEnvelope;
use crate::repositories::signaling_relay::SignalingRelay;
use crate::services::errors::peer_negotiator_errors::PeerNegotiatorError;

#[derive(Debug)]
pub enum PeerTransportError {
    Failed(String),
}

impl std::fmt::Display for PeerTransportError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PeerTransportError::Failed(msg) => write!(f, "Transport failure: {}", msg),
        }
    }
}

impl std::error::Error for PeerTransportError {}

impl From<PeerTransportError> for PeerNegotiatorError {
    fn from(error: PeerTransportError) -> Self {
        PeerNegotiatorError::Transport(error.to_string())
    }
}

/// Seam over the local peer connection. The negotiator only drives session
/// descriptions and candidates through it; the transport's own network
/// machinery reports back through [`TransportEvent`]s.
#[async_trait]
pub trait PeerTransport: Send + Sync {
    /// Creates a local session description to send as an offer.
    async fn create_offer(&self) -> Result<String, PeerTransportError>;

    /// Applies a remote offer and returns the local answer description.
    async fn accept_offer(&self, offer: &str) -> Result<String, PeerTransportError>;

    /// Applies the remote answer to a previously created offer.
    async fn accept_answer(&self, answer: &str) -> Result<(), PeerTransportError>;

    /// Applies a remote ICE candidate. Always legal, in any phase.
    async fn add_remote_candidate(&self, candidate: &str) -> Result<(), PeerTransportError>;

    /// Whether the local signaling state is stable (no negotiation in
    /// flight). Offers are only created while stable.
    async fn signaling_stable(&self) -> bool;
}

/// Callbacks from the transport's own connectivity machinery, delivered to
/// the negotiator's run loop over an mpsc channel.
#[derive(Debug, Clone, PartialEq)]
pub enum TransportEvent {
    /// A locally gathered ICE candidate to relay to the peer.
    LocalCandidate(String),
    Connected,
    Disconnected,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PeerRole {
    Undecided,
    Offerer,
    Answerer,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionPhase {
    Idle,
    HelloSent,
    Offering,
    Answering,
    Connected,
    Disconnected,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NegotiationOutcome {
    Connected,
    Disconnected,
}

/// Per-client negotiation state machine. Two independent instances run per
/// room, one on each side, sharing nothing but the relay. Symmetry between
/// them is broken by comparing ids: the lexicographically greater id offers,
/// regardless of the order in which HELLOs arrive.
pub struct PeerNegotiator {
    relay: Arc<dyn SignalingRelay>,
    transport: Arc<dyn PeerTransport>,
    room_id: String,
    local_id: String,
    role: PeerRole,
    phase: ConnectionPhase,
    offer_sent: bool,
    // Senders whose offer was already processed; repeats are renegotiation
    // storms and get dropped.
    answered_offerers: HashSet<String>,
    reveal_messages: Vec<String>,
}

impl PeerNegotiator {
    pub fn new(
        relay: Arc<dyn SignalingRelay>,
        transport: Arc<dyn PeerTransport>,
        room_id: &str,
        local_id: &str,
    ) -> Self {
        PeerNegotiator {
            relay,
            transport,
            room_id: room_id.to_string(),
            local_id: local_id.to_string(),
            role: PeerRole::Undecided,
            phase: ConnectionPhase::Idle,
            offer_sent: false,
            answered_offerers: HashSet::new(),
            reveal_messages: Vec::new(),
        }
    }

    pub fn role(&self) -> PeerRole {
        self.role
    }

    pub fn phase(&self) -> ConnectionPhase {
        self.phase
    }

    /// Reveal messages observed on the relay, oldest first.
    pub fn reveal_messages(&self) -> &[String] {
        &self.reveal_messages
    }

    /// Drives the state machine to completion: subscribes, announces, then
    /// multiplexes relay envelopes and transport callbacks until the
    /// transport reports connected or disconnected.
    pub async fn run(
        &mut self,
        mut transport_events: mpsc::Receiver<TransportEvent>,
    ) -> Result<NegotiationOutcome, PeerNegotiatorError> {
        let mut inbox = self.announce().await?;

        loop {
            tokio::select! {
                received = inbox.recv() => match received {
                    Ok(envelope) => {
                        if let Err(e) = self.handle_envelope(&envelope).await {
                            match e {
                                PeerNegotiatorError::Relay(msg) => {
                                    // Relay hiccups are survivable: resubscribe
                                    // and re-announce.
                                    warn!("Relay failure in room {}: {}", self.room_id, msg);
                                    inbox = self.announce().await?;
                                }
                                PeerNegotiatorError::Transport(msg) => {
                                    warn!(
                                        "Transport failure in room {}: {}",
                                        self.room_id, msg
                                    );
                                    self.phase = ConnectionPhase::Disconnected;
                                    return Ok(NegotiationOutcome::Disconnected);
                                }
                            }
                        }
                    }
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        warn!(
                            "Negotiator for {} lagged {} envelopes in room {}",
                            self.local_id, skipped, self.room_id
                        );
                    }
                    Err(broadcast::error::RecvError::Closed) => {
                        inbox = self.announce().await?;
                    }
                },
                event = transport_events.recv() => match event {
                    Some(TransportEvent::LocalCandidate(candidate)) => {
                        let envelope = SignalEnvelope::IceCandidate {
                            sender_id: self.local_id.clone(),
                            data: candidate,
                        };
                        // Same recovery as the envelope path: a relay failure
                        // is survivable, so resubscribe rather than ending
                        // the negotiation over one lost candidate.
                        if let Err(e) = self.relay.publish(&self.room_id, &envelope).await {
                            warn!("Relay failure in room {}: {}", self.room_id, e);
                            inbox = self.announce().await?;
                        }
                    }
                    Some(TransportEvent::Connected) => {
                        info!(
                            "Peer {} connected in room {} as {:?}",
                            self.local_id, self.room_id, self.role
                        );
                        self.phase = ConnectionPhase::Connected;
                        return Ok(NegotiationOutcome::Connected);
                    }
                    Some(TransportEvent::Disconnected) | None => {
                        self.phase = ConnectionPhase::Disconnected;
                        return Ok(NegotiationOutcome::Disconnected);
                    }
                },
            }
        }
    }

    async fn announce(
        &mut self,
    ) -> Result<broadcast::Receiver<SignalEnvelope>, PeerNegotiatorError> {
        let inbox = self.relay.subscribe(&self.room_id).await?;
        self.relay
            .publish(
                &self.room_id,
                &SignalEnvelope::Hello {
                    sender_id: self.local_id.clone(),
                },
            )
            .await?;
        self.phase = ConnectionPhase::HelloSent;
        Ok(inbox)
    }

    async fn handle_envelope(
        &mut self,
        envelope: &SignalEnvelope,
    ) -> Result<(), PeerNegotiatorError> {
        // The relay echoes the local side's own envelopes back.
        if envelope.sender_id() == self.local_id {
            return Ok(());
        }

        match envelope {
            SignalEnvelope::Hello { sender_id } => {
                if self.local_id > *sender_id {
                    self.offer_if_stable().await?;
                } else {
                    // The greater-id peer may have published its HELLO before
                    // subscribing and so never seen ours. Re-announce instead
                    // of waiting silently.
                    self.role = PeerRole::Answerer;
                    self.relay
                        .publish(
                            &self.room_id,
                            &SignalEnvelope::HelloBack {
                                sender_id: self.local_id.clone(),
                            },
                        )
                        .await?;
                }
            }
            SignalEnvelope::HelloBack { sender_id } => {
                if self.local_id > *sender_id {
                    self.offer_if_stable().await?;
                }
            }
            SignalEnvelope::Offer { sender_id, data } => {
                if !self.answered_offerers.insert(sender_id.clone()) {
                    debug!("Ignoring repeat offer from {}", sender_id);
                    return Ok(());
                }
                self.role = PeerRole::Answerer;
                let answer = self.transport.accept_offer(data).await?;
                self.phase = ConnectionPhase::Answering;
                self.relay
                    .publish(
                        &self.room_id,
                        &SignalEnvelope::Answer {
                            sender_id: self.local_id.clone(),
                            data: answer,
                        },
                    )
                    .await?;
            }
            SignalEnvelope::Answer { data, .. } => {
                self.transport.accept_answer(data).await?;
            }
            SignalEnvelope::IceCandidate { data, .. } => {
                self.transport.add_remote_candidate(data).await?;
            }
            SignalEnvelope::Reveal { data, .. } => {
                info!("Reveal received in room {}", self.room_id);
                self.reveal_messages.push(data.message.clone());
            }
        }

        Ok(())
    }

    async fn offer_if_stable(&mut self) -> Result<(), PeerNegotiatorError> {
        self.role = PeerRole::Offerer;
        if self.offer_sent {
            return Ok(());
        }
        // Offering while a negotiation is already in flight causes glare;
        // the in-flight exchange will finish the job.
        if !self.transport.signaling_stable().await {
            debug!(
                "Peer {} deferring offer, signaling not stable",
                self.local_id
            );
            return Ok(());
        }

        let offer = self.transport.create_offer().await?;
        self.offer_sent = true;
        self.phase = ConnectionPhase::Offering;
        self.relay
            .publish(
                &self.room_id,
                &SignalEnvelope::Offer {
                    sender_id: self.local_id.clone(),
                    data: offer,
                },
            )
            .await?;
        Ok(())
    }
}
