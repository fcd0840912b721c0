use std::sync::Arc;

use tracing::{info, warn};

use crate::models::matchmaking::responses::MatchResult;
use crate::models::matchmaking::{
    MatchCandidate, MatchEventKind, MatchHistoryEvent, MatchQuality, MatchQueueEntry,
};
use crate::models::room::{Room, RoomParticipant};
use crate::repositories::match_queue_repository::MatchQueueRepository;
use crate::repositories::room_repository::RoomRepository;
use crate::repositories::similarity_provider::SimilarityProvider;
use crate::services::errors::matchmaking_service_errors::MatchmakingServiceError;

/// History window feeding the vibe score.
const VIBE_HISTORY_WINDOW: usize = 20;
/// Wait time at which the fairness bonus saturates.
const WAIT_BONUS_CEILING_SECONDS: f64 = 600.0;
/// How many candidates to consider per attempt before giving up.
const CANDIDATE_LIMIT: usize = 10;
/// Similarity assigned to FIFO-fallback candidates with no vector score.
const NEUTRAL_SIMILARITY: f64 = 0.5;

/// The scored matcher. Unlike the plain queue it keeps durable queue rows,
/// blends several signals into one compatibility score, and marks both rows
/// in a single transaction so no row is ever paired twice.
#[derive(Clone)]
pub struct MatchmakingService {
    queue: Arc<dyn MatchQueueRepository>,
    rooms: Arc<dyn RoomRepository>,
    similarity: Arc<dyn SimilarityProvider>,
}

impl MatchmakingService {
    pub fn new(
        queue: Arc<dyn MatchQueueRepository>,
        rooms: Arc<dyn RoomRepository>,
        similarity: Arc<dyn SimilarityProvider>,
    ) -> Self {
        MatchmakingService {
            queue,
            rooms,
            similarity,
        }
    }

    pub async fn enqueue(
        &self,
        user_id: &str,
        mode: &str,
        interests: Vec<String>,
        comfort_level: i32,
    ) -> Result<(), MatchmakingServiceError> {
        let history = self
            .queue
            .recent_history(user_id, VIBE_HISTORY_WINDOW)
            .await?;
        let vibe_score = vibe_score_from_history(&history);

        let entry = MatchQueueEntry::new(user_id, mode, interests, comfort_level, vibe_score);
        self.queue.upsert_entry(&entry).await?;

        info!(
            "User {} enqueued for mode {} with vibe score {}",
            user_id, mode, vibe_score
        );
        Ok(())
    }

    pub async fn find_match(
        &self,
        user_id: &str,
        mode: &str,
    ) -> Result<MatchResult, MatchmakingServiceError> {
        let requester = self
            .queue
            .get_entry(user_id)
            .await?
            .ok_or(MatchmakingServiceError::NotEnqueued)?;

        if let Some(room_id) = &requester.room_id {
            // Claimed by a concurrent partner between enqueue and this poll.
            if let Some(partner_id) = &requester.matched_with {
                return Ok(MatchResult::matched(
                    partner_id.clone(),
                    room_id.clone(),
                    NEUTRAL_SIMILARITY,
                    MatchQuality::from_score(NEUTRAL_SIMILARITY),
                ));
            }
        }

        let candidates = self.ranked_candidates(&requester, mode).await?;
        if candidates.is_empty() {
            return Ok(MatchResult::no_candidates());
        }

        for candidate in candidates {
            let score = compatibility_score(&requester, &candidate);
            let room_id = Room::generate_code();

            // The transaction fails cleanly when either row was matched
            // concurrently; move on to the next candidate.
            if !self
                .queue
                .claim_pair(user_id, &candidate.user_id, &room_id)
                .await?
            {
                info!(
                    "Candidate {} was claimed concurrently, trying next",
                    candidate.user_id
                );
                continue;
            }

            let room = Room::new(&room_id);
            let participants = [
                RoomParticipant::new(&room_id, user_id),
                RoomParticipant::new(&room_id, &candidate.user_id),
            ];
            self.rooms.create_room(&room, &participants).await?;

            self.queue
                .append_history(&MatchHistoryEvent::new(user_id, MatchEventKind::Matched))
                .await?;
            self.queue
                .append_history(&MatchHistoryEvent::new(
                    &candidate.user_id,
                    MatchEventKind::Matched,
                ))
                .await?;

            let quality = MatchQuality::from_score(score);
            info!(
                "Matched {} with {} in room {} (score {:.2}, {:?})",
                user_id, candidate.user_id, room_id, score, quality
            );
            return Ok(MatchResult::matched(
                candidate.user_id,
                room_id,
                score,
                quality,
            ));
        }

        Ok(MatchResult::no_candidates())
    }

    /// Similarity-ranked candidates when the provider has them; otherwise the
    /// oldest waiting rows for the mode with a neutral similarity. A provider
    /// error degrades to the fallback rather than failing the match.
    async fn ranked_candidates(
        &self,
        requester: &MatchQueueEntry,
        mode: &str,
    ) -> Result<Vec<MatchCandidate>, MatchmakingServiceError> {
        let ranked = match self
            .similarity
            .ranked_candidates(&requester.user_id, mode, CANDIDATE_LIMIT)
            .await
        {
            Ok(ranked) => ranked,
            Err(e) => {
                warn!("Similarity provider unavailable, falling back to FIFO: {}", e);
                Vec::new()
            }
        };

        let mut candidates = Vec::new();
        for ranked_candidate in ranked {
            if let Some(entry) = self.queue.get_entry(&ranked_candidate.user_id).await? {
                if entry.is_waiting() && entry.user_id != requester.user_id {
                    candidates.push(candidate_from_entry(
                        requester,
                        &entry,
                        ranked_candidate.similarity,
                    ));
                }
            }
        }

        if candidates.is_empty() {
            let waiting = self
                .queue
                .oldest_waiting(mode, &requester.user_id, CANDIDATE_LIMIT)
                .await?;
            for entry in &waiting {
                candidates.push(candidate_from_entry(requester, entry, NEUTRAL_SIMILARITY));
            }
        }

        Ok(candidates)
    }
}

fn candidate_from_entry(
    requester: &MatchQueueEntry,
    entry: &MatchQueueEntry,
    similarity: f64,
) -> MatchCandidate {
    let overlap = entry
        .interests
        .iter()
        .filter(|interest| requester.interests.contains(interest))
        .count();

    MatchCandidate {
        user_id: entry.user_id.clone(),
        similarity_score: similarity,
        interest_overlap_count: overlap,
        vibe_score: entry.vibe_score,
        waiting_since: entry.waiting_since,
    }
}

/// Weighted blend in [0, 1]: similarity 0.4, normalized interest overlap 0.2,
/// vibe 0.3, wait-time fairness bonus 0.1.
pub fn compatibility_score(requester: &MatchQueueEntry, candidate: &MatchCandidate) -> f64 {
    let overlap_ceiling = requester.interests.len().max(1) as f64;
    let overlap = (candidate.interest_overlap_count as f64 / overlap_ceiling).min(1.0);

    let waited_seconds = (chrono::Utc::now() - candidate.waiting_since)
        .num_seconds()
        .max(0) as f64;
    let wait_bonus = (waited_seconds / WAIT_BONUS_CEILING_SECONDS).min(1.0);

    0.4 * candidate.similarity_score
        + 0.2 * overlap
        + 0.3 * (candidate.vibe_score as f64 / 100.0)
        + 0.1 * wait_bonus
}

/// Reputation-like scalar from recent history. New users start neutral at 50.
pub fn vibe_score_from_history(events: &[MatchHistoryEvent]) -> i32 {
    let mut score = 50;
    for event in events.iter().take(VIBE_HISTORY_WINDOW) {
        score += match event.kind {
            MatchEventKind::Liked => 5,
            MatchEventKind::LongMatch => 3,
            MatchEventKind::MessageRich => 2,
            MatchEventKind::Skipped => -1,
            MatchEventKind::Reported => -10,
            MatchEventKind::Matched => 0,
        };
    }
    score.clamp(0, 100)
}
