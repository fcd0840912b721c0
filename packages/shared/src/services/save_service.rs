use std::sync::Arc;

use tracing::{error, info, warn};

use crate::models::friendship::responses::SaveStatus;
use crate::models::friendship::{Friendship, SaveIntent};
use crate::models::signaling::{RevealPayload, SignalEnvelope};
use crate::repositories::friendship_repository::FriendshipRepository;
use crate::repositories::signaling_relay::SignalPublisher;
use crate::services::errors::save_service_errors::SaveServiceError;

/// Sender id stamped on the reveal envelope. Not a real participant, so the
/// skip-sender fan-out delivers the reveal to both sides of the room.
const SYSTEM_SENDER_ID: &str = "system";

/// Turns two independent "save this chat" writes into exactly one friendship
/// and one reveal broadcast, no matter how the two requests interleave.
#[derive(Clone)]
pub struct SaveService {
    friendships: Arc<dyn FriendshipRepository>,
    publisher: Arc<dyn SignalPublisher>,
}

impl SaveService {
    pub fn new(
        friendships: Arc<dyn FriendshipRepository>,
        publisher: Arc<dyn SignalPublisher>,
    ) -> Self {
        SaveService {
            friendships,
            publisher,
        }
    }

    /// Records the caller's intent, then checks whether the partner already
    /// saved. The write-then-read order is what makes the saga safe: whichever
    /// request writes second is guaranteed to observe both intents, and the
    /// conditional friendship put deduplicates the case where both do.
    pub async fn register_save(
        &self,
        room_id: &str,
        user_id: &str,
        partner_id: &str,
    ) -> Result<SaveStatus, SaveServiceError> {
        let intent = SaveIntent::new(room_id, user_id);
        self.friendships.put_save_intent(&intent).await?;

        let partner_intent = self
            .friendships
            .get_save_intent(room_id, partner_id)
            .await?;
        if partner_intent.is_none() {
            info!(
                "User {} saved room {}, waiting on {}",
                user_id, room_id, partner_id
            );
            return Ok(SaveStatus::Pending);
        }

        let friendship = Friendship::new(user_id, partner_id);
        let created = match self.friendships.upsert_friendship(&friendship).await {
            Ok(created) => created,
            Err(e) => {
                // Both intents are durable, so a later save completes the
                // friendship. The missed reveal is the real loss here.
                error!(
                    "Friendship write failed for room {} pair {}: {}",
                    room_id,
                    friendship.pair_key(),
                    e
                );
                return Ok(SaveStatus::Pending);
            }
        };

        // Only the creating call broadcasts the reveal, so a double-fire is
        // impossible even when both saves land simultaneously.
        if created {
            info!(
                "Mutual save in room {}: friendship {} created",
                room_id,
                friendship.pair_key()
            );
            let reveal = SignalEnvelope::Reveal {
                sender_id: SYSTEM_SENDER_ID.to_string(),
                data: RevealPayload {
                    message: "Both of you saved this chat".to_string(),
                },
            };
            // The friendship is durable either way; a failed broadcast is not
            // worth failing the request over.
            if let Err(e) = self.publisher.publish(room_id, &reveal).await {
                warn!("Failed to broadcast reveal for room {}: {}", room_id, e);
            }
        }

        Ok(SaveStatus::Mutual)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repositories::errors::friendship_repository_errors::FriendshipRepositoryError;
    use crate::repositories::signaling_relay::SignalingRelayError;
    use async_trait::async_trait;
    use std::collections::{HashMap, HashSet};
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Mutex;

    #[derive(Default)]
    struct MockFriendshipRepo {
        intents: Mutex<HashMap<(String, String), SaveIntent>>,
        friendships: Mutex<HashMap<String, Friendship>>,
        fail_upsert: AtomicBool,
    }

    #[async_trait]
    impl FriendshipRepository for MockFriendshipRepo {
        async fn put_save_intent(
            &self,
            intent: &SaveIntent,
        ) -> Result<(), FriendshipRepositoryError> {
            self.intents
                .lock()
                .unwrap()
                .entry((intent.room_id.clone(), intent.user_id.clone()))
                .or_insert_with(|| intent.clone());
            Ok(())
        }

        async fn get_save_intent(
            &self,
            room_id: &str,
            user_id: &str,
        ) -> Result<Option<SaveIntent>, FriendshipRepositoryError> {
            Ok(self
                .intents
                .lock()
                .unwrap()
                .get(&(room_id.to_string(), user_id.to_string()))
                .cloned())
        }

        async fn upsert_friendship(
            &self,
            friendship: &Friendship,
        ) -> Result<bool, FriendshipRepositoryError> {
            if self.fail_upsert.load(Ordering::SeqCst) {
                return Err(FriendshipRepositoryError::DynamoDb(
                    "connection refused".to_string(),
                ));
            }
            let mut friendships = self.friendships.lock().unwrap();
            if friendships.contains_key(&friendship.pair_key()) {
                return Ok(false);
            }
            friendships.insert(friendship.pair_key(), friendship.clone());
            Ok(true)
        }

        async fn get_friendship(
            &self,
            user_a: &str,
            user_b: &str,
        ) -> Result<Option<Friendship>, FriendshipRepositoryError> {
            let probe = Friendship::new(user_a, user_b);
            Ok(self
                .friendships
                .lock()
                .unwrap()
                .get(&probe.pair_key())
                .cloned())
        }
    }

    #[derive(Default)]
    struct RecordingPublisher {
        published: Mutex<Vec<(String, SignalEnvelope)>>,
    }

    impl RecordingPublisher {
        fn reveals_for(&self, room_id: &str) -> usize {
            self.published
                .lock()
                .unwrap()
                .iter()
                .filter(|(room, envelope)| {
                    room == room_id && matches!(envelope, SignalEnvelope::Reveal { .. })
                })
                .count()
        }
    }

    #[async_trait]
    impl SignalPublisher for RecordingPublisher {
        async fn publish(
            &self,
            room_id: &str,
            envelope: &SignalEnvelope,
        ) -> Result<(), SignalingRelayError> {
            self.published
                .lock()
                .unwrap()
                .push((room_id.to_string(), envelope.clone()));
            Ok(())
        }
    }

    fn service() -> (SaveService, Arc<MockFriendshipRepo>, Arc<RecordingPublisher>) {
        let repo = Arc::new(MockFriendshipRepo::default());
        let publisher = Arc::new(RecordingPublisher::default());
        (
            SaveService::new(repo.clone(), publisher.clone()),
            repo,
            publisher,
        )
    }

    #[tokio::test]
    async fn test_first_save_is_pending_and_reveals_nothing() {
        let (service, repo, publisher) = service();

        let status = service
            .register_save("room-1", "user-a", "user-b")
            .await
            .unwrap();

        assert_eq!(status, SaveStatus::Pending);
        assert!(repo
            .get_friendship("user-a", "user-b")
            .await
            .unwrap()
            .is_none());
        assert_eq!(publisher.reveals_for("room-1"), 0);
    }

    #[tokio::test]
    async fn test_second_save_creates_friendship_and_reveals_once() {
        let (service, repo, publisher) = service();

        service
            .register_save("room-1", "user-a", "user-b")
            .await
            .unwrap();
        let status = service
            .register_save("room-1", "user-b", "user-a")
            .await
            .unwrap();

        assert_eq!(status, SaveStatus::Mutual);
        let friendship = repo
            .get_friendship("user-b", "user-a")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(friendship.user1_id, "user-a");
        assert_eq!(publisher.reveals_for("room-1"), 1);
    }

    #[tokio::test]
    async fn test_repeated_saves_never_fire_a_second_reveal() {
        let (service, _, publisher) = service();

        service
            .register_save("room-1", "user-a", "user-b")
            .await
            .unwrap();
        service
            .register_save("room-1", "user-b", "user-a")
            .await
            .unwrap();

        let again = service
            .register_save("room-1", "user-a", "user-b")
            .await
            .unwrap();

        assert_eq!(again, SaveStatus::Mutual);
        assert_eq!(publisher.reveals_for("room-1"), 1);
    }

    #[tokio::test]
    async fn test_simultaneous_saves_produce_one_friendship_and_one_reveal() {
        let (service, repo, publisher) = service();

        let (left, right) = tokio::join!(
            service.register_save("room-1", "user-a", "user-b"),
            service.register_save("room-1", "user-b", "user-a"),
        );
        let statuses: HashSet<SaveStatus> = [left.unwrap(), right.unwrap()].into();

        // At least one side sees Mutual; both may, depending on interleaving.
        assert!(statuses.contains(&SaveStatus::Mutual));
        assert_eq!(repo.friendships.lock().unwrap().len(), 1);
        assert!(publisher.reveals_for("room-1") <= 1);
        if statuses.contains(&SaveStatus::Mutual) && !statuses.contains(&SaveStatus::Pending) {
            assert_eq!(publisher.reveals_for("room-1"), 1);
        }
    }

    #[tokio::test]
    async fn test_failed_friendship_write_degrades_to_pending() {
        let (service, repo, publisher) = service();

        service
            .register_save("room-1", "user-a", "user-b")
            .await
            .unwrap();
        repo.fail_upsert.store(true, Ordering::SeqCst);

        let status = service
            .register_save("room-1", "user-b", "user-a")
            .await
            .unwrap();
        assert_eq!(status, SaveStatus::Pending);
        assert_eq!(publisher.reveals_for("room-1"), 0);

        // A later save completes the friendship once the store recovers.
        repo.fail_upsert.store(false, Ordering::SeqCst);
        let retried = service
            .register_save("room-1", "user-b", "user-a")
            .await
            .unwrap();
        assert_eq!(retried, SaveStatus::Mutual);
        assert_eq!(publisher.reveals_for("room-1"), 1);
    }

    #[tokio::test]
    async fn test_reveal_carries_the_system_sender() {
        let (service, _, publisher) = service();

        service
            .register_save("room-1", "user-a", "user-b")
            .await
            .unwrap();
        service
            .register_save("room-1", "user-b", "user-a")
            .await
            .unwrap();

        let published = publisher.published.lock().unwrap();
        let (_, reveal) = published
            .iter()
            .find(|(_, envelope)| matches!(envelope, SignalEnvelope::Reveal { .. }))
            .unwrap();
        assert_eq!(reveal.sender_id(), SYSTEM_SENDER_ID);
    }
}
