use std::sync::Arc;

use tracing::{debug, info};

use crate::models::queue::responses::FindMatchResponse;
use crate::models::queue::{pool_keys, WaitingEntry};
use crate::models::room::Room;
use crate::repositories::waiting_pool_repository::WaitingPoolRepository;
use crate::services::errors::queue_service_errors::QueueServiceError;

/// How long a "you were matched" notice survives before the popped side is
/// considered gone and must re-enter the pool.
pub const MATCH_NOTICE_TTL_SECONDS: i64 = 30;

/// The plain queue matcher. Pops a waiting counterpart for the caller or
/// enqueues the caller; the popped partner learns about the match through a
/// short-lived notice consumed on its next poll.
#[derive(Clone)]
pub struct QueueService {
    pool: Arc<dyn WaitingPoolRepository>,
}

impl QueueService {
    pub fn new(pool: Arc<dyn WaitingPoolRepository>) -> Self {
        QueueService { pool }
    }

    pub async fn find_match(
        &self,
        user_id: &str,
        interest_tags: &[String],
    ) -> Result<FindMatchResponse, QueueServiceError> {
        // A previously-enqueued caller discovers here that someone else
        // already matched it; nothing is ever pushed to the waiting side.
        if let Some(room_id) = self.pool.take_match_notice(user_id).await? {
            info!("User {} consumed match notice for room {}", user_id, room_id);
            return Ok(FindMatchResponse::matched(room_id));
        }

        if !interest_tags.is_empty() {
            for tag in interest_tags {
                if let Some(partner_id) =
                    self.pool.pop_candidate(&pool_keys::tag(tag), user_id).await?
                {
                    debug!("User {} popped {} from tag {}", user_id, partner_id, tag);
                    return self.pair_with(user_id, &partner_id).await;
                }
            }

            // No interest partner anywhere. Wait under the tags only, not
            // the global queue: a later poll may still find an interest
            // partner, and a later tagged caller can pop this user.
            self.pool
                .register_interest_waiter(user_id, interest_tags)
                .await?;
            debug!("User {} waiting under {} tags", user_id, interest_tags.len());
            return Ok(FindMatchResponse::waiting());
        }

        if let Some(partner_id) = self.pool.pop_candidate(pool_keys::GLOBAL, user_id).await? {
            debug!("User {} popped {} from the global queue", user_id, partner_id);
            return self.pair_with(user_id, &partner_id).await;
        }

        self.pool.push_waiting(&WaitingEntry::global(user_id)).await?;
        debug!("User {} enqueued on the global queue", user_id);
        Ok(FindMatchResponse::waiting())
    }

    /// Removes every trace of the user from the pool: global entry, match
    /// notice, each interest set named in the reverse index, and the index
    /// itself. This must be exhaustive or stale membership leaks into future
    /// matches.
    pub async fn leave_queue(&self, user_id: &str) -> Result<(), QueueServiceError> {
        self.remove_memberships(user_id).await?;
        self.pool.delete_match_notice(user_id).await?;
        info!("User {} left the waiting pool", user_id);
        Ok(())
    }

    async fn pair_with(
        &self,
        user_id: &str,
        partner_id: &str,
    ) -> Result<FindMatchResponse, QueueServiceError> {
        // Both sides may still sit in other pools: the partner as a
        // multi-tag waiter, the caller from an earlier waiting poll. Clear
        // every stale membership now; a matched user must have no waiting
        // entries left or it can be handed out again.
        self.remove_memberships(user_id).await?;
        self.remove_memberships(partner_id).await?;

        let room_id = Room::generate_code();
        self.pool
            .put_match_notice(partner_id, &room_id, MATCH_NOTICE_TTL_SECONDS)
            .await?;

        info!(
            "Matched {} with {} in room {}",
            user_id, partner_id, room_id
        );
        Ok(FindMatchResponse::matched(room_id))
    }

    async fn remove_memberships(&self, user_id: &str) -> Result<(), QueueServiceError> {
        self.pool.remove_waiting(pool_keys::GLOBAL, user_id).await?;

        let tags = self.pool.interest_tags_for(user_id).await?;
        for tag in &tags {
            self.pool.remove_waiting(&pool_keys::tag(tag), user_id).await?;
        }
        self.pool.clear_interest_index(user_id).await?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repositories::errors::waiting_pool_repository_errors::WaitingPoolRepositoryError;
    use async_trait::async_trait;
    use chrono::{DateTime, Duration, Utc};
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Mutex;

    #[derive(Default)]
    struct PoolState {
        // pool_key -> members in insertion (FIFO) order
        pools: HashMap<String, Vec<String>>,
        // user -> (room_id, expires_at)
        notices: HashMap<String, (String, DateTime<Utc>)>,
        clock_skew_seconds: i64,
    }

    /// In-memory pool with an adjustable clock, mirroring the store's FIFO
    /// and TTL behavior closely enough for the matcher's contract.
    #[derive(Default)]
    struct MockWaitingPool {
        state: Mutex<PoolState>,
        unavailable: AtomicBool,
    }

    impl MockWaitingPool {
        fn new() -> Self {
            Self::default()
        }

        fn advance(&self, seconds: i64) {
            self.state.lock().unwrap().clock_skew_seconds += seconds;
        }

        fn set_unavailable(&self) {
            self.unavailable.store(true, Ordering::SeqCst);
        }

        fn check_available(&self) -> Result<(), WaitingPoolRepositoryError> {
            if self.unavailable.load(Ordering::SeqCst) {
                Err(WaitingPoolRepositoryError::DynamoDb(
                    "connection refused".to_string(),
                ))
            } else {
                Ok(())
            }
        }

        fn members(&self, pool_key: &str) -> Vec<String> {
            let state = self.state.lock().unwrap();
            state.pools.get(pool_key).cloned().unwrap_or_default()
        }
    }

    #[async_trait]
    impl WaitingPoolRepository for MockWaitingPool {
        async fn take_match_notice(
            &self,
            user_id: &str,
        ) -> Result<Option<String>, WaitingPoolRepositoryError> {
            self.check_available()?;
            let mut state = self.state.lock().unwrap();
            let now = Utc::now() + Duration::seconds(state.clock_skew_seconds);
            match state.notices.remove(user_id) {
                Some((room_id, expires_at)) if expires_at > now => Ok(Some(room_id)),
                _ => Ok(None),
            }
        }

        async fn put_match_notice(
            &self,
            user_id: &str,
            room_id: &str,
            ttl_seconds: i64,
        ) -> Result<(), WaitingPoolRepositoryError> {
            self.check_available()?;
            let mut state = self.state.lock().unwrap();
            let expires_at = Utc::now()
                + Duration::seconds(state.clock_skew_seconds)
                + Duration::seconds(ttl_seconds);
            state
                .notices
                .insert(user_id.to_string(), (room_id.to_string(), expires_at));
            Ok(())
        }

        async fn delete_match_notice(
            &self,
            user_id: &str,
        ) -> Result<(), WaitingPoolRepositoryError> {
            self.check_available()?;
            self.state.lock().unwrap().notices.remove(user_id);
            Ok(())
        }

        async fn pop_candidate(
            &self,
            pool_key: &str,
            exclude_user_id: &str,
        ) -> Result<Option<String>, WaitingPoolRepositoryError> {
            self.check_available()?;
            let mut state = self.state.lock().unwrap();
            let Some(members) = state.pools.get_mut(pool_key) else {
                return Ok(None);
            };
            let position = members.iter().position(|member| member != exclude_user_id);
            Ok(position.map(|index| members.remove(index)))
        }

        async fn push_waiting(
            &self,
            entry: &WaitingEntry,
        ) -> Result<(), WaitingPoolRepositoryError> {
            self.check_available()?;
            let mut state = self.state.lock().unwrap();
            let members = state.pools.entry(entry.pool_key.clone()).or_default();
            // Same (pool_key, member) overwrites, as a keyed store would.
            members.retain(|member| member != &entry.member_id);
            members.push(entry.member_id.clone());
            Ok(())
        }

        async fn register_interest_waiter(
            &self,
            user_id: &str,
            tags: &[String],
        ) -> Result<(), WaitingPoolRepositoryError> {
            for tag in tags {
                self.push_waiting(&WaitingEntry::for_tag(user_id, tag)).await?;
                let mut state = self.state.lock().unwrap();
                let index = state
                    .pools
                    .entry(pool_keys::tag_index(user_id))
                    .or_default();
                if !index.contains(tag) {
                    index.push(tag.clone());
                }
            }
            Ok(())
        }

        async fn interest_tags_for(
            &self,
            user_id: &str,
        ) -> Result<Vec<String>, WaitingPoolRepositoryError> {
            self.check_available()?;
            Ok(self.members(&pool_keys::tag_index(user_id)))
        }

        async fn remove_waiting(
            &self,
            pool_key: &str,
            user_id: &str,
        ) -> Result<(), WaitingPoolRepositoryError> {
            self.check_available()?;
            let mut state = self.state.lock().unwrap();
            if let Some(members) = state.pools.get_mut(pool_key) {
                members.retain(|member| member != user_id);
            }
            Ok(())
        }

        async fn clear_interest_index(
            &self,
            user_id: &str,
        ) -> Result<(), WaitingPoolRepositoryError> {
            self.check_available()?;
            self.state
                .lock()
                .unwrap()
                .pools
                .remove(&pool_keys::tag_index(user_id));
            Ok(())
        }
    }

    fn tags(names: &[&str]) -> Vec<String> {
        names.iter().map(|name| name.to_string()).collect()
    }

    #[tokio::test]
    async fn test_interest_match_notifies_the_waiting_side() {
        let pool = Arc::new(MockWaitingPool::new());
        let service = QueueService::new(pool);

        let first = service.find_match("user-a", &tags(&["music"])).await.unwrap();
        assert!(!first.matched);

        let second = service.find_match("user-b", &tags(&["music"])).await.unwrap();
        assert!(second.matched);
        let room_id = second.room_id.unwrap();

        // The waiting side polls again without re-enqueuing and reads the
        // notice for the same room.
        let third = service.find_match("user-a", &tags(&["music"])).await.unwrap();
        assert!(third.matched);
        assert_eq!(third.room_id.unwrap(), room_id);
    }

    #[tokio::test]
    async fn test_notice_is_consumed_exactly_once() {
        let pool = Arc::new(MockWaitingPool::new());
        let service = QueueService::new(pool);

        service.find_match("user-a", &[]).await.unwrap();
        service.find_match("user-b", &[]).await.unwrap();

        let first_poll = service.find_match("user-a", &[]).await.unwrap();
        assert!(first_poll.matched);

        // The notice is gone; the user is back to waiting.
        let second_poll = service.find_match("user-a", &[]).await.unwrap();
        assert!(!second_poll.matched);
    }

    #[tokio::test]
    async fn test_expired_notice_reads_as_still_waiting() {
        let pool = Arc::new(MockWaitingPool::new());
        let service = QueueService::new(pool.clone());

        service
            .find_match("user-a", &tags(&["music"]))
            .await
            .unwrap();
        let matched = service
            .find_match("user-b", &tags(&["music"]))
            .await
            .unwrap();
        assert!(matched.matched);

        pool.advance(MATCH_NOTICE_TTL_SECONDS + 1);

        let late_poll = service
            .find_match("user-a", &tags(&["music"]))
            .await
            .unwrap();
        assert!(!late_poll.matched);
    }

    #[tokio::test]
    async fn test_user_is_never_matched_with_itself() {
        let pool = Arc::new(MockWaitingPool::new());
        let service = QueueService::new(pool);

        let first = service.find_match("user-a", &[]).await.unwrap();
        assert!(!first.matched);

        // Only the caller itself waits in the queue; the pop must skip it.
        let second = service.find_match("user-a", &[]).await.unwrap();
        assert!(!second.matched);
    }

    #[tokio::test]
    async fn test_global_fifo_pairs_oldest_first() {
        let pool = Arc::new(MockWaitingPool::new());
        let service = QueueService::new(pool.clone());

        // Seed two waiters directly so both are queued when the caller polls.
        pool.push_waiting(&WaitingEntry::global("user-a")).await.unwrap();
        pool.push_waiting(&WaitingEntry::global("user-b")).await.unwrap();

        let result = service.find_match("user-c", &[]).await.unwrap();
        assert!(result.matched);

        // user-a was popped; user-b still waits.
        assert_eq!(pool.members(pool_keys::GLOBAL), vec!["user-b".to_string()]);
        let notice = service.find_match("user-a", &[]).await.unwrap();
        assert!(notice.matched);
        assert_eq!(notice.room_id, result.room_id);
    }

    #[tokio::test]
    async fn test_no_user_is_handed_to_two_concurrent_callers() {
        let pool = Arc::new(MockWaitingPool::new());
        let service = QueueService::new(pool);

        service.find_match("user-a", &[]).await.unwrap();

        let (left, right) = tokio::join!(
            service.find_match("user-b", &[]),
            service.find_match("user-c", &[]),
        );
        let left = left.unwrap();
        let right = right.unwrap();

        assert!(left.matched != right.matched, "exactly one caller wins the single waiter");
    }

    #[tokio::test]
    async fn test_leave_queue_removes_every_membership() {
        let pool = Arc::new(MockWaitingPool::new());
        let service = QueueService::new(pool.clone());

        service
            .find_match("user-a", &tags(&["music", "art"]))
            .await
            .unwrap();
        service.leave_queue("user-a").await.unwrap();

        let music = service.find_match("user-b", &tags(&["music"])).await.unwrap();
        assert!(!music.matched);
        let art = service.find_match("user-c", &tags(&["art"])).await.unwrap();
        assert!(!art.matched);
        assert!(pool.members(&pool_keys::tag_index("user-a")).is_empty());
    }

    #[tokio::test]
    async fn test_matched_partner_is_cleared_from_its_other_tag_sets() {
        let pool = Arc::new(MockWaitingPool::new());
        let service = QueueService::new(pool);

        service
            .find_match("user-a", &tags(&["music", "art"]))
            .await
            .unwrap();

        let matched = service.find_match("user-b", &tags(&["music"])).await.unwrap();
        assert!(matched.matched);

        // user-a was claimed through "music"; it must no longer be poppable
        // through "art".
        let stale = service.find_match("user-c", &tags(&["art"])).await.unwrap();
        assert!(!stale.matched);
    }

    #[tokio::test]
    async fn test_winning_caller_is_cleared_from_its_earlier_tag_sets() {
        let pool = Arc::new(MockWaitingPool::new());
        let service = QueueService::new(pool.clone());

        service
            .find_match("user-a", &tags(&["music"]))
            .await
            .unwrap();
        service.find_match("user-b", &[]).await.unwrap();

        // user-a comes back without tags and wins the global pop.
        let matched = service.find_match("user-a", &[]).await.unwrap();
        assert!(matched.matched);

        // user-a is already in a room; its stale "music" entry must not be
        // matchable anymore.
        let stale = service.find_match("user-c", &tags(&["music"])).await.unwrap();
        assert!(!stale.matched);
        assert_eq!(
            pool.members(&pool_keys::tag("music")),
            vec!["user-c".to_string()]
        );
    }

    #[tokio::test]
    async fn test_unreachable_store_fails_closed() {
        let pool = Arc::new(MockWaitingPool::new());
        pool.set_unavailable();
        let service = QueueService::new(pool);

        let result = service.find_match("user-a", &[]).await;
        assert!(matches!(
            result,
            Err(QueueServiceError::ServiceUnavailable(_))
        ));
    }
}
