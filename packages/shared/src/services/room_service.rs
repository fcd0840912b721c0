use std::sync::Arc;

use tracing::debug;

use crate::models::room::Room;
use crate::repositories::room_repository::RoomRepository;
use crate::services::errors::room_service_errors::RoomServiceError;

#[derive(Clone)]
pub struct RoomService {
    rooms: Arc<dyn RoomRepository>,
}

impl RoomService {
    pub fn new(rooms: Arc<dyn RoomRepository>) -> Self {
        RoomService { rooms }
    }

    pub async fn get_room(&self, room_id: &str) -> Result<Room, RoomServiceError> {
        self.rooms
            .get_room(room_id)
            .await?
            .ok_or(RoomServiceError::RoomNotFound)
    }

    /// Marks the participant as alive in the room.
    pub async fn heartbeat(&self, room_id: &str, user_id: &str) -> Result<(), RoomServiceError> {
        self.rooms.touch_participant(room_id, user_id).await?;
        debug!("Heartbeat from {} in room {}", user_id, room_id);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::room::RoomParticipant;
    use crate::repositories::errors::room_repository_errors::RoomRepositoryError;
    use async_trait::async_trait;
    use std::collections::HashSet;
    use std::sync::Mutex;

    #[derive(Default)]
    struct MockRoomRepo {
        rooms: Mutex<Vec<Room>>,
        participants: Mutex<HashSet<(String, String)>>,
        touched: Mutex<Vec<(String, String)>>,
    }

    impl MockRoomRepo {
        fn with_room(room_id: &str, user_ids: &[&str]) -> Self {
            let repo = MockRoomRepo::default();
            repo.rooms.lock().unwrap().push(Room::new(room_id));
            let mut participants = repo.participants.lock().unwrap();
            for user_id in user_ids {
                participants.insert((room_id.to_string(), user_id.to_string()));
            }
            drop(participants);
            repo
        }
    }

    #[async_trait]
    impl RoomRepository for MockRoomRepo {
        async fn create_room(
            &self,
            room: &Room,
            participants: &[RoomParticipant],
        ) -> Result<(), RoomRepositoryError> {
            self.rooms.lock().unwrap().push(room.clone());
            let mut known = self.participants.lock().unwrap();
            for participant in participants {
                known.insert((participant.room_id.clone(), participant.user_id.clone()));
            }
            Ok(())
        }

        async fn get_room(&self, room_id: &str) -> Result<Option<Room>, RoomRepositoryError> {
            Ok(self
                .rooms
                .lock()
                .unwrap()
                .iter()
                .find(|room| room.id == room_id)
                .cloned())
        }

        async fn touch_participant(
            &self,
            room_id: &str,
            user_id: &str,
        ) -> Result<(), RoomRepositoryError> {
            let key = (room_id.to_string(), user_id.to_string());
            if !self.participants.lock().unwrap().contains(&key) {
                return Err(RoomRepositoryError::ParticipantNotFound);
            }
            self.touched.lock().unwrap().push(key);
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_get_room_returns_existing_room() {
        let repo = Arc::new(MockRoomRepo::with_room("room-1", &["user-a", "user-b"]));
        let service = RoomService::new(repo);

        let room = service.get_room("room-1").await.unwrap();
        assert_eq!(room.id, "room-1");
    }

    #[tokio::test]
    async fn test_get_room_rejects_unknown_id() {
        let repo = Arc::new(MockRoomRepo::default());
        let service = RoomService::new(repo);

        let result = service.get_room("missing").await;
        assert!(matches!(result, Err(RoomServiceError::RoomNotFound)));
    }

    #[tokio::test]
    async fn test_heartbeat_touches_the_participant() {
        let repo = Arc::new(MockRoomRepo::with_room("room-1", &["user-a"]));
        let service = RoomService::new(repo.clone());

        service.heartbeat("room-1", "user-a").await.unwrap();

        assert_eq!(
            *repo.touched.lock().unwrap(),
            vec![("room-1".to_string(), "user-a".to_string())]
        );
    }

    #[tokio::test]
    async fn test_heartbeat_from_a_stranger_is_rejected() {
        let repo = Arc::new(MockRoomRepo::with_room("room-1", &["user-a"]));
        let service = RoomService::new(repo);

        let result = service.heartbeat("room-1", "user-z").await;
        assert!(matches!(
            result,
            Err(RoomServiceError::ParticipantNotFound)
        ));
    }
}
