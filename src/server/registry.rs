//! Room registry: the only place rooms are created or removed.
//!
//! Lock order is registry -> room. Removal marks the room retired while both
//! locks are held, so a join that grabbed the old `Arc<Room>` just before
//! removal sees `RoomNotFound` and retries against a fresh room.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Mutex;
use tokio::time::Instant;

use crate::error::GameError;
use crate::game::{validate_name, RoomEvent};
use crate::server::room::{Room, RoomRules};

#[derive(Debug, Default)]
pub struct RoomRegistry {
    rooms: Mutex<HashMap<String, Arc<Room>>>,
    rules: Arc<RoomRules>,
}

impl RoomRegistry {
    pub fn new(rules: RoomRules) -> Self {
        Self {
            rooms: Mutex::new(HashMap::new()),
            rules: Arc::new(rules),
        }
    }

    /// Concurrent callers with the same name always get the same instance.
    pub async fn get_or_create(&self, name: &str) -> Arc<Room> {
        let mut rooms = self.rooms.lock().await;
        if let Some(room) = rooms.get(name) {
            return Arc::clone(room);
        }
        let room = Arc::new(Room::new(name, Arc::clone(&self.rules)));
        rooms.insert(name.to_string(), Arc::clone(&room));
        tracing::debug!(room = %name, "room created");
        room
    }

    pub async fn get(&self, name: &str) -> Result<Arc<Room>, GameError> {
        self.rooms
            .lock()
            .await
            .get(name)
            .cloned()
            .ok_or_else(|| GameError::RoomNotFound(name.to_string()))
    }

    /// Join `player` to `room`, creating the room if needed. A bad name is
    /// rejected before any room is created.
    pub async fn join(
        &self,
        room: &str,
        player: &str,
    ) -> Result<(Arc<Room>, Arc<RoomEvent>), GameError> {
        let player = validate_name(player)?;
        loop {
            let handle = self.get_or_create(room).await;
            match handle.join(player).await {
                Err(GameError::RoomNotFound(_)) => {
                    tracing::debug!(room, player, "room retired during join, retrying");
                    continue;
                }
                other => return other.map(|event| (handle, event)),
            }
        }
    }

    /// Drop `name` if its roster is empty. Returns whether it was removed.
    pub async fn remove(&self, name: &str) -> bool {
        let mut rooms = self.rooms.lock().await;
        let Some(room) = rooms.get(name) else {
            return false;
        };
        if !room.retire_if_idle(Duration::ZERO, Instant::now()).await {
            return false;
        }
        rooms.remove(name);
        tracing::info!(room = %name, "room removed");
        true
    }

    /// Remove every room whose roster has been empty for at least `idle`.
    pub async fn sweep_idle(&self, idle: Duration) -> Vec<String> {
        let mut rooms = self.rooms.lock().await;
        let now = Instant::now();
        let mut removed = Vec::new();
        for (name, room) in rooms.iter() {
            if room.retire_if_idle(idle, now).await {
                removed.push(name.clone());
            }
        }
        for name in &removed {
            rooms.remove(name);
            tracing::info!(room = %name, "idle room removed");
        }
        removed
    }

    pub async fn len(&self) -> usize {
        self.rooms.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.rooms.lock().await.is_empty()
    }

    pub async fn room_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.rooms.lock().await.keys().cloned().collect();
        names.sort();
        names
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use castlefall_shared::LeaveReason;

    #[tokio::test]
    async fn get_or_create_returns_one_instance() {
        let registry = Arc::new(RoomRegistry::default());
        let mut tasks = Vec::new();
        for _ in 0..8 {
            let registry = Arc::clone(&registry);
            tasks.push(tokio::spawn(
                async move { registry.get_or_create("R1").await },
            ));
        }
        let mut rooms = Vec::new();
        for t in tasks {
            rooms.push(t.await.unwrap());
        }
        assert!(rooms.iter().all(|r| Arc::ptr_eq(r, &rooms[0])));
        assert_eq!(registry.len().await, 1);
    }

    #[tokio::test]
    async fn unknown_room_is_not_found() {
        let registry = RoomRegistry::default();
        assert_eq!(
            registry.get("nope").await.err(),
            Some(GameError::RoomNotFound("nope".into()))
        );
    }

    #[tokio::test]
    async fn invalid_name_creates_no_room() {
        let registry = RoomRegistry::default();
        assert_eq!(
            registry.join("R1", "   ").await.err(),
            Some(GameError::InvalidName)
        );
        let long = "x".repeat(crate::game::MAX_NAME_LEN + 1);
        assert_eq!(
            registry.join("R1", &long).await.err(),
            Some(GameError::InvalidName)
        );
        assert!(registry.is_empty().await);
    }

    #[tokio::test]
    async fn occupied_room_is_not_removed() {
        let registry = RoomRegistry::default();
        let (room, _) = registry.join("R1", "Alice").await.unwrap();
        assert!(!registry.remove("R1").await);

        room.leave("Alice", LeaveReason::Left).await.unwrap();
        assert!(registry.remove("R1").await);
        assert!(registry.is_empty().await);
        assert!(!registry.remove("R1").await);
    }

    #[tokio::test]
    async fn join_after_removal_gets_fresh_room() {
        let registry = RoomRegistry::default();
        let (old, _) = registry.join("R1", "Alice").await.unwrap();
        old.leave("Alice", LeaveReason::Left).await.unwrap();
        assert!(registry.remove("R1").await);

        // A stale handle refuses commands; the registry hands out a new room.
        assert!(matches!(
            old.join("Bob").await,
            Err(GameError::RoomNotFound(_))
        ));
        let (fresh, event) = registry.join("R1", "Bob").await.unwrap();
        assert!(!Arc::ptr_eq(&old, &fresh));
        assert_eq!(event.seq, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn sweep_removes_only_idle_empty_rooms() {
        let registry = RoomRegistry::default();
        registry.join("busy", "Alice").await.unwrap();
        let (quiet, _) = registry.join("quiet", "Bob").await.unwrap();
        quiet.leave("Bob", LeaveReason::Left).await.unwrap();

        let idle = Duration::from_secs(60);
        assert!(registry.sweep_idle(idle).await.is_empty());

        tokio::time::advance(Duration::from_secs(61)).await;
        assert_eq!(registry.sweep_idle(idle).await, vec!["quiet".to_string()]);
        assert_eq!(registry.room_names().await, vec!["busy".to_string()]);
    }
}
