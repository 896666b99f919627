//! Room registry - maps room identifiers to running room actors.
//!
//! Resolution is a single critical section over the whole map: two
//! concurrent resolvers of an unseen room observe one actor, never two.
//! The lock is never held while waiting on a room's command queue.
//!
//! Rooms live for the process lifetime unless idle eviction is enabled
//! with [`spawn_eviction_task`].

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Mutex;
use tokio::time::interval;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use roomcast_core::RoomId;

use crate::room::{spawn_room, Client, RoomError, RoomHandle, DEFAULT_ROOM_QUEUE};

/// Upper bound on the time between eviction sweeps.
const MAX_SWEEP_INTERVAL: Duration = Duration::from_secs(30);

/// Registry of live rooms.
pub struct RoomRegistry {
    rooms: Mutex<HashMap<RoomId, RoomHandle>>,

    /// Command queue depth for newly spawned rooms
    room_queue: usize,
}

impl RoomRegistry {
    /// Creates an empty registry.
    pub fn new(room_queue: usize) -> Self {
        Self {
            rooms: Mutex::new(HashMap::new()),
            room_queue,
        }
    }

    /// Returns the room for `room_id`, creating and starting it if needed.
    pub async fn resolve(&self, room_id: &RoomId) -> RoomHandle {
        let mut rooms = self.rooms.lock().await;
        self.resolve_locked(&mut rooms, room_id)
    }

    /// Resolves the room and registers `client` with it.
    ///
    /// The registry lock is not held while the room processes the Attach.
    /// If an eviction sweep retired the room in the meantime, the client
    /// is withdrawn from the retired room and attached again to the
    /// current one.
    ///
    /// # Errors
    ///
    /// - `RoomError::ChannelClosed` if the room actor has shut down
    pub async fn attach(&self, room_id: &RoomId, client: Client) -> Result<RoomHandle, RoomError> {
        loop {
            let room = self.resolve(room_id).await;
            room.attach(client.clone()).await?;

            if self.is_current(room_id, &room).await {
                return Ok(room);
            }

            debug!(
                room_id = %room_id,
                client_id = %client.id,
                "Room retired during attach, retrying"
            );
            room.detach(client.id.clone(), client.registration()).await?;
        }
    }

    async fn is_current(&self, room_id: &RoomId, room: &RoomHandle) -> bool {
        self.rooms
            .lock()
            .await
            .get(room_id)
            .is_some_and(|current| current.same_room(room))
    }

    fn resolve_locked(
        &self,
        rooms: &mut HashMap<RoomId, RoomHandle>,
        room_id: &RoomId,
    ) -> RoomHandle {
        if let Some(room) = rooms.get(room_id) {
            if room.is_connected() {
                return room.clone();
            }
            debug!(room_id = %room_id, "Replacing stopped room actor");
        }

        let room = spawn_room(room_id.clone(), self.room_queue);
        rooms.insert(room_id.clone(), room.clone());

        info!(
            room_id = %room_id,
            total_rooms = rooms.len(),
            "Room created"
        );

        room
    }

    /// Returns the number of rooms in the registry.
    pub async fn room_count(&self) -> usize {
        self.rooms.lock().await.len()
    }

    /// Checks if a room exists for `room_id` without creating it.
    pub async fn contains(&self, room_id: &RoomId) -> bool {
        self.rooms.lock().await.contains_key(room_id)
    }

    /// Removes rooms that have had no clients for at least `max_idle`.
    ///
    /// Rooms whose actor has stopped are removed as well. The first pass
    /// queries every room without holding the registry lock. Candidates
    /// are checked again under the lock before removal; an Attach that
    /// lands after that check is caught by `attach`, which retries on the
    /// replacement room. Returns the number of rooms removed.
    pub async fn sweep_idle(&self, max_idle: Duration) -> usize {
        let rooms: Vec<RoomHandle> = self.rooms.lock().await.values().cloned().collect();

        let mut expired = Vec::new();
        for room in rooms {
            if Self::is_expired(&room, max_idle).await {
                expired.push(room);
            }
        }

        let mut removed = 0;
        for room in expired {
            let mut rooms = self.rooms.lock().await;
            let still_current = rooms
                .get(room.room_id())
                .is_some_and(|current| current.same_room(&room));
            if !still_current || !Self::is_expired(&room, max_idle).await {
                continue;
            }

            rooms.remove(room.room_id());
            removed += 1;
            info!(room_id = %room.room_id(), "Idle room evicted");
        }

        removed
    }

    async fn is_expired(room: &RoomHandle, max_idle: Duration) -> bool {
        match room.stats().await {
            Ok(stats) => stats.idle_for_at_least(max_idle),
            Err(RoomError::ChannelClosed) => true,
        }
    }
}

impl Default for RoomRegistry {
    fn default() -> Self {
        Self::new(DEFAULT_ROOM_QUEUE)
    }
}

/// Spawn a background task that evicts rooms idle for `max_idle`.
///
/// Stops when `cancel_token` is cancelled.
pub fn spawn_eviction_task(
    registry: Arc<RoomRegistry>,
    max_idle: Duration,
    cancel_token: CancellationToken,
) -> tokio::task::JoinHandle<()> {
    let period = max_idle.clamp(Duration::from_secs(1), MAX_SWEEP_INTERVAL);

    tokio::spawn(async move {
        let mut ticker = interval(period);

        loop {
            tokio::select! {
                _ = cancel_token.cancelled() => {
                    debug!("Eviction task stopping");
                    break;
                }
                _ = ticker.tick() => {
                    let evicted = registry.sweep_idle(max_idle).await;
                    if evicted > 0 {
                        debug!(evicted, "Idle room sweep complete");
                    }
                }
            }
        }
    })
}
