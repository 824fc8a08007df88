//! Connection manager: binds transport connections to (room, player) seats
//! and keeps a seat warm for a grace period after the transport drops.
//!
//! Seats live in their room, so joins, leaves and kicks in different rooms
//! never contend. Lock order is registry -> room seats -> room state; the
//! registry lock is released before a seat table is locked. Acks touch no
//! lock at all.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use castlefall_shared::LeaveReason;
use tokio::task::JoinHandle;

use crate::error::GameError;
use crate::game::{validate_name, RoomEvent};
use crate::server::registry::RoomRegistry;
use crate::server::room::Room;

pub type ConnectionId = u64;

/// Seats of one room, keyed by player name.
pub(crate) type SeatTable = HashMap<String, Seat>;

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct SessionKey {
    pub room: String,
    pub name: String,
}

/// Highest sequence number a client has confirmed. Shared between the seat
/// and the connection bound to it.
#[derive(Clone, Debug, Default)]
pub struct AckCursor(Arc<AtomicU64>);

impl AckCursor {
    pub fn ack(&self, seq: u64) {
        self.0.fetch_max(seq, Ordering::Relaxed);
    }

    pub fn get(&self) -> u64 {
        self.0.load(Ordering::Relaxed)
    }
}

#[derive(Debug)]
enum Presence {
    Live(ConnectionId),
    /// Transport gone; `timer` issues the timed-out leave unless the player
    /// comes back first. `epoch` tells a stale timer apart from the current one.
    Detached { epoch: u64, timer: JoinHandle<()> },
}

#[derive(Debug)]
pub(crate) struct Seat {
    presence: Presence,
    acked: AckCursor,
    /// Sequence of the `PlayerJoined` that opened this seat.
    joined_seq: u64,
}

/// Result of a successful `attach`.
#[derive(Debug)]
pub struct Attachment {
    pub key: SessionKey,
    pub room: Arc<Room>,
    /// True when a detached session was picked up again (no event emitted).
    pub resumed: bool,
    /// First sequence number the connection should be sent.
    pub replay_from: u64,
    /// Events at or below this sequence predate the seat.
    pub joined_seq: u64,
    pub acked: AckCursor,
}

#[derive(Debug)]
pub struct SessionManager {
    registry: Arc<RoomRegistry>,
    grace: Duration,
    next_conn: AtomicU64,
    next_epoch: AtomicU64,
}

impl SessionManager {
    pub fn new(registry: Arc<RoomRegistry>, grace: Duration) -> Self {
        Self {
            registry,
            grace,
            next_conn: AtomicU64::new(1),
            next_epoch: AtomicU64::new(1),
        }
    }

    pub fn registry(&self) -> &Arc<RoomRegistry> {
        &self.registry
    }

    pub fn next_connection_id(&self) -> ConnectionId {
        self.next_conn.fetch_add(1, Ordering::Relaxed)
    }

    /// Bind `conn` to `name` in `room`.
    ///
    /// A detached seat is resumed and replay continues after the last
    /// acknowledged event; a live seat is `NameTaken`; otherwise the player
    /// joins the room and replay starts at their own `PlayerJoined`. `from`
    /// overrides the replay start.
    pub async fn attach(
        &self,
        room: &str,
        name: &str,
        conn: ConnectionId,
        from: Option<u64>,
    ) -> Result<Attachment, GameError> {
        let key = SessionKey {
            room: room.to_string(),
            name: validate_name(name)?.to_string(),
        };

        loop {
            let handle = self.registry.get_or_create(room).await;
            let mut seats = handle.seats().lock().await;

            if let Some(seat) = seats.get_mut(&key.name) {
                if let Presence::Live(_) = seat.presence {
                    return Err(GameError::NameTaken(key.name));
                }
                if let Presence::Detached { timer, .. } =
                    std::mem::replace(&mut seat.presence, Presence::Live(conn))
                {
                    timer.abort();
                }
                let replay_from =
                    from.unwrap_or_else(|| (seat.acked.get() + 1).max(seat.joined_seq));
                tracing::info!(room = %key.room, player = %key.name, conn, replay_from, "session resumed");
                return Ok(Attachment {
                    room: Arc::clone(&handle),
                    resumed: true,
                    replay_from,
                    joined_seq: seat.joined_seq,
                    acked: seat.acked.clone(),
                    key,
                });
            }

            let event = match handle.join(&key.name).await {
                Err(GameError::RoomNotFound(_)) => {
                    tracing::debug!(room, player = %key.name, "room retired during join, retrying");
                    continue;
                }
                other => other?,
            };
            let acked = AckCursor::default();
            seats.insert(
                key.name.clone(),
                Seat {
                    presence: Presence::Live(conn),
                    acked: acked.clone(),
                    joined_seq: event.seq,
                },
            );
            drop(seats);
            tracing::debug!(room = %key.room, player = %key.name, conn, seq = event.seq, "session attached");
            return Ok(Attachment {
                key,
                room: handle,
                resumed: false,
                replay_from: from.unwrap_or(event.seq),
                joined_seq: event.seq,
                acked,
            });
        }
    }

    /// Transport for `conn` is gone. Keeps the seat and starts the grace timer.
    pub async fn detach(self: &Arc<Self>, key: &SessionKey, conn: ConnectionId) {
        let Ok(room) = self.registry.get(&key.room).await else {
            return;
        };
        let mut seats = room.seats().lock().await;
        let Some(seat) = seats.get_mut(&key.name) else {
            return;
        };
        if !matches!(seat.presence, Presence::Live(c) if c == conn) {
            return;
        }

        let epoch = self.next_epoch.fetch_add(1, Ordering::Relaxed);
        let manager = Arc::clone(self);
        let timer_key = key.clone();
        let grace = self.grace;
        let timer = tokio::spawn(async move {
            tokio::time::sleep(grace).await;
            manager.expire(&timer_key, epoch).await;
        });
        seat.presence = Presence::Detached { epoch, timer };
        tracing::info!(room = %key.room, player = %key.name, conn, grace_secs = grace.as_secs(), "connection lost, holding seat");
    }

    async fn expire(&self, key: &SessionKey, epoch: u64) {
        let room = match self.registry.get(&key.room).await {
            Ok(room) => room,
            Err(e) => {
                tracing::warn!(room = %key.room, player = %key.name, error = %e, "grace expiry found no room");
                return;
            }
        };
        let mut seats = room.seats().lock().await;
        let current = matches!(
            seats.get(&key.name),
            Some(Seat { presence: Presence::Detached { epoch: e, .. }, .. }) if *e == epoch
        );
        if !current {
            return;
        }
        seats.remove(&key.name);

        if let Err(e) = room.leave(&key.name, LeaveReason::TimedOut).await {
            tracing::warn!(room = %key.room, player = %key.name, error = %e, "grace expiry found no seat");
        }
    }

    /// Explicit `Leave` from the live connection `conn`.
    pub async fn release(
        &self,
        key: &SessionKey,
        conn: ConnectionId,
    ) -> Result<Arc<RoomEvent>, GameError> {
        let room = self
            .registry
            .get(&key.room)
            .await
            .map_err(|_| GameError::NotJoined)?;
        let mut seats = room.seats().lock().await;
        match seats.get(&key.name) {
            Some(Seat { presence: Presence::Live(c), .. }) if *c == conn => {}
            _ => return Err(GameError::NotJoined),
        }
        let event = room.leave(&key.name, LeaveReason::Left).await?;
        seats.remove(&key.name);
        Ok(event)
    }

    /// `by` removes `target` from the room; the target's seat is dropped with it.
    pub async fn kick(&self, by: &SessionKey, target: &str) -> Result<Arc<RoomEvent>, GameError> {
        let room = self.registry.get(&by.room).await?;
        let mut seats = room.seats().lock().await;
        let event = room.kick(&by.name, target).await?;
        Self::evict(&mut seats, target);
        Ok(event)
    }

    fn evict(seats: &mut SeatTable, name: &str) {
        if let Some(Seat {
            presence: Presence::Detached { timer, .. },
            ..
        }) = seats.remove(name)
        {
            timer.abort();
        }
    }

    pub async fn is_live(&self, key: &SessionKey) -> bool {
        let Ok(room) = self.registry.get(&key.room).await else {
            return false;
        };
        let seats = room.seats().lock().await;
        matches!(
            seats.get(&key.name),
            Some(Seat { presence: Presence::Live(_), .. })
        )
    }

    /// Seats held in `room`, live or detached.
    pub async fn seat_count(&self, room: &str) -> usize {
        match self.registry.get(room).await {
            Ok(room) => room.seats().lock().await.len(),
            Err(_) => 0,
        }
    }
}
