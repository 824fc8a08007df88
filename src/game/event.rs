//! Internal room events and their per-viewer projection.

use std::time::{Duration, SystemTime, UNIX_EPOCH};

use castlefall_shared::{EventEnvelope, EventKind, LeaveReason};

use super::assign::WordAssignment;

/// Current wall-clock time in milliseconds.
pub fn unix_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or(Duration::from_secs(0))
        .as_millis() as u64
}

/// What happened, with every secret still attached. Never sent as-is.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RoomEventKind {
    PlayerJoined {
        name: String,
        word: Option<String>,
    },
    PlayerLeft {
        name: String,
        reason: LeaveReason,
    },
    RoundStarted {
        round: u32,
        players: Vec<String>,
        words: Vec<String>,
        assignment: WordAssignment,
    },
    DeclarationStarted {
        round: u32,
    },
    PlayerWon {
        name: String,
        word: Option<String>,
    },
    GameReset,
}

/// An appended log entry. Immutable once created.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RoomEvent {
    pub room: String,
    pub seq: u64,
    pub timestamp_ms: u64,
    pub kind: RoomEventKind,
}

impl RoomEvent {
    /// Wire form of this event as seen by `viewer` (`None` = spectator).
    /// Words are only revealed to the player holding them.
    pub fn view_for(&self, viewer: Option<&str>) -> EventEnvelope {
        let kind = match &self.kind {
            RoomEventKind::PlayerJoined { name, word } => EventKind::PlayerJoined {
                name: name.clone(),
                word: word.clone().filter(|_| viewer == Some(name.as_str())),
            },
            RoomEventKind::PlayerLeft { name, reason } => EventKind::PlayerLeft {
                name: name.clone(),
                reason: *reason,
            },
            RoomEventKind::RoundStarted {
                round,
                players,
                words,
                assignment,
            } => EventKind::RoundStarted {
                round: *round,
                players: players.clone(),
                words: words.clone(),
                word: viewer.and_then(|v| assignment.get(v).cloned()),
            },
            RoomEventKind::DeclarationStarted { round } => {
                EventKind::DeclarationStarted { round: *round }
            }
            RoomEventKind::PlayerWon { name, word } => EventKind::PlayerWon {
                name: name.clone(),
                word: word.clone(),
            },
            RoomEventKind::GameReset => EventKind::GameReset,
        };
        EventEnvelope {
            seq: self.seq,
            timestamp_ms: self.timestamp_ms,
            kind,
        }
    }

    /// True if this is `name` being kicked out of the room.
    pub fn kicks(&self, name: &str) -> bool {
        matches!(
            &self.kind,
            RoomEventKind::PlayerLeft { name: n, reason: LeaveReason::Kicked } if n == name
        )
    }
}
