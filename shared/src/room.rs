//! Room-level public state and error codes.

use serde::{Deserialize, Serialize};

/// Where a room is in its round cycle.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Default)]
pub enum Phase {
    #[default]
    Lobby,
    RoundActive,
    Declaring,
    Resolved,
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub enum DeclarationState {
    NotStarted,
    InProgress,
    Resolved,
}

impl Phase {
    pub fn declaration(self) -> DeclarationState {
        match self {
            Phase::Lobby | Phase::RoundActive => DeclarationState::NotStarted,
            Phase::Declaring => DeclarationState::InProgress,
            Phase::Resolved => DeclarationState::Resolved,
        }
    }
}

/// Point-in-time view of a room. `your_word` is only filled for the viewer.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct RoomSnapshot {
    pub room: String,
    pub round: u32,
    pub phase: Phase,
    pub players: Vec<String>,
    pub words: Vec<String>,
    #[serde(default)]
    pub your_word: Option<String>,
    #[serde(default)]
    pub winner: Option<String>,
    /// Last sequence number issued by the room's event log.
    pub head: u64,
}

/// Stable error codes returned to the command's caller.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub enum ErrorCode {
    NameTaken,
    InvalidName,
    InvalidPhase,
    PhaseClosed,
    RoomNotFound,
    UnknownPlayer,
    EmptyRoster,
    EmptyWordPool,
    ClaimRejected,
    NotJoined,
    AlreadyJoined,
    Malformed,
}
