//! Game-level errors returned to the caller of a room command.

use castlefall_shared::{ErrorCode, Phase};
use thiserror::Error;

/// A rejected command. Returning one of these guarantees the room was not
/// mutated and no event was appended.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GameError {
    #[error("name '{0}' is already taken in this room")]
    NameTaken(String),
    #[error("player names must be 1-32 characters")]
    InvalidName,
    #[error("{command} is not allowed while the room is in {phase:?}")]
    InvalidPhase { command: &'static str, phase: Phase },
    #[error("a winner has already been declared this round")]
    PhaseClosed,
    #[error("room '{0}' does not exist")]
    RoomNotFound(String),
    #[error("player '{0}' is not in the room")]
    UnknownPlayer(String),
    #[error("the room has no players")]
    EmptyRoster,
    #[error("the word pool does not hold enough words for this assignment policy")]
    EmptyWordPool,
    #[error("claim by '{0}' was rejected")]
    ClaimRejected(String),
    #[error("join a room first")]
    NotJoined,
    #[error("this connection already joined room '{0}'")]
    AlreadyJoined(String),
}

impl GameError {
    pub fn code(&self) -> ErrorCode {
        match self {
            GameError::NameTaken(_) => ErrorCode::NameTaken,
            GameError::InvalidName => ErrorCode::InvalidName,
            GameError::InvalidPhase { .. } => ErrorCode::InvalidPhase,
            GameError::PhaseClosed => ErrorCode::PhaseClosed,
            GameError::RoomNotFound(_) => ErrorCode::RoomNotFound,
            GameError::UnknownPlayer(_) => ErrorCode::UnknownPlayer,
            GameError::EmptyRoster => ErrorCode::EmptyRoster,
            GameError::EmptyWordPool => ErrorCode::EmptyWordPool,
            GameError::ClaimRejected(_) => ErrorCode::ClaimRejected,
            GameError::NotJoined => ErrorCode::NotJoined,
            GameError::AlreadyJoined(_) => ErrorCode::AlreadyJoined,
        }
    }

    /// Wire form of the error.
    pub fn to_server_msg(&self) -> castlefall_shared::ServerMsg {
        castlefall_shared::ServerMsg::Error {
            code: self.code(),
            message: self.to_string(),
        }
    }
}
