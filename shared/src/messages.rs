//! Client-server messaging protocol for Castlefall rooms.

use serde::{Deserialize, Serialize};

use crate::event::EventEnvelope;
use crate::room::{ErrorCode, RoomSnapshot};

/// Messages that clients can send to the server
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", content = "data")]
pub enum ClientMsg {
    /// Bind this connection to `name` in `room`. `from` requests replay from a
    /// given sequence number instead of the default.
    Join {
        room: String,
        name: String,
        #[serde(default)]
        from: Option<u64>,
    },
    /// Start a round; without `words` the server's default pool is used.
    StartRound {
        #[serde(default)]
        words: Option<Vec<String>>,
    },
    StartDeclaration,
    /// Claim victory; defaults to the caller's own name.
    DeclareWin {
        #[serde(default)]
        name: Option<String>,
    },
    Leave,
    Kick {
        name: String,
    },
    NewGame,
    /// Acknowledge delivery of every event up to and including `seq`.
    Ack {
        seq: u64,
    },
    Ping,
}

/// Messages that the server can send to clients
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", content = "data")]
pub enum ServerMsg {
    Welcome {
        room: String,
        you: String,
        /// True when a detached session was picked up again.
        resumed: bool,
        snapshot: RoomSnapshot,
    },
    Event(EventEnvelope),
    /// The command succeeded; `seq` is the event it produced, if any.
    Accepted {
        seq: Option<u64>,
    },
    Error {
        code: ErrorCode,
        message: String,
    },
    Kicked,
    RoomClosed,
    Pong,
}
