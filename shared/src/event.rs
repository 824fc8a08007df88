//! Typed room events as delivered to a single viewer.

use serde::{Deserialize, Serialize};

/// Why a player left the roster.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub enum LeaveReason {
    /// The player sent `Leave`.
    Left,
    /// The reconnect grace period expired.
    TimedOut,
    /// Another player removed them.
    Kicked,
}

/// Event payloads. Fields marked viewer-only are `None` for everyone except
/// the player they belong to.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "kind")]
pub enum EventKind {
    PlayerJoined {
        name: String,
        /// Viewer-only: the word a late joiner received mid-round.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        word: Option<String>,
    },
    PlayerLeft {
        name: String,
        reason: LeaveReason,
    },
    RoundStarted {
        round: u32,
        players: Vec<String>,
        /// The round's word pool, shown to everyone.
        words: Vec<String>,
        /// Viewer-only.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        word: Option<String>,
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

impl EventKind {
    pub fn name(&self) -> &'static str {
        match self {
            EventKind::PlayerJoined { .. } => "PlayerJoined",
            EventKind::PlayerLeft { .. } => "PlayerLeft",
            EventKind::RoundStarted { .. } => "RoundStarted",
            EventKind::DeclarationStarted { .. } => "DeclarationStarted",
            EventKind::PlayerWon { .. } => "PlayerWon",
            EventKind::GameReset => "GameReset",
        }
    }
}

/// One entry of a room's event feed.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct EventEnvelope {
    pub seq: u64,
    pub timestamp_ms: u64,
    #[serde(flatten)]
    pub kind: EventKind,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hidden_word_is_omitted_from_json() {
        let env = EventEnvelope {
            seq: 3,
            timestamp_ms: 10,
            kind: EventKind::RoundStarted {
                round: 1,
                players: vec!["Alice".into()],
                words: vec!["apple".into()],
                word: None,
            },
        };
        let v = serde_json::to_value(&env).unwrap();
        assert_eq!(v["kind"], "RoundStarted");
        assert_eq!(v["seq"], 3);
        assert!(v.get("word").is_none());
    }

    #[test]
    fn envelope_parses_flattened_kind() {
        let txt = r#"{"seq":1,"timestamp_ms":5,"kind":"PlayerLeft","name":"Bob","reason":"Kicked"}"#;
        let env: EventEnvelope = serde_json::from_str(txt).unwrap();
        assert_eq!(
            env.kind,
            EventKind::PlayerLeft {
                name: "Bob".into(),
                reason: LeaveReason::Kicked
            }
        );
    }
}
