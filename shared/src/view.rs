//! Client-side projection of a room's event feed.
//!
//! A display client holds no game logic: it starts from the `Welcome`
//! snapshot and folds events into a `RoomView`. Events at or below the last
//! applied sequence are ignored, so replays and duplicates are harmless.

use crate::event::{EventEnvelope, EventKind};
use crate::room::{Phase, RoomSnapshot};

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RoomView {
    pub room: String,
    /// The viewer's own name, if they are a player.
    pub you: Option<String>,
    pub round: u32,
    pub phase: Phase,
    pub players: Vec<String>,
    pub words: Vec<String>,
    pub your_word: Option<String>,
    pub winner: Option<String>,
    /// Highest sequence applied so far.
    pub seq: u64,
}

impl RoomView {
    pub fn new(room: impl Into<String>, you: Option<String>) -> Self {
        Self {
            room: room.into(),
            you,
            ..Self::default()
        }
    }

    pub fn from_snapshot(snapshot: RoomSnapshot, you: Option<String>) -> Self {
        Self {
            room: snapshot.room,
            you,
            round: snapshot.round,
            phase: snapshot.phase,
            players: snapshot.players,
            words: snapshot.words,
            your_word: snapshot.your_word,
            winner: snapshot.winner,
            seq: snapshot.head,
        }
    }

    fn is_you(&self, name: &str) -> bool {
        self.you.as_deref() == Some(name)
    }

    /// Fold one event in. Returns false if it was already applied.
    pub fn apply(&mut self, env: &EventEnvelope) -> bool {
        if env.seq <= self.seq {
            return false;
        }
        self.seq = env.seq;
        match &env.kind {
            EventKind::PlayerJoined { name, word } => {
                if !self.players.contains(name) {
                    self.players.push(name.clone());
                }
                if self.is_you(name) {
                    self.your_word = word.clone();
                }
            }
            EventKind::PlayerLeft { name, .. } => {
                self.players.retain(|p| p != name);
                if self.is_you(name) {
                    self.your_word = None;
                }
                if self.players.is_empty() {
                    self.phase = Phase::Lobby;
                    self.words.clear();
                    self.winner = None;
                }
            }
            EventKind::RoundStarted {
                round,
                players,
                words,
                word,
            } => {
                self.round = *round;
                self.phase = Phase::RoundActive;
                self.players = players.clone();
                self.words = words.clone();
                self.your_word = word.clone();
                self.winner = None;
            }
            EventKind::DeclarationStarted { .. } => self.phase = Phase::Declaring,
            EventKind::PlayerWon { name, .. } => {
                self.phase = Phase::Resolved;
                self.winner = Some(name.clone());
            }
            EventKind::GameReset => {
                self.round = 0;
                self.phase = Phase::Lobby;
                self.words.clear();
                self.your_word = None;
                self.winner = None;
            }
        }
        true
    }
}
