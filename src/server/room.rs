//! A live room: the state machine behind a per-room lock, plus its event log.
//!
//! Every command runs validate -> mutate -> append while holding the room
//! lock, so the log order is exactly the order commands took effect. A
//! rejected command never appends.
//!
//! The room also owns its connection seats. Lock order inside a room is
//! seats -> state, and no lock is ever shared between two rooms.

use std::collections::HashMap;
use std::io::IsTerminal;
use std::sync::Arc;
use std::time::Duration;

use castlefall_shared::{LeaveReason, RoomSnapshot};
use rand::RngCore;
use tokio::sync::Mutex;
use tokio::time::Instant;

use crate::error::GameError;
use crate::game::{
    default_words, unix_millis, AssignmentPolicy, FirstClaim, RoomEvent, RoomEventKind,
    RoomState, UniformRandom, WinRule,
};
use crate::pretty;
use crate::server::event_log::{EventLog, EventStream};
use crate::server::session::SeatTable;

/// Pluggable behaviour shared by every room of a registry.
#[derive(Debug, Clone)]
pub struct RoomRules {
    pub policy: Arc<dyn AssignmentPolicy>,
    pub win_rule: Arc<dyn WinRule>,
    /// Pool used when `StartRound` carries no words.
    pub default_words: Vec<String>,
}

impl Default for RoomRules {
    fn default() -> Self {
        Self {
            policy: Arc::new(UniformRandom),
            win_rule: Arc::new(FirstClaim),
            default_words: default_words(),
        }
    }
}

#[derive(Debug)]
struct RoomInner {
    state: RoomState,
    /// Set once the registry has dropped this room; every later command fails.
    retired: bool,
    /// When the roster last became empty.
    empty_since: Option<Instant>,
}

#[derive(Debug)]
pub struct Room {
    name: String,
    inner: Mutex<RoomInner>,
    seats: Mutex<SeatTable>,
    log: EventLog,
    rules: Arc<RoomRules>,
}

impl Room {
    pub fn new(name: impl Into<String>, rules: Arc<RoomRules>) -> Self {
        Self {
            name: name.into(),
            inner: Mutex::new(RoomInner {
                state: RoomState::new(),
                retired: false,
                empty_since: Some(Instant::now()),
            }),
            seats: Mutex::new(HashMap::new()),
            log: EventLog::new(),
            rules,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn log(&self) -> &EventLog {
        &self.log
    }

    /// Connection seats of this room, keyed by player name. Take this lock
    /// before any room command that must agree with the seats.
    pub(crate) fn seats(&self) -> &Mutex<SeatTable> {
        &self.seats
    }

    async fn apply<F>(&self, command: &'static str, f: F) -> Result<Arc<RoomEvent>, GameError>
    where
        F: FnOnce(&mut RoomState, &RoomRules, &mut dyn RngCore) -> Result<RoomEventKind, GameError>,
    {
        let mut inner = self.inner.lock().await;
        if inner.retired {
            return Err(GameError::RoomNotFound(self.name.clone()));
        }
        let outcome = {
            let mut rng = rand::rng();
            let rng: &mut dyn RngCore = &mut rng;
            f(&mut inner.state, self.rules.as_ref(), rng)
        };
        let kind = match outcome {
            Ok(kind) => kind,
            Err(e) => {
                tracing::debug!(room = %self.name, command, error = %e, "command rejected");
                return Err(e);
            }
        };

        if inner.state.is_empty() {
            inner.empty_since.get_or_insert_with(Instant::now);
        } else {
            inner.empty_since = None;
        }
        let event = self.log.append(&self.name, kind).await;
        let round = inner.state.round();
        drop(inner);

        let line = pretty::format_event_human(
            &event.view_for(None),
            None,
            std::io::stdout().is_terminal(),
        );
        tracing::info!(room = %self.name, seq = event.seq, round, command, "{}", line);
        Ok(event)
    }

    /// Fails with `RoomNotFound` if the room was retired concurrently; the
    /// registry retries against a fresh room in that case.
    pub async fn join(&self, name: &str) -> Result<Arc<RoomEvent>, GameError> {
        self.apply("join", |state, rules, rng| {
            state.join(name, unix_millis(), rules.policy.as_ref(), rng)
        })
        .await
    }

    pub async fn leave(&self, name: &str, reason: LeaveReason) -> Result<Arc<RoomEvent>, GameError> {
        self.apply("leave", |state, _, _| state.leave(name, reason))
            .await
    }

    pub async fn kick(&self, by: &str, name: &str) -> Result<Arc<RoomEvent>, GameError> {
        self.apply("kick", |state, _, _| state.kick(by, name)).await
    }

    pub async fn start_round(&self, words: Option<Vec<String>>) -> Result<Arc<RoomEvent>, GameError> {
        self.apply("start_round", move |state, rules, rng| {
            let pool = words.unwrap_or_else(|| rules.default_words.clone());
            state.start_round(pool, rules.policy.as_ref(), rng)
        })
        .await
    }

    pub async fn start_declaration(&self) -> Result<Arc<RoomEvent>, GameError> {
        self.apply("start_declaration", |state, _, _| state.start_declaration())
            .await
    }

    pub async fn declare_win(&self, name: &str) -> Result<Arc<RoomEvent>, GameError> {
        self.apply("declare_win", |state, rules, _| {
            state.declare_win(name, rules.win_rule.as_ref())
        })
        .await
    }

    pub async fn new_game(&self) -> Result<Arc<RoomEvent>, GameError> {
        self.apply("new_game", |state, _, _| state.new_game()).await
    }

    /// Snapshot consistent with `head`: every event up to `head` is reflected.
    pub async fn snapshot(&self, viewer: Option<&str>) -> RoomSnapshot {
        let inner = self.inner.lock().await;
        inner.state.snapshot(&self.name, viewer, self.log.head())
    }

    pub async fn is_empty(&self) -> bool {
        self.inner.lock().await.state.is_empty()
    }

    pub fn subscribe(&self, from: u64) -> EventStream {
        self.log.subscribe(from)
    }

    /// Retire the room if its roster has been empty for at least `idle`.
    /// Callers must hold the registry lock.
    pub(crate) async fn retire_if_idle(&self, idle: Duration, now: Instant) -> bool {
        let mut inner = self.inner.lock().await;
        let idle_long_enough = inner
            .empty_since
            .is_some_and(|since| now.saturating_duration_since(since) >= idle);
        if inner.retired || !inner.state.is_empty() || !idle_long_enough {
            return false;
        }
        inner.retired = true;
        self.log.close();
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::StreamExt;

    fn room() -> Room {
        Room::new("R1", Arc::new(RoomRules::default()))
    }

    #[tokio::test]
    async fn commands_append_in_commit_order() {
        let room = room();
        room.join("Alice").await.unwrap();
        room.join("Bob").await.unwrap();
        let started = room
            .start_round(Some(vec!["apple".into(), "banana".into()]))
            .await
            .unwrap();
        assert_eq!(started.seq, 3);
        room.start_declaration().await.unwrap();
        let won = room.declare_win("Bob").await.unwrap();
        assert_eq!(won.seq, 5);
        assert_eq!(room.declare_win("Alice").await, Err(GameError::PhaseClosed));
        assert_eq!(room.log().head(), 5);
    }

    #[tokio::test]
    async fn rejected_commands_do_not_append() {
        let room = room();
        assert_eq!(room.start_round(None).await, Err(GameError::EmptyRoster));
        room.join("Alice").await.unwrap();
        assert!(matches!(
            room.join("Alice").await,
            Err(GameError::NameTaken(_))
        ));
        assert!(matches!(
            room.start_declaration().await,
            Err(GameError::InvalidPhase { .. })
        ));
        assert_eq!(room.log().head(), 1);
    }

    #[tokio::test]
    async fn default_pool_is_used_without_words() {
        let room = room();
        room.join("Alice").await.unwrap();
        room.start_round(None).await.unwrap();
        let snap = room.snapshot(Some("Alice")).await;
        assert_eq!(snap.words, default_words());
        assert!(snap.your_word.is_some());
        assert_eq!(snap.head, 2);
    }

    #[tokio::test]
    async fn concurrent_declarations_have_one_winner() {
        let room = Arc::new(room());
        let names: Vec<String> = (0..8).map(|i| format!("p{i}")).collect();
        for n in &names {
            room.join(n).await.unwrap();
        }
        room.start_round(None).await.unwrap();
        room.start_declaration().await.unwrap();

        let mut tasks = Vec::new();
        for n in names.clone() {
            let room = Arc::clone(&room);
            tasks.push(tokio::spawn(async move { room.declare_win(&n).await }));
        }
        let mut winners = 0;
        for t in tasks {
            match t.await.unwrap() {
                Ok(_) => winners += 1,
                Err(e) => assert_eq!(e, GameError::PhaseClosed),
            }
        }
        assert_eq!(winners, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn retire_only_after_idle_period() {
        let room = room();
        room.join("Alice").await.unwrap();
        let idle = Duration::from_secs(60);
        assert!(!room.retire_if_idle(idle, Instant::now()).await);

        room.leave("Alice", LeaveReason::Left).await.unwrap();
        assert!(!room.retire_if_idle(idle, Instant::now()).await);
        tokio::time::advance(Duration::from_secs(61)).await;
        assert!(room.retire_if_idle(idle, Instant::now()).await);

        assert_eq!(
            room.join("Bob").await,
            Err(GameError::RoomNotFound("R1".into()))
        );
        let replay: Vec<_> = room.subscribe(1).collect().await;
        assert_eq!(replay.len(), 2);
    }
}
