//! Authoritative per-room state machine.
//!
//! Phases: `Lobby -> RoundActive -> Declaring -> Resolved -> RoundActive | Lobby`.
//!
//! Every command validates first and mutates last, so a command that returns
//! an error leaves the state exactly as it was.

use castlefall_shared::{DeclarationState, LeaveReason, Phase, RoomSnapshot};
use rand::RngCore;

use super::assign::{AssignmentPolicy, WordAssignment};
use super::event::RoomEventKind;
use super::rules::WinRule;
use crate::error::GameError;

pub const MAX_NAME_LEN: usize = 32;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Player {
    pub name: String,
    pub joined_at_ms: u64,
    /// `None` until a round starts (or after the player leaves).
    pub word: Option<String>,
    pub declared: bool,
    pub active: bool,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RoomState {
    /// Every player ever seen in the room, in first-join order. Inactive
    /// entries are kept so a returning name reuses its record.
    players: Vec<Player>,
    round: u32,
    phase: Phase,
    pool: Vec<String>,
    winner: Option<String>,
}

/// Trimmed `name`, or `InvalidName` if it is empty or too long.
pub fn validate_name(name: &str) -> Result<&str, GameError> {
    let name = name.trim();
    if name.is_empty() || name.chars().count() > MAX_NAME_LEN {
        return Err(GameError::InvalidName);
    }
    Ok(name)
}

impl RoomState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn round(&self) -> u32 {
        self.round
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn declaration(&self) -> DeclarationState {
        self.phase.declaration()
    }

    pub fn words(&self) -> &[String] {
        &self.pool
    }

    pub fn winner(&self) -> Option<&str> {
        self.winner.as_deref()
    }

    /// Active player names in join order.
    pub fn roster(&self) -> Vec<String> {
        self.active().map(|p| p.name.clone()).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.active().next().is_none()
    }

    pub fn player(&self, name: &str) -> Option<&Player> {
        self.active().find(|p| p.name == name)
    }

    pub fn word_of(&self, name: &str) -> Option<&str> {
        self.player(name).and_then(|p| p.word.as_deref())
    }

    /// Current word for every active player that has one.
    pub fn assignment(&self) -> WordAssignment {
        self.active()
            .filter_map(|p| p.word.clone().map(|w| (p.name.clone(), w)))
            .collect()
    }

    fn active(&self) -> impl Iterator<Item = &Player> {
        self.players.iter().filter(|p| p.active)
    }

    fn active_index(&self, name: &str) -> Option<usize> {
        self.players.iter().position(|p| p.active && p.name == name)
    }

    fn invalid(&self, command: &'static str) -> GameError {
        GameError::InvalidPhase {
            command,
            phase: self.phase,
        }
    }

    /// Add `name` to the roster. Joining while a round is underway hands the
    /// newcomer a word straight away.
    pub fn join(
        &mut self,
        name: &str,
        now_ms: u64,
        policy: &dyn AssignmentPolicy,
        rng: &mut dyn RngCore,
    ) -> Result<RoomEventKind, GameError> {
        let name = validate_name(name)?;
        if self.active_index(name).is_some() {
            return Err(GameError::NameTaken(name.to_string()));
        }
        let word = if self.phase == Phase::Lobby {
            None
        } else {
            Some(policy.draw(&self.pool, &self.assignment(), rng)?)
        };

        let fresh = Player {
            name: name.to_string(),
            joined_at_ms: now_ms,
            word: word.clone(),
            declared: false,
            active: true,
        };
        match self.players.iter_mut().find(|p| p.name == name) {
            Some(existing) => *existing = fresh,
            None => self.players.push(fresh),
        }
        Ok(RoomEventKind::PlayerJoined {
            name: name.to_string(),
            word,
        })
    }

    /// Mark `name` inactive. The last player out sends the room back to the lobby.
    pub fn leave(&mut self, name: &str, reason: LeaveReason) -> Result<RoomEventKind, GameError> {
        let idx = self
            .active_index(name)
            .ok_or_else(|| GameError::UnknownPlayer(name.to_string()))?;

        let player = &mut self.players[idx];
        player.active = false;
        player.word = None;
        player.declared = false;
        if self.is_empty() {
            self.phase = Phase::Lobby;
            self.pool.clear();
            self.winner = None;
        }
        Ok(RoomEventKind::PlayerLeft {
            name: name.to_string(),
            reason,
        })
    }

    /// `by` removes `name` from the room. Allowed in any phase.
    pub fn kick(&mut self, by: &str, name: &str) -> Result<RoomEventKind, GameError> {
        if self.active_index(by).is_none() {
            return Err(GameError::UnknownPlayer(by.to_string()));
        }
        self.leave(name, LeaveReason::Kicked)
    }

    pub fn start_round(
        &mut self,
        pool: Vec<String>,
        policy: &dyn AssignmentPolicy,
        rng: &mut dyn RngCore,
    ) -> Result<RoomEventKind, GameError> {
        if !matches!(self.phase, Phase::Lobby | Phase::Resolved) {
            return Err(self.invalid("start_round"));
        }
        let players = self.roster();
        if players.is_empty() {
            return Err(GameError::EmptyRoster);
        }
        if pool.is_empty() {
            return Err(GameError::EmptyWordPool);
        }
        let assignment = policy.assign(&pool, &players, rng)?;
        if let Some(missing) = players.iter().find(|p| !assignment.contains_key(p.as_str())) {
            tracing::error!(player = %missing, ?policy, "assignment policy skipped a player");
            return Err(GameError::EmptyWordPool);
        }

        self.round += 1;
        self.phase = Phase::RoundActive;
        self.winner = None;
        self.pool = pool.clone();
        for p in self.players.iter_mut() {
            p.declared = false;
            p.word = if p.active {
                assignment.get(&p.name).cloned()
            } else {
                None
            };
        }
        Ok(RoomEventKind::RoundStarted {
            round: self.round,
            players,
            words: pool,
            assignment,
        })
    }

    pub fn start_declaration(&mut self) -> Result<RoomEventKind, GameError> {
        if self.phase != Phase::RoundActive {
            return Err(self.invalid("start_declaration"));
        }
        self.phase = Phase::Declaring;
        Ok(RoomEventKind::DeclarationStarted { round: self.round })
    }

    /// First accepted claim wins; every later claim in the same round gets
    /// `PhaseClosed`.
    pub fn declare_win(&mut self, name: &str, rule: &dyn WinRule) -> Result<RoomEventKind, GameError> {
        match self.phase {
            Phase::Declaring => {}
            Phase::Resolved => return Err(GameError::PhaseClosed),
            Phase::Lobby | Phase::RoundActive => return Err(self.invalid("declare_win")),
        }
        let idx = self
            .active_index(name)
            .ok_or_else(|| GameError::UnknownPlayer(name.to_string()))?;
        if !rule.admit(&self.players[idx], self) {
            return Err(GameError::ClaimRejected(name.to_string()));
        }

        let player = &mut self.players[idx];
        player.declared = true;
        let word = player.word.clone();
        self.phase = Phase::Resolved;
        self.winner = Some(name.to_string());
        Ok(RoomEventKind::PlayerWon {
            name: name.to_string(),
            word,
        })
    }

    /// Back to round 0 in the lobby, keeping the roster.
    pub fn new_game(&mut self) -> Result<RoomEventKind, GameError> {
        if self.is_empty() {
            return Err(GameError::EmptyRoster);
        }
        self.round = 0;
        self.phase = Phase::Lobby;
        self.pool.clear();
        self.winner = None;
        for p in self.players.iter_mut() {
            p.word = None;
            p.declared = false;
        }
        Ok(RoomEventKind::GameReset)
    }

    pub fn snapshot(&self, room: &str, viewer: Option<&str>, head: u64) -> RoomSnapshot {
        RoomSnapshot {
            room: room.to_string(),
            round: self.round,
            phase: self.phase,
            players: self.roster(),
            words: self.pool.clone(),
            your_word: viewer.and_then(|v| self.word_of(v)).map(str::to_string),
            winner: self.winner.clone(),
            head,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::assign::{SplitPair, UniformRandom};
    use crate::game::rules::FirstClaim;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn rng() -> StdRng {
        StdRng::seed_from_u64(0xC457)
    }

    fn pool(ws: &[&str]) -> Vec<String> {
        ws.iter().map(|w| w.to_string()).collect()
    }

    fn room_with(names: &[&str]) -> RoomState {
        let mut state = RoomState::new();
        let mut rng = rng();
        for n in names {
            state.join(n, 1, &UniformRandom, &mut rng).unwrap();
        }
        state
    }

    fn declaring(names: &[&str]) -> RoomState {
        let mut state = room_with(names);
        state
            .start_round(pool(&["apple", "banana"]), &UniformRandom, &mut rng())
            .unwrap();
        state.start_declaration().unwrap();
        state
    }

    #[derive(Debug)]
    struct NobodyWins;

    impl WinRule for NobodyWins {
        fn admit(&self, _claimant: &Player, _room: &RoomState) -> bool {
            false
        }
    }

    #[test]
    fn join_empty_room() {
        let mut state = RoomState::new();
        let ev = state.join("Alice", 5, &UniformRandom, &mut rng()).unwrap();
        assert_eq!(
            ev,
            RoomEventKind::PlayerJoined {
                name: "Alice".into(),
                word: None
            }
        );
        assert_eq!(state.roster(), vec!["Alice".to_string()]);
        assert_eq!(state.round(), 0);
        assert_eq!(state.phase(), Phase::Lobby);
    }

    #[test]
    fn join_rejects_active_duplicate_and_bad_names() {
        let mut state = room_with(&["Alice"]);
        let before = state.clone();
        assert_eq!(
            state.join("Alice", 2, &UniformRandom, &mut rng()),
            Err(GameError::NameTaken("Alice".into()))
        );
        assert_eq!(
            state.join("   ", 2, &UniformRandom, &mut rng()),
            Err(GameError::InvalidName)
        );
        let long = "x".repeat(MAX_NAME_LEN + 1);
        assert_eq!(
            state.join(&long, 2, &UniformRandom, &mut rng()),
            Err(GameError::InvalidName)
        );
        assert_eq!(state, before);
    }

    #[test]
    fn names_are_case_sensitive() {
        let mut state = room_with(&["alice"]);
        assert!(state.join("Alice", 2, &UniformRandom, &mut rng()).is_ok());
        assert_eq!(state.roster().len(), 2);
    }

    #[test]
    fn start_round_assigns_every_player() {
        let mut state = room_with(&["Alice", "Bob"]);
        let ev = state
            .start_round(pool(&["apple", "banana"]), &UniformRandom, &mut rng())
            .unwrap();
        assert_eq!(state.round(), 1);
        assert_eq!(state.phase(), Phase::RoundActive);
        for name in ["Alice", "Bob"] {
            let word = state.word_of(name).expect("every player has a word");
            assert!(word == "apple" || word == "banana");
        }
        match ev {
            RoomEventKind::RoundStarted {
                round,
                players,
                assignment,
                ..
            } => {
                assert_eq!(round, 1);
                assert_eq!(players, vec!["Alice".to_string(), "Bob".to_string()]);
                assert_eq!(assignment.len(), 2);
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn start_round_preserves_duplicate_words() {
        let mut state = room_with(&["Alice", "Bob", "Carol"]);
        state
            .start_round(pool(&["kiwi", "kiwi"]), &UniformRandom, &mut rng())
            .unwrap();
        assert_eq!(state.words(), &["kiwi".to_string(), "kiwi".to_string()]);
        for name in ["Alice", "Bob", "Carol"] {
            assert_eq!(state.word_of(name), Some("kiwi"));
        }
    }

    #[test]
    fn start_round_requires_players_and_words() {
        let mut empty = RoomState::new();
        assert_eq!(
            empty.start_round(pool(&["apple"]), &UniformRandom, &mut rng()),
            Err(GameError::EmptyRoster)
        );
        let mut state = room_with(&["Alice"]);
        let before = state.clone();
        assert_eq!(
            state.start_round(Vec::new(), &UniformRandom, &mut rng()),
            Err(GameError::EmptyWordPool)
        );
        assert_eq!(
            state.start_round(pool(&["apple"]), &SplitPair, &mut rng()),
            Err(GameError::EmptyWordPool)
        );
        assert_eq!(state, before);
    }

    #[test]
    fn illegal_transitions_are_noops() {
        let mut state = room_with(&["Alice", "Bob"]);
        let lobby = state.clone();
        assert!(matches!(
            state.start_declaration(),
            Err(GameError::InvalidPhase { .. })
        ));
        assert!(matches!(
            state.declare_win("Alice", &FirstClaim),
            Err(GameError::InvalidPhase { .. })
        ));
        assert_eq!(state, lobby);

        state
            .start_round(pool(&["apple", "banana"]), &UniformRandom, &mut rng())
            .unwrap();
        let active = state.clone();
        assert!(matches!(
            state.start_round(pool(&["fig"]), &UniformRandom, &mut rng()),
            Err(GameError::InvalidPhase { .. })
        ));
        assert!(matches!(
            state.declare_win("Bob", &FirstClaim),
            Err(GameError::InvalidPhase { .. })
        ));
        assert_eq!(state, active);

        state.start_declaration().unwrap();
        let declaring = state.clone();
        assert!(matches!(
            state.start_declaration(),
            Err(GameError::InvalidPhase { .. })
        ));
        assert!(matches!(
            state.start_round(pool(&["fig"]), &UniformRandom, &mut rng()),
            Err(GameError::InvalidPhase { .. })
        ));
        assert_eq!(state, declaring);
    }

    #[test]
    fn first_declaration_wins() {
        let mut state = declaring(&["Alice", "Bob"]);
        let ev = state.declare_win("Bob", &FirstClaim).unwrap();
        match ev {
            RoomEventKind::PlayerWon { name, word } => {
                assert_eq!(name, "Bob");
                assert!(word.is_some());
            }
            other => panic!("unexpected {other:?}"),
        }
        let resolved = state.clone();
        assert_eq!(
            state.declare_win("Alice", &FirstClaim),
            Err(GameError::PhaseClosed)
        );
        assert_eq!(state, resolved);
        assert_eq!(state.winner(), Some("Bob"));
        assert_eq!(state.declaration(), DeclarationState::Resolved);
        assert!(state.player("Bob").unwrap().declared);
    }

    #[test]
    fn declare_by_unknown_or_rejected_claimant() {
        let mut state = declaring(&["Alice"]);
        let before = state.clone();
        assert_eq!(
            state.declare_win("Zed", &FirstClaim),
            Err(GameError::UnknownPlayer("Zed".into()))
        );
        assert_eq!(
            state.declare_win("Alice", &NobodyWins),
            Err(GameError::ClaimRejected("Alice".into()))
        );
        assert_eq!(state, before);
        assert_eq!(state.declaration(), DeclarationState::InProgress);
    }

    #[test]
    fn next_round_after_resolution() {
        let mut state = declaring(&["Alice", "Bob"]);
        state.declare_win("Alice", &FirstClaim).unwrap();
        state
            .start_round(pool(&["fig", "grape"]), &UniformRandom, &mut rng())
            .unwrap();
        assert_eq!(state.round(), 2);
        assert_eq!(state.winner(), None);
        assert!(!state.player("Alice").unwrap().declared);
    }

    #[test]
    fn late_joiner_gets_a_word() {
        let mut state = room_with(&["Alice"]);
        state
            .start_round(pool(&["apple"]), &UniformRandom, &mut rng())
            .unwrap();
        let ev = state.join("Bob", 9, &UniformRandom, &mut rng()).unwrap();
        assert_eq!(
            ev,
            RoomEventKind::PlayerJoined {
                name: "Bob".into(),
                word: Some("apple".into())
            }
        );
        assert_eq!(state.assignment().len(), 2);
    }

    #[test]
    fn leave_and_rejoin_reuses_record() {
        let mut state = room_with(&["Alice", "Bob"]);
        state.leave("Alice", LeaveReason::Left).unwrap();
        assert_eq!(state.roster(), vec!["Bob".to_string()]);
        assert_eq!(
            state.leave("Alice", LeaveReason::Left),
            Err(GameError::UnknownPlayer("Alice".into()))
        );
        state.join("Alice", 20, &UniformRandom, &mut rng()).unwrap();
        assert_eq!(state.roster(), vec!["Alice".to_string(), "Bob".to_string()]);
        assert_eq!(state.player("Alice").unwrap().joined_at_ms, 20);
    }

    #[test]
    fn last_leave_returns_to_lobby_keeping_round() {
        let mut state = declaring(&["Alice"]);
        state.leave("Alice", LeaveReason::TimedOut).unwrap();
        assert!(state.is_empty());
        assert_eq!(state.phase(), Phase::Lobby);
        assert_eq!(state.round(), 1);
    }

    #[test]
    fn kick_requires_active_kicker() {
        let mut state = room_with(&["Alice", "Bob"]);
        assert_eq!(
            state.kick("Zed", "Bob"),
            Err(GameError::UnknownPlayer("Zed".into()))
        );
        let ev = state.kick("Alice", "Bob").unwrap();
        assert_eq!(
            ev,
            RoomEventKind::PlayerLeft {
                name: "Bob".into(),
                reason: LeaveReason::Kicked
            }
        );
        assert_eq!(state.roster(), vec!["Alice".to_string()]);
    }

    #[test]
    fn new_game_resets_round() {
        let mut state = declaring(&["Alice", "Bob"]);
        state.new_game().unwrap();
        assert_eq!(state.round(), 0);
        assert_eq!(state.phase(), Phase::Lobby);
        assert!(state.assignment().is_empty());
        assert_eq!(state.roster().len(), 2);
        assert_eq!(RoomState::new().new_game(), Err(GameError::EmptyRoster));
    }

    #[test]
    fn snapshot_hides_other_words() {
        let mut state = room_with(&["Alice", "Bob"]);
        state
            .start_round(pool(&["apple", "banana"]), &UniformRandom, &mut rng())
            .unwrap();
        let snap = state.snapshot("R1", Some("Alice"), 3);
        assert_eq!(snap.your_word.as_deref(), state.word_of("Alice"));
        assert_eq!(snap.head, 3);
        assert_eq!(state.snapshot("R1", None, 3).your_word, None);
    }
}
