//! Pure, synchronous room game logic: roster, rounds, word assignment and
//! declaration. Nothing in here locks or awaits; the server wraps a
//! [`RoomState`] in a per-room critical section.

pub mod assign;
pub mod event;
pub mod rules;
pub mod state;
pub mod words;

pub use assign::{AssignmentKind, AssignmentPolicy, SplitPair, UniformRandom, WordAssignment};
pub use event::{unix_millis, RoomEvent, RoomEventKind};
pub use rules::{FirstClaim, WinRule};
pub use state::{validate_name, Player, RoomState, MAX_NAME_LEN};
pub use words::default_words;
