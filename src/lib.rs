//! Castlefall room session coordinator.
//!
//! Rooms of named players go through rounds of a hidden-word party game: each
//! round every player gets a secret word, then someone declares a win. The
//! server keeps one authoritative state machine per room, an ordered event
//! log per room, and per-player sessions that survive short disconnects.

pub mod cli;
pub mod config;
pub mod error;
pub mod game;
pub mod pretty;
pub mod server;

pub use error::GameError;
