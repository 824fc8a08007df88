//! Win rules decide whether a declaration is accepted.
//!
//! The game shell only enforces "one winner per declaration phase"; what
//! actually makes a claim valid is left to the rule plugged into the room.

use super::state::{Player, RoomState};

pub trait WinRule: Send + Sync + std::fmt::Debug {
    /// Return true to accept `claimant`'s declaration and resolve the round.
    fn admit(&self, claimant: &Player, room: &RoomState) -> bool;
}

/// Whoever declares first wins.
#[derive(Debug, Default, Clone, Copy)]
pub struct FirstClaim;

impl WinRule for FirstClaim {
    fn admit(&self, _claimant: &Player, _room: &RoomState) -> bool {
        true
    }
}
