//! Word assignment policies.
//!
//! A policy maps every player on the roster to exactly one word drawn from the
//! round's pool. Several players may end up with the same word; assignments
//! are never deduplicated.

use std::collections::BTreeMap;
use std::sync::Arc;

use rand::seq::{IndexedRandom, SliceRandom};
use rand::RngCore;
use serde::{Deserialize, Serialize};

use crate::error::GameError;

/// Player name -> word.
pub type WordAssignment = BTreeMap<String, String>;

pub trait AssignmentPolicy: Send + Sync + std::fmt::Debug {
    /// Assign one word to each of `players`.
    fn assign(
        &self,
        pool: &[String],
        players: &[String],
        rng: &mut dyn RngCore,
    ) -> Result<WordAssignment, GameError>;

    /// Pick a word for a player who joins after the round has started.
    fn draw(
        &self,
        pool: &[String],
        current: &WordAssignment,
        rng: &mut dyn RngCore,
    ) -> Result<String, GameError>;
}

/// Every player draws independently, uniformly, with replacement.
#[derive(Debug, Default, Clone, Copy)]
pub struct UniformRandom;

impl AssignmentPolicy for UniformRandom {
    fn assign(
        &self,
        pool: &[String],
        players: &[String],
        rng: &mut dyn RngCore,
    ) -> Result<WordAssignment, GameError> {
        let mut out = WordAssignment::new();
        for player in players {
            let word = pool.choose(rng).ok_or(GameError::EmptyWordPool)?;
            out.insert(player.clone(), word.clone());
        }
        Ok(out)
    }

    fn draw(
        &self,
        pool: &[String],
        _current: &WordAssignment,
        rng: &mut dyn RngCore,
    ) -> Result<String, GameError> {
        pool.choose(rng).cloned().ok_or(GameError::EmptyWordPool)
    }
}

/// Two distinct words per round; the shuffled roster is split in half
/// (the first word takes the extra player on odd counts).
#[derive(Debug, Default, Clone, Copy)]
pub struct SplitPair;

fn distinct(pool: &[String]) -> Vec<&String> {
    let mut seen: Vec<&String> = Vec::with_capacity(pool.len());
    for w in pool {
        if !seen.contains(&w) {
            seen.push(w);
        }
    }
    seen
}

impl AssignmentPolicy for SplitPair {
    fn assign(
        &self,
        pool: &[String],
        players: &[String],
        rng: &mut dyn RngCore,
    ) -> Result<WordAssignment, GameError> {
        let words = distinct(pool);
        if words.len() < 2 {
            return Err(GameError::EmptyWordPool);
        }
        let chosen: Vec<&&String> = words.choose_multiple(rng, 2).collect();
        let (first, second) = (chosen[0].as_str(), chosen[1].as_str());

        let mut shuffled = players.to_vec();
        shuffled.shuffle(rng);
        let half = (shuffled.len() + 1) / 2;

        let mut out = WordAssignment::new();
        for (i, player) in shuffled.into_iter().enumerate() {
            let word = if i < half { first } else { second };
            out.insert(player, word.to_string());
        }
        Ok(out)
    }

    fn draw(
        &self,
        pool: &[String],
        current: &WordAssignment,
        rng: &mut dyn RngCore,
    ) -> Result<String, GameError> {
        // Count holders of the words already in play, then top up the smaller side.
        let mut counts: Vec<(&String, usize)> = Vec::new();
        for word in current.values() {
            match counts.iter_mut().find(|(w, _)| *w == word) {
                Some((_, n)) => *n += 1,
                None => counts.push((word, 1)),
            }
        }
        if counts.len() >= 2 {
            let (word, _) = counts
                .iter()
                .min_by_key(|(_, n)| *n)
                .ok_or(GameError::EmptyWordPool)?;
            return Ok((*word).clone());
        }
        let unused: Vec<&String> = distinct(pool)
            .into_iter()
            .filter(|w| !counts.iter().any(|(used, _)| used == w))
            .collect();
        match unused.choose(rng) {
            Some(word) => Ok((*word).clone()),
            None => pool.choose(rng).cloned().ok_or(GameError::EmptyWordPool),
        }
    }
}

/// Policy selector as written in the config file.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AssignmentKind {
    #[default]
    Uniform,
    Split,
}

impl AssignmentKind {
    pub fn policy(self) -> Arc<dyn AssignmentPolicy> {
        match self {
            AssignmentKind::Uniform => Arc::new(UniformRandom),
            AssignmentKind::Split => Arc::new(SplitPair),
        }
    }
}

impl std::str::FromStr for AssignmentKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "uniform" => Ok(AssignmentKind::Uniform),
            "split" => Ok(AssignmentKind::Split),
            other => Err(format!("unknown assignment policy '{other}' (uniform|split)")),
        }
    }
}
