//! Game vocabulary: moves, strategies and the directional payoff table.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// A per-round choice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Move {
    /// Cooperate.
    Groom,
    /// Defect.
    Ignore,
    /// Refuse to interact; neutral against everything.
    Decline,
}

impl Move {
    /// All moves, in table order.
    pub const ALL: [Move; 3] = [Move::Groom, Move::Ignore, Move::Decline];

    /// Row/column index into the payoff table.
    #[inline]
    pub const fn index(self) -> usize {
        match self {
            Move::Groom => 0,
            Move::Ignore => 1,
            Move::Decline => 2,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Move::Groom => "Groom",
            Move::Ignore => "Ignore",
            Move::Decline => "Decline",
        }
    }
}

impl fmt::Display for Move {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Unknown move '{0}' (expected Groom, Ignore or Decline)")]
pub struct ParseMoveError(pub String);

impl FromStr for Move {
    type Err = ParseMoveError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Move::ALL
            .into_iter()
            .find(|m| m.as_str() == s)
            .ok_or_else(|| ParseMoveError(s.to_string()))
    }
}

/// Behavioral rule an agent follows for its whole life.
///
/// Tags serialize and display in their canonical form (`Always_Groom`,
/// `Always_Ignore`, `Tit_for_Tat`, `Random`).
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub enum Strategy {
    #[serde(rename = "Always_Groom")]
    AlwaysGroom,
    #[serde(rename = "Always_Ignore")]
    AlwaysIgnore,
    #[serde(rename = "Tit_for_Tat")]
    TitForTat,
    #[default]
    #[serde(rename = "Random")]
    Random,
}

impl Strategy {
    /// The four canonical strategies, used for uniform draws.
    pub const ALL: [Strategy; 4] = [
        Strategy::AlwaysGroom,
        Strategy::AlwaysIgnore,
        Strategy::TitForTat,
        Strategy::Random,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Strategy::AlwaysGroom => "Always_Groom",
            Strategy::AlwaysIgnore => "Always_Ignore",
            Strategy::TitForTat => "Tit_for_Tat",
            Strategy::Random => "Random",
        }
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Unknown strategy '{0}' (expected Always_Groom, Always_Ignore, Tit_for_Tat or Random)")]
pub struct ParseStrategyError(pub String);

impl FromStr for Strategy {
    type Err = ParseStrategyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Strategy::ALL
            .into_iter()
            .find(|st| st.as_str() == s)
            .ok_or_else(|| ParseStrategyError(s.to_string()))
    }
}

/// Payoff pair: (own payoff, opponent payoff).
pub type Payoff = (i32, i32);

/// Directional payoff lookup indexed by `(own move, opponent move)`.
///
/// `payoff(a, b)` and `payoff(b, a)` are separate entries; nothing is
/// derived by mirroring.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PayoffTable {
    entries: [[Payoff; 3]; 3],
}

impl PayoffTable {
    /// The grooming game table.
    pub const fn standard() -> Self {
        let mut entries = [[(0, 0); 3]; 3];
        let mut i = 0;
        while i < 3 {
            let mut j = 0;
            while j < 3 {
                entries[i][j] = standard_payoff(Move::ALL[i], Move::ALL[j]);
                j += 1;
            }
            i += 1;
        }
        Self { entries }
    }

    /// Payoffs for `move1` played against `move2`.
    #[inline]
    pub fn payoff(&self, move1: Move, move2: Move) -> Payoff {
        self.entries[move1.index()][move2.index()]
    }
}

impl Default for PayoffTable {
    fn default() -> Self {
        Self::standard()
    }
}

const fn standard_payoff(move1: Move, move2: Move) -> Payoff {
    match (move1, move2) {
        (Move::Groom, Move::Groom) => (3, 3),
        (Move::Groom, Move::Ignore) => (-2, 5),
        (Move::Ignore, Move::Groom) => (5, -2),
        (Move::Ignore, Move::Ignore) => (0, 0),
        // Declining aborts the interaction
        (Move::Groom, Move::Decline)
        | (Move::Decline, Move::Groom)
        | (Move::Ignore, Move::Decline)
        | (Move::Decline, Move::Ignore)
        | (Move::Decline, Move::Decline) => (0, 0),
    }
}
