//! Decision providers for the two roles of a round.
//!
//! An attacker places new tiles, a defender slides them. Each role has four
//! variants: random, strategy, manual (interactive) and remote (fed through
//! the round's mailbox).

mod instruction;
mod manual;
mod random;
mod remote;
mod seating;
mod strategy;

pub use instruction::{
    Attack, AttackInstruction, DecisionError, Defend, DefendInstruction, GIVE_UP,
};
pub use manual::{LineReader, ManualAttacker, ManualDefender, SharedLineReader, StdinReader};
pub use random::{RandomAttacker, RandomDefender};
pub use remote::{RemoteAttacker, RemoteDefender};
pub use seating::{DEFAULT_POLL_INTERVAL, Seating};
pub use strategy::{StrategyAttacker, StrategyDefender};

use crate::board::Board;
use serde::{Deserialize, Serialize};

/// The two opposing roles of a round.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
    strum::EnumIter,
)]
pub enum Role {
    /// Places new tiles.
    Attacker,
    /// Slides the board.
    Defender,
}

/// Which provider variant fills a role.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
    strum::EnumIter,
)]
pub enum PlayerKind {
    /// Uniformly random legal choice.
    Random,
    /// Simple greedy heuristic.
    Strategy,
    /// A person at the local terminal.
    Manual,
    /// An external client answering through the mailbox.
    #[serde(alias = "Online")]
    #[strum(to_string = "Remote", serialize = "Online")]
    Remote,
}

/// Produces placement instructions.
pub trait Attacker: Send {
    /// Looks at the board and answers with a raw instruction.
    ///
    /// # Errors
    ///
    /// Returns a [`DecisionError`] if no instruction can be produced.
    fn think(&mut self, board: &Board) -> Result<AttackInstruction, DecisionError>;

    /// Variant of this provider.
    fn kind(&self) -> PlayerKind;

    /// Thinks and validates the answer.
    ///
    /// # Errors
    ///
    /// Returns [`DecisionError::Malformed`] for an invalid instruction, or
    /// whatever [`Attacker::think`] failed with.
    fn decide(&mut self, board: &Board) -> Result<Attack, DecisionError> {
        self.think(board)?.validate()
    }
}

/// Produces slide instructions.
pub trait Defender: Send {
    /// Looks at the board and answers with a raw instruction.
    ///
    /// # Errors
    ///
    /// Returns a [`DecisionError`] if no instruction can be produced.
    fn think(&mut self, board: &Board) -> Result<DefendInstruction, DecisionError>;

    /// Variant of this provider.
    fn kind(&self) -> PlayerKind;

    /// Thinks and validates the answer.
    ///
    /// # Errors
    ///
    /// Returns [`DecisionError::Malformed`] for an invalid instruction, or
    /// whatever [`Defender::think`] failed with.
    fn decide(&mut self, board: &Board) -> Result<Defend, DecisionError> {
        self.think(board)?.validate()
    }
}
