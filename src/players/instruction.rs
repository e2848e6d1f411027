//! Raw instructions and the validation wrapper that turns them into decisions.

use crate::board::Direction;
use crate::round::RoundId;
use derive_more::{Display, Error};
use serde::{Deserialize, Serialize};

/// Literal answer that surrenders the current role.
pub const GIVE_UP: &str = "giveup";

/// Errors raised while obtaining a decision.
#[derive(Debug, Clone, PartialEq, Eq, Display, Error)]
pub enum DecisionError {
    /// The provider answered with a structurally invalid instruction.
    /// The round asks the same role again.
    #[display("Malformed decision: {reason}")]
    Malformed {
        /// What is wrong with the instruction.
        reason: String,
    },
    /// A remote provider found no mailbox for its round.
    #[display("Round {round_id} has no registered mailbox")]
    UnregisteredRound {
        /// Round the provider is bound to.
        round_id: RoundId,
    },
    /// The provider broke down (closed input, poisoned state).
    #[display("Decision provider failed: {reason}")]
    Internal {
        /// Failure description.
        reason: String,
    },
}

impl DecisionError {
    /// Whether the fault must abort the round.
    pub fn is_fatal(&self) -> bool {
        !matches!(self, DecisionError::Malformed { .. })
    }

    pub(crate) fn malformed(reason: impl Into<String>) -> Self {
        Self::Malformed {
            reason: reason.into(),
        }
    }

    pub(crate) fn internal(reason: impl Into<String>) -> Self {
        Self::Internal {
            reason: reason.into(),
        }
    }
}

/// A validated attacker decision.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Attack {
    /// Put a new tile at this coordinate.
    Place(Vec<usize>),
    /// Stop the round.
    GiveUp,
}

/// A validated defender decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Defend {
    /// Slide the board.
    Slide {
        /// Axis index.
        dimension: usize,
        /// Travel direction.
        direction: Direction,
    },
    /// Stop the round.
    GiveUp,
}

/// What an attacker answered, before validation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttackInstruction {
    /// `false` surrenders.
    pub keep_going: bool,
    /// Target coordinate, required when `keep_going` is set.
    pub location: Option<Vec<i64>>,
}

impl AttackInstruction {
    /// Instruction to place a tile.
    pub fn place(location: &[usize]) -> Self {
        Self {
            keep_going: true,
            location: Some(location.iter().map(|&c| c as i64).collect()),
        }
    }

    /// Instruction to surrender.
    pub fn give_up() -> Self {
        Self {
            keep_going: false,
            location: None,
        }
    }

    /// Lenient parse used by the transport: `giveup`, or comma separated
    /// components where anything non-numeric becomes `-1`.
    pub fn from_text(text: &str) -> Self {
        let text = text.trim();
        if text == GIVE_UP {
            return Self::give_up();
        }
        Self {
            keep_going: true,
            location: Some(
                text.split(',')
                    .map(|part| parse_index(part).unwrap_or(-1))
                    .collect(),
            ),
        }
    }

    /// Checks the payload shape.
    ///
    /// # Errors
    ///
    /// Returns [`DecisionError::Malformed`] if a continuing instruction has
    /// no location or a negative component.
    pub fn validate(&self) -> Result<Attack, DecisionError> {
        if !self.keep_going {
            return Ok(Attack::GiveUp);
        }
        let location = self
            .location
            .as_ref()
            .ok_or_else(|| DecisionError::malformed("attack without a location"))?;
        location
            .iter()
            .map(|&c| usize::try_from(c))
            .collect::<Result<Vec<_>, _>>()
            .map(Attack::Place)
            .map_err(|_| DecisionError::malformed(format!("negative coordinate in {:?}", location)))
    }
}

/// What a defender answered, before validation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DefendInstruction {
    /// `false` surrenders.
    pub keep_going: bool,
    /// Axis index, required when `keep_going` is set.
    pub dimension: Option<i64>,
    /// `-1` or `+1`, required when `keep_going` is set.
    pub direction: Option<i64>,
}

impl DefendInstruction {
    /// Instruction to slide along an axis.
    pub fn slide(dimension: usize, direction: Direction) -> Self {
        Self {
            keep_going: true,
            dimension: Some(dimension as i64),
            direction: Some(direction.step()),
        }
    }

    /// Instruction to surrender.
    pub fn give_up() -> Self {
        Self {
            keep_going: false,
            dimension: None,
            direction: None,
        }
    }

    /// Lenient parse used by the transport: `giveup`, or `dimension,direction`
    /// where a non-numeric dimension becomes `-1` and a direction other than
    /// `-1`/`1` becomes `0`.
    pub fn from_text(text: &str) -> Self {
        let text = text.trim();
        if text == GIVE_UP {
            return Self::give_up();
        }
        match text.split(',').collect::<Vec<_>>().as_slice() {
            [dimension, direction] => Self {
                keep_going: true,
                dimension: Some(parse_index(dimension).unwrap_or(-1)),
                direction: Some(parse_step(direction).unwrap_or(0)),
            },
            _ => Self {
                keep_going: true,
                dimension: None,
                direction: None,
            },
        }
    }

    /// Checks the payload shape.
    ///
    /// # Errors
    ///
    /// Returns [`DecisionError::Malformed`] if a continuing instruction lacks
    /// an axis, has a negative axis, or a direction other than `-1`/`+1`.
    pub fn validate(&self) -> Result<Defend, DecisionError> {
        if !self.keep_going {
            return Ok(Defend::GiveUp);
        }
        let dimension = self
            .dimension
            .ok_or_else(|| DecisionError::malformed("defend without a dimension"))?;
        let dimension = usize::try_from(dimension)
            .map_err(|_| DecisionError::malformed(format!("negative dimension {}", dimension)))?;
        let direction = self
            .direction
            .and_then(Direction::from_step)
            .ok_or_else(|| {
                DecisionError::malformed(format!("direction {:?} is neither -1 nor 1", self.direction))
            })?;
        Ok(Defend::Slide {
            dimension,
            direction,
        })
    }
}

/// Digits only, like a coordinate typed by a person.
pub(crate) fn parse_index(text: &str) -> Option<i64> {
    let text = text.trim();
    if text.is_empty() || !text.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    text.parse().ok()
}

/// `-1` or `1`.
pub(crate) fn parse_step(text: &str) -> Option<i64> {
    match text.trim() {
        "-1" => Some(-1),
        "1" => Some(1),
        _ => None,
    }
}
