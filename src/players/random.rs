//! Random providers.

use super::{Attacker, AttackInstruction, DecisionError, Defender, DefendInstruction, PlayerKind};
use crate::board::{Board, Direction};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use strum::IntoEnumIterator;
use tracing::{debug, instrument};

/// Places on a uniformly chosen empty cell.
#[derive(Debug)]
pub struct RandomAttacker {
    rng: StdRng,
}

impl RandomAttacker {
    /// Creates an attacker seeded from the OS.
    pub fn new() -> Self {
        Self {
            rng: StdRng::from_entropy(),
        }
    }

    /// Creates a reproducible attacker.
    pub fn with_seed(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }
}

impl Default for RandomAttacker {
    fn default() -> Self {
        Self::new()
    }
}

impl Attacker for RandomAttacker {
    #[instrument(skip_all)]
    fn think(&mut self, board: &Board) -> Result<AttackInstruction, DecisionError> {
        let empty = board.empty_cells();
        match empty.choose(&mut self.rng) {
            Some(location) => {
                debug!(?location, candidates = empty.len(), "Random attacker chose");
                Ok(AttackInstruction::place(location))
            }
            None => {
                debug!("No empty cell left");
                Ok(AttackInstruction::give_up())
            }
        }
    }

    fn kind(&self) -> PlayerKind {
        PlayerKind::Random
    }
}

/// Picks uniformly among the slides that change the board.
#[derive(Debug)]
pub struct RandomDefender {
    rng: StdRng,
}

impl RandomDefender {
    /// Creates a defender seeded from the OS.
    pub fn new() -> Self {
        Self {
            rng: StdRng::from_entropy(),
        }
    }

    /// Creates a reproducible defender.
    pub fn with_seed(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }
}

impl Default for RandomDefender {
    fn default() -> Self {
        Self::new()
    }
}

impl Defender for RandomDefender {
    #[instrument(skip_all)]
    fn think(&mut self, board: &Board) -> Result<DefendInstruction, DecisionError> {
        let legal: Vec<(usize, Direction)> = (0..board.rank())
            .flat_map(|dimension| Direction::iter().map(move |direction| (dimension, direction)))
            .filter(|&(dimension, direction)| board.can_slide(dimension, direction))
            .collect();

        match legal.choose(&mut self.rng) {
            Some(&(dimension, direction)) => {
                debug!(dimension, %direction, candidates = legal.len(), "Random defender chose");
                Ok(DefendInstruction::slide(dimension, direction))
            }
            None => {
                debug!("No slide changes the board");
                Ok(DefendInstruction::give_up())
            }
        }
    }

    fn kind(&self) -> PlayerKind {
        PlayerKind::Random
    }
}
