//! Greedy heuristic providers.

use super::{Attacker, AttackInstruction, DecisionError, Defender, DefendInstruction, PlayerKind};
use crate::board::{Board, Direction};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use std::collections::BTreeMap;
use tracing::{debug, instrument};

/// Crowds the largest tiles: places next to the biggest value that still has
/// an empty neighbour.
#[derive(Debug)]
pub struct StrategyAttacker {
    rng: StdRng,
}

impl StrategyAttacker {
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

    /// Zero cells adjacent to a tile of the largest possible value.
    pub fn candidates(board: &Board) -> Vec<Vec<usize>> {
        let mut by_value: BTreeMap<u64, Vec<Vec<usize>>> = BTreeMap::new();
        for (index, &value) in board.tiles().iter().enumerate() {
            by_value
                .entry(value)
                .or_default()
                .push(board.coordinate_of(index));
        }

        let Some(zeros) = by_value.get(&0) else {
            return Vec::new();
        };

        for cells in by_value.values().rev() {
            let picks: Vec<Vec<usize>> = zeros
                .iter()
                .filter(|zero| cells.iter().any(|cell| adjoins(cell, zero)))
                .cloned()
                .collect();
            if !picks.is_empty() {
                return picks;
            }
        }
        Vec::new()
    }
}

impl Default for StrategyAttacker {
    fn default() -> Self {
        Self::new()
    }
}

/// Differ by exactly one in exactly one coordinate.
fn adjoins(a: &[usize], b: &[usize]) -> bool {
    let mut differing = 0;
    for (x, y) in a.iter().zip(b) {
        match x.abs_diff(*y) {
            0 => {}
            1 => differing += 1,
            _ => return false,
        }
    }
    differing == 1
}

impl Attacker for StrategyAttacker {
    #[instrument(skip_all)]
    fn think(&mut self, board: &Board) -> Result<AttackInstruction, DecisionError> {
        let candidates = Self::candidates(board);
        match candidates.choose(&mut self.rng) {
            Some(location) => {
                debug!(?location, candidates = candidates.len(), "Strategy attacker chose");
                Ok(AttackInstruction::place(location))
            }
            None => {
                debug!("No empty cell left");
                Ok(AttackInstruction::give_up())
            }
        }
    }

    fn kind(&self) -> PlayerKind {
        PlayerKind::Strategy
    }
}

/// Prefers sliding toward the origin on low axes, then away from it on high
/// axes.
#[derive(Debug, Default)]
pub struct StrategyDefender;

impl StrategyDefender {
    /// Creates the defender.
    pub fn new() -> Self {
        Self
    }

    /// First legal slide in preference order.
    pub fn preferred(board: &Board) -> Option<(usize, Direction)> {
        let toward = (0..board.rank()).map(|dimension| (dimension, Direction::TowardOrigin));
        let away = (0..board.rank())
            .rev()
            .map(|dimension| (dimension, Direction::AwayFromOrigin));
        toward
            .chain(away)
            .find(|&(dimension, direction)| board.can_slide(dimension, direction))
    }
}

impl Defender for StrategyDefender {
    #[instrument(skip_all)]
    fn think(&mut self, board: &Board) -> Result<DefendInstruction, DecisionError> {
        match Self::preferred(board) {
            Some((dimension, direction)) => {
                debug!(dimension, %direction, "Strategy defender chose");
                Ok(DefendInstruction::slide(dimension, direction))
            }
            None => {
                debug!("No slide changes the board");
                Ok(DefendInstruction::give_up())
            }
        }
    }

    fn kind(&self) -> PlayerKind {
        PlayerKind::Strategy
    }
}
