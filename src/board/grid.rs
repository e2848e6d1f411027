//! Flat-buffer board with place and slide mutators.

use super::error::BoardError;
use rand::Rng;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use tracing::{debug, instrument, trace};

/// Largest supported number of axes.
pub const MAX_RANK: usize = 4;

/// Smallest side length accepted by [`Board::new`].
pub const MIN_DIMENSION: usize = 2;

/// Largest side length accepted by [`Board::new`].
pub const MAX_DIMENSION: usize = 10;

/// Which way tiles travel along an axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, strum::EnumIter)]
pub enum Direction {
    /// Toward coordinate 0 of the axis (`-1`).
    TowardOrigin,
    /// Toward the last coordinate of the axis (`+1`).
    AwayFromOrigin,
}

impl Direction {
    /// Returns the signed step, `-1` or `+1`.
    pub fn step(self) -> i64 {
        match self {
            Direction::TowardOrigin => -1,
            Direction::AwayFromOrigin => 1,
        }
    }

    /// Parses a signed step. Anything but `-1` and `+1` is rejected.
    pub fn from_step(step: i64) -> Option<Self> {
        match step {
            -1 => Some(Direction::TowardOrigin),
            1 => Some(Direction::AwayFromOrigin),
            _ => None,
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.step())
    }
}

/// A sliding-tile board of rank 1 to 4.
///
/// Cells are stored row-major: the last axis is contiguous. Every cell holds
/// 0 or a power of two no smaller than 2.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Board {
    shape: Vec<usize>,
    strides: Vec<usize>,
    tiles: Vec<u64>,
}

impl Board {
    /// Creates an empty board of the given shape.
    ///
    /// # Errors
    ///
    /// Returns [`BoardError::InvalidShape`] if the rank is 0 or above
    /// [`MAX_RANK`], or a side is outside `MIN_DIMENSION..=MAX_DIMENSION`.
    #[instrument]
    pub fn new(shape: &[usize]) -> Result<Self, BoardError> {
        if shape.is_empty() {
            return Err(BoardError::shape(shape, "rank must be at least 1"));
        }
        if shape.len() > MAX_RANK {
            return Err(BoardError::shape(
                shape,
                format!("rank must not exceed {}", MAX_RANK),
            ));
        }
        if let Some(side) = shape
            .iter()
            .find(|side| !(MIN_DIMENSION..=MAX_DIMENSION).contains(*side))
        {
            return Err(BoardError::shape(
                shape,
                format!(
                    "side {} is outside {}..={}",
                    side, MIN_DIMENSION, MAX_DIMENSION
                ),
            ));
        }

        let cells = shape.iter().product();
        debug!(?shape, cells, "Created empty board");
        Ok(Self::from_parts(shape.to_vec(), vec![0; cells]))
    }

    /// Assembles a board from an already validated shape and buffer.
    pub(crate) fn from_parts(shape: Vec<usize>, tiles: Vec<u64>) -> Self {
        let mut strides = vec![1; shape.len()];
        for axis in (0..shape.len().saturating_sub(1)).rev() {
            strides[axis] = strides[axis + 1] * shape[axis + 1];
        }
        debug_assert_eq!(tiles.len(), shape.iter().product::<usize>());
        Self {
            shape,
            strides,
            tiles,
        }
    }

    /// Side lengths, one per axis.
    pub fn shape(&self) -> &[usize] {
        &self.shape
    }

    /// Number of axes.
    pub fn rank(&self) -> usize {
        self.shape.len()
    }

    /// All cells in row-major order.
    pub fn tiles(&self) -> &[u64] {
        &self.tiles
    }

    /// Flat index of a coordinate, or `None` if it does not address a cell.
    pub fn index_of(&self, location: &[usize]) -> Option<usize> {
        if location.len() != self.rank() {
            return None;
        }
        location
            .iter()
            .zip(&self.shape)
            .zip(&self.strides)
            .try_fold(0, |index, ((&coord, &side), &stride)| {
                (coord < side).then_some(index + coord * stride)
            })
    }

    /// Coordinate of a flat index.
    pub fn coordinate_of(&self, index: usize) -> Vec<usize> {
        self.shape
            .iter()
            .zip(&self.strides)
            .map(|(&side, &stride)| index / stride % side)
            .collect()
    }

    /// Value at a coordinate.
    pub fn get(&self, location: &[usize]) -> Option<u64> {
        self.index_of(location).map(|index| self.tiles[index])
    }

    /// Coordinates of every zero cell, in row-major order.
    pub fn empty_cells(&self) -> Vec<Vec<usize>> {
        self.tiles
            .iter()
            .enumerate()
            .filter(|(_, value)| **value == 0)
            .map(|(index, _)| self.coordinate_of(index))
            .collect()
    }

    /// Sum of all tile values.
    pub fn sum(&self) -> u64 {
        self.tiles.iter().sum()
    }

    /// Terminal score: every tile `T` contributes `T * (log2(T) - 1)`.
    pub fn score(&self) -> u64 {
        self.tiles
            .iter()
            .filter(|value| **value != 0)
            .map(|&value| {
                let weight = u64::from(value.trailing_zeros().saturating_sub(1));
                value.saturating_mul(weight)
            })
            .fold(0, u64::saturating_add)
    }

    /// Places a 2 (90%) or 4 (10%) on an empty cell using the thread RNG.
    ///
    /// Returns `false` without touching the board if the coordinate has the
    /// wrong length, is out of bounds, or the cell is occupied.
    pub fn place(&mut self, location: &[usize]) -> bool {
        self.place_with(location, &mut rand::thread_rng())
    }

    /// Same as [`Board::place`] with an explicit RNG.
    #[instrument(skip(self, rng))]
    pub fn place_with<R: Rng + ?Sized>(&mut self, location: &[usize], rng: &mut R) -> bool {
        let Some(index) = self.index_of(location) else {
            trace!("Placement outside the board");
            return false;
        };
        if self.tiles[index] != 0 {
            trace!(value = self.tiles[index], "Placement on occupied cell");
            return false;
        }

        let value = if rng.gen_range(0..10) < 9 { 2 } else { 4 };
        self.tiles[index] = value;
        debug!(value, "Placed tile");
        true
    }

    /// Slides every line along `dimension` in `direction`, merging equal
    /// neighbours at most once per destination.
    ///
    /// Returns `true` iff at least one tile moved or merged. An axis index
    /// outside the board is rejected with `false`.
    #[instrument(skip(self))]
    pub fn slide(&mut self, dimension: usize, direction: Direction) -> bool {
        if dimension >= self.rank() {
            trace!("Axis outside the board");
            return false;
        }

        let side = self.shape[dimension];
        let stride = self.strides[dimension];
        let mut merged = vec![false; self.tiles.len()];
        let mut changed = false;

        let line_starts: Vec<usize> = (0..self.tiles.len())
            .filter(|index| index / stride % side == 0)
            .collect();

        for start in line_starts {
            // Cells nearest the destination wall settle first.
            for step in 0..side {
                let position = match direction {
                    Direction::TowardOrigin => step,
                    Direction::AwayFromOrigin => side - 1 - step,
                };
                changed |= self.advance(start, stride, side, position, direction, &mut merged);
            }
        }

        debug!(changed, "Slide finished");
        changed
    }

    /// Pushes one tile as far as it goes. Returns whether it moved.
    fn advance(
        &mut self,
        start: usize,
        stride: usize,
        side: usize,
        mut position: usize,
        direction: Direction,
        merged: &mut [bool],
    ) -> bool {
        let mut moved = false;
        loop {
            let here = start + position * stride;
            let value = self.tiles[here];
            if value == 0 {
                return moved;
            }

            let next = match direction {
                Direction::TowardOrigin => position.checked_sub(1),
                Direction::AwayFromOrigin => (position + 1 < side).then_some(position + 1),
            };
            let Some(next) = next else {
                return moved;
            };

            let there = start + next * stride;
            if merged[there] {
                return moved;
            }

            match self.tiles[there] {
                0 => {
                    self.tiles[there] = value;
                    self.tiles[here] = 0;
                    position = next;
                    moved = true;
                }
                target if target == value => {
                    self.tiles[there] = value.saturating_mul(2);
                    self.tiles[here] = 0;
                    merged[there] = true;
                    return true;
                }
                _ => return moved,
            }
        }
    }

    /// Reports whether a slide would change the board, without mutating it.
    pub fn can_slide(&self, dimension: usize, direction: Direction) -> bool {
        self.clone().slide(dimension, direction)
    }

    /// Nested JSON arrays mirroring the board's axes.
    pub fn to_layout(&self) -> Value {
        self.nest(0, 0)
    }

    fn nest(&self, axis: usize, offset: usize) -> Value {
        let side = self.shape[axis];
        let stride = self.strides[axis];
        if axis + 1 == self.rank() {
            Value::from(self.tiles[offset..offset + side].to_vec())
        } else {
            Value::Array(
                (0..side)
                    .map(|i| self.nest(axis + 1, offset + i * stride))
                    .collect(),
            )
        }
    }
}

impl fmt::Display for Board {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.rank() > 2 {
            return write!(f, "{}", self.to_layout());
        }

        let width = self
            .tiles
            .iter()
            .map(|value| value.to_string().len())
            .max()
            .unwrap_or(1);
        let row_len = *self.shape.last().unwrap_or(&1);
        for (row, cells) in self.tiles.chunks(row_len).enumerate() {
            if row > 0 {
                writeln!(f)?;
            }
            let line: Vec<String> = cells
                .iter()
                .map(|value| format!("{:>width$}", value, width = width))
                .collect();
            write!(f, "{}", line.join(" "))?;
        }
        Ok(())
    }
}
