//! Board engine for an N-dimensional sliding-tile grid.
//!
//! Tiles live in a flat buffer addressed through a small shape vector and
//! row-major strides. Only [`Board::place`] and [`Board::slide`] mutate it.

mod error;
mod grid;
mod layout;

pub use error::BoardError;
pub use grid::{Board, Direction, MAX_DIMENSION, MAX_RANK, MIN_DIMENSION};
pub use layout::{BoardSpec, MAX_LAYOUT_CHARS, MAX_LAYOUT_TILE};
