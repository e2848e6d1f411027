//! Board descriptions and explicit tile layouts.

use super::error::BoardError;
use super::grid::{Board, MAX_RANK};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, instrument, warn};

/// Longest accepted layout, measured with `", "` between items.
pub const MAX_LAYOUT_CHARS: usize = 200;

/// Largest tile a layout may hold. Keeps merges and scores inside `u64`.
pub const MAX_LAYOUT_TILE: u64 = 1 << 48;

/// How to build the board of a round.
///
/// A non-empty `tiles` layout wins over `shape`; otherwise an empty board of
/// `shape` is created.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BoardSpec {
    /// Side lengths of an empty board.
    #[serde(default = "default_shape")]
    pub shape: Vec<usize>,
    /// Optional nested layout (JSON arrays of integers).
    #[serde(default)]
    pub tiles: Value,
}

fn default_shape() -> Vec<usize> {
    vec![4, 4]
}

impl Default for BoardSpec {
    fn default() -> Self {
        Self::with_shape(default_shape())
    }
}

impl BoardSpec {
    /// An empty board of the given shape.
    pub fn with_shape(shape: Vec<usize>) -> Self {
        Self {
            shape,
            tiles: Value::Null,
        }
    }

    /// A board loaded from a nested layout.
    pub fn with_tiles(tiles: Value) -> Self {
        Self {
            shape: default_shape(),
            tiles,
        }
    }

    /// Parses the textual forms used on the command line and over HTTP,
    /// e.g. `"[4,4]"` and `"[[2,0],[0,2]]"`. An empty tiles string means none.
    ///
    /// # Errors
    ///
    /// Returns a [`BoardError`] if either text is not valid JSON of the
    /// expected kind.
    #[instrument]
    pub fn parse(shape: &str, tiles: &str) -> Result<Self, BoardError> {
        let shape: Vec<usize> = serde_json::from_str(shape.trim()).map_err(|e| {
            BoardError::InvalidShape {
                shape: Vec::new(),
                reason: format!("cannot parse {:?}: {}", shape, e),
            }
        })?;
        let tiles = if tiles.trim().is_empty() {
            Value::Null
        } else {
            serde_json::from_str(tiles.trim()).map_err(|e| {
                BoardError::layout(format!("cannot parse {:?}: {}", tiles, e))
            })?
        };
        Ok(Self { shape, tiles })
    }

    /// Whether a layout was supplied.
    pub fn has_layout(&self) -> bool {
        match &self.tiles {
            Value::Null => false,
            Value::Array(items) => !items.is_empty(),
            _ => true,
        }
    }

    /// Builds the board this spec describes.
    ///
    /// # Errors
    ///
    /// Propagates shape or layout validation failures.
    #[instrument(skip(self))]
    pub fn build(&self) -> Result<Board, BoardError> {
        if self.has_layout() {
            Board::from_layout(&self.tiles)
        } else {
            Board::new(&self.shape)
        }
    }
}

impl Board {
    /// Loads a board from nested JSON arrays, inferring its shape.
    ///
    /// # Errors
    ///
    /// Returns [`BoardError::InvalidLayout`] if the layout is too long,
    /// irregular, mixes numbers and arrays at one depth, contains an empty
    /// array, exceeds [`MAX_RANK`] or holds a value that is not 0 or a power
    /// of two between 2 and [`MAX_LAYOUT_TILE`].
    #[instrument(skip(layout))]
    pub fn from_layout(layout: &Value) -> Result<Self, BoardError> {
        // Measured as printed with ", " separators.
        let compact = layout.to_string();
        let text_len = compact.len() + compact.matches(',').count();
        if text_len > MAX_LAYOUT_CHARS {
            warn!(text_len, "Layout too large");
            return Err(BoardError::layout(format!(
                "layout is {} characters, limit is {}",
                text_len, MAX_LAYOUT_CHARS
            )));
        }
        if !layout.is_array() {
            return Err(BoardError::layout("layout must be an array"));
        }

        let mut walker = LayoutWalker::default();
        walker.visit(layout, 0)?;

        let shape = walker.shape;
        debug!(?shape, "Loaded board from layout");
        Ok(Board::from_parts(shape, walker.tiles))
    }
}

#[derive(Default)]
struct LayoutWalker {
    shape: Vec<usize>,
    leaf_depth: Option<usize>,
    tiles: Vec<u64>,
}

impl LayoutWalker {
    fn visit(&mut self, value: &Value, depth: usize) -> Result<(), BoardError> {
        match value {
            Value::Array(items) => {
                if items.is_empty() {
                    return Err(BoardError::layout("empty sequences are not allowed"));
                }
                if depth >= MAX_RANK {
                    return Err(BoardError::layout(format!(
                        "nesting deeper than {} levels",
                        MAX_RANK
                    )));
                }
                match self.shape.get(depth) {
                    None => self.shape.push(items.len()),
                    Some(&expected) if expected != items.len() => {
                        return Err(BoardError::layout(format!(
                            "irregular shape at depth {}: {} vs {}",
                            depth,
                            expected,
                            items.len()
                        )));
                    }
                    Some(_) => {}
                }
                items.iter().try_for_each(|item| self.visit(item, depth + 1))
            }
            Value::Number(number) => {
                if *self.leaf_depth.get_or_insert(depth) != depth {
                    return Err(BoardError::layout(format!(
                        "numbers and sequences mixed at depth {}",
                        depth
                    )));
                }
                let tile = number.as_u64().ok_or_else(|| {
                    BoardError::layout(format!("{} is not a non-negative integer", number))
                })?;
                if tile != 0 && (tile < 2 || !tile.is_power_of_two()) {
                    return Err(BoardError::layout(format!(
                        "{} is not a power of two",
                        tile
                    )));
                }
                if tile > MAX_LAYOUT_TILE {
                    return Err(BoardError::layout(format!(
                        "{} exceeds the largest tile {}",
                        tile, MAX_LAYOUT_TILE
                    )));
                }
                self.tiles.push(tile);
                Ok(())
            }
            other => Err(BoardError::layout(format!("unexpected value {}", other))),
        }
    }
}
