//! Board construction errors.

use derive_more::{Display, Error};

/// Reasons a board cannot be built.
#[derive(Debug, Clone, PartialEq, Eq, Display, Error)]
pub enum BoardError {
    /// The requested shape is outside the supported rank or side bounds.
    #[display("Invalid shape {shape:?}: {reason}")]
    InvalidShape {
        /// Shape as given by the caller.
        shape: Vec<usize>,
        /// What is wrong with it.
        reason: String,
    },
    /// An explicit tile layout failed validation.
    #[display("Invalid layout: {reason}")]
    InvalidLayout {
        /// What is wrong with it.
        reason: String,
    },
}

impl BoardError {
    pub(crate) fn shape(shape: &[usize], reason: impl Into<String>) -> Self {
        Self::InvalidShape {
            shape: shape.to_vec(),
            reason: reason.into(),
        }
    }

    pub(crate) fn layout(reason: impl Into<String>) -> Self {
        Self::InvalidLayout {
            reason: reason.into(),
        }
    }
}
