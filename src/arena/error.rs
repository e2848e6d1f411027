//! Registry errors.

use crate::round::RoundError;
use derive_more::{Display, Error, From};

/// Reasons the registry refuses to start a round.
#[derive(Debug, Clone, PartialEq, Eq, Display, Error, From)]
pub enum ArenaError {
    /// Too many live rounds.
    #[display("Too many players, admission cap of {cap} rounds reached")]
    #[from(ignore)]
    AdmissionLimitReached {
        /// Configured ceiling.
        cap: usize,
    },
    /// The registry is shutting down.
    #[display("Registry is shut down")]
    #[from(ignore)]
    Closed,
    /// The round could not be built.
    #[display("{source}")]
    Round {
        /// Construction failure.
        source: RoundError,
    },
    /// No execution unit could be started for the round.
    #[display("Failed to start round thread: {reason}")]
    #[from(ignore)]
    Spawn {
        /// Operating system error text.
        reason: String,
    },
}
