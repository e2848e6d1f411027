//! Tilewar library - N-dimensional 2048 between two opposing players
//!
//! An attacker places new tiles on an arbitrary-rank grid, a defender slides
//! and merges them. A round alternates the two until one of them gives up.
//!
//! # Architecture
//!
//! - **Board**: flat N-dimensional grid with slide/merge and placement
//! - **Players**: random, strategy, manual and remote decision providers
//! - **Round**: turn-alternation state machine and scoring
//! - **Arena**: per-round mailboxes and the registry that runs remote rounds
//! - **Server**: HTTP transport over the registry
//!
//! # Example
//!
//! ```no_run
//! use tilewar::{BoardSpec, PlayerKind, Round, RoundSpec, Seating};
//!
//! # fn example() -> Result<(), tilewar::RoundError> {
//! let spec = RoundSpec::new(
//!     BoardSpec::with_shape(vec![4, 4]),
//!     PlayerKind::Strategy,
//!     PlayerKind::Random,
//! );
//! let mut round = Round::new(uuid::Uuid::new_v4(), &spec, &Seating::default())?;
//! let score = round.start()?;
//! println!("score: {}", score);
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![forbid(unsafe_code)]

// Module declarations
mod arena;
mod board;
mod config;
pub mod console;
mod players;
mod round;
pub mod server;

// Crate-level exports - Board engine
pub use board::{
    Board, BoardError, BoardSpec, Direction, MAX_DIMENSION, MAX_LAYOUT_CHARS, MAX_LAYOUT_TILE,
    MAX_RANK, MIN_DIMENSION,
};

// Crate-level exports - Decision providers
pub use players::{
    Attack, AttackInstruction, Attacker, DEFAULT_POLL_INTERVAL, DecisionError, Defend,
    DefendInstruction, Defender, GIVE_UP, LineReader, ManualAttacker, ManualDefender, PlayerKind,
    RandomAttacker, RandomDefender, RemoteAttacker, RemoteDefender, Role, Seating,
    SharedLineReader, StdinReader, StrategyAttacker, StrategyDefender,
};

// Crate-level exports - Round state machine
pub use round::{parse_kind, Round, RoundError, RoundId, RoundSpec, RoundState};

// Crate-level exports - Registry and mailboxes
pub use arena::{
    coerce_kinds, ArenaError, Invitation, Mailbox, MailboxDirectory, MailboxView, RoundRegistry,
    Submission, SweepReport,
};

// Crate-level exports - Configuration
pub use config::{ArenaConfig, ConfigError};
