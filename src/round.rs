//! One game: the turn-alternation state machine between attacker and defender.

use crate::board::{Board, BoardError, BoardSpec};
use crate::players::{
    Attack, Attacker, DecisionError, Defend, Defender, PlayerKind, Role, Seating,
};
use derive_more::{Display, Error};
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use tracing::{debug, error, info, instrument, warn};
use uuid::Uuid;

/// Globally unique round identifier.
pub type RoundId = Uuid;

/// Configuration of a round.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoundSpec {
    /// Board to play on.
    #[serde(default)]
    pub board: BoardSpec,
    /// Who places tiles.
    pub attacker: PlayerKind,
    /// Who slides the board.
    pub defender: PlayerKind,
}

impl RoundSpec {
    /// Creates a spec from already resolved kinds.
    pub fn new(board: BoardSpec, attacker: PlayerKind, defender: PlayerKind) -> Self {
        Self {
            board,
            attacker,
            defender,
        }
    }

    /// Creates a spec from role names such as `"Random"` or `"Online"`.
    ///
    /// # Errors
    ///
    /// Returns [`RoundError::UnknownPlayerKind`] for a name that is not a
    /// provider kind.
    #[instrument(skip(board))]
    pub fn from_names(board: BoardSpec, attacker: &str, defender: &str) -> Result<Self, RoundError> {
        Ok(Self::new(
            board,
            parse_kind(Role::Attacker, attacker)?,
            parse_kind(Role::Defender, defender)?,
        ))
    }
}

/// Resolves a provider kind name for a role.
///
/// # Errors
///
/// Returns [`RoundError::UnknownPlayerKind`] if the name is unknown.
pub fn parse_kind(role: Role, name: &str) -> Result<PlayerKind, RoundError> {
    PlayerKind::from_str(name.trim()).map_err(|_| {
        warn!(%role, name, "Unknown player kind");
        RoundError::UnknownPlayerKind {
            role,
            name: name.to_string(),
        }
    })
}

/// Where a round stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, strum::Display)]
pub enum RoundState {
    /// Created, no turn taken yet.
    New,
    /// Waiting for the attacker.
    AttackTurn,
    /// Waiting for the defender.
    DefendTurn,
    /// A role gave up; the score is final.
    Ended,
}

/// Faults that prevent a round from being created or finishing.
#[derive(Debug, Clone, PartialEq, Eq, Display, Error)]
pub enum RoundError {
    /// A role name does not match any provider kind.
    #[display("Unknown {role} kind {name:?}")]
    UnknownPlayerKind {
        /// Role being configured.
        role: Role,
        /// Name that failed to resolve.
        name: String,
    },
    /// The board could not be built.
    #[display("Board rejected: {source}")]
    Board {
        /// Validation failure.
        source: BoardError,
    },
    /// A provider broke down mid-round.
    #[display("Round aborted: {source}")]
    Decision {
        /// Provider fault.
        source: DecisionError,
    },
}

/// A single game between two providers.
pub struct Round {
    id: RoundId,
    board: Board,
    attacker: Box<dyn Attacker>,
    defender: Box<dyn Defender>,
    state: RoundState,
    score: Option<u64>,
    rng: StdRng,
}

impl Round {
    /// Builds the board and seats both providers.
    ///
    /// # Errors
    ///
    /// Returns [`RoundError::Board`] if the board spec is invalid.
    #[instrument(skip(spec, seating), fields(round_id = %id))]
    pub fn new(id: RoundId, spec: &RoundSpec, seating: &Seating) -> Result<Self, RoundError> {
        let board = spec.board.build().map_err(|source| {
            error!(
                round_id = %id,
                error = %source,
                board = ?spec.board,
                attacker = %spec.attacker,
                defender = %spec.defender,
                "New round failed to start"
            );
            RoundError::Board { source }
        })?;

        let round = Self::with_players(
            id,
            board,
            seating.attacker(spec.attacker, id),
            seating.defender(spec.defender, id),
        );
        Ok(match seating.seed() {
            Some(seed) => round.with_seed(seed),
            None => round,
        })
    }

    /// Assembles a round from a ready board and providers.
    pub fn with_players(
        id: RoundId,
        board: Board,
        attacker: Box<dyn Attacker>,
        defender: Box<dyn Defender>,
    ) -> Self {
        Self {
            id,
            board,
            attacker,
            defender,
            state: RoundState::New,
            score: None,
            rng: StdRng::from_entropy(),
        }
    }

    /// Makes tile values of placements reproducible.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.rng = StdRng::seed_from_u64(seed);
        self
    }

    /// Round identifier.
    pub fn id(&self) -> RoundId {
        self.id
    }

    /// Current board.
    pub fn board(&self) -> &Board {
        &self.board
    }

    /// Current state.
    pub fn state(&self) -> RoundState {
        self.state
    }

    /// Final score, once the round has ended.
    pub fn score(&self) -> Option<u64> {
        self.score
    }

    /// Plays until a role gives up and returns the score.
    ///
    /// # Errors
    ///
    /// Returns [`RoundError::Decision`] if a provider fails fatally; the
    /// round is abandoned without a score.
    #[instrument(skip(self), fields(round_id = %self.id))]
    pub fn start(&mut self) -> Result<u64, RoundError> {
        info!(
            round_id = %self.id,
            shape = ?self.board.shape(),
            tiles = %self.board.to_layout(),
            attacker = %self.attacker.kind(),
            defender = %self.defender.kind(),
            "New round started"
        );

        while self.state != RoundState::Ended {
            self.step()?;
        }

        let score = self.board.score();
        self.score = Some(score);
        info!(
            round_id = %self.id,
            score,
            tiles = %self.board.to_layout(),
            "Round ended"
        );
        Ok(score)
    }

    /// Runs a single query of the current role and returns the new state.
    ///
    /// A malformed answer or a rejected instruction leaves the state as it
    /// was, so the same role is asked again.
    ///
    /// # Errors
    ///
    /// Returns [`RoundError::Decision`] on a fatal provider fault.
    pub fn step(&mut self) -> Result<RoundState, RoundError> {
        match self.state {
            RoundState::New => self.state = RoundState::AttackTurn,
            RoundState::AttackTurn => self.attack_turn()?,
            RoundState::DefendTurn => self.defend_turn()?,
            RoundState::Ended => {}
        }
        Ok(self.state)
    }

    fn attack_turn(&mut self) -> Result<(), RoundError> {
        let decision = match self.attacker.decide(&self.board) {
            Ok(decision) => decision,
            Err(e) => return self.on_fault(Role::Attacker, e),
        };
        debug!(round_id = %self.id, ?decision, "Attacker decided");

        match decision {
            Attack::GiveUp => {
                debug!(round_id = %self.id, "Attacker surrendered, ending round");
                self.state = RoundState::Ended;
            }
            Attack::Place(location) => {
                if self.board.place_with(&location, &mut self.rng) {
                    debug!(
                        round_id = %self.id,
                        tiles = %self.board.to_layout(),
                        "Attacker has executed the instruction"
                    );
                    self.state = RoundState::DefendTurn;
                } else {
                    debug!(round_id = %self.id, ?location, "Attacker failed to execute the instruction");
                }
            }
        }
        Ok(())
    }

    fn defend_turn(&mut self) -> Result<(), RoundError> {
        let decision = match self.defender.decide(&self.board) {
            Ok(decision) => decision,
            Err(e) => return self.on_fault(Role::Defender, e),
        };
        debug!(round_id = %self.id, ?decision, "Defender decided");

        match decision {
            Defend::GiveUp => {
                debug!(round_id = %self.id, "Defender surrendered, ending round");
                self.state = RoundState::Ended;
            }
            Defend::Slide {
                dimension,
                direction,
            } => {
                if self.board.slide(dimension, direction) {
                    debug!(
                        round_id = %self.id,
                        tiles = %self.board.to_layout(),
                        "Defender has executed the instruction"
                    );
                    self.state = RoundState::AttackTurn;
                } else {
                    debug!(
                        round_id = %self.id,
                        dimension,
                        %direction,
                        "Defender failed to execute the instruction"
                    );
                }
            }
        }
        Ok(())
    }

    fn on_fault(&mut self, role: Role, fault: DecisionError) -> Result<(), RoundError> {
        if fault.is_fatal() {
            error!(
                round_id = %self.id,
                %role,
                error = %fault,
                attacker = %self.attacker.kind(),
                defender = %self.defender.kind(),
                tiles = %self.board.to_layout(),
                "Fatal error while thinking, abandoning round"
            );
            return Err(RoundError::Decision { source: fault });
        }
        warn!(round_id = %self.id, %role, error = %fault, "Failed to think, asking again");
        Ok(())
    }
}

impl std::fmt::Debug for Round {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Round")
            .field("id", &self.id)
            .field("board", &self.board)
            .field("attacker", &self.attacker.kind())
            .field("defender", &self.defender.kind())
            .field("state", &self.state)
            .field("score", &self.score)
            .finish()
    }
}
