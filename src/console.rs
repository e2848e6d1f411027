//! Rounds played in-process at the local terminal.

use crate::board::BoardSpec;
use crate::players::{PlayerKind, Role, Seating};
use crate::round::{parse_kind, Round, RoundError, RoundSpec};
use tracing::{error, info, instrument};
use uuid::Uuid;

/// Settings of a console session.
#[derive(Debug, Clone)]
pub struct ConsoleOptions {
    /// Board of every round.
    pub board: BoardSpec,
    /// Attacker kind before coercion.
    pub attacker: PlayerKind,
    /// Defender kind before coercion.
    pub defender: PlayerKind,
    /// Replace manual players with random ones.
    pub auto: bool,
    /// Stop after this many rounds.
    pub rounds: Option<u64>,
}

impl ConsoleOptions {
    /// Parses the textual forms accepted on the command line.
    ///
    /// # Errors
    ///
    /// Returns a [`RoundError`] for an unknown kind or an unparsable board.
    pub fn parse(
        board_shape: &str,
        board_tiles: &str,
        attacker_type: &str,
        defender_type: &str,
    ) -> Result<Self, RoundError> {
        let board = BoardSpec::parse(board_shape, board_tiles)
            .map_err(|source| RoundError::Board { source })?;
        Ok(Self {
            board,
            attacker: parse_kind(Role::Attacker, attacker_type)?,
            defender: parse_kind(Role::Defender, defender_type)?,
            auto: false,
            rounds: None,
        })
    }

    /// Kinds actually seated: nobody is remote at a terminal, and `auto`
    /// leaves nobody typing.
    pub fn seated_kinds(&self) -> (PlayerKind, PlayerKind) {
        let attacker = match self.attacker {
            PlayerKind::Remote => PlayerKind::Random,
            PlayerKind::Manual if self.auto => PlayerKind::Random,
            other => other,
        };
        let defender = match self.defender {
            PlayerKind::Remote if self.auto => PlayerKind::Random,
            PlayerKind::Remote => PlayerKind::Manual,
            PlayerKind::Manual if self.auto => PlayerKind::Random,
            other => other,
        };
        (attacker, defender)
    }
}

/// Aborted rounds in a row after which a session gives up.
pub const MAX_CONSECUTIVE_ABORTS: usize = 3;

/// Plays rounds back to back and returns the scores of those that finished.
///
/// A round whose provider breaks down is logged and the next one starts.
/// `rounds` counts every round started, aborted ones included.
///
/// # Errors
///
/// Returns the first construction error, or the last abort once
/// [`MAX_CONSECUTIVE_ABORTS`] rounds in a row have failed.
#[instrument(skip(seating))]
pub fn run(options: &ConsoleOptions, seating: &Seating) -> Result<Vec<u64>, RoundError> {
    let (attacker, defender) = options.seated_kinds();
    let spec = RoundSpec::new(options.board.clone(), attacker, defender);
    let mut scores = Vec::new();
    let mut started: u64 = 0;
    let mut aborts = 0;

    while options.rounds.is_none_or(|limit| started < limit) {
        // Seeded sessions still vary from round to round.
        let seating = match seating.seed() {
            Some(seed) => seating.clone().with_seed(seed.wrapping_add(started * 2)),
            None => seating.clone(),
        };
        let mut round = Round::new(Uuid::new_v4(), &spec, &seating)?;
        started += 1;
        match round.start() {
            Ok(score) => {
                aborts = 0;
                info!(round_id = %round.id(), score, "Console round finished");
                println!("Final board:\n{}\nScore: {}", round.board(), score);
                scores.push(score);
            }
            Err(e) => {
                aborts += 1;
                error!(round_id = %round.id(), error = %e, aborts, "Console round aborted");
                if aborts >= MAX_CONSECUTIVE_ABORTS {
                    return Err(e);
                }
            }
        }
    }
    Ok(scores)
}
