//! Interactive providers reading from a line-oriented prompt.

use super::instruction::{parse_index, parse_step};
use super::{
    Attacker, AttackInstruction, DecisionError, Defender, DefendInstruction, GIVE_UP, PlayerKind,
};
use crate::board::Board;
use std::io::{self, BufRead, Write};
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::{info, instrument, warn};

/// Source of typed answers for manual players.
pub trait LineReader: Send {
    /// Shows `text` and blocks until a line is entered.
    ///
    /// # Errors
    ///
    /// Returns an I/O error when input is closed or unreadable.
    fn prompt(&mut self, text: &str) -> io::Result<String>;

    /// Shows a message without waiting for an answer.
    fn show(&mut self, text: &str);
}

/// Line reader shared by the manual players of one process.
pub type SharedLineReader = Arc<Mutex<dyn LineReader>>;

/// Terminal reader over stdin/stdout.
#[derive(Debug, Default)]
pub struct StdinReader;

impl LineReader for StdinReader {
    fn prompt(&mut self, text: &str) -> io::Result<String> {
        let mut stdout = io::stdout();
        write!(stdout, "{}", text)?;
        stdout.flush()?;

        let mut line = String::new();
        if io::stdin().lock().read_line(&mut line)? == 0 {
            return Err(io::Error::new(io::ErrorKind::UnexpectedEof, "input closed"));
        }
        Ok(line)
    }

    fn show(&mut self, text: &str) {
        println!("{}", text);
    }
}

fn lock(reader: &SharedLineReader) -> Result<MutexGuard<'_, dyn LineReader + 'static>, DecisionError> {
    reader
        .lock()
        .map_err(|_| DecisionError::internal("line reader lock poisoned"))
}

/// Attacker typed in by a person as `row,col,...` or `giveup`.
pub struct ManualAttacker {
    reader: SharedLineReader,
}

impl ManualAttacker {
    /// Creates a manual attacker reading from `reader`.
    pub fn new(reader: SharedLineReader) -> Self {
        Self { reader }
    }
}

impl Attacker for ManualAttacker {
    #[instrument(skip_all)]
    fn think(&mut self, board: &Board) -> Result<AttackInstruction, DecisionError> {
        let mut reader = lock(&self.reader)?;
        reader.show(&format!("Current board:\n{}", board));
        loop {
            let line = reader
                .prompt("To which tile do you want to place number: ")
                .map_err(|e| DecisionError::internal(format!("prompt failed: {}", e)))?;
            let line = line.trim();
            if line == GIVE_UP {
                info!("Manual attacker gives up");
                reader.show("Attacker gives up");
                return Ok(AttackInstruction::give_up());
            }

            let location: Option<Vec<i64>> = line.split(',').map(parse_index).collect();
            match location {
                Some(location) => {
                    return Ok(AttackInstruction {
                        keep_going: true,
                        location: Some(location),
                    });
                }
                None => {
                    warn!(input = %line, "Invalid place location");
                    reader.show(&format!("Invalid place location: {}", line));
                }
            }
        }
    }

    fn kind(&self) -> PlayerKind {
        PlayerKind::Manual
    }
}

/// Defender typed in by a person as `dimension,direction` or `giveup`.
pub struct ManualDefender {
    reader: SharedLineReader,
}

impl ManualDefender {
    /// Creates a manual defender reading from `reader`.
    pub fn new(reader: SharedLineReader) -> Self {
        Self { reader }
    }
}

impl Defender for ManualDefender {
    #[instrument(skip_all)]
    fn think(&mut self, board: &Board) -> Result<DefendInstruction, DecisionError> {
        let mut reader = lock(&self.reader)?;
        reader.show(&format!("Current board:\n{}", board));
        loop {
            let line = reader
                .prompt("At which axis do you want to move and to which direction: ")
                .map_err(|e| DecisionError::internal(format!("prompt failed: {}", e)))?;
            let line = line.trim();
            if line == GIVE_UP {
                info!("Manual defender gives up");
                reader.show("Defender gives up");
                return Ok(DefendInstruction::give_up());
            }

            let parsed = match line.split(',').collect::<Vec<_>>().as_slice() {
                [dimension, direction] => parse_index(dimension).zip(parse_step(direction)),
                _ => None,
            };
            match parsed {
                Some((dimension, direction)) => {
                    return Ok(DefendInstruction {
                        keep_going: true,
                        dimension: Some(dimension),
                        direction: Some(direction),
                    });
                }
                None => {
                    warn!(input = %line, "Invalid move dimension and direction");
                    reader.show(&format!("Invalid move dimension and direction: {}", line));
                }
            }
        }
    }

    fn kind(&self) -> PlayerKind {
        PlayerKind::Manual
    }
}
