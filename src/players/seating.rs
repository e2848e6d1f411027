//! Builds providers from their kinds.

use super::{
    Attacker, Defender, LineReader, ManualAttacker, ManualDefender, PlayerKind, RandomAttacker,
    RandomDefender, RemoteAttacker, RemoteDefender, SharedLineReader, StdinReader,
    StrategyAttacker, StrategyDefender,
};
use crate::arena::MailboxDirectory;
use crate::round::RoundId;
use std::fmt;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tracing::{debug, instrument};

/// Default delay between two looks at a mailbox wait flag.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Everything the providers of a round may need: the mailbox directory for
/// remote players, the terminal for manual players and an optional seed for
/// the randomised ones.
#[derive(Clone)]
pub struct Seating {
    mailboxes: MailboxDirectory,
    poll_interval: Duration,
    reader: SharedLineReader,
    seed: Option<u64>,
}

impl Seating {
    /// Creates a seating plan backed by `mailboxes`.
    pub fn new(mailboxes: MailboxDirectory, poll_interval: Duration) -> Self {
        Self {
            mailboxes,
            poll_interval,
            reader: Arc::new(Mutex::new(StdinReader)),
            seed: None,
        }
    }

    /// Replaces the terminal used by manual players.
    pub fn with_reader(mut self, reader: impl LineReader + 'static) -> Self {
        self.reader = Arc::new(Mutex::new(reader));
        self
    }

    /// Makes random and strategy players reproducible.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Seed for randomised players, if any.
    pub fn seed(&self) -> Option<u64> {
        self.seed
    }

    /// Mailbox directory remote players look themselves up in.
    pub fn mailboxes(&self) -> &MailboxDirectory {
        &self.mailboxes
    }

    /// Builds the attacker for `kind`.
    #[instrument(skip(self))]
    pub fn attacker(&self, kind: PlayerKind, round_id: RoundId) -> Box<dyn Attacker> {
        debug!("Seating attacker");
        match kind {
            PlayerKind::Random => Box::new(match self.seed {
                Some(seed) => RandomAttacker::with_seed(seed),
                None => RandomAttacker::new(),
            }),
            PlayerKind::Strategy => Box::new(match self.seed {
                Some(seed) => StrategyAttacker::with_seed(seed),
                None => StrategyAttacker::new(),
            }),
            PlayerKind::Manual => Box::new(ManualAttacker::new(self.reader.clone())),
            PlayerKind::Remote => Box::new(RemoteAttacker::new(
                round_id,
                self.mailboxes.clone(),
                self.poll_interval,
            )),
        }
    }

    /// Builds the defender for `kind`.
    #[instrument(skip(self))]
    pub fn defender(&self, kind: PlayerKind, round_id: RoundId) -> Box<dyn Defender> {
        debug!("Seating defender");
        match kind {
            PlayerKind::Random => Box::new(match self.seed {
                Some(seed) => RandomDefender::with_seed(seed.wrapping_add(1)),
                None => RandomDefender::new(),
            }),
            PlayerKind::Strategy => Box::new(StrategyDefender::new()),
            PlayerKind::Manual => Box::new(ManualDefender::new(self.reader.clone())),
            PlayerKind::Remote => Box::new(RemoteDefender::new(
                round_id,
                self.mailboxes.clone(),
                self.poll_interval,
            )),
        }
    }
}

impl Default for Seating {
    fn default() -> Self {
        Self::new(MailboxDirectory::default(), DEFAULT_POLL_INTERVAL)
    }
}

impl fmt::Debug for Seating {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Seating")
            .field("mailboxes", &self.mailboxes.len())
            .field("poll_interval", &self.poll_interval)
            .field("seed", &self.seed)
            .finish()
    }
}
