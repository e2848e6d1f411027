//! Providers answered by an external client through the round's mailbox.

use super::{Attacker, AttackInstruction, DecisionError, Defender, DefendInstruction, PlayerKind};
use crate::arena::MailboxDirectory;
use crate::board::Board;
use crate::round::RoundId;
use std::time::Duration;
use tracing::{debug, error, instrument};

/// Attacker whose answers arrive through [`crate::arena::Mailbox::submit_attack`].
#[derive(Debug)]
pub struct RemoteAttacker {
    round_id: RoundId,
    mailboxes: MailboxDirectory,
    poll_interval: Duration,
}

impl RemoteAttacker {
    /// Binds the attacker to a round's mailbox.
    pub fn new(round_id: RoundId, mailboxes: MailboxDirectory, poll_interval: Duration) -> Self {
        Self {
            round_id,
            mailboxes,
            poll_interval,
        }
    }
}

impl Attacker for RemoteAttacker {
    #[instrument(skip_all, fields(round_id = %self.round_id))]
    fn think(&mut self, board: &Board) -> Result<AttackInstruction, DecisionError> {
        let mailbox = self.mailboxes.get(&self.round_id).ok_or_else(|| {
            error!("No mailbox registered for remote attacker");
            DecisionError::UnregisteredRound {
                round_id: self.round_id,
            }
        })?;
        debug!("Waiting for remote attacker");
        Ok(mailbox.await_attack(board, self.poll_interval))
    }

    fn kind(&self) -> PlayerKind {
        PlayerKind::Remote
    }
}

/// Defender whose answers arrive through [`crate::arena::Mailbox::submit_defend`].
#[derive(Debug)]
pub struct RemoteDefender {
    round_id: RoundId,
    mailboxes: MailboxDirectory,
    poll_interval: Duration,
}

impl RemoteDefender {
    /// Binds the defender to a round's mailbox.
    pub fn new(round_id: RoundId, mailboxes: MailboxDirectory, poll_interval: Duration) -> Self {
        Self {
            round_id,
            mailboxes,
            poll_interval,
        }
    }
}

impl Defender for RemoteDefender {
    #[instrument(skip_all, fields(round_id = %self.round_id))]
    fn think(&mut self, board: &Board) -> Result<DefendInstruction, DecisionError> {
        let mailbox = self.mailboxes.get(&self.round_id).ok_or_else(|| {
            error!("No mailbox registered for remote defender");
            DecisionError::UnregisteredRound {
                round_id: self.round_id,
            }
        })?;
        debug!("Waiting for remote defender");
        Ok(mailbox.await_defend(board, self.poll_interval))
    }

    fn kind(&self) -> PlayerKind {
        PlayerKind::Remote
    }
}
