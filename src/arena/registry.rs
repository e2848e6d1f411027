//! Process-wide table of live rounds.
//!
//! Each registered round runs on its own thread and owns a [`Mailbox`] that
//! request handlers use to drive its remote players. A periodic sweep force
//! ends abandoned rounds and forgets finished ones.

use super::error::ArenaError;
use super::mailbox::{Mailbox, MailboxDirectory, MailboxView, Submission};
use crate::config::ArenaConfig;
use crate::players::{AttackInstruction, DefendInstruction, PlayerKind, Role, Seating};
use crate::round::{Round, RoundError, RoundId, RoundSpec};
use derive_new::new;
use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::thread::{self, JoinHandle};
use std::time::Instant;
use tracing::{debug, error, info, instrument, warn};
use uuid::Uuid;

type RoundHandle = JoinHandle<Result<u64, RoundError>>;

/// A round waiting for somebody to take a role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, new)]
pub struct Invitation {
    /// Round to join.
    pub round_uuid: RoundId,
    /// Role still free.
    pub unoccupied_role: Role,
}

/// What a sweep did.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SweepReport {
    /// Running rounds that were told to give up.
    pub ended: Vec<RoundId>,
    /// Finished rounds that were forgotten.
    pub reclaimed: Vec<RoundId>,
}

impl SweepReport {
    /// Whether the sweep changed nothing.
    pub fn is_empty(&self) -> bool {
        self.ended.is_empty() && self.reclaimed.is_empty()
    }
}

/// Applies the server-side provider rules: nobody can type at the server's
/// terminal, and at least one role must be played remotely.
pub fn coerce_kinds(attacker: PlayerKind, defender: PlayerKind) -> (PlayerKind, PlayerKind) {
    let attacker = match attacker {
        PlayerKind::Manual => PlayerKind::Random,
        other => other,
    };
    let defender = match defender {
        PlayerKind::Manual => PlayerKind::Remote,
        other => other,
    };
    if attacker != PlayerKind::Remote && defender != PlayerKind::Remote {
        (attacker, PlayerKind::Remote)
    } else {
        (attacker, defender)
    }
}

/// Registry of rounds played through the mailbox protocol.
#[derive(Debug)]
pub struct RoundRegistry {
    config: ArenaConfig,
    mailboxes: MailboxDirectory,
    threads: Mutex<HashMap<RoundId, RoundHandle>>,
    accepting: AtomicBool,
}

impl RoundRegistry {
    /// Creates an empty registry.
    #[instrument(skip(config), fields(admission_cap = config.admission_cap()))]
    pub fn new(config: ArenaConfig) -> Self {
        info!("Creating round registry");
        Self {
            config,
            mailboxes: MailboxDirectory::default(),
            threads: Mutex::new(HashMap::new()),
            accepting: AtomicBool::new(true),
        }
    }

    /// Active configuration.
    pub fn config(&self) -> &ArenaConfig {
        &self.config
    }

    /// Directory shared with remote players.
    pub fn mailboxes(&self) -> &MailboxDirectory {
        &self.mailboxes
    }

    /// Number of registered rounds, finished ones included until reclaimed.
    pub fn len(&self) -> usize {
        self.mailboxes.len()
    }

    /// Whether no round is registered.
    pub fn is_empty(&self) -> bool {
        self.mailboxes.is_empty()
    }

    fn threads(&self) -> MutexGuard<'_, HashMap<RoundId, RoundHandle>> {
        self.threads.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Starts a round on its own thread.
    ///
    /// Provider kinds are coerced with [`coerce_kinds`]. An invitation is
    /// only kept when both roles end up remote.
    ///
    /// # Errors
    ///
    /// - [`ArenaError::AdmissionLimitReached`] when the cap is reached
    /// - [`ArenaError::Closed`] after [`RoundRegistry::shutdown`]
    /// - [`ArenaError::Round`] when the board is invalid
    /// - [`ArenaError::Spawn`] when no thread can be started
    #[instrument(skip(self, spec), fields(attacker = %spec.attacker, defender = %spec.defender))]
    pub fn create_round(
        &self,
        spec: RoundSpec,
        invitation: Option<Role>,
    ) -> Result<RoundId, ArenaError> {
        // Held until the round is registered so concurrent creates respect
        // the cap and never slip past shutdown.
        let mut threads = self.threads();
        if !self.accepting.load(Ordering::Acquire) {
            warn!("Round requested after shutdown");
            return Err(ArenaError::Closed);
        }
        let cap = *self.config.admission_cap();
        if self.mailboxes.len() >= cap {
            info!(cap, "Too many players to start a new game");
            return Err(ArenaError::AdmissionLimitReached { cap });
        }

        let (attacker, defender) = coerce_kinds(spec.attacker, spec.defender);
        let spec = RoundSpec::new(spec.board, attacker, defender);
        let invitation = invitation
            .filter(|_| attacker == PlayerKind::Remote && defender == PlayerKind::Remote);

        let id = Uuid::new_v4();
        let seating = Seating::new(self.mailboxes.clone(), self.config.poll_interval());
        let mut round = Round::new(id, &spec, &seating)?;

        let mailbox = Arc::new(Mailbox::new(id, attacker, defender, invitation));
        self.mailboxes.insert(mailbox.clone());

        let spawned = thread::Builder::new()
            .name(format!("round-{}", id))
            .spawn(move || {
                let outcome = round.start();
                if let Ok(score) = outcome {
                    mailbox.record_score(score);
                }
                outcome
            });

        match spawned {
            Ok(handle) => {
                threads.insert(id, handle);
                info!(round_id = %id, %attacker, %defender, ?invitation, "A new game might have started");
                Ok(id)
            }
            Err(e) => {
                self.mailboxes.remove(&id);
                error!(round_id = %id, error = %e, "Request to start a new game failed");
                Err(ArenaError::Spawn {
                    reason: e.to_string(),
                })
            }
        }
    }

    /// Current view of a round; stamps the visit. `None` for unknown ids.
    #[instrument(skip(self))]
    pub fn display(&self, id: &RoundId) -> Option<MailboxView> {
        let mailbox = self.mailboxes.get(id)?;
        mailbox.touch_visit();
        Some(mailbox.view())
    }

    /// Feeds a remote attacker. `None` for unknown ids.
    #[instrument(skip(self))]
    pub fn submit_attack(&self, id: &RoundId, instruction: AttackInstruction) -> Option<Submission> {
        Some(self.mailboxes.get(id)?.submit_attack(instruction))
    }

    /// Feeds a remote defender. `None` for unknown ids.
    #[instrument(skip(self))]
    pub fn submit_defend(&self, id: &RoundId, instruction: DefendInstruction) -> Option<Submission> {
        Some(self.mailboxes.get(id)?.submit_defend(instruction))
    }

    /// Takes the open role of a round. `None` for unknown ids, `Some(false)`
    /// if the role is not on offer.
    #[instrument(skip(self))]
    pub fn claim(&self, id: &RoundId, role: Role) -> Option<bool> {
        let mailbox = self.mailboxes.get(id)?;
        mailbox.touch_visit();
        Some(mailbox.claim(role))
    }

    /// Open invitations whose round was looked at recently.
    pub fn list_unoccupied(&self) -> Vec<Invitation> {
        self.list_unoccupied_at(Instant::now())
    }

    /// [`RoundRegistry::list_unoccupied`] evaluated at `now`.
    pub fn list_unoccupied_at(&self, now: Instant) -> Vec<Invitation> {
        let window = self.config.invitation_window();
        self.mailboxes
            .all()
            .into_iter()
            .filter_map(|mailbox| {
                let role = mailbox.invitation()?;
                let (since_visit, _) = mailbox.idle_for(now);
                (since_visit < window).then(|| Invitation::new(mailbox.round_id(), role))
            })
            .collect()
    }

    /// One open invitation picked at random.
    pub fn pick_unoccupied(&self) -> Option<Invitation> {
        self.list_unoccupied()
            .choose(&mut rand::thread_rng())
            .copied()
    }

    /// Housekeeping pass at the current instant.
    pub fn sweep(&self) -> SweepReport {
        self.sweep_at(Instant::now())
    }

    /// Housekeeping pass evaluated at `now`.
    ///
    /// A finished round that nobody visited or updated within the dead round
    /// window is removed. A running round idle in both respects beyond the
    /// idle timeout is told to give up; it is removed by a later pass once
    /// its thread has finished.
    #[instrument(skip(self, now))]
    pub fn sweep_at(&self, now: Instant) -> SweepReport {
        let dead_window = self.config.dead_round_window();
        let idle_timeout = self.config.idle_timeout();
        let mut report = SweepReport::default();
        let mut threads = self.threads();

        for mailbox in self.mailboxes.all() {
            let id = mailbox.round_id();
            let finished = threads.get(&id).is_none_or(JoinHandle::is_finished);
            let (since_visit, since_update) = mailbox.idle_for(now);

            if finished && since_visit > dead_window && since_update > dead_window {
                self.mailboxes.remove(&id);
                if let Some(handle) = threads.remove(&id) {
                    join_round(id, handle);
                }
                report.reclaimed.push(id);
            } else if !finished && since_visit > idle_timeout && since_update > idle_timeout {
                mailbox.force_end();
                report.ended.push(id);
            }
        }

        if !report.ended.is_empty() {
            info!(rounds = ?report.ended, "Ended pending rounds");
        }
        if !report.reclaimed.is_empty() {
            info!(rounds = ?report.reclaimed, "Cleaned dead rounds");
        }
        report
    }

    /// Stops admitting rounds, releases every waiting player and joins all
    /// round threads.
    #[instrument(skip(self))]
    pub fn shutdown(&self) {
        {
            let _threads = self.threads();
            self.accepting.store(false, Ordering::Release);
        }
        let mailboxes = self.mailboxes.all();
        info!(rounds = mailboxes.len(), "Shutting down round registry");
        for mailbox in &mailboxes {
            mailbox.close();
        }

        let handles: Vec<_> = self.threads().drain().collect();
        for (id, handle) in handles {
            join_round(id, handle);
        }
        info!("Round registry shut down");
    }
}

fn join_round(id: RoundId, handle: RoundHandle) {
    match handle.join() {
        Ok(Ok(score)) => debug!(round_id = %id, score, "Round thread joined"),
        Ok(Err(e)) => warn!(round_id = %id, error = %e, "Round thread ended with an error"),
        Err(_) => error!(round_id = %id, "Round thread panicked"),
    }
}
