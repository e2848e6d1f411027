//! Per-round mailbox shared between a round thread and request handlers.
//!
//! Each field has one writer. The round thread publishes the board, raises a
//! wait flag and polls it; a request handler fills the matching instruction
//! slot and lowers the flag. A flag goes false→true→false exactly once per
//! turn.

use crate::board::Board;
use crate::players::{AttackInstruction, DefendInstruction, PlayerKind, Role};
use crate::round::RoundId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, OnceLock, PoisonError, RwLock};
use std::thread;
use std::time::{Duration, Instant};
use tracing::{debug, info, instrument};

/// Outcome of handing an instruction to a mailbox.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Submission {
    /// The role was waiting and has been answered.
    Accepted,
    /// The role was not waiting; nothing changed.
    NotPossibleNow,
}

/// Monotonic instant paired with wall-clock time for display.
#[derive(Debug, Clone, Copy)]
struct Stamp {
    at: Instant,
    wall: DateTime<Utc>,
}

impl Stamp {
    fn now() -> Self {
        Self {
            at: Instant::now(),
            wall: Utc::now(),
        }
    }
}

fn guard<T: ?Sized>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Read-only picture of a mailbox for clients.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MailboxView {
    /// Round identifier.
    pub uuid: RoundId,
    /// Last published board layout, empty before the first turn.
    pub board_tiles: Value,
    /// Attacker provider kind.
    pub attacker_type: PlayerKind,
    /// Whether the attacker is waiting for an instruction.
    pub attacker_wait: bool,
    /// Defender provider kind.
    pub defender_type: PlayerKind,
    /// Whether the defender is waiting for an instruction.
    pub defender_wait: bool,
    /// Open invitation, if any.
    pub unoccupied_role: Option<Role>,
    /// Last time a client looked at the round.
    pub last_visit: DateTime<Utc>,
    /// Last time a remote instruction was consumed.
    pub last_update: DateTime<Utc>,
    /// Final score, absent while the round is running.
    pub round_score: Option<u64>,
}

/// Shared state enabling remote providers.
#[derive(Debug)]
pub struct Mailbox {
    round_id: RoundId,
    attacker_kind: PlayerKind,
    defender_kind: PlayerKind,
    board: Mutex<Option<Board>>,
    attacker_wait: AtomicBool,
    defender_wait: AtomicBool,
    attacker_instruction: Mutex<Option<AttackInstruction>>,
    defender_instruction: Mutex<Option<DefendInstruction>>,
    last_visit: Mutex<Stamp>,
    last_update: Mutex<Stamp>,
    unoccupied_role: Mutex<Option<Role>>,
    score: OnceLock<u64>,
    closed: AtomicBool,
}

impl Mailbox {
    /// Creates an idle mailbox.
    pub fn new(
        round_id: RoundId,
        attacker_kind: PlayerKind,
        defender_kind: PlayerKind,
        unoccupied_role: Option<Role>,
    ) -> Self {
        let stamp = Stamp::now();
        Self {
            round_id,
            attacker_kind,
            defender_kind,
            board: Mutex::new(None),
            attacker_wait: AtomicBool::new(false),
            defender_wait: AtomicBool::new(false),
            attacker_instruction: Mutex::new(None),
            defender_instruction: Mutex::new(None),
            last_visit: Mutex::new(stamp),
            last_update: Mutex::new(stamp),
            unoccupied_role: Mutex::new(unoccupied_role),
            score: OnceLock::new(),
            closed: AtomicBool::new(false),
        }
    }

    /// Round this mailbox belongs to.
    pub fn round_id(&self) -> RoundId {
        self.round_id
    }

    /// Whether the attacker is waiting.
    pub fn attacker_waiting(&self) -> bool {
        self.attacker_wait.load(Ordering::Acquire)
    }

    /// Whether the defender is waiting.
    pub fn defender_waiting(&self) -> bool {
        self.defender_wait.load(Ordering::Acquire)
    }

    /// Whether [`Mailbox::close`] was called.
    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }

    // ── round-thread side ──────────────────────────────────────────────

    /// Publishes the board, raises the attacker flag and blocks until a
    /// request handler answers.
    #[instrument(skip_all, fields(round_id = %self.round_id))]
    pub fn await_attack(&self, board: &Board, poll_interval: Duration) -> AttackInstruction {
        self.publish(board);
        *guard(&self.attacker_instruction) = None;
        self.attacker_wait.store(true, Ordering::Release);
        debug!("Attacker waiting");

        if !self.poll(&self.attacker_wait, poll_interval) {
            return AttackInstruction::give_up();
        }
        self.touch_update();
        guard(&self.attacker_instruction)
            .take()
            .unwrap_or_else(AttackInstruction::give_up)
    }

    /// Publishes the board, raises the defender flag and blocks until a
    /// request handler answers.
    #[instrument(skip_all, fields(round_id = %self.round_id))]
    pub fn await_defend(&self, board: &Board, poll_interval: Duration) -> DefendInstruction {
        self.publish(board);
        *guard(&self.defender_instruction) = None;
        self.defender_wait.store(true, Ordering::Release);
        debug!("Defender waiting");

        if !self.poll(&self.defender_wait, poll_interval) {
            return DefendInstruction::give_up();
        }
        self.touch_update();
        guard(&self.defender_instruction)
            .take()
            .unwrap_or_else(DefendInstruction::give_up)
    }

    /// Sleeps until `flag` is lowered. Returns `false` if the mailbox was
    /// closed instead.
    fn poll(&self, flag: &AtomicBool, poll_interval: Duration) -> bool {
        while flag.load(Ordering::Acquire) {
            if self.is_closed() {
                flag.store(false, Ordering::Release);
                debug!("Mailbox closed while waiting");
                return false;
            }
            thread::sleep(poll_interval);
        }
        true
    }

    /// Stores the latest board snapshot.
    pub fn publish(&self, board: &Board) {
        *guard(&self.board) = Some(board.clone());
    }

    /// Records the final score. Only the first call has an effect.
    pub fn record_score(&self, score: u64) {
        if self.score.set(score).is_ok() {
            info!(round_id = %self.round_id, score, "Score recorded");
        }
    }

    /// Final score, if recorded.
    pub fn score(&self) -> Option<u64> {
        self.score.get().copied()
    }

    fn touch_update(&self) {
        *guard(&self.last_update) = Stamp::now();
    }

    // ── request-handler side ───────────────────────────────────────────

    /// Answers a waiting attacker.
    #[instrument(skip(self), fields(round_id = %self.round_id))]
    pub fn submit_attack(&self, instruction: AttackInstruction) -> Submission {
        let mut slot = guard(&self.attacker_instruction);
        if !self.attacker_wait.load(Ordering::Acquire) {
            debug!("Attack is not possible now");
            return Submission::NotPossibleNow;
        }
        *slot = Some(instruction);
        self.attacker_wait.store(false, Ordering::Release);
        debug!("Attack instruction delivered");
        Submission::Accepted
    }

    /// Answers a waiting defender.
    #[instrument(skip(self), fields(round_id = %self.round_id))]
    pub fn submit_defend(&self, instruction: DefendInstruction) -> Submission {
        let mut slot = guard(&self.defender_instruction);
        if !self.defender_wait.load(Ordering::Acquire) {
            debug!("Defend is not possible now");
            return Submission::NotPossibleNow;
        }
        *slot = Some(instruction);
        self.defender_wait.store(false, Ordering::Release);
        debug!("Defend instruction delivered");
        Submission::Accepted
    }

    /// Injects a surrender into whichever role is waiting. Returns whether
    /// any role was waiting.
    pub fn force_end(&self) -> bool {
        let attacker = self.submit_attack(AttackInstruction::give_up()) == Submission::Accepted;
        let defender = self.submit_defend(DefendInstruction::give_up()) == Submission::Accepted;
        attacker || defender
    }

    /// Ends the current wait and makes every later wait end at once.
    pub fn close(&self) {
        self.closed.store(true, Ordering::Release);
        self.force_end();
    }

    /// Marks the round as looked at.
    pub fn touch_visit(&self) {
        *guard(&self.last_visit) = Stamp::now();
    }

    /// Clears the invitation if it matches `role`. Returns whether it did.
    #[instrument(skip(self), fields(round_id = %self.round_id))]
    pub fn claim(&self, role: Role) -> bool {
        let mut open = guard(&self.unoccupied_role);
        if *open == Some(role) {
            *open = None;
            info!("Invitation claimed");
            true
        } else {
            false
        }
    }

    /// Open invitation, if any.
    pub fn invitation(&self) -> Option<Role> {
        *guard(&self.unoccupied_role)
    }

    /// Time since the last visit and since the last consumed instruction.
    pub fn idle_for(&self, now: Instant) -> (Duration, Duration) {
        (
            now.saturating_duration_since(guard(&self.last_visit).at),
            now.saturating_duration_since(guard(&self.last_update).at),
        )
    }

    /// Snapshot for clients.
    pub fn view(&self) -> MailboxView {
        MailboxView {
            uuid: self.round_id,
            board_tiles: guard(&self.board)
                .as_ref()
                .map(Board::to_layout)
                .unwrap_or_else(|| Value::Array(Vec::new())),
            attacker_type: self.attacker_kind,
            attacker_wait: self.attacker_waiting(),
            defender_type: self.defender_kind,
            defender_wait: self.defender_waiting(),
            unoccupied_role: self.invitation(),
            last_visit: guard(&self.last_visit).wall,
            last_update: guard(&self.last_update).wall,
            round_score: self.score(),
        }
    }
}

/// Lookup table from round id to mailbox, shared by the registry and the
/// remote providers.
#[derive(Debug, Clone, Default)]
pub struct MailboxDirectory {
    inner: Arc<RwLock<HashMap<RoundId, Arc<Mailbox>>>>,
}

impl MailboxDirectory {
    /// Registers a mailbox.
    pub fn insert(&self, mailbox: Arc<Mailbox>) {
        self.inner
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(mailbox.round_id(), mailbox);
    }

    /// Looks a mailbox up.
    pub fn get(&self, id: &RoundId) -> Option<Arc<Mailbox>> {
        self.inner
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(id)
            .cloned()
    }

    /// Unregisters a mailbox.
    pub fn remove(&self, id: &RoundId) -> Option<Arc<Mailbox>> {
        self.inner
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(id)
    }

    /// Number of registered mailboxes.
    pub fn len(&self) -> usize {
        self.inner.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    /// Whether no mailbox is registered.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// All registered mailboxes.
    pub fn all(&self) -> Vec<Arc<Mailbox>> {
        self.inner
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .values()
            .cloned()
            .collect()
    }
}
