//! Tests for mailboxes and the round registry.

use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};
use tilewar::{
    coerce_kinds, ArenaConfig, ArenaError, AttackInstruction, Board, BoardSpec,
    DefendInstruction, Mailbox, PlayerKind, Role, RoundId, RoundRegistry, RoundSpec, Submission,
};
use uuid::Uuid;

const TICK: Duration = Duration::from_millis(2);

fn registry() -> RoundRegistry {
    RoundRegistry::new(ArenaConfig::default().with_poll_interval(TICK))
}

fn spec(attacker: PlayerKind, defender: PlayerKind) -> RoundSpec {
    RoundSpec::new(BoardSpec::with_shape(vec![2, 2]), attacker, defender)
}

/// Polls `condition` for up to five seconds.
fn eventually(mut condition: impl FnMut() -> bool) -> bool {
    let deadline = Instant::now() + Duration::from_secs(5);
    while Instant::now() < deadline {
        if condition() {
            return true;
        }
        thread::sleep(TICK);
    }
    false
}

fn defender_waiting(registry: &RoundRegistry, id: &RoundId) -> bool {
    registry.display(id).is_some_and(|view| view.defender_wait)
}

#[test]
fn test_submission_is_only_accepted_while_waiting() {
    let mailbox = Arc::new(Mailbox::new(
        Uuid::new_v4(),
        PlayerKind::Remote,
        PlayerKind::Remote,
        None,
    ));
    assert_eq!(
        mailbox.submit_attack(AttackInstruction::place(&[0, 0])),
        Submission::NotPossibleNow
    );

    let waiter = {
        let mailbox = mailbox.clone();
        thread::spawn(move || mailbox.await_attack(&Board::new(&[2, 2]).unwrap(), TICK))
    };
    assert!(eventually(|| mailbox.attacker_waiting()));
    assert_eq!(mailbox.view().board_tiles, serde_json::json!([[0, 0], [0, 0]]));

    assert_eq!(
        mailbox.submit_attack(AttackInstruction::place(&[1, 0])),
        Submission::Accepted
    );
    assert_eq!(
        mailbox.submit_attack(AttackInstruction::place(&[0, 1])),
        Submission::NotPossibleNow
    );
    assert_eq!(waiter.join().unwrap(), AttackInstruction::place(&[1, 0]));
    assert!(!mailbox.attacker_waiting());
}

#[test]
fn test_closed_mailbox_answers_give_up() {
    let mailbox = Arc::new(Mailbox::new(
        Uuid::new_v4(),
        PlayerKind::Random,
        PlayerKind::Remote,
        None,
    ));
    let waiter = {
        let mailbox = mailbox.clone();
        thread::spawn(move || mailbox.await_defend(&Board::new(&[2, 2]).unwrap(), TICK))
    };
    assert!(eventually(|| mailbox.defender_waiting()));
    mailbox.close();
    assert_eq!(waiter.join().unwrap(), DefendInstruction::give_up());

    // Later waits return at once.
    let board = Board::new(&[2, 2]).unwrap();
    assert_eq!(mailbox.await_defend(&board, TICK), DefendInstruction::give_up());
}

#[test]
fn test_kind_coercion() {
    use PlayerKind::*;
    assert_eq!(coerce_kinds(Manual, Manual), (Random, Remote));
    assert_eq!(coerce_kinds(Random, Strategy), (Random, Remote));
    assert_eq!(coerce_kinds(Remote, Strategy), (Remote, Strategy));
    assert_eq!(coerce_kinds(Remote, Remote), (Remote, Remote));
}

#[test]
fn test_remote_defender_round_runs_to_a_score() {
    let registry = registry();
    let id = registry
        .create_round(spec(PlayerKind::Random, PlayerKind::Remote), None)
        .unwrap();

    assert!(eventually(|| defender_waiting(&registry, &id)));
    let view = registry.display(&id).unwrap();
    assert_eq!(view.defender_type, PlayerKind::Remote);
    assert!(!view.attacker_wait);
    let tiles = Board::from_layout(&view.board_tiles).unwrap();
    assert!(tiles.sum() == 2 || tiles.sum() == 4);

    assert_eq!(
        registry.submit_defend(&id, DefendInstruction::from_text("giveup")),
        Some(Submission::Accepted)
    );
    assert!(eventually(|| registry
        .display(&id)
        .is_some_and(|view| view.round_score.is_some())));
    assert_eq!(registry.display(&id).unwrap().round_score, Some(tiles.score()));
    registry.shutdown();
}

#[test]
fn test_malformed_remote_answer_is_asked_again() {
    let registry = registry();
    let id = registry
        .create_round(spec(PlayerKind::Random, PlayerKind::Remote), None)
        .unwrap();

    assert!(eventually(|| defender_waiting(&registry, &id)));
    assert_eq!(
        registry.submit_defend(&id, DefendInstruction::from_text("0,5")),
        Some(Submission::Accepted)
    );
    assert!(eventually(|| defender_waiting(&registry, &id)));
    assert_eq!(registry.display(&id).unwrap().round_score, None);
    registry.shutdown();
}

#[test]
fn test_manual_request_is_coerced() {
    let registry = registry();
    let id = registry
        .create_round(spec(PlayerKind::Manual, PlayerKind::Manual), None)
        .unwrap();
    let view = registry.display(&id).unwrap();
    assert_eq!(view.attacker_type, PlayerKind::Random);
    assert_eq!(view.defender_type, PlayerKind::Remote);
    registry.shutdown();
}

#[test]
fn test_admission_cap() {
    let registry = RoundRegistry::new(
        ArenaConfig::default()
            .with_admission_cap(1)
            .with_poll_interval(TICK),
    );
    registry
        .create_round(spec(PlayerKind::Random, PlayerKind::Remote), None)
        .unwrap();
    assert_eq!(
        registry.create_round(spec(PlayerKind::Random, PlayerKind::Remote), None),
        Err(ArenaError::AdmissionLimitReached { cap: 1 })
    );
    assert_eq!(registry.len(), 1);
    registry.shutdown();
}

#[test]
fn test_invalid_board_is_never_registered() {
    let registry = registry();
    let bad = RoundSpec::new(
        BoardSpec::with_shape(vec![11, 2]),
        PlayerKind::Random,
        PlayerKind::Remote,
    );
    assert!(matches!(
        registry.create_round(bad, None),
        Err(ArenaError::Round { .. })
    ));
    assert!(registry.is_empty());
}

#[test]
fn test_unknown_round_ids() {
    let registry = registry();
    let id = Uuid::new_v4();
    assert!(registry.display(&id).is_none());
    assert!(registry.submit_attack(&id, AttackInstruction::give_up()).is_none());
    assert!(registry.submit_defend(&id, DefendInstruction::give_up()).is_none());
    assert!(registry.claim(&id, Role::Attacker).is_none());
}

#[test]
fn test_invitations() {
    let registry = registry();
    let open = registry
        .create_round(
            spec(PlayerKind::Remote, PlayerKind::Remote),
            Some(Role::Defender),
        )
        .unwrap();
    let dropped = registry
        .create_round(
            spec(PlayerKind::Random, PlayerKind::Remote),
            Some(Role::Attacker),
        )
        .unwrap();
    assert_eq!(registry.display(&dropped).unwrap().unoccupied_role, None);

    let listed = registry.list_unoccupied();
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].round_uuid, open);
    assert_eq!(listed[0].unoccupied_role, Role::Defender);
    assert_eq!(registry.pick_unoccupied(), Some(listed[0]));

    // Not looked at recently enough.
    let later = Instant::now() + Duration::from_secs(5);
    assert!(registry.list_unoccupied_at(later).is_empty());

    assert_eq!(registry.claim(&open, Role::Attacker), Some(false));
    assert_eq!(registry.claim(&open, Role::Defender), Some(true));
    assert_eq!(registry.claim(&open, Role::Defender), Some(false));
    assert!(registry.list_unoccupied().is_empty());
    registry.shutdown();
}

#[test]
fn test_sweep_ends_abandoned_rounds_then_reclaims_them() {
    let registry = registry();
    let id = registry
        .create_round(spec(PlayerKind::Random, PlayerKind::Remote), None)
        .unwrap();
    assert!(eventually(|| defender_waiting(&registry, &id)));

    let start = Instant::now();
    assert!(registry.sweep_at(start).is_empty());

    let report = registry.sweep_at(start + Duration::from_secs(301));
    assert_eq!(report.ended, vec![id]);
    assert!(eventually(|| registry
        .mailboxes()
        .get(&id)
        .is_some_and(|mailbox| mailbox.score().is_some())));

    // Finished, but updated a moment ago.
    assert!(registry.sweep_at(Instant::now()).reclaimed.is_empty());

    // The thread exits right after recording the score.
    assert!(eventually(|| {
        registry
            .sweep_at(Instant::now() + Duration::from_secs(31))
            .reclaimed
            == vec![id]
    }));
    assert!(registry.display(&id).is_none());
    assert!(registry.is_empty());
}

#[test]
fn test_shutdown_releases_waiting_rounds() {
    let registry = registry();
    let id = registry
        .create_round(spec(PlayerKind::Remote, PlayerKind::Remote), None)
        .unwrap();
    assert!(eventually(|| registry
        .display(&id)
        .is_some_and(|view| view.attacker_wait)));

    registry.shutdown();
    assert_eq!(registry.display(&id).unwrap().round_score, Some(0));
    assert_eq!(
        registry.create_round(spec(PlayerKind::Random, PlayerKind::Remote), None),
        Err(ArenaError::Closed)
    );
}

#[test]
fn test_shutdown_races_with_creates() {
    let registry = Arc::new(registry());
    let creators: Vec<_> = (0..4)
        .map(|_| {
            let registry = registry.clone();
            thread::spawn(move || loop {
                match registry.create_round(spec(PlayerKind::Remote, PlayerKind::Remote), None) {
                    Ok(_) => {}
                    Err(ArenaError::Closed) => break,
                    Err(ArenaError::AdmissionLimitReached { .. }) => thread::sleep(TICK),
                    Err(e) => panic!("unexpected error: {}", e),
                }
            })
        })
        .collect();
    assert!(eventually(|| registry.len() >= 4));

    registry.shutdown();
    for creator in creators {
        creator.join().unwrap();
    }
    let mailboxes = registry.mailboxes().all();
    assert!(!mailboxes.is_empty());
    assert!(mailboxes.iter().all(|mailbox| mailbox.is_closed()));
}
