//! Tests for decision providers and instruction validation.

use serde_json::json;
use std::collections::VecDeque;
use std::io;
use std::str::FromStr;
use std::sync::{Arc, Mutex};
use tilewar::{
    Attack, AttackInstruction, Attacker, Board, DecisionError, Defend, DefendInstruction,
    Defender, Direction, MailboxDirectory, ManualAttacker, ManualDefender, PlayerKind,
    RandomAttacker, RandomDefender, RemoteAttacker, RemoteDefender, Seating, StrategyAttacker,
    StrategyDefender, DEFAULT_POLL_INTERVAL, LineReader,
};
use uuid::Uuid;

fn board(layout: serde_json::Value) -> Board {
    Board::from_layout(&layout).expect("valid layout")
}

/// Replays canned answers and records what was shown.
struct ScriptedReader {
    answers: VecDeque<String>,
    shown: Arc<Mutex<Vec<String>>>,
}

impl ScriptedReader {
    fn new(answers: &[&str]) -> (Self, Arc<Mutex<Vec<String>>>) {
        let reader = Self {
            answers: answers.iter().map(|a| format!("{}\n", a)).collect(),
            shown: Arc::default(),
        };
        let shown = reader.shown.clone();
        (reader, shown)
    }
}

impl LineReader for ScriptedReader {
    fn prompt(&mut self, _text: &str) -> io::Result<String> {
        self.answers
            .pop_front()
            .ok_or_else(|| io::Error::new(io::ErrorKind::UnexpectedEof, "script exhausted"))
    }

    fn show(&mut self, text: &str) {
        self.shown.lock().unwrap().push(text.to_string());
    }
}

fn shared(reader: ScriptedReader) -> tilewar::SharedLineReader {
    Arc::new(Mutex::new(reader))
}

#[test]
fn test_kind_names() {
    assert_eq!(PlayerKind::from_str("Online").unwrap(), PlayerKind::Remote);
    assert_eq!(PlayerKind::from_str("Remote").unwrap(), PlayerKind::Remote);
    assert_eq!(PlayerKind::from_str("Strategy").unwrap(), PlayerKind::Strategy);
    assert!(PlayerKind::from_str("random").is_err());
    assert_eq!(PlayerKind::Remote.to_string(), "Remote");
}

#[test]
fn test_attack_text_is_parsed_leniently() {
    assert_eq!(AttackInstruction::from_text("giveup"), AttackInstruction::give_up());
    assert_eq!(
        AttackInstruction::from_text("1,x").location,
        Some(vec![1, -1])
    );
    assert!(matches!(
        AttackInstruction::from_text("1,x").validate(),
        Err(DecisionError::Malformed { .. })
    ));
    assert_eq!(
        AttackInstruction::from_text(" 1,3 ").validate().unwrap(),
        Attack::Place(vec![1, 3])
    );
}

#[test]
fn test_defend_text_is_parsed_leniently() {
    let bad_direction = DefendInstruction::from_text("0,2");
    assert_eq!(bad_direction.direction, Some(0));
    assert!(bad_direction.validate().is_err());

    let wrong_arity = DefendInstruction::from_text("0");
    assert_eq!(wrong_arity.dimension, None);
    assert!(matches!(
        wrong_arity.validate(),
        Err(DecisionError::Malformed { .. })
    ));

    assert_eq!(
        DefendInstruction::from_text("1,-1").validate().unwrap(),
        Defend::Slide {
            dimension: 1,
            direction: Direction::TowardOrigin
        }
    );
    assert_eq!(
        DefendInstruction::from_text("giveup").validate().unwrap(),
        Defend::GiveUp
    );
}

#[test]
fn test_validation_rejects_missing_payload() {
    let attack = AttackInstruction {
        keep_going: true,
        location: None,
    };
    assert!(matches!(attack.validate(), Err(DecisionError::Malformed { .. })));

    let defend = DefendInstruction {
        keep_going: true,
        dimension: Some(-3),
        direction: Some(1),
    };
    assert!(matches!(defend.validate(), Err(DecisionError::Malformed { .. })));
}

#[test]
fn test_only_malformed_is_recoverable() {
    assert!(!AttackInstruction::from_text("x").validate().unwrap_err().is_fatal());
    let missing = DecisionError::UnregisteredRound {
        round_id: Uuid::new_v4(),
    };
    assert!(missing.is_fatal());
}

#[test]
fn test_random_attacker_picks_the_only_empty_cell() {
    let mut attacker = RandomAttacker::with_seed(1);
    let board = board(json!([[2, 4], [0, 8]]));
    assert_eq!(attacker.decide(&board).unwrap(), Attack::Place(vec![1, 0]));
}

#[test]
fn test_random_attacker_gives_up_on_full_board() {
    let mut attacker = RandomAttacker::with_seed(1);
    let board = board(json!([[2, 4], [4, 2]]));
    assert_eq!(attacker.decide(&board).unwrap(), Attack::GiveUp);
}

#[test]
fn test_random_defender_only_picks_legal_slides() {
    let mut defender = RandomDefender::with_seed(3);
    let board = board(json!([[2, 0, 0], [0, 0, 0], [0, 0, 0]]));
    for _ in 0..20 {
        match defender.decide(&board).unwrap() {
            Defend::Slide {
                dimension,
                direction,
            } => {
                assert_eq!(direction, Direction::AwayFromOrigin);
                assert!(dimension < 2);
            }
            Defend::GiveUp => panic!("a legal slide exists"),
        }
    }

    let stuck = board_stuck();
    assert_eq!(defender.decide(&stuck).unwrap(), Defend::GiveUp);
}

fn board_stuck() -> Board {
    board(json!([[2, 4], [4, 2]]))
}

#[test]
fn test_strategy_attacker_crowds_the_largest_tile() {
    let board = board(json!([[0, 0, 0], [0, 8, 0], [0, 0, 2]]));
    let mut candidates = StrategyAttacker::candidates(&board);
    candidates.sort();
    assert_eq!(
        candidates,
        vec![vec![0, 1], vec![1, 0], vec![1, 2], vec![2, 1]]
    );

    let mut attacker = StrategyAttacker::with_seed(9);
    match attacker.decide(&board).unwrap() {
        Attack::Place(location) => assert!(candidates.contains(&location)),
        Attack::GiveUp => panic!("empty cells exist"),
    }
}

#[test]
fn test_strategy_attacker_falls_back_to_smaller_values() {
    // The 8 is boxed in; only the upper 4 touches an empty cell.
    let board = board(json!([[8, 4, 0], [4, 2, 0]]));
    assert_eq!(StrategyAttacker::candidates(&board), vec![vec![0, 2]]);
}

#[test]
fn test_strategy_defender_preference_order() {
    let toward = board(json!([[0, 2], [0, 0]]));
    assert_eq!(
        StrategyDefender::preferred(&toward),
        Some((1, Direction::TowardOrigin))
    );

    let away = board(json!([[2, 0], [0, 0]]));
    assert_eq!(
        StrategyDefender::preferred(&away),
        Some((1, Direction::AwayFromOrigin))
    );

    let mut defender = StrategyDefender::new();
    assert_eq!(defender.decide(&board_stuck()).unwrap(), Defend::GiveUp);
}

#[test]
fn test_manual_attacker_reprompts_on_bad_input() {
    let (reader, shown) = ScriptedReader::new(&["abc", "0,-1", "1,0"]);
    let mut attacker = ManualAttacker::new(shared(reader));
    let board = Board::new(&[2, 2]).unwrap();

    assert_eq!(attacker.decide(&board).unwrap(), Attack::Place(vec![1, 0]));
    let shown = shown.lock().unwrap();
    assert_eq!(
        shown
            .iter()
            .filter(|line| line.starts_with("Invalid place location"))
            .count(),
        2
    );
}

#[test]
fn test_manual_defender_reads_axis_and_direction() {
    let (reader, _) = ScriptedReader::new(&["0,2", "1,-1"]);
    let mut defender = ManualDefender::new(shared(reader));
    let board = Board::new(&[2, 2]).unwrap();
    assert_eq!(
        defender.decide(&board).unwrap(),
        Defend::Slide {
            dimension: 1,
            direction: Direction::TowardOrigin
        }
    );
}

#[test]
fn test_manual_players_give_up() {
    let (reader, _) = ScriptedReader::new(&["giveup", "giveup"]);
    let reader = shared(reader);
    let board = Board::new(&[2, 2]).unwrap();
    assert_eq!(
        ManualAttacker::new(reader.clone()).decide(&board).unwrap(),
        Attack::GiveUp
    );
    assert_eq!(
        ManualDefender::new(reader).decide(&board).unwrap(),
        Defend::GiveUp
    );
}

#[test]
fn test_closed_input_is_fatal() {
    let (reader, _) = ScriptedReader::new(&[]);
    let mut attacker = ManualAttacker::new(shared(reader));
    let error = attacker.decide(&Board::new(&[2, 2]).unwrap()).unwrap_err();
    assert!(matches!(error, DecisionError::Internal { .. }));
    assert!(error.is_fatal());
}

#[test]
fn test_remote_players_need_a_mailbox() {
    let board = Board::new(&[2, 2]).unwrap();
    let id = Uuid::new_v4();

    let mut attacker = RemoteAttacker::new(id, MailboxDirectory::default(), DEFAULT_POLL_INTERVAL);
    assert_eq!(
        attacker.decide(&board).unwrap_err(),
        DecisionError::UnregisteredRound { round_id: id }
    );

    let mut defender = RemoteDefender::new(id, MailboxDirectory::default(), DEFAULT_POLL_INTERVAL);
    assert!(defender.decide(&board).unwrap_err().is_fatal());
}

#[test]
fn test_seating_builds_requested_kinds() {
    let (reader, _) = ScriptedReader::new(&[]);
    let seating = Seating::default().with_reader(reader).with_seed(5);
    let id = Uuid::new_v4();
    for kind in [
        PlayerKind::Random,
        PlayerKind::Strategy,
        PlayerKind::Manual,
        PlayerKind::Remote,
    ] {
        assert_eq!(seating.attacker(kind, id).kind(), kind);
        assert_eq!(seating.defender(kind, id).kind(), kind);
    }
}
