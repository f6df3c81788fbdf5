#![no_main]

//! Action sequence fuzzer.
//!
//! Feeds arbitrary actions (spawns, builds, moves, attacks, turn ends) from
//! either seat into a small game and checks after every step that:
//! 1. The structural invariants hold
//! 2. The revision advanced by one if and only if the action was accepted
//! 3. The state survives a snapshot round trip

use arbitrary::Arbitrary;
use frontline::game::invariants::check_invariants;
use frontline::{Action, Coord, FortType, GameState, Purchase, RulesConfig, UnitType};
use libfuzzer_sys::fuzz_target;

/// A fuzzer-generated action. Coordinates and ids are folded into range so
/// most actions reach the rules rather than bounce off lookups.
#[derive(Arbitrary, Debug, Clone)]
enum FuzzAction {
    Spawn { unit: Option<u8>, fort: u8, x: u8, y: u8 },
    Build { engineer: u8, fort: u8, x: u8, y: u8 },
    Move { unit: u8, x: u8, y: u8 },
    Attack { attacker: u8, target: u8 },
    EndTurn,
}

#[derive(Arbitrary, Debug)]
struct ActionsInput {
    width: u8,
    height: u8,
    /// Play as the other seat instead of the current one.
    off_turn: Vec<bool>,
    actions: Vec<FuzzAction>,
}

fn fort(index: u8) -> FortType {
    FortType::ALL[usize::from(index) % FortType::ALL.len()]
}

fn id(index: u8) -> u32 {
    u32::from(index % 32) + 1
}

fuzz_target!(|input: ActionsInput| {
    let width = u16::from(input.width % 16).max(2);
    let height = u16::from(input.height % 16).max(2);
    let Some(mut game) = GameState::new(width, height, RulesConfig::default()) else {
        return;
    };
    let at = |x: u8, y: u8| Coord::new(u16::from(x) % width, u16::from(y) % height);

    for (step, fuzz) in input.actions.into_iter().take(200).enumerate() {
        let mut player = game.current_player();
        if input.off_turn.get(step).copied().unwrap_or(false) {
            player = frontline::game::opponent(player);
        }
        let action = match fuzz {
            FuzzAction::Spawn { unit, fort: f, x, y } => Action::Spawn {
                player,
                purchase: match unit {
                    Some(u) => Purchase::Unit(UnitType::ALL[usize::from(u) % UnitType::ALL.len()]),
                    None => Purchase::Fortification(fort(f)),
                },
                at: at(x, y),
            },
            FuzzAction::Build { engineer, fort: f, x, y } => Action::BuildFort {
                player,
                engineer: id(engineer),
                fort: fort(f),
                at: at(x, y),
            },
            FuzzAction::Move { unit, x, y } => Action::Move {
                player,
                unit: id(unit),
                to: at(x, y),
            },
            FuzzAction::Attack { attacker, target } => Action::Attack {
                player,
                attacker: id(attacker),
                target: id(target),
            },
            FuzzAction::EndTurn => Action::EndTurn { player },
        };

        let before = game.revision();
        let accepted = game.apply_action(&action);
        let expected = if accepted { before + 1 } else { before };
        assert_eq!(game.revision(), expected, "revision drift after {action:?}");

        let violations = check_invariants(&game);
        assert!(violations.is_empty(), "{violations:?} after {action:?}");
    }

    let snapshot = game.snapshot();
    let restored = GameState::from_snapshot(snapshot.clone(), RulesConfig::default())
        .expect("own snapshot must load");
    assert_eq!(restored.snapshot(), snapshot);
});
