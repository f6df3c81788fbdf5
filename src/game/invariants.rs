//! Game invariants - consistency checks that detect bugs.
//!
//! No sequence of engine operations should ever produce a violation. The
//! checker runs in tests, in the fuzz targets, and in the `validate` CLI
//! command against externally supplied snapshots.

use std::collections::{BTreeMap, BTreeSet};

use crate::game::{Coord, FlagState, GameState, PLAYER_COUNT};

/// Invariant violation error.
#[derive(Debug, Clone)]
pub struct InvariantViolation {
    /// Description of the violated invariant.
    pub message: String,
}

impl std::fmt::Display for InvariantViolation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Invariant violation: {}", self.message)
    }
}

impl std::error::Error for InvariantViolation {}

fn violation(message: String) -> InvariantViolation {
    InvariantViolation { message }
}

/// Check all game invariants.
///
/// Returns a list of violations found, or empty if all invariants hold.
#[must_use]
pub fn check_invariants(state: &GameState) -> Vec<InvariantViolation> {
    let mut violations = Vec::new();

    if usize::from(state.current_player) >= PLAYER_COUNT {
        violations.push(violation(format!(
            "Current player {} is not a seat",
            state.current_player
        )));
    }
    if state.game_over != state.winner.is_some() {
        violations.push(violation(format!(
            "Game over flag {} disagrees with winner {:?}",
            state.game_over, state.winner
        )));
    }

    // Units
    let mut unit_tiles: BTreeMap<Coord, u32> = BTreeMap::new();
    for (&id, unit) in &state.units {
        if unit.id != id {
            violations.push(violation(format!("Unit keyed {id} carries id {}", unit.id)));
        }
        if id >= state.next_id {
            violations.push(violation(format!(
                "Unit {id} is not below next id {}",
                state.next_id
            )));
        }
        if unit.hp == 0 || unit.hp > unit.max_hp {
            violations.push(violation(format!(
                "Unit {id} has hp {} outside 1..={}",
                unit.hp, unit.max_hp
            )));
        }
        if !state.is_inside(unit.position) {
            violations.push(violation(format!("Unit {id} at {} is off the grid", unit.position)));
        }
        if usize::from(unit.player) >= PLAYER_COUNT {
            violations.push(violation(format!("Unit {id} owned by unknown player {}", unit.player)));
        }
        if !state.is_landing_for(unit.player, unit.position) {
            violations.push(violation(format!(
                "Unit {id} shares {} with a structure it may not enter",
                unit.position
            )));
        }
        *unit_tiles.entry(unit.position).or_default() += 1;
    }
    for (coord, count) in unit_tiles {
        if count > 1 {
            violations.push(violation(format!("{count} units stacked at {coord}")));
        }
    }

    // Fortifications
    let mut fort_tiles = BTreeSet::new();
    for (&id, fort) in &state.fortifications {
        if fort.id != id {
            violations.push(violation(format!("Fortification keyed {id} carries id {}", fort.id)));
        }
        if state.units.contains_key(&id) {
            violations.push(violation(format!("Id {id} used by a unit and a fortification")));
        }
        if id >= state.next_id {
            violations.push(violation(format!(
                "Fortification {id} is not below next id {}",
                state.next_id
            )));
        }
        if fort.hp == 0 || fort.hp > fort.max_hp {
            violations.push(violation(format!(
                "Fortification {id} has hp {} outside 1..={}",
                fort.hp, fort.max_hp
            )));
        }
        if !state.is_inside(fort.position) {
            violations.push(violation(format!(
                "Fortification {id} at {} is off the grid",
                fort.position
            )));
        }
        if !fort_tiles.insert(fort.position) {
            violations.push(violation(format!("Fortifications stacked at {}", fort.position)));
        }
    }

    // Flags
    for player in &state.players {
        match player.flag.state {
            FlagState::Carried { carried_by } => {
                if !state.units.contains_key(&carried_by) {
                    violations.push(violation(format!(
                        "Flag of player {} carried by missing unit {carried_by}",
                        player.id
                    )));
                }
            }
            FlagState::Dropped { at } => {
                if !state.is_inside(at) {
                    violations.push(violation(format!(
                        "Flag of player {} dropped off the grid at {at}",
                        player.id
                    )));
                }
            }
            FlagState::AtBase => {}
        }
        if !state.is_inside(player.base) {
            violations.push(violation(format!(
                "Base of player {} at {} is off the grid",
                player.id, player.base
            )));
        }
    }

    violations
}

/// Assert all game invariants hold, panicking if any are violated.
///
/// Only active in debug builds. No-op in release builds.
///
/// # Panics
///
/// Panics with detailed message if any invariant is violated.
#[cfg(debug_assertions)]
pub fn assert_invariants(state: &GameState) {
    let violations = check_invariants(state);
    if !violations.is_empty() {
        let messages: Vec<_> = violations.iter().map(|v| v.message.as_str()).collect();
        panic!("Game invariant violations:\n  - {}", messages.join("\n  - "));
    }
}

/// No-op in release builds.
#[cfg(not(debug_assertions))]
pub fn assert_invariants(_state: &GameState) {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::{RulesConfig, UnitType};

    #[test]
    fn test_fresh_game_is_clean() {
        let game = GameState::new(10, 10, RulesConfig::default()).unwrap();
        assert!(check_invariants(&game).is_empty());
    }

    #[test]
    fn test_detects_stacking_and_dead_units() {
        let mut game = GameState::new(10, 10, RulesConfig::default()).unwrap();
        let a = game.place_unit(0, UnitType::Infantry, Coord::new(2, 2)).unwrap();
        let b = game.place_unit(1, UnitType::Infantry, Coord::new(3, 3)).unwrap();
        game.unit_mut(b).unwrap().position = Coord::new(2, 2);
        game.unit_mut(a).unwrap().hp = 0;

        let violations = check_invariants(&game);
        assert!(violations.iter().any(|v| v.message.contains("stacked")));
        assert!(violations.iter().any(|v| v.message.contains("hp 0")));
    }

    #[test]
    fn test_detects_dangling_carrier() {
        let mut game = GameState::new(10, 10, RulesConfig::default()).unwrap();
        game.players[1].flag.state = FlagState::Carried { carried_by: 99 };
        let violations = check_invariants(&game);
        assert_eq!(violations.len(), 1);
        assert!(violations[0].message.contains("missing unit 99"));
    }

    #[test]
    #[should_panic(expected = "Game invariant violations")]
    #[cfg(debug_assertions)]
    fn test_assert_invariants_panics() {
        let mut game = GameState::new(10, 10, RulesConfig::default()).unwrap();
        game.players[0].flag.state = FlagState::Carried { carried_by: 7 };
        assert_invariants(&game);
    }
}
