use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::game::{Coord, EntityId, FortType, GameState, PlayerId, Purchase};

/// A player intent as sent over the wire.
///
/// Every variant names the acting seat. The engine re-validates the action
/// against its own state before applying it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum Action {
    /// Buy and place something near the player's base.
    Spawn {
        /// Acting seat.
        player: PlayerId,
        /// What to buy.
        purchase: Purchase,
        /// Where to place it.
        at: Coord,
    },
    /// Have an engineer build a structure next to it.
    BuildFort {
        /// Acting seat.
        player: PlayerId,
        /// Building unit.
        engineer: EntityId,
        /// Structure to build.
        fort: FortType,
        /// Where to build it.
        at: Coord,
    },
    /// Move a unit.
    Move {
        /// Acting seat.
        player: PlayerId,
        /// Unit to move.
        unit: EntityId,
        /// Destination.
        to: Coord,
    },
    /// Attack an enemy entity.
    Attack {
        /// Acting seat.
        player: PlayerId,
        /// Attacking unit.
        attacker: EntityId,
        /// Target unit or fortification.
        target: EntityId,
    },
    /// Pass the turn.
    EndTurn {
        /// Acting seat.
        player: PlayerId,
    },
}

impl Action {
    /// The acting seat.
    #[must_use]
    pub const fn player(&self) -> PlayerId {
        match *self {
            Action::Spawn { player, .. }
            | Action::BuildFort { player, .. }
            | Action::Move { player, .. }
            | Action::Attack { player, .. }
            | Action::EndTurn { player } => player,
        }
    }
}

impl GameState {
    /// Apply an action received from a seat.
    ///
    /// Rejected if the game is over or it is not that seat's turn; otherwise
    /// the same rules as the local operations apply. Local placement and build
    /// intents are left untouched.
    pub fn apply_action(&mut self, action: &Action) -> bool {
        if self.game_over {
            debug!(?action, "action rejected: game over");
            return false;
        }
        if !self.is_turn_of(action.player()) {
            debug!(?action, current = self.current_player, "action rejected: not this seat's turn");
            return false;
        }
        match *action {
            Action::Spawn { player, purchase, at } => {
                let spawned = self.purchase_for(player, purchase, at).is_some();
                if spawned {
                    self.commit();
                }
                spawned
            }
            Action::BuildFort {
                player,
                engineer,
                fort,
                at,
            } => {
                let built = self.build_for(player, engineer, fort, at).is_some();
                if built {
                    self.commit();
                }
                built
            }
            Action::Move { unit, to, .. } => self.move_unit(unit, to),
            Action::Attack {
                attacker, target, ..
            } => self.attack(attacker, target),
            Action::EndTurn { .. } => self.end_turn(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::{RulesConfig, UnitType};

    #[test]
    fn test_action_json_shape() {
        let action = Action::BuildFort {
            player: 1,
            engineer: 4,
            fort: FortType::Bunker,
            at: Coord::new(2, 3),
        };
        let json = serde_json::to_value(action).unwrap();
        assert_eq!(json["kind"], "buildFort");
        assert_eq!(json["fort"], "Bunker");
        assert_eq!(json["at"]["x"], 2);

        let parsed: Action =
            serde_json::from_str(r#"{"kind":"endTurn","player":0}"#).unwrap();
        assert_eq!(parsed, Action::EndTurn { player: 0 });
    }

    #[test]
    fn test_spawn_action_json() {
        let parsed: Action = serde_json::from_str(
            r#"{"kind":"spawn","player":0,"purchase":{"unit":"Scout"},"at":{"x":1,"y":0}}"#,
        )
        .unwrap();
        assert_eq!(
            parsed,
            Action::Spawn {
                player: 0,
                purchase: Purchase::Unit(UnitType::Scout),
                at: Coord::new(1, 0),
            }
        );
    }

    #[test]
    fn test_wrong_seat_rejected() {
        let mut game = GameState::new(8, 8, RulesConfig::default()).unwrap();
        let rev = game.revision();
        assert!(!game.apply_action(&Action::EndTurn { player: 1 }));
        assert_eq!(game.revision(), rev);
        assert!(game.apply_action(&Action::EndTurn { player: 0 }));
        assert_eq!(game.current_player(), 1);
    }

    #[test]
    fn test_remote_spawn_keeps_local_queue() {
        let mut game = GameState::new(8, 8, RulesConfig::default()).unwrap();
        assert!(game.queue_spawn(Purchase::Unit(UnitType::Infantry)));
        let action = Action::Spawn {
            player: 0,
            purchase: Purchase::Unit(UnitType::Scout),
            at: Coord::new(1, 1),
        };
        assert!(game.apply_action(&action));
        assert_eq!(game.pending_spawn(), Some(Purchase::Unit(UnitType::Infantry)));
        assert_eq!(game.money(0), 40);
    }

    #[test]
    fn test_remote_build() {
        let mut game = GameState::new(8, 8, RulesConfig::default()).unwrap();
        let eng = game.place_unit(0, UnitType::Engineer, Coord::new(3, 3)).unwrap();
        let build = Action::BuildFort {
            player: 0,
            engineer: eng,
            fort: FortType::BarbedWire,
            at: Coord::new(3, 4),
        };
        assert!(game.apply_action(&build));
        assert!(!game.apply_action(&build), "engineer already acted");
    }
}
