//! Turn transition: unit refresh, passive structure effects, healing and income.
//!
//! # Phases
//!
//! `end_turn` runs, in order:
//!
//! 1. Refresh: the incoming player's units get `moved`/`acted` cleared. The
//!    outgoing player's units stay exhausted until their own turn comes round.
//! 2. Structure fire: every auto-firing fortification strikes each enemy unit in
//!    range. Targets never return fire.
//! 3. Garrison fire: every unit inside a friendly cover structure strikes each
//!    adjacent enemy unit, without spending its own action. Targets never
//!    return fire.
//! 4. Healing: every support unit, of either side, restores hit points to
//!    damaged friendly units nearby.
//! 5. Income: the incoming player receives the stipend plus the structure bonus.
//! 6. The turn passes; the turn counter advances when play returns to player 0.
//!
//! All iteration is in ascending entity id order.

use tracing::{debug, info};

use super::combat::{StrikeOptions, Striker};
use crate::game::{Coord, EntityId, GameState, PlayerId, opponent};

/// What happened during a turn transition.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TurnReport {
    /// Player whose turn begins.
    pub player: PlayerId,
    /// Strikes fired by structures.
    pub structure_strikes: u32,
    /// Strikes fired by garrisoned units.
    pub garrison_strikes: u32,
    /// Total hit points restored.
    pub healed: u32,
    /// Money paid to the incoming player.
    pub income: u32,
    /// Entities destroyed by passive fire, in order of destruction.
    pub destroyed: Vec<EntityId>,
}

const PASSIVE: StrikeOptions = StrikeOptions {
    counter: false,
    consume_action: false,
};

impl GameState {
    /// Income `player` receives at the start of their turn.
    #[must_use]
    pub fn income_for(&self, player: PlayerId) -> u32 {
        let structures = self
            .fortifications_of(player)
            .filter(|f| f.fort_type.generates_income())
            .count();
        let structures = u32::try_from(structures).unwrap_or(u32::MAX);
        self.rules
            .turn_income
            .saturating_add(structures.saturating_mul(self.rules.structure_income))
    }

    /// End the current player's turn.
    ///
    /// Rejected only when the game is over.
    pub fn end_turn(&mut self) -> bool {
        self.end_turn_report().is_some()
    }

    /// End the current player's turn and report what the transition did.
    pub fn end_turn_report(&mut self) -> Option<TurnReport> {
        if self.game_over {
            debug!("end turn rejected: game over");
            return None;
        }
        let incoming = opponent(self.current_player);
        let mut report = TurnReport {
            player: incoming,
            ..TurnReport::default()
        };

        self.refresh_units(incoming);
        self.structure_fire(&mut report);
        self.garrison_fire(&mut report);
        report.healed = self.heal();
        report.income = self.income_for(incoming);
        if let Some(player) = self.players.get_mut(usize::from(incoming)) {
            player.earn(report.income);
        }

        self.current_player = incoming;
        if incoming == 0 {
            self.turn = self.turn.saturating_add(1);
        }
        self.selected = None;
        self.placement = None;
        self.build = None;
        self.commit();

        info!(
            turn = self.turn,
            player = incoming,
            income = report.income,
            structure_strikes = report.structure_strikes,
            garrison_strikes = report.garrison_strikes,
            healed = report.healed,
            "turn started"
        );
        Some(report)
    }

    fn refresh_units(&mut self, player: PlayerId) {
        for unit in self.units.values_mut().filter(|u| u.player == player) {
            unit.moved = false;
            unit.acted = false;
        }
    }

    fn structure_fire(&mut self, report: &mut TurnReport) {
        let shooters: Vec<EntityId> = self
            .fortifications
            .values()
            .filter(|f| f.auto_fires())
            .map(|f| f.id)
            .collect();

        for fort_id in shooters {
            let Some(fort) = self.fortifications.get(&fort_id) else {
                continue;
            };
            let targets: Vec<EntityId> = self
                .units
                .values()
                .filter(|u| u.player != fort.player && u.position.chebyshev(fort.position) <= fort.range)
                .map(|u| u.id)
                .collect();
            for target in targets {
                if let Some(outcome) = self.strike(Striker::Fortification(fort_id), target, PASSIVE) {
                    report.structure_strikes += 1;
                    if outcome.target_destroyed {
                        report.destroyed.push(target);
                    }
                }
            }
        }
    }

    fn garrison_fire(&mut self, report: &mut TurnReport) {
        let garrison: Vec<EntityId> = self
            .units
            .values()
            .filter(|u| self.is_in_cover(u))
            .map(|u| u.id)
            .collect();

        for unit_id in garrison {
            let Some(unit) = self.units.get(&unit_id) else {
                continue;
            };
            let targets: Vec<EntityId> = self
                .units
                .values()
                .filter(|u| u.player != unit.player && u.position.chebyshev(unit.position) == 1)
                .map(|u| u.id)
                .collect();
            for target in targets {
                if let Some(outcome) = self.strike(Striker::Unit(unit_id), target, PASSIVE) {
                    report.garrison_strikes += 1;
                    if outcome.target_destroyed {
                        report.destroyed.push(target);
                    }
                }
            }
        }
    }

    /// Apply healing from every support unit to its own side, in id order.
    /// Returns hit points restored.
    fn heal(&mut self) -> u32 {
        let radius = self.rules.heal_radius;
        let amount = self.rules.heal_amount;
        let healers: Vec<(EntityId, PlayerId, Coord)> = self
            .units
            .values()
            .filter(|u| u.unit_type.is_support())
            .map(|u| (u.id, u.player, u.position))
            .collect();

        let mut restored: u32 = 0;
        for (healer, player, at) in healers {
            for unit in self.units.values_mut() {
                if unit.id == healer
                    || unit.player != player
                    || !unit.is_damaged()
                    || unit.position.chebyshev(at) > radius
                {
                    continue;
                }
                let gained = amount.min(unit.max_hp - unit.hp);
                unit.hp += gained;
                restored = restored.saturating_add(gained);
            }
        }
        restored
    }
}

#[cfg(test)]
mod tests {
    use crate::game::{Coord, FortType, GameState, RulesConfig, UnitType};

    fn game() -> GameState {
        GameState::new(10, 10, RulesConfig::default()).unwrap()
    }

    #[test]
    fn test_turn_order_and_counter() {
        let mut game = game();
        assert!(game.end_turn());
        assert_eq!(game.current_player(), 1);
        assert_eq!(game.turn(), 1);
        assert!(game.end_turn());
        assert_eq!(game.current_player(), 0);
        assert_eq!(game.turn(), 2);
    }

    #[test]
    fn test_income_goes_to_incoming_player() {
        let mut game = game();
        game.place_fortification(1, FortType::SupplyDepot, Coord::new(8, 8));
        game.place_fortification(1, FortType::SupplyDepot, Coord::new(8, 9));
        assert_eq!(game.income_for(1), 100);
        let report = game.end_turn_report().unwrap();
        assert_eq!(report.income, 100);
        assert_eq!(game.money(1), 200);
        assert_eq!(game.money(0), 100);
    }

    #[test]
    fn test_reset_scope() {
        let mut game = game();
        let mine = game.place_unit(0, UnitType::Infantry, Coord::new(2, 2)).unwrap();
        let theirs = game.place_unit(1, UnitType::Infantry, Coord::new(7, 7)).unwrap();
        game.unit_mut(mine).unwrap().moved = true;
        game.unit_mut(theirs).unwrap().moved = true;
        game.unit_mut(theirs).unwrap().acted = true;

        assert!(game.end_turn());
        assert!(game.unit(mine).unwrap().moved, "outgoing player keeps state");
        let theirs = game.unit(theirs).unwrap();
        assert!(!theirs.moved && !theirs.acted);
    }

    #[test]
    fn test_pillbox_fire_is_not_countered() {
        let mut game = game();
        let pillbox = game
            .place_fortification(0, FortType::Pillbox, Coord::new(4, 4))
            .unwrap();
        let near = game.place_unit(1, UnitType::Infantry, Coord::new(6, 6)).unwrap();
        let far = game.place_unit(1, UnitType::Infantry, Coord::new(7, 7)).unwrap();
        let report = game.end_turn_report().unwrap();

        assert_eq!(report.structure_strikes, 1);
        assert_eq!(game.unit(near).unwrap().hp, 5);
        assert_eq!(game.unit(far).unwrap().hp, 10);
        let fort = game.fortification(pillbox).unwrap();
        assert_eq!(fort.hp, fort.max_hp);
    }

    #[test]
    fn test_garrison_strikes_without_spending_action() {
        let mut game = game();
        game.place_fortification(0, FortType::Bunker, Coord::new(4, 4));
        let guard = game.place_unit(0, UnitType::Infantry, Coord::new(4, 4)).unwrap();
        let enemy = game.place_unit(1, UnitType::Infantry, Coord::new(5, 5)).unwrap();
        let report = game.end_turn_report().unwrap();

        assert_eq!(report.garrison_strikes, 1);
        assert_eq!(game.unit(enemy).unwrap().hp, 6);
        let guard = game.unit(guard).unwrap();
        assert_eq!(guard.hp, guard.max_hp);
        assert!(!guard.acted);
    }

    #[test]
    fn test_healing() {
        let mut game = game();
        let medic = game.place_unit(1, UnitType::Medic, Coord::new(5, 5)).unwrap();
        let hurt = game.place_unit(1, UnitType::Infantry, Coord::new(6, 6)).unwrap();
        let barely = game.place_unit(1, UnitType::Infantry, Coord::new(4, 5)).unwrap();
        let distant = game.place_unit(1, UnitType::Infantry, Coord::new(8, 8)).unwrap();
        game.unit_mut(medic).unwrap().hp = 3;
        game.unit_mut(hurt).unwrap().hp = 5;
        game.unit_mut(barely).unwrap().hp = 9;
        game.unit_mut(distant).unwrap().hp = 5;

        let report = game.end_turn_report().unwrap();
        assert_eq!(report.healed, 3);
        assert_eq!(game.unit(medic).unwrap().hp, 3, "no self-heal");
        assert_eq!(game.unit(hurt).unwrap().hp, 7);
        assert_eq!(game.unit(barely).unwrap().hp, 10, "capped at max");
        assert_eq!(game.unit(distant).unwrap().hp, 5);
    }

    #[test]
    fn test_outgoing_medic_heals() {
        let mut game = game();
        game.place_unit(0, UnitType::Medic, Coord::new(3, 3)).unwrap();
        let hurt = game.place_unit(0, UnitType::Infantry, Coord::new(4, 3)).unwrap();
        let enemy = game.place_unit(1, UnitType::Infantry, Coord::new(3, 4)).unwrap();
        game.unit_mut(hurt).unwrap().hp = 4;
        game.unit_mut(enemy).unwrap().hp = 4;

        let report = game.end_turn_report().unwrap();
        assert_eq!(report.player, 1);
        assert_eq!(report.healed, 2);
        assert_eq!(game.unit(hurt).unwrap().hp, 6);
        assert_eq!(game.unit(enemy).unwrap().hp, 4, "enemies are not healed");
    }

    #[test]
    fn test_end_turn_clears_intents() {
        let mut game = game();
        let id = game.place_unit(0, UnitType::Infantry, Coord::new(1, 1)).unwrap();
        assert!(game.select(id));
        assert!(game.queue_spawn(crate::game::Purchase::Unit(UnitType::Infantry)));
        assert!(game.end_turn());
        assert!(game.selected().is_none());
        assert!(game.pending_spawn().is_none());
    }

    #[test]
    fn test_end_turn_rejected_when_over() {
        let mut game = game();
        game.declare_winner(0);
        let rev = game.revision();
        assert!(!game.end_turn());
        assert_eq!(game.revision(), rev);
    }
}
