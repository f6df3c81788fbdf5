//! Combat resolution.
//!
//! Every strike, whether a player-ordered attack, structure auto-fire or a
//! garrison strike, goes through a single resolver:
//!
//! 1. Compute outgoing damage from the striker's attack, rank, aura and matchup
//!    modifiers, reduced by the target's cover.
//! 2. Apply damage and award the striking unit experience.
//! 3. Remove the target if destroyed, dropping any flags it carried.
//! 4. Otherwise, if a unit was struck by a unit and counterfire is allowed,
//!    return fire from the target's defense value.

use std::collections::BTreeSet;

use tracing::debug;

use crate::game::{Coord, Entity, EntityId, Fortification, GameState, PlayerId, Unit};

/// Who is firing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Striker {
    /// A unit.
    Unit(EntityId),
    /// A fortification.
    Fortification(EntityId),
}

/// How a strike is carried out.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct StrikeOptions {
    /// Whether the target may return fire.
    pub(crate) counter: bool,
    /// Whether the striking unit is marked as having acted.
    pub(crate) consume_action: bool,
}

/// Result of a single strike.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StrikeOutcome {
    /// Damage dealt to the target.
    pub damage: u32,
    /// The target was destroyed.
    pub target_destroyed: bool,
    /// Damage returned to the striker, if the target countered.
    pub counter_damage: Option<u32>,
    /// The striker was destroyed by counterfire.
    pub striker_destroyed: bool,
}

/// Apply flat cover reduction. A hit that does damage always does at least 1.
const fn after_cover(damage: u32, cover: u32) -> u32 {
    if damage == 0 {
        0
    } else if damage > cover {
        damage - cover
    } else {
        1
    }
}

impl GameState {
    /// Aura bonus for a unit from a different friendly leader nearby.
    #[must_use]
    pub fn aura_bonus(&self, unit: &Unit) -> u32 {
        let radius = self.rules.aura_radius;
        let boosted = self.units.values().any(|other| {
            other.id != unit.id
                && other.player == unit.player
                && other.unit_type.is_leader()
                && other.position.chebyshev(unit.position) <= radius
        });
        if boosted { self.rules.aura_bonus } else { 0 }
    }

    fn cover_for(&self, unit: &Unit) -> u32 {
        if self.is_in_cover(unit) {
            self.rules.cover_reduction
        } else {
            0
        }
    }

    /// Outgoing damage from a unit against an entity.
    #[must_use]
    pub fn unit_damage(&self, attacker: &Unit, target: Entity<'_>) -> u32 {
        let mut damage = attacker
            .atk
            .saturating_add(self.rules.rank_bonus_for_xp(attacker.xp))
            .saturating_add(self.aura_bonus(attacker));
        match target {
            Entity::Unit(defender) => {
                if attacker.unit_type.is_anti_armor() && defender.unit_type.is_armored() {
                    damage = damage.saturating_add(self.rules.anti_armor_attack_bonus);
                }
                after_cover(damage, self.cover_for(defender))
            }
            Entity::Fortification(_) => damage,
        }
    }

    /// Outgoing damage from a fortification against an entity.
    #[must_use]
    pub fn structure_damage(&self, fort: &Fortification, target: Entity<'_>) -> u32 {
        match target {
            Entity::Unit(defender) => {
                let damage = if defender.unit_type.is_armored() {
                    fort.atk.saturating_sub(self.rules.structure_armor_penalty)
                } else {
                    fort.atk.saturating_add(self.rules.structure_soft_bonus)
                };
                after_cover(damage, self.cover_for(defender))
            }
            Entity::Fortification(_) => fort.atk,
        }
    }

    /// Damage a surviving defender returns to a unit that struck it.
    #[must_use]
    pub fn counter_damage(&self, defender: &Unit, attacker: &Unit) -> u32 {
        let mut damage = defender
            .def
            .saturating_add(self.rules.rank_bonus_for_xp(defender.xp))
            .saturating_add(self.aura_bonus(defender));
        if defender.unit_type.is_anti_armor() && attacker.unit_type.is_armored() {
            damage = damage.saturating_add(self.rules.anti_armor_defense_bonus);
        }
        after_cover(damage, self.cover_for(attacker))
    }

    /// Tiles within the unit's direct range band.
    ///
    /// Indirect-fire units never include adjacent tiles.
    #[must_use]
    pub fn attackable_tiles(&self, unit: &Unit) -> BTreeSet<Coord> {
        let min = if unit.unit_type.is_indirect_fire() {
            unit.min_range.max(2)
        } else {
            unit.min_range.max(1)
        };
        self.grid
            .square(unit.position, unit.range)
            .filter(|c| c.chebyshev(unit.position) >= min)
            .collect()
    }

    /// Whether a recon unit of `player` is within spotting radius of a tile.
    #[must_use]
    pub fn is_spotted_by(&self, player: PlayerId, tile: Coord) -> bool {
        let radius = self.rules.spotting_radius;
        self.units
            .values()
            .any(|u| u.player == player && u.unit_type.is_recon() && u.position.manhattan(tile) <= radius)
    }

    /// Tiles beyond normal range an indirect-fire unit may hit thanks to spotting.
    ///
    /// Empty for direct-fire units.
    #[must_use]
    pub fn spotted_tiles(&self, unit: &Unit) -> BTreeSet<Coord> {
        if !unit.unit_type.is_indirect_fire() {
            return BTreeSet::new();
        }
        let ceiling = self.rules.spotted_range_ceiling;
        self.grid
            .square(unit.position, ceiling)
            .filter(|c| c.chebyshev(unit.position) > unit.range)
            .filter(|c| self.is_spotted_by(unit.player, *c))
            .collect()
    }

    /// Check whether an attack would be accepted, without performing it.
    #[must_use]
    pub fn can_attack(&self, attacker_id: EntityId, target_id: EntityId) -> bool {
        self.attack_rejection(attacker_id, target_id).is_none()
    }

    fn attack_rejection(&self, attacker_id: EntityId, target_id: EntityId) -> Option<&'static str> {
        if self.game_over {
            return Some("game over");
        }
        let Some(attacker) = self.units.get(&attacker_id) else {
            return Some("no such attacker");
        };
        if attacker.player != self.current_player {
            return Some("not the current player's unit");
        }
        if attacker.acted {
            return Some("already acted");
        }
        let Some(target) = self.entity(target_id) else {
            return Some("no such target");
        };
        if target.player() == attacker.player {
            return Some("friendly target");
        }

        let at = target.position();
        let distance = attacker.position.chebyshev(at);
        let indirect = attacker.unit_type.is_indirect_fire();
        if indirect && distance <= 1 {
            return Some("too close for indirect fire");
        }
        let in_band = self.attackable_tiles(attacker).contains(&at);
        let spotted = indirect
            && distance > attacker.range
            && distance <= self.rules.spotted_range_ceiling
            && self.is_spotted_by(attacker.player, at);
        if !in_band && !spotted {
            return Some("out of range");
        }
        if !spotted && !self.is_tile_visible_to(attacker.player, at) {
            return Some("target not visible");
        }
        None
    }

    /// Attack an enemy unit or fortification with a unit of the current player.
    ///
    /// Indirect-fire attackers never draw counterfire.
    pub fn attack(&mut self, attacker_id: EntityId, target_id: EntityId) -> bool {
        self.attack_outcome(attacker_id, target_id).is_some()
    }

    /// Like [`attack`](Self::attack), reporting what happened.
    pub fn attack_outcome(&mut self, attacker_id: EntityId, target_id: EntityId) -> Option<StrikeOutcome> {
        if let Some(reason) = self.attack_rejection(attacker_id, target_id) {
            debug!(attacker = attacker_id, target = target_id, reason, "attack rejected");
            return None;
        }
        let indirect = self
            .units
            .get(&attacker_id)
            .is_some_and(|u| u.unit_type.is_indirect_fire());
        let options = StrikeOptions {
            counter: !indirect,
            consume_action: true,
        };
        let outcome = self.strike(Striker::Unit(attacker_id), target_id, options)?;
        debug!(attacker = attacker_id, target = target_id, ?outcome, "attack resolved");
        if !outcome.striker_destroyed {
            self.resolve_flag_at_base(attacker_id);
        }
        self.commit();
        Some(outcome)
    }

    /// Resolve a single strike. Performs no legality checks and does not commit.
    pub(crate) fn strike(
        &mut self,
        striker: Striker,
        target_id: EntityId,
        options: StrikeOptions,
    ) -> Option<StrikeOutcome> {
        let target = self.entity(target_id)?;
        let damage = match striker {
            Striker::Unit(id) => self.unit_damage(self.units.get(&id)?, target),
            Striker::Fortification(id) => self.structure_damage(self.fortifications.get(&id)?, target),
        };

        let mut outcome = StrikeOutcome {
            damage,
            ..StrikeOutcome::default()
        };

        if let Striker::Unit(id) = striker {
            if let Some(unit) = self.units.get_mut(&id) {
                unit.xp = unit.xp.saturating_add(self.rules.xp_per_attack);
                if options.consume_action {
                    unit.acted = true;
                }
            }
        }

        let stamp = self.revision.saturating_add(1);
        let remaining = if let Some(unit) = self.units.get_mut(&target_id) {
            unit.hp = unit.hp.saturating_sub(damage);
            unit.hit_at = Some(stamp);
            unit.hp
        } else if let Some(fort) = self.fortifications.get_mut(&target_id) {
            fort.hp = fort.hp.saturating_sub(damage);
            fort.hp
        } else {
            return None;
        };

        if remaining == 0 {
            self.remove_entity(target_id);
            outcome.target_destroyed = true;
            return Some(outcome);
        }

        let Striker::Unit(attacker_id) = striker else {
            return Some(outcome);
        };
        if !options.counter {
            return Some(outcome);
        }
        let (Some(defender), Some(attacker)) =
            (self.units.get(&target_id), self.units.get(&attacker_id))
        else {
            return Some(outcome);
        };
        let counter = self.counter_damage(defender, attacker);
        if counter == 0 {
            return Some(outcome);
        }
        outcome.counter_damage = Some(counter);

        if let Some(defender) = self.units.get_mut(&target_id) {
            defender.xp = defender.xp.saturating_add(self.rules.xp_per_counter);
        }
        let attacker_hp = match self.units.get_mut(&attacker_id) {
            Some(attacker) => {
                attacker.hp = attacker.hp.saturating_sub(counter);
                attacker.hit_at = Some(stamp);
                attacker.hp
            }
            None => return Some(outcome),
        };
        if attacker_hp == 0 {
            self.remove_entity(attacker_id);
            outcome.striker_destroyed = true;
        }
        Some(outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::{FortType, RulesConfig, UnitType};

    fn game() -> GameState {
        GameState::new(12, 12, RulesConfig::default()).unwrap()
    }

    #[test]
    fn test_after_cover_floor() {
        assert_eq!(after_cover(5, 2), 3);
        assert_eq!(after_cover(2, 2), 1);
        assert_eq!(after_cover(1, 5), 1);
        assert_eq!(after_cover(0, 2), 0);
    }

    #[test]
    fn test_basic_attack_and_counter() {
        let mut game = game();
        let a = game.place_unit(0, UnitType::Infantry, Coord::new(4, 4)).unwrap();
        let d = game.place_unit(1, UnitType::Infantry, Coord::new(5, 4)).unwrap();
        assert!(game.attack(a, d));

        let defender = game.unit(d).unwrap();
        assert_eq!(defender.hp, 6);
        assert_eq!(defender.xp, 1);
        let attacker = game.unit(a).unwrap();
        assert_eq!(attacker.hp, 8);
        assert_eq!(attacker.xp, 1);
        assert!(attacker.acted);
        assert!(!game.attack(a, d), "already acted");
    }

    #[test]
    fn test_extreme_stats_saturate() {
        let mut game = game();
        let a = game.place_unit(0, UnitType::AntiTankGun, Coord::new(4, 4)).unwrap();
        let d = game.place_unit(1, UnitType::Tank, Coord::new(5, 4)).unwrap();
        game.place_unit(0, UnitType::Officer, Coord::new(3, 4)).unwrap();
        let attacker = game.unit_mut(a).unwrap();
        attacker.atk = u32::MAX;
        attacker.xp = 3;
        let defender = game.unit(d).unwrap().clone();
        assert_eq!(game.unit_damage(game.unit(a).unwrap(), Entity::Unit(&defender)), u32::MAX);

        let tank = game.unit_mut(d).unwrap();
        tank.def = u32::MAX;
        let attacker = game.unit(a).unwrap().clone();
        let tank = game.unit(d).unwrap().clone();
        assert_eq!(game.counter_damage(&tank, &attacker), u32::MAX);
        assert!(game.attack(a, d));
        assert!(game.unit(d).is_none());
    }

    #[test]
    fn test_friendly_fire_rejected() {
        let mut game = game();
        let a = game.place_unit(0, UnitType::Infantry, Coord::new(4, 4)).unwrap();
        let b = game.place_unit(0, UnitType::Infantry, Coord::new(5, 4)).unwrap();
        assert!(!game.attack(a, b));
    }

    #[test]
    fn test_aura_requires_other_officer() {
        let mut game = game();
        let officer = game.place_unit(0, UnitType::Officer, Coord::new(4, 4)).unwrap();
        let inf = game.place_unit(0, UnitType::Infantry, Coord::new(6, 6)).unwrap();
        let far = game.place_unit(0, UnitType::Infantry, Coord::new(9, 9)).unwrap();
        assert_eq!(game.aura_bonus(game.unit(officer).unwrap()), 0);
        assert_eq!(game.aura_bonus(game.unit(inf).unwrap()), 1);
        assert_eq!(game.aura_bonus(game.unit(far).unwrap()), 0);
    }

    #[test]
    fn test_artillery_min_range() {
        let mut game = game();
        let art = game.place_unit(0, UnitType::Artillery, Coord::new(5, 5)).unwrap();
        let close = game.place_unit(1, UnitType::Infantry, Coord::new(6, 6)).unwrap();
        let unit = game.unit(art).unwrap().clone();
        let tiles = game.attackable_tiles(&unit);
        assert!(tiles.iter().all(|c| c.chebyshev(unit.position) >= 2));
        assert!(!game.attack(art, close));
    }

    #[test]
    fn test_artillery_never_countered() {
        let mut game = game();
        let art = game.place_unit(0, UnitType::Artillery, Coord::new(3, 3)).unwrap();
        let target = game.place_unit(1, UnitType::Tank, Coord::new(5, 3)).unwrap();
        assert!(game.attack(art, target));
        assert_eq!(game.unit(art).unwrap().hp, 12);
        assert_eq!(game.unit(target).unwrap().hp, 13);
    }

    #[test]
    fn test_spotted_fire_beyond_range() {
        let mut game = game();
        let art = game.place_unit(0, UnitType::Artillery, Coord::new(1, 1)).unwrap();
        let target = game.place_unit(1, UnitType::Infantry, Coord::new(8, 1)).unwrap();
        assert!(!game.attack(art, target), "unspotted");
        game.place_unit(0, UnitType::Scout, Coord::new(6, 3)).unwrap();
        let unit = game.unit(art).unwrap().clone();
        assert!(game.spotted_tiles(&unit).contains(&Coord::new(8, 1)));
        assert!(game.attack(art, target));
        assert_eq!(game.unit(target).unwrap().hp, 5);
    }

    #[test]
    fn test_spotting_ceiling() {
        let mut game = GameState::new(20, 3, RulesConfig::default()).unwrap();
        let art = game.place_unit(0, UnitType::Artillery, Coord::new(1, 1)).unwrap();
        let target = game.place_unit(1, UnitType::Infantry, Coord::new(12, 1)).unwrap();
        game.place_unit(0, UnitType::Scout, Coord::new(11, 1)).unwrap();
        assert!(!game.attack(art, target), "distance 11 exceeds ceiling");
    }

    #[test]
    fn test_anti_armor_bonuses() {
        let mut game = game();
        let gun = game.place_unit(0, UnitType::AntiTankGun, Coord::new(4, 4)).unwrap();
        let tank = game.place_unit(1, UnitType::Tank, Coord::new(5, 5)).unwrap();
        let (g, t) = (game.unit(gun).unwrap(), game.unit(tank).unwrap());
        assert_eq!(game.unit_damage(g, Entity::Unit(t)), 9);
        assert_eq!(game.counter_damage(g, t), 4);
    }

    #[test]
    fn test_cover_reduces_damage() {
        let mut game = game();
        let a = game.place_unit(0, UnitType::Infantry, Coord::new(4, 4)).unwrap();
        game.place_fortification(1, FortType::Bunker, Coord::new(5, 4));
        let d = game.place_unit(1, UnitType::Infantry, Coord::new(5, 4)).unwrap();
        assert!(game.attack(a, d));
        assert_eq!(game.unit(d).unwrap().hp, 8);
    }

    #[test]
    fn test_destroying_a_fortification() {
        let mut game = game();
        let tank = game.place_unit(0, UnitType::Tank, Coord::new(4, 4)).unwrap();
        let wire = game
            .place_fortification(1, FortType::BarbedWire, Coord::new(5, 4))
            .unwrap();
        // Corporal rank: 7 + 1 matches the wire's 8 hp.
        game.unit_mut(tank).unwrap().xp = 3;
        assert!(game.attack(tank, wire));
        assert!(game.fortification(wire).is_none());
        assert_eq!(game.unit(tank).unwrap().hp, 18, "structures never counter");
    }

    #[test]
    fn test_structure_matchups() {
        let mut game = game();
        let pillbox = game
            .place_fortification(0, FortType::Pillbox, Coord::new(4, 4))
            .unwrap();
        let tank = game.place_unit(1, UnitType::Tank, Coord::new(5, 5)).unwrap();
        let inf = game.place_unit(1, UnitType::Infantry, Coord::new(6, 4)).unwrap();
        let fort = game.fortification(pillbox).unwrap();
        assert_eq!(game.structure_damage(fort, Entity::Unit(game.unit(tank).unwrap())), 2);
        assert_eq!(game.structure_damage(fort, Entity::Unit(game.unit(inf).unwrap())), 5);
    }

    #[test]
    fn test_counter_can_kill_attacker() {
        let mut game = game();
        let a = game.place_unit(0, UnitType::Medic, Coord::new(4, 4)).unwrap();
        let d = game.place_unit(1, UnitType::Tank, Coord::new(5, 4)).unwrap();
        game.unit_mut(a).unwrap().hp = 2;
        assert!(game.attack(a, d));
        assert!(game.unit(a).is_none());
        assert_eq!(game.unit(d).unwrap().hp, 17);
    }
}
