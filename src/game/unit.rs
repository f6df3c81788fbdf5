//! Unit and fortification catalogue.

use serde::{Deserialize, Serialize};

use crate::game::{Coord, PlayerId};

/// Engine-assigned identifier shared by units and fortifications.
///
/// Ids increase monotonically and are never reused within a game.
pub type EntityId = u32;

/// Base statistics for a unit type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UnitStats {
    /// Maximum hit points.
    pub hp: u32,
    /// Attack value.
    pub atk: u32,
    /// Defense value, used for counter-damage.
    pub def: u32,
    /// Move allowance in steps.
    pub move_allowance: u16,
    /// Maximum attack range (Chebyshev).
    pub range: u16,
    /// Minimum attack range (Chebyshev); zero means none.
    pub min_range: u16,
    /// Sight radius (Manhattan).
    pub sight: u16,
    /// Purchase cost.
    pub cost: u32,
}

/// Kinds of unit that can be bought.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum UnitType {
    /// Generalist line infantry.
    Infantry,
    /// Armored assault unit.
    Tank,
    /// Long-range indirect fire; cannot hit adjacent tiles.
    Artillery,
    /// Anti-armor gun.
    AntiTankGun,
    /// Builds fortifications.
    Engineer,
    /// Grants a leadership aura.
    Officer,
    /// Heals nearby friendly units.
    Medic,
    /// Reconnaissance; spots targets for artillery.
    Scout,
    /// Armored, transported infantry.
    MechanizedInfantry,
}

impl UnitType {
    /// Every unit type, in shop order.
    pub const ALL: [UnitType; 9] = [
        UnitType::Infantry,
        UnitType::Tank,
        UnitType::Artillery,
        UnitType::AntiTankGun,
        UnitType::Engineer,
        UnitType::Officer,
        UnitType::Medic,
        UnitType::Scout,
        UnitType::MechanizedInfantry,
    ];

    /// Base statistics for this type.
    #[must_use]
    pub const fn stats(self) -> UnitStats {
        match self {
            UnitType::Infantry => UnitStats {
                hp: 10,
                atk: 4,
                def: 2,
                move_allowance: 3,
                range: 1,
                min_range: 0,
                sight: 3,
                cost: 50,
            },
            UnitType::Tank => UnitStats {
                hp: 18,
                atk: 7,
                def: 3,
                move_allowance: 2,
                range: 1,
                min_range: 0,
                sight: 3,
                cost: 100,
            },
            UnitType::Artillery => UnitStats {
                hp: 12,
                atk: 5,
                def: 1,
                move_allowance: 1,
                range: 3,
                min_range: 2,
                sight: 2,
                cost: 120,
            },
            UnitType::AntiTankGun => UnitStats {
                hp: 12,
                atk: 6,
                def: 2,
                move_allowance: 1,
                range: 2,
                min_range: 0,
                sight: 2,
                cost: 110,
            },
            UnitType::Engineer => UnitStats {
                hp: 10,
                atk: 3,
                def: 1,
                move_allowance: 3,
                range: 1,
                min_range: 0,
                sight: 3,
                cost: 60,
            },
            UnitType::Officer => UnitStats {
                hp: 10,
                atk: 4,
                def: 2,
                move_allowance: 2,
                range: 2,
                min_range: 0,
                sight: 3,
                cost: 80,
            },
            UnitType::Medic => UnitStats {
                hp: 8,
                atk: 1,
                def: 1,
                move_allowance: 3,
                range: 1,
                min_range: 0,
                sight: 3,
                cost: 70,
            },
            UnitType::Scout => UnitStats {
                hp: 8,
                atk: 2,
                def: 1,
                move_allowance: 4,
                range: 1,
                min_range: 0,
                sight: 5,
                cost: 60,
            },
            UnitType::MechanizedInfantry => UnitStats {
                hp: 14,
                atk: 5,
                def: 2,
                move_allowance: 3,
                range: 1,
                min_range: 0,
                sight: 3,
                cost: 120,
            },
        }
    }

    /// Armored units take reduced structure fire and are the anti-armor gun's prey.
    #[must_use]
    pub const fn is_armored(self) -> bool {
        matches!(self, UnitType::Tank | UnitType::MechanizedInfantry)
    }

    /// Indirect fire: has a minimum range, may use spotting, never draws counterfire.
    #[must_use]
    pub const fn is_indirect_fire(self) -> bool {
        matches!(self, UnitType::Artillery)
    }

    /// Gets the flat bonus against armored targets.
    #[must_use]
    pub const fn is_anti_armor(self) -> bool {
        matches!(self, UnitType::AntiTankGun)
    }

    /// Can spot targets for indirect fire.
    #[must_use]
    pub const fn is_recon(self) -> bool {
        matches!(self, UnitType::Scout)
    }

    /// Projects the leadership aura.
    #[must_use]
    pub const fn is_leader(self) -> bool {
        matches!(self, UnitType::Officer)
    }

    /// Heals nearby friendly units at turn start.
    #[must_use]
    pub const fn is_support(self) -> bool {
        matches!(self, UnitType::Medic)
    }

    /// Can build fortifications in the field.
    #[must_use]
    pub const fn can_build(self) -> bool {
        matches!(self, UnitType::Engineer)
    }
}

/// Base statistics for a fortification type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FortStats {
    /// Maximum hit points.
    pub hp: u32,
    /// Attack value for auto-fire; zero for passive structures.
    pub atk: u32,
    /// Auto-fire range (Chebyshev).
    pub range: u16,
    /// Purchase or build cost.
    pub cost: u32,
}

/// Kinds of fortification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum FortType {
    /// Fires on enemy units in range at every turn change.
    Pillbox,
    /// Cover: a friendly unit may stand inside it.
    Bunker,
    /// Cheap obstacle.
    BarbedWire,
    /// Generates extra income.
    SupplyDepot,
}

impl FortType {
    /// Every fortification type, in shop order.
    pub const ALL: [FortType; 4] = [
        FortType::Pillbox,
        FortType::Bunker,
        FortType::BarbedWire,
        FortType::SupplyDepot,
    ];

    /// Base statistics for this type.
    #[must_use]
    pub const fn stats(self) -> FortStats {
        match self {
            FortType::Pillbox => FortStats {
                hp: 20,
                atk: 4,
                range: 2,
                cost: 80,
            },
            FortType::Bunker => FortStats {
                hp: 30,
                atk: 0,
                range: 0,
                cost: 120,
            },
            FortType::BarbedWire => FortStats {
                hp: 8,
                atk: 0,
                range: 0,
                cost: 30,
            },
            FortType::SupplyDepot => FortStats {
                hp: 15,
                atk: 0,
                range: 0,
                cost: 100,
            },
        }
    }

    /// Friendly units may share the tile and receive cover.
    #[must_use]
    pub const fn is_cover(self) -> bool {
        matches!(self, FortType::Bunker)
    }

    /// Adds to its owner's per-turn income.
    #[must_use]
    pub const fn generates_income(self) -> bool {
        matches!(self, FortType::SupplyDepot)
    }
}

/// Something a player can buy from the shop and place near their base.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Purchase {
    /// A unit.
    Unit(UnitType),
    /// A fortification.
    Fortification(FortType),
}

impl Purchase {
    /// Shop price.
    #[must_use]
    pub const fn cost(self) -> u32 {
        match self {
            Purchase::Unit(t) => t.stats().cost,
            Purchase::Fortification(t) => t.stats().cost,
        }
    }
}

/// A unit on the battlefield.
#[allow(missing_copy_implementations)] // Entity records are mutated in place, never copied
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Unit {
    /// Unique id.
    pub id: EntityId,
    /// Owning player.
    pub player: PlayerId,
    /// Unit type.
    #[serde(rename = "type")]
    pub unit_type: UnitType,
    /// Current tile.
    pub position: Coord,
    /// Current hit points.
    pub hp: u32,
    /// Maximum hit points.
    pub max_hp: u32,
    /// Attack value.
    pub atk: u32,
    /// Defense value.
    pub def: u32,
    /// Move allowance in steps.
    #[serde(rename = "move")]
    pub move_allowance: u16,
    /// Maximum attack range.
    pub range: u16,
    /// Minimum attack range.
    pub min_range: u16,
    /// Sight radius.
    pub sight: u16,
    /// Has moved during its owner's current turn.
    pub moved: bool,
    /// Has attacked or built during its owner's current turn.
    pub acted: bool,
    /// Accumulated experience.
    pub xp: u32,
    /// Revision at which this unit was last struck. Cosmetic only.
    #[serde(default)]
    pub hit_at: Option<u64>,
}

impl Unit {
    /// Create a fresh unit with the base statistics of its type.
    #[must_use]
    pub fn new(id: EntityId, unit_type: UnitType, player: PlayerId, position: Coord) -> Self {
        let stats = unit_type.stats();
        Self {
            id,
            player,
            unit_type,
            position,
            hp: stats.hp,
            max_hp: stats.hp,
            atk: stats.atk,
            def: stats.def,
            move_allowance: stats.move_allowance,
            range: stats.range,
            min_range: stats.min_range,
            sight: stats.sight,
            moved: false,
            acted: false,
            xp: 0,
            hit_at: None,
        }
    }

    /// Whether the unit still has hit points.
    #[must_use]
    pub const fn is_alive(&self) -> bool {
        self.hp > 0
    }

    /// Whether the fixed statistics still match the catalogue entry for its type.
    #[must_use]
    pub const fn matches_catalogue(&self) -> bool {
        let stats = self.unit_type.stats();
        self.max_hp == stats.hp
            && self.atk == stats.atk
            && self.def == stats.def
            && self.move_allowance == stats.move_allowance
            && self.range == stats.range
            && self.min_range == stats.min_range
            && self.sight == stats.sight
    }

    /// Whether the unit is below full health.
    #[must_use]
    pub const fn is_damaged(&self) -> bool {
        self.hp < self.max_hp
    }
}

/// A fortification on the battlefield.
#[allow(missing_copy_implementations)] // Entity records are mutated in place, never copied
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Fortification {
    /// Unique id.
    pub id: EntityId,
    /// Owning player.
    pub player: PlayerId,
    /// Fortification type.
    #[serde(rename = "type")]
    pub fort_type: FortType,
    /// Tile it occupies.
    pub position: Coord,
    /// Current hit points.
    pub hp: u32,
    /// Maximum hit points.
    pub max_hp: u32,
    /// Auto-fire attack value.
    pub atk: u32,
    /// Auto-fire range.
    pub range: u16,
}

impl Fortification {
    /// Create a fresh fortification with the base statistics of its type.
    #[must_use]
    pub fn new(id: EntityId, fort_type: FortType, player: PlayerId, position: Coord) -> Self {
        let stats = fort_type.stats();
        Self {
            id,
            player,
            fort_type,
            position,
            hp: stats.hp,
            max_hp: stats.hp,
            atk: stats.atk,
            range: stats.range,
        }
    }

    /// Whether the fixed statistics still match the catalogue entry for its type.
    #[must_use]
    pub const fn matches_catalogue(&self) -> bool {
        let stats = self.fort_type.stats();
        self.max_hp == stats.hp && self.atk == stats.atk && self.range == stats.range
    }

    /// Whether this structure fires on its own at turn change.
    #[must_use]
    pub const fn auto_fires(&self) -> bool {
        self.atk > 0 && self.range > 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unit_from_stats() {
        let unit = Unit::new(7, UnitType::Tank, 1, Coord::new(3, 4));
        assert_eq!(unit.id, 7);
        assert_eq!(unit.hp, 18);
        assert_eq!(unit.max_hp, 18);
        assert_eq!(unit.atk, 7);
        assert!(!unit.moved);
        assert!(!unit.acted);
        assert!(!unit.is_damaged());
    }

    #[test]
    fn test_traits() {
        assert!(UnitType::Tank.is_armored());
        assert!(UnitType::MechanizedInfantry.is_armored());
        assert!(!UnitType::Infantry.is_armored());
        assert!(UnitType::Artillery.is_indirect_fire());
        assert_eq!(UnitType::Artillery.stats().min_range, 2);
        assert!(FortType::Bunker.is_cover());
        assert!(!FortType::Pillbox.is_cover());
        assert!(FortType::SupplyDepot.generates_income());
    }

    #[test]
    fn test_catalogue_match() {
        let mut unit = Unit::new(1, UnitType::Scout, 0, Coord::new(0, 0));
        assert!(unit.matches_catalogue());
        unit.hp = 3;
        unit.xp = 9;
        assert!(unit.matches_catalogue(), "hp and xp are not catalogue values");
        unit.sight = 4000;
        assert!(!unit.matches_catalogue());

        let mut fort = Fortification::new(2, FortType::Pillbox, 1, Coord::new(1, 1));
        assert!(fort.matches_catalogue());
        fort.atk = u32::MAX;
        assert!(!fort.matches_catalogue());
    }

    #[test]
    fn test_only_pillbox_auto_fires() {
        for fort_type in FortType::ALL {
            let fort = Fortification::new(1, fort_type, 0, Coord::new(0, 0));
            assert_eq!(fort.auto_fires(), fort_type == FortType::Pillbox);
        }
    }

    #[test]
    fn test_purchase_cost() {
        assert_eq!(Purchase::Unit(UnitType::Infantry).cost(), 50);
        assert_eq!(Purchase::Fortification(FortType::BarbedWire).cost(), 30);
    }

    #[test]
    fn test_unit_json_field_names() {
        let unit = Unit::new(1, UnitType::Scout, 0, Coord::new(1, 2));
        let json = serde_json::to_value(&unit).unwrap();
        assert_eq!(json["type"], "Scout");
        assert_eq!(json["move"], 4);
        assert_eq!(json["maxHp"], 8);
    }
}
