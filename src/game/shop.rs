//! Shop purchases and engineer builds.
//!
//! Both are two-step intents: queue what to buy, then name the tile. A failed
//! placement leaves the intent queued so the caller can try another tile.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::game::{Coord, EntityId, FortType, GameState, PlayerId, Purchase};

/// A pending engineer build.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BuildIntent {
    /// Engineer that will build.
    pub engineer: EntityId,
    /// Structure to build.
    pub fort_type: FortType,
}

impl GameState {
    /// Queue a purchase for the current player. Requires enough money.
    pub fn queue_spawn(&mut self, purchase: Purchase) -> bool {
        if self.game_over {
            return false;
        }
        if self.money(self.current_player) < purchase.cost() {
            debug!(?purchase, player = self.current_player, "spawn not queued: cannot afford");
            return false;
        }
        self.placement = Some(purchase);
        true
    }

    /// The queued purchase, if any.
    #[must_use]
    pub const fn pending_spawn(&self) -> Option<Purchase> {
        self.placement
    }

    /// Drop the queued purchase.
    pub fn cancel_spawn(&mut self) {
        self.placement = None;
    }

    /// Whether `player` could place `purchase` on `at`, money aside.
    #[must_use]
    pub fn can_place(&self, player: PlayerId, purchase: Purchase, at: Coord) -> bool {
        let Some(base) = self.player(player).map(|p| p.base) else {
            return false;
        };
        if !self.is_inside(at) || base.chebyshev(at) > self.rules.spawn_radius {
            return false;
        }
        match purchase {
            Purchase::Unit(_) => self.unit_at(at).is_none() && self.is_landing_for(player, at),
            Purchase::Fortification(_) => !self.tile_occupied(at),
        }
    }

    /// Tiles where the queued purchase could be placed, in row-major order.
    ///
    /// Empty when nothing is queued.
    #[must_use]
    pub fn valid_spawn_tiles(&self) -> Vec<Coord> {
        let Some(purchase) = self.placement else {
            return Vec::new();
        };
        let player = self.current_player;
        let Some(base) = self.player(player).map(|p| p.base) else {
            return Vec::new();
        };
        self.grid
            .square(base, self.rules.spawn_radius)
            .filter(|c| self.can_place(player, purchase, *c))
            .collect()
    }

    /// Place the queued purchase on a tile near the current player's base.
    pub fn try_spawn_at(&mut self, at: Coord) -> bool {
        let Some(purchase) = self.placement else {
            debug!(at = %at, "spawn rejected: nothing queued");
            return false;
        };
        if self.purchase_for(self.current_player, purchase, at).is_none() {
            return false;
        }
        self.placement = None;
        self.commit();
        true
    }

    /// Pay for and create a purchase. Does not touch the intent queue or commit.
    pub(crate) fn purchase_for(
        &mut self,
        player: PlayerId,
        purchase: Purchase,
        at: Coord,
    ) -> Option<EntityId> {
        if self.game_over {
            return None;
        }
        if !self.can_place(player, purchase, at) {
            debug!(?purchase, player, at = %at, "spawn rejected: illegal tile");
            return None;
        }
        let paid = self
            .players
            .get_mut(usize::from(player))
            .is_some_and(|p| p.pay(purchase.cost()));
        if !paid {
            debug!(?purchase, player, "spawn rejected: cannot afford");
            return None;
        }
        let id = match purchase {
            Purchase::Unit(unit_type) => self.insert_unit(player, unit_type, at),
            Purchase::Fortification(fort_type) => self.insert_fortification(player, fort_type, at),
        };
        debug!(?purchase, player, id, at = %at, "spawned");
        Some(id)
    }

    /// Queue a build for the selected unit.
    ///
    /// The selected unit must be a builder of the current player that has not
    /// acted, and the structure must be affordable.
    pub fn queue_fort_build(&mut self, fort_type: FortType) -> bool {
        let Some(engineer) = self.selected else {
            debug!("build not queued: nothing selected");
            return false;
        };
        if !self.can_order_build(self.current_player, engineer, fort_type) {
            return false;
        }
        self.build = Some(BuildIntent { engineer, fort_type });
        true
    }

    /// The queued build, if any.
    #[must_use]
    pub const fn pending_build(&self) -> Option<BuildIntent> {
        self.build
    }

    /// Drop the queued build.
    pub fn cancel_build(&mut self) {
        self.build = None;
    }

    fn can_order_build(&self, player: PlayerId, engineer: EntityId, fort_type: FortType) -> bool {
        if self.game_over {
            return false;
        }
        let Some(unit) = self.units.get(&engineer) else {
            return false;
        };
        if unit.player != player || !unit.unit_type.can_build() {
            debug!(unit = engineer, "build rejected: not a builder of this player");
            return false;
        }
        if unit.acted {
            debug!(unit = engineer, "build rejected: already acted");
            return false;
        }
        if self.money(player) < fort_type.stats().cost {
            debug!(unit = engineer, ?fort_type, "build rejected: cannot afford");
            return false;
        }
        true
    }

    /// Build the queued structure next to its engineer.
    pub fn try_build_at(&mut self, at: Coord) -> bool {
        let Some(intent) = self.build else {
            debug!(at = %at, "build rejected: nothing queued");
            return false;
        };
        if self
            .build_for(self.current_player, intent.engineer, intent.fort_type, at)
            .is_none()
        {
            return false;
        }
        self.build = None;
        self.commit();
        true
    }

    /// Pay for and create a structure next to an engineer, marking it acted.
    /// Does not touch the intent queue or commit.
    pub(crate) fn build_for(
        &mut self,
        player: PlayerId,
        engineer: EntityId,
        fort_type: FortType,
        at: Coord,
    ) -> Option<EntityId> {
        if !self.can_order_build(player, engineer, fort_type) {
            return None;
        }
        let origin = self.units.get(&engineer)?.position;
        if !self.is_inside(at) || origin.chebyshev(at) > self.rules.build_radius || self.tile_occupied(at) {
            debug!(unit = engineer, at = %at, "build rejected: illegal tile");
            return None;
        }
        if !self
            .players
            .get_mut(usize::from(player))
            .is_some_and(|p| p.pay(fort_type.stats().cost))
        {
            return None;
        }
        let id = self.insert_fortification(player, fort_type, at);
        if let Some(unit) = self.units.get_mut(&engineer) {
            unit.acted = true;
        }
        debug!(unit = engineer, ?fort_type, id, at = %at, "built");
        Some(id)
    }
}
