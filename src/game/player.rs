//! Player state: base, treasury and flag.

use serde::{Deserialize, Serialize};

use crate::game::{Coord, EntityId};

/// Player index, `0` or `1`.
pub type PlayerId = u8;

/// Number of seats in a game.
pub const PLAYER_COUNT: usize = 2;

/// The other player.
#[must_use]
pub const fn opponent(player: PlayerId) -> PlayerId {
    1 - (player & 1)
}

/// Where a flag currently is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "camelCase")]
pub enum FlagState {
    /// Resting on its owner's base.
    AtBase,
    /// Held by a unit; its position mirrors the carrier's.
    #[serde(rename_all = "camelCase")]
    Carried {
        /// Carrying unit.
        carried_by: EntityId,
    },
    /// Lying on the ground away from its base.
    Dropped {
        /// Tile the flag lies on.
        at: Coord,
    },
}

/// A player's flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Flag {
    /// Player the flag belongs to.
    pub owner: PlayerId,
    /// Current state.
    #[serde(flatten)]
    pub state: FlagState,
}

impl Flag {
    /// A flag resting at its owner's base.
    #[must_use]
    pub const fn at_base(owner: PlayerId) -> Self {
        Self {
            owner,
            state: FlagState::AtBase,
        }
    }

    /// The carrying unit, if any.
    #[must_use]
    pub const fn carrier(&self) -> Option<EntityId> {
        match self.state {
            FlagState::Carried { carried_by } => Some(carried_by),
            _ => None,
        }
    }

    /// Whether the flag is on the ground (at base or dropped).
    #[must_use]
    pub const fn is_loose(&self) -> bool {
        !matches!(self.state, FlagState::Carried { .. })
    }

    /// Drop the flag on a tile.
    pub fn drop_at(&mut self, at: Coord) {
        self.state = FlagState::Dropped { at };
    }

    /// Return the flag to its base.
    pub fn reset(&mut self) {
        self.state = FlagState::AtBase;
    }
}

/// State for a single player.
#[allow(missing_copy_implementations)] // Entity records are mutated in place, never copied
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Player {
    /// Seat index.
    pub id: PlayerId,
    /// Base tile: spawn anchor and capture destination.
    pub base: Coord,
    /// Available money.
    pub money: u32,
    /// The player's flag.
    pub flag: Flag,
    /// Number of enemy flags captured so far.
    pub captures: u32,
}

impl Player {
    /// Create a player with their flag at base.
    #[must_use]
    pub const fn new(id: PlayerId, base: Coord, money: u32) -> Self {
        Self {
            id,
            base,
            money,
            flag: Flag::at_base(id),
            captures: 0,
        }
    }

    /// Whether the player can pay `cost`.
    #[must_use]
    pub const fn can_afford(&self, cost: u32) -> bool {
        self.money >= cost
    }

    /// Deduct `cost`. Returns `false` and changes nothing if unaffordable.
    pub fn pay(&mut self, cost: u32) -> bool {
        if !self.can_afford(cost) {
            return false;
        }
        self.money -= cost;
        true
    }

    /// Add income.
    pub fn earn(&mut self, amount: u32) {
        self.money = self.money.saturating_add(amount);
    }
}
