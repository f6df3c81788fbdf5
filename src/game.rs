//! Rules engine for Frontline.
//!
//! Implements the game rules on a rectangular grid:
//! - Grid geometry and distances
//! - Unit and fortification catalogue
//! - Movement reachability with corner-cut prevention
//! - Combat resolution with rank, aura, cover and matchup modifiers
//! - Flag pickup, capture and drop
//! - Turn transition: structure fire, garrisons, healing, income
//! - Shop purchases and engineer builds
//! - Per-player fog of war

mod combat;
mod config;
mod economy;
pub mod invariants;
mod map;
mod movement;
mod objective;
mod player;
mod shop;
mod state;
mod unit;
mod visibility;

pub use combat::StrikeOutcome;
pub use config::{RulesConfig, rank_label};
pub use economy::TurnReport;
pub use map::{Coord, Grid};
pub use movement::reachable_tiles;
pub use player::{Flag, FlagState, PLAYER_COUNT, Player, PlayerId, opponent};
pub use shop::BuildIntent;
pub use state::{Entity, GameState};
pub use unit::{
    EntityId, FortStats, FortType, Fortification, Purchase, Unit, UnitStats, UnitType,
};
pub use visibility::PlayerView;
