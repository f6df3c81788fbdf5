//! Movement: reachable tiles and unit relocation.
//!
//! Reachability is a breadth-first search over the 8-neighbourhood bounded by
//! the unit's move allowance. A diagonal step is only allowed when both
//! orthogonal tiles it cuts between are passable for the mover.

use std::collections::{BTreeSet, HashSet};

use tracing::debug;

use crate::game::{Coord, EntityId, GameState, Grid, Unit};

/// Tiles reachable from `origin` in at most `allowance` steps.
///
/// `passable` decides whether a tile can be entered or passed through. The
/// origin is never part of the result.
pub fn reachable_tiles(
    grid: &Grid,
    origin: Coord,
    allowance: u16,
    passable: impl Fn(Coord) -> bool,
) -> BTreeSet<Coord> {
    let mut visited = HashSet::from([origin]);
    let mut reached = BTreeSet::new();
    let mut frontier = vec![origin];

    for _ in 0..allowance {
        let mut next = Vec::new();
        for &from in &frontier {
            let (adj, count) = grid.neighbors(from);
            for &to in &adj[..count as usize] {
                if visited.contains(&to) {
                    continue;
                }
                if to.x != from.x && to.y != from.y {
                    let side_a = Coord::new(to.x, from.y);
                    let side_b = Coord::new(from.x, to.y);
                    // Corner cutting only blocks this path, not the tile.
                    if !passable(side_a) || !passable(side_b) {
                        continue;
                    }
                }
                visited.insert(to);
                if passable(to) {
                    reached.insert(to);
                    next.push(to);
                }
            }
        }
        if next.is_empty() {
            break;
        }
        frontier = next;
    }

    reached
}

impl GameState {
    /// Tiles the unit could move to right now, ignoring whose turn it is.
    ///
    /// Empty if the unit does not exist or has already moved.
    #[must_use]
    pub fn move_range(&self, unit_id: EntityId) -> BTreeSet<Coord> {
        match self.units.get(&unit_id) {
            Some(unit) if !unit.moved => self.reachable_for(unit),
            _ => BTreeSet::new(),
        }
    }

    /// Reachable tiles for a unit at its current position.
    ///
    /// The unit's own tile counts as passable when checking corner cuts, since
    /// it vacates the tile as it moves.
    #[must_use]
    pub fn reachable_for(&self, unit: &Unit) -> BTreeSet<Coord> {
        let origin = unit.position;
        reachable_tiles(&self.grid, origin, unit.move_allowance, |c| {
            c == origin || self.is_passable_for(unit, c)
        })
    }

    /// Move a unit of the current player.
    ///
    /// Rejected if the game is over, the unit is not the current player's, has
    /// already moved, or `to` is not in its reachable set. On success the unit
    /// picks up any flag on the destination and may complete a capture.
    pub fn move_unit(&mut self, unit_id: EntityId, to: Coord) -> bool {
        if self.game_over {
            debug!(unit = unit_id, "move rejected: game over");
            return false;
        }
        let Some(unit) = self.units.get(&unit_id) else {
            debug!(unit = unit_id, "move rejected: no such unit");
            return false;
        };
        if unit.player != self.current_player {
            debug!(unit = unit_id, "move rejected: not the current player's unit");
            return false;
        }
        if unit.moved {
            debug!(unit = unit_id, "move rejected: already moved");
            return false;
        }
        if !self.reachable_for(unit).contains(&to) {
            debug!(unit = unit_id, to = %to, "move rejected: unreachable");
            return false;
        }

        if let Some(unit) = self.units.get_mut(&unit_id) {
            debug!(unit = unit_id, from = %unit.position, to = %to, "unit moved");
            unit.position = to;
            unit.moved = true;
        }
        self.pick_up_flags(unit_id);
        self.resolve_flag_at_base(unit_id);
        self.commit();
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::{FortType, RulesConfig, UnitType};

    fn open_grid(size: u16) -> Grid {
        Grid::new(size, size).unwrap()
    }

    #[test]
    fn test_open_field_is_a_square() {
        let grid = open_grid(10);
        let tiles = reachable_tiles(&grid, Coord::new(5, 5), 2, |_| true);
        assert_eq!(tiles.len(), 24);
        assert!(!tiles.contains(&Coord::new(5, 5)));
        assert!(tiles.contains(&Coord::new(7, 7)));
    }

    #[test]
    fn test_zero_allowance() {
        let grid = open_grid(5);
        assert!(reachable_tiles(&grid, Coord::new(2, 2), 0, |_| true).is_empty());
    }

    #[test]
    fn test_corner_cut_blocked() {
        let grid = open_grid(5);
        let wall = [Coord::new(1, 0), Coord::new(0, 1)];
        let tiles = reachable_tiles(&grid, Coord::new(0, 0), 1, |c| !wall.contains(&c));
        assert!(tiles.is_empty());
        // With two steps it is still boxed in.
        let tiles = reachable_tiles(&grid, Coord::new(0, 0), 2, |c| !wall.contains(&c));
        assert!(tiles.is_empty());
    }

    #[test]
    fn test_corner_cut_with_one_side_open() {
        let grid = open_grid(5);
        let wall = [Coord::new(1, 0)];
        let tiles = reachable_tiles(&grid, Coord::new(0, 0), 1, |c| !wall.contains(&c));
        assert_eq!(tiles, BTreeSet::from([Coord::new(0, 1)]));
        // The diagonal becomes reachable in two orthogonal steps.
        let tiles = reachable_tiles(&grid, Coord::new(0, 0), 2, |c| !wall.contains(&c));
        assert!(tiles.contains(&Coord::new(1, 1)));
    }

    #[test]
    fn test_infantry_range_on_empty_board() {
        let mut game = GameState::new(10, 10, RulesConfig::default()).unwrap();
        let id = game.place_unit(0, UnitType::Infantry, Coord::new(1, 1)).unwrap();
        let range = game.move_range(id);
        assert_eq!(range.len(), 24);
        assert!(range.iter().all(|c| c.x <= 4 && c.y <= 4));
        assert!(range.contains(&Coord::new(4, 4)));
        assert!(!range.contains(&Coord::new(1, 1)));
    }

    #[test]
    fn test_move_unit_rules() {
        let mut game = GameState::new(10, 10, RulesConfig::default()).unwrap();
        let own = game.place_unit(0, UnitType::Infantry, Coord::new(2, 2)).unwrap();
        let enemy = game.place_unit(1, UnitType::Infantry, Coord::new(6, 6)).unwrap();
        let rev = game.revision();

        assert!(!game.move_unit(enemy, Coord::new(6, 5)), "not their turn");
        assert!(!game.move_unit(own, Coord::new(8, 8)), "too far");
        assert_eq!(game.revision(), rev);

        assert!(game.move_unit(own, Coord::new(4, 4)));
        assert_eq!(game.unit(own).unwrap().position, Coord::new(4, 4));
        assert!(game.unit(own).unwrap().moved);
        assert_eq!(game.revision(), rev + 1);
        assert!(!game.move_unit(own, Coord::new(4, 5)), "already moved");
    }

    #[test]
    fn test_enemy_structure_blocks_friendly_bunker_passes() {
        let mut game = GameState::new(6, 6, RulesConfig::default()).unwrap();
        let id = game.place_unit(0, UnitType::Infantry, Coord::new(2, 2)).unwrap();
        game.place_fortification(1, FortType::BarbedWire, Coord::new(3, 2));
        game.place_fortification(0, FortType::Bunker, Coord::new(2, 3));
        let range = game.move_range(id);
        assert!(!range.contains(&Coord::new(3, 2)));
        assert!(range.contains(&Coord::new(2, 3)));
    }
}
