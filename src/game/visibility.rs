//! Fog of war.

use std::collections::HashSet;

use serde::Serialize;

use crate::game::{Coord, Flag, Fortification, GameState, PlayerId, Unit};

/// What one player is allowed to see.
///
/// Enemy entities appear only when they stand on a visible tile; the viewer's
/// own entities always appear.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerView {
    /// Viewing player.
    pub viewer: PlayerId,
    /// Current turn.
    pub turn: u32,
    /// Player whose turn it is.
    pub current_player: PlayerId,
    /// Viewer's money.
    pub money: u32,
    /// Visible tiles, sorted.
    pub visible: Vec<Coord>,
    /// Units the viewer may see.
    pub units: Vec<Unit>,
    /// Fortifications the viewer may see.
    pub fortifications: Vec<Fortification>,
    /// Flags whose position is visible, with that position. The viewer's own
    /// flag is always listed unless an enemy carries it out of sight.
    pub flags: Vec<(Flag, Coord)>,
}

impl GameState {
    /// Compute the tiles `player` can see right now.
    #[must_use]
    pub fn visible_tiles(&self, player: PlayerId) -> HashSet<Coord> {
        let mut tiles = HashSet::new();
        if let Some(owner) = self.player(player) {
            tiles.insert(owner.base);
        }
        for unit in self.units_of(player) {
            tiles.extend(self.grid.diamond(unit.position, unit.sight));
        }
        tiles.extend(self.fortifications_of(player).map(|f| f.position));
        tiles
    }

    /// Whether `player` can see a tile right now.
    #[must_use]
    pub fn is_tile_visible_to(&self, player: PlayerId, tile: Coord) -> bool {
        self.player(player).is_some_and(|p| p.base == tile)
            || self
                .units_of(player)
                .any(|u| u.position.manhattan(tile) <= u32::from(u.sight))
            || self.fortifications_of(player).any(|f| f.position == tile)
    }

    /// Refresh the cached visible sets of both players.
    pub fn recompute_visibility(&mut self) {
        for player in 0..self.visibility.len() {
            let id = self.players[player].id;
            self.visibility[player] = self.visible_tiles(id);
        }
    }

    /// Tiles `player` could see as of the last state change.
    #[must_use]
    pub fn visibility(&self, player: PlayerId) -> Option<&HashSet<Coord>> {
        self.visibility.get(usize::from(player))
    }

    /// Everything `viewer` is allowed to see.
    #[must_use]
    pub fn view_for(&self, viewer: PlayerId) -> PlayerView {
        let visible = self.visible_tiles(viewer);
        let shown = |player: PlayerId, at: Coord| player == viewer || visible.contains(&at);

        let units = self
            .units
            .values()
            .filter(|u| shown(u.player, u.position))
            .cloned()
            .collect();
        let fortifications = self
            .fortifications
            .values()
            .filter(|f| shown(f.player, f.position))
            .cloned()
            .collect();
        let flags = self
            .players
            .iter()
            .filter_map(|p| {
                let at = self.flag_position(p.id)?;
                let hidden_carrier = p
                    .flag
                    .carrier()
                    .and_then(|id| self.units.get(&id))
                    .is_some_and(|u| u.player != viewer);
                let known = p.id == viewer && !hidden_carrier;
                (known || visible.contains(&at)).then_some((p.flag, at))
            })
            .collect();

        let mut tiles: Vec<Coord> = visible.iter().copied().collect();
        tiles.sort_unstable();

        PlayerView {
            viewer,
            turn: self.turn,
            current_player: self.current_player,
            money: self.money(viewer),
            visible: tiles,
            units,
            fortifications,
            flags,
        }
    }
}
