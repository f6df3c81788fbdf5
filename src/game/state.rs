//! Game state management.
//!
//! [`GameState`] is the aggregate root: it owns the grid, both players, every
//! unit and fortification, the transient selection and placement intents, the
//! revision counter and the cached visibility sets. Rule operations live in the
//! sibling modules as further `impl GameState` blocks.

use std::collections::{BTreeMap, HashSet};

use tracing::debug;

use crate::game::{
    BuildIntent, Coord, EntityId, FortType, Fortification, Grid, PLAYER_COUNT, Player, PlayerId,
    Purchase, RulesConfig, Unit, UnitType,
};

/// Borrowed view of either kind of entity.
#[derive(Debug, Clone, Copy)]
pub enum Entity<'a> {
    /// A unit.
    Unit(&'a Unit),
    /// A fortification.
    Fortification(&'a Fortification),
}

impl Entity<'_> {
    /// Entity id.
    #[must_use]
    pub const fn id(&self) -> EntityId {
        match self {
            Entity::Unit(u) => u.id,
            Entity::Fortification(f) => f.id,
        }
    }

    /// Owning player.
    #[must_use]
    pub const fn player(&self) -> PlayerId {
        match self {
            Entity::Unit(u) => u.player,
            Entity::Fortification(f) => f.player,
        }
    }

    /// Tile the entity occupies.
    #[must_use]
    pub const fn position(&self) -> Coord {
        match self {
            Entity::Unit(u) => u.position,
            Entity::Fortification(f) => f.position,
        }
    }

    /// Current hit points.
    #[must_use]
    pub const fn hp(&self) -> u32 {
        match self {
            Entity::Unit(u) => u.hp,
            Entity::Fortification(f) => f.hp,
        }
    }
}

/// Complete game state.
#[derive(Debug, Clone)]
pub struct GameState {
    /// Battlefield dimensions.
    pub(crate) grid: Grid,
    /// Balance constants.
    pub(crate) rules: RulesConfig,
    /// Turn number, starting at 1; advances when play returns to player 0.
    pub(crate) turn: u32,
    /// Player whose turn it is.
    pub(crate) current_player: PlayerId,
    /// Both players, indexed by id.
    pub(crate) players: [Player; PLAYER_COUNT],
    /// Units by id.
    pub(crate) units: BTreeMap<EntityId, Unit>,
    /// Fortifications by id.
    pub(crate) fortifications: BTreeMap<EntityId, Fortification>,
    /// Next id to hand out.
    pub(crate) next_id: EntityId,
    /// Incremented on every externally visible change.
    pub(crate) revision: u64,
    /// Selected unit of the current player.
    pub(crate) selected: Option<EntityId>,
    /// Pending shop purchase awaiting a target tile.
    pub(crate) placement: Option<Purchase>,
    /// Pending engineer build awaiting a target tile.
    pub(crate) build: Option<BuildIntent>,
    /// Visible tiles per player, as of the last recompute.
    pub(crate) visibility: [HashSet<Coord>; PLAYER_COUNT],
    /// Set once a winner has been declared.
    pub(crate) game_over: bool,
    /// Declared winner.
    pub(crate) winner: Option<PlayerId>,
}

impl GameState {
    /// Create a new game on a `width` x `height` grid.
    ///
    /// Player 0's base is the top-left corner and player 1's the bottom-right;
    /// both flags start at their bases.
    ///
    /// Returns `None` if a dimension is zero or the grid is a single tile.
    #[must_use]
    pub fn new(width: u16, height: u16, rules: RulesConfig) -> Option<Self> {
        let grid = Grid::new(width, height)?;
        let bases = [Coord::new(0, 0), Coord::new(width - 1, height - 1)];
        if bases[0] == bases[1] {
            return None;
        }

        let money = rules.starting_money;
        let mut state = Self {
            grid,
            rules,
            turn: 1,
            current_player: 0,
            players: [Player::new(0, bases[0], money), Player::new(1, bases[1], money)],
            units: BTreeMap::new(),
            fortifications: BTreeMap::new(),
            next_id: 1,
            revision: 0,
            selected: None,
            placement: None,
            build: None,
            visibility: [HashSet::new(), HashSet::new()],
            game_over: false,
            winner: None,
        };
        state.recompute_visibility();
        Some(state)
    }

    /// Battlefield dimensions.
    #[must_use]
    pub const fn grid(&self) -> Grid {
        self.grid
    }

    /// Balance constants in force.
    #[must_use]
    pub const fn rules(&self) -> &RulesConfig {
        &self.rules
    }

    /// Current turn number.
    #[must_use]
    pub const fn turn(&self) -> u32 {
        self.turn
    }

    /// Player whose turn it is.
    #[must_use]
    pub const fn current_player(&self) -> PlayerId {
        self.current_player
    }

    /// Whether it is `player`'s turn. The only admission check for mutations.
    #[must_use]
    pub const fn is_turn_of(&self, player: PlayerId) -> bool {
        self.current_player == player
    }

    /// Current revision.
    #[must_use]
    pub const fn revision(&self) -> u64 {
        self.revision
    }

    /// Whether a winner has been declared.
    #[must_use]
    pub const fn is_game_over(&self) -> bool {
        self.game_over
    }

    /// Declared winner, if any.
    #[must_use]
    pub const fn winner(&self) -> Option<PlayerId> {
        self.winner
    }

    /// Get a player by id.
    #[must_use]
    pub fn player(&self, id: PlayerId) -> Option<&Player> {
        self.players.get(usize::from(id))
    }

    /// Both players.
    #[must_use]
    pub const fn players(&self) -> &[Player; PLAYER_COUNT] {
        &self.players
    }

    /// Money held by `player` (zero for unknown players).
    #[must_use]
    pub fn money(&self, player: PlayerId) -> u32 {
        self.player(player).map_or(0, |p| p.money)
    }

    /// Get a unit by id.
    #[must_use]
    pub fn unit(&self, id: EntityId) -> Option<&Unit> {
        self.units.get(&id)
    }

    /// Mutable access to a unit, for scenario setup. Bypasses every rule.
    #[must_use]
    pub fn unit_mut(&mut self, id: EntityId) -> Option<&mut Unit> {
        self.units.get_mut(&id)
    }

    /// Get a fortification by id.
    #[must_use]
    pub fn fortification(&self, id: EntityId) -> Option<&Fortification> {
        self.fortifications.get(&id)
    }

    /// Look up either kind of entity by id.
    #[must_use]
    pub fn entity(&self, id: EntityId) -> Option<Entity<'_>> {
        self.units
            .get(&id)
            .map(Entity::Unit)
            .or_else(|| self.fortifications.get(&id).map(Entity::Fortification))
    }

    /// All units in id order.
    pub fn units(&self) -> impl Iterator<Item = &Unit> {
        self.units.values()
    }

    /// All fortifications in id order.
    pub fn fortifications(&self) -> impl Iterator<Item = &Fortification> {
        self.fortifications.values()
    }

    /// Units owned by `player`, in id order.
    pub fn units_of(&self, player: PlayerId) -> impl Iterator<Item = &Unit> {
        self.units.values().filter(move |u| u.player == player)
    }

    /// Fortifications owned by `player`, in id order.
    pub fn fortifications_of(&self, player: PlayerId) -> impl Iterator<Item = &Fortification> {
        self.fortifications.values().filter(move |f| f.player == player)
    }

    /// Next id that will be assigned.
    #[must_use]
    pub const fn next_id(&self) -> EntityId {
        self.next_id
    }

    // ==================== GRID & OCCUPANCY ====================

    /// Bounds check.
    #[must_use]
    pub const fn is_inside(&self, coord: Coord) -> bool {
        self.grid.is_inside(coord)
    }

    /// The unit standing on a tile.
    #[must_use]
    pub fn unit_at(&self, coord: Coord) -> Option<&Unit> {
        self.units.values().find(|u| u.position == coord)
    }

    /// The fortification on a tile.
    #[must_use]
    pub fn fortification_at(&self, coord: Coord) -> Option<&Fortification> {
        self.fortifications.values().find(|f| f.position == coord)
    }

    /// An enemy of `player` on a tile: the unit if there is one, else the fortification.
    #[must_use]
    pub fn enemy_at(&self, player: PlayerId, coord: Coord) -> Option<Entity<'_>> {
        if let Some(unit) = self.unit_at(coord) {
            if unit.player != player {
                return Some(Entity::Unit(unit));
            }
        }
        self.fortification_at(coord)
            .filter(|f| f.player != player)
            .map(Entity::Fortification)
    }

    /// Whether any unit or fortification sits on a tile.
    #[must_use]
    pub fn tile_occupied(&self, coord: Coord) -> bool {
        self.unit_at(coord).is_some() || self.fortification_at(coord).is_some()
    }

    /// Whether a unit of `player` may stand on a tile, ignoring any unit already there.
    ///
    /// True for empty tiles and tiles holding a cover structure owned by `player`.
    #[must_use]
    pub fn is_landing_for(&self, player: PlayerId, coord: Coord) -> bool {
        self.fortification_at(coord)
            .is_none_or(|f| f.player == player && f.fort_type.is_cover())
    }

    /// Whether `unit` may enter or pass through a tile.
    ///
    /// False if any unit occupies the tile. True if the tile is empty or holds a
    /// cover structure owned by the unit's player; false for any other
    /// fortification. This is the sole authority for movement passability and
    /// move-destination legality.
    #[must_use]
    pub fn is_passable_for(&self, unit: &Unit, coord: Coord) -> bool {
        self.is_inside(coord)
            && self.unit_at(coord).is_none()
            && self.is_landing_for(unit.player, coord)
    }

    /// Whether the unit stands inside a friendly cover structure.
    #[must_use]
    pub fn is_in_cover(&self, unit: &Unit) -> bool {
        self.fortification_at(unit.position)
            .is_some_and(|f| f.player == unit.player && f.fort_type.is_cover())
    }

    // ==================== SELECTION ====================

    /// Select the current player's unit on a tile. Clears the selection if there is none.
    pub fn select_unit_at(&mut self, coord: Coord) -> Option<EntityId> {
        let current = self.current_player;
        self.selected = self
            .units
            .values()
            .find(|u| u.position == coord && u.player == current)
            .map(|u| u.id);
        self.selected
    }

    /// Select a unit by id. Only the current player's units can be selected.
    pub fn select(&mut self, id: EntityId) -> bool {
        match self.units.get(&id) {
            Some(unit) if unit.player == self.current_player => {
                self.selected = Some(id);
                true
            }
            _ => false,
        }
    }

    /// Clear the selection.
    pub fn clear_selection(&mut self) {
        self.selected = None;
    }

    /// Currently selected unit.
    #[must_use]
    pub fn selected(&self) -> Option<&Unit> {
        self.selected.and_then(|id| self.units.get(&id))
    }

    // ==================== ENTITY LIFECYCLE ====================

    /// Hand out the next entity id.
    pub(crate) fn allocate_id(&mut self) -> EntityId {
        let id = self.next_id;
        self.next_id = self.next_id.saturating_add(1);
        id
    }

    /// Create a unit without payment or placement-radius checks.
    ///
    /// Used for scenario setup. The tile must be inside the grid, free of
    /// units, and either empty or a friendly cover structure.
    pub fn place_unit(
        &mut self,
        player: PlayerId,
        unit_type: UnitType,
        at: Coord,
    ) -> Option<EntityId> {
        if self.player(player).is_none()
            || !self.is_inside(at)
            || self.unit_at(at).is_some()
            || !self.is_landing_for(player, at)
        {
            return None;
        }
        let id = self.insert_unit(player, unit_type, at);
        self.commit();
        Some(id)
    }

    /// Create a fortification without payment or placement-radius checks.
    ///
    /// Used for scenario setup. The tile must be inside the grid and unoccupied.
    pub fn place_fortification(
        &mut self,
        player: PlayerId,
        fort_type: FortType,
        at: Coord,
    ) -> Option<EntityId> {
        if self.player(player).is_none() || !self.is_inside(at) || self.tile_occupied(at) {
            return None;
        }
        let id = self.insert_fortification(player, fort_type, at);
        self.commit();
        Some(id)
    }

    pub(crate) fn insert_unit(&mut self, player: PlayerId, unit_type: UnitType, at: Coord) -> EntityId {
        let id = self.allocate_id();
        self.units.insert(id, Unit::new(id, unit_type, player, at));
        id
    }

    pub(crate) fn insert_fortification(
        &mut self,
        player: PlayerId,
        fort_type: FortType,
        at: Coord,
    ) -> EntityId {
        let id = self.allocate_id();
        self.fortifications
            .insert(id, Fortification::new(id, fort_type, player, at));
        id
    }

    /// Remove a destroyed entity. Flags it carried drop on its last tile and
    /// intents that reference it are cleared.
    pub(crate) fn remove_entity(&mut self, id: EntityId) -> Option<Coord> {
        if let Some(unit) = self.units.remove(&id) {
            debug!(unit = id, at = %unit.position, "unit destroyed");
            self.drop_flags_carried_by(id, unit.position);
            if self.selected == Some(id) {
                self.selected = None;
            }
            if self.build.is_some_and(|b| b.engineer == id) {
                self.build = None;
            }
            return Some(unit.position);
        }
        let fort = self.fortifications.remove(&id)?;
        debug!(fortification = id, at = %fort.position, "fortification destroyed");
        Some(fort.position)
    }

    // ==================== REVISION ====================

    /// Publish a state change: bump the revision and refresh visibility.
    pub(crate) fn commit(&mut self) {
        self.revision = self.revision.saturating_add(1);
        self.recompute_visibility();
    }

    /// Declare the game over. Win conditions are decided by the caller.
    ///
    /// Returns `false` if the game is already over or the player is unknown.
    pub fn declare_winner(&mut self, winner: PlayerId) -> bool {
        if self.game_over || self.player(winner).is_none() {
            return false;
        }
        self.game_over = true;
        self.winner = Some(winner);
        self.selected = None;
        self.placement = None;
        self.build = None;
        self.commit();
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create_test_game() -> GameState {
        GameState::new(10, 10, RulesConfig::default()).unwrap()
    }

    #[test]
    fn test_game_state_creation() {
        let game = create_test_game();
        assert_eq!(game.turn(), 1);
        assert_eq!(game.current_player(), 0);
        assert_eq!(game.revision(), 0);
        assert_eq!(game.money(0), 100);
        assert_eq!(game.money(1), 100);
        assert_eq!(game.player(0).unwrap().base, Coord::new(0, 0));
        assert_eq!(game.player(1).unwrap().base, Coord::new(9, 9));
        assert!(!game.is_game_over());
    }

    #[test]
    fn test_degenerate_grids_rejected() {
        assert!(GameState::new(0, 5, RulesConfig::default()).is_none());
        assert!(GameState::new(1, 1, RulesConfig::default()).is_none());
        assert!(GameState::new(1, 2, RulesConfig::default()).is_some());
    }

    #[test]
    fn test_ids_are_monotonic_and_shared() {
        let mut game = create_test_game();
        let a = game.place_unit(0, UnitType::Infantry, Coord::new(2, 2)).unwrap();
        let b = game
            .place_fortification(0, FortType::Pillbox, Coord::new(3, 3))
            .unwrap();
        game.remove_entity(a);
        let c = game.place_unit(0, UnitType::Infantry, Coord::new(2, 2)).unwrap();
        assert!(a < b && b < c);
        assert!(game.unit(a).is_none());
    }

    #[test]
    fn test_passability() {
        let mut game = create_test_game();
        let mover = game.place_unit(0, UnitType::Infantry, Coord::new(1, 1)).unwrap();
        game.place_unit(1, UnitType::Infantry, Coord::new(2, 1)).unwrap();
        game.place_fortification(0, FortType::Bunker, Coord::new(3, 1));
        game.place_fortification(1, FortType::Bunker, Coord::new(4, 1));
        game.place_fortification(0, FortType::BarbedWire, Coord::new(5, 1));

        let unit = game.unit(mover).unwrap().clone();
        assert!(!game.is_passable_for(&unit, Coord::new(2, 1)), "unit blocks");
        assert!(game.is_passable_for(&unit, Coord::new(3, 1)), "friendly bunker");
        assert!(!game.is_passable_for(&unit, Coord::new(4, 1)), "enemy bunker");
        assert!(!game.is_passable_for(&unit, Coord::new(5, 1)), "wire");
        assert!(game.is_passable_for(&unit, Coord::new(6, 1)), "empty");
        assert!(!game.is_passable_for(&unit, Coord::new(10, 1)), "outside");
    }

    #[test]
    fn test_place_unit_rules() {
        let mut game = create_test_game();
        game.place_fortification(0, FortType::Bunker, Coord::new(4, 4));
        assert!(game.place_unit(0, UnitType::Infantry, Coord::new(4, 4)).is_some());
        // Only one unit per tile, even in a bunker.
        assert!(game.place_unit(0, UnitType::Medic, Coord::new(4, 4)).is_none());
        // Enemies cannot use the bunker.
        game.place_fortification(0, FortType::Bunker, Coord::new(5, 5));
        assert!(game.place_unit(1, UnitType::Infantry, Coord::new(5, 5)).is_none());
        assert!(game.place_unit(2, UnitType::Infantry, Coord::new(6, 6)).is_none());
    }

    #[test]
    fn test_selection_only_own_units() {
        let mut game = create_test_game();
        let own = game.place_unit(0, UnitType::Infantry, Coord::new(1, 1)).unwrap();
        let enemy = game.place_unit(1, UnitType::Infantry, Coord::new(5, 5)).unwrap();
        assert_eq!(game.select_unit_at(Coord::new(1, 1)), Some(own));
        assert_eq!(game.select_unit_at(Coord::new(5, 5)), None);
        assert!(!game.select(enemy));
        assert!(game.select(own));
        assert_eq!(game.selected().map(|u| u.id), Some(own));
    }

    #[test]
    fn test_enemy_at_prefers_unit() {
        let mut game = create_test_game();
        game.place_fortification(1, FortType::Bunker, Coord::new(6, 6));
        let unit = game.place_unit(1, UnitType::Infantry, Coord::new(6, 6)).unwrap();
        assert_eq!(game.enemy_at(0, Coord::new(6, 6)).map(|e| e.id()), Some(unit));
        assert!(game.enemy_at(1, Coord::new(6, 6)).is_none());
    }

    #[test]
    fn test_declare_winner() {
        let mut game = create_test_game();
        assert!(game.declare_winner(1));
        assert!(game.is_game_over());
        assert_eq!(game.winner(), Some(1));
        assert!(!game.declare_winner(0));
    }
}
