use std::collections::{BTreeMap, HashSet};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::SnapshotError;
use crate::game::{
    Coord, EntityId, FlagState, Fortification, GameState, Grid, PLAYER_COUNT, Player, PlayerId,
    RulesConfig, Unit,
};

/// Complete mutable game state, ordered by `revision`.
///
/// Transient intents (selection, queued purchases and builds) are local to a
/// client and never part of a snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Snapshot {
    /// Grid width.
    pub width: u16,
    /// Grid height.
    pub height: u16,
    /// Turn number.
    pub turn: u32,
    /// Player whose turn it is.
    pub current_player: PlayerId,
    /// Both players: base, money, flag and captures.
    pub players: [Player; PLAYER_COUNT],
    /// All units, in id order.
    pub units: Vec<Unit>,
    /// All fortifications, in id order.
    pub fortifications: Vec<Fortification>,
    /// Whether a winner has been declared.
    pub game_over: bool,
    /// Declared winner.
    pub winner: Option<PlayerId>,
    /// State revision.
    pub revision: u64,
    /// Next entity id. Older snapshots may omit it; it is then derived from the
    /// largest id present.
    #[serde(default)]
    pub next_id: EntityId,
}

impl Snapshot {
    /// Encode as JSON.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_json(&self) -> Result<String, SnapshotError> {
        Ok(serde_json::to_string(self)?)
    }

    /// Decode from JSON. The result is not yet validated.
    ///
    /// # Errors
    ///
    /// Returns an error if the document is malformed.
    pub fn from_json(text: &str) -> Result<Self, SnapshotError> {
        Ok(serde_json::from_str(text)?)
    }

    /// Check that the snapshot describes a consistent game.
    ///
    /// # Errors
    ///
    /// Returns the first inconsistency found.
    pub fn validate(&self) -> Result<(), SnapshotError> {
        let grid = Grid::new(self.width, self.height).ok_or(SnapshotError::InvalidDimensions {
            width: self.width,
            height: self.height,
        })?;
        let is_seat = |p: PlayerId| usize::from(p) < PLAYER_COUNT;

        if !is_seat(self.current_player) {
            return Err(SnapshotError::UnknownPlayer(self.current_player));
        }
        if let Some(winner) = self.winner.filter(|w| !is_seat(*w)) {
            return Err(SnapshotError::UnknownPlayer(winner));
        }
        if self.game_over != self.winner.is_some() {
            return Err(SnapshotError::WinnerMismatch {
                game_over: self.game_over,
                winner: self.winner,
            });
        }
        if self.next_id == EntityId::MAX {
            return Err(SnapshotError::ReservedId(self.next_id));
        }
        for (seat, player) in self.players.iter().enumerate() {
            if usize::from(player.id) != seat || player.flag.owner != player.id {
                return Err(SnapshotError::UnknownPlayer(player.id));
            }
            if !grid.is_inside(player.base) {
                return Err(SnapshotError::BaseOutOfBounds {
                    player: player.id,
                    at: player.base,
                });
            }
        }

        let mut ids = HashSet::new();
        let mut unit_tiles = HashSet::new();
        for unit in &self.units {
            if unit.id == EntityId::MAX {
                return Err(SnapshotError::ReservedId(unit.id));
            }
            if !ids.insert(unit.id) {
                return Err(SnapshotError::DuplicateId(unit.id));
            }
            if !is_seat(unit.player) {
                return Err(SnapshotError::UnknownPlayer(unit.player));
            }
            if !grid.is_inside(unit.position) {
                return Err(SnapshotError::OutOfBounds {
                    id: unit.id,
                    at: unit.position,
                });
            }
            if unit.hp == 0 {
                return Err(SnapshotError::DeadEntity(unit.id));
            }
            if !unit.matches_catalogue() {
                return Err(SnapshotError::TamperedStats(unit.id));
            }
            if unit.hp > unit.max_hp {
                return Err(SnapshotError::Overhealed(unit.id));
            }
            if !unit_tiles.insert(unit.position) {
                return Err(SnapshotError::Stacking(unit.position));
            }
        }

        let mut fort_tiles: BTreeMap<Coord, &Fortification> = BTreeMap::new();
        for fort in &self.fortifications {
            if fort.id == EntityId::MAX {
                return Err(SnapshotError::ReservedId(fort.id));
            }
            if !ids.insert(fort.id) {
                return Err(SnapshotError::DuplicateId(fort.id));
            }
            if !is_seat(fort.player) {
                return Err(SnapshotError::UnknownPlayer(fort.player));
            }
            if !grid.is_inside(fort.position) {
                return Err(SnapshotError::OutOfBounds {
                    id: fort.id,
                    at: fort.position,
                });
            }
            if fort.hp == 0 {
                return Err(SnapshotError::DeadEntity(fort.id));
            }
            if !fort.matches_catalogue() {
                return Err(SnapshotError::TamperedStats(fort.id));
            }
            if fort.hp > fort.max_hp {
                return Err(SnapshotError::Overhealed(fort.id));
            }
            if fort_tiles.insert(fort.position, fort).is_some() {
                return Err(SnapshotError::Stacking(fort.position));
            }
        }
        for unit in &self.units {
            if let Some(fort) = fort_tiles.get(&unit.position) {
                if fort.player != unit.player || !fort.fort_type.is_cover() {
                    return Err(SnapshotError::Stacking(unit.position));
                }
            }
        }

        for player in &self.players {
            match player.flag.state {
                FlagState::Carried { carried_by } => {
                    if !self.units.iter().any(|u| u.id == carried_by) {
                        return Err(SnapshotError::DanglingCarrier {
                            player: player.id,
                            unit: carried_by,
                        });
                    }
                }
                FlagState::Dropped { at } => {
                    if !grid.is_inside(at) {
                        return Err(SnapshotError::FlagOutOfBounds { player: player.id, at });
                    }
                }
                FlagState::AtBase => {}
            }
        }
        Ok(())
    }
}

impl GameState {
    /// Capture the complete mutable state.
    #[must_use]
    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            width: self.grid.width(),
            height: self.grid.height(),
            turn: self.turn,
            current_player: self.current_player,
            players: self.players.clone(),
            units: self.units.values().cloned().collect(),
            fortifications: self.fortifications.values().cloned().collect(),
            game_over: self.game_over,
            winner: self.winner,
            revision: self.revision,
            next_id: self.next_id,
        }
    }

    /// Rebuild a game from a snapshot.
    ///
    /// # Errors
    ///
    /// Returns an error if the snapshot is inconsistent.
    pub fn from_snapshot(snapshot: Snapshot, rules: RulesConfig) -> Result<Self, SnapshotError> {
        snapshot.validate()?;
        let grid = Grid::new(snapshot.width, snapshot.height).ok_or(SnapshotError::InvalidDimensions {
            width: snapshot.width,
            height: snapshot.height,
        })?;

        let highest = snapshot
            .units
            .iter()
            .map(|u| u.id)
            .chain(snapshot.fortifications.iter().map(|f| f.id))
            .max()
            .unwrap_or(0);
        let next_id = snapshot.next_id.max(highest.saturating_add(1)).max(1);

        let mut state = Self {
            grid,
            rules,
            turn: snapshot.turn,
            current_player: snapshot.current_player,
            players: snapshot.players,
            units: snapshot.units.into_iter().map(|u| (u.id, u)).collect(),
            fortifications: snapshot
                .fortifications
                .into_iter()
                .map(|f| (f.id, f))
                .collect(),
            next_id,
            revision: snapshot.revision,
            selected: None,
            placement: None,
            build: None,
            visibility: [HashSet::new(), HashSet::new()],
            game_over: snapshot.game_over,
            winner: snapshot.winner,
        };
        state.recompute_visibility();
        Ok(state)
    }

    /// Replace the local state with a newer snapshot.
    ///
    /// Local intents are cleared. The rules in force are kept.
    ///
    /// # Errors
    ///
    /// Returns [`SnapshotError::Stale`] unless the snapshot's revision is
    /// strictly greater than the local one, or a validation error. The local
    /// state is unchanged on error.
    pub fn apply_snapshot(&mut self, snapshot: Snapshot) -> Result<(), SnapshotError> {
        if snapshot.revision <= self.revision {
            debug!(
                incoming = snapshot.revision,
                local = self.revision,
                "snapshot rejected: stale"
            );
            return Err(SnapshotError::Stale {
                incoming: snapshot.revision,
                local: self.revision,
            });
        }
        *self = Self::from_snapshot(snapshot, self.rules.clone())?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::{FortType, UnitType};

    fn busy_game() -> GameState {
        let mut game = GameState::new(10, 8, RulesConfig::default()).unwrap();
        game.place_unit(0, UnitType::Infantry, Coord::new(1, 1)).unwrap();
        game.place_fortification(1, FortType::Bunker, Coord::new(8, 6)).unwrap();
        game.place_unit(1, UnitType::Tank, Coord::new(8, 6)).unwrap();
        game
    }

    #[test]
    fn test_snapshot_reproduces_state() {
        let game = busy_game();
        let json = game.snapshot().to_json().unwrap();
        let restored =
            GameState::from_snapshot(Snapshot::from_json(&json).unwrap(), RulesConfig::default())
                .unwrap();
        assert_eq!(restored.snapshot(), game.snapshot());
        assert_eq!(restored.next_id(), game.next_id());
        assert_eq!(restored.visibility(0), game.visibility(0));
    }

    #[test]
    fn test_stale_snapshot_rejected() {
        let mut game = busy_game();
        let mut newer = game.snapshot();
        newer.revision = 5;
        let mut older = game.snapshot();
        older.revision = 3;

        game.apply_snapshot(newer).unwrap();
        assert_eq!(game.revision(), 5);
        let err = game.apply_snapshot(older).unwrap_err();
        assert!(matches!(err, SnapshotError::Stale { incoming: 3, local: 5 }));
        assert_eq!(game.revision(), 5);
    }

    #[test]
    fn test_missing_next_id_is_derived() {
        let game = busy_game();
        let mut value = serde_json::to_value(game.snapshot()).unwrap();
        value.as_object_mut().unwrap().remove("nextId");
        let snapshot: Snapshot = serde_json::from_value(value).unwrap();
        assert_eq!(snapshot.next_id, 0);
        let restored = GameState::from_snapshot(snapshot, RulesConfig::default()).unwrap();
        assert_eq!(restored.next_id(), 4);
    }

    #[test]
    fn test_rejects_stacked_units() {
        let game = busy_game();
        let mut snapshot = game.snapshot();
        snapshot.units[1].position = snapshot.units[0].position;
        assert!(matches!(
            snapshot.validate(),
            Err(SnapshotError::Stacking(_))
        ));
    }

    #[test]
    fn test_rejects_dangling_carrier() {
        let game = busy_game();
        let mut snapshot = game.snapshot();
        snapshot.players[1].flag.state = FlagState::Carried { carried_by: 42 };
        assert!(matches!(
            snapshot.validate(),
            Err(SnapshotError::DanglingCarrier { player: 1, unit: 42 })
        ));
    }

    #[test]
    fn test_rejects_duplicate_ids() {
        let game = busy_game();
        let mut snapshot = game.snapshot();
        snapshot.fortifications[0].id = snapshot.units[0].id;
        assert!(matches!(
            snapshot.validate(),
            Err(SnapshotError::DuplicateId(_))
        ));
    }

    #[test]
    fn test_rejects_tampered_stats() {
        let mut game = busy_game();
        let mut snapshot = game.snapshot();
        snapshot.revision += 1;
        snapshot.units[0].atk = u32::MAX;
        snapshot.units[0].xp = 3;
        assert!(matches!(
            game.apply_snapshot(snapshot),
            Err(SnapshotError::TamperedStats(1))
        ));

        let mut snapshot = game.snapshot();
        snapshot.units[1].sight = u16::MAX;
        assert!(matches!(
            snapshot.validate(),
            Err(SnapshotError::TamperedStats(_))
        ));

        let mut snapshot = game.snapshot();
        snapshot.fortifications[0].range = 40;
        assert!(matches!(
            snapshot.validate(),
            Err(SnapshotError::TamperedStats(_))
        ));

        // Veteran units still load.
        let mut snapshot = game.snapshot();
        snapshot.units[0].xp = u32::MAX;
        snapshot.validate().unwrap();
    }

    #[test]
    fn test_rejects_winner_without_game_over() {
        let game = busy_game();
        let mut snapshot = game.snapshot();
        snapshot.winner = Some(0);
        assert!(matches!(
            snapshot.validate(),
            Err(SnapshotError::WinnerMismatch { game_over: false, .. })
        ));
    }

    #[test]
    fn test_invalid_snapshot_leaves_state() {
        let mut game = busy_game();
        let before = game.snapshot();
        let mut bad = game.snapshot();
        bad.revision += 10;
        bad.width = 0;
        assert!(game.apply_snapshot(bad).is_err());
        assert_eq!(game.snapshot(), before);
    }
}
