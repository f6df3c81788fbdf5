//! Error types for fallible non-rule operations.
//!
//! Rule violations are not errors: engine operations report them by returning
//! `false`/`None` and leaving state untouched. The types here cover malformed
//! input that arrives from outside the engine.

use thiserror::Error;

use crate::game::{Coord, EntityId, PlayerId};

/// Rejected rules configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The configuration document could not be parsed.
    #[error("invalid rules document: {0}")]
    Parse(#[from] serde_json::Error),
    /// Rank thresholds are not strictly increasing.
    #[error("rank thresholds must be strictly increasing, got {0:?}")]
    RankThresholds(Vec<u32>),
    /// A value that must be positive was zero.
    #[error("{0} must be greater than zero")]
    Zero(&'static str),
}

/// Rejected snapshot.
#[derive(Debug, Error)]
pub enum SnapshotError {
    /// The snapshot document could not be decoded or encoded.
    #[error("invalid snapshot document: {0}")]
    Codec(#[from] serde_json::Error),
    /// The snapshot is not newer than the local state.
    #[error("stale snapshot: incoming revision {incoming} is not newer than local revision {local}")]
    Stale {
        /// Revision carried by the snapshot.
        incoming: u64,
        /// Revision of the local state.
        local: u64,
    },
    /// Grid dimensions are zero.
    #[error("invalid grid dimensions {width}x{height}")]
    InvalidDimensions {
        /// Width from the snapshot.
        width: u16,
        /// Height from the snapshot.
        height: u16,
    },
    /// Current player or winner is not 0 or 1.
    #[error("unknown player {0}")]
    UnknownPlayer(PlayerId),
    /// A base lies outside the grid.
    #[error("base of player {player} at {at} is outside the grid")]
    BaseOutOfBounds {
        /// Owner of the base.
        player: PlayerId,
        /// Base coordinate.
        at: Coord,
    },
    /// Two entities share an id.
    #[error("duplicate entity id {0}")]
    DuplicateId(EntityId),
    /// An entity lies outside the grid.
    #[error("entity {id} at {at} is outside the grid")]
    OutOfBounds {
        /// Entity id.
        id: EntityId,
        /// Entity position.
        at: Coord,
    },
    /// An entity id, or the next id to assign, is the reserved maximum.
    #[error("entity id {0} is reserved")]
    ReservedId(EntityId),
    /// An entity with zero hit points is present.
    #[error("entity {0} has no hit points left")]
    DeadEntity(EntityId),
    /// An entity's fixed statistics differ from the catalogue for its type.
    #[error("entity {0} does not match the catalogue statistics for its type")]
    TamperedStats(EntityId),
    /// An entity has more hit points than its maximum.
    #[error("entity {0} has more hit points than its maximum")]
    Overhealed(EntityId),
    /// `gameOver` and `winner` disagree.
    #[error("game over flag {game_over} disagrees with winner {winner:?}")]
    WinnerMismatch {
        /// Game over flag from the snapshot.
        game_over: bool,
        /// Winner from the snapshot.
        winner: Option<PlayerId>,
    },
    /// Two units share a tile, or a unit shares a tile with a fortification
    /// other than a friendly bunker.
    #[error("illegal stacking at {0}")]
    Stacking(Coord),
    /// A flag references a unit that does not exist.
    #[error("flag of player {player} is carried by missing unit {unit}")]
    DanglingCarrier {
        /// Owner of the flag.
        player: PlayerId,
        /// Referenced unit id.
        unit: EntityId,
    },
    /// A dropped flag lies outside the grid.
    #[error("flag of player {player} dropped outside the grid at {at}")]
    FlagOutOfBounds {
        /// Owner of the flag.
        player: PlayerId,
        /// Flag coordinate.
        at: Coord,
    },
}
