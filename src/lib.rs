// Allow unwrap and unreadable literals in tests (test code is not production)
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::unreadable_literal))]
//! Frontline: a deterministic rules engine for a two-player, turn-based
//! capture-the-flag wargame on a square grid.
//!
//! The engine is a single in-memory state machine. Callers (local input, an AI
//! or a remote seat) invoke operations on [`GameState`]; each operation either
//! applies fully and bumps the revision, or is silently rejected and leaves
//! the state untouched. Nothing in the engine is random.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────┐
//! │   room: RoomStore / RoomService     │
//! ├─────────────────────────────────────┤
//! │   protocol: Action / Snapshot       │
//! ├─────────────────────────────────────┤
//! │   game: GameState + rule modules    │
//! └─────────────────────────────────────┘
//! ```

pub mod error;
pub mod game;
pub mod protocol;
pub mod room;

pub use error::{ConfigError, SnapshotError};

// Re-export key game types at crate root for convenience
pub use game::{
    Coord, EntityId, FortType, GameState, PlayerId, Purchase, RulesConfig, Unit, UnitType,
};
pub use protocol::{Action, Snapshot};
