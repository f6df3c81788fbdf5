//! Room storage for networked play.
//!
//! The rules engine knows nothing about rooms. A transport owns a
//! [`RoomService`], which loads the stored snapshot for a room, applies an
//! [`Action`] through a fresh [`GameState`], and writes the result back along
//! with a sequenced event. Storage sits behind the [`RoomStore`] trait;
//! [`MemoryRoomStore`] keeps everything in process.

use std::collections::{HashMap, VecDeque};
use std::fmt;
use std::sync::RwLock;

use rand::Rng;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::error::SnapshotError;
use crate::game::{GameState, PLAYER_COUNT, PlayerId, RulesConfig};
use crate::protocol::{Action, Snapshot};

/// Characters used in generated room ids. No `I`, `O`, `0` or `1`.
const ROOM_ID_ALPHABET: &[u8] = b"ABCDEFGHJKLMNPQRSTUVWXYZ23456789";

/// Length of generated room ids.
const ROOM_ID_LEN: usize = 6;

/// Events kept per room; older ones are discarded.
pub const EVENT_LOG_CAP: usize = 500;

/// Board size used for new rooms unless configured otherwise.
pub const DEFAULT_BOARD_SIZE: u16 = 12;

/// Short human-friendly room code.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RoomId(String);

impl RoomId {
    /// Wrap an existing code.
    #[must_use]
    pub fn new(code: impl Into<String>) -> Self {
        Self(code.into())
    }

    /// Generate a random code.
    #[must_use]
    pub fn random() -> Self {
        let mut rng = rand::thread_rng();
        let code = (0..ROOM_ID_LEN)
            .map(|_| char::from(ROOM_ID_ALPHABET[rng.gen_range(0..ROOM_ID_ALPHABET.len())]))
            .collect();
        Self(code)
    }

    /// The code as a string.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RoomId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// An applied action, numbered within its room.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoomEvent {
    /// Sequence number, starting at 1.
    pub seq: u64,
    /// The action that was applied.
    pub action: Action,
    /// Revision of the state after the action.
    pub revision: u64,
}

/// Room storage errors
#[derive(Debug, Error)]
pub enum RoomError {
    /// No room with this id.
    #[error("Room {0} not found")]
    NotFound(RoomId),
    /// The id is already in use.
    #[error("Room {0} already exists")]
    AlreadyExists(RoomId),
    /// Both seats are taken.
    #[error("Room {0} is full")]
    Full(RoomId),
    /// A seat was released that nobody held.
    #[error("Seat {seat} in room {room} is not taken")]
    SeatNotTaken {
        /// Room the seat belongs to.
        room: RoomId,
        /// Seat that was free.
        seat: PlayerId,
    },
    /// Another writer stored a newer snapshot first.
    #[error("Stale snapshot: revision {incoming} is not newer than stored revision {stored}")]
    Stale {
        /// Revision offered.
        incoming: u64,
        /// Revision already stored.
        stored: u64,
    },
    /// The rules refused the action.
    #[error("Action rejected by the rules: {0:?}")]
    Rejected(Action),
    /// A writer panicked while holding the store lock.
    #[error("Room store lock poisoned")]
    Poisoned,
    /// The stored or resulting snapshot is invalid.
    #[error(transparent)]
    Snapshot(#[from] SnapshotError),
}

/// Persistence for rooms: seats, latest snapshot and event log.
///
/// Implementations must make [`claim_seat`](Self::claim_seat) atomic: two
/// concurrent claims on a room with one free seat must not both succeed.
pub trait RoomStore: Send + Sync {
    /// Create a room holding `initial`, under a fresh random id.
    ///
    /// # Errors
    ///
    /// Returns an error if the store is unavailable.
    fn create(&self, initial: Snapshot) -> Result<RoomId, RoomError>;

    /// Create a room under a caller-chosen id.
    ///
    /// # Errors
    ///
    /// Returns [`RoomError::AlreadyExists`] if the id is taken.
    fn create_with_id(&self, id: RoomId, initial: Snapshot) -> Result<(), RoomError>;

    /// Take the lowest free seat.
    ///
    /// # Errors
    ///
    /// Returns [`RoomError::Full`] if every seat is taken.
    fn claim_seat(&self, room: &RoomId) -> Result<PlayerId, RoomError>;

    /// Give a seat back. Returns whether the room is now empty.
    ///
    /// # Errors
    ///
    /// Returns an error if the room is unknown or the seat was free.
    fn release_seat(&self, room: &RoomId, seat: PlayerId) -> Result<bool, RoomError>;

    /// Latest stored snapshot.
    ///
    /// # Errors
    ///
    /// Returns [`RoomError::NotFound`] for unknown rooms.
    fn load_snapshot(&self, room: &RoomId) -> Result<Snapshot, RoomError>;

    /// Replace the stored snapshot with a newer one.
    ///
    /// # Errors
    ///
    /// Returns [`RoomError::Stale`] unless the revision is strictly greater
    /// than the stored one.
    fn store_snapshot(&self, room: &RoomId, snapshot: Snapshot) -> Result<(), RoomError>;

    /// Record an applied action and return it with its sequence number.
    ///
    /// # Errors
    ///
    /// Returns [`RoomError::NotFound`] for unknown rooms.
    fn append_event(&self, room: &RoomId, action: Action, revision: u64)
    -> Result<RoomEvent, RoomError>;

    /// Events with a sequence number greater than `since`, oldest first.
    ///
    /// # Errors
    ///
    /// Returns [`RoomError::NotFound`] for unknown rooms.
    fn events_since(&self, room: &RoomId, since: u64) -> Result<Vec<RoomEvent>, RoomError>;

    /// Delete a room. Returns whether it existed.
    fn remove(&self, room: &RoomId) -> bool;
}

#[derive(Debug)]
struct RoomRecord {
    seats: [bool; PLAYER_COUNT],
    snapshot: Snapshot,
    events: VecDeque<RoomEvent>,
    seq: u64,
}

impl RoomRecord {
    fn new(snapshot: Snapshot) -> Self {
        Self {
            seats: [false; PLAYER_COUNT],
            snapshot,
            events: VecDeque::new(),
            seq: 0,
        }
    }
}

/// In-process [`RoomStore`].
#[derive(Debug, Default)]
pub struct MemoryRoomStore {
    rooms: RwLock<HashMap<RoomId, RoomRecord>>,
}

impl MemoryRoomStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of rooms.
    #[must_use]
    pub fn len(&self) -> usize {
        self.rooms.read().map_or(0, |rooms| rooms.len())
    }

    /// Whether the store holds no rooms.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn with_room<T>(
        &self,
        room: &RoomId,
        f: impl FnOnce(&mut RoomRecord) -> Result<T, RoomError>,
    ) -> Result<T, RoomError> {
        let mut rooms = self.rooms.write().map_err(|_| RoomError::Poisoned)?;
        let record = rooms
            .get_mut(room)
            .ok_or_else(|| RoomError::NotFound(room.clone()))?;
        f(record)
    }
}

impl RoomStore for MemoryRoomStore {
    fn create(&self, initial: Snapshot) -> Result<RoomId, RoomError> {
        let mut rooms = self.rooms.write().map_err(|_| RoomError::Poisoned)?;
        let mut id = RoomId::random();
        while rooms.contains_key(&id) {
            id = RoomId::random();
        }
        rooms.insert(id.clone(), RoomRecord::new(initial));
        Ok(id)
    }

    fn create_with_id(&self, id: RoomId, initial: Snapshot) -> Result<(), RoomError> {
        let mut rooms = self.rooms.write().map_err(|_| RoomError::Poisoned)?;
        if rooms.contains_key(&id) {
            return Err(RoomError::AlreadyExists(id));
        }
        rooms.insert(id, RoomRecord::new(initial));
        Ok(())
    }

    fn claim_seat(&self, room: &RoomId) -> Result<PlayerId, RoomError> {
        self.with_room(room, |record| {
            let seat = record
                .seats
                .iter()
                .position(|taken| !taken)
                .ok_or_else(|| RoomError::Full(room.clone()))?;
            record.seats[seat] = true;
            PlayerId::try_from(seat).map_err(|_| RoomError::Full(room.clone()))
        })
    }

    fn release_seat(&self, room: &RoomId, seat: PlayerId) -> Result<bool, RoomError> {
        self.with_room(room, |record| {
            match record.seats.get_mut(usize::from(seat)) {
                Some(taken) if *taken => *taken = false,
                _ => {
                    return Err(RoomError::SeatNotTaken {
                        room: room.clone(),
                        seat,
                    });
                }
            }
            Ok(record.seats.iter().all(|taken| !taken))
        })
    }

    fn load_snapshot(&self, room: &RoomId) -> Result<Snapshot, RoomError> {
        let rooms = self.rooms.read().map_err(|_| RoomError::Poisoned)?;
        rooms
            .get(room)
            .map(|record| record.snapshot.clone())
            .ok_or_else(|| RoomError::NotFound(room.clone()))
    }

    fn store_snapshot(&self, room: &RoomId, snapshot: Snapshot) -> Result<(), RoomError> {
        self.with_room(room, |record| {
            if snapshot.revision <= record.snapshot.revision {
                return Err(RoomError::Stale {
                    incoming: snapshot.revision,
                    stored: record.snapshot.revision,
                });
            }
            record.snapshot = snapshot;
            Ok(())
        })
    }

    fn append_event(
        &self,
        room: &RoomId,
        action: Action,
        revision: u64,
    ) -> Result<RoomEvent, RoomError> {
        self.with_room(room, |record| {
            record.seq += 1;
            let event = RoomEvent {
                seq: record.seq,
                action,
                revision,
            };
            record.events.push_back(event);
            while record.events.len() > EVENT_LOG_CAP {
                record.events.pop_front();
            }
            Ok(event)
        })
    }

    fn events_since(&self, room: &RoomId, since: u64) -> Result<Vec<RoomEvent>, RoomError> {
        let rooms = self.rooms.read().map_err(|_| RoomError::Poisoned)?;
        let record = rooms
            .get(room)
            .ok_or_else(|| RoomError::NotFound(room.clone()))?;
        Ok(record
            .events
            .iter()
            .filter(|e| e.seq > since)
            .copied()
            .collect())
    }

    fn remove(&self, room: &RoomId) -> bool {
        self.rooms
            .write()
            .is_ok_and(|mut rooms| rooms.remove(room).is_some())
    }
}

/// Applies actions to stored rooms.
#[derive(Debug)]
pub struct RoomService<S> {
    store: S,
    rules: RulesConfig,
    width: u16,
    height: u16,
}

impl<S: RoomStore> RoomService<S> {
    /// Create a service over `store` using default-sized boards.
    #[must_use]
    pub fn new(store: S, rules: RulesConfig) -> Self {
        Self {
            store,
            rules,
            width: DEFAULT_BOARD_SIZE,
            height: DEFAULT_BOARD_SIZE,
        }
    }

    /// Use a different board size for new rooms.
    #[must_use]
    pub fn with_board(mut self, width: u16, height: u16) -> Self {
        self.width = width;
        self.height = height;
        self
    }

    /// The underlying store.
    #[must_use]
    pub const fn store(&self) -> &S {
        &self.store
    }

    /// Open a new room and take seat 0 in it.
    ///
    /// # Errors
    ///
    /// Returns an error if the board size is invalid or the store fails.
    pub fn open_room(&self) -> Result<(RoomId, PlayerId), RoomError> {
        let game = GameState::new(self.width, self.height, self.rules.clone()).ok_or(
            SnapshotError::InvalidDimensions {
                width: self.width,
                height: self.height,
            },
        )?;
        let room = self.store.create(game.snapshot())?;
        let seat = self.store.claim_seat(&room)?;
        info!(room = %room, seat, "room opened");
        Ok((room, seat))
    }

    /// Take a free seat in an existing room.
    ///
    /// # Errors
    ///
    /// Returns [`RoomError::NotFound`] or [`RoomError::Full`].
    pub fn join(&self, room: &RoomId) -> Result<PlayerId, RoomError> {
        let seat = self.store.claim_seat(room)?;
        info!(room = %room, seat, "seat claimed");
        Ok(seat)
    }

    /// Leave a room. The room is deleted once both seats are free.
    ///
    /// # Errors
    ///
    /// Returns an error if the room is unknown or the seat was free.
    pub fn leave(&self, room: &RoomId, seat: PlayerId) -> Result<(), RoomError> {
        if self.store.release_seat(room, seat)? {
            self.store.remove(room);
            info!(room = %room, "room closed");
        }
        Ok(())
    }

    /// Latest state of a room.
    ///
    /// # Errors
    ///
    /// Returns [`RoomError::NotFound`] for unknown rooms.
    pub fn state(&self, room: &RoomId) -> Result<Snapshot, RoomError> {
        self.store.load_snapshot(room)
    }

    /// Events after `since`, for polling clients.
    ///
    /// # Errors
    ///
    /// Returns [`RoomError::NotFound`] for unknown rooms.
    pub fn events_since(&self, room: &RoomId, since: u64) -> Result<Vec<RoomEvent>, RoomError> {
        self.store.events_since(room, since)
    }

    /// Apply an action to a room and store the result.
    ///
    /// # Errors
    ///
    /// Returns [`RoomError::Rejected`] if the rules refuse the action, or
    /// [`RoomError::Stale`] if another writer stored a newer state first.
    pub fn submit(&self, room: &RoomId, action: Action) -> Result<(Snapshot, RoomEvent), RoomError> {
        let current = self.store.load_snapshot(room)?;
        let mut game = GameState::from_snapshot(current, self.rules.clone())?;
        if !game.apply_action(&action) {
            debug!(room = %room, ?action, "action rejected");
            return Err(RoomError::Rejected(action));
        }
        let snapshot = game.snapshot();
        if let Err(err) = self.store.store_snapshot(room, snapshot.clone()) {
            warn!(room = %room, error = %err, "lost update");
            return Err(err);
        }
        let event = self.store.append_event(room, action, snapshot.revision)?;
        info!(room = %room, seq = event.seq, revision = snapshot.revision, "action applied");
        Ok((snapshot, event))
    }
}
