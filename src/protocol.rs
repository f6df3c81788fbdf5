//! Wire formats for remote play.
//!
//! An [`Action`] is a single intent from one seat, re-validated on arrival. A
//! [`Snapshot`] is the full mutable state, exchanged as JSON and ordered by
//! revision.

mod action;
mod snapshot;

pub use action::Action;
pub use snapshot::Snapshot;
