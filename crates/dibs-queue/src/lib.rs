//! Per-room turn queues for dibs.
//!
//! Each room has one line of [`Reservation`]s: the head holds the baton,
//! everyone else waits in FIFO order. [`RoomQueue`] owns every transition
//! on a line and its invariants; [`QueueRegistry`] hands out one
//! [`SharedQueue`] per room, each behind its own mutex.
//!
//! # Key types
//!
//! - [`RoomQueue`] — the line, the lock flag, and all transitions
//! - [`QueueRegistry`] — room name → queue, created lazily
//! - [`QueueState`] — `Empty` / `Held` / `PendingHandoff` / `Locked`
//! - [`Refusal`] — why an operation left the line unchanged
//!
//! This crate has no clock and no timers. Callers pass `now` in, and arm
//! grace timers themselves from the [`Handoff`] an operation returns.

mod error;
mod queue;
mod registry;
mod reservation;
mod state;

pub use error::Refusal;
pub use queue::{
    GraceOutcome, Handoff, QueueSnapshot, Rejoined, Released, Requested,
    RoomQueue, SnapshotEntry, Stolen, Unlocked,
};
pub use registry::{QueueRegistry, SharedQueue};
pub use reservation::{Reservation, Ticket};
pub use state::QueueState;
