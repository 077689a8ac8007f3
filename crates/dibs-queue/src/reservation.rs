//! A single user's claim on a room's line.

use std::fmt;
use std::time::{Duration, Instant};

use dibs_protocol::UserId;

/// Identity of one reservation instance within a room.
///
/// Tickets are handed out in increasing order and never reused, so a grace
/// timer bound to a ticket can tell whether the head of the line is still
/// the reservation it was armed for, even if the same user has since left
/// and rejoined.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Ticket(u64);

impl Ticket {
    /// Returns the underlying counter value.
    pub fn into_inner(self) -> u64 {
        self.0
    }
}

impl fmt::Display for Ticket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// One user's place in line.
///
/// Index 0 of a line is the holder; everyone else is waiting. While the
/// holder is inside an unconfirmed grace window `pending_confirmation` is
/// set; it is never set anywhere but index 0.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reservation {
    pub owner: UserId,
    pub ticket: Ticket,
    /// When the user joined the line, or when they were last promoted
    /// to holder.
    pub acquired_at: Instant,
    pub pending_confirmation: bool,
}

impl Reservation {
    pub(crate) fn new(owner: UserId, ticket: u64, now: Instant) -> Self {
        Self {
            owner,
            ticket: Ticket(ticket),
            acquired_at: now,
            pending_confirmation: false,
        }
    }

    /// Time since `acquired_at`. Never negative.
    pub fn held_for(&self, now: Instant) -> Duration {
        now.saturating_duration_since(self.acquired_at)
    }

    pub(crate) fn reset(&mut self, now: Instant) {
        self.acquired_at = now;
    }
}
