//! The per-room line and every transition on it.
//!
//! `RoomQueue` is plain data with no locking and no clock of its own: the
//! caller passes `now` into every operation and is responsible for holding
//! the room's exclusive section (see [`QueueRegistry`](crate::QueueRegistry)).
//! Operations return structured outcomes; turning them into chat text is
//! the engine's job.

use std::time::{Duration, Instant};

use dibs_protocol::UserId;

use crate::{QueueState, Refusal, Reservation, Ticket};

// ---------------------------------------------------------------------------
// Outcomes
// ---------------------------------------------------------------------------

/// Result of a successful request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Requested {
    /// The line was empty; the user holds the baton now.
    Granted,
    /// The user was the pending holder and has now confirmed.
    Confirmed,
    /// The user joined the back of the line.
    Queued {
        /// Whoever was last in line before them.
        after: UserId,
        holder: UserId,
    },
}

/// The head of the line changed hands to `next`.
///
/// When `needs_confirmation` is set, `next` is pending and the caller must
/// arm a grace timer bound to `ticket`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Handoff {
    pub next: UserId,
    pub ticket: Ticket,
    pub needs_confirmation: bool,
}

/// Result of a successful release.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Released {
    /// A waiter left the line; the holder is unaffected.
    Withdrew,
    /// The holder left and nobody was waiting.
    Vacated { held_for: Duration },
    /// The holder left and the next in line was promoted.
    HandedOff { held_for: Duration, handoff: Handoff },
}

impl Released {
    /// The hand-off that needs a grace timer, if any.
    pub fn pending_handoff(&self) -> Option<&Handoff> {
        match self {
            Self::HandedOff { handoff, .. } if handoff.needs_confirmation => {
                Some(handoff)
            }
            _ => None,
        }
    }
}

/// Result of a successful rejoin.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Rejoined {
    /// The user gave up their place and went to the back.
    Requeued { released: Released, requested: Requested },
    /// The user wasn't in line, so this was a plain request.
    Joined(Requested),
}

impl Rejoined {
    /// The hand-off that needs a grace timer, if any.
    pub fn pending_handoff(&self) -> Option<&Handoff> {
        match self {
            Self::Requeued { released, .. } => released.pending_handoff(),
            Self::Joined(_) => None,
        }
    }
}

/// Result of a successful steal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Stolen {
    /// Nobody held the baton; this was a plain request.
    Uncontested(Requested),
    /// The holder was dispossessed.
    Taken {
        from: UserId,
        held_for: Duration,
        /// The new second in line, if anyone is waiting.
        ahead_of: Option<UserId>,
    },
}

/// Result of a successful unlock.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Unlocked {
    pub holder: Option<UserId>,
    pub locked_for: Duration,
}

/// What a grace timer did when it fired.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GraceOutcome {
    /// The reservation it was armed for is no longer a pending head.
    Stale,
    /// The pending holder had nobody left to yield to and keeps the baton.
    Confirmed { holder: UserId },
    /// The pending holder went to the back and `handoff.next` was promoted.
    Forfeited { forfeited: UserId, handoff: Handoff },
}

/// One line entry as seen by a status report.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SnapshotEntry {
    pub user: UserId,
    /// How long the holder has held it, or how long a waiter has waited.
    pub duration: Duration,
    pub pending: bool,
}

/// A read-only copy of a queue at one instant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueueSnapshot {
    pub locked: bool,
    pub entries: Vec<SnapshotEntry>,
}

impl QueueSnapshot {
    /// The holder's entry, if the line is non-empty.
    pub fn holder(&self) -> Option<&SnapshotEntry> {
        self.entries.first()
    }

    /// Everyone after the holder, in order.
    pub fn waiters(&self) -> &[SnapshotEntry] {
        self.entries.get(1..).unwrap_or(&[])
    }
}

// ---------------------------------------------------------------------------
// RoomQueue
// ---------------------------------------------------------------------------

/// The ordered line for a single room, plus its lock flag.
///
/// Invariants, upheld by every operation:
/// - a user appears at most once in `line`;
/// - only index 0 may have `pending_confirmation` set;
/// - when `locked`, the line holds at most one reservation.
#[derive(Debug, Default)]
pub struct RoomQueue {
    line: Vec<Reservation>,
    locked: bool,
    next_ticket: u64,
}

impl RoomQueue {
    /// Creates an empty, unlocked queue.
    pub fn new() -> Self {
        Self::default()
    }

    /// The derived state-machine state.
    pub fn state(&self) -> QueueState {
        match self.line.first() {
            None => QueueState::Empty,
            Some(head) if self.locked => QueueState::Locked(head.owner.clone()),
            Some(head) if head.pending_confirmation => {
                QueueState::PendingHandoff(head.owner.clone())
            }
            Some(head) => QueueState::Held(head.owner.clone()),
        }
    }

    /// The full line, holder first.
    pub fn line(&self) -> &[Reservation] {
        &self.line
    }

    /// The holder's reservation, if any.
    pub fn holder(&self) -> Option<&Reservation> {
        self.line.first()
    }

    pub fn is_locked(&self) -> bool {
        self.locked
    }

    pub fn len(&self) -> usize {
        self.line.len()
    }

    pub fn is_empty(&self) -> bool {
        self.line.is_empty()
    }

    /// Zero-based position of `user` in line (0 = holder).
    pub fn position(&self, user: &UserId) -> Option<usize> {
        self.line.iter().position(|r| r.owner == *user)
    }

    // -- Transitions ------------------------------------------------------

    /// Claims the baton for `user`, or joins the back of the line.
    ///
    /// Requesting as the pending holder is how a promoted user confirms.
    pub fn request(
        &mut self,
        user: &UserId,
        now: Instant,
    ) -> Result<Requested, Refusal> {
        if self.locked {
            return Err(Refusal::Locked);
        }

        match self.position(user) {
            Some(0) => {
                let head = &mut self.line[0];
                if head.pending_confirmation {
                    head.pending_confirmation = false;
                    tracing::info!(%user, "pending holder confirmed");
                    Ok(Requested::Confirmed)
                } else {
                    Err(Refusal::AlreadyHolds(user.clone()))
                }
            }
            Some(_) => Err(Refusal::AlreadyQueued(user.clone())),
            None => {
                let reservation = self.reserve(user.clone(), now);
                self.line.push(reservation);

                if self.line.len() == 1 {
                    tracing::info!(%user, "baton granted");
                    return Ok(Requested::Granted);
                }

                let after = self.line[self.line.len() - 2].owner.clone();
                let holder = self.line[0].owner.clone();
                tracing::info!(
                    %user,
                    position = self.line.len() - 1,
                    "user queued"
                );
                Ok(Requested::Queued { after, holder })
            }
        }
    }

    /// Removes `user` from the line, promoting the next user if they held it.
    ///
    /// A promoted user only enters the grace window when somebody is
    /// waiting behind them; otherwise they are confirmed on the spot.
    pub fn release(
        &mut self,
        user: &UserId,
        now: Instant,
    ) -> Result<Released, Refusal> {
        if self.locked {
            return Err(Refusal::Locked);
        }

        let index = self
            .position(user)
            .ok_or_else(|| Refusal::NotQueued(user.clone()))?;
        let removed = self.line.remove(index);

        if index != 0 {
            tracing::info!(%user, "waiter withdrew");
            return Ok(Released::Withdrew);
        }

        let held_for = removed.held_for(now);
        if self.line.is_empty() {
            tracing::info!(%user, "baton released, queue empty");
            return Ok(Released::Vacated { held_for });
        }

        let handoff = self.promote_head(now, self.line.len() > 1);
        tracing::info!(
            %user,
            next = %handoff.next,
            pending = handoff.needs_confirmation,
            "baton handed off"
        );
        Ok(Released::HandedOff { held_for, handoff })
    }

    /// Gives up the user's place and requests again at the back.
    pub fn rejoin(
        &mut self,
        user: &UserId,
        now: Instant,
    ) -> Result<Rejoined, Refusal> {
        if self.locked {
            return Err(Refusal::Locked);
        }

        if self.position(user).is_none() {
            return self.request(user, now).map(Rejoined::Joined);
        }

        if self.line.len() == 1 {
            return Err(Refusal::PointlessRejoin(user.clone()));
        }

        let released = self.release(user, now)?;
        let requested = self.request(user, now)?;
        Ok(Rejoined::Requeued { released, requested })
    }

    /// Takes the baton from the current holder, skipping the grace window.
    ///
    /// The dispossessed holder leaves the line entirely. If the thief was
    /// already waiting, their existing reservation moves to the front.
    pub fn steal(
        &mut self,
        user: &UserId,
        now: Instant,
    ) -> Result<Stolen, Refusal> {
        if self.locked {
            return Err(Refusal::Locked);
        }

        if self.line.is_empty() {
            return self.request(user, now).map(Stolen::Uncontested);
        }

        if self.line[0].owner == *user {
            return Err(Refusal::SelfSteal(user.clone()));
        }

        let victim = self.line.remove(0);

        let mut reservation = match self.position(user) {
            Some(index) => self.line.remove(index),
            None => self.reserve(user.clone(), now),
        };
        reservation.reset(now);
        reservation.pending_confirmation = false;
        self.line.insert(0, reservation);

        let ahead_of = self.line.get(1).map(|r| r.owner.clone());
        tracing::info!(%user, from = %victim.owner, "baton stolen");

        Ok(Stolen::Taken {
            from: victim.owner.clone(),
            held_for: victim.held_for(now),
            ahead_of,
        })
    }

    /// Clears the line and freezes the baton to `user`.
    pub fn lock(&mut self, user: &UserId, now: Instant) -> Result<(), Refusal> {
        if self.locked {
            return Err(Refusal::Locked);
        }

        self.line.clear();
        self.request(user, now)?;
        self.locked = true;
        tracing::info!(%user, "queue locked");
        Ok(())
    }

    /// Lifts the lock and clears the line. The lock holder is not re-queued.
    pub fn unlock(&mut self, now: Instant) -> Result<Unlocked, Refusal> {
        if !self.locked {
            return Err(Refusal::NotLocked);
        }

        let holder = self.line.first();
        let unlocked = Unlocked {
            holder: holder.map(|r| r.owner.clone()),
            locked_for: holder.map(|r| r.held_for(now)).unwrap_or_default(),
        };

        self.line.clear();
        self.locked = false;
        tracing::info!(holder = ?unlocked.holder, "queue unlocked");
        Ok(unlocked)
    }

    /// Resolves a grace window that ran out for the reservation `ticket`.
    ///
    /// Only acts if that reservation is still the pending head. With others
    /// waiting it is moved to the back and the new head promoted; the new
    /// head gets its own window only if somebody other than the forfeiting
    /// user is behind it.
    pub fn expire_grace(&mut self, ticket: Ticket, now: Instant) -> GraceOutcome {
        let still_pending = self
            .line
            .first()
            .is_some_and(|h| h.ticket == ticket && h.pending_confirmation);
        if self.locked || !still_pending {
            return GraceOutcome::Stale;
        }

        if self.line.len() == 1 {
            let head = &mut self.line[0];
            head.pending_confirmation = false;
            tracing::info!(user = %head.owner, "grace expired, holder kept baton");
            return GraceOutcome::Confirmed {
                holder: head.owner.clone(),
            };
        }

        let mut forfeited = self.line.remove(0);
        forfeited.pending_confirmation = false;
        forfeited.reset(now);
        let others_waiting = self.line.len() > 1;
        self.line.push(forfeited);

        let handoff = self.promote_head(now, others_waiting);
        let forfeited = self.line[self.line.len() - 1].owner.clone();
        tracing::info!(
            user = %forfeited,
            next = %handoff.next,
            pending = handoff.needs_confirmation,
            "grace expired, turn forfeited"
        );
        GraceOutcome::Forfeited { forfeited, handoff }
    }

    /// A read-only copy for status reporting.
    pub fn snapshot(&self, now: Instant) -> QueueSnapshot {
        QueueSnapshot {
            locked: self.locked,
            entries: self
                .line
                .iter()
                .map(|r| SnapshotEntry {
                    user: r.owner.clone(),
                    duration: r.held_for(now),
                    pending: r.pending_confirmation,
                })
                .collect(),
        }
    }

    // -- Internals --------------------------------------------------------

    fn reserve(&mut self, user: UserId, now: Instant) -> Reservation {
        self.next_ticket += 1;
        Reservation::new(user, self.next_ticket, now)
    }

    /// Restarts the head's clock and marks it pending if asked.
    /// The line must be non-empty.
    fn promote_head(&mut self, now: Instant, pending: bool) -> Handoff {
        let head = &mut self.line[0];
        head.reset(now);
        head.pending_confirmation = pending;
        Handoff {
            next: head.owner.clone(),
            ticket: head.ticket,
            needs_confirmation: pending,
        }
    }
}

// =========================================================================
// Tests
// =========================================================================
