//! Grace timers: the confirm-or-forfeit step after a hand-off.
//!
//! A timer is armed once per pending promotion and bound to the promoted
//! reservation's [`Ticket`]. Timers are never cancelled. When one fires it
//! takes the room's lock like any command and lets
//! [`RoomQueue::expire_grace`](dibs_queue::RoomQueue::expire_grace) decide
//! whether it still applies.

use std::sync::Arc;
use std::time::Duration;

use dibs_protocol::RoomName;
use dibs_queue::{GraceOutcome, Ticket};
use dibs_timer::Scheduler;
use tracing::{debug, trace};

use crate::engine::Shared;

pub(crate) struct GraceScheduler {
    scheduler: Arc<dyn Scheduler>,
    window: Duration,
}

impl GraceScheduler {
    pub(crate) fn new(scheduler: Arc<dyn Scheduler>, window: Duration) -> Self {
        Self { scheduler, window }
    }

    /// Schedules the expiry check for `ticket` one window from now.
    ///
    /// Must not be called with the room's lock held. The task only keeps a
    /// weak handle, so a dropped engine turns it into a no-op.
    pub(crate) fn arm(&self, shared: &Arc<Shared>, room: RoomName, ticket: Ticket) {
        trace!(%room, %ticket, window_secs = self.window.as_secs(), "arming grace timer");

        let engine = Arc::downgrade(shared);
        self.scheduler.after(
            self.window,
            Box::new(move || match engine.upgrade() {
                Some(shared) => fire(&shared, &room, ticket),
                None => trace!(%room, %ticket, "engine gone, grace timer dropped"),
            }),
        );
    }
}

fn fire(shared: &Arc<Shared>, room: &RoomName, ticket: Ticket) {
    let now = shared.clock.now();
    let outcome = shared.registry.queue(room).lock().expire_grace(ticket, now);

    if let GraceOutcome::Forfeited { handoff, .. } = &outcome {
        if handoff.needs_confirmation {
            shared.grace.arm(shared, room.clone(), handoff.ticket);
        }
    }

    match shared.responder.grace(&outcome) {
        Some(text) => shared.announce(room, text),
        None => debug!(%room, %ticket, "stale grace timer ignored"),
    }
}
