//! Hand-cranked clock and scheduler for deterministic tests.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

use tracing::trace;

use crate::{Clock, Scheduler, Task};

// ---------------------------------------------------------------------------
// ManualClock
// ---------------------------------------------------------------------------

/// A clock that only moves when told to. Clones share the same time.
#[derive(Debug, Clone)]
pub struct ManualClock {
    now: Arc<Mutex<Instant>>,
}

impl ManualClock {
    /// Creates a clock frozen at the real current instant.
    pub fn new() -> Self {
        Self {
            now: Arc::new(Mutex::new(Instant::now())),
        }
    }

    /// Moves the clock forward. No scheduled tasks run; use
    /// [`ManualScheduler::advance`] for that.
    pub fn advance(&self, by: Duration) {
        let mut now = lock(&self.now);
        *now += by;
    }

    /// Moves the clock to `to` if that is later than the current time.
    fn advance_to(&self, to: Instant) {
        let mut now = lock(&self.now);
        if to > *now {
            *now = to;
        }
    }
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Instant {
        *lock(&self.now)
    }
}

// ---------------------------------------------------------------------------
// ManualScheduler
// ---------------------------------------------------------------------------

struct Pending {
    due: Instant,
    seq: u64,
    task: Task,
}

/// A scheduler whose tasks run only inside [`advance`](Self::advance).
///
/// Tasks fire in due order (ties in scheduling order), and the shared
/// [`ManualClock`] reads each task's due time while it runs. Tasks may
/// schedule further tasks; those fire in the same `advance` call if they
/// fall due before its end.
#[derive(Clone)]
pub struct ManualScheduler {
    clock: ManualClock,
    pending: Arc<Mutex<Vec<Pending>>>,
    next_seq: Arc<AtomicU64>,
}

impl ManualScheduler {
    /// Creates a scheduler driven by `clock`.
    pub fn new(clock: ManualClock) -> Self {
        Self {
            clock,
            pending: Arc::new(Mutex::new(Vec::new())),
            next_seq: Arc::new(AtomicU64::new(0)),
        }
    }

    /// The clock this scheduler reads and moves.
    pub fn clock(&self) -> &ManualClock {
        &self.clock
    }

    /// Moves time forward by `by`, running every task that falls due.
    ///
    /// Returns the number of tasks run.
    pub fn advance(&self, by: Duration) -> usize {
        let target = self.clock.now() + by;
        let mut ran = 0;

        // The pending list is never locked while a task runs, since tasks
        // are free to call `after` again.
        while let Some(next) = self.take_next_due(target) {
            self.clock.advance_to(next.due);
            trace!(seq = next.seq, "running manual task");
            (next.task)();
            ran += 1;
        }

        self.clock.advance_to(target);
        ran
    }

    /// Runs the tasks that are already due without moving time.
    pub fn run_due(&self) -> usize {
        self.advance(Duration::ZERO)
    }

    /// Number of tasks waiting to fire.
    pub fn pending(&self) -> usize {
        lock(&self.pending).len()
    }

    fn take_next_due(&self, limit: Instant) -> Option<Pending> {
        let mut pending = lock(&self.pending);
        let index = pending
            .iter()
            .enumerate()
            .filter(|(_, p)| p.due <= limit)
            .min_by_key(|(_, p)| (p.due, p.seq))
            .map(|(i, _)| i)?;
        Some(pending.swap_remove(index))
    }
}

impl Scheduler for ManualScheduler {
    fn after(&self, delay: Duration, task: Task) {
        let seq = self.next_seq.fetch_add(1, Ordering::Relaxed);
        let due = self.clock.now() + delay;
        lock(&self.pending).push(Pending { due, seq, task });
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
