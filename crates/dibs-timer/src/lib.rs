//! Injectable time for dibs.
//!
//! The turn-queue engine never reads the wall clock or sleeps on its own.
//! It asks a [`Clock`] what time it is and hands delayed work to a
//! [`Scheduler`]. Two implementations of each are provided:
//!
//! - [`TokioClock`] / [`TokioScheduler`] — production. Both read tokio's
//!   time source, so `tokio::time::pause()` drives them together.
//! - [`ManualClock`] / [`ManualScheduler`] — deterministic tests. Time
//!   only moves when [`ManualScheduler::advance`] is called, and due tasks
//!   run synchronously inside that call.
//!
//! # Integration
//!
//! ```ignore
//! let clock = ManualClock::new();
//! let scheduler = ManualScheduler::new(clock.clone());
//! scheduler.after(Duration::from_secs(60), Box::new(|| println!("fired")));
//! scheduler.advance(Duration::from_secs(60)); // prints "fired"
//! ```

mod error;
mod manual;

pub use error::TimerError;
pub use manual::{ManualClock, ManualScheduler};

use std::time::{Duration, Instant};

use tokio::runtime::Handle;
use tracing::{debug, trace};

// ---------------------------------------------------------------------------
// Traits
// ---------------------------------------------------------------------------

/// A unit of delayed work. Runs at most once, on whatever thread the
/// scheduler fires it from.
pub type Task = Box<dyn FnOnce() + Send + 'static>;

/// Source of the current time.
pub trait Clock: Send + Sync + 'static {
    /// Returns the current instant.
    fn now(&self) -> Instant;
}

/// Runs a task once after a delay.
///
/// There is no cancellation. Callers that may be overtaken by events must
/// re-check their own state when the task fires.
pub trait Scheduler: Send + Sync + 'static {
    /// Schedules `task` to run once `delay` has elapsed.
    fn after(&self, delay: Duration, task: Task);
}

// ---------------------------------------------------------------------------
// Tokio implementations
// ---------------------------------------------------------------------------

/// Clock backed by `tokio::time::Instant`.
///
/// Under a paused tokio runtime this follows `tokio::time::advance`, which
/// keeps it consistent with [`TokioScheduler`] in tests.
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioClock;

impl Clock for TokioClock {
    fn now(&self) -> Instant {
        tokio::time::Instant::now().into_std()
    }
}

/// Scheduler that spawns one sleeping task per delayed job.
#[derive(Debug, Clone)]
pub struct TokioScheduler {
    handle: Handle,
}

impl TokioScheduler {
    /// Binds to the runtime the caller is running inside.
    ///
    /// # Errors
    /// [`TimerError::NoRuntime`] when called outside a tokio runtime.
    pub fn current() -> Result<Self, TimerError> {
        let handle = Handle::try_current().map_err(|_| TimerError::NoRuntime)?;
        debug!("tokio scheduler bound to current runtime");
        Ok(Self { handle })
    }

    /// Binds to an explicit runtime handle.
    pub fn with_handle(handle: Handle) -> Self {
        Self { handle }
    }
}

impl Scheduler for TokioScheduler {
    fn after(&self, delay: Duration, task: Task) {
        trace!(delay_ms = delay.as_millis() as u64, "scheduling delayed task");
        self.handle.spawn(async move {
            tokio::time::sleep(delay).await;
            task();
        });
    }
}
