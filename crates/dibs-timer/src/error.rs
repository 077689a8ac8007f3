//! Error types for the timer layer.

/// Errors that can occur while setting up a scheduler.
#[derive(Debug, thiserror::Error)]
pub enum TimerError {
    /// [`TokioScheduler::current`](crate::TokioScheduler::current) was
    /// called from a thread that is not inside a tokio runtime.
    #[error("no tokio runtime is running on this thread")]
    NoRuntime,
}
