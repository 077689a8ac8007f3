//! Unified error type for the dibs engine.

use dibs_protocol::ProtocolError;
use dibs_timer::TimerError;

/// Top-level error that wraps all crate-specific errors.
///
/// Only setup can fail: building the engine, loading configuration and
/// installing logging. Command handling never does; a refused command is
/// rendered as a reply instead.
#[derive(Debug, thiserror::Error)]
pub enum DibsError {
    /// A protocol-level error (empty identifier, bad mention).
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    /// No scheduler was supplied and none could be derived.
    #[error(transparent)]
    Timer(#[from] TimerError),

    /// Reading a config file failed.
    #[error("failed to read config: {0}")]
    Io(#[from] std::io::Error),

    /// A config file did not parse.
    #[cfg(feature = "json")]
    #[error("invalid config: {0}")]
    Config(#[from] serde_json::Error),

    /// A global tracing subscriber was already installed.
    #[error("failed to initialize logging: {0}")]
    Logging(String),
}
