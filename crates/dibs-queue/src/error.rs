//! Refusals: the ways a queue operation can decline to change anything.

use dibs_protocol::UserId;

/// Why a queue operation left the line untouched.
///
/// None of these are failures. The engine turns each one into a reply
/// for the room; the `Display` text here is what shows up in logs.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Refusal {
    /// The user is already at the head of the line.
    #[error("{0} already holds the baton")]
    AlreadyHolds(UserId),

    /// The user is already waiting further back.
    #[error("{0} is already queued")]
    AlreadyQueued(UserId),

    /// The user has no place in line to give up.
    #[error("{0} is not queued")]
    NotQueued(UserId),

    /// The queue is locked; only status and unlock act on it.
    #[error("the queue is locked")]
    Locked,

    /// The holder tried to steal from themselves.
    #[error("{0} attempted to steal from themselves")]
    SelfSteal(UserId),

    /// Unlock was asked for on a queue that isn't locked.
    #[error("the queue is not locked")]
    NotLocked,

    /// The sole occupant asked to rejoin; there is nobody to yield to.
    #[error("{0} is alone in line")]
    PointlessRejoin(UserId),
}
