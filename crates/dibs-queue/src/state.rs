//! The observable state of a room's queue.

use std::fmt;

use dibs_protocol::UserId;

/// Where a room's queue stands, derived from its line and lock flag.
///
/// ```text
///            request          release (new head has followers)
///   Empty ───────────→ Held ───────────────────────────→ PendingHandoff
///     ↑                 │  ↑                                   │
///     │ release (alone) │  └──── request / grace expiry ───────┘
///     └─────────────────┘
///
///   any ── lock ──→ Locked ── unlock ──→ Empty
/// ```
///
/// - **Empty**: nobody holds the baton.
/// - **Held**: the head of the line holds it, confirmed.
/// - **PendingHandoff**: the head was just promoted and has not yet
///   reconfirmed; a grace timer will bypass them if they stay silent.
/// - **Locked**: frozen to one holder until unlocked.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueueState {
    Empty,
    Held(UserId),
    PendingHandoff(UserId),
    Locked(UserId),
}

impl QueueState {
    /// The current holder, if any.
    pub fn holder(&self) -> Option<&UserId> {
        match self {
            Self::Empty => None,
            Self::Held(u) | Self::PendingHandoff(u) | Self::Locked(u) => Some(u),
        }
    }

    /// Returns `true` if membership-changing commands are accepted.
    pub fn accepts_changes(&self) -> bool {
        !matches!(self, Self::Locked(_))
    }
}

impl fmt::Display for QueueState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Empty => write!(f, "Empty"),
            Self::Held(u) => write!(f, "Held({u})"),
            Self::PendingHandoff(u) => write!(f, "PendingHandoff({u})"),
            Self::Locked(u) => write!(f, "Locked({u})"),
        }
    }
}
