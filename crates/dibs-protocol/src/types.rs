//! Identity types shared by every dibs crate.
//!
//! Chat transports identify people and rooms with strings (nicknames,
//! mention handles, room JIDs). These newtypes keep the two apart so a
//! room name can never be passed where a user is expected.

use serde::{Deserialize, Serialize};

use std::fmt;

use crate::ProtocolError;

// ---------------------------------------------------------------------------
// Identity types
// ---------------------------------------------------------------------------

/// A stable user identifier, as resolved by the chat directory.
///
/// This is the name people are mentioned by (`@alice`), without the
/// leading `@`. A user appears at most once in any room's line.
///
/// `#[serde(transparent)]` serializes `UserId("alice")` as plain `"alice"`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(String);

impl UserId {
    /// Creates a user id, rejecting empty or whitespace-only names.
    pub fn new(name: impl Into<String>) -> Result<Self, ProtocolError> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(ProtocolError::EmptyIdentifier("user"));
        }
        Ok(Self(name))
    }

    /// Returns the id as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Identifies one chat room. Each room has its own independent line.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RoomName(String);

impl RoomName {
    /// Creates a room name, rejecting empty or whitespace-only names.
    pub fn new(name: impl Into<String>) -> Result<Self, ProtocolError> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(ProtocolError::EmptyIdentifier("room"));
        }
        Ok(Self(name))
    }

    /// Returns the name as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RoomName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Parses a single command argument as an `@mention`.
///
/// - `"@bob"` → `Ok(Some(bob))`
/// - `"bob"` → `Ok(None)` (not a mention)
/// - `"@"` → `Err(InvalidMention)`
pub fn parse_mention(arg: &str) -> Result<Option<UserId>, ProtocolError> {
    let Some(name) = arg.strip_prefix('@') else {
        return Ok(None);
    };
    UserId::new(name)
        .map(Some)
        .map_err(|_| ProtocolError::InvalidMention(arg.to_string()))
}

// =========================================================================
// Tests
// =========================================================================
