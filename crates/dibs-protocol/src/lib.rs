//! Shared vocabulary for dibs.
//!
//! This crate defines the values that cross the boundary between a chat
//! transport and the turn-queue engine:
//!
//! - **Identifiers** ([`UserId`], [`RoomName`]) — who and where.
//! - **Input** ([`ParsedLine`], [`Command`], [`Verb`]) — what was asked.
//! - **Errors** ([`ProtocolError`]) — malformed identifiers or mentions.
//!
//! # Architecture
//!
//! ```text
//! Transport (text) → Protocol (Command) → Engine (response text)
//! ```
//!
//! Nothing here knows about queues or timers.

mod command;
mod error;
mod types;

pub use command::{Command, ParsedLine, Verb};
pub use error::ProtocolError;
pub use types::{parse_mention, RoomName, UserId};
