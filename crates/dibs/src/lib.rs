//! # dibs
//!
//! Turn-taking for chat rooms: one baton per room, a fair line of people
//! waiting for it, and a grace period for whoever it is handed to.
//!
//! A transport tokenizes chat lines into [`ParsedLine`]s or [`Command`]s and
//! hands them to a [`TurnQueueEngine`], which answers with the text to post.
//! Grace-timer results arrive separately as [`Announcement`]s.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use dibs::prelude::*;
//!
//! # #[tokio::main]
//! # async fn main() -> Result<(), DibsError> {
//! let (tx, mut announcements) = announcement_channel();
//! let engine = TurnQueueEngine::builder().announcements(tx).build()?;
//!
//! let room = RoomName::new("ops")?;
//! let alice = UserId::new("alice")?;
//! println!("{}", engine.dispatch(&Command::new(room, alice, Verb::Request)));
//!
//! while let Some(a) = announcements.recv().await {
//!     println!("[{}] {}", a.room, a.text);
//! }
//! # Ok(())
//! # }
//! ```

mod announce;
mod config;
mod decorate;
mod engine;
mod error;
mod grace;
pub mod logging;
mod text;

pub use announce::{
    announcement_channel, Announcement, AnnouncementReceiver, AnnouncementSender,
};
pub use config::EngineConfig;
pub use decorate::{Decorator, EmoticonDecorator, PlainDecorator};
pub use engine::{TurnQueueEngine, TurnQueueEngineBuilder};
pub use error::DibsError;
pub use text::format_duration;

pub use dibs_protocol::{Command, ParsedLine, ProtocolError, RoomName, UserId, Verb};
pub use dibs_queue::{QueueSnapshot, QueueState, Refusal};
pub use dibs_timer::{
    Clock, ManualClock, ManualScheduler, Scheduler, TimerError, TokioClock, TokioScheduler,
};

/// Everything a transport needs, in one import.
pub mod prelude {
    pub use crate::{
        announcement_channel, Announcement, AnnouncementReceiver, AnnouncementSender, Command,
        DibsError, EngineConfig, ParsedLine, RoomName, TurnQueueEngine, UserId, Verb,
    };
}
