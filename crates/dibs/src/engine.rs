//! `TurnQueueEngine` builder and command surface.
//!
//! This is the entry point for a chat transport. It ties the layers
//! together: protocol (what was asked) → queue (what changed) → text
//! (what to say), and arms grace timers after hand-offs.

use std::sync::Arc;
use std::time::Instant;

use dibs_protocol::{Command, ParsedLine, RoomName, Verb};
use dibs_queue::{
    QueueRegistry, QueueSnapshot, QueueState, Refusal, Rejoined, Released,
    RoomQueue,
};
use dibs_timer::{Clock, Scheduler, TokioClock, TokioScheduler};
use tracing::{debug, info, warn};

use crate::grace::GraceScheduler;
use crate::text::{Responder, Voice};
use crate::{
    Announcement, AnnouncementSender, Decorator, DibsError, EmoticonDecorator,
    EngineConfig,
};

/// Engine state shared by every handle and every grace timer.
pub(crate) struct Shared {
    pub(crate) config: EngineConfig,
    pub(crate) registry: QueueRegistry,
    pub(crate) clock: Arc<dyn Clock>,
    pub(crate) grace: GraceScheduler,
    pub(crate) responder: Responder,
    announcements: Option<AnnouncementSender>,
}

impl Shared {
    /// Publishes a message to a room. Never called with a room lock held.
    pub(crate) fn announce(&self, room: &RoomName, text: String) {
        info!(%room, %text, "announcement");

        let Some(tx) = &self.announcements else {
            return;
        };
        let announcement = Announcement {
            room: room.clone(),
            text,
        };
        if tx.send(announcement).is_err() {
            warn!(%room, "announcement receiver dropped");
        }
    }
}

// ---------------------------------------------------------------------------
// Builder
// ---------------------------------------------------------------------------

/// Builder for a [`TurnQueueEngine`].
///
/// # Example
///
/// ```rust,ignore
/// use dibs::prelude::*;
///
/// let (tx, mut rx) = announcement_channel();
/// let engine = TurnQueueEngine::builder()
///     .config(EngineConfig::from_json_file("dibs.json")?)
///     .announcements(tx)
///     .build()?;
/// ```
pub struct TurnQueueEngineBuilder {
    config: EngineConfig,
    clock: Option<Arc<dyn Clock>>,
    scheduler: Option<Arc<dyn Scheduler>>,
    decorator: Option<Arc<dyn Decorator>>,
    announcements: Option<AnnouncementSender>,
}

impl TurnQueueEngineBuilder {
    /// Creates a new builder with default settings.
    pub fn new() -> Self {
        Self {
            config: EngineConfig::default(),
            clock: None,
            scheduler: None,
            decorator: None,
            announcements: None,
        }
    }

    /// Sets the configuration. It is validated on [`build`](Self::build).
    pub fn config(mut self, config: EngineConfig) -> Self {
        self.config = config;
        self
    }

    /// Sets the clock. Defaults to [`TokioClock`].
    pub fn clock(mut self, clock: impl Clock) -> Self {
        let clock: Arc<dyn Clock> = Arc::new(clock);
        self.clock = Some(clock);
        self
    }

    /// Sets the scheduler for grace timers. Defaults to a
    /// [`TokioScheduler`] on the runtime `build` is called from.
    pub fn scheduler(mut self, scheduler: impl Scheduler) -> Self {
        let scheduler: Arc<dyn Scheduler> = Arc::new(scheduler);
        self.scheduler = Some(scheduler);
        self
    }

    /// Sets the reply decorator. Defaults to an [`EmoticonDecorator`]
    /// built from the config.
    pub fn decorator(mut self, decorator: impl Decorator) -> Self {
        let decorator: Arc<dyn Decorator> = Arc::new(decorator);
        self.decorator = Some(decorator);
        self
    }

    /// Sets where grace-timer announcements go. Without one they are only
    /// logged.
    pub fn announcements(mut self, tx: AnnouncementSender) -> Self {
        self.announcements = Some(tx);
        self
    }

    /// Builds the engine.
    ///
    /// Fails only when no scheduler was given and there is no tokio
    /// runtime to default to.
    pub fn build(self) -> Result<TurnQueueEngine, DibsError> {
        let config = self.config.validated();

        let clock: Arc<dyn Clock> = match self.clock {
            Some(clock) => clock,
            None => Arc::new(TokioClock),
        };
        let scheduler: Arc<dyn Scheduler> = match self.scheduler {
            Some(scheduler) => scheduler,
            None => Arc::new(TokioScheduler::current()?),
        };
        let decorator: Arc<dyn Decorator> = match self.decorator {
            Some(decorator) => decorator,
            None => Arc::new(EmoticonDecorator::from_config(&config)),
        };

        info!(
            bot = %config.bot_name,
            baton = %config.baton_name,
            grace_window_secs = config.grace_window_secs,
            "engine ready"
        );

        let shared = Shared {
            registry: QueueRegistry::new(),
            clock,
            grace: GraceScheduler::new(scheduler, config.grace_window()),
            responder: Responder::new(&config, decorator),
            announcements: self.announcements,
            config,
        };
        Ok(TurnQueueEngine {
            shared: Arc::new(shared),
        })
    }
}

impl Default for TurnQueueEngineBuilder {
    fn default() -> Self {
        Self::new()
    }
}

// ---------------------------------------------------------------------------
// Engine
// ---------------------------------------------------------------------------

/// The turn-queue engine. Cheap to clone; clones share all rooms.
///
/// Commands in different rooms run concurrently. Commands in the same room,
/// and the grace timers for that room, are serialized by the room's lock.
#[derive(Clone)]
pub struct TurnQueueEngine {
    shared: Arc<Shared>,
}

impl TurnQueueEngine {
    /// Creates a new builder.
    pub fn builder() -> TurnQueueEngineBuilder {
        TurnQueueEngineBuilder::new()
    }

    /// The validated configuration in use.
    pub fn config(&self) -> &EngineConfig {
        &self.shared.config
    }

    /// Runs one command and returns the reply for the room.
    ///
    /// Never fails: refusals are replies too. A command against a locked
    /// queue is answered with the queue's status.
    pub fn dispatch(&self, command: &Command) -> String {
        let shared = &self.shared;
        let text = &shared.responder;
        let room = &command.room;
        let voice = Voice {
            target: command.target(),
            proxy: command.proxy(),
        };
        let target = voice.target;

        debug!(
            %room,
            actor = %command.actor,
            user = %target,
            verb = %command.verb,
            "dispatching command"
        );

        let queue = shared.registry.queue(room);
        let now = shared.clock.now();

        let (reply, pending) = {
            let mut q = queue.lock();
            match command.verb {
                Verb::Request => {
                    let result = q.request(target, now);
                    let reply = settle(text, &q, now, &voice, room, result, |o| {
                        text.requested(&voice, &o)
                    });
                    (reply, None)
                }
                Verb::Release => {
                    let result = q.release(target, now);
                    let pending = result
                        .as_ref()
                        .ok()
                        .and_then(Released::pending_handoff)
                        .map(|h| h.ticket);
                    let reply = settle(text, &q, now, &voice, room, result, |o| {
                        text.released(&voice, &o)
                    });
                    (reply, pending)
                }
                Verb::Rejoin => {
                    let result = q.rejoin(target, now);
                    let pending = result
                        .as_ref()
                        .ok()
                        .and_then(Rejoined::pending_handoff)
                        .map(|h| h.ticket);
                    let reply = settle(text, &q, now, &voice, room, result, |o| {
                        text.rejoined(&voice, &o)
                    });
                    (reply, pending)
                }
                Verb::Steal => {
                    let result = q.steal(target, now);
                    let reply = settle(text, &q, now, &voice, room, result, |o| {
                        text.stolen(&voice, &o)
                    });
                    (reply, None)
                }
                Verb::Lock => {
                    let result = q.lock(target, now);
                    let reply =
                        settle(text, &q, now, &voice, room, result, |()| text.locked(&voice));
                    (reply, None)
                }
                Verb::Unlock => {
                    let result = q.unlock(now);
                    let reply = settle(text, &q, now, &voice, room, result, |o| {
                        text.unlocked(&voice, &o)
                    });
                    (reply, None)
                }
                Verb::Status => (text.status(&q.snapshot(now)), None),
                Verb::Help => (text.help(), None),
            }
        };

        if let Some(ticket) = pending {
            shared.grace.arm(shared, room.clone(), ticket);
        }
        reply
    }

    /// Reports who holds the baton and who is waiting.
    pub fn status(&self, room: &RoomName) -> String {
        let now = self.shared.clock.now();
        let snapshot = self.shared.registry.queue(room).lock().snapshot(now);
        self.shared.responder.status(&snapshot)
    }

    /// The command listing.
    pub fn help(&self) -> String {
        self.shared.responder.help()
    }

    /// Handles one chat line from a transport.
    ///
    /// Returns `None` for lines that need no reply: chatter, and anything
    /// the bot said itself.
    pub fn evaluate(&self, line: &ParsedLine) -> Option<String> {
        if line.user.as_str() == self.shared.config.bot_name {
            return None;
        }
        if let Some(reply) = self.shared.responder.mention(line) {
            return Some(reply);
        }
        if !line.is_command() {
            return None;
        }

        match Command::from_line(line) {
            Ok(command) => Some(self.dispatch(&command)),
            Err(e) => {
                debug!(room = %line.room, user = %line.user, error = %e, "unusable command");
                Some(self.help())
            }
        }
    }

    /// The room's current state. Rooms never seen are `Empty`.
    pub fn queue_state(&self, room: &RoomName) -> QueueState {
        self.shared
            .registry
            .get(room)
            .map_or(QueueState::Empty, |q| q.lock().state())
    }

    /// A copy of the room's line as of now.
    pub fn snapshot(&self, room: &RoomName) -> QueueSnapshot {
        let now = self.shared.clock.now();
        self.shared.registry.queue(room).lock().snapshot(now)
    }

    /// Number of rooms that have a queue.
    pub fn room_count(&self) -> usize {
        self.shared.registry.room_count()
    }
}

/// Renders an operation's result, logging refusals.
fn settle<T>(
    text: &Responder,
    queue: &RoomQueue,
    now: Instant,
    voice: &Voice<'_>,
    room: &RoomName,
    result: Result<T, Refusal>,
    render: impl FnOnce(T) -> String,
) -> String {
    match result {
        Ok(outcome) => render(outcome),
        Err(refusal) => {
            debug!(%room, user = %voice.target, %refusal, "command refused");
            text.refusal(voice, &refusal, &queue.snapshot(now))
        }
    }
}
