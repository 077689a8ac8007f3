//! Turns queue outcomes into chat replies.
//!
//! Every line here is plain text meant for a chat room. `@name` pings the
//! user; a bare name mentions them quietly.

use std::fmt::Write;
use std::sync::Arc;
use std::time::Duration;

use dibs_protocol::{ParsedLine, UserId};
use dibs_queue::{
    GraceOutcome, Handoff, QueueSnapshot, Refusal, Rejoined, Released,
    Requested, Stolen, Unlocked,
};

use crate::{Decorator, EngineConfig};

/// Formats a duration as `HH:MM:SS`. Hours are not wrapped at a day.
pub fn format_duration(duration: Duration) -> String {
    let secs = duration.as_secs();
    format!("{:02}:{:02}:{:02}", secs / 3600, secs / 60 % 60, secs % 60)
}

/// Who a command is for, and who issued it if that was somebody else.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Voice<'a> {
    pub(crate) target: &'a UserId,
    pub(crate) proxy: Option<&'a UserId>,
}

impl Voice<'_> {
    /// Whoever actually typed the command.
    fn speaker(&self) -> &UserId {
        self.proxy.unwrap_or(self.target)
    }
}

/// Renders replies for one engine.
pub(crate) struct Responder {
    bot: String,
    baton: String,
    grace_secs: u64,
    hog_threshold: Duration,
    decorator: Arc<dyn Decorator>,
}

impl Responder {
    pub(crate) fn new(config: &EngineConfig, decorator: Arc<dyn Decorator>) -> Self {
        Self {
            bot: config.bot_name.clone(),
            baton: config.baton_name.clone(),
            grace_secs: config.grace_window_secs,
            hog_threshold: config.hog_threshold(),
            decorator,
        }
    }

    // -- Command replies --------------------------------------------------

    pub(crate) fn requested(&self, voice: &Voice<'_>, outcome: &Requested) -> String {
        let b = &self.baton;
        let user = voice.target;
        match (outcome, voice.proxy) {
            (Requested::Granted, None) => {
                self.cheer(format!("{user} the {b} is yours!"))
            }
            (Requested::Granted, Some(proxy)) => {
                self.cheer(format!("{proxy} hands the {b} to @{user}!"))
            }
            (Requested::Confirmed, None) => format!("{user} claims the {b}"),
            (Requested::Confirmed, Some(proxy)) => {
                format!("{proxy} claims the {b} for @{user}")
            }
            (Requested::Queued { after, holder }, None) => {
                format!("{user} calls (dibs) on the {b} after {after}... fyi @{holder}")
            }
            (Requested::Queued { after, holder }, Some(proxy)) => format!(
                "{proxy} calls (dibs) on the {b} for @{user} after {after}... fyi @{holder}"
            ),
        }
    }

    pub(crate) fn released(&self, voice: &Voice<'_>, outcome: &Released) -> String {
        let b = &self.baton;
        let user = voice.target;
        let vacated = |held_for: &Duration| {
            let held = format_duration(*held_for);
            match voice.proxy {
                None => format!("{user} releases the {b} after {held}."),
                Some(proxy) => format!("{proxy} releases the {b} for @{user} after {held}."),
            }
        };

        match outcome {
            Released::Withdrew => match voice.proxy {
                None => format!("{user} rescinds dibs on the {b}"),
                Some(proxy) => format!("{proxy} rescinds dibs for @{user} on the {b}"),
            },
            Released::Vacated { held_for } => vacated(held_for),
            Released::HandedOff { held_for, handoff } => {
                format!("{}\n{}", vacated(held_for), self.handoff(handoff))
            }
        }
    }

    pub(crate) fn rejoined(&self, voice: &Voice<'_>, outcome: &Rejoined) -> String {
        match outcome {
            Rejoined::Requeued { released, requested } => format!(
                "{}\n{}",
                self.released(voice, released),
                self.requested(voice, requested)
            ),
            Rejoined::Joined(requested) => self.requested(voice, requested),
        }
    }

    pub(crate) fn stolen(&self, voice: &Voice<'_>, outcome: &Stolen) -> String {
        let b = &self.baton;
        let user = voice.target;
        let (from, ahead_of) = match outcome {
            Stolen::Uncontested(requested) => return self.requested(voice, requested),
            Stolen::Taken { from, ahead_of, .. } => (from, ahead_of),
        };

        let text = match (ahead_of, voice.proxy) {
            (Some(next), None) => format!(
                "{user} stole the {b} from @{from} and jumped the line in front of @{next}! srsly?"
            ),
            (Some(next), Some(proxy)) => format!(
                "{proxy} stole the {b} from @{from} for @{user} ahead of @{next}! srsly?"
            ),
            (None, None) => format!("{user} stole the {b} from @{from}!"),
            (None, Some(proxy)) => format!("{proxy} stole the {b} from @{from} for @{user}!"),
        };
        self.jeer(text)
    }

    pub(crate) fn locked(&self, voice: &Voice<'_>) -> String {
        let b = &self.baton;
        let user = voice.target;
        let text = match voice.proxy {
            None => format!("@all {user} has locked the {b}!"),
            Some(proxy) => format!("@all {proxy} has locked the {b} for @{user}!"),
        };
        self.jeer(text)
    }

    pub(crate) fn unlocked(&self, voice: &Voice<'_>, outcome: &Unlocked) -> String {
        self.cheer(format!(
            "@all {} has unlocked the {} after {}!",
            voice.speaker(),
            self.baton,
            format_duration(outcome.locked_for)
        ))
    }

    /// Explains why nothing happened. A locked queue answers with its status.
    pub(crate) fn refusal(
        &self,
        voice: &Voice<'_>,
        refusal: &Refusal,
        snapshot: &QueueSnapshot,
    ) -> String {
        let b = &self.baton;
        match refusal {
            Refusal::Locked => self.status(snapshot),
            Refusal::AlreadyHolds(user) => format!("{user} already has the {b} (pokerface)"),
            Refusal::AlreadyQueued(user) => format!("{user} is already queued for the {b}"),
            Refusal::NotQueued(user) => format!("{user} is not queued for the {b}"),
            Refusal::SelfSteal(user) => match voice.proxy {
                None => format!("{user} inexplicably attempts to steal the {b} from {user} (derp)"),
                Some(proxy) => format!(
                    "{proxy} inexplicably attempts to steal the {b} from {user} for {user} (derp)"
                ),
            },
            Refusal::NotLocked => format!("The {b} is not locked. (pokerface)"),
            Refusal::PointlessRejoin(user) => {
                format!("{user} is giving up the {b} for {user} (pokerface)")
            }
        }
    }

    pub(crate) fn status(&self, snapshot: &QueueSnapshot) -> String {
        let b = &self.baton;
        let Some(holder) = snapshot.holder() else {
            return format!("The {b} queue is empty");
        };
        let held = format_duration(holder.duration);

        if snapshot.locked {
            return format!("{} has had the {b} locked for {held}", holder.user);
        }

        let mut out = if holder.duration > self.hog_threshold {
            format!("{} has been hogging the {b} for {held}", holder.user)
        } else {
            format!("{} has had the {b} for {held}", holder.user)
        };
        if holder.pending {
            out.push_str(" (waiting for them to call dibs again)");
        }
        for waiter in snapshot.waiters() {
            let _ = write!(
                out,
                "\n... followed by {}, waiting for {}",
                waiter.user,
                format_duration(waiter.duration)
            );
        }
        out
    }

    pub(crate) fn help(&self) -> String {
        let b = &self.baton;
        [
            format!("{} at your service! I know the following commands:", self.bot),
            format!("!dibs (or !+) : call dibs on the {b}"),
            "!dibs @mention: call dibs for @mention".to_string(),
            format!("!release (or !-) : give up the {b} or rescind a dibs"),
            "!release @mention: rescind a dibs for @mention".to_string(),
            "!redibs (or !-+) : combined release and dibs as a courtesy".to_string(),
            format!("!steal (or !$) : take the {b} from the current owner"),
            format!("!steal @mention: steal the {b} for @mention"),
            format!("!lock (or !@+) : lock the {b} preventing anyone else from calling dibs"),
            format!("!lock @mention: lock the {b} for @mention"),
            format!("!unlock (or !@-) : unlock the {b}"),
            "!status (or !?) : get the current queue status".to_string(),
            "!help : this message".to_string(),
        ]
        .join("\n")
    }

    /// Answers a line that names the bot, or `None` if it doesn't.
    pub(crate) fn mention(&self, line: &ParsedLine) -> Option<String> {
        if self.bot.is_empty() || !line.raw.contains(self.bot.as_str()) {
            return None;
        }
        if line.raw.starts_with("/me") {
            return Some(line.raw.replace(self.bot.as_str(), line.user.as_str()));
        }
        Some(format!("Hi @{}", line.user))
    }

    // -- Grace timer announcements ----------------------------------------

    /// `None` for a stale firing, which stays silent.
    pub(crate) fn grace(&self, outcome: &GraceOutcome) -> Option<String> {
        match outcome {
            GraceOutcome::Stale => None,
            GraceOutcome::Confirmed { holder } => {
                Some(self.cheer(format!("@{holder} the {} is yours!", self.baton)))
            }
            GraceOutcome::Forfeited { forfeited, handoff } => Some(format!(
                "{forfeited} didn't call dibs within {} seconds and goes to the back of the line.\n{}",
                self.grace_secs,
                self.handoff(handoff)
            )),
        }
    }

    // -- Helpers ----------------------------------------------------------

    fn handoff(&self, handoff: &Handoff) -> String {
        let next = &handoff.next;
        let b = &self.baton;
        if handoff.needs_confirmation {
            self.cheer(format!(
                "@{next} the {b} is yours if you call dibs again within {} seconds!",
                self.grace_secs
            ))
        } else {
            self.cheer(format!("@{next} the {b} is yours!"))
        }
    }

    fn cheer(&self, text: String) -> String {
        with_flourish(text, self.decorator.cheer())
    }

    fn jeer(&self, text: String) -> String {
        with_flourish(text, self.decorator.jeer())
    }
}

fn with_flourish(mut text: String, flourish: String) -> String {
    if !flourish.is_empty() {
        text.push(' ');
        text.push_str(&flourish);
    }
    text
}
