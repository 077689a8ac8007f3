//! Parsed chat input: command verbs, tokenized lines, and commands.
//!
//! Tokenizing raw chat text is the transport's job. What arrives here is
//! already split into a command word and arguments ([`ParsedLine`]); this
//! module turns that into a [`Command`] the engine can act on.

use serde::{Deserialize, Serialize};

use std::fmt;

use crate::{parse_mention, ProtocolError, RoomName, UserId};

// ---------------------------------------------------------------------------
// Verb
// ---------------------------------------------------------------------------

/// What a command asks the engine to do.
///
/// Every word maps to some verb: anything unrecognized is [`Verb::Help`],
/// so parsing never fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Verb {
    /// Join the line, or claim the baton outright if nobody holds it.
    Request,
    /// Give up the baton or leave the line.
    Release,
    /// Release and immediately request again (go to the back).
    Rejoin,
    /// Take the baton from the current holder.
    Steal,
    /// Freeze the baton to one holder.
    Lock,
    /// Lift a lock and clear the line.
    Unlock,
    /// Report who holds the baton and who is waiting.
    Status,
    /// List the commands.
    Help,
}

impl Verb {
    /// Maps a command word (case-insensitive) to its verb.
    ///
    /// ```text
    /// dibs  +   request  → Request      steal  $   → Steal
    /// release cancel -   → Release      lock   @+  → Lock
    /// redibs -+  rejoin  → Rejoin       unlock @-  → Unlock
    /// status ?           → Status       anything else → Help
    /// ```
    pub fn parse(word: &str) -> Self {
        match word.to_lowercase().as_str() {
            "dibs" | "+" | "request" => Self::Request,
            "release" | "cancel" | "-" => Self::Release,
            "redibs" | "-+" | "rejoin" => Self::Rejoin,
            "steal" | "$" => Self::Steal,
            "lock" | "@+" => Self::Lock,
            "unlock" | "@-" => Self::Unlock,
            "status" | "?" => Self::Status,
            _ => Self::Help,
        }
    }

    /// The canonical lowercase name, used in logs.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Request => "request",
            Self::Release => "release",
            Self::Rejoin => "rejoin",
            Self::Steal => "steal",
            Self::Lock => "lock",
            Self::Unlock => "unlock",
            Self::Status => "status",
            Self::Help => "help",
        }
    }
}

impl fmt::Display for Verb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// ParsedLine
// ---------------------------------------------------------------------------

/// One chat line as handed over by the transport's tokenizer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParsedLine {
    /// Room the line was said in.
    pub room: RoomName,
    /// Who said it, already resolved by the directory.
    pub user: UserId,
    /// The untouched text, used for mention detection.
    pub raw: String,
    /// The command word without its prefix, if the line was a command.
    pub command: Option<String>,
    /// Whitespace-separated arguments following the command word.
    #[serde(default)]
    pub args: Vec<String>,
}

impl ParsedLine {
    /// Returns `true` if the tokenizer recognized a command word.
    pub fn is_command(&self) -> bool {
        self.command.is_some()
    }
}

// ---------------------------------------------------------------------------
// Command
// ---------------------------------------------------------------------------

/// A fully resolved request to the turn-queue engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Command {
    pub room: RoomName,
    /// Who issued the command.
    pub actor: UserId,
    /// The user the command acts for, when it isn't the actor.
    pub on_behalf_of: Option<UserId>,
    pub verb: Verb,
    #[serde(default)]
    pub args: Vec<String>,
}

impl Command {
    /// Creates a command the actor issues for themselves.
    pub fn new(room: RoomName, actor: UserId, verb: Verb) -> Self {
        Self {
            room,
            actor,
            on_behalf_of: None,
            verb,
            args: Vec::new(),
        }
    }

    /// Makes the command act for `target` instead of the actor.
    pub fn on_behalf_of(mut self, target: UserId) -> Self {
        self.on_behalf_of = Some(target);
        self
    }

    /// Attaches the raw argument list.
    pub fn with_args(mut self, args: Vec<String>) -> Self {
        self.args = args;
        self
    }

    /// Builds a command from a tokenized line.
    ///
    /// A lone `@mention` argument makes the sender a proxy acting for the
    /// mentioned user. Lines without a command word are treated as `help`.
    ///
    /// # Errors
    /// [`ProtocolError::InvalidMention`] if the lone argument is a bare `@`.
    pub fn from_line(line: &ParsedLine) -> Result<Self, ProtocolError> {
        let verb = line
            .command
            .as_deref()
            .map(Verb::parse)
            .unwrap_or(Verb::Help);

        let on_behalf_of = match line.args.as_slice() {
            [only] => parse_mention(only)?,
            _ => None,
        };

        Ok(Self {
            room: line.room.clone(),
            actor: line.user.clone(),
            on_behalf_of,
            verb,
            args: line.args.clone(),
        })
    }

    /// The user whose place in line this command affects.
    pub fn target(&self) -> &UserId {
        self.on_behalf_of.as_ref().unwrap_or(&self.actor)
    }

    /// The actor, if they are acting for somebody else.
    pub fn proxy(&self) -> Option<&UserId> {
        match &self.on_behalf_of {
            Some(target) if *target != self.actor => Some(&self.actor),
            _ => None,
        }
    }
}

// =========================================================================
// Tests
// =========================================================================
