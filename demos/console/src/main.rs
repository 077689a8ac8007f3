//! Console front end for dibs.
//!
//! Each stdin line is `room user text...`, standing in for a chat message
//! in `room` from `user`. Replies and grace-timer announcements go to
//! stdout; logs go to stderr.
//!
//! ```text
//! $ dibs-console [config.json]
//! ops alice !dibs
//! [ops] alice the baton is yours!
//! ```

use dibs::prelude::*;
use tokio::io::{AsyncBufReadExt, BufReader};

// ---------------------------------------------------------------------------
// Tokenizer
// ---------------------------------------------------------------------------

/// Splits `room user text...` into a chat line. A text starting with `!`
/// is a command; the rest of its words are arguments.
fn tokenize(input: &str) -> Option<ParsedLine> {
    let input = input.trim();
    let (room, rest) = input.split_once(char::is_whitespace)?;
    let rest = rest.trim_start();
    let (user, raw) = rest.split_once(char::is_whitespace).unwrap_or((rest, ""));
    let raw = raw.trim();

    let mut words = raw.split_whitespace();
    let command = if raw.starts_with('!') {
        words.next().and_then(|w| w.strip_prefix('!')).map(String::from)
    } else {
        None
    };

    Some(ParsedLine {
        room: RoomName::new(room).ok()?,
        user: UserId::new(user).ok()?,
        raw: raw.to_string(),
        command,
        args: words.map(String::from).collect(),
    })
}

// ---------------------------------------------------------------------------
// Bootstrap
// ---------------------------------------------------------------------------

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dibs::logging::init("info")?;

    let config = match std::env::args().nth(1) {
        Some(path) => EngineConfig::from_json_file(&path)?,
        None => EngineConfig::default(),
    };

    let (tx, mut announcements) = announcement_channel();
    let engine = TurnQueueEngine::builder()
        .config(config)
        .announcements(tx)
        .build()?;

    tokio::spawn(async move {
        while let Some(a) = announcements.recv().await {
            println!("[{}] {}", a.room, a.text);
        }
    });

    tracing::info!(bot = %engine.config().bot_name, "reading chat lines from stdin");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(input) = lines.next_line().await? {
        let Some(line) = tokenize(&input) else {
            if !input.trim().is_empty() {
                tracing::warn!(%input, "expected `room user text...`");
            }
            continue;
        };
        if let Some(reply) = engine.evaluate(&line) {
            println!("[{}] {}", line.room, reply);
        }
    }

    Ok(())
}
