//! Emoticon flourishes appended to replies.

use rand::Rng;
use rand::seq::IndexedRandom;

use crate::EngineConfig;

/// Supplies the optional flourish at the end of a reply.
///
/// An empty string means "no flourish"; the renderer only adds the
/// separating space when there is something to add.
pub trait Decorator: Send + Sync + 'static {
    /// For good news: grants, hand-offs, unlocks.
    fn cheer(&self) -> String;
    /// For bad news: steals, locks.
    fn jeer(&self) -> String;
}

/// Never decorates. Replies come out exactly the same every time.
#[derive(Debug, Clone, Copy, Default)]
pub struct PlainDecorator;

impl Decorator for PlainDecorator {
    fn cheer(&self) -> String {
        String::new()
    }

    fn jeer(&self) -> String {
        String::new()
    }
}

/// Picks a random emoticon, rendered `(name)`, some of the time.
#[derive(Debug, Clone)]
pub struct EmoticonDecorator {
    positive: Vec<String>,
    negative: Vec<String>,
    positive_chance: f64,
    negative_chance: f64,
}

impl EmoticonDecorator {
    pub fn new(
        positive: Vec<String>,
        negative: Vec<String>,
        positive_chance: f64,
        negative_chance: f64,
    ) -> Self {
        Self {
            positive,
            negative,
            positive_chance: positive_chance.clamp(0.0, 1.0),
            negative_chance: negative_chance.clamp(0.0, 1.0),
        }
    }

    pub fn from_config(config: &EngineConfig) -> Self {
        Self::new(
            config.positive_emoticons.clone(),
            config.negative_emoticons.clone(),
            config.positive_chance,
            config.negative_chance,
        )
    }

    fn pick(list: &[String], chance: f64) -> String {
        let mut rng = rand::rng();
        if list.is_empty() || !rng.random_bool(chance) {
            return String::new();
        }
        list.choose(&mut rng)
            .map(|name| format!("({name})"))
            .unwrap_or_default()
    }
}

impl Decorator for EmoticonDecorator {
    fn cheer(&self) -> String {
        Self::pick(&self.positive, self.positive_chance)
    }

    fn jeer(&self) -> String {
        Self::pick(&self.negative, self.negative_chance)
    }
}
