//! Engine configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::warn;

/// Settings for a [`TurnQueueEngine`](crate::TurnQueueEngine).
///
/// Every field has a default, so a config file only needs the fields it
/// changes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Name the bot answers to when mentioned.
    pub bot_name: String,
    /// What the queue hands out, as it appears in replies.
    pub baton_name: String,
    /// How long a promoted holder has to call dibs again.
    pub grace_window_secs: u64,
    /// Hold time after which status calls the holder a hog.
    pub hog_threshold_secs: u64,
    pub positive_emoticons: Vec<String>,
    pub negative_emoticons: Vec<String>,
    /// Chance of a positive emoticon on good news.
    pub positive_chance: f64,
    /// Chance of a negative emoticon on steals and locks.
    pub negative_chance: f64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            bot_name: "dibsbot".to_string(),
            baton_name: "baton".to_string(),
            grace_window_secs: 60,
            hog_threshold_secs: 600,
            positive_emoticons: ["success", "yey", "thumbsup", "party"]
                .map(String::from)
                .to_vec(),
            negative_emoticons: ["swiper", "sadpanda", "facepalm", "wat"]
                .map(String::from)
                .to_vec(),
            positive_chance: 0.2,
            negative_chance: 0.8,
        }
    }
}

impl EngineConfig {
    pub fn grace_window(&self) -> Duration {
        Duration::from_secs(self.grace_window_secs)
    }

    pub fn hog_threshold(&self) -> Duration {
        Duration::from_secs(self.hog_threshold_secs)
    }

    /// Repairs values the engine cannot run with, logging each fix.
    pub fn validated(mut self) -> Self {
        let defaults = Self::default();

        if self.baton_name.trim().is_empty() {
            warn!(default = %defaults.baton_name, "empty baton name, using default");
            self.baton_name = defaults.baton_name;
        }
        if self.grace_window_secs == 0 {
            warn!("grace window of zero seconds, clamping to one");
            self.grace_window_secs = 1;
        }
        self.positive_chance = clamp_chance("positive_chance", self.positive_chance);
        self.negative_chance = clamp_chance("negative_chance", self.negative_chance);
        self
    }

    /// Parses a JSON config document.
    #[cfg(feature = "json")]
    pub fn from_json_str(json: &str) -> Result<Self, crate::DibsError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Reads and parses a JSON config file.
    #[cfg(feature = "json")]
    pub fn from_json_file(
        path: impl AsRef<std::path::Path>,
    ) -> Result<Self, crate::DibsError> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json_str(&json)
    }
}

fn clamp_chance(field: &'static str, value: f64) -> f64 {
    // NaN fails both comparisons below, so treat it as "never".
    if value.is_nan() {
        warn!(field, "chance is NaN, using 0");
        return 0.0;
    }
    let clamped = value.clamp(0.0, 1.0);
    if clamped != value {
        warn!(field, value, clamped, "chance out of range, clamping");
    }
    clamped
}
