//! Canned bot replies and recommendation bundles keyed by emotion.
//!
//! Both catalogs are JSON objects keyed by lowercase label name. Keys that
//! are not a known label are logged and skipped. A missing file is not an
//! error: replies fall back to a small built-in set and recommendations to
//! none.

use crate::config::ResponsesConfig;
use crate::error::{Result, SentioError};
use rand::Rng;
use rand::seq::SliceRandom;
use sentio_model::EmotionLabel;
use serde::{Deserialize, Serialize};
use serde::de::DeserializeOwned;
use std::collections::{BTreeMap, HashMap};
use std::path::Path;
use tracing::{info, warn};

/// Reply used when neither the label nor `neutral` has any candidates.
pub const LAST_RESORT_REPLY: &str = "I understand.";

/// A recommended song.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Song {
    pub title: String,
    pub url: String,
}

/// Songs and quotes offered for a conversation's dominant emotion.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Recommendations {
    pub songs: Vec<Song>,
    pub quotes: Vec<String>,
}

/// Reply candidates and recommendations per label, loaded once at startup.
#[derive(Debug, Clone, PartialEq)]
pub struct ResponseCatalog {
    replies: BTreeMap<EmotionLabel, Vec<String>>,
    recommendations: BTreeMap<EmotionLabel, Recommendations>,
}

impl Default for ResponseCatalog {
    fn default() -> Self {
        Self {
            replies: default_replies(),
            recommendations: BTreeMap::new(),
        }
    }
}

fn default_replies() -> BTreeMap<EmotionLabel, Vec<String>> {
    [
        (
            EmotionLabel::Neutral,
            "I'm here to listen. How can I help you today?",
        ),
        (
            EmotionLabel::Joy,
            "That's wonderful! I'm glad you're feeling positive!",
        ),
        (
            EmotionLabel::Sadness,
            "I'm sorry you're feeling this way. You're not alone.",
        ),
        (
            EmotionLabel::Anger,
            "I understand you're feeling frustrated. Let's work through this.",
        ),
        (
            EmotionLabel::Fear,
            "It's okay to feel afraid. You're brave for expressing it.",
        ),
    ]
    .into_iter()
    .map(|(label, reply)| (label, vec![reply.to_owned()]))
    .collect()
}

impl ResponseCatalog {
    /// Build a catalog from already-parsed maps.
    pub fn new(
        replies: BTreeMap<EmotionLabel, Vec<String>>,
        recommendations: BTreeMap<EmotionLabel, Recommendations>,
    ) -> Self {
        Self {
            replies,
            recommendations,
        }
    }

    /// Load both catalogs from the paths in `config`.
    ///
    /// # Errors
    ///
    /// Returns an error if a file exists but cannot be read or parsed.
    pub fn load(config: &ResponsesConfig) -> Result<Self> {
        let replies = match read_keyed::<Vec<String>>(&config.responses_path)? {
            Some(replies) => {
                info!(
                    "loaded emotion responses from {}",
                    config.responses_path.display()
                );
                replies
            }
            None => {
                warn!(
                    "emotion responses file not found: {}, using built-in replies",
                    config.responses_path.display()
                );
                default_replies()
            }
        };

        let recommendations = match read_keyed::<Recommendations>(&config.recommendations_path)? {
            Some(recs) => {
                info!(
                    "loaded emotion recommendations from {}",
                    config.recommendations_path.display()
                );
                recs
            }
            None => {
                warn!(
                    "emotion recommendations file not found: {}, continuing without recommendations",
                    config.recommendations_path.display()
                );
                BTreeMap::new()
            }
        };

        Ok(Self::new(replies, recommendations))
    }

    /// Pick a reply for `label`.
    ///
    /// Draws from the label's candidates, else `neutral`'s, else
    /// [`LAST_RESORT_REPLY`].
    pub fn reply_for<R: Rng + ?Sized>(&self, label: EmotionLabel, rng: &mut R) -> &str {
        [label, EmotionLabel::Neutral]
            .iter()
            .filter_map(|l| self.replies.get(l))
            .find(|candidates| !candidates.is_empty())
            .and_then(|candidates| candidates.choose(rng))
            .map_or(LAST_RESORT_REPLY, String::as_str)
    }

    /// Recommendations for `label`, if any were configured.
    pub fn recommendations_for(&self, label: EmotionLabel) -> Option<&Recommendations> {
        self.recommendations.get(&label)
    }
}

/// Parse a label-keyed JSON object. `Ok(None)` if the file does not exist.
fn read_keyed<T: DeserializeOwned>(path: &Path) -> Result<Option<BTreeMap<EmotionLabel, T>>> {
    if !path.exists() {
        return Ok(None);
    }
    let content = std::fs::read_to_string(path)?;
    let raw: HashMap<String, T> = serde_json::from_str(&content)
        .map_err(|e| SentioError::Config(format!("{}: {e}", path.display())))?;

    let mut keyed = BTreeMap::new();
    for (key, value) in raw {
        match key.parse::<EmotionLabel>() {
            Ok(label) => {
                keyed.insert(label, value);
            }
            Err(_) => warn!("skipping unknown emotion key {key:?} in {}", path.display()),
        }
    }
    Ok(Some(keyed))
}
