//! Whitespace tokenizer and the persisted word vocabulary used by the
//! recurrent and bag-of-words backends.
//!
//! ```text
//! "I am Happy" → ["i", "am", "happy"] → [17, 4, 92, 0, 0, …]
//! ```

use crate::error::{ModelError, Result};
use serde::de::Deserializer;
use serde::ser::{SerializeMap, Serializer};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use tracing::info;

/// Padding token, always id 0.
pub const PAD_TOKEN: &str = "<PAD>";
/// Unknown token, always id 1.
pub const UNK_TOKEN: &str = "<UNK>";
/// Reserved padding id.
pub const PAD_ID: u32 = 0;
/// Reserved unknown-token id.
pub const UNK_ID: u32 = 1;

/// Lowercase `text` and split it on whitespace.
///
/// No punctuation handling and no stemming: `"Happy!"` stays `"happy!"`.
pub fn tokenize(text: &str) -> Vec<String> {
    text.to_lowercase()
        .split_whitespace()
        .map(str::to_owned)
        .collect()
}

/// Token → id mapping with ids 0 and 1 reserved for padding and unknown.
///
/// Ids are dense: a vocabulary of `n` entries uses exactly `0..n`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Vocabulary {
    ids: HashMap<String, u32>,
    tokens: Vec<String>,
}

impl Default for Vocabulary {
    fn default() -> Self {
        Self::new()
    }
}

impl Vocabulary {
    /// A vocabulary holding only the two reserved tokens.
    pub fn new() -> Self {
        let mut vocab = Self {
            ids: HashMap::new(),
            tokens: Vec::new(),
        };
        vocab.push(PAD_TOKEN);
        vocab.push(UNK_TOKEN);
        vocab
    }

    /// Build a vocabulary from a corpus.
    ///
    /// Takes the `max_size` most frequent tokens (descending count, ties in
    /// first-seen order) and stops at the first one seen fewer than
    /// `min_freq` times.
    pub fn build<I, S>(texts: I, min_freq: usize, max_size: usize) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut counts: HashMap<String, usize> = HashMap::new();
        let mut first_seen: Vec<String> = Vec::new();
        for text in texts {
            for token in tokenize(text.as_ref()) {
                let count = counts.entry(token.clone()).or_insert(0);
                if *count == 0 {
                    first_seen.push(token);
                }
                *count += 1;
            }
        }

        // Stable sort keeps first-seen order among equal counts.
        let mut ranked = first_seen;
        ranked.sort_by(|a, b| counts[b].cmp(&counts[a]));

        let mut vocab = Self::new();
        for token in ranked.into_iter().take(max_size) {
            if counts[&token] < min_freq {
                break;
            }
            if !vocab.ids.contains_key(&token) {
                vocab.push(&token);
            }
        }
        vocab
    }

    fn push(&mut self, token: &str) {
        let id = self.tokens.len() as u32;
        self.ids.insert(token.to_owned(), id);
        self.tokens.push(token.to_owned());
    }

    /// Number of entries, reserved tokens included.
    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    /// Always `false`: the reserved tokens are never removed.
    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    /// Id of `token`, if present.
    pub fn id(&self, token: &str) -> Option<u32> {
        self.ids.get(token).copied()
    }

    /// Token stored at `id`, if any.
    pub fn token(&self, id: u32) -> Option<&str> {
        self.tokens.get(id as usize).map(String::as_str)
    }

    /// Map `text` to exactly `max_len` ids.
    ///
    /// Out-of-vocabulary tokens become [`UNK_ID`]; the sequence is truncated
    /// or right-padded with [`PAD_ID`].
    pub fn encode(&self, text: &str, max_len: usize) -> Vec<u32> {
        let mut ids: Vec<u32> = tokenize(text)
            .iter()
            .take(max_len)
            .map(|t| self.id(t).unwrap_or(UNK_ID))
            .collect();
        ids.resize(max_len, PAD_ID);
        ids
    }

    /// Load a vocabulary from a JSON object of `token → id`.
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::MissingArtifact`] if the file does not exist and
    /// [`ModelError::Artifact`] if it is not a valid dense vocabulary.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(ModelError::MissingArtifact(path.to_path_buf()));
        }
        let content = std::fs::read_to_string(path)?;
        let vocab: Self = serde_json::from_str(&content)
            .map_err(|e| ModelError::Artifact(format!("{}: {e}", path.display())))?;
        info!("loaded vocabulary ({} tokens) from {}", vocab.len(), path.display());
        Ok(vocab)
    }

    /// Write the vocabulary as JSON in id order, creating parent directories.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be written.
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string(self)
            .map_err(|e| ModelError::Artifact(format!("vocabulary serialization failed: {e}")))?;
        std::fs::write(path, json)?;
        info!("saved vocabulary ({} tokens) to {}", self.len(), path.display());
        Ok(())
    }

    fn from_map(map: HashMap<String, u32>) -> std::result::Result<Self, String> {
        if map.get(PAD_TOKEN) != Some(&PAD_ID) {
            return Err(format!("{PAD_TOKEN} must map to {PAD_ID}"));
        }
        if map.get(UNK_TOKEN) != Some(&UNK_ID) {
            return Err(format!("{UNK_TOKEN} must map to {UNK_ID}"));
        }
        let mut tokens: Vec<Option<String>> = vec![None; map.len()];
        for (token, &id) in &map {
            let slot = tokens
                .get_mut(id as usize)
                .ok_or_else(|| format!("id {id} for {token:?} is out of range"))?;
            if slot.is_some() {
                return Err(format!("id {id} is assigned more than once"));
            }
            *slot = Some(token.clone());
        }
        let tokens = tokens.into_iter().flatten().collect();
        Ok(Self { ids: map, tokens })
    }
}

impl Serialize for Vocabulary {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.tokens.len()))?;
        for (id, token) in self.tokens.iter().enumerate() {
            map.serialize_entry(token, &(id as u32))?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for Vocabulary {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let map = HashMap::<String, u32>::deserialize(deserializer)?;
        Self::from_map(map).map_err(serde::de::Error::custom)
    }
}
