//! Append-only conversation log.
//!
//! [`EmotionMemory`] keeps every classified user message for the lifetime of
//! a session, in conversation order. Entries are never edited; statistics and
//! exports are derived from them on demand.

use crate::error::{Result, SentioError};
use crate::stats::{self, EmotionStatistics, TransitionMatrix};
use chrono::{DateTime, Utc};
use sentio_model::{EmotionDistribution, EmotionLabel, Prediction};
use serde::{Deserialize, Serialize};

/// One classified user message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConversationEntry {
    /// 0-based position in the conversation.
    pub index: u64,
    /// The message as received.
    pub text: String,
    /// Predicted emotion.
    pub label: EmotionLabel,
    /// Full model output for the message.
    pub distribution: EmotionDistribution,
    /// When the entry was recorded.
    pub recorded_at: DateTime<Utc>,
}

/// Ordered log of conversation entries.
#[derive(Debug, Clone, Default)]
pub struct EmotionMemory {
    entries: Vec<ConversationEntry>,
}

impl EmotionMemory {
    /// Create an empty log.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append `text` with a known label. The distribution is one-hot.
    ///
    /// # Errors
    ///
    /// Returns [`SentioError::InvalidInput`] if `text` is blank; nothing is
    /// recorded in that case.
    pub fn record(&mut self, text: &str, label: EmotionLabel) -> Result<&ConversationEntry> {
        self.push(text, label, EmotionDistribution::one_hot(label))
    }

    /// Append `text` with a classifier prediction, keeping its distribution.
    ///
    /// # Errors
    ///
    /// Returns [`SentioError::InvalidInput`] if `text` is blank.
    pub fn record_prediction(
        &mut self,
        text: &str,
        prediction: &Prediction,
    ) -> Result<&ConversationEntry> {
        self.push(text, prediction.label, prediction.distribution)
    }

    fn push(
        &mut self,
        text: &str,
        label: EmotionLabel,
        distribution: EmotionDistribution,
    ) -> Result<&ConversationEntry> {
        if text.trim().is_empty() {
            return Err(SentioError::InvalidInput(
                "conversation text must not be blank".into(),
            ));
        }
        let position = self.entries.len();
        self.entries.push(ConversationEntry {
            index: position as u64,
            text: text.to_owned(),
            label,
            distribution,
            recorded_at: Utc::now(),
        });
        Ok(&self.entries[position])
    }

    /// All entries in conversation order.
    pub fn entries(&self) -> &[ConversationEntry] {
        &self.entries
    }

    /// Number of recorded entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether nothing has been recorded.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Owned copy of every entry, for computing outside a lock.
    pub fn snapshot(&self) -> Vec<ConversationEntry> {
        self.entries.clone()
    }

    /// Drop every entry. Indices restart at 0.
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Label-to-label transition probabilities.
    pub fn transition_matrix(&self) -> TransitionMatrix {
        stats::transition_matrix(&self.entries)
    }

    /// Label counts and percentages.
    pub fn statistics(&self) -> EmotionStatistics {
        stats::statistics(&self.entries)
    }
}
