//! The fixed emotion label set and probability distributions over it.
//!
//! Declaration order of [`EmotionLabel`] is significant: it is the logit
//! order of every bundled model and the tie-break order wherever two labels
//! score the same.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Number of labels in the closed emotion set.
pub const LABEL_COUNT: usize = 7;

/// One of the seven emotion classes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EmotionLabel {
    Anger,
    Disgust,
    Fear,
    Joy,
    Neutral,
    Sadness,
    Surprise,
}

impl EmotionLabel {
    /// All labels in declaration order.
    pub const ALL: [EmotionLabel; LABEL_COUNT] = [
        Self::Anger,
        Self::Disgust,
        Self::Fear,
        Self::Joy,
        Self::Neutral,
        Self::Sadness,
        Self::Surprise,
    ];

    /// Lowercase wire name of the label.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Anger => "anger",
            Self::Disgust => "disgust",
            Self::Fear => "fear",
            Self::Joy => "joy",
            Self::Neutral => "neutral",
            Self::Sadness => "sadness",
            Self::Surprise => "surprise",
        }
    }

    /// Position of the label in declaration order.
    pub fn index(&self) -> usize {
        *self as usize
    }

    /// Label at `index` in declaration order, if in range.
    pub fn from_index(index: usize) -> Option<Self> {
        Self::ALL.get(index).copied()
    }

    /// Parse a label name, mapping anything unrecognised to
    /// [`EmotionLabel::Neutral`].
    pub fn parse_or_neutral(name: &str) -> Self {
        name.parse().unwrap_or(Self::Neutral)
    }
}

impl fmt::Display for EmotionLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Returned when a string does not name a known emotion label.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown emotion label: {0}")]
pub struct UnknownLabel(pub String);

impl FromStr for EmotionLabel {
    type Err = UnknownLabel;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.trim().to_lowercase();
        Self::ALL
            .iter()
            .copied()
            .find(|label| label.as_str() == lower)
            .ok_or_else(|| UnknownLabel(s.to_owned()))
    }
}

/// A probability for each label, indexed by declaration order.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EmotionDistribution([f32; LABEL_COUNT]);

impl EmotionDistribution {
    /// Wrap raw per-label values without normalising them.
    pub fn new(values: [f32; LABEL_COUNT]) -> Self {
        Self(values)
    }

    /// Equal probability for every label.
    pub fn uniform() -> Self {
        Self([1.0 / LABEL_COUNT as f32; LABEL_COUNT])
    }

    /// All mass on `label`.
    pub fn one_hot(label: EmotionLabel) -> Self {
        let mut values = [0.0; LABEL_COUNT];
        values[label.index()] = 1.0;
        Self(values)
    }

    /// Numerically stable softmax over logits in declaration order.
    ///
    /// Returns `None` unless exactly [`LABEL_COUNT`] finite logits are given.
    pub fn from_logits(logits: &[f32]) -> Option<Self> {
        if logits.len() != LABEL_COUNT {
            return None;
        }
        let probs = crate::models::softmax(logits)?;
        let mut values = [0.0f32; LABEL_COUNT];
        values.copy_from_slice(&probs);
        Some(Self(values))
    }

    /// Probability assigned to `label`.
    pub fn probability(&self, label: EmotionLabel) -> f32 {
        self.0[label.index()]
    }

    /// Highest-probability label and its probability.
    ///
    /// Ties go to the label declared first.
    pub fn top(&self) -> (EmotionLabel, f32) {
        let mut best = 0;
        for (i, &p) in self.0.iter().enumerate() {
            if p > self.0[best] {
                best = i;
            }
        }
        (EmotionLabel::ALL[best], self.0[best])
    }

    /// Sum of all probabilities (1.0 for a proper distribution).
    pub fn total(&self) -> f32 {
        self.0.iter().sum()
    }

    /// Iterate `(label, probability)` pairs in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = (EmotionLabel, f32)> + '_ {
        EmotionLabel::ALL.iter().copied().zip(self.0.iter().copied())
    }

    /// Raw values in declaration order.
    pub fn as_array(&self) -> &[f32; LABEL_COUNT] {
        &self.0
    }
}

impl Default for EmotionDistribution {
    fn default() -> Self {
        Self::uniform()
    }
}
