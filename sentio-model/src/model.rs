//! Trait definition for pluggable emotion model backends.

use crate::error::Result;
use crate::label::{EmotionDistribution, EmotionLabel};
use serde::{Deserialize, Serialize};

/// A loaded emotion model.
///
/// `scores` takes `&mut self` because ONNX sessions and HuggingFace
/// tokenizers need exclusive access while running. Callers sharing a model
/// across threads wrap it in a `Mutex`.
pub trait EmotionModel: Send {
    /// Short backend name used in logs.
    fn name(&self) -> &'static str;

    /// Probability of each label for `text`.
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::Inference`](crate::ModelError::Inference) if the
    /// forward pass fails.
    fn scores(&mut self, text: &str) -> Result<EmotionDistribution>;
}

/// The predicted label together with the full distribution it came from.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Prediction {
    pub label: EmotionLabel,
    pub distribution: EmotionDistribution,
}

impl Prediction {
    /// The safe default: `neutral` with a uniform distribution.
    pub fn fallback() -> Self {
        Self {
            label: EmotionLabel::Neutral,
            distribution: EmotionDistribution::uniform(),
        }
    }

    /// Take the arg-max label of `distribution`.
    pub fn from_distribution(distribution: EmotionDistribution) -> Self {
        Self {
            label: distribution.top().0,
            distribution,
        }
    }

    /// Probability of the predicted label.
    pub fn confidence(&self) -> f32 {
        self.distribution.probability(self.label)
    }
}
