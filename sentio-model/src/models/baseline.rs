//! TF-IDF bag-of-words features with a multinomial logistic-regression layer.
//!
//! The artifact is a plain JSON export of a fitted vectorizer and linear
//! model. Class names outside the label set fold into `neutral`.

use super::{dot, l2_normalize, load_json, softmax};
use crate::error::{ModelError, Result};
use crate::label::{EmotionDistribution, EmotionLabel, LABEL_COUNT};
use crate::model::EmotionModel;
use crate::tokenize::tokenize;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use tracing::{info, warn};

/// On-disk form of a fitted bag-of-words model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BaselineArtifact {
    /// Token → feature column.
    pub vocabulary: HashMap<String, usize>,
    /// Inverse document frequency per feature column.
    pub idf: Vec<f32>,
    /// Class name for each row of `coef`.
    pub classes: Vec<String>,
    /// `[classes.len()][idf.len()]` weights.
    pub coef: Vec<Vec<f32>>,
    /// Bias per class.
    pub intercept: Vec<f32>,
}

/// TF-IDF + logistic regression emotion model.
#[derive(Debug, Clone)]
pub struct BagOfWordsModel {
    vocabulary: HashMap<String, usize>,
    idf: Vec<f32>,
    class_labels: Vec<EmotionLabel>,
    coef: Vec<Vec<f32>>,
    intercept: Vec<f32>,
}

impl BagOfWordsModel {
    /// Validate an artifact and build the model from it.
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::Artifact`] if the dimensions are inconsistent.
    pub fn from_artifact(artifact: BaselineArtifact) -> Result<Self> {
        let features = artifact.idf.len();
        let classes = artifact.classes.len();
        if classes == 0 {
            return Err(ModelError::Artifact("baseline model has no classes".into()));
        }
        if artifact.coef.len() != classes || artifact.intercept.len() != classes {
            return Err(ModelError::Artifact(format!(
                "baseline model has {classes} classes but {} coef rows and {} intercepts",
                artifact.coef.len(),
                artifact.intercept.len()
            )));
        }
        if let Some(row) = artifact.coef.iter().position(|r| r.len() != features) {
            return Err(ModelError::Artifact(format!(
                "baseline coef row {row} does not have {features} features"
            )));
        }
        if let Some((token, &col)) = artifact.vocabulary.iter().find(|&(_, &c)| c >= features) {
            return Err(ModelError::Artifact(format!(
                "baseline feature {col} for {token:?} is out of range"
            )));
        }

        let class_labels = artifact
            .classes
            .iter()
            .map(|name| {
                name.parse::<EmotionLabel>().unwrap_or_else(|_| {
                    warn!(class = %name, "baseline class outside label set, folding into neutral");
                    EmotionLabel::Neutral
                })
            })
            .collect();

        Ok(Self {
            vocabulary: artifact.vocabulary,
            idf: artifact.idf,
            class_labels,
            coef: artifact.coef,
            intercept: artifact.intercept,
        })
    }

    /// Load the model from a JSON artifact.
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::MissingArtifact`] if the file is absent and
    /// [`ModelError::Artifact`] if it is malformed.
    pub fn load(path: &Path) -> Result<Self> {
        let model = Self::from_artifact(load_json(path)?)?;
        info!(
            "loaded baseline model ({} features, {} classes) from {}",
            model.idf.len(),
            model.class_labels.len(),
            path.display()
        );
        Ok(model)
    }

    /// L2-normalised TF-IDF vector for `text`.
    fn features(&self, text: &str) -> Vec<f32> {
        let mut x = vec![0.0f32; self.idf.len()];
        for token in tokenize(text) {
            if let Some(&col) = self.vocabulary.get(&token) {
                x[col] += 1.0;
            }
        }
        for (v, idf) in x.iter_mut().zip(&self.idf) {
            *v *= idf;
        }
        l2_normalize(&mut x);
        x
    }
}

impl EmotionModel for BagOfWordsModel {
    fn name(&self) -> &'static str {
        "baseline"
    }

    fn scores(&mut self, text: &str) -> Result<EmotionDistribution> {
        let x = self.features(text);
        let logits: Vec<f32> = self
            .coef
            .iter()
            .zip(&self.intercept)
            .map(|(row, b)| dot(row, &x) + b)
            .collect();
        let probs = softmax(&logits)
            .ok_or_else(|| ModelError::Inference("baseline produced non-finite logits".into()))?;

        let mut values = [0.0f32; LABEL_COUNT];
        for (label, p) in self.class_labels.iter().zip(probs) {
            values[label.index()] += p;
        }
        Ok(EmotionDistribution::new(values))
    }
}
