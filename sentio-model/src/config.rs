//! Classifier configuration with sensible defaults.
//!
//! [`ClassifierConfig`] selects the backend and tells it where its
//! artifacts live. File names are relative to `model_dir`.

use crate::error::ModelError;
use crate::label::EmotionLabel;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::str::FromStr;

/// Which model backend produces predictions.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Backend {
    /// Bidirectional LSTM over the word vocabulary.
    #[default]
    Lstm,
    /// TF-IDF features with a logistic-regression layer.
    Baseline,
    /// Pretrained transformer exported to ONNX.
    Transformer,
}

impl Backend {
    /// Short name used in logs.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Lstm => "lstm",
            Self::Baseline => "baseline",
            Self::Transformer => "transformer",
        }
    }
}

impl FromStr for Backend {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "lstm" => Ok(Self::Lstm),
            "baseline" => Ok(Self::Baseline),
            "transformer" => Ok(Self::Transformer),
            other => Err(ModelError::Config(format!(
                "unknown backend {other:?} (expected lstm, baseline or transformer)"
            ))),
        }
    }
}

/// Configuration for the emotion classifier.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClassifierConfig {
    /// Backend to load on first prediction.
    pub backend: Backend,
    /// Directory holding every model artifact.
    pub model_dir: PathBuf,
    /// Encoded sequence length for the LSTM backend.
    pub max_len: usize,
    /// Word vocabulary file (LSTM backend).
    pub vocab_file: String,
    /// LSTM weights file.
    pub lstm_file: String,
    /// Bag-of-words model file.
    pub baseline_file: String,
    /// Transformer ONNX model file.
    pub transformer_model_file: String,
    /// Transformer `tokenizer.json` file.
    pub transformer_tokenizer_file: String,
    /// Maximum transformer input length in tokens.
    pub transformer_max_tokens: usize,
    /// Label for each transformer logit, in output order.
    pub transformer_labels: Vec<EmotionLabel>,
    /// Feed a `token_type_ids` input (BERT-style exports; RoBERTa has none).
    pub transformer_token_type_ids: bool,
    /// ONNX Runtime intra-op threads.
    pub intra_threads: usize,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            backend: Backend::default(),
            model_dir: PathBuf::from("models"),
            max_len: 100,
            vocab_file: "vocab.json".to_owned(),
            lstm_file: "lstm_emotion.json".to_owned(),
            baseline_file: "baseline.json".to_owned(),
            transformer_model_file: "model.onnx".to_owned(),
            transformer_tokenizer_file: "tokenizer.json".to_owned(),
            transformer_max_tokens: 128,
            transformer_labels: EmotionLabel::ALL.to_vec(),
            transformer_token_type_ids: false,
            intra_threads: 2,
        }
    }
}

impl ClassifierConfig {
    /// Path of the word vocabulary.
    pub fn vocab_path(&self) -> PathBuf {
        self.model_dir.join(&self.vocab_file)
    }

    /// Path of the LSTM weights.
    pub fn lstm_path(&self) -> PathBuf {
        self.model_dir.join(&self.lstm_file)
    }

    /// Path of the bag-of-words model.
    pub fn baseline_path(&self) -> PathBuf {
        self.model_dir.join(&self.baseline_file)
    }

    /// Path of the transformer ONNX model.
    pub fn transformer_model_path(&self) -> PathBuf {
        self.model_dir.join(&self.transformer_model_file)
    }

    /// Path of the transformer tokenizer.
    pub fn transformer_tokenizer_path(&self) -> PathBuf {
        self.model_dir.join(&self.transformer_tokenizer_file)
    }

    /// Validates this configuration, returning an error if any field is invalid.
    ///
    /// Checks:
    /// - `max_len` and `transformer_max_tokens` must be greater than 0
    /// - `intra_threads` must be greater than 0
    /// - `transformer_labels` must list exactly the seven labels once each
    pub fn validate(&self) -> Result<(), ModelError> {
        if self.max_len == 0 {
            return Err(ModelError::Config("max_len must be greater than 0".into()));
        }
        if self.transformer_max_tokens == 0 {
            return Err(ModelError::Config(
                "transformer_max_tokens must be greater than 0".into(),
            ));
        }
        if self.intra_threads == 0 {
            return Err(ModelError::Config(
                "intra_threads must be greater than 0".into(),
            ));
        }
        let mut sorted = self.transformer_labels.clone();
        sorted.sort();
        sorted.dedup();
        if sorted.len() != self.transformer_labels.len()
            || sorted.as_slice() != EmotionLabel::ALL.as_slice()
        {
            return Err(ModelError::Config(
                "transformer_labels must list each emotion label exactly once".into(),
            ));
        }
        Ok(())
    }
}
