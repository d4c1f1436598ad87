//! # sentio-model
//!
//! Emotion classification for sentio.
//!
//! This crate owns everything between a raw user message and a probability
//! distribution over the seven emotion labels. It is a library only; the
//! conversation log, statistics and HTTP surface live in `sentio`.
//!
//! ## Design
//!
//! - A closed [`EmotionLabel`] set whose declaration order fixes logit order
//!   and tie-breaking
//! - A lowercase whitespace tokenizer with a persisted [`Vocabulary`]
//! - Three interchangeable backends behind [`EmotionModel`]: a BiLSTM, a
//!   TF-IDF + logistic-regression baseline, and an ONNX transformer
//! - [`EmotionClassifier`] loads the configured backend on first use and
//!   answers blank input or a missing model with a uniform `neutral`
//!   [`Prediction`]

pub mod classifier;
pub mod config;
pub mod error;
pub mod label;
pub mod model;
pub mod models;
pub mod tokenize;

pub use classifier::EmotionClassifier;
pub use config::{Backend, ClassifierConfig};
pub use error::{ModelError, Result};
pub use label::{EmotionDistribution, EmotionLabel, LABEL_COUNT};
pub use model::{EmotionModel, Prediction};
pub use tokenize::{tokenize, Vocabulary};
