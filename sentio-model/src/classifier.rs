//! Lazy-loading classifier facade with the neutral fallback.
//!
//! [`EmotionClassifier::predict`] never fails for the two expected
//! conditions, blank input and an uninstalled model. Both yield
//! [`Prediction::fallback`]. Anything else (a corrupt artifact, a failed
//! forward pass) is returned as an error so callers can refuse to record it.

use crate::config::ClassifierConfig;
use crate::error::{ModelError, Result};
use crate::model::{EmotionModel, Prediction};
use crate::models::load_backend;
use tracing::{debug, info, warn};

type Loader = Box<dyn Fn(&ClassifierConfig) -> Result<Box<dyn EmotionModel>> + Send>;

/// Emotion classifier that loads its backend on first use.
///
/// A successfully loaded model is kept for the classifier's lifetime. A
/// missing model is looked for again on the next prediction, so installing
/// artifacts does not require a restart.
pub struct EmotionClassifier {
    config: ClassifierConfig,
    model: Option<Box<dyn EmotionModel>>,
    loader: Loader,
}

impl std::fmt::Debug for EmotionClassifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EmotionClassifier")
            .field("backend", &self.config.backend)
            .field("loaded", &self.model.is_some())
            .finish_non_exhaustive()
    }
}

impl EmotionClassifier {
    /// Create a classifier for the backend named in `config`.
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::Config`] if `config` fails validation. No
    /// artifacts are touched until the first prediction.
    pub fn new(config: ClassifierConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            model: None,
            loader: Box::new(load_backend),
        })
    }

    /// Wrap an already-loaded model.
    pub fn with_model(config: ClassifierConfig, model: Box<dyn EmotionModel>) -> Self {
        Self {
            config,
            model: Some(model),
            loader: Box::new(load_backend),
        }
    }

    /// Replace how the backend is loaded on first use.
    pub fn with_loader<F>(mut self, loader: F) -> Self
    where
        F: Fn(&ClassifierConfig) -> Result<Box<dyn EmotionModel>> + Send + 'static,
    {
        self.loader = Box::new(loader);
        self
    }

    /// Configuration this classifier was built from.
    pub fn config(&self) -> &ClassifierConfig {
        &self.config
    }

    /// Whether a model is currently loaded.
    pub fn is_loaded(&self) -> bool {
        self.model.is_some()
    }

    /// Classify `text`.
    ///
    /// Blank input and missing artifacts both return
    /// [`Prediction::fallback`] without an error.
    ///
    /// # Errors
    ///
    /// Returns an error if an artifact is malformed or inference fails.
    pub fn predict(&mut self, text: &str) -> Result<Prediction> {
        if text.trim().is_empty() {
            return Ok(Prediction::fallback());
        }

        let backend = self.config.backend.name();
        let Some(model) = self.ensure_loaded()? else {
            warn!(
                backend,
                "model artifacts missing, returning neutral fallback"
            );
            return Ok(Prediction::fallback());
        };

        let distribution = model.scores(text)?;
        let prediction = Prediction::from_distribution(distribution);
        debug!(
            backend = model.name(),
            label = %prediction.label,
            confidence = prediction.confidence(),
            "classified message"
        );
        Ok(prediction)
    }

    /// Load the model if needed. `Ok(None)` means artifacts are absent.
    fn ensure_loaded(&mut self) -> Result<Option<&mut Box<dyn EmotionModel>>> {
        if self.model.is_none() {
            match (self.loader)(&self.config) {
                Ok(model) => {
                    info!(backend = model.name(), "emotion model loaded");
                    self.model = Some(model);
                }
                Err(ModelError::MissingArtifact(path)) => {
                    warn!(
                        path = %path.display(),
                        "model artifact not found; train or install a model into {}",
                        self.config.model_dir.display()
                    );
                    return Ok(None);
                }
                Err(e) => return Err(e),
            }
        }
        Ok(self.model.as_mut())
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used)]

    use super::*;
    use crate::label::{EmotionDistribution, EmotionLabel};
    use std::path::PathBuf;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    struct FixedModel(EmotionLabel);

    impl EmotionModel for FixedModel {
        fn name(&self) -> &'static str {
            "fixed"
        }

        fn scores(&mut self, _text: &str) -> Result<EmotionDistribution> {
            Ok(EmotionDistribution::one_hot(self.0))
        }
    }

    struct FailingModel;

    impl EmotionModel for FailingModel {
        fn name(&self) -> &'static str {
            "failing"
        }

        fn scores(&mut self, _text: &str) -> Result<EmotionDistribution> {
            Err(ModelError::Inference("boom".into()))
        }
    }

    fn empty_dir_config() -> (tempfile::TempDir, ClassifierConfig) {
        let dir = tempfile::tempdir().expect("tempdir");
        let config = ClassifierConfig {
            model_dir: dir.path().to_path_buf(),
            ..Default::default()
        };
        (dir, config)
    }

    fn assert_fallback(p: &Prediction) {
        assert_eq!(p.label, EmotionLabel::Neutral);
        assert!((p.distribution.total() - 1.0).abs() < 1e-6);
        for (_, prob) in p.distribution.iter() {
            assert!((prob - 1.0 / 7.0).abs() < 1e-6);
        }
    }

    #[test]
    fn blank_input_skips_model() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        let mut classifier = EmotionClassifier::new(ClassifierConfig::default())
            .unwrap()
            .with_loader(move |_| {
                counter.fetch_add(1, Ordering::SeqCst);
                Ok(Box::new(FixedModel(EmotionLabel::Joy)))
            });
        for text in ["", "   ", "\n\t "] {
            assert_fallback(&classifier.predict(text).unwrap());
        }
        assert_eq!(calls.load(Ordering::SeqCst), 0);
        assert!(!classifier.is_loaded());
    }

    #[test]
    fn missing_artifacts_fall_back() {
        let (_dir, config) = empty_dir_config();
        let mut classifier = EmotionClassifier::new(config).unwrap();
        assert_fallback(&classifier.predict("I am happy").unwrap());
        assert!(!classifier.is_loaded());
    }

    #[test]
    fn missing_artifacts_are_retried() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        let mut classifier = EmotionClassifier::new(ClassifierConfig::default())
            .unwrap()
            .with_loader(move |_| {
                if counter.fetch_add(1, Ordering::SeqCst) == 0 {
                    Err(ModelError::MissingArtifact(PathBuf::from("vocab.json")))
                } else {
                    Ok(Box::new(FixedModel(EmotionLabel::Fear)))
                }
            });
        assert_fallback(&classifier.predict("hello").unwrap());
        assert_eq!(classifier.predict("hello").unwrap().label, EmotionLabel::Fear);
        // Cached from here on.
        classifier.predict("again").unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn malformed_artifact_is_an_error() {
        let (dir, config) = empty_dir_config();
        std::fs::write(dir.path().join("vocab.json"), "[]").unwrap();
        std::fs::write(dir.path().join("lstm_emotion.json"), "{}").unwrap();
        let mut classifier = EmotionClassifier::new(config).unwrap();
        let err = classifier.predict("I am happy").unwrap_err();
        assert!(matches!(err, ModelError::Artifact(_)));
    }

    #[test]
    fn inference_failure_is_an_error() {
        let mut classifier =
            EmotionClassifier::with_model(ClassifierConfig::default(), Box::new(FailingModel));
        assert!(matches!(
            classifier.predict("anything"),
            Err(ModelError::Inference(_))
        ));
    }

    #[test]
    fn loaded_model_predicts() {
        let mut classifier = EmotionClassifier::with_model(
            ClassifierConfig::default(),
            Box::new(FixedModel(EmotionLabel::Surprise)),
        );
        let p = classifier.predict("what?!").unwrap();
        assert_eq!(p.label, EmotionLabel::Surprise);
        assert_eq!(p.confidence(), 1.0);
    }

    #[test]
    fn invalid_config_rejected() {
        let config = ClassifierConfig {
            max_len: 0,
            ..Default::default()
        };
        assert!(EmotionClassifier::new(config).is_err());
    }
}
