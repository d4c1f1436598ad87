//! A single chat conversation: classifier, memory and reply catalog.
//!
//! [`ChatSession`] is created once at startup and shared by reference
//! (`Arc<ChatSession>` in the server). The classifier and the memory sit
//! behind separate mutexes; reads copy a snapshot under the memory lock and
//! compute after releasing it.

use crate::clusters::{self, ClusterReport};
use crate::config::{ClusterConfig, SentioConfig};
use crate::error::{Result, SentioError};
use crate::export::{self, ExportFormat, HistoryItem};
use crate::memory::{ConversationEntry, EmotionMemory};
use crate::responses::{Recommendations, ResponseCatalog};
use crate::stats::{self, EmotionStatistics, TransitionMatrix};
use sentio_model::{EmotionClassifier, EmotionLabel, Prediction};
use serde::Serialize;
use std::sync::{Mutex, MutexGuard};
use tracing::info;
use uuid::Uuid;

/// Everything produced by one user message.
#[derive(Debug, Clone, Serialize)]
pub struct ChatTurn {
    /// The recorded entry.
    pub entry: ConversationEntry,
    /// Classifier output for the message.
    pub prediction: Prediction,
    /// Bot reply chosen for the predicted label.
    pub reply: String,
    /// Transition matrix including this message.
    pub transitions: TransitionMatrix,
    /// Statistics including this message.
    pub statistics: EmotionStatistics,
}

/// Conversation-level summary with recommendations for the dominant emotion.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StatsReport {
    pub transition_matrix: TransitionMatrix,
    pub statistics: EmotionStatistics,
    /// Empty when nothing is configured for `statistics.most_common`.
    pub recommendations: Recommendations,
}

/// One conversation's state.
pub struct ChatSession {
    id: Uuid,
    classifier: Mutex<EmotionClassifier>,
    memory: Mutex<EmotionMemory>,
    catalog: ResponseCatalog,
    clusters: ClusterConfig,
}

impl std::fmt::Debug for ChatSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChatSession")
            .field("id", &self.id)
            .field("clusters", &self.clusters)
            .finish_non_exhaustive()
    }
}

impl ChatSession {
    /// Build a session from configuration.
    ///
    /// Loads the reply catalog now; the classifier loads its model on the
    /// first message.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid or a catalog file
    /// is malformed.
    pub fn new(config: &SentioConfig) -> Result<Self> {
        config.validate()?;
        let classifier = EmotionClassifier::new(config.classifier.clone())?;
        let catalog = ResponseCatalog::load(&config.responses)?;
        Ok(Self::from_parts(classifier, catalog, config.clusters.clone()))
    }

    /// Assemble a session from already-built parts.
    pub fn from_parts(
        classifier: EmotionClassifier,
        catalog: ResponseCatalog,
        clusters: ClusterConfig,
    ) -> Self {
        let id = Uuid::new_v4();
        info!(session = %id, "chat session started");
        Self {
            id,
            classifier: Mutex::new(classifier),
            memory: Mutex::new(EmotionMemory::new()),
            catalog,
            clusters,
        }
    }

    /// Unique id of this session.
    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Classify `message`, record it and choose a reply.
    ///
    /// # Errors
    ///
    /// Returns [`SentioError::InvalidInput`] for a blank message and
    /// [`SentioError::Model`] if classification fails. Nothing is recorded
    /// on error.
    pub fn predict(&self, message: &str) -> Result<ChatTurn> {
        let text = message.trim();
        if text.is_empty() {
            return Err(SentioError::InvalidInput(
                "Message field missing or empty".into(),
            ));
        }

        let prediction = lock(&self.classifier)?.predict(text)?;

        let (entry, snapshot) = {
            let mut memory = lock(&self.memory)?;
            let entry = memory.record_prediction(text, &prediction)?.clone();
            (entry, memory.snapshot())
        };

        let reply = self
            .catalog
            .reply_for(prediction.label, &mut rand::thread_rng())
            .to_owned();
        info!(
            session = %self.id,
            index = entry.index,
            emotion = %prediction.label,
            "predicted emotion"
        );

        Ok(ChatTurn {
            transitions: stats::transition_matrix(&snapshot),
            statistics: stats::statistics(&snapshot),
            entry,
            prediction,
            reply,
        })
    }

    /// Record a message with a known label, bypassing the classifier.
    ///
    /// # Errors
    ///
    /// Returns [`SentioError::InvalidInput`] if `text` is blank.
    pub fn record(&self, text: &str, label: EmotionLabel) -> Result<ConversationEntry> {
        Ok(lock(&self.memory)?.record(text, label)?.clone())
    }

    /// Copy of the conversation so far.
    ///
    /// # Errors
    ///
    /// Returns [`SentioError::Internal`] if the memory lock is poisoned.
    pub fn snapshot(&self) -> Result<Vec<ConversationEntry>> {
        Ok(lock(&self.memory)?.snapshot())
    }

    /// Number of recorded messages.
    pub fn len(&self) -> Result<usize> {
        Ok(lock(&self.memory)?.len())
    }

    /// Whether nothing has been recorded yet.
    pub fn is_empty(&self) -> Result<bool> {
        Ok(lock(&self.memory)?.is_empty())
    }

    pub fn transition_matrix(&self) -> Result<TransitionMatrix> {
        Ok(stats::transition_matrix(&self.snapshot()?))
    }

    pub fn statistics(&self) -> Result<EmotionStatistics> {
        Ok(stats::statistics(&self.snapshot()?))
    }

    /// Transitions, statistics and recommendations for the most common label.
    pub fn stats_report(&self) -> Result<StatsReport> {
        let snapshot = self.snapshot()?;
        let statistics = stats::statistics(&snapshot);
        let recommendations = statistics
            .most_common
            .and_then(|label| self.catalog.recommendations_for(label))
            .cloned()
            .unwrap_or_default();
        Ok(StatsReport {
            transition_matrix: stats::transition_matrix(&snapshot),
            statistics,
            recommendations,
        })
    }

    pub fn history(&self) -> Result<Vec<HistoryItem>> {
        Ok(export::history(&self.snapshot()?))
    }

    /// Encode the conversation.
    ///
    /// # Errors
    ///
    /// Returns [`SentioError::NoData`] if nothing has been recorded.
    pub fn export(&self, format: ExportFormat) -> Result<String> {
        export::export(&self.snapshot()?, format)
    }

    /// Render the cluster plot for the conversation so far.
    ///
    /// # Errors
    ///
    /// Returns [`SentioError::Render`] if the plot cannot be written.
    pub fn generate_clusters(&self) -> Result<ClusterReport> {
        clusters::generate_clusters(&self.snapshot()?, &self.clusters)
    }

    /// Forget the conversation. The loaded model is kept.
    pub fn reset(&self) -> Result<()> {
        lock(&self.memory)?.clear();
        info!(session = %self.id, "conversation cleared");
        Ok(())
    }
}

fn lock<T>(mutex: &Mutex<T>) -> Result<MutexGuard<'_, T>> {
    mutex
        .lock()
        .map_err(|_| SentioError::Internal("session lock poisoned".into()))
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used)]

    use super::*;
    use crate::responses::Song;
    use sentio_model::{
        ClassifierConfig, EmotionDistribution, EmotionModel, ModelError,
        Result as ModelResult,
    };
    use std::collections::BTreeMap;
    use std::sync::Arc;

    /// Labels by keyword so tests can steer the conversation.
    struct KeywordModel;

    impl EmotionModel for KeywordModel {
        fn name(&self) -> &'static str {
            "keyword"
        }

        fn scores(&mut self, text: &str) -> ModelResult<EmotionDistribution> {
            let label = if text.contains("happy") {
                EmotionLabel::Joy
            } else if text.contains("sad") {
                EmotionLabel::Sadness
            } else if text.contains("explode") {
                return Err(ModelError::Inference("kaboom".into()));
            } else {
                EmotionLabel::Neutral
            };
            Ok(EmotionDistribution::one_hot(label))
        }
    }

    fn session_with(catalog: ResponseCatalog) -> ChatSession {
        let classifier =
            EmotionClassifier::with_model(ClassifierConfig::default(), Box::new(KeywordModel));
        ChatSession::from_parts(classifier, catalog, ClusterConfig::default())
    }

    fn session() -> ChatSession {
        session_with(ResponseCatalog::default())
    }

    #[test]
    fn predict_records_and_replies() {
        let session = session();
        let turn = session.predict("  I am happy  ").unwrap();
        assert_eq!(turn.prediction.label, EmotionLabel::Joy);
        assert_eq!(turn.entry.text, "I am happy");
        assert_eq!(turn.entry.index, 0);
        assert_eq!(
            turn.reply,
            "That's wonderful! I'm glad you're feeling positive!"
        );
        assert_eq!(turn.statistics.total, 1);
        assert!(turn.transitions.is_empty());
        assert_eq!(session.len().unwrap(), 1);
    }

    #[test]
    fn turn_statistics_include_current_message() {
        let session = session();
        session.predict("I am happy").unwrap();
        let turn = session.predict("feeling sad").unwrap();
        assert_eq!(turn.statistics.total, 2);
        assert_eq!(
            turn.transitions
                .probability(EmotionLabel::Joy, EmotionLabel::Sadness),
            1.0
        );
    }

    #[test]
    fn blank_message_is_rejected() {
        let session = session();
        let err = session.predict("   ").unwrap_err();
        assert!(matches!(err, SentioError::InvalidInput(_)));
        assert!(session.is_empty().unwrap());
    }

    #[test]
    fn failed_prediction_records_nothing() {
        let session = session();
        let err = session.predict("explode").unwrap_err();
        assert!(matches!(err, SentioError::Model(_)));
        assert!(session.is_empty().unwrap());
    }

    #[test]
    fn missing_model_falls_back_to_neutral() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = SentioConfig::default();
        config.classifier.model_dir = dir.path().join("models");
        config.responses.responses_path = dir.path().join("none.json");
        config.responses.recommendations_path = dir.path().join("none2.json");
        let session = ChatSession::new(&config).unwrap();

        let turn = session.predict("I am happy").unwrap();
        assert_eq!(turn.prediction.label, EmotionLabel::Neutral);
        assert_eq!(turn.prediction.distribution, EmotionDistribution::uniform());
        assert_eq!(session.len().unwrap(), 1);
    }

    #[test]
    fn stats_report_uses_most_common_recommendations() {
        let recs = Recommendations {
            songs: vec![Song {
                title: "Walking on Sunshine".into(),
                url: "https://example.com/sunshine".into(),
            }],
            quotes: vec![],
        };
        let catalog = ResponseCatalog::new(
            BTreeMap::new(),
            BTreeMap::from([(EmotionLabel::Joy, recs.clone())]),
        );
        let session = session_with(catalog);

        assert_eq!(session.stats_report().unwrap().recommendations, Recommendations::default());

        session.predict("happy").unwrap();
        session.predict("sad").unwrap();
        session.predict("happy again").unwrap();
        let report = session.stats_report().unwrap();
        assert_eq!(report.statistics.most_common, Some(EmotionLabel::Joy));
        assert_eq!(report.recommendations, recs);
    }

    #[test]
    fn export_and_history_reflect_memory() {
        let session = session();
        assert!(matches!(
            session.export(ExportFormat::Csv),
            Err(SentioError::NoData(_))
        ));
        session.record("hello", EmotionLabel::Surprise).unwrap();
        let csv = session.export(ExportFormat::Csv).unwrap();
        assert!(csv.ends_with("0,\"hello\",surprise\n"));
        assert_eq!(session.history().unwrap()[0].emotion, EmotionLabel::Surprise);
    }

    #[test]
    fn reset_clears_conversation() {
        let session = session();
        session.predict("happy").unwrap();
        session.reset().unwrap();
        assert!(session.is_empty().unwrap());
        assert_eq!(session.predict("sad").unwrap().entry.index, 0);
    }

    #[test]
    fn concurrent_predictions_keep_indices_unique() {
        let session = Arc::new(session());
        let handles: Vec<_> = (0..8)
            .map(|i| {
                let session = Arc::clone(&session);
                std::thread::spawn(move || {
                    for j in 0..10 {
                        session.predict(&format!("happy {i} {j}")).unwrap();
                    }
                })
            })
            .collect();
        for h in handles {
            h.join().unwrap();
        }
        let snapshot = session.snapshot().unwrap();
        assert_eq!(snapshot.len(), 80);
        for (i, entry) in snapshot.iter().enumerate() {
            assert_eq!(entry.index, i as u64);
        }
    }

    #[test]
    fn session_ids_differ() {
        assert_ne!(session().id(), session().id());
    }

    #[test]
    fn session_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<ChatSession>();
    }
}
