//! End-to-end conversation tracking through the public API.

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]

use sentio::clusters::ClusterReport;
use sentio::config::ClusterConfig;
use sentio::export::ExportFormat;
use sentio::responses::ResponseCatalog;
use sentio::{ChatSession, EmotionLabel, EmotionMemory, SentioConfig, SentioError};
use sentio_model::{ClassifierConfig, EmotionClassifier};

fn session_in(dir: &std::path::Path) -> ChatSession {
    let classifier = EmotionClassifier::new(ClassifierConfig {
        model_dir: dir.join("models"),
        ..Default::default()
    })
    .unwrap();
    let clusters = ClusterConfig {
        output_path: dir.join("static").join("clusters.png"),
        ..Default::default()
    };
    ChatSession::from_parts(classifier, ResponseCatalog::default(), clusters)
}

#[test]
fn happy_sad_happy_scenario() {
    let mut memory = EmotionMemory::new();
    memory.record("I am happy", EmotionLabel::Joy).unwrap();
    memory.record("feeling sad", EmotionLabel::Sadness).unwrap();
    memory.record("I am happy", EmotionLabel::Joy).unwrap();

    let stats = memory.statistics();
    assert_eq!(stats.total, 3);
    assert_eq!(stats.counts.len(), 2);
    assert_eq!(stats.counts[&EmotionLabel::Joy], 2);
    assert_eq!(stats.counts[&EmotionLabel::Sadness], 1);
    assert_eq!(stats.most_common, Some(EmotionLabel::Joy));

    let matrix = memory.transition_matrix();
    assert_eq!(matrix.probability(EmotionLabel::Joy, EmotionLabel::Sadness), 1.0);
    assert_eq!(matrix.probability(EmotionLabel::Sadness, EmotionLabel::Joy), 1.0);
    assert_eq!(matrix.rows().count(), 2);
}

#[test]
fn uninstalled_model_still_tracks_the_conversation() {
    let dir = tempfile::tempdir().unwrap();
    let session = session_in(dir.path());

    for text in ["hello", "how are you", "fine thanks"] {
        let turn = session.predict(text).unwrap();
        assert_eq!(turn.prediction.label, EmotionLabel::Neutral);
        assert!((turn.prediction.distribution.total() - 1.0).abs() < 1e-5);
        assert_eq!(turn.reply, "I'm here to listen. How can I help you today?");
    }
    let stats = session.statistics().unwrap();
    assert_eq!(stats.counts[&EmotionLabel::Neutral], 3);
    assert_eq!(
        session
            .transition_matrix()
            .unwrap()
            .probability(EmotionLabel::Neutral, EmotionLabel::Neutral),
        1.0
    );
}

#[test]
fn clusters_need_five_entries() {
    let dir = tempfile::tempdir().unwrap();
    let session = session_in(dir.path());
    let labels = [
        EmotionLabel::Joy,
        EmotionLabel::Sadness,
        EmotionLabel::Anger,
        EmotionLabel::Fear,
        EmotionLabel::Surprise,
    ];

    for (n, label) in labels.iter().enumerate() {
        let report = session.generate_clusters().unwrap();
        assert!(
            matches!(report, ClusterReport::NotEnoughData { have, need: 5 } if have == n),
            "{n} entries should not be enough"
        );
        session.record(&format!("message {n}"), *label).unwrap();
    }

    match session.generate_clusters().unwrap() {
        ClusterReport::Generated { path, points } => {
            assert!(path.exists());
            assert_eq!(points.len(), 5);
        }
        other => panic!("expected a plot, got {other:?}"),
    }
}

#[test]
fn csv_export_quotes_text() {
    let dir = tempfile::tempdir().unwrap();
    let session = session_in(dir.path());
    session
        .record(r#"He said "hi, there""#, EmotionLabel::Joy)
        .unwrap();
    let csv = session.export(ExportFormat::Csv).unwrap();
    assert_eq!(
        csv,
        "timestamp,text,emotion\n0,\"He said \"\"hi, there\"\"\",joy\n"
    );
}

#[test]
fn blank_message_records_nothing() {
    let dir = tempfile::tempdir().unwrap();
    let session = session_in(dir.path());
    assert!(matches!(
        session.predict(" \t "),
        Err(SentioError::InvalidInput(_))
    ));
    assert!(matches!(
        session.export(ExportFormat::Json),
        Err(SentioError::NoData(_))
    ));
}

#[test]
fn session_from_config_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.toml");
    let mut config = SentioConfig::default();
    config.classifier.model_dir = dir.path().join("models");
    config.responses.responses_path = dir.path().join("responses.json");
    config.responses.recommendations_path = dir.path().join("recommendations.json");
    std::fs::write(&config.responses.responses_path, r#"{"neutral": ["Mm-hm."]}"#).unwrap();
    config.save_to_file(&path).unwrap();

    let loaded = SentioConfig::load_or_default(Some(&path)).unwrap();
    let session = ChatSession::new(&loaded).unwrap();
    assert_eq!(session.predict("the weather").unwrap().reply, "Mm-hm.");
}
