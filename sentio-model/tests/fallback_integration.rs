//! Integration tests for the classifier facade against on-disk artifacts.
//!
//! Artifacts are written into temporary directories; no network or ONNX
//! runtime is needed except for the ignored transformer test in
//! `models::transformer`.

use sentio_model::models::{BaselineArtifact, LstmArtifact, LstmDirection, LstmLayer};
use sentio_model::{
    Backend, ClassifierConfig, EmotionClassifier, EmotionLabel, ModelError, Vocabulary,
    LABEL_COUNT,
};
use std::collections::HashMap;
use std::path::Path;

fn config_for(dir: &Path, backend: Backend) -> ClassifierConfig {
    ClassifierConfig {
        backend,
        model_dir: dir.to_path_buf(),
        max_len: 8,
        ..Default::default()
    }
}

fn write_baseline(dir: &Path) {
    let artifact = BaselineArtifact {
        vocabulary: HashMap::from([
            ("happy".to_owned(), 0),
            ("sad".to_owned(), 1),
            ("scared".to_owned(), 2),
        ]),
        idf: vec![1.0, 1.0, 1.0],
        classes: vec!["fear".into(), "joy".into(), "neutral".into(), "sadness".into()],
        coef: vec![
            vec![0.0, 0.0, 5.0],
            vec![5.0, 0.0, 0.0],
            vec![0.0, 0.0, 0.0],
            vec![0.0, 5.0, 0.0],
        ],
        intercept: vec![0.0, 0.0, 1.0, 0.0],
    };
    let json = serde_json::to_string(&artifact).expect("serialize baseline");
    std::fs::write(dir.join("baseline.json"), json).expect("write baseline");
}

fn zero_direction(h: usize, input: usize) -> LstmDirection {
    LstmDirection {
        w_ih: vec![0.0; 4 * h * input],
        w_hh: vec![0.0; 4 * h * h],
        b_ih: vec![0.0; 4 * h],
        b_hh: vec![0.0; 4 * h],
    }
}

#[test]
fn baseline_backend_classifies_from_disk() {
    let dir = tempfile::tempdir().expect("tempdir");
    write_baseline(dir.path());
    let mut classifier =
        EmotionClassifier::new(config_for(dir.path(), Backend::Baseline)).expect("classifier");

    assert_eq!(classifier.predict("so happy").expect("joy").label, EmotionLabel::Joy);
    assert_eq!(classifier.predict("I feel sad").expect("sad").label, EmotionLabel::Sadness);
    assert_eq!(classifier.predict("scared").expect("fear").label, EmotionLabel::Fear);
    assert_eq!(classifier.predict("the bus").expect("neutral").label, EmotionLabel::Neutral);
    assert!(classifier.is_loaded());
}

#[test]
fn every_prediction_is_a_distribution() {
    let dir = tempfile::tempdir().expect("tempdir");
    write_baseline(dir.path());
    let mut classifier =
        EmotionClassifier::new(config_for(dir.path(), Backend::Baseline)).expect("classifier");
    for text in ["happy", "sad sad happy", "", "   ", "unknown words only"] {
        let p = classifier.predict(text).expect("predict");
        assert!((p.distribution.total() - 1.0).abs() < 1e-5, "{text:?}");
        assert!(p.confidence() > 0.0 && p.confidence() <= 1.0);
    }
}

#[test]
fn lstm_backend_with_zero_weights_is_uniform() {
    let dir = tempfile::tempdir().expect("tempdir");
    let vocab = Vocabulary::build(["i am happy", "i am sad"], 1, 100);
    vocab.save(&dir.path().join("vocab.json")).expect("save vocab");

    let (e, h) = (2, 2);
    let artifact = LstmArtifact {
        vocab_size: vocab.len(),
        embed_dim: e,
        hidden_dim: h,
        embedding: vec![0.5; vocab.len() * e],
        layers: vec![LstmLayer {
            forward: zero_direction(h, e),
            backward: zero_direction(h, e),
        }],
        fc_weight: vec![0.0; LABEL_COUNT * 2 * h],
        fc_bias: vec![0.0; LABEL_COUNT],
    };
    std::fs::write(
        dir.path().join("lstm_emotion.json"),
        serde_json::to_string(&artifact).expect("serialize lstm"),
    )
    .expect("write lstm");

    let mut classifier =
        EmotionClassifier::new(config_for(dir.path(), Backend::Lstm)).expect("classifier");
    let p = classifier.predict("i am happy").expect("predict");
    assert!(classifier.is_loaded());
    // Equal logits: the first declared label wins the tie.
    assert_eq!(p.label, EmotionLabel::Anger);
    for (_, prob) in p.distribution.iter() {
        assert!((prob - 1.0 / 7.0).abs() < 1e-5);
    }
}

#[test]
fn half_installed_lstm_falls_back() {
    let dir = tempfile::tempdir().expect("tempdir");
    Vocabulary::new()
        .save(&dir.path().join("vocab.json"))
        .expect("save vocab");
    let mut classifier =
        EmotionClassifier::new(config_for(dir.path(), Backend::Lstm)).expect("classifier");
    let p = classifier.predict("hello there").expect("fallback");
    assert_eq!(p.label, EmotionLabel::Neutral);
    assert!(!classifier.is_loaded());
}

#[test]
fn truncated_weights_are_an_error() {
    let dir = tempfile::tempdir().expect("tempdir");
    Vocabulary::new()
        .save(&dir.path().join("vocab.json"))
        .expect("save vocab");
    std::fs::write(dir.path().join("lstm_emotion.json"), r#"{"vocab_size": 2"#)
        .expect("write");
    let mut classifier =
        EmotionClassifier::new(config_for(dir.path(), Backend::Lstm)).expect("classifier");
    assert!(matches!(
        classifier.predict("hello"),
        Err(ModelError::Artifact(_))
    ));
}
