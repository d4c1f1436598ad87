//! Offline classifier evaluation on a labelled `text;label` file.
//!
//! Produces a confusion matrix and per-label precision / recall / F1 over
//! the labels that occur in either the gold or the predicted column, in
//! declaration order.

use crate::error::{Result, SentioError};
use sentio_model::{EmotionClassifier, EmotionLabel};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;
use tracing::{info, warn};

/// A gold-labelled example.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LabelledText {
    pub text: String,
    pub label: EmotionLabel,
}

/// Precision, recall and F1 for one label.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LabelMetrics {
    pub precision: f64,
    pub recall: f64,
    pub f1: f64,
    /// Gold examples with this label.
    pub support: usize,
}

/// Averaged precision, recall and F1.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct AverageMetrics {
    pub precision: f64,
    pub recall: f64,
    pub f1: f64,
}

/// Result of [`evaluate`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvaluationReport {
    /// Row and column order of `confusion`.
    pub labels: Vec<EmotionLabel>,
    /// `confusion[actual][predicted]` counts.
    pub confusion: Vec<Vec<usize>>,
    pub per_label: BTreeMap<EmotionLabel, LabelMetrics>,
    pub accuracy: f64,
    pub macro_avg: AverageMetrics,
    pub weighted_avg: AverageMetrics,
    pub total: usize,
}

/// Read `text;label` lines, splitting at the first `;`.
///
/// Lines without a `;` are skipped, as are lines whose label is not a known
/// emotion (with a warning).
///
/// # Errors
///
/// Returns an error if the file cannot be read.
pub fn load_labelled(path: &Path) -> Result<Vec<LabelledText>> {
    let content = std::fs::read_to_string(path)?;
    let mut samples = Vec::new();
    for (lineno, line) in content.lines().enumerate() {
        let Some((text, label)) = line.trim().split_once(';') else {
            continue;
        };
        match label.parse::<EmotionLabel>() {
            Ok(label) => samples.push(LabelledText {
                text: text.to_owned(),
                label,
            }),
            Err(e) => warn!("{}:{}: {e}, skipping", path.display(), lineno + 1),
        }
    }
    info!("loaded {} labelled examples from {}", samples.len(), path.display());
    Ok(samples)
}

/// Classify every sample and score the predictions.
///
/// # Errors
///
/// Returns [`SentioError::NoData`] for an empty sample set and
/// [`SentioError::Model`] if a prediction fails.
pub fn evaluate(
    classifier: &mut EmotionClassifier,
    samples: &[LabelledText],
) -> Result<EvaluationReport> {
    if samples.is_empty() {
        return Err(SentioError::NoData("no labelled examples to evaluate".into()));
    }
    let mut pairs = Vec::with_capacity(samples.len());
    for sample in samples {
        let predicted = classifier.predict(&sample.text)?.label;
        pairs.push((sample.label, predicted));
    }
    let report = EvaluationReport::from_pairs(&pairs)?;
    info!(
        total = report.total,
        accuracy = report.accuracy,
        "evaluation finished"
    );
    Ok(report)
}

impl EvaluationReport {
    /// Score `(actual, predicted)` pairs.
    ///
    /// # Errors
    ///
    /// Returns [`SentioError::NoData`] if `pairs` is empty.
    pub fn from_pairs(pairs: &[(EmotionLabel, EmotionLabel)]) -> Result<Self> {
        if pairs.is_empty() {
            return Err(SentioError::NoData("no predictions to score".into()));
        }

        let labels: Vec<EmotionLabel> = EmotionLabel::ALL
            .into_iter()
            .filter(|l| pairs.iter().any(|(a, p)| a == l || p == l))
            .collect();
        let position = |label: EmotionLabel| labels.iter().position(|l| *l == label);

        let mut confusion = vec![vec![0usize; labels.len()]; labels.len()];
        for &(actual, predicted) in pairs {
            if let (Some(a), Some(p)) = (position(actual), position(predicted)) {
                confusion[a][p] += 1;
            }
        }

        let total = pairs.len();
        let correct: usize = (0..labels.len()).map(|i| confusion[i][i]).sum();

        let mut per_label = BTreeMap::new();
        for (i, &label) in labels.iter().enumerate() {
            let tp = confusion[i][i] as f64;
            let support: usize = confusion[i].iter().sum();
            let predicted: usize = confusion.iter().map(|row| row[i]).sum();
            let precision = ratio(tp, predicted as f64);
            let recall = ratio(tp, support as f64);
            let f1 = ratio(2.0 * precision * recall, precision + recall);
            per_label.insert(
                label,
                LabelMetrics {
                    precision,
                    recall,
                    f1,
                    support,
                },
            );
        }

        let n = per_label.len() as f64;
        let mut macro_avg = AverageMetrics::default();
        let mut weighted_avg = AverageMetrics::default();
        for m in per_label.values() {
            let w = m.support as f64 / total as f64;
            macro_avg.precision += m.precision / n;
            macro_avg.recall += m.recall / n;
            macro_avg.f1 += m.f1 / n;
            weighted_avg.precision += m.precision * w;
            weighted_avg.recall += m.recall * w;
            weighted_avg.f1 += m.f1 * w;
        }

        Ok(Self {
            labels,
            confusion,
            per_label,
            accuracy: correct as f64 / total as f64,
            macro_avg,
            weighted_avg,
            total,
        })
    }
}

/// `num / den`, 0 when the denominator is 0.
fn ratio(num: f64, den: f64) -> f64 {
    if den == 0.0 { 0.0 } else { num / den }
}

impl fmt::Display for EvaluationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Confusion matrix (rows = actual, columns = predicted):")?;
        write!(f, "{:>10}", "")?;
        for label in &self.labels {
            write!(f, "{:>10}", label.as_str())?;
        }
        writeln!(f)?;
        for (label, row) in self.labels.iter().zip(&self.confusion) {
            write!(f, "{:>10}", label.as_str())?;
            for n in row {
                write!(f, "{n:>10}")?;
            }
            writeln!(f)?;
        }

        writeln!(f)?;
        writeln!(
            f,
            "{:>12}{:>11}{:>11}{:>11}{:>11}",
            "", "precision", "recall", "f1-score", "support"
        )?;
        for (label, m) in &self.per_label {
            writeln!(
                f,
                "{:>12}{:>11.3}{:>11.3}{:>11.3}{:>11}",
                label.as_str(),
                m.precision,
                m.recall,
                m.f1,
                m.support
            )?;
        }
        writeln!(f)?;
        writeln!(
            f,
            "{:>12}{:>11}{:>11}{:>11.3}{:>11}",
            "accuracy", "", "", self.accuracy, self.total
        )?;
        for (name, avg) in [("macro avg", &self.macro_avg), ("weighted avg", &self.weighted_avg)] {
            writeln!(
                f,
                "{:>12}{:>11.3}{:>11.3}{:>11.3}{:>11}",
                name, avg.precision, avg.recall, avg.f1, self.total
            )?;
        }
        Ok(())
    }
}
