//! Emotion model backends and the small amount of shared math they need.

pub mod baseline;
pub mod lstm;
pub mod transformer;

pub use baseline::{BagOfWordsModel, BaselineArtifact};
pub use lstm::{LstmArtifact, LstmDirection, LstmLayer, LstmModel};
pub use transformer::TransformerModel;

use crate::config::{Backend, ClassifierConfig};
use crate::error::{ModelError, Result};
use crate::model::EmotionModel;
use serde::de::DeserializeOwned;
use std::path::Path;

/// Load the backend selected by `config`.
///
/// # Errors
///
/// Propagates [`ModelError::MissingArtifact`] untouched so the caller can
/// tell an uninstalled model from a broken one.
pub fn load_backend(config: &ClassifierConfig) -> Result<Box<dyn EmotionModel>> {
    let model: Box<dyn EmotionModel> = match config.backend {
        Backend::Lstm => Box::new(LstmModel::load(
            &config.vocab_path(),
            &config.lstm_path(),
            config.max_len,
        )?),
        Backend::Baseline => Box::new(BagOfWordsModel::load(&config.baseline_path())?),
        Backend::Transformer => Box::new(TransformerModel::load(config)?),
    };
    Ok(model)
}

/// Read and parse a JSON artifact.
pub(crate) fn load_json<T: DeserializeOwned>(path: &Path) -> Result<T> {
    if !path.exists() {
        return Err(ModelError::MissingArtifact(path.to_path_buf()));
    }
    let content = std::fs::read_to_string(path)?;
    serde_json::from_str(&content)
        .map_err(|e| ModelError::Artifact(format!("{}: {e}", path.display())))
}

/// Softmax over arbitrary-length logits. `None` if any logit is not finite.
pub(crate) fn softmax(logits: &[f32]) -> Option<Vec<f32>> {
    if logits.is_empty() || logits.iter().any(|l| !l.is_finite()) {
        return None;
    }
    let max = logits.iter().copied().fold(f32::NEG_INFINITY, f32::max);
    let exps: Vec<f32> = logits.iter().map(|l| (l - max).exp()).collect();
    let sum: f32 = exps.iter().sum();
    Some(exps.into_iter().map(|e| e / sum).collect())
}

pub(crate) fn sigmoid(x: f32) -> f32 {
    1.0 / (1.0 + (-x).exp())
}

pub(crate) fn dot(a: &[f32], b: &[f32]) -> f32 {
    a.iter().zip(b).map(|(x, y)| x * y).sum()
}

/// `out += W · x` for row-major `W` of shape `[out.len()][x.len()]`.
pub(crate) fn matvec_add(w: &[f32], x: &[f32], out: &mut [f32]) {
    let cols = x.len();
    for (r, o) in out.iter_mut().enumerate() {
        *o += dot(&w[r * cols..(r + 1) * cols], x);
    }
}

/// Scale `v` to unit length in place; zero vectors are left alone.
pub(crate) fn l2_normalize(v: &mut [f32]) {
    let norm: f32 = v.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm < 1e-12 {
        return;
    }
    for x in v {
        *x /= norm;
    }
}
