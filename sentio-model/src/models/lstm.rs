//! Bidirectional LSTM emotion model.
//!
//! ```text
//! ids → embedding → BiLSTM × num_layers → mean over time → linear → softmax
//! ```
//!
//! Weights use PyTorch layout: gate blocks ordered input, forget, cell,
//! output; matrices stored row-major. Pooling averages every one of the
//! `max_len` steps, padding included, to match how the weights were fitted.

use super::{load_json, matvec_add, sigmoid};
use crate::error::{ModelError, Result};
use crate::label::{EmotionDistribution, LABEL_COUNT};
use crate::model::EmotionModel;
use crate::tokenize::Vocabulary;
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::info;

/// Weights for one direction of one LSTM layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LstmDirection {
    /// `[4 * hidden][input]`
    pub w_ih: Vec<f32>,
    /// `[4 * hidden][hidden]`
    pub w_hh: Vec<f32>,
    /// `[4 * hidden]`
    pub b_ih: Vec<f32>,
    /// `[4 * hidden]`
    pub b_hh: Vec<f32>,
}

/// Forward and backward weights for one layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LstmLayer {
    pub forward: LstmDirection,
    pub backward: LstmDirection,
}

/// On-disk form of the LSTM checkpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LstmArtifact {
    pub vocab_size: usize,
    pub embed_dim: usize,
    pub hidden_dim: usize,
    /// `[vocab_size][embed_dim]`
    pub embedding: Vec<f32>,
    pub layers: Vec<LstmLayer>,
    /// `[7][2 * hidden_dim]`
    pub fc_weight: Vec<f32>,
    /// `[7]`
    pub fc_bias: Vec<f32>,
}

impl LstmArtifact {
    fn validate(&self) -> Result<()> {
        let bad = |what: String| Err(ModelError::Artifact(format!("lstm {what}")));
        if self.vocab_size == 0 || self.embed_dim == 0 || self.hidden_dim == 0 {
            return bad("dimensions must be greater than 0".into());
        }
        if self.layers.is_empty() {
            return bad("checkpoint has no layers".into());
        }
        if self.embedding.len() != self.vocab_size * self.embed_dim {
            return bad(format!(
                "embedding has {} values, expected {}",
                self.embedding.len(),
                self.vocab_size * self.embed_dim
            ));
        }
        let h = self.hidden_dim;
        for (i, layer) in self.layers.iter().enumerate() {
            let input = if i == 0 { self.embed_dim } else { 2 * h };
            for (dir, w) in [("forward", &layer.forward), ("backward", &layer.backward)] {
                if w.w_ih.len() != 4 * h * input
                    || w.w_hh.len() != 4 * h * h
                    || w.b_ih.len() != 4 * h
                    || w.b_hh.len() != 4 * h
                {
                    return bad(format!("layer {i} {dir} weights have the wrong shape"));
                }
            }
        }
        if self.fc_weight.len() != LABEL_COUNT * 2 * h || self.fc_bias.len() != LABEL_COUNT {
            return bad(format!("output layer must produce {LABEL_COUNT} logits"));
        }
        Ok(())
    }
}

/// Word-level BiLSTM classifier with its vocabulary.
#[derive(Debug, Clone)]
pub struct LstmModel {
    vocab: Vocabulary,
    weights: LstmArtifact,
    max_len: usize,
}

impl LstmModel {
    /// Build a model from an in-memory vocabulary and checkpoint.
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::Artifact`] if shapes are inconsistent or the
    /// vocabulary has ids the embedding cannot index.
    pub fn new(vocab: Vocabulary, weights: LstmArtifact, max_len: usize) -> Result<Self> {
        weights.validate()?;
        if vocab.len() > weights.vocab_size {
            return Err(ModelError::Artifact(format!(
                "vocabulary has {} tokens but embedding only {} rows",
                vocab.len(),
                weights.vocab_size
            )));
        }
        if max_len == 0 {
            return Err(ModelError::Config("max_len must be greater than 0".into()));
        }
        Ok(Self {
            vocab,
            weights,
            max_len,
        })
    }

    /// Load the vocabulary and checkpoint from disk.
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::MissingArtifact`] if either file is absent.
    pub fn load(vocab_path: &Path, weights_path: &Path, max_len: usize) -> Result<Self> {
        // Check both before parsing either so a half-installed model reads as missing.
        for path in [vocab_path, weights_path] {
            if !path.exists() {
                return Err(ModelError::MissingArtifact(path.to_path_buf()));
            }
        }
        let vocab = Vocabulary::load(vocab_path)?;
        let weights: LstmArtifact = load_json(weights_path)?;
        let model = Self::new(vocab, weights, max_len)?;
        info!(
            "loaded LSTM model (embed={}, hidden={}, layers={}) from {}",
            model.weights.embed_dim,
            model.weights.hidden_dim,
            model.weights.layers.len(),
            weights_path.display()
        );
        Ok(model)
    }

    fn embed(&self, ids: &[u32]) -> Vec<Vec<f32>> {
        let e = self.weights.embed_dim;
        ids.iter()
            .map(|&id| {
                let row = id as usize * e;
                self.weights.embedding[row..row + e].to_vec()
            })
            .collect()
    }

    fn forward(&self, ids: &[u32]) -> Result<EmotionDistribution> {
        let h = self.weights.hidden_dim;
        let mut seq = self.embed(ids);
        for layer in &self.weights.layers {
            let fwd = run_direction(&layer.forward, &seq, h, false);
            let bwd = run_direction(&layer.backward, &seq, h, true);
            seq = fwd
                .into_iter()
                .zip(bwd)
                .map(|(mut f, b)| {
                    f.extend(b);
                    f
                })
                .collect();
        }

        let mut pooled = vec![0.0f32; 2 * h];
        for step in &seq {
            for (p, v) in pooled.iter_mut().zip(step) {
                *p += v;
            }
        }
        let steps = seq.len().max(1) as f32;
        for p in &mut pooled {
            *p /= steps;
        }

        let mut logits = self.weights.fc_bias.clone();
        matvec_add(&self.weights.fc_weight, &pooled, &mut logits);
        EmotionDistribution::from_logits(&logits)
            .ok_or_else(|| ModelError::Inference("lstm produced non-finite logits".into()))
    }
}

/// Run one LSTM direction, returning the hidden state at each input position.
fn run_direction(w: &LstmDirection, seq: &[Vec<f32>], h: usize, reverse: bool) -> Vec<Vec<f32>> {
    let mut hidden = vec![0.0f32; h];
    let mut cell = vec![0.0f32; h];
    let mut outputs = vec![Vec::new(); seq.len()];
    let order: Box<dyn Iterator<Item = usize>> = if reverse {
        Box::new((0..seq.len()).rev())
    } else {
        Box::new(0..seq.len())
    };

    for t in order {
        let mut gates: Vec<f32> = w.b_ih.iter().zip(&w.b_hh).map(|(a, b)| a + b).collect();
        matvec_add(&w.w_ih, &seq[t], &mut gates);
        matvec_add(&w.w_hh, &hidden, &mut gates);
        for k in 0..h {
            let i = sigmoid(gates[k]);
            let f = sigmoid(gates[h + k]);
            let g = gates[2 * h + k].tanh();
            let o = sigmoid(gates[3 * h + k]);
            cell[k] = f * cell[k] + i * g;
            hidden[k] = o * cell[k].tanh();
        }
        outputs[t] = hidden.clone();
    }
    outputs
}

impl EmotionModel for LstmModel {
    fn name(&self) -> &'static str {
        "lstm"
    }

    fn scores(&mut self, text: &str) -> Result<EmotionDistribution> {
        let ids = self.vocab.encode(text, self.max_len);
        self.forward(&ids)
    }
}
