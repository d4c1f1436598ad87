//! Pretrained transformer emotion model via ONNX Runtime.
//!
//! Expects a sequence-classification export (e.g. a fine-tuned DistilRoBERTa)
//! whose first output is `[1, 7]` logits, plus its HuggingFace
//! `tokenizer.json`.
//!
//! ```text
//! text → tokenizer (truncate 128) → ONNX model → logits → softmax
//! ```

use crate::config::ClassifierConfig;
use crate::error::{ModelError, Result};
use crate::label::{EmotionDistribution, EmotionLabel, LABEL_COUNT};
use crate::model::EmotionModel;
use ort::session::{Session, SessionInputValue, SessionInputs};
use ort::value::Tensor;
use std::collections::HashMap;
use tracing::info;

/// ONNX sequence classifier with its tokenizer.
pub struct TransformerModel {
    session: Session,
    tokenizer: tokenizers::Tokenizer,
    /// Label for each logit position.
    labels: Vec<EmotionLabel>,
    token_type_ids: bool,
}

impl std::fmt::Debug for TransformerModel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TransformerModel")
            .field("labels", &self.labels)
            .finish_non_exhaustive()
    }
}

impl TransformerModel {
    /// Load the ONNX model and tokenizer named by `config`.
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::MissingArtifact`] if either file is absent and
    /// [`ModelError::Artifact`] / [`ModelError::Tokenizer`] if loading fails.
    pub fn load(config: &ClassifierConfig) -> Result<Self> {
        let model_path = config.transformer_model_path();
        let tokenizer_path = config.transformer_tokenizer_path();
        for path in [&model_path, &tokenizer_path] {
            if !path.exists() {
                return Err(ModelError::MissingArtifact(path.clone()));
            }
        }

        info!("loading transformer ONNX model: {}", model_path.display());
        let session = Session::builder()
            .and_then(|b| b.with_intra_threads(config.intra_threads))
            .and_then(|b| b.commit_from_file(&model_path))
            .map_err(|e| ModelError::Artifact(format!("transformer model load failed: {e}")))?;

        info!("loading transformer tokenizer: {}", tokenizer_path.display());
        let mut tokenizer = tokenizers::Tokenizer::from_file(&tokenizer_path)
            .map_err(|e| ModelError::Tokenizer(format!("tokenizer load failed: {e}")))?;

        let truncation = tokenizers::TruncationParams {
            max_length: config.transformer_max_tokens,
            ..Default::default()
        };
        tokenizer
            .with_truncation(Some(truncation))
            .map_err(|e| ModelError::Tokenizer(format!("tokenizer truncation config failed: {e}")))?;
        tokenizer.with_padding(None);

        info!("transformer model ready ({LABEL_COUNT} labels)");

        Ok(Self {
            session,
            tokenizer,
            labels: config.transformer_labels.clone(),
            token_type_ids: config.transformer_token_type_ids,
        })
    }

    fn logits(&mut self, text: &str) -> Result<Vec<f32>> {
        let encoding = self
            .tokenizer
            .encode(text, true)
            .map_err(|e| ModelError::Tokenizer(format!("tokenization failed: {e}")))?;

        let input_ids: Vec<i64> = encoding.get_ids().iter().map(|&id| id as i64).collect();
        let attention_mask: Vec<i64> = encoding
            .get_attention_mask()
            .iter()
            .map(|&m| m as i64)
            .collect();
        let seq_len = input_ids.len();

        let ids_tensor = Tensor::from_array(([1, seq_len], input_ids))
            .map_err(|e| ModelError::Inference(format!("failed to create input_ids tensor: {e}")))?;
        let mask_tensor = Tensor::from_array(([1, seq_len], attention_mask)).map_err(|e| {
            ModelError::Inference(format!("failed to create attention_mask tensor: {e}"))
        })?;

        let mut feed: HashMap<String, SessionInputValue> = HashMap::new();
        feed.insert("input_ids".to_owned(), ids_tensor.into());
        feed.insert("attention_mask".to_owned(), mask_tensor.into());
        if self.token_type_ids {
            let types: Vec<i64> = encoding.get_type_ids().iter().map(|&t| t as i64).collect();
            let type_tensor = Tensor::from_array(([1, seq_len], types)).map_err(|e| {
                ModelError::Inference(format!("failed to create token_type_ids tensor: {e}"))
            })?;
            feed.insert("token_type_ids".to_owned(), type_tensor.into());
        }

        let outputs = self
            .session
            .run(SessionInputs::from(feed))
            .map_err(|e| ModelError::Inference(format!("ONNX inference failed: {e}")))?;

        let (_shape, data) = outputs[0_usize]
            .try_extract_tensor::<f32>()
            .map_err(|e| ModelError::Inference(format!("failed to extract logits: {e}")))?;
        Ok(data.to_vec())
    }
}

/// Reorder model-order logits into label declaration order.
fn reorder_logits(logits: &[f32], labels: &[EmotionLabel]) -> Result<[f32; LABEL_COUNT]> {
    if logits.len() != labels.len() {
        return Err(ModelError::Inference(format!(
            "model produced {} logits for {} labels",
            logits.len(),
            labels.len()
        )));
    }
    let mut ordered = [0.0f32; LABEL_COUNT];
    for (label, &logit) in labels.iter().zip(logits) {
        ordered[label.index()] = logit;
    }
    Ok(ordered)
}

impl EmotionModel for TransformerModel {
    fn name(&self) -> &'static str {
        "transformer"
    }

    fn scores(&mut self, text: &str) -> Result<EmotionDistribution> {
        let logits = self.logits(text)?;
        let ordered = reorder_logits(&logits, &self.labels)?;
        EmotionDistribution::from_logits(&ordered)
            .ok_or_else(|| ModelError::Inference("transformer produced non-finite logits".into()))
    }
}
