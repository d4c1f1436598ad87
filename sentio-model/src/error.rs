//! Error types for the sentio-model crate.
//!
//! A missing artifact is reported separately from a broken one so the
//! classifier facade can fall back on the former and surface the latter.

use std::path::PathBuf;

/// Errors that can occur while loading or running an emotion model.
#[derive(Debug, thiserror::Error)]
pub enum ModelError {
    /// A required model or vocabulary file does not exist.
    #[error("missing model artifact: {}", .0.display())]
    MissingArtifact(PathBuf),

    /// An artifact exists but is malformed or inconsistent.
    #[error("invalid model artifact: {0}")]
    Artifact(String),

    /// Tokenizer construction or encoding failed.
    #[error("tokenizer error: {0}")]
    Tokenizer(String),

    /// Model inference failed.
    #[error("inference error: {0}")]
    Inference(String),

    /// Invalid classifier configuration.
    #[error("config error: {0}")]
    Config(String),

    /// I/O error while reading or writing an artifact.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Convenience type alias for sentio-model results.
pub type Result<T> = std::result::Result<T, ModelError>;
