//! Error types for the sentio session layer.

use sentio_model::ModelError;

/// Top-level error type for conversation tracking and the API surface.
#[derive(Debug, thiserror::Error)]
pub enum SentioError {
    /// Caller supplied unusable input (blank message, unknown format).
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// The operation needs conversation data that does not exist yet.
    #[error("no data: {0}")]
    NoData(String),

    /// Emotion model loading or inference error.
    #[error("model error: {0}")]
    Model(#[from] ModelError),

    /// Cluster plot rendering or writing failed.
    #[error("render error: {0}")]
    Render(String),

    /// Configuration error.
    #[error("config error: {0}")]
    Config(String),

    /// Internal invariant broken (poisoned lock, failed background task).
    #[error("internal error: {0}")]
    Internal(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Coarse classification used to pick an HTTP status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// The request itself was wrong.
    InvalidInput,
    /// Nothing to operate on yet.
    NoData,
    /// Everything else.
    Internal,
}

impl SentioError {
    /// Classify this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidInput(_) => ErrorKind::InvalidInput,
            Self::NoData(_) => ErrorKind::NoData,
            Self::Model(_)
            | Self::Render(_)
            | Self::Config(_)
            | Self::Internal(_)
            | Self::Io(_)
            | Self::Json(_) => ErrorKind::Internal,
        }
    }
}

/// Convenience result type.
pub type Result<T> = std::result::Result<T, SentioError>;
