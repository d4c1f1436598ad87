//! Sentio: emotion-aware chat companion.
//!
//! Every user message is classified into one of seven emotions and appended
//! to the session's conversation log:
//! Message → Classifier → Emotion Memory → Statistics / Clusters → Reply
//!
//! # Architecture
//!
//! - **Classifier**: BiLSTM, TF-IDF baseline or ONNX transformer, from the
//!   `sentio-model` crate
//! - **Memory**: append-only log of classified messages
//! - **Stats**: transition matrix and label statistics, derived on demand
//! - **Clusters**: 2D projection of the stored distributions rendered to PNG
//! - **Responses**: canned replies and recommendations keyed by emotion
//! - **Server**: HTTP API over a shared [`ChatSession`]

pub mod clusters;
pub mod config;
pub mod error;
pub mod evaluation;
pub mod export;
pub mod logging;
pub mod memory;
pub mod responses;
pub mod sentio_dirs;
pub mod server;
pub mod session;
pub mod stats;

pub use config::SentioConfig;
pub use error::{ErrorKind, Result, SentioError};
pub use memory::{ConversationEntry, EmotionMemory};
pub use session::{ChatSession, ChatTurn};
pub use stats::{EmotionStatistics, TransitionMatrix};

pub use sentio_model::{EmotionDistribution, EmotionLabel, Prediction};
