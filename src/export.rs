//! Conversation history and export formats.
//!
//! Export records carry the entry's sequence index as `timestamp`, not a
//! wall-clock time, so exports from the same conversation are identical.

use crate::error::{Result, SentioError};
use crate::memory::ConversationEntry;
use sentio_model::EmotionLabel;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// One row of the `/history` listing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryItem {
    pub index: u64,
    pub text: String,
    pub emotion: EmotionLabel,
}

/// One exported conversation row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExportRecord {
    /// Sequence index of the entry.
    pub timestamp: u64,
    pub text: String,
    pub emotion: EmotionLabel,
}

/// Supported export encodings.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    #[default]
    Json,
    Csv,
}

impl ExportFormat {
    /// MIME type of the encoded output.
    pub fn content_type(&self) -> &'static str {
        match self {
            Self::Json => "application/json",
            Self::Csv => "text/csv",
        }
    }

    /// Suggested download file name.
    pub fn file_name(&self) -> &'static str {
        match self {
            Self::Json => "emotion_conversation.json",
            Self::Csv => "emotion_conversation.csv",
        }
    }
}

impl fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Json => "json",
            Self::Csv => "csv",
        })
    }
}

impl FromStr for ExportFormat {
    type Err = SentioError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "json" => Ok(Self::Json),
            "csv" => Ok(Self::Csv),
            other => Err(SentioError::InvalidInput(format!(
                "unsupported export format: {other:?} (expected json or csv)"
            ))),
        }
    }
}

/// History view of `entries`.
pub fn history(entries: &[ConversationEntry]) -> Vec<HistoryItem> {
    entries
        .iter()
        .map(|e| HistoryItem {
            index: e.index,
            text: e.text.clone(),
            emotion: e.label,
        })
        .collect()
}

/// Export rows for `entries`.
pub fn records(entries: &[ConversationEntry]) -> Vec<ExportRecord> {
    entries
        .iter()
        .map(|e| ExportRecord {
            timestamp: e.index,
            text: e.text.clone(),
            emotion: e.label,
        })
        .collect()
}

/// Encode `entries` in `format`.
///
/// # Errors
///
/// Returns [`SentioError::NoData`] for an empty conversation.
pub fn export(entries: &[ConversationEntry], format: ExportFormat) -> Result<String> {
    if entries.is_empty() {
        return Err(SentioError::NoData(
            "No conversation data to export".into(),
        ));
    }
    match format {
        ExportFormat::Json => Ok(serde_json::to_string_pretty(&records(entries))?),
        ExportFormat::Csv => Ok(to_csv(entries)),
    }
}

/// `timestamp,text,emotion` with the text always quoted and embedded quotes
/// doubled.
fn to_csv(entries: &[ConversationEntry]) -> String {
    let mut out = String::from("timestamp,text,emotion\n");
    for e in entries {
        let escaped = e.text.replace('"', "\"\"");
        out.push_str(&format!("{},\"{escaped}\",{}\n", e.index, e.label));
    }
    out
}
