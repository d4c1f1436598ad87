//! Configuration types for the sentio session and server.
//!
//! Every section is `#[serde(default)]`, so a partial `config.toml` only
//! needs the keys it changes.

use crate::error::{Result, SentioError};
use sentio_model::ClassifierConfig;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Top-level configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SentioConfig {
    /// Emotion classifier backend and artifact locations.
    pub classifier: ClassifierConfig,
    /// HTTP API bind address.
    pub server: ServerConfig,
    /// Reply and recommendation catalogs.
    pub responses: ResponsesConfig,
    /// Cluster plot rendering.
    pub clusters: ClusterConfig,
    /// Log output.
    pub logging: LoggingConfig,
}

// ---------------------------------------------------------------------------
// Server
// ---------------------------------------------------------------------------

/// Configuration for the HTTP API server.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Host address to bind to.
    pub host: String,
    /// Port to listen on. `0` lets the OS pick one.
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_owned(),
            port: 5001,
        }
    }
}

// ---------------------------------------------------------------------------
// Responses
// ---------------------------------------------------------------------------

/// Where the reply and recommendation catalogs live.
///
/// A missing file is not an error; built-in replies and an empty
/// recommendation set are used instead.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ResponsesConfig {
    /// JSON object: label → list of reply strings.
    pub responses_path: PathBuf,
    /// JSON object: label → `{songs, quotes}`.
    pub recommendations_path: PathBuf,
}

impl Default for ResponsesConfig {
    fn default() -> Self {
        Self {
            responses_path: PathBuf::from("data/emotion_responses.json"),
            recommendations_path: PathBuf::from("data/emotion_recommendations.json"),
        }
    }
}

// ---------------------------------------------------------------------------
// Clusters
// ---------------------------------------------------------------------------

/// Cluster scatter plot settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClusterConfig {
    /// PNG file to write.
    pub output_path: PathBuf,
    /// Minimum number of conversation entries before a plot is drawn.
    pub min_samples: usize,
    /// Image width in pixels.
    pub width: u32,
    /// Image height in pixels.
    pub height: u32,
}

impl Default for ClusterConfig {
    fn default() -> Self {
        Self {
            output_path: PathBuf::from("static/clusters.png"),
            min_samples: 5,
            width: 640,
            height: 640,
        }
    }
}

// ---------------------------------------------------------------------------
// Logging
// ---------------------------------------------------------------------------

/// Log output settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Directory for daily-rotated log files. Console only when unset.
    pub log_dir: Option<PathBuf>,
}

// ---------------------------------------------------------------------------
// Load / save / validate
// ---------------------------------------------------------------------------

impl SentioConfig {
    /// Load configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        toml::from_str(&content).map_err(|e| SentioError::Config(e.to_string()))
    }

    /// Load `path` if given, else the default config file if it exists,
    /// else built-in defaults. Relative paths are resolved against
    /// [`crate::sentio_dirs::data_dir`] and the result is validated.
    ///
    /// # Errors
    ///
    /// Returns an error if an existing file is unreadable or invalid.
    pub fn load_or_default(path: Option<&Path>) -> Result<Self> {
        let mut config = match path {
            Some(p) => Self::from_file(p)?,
            None => {
                let default_path = Self::default_config_path();
                if default_path.exists() {
                    Self::from_file(&default_path)?
                } else {
                    Self::default()
                }
            }
        };
        config.resolve_paths(&crate::sentio_dirs::data_dir());
        config.validate()?;
        Ok(config)
    }

    /// Make every relative file path absolute under `root`.
    pub fn resolve_paths(&mut self, root: &Path) {
        let resolve = |p: &mut PathBuf| {
            if p.is_relative() {
                *p = root.join(&*p);
            }
        };
        resolve(&mut self.classifier.model_dir);
        resolve(&mut self.responses.responses_path);
        resolve(&mut self.responses.recommendations_path);
        resolve(&mut self.clusters.output_path);
        if let Some(dir) = self.logging.log_dir.as_mut() {
            resolve(dir);
        }
    }

    /// Save configuration to a TOML file, creating parent directories as needed.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be written or the config cannot be serialized.
    pub fn save_to_file(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content =
            toml::to_string_pretty(self).map_err(|e| SentioError::Config(e.to_string()))?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Returns the default config file path.
    pub fn default_config_path() -> PathBuf {
        crate::sentio_dirs::config_file()
    }

    /// Validates every section.
    ///
    /// # Errors
    ///
    /// Returns [`SentioError::Config`] naming the first invalid field.
    pub fn validate(&self) -> Result<()> {
        self.classifier
            .validate()
            .map_err(|e| SentioError::Config(format!("classifier: {e}")))?;
        self.clusters.validate()?;
        if self.server.host.trim().is_empty() {
            return Err(SentioError::Config("server.host must not be empty".into()));
        }
        Ok(())
    }
}

/// Largest accepted plot width or height in pixels.
pub const MAX_PLOT_DIMENSION: u32 = 8192;

impl ClusterConfig {
    /// Validates cluster settings.
    ///
    /// # Errors
    ///
    /// Returns [`SentioError::Config`] if `min_samples` is 0 or a dimension
    /// is outside `64..=MAX_PLOT_DIMENSION`.
    pub fn validate(&self) -> Result<()> {
        if self.min_samples == 0 {
            return Err(SentioError::Config(
                "clusters.min_samples must be greater than 0".into(),
            ));
        }
        let in_range = |d: u32| (64..=MAX_PLOT_DIMENSION).contains(&d);
        if !in_range(self.width) || !in_range(self.height) {
            return Err(SentioError::Config(format!(
                "clusters.width and clusters.height must be between 64 and {MAX_PLOT_DIMENSION}"
            )));
        }
        Ok(())
    }
}
