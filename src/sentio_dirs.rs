//! Application directory paths for sentio.
//!
//! Uses the [`dirs`] crate for platform-appropriate resolution.
//!
//! | Purpose | macOS | Linux |
//! |---------|-------|-------|
//! | Data | `~/Library/Application Support/sentio/` | `~/.local/share/sentio/` |
//! | Config | `~/Library/Application Support/sentio/` | `~/.config/sentio/` |
//!
//! # Environment Overrides
//!
//! - `SENTIO_DATA_DIR` overrides [`data_dir`]
//! - `SENTIO_CONFIG_DIR` overrides [`config_dir`]

use std::path::PathBuf;

/// Application data root. Relative paths in the config resolve against it.
///
/// Resolves to `dirs::data_dir()/sentio/` unless `SENTIO_DATA_DIR` is set.
#[must_use]
pub fn data_dir() -> PathBuf {
    if let Some(override_dir) = std::env::var_os("SENTIO_DATA_DIR") {
        return PathBuf::from(override_dir);
    }
    dirs::data_dir()
        .map(|d| d.join("sentio"))
        .unwrap_or_else(|| PathBuf::from("/tmp/sentio-data"))
}

/// Application config directory.
///
/// Resolves to `dirs::config_dir()/sentio/` unless `SENTIO_CONFIG_DIR` is set.
#[must_use]
pub fn config_dir() -> PathBuf {
    if let Some(override_dir) = std::env::var_os("SENTIO_CONFIG_DIR") {
        return PathBuf::from(override_dir);
    }
    dirs::config_dir()
        .map(|d| d.join("sentio"))
        .unwrap_or_else(|| PathBuf::from("/tmp/sentio-config"))
}

/// Main config file path (`config_dir()/config.toml`).
#[must_use]
pub fn config_file() -> PathBuf {
    config_dir().join("config.toml")
}
