//! Configuration types for the Trove client core.
//!
//! Loaded from `config.toml` in the platform config directory (see
//! [`config_dir`]); a missing file yields the defaults. All sections use
//! `#[serde(default)]` so partial files stay valid across upgrades.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{Result, TroveError};

/// Top-level configuration for the client.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Remote API settings.
    pub api: ApiConfig,
    /// Chat polling / scroll behavior.
    pub chat: ChatConfig,
}

/// Remote API configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    /// Base URL of the portal API (no trailing slash).
    pub base_url: String,
    /// Base URL for uploaded images.
    pub uploads_base_url: String,
    /// Per-request timeout in seconds.
    pub request_timeout_secs: u64,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:5000/api".to_owned(),
            uploads_base_url: "http://localhost:5000/uploads".to_owned(),
            request_timeout_secs: 30,
        }
    }
}

/// Chat subsystem configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ChatConfig {
    /// Interval between silent message refreshes, in seconds.
    pub poll_interval_secs: u64,
    /// Distance from the bottom (pixels) within which the view still counts
    /// as "at the live edge" and auto-follows new messages.
    pub near_bottom_threshold_px: u32,
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            poll_interval_secs: 5,
            near_bottom_threshold_px: 50,
        }
    }
}

/// Client config directory.
///
/// Resolves to `dirs::config_dir()/trove/` by default. Override with the
/// `TROVE_CONFIG_DIR` environment variable.
#[must_use]
pub fn config_dir() -> PathBuf {
    if let Some(override_dir) = std::env::var_os("TROVE_CONFIG_DIR") {
        return PathBuf::from(override_dir);
    }
    dirs::config_dir()
        .map(|d| d.join("trove"))
        .unwrap_or_else(|| PathBuf::from("/tmp/trove-config"))
}

impl ClientConfig {
    /// Load `config.toml` from the default config directory.
    pub fn load() -> Result<Self> {
        Self::load_from(config_dir().join("config.toml"))
    }

    /// Load configuration from an explicit path. A missing file yields the
    /// defaults; a file that fails to parse is an error.
    pub fn load_from(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Ok(Self::default());
        }
        let raw = std::fs::read_to_string(path)?;
        toml::from_str(&raw)
            .map_err(|e| TroveError::Config(format!("{}: {e}", path.display())))
    }
}
