//! Client configuration loaded via OrthoConfig.
//!
//! Values come from `LIFETAG_*` environment variables and configuration
//! files; anything unset falls back to the defaults below.

use std::path::PathBuf;
use std::time::Duration;

use ortho_config::OrthoConfig;
use serde::Deserialize;
use url::Url;

/// Registry backend used when none is configured.
pub const DEFAULT_API_BASE_URL: &str = "http://127.0.0.1:8000";
/// Session storage file used when none is configured.
pub const DEFAULT_STORAGE_PATH: &str = ".lifetag/storage.json";
/// Reverse-geocoding endpoint used when none is configured.
pub const DEFAULT_GEOCODER_URL: &str = "https://nominatim.openstreetmap.org/reverse";

/// Settings for the registry client.
#[derive(Debug, Clone, Deserialize, OrthoConfig)]
#[ortho_config(prefix = "LIFETAG")]
pub struct ClientSettings {
    /// Base URL of the registry backend.
    pub api_base_url: Option<String>,
    /// File holding the persisted session.
    pub storage_path: Option<PathBuf>,
    /// Per-request timeout in seconds. Unset or zero waits indefinitely.
    pub request_timeout_secs: Option<u64>,
    /// Nominatim-compatible reverse-geocoding endpoint.
    pub geocoder_url: Option<String>,
    /// Emit logs as JSON lines.
    #[ortho_config(default = false)]
    pub json_logs: bool,
}

impl ClientSettings {
    /// Configured backend URL, falling back to the default.
    ///
    /// # Errors
    ///
    /// Returns an error when the configured value is not an absolute URL.
    pub fn api_base_url(&self) -> Result<Url, url::ParseError> {
        Url::parse(self.api_base_url.as_deref().unwrap_or(DEFAULT_API_BASE_URL))
    }

    /// Configured geocoder URL, falling back to the default.
    ///
    /// # Errors
    ///
    /// Returns an error when the configured value is not an absolute URL.
    pub fn geocoder_url(&self) -> Result<Url, url::ParseError> {
        Url::parse(self.geocoder_url.as_deref().unwrap_or(DEFAULT_GEOCODER_URL))
    }

    /// Configured storage path, falling back to the default.
    pub fn storage_path(&self) -> PathBuf {
        self.storage_path
            .clone()
            .unwrap_or_else(|| PathBuf::from(DEFAULT_STORAGE_PATH))
    }

    /// Request timeout, if one is configured.
    pub fn request_timeout(&self) -> Option<Duration> {
        self.request_timeout_secs
            .filter(|secs| *secs > 0)
            .map(Duration::from_secs)
    }
}
