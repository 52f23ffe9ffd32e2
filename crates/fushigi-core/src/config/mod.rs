//! Client configuration.
//!
//! Values are layered: built-in defaults, then an optional JSON file, then
//! environment variables. The result is normalized before use.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::util::{is_http_url, normalize_text_option};

pub const DEFAULT_API_BASE_URL: &str = "http://127.0.0.1:8000";
/// Largest page the backend serves in one request.
pub const MAX_PAGE_SIZE: usize = 100;

pub const ENV_API_URL: &str = "FUSHIGI_API_URL";
pub const ENV_WIPE_LOCAL: &str = "FUSHIGI_WIPE_LOCAL";
pub const ENV_PAGE_SIZE: &str = "FUSHIGI_PAGE_SIZE";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default, deny_unknown_fields)]
pub struct ClientConfig {
    /// Base URL of the backend, without a trailing slash
    pub api_base_url: String,
    pub request_timeout_secs: u64,
    /// Records requested per page when pulling collections
    pub page_size: usize,
    /// Size of the daily practice subsets
    pub daily_subset_size: usize,
    /// Delete every cached record when the stores are opened.
    ///
    /// Development only; never implied by build mode.
    pub wipe_local_on_startup: bool,
    /// When false, `refresh` is a logged no-op (previews and demos)
    pub refresh_enabled: bool,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            request_timeout_secs: 10,
            page_size: MAX_PAGE_SIZE,
            daily_subset_size: 5,
            wipe_local_on_startup: false,
            refresh_enabled: true,
        }
    }
}

impl ClientConfig {
    /// Parse a JSON config payload.
    pub fn from_json(payload: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(payload)?;
        config.normalized()
    }

    /// Load a JSON config file; a missing file yields the defaults.
    pub fn load_from_path(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let raw = std::fs::read_to_string(path)?;
        Self::from_json(&raw)
    }

    /// Apply environment overrides through `lookup` (usually `std::env::var`).
    pub fn with_env<F>(mut self, lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(url) = normalize_text_option(lookup(ENV_API_URL)) {
            self.api_base_url = url;
        }
        if let Some(raw) = normalize_text_option(lookup(ENV_WIPE_LOCAL)) {
            self.wipe_local_on_startup = parse_flag(&raw);
        }
        if let Some(raw) = normalize_text_option(lookup(ENV_PAGE_SIZE)) {
            self.page_size = raw.parse().map_err(|_| {
                Error::InvalidInput(format!("{ENV_PAGE_SIZE} must be a positive integer"))
            })?;
        }
        self.normalized()
    }

    /// Validate the base URL and clamp numeric settings.
    pub fn normalized(mut self) -> Result<Self> {
        let url = normalize_text_option(Some(self.api_base_url))
            .ok_or_else(|| Error::InvalidInput("api_base_url must not be empty".to_string()))?;
        if !is_http_url(&url) {
            return Err(Error::InvalidInput(
                "api_base_url must include http:// or https://".to_string(),
            ));
        }
        self.api_base_url = url.trim_end_matches('/').to_string();
        self.page_size = self.page_size.clamp(1, MAX_PAGE_SIZE);
        self.request_timeout_secs = self.request_timeout_secs.max(1);
        Ok(self)
    }
}

fn parse_flag(raw: &str) -> bool {
    matches!(
        raw.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}
