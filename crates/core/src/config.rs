//! Client runtime configuration.
//!
//! Configuration is resolved once at process startup and then passed into the API
//! client. Nothing in this crate reads environment variables during a request.

use crate::constants::DEFAULT_API_URL;
use crate::{CoreError, CoreResult};

/// Where the patients API lives.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ApiConfig {
    base_url: String,
}

impl ApiConfig {
    /// Create a new `ApiConfig`.
    ///
    /// A trailing slash is stripped so that resource paths can be appended directly.
    ///
    /// # Errors
    ///
    /// Returns `CoreError::Config` if `base_url` is blank or is not an `http(s)` URL.
    pub fn new(base_url: impl Into<String>) -> CoreResult<Self> {
        let base_url = base_url.into();
        let trimmed = base_url.trim().trim_end_matches('/');
        if trimmed.is_empty() {
            return Err(CoreError::Config("API base URL cannot be empty".into()));
        }
        if !(trimmed.starts_with("http://") || trimmed.starts_with("https://")) {
            return Err(CoreError::Config(format!(
                "API base URL must start with http:// or https://, got '{trimmed}'"
            )));
        }
        Ok(Self {
            base_url: trimmed.to_owned(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Absolute URL for a path such as `/api/patients/`.
    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

/// Resolve the API configuration from an optional `API_URL` value.
///
/// If `value` is `None` or blank, the localhost fallback is used.
pub fn api_config_from_env_value(value: Option<String>) -> CoreResult<ApiConfig> {
    let value = value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty());
    let base_url = value.unwrap_or_else(|| DEFAULT_API_URL.to_owned());
    tracing::debug!("using API URL {}", base_url);
    ApiConfig::new(base_url)
}
