//! API Configuration
//!
//! The base URL is resolved once at startup. In the browser there is no
//! process environment, so the value is baked in at compile time.

use serde::{Deserialize, Serialize};

const DEFAULT_BASE_URL: &str = "http://localhost:8080";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiConfig {
    pub base_url: String,
}

impl ApiConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
        }
    }

    /// `TASKBOARD_API_BASE`, then `TASKBOARD_API_URL`, then localhost.
    pub fn from_env() -> Self {
        let base = option_env!("TASKBOARD_API_BASE")
            .or(option_env!("TASKBOARD_API_URL"))
            .filter(|value| !value.is_empty())
            .unwrap_or(DEFAULT_BASE_URL);
        Self::new(base)
    }

    /// Absolute URL for an API path.
    pub fn url(&self, path: &str) -> String {
        let base = self.base_url.trim_end_matches('/');
        if path.starts_with('/') {
            format!("{base}{path}")
        } else {
            format!("{base}/{path}")
        }
    }
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self::new(DEFAULT_BASE_URL)
    }
}
