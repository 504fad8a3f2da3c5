//! Application settings.
//!
//! Built once from the environment at startup and injected into adapter
//! constructors; business logic never reads the environment directly.

use serde::{Deserialize, Serialize};

use crate::infrastructure::openai::DEFAULT_BASE_URL;

/// Default model when `OPENAI_MODEL` is unset.
pub const DEFAULT_MODEL: &str = "gpt-4o";

/// Default per-request timeout in seconds.
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 120;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppSettings {
    /// API key for the model provider
    pub api_key: String,
    /// Base URL of the OpenAI-compatible API
    pub base_url: String,
    /// Model identifier
    pub model: String,
    /// Per-request timeout in seconds
    pub request_timeout_secs: u64,
}

#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    #[error("missing required environment variable {0}")]
    MissingVar(&'static str),

    #[error("invalid value for {var}: {value}")]
    InvalidVar { var: &'static str, value: String },
}

impl AppSettings {
    /// Load settings from `OPENAI_API_KEY`, `OPENAI_BASE_URL`,
    /// `OPENAI_MODEL` and `REQUEST_TIMEOUT_SECS`.
    pub fn from_env() -> Result<Self, SettingsError> {
        let api_key = std::env::var("OPENAI_API_KEY")
            .map_err(|_| SettingsError::MissingVar("OPENAI_API_KEY"))?;
        let base_url =
            std::env::var("OPENAI_BASE_URL").unwrap_or_else(|_| DEFAULT_BASE_URL.to_string());
        let model = std::env::var("OPENAI_MODEL").unwrap_or_else(|_| DEFAULT_MODEL.to_string());
        let request_timeout_secs = match std::env::var("REQUEST_TIMEOUT_SECS") {
            Ok(raw) => raw.parse().map_err(|_| SettingsError::InvalidVar {
                var: "REQUEST_TIMEOUT_SECS",
                value: raw,
            })?,
            Err(_) => DEFAULT_REQUEST_TIMEOUT_SECS,
        };

        Ok(Self {
            api_key,
            base_url,
            model,
            request_timeout_secs,
        })
    }
}
