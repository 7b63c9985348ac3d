//! Provider profile: which backend, which model, and how to reach it.

use crate::error::ApiError;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Supported provider backends
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderType {
    Gemini,
    #[serde(rename = "openai")]
    OpenAI,
    Ollama,
}

impl ProviderType {
    pub fn slug(self) -> &'static str {
        match self {
            ProviderType::Gemini => "gemini",
            ProviderType::OpenAI => "openai",
            ProviderType::Ollama => "ollama",
        }
    }

    pub fn default_endpoint(self) -> &'static str {
        match self {
            ProviderType::Gemini => "https://generativelanguage.googleapis.com/v1beta",
            ProviderType::OpenAI => "https://api.openai.com/v1",
            ProviderType::Ollama => "http://localhost:11434/v1",
        }
    }

    /// Environment variables consulted, in order, when no key is configured.
    pub fn api_key_env_vars(self) -> &'static [&'static str] {
        match self {
            ProviderType::Gemini => &["GEMINI_API_KEY", "API_KEY"],
            ProviderType::OpenAI => &["OPENAI_API_KEY"],
            ProviderType::Ollama => &[],
        }
    }

    pub fn requires_api_key(self) -> bool {
        !matches!(self, ProviderType::Ollama)
    }
}

impl std::str::FromStr for ProviderType {
    type Err = ApiError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "gemini" => Ok(ProviderType::Gemini),
            "openai" => Ok(ProviderType::OpenAI),
            "ollama" => Ok(ProviderType::Ollama),
            other => Err(ApiError::ConfigError(format!(
                "Invalid provider type: {}. Must be gemini, openai, or ollama",
                other
            ))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApiKeySource {
    Config,
    Environment(&'static str),
    Missing,
    NotRequired,
}

impl ApiKeySource {
    pub fn is_usable(self) -> bool {
        !matches!(self, ApiKeySource::Missing)
    }

    pub fn describe(self) -> String {
        match self {
            ApiKeySource::Config => "set from config".to_string(),
            ApiKeySource::Environment(var) => format!("set from environment ({})", var),
            ApiKeySource::Missing => "not set".to_string(),
            ApiKeySource::NotRequired => "not required".to_string(),
        }
    }
}

/// Configuration of one provider (structure or image side)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderConfig {
    pub provider_type: ProviderType,
    pub model: String,
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default)]
    pub endpoint: Option<String>,
    #[serde(default)]
    pub temperature: Option<f32>,
    #[serde(default = "default_connect_timeout_secs")]
    pub connect_timeout_secs: u64,
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

fn default_connect_timeout_secs() -> u64 {
    10
}

fn default_request_timeout_secs() -> u64 {
    120
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            provider_type: ProviderType::Gemini,
            model: String::new(),
            api_key: None,
            endpoint: None,
            temperature: None,
            connect_timeout_secs: default_connect_timeout_secs(),
            request_timeout_secs: default_request_timeout_secs(),
        }
    }
}

impl ProviderConfig {
    pub fn gemini(model: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            ..Self::default()
        }
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.model.trim().is_empty() {
            return Err("Model cannot be empty".to_string());
        }
        if let Some(endpoint) = &self.endpoint {
            if !endpoint.starts_with("http://") && !endpoint.starts_with("https://") {
                return Err(format!("Invalid endpoint URL: {}", endpoint));
            }
        }
        if let Some(temperature) = self.temperature {
            if !(0.0..=2.0).contains(&temperature) {
                return Err(format!(
                    "Temperature must be between 0.0 and 2.0, got {}",
                    temperature
                ));
            }
        }
        if self.request_timeout_secs == 0 {
            return Err("request_timeout_secs must be greater than zero".to_string());
        }
        Ok(())
    }

    /// Endpoint without a trailing slash, falling back to the provider default.
    pub fn resolved_endpoint(&self) -> String {
        self.endpoint
            .as_deref()
            .unwrap_or_else(|| self.provider_type.default_endpoint())
            .trim_end_matches('/')
            .to_string()
    }

    /// Configured key, else the first non-empty provider environment variable.
    pub fn resolve_api_key(&self) -> Option<String> {
        match self.api_key_source() {
            ApiKeySource::Config => self.api_key.clone(),
            ApiKeySource::Environment(var) => std::env::var(var).ok(),
            ApiKeySource::Missing | ApiKeySource::NotRequired => None,
        }
    }

    /// Where the key would come from, without reading it.
    pub fn api_key_source(&self) -> ApiKeySource {
        if self.api_key.as_ref().is_some_and(|k| !k.trim().is_empty()) {
            return ApiKeySource::Config;
        }
        let from_env = self
            .provider_type
            .api_key_env_vars()
            .iter()
            .copied()
            .find(|var| std::env::var(var).is_ok_and(|value| !value.trim().is_empty()));
        match from_env {
            Some(var) => ApiKeySource::Environment(var),
            None if self.provider_type.requires_api_key() => ApiKeySource::Missing,
            None => ApiKeySource::NotRequired,
        }
    }

    pub fn require_api_key(&self) -> Result<String, ApiError> {
        self.resolve_api_key().ok_or_else(|| {
            ApiError::ProviderNotConfigured(format!(
                "No API key for {} provider; set api_key or one of {:?}",
                self.provider_type.slug(),
                self.provider_type.api_key_env_vars()
            ))
        })
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}
