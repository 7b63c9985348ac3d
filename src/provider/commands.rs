//! Provider command service: offline readiness checks for the two providers.

use crate::config::LociConfig;
use crate::provider::profile::{ApiKeySource, ProviderConfig, ProviderType};
use serde::Serialize;

pub struct ProviderCommandService;

/// One provider role ("structure" or "image") as seen by `check`.
#[derive(Debug, Clone, Serialize)]
pub struct ProviderCheckEntry {
    pub role: &'static str,
    pub provider_type: &'static str,
    pub model: String,
    pub endpoint: String,
    pub api_key_status: String,
    pub errors: Vec<String>,
}

impl ProviderCheckEntry {
    pub fn is_ready(&self) -> bool {
        self.errors.is_empty()
    }
}

/// Result of the check command.
#[derive(Debug, Clone, Serialize)]
pub struct ConfigCheckResult {
    pub config_source: String,
    pub providers: Vec<ProviderCheckEntry>,
    /// Problems outside the provider sections
    pub errors: Vec<String>,
}

impl ConfigCheckResult {
    pub fn is_ready(&self) -> bool {
        self.errors.is_empty() && self.providers.iter().all(ProviderCheckEntry::is_ready)
    }
}

impl ProviderCommandService {
    /// Inspect configuration and key presence. Makes no network calls.
    pub fn run_check(config: &LociConfig, config_source: impl Into<String>) -> ConfigCheckResult {
        let providers = vec![
            Self::check_provider("structure", &config.structure),
            Self::check_provider("image", &config.image),
        ];

        let mut errors = Vec::new();
        if let Err(validation_errors) = config.validate() {
            errors.extend(
                validation_errors
                    .iter()
                    .map(|e| e.to_string())
                    .filter(|e| !e.starts_with("Provider '")),
            );
        }

        ConfigCheckResult {
            config_source: config_source.into(),
            providers,
            errors,
        }
    }

    fn check_provider(role: &'static str, provider: &ProviderConfig) -> ProviderCheckEntry {
        let mut errors = Vec::new();
        if let Err(e) = provider.validate() {
            errors.push(e);
        }
        if role == "image" && provider.provider_type == ProviderType::Ollama {
            errors.push("ollama cannot generate images".to_string());
        }

        let key_source = provider.api_key_source();
        if key_source == ApiKeySource::Missing {
            errors.push(format!(
                "API key not set; configure api_key or export one of {}",
                provider.provider_type.api_key_env_vars().join(", ")
            ));
        }

        ProviderCheckEntry {
            role,
            provider_type: provider.provider_type.slug(),
            model: provider.model.clone(),
            endpoint: provider.resolved_endpoint(),
            api_key_status: key_source.describe(),
            errors,
        }
    }
}
