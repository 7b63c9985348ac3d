//! Configuration System
//!
//! Hierarchical configuration for the two providers, the image pipeline and
//! logging. Sources are merged in order: built-in defaults, the global file,
//! workspace files, then `LOCI__*` environment overrides.

use crate::logging::LoggingConfig;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

pub use crate::provider::{ProviderConfig, ProviderType};

mod facade;
mod merge;
mod sources;

pub use facade::ConfigLoader;
pub use merge::merge_policy::{DEFAULT_IMAGE_MODEL, DEFAULT_STRUCTURE_MODEL};

/// Root configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LociConfig {
    /// Provider used to plan the rooms
    #[serde(default = "default_structure_provider")]
    pub structure: ProviderConfig,

    /// Provider used to illustrate each room
    #[serde(default = "default_image_provider")]
    pub image: ProviderConfig,

    #[serde(default)]
    pub pipeline: PipelineConfig,

    #[serde(default)]
    pub output: OutputConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Upper bound on image calls in flight. Unset means one per room.
    #[serde(default)]
    pub max_concurrent_images: Option<usize>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    /// Directory the archive is written to
    #[serde(default = "default_output_directory")]
    pub directory: PathBuf,
}

fn default_structure_provider() -> ProviderConfig {
    ProviderConfig::gemini(DEFAULT_STRUCTURE_MODEL)
}

fn default_image_provider() -> ProviderConfig {
    ProviderConfig::gemini(DEFAULT_IMAGE_MODEL)
}

fn default_output_directory() -> PathBuf {
    PathBuf::from(".")
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            directory: default_output_directory(),
        }
    }
}

impl Default for LociConfig {
    fn default() -> Self {
        Self {
            structure: default_structure_provider(),
            image: default_image_provider(),
            pipeline: PipelineConfig::default(),
            output: OutputConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

/// Configuration validation errors
#[derive(Debug, Clone)]
pub enum ValidationError {
    Provider(&'static str, String),
    Pipeline(String),
    Output(String),
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ValidationError::Provider(role, msg) => write!(f, "Provider '{}': {}", role, msg),
            ValidationError::Pipeline(msg) => write!(f, "Pipeline: {}", msg),
            ValidationError::Output(msg) => write!(f, "Output: {}", msg),
        }
    }
}

impl std::error::Error for ValidationError {}

impl LociConfig {
    /// Validate the entire configuration
    pub fn validate(&self) -> Result<(), Vec<ValidationError>> {
        let mut errors = Vec::new();

        if let Err(e) = self.structure.validate() {
            errors.push(ValidationError::Provider("structure", e));
        }
        if let Err(e) = self.image.validate() {
            errors.push(ValidationError::Provider("image", e));
        }
        if self.image.provider_type == ProviderType::Ollama {
            errors.push(ValidationError::Provider(
                "image",
                "ollama cannot generate images; use gemini or openai".to_string(),
            ));
        }

        if self.pipeline.max_concurrent_images == Some(0) {
            errors.push(ValidationError::Pipeline(
                "max_concurrent_images must be greater than zero".to_string(),
            ));
        }

        if self.output.directory.as_os_str().is_empty() {
            errors.push(ValidationError::Output(
                "directory cannot be empty".to_string(),
            ));
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}
