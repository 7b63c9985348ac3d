//! Error types for the loci memory palace generator.

use thiserror::Error;

/// Errors surfaced by providers, the generation pipeline and the archive builder.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Provider error: {0}")]
    ProviderError(String),

    #[error("Provider not configured: {0}")]
    ProviderNotConfigured(String),

    #[error("Provider request failed: {0}")]
    ProviderRequestFailed(String),

    #[error("Provider authentication failed: {0}")]
    ProviderAuthFailed(String),

    #[error("Provider rate limit exceeded: {0}")]
    ProviderRateLimit(String),

    #[error("Provider model not found: {0}")]
    ProviderModelNotFound(String),

    /// Fatal to a generation attempt: the structure call failed or its
    /// response did not match the room schema.
    #[error("Structure generation failed: {0}")]
    StructureGenerationFailed(String),

    /// Absorbed per room; never aborts an attempt.
    #[error("Image generation failed: {0}")]
    ImageGenerationFailed(String),

    #[error("A generation is already in progress")]
    GenerationInProgress,

    #[error("Generation attempt {0} was superseded by a reset or a newer attempt")]
    GenerationSuperseded(u64),

    #[error("Nothing to export: {0}")]
    NothingToExport(String),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Archive build failed: {0}")]
    ArchiveFailed(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<config::ConfigError> for ApiError {
    fn from(err: config::ConfigError) -> Self {
        ApiError::ConfigError(err.to_string())
    }
}

impl From<zip::result::ZipError> for ApiError {
    fn from(err: zip::result::ZipError) -> Self {
        ApiError::ArchiveFailed(err.to_string())
    }
}
