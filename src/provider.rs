//! Model Provider Abstraction
//!
//! The two external collaborators of the palace pipeline, the structure
//! generator and the image generator, plus the HTTP clients that implement them
//! (Gemini natively, OpenAI and Ollama through the OpenAI-compatible API).

use crate::error::ApiError;
use crate::palace::{EncodedImage, GenerationRequest, RoomBlueprint};
use async_trait::async_trait;
use reqwest::{Client, Response};
use serde::{Deserialize, Serialize};
use std::time::Duration;

pub mod commands;
pub mod gemini;
pub mod openai;
pub mod profile;
pub mod prompts;
pub mod structure;

pub use gemini::GeminiClient;
pub use openai::OpenAIClient;
pub use profile::{ApiKeySource, ProviderConfig, ProviderType};
pub use structure::ChatStructureGenerator;

/// Chat message role
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MessageRole {
    System,
    User,
    Assistant,
}

/// Chat message
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: MessageRole,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::User,
            content: content.into(),
        }
    }
}

/// Completion options
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CompletionOptions {
    pub temperature: Option<f32>, // 0.0-2.0
    pub max_tokens: Option<u32>,
    /// Ask the provider for JSON output constrained by this schema.
    pub response_schema: Option<serde_json::Value>,
}

/// Token usage information
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TokenUsage {
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
    pub total_tokens: u32,
}

/// Completion response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompletionResponse {
    pub content: String,
    pub model: String,
    pub usage: TokenUsage,
    pub finish_reason: Option<String>,
}

/// Text completion client trait
#[async_trait]
pub trait ModelProviderClient: Send + Sync {
    /// Generate a completion from a list of messages
    async fn complete(
        &self,
        messages: Vec<ChatMessage>,
        options: CompletionOptions,
    ) -> Result<CompletionResponse, ApiError>;

    fn provider_name(&self) -> &str;

    fn model_name(&self) -> &str;
}

/// Produces the ordered room sequence for a request (text only).
#[async_trait]
pub trait StructureGenerator: Send + Sync {
    async fn generate_structure(
        &self,
        request: &GenerationRequest,
    ) -> Result<Vec<RoomBlueprint>, ApiError>;
}

/// Produces at most one image for a room.
///
/// `Ok(None)` means the provider answered without an image. Callers treat an
/// `Err` the same way.
#[async_trait]
pub trait ImageGenerator: Send + Sync {
    async fn generate_image(
        &self,
        image_prompt: &str,
        visual_style: &str,
    ) -> Result<Option<EncodedImage>, ApiError>;

    fn model_name(&self) -> &str;
}

// Helper function to map transport errors to ApiError
pub(crate) fn map_http_error(error: reqwest::Error) -> ApiError {
    if let Some(status) = error.status() {
        return map_status_error(status.as_u16(), &error.to_string());
    }
    if error.is_timeout() {
        ApiError::ProviderRequestFailed(format!("Request timeout: {}", error))
    } else if error.is_connect() {
        ApiError::ProviderRequestFailed(format!("Connection error: {}", error))
    } else {
        ApiError::ProviderError(format!("HTTP error: {}", error))
    }
}

pub(crate) fn map_status_error(status: u16, detail: &str) -> ApiError {
    match status {
        401 | 403 => ApiError::ProviderAuthFailed(format!("Authentication failed: {}", detail)),
        429 => ApiError::ProviderRateLimit(format!("Rate limit exceeded: {}", detail)),
        404 => ApiError::ProviderModelNotFound(format!("Model not found: {}", detail)),
        _ => ApiError::ProviderRequestFailed(format!(
            "Request failed with status {}: {}",
            status, detail
        )),
    }
}

/// Turn a non-success response into the matching provider error.
pub(crate) async fn check_status(response: Response) -> Result<Response, ApiError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let error_text = response
        .text()
        .await
        .unwrap_or_else(|_| "Unknown error".to_string());
    Err(map_status_error(status.as_u16(), &error_text))
}

pub(crate) fn build_provider_http_client(
    connect_timeout: Duration,
    request_timeout: Duration,
) -> Result<Client, ApiError> {
    Client::builder()
        .connect_timeout(connect_timeout)
        .timeout(request_timeout)
        .build()
        .map_err(|e| ApiError::ProviderError(format!("Failed to create HTTP client: {}", e)))
}

/// Provider factory for creating the pipeline collaborators from configuration
pub struct ProviderFactory;

impl ProviderFactory {
    pub fn create_chat_client(
        config: &ProviderConfig,
    ) -> Result<Box<dyn ModelProviderClient>, ApiError> {
        match config.provider_type {
            ProviderType::Gemini => Ok(Box::new(GeminiClient::from_config(config)?)),
            ProviderType::OpenAI | ProviderType::Ollama => {
                Ok(Box::new(OpenAIClient::from_config(config)?))
            }
        }
    }

    pub fn create_structure_generator(
        config: &ProviderConfig,
    ) -> Result<Box<dyn StructureGenerator>, ApiError> {
        let client = Self::create_chat_client(config)?;
        Ok(Box::new(
            ChatStructureGenerator::new(client).with_temperature(config.temperature),
        ))
    }

    pub fn create_image_generator(
        config: &ProviderConfig,
    ) -> Result<Box<dyn ImageGenerator>, ApiError> {
        match config.provider_type {
            ProviderType::Gemini => Ok(Box::new(GeminiClient::from_config(config)?)),
            ProviderType::OpenAI => Ok(Box::new(OpenAIClient::from_config(config)?)),
            ProviderType::Ollama => Err(ApiError::ProviderNotConfigured(
                "Ollama cannot generate images; configure gemini or openai for [image]"
                    .to_string(),
            )),
        }
    }
}
