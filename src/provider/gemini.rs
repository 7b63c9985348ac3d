//! Gemini client (`models/{model}:generateContent`).
//!
//! Serves both collaborators: JSON-constrained text for the structure call and
//! inline image data for the image call.

use crate::error::ApiError;
use crate::palace::EncodedImage;
use crate::provider::{
    build_provider_http_client, check_status, map_http_error, prompts, ChatMessage,
    CompletionOptions, CompletionResponse, ImageGenerator, MessageRole, ModelProviderClient,
    ProviderConfig, TokenUsage,
};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::debug;

pub struct GeminiClient {
    client: Client,
    model: String,
    api_key: String,
    base_url: String,
}

impl GeminiClient {
    pub fn new(model: String, api_key: String, base_url: Option<String>) -> Result<Self, ApiError> {
        let config = ProviderConfig {
            model,
            api_key: Some(api_key),
            endpoint: base_url,
            ..ProviderConfig::default()
        };
        Self::from_config(&config)
    }

    pub fn from_config(config: &ProviderConfig) -> Result<Self, ApiError> {
        let client =
            build_provider_http_client(config.connect_timeout(), config.request_timeout())?;
        Ok(Self {
            client,
            model: config.model.clone(),
            api_key: config.require_api_key()?,
            base_url: config.resolved_endpoint(),
        })
    }

    async fn generate_content(&self, body: &Value) -> Result<GenerateContentResponse, ApiError> {
        let url = format!("{}/models/{}:generateContent", self.base_url, self.model);
        let response = self
            .client
            .post(&url)
            .header("x-goog-api-key", &self.api_key)
            .header("Content-Type", "application/json")
            .json(body)
            .send()
            .await
            .map_err(map_http_error)?;
        let response = check_status(response).await?;

        response
            .json()
            .await
            .map_err(|e| ApiError::ProviderError(format!("Failed to parse response: {}", e)))
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    usage_metadata: Option<UsageMetadata>,
    model_version: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    content: Option<Content>,
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Content {
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Part {
    text: Option<String>,
    inline_data: Option<InlineData>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct InlineData {
    mime_type: Option<String>,
    data: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UsageMetadata {
    #[serde(default)]
    prompt_token_count: u32,
    #[serde(default)]
    candidates_token_count: u32,
    #[serde(default)]
    total_token_count: u32,
}

impl GenerateContentResponse {
    fn parts(&self) -> impl Iterator<Item = &Part> {
        self.candidates
            .first()
            .and_then(|c| c.content.as_ref())
            .into_iter()
            .flat_map(|content| content.parts.iter())
    }

    /// Concatenated text parts of the first candidate.
    pub(crate) fn text(&self) -> Option<String> {
        let text: String = self.parts().filter_map(|p| p.text.as_deref()).collect();
        if text.is_empty() {
            None
        } else {
            Some(text)
        }
    }

    /// First inline image of the first candidate.
    pub(crate) fn inline_image(&self) -> Option<EncodedImage> {
        self.parts()
            .filter_map(|p| p.inline_data.as_ref())
            .find_map(|inline| {
                inline
                    .data
                    .as_deref()
                    .filter(|d| !d.is_empty())
                    .map(|data| EncodedImage::new(inline.mime_type.as_deref(), data))
            })
    }
}

/// Request body for a text completion.
pub(crate) fn completion_body(messages: &[ChatMessage], options: &CompletionOptions) -> Value {
    let system: Vec<&str> = messages
        .iter()
        .filter(|m| m.role == MessageRole::System)
        .map(|m| m.content.as_str())
        .collect();

    let contents: Vec<Value> = messages
        .iter()
        .filter(|m| m.role != MessageRole::System)
        .map(|m| {
            let role = if m.role == MessageRole::Assistant {
                "model"
            } else {
                "user"
            };
            json!({ "role": role, "parts": [{ "text": m.content }] })
        })
        .collect();

    let mut generation_config = json!({});
    if let Some(temperature) = options.temperature {
        generation_config["temperature"] = json!(temperature);
    }
    if let Some(max_tokens) = options.max_tokens {
        generation_config["maxOutputTokens"] = json!(max_tokens);
    }
    if let Some(schema) = &options.response_schema {
        generation_config["responseMimeType"] = json!("application/json");
        generation_config["responseSchema"] = schema.clone();
    }

    let mut body = json!({
        "contents": contents,
        "generationConfig": generation_config,
    });
    if !system.is_empty() {
        body["systemInstruction"] = json!({ "parts": [{ "text": system.join("\n\n") }] });
    }
    body
}

/// Request body for an image-only generation.
pub(crate) fn image_body(image_prompt: &str, visual_style: &str) -> Value {
    json!({
        "contents": [{
            "role": "user",
            "parts": [{ "text": prompts::image_prompt(image_prompt, visual_style) }]
        }],
        "generationConfig": { "responseModalities": ["IMAGE"] }
    })
}

#[async_trait]
impl ModelProviderClient for GeminiClient {
    async fn complete(
        &self,
        messages: Vec<ChatMessage>,
        options: CompletionOptions,
    ) -> Result<CompletionResponse, ApiError> {
        let body = completion_body(&messages, &options);
        let response = self.generate_content(&body).await?;

        let content = response
            .text()
            .ok_or_else(|| ApiError::ProviderError("No text response from Gemini".to_string()))?;
        let usage = response
            .usage_metadata
            .as_ref()
            .map(|u| TokenUsage {
                prompt_tokens: u.prompt_token_count,
                completion_tokens: u.candidates_token_count,
                total_tokens: u.total_token_count,
            })
            .unwrap_or_default();
        let finish_reason = response
            .candidates
            .first()
            .and_then(|c| c.finish_reason.clone());

        Ok(CompletionResponse {
            content,
            model: response
                .model_version
                .clone()
                .unwrap_or_else(|| self.model.clone()),
            usage,
            finish_reason,
        })
    }

    fn provider_name(&self) -> &str {
        "gemini"
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}

#[async_trait]
impl ImageGenerator for GeminiClient {
    async fn generate_image(
        &self,
        image_prompt: &str,
        visual_style: &str,
    ) -> Result<Option<EncodedImage>, ApiError> {
        let body = image_body(image_prompt, visual_style);
        let response = self.generate_content(&body).await.map_err(|e| {
            ApiError::ImageGenerationFailed(format!("Gemini image request failed: {}", e))
        })?;
        let image = response.inline_image();
        if image.is_none() {
            debug!(model = %self.model, "Gemini response carried no inline image");
        }
        Ok(image)
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}
