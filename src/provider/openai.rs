//! OpenAI-compatible client: OpenAI itself and Ollama's `/v1` endpoint.

use crate::error::ApiError;
use crate::palace::EncodedImage;
use crate::provider::{
    build_provider_http_client, check_status, map_http_error, prompts, ChatMessage,
    CompletionOptions, CompletionResponse, ImageGenerator, MessageRole, ModelProviderClient,
    ProviderConfig, ProviderType, TokenUsage,
};
use async_trait::async_trait;
use reqwest::{Client, RequestBuilder};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

pub struct OpenAIClient {
    client: Client,
    provider_type: ProviderType,
    model: String,
    api_key: Option<String>,
    base_url: String,
}

impl OpenAIClient {
    pub fn from_config(config: &ProviderConfig) -> Result<Self, ApiError> {
        let client =
            build_provider_http_client(config.connect_timeout(), config.request_timeout())?;
        let api_key = if config.provider_type.requires_api_key() {
            Some(config.require_api_key()?)
        } else {
            config.resolve_api_key()
        };
        Ok(Self {
            client,
            provider_type: config.provider_type,
            model: config.model.clone(),
            api_key,
            base_url: config.resolved_endpoint(),
        })
    }

    fn post(&self, path: &str) -> RequestBuilder {
        let url = format!("{}{}", self.base_url, path);
        let mut request_builder = self
            .client
            .post(&url)
            .header("Content-Type", "application/json");
        if let Some(api_key) = &self.api_key {
            request_builder =
                request_builder.header("Authorization", format!("Bearer {}", api_key));
        }
        request_builder
    }
}

// OpenAI-compatible API request/response structures
#[derive(Serialize)]
struct ChatCompletionRequest {
    model: String,
    messages: Vec<OpenAIMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_format: Option<Value>,
    stream: bool,
}

#[derive(Serialize, Deserialize)]
struct OpenAIMessage {
    role: String,
    content: String,
}

#[derive(Deserialize)]
struct ChatCompletionResponse {
    model: String,
    choices: Vec<Choice>,
    usage: Option<Usage>,
}

#[derive(Deserialize)]
struct Choice {
    message: OpenAIMessage,
    finish_reason: Option<String>,
}

#[derive(Deserialize)]
struct Usage {
    prompt_tokens: u32,
    completion_tokens: u32,
    total_tokens: u32,
}

#[derive(Deserialize)]
pub(crate) struct ImagesResponse {
    #[serde(default)]
    data: Vec<ImageDatum>,
}

#[derive(Deserialize)]
struct ImageDatum {
    b64_json: Option<String>,
}

impl ImagesResponse {
    pub(crate) fn first_image(&self) -> Option<EncodedImage> {
        self.data
            .iter()
            .find_map(|d| d.b64_json.as_deref().filter(|b| !b.is_empty()))
            .map(|data| EncodedImage::new(Some("image/png"), data))
    }
}

// Helper function to convert MessageRole to string
fn role_to_string(role: MessageRole) -> &'static str {
    match role {
        MessageRole::System => "system",
        MessageRole::User => "user",
        MessageRole::Assistant => "assistant",
    }
}

fn chat_request(
    model: &str,
    messages: Vec<ChatMessage>,
    options: CompletionOptions,
) -> ChatCompletionRequest {
    let mut openai_messages: Vec<OpenAIMessage> = messages
        .into_iter()
        .map(|msg| OpenAIMessage {
            role: role_to_string(msg.role).to_string(),
            content: msg.content,
        })
        .collect();

    // Structured output needs an object root, so the room array travels under `rooms`.
    let mut response_format = None;
    if let Some(schema) = &options.response_schema {
        let insert_at = openai_messages
            .iter()
            .take_while(|m| m.role == "system")
            .count();
        openai_messages.insert(
            insert_at,
            OpenAIMessage {
                role: "system".to_string(),
                content: prompts::ROOMS_ENVELOPE_INSTRUCTION.to_string(),
            },
        );
        response_format = Some(json!({
            "type": "json_schema",
            "json_schema": {
                "name": "palace_rooms",
                "strict": true,
                "schema": prompts::rooms_envelope_schema(schema),
            }
        }));
    }

    ChatCompletionRequest {
        model: model.to_string(),
        messages: openai_messages,
        temperature: options.temperature,
        max_tokens: options.max_tokens,
        response_format,
        stream: false,
    }
}

pub(crate) fn image_request(model: &str, image_prompt: &str, visual_style: &str) -> Value {
    let mut body = json!({
        "model": model,
        "prompt": prompts::image_prompt(image_prompt, visual_style),
        "n": 1,
    });
    // gpt-image models always answer in base64 and reject the parameter.
    if model.starts_with("dall-e") {
        body["response_format"] = json!("b64_json");
    }
    body
}

#[async_trait]
impl ModelProviderClient for OpenAIClient {
    async fn complete(
        &self,
        messages: Vec<ChatMessage>,
        options: CompletionOptions,
    ) -> Result<CompletionResponse, ApiError> {
        let request = chat_request(&self.model, messages, options);
        let response = self
            .post("/chat/completions")
            .json(&request)
            .send()
            .await
            .map_err(map_http_error)?;
        let response = check_status(response).await?;

        let completion: ChatCompletionResponse = response
            .json()
            .await
            .map_err(|e| ApiError::ProviderError(format!("Failed to parse response: {}", e)))?;

        let choice = completion
            .choices
            .first()
            .ok_or_else(|| ApiError::ProviderError("No choices in response".to_string()))?;

        let usage = completion.usage.unwrap_or(Usage {
            prompt_tokens: 0,
            completion_tokens: 0,
            total_tokens: 0,
        });

        Ok(CompletionResponse {
            content: choice.message.content.clone(),
            model: completion.model,
            usage: TokenUsage {
                prompt_tokens: usage.prompt_tokens,
                completion_tokens: usage.completion_tokens,
                total_tokens: usage.total_tokens,
            },
            finish_reason: choice.finish_reason.clone(),
        })
    }

    fn provider_name(&self) -> &str {
        self.provider_type.slug()
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}

#[async_trait]
impl ImageGenerator for OpenAIClient {
    async fn generate_image(
        &self,
        image_prompt: &str,
        visual_style: &str,
    ) -> Result<Option<EncodedImage>, ApiError> {
        let body = image_request(&self.model, image_prompt, visual_style);
        let response = self
            .post("/images/generations")
            .json(&body)
            .send()
            .await
            .map_err(|e| ApiError::ImageGenerationFailed(map_http_error(e).to_string()))?;
        let response = check_status(response)
            .await
            .map_err(|e| ApiError::ImageGenerationFailed(e.to_string()))?;

        let images: ImagesResponse = response.json().await.map_err(|e| {
            ApiError::ImageGenerationFailed(format!("Failed to parse images response: {}", e))
        })?;
        Ok(images.first_image())
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}
