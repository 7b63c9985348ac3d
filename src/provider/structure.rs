//! Structure generation over any chat provider, with the room schema
//! validated on receipt.

use crate::error::ApiError;
use crate::palace::{GenerationRequest, RoomBlueprint};
use crate::provider::{
    prompts, ChatMessage, CompletionOptions, ModelProviderClient, StructureGenerator,
};
use async_trait::async_trait;
use serde::Deserialize;
use tracing::{debug, warn};

pub struct ChatStructureGenerator {
    client: Box<dyn ModelProviderClient>,
    temperature: Option<f32>,
}

impl ChatStructureGenerator {
    pub fn new(client: Box<dyn ModelProviderClient>) -> Self {
        Self {
            client,
            temperature: None,
        }
    }

    pub fn with_temperature(mut self, temperature: Option<f32>) -> Self {
        self.temperature = temperature;
        self
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum StructureEnvelope {
    Rooms(Vec<RoomBlueprint>),
    Wrapped { rooms: Vec<RoomBlueprint> },
}

/// Parse and validate a structure response.
///
/// Accepts a bare JSON array or an object with a `rooms` array, optionally
/// wrapped in a Markdown code fence.
pub fn parse_structure(raw: &str) -> Result<Vec<RoomBlueprint>, ApiError> {
    let body = strip_code_fence(raw);
    let envelope: StructureEnvelope = serde_json::from_str(body).map_err(|e| {
        ApiError::StructureGenerationFailed(format!("Response does not match room schema: {}", e))
    })?;
    let rooms = match envelope {
        StructureEnvelope::Rooms(rooms) | StructureEnvelope::Wrapped { rooms } => rooms,
    };

    if rooms.is_empty() {
        return Err(ApiError::StructureGenerationFailed(
            "Response contained no rooms".to_string(),
        ));
    }
    for (index, room) in rooms.iter().enumerate() {
        room.validate().map_err(|e| {
            ApiError::StructureGenerationFailed(format!("Room {}: {}", index + 1, e))
        })?;
    }
    Ok(rooms)
}

fn strip_code_fence(raw: &str) -> &str {
    let trimmed = raw.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    // Drop the info string ("json") on the opening fence line.
    let rest = rest.split_once('\n').map(|(_, body)| body).unwrap_or("");
    rest.trim_end().strip_suffix("```").unwrap_or(rest).trim()
}

#[async_trait]
impl StructureGenerator for ChatStructureGenerator {
    async fn generate_structure(
        &self,
        request: &GenerationRequest,
    ) -> Result<Vec<RoomBlueprint>, ApiError> {
        let messages = vec![
            ChatMessage::system(prompts::system_instruction()),
            ChatMessage::user(prompts::structure_prompt(request)),
        ];
        let options = CompletionOptions {
            temperature: self.temperature,
            max_tokens: None,
            response_schema: Some(prompts::room_schema()),
        };

        let response = self
            .client
            .complete(messages, options)
            .await
            .map_err(|e| ApiError::StructureGenerationFailed(e.to_string()))?;
        debug!(
            provider = self.client.provider_name(),
            model = %response.model,
            total_tokens = response.usage.total_tokens,
            "Structure response received"
        );

        parse_structure(&response.content).inspect_err(|e| {
            warn!(error = %e, "Structure response rejected");
        })
    }
}
