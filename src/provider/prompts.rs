//! Prompt text and the structured-output schema sent to the providers.

use crate::palace::GenerationRequest;
use serde_json::{json, Value};

/// Rooms are always visited in this order; the model uses only as many as it needs.
pub const ROOM_SEQUENCE: [&str; 5] = ["Entrance", "Kitchen", "Bedrooms", "Bathrooms", "Yard"];

pub fn system_instruction() -> String {
    format!(
        "You are an expert in the Method of Loci (memory palace) memorization technique. \
Your job is to turn technical information into memorable narratives anchored to specific \
spatial locations.

CORE RULES:
1. ABSOLUTE PRESERVATION: every piece of technical information provided must be kept EXACTLY \
as received. Narratives may paraphrase; the technicalInfo lists may not.
2. FIXED ROOM ORDER: {}. Use only as many rooms as the content needs.
3. NARRATIVE: write playful narratives built on metaphors and strong visual allusions.",
        ROOM_SEQUENCE.join(" -> ")
    )
}

pub fn structure_prompt(request: &GenerationRequest) -> String {
    format!(
        "Theme: {}
Technical content: {}
Visual style: {}

Analyze the content, split it into logical groups and assign each group to a room.
Return a JSON array where each object represents one scene.",
        request.theme, request.content, request.visual_style
    )
}

pub fn image_prompt(image_prompt: &str, visual_style: &str) -> String {
    format!(
        "Style: {}. Scene: {}. High quality, detailed, atmospheric.",
        visual_style, image_prompt
    )
}

/// Extra instruction for providers whose structured output must be a JSON object.
pub const ROOMS_ENVELOPE_INSTRUCTION: &str = "Respond with a single JSON object of the form \
{\"rooms\": [...]}, where \"rooms\" is the array of scene objects. Use no other top-level key.";

/// Schema of the structure response: an array of room objects, all fields required.
pub fn room_schema() -> Value {
    json!({
        "type": "ARRAY",
        "items": {
            "type": "OBJECT",
            "properties": {
                "roomName": {
                    "type": "STRING",
                    "description": "Name of the room (e.g. Entrance, Kitchen)"
                },
                "narrative": {
                    "type": "STRING",
                    "description": "Playful, visual narrative of the scene"
                },
                "technicalInfo": {
                    "type": "ARRAY",
                    "items": { "type": "STRING" },
                    "description": "Exact list of the technical facts placed in this scene"
                },
                "imagePrompt": {
                    "type": "STRING",
                    "description": "Detailed prompt for generating the scene's image"
                }
            },
            "required": ["roomName", "narrative", "technicalInfo", "imagePrompt"]
        }
    })
}

/// Wrap an array schema under a required `rooms` property, in standard JSON
/// Schema form (lower-case type names, closed objects).
pub fn rooms_envelope_schema(rooms: &Value) -> Value {
    json!({
        "type": "object",
        "properties": { "rooms": to_json_schema(rooms) },
        "required": ["rooms"],
        "additionalProperties": false
    })
}

fn to_json_schema(schema: &Value) -> Value {
    match schema {
        Value::Object(map) => {
            let mut out = serde_json::Map::new();
            for (key, value) in map {
                let converted = match (key.as_str(), value) {
                    ("type", Value::String(name)) => Value::String(name.to_ascii_lowercase()),
                    _ => to_json_schema(value),
                };
                out.insert(key.clone(), converted);
            }
            if out.get("type").and_then(Value::as_str) == Some("object") {
                out.entry("additionalProperties")
                    .or_insert(Value::Bool(false));
            }
            Value::Object(out)
        }
        Value::Array(items) => Value::Array(items.iter().map(to_json_schema).collect()),
        other => other.clone(),
    }
}
