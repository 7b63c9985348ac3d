//! Palace data model
//!
//! Plain data for a generation request, the rooms produced by the structure
//! generator and the per-room image state filled in by the image generator.

use crate::error::ApiError;
use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use serde::{Deserialize, Serialize};

/// Style suggestions listed by `loci styles`. Any non-blank text is accepted.
pub const VISUAL_STYLES: [&str; 8] = [
    "Cyberpunk",
    "Fantasy Medieval",
    "Steampunk",
    "Watercolor",
    "Realistic Photography",
    "Anime / Studio Ghibli",
    "Minimalist Line Art",
    "Surrealism (Dali-esque)",
];

const DEFAULT_IMAGE_MIME: &str = "image/png";

/// A user's request. Immutable once submitted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationRequest {
    pub theme: String,
    pub content: String,
    pub visual_style: String,
}

impl GenerationRequest {
    pub fn new(
        theme: impl Into<String>,
        content: impl Into<String>,
        visual_style: impl Into<String>,
    ) -> Self {
        Self {
            theme: theme.into(),
            content: content.into(),
            visual_style: visual_style.into(),
        }
    }

    pub fn validate(&self) -> Result<(), ApiError> {
        if self.theme.trim().is_empty() {
            return Err(ApiError::InvalidRequest("Theme cannot be empty".to_string()));
        }
        if self.content.trim().is_empty() {
            return Err(ApiError::InvalidRequest(
                "Technical content cannot be empty".to_string(),
            ));
        }
        if self.visual_style.trim().is_empty() {
            return Err(ApiError::InvalidRequest(
                "Visual style cannot be empty".to_string(),
            ));
        }
        Ok(())
    }
}

/// Overall state of the current generation attempt.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum GenerationStatus {
    #[default]
    Idle,
    /// Generating the text structure
    Planning,
    /// Generating images
    Visualizing,
    Completed,
    Error,
}

impl GenerationStatus {
    pub fn is_in_progress(self) -> bool {
        matches!(self, GenerationStatus::Planning | GenerationStatus::Visualizing)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            GenerationStatus::Idle => "IDLE",
            GenerationStatus::Planning => "PLANNING",
            GenerationStatus::Visualizing => "VISUALIZING",
            GenerationStatus::Completed => "COMPLETED",
            GenerationStatus::Error => "ERROR",
        }
    }
}

impl std::fmt::Display for GenerationStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Binary image data as returned by the image provider, still base64-encoded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedImage {
    pub mime_type: String,
    pub data: String,
}

impl EncodedImage {
    pub fn new(mime_type: Option<&str>, data: impl Into<String>) -> Self {
        let mime_type = mime_type
            .filter(|m| !m.trim().is_empty())
            .unwrap_or(DEFAULT_IMAGE_MIME)
            .to_string();
        Self {
            mime_type,
            data: data.into(),
        }
    }

    pub fn to_data_uri(&self) -> String {
        format!("data:{};base64,{}", self.mime_type, self.data)
    }

    /// Parse a `data:<mime>;base64,<data>` URI.
    pub fn from_data_uri(uri: &str) -> Option<Self> {
        let rest = uri.strip_prefix("data:")?;
        let (header, data) = rest.split_once(',')?;
        let mime_type = header.strip_suffix(";base64")?;
        Some(Self::new(Some(mime_type), data))
    }

    pub fn decode(&self) -> Result<Vec<u8>, base64::DecodeError> {
        BASE64.decode(self.data.trim())
    }

    pub fn file_extension(&self) -> &'static str {
        match self.mime_type.to_ascii_lowercase().as_str() {
            "image/jpeg" | "image/jpg" => "jpg",
            "image/webp" => "webp",
            "image/gif" => "gif",
            _ => "png",
        }
    }
}

/// Image state of one room. Exactly one variant holds at any time.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ImageState {
    #[default]
    Pending,
    Ready(EncodedImage),
    /// The image call settled without producing an image.
    Unavailable,
}

/// One room as returned by the structure generator, before any image exists.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoomBlueprint {
    pub room_name: String,
    pub narrative: String,
    pub technical_info: Vec<String>,
    pub image_prompt: String,
}

impl RoomBlueprint {
    /// Check the fields the pipeline relies on are present.
    pub fn validate(&self) -> Result<(), String> {
        if self.room_name.trim().is_empty() {
            return Err("roomName is empty".to_string());
        }
        if self.narrative.trim().is_empty() {
            return Err(format!("narrative is empty for room '{}'", self.room_name));
        }
        if self.image_prompt.trim().is_empty() {
            return Err(format!("imagePrompt is empty for room '{}'", self.room_name));
        }
        Ok(())
    }
}

/// A generated room. Identity is its position in the palace.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(into = "RoomRecord", from = "RoomRecord")]
pub struct Room {
    pub room_name: String,
    pub narrative: String,
    pub technical_info: Vec<String>,
    pub image_prompt: String,
    pub image: ImageState,
}

impl Room {
    pub fn generated_image(&self) -> Option<&EncodedImage> {
        match &self.image {
            ImageState::Ready(image) => Some(image),
            _ => None,
        }
    }

    pub fn is_image_pending(&self) -> bool {
        matches!(self.image, ImageState::Pending)
    }
}

impl From<RoomBlueprint> for Room {
    fn from(blueprint: RoomBlueprint) -> Self {
        Self {
            room_name: blueprint.room_name,
            narrative: blueprint.narrative,
            technical_info: blueprint.technical_info,
            image_prompt: blueprint.image_prompt,
            image: ImageState::Pending,
        }
    }
}

/// Wire shape of a room: image as a data URI plus a pending flag.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RoomRecord {
    room_name: String,
    narrative: String,
    technical_info: Vec<String>,
    image_prompt: String,
    #[serde(default)]
    generated_image: Option<String>,
    #[serde(default)]
    image_pending: bool,
}

impl From<Room> for RoomRecord {
    fn from(room: Room) -> Self {
        let (generated_image, image_pending) = match &room.image {
            ImageState::Pending => (None, true),
            ImageState::Ready(image) => (Some(image.to_data_uri()), false),
            ImageState::Unavailable => (None, false),
        };
        Self {
            room_name: room.room_name,
            narrative: room.narrative,
            technical_info: room.technical_info,
            image_prompt: room.image_prompt,
            generated_image,
            image_pending,
        }
    }
}

impl From<RoomRecord> for Room {
    fn from(record: RoomRecord) -> Self {
        let image = match record.generated_image.as_deref() {
            Some(uri) => EncodedImage::from_data_uri(uri)
                .map(ImageState::Ready)
                .unwrap_or(ImageState::Unavailable),
            None if record.image_pending => ImageState::Pending,
            None => ImageState::Unavailable,
        };
        Self {
            room_name: record.room_name,
            narrative: record.narrative,
            technical_info: record.technical_info,
            image_prompt: record.image_prompt,
            image,
        }
    }
}
