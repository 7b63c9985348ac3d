//! Build command presentation: live progress lines and the final room summary.

use super::format_section_heading;
use crate::error::ApiError;
use crate::orchestrator::{PalaceEvent, PalaceSnapshot};
use crate::palace::{GenerationStatus, ImageState, Room};
use comfy_table::presets::UTF8_BORDERS_ONLY;
use comfy_table::Table;
use owo_colors::OwoColorize;
use serde_json::json;
use std::path::Path;

/// Turns orchestrator events into one-line progress messages.
#[derive(Debug, Default)]
pub struct ProgressRenderer {
    room_names: Vec<String>,
    resolved: usize,
}

impl ProgressRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn render(&mut self, event: &PalaceEvent) -> Option<String> {
        match event {
            PalaceEvent::StatusChanged { status, .. } => match status {
                GenerationStatus::Planning => Some("Planning the palace layout...".to_string()),
                GenerationStatus::Visualizing => Some(format!(
                    "Painting {} room(s)...",
                    self.room_names.len()
                )),
                GenerationStatus::Completed => Some("Palace complete".to_string()),
                GenerationStatus::Error => Some("Palace construction failed".to_string()),
                GenerationStatus::Idle => None,
            },
            PalaceEvent::RoomsPlanned { room_names, .. } => {
                self.room_names = room_names.clone();
                self.resolved = 0;
                Some(format!(
                    "Planned {} room(s): {}",
                    room_names.len(),
                    room_names.join(" -> ")
                ))
            }
            PalaceEvent::RoomImageResolved {
                index, has_image, ..
            } => {
                self.resolved += 1;
                let name = self
                    .room_names
                    .get(*index)
                    .map(String::as_str)
                    .unwrap_or("room");
                let outcome = if *has_image {
                    "illustrated"
                } else {
                    "no image"
                };
                Some(format!(
                    "[{}/{}] {}: {}",
                    self.resolved,
                    self.room_names.len(),
                    name,
                    outcome
                ))
            }
        }
    }
}

fn image_label(room: &Room) -> String {
    match &room.image {
        ImageState::Ready(image) => format!("{}", image.mime_type.green()),
        ImageState::Unavailable => format!("{}", "unavailable".yellow()),
        ImageState::Pending => format!("{}", "pending".dimmed()),
    }
}

pub fn format_build_text(snapshot: &PalaceSnapshot, archive_path: Option<&Path>) -> String {
    let mut out = String::new();
    if let Some(request) = &snapshot.request_data {
        out.push_str(&format!("{}\n", format_section_heading(&request.theme)));
        out.push_str(&format!("Style: {}\n", request.visual_style));
    }
    out.push_str(&format!("Status: {}\n\n", snapshot.status));

    let mut table = Table::new();
    table.load_preset(UTF8_BORDERS_ONLY);
    table.set_header(vec!["#", "Room", "Facts", "Image"]);
    for (i, room) in snapshot.rooms.iter().enumerate() {
        table.add_row(vec![
            (i + 1).to_string(),
            room.room_name.clone(),
            room.technical_info.len().to_string(),
            image_label(room),
        ]);
    }
    out.push_str(&format!("{}\n", table));

    let illustrated = snapshot
        .rooms
        .iter()
        .filter(|r| r.generated_image().is_some())
        .count();
    out.push_str(&format!(
        "\n{} of {} room(s) illustrated\n",
        illustrated,
        snapshot.rooms.len()
    ));
    match archive_path {
        Some(path) => out.push_str(&format!("Archive: {}", path.display())),
        None => out.push_str("Archive: not written"),
    }
    out
}

/// Summary without image payloads. The Markdown blueprint rides along when requested.
pub fn format_build_json(
    snapshot: &PalaceSnapshot,
    archive_path: Option<&Path>,
    blueprint: Option<&str>,
) -> Result<String, ApiError> {
    let rooms: Vec<_> = snapshot
        .rooms
        .iter()
        .enumerate()
        .map(|(i, room)| {
            json!({
                "index": i + 1,
                "roomName": room.room_name,
                "narrative": room.narrative,
                "technicalInfo": room.technical_info,
                "imagePrompt": room.image_prompt,
                "hasImage": room.generated_image().is_some(),
            })
        })
        .collect();
    let mut out = json!({
        "status": snapshot.status,
        "request": snapshot.request_data,
        "rooms": rooms,
        "archive": archive_path.map(|p| p.display().to_string()),
    });
    if let Some(blueprint) = blueprint {
        out["blueprint"] = json!(blueprint);
    }
    serde_json::to_string_pretty(&out)
        .map_err(|e| ApiError::ConfigError(format!("Failed to render build result: {}", e)))
}
