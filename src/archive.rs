//! Archive builder: Markdown blueprint plus decoded room images, zipped.
//!
//! Everything here is local and synchronous; nothing touches the network.

use crate::error::ApiError;
use crate::palace::{GenerationRequest, Room};
use std::io::{Cursor, Write};
use std::path::{Path, PathBuf};
use tracing::info;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

const IMAGES_DIR: &str = "images";

/// A built archive, ready to be written or handed to the user.
#[derive(Debug, Clone)]
pub struct PalaceArchive {
    pub file_name: String,
    pub bytes: Vec<u8>,
}

impl PalaceArchive {
    /// Write the archive into `dir`, returning the full path.
    pub fn write_to(&self, dir: &Path) -> Result<PathBuf, ApiError> {
        std::fs::create_dir_all(dir)?;
        let path = dir.join(&self.file_name);
        std::fs::write(&path, &self.bytes)?;
        info!(path = %path.display(), bytes = self.bytes.len(), "Palace archive written");
        Ok(path)
    }
}

/// Filesystem-safe token: ASCII letters and digits kept, everything else `_`, lower-cased.
pub fn theme_slug(theme: &str) -> String {
    theme
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() {
                c.to_ascii_lowercase()
            } else {
                '_'
            }
        })
        .collect()
}

/// Archive-relative path of a room's image, by 0-based room index.
pub fn image_path(index: usize, room: &Room) -> Option<String> {
    room.generated_image()
        .map(|image| format!("{}/room_{}.{}", IMAGES_DIR, index + 1, image.file_extension()))
}

pub fn render_markdown(request: &GenerationRequest, rooms: &[Room]) -> String {
    let mut md = format!("# {}\n\n", request.theme);
    md.push_str(&format!("**Style:** {}\n\n", request.visual_style));
    md.push_str("---\n\n");

    for (index, room) in rooms.iter().enumerate() {
        md.push_str(&format!("## {}. {}\n\n", index + 1, room.room_name));
        if let Some(path) = image_path(index, room) {
            md.push_str(&format!("![{}]({})\n\n", room.room_name, path));
        }

        md.push_str(&format!("### Scene\n{}\n\n", room.narrative));

        md.push_str("### Technical details\n");
        for info in &room.technical_info {
            md.push_str(&format!("- {}\n", info));
        }
        md.push('\n');

        md.push_str(&format!("### Visual prompt\n> {}\n\n", room.image_prompt));
        md.push_str("---\n\n");
    }
    md
}

/// Assemble `<slug>_palace.zip` with `<slug>.md` and `images/room_<n>.<ext>`.
pub fn build_archive(request: &GenerationRequest, rooms: &[Room]) -> Result<PalaceArchive, ApiError> {
    let slug = theme_slug(&request.theme);
    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);
    let mut zip = ZipWriter::new(Cursor::new(Vec::new()));

    let has_images = rooms.iter().any(|r| r.generated_image().is_some());
    if has_images {
        zip.add_directory(format!("{}/", IMAGES_DIR), options)?;
    }
    for (index, room) in rooms.iter().enumerate() {
        let (Some(image), Some(path)) = (room.generated_image(), image_path(index, room)) else {
            continue;
        };
        let bytes = image.decode().map_err(|e| {
            ApiError::ArchiveFailed(format!("Image for room {} is not valid base64: {}", index + 1, e))
        })?;
        zip.start_file(path, options)?;
        zip.write_all(&bytes).map_err(archive_io_error)?;
    }

    zip.start_file(format!("{}.md", slug), options)?;
    zip.write_all(render_markdown(request, rooms).as_bytes())
        .map_err(archive_io_error)?;

    let bytes = zip.finish()?.into_inner();
    Ok(PalaceArchive {
        file_name: format!("{}_palace.zip", slug),
        bytes,
    })
}

fn archive_io_error(err: std::io::Error) -> ApiError {
    ApiError::ArchiveFailed(err.to_string())
}
