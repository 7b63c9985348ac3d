//! CLI presentation: text and json formatters per command.

mod build;
mod check;
mod styles;

pub use build::{format_build_json, format_build_text, ProgressRenderer};
pub use check::{format_check_json, format_check_text};
pub use styles::format_styles_text;

use owo_colors::OwoColorize;

/// Format a section heading with bold/underline.
pub fn format_section_heading(title: &str) -> String {
    format!("{}", title.bold().underline())
}
