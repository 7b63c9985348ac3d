//! Suggested visual styles.

use crate::palace::VISUAL_STYLES;

pub fn format_styles_text() -> String {
    let mut output = String::from("Suggested visual styles:\n");
    for (i, style) in VISUAL_STYLES.iter().enumerate() {
        output.push_str(&format!("  {}. {}\n", i + 1, style));
    }
    output.push_str("\nAny other non-blank text works as --style too.");
    output
}
