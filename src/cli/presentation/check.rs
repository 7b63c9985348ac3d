//! Check command presentation.

use super::format_section_heading;
use crate::error::ApiError;
use crate::provider::commands::ConfigCheckResult;
use comfy_table::presets::UTF8_BORDERS_ONLY;
use comfy_table::Table;
use owo_colors::OwoColorize;

pub fn format_check_text(result: &ConfigCheckResult) -> String {
    let mut out = format!("{}\n", format_section_heading("Configuration"));
    out.push_str(&format!("Source: {}\n\n", result.config_source));

    let mut table = Table::new();
    table.load_preset(UTF8_BORDERS_ONLY);
    table.set_header(vec!["Role", "Type", "Model", "Endpoint", "API key"]);
    for entry in &result.providers {
        table.add_row(vec![
            entry.role.to_string(),
            entry.provider_type.to_string(),
            entry.model.clone(),
            entry.endpoint.clone(),
            entry.api_key_status.clone(),
        ]);
    }
    out.push_str(&format!("{}\n", table));

    let problems: Vec<String> = result
        .providers
        .iter()
        .flat_map(|p| p.errors.iter().map(move |e| format!("{}: {}", p.role, e)))
        .chain(result.errors.iter().cloned())
        .collect();

    if problems.is_empty() {
        out.push_str(&format!("\n{} Ready to build", "✓".green()));
    } else {
        out.push_str(&format!("\nErrors ({}):", problems.len()));
        for problem in problems {
            out.push_str(&format!("\n  {} {}", "✗".red(), problem));
        }
    }
    out
}

pub fn format_check_json(result: &ConfigCheckResult) -> Result<String, ApiError> {
    let mut value = serde_json::to_value(result)
        .map_err(|e| ApiError::ConfigError(format!("Failed to render check result: {}", e)))?;
    value["ready"] = serde_json::Value::Bool(result.is_ready());
    serde_json::to_string_pretty(&value)
        .map_err(|e| ApiError::ConfigError(format!("Failed to render check result: {}", e)))
}
