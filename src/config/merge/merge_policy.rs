//! Merge rules: defaults, override order, conflict handling.

use config::Config;
use config::ConfigBuilder;
use config::ConfigError;

pub const DEFAULT_STRUCTURE_MODEL: &str = "gemini-3-flash-preview";
pub const DEFAULT_IMAGE_MODEL: &str = "gemini-2.5-flash-image";

/// Create a Config builder with merge policy defaults applied.
///
/// Later sources override earlier ones key by key, so a file that only sets
/// `image.model` keeps the default `image.provider_type`.
pub fn builder_with_defaults() -> Result<ConfigBuilder<config::builder::DefaultState>, ConfigError>
{
    Config::builder()
        .set_default("structure.provider_type", "gemini")?
        .set_default("structure.model", DEFAULT_STRUCTURE_MODEL)?
        .set_default("image.provider_type", "gemini")?
        .set_default("image.model", DEFAULT_IMAGE_MODEL)?
        .set_default("output.directory", ".")
}
