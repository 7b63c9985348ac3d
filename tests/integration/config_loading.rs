//! Configuration loading through the public loader and the CLI run context.

use super::test_utils::with_xdg_env;
use loci::config::{ConfigLoader, ProviderType};
use tempfile::TempDir;

#[test]
fn test_global_config_is_picked_up() {
    let temp = TempDir::new().unwrap();
    let workspace = temp.path().join("workspace");
    std::fs::create_dir_all(&workspace).unwrap();

    let config = with_xdg_env(&temp, || {
        let global = ConfigLoader::global_config_path().unwrap();
        std::fs::create_dir_all(global.parent().unwrap()).unwrap();
        std::fs::write(
            &global,
            r#"
[image]
provider_type = "openai"
model = "gpt-image-1"

[logging]
level = "warn"
"#,
        )
        .unwrap();
        ConfigLoader::load(&workspace).unwrap()
    });

    assert_eq!(config.image.provider_type, ProviderType::OpenAI);
    assert_eq!(config.image.model, "gpt-image-1");
    assert_eq!(config.structure.model, "gemini-3-flash-preview");
    assert_eq!(config.logging.level, "warn");
}

#[test]
fn test_workspace_without_config_uses_defaults() {
    let temp = TempDir::new().unwrap();
    let config = with_xdg_env(&temp, || ConfigLoader::load(temp.path()).unwrap());
    assert_eq!(config.structure.provider_type, ProviderType::Gemini);
    assert_eq!(config.image.model, "gemini-2.5-flash-image");
    assert!(config.validate().is_ok());
}

#[test]
fn test_invalid_provider_type_is_config_error() {
    let temp = TempDir::new().unwrap();
    let file = temp.path().join("bad.toml");
    std::fs::write(&file, "[structure]\nprovider_type = \"anthropic\"\n").unwrap();

    let err = ConfigLoader::load_from_file(&file).unwrap_err();
    assert!(matches!(err, loci::error::ApiError::ConfigError(_)));
}
