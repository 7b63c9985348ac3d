//! CLI routes that run without any provider call.

use clap::Parser;
use loci::cli::{map_error, Cli, RunContext};
use loci::error::ApiError;
use tempfile::TempDir;

fn run(args: &[&str]) -> Result<String, ApiError> {
    let cli = Cli::try_parse_from(args).unwrap();
    let context = RunContext::new(cli.workspace.clone(), cli.config.clone())?;
    context.execute(&cli.command)
}

#[test]
fn test_styles_command_lists_presets() {
    let temp = TempDir::new().unwrap();
    let config = temp.path().join("loci.toml");
    std::fs::write(&config, "").unwrap();

    let out = run(&["loci", "--config", config.to_str().unwrap(), "styles"]).unwrap();
    assert!(out.contains("Anime / Studio Ghibli"));
}

#[test]
fn test_check_command_reports_config_file_and_ollama_image_error() {
    let temp = TempDir::new().unwrap();
    let config = temp.path().join("loci.toml");
    std::fs::write(
        &config,
        r#"
[structure]
provider_type = "ollama"
model = "llama3"

[image]
provider_type = "ollama"
model = "llava"
"#,
    )
    .unwrap();

    let out = run(&[
        "loci",
        "--config",
        config.to_str().unwrap(),
        "check",
        "--format",
        "json",
    ])
    .unwrap();
    let value: serde_json::Value = serde_json::from_str(&out).unwrap();
    assert_eq!(value["ready"], false);
    assert_eq!(value["config_source"], config.to_str().unwrap());
    assert_eq!(value["providers"][0]["api_key_status"], "not required");
    assert!(value["providers"][0]["errors"].as_array().unwrap().is_empty());
    assert!(!value["providers"][1]["errors"].as_array().unwrap().is_empty());
}

#[test]
fn test_missing_config_file_is_reported() {
    let err = run(&["loci", "--config", "/nonexistent/loci.toml", "styles"]).unwrap_err();
    assert!(map_error(&err).contains("Config file not found"));
}

#[test]
fn test_build_with_ollama_images_fails_before_network() {
    let temp = TempDir::new().unwrap();
    let config = temp.path().join("loci.toml");
    std::fs::write(&config, "[image]\nprovider_type = \"ollama\"\nmodel = \"llava\"\n").unwrap();

    let err = run(&[
        "loci",
        "--config",
        config.to_str().unwrap(),
        "build",
        "--theme",
        "Krebs Cycle",
        "--content",
        "Step1: Citrate",
        "--style",
        "Cyberpunk",
        "--no-archive",
    ])
    .unwrap_err();
    assert!(matches!(err, ApiError::ConfigError(_)));
}

#[test]
fn test_build_rejects_blank_style() {
    let temp = TempDir::new().unwrap();
    let config = temp.path().join("loci.toml");
    std::fs::write(&config, "").unwrap();
    let config = config.to_str().unwrap();

    let missing = Cli::try_parse_from([
        "loci", "--config", config, "build", "--theme", "Krebs Cycle", "--content", "Step1",
    ]);
    assert!(missing.is_err());

    let err = run(&[
        "loci",
        "--config",
        config,
        "build",
        "--theme",
        "Krebs Cycle",
        "--content",
        "Step1: Citrate",
        "--style",
        " ",
        "--no-archive",
    ])
    .unwrap_err();
    assert!(matches!(err, ApiError::InvalidRequest(_)));
}
