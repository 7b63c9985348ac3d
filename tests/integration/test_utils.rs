//! Shared test utilities for integration tests
//!
//! Scripted stand-ins for the two providers, plus XDG isolation for config tests.

use async_trait::async_trait;
use loci::error::ApiError;
use loci::palace::{EncodedImage, GenerationRequest, RoomBlueprint};
use loci::provider::{ImageGenerator, StructureGenerator};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Mutex as StdMutex;
use tempfile::TempDir;

/// Global mutex to serialize environment variable access across all tests
static XDG_ENV_MUTEX: StdMutex<()> = StdMutex::new(());

/// Run `f` with XDG_CONFIG_HOME pointed into `test_dir`, restoring it afterwards.
pub fn with_xdg_env<F, R>(test_dir: &TempDir, f: F) -> R
where
    F: FnOnce() -> R,
{
    let _guard = XDG_ENV_MUTEX.lock().unwrap_or_else(|e| e.into_inner());
    let original = std::env::var("XDG_CONFIG_HOME").ok();
    let original_env = std::env::var("LOCI_ENV").ok();

    let config_home = test_dir.path().join("xdg");
    std::fs::create_dir_all(&config_home).unwrap();
    std::env::set_var("XDG_CONFIG_HOME", config_home.to_str().unwrap());
    std::env::remove_var("LOCI_ENV");

    let result = f();

    match original {
        Some(value) => std::env::set_var("XDG_CONFIG_HOME", value),
        None => std::env::remove_var("XDG_CONFIG_HOME"),
    }
    if let Some(value) = original_env {
        std::env::set_var("LOCI_ENV", value);
    }
    result
}

pub fn blueprint(name: &str, facts: &[&str]) -> RoomBlueprint {
    RoomBlueprint {
        room_name: name.to_string(),
        narrative: format!("You step into the {} and something strange happens", name),
        technical_info: facts.iter().map(|f| f.to_string()).collect(),
        image_prompt: format!("A surreal {} glowing with neon signs", name),
    }
}

/// Structure generator returning a fixed plan, or failing.
pub struct ScriptedStructure {
    outcome: Result<Vec<RoomBlueprint>, String>,
    pub requests: Mutex<Vec<GenerationRequest>>,
}

impl ScriptedStructure {
    pub fn rooms(rooms: Vec<RoomBlueprint>) -> Self {
        Self {
            outcome: Ok(rooms),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn failing(message: &str) -> Self {
        Self {
            outcome: Err(message.to_string()),
            requests: Mutex::new(Vec::new()),
        }
    }
}

#[async_trait]
impl StructureGenerator for ScriptedStructure {
    async fn generate_structure(
        &self,
        request: &GenerationRequest,
    ) -> Result<Vec<RoomBlueprint>, ApiError> {
        self.requests.lock().push(request.clone());
        self.outcome
            .clone()
            .map_err(ApiError::StructureGenerationFailed)
    }
}

#[derive(Clone)]
pub enum ImageOutcome {
    Image(&'static str),
    Nothing,
    Fail,
}

/// Image generator keyed by image prompt. Unknown prompts yield a PNG of "hello".
pub struct ScriptedImages {
    outcomes: HashMap<String, ImageOutcome>,
    pub calls: Mutex<Vec<(String, String)>>,
}

impl ScriptedImages {
    pub fn new() -> Self {
        Self {
            outcomes: HashMap::new(),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn with(mut self, image_prompt: &str, outcome: ImageOutcome) -> Self {
        self.outcomes.insert(image_prompt.to_string(), outcome);
        self
    }
}

#[async_trait]
impl ImageGenerator for ScriptedImages {
    async fn generate_image(
        &self,
        image_prompt: &str,
        visual_style: &str,
    ) -> Result<Option<EncodedImage>, ApiError> {
        self.calls
            .lock()
            .push((image_prompt.to_string(), visual_style.to_string()));
        match self
            .outcomes
            .get(image_prompt)
            .cloned()
            .unwrap_or(ImageOutcome::Image("aGVsbG8="))
        {
            ImageOutcome::Image(data) => Ok(Some(EncodedImage::new(Some("image/png"), data))),
            ImageOutcome::Nothing => Ok(None),
            ImageOutcome::Fail => Err(ApiError::ImageGenerationFailed(
                "quota exhausted".to_string(),
            )),
        }
    }

    fn model_name(&self) -> &str {
        "scripted-images"
    }
}
