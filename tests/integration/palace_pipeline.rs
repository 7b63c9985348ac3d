//! End-to-end pipeline tests with scripted providers.

use super::test_utils::{blueprint, ImageOutcome, ScriptedImages, ScriptedStructure};
use async_trait::async_trait;
use loci::error::ApiError;
use loci::orchestrator::{Orchestrator, PalaceEvent, STRUCTURE_FAILURE_MESSAGE};
use loci::palace::{GenerationRequest, GenerationStatus, ImageState};
use loci::provider::{
    ChatMessage, ChatStructureGenerator, CompletionOptions, CompletionResponse,
    ModelProviderClient, TokenUsage,
};
use std::io::{Cursor, Read};
use std::sync::Arc;
use tokio::sync::mpsc;
use zip::ZipArchive;

fn krebs_request() -> GenerationRequest {
    GenerationRequest::new(
        "Krebs Cycle",
        "Step1: Citrate\nStep2: Isocitrate",
        "Cyberpunk",
    )
}

fn krebs_structure() -> ScriptedStructure {
    ScriptedStructure::rooms(vec![
        blueprint("Entrance", &["Step1: Citrate"]),
        blueprint("Kitchen", &["Step2: Isocitrate"]),
    ])
}

#[tokio::test]
async fn test_krebs_cycle_palace_end_to_end() {
    let images = ScriptedImages::new().with(
        "A surreal Kitchen glowing with neon signs",
        ImageOutcome::Fail,
    );
    let orchestrator = Orchestrator::new(Arc::new(krebs_structure()), Arc::new(images));

    let snapshot = orchestrator.generate(krebs_request()).await.unwrap();
    assert_eq!(snapshot.status, GenerationStatus::Completed);
    assert_eq!(snapshot.rooms.len(), 2);
    assert!(snapshot.rooms[0].generated_image().is_some());
    assert_eq!(snapshot.rooms[1].image, ImageState::Unavailable);

    let archive = orchestrator.download_package().unwrap();
    assert_eq!(archive.file_name, "krebs_cycle_palace.zip");

    let mut zip = ZipArchive::new(Cursor::new(archive.bytes)).unwrap();
    let image_files: Vec<String> = zip
        .file_names()
        .filter(|n| n.starts_with("images/") && !n.ends_with('/'))
        .map(str::to_string)
        .collect();
    assert_eq!(image_files, vec!["images/room_1.png".to_string()]);

    let mut markdown = String::new();
    zip.by_name("krebs_cycle.md")
        .unwrap()
        .read_to_string(&mut markdown)
        .unwrap();
    assert!(markdown.contains("- Step1: Citrate"));
    assert!(markdown.contains("- Step2: Isocitrate"));
    assert_eq!(markdown.matches("![").count(), 1);
    assert_eq!(markdown.matches("### Technical details").count(), 2);
}

#[tokio::test]
async fn test_every_room_gets_the_shared_style() {
    let images = Arc::new(ScriptedImages::new());
    let orchestrator = Orchestrator::new(Arc::new(krebs_structure()), images.clone());
    orchestrator
        .generate(GenerationRequest::new("Krebs Cycle", "facts", "Watercolor"))
        .await
        .unwrap();

    let calls = images.calls.lock();
    assert_eq!(calls.len(), 2);
    assert!(calls.iter().all(|(_, style)| style == "Watercolor"));
}

#[tokio::test]
async fn test_structure_failure_leaves_nothing_to_export() {
    let orchestrator = Orchestrator::new(
        Arc::new(ScriptedStructure::failing("model returned prose")),
        Arc::new(ScriptedImages::new()),
    );

    let err = orchestrator.generate(krebs_request()).await.unwrap_err();
    assert!(matches!(err, ApiError::StructureGenerationFailed(_)));

    let snapshot = orchestrator.snapshot();
    assert_eq!(snapshot.status, GenerationStatus::Error);
    assert!(snapshot.rooms.is_empty());
    assert_eq!(
        snapshot.error_message.as_deref(),
        Some(STRUCTURE_FAILURE_MESSAGE)
    );
    assert!(matches!(
        orchestrator.download_package(),
        Err(ApiError::NothingToExport(_))
    ));
}

#[tokio::test]
async fn test_rooms_without_images_still_complete() {
    let images = ScriptedImages::new()
        .with("A surreal Entrance glowing with neon signs", ImageOutcome::Nothing)
        .with("A surreal Kitchen glowing with neon signs", ImageOutcome::Fail);
    let orchestrator = Orchestrator::new(Arc::new(krebs_structure()), Arc::new(images));

    let snapshot = orchestrator.generate(krebs_request()).await.unwrap();
    assert_eq!(snapshot.status, GenerationStatus::Completed);
    assert!(snapshot
        .rooms
        .iter()
        .all(|r| r.image == ImageState::Unavailable));

    let archive = orchestrator.download_package().unwrap();
    let zip = ZipArchive::new(Cursor::new(archive.bytes)).unwrap();
    assert!(zip.file_names().all(|n| !n.starts_with("images/")));
}

#[tokio::test]
async fn test_events_describe_the_attempt() {
    let (tx, mut rx) = mpsc::unbounded_channel();
    let orchestrator = Orchestrator::new(
        Arc::new(krebs_structure()),
        Arc::new(ScriptedImages::new()),
    )
    .with_events(tx);

    orchestrator.generate(krebs_request()).await.unwrap();

    let mut events = Vec::new();
    while let Ok(event) = rx.try_recv() {
        events.push(event);
    }
    assert_eq!(
        events.first(),
        Some(&PalaceEvent::StatusChanged {
            attempt: 1,
            status: GenerationStatus::Planning
        })
    );
    assert!(events.contains(&PalaceEvent::RoomsPlanned {
        attempt: 1,
        room_names: vec!["Entrance".to_string(), "Kitchen".to_string()],
    }));
    let resolved = events
        .iter()
        .filter(|e| matches!(e, PalaceEvent::RoomImageResolved { .. }))
        .count();
    assert_eq!(resolved, 2);
    assert_eq!(
        events.last(),
        Some(&PalaceEvent::StatusChanged {
            attempt: 1,
            status: GenerationStatus::Completed
        })
    );
}

#[tokio::test]
async fn test_reset_then_regenerate() {
    let orchestrator = Orchestrator::new(
        Arc::new(krebs_structure()),
        Arc::new(ScriptedImages::new()),
    );
    orchestrator.generate(krebs_request()).await.unwrap();
    orchestrator.reset();

    let snapshot = orchestrator.snapshot();
    assert_eq!(snapshot.status, GenerationStatus::Idle);
    assert!(snapshot.rooms.is_empty());
    assert!(snapshot.request_data.is_none());

    let snapshot = orchestrator.generate(krebs_request()).await.unwrap();
    assert_eq!(snapshot.status, GenerationStatus::Completed);
    assert_eq!(snapshot.attempt, 3);
}

/// Chat client replaying a canned completion.
struct CannedChat(&'static str);

#[async_trait]
impl ModelProviderClient for CannedChat {
    async fn complete(
        &self,
        _messages: Vec<ChatMessage>,
        _options: CompletionOptions,
    ) -> Result<CompletionResponse, ApiError> {
        Ok(CompletionResponse {
            content: self.0.to_string(),
            model: "canned".to_string(),
            usage: TokenUsage::default(),
            finish_reason: Some("stop".to_string()),
        })
    }

    fn provider_name(&self) -> &str {
        "canned"
    }

    fn model_name(&self) -> &str {
        "canned"
    }
}

#[tokio::test]
async fn test_chat_structure_generator_feeds_the_pipeline() {
    let response = r#"```json
[
  {"roomName": "Entrance", "narrative": "A citrus gate hums", "technicalInfo": ["Step1: Citrate"], "imagePrompt": "lemon gate"},
  {"roomName": "Kitchen", "narrative": "An oven flips isomers", "technicalInfo": ["Step2: Isocitrate"], "imagePrompt": "isomer oven"}
]
```"#;
    let structure = ChatStructureGenerator::new(Box::new(CannedChat(response)));
    let orchestrator = Orchestrator::new(Arc::new(structure), Arc::new(ScriptedImages::new()));

    let snapshot = orchestrator.generate(krebs_request()).await.unwrap();
    let names: Vec<&str> = snapshot.rooms.iter().map(|r| r.room_name.as_str()).collect();
    assert_eq!(names, vec!["Entrance", "Kitchen"]);
    assert_eq!(snapshot.rooms[1].technical_info, vec!["Step2: Isocitrate"]);
}

#[tokio::test]
async fn test_schema_mismatch_is_a_structure_failure() {
    let structure = ChatStructureGenerator::new(Box::new(CannedChat(
        r#"[{"roomName": "Entrance"}]"#,
    )));
    let orchestrator = Orchestrator::new(Arc::new(structure), Arc::new(ScriptedImages::new()));

    let err = orchestrator.generate(krebs_request()).await.unwrap_err();
    assert!(matches!(err, ApiError::StructureGenerationFailed(_)));
    assert_eq!(orchestrator.status(), GenerationStatus::Error);
}
