//! Palace orchestrator: owns the generation state and drives the two-phase pipeline.
//!
//! Phase one asks the structure generator for the room sequence. Phase two fans
//! out one image call per room and folds each result into its room as soon as it
//! settles. Every mutation is tagged with the attempt that produced it, so results
//! that arrive after a `reset()` or a newer `generate()` are dropped.

use crate::archive::{self, PalaceArchive};
use crate::config::LociConfig;
use crate::error::ApiError;
use crate::palace::{
    EncodedImage, GenerationRequest, GenerationStatus, ImageState, Room, RoomBlueprint,
};
use crate::provider::{ImageGenerator, ProviderFactory, StructureGenerator};
use futures::stream::{FuturesUnordered, StreamExt};
use parking_lot::RwLock;
use serde::Serialize;
use std::sync::Arc;
use tokio::sync::mpsc::UnboundedSender;
use tracing::{debug, error, info, warn};

/// Message shown to the user when the structure phase fails.
pub const STRUCTURE_FAILURE_MESSAGE: &str =
    "Failed to construct the palace. The architect is confused. Please try again.";

/// Immutable view of the orchestrator state for the presentation layer.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PalaceSnapshot {
    pub status: GenerationStatus,
    pub rooms: Vec<Room>,
    pub request_data: Option<GenerationRequest>,
    pub error_message: Option<String>,
    pub attempt: u64,
}

/// Progress notifications, sent as the state changes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PalaceEvent {
    StatusChanged {
        attempt: u64,
        status: GenerationStatus,
    },
    RoomsPlanned {
        attempt: u64,
        room_names: Vec<String>,
    },
    RoomImageResolved {
        attempt: u64,
        index: usize,
        has_image: bool,
    },
}

#[derive(Debug, Default)]
struct PalaceState {
    status: GenerationStatus,
    rooms: Vec<Room>,
    request: Option<GenerationRequest>,
    error_message: Option<String>,
    attempt: u64,
}

pub struct Orchestrator {
    structure: Arc<dyn StructureGenerator>,
    images: Arc<dyn ImageGenerator>,
    state: RwLock<PalaceState>,
    events: Option<UnboundedSender<PalaceEvent>>,
    max_concurrent_images: Option<usize>,
}

impl Orchestrator {
    pub fn new(structure: Arc<dyn StructureGenerator>, images: Arc<dyn ImageGenerator>) -> Self {
        Self {
            structure,
            images,
            state: RwLock::new(PalaceState::default()),
            events: None,
            max_concurrent_images: None,
        }
    }

    /// Build the orchestrator with the providers named in the configuration.
    pub fn from_config(config: &LociConfig) -> Result<Self, ApiError> {
        let structure: Arc<dyn StructureGenerator> =
            ProviderFactory::create_structure_generator(&config.structure)?.into();
        let images: Arc<dyn ImageGenerator> =
            ProviderFactory::create_image_generator(&config.image)?.into();
        Ok(Self::new(structure, images)
            .with_max_concurrent_images(config.pipeline.max_concurrent_images))
    }

    pub fn with_events(mut self, events: UnboundedSender<PalaceEvent>) -> Self {
        self.events = Some(events);
        self
    }

    /// Cap the number of image calls in flight. `None` launches all rooms at once.
    pub fn with_max_concurrent_images(mut self, limit: Option<usize>) -> Self {
        self.max_concurrent_images = limit.filter(|l| *l > 0);
        self
    }

    pub fn snapshot(&self) -> PalaceSnapshot {
        let state = self.state.read();
        PalaceSnapshot {
            status: state.status,
            rooms: state.rooms.clone(),
            request_data: state.request.clone(),
            error_message: state.error_message.clone(),
            attempt: state.attempt,
        }
    }

    pub fn status(&self) -> GenerationStatus {
        self.state.read().status
    }

    /// Presentation-facing name for [`Orchestrator::generate`].
    pub async fn submit(&self, request: GenerationRequest) -> Result<PalaceSnapshot, ApiError> {
        self.generate(request).await
    }

    /// Run one generation attempt to completion.
    ///
    /// Structure failures end the attempt in `Error`. Image failures only mark
    /// their room as unavailable.
    pub async fn generate(&self, request: GenerationRequest) -> Result<PalaceSnapshot, ApiError> {
        request.validate()?;
        let attempt = self.begin_attempt(&request)?;
        info!(
            attempt,
            theme = %request.theme,
            style = %request.visual_style,
            "Planning memory palace"
        );

        let blueprints = match self.structure.generate_structure(&request).await {
            Ok(blueprints) if !blueprints.is_empty() => blueprints,
            Ok(_) => {
                return self.fail_attempt(
                    attempt,
                    ApiError::StructureGenerationFailed("No rooms were generated".to_string()),
                )
            }
            Err(err) => return self.fail_attempt(attempt, err),
        };

        if !self.plan_rooms(attempt, &blueprints) {
            return Err(ApiError::GenerationSuperseded(attempt));
        }
        info!(attempt, rooms = blueprints.len(), "Visualizing rooms");

        let limit = self
            .max_concurrent_images
            .unwrap_or(blueprints.len())
            .max(1);
        let mut queued = blueprints.iter().enumerate();
        let mut in_flight = FuturesUnordered::new();
        for (index, blueprint) in queued.by_ref().take(limit) {
            in_flight.push(render_room(
                self.images.as_ref(),
                index,
                &blueprint.image_prompt,
                &request.visual_style,
            ));
        }

        let mut current = true;
        while let Some((index, outcome)) = in_flight.next().await {
            let image = match outcome {
                Ok(image) => image,
                Err(err) => {
                    warn!(attempt, room = index + 1, error = %err, "Image generation failed");
                    None
                }
            };
            current = self.resolve_room_image(attempt, index, image) && current;

            // Calls already in flight are left to settle; nothing new starts once stale.
            if current {
                if let Some((index, blueprint)) = queued.next() {
                    in_flight.push(render_room(
                        self.images.as_ref(),
                        index,
                        &blueprint.image_prompt,
                        &request.visual_style,
                    ));
                }
            }
        }

        if !current || !self.complete_attempt(attempt) {
            return Err(ApiError::GenerationSuperseded(attempt));
        }
        info!(attempt, "Memory palace completed");
        Ok(self.snapshot())
    }

    /// Return to `Idle`, dropping rooms and request. Safe to call repeatedly.
    pub fn reset(&self) {
        let attempt = {
            let mut state = self.state.write();
            state.attempt += 1;
            state.status = GenerationStatus::Idle;
            state.rooms.clear();
            state.request = None;
            state.error_message = None;
            state.attempt
        };
        debug!(attempt, "Palace state reset");
        self.emit(PalaceEvent::StatusChanged {
            attempt,
            status: GenerationStatus::Idle,
        });
    }

    /// Build the downloadable archive for a completed palace. Never changes state.
    pub fn download_package(&self) -> Result<PalaceArchive, ApiError> {
        let snapshot = self.snapshot();
        if snapshot.status != GenerationStatus::Completed {
            return Err(ApiError::NothingToExport(format!(
                "palace is {}, not COMPLETED",
                snapshot.status
            )));
        }
        let request = snapshot
            .request_data
            .as_ref()
            .ok_or_else(|| ApiError::NothingToExport("no request recorded".to_string()))?;
        if snapshot.rooms.is_empty() {
            return Err(ApiError::NothingToExport("palace has no rooms".to_string()));
        }

        archive::build_archive(request, &snapshot.rooms).inspect_err(|e| {
            error!(error = %e, "Error generating download package");
        })
    }

    fn begin_attempt(&self, request: &GenerationRequest) -> Result<u64, ApiError> {
        let attempt = {
            let mut state = self.state.write();
            if state.status.is_in_progress() {
                return Err(ApiError::GenerationInProgress);
            }
            state.attempt += 1;
            state.status = GenerationStatus::Planning;
            state.rooms.clear();
            state.error_message = None;
            state.request = Some(request.clone());
            state.attempt
        };
        self.emit(PalaceEvent::StatusChanged {
            attempt,
            status: GenerationStatus::Planning,
        });
        Ok(attempt)
    }

    fn fail_attempt(&self, attempt: u64, err: ApiError) -> Result<PalaceSnapshot, ApiError> {
        let applied = {
            let mut state = self.state.write();
            if state.attempt == attempt {
                state.status = GenerationStatus::Error;
                state.rooms.clear();
                state.error_message = Some(STRUCTURE_FAILURE_MESSAGE.to_string());
                true
            } else {
                false
            }
        };
        if !applied {
            debug!(attempt, error = %err, "Discarding structure failure of stale attempt");
            return Err(ApiError::GenerationSuperseded(attempt));
        }

        error!(attempt, error = %err, "Failed to generate palace structure");
        self.emit(PalaceEvent::StatusChanged {
            attempt,
            status: GenerationStatus::Error,
        });
        Err(match err {
            ApiError::StructureGenerationFailed(_) => err,
            other => ApiError::StructureGenerationFailed(other.to_string()),
        })
    }

    fn plan_rooms(&self, attempt: u64, blueprints: &[RoomBlueprint]) -> bool {
        {
            let mut state = self.state.write();
            if state.attempt != attempt {
                debug!(attempt, "Discarding structure of stale attempt");
                return false;
            }
            state.rooms = blueprints.iter().cloned().map(Room::from).collect();
            state.status = GenerationStatus::Visualizing;
        }
        self.emit(PalaceEvent::RoomsPlanned {
            attempt,
            room_names: blueprints.iter().map(|b| b.room_name.clone()).collect(),
        });
        self.emit(PalaceEvent::StatusChanged {
            attempt,
            status: GenerationStatus::Visualizing,
        });
        true
    }

    /// Settle one room's image. Returns false when the attempt is no longer current.
    fn resolve_room_image(&self, attempt: u64, index: usize, image: Option<EncodedImage>) -> bool {
        let has_image = image.is_some();
        {
            let mut state = self.state.write();
            if state.attempt != attempt {
                debug!(attempt, room = index + 1, "Discarding image of stale attempt");
                return false;
            }
            match state.rooms.get_mut(index) {
                Some(room) if room.is_image_pending() => {
                    room.image = match image {
                        Some(image) => ImageState::Ready(image),
                        None => ImageState::Unavailable,
                    };
                }
                _ => {
                    warn!(attempt, room = index + 1, "Image result for unknown or settled room");
                    return true;
                }
            }
        }
        debug!(attempt, room = index + 1, has_image, "Room image settled");
        self.emit(PalaceEvent::RoomImageResolved {
            attempt,
            index,
            has_image,
        });
        true
    }

    fn complete_attempt(&self, attempt: u64) -> bool {
        {
            let mut state = self.state.write();
            if state.attempt != attempt || state.status != GenerationStatus::Visualizing {
                return false;
            }
            state.status = GenerationStatus::Completed;
        }
        self.emit(PalaceEvent::StatusChanged {
            attempt,
            status: GenerationStatus::Completed,
        });
        true
    }

    fn emit(&self, event: PalaceEvent) {
        if let Some(events) = &self.events {
            // A dropped receiver only means nobody is watching.
            let _ = events.send(event);
        }
    }
}

async fn render_room(
    images: &dyn ImageGenerator,
    index: usize,
    image_prompt: &str,
    visual_style: &str,
) -> (usize, Result<Option<EncodedImage>, ApiError>) {
    (index, images.generate_image(image_prompt, visual_style).await)
}
