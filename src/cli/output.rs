//! CLI output: error mapping from domain errors to stable CLI surface.

use crate::error::ApiError;
use crate::orchestrator::STRUCTURE_FAILURE_MESSAGE;

/// Map domain/service errors to a single line for CLI output.
/// Structure failures show the fixed user-facing message; the detail goes to the log.
pub fn map_error(e: &ApiError) -> String {
    match e {
        ApiError::StructureGenerationFailed(_) => STRUCTURE_FAILURE_MESSAGE.to_string(),
        other => other.to_string(),
    }
}
