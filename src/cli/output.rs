//! CLI output: error mapping from domain errors to stable CLI surface.

use crate::error::{ApiError, SessionError};

/// Map domain/service errors to a string for CLI output.
pub fn map_error(e: &ApiError) -> String {
    match e {
        ApiError::GenerationFailed { message, detail } => {
            format!("{}\n\nDetails: {}", message, detail)
        }
        ApiError::SessionError(SessionError::Busy) => {
            "A generation is already running. Wait for it to finish and try again.".to_string()
        }
        ApiError::ProviderNotConfigured(msg) => format!(
            "{}\n\nThe app could not connect to the generation service.",
            msg
        ),
        other => other.to_string(),
    }
}
