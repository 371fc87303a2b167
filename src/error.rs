//! Error types for the Reelcraft generation pipeline.

use crate::session::{LoadingState, Stage};
use thiserror::Error;

/// Failures reported by a text generation service
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ServiceError {
    #[error("Content generation failed: Prompt blocked (reason: {0})")]
    BlockedPrompt(String),

    #[error("Content generation failed: No candidates returned.")]
    NoCandidate,

    #[error("Content generation failed: Response blocked due to safety settings ({0}).")]
    SafetyFinish(String),

    #[error("Content generation failed: Stopped due to {0}.")]
    AbnormalFinish(String),

    #[error("Provider authentication failed (check the API key): {0}")]
    Auth(String),

    #[error("Provider rate limit exceeded: {0}")]
    RateLimited(String),

    #[error("Provider request failed: {0}")]
    Request(String),

    #[error("Provider error: {0}")]
    Provider(String),
}

impl ServiceError {
    /// True when the failure came from a safety filter, on either the prompt or the completion
    pub fn is_safety_related(&self) -> bool {
        matches!(
            self,
            ServiceError::BlockedPrompt(_) | ServiceError::SafetyFinish(_)
        )
    }
}

/// Failures while extracting structured data from raw model text
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("Response is not valid JSON: {0}")]
    InvalidJson(String),

    #[error("Response JSON is not an object")]
    NotAnObject,

    #[error("Response JSON has no `{0}` field")]
    MissingField(String),

    #[error("Response JSON field `{0}` is not a string")]
    FieldNotString(String),

    #[error("Response does not contain the opening marker {0:?}")]
    MissingOpener(String),

    #[error("Response does not contain the closing marker {0:?} after the opening marker")]
    MissingCloser(String),
}

/// Failure of one synthesis stage
#[derive(Debug, Error)]
pub enum SynthesisError {
    #[error("{stage} generation failed: {source}")]
    Generation {
        stage: Stage,
        #[source]
        source: ServiceError,
    },

    #[error("{stage} generation blocked by safety filters: {source}")]
    SafetyBlocked {
        stage: Stage,
        #[source]
        source: ServiceError,
    },

    #[error("{stage} response could not be parsed: {source}")]
    Parse {
        stage: Stage,
        #[source]
        source: ParseError,
    },
}

impl SynthesisError {
    /// Classify a service failure for the given stage
    pub fn from_service(stage: Stage, source: ServiceError) -> Self {
        if source.is_safety_related() {
            SynthesisError::SafetyBlocked { stage, source }
        } else {
            SynthesisError::Generation { stage, source }
        }
    }

    pub fn parse(stage: Stage, source: ParseError) -> Self {
        SynthesisError::Parse { stage, source }
    }

    pub fn stage(&self) -> Stage {
        match self {
            SynthesisError::Generation { stage, .. }
            | SynthesisError::SafetyBlocked { stage, .. }
            | SynthesisError::Parse { stage, .. } => *stage,
        }
    }

    pub fn is_safety_blocked(&self) -> bool {
        matches!(self, SynthesisError::SafetyBlocked { .. })
    }

    /// Message suitable for showing to the person who asked for the activity
    pub fn friendly_message(&self) -> &'static str {
        match self {
            SynthesisError::SafetyBlocked { .. } => {
                "The content couldn't be created for this video. This can sometimes happen \
                 due to safety filters. Please try a different video."
            }
            SynthesisError::Generation {
                source: ServiceError::Auth(_),
                ..
            } => {
                "There seems to be an issue with the connection. Please check your setup \
                 and try again."
            }
            _ => "Our robots got a little stuck building the game. Would you like to try again?",
        }
    }
}

/// Orchestrator calls rejected without touching session state
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SessionError {
    #[error("A generation task is already in flight for this session")]
    Busy,

    #[error("Cannot {operation} while the session is {state}")]
    InvalidState {
        operation: &'static str,
        state: LoadingState,
    },

    #[error("Session was abandoned; the generation result was discarded")]
    Abandoned,
}

/// Top-level errors for configuration, catalog, and command surfaces
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Catalog error: {0}")]
    CatalogError(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Provider not configured: {0}")]
    ProviderNotConfigured(String),

    #[error("Provider error: {0}")]
    ProviderError(#[from] ServiceError),

    #[error("Session error: {0}")]
    SessionError(#[from] SessionError),

    #[error("{message}\nDetails: {detail}")]
    GenerationFailed { message: String, detail: String },

    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),
}

impl From<config::ConfigError> for ApiError {
    fn from(err: config::ConfigError) -> Self {
        ApiError::ConfigError(err.to_string())
    }
}
