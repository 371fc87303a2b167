//! Session state owned by a single orchestrator.
//!
//! A session aggregates the content basis, the committed spec and code, the
//! loading state, and the last failure. All mutation goes through the
//! transition methods here so the state machine rules live in one place; the
//! orchestrator only sequences calls between them.

use crate::error::{SessionError, SynthesisError};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Opaque reference to the video a session generates from
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ContentBasis(String);

impl ContentBasis {
    pub fn new(locator: impl Into<String>) -> Self {
        Self(locator.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ContentBasis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Identifier for a session, unique within a host
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionId(pub u64);

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "session-{}", self.0)
    }
}

/// Tag for one generation task; results carrying a stale id are discarded
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GenerationId(pub u64);

impl GenerationId {
    fn next(self) -> Self {
        GenerationId(self.0 + 1)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LoadingState {
    LoadingSpec,
    LoadingCode,
    Ready,
    Error,
}

impl LoadingState {
    pub fn is_busy(self) -> bool {
        matches!(self, LoadingState::LoadingSpec | LoadingState::LoadingCode)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            LoadingState::LoadingSpec => "loading-spec",
            LoadingState::LoadingCode => "loading-code",
            LoadingState::Ready => "ready",
            LoadingState::Error => "error",
        }
    }
}

impl fmt::Display for LoadingState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Pipeline stage a failure belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Spec,
    Code,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Stage::Spec => f.write_str("spec stage"),
            Stage::Code => f.write_str("code stage"),
        }
    }
}

/// Externally supplied spec and code; a seeded session never calls the model on start
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Seed {
    pub spec: String,
    pub code: String,
}

impl Seed {
    /// Both halves must be non-empty for a seed to count
    pub fn new(spec: impl Into<String>, code: impl Into<String>) -> Option<Self> {
        let seed = Self {
            spec: spec.into(),
            code: code.into(),
        };
        (!seed.spec.is_empty() && !seed.code.is_empty()).then_some(seed)
    }
}

/// Failure recorded when a session enters `Error`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FailureReport {
    pub stage: Stage,
    /// Human-readable message
    pub message: String,
    /// Display of the original error
    pub detail: String,
    pub safety_blocked: bool,
    pub at: DateTime<Utc>,
}

impl FailureReport {
    pub fn from_synthesis(error: &SynthesisError) -> Self {
        Self {
            stage: error.stage(),
            message: error.friendly_message().to_string(),
            detail: error.to_string(),
            safety_blocked: error.is_safety_blocked(),
            at: Utc::now(),
        }
    }
}

/// Point-in-time view of a session, published on every update
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionSnapshot {
    pub session_id: SessionId,
    pub content_basis: ContentBasis,
    pub spec: String,
    pub code: String,
    pub state: LoadingState,
    pub error: Option<FailureReport>,
    pub generation_id: GenerationId,
    pub revision: u64,
}

impl SessionSnapshot {
    pub fn is_busy(&self) -> bool {
        self.state.is_busy()
    }
}

/// Outcome of submitting an edited spec
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum EditStart {
    /// Trimmed text matched the committed spec; nothing happened
    Unchanged,
    /// Spec committed; code stage must run with this ticket and spec
    Started { ticket: GenerationId, spec: String },
}

/// Mutable session state. Only the orchestrator holds one.
#[derive(Debug)]
pub(crate) struct Session {
    id: SessionId,
    basis: ContentBasis,
    seed: Option<Seed>,
    spec: String,
    code: String,
    state: LoadingState,
    error: Option<FailureReport>,
    generation: GenerationId,
    in_flight: Option<GenerationId>,
    revision: u64,
}

impl Session {
    pub(crate) fn new(id: SessionId, basis: ContentBasis, seed: Option<Seed>) -> Self {
        let (spec, code, state) = match &seed {
            Some(seed) => (seed.spec.clone(), seed.code.clone(), LoadingState::Ready),
            None => (String::new(), String::new(), LoadingState::LoadingSpec),
        };
        Self {
            id,
            basis,
            seed,
            spec,
            code,
            state,
            error: None,
            generation: GenerationId(0),
            in_flight: None,
            revision: 0,
        }
    }

    pub(crate) fn id(&self) -> SessionId {
        self.id
    }

    pub(crate) fn basis(&self) -> &ContentBasis {
        &self.basis
    }

    pub(crate) fn revision(&self) -> u64 {
        self.revision
    }

    pub(crate) fn state(&self) -> LoadingState {
        self.state
    }

    pub(crate) fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            session_id: self.id,
            content_basis: self.basis.clone(),
            spec: self.spec.clone(),
            code: self.code.clone(),
            state: self.state,
            error: self.error.clone(),
            generation_id: self.generation,
            revision: self.revision,
        }
    }

    fn touch(&mut self) {
        self.revision += 1;
    }

    fn ensure_idle(&self) -> Result<(), SessionError> {
        match self.in_flight {
            Some(_) => Err(SessionError::Busy),
            None => Ok(()),
        }
    }

    fn issue_ticket(&mut self) -> GenerationId {
        self.generation = self.generation.next();
        self.in_flight = Some(self.generation);
        self.generation
    }

    fn check_ticket(&self, ticket: GenerationId) -> Result<(), SessionError> {
        if self.generation == ticket && self.in_flight == Some(ticket) {
            Ok(())
        } else {
            Err(SessionError::Abandoned)
        }
    }

    fn fail(&mut self, error: &SynthesisError) {
        self.error = Some(FailureReport::from_synthesis(error));
        self.state = LoadingState::Error;
        self.in_flight = None;
    }

    /// Begin a full run. Returns `None` when the session is seeded and went straight to `Ready`.
    pub(crate) fn begin_full_run(&mut self) -> Result<Option<GenerationId>, SessionError> {
        self.ensure_idle()?;
        self.touch();
        if let Some(seed) = &self.seed {
            self.spec = seed.spec.clone();
            self.code = seed.code.clone();
            self.error = None;
            self.state = LoadingState::Ready;
            return Ok(None);
        }
        self.spec.clear();
        self.code.clear();
        self.error = None;
        self.state = LoadingState::LoadingSpec;
        Ok(Some(self.issue_ticket()))
    }

    /// Record the spec stage result. On success returns the committed spec for the code stage.
    pub(crate) fn finish_spec_stage(
        &mut self,
        ticket: GenerationId,
        outcome: Result<String, SynthesisError>,
    ) -> Result<Option<String>, SessionError> {
        self.check_ticket(ticket)?;
        self.touch();
        match outcome {
            Ok(spec) => {
                self.spec = spec;
                self.state = LoadingState::LoadingCode;
                Ok(Some(self.spec.clone()))
            }
            Err(error) => {
                self.fail(&error);
                Ok(None)
            }
        }
    }

    pub(crate) fn finish_code_stage(
        &mut self,
        ticket: GenerationId,
        outcome: Result<String, SynthesisError>,
    ) -> Result<(), SessionError> {
        self.check_ticket(ticket)?;
        self.touch();
        match outcome {
            Ok(code) => {
                self.code = code;
                self.error = None;
                self.state = LoadingState::Ready;
                self.in_flight = None;
            }
            Err(error) => {
                self.code.clear();
                self.fail(&error);
            }
        }
        Ok(())
    }

    /// Commit an edited spec ahead of the code stage
    pub(crate) fn begin_edit_regeneration(
        &mut self,
        edited: &str,
    ) -> Result<EditStart, SessionError> {
        self.ensure_idle()?;
        if !matches!(self.state, LoadingState::Ready | LoadingState::Error) {
            return Err(SessionError::InvalidState {
                operation: "regenerate code from an edited spec",
                state: self.state,
            });
        }
        if edited.trim() == self.spec.trim() {
            return Ok(EditStart::Unchanged);
        }
        self.touch();
        self.spec = edited.to_string();
        self.code.clear();
        self.error = None;
        self.state = LoadingState::LoadingCode;
        let ticket = self.issue_ticket();
        Ok(EditStart::Started {
            ticket,
            spec: self.spec.clone(),
        })
    }

    /// Replace the code by hand; only allowed once the session is ready
    pub(crate) fn replace_code(&mut self, code: String) -> Result<(), SessionError> {
        self.ensure_idle()?;
        if self.state != LoadingState::Ready {
            return Err(SessionError::InvalidState {
                operation: "edit code",
                state: self.state,
            });
        }
        self.touch();
        self.code = code;
        Ok(())
    }

    /// Invalidate any in-flight ticket. State is left as it was.
    pub(crate) fn abandon(&mut self) {
        if self.in_flight.take().is_some() {
            self.generation = self.generation.next();
            self.touch();
        }
    }
}
