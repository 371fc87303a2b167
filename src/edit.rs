//! Spec editing sessions.
//!
//! A draft is a private working copy of the committed spec. Nothing is generated
//! while it is edited; `commit` hands it to the orchestrator's code-only path and
//! `discard` drops it without touching the session.

use crate::error::SessionError;
use crate::orchestrator::{GenerationOrchestrator, RegenerateOutcome};
use tracing::debug;

pub struct EditSession<'a> {
    orchestrator: &'a GenerationOrchestrator,
    base: String,
    draft: String,
}

impl<'a> EditSession<'a> {
    /// Start editing from the currently committed spec
    pub fn begin(orchestrator: &'a GenerationOrchestrator) -> Self {
        let base = orchestrator.snapshot().spec;
        Self {
            orchestrator,
            draft: base.clone(),
            base,
        }
    }

    pub fn draft(&self) -> &str {
        &self.draft
    }

    pub fn set_draft(&mut self, text: impl Into<String>) {
        self.draft = text.into();
    }

    /// The spec the draft was started from
    pub fn base(&self) -> &str {
        &self.base
    }

    /// True when committing would regenerate
    pub fn is_dirty(&self) -> bool {
        self.draft.trim() != self.orchestrator.snapshot().spec.trim()
    }

    pub async fn commit(self) -> Result<RegenerateOutcome, SessionError> {
        debug!(
            session = %self.orchestrator.id(),
            draft_chars = self.draft.len(),
            "Committing spec draft"
        );
        self.orchestrator
            .regenerate_code_from_edited_spec(&self.draft)
            .await
    }

    pub fn discard(self) {
        debug!(session = %self.orchestrator.id(), "Discarding spec draft");
    }
}
