//! Generation Orchestrator
//!
//! Owns one session and sequences the spec stage before the code stage. Each run is
//! tagged with a generation id; a result that resolves after the session moved on (or
//! was abandoned) is discarded instead of committed. The state lock is only held for
//! the synchronous transition itself, never across a service call.
//!
//! Every committed change is published as a [`SessionSnapshot`] on a `watch` channel,
//! and the derived busy flag is published on its own channel whenever it flips.

use crate::config::GenerationConfig;
use crate::error::SessionError;
use crate::provider::TextGenerationService;
use crate::session::{
    ContentBasis, EditStart, GenerationId, LoadingState, Seed, Session, SessionId,
    SessionSnapshot,
};
use crate::synthesis::{CodeSynthesizer, SpecSynthesizer};
use parking_lot::Mutex;
use std::sync::Arc;
use tokio::sync::watch;
use tracing::{debug, info, instrument, warn};

/// Result of submitting an edited spec
#[derive(Debug, Clone, PartialEq)]
pub enum RegenerateOutcome {
    /// Trimmed text matched the committed spec; no call was made
    Unchanged,
    /// The code stage ran; the snapshot is `Ready` or `Error`
    Completed(SessionSnapshot),
}

pub struct GenerationOrchestrator {
    spec_stage: SpecSynthesizer,
    code_stage: CodeSynthesizer,
    session: Mutex<Session>,
    snapshot_tx: watch::Sender<SessionSnapshot>,
    busy_tx: watch::Sender<bool>,
}

impl GenerationOrchestrator {
    pub fn new(
        id: SessionId,
        basis: ContentBasis,
        seed: Option<Seed>,
        service: Arc<dyn TextGenerationService>,
        config: &GenerationConfig,
    ) -> Self {
        let session = Session::new(id, basis, seed);
        let snapshot = session.snapshot();
        let (busy_tx, _) = watch::channel(snapshot.is_busy());
        let (snapshot_tx, _) = watch::channel(snapshot);

        Self {
            spec_stage: SpecSynthesizer::new(service.clone(), config),
            code_stage: CodeSynthesizer::new(service, config),
            session: Mutex::new(session),
            snapshot_tx,
            busy_tx,
        }
    }

    pub fn id(&self) -> SessionId {
        self.session.lock().id()
    }

    pub fn content_basis(&self) -> ContentBasis {
        self.session.lock().basis().clone()
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        self.session.lock().snapshot()
    }

    pub fn state(&self) -> LoadingState {
        self.session.lock().state()
    }

    pub fn is_busy(&self) -> bool {
        self.state().is_busy()
    }

    /// Receive a fresh snapshot after every update
    pub fn subscribe(&self) -> watch::Receiver<SessionSnapshot> {
        self.snapshot_tx.subscribe()
    }

    /// Receive the busy flag whenever it changes
    pub fn subscribe_busy(&self) -> watch::Receiver<bool> {
        self.busy_tx.subscribe()
    }

    /// Apply a transition under the lock and publish if the session changed
    fn transition<R>(
        &self,
        apply: impl FnOnce(&mut Session) -> Result<R, SessionError>,
    ) -> Result<R, SessionError> {
        let (result, published) = {
            let mut session = self.session.lock();
            let before = session.revision();
            let result = apply(&mut session);
            let published = (session.revision() != before).then(|| session.snapshot());
            (result, published)
        };

        if let Some(snapshot) = published {
            let busy = snapshot.is_busy();
            debug!(
                session = %snapshot.session_id,
                state = %snapshot.state,
                generation = snapshot.generation_id.0,
                "Session updated"
            );
            self.snapshot_tx.send_replace(snapshot);
            self.busy_tx.send_if_modified(|current| {
                if *current != busy {
                    *current = busy;
                    true
                } else {
                    false
                }
            });
        }
        result
    }

    /// Run the full pipeline, or go straight to `Ready` for a seeded session.
    ///
    /// Stage failures are recorded in the session, not returned: the returned
    /// snapshot is `Ready` or `Error`. `Err` means the call was rejected
    /// (`Busy`) or its result discarded (`Abandoned`).
    #[instrument(skip(self), fields(session = %self.id()))]
    pub async fn start(&self) -> Result<SessionSnapshot, SessionError> {
        let Some(ticket) = self.transition(|s| s.begin_full_run())? else {
            info!("Session is pre-seeded; ready without generation");
            return Ok(self.snapshot());
        };

        let basis = self.content_basis();
        let outcome = self.spec_stage.synthesize(&basis).await;
        let committed = self.transition(|s| s.finish_spec_stage(ticket, outcome))?;
        let Some(spec) = committed else {
            warn!(generation = ticket.0, "Spec stage failed");
            return Ok(self.snapshot());
        };

        self.run_code_stage(ticket, spec).await
    }

    /// Explicit re-entry from scratch; identical to `start`
    pub async fn retry(&self) -> Result<SessionSnapshot, SessionError> {
        info!(session = %self.id(), "Retrying generation");
        self.start().await
    }

    /// Commit an edited spec and regenerate only the code.
    ///
    /// Allowed from `Ready` or `Error`. Text whose trimmed form equals the
    /// committed spec's is a no-op. Otherwise the text is committed as-is
    /// before the code stage is called.
    #[instrument(skip(self, edited), fields(session = %self.id()))]
    pub async fn regenerate_code_from_edited_spec(
        &self,
        edited: &str,
    ) -> Result<RegenerateOutcome, SessionError> {
        let (ticket, spec) = match self.transition(|s| s.begin_edit_regeneration(edited))? {
            EditStart::Unchanged => {
                debug!("Edited spec matches committed spec; nothing to regenerate");
                return Ok(RegenerateOutcome::Unchanged);
            }
            EditStart::Started { ticket, spec } => (ticket, spec),
        };

        info!(generation = ticket.0, "Regenerating code from edited spec");
        self.run_code_stage(ticket, spec)
            .await
            .map(RegenerateOutcome::Completed)
    }

    async fn run_code_stage(
        &self,
        ticket: GenerationId,
        spec: String,
    ) -> Result<SessionSnapshot, SessionError> {
        let outcome = self.code_stage.synthesize(&spec).await;
        self.transition(|s| s.finish_code_stage(ticket, outcome))?;
        let snapshot = self.snapshot();
        match snapshot.state {
            LoadingState::Ready => info!(generation = ticket.0, "Generation complete"),
            _ => warn!(generation = ticket.0, "Code stage failed"),
        }
        Ok(snapshot)
    }

    /// Replace the generated code by hand. Only valid once `Ready`.
    pub fn edit_code(&self, code: impl Into<String>) -> Result<SessionSnapshot, SessionError> {
        let code = code.into();
        self.transition(|s| s.replace_code(code))?;
        Ok(self.snapshot())
    }

    /// Discard whatever is in flight; its result will not be committed
    pub fn abandon(&self) {
        debug!(session = %self.id(), "Abandoning session");
        let _ = self.transition(|s| {
            s.abandon();
            Ok(())
        });
    }
}
