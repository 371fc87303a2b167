//! Session host: the one place a content basis change is handled.
//!
//! Switching to a new basis never mutates the current session. The old
//! orchestrator is abandoned (so a late result is dropped on arrival) and a
//! brand-new one is built, pre-seeded when the catalog has the video.

use crate::catalog::ExampleCatalog;
use crate::config::GenerationConfig;
use crate::error::SessionError;
use crate::orchestrator::GenerationOrchestrator;
use crate::provider::TextGenerationService;
use crate::session::{ContentBasis, Seed, SessionId, SessionSnapshot};
use parking_lot::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::info;

pub struct SessionHost {
    service: Arc<dyn TextGenerationService>,
    config: GenerationConfig,
    catalog: ExampleCatalog,
    current: Mutex<Option<Arc<GenerationOrchestrator>>>,
    next_id: AtomicU64,
}

impl SessionHost {
    pub fn new(
        service: Arc<dyn TextGenerationService>,
        config: GenerationConfig,
        catalog: ExampleCatalog,
    ) -> Self {
        Self {
            service,
            config,
            catalog,
            current: Mutex::new(None),
            next_id: AtomicU64::new(1),
        }
    }

    pub fn catalog(&self) -> &ExampleCatalog {
        &self.catalog
    }

    pub fn current(&self) -> Option<Arc<GenerationOrchestrator>> {
        self.current.lock().clone()
    }

    /// Replace the current session with a new one for `basis`. Not started yet.
    pub fn switch_to(&self, basis: ContentBasis) -> Arc<GenerationOrchestrator> {
        let seed = self.catalog.seed_for(&basis);
        self.install(basis, seed)
    }

    /// Replace the current session with one seeded from externally supplied spec and code
    pub fn switch_to_seeded(&self, basis: ContentBasis, seed: Seed) -> Arc<GenerationOrchestrator> {
        self.install(basis, Some(seed))
    }

    fn install(&self, basis: ContentBasis, seed: Option<Seed>) -> Arc<GenerationOrchestrator> {
        let id = SessionId(self.next_id.fetch_add(1, Ordering::Relaxed));
        let seeded = seed.is_some();
        let orchestrator = Arc::new(GenerationOrchestrator::new(
            id,
            basis.clone(),
            seed,
            self.service.clone(),
            &self.config,
        ));

        let previous = self.current.lock().replace(orchestrator.clone());
        if let Some(previous) = previous {
            previous.abandon();
            info!(
                previous = %previous.id(),
                session = %id,
                "Content basis changed; previous session abandoned"
            );
        }
        info!(session = %id, basis = %basis, seeded, "Session created");
        orchestrator
    }

    /// Switch and start the new session on the runtime
    pub fn switch_and_start(
        &self,
        basis: ContentBasis,
    ) -> (
        Arc<GenerationOrchestrator>,
        JoinHandle<Result<SessionSnapshot, SessionError>>,
    ) {
        let orchestrator = self.switch_to(basis);
        let task = {
            let orchestrator = orchestrator.clone();
            tokio::spawn(async move { orchestrator.start().await })
        };
        (orchestrator, task)
    }

    /// Abandon the current session without replacing it
    pub fn clear(&self) {
        if let Some(previous) = self.current.lock().take() {
            previous.abandon();
        }
    }
}
