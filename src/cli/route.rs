//! CLI route: single route table and run context. Dispatches to the session host and presentation.

use crate::catalog::ExampleCatalog;
use crate::config::{ConfigLoader, ReelcraftConfig};
use crate::edit::EditSession;
use crate::error::ApiError;
use crate::host::SessionHost;
use crate::orchestrator::{GenerationOrchestrator, RegenerateOutcome};
use crate::provider::{ProviderFactory, TextGenerationService};
use crate::session::{ContentBasis, LoadingState, Seed, SessionSnapshot};
use futures::future::{self, Either};
use futures::pin_mut;
use std::future::Future;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};

use crate::cli::parse::Commands;
use crate::cli::presentation::{
    format_examples_json, format_examples_text, format_progress_line, format_snapshot_json,
    format_snapshot_text, format_unchanged, CODE_FILE_NAME, SPEC_FILE_NAME,
};

/// Runtime context for CLI execution: workspace, loaded config and the example catalog.
pub struct RunContext {
    workspace_root: PathBuf,
    config: ReelcraftConfig,
    catalog: ExampleCatalog,
    service: Option<Arc<dyn TextGenerationService>>,
}

impl RunContext {
    /// Create run context from workspace root and optional config path. Uses ConfigLoader only.
    pub fn new(workspace_root: PathBuf, config_path: Option<PathBuf>) -> Result<Self, ApiError> {
        let config = if let Some(ref cfg_path) = config_path {
            ConfigLoader::load_from_file(cfg_path)?
        } else {
            ConfigLoader::load(&workspace_root)?
        };
        Self::from_config(workspace_root, config.validated()?)
    }

    pub fn from_config(workspace_root: PathBuf, config: ReelcraftConfig) -> Result<Self, ApiError> {
        let catalog = match config.catalog.resolve(&workspace_root) {
            Some(path) => ExampleCatalog::load_from_file(&path)?,
            None => ExampleCatalog::default(),
        };
        Ok(Self {
            workspace_root,
            config,
            catalog,
            service: None,
        })
    }

    /// Use this service instead of building one from the provider config
    pub fn with_service(mut self, service: Arc<dyn TextGenerationService>) -> Self {
        self.service = Some(service);
        self
    }

    pub fn config(&self) -> &ReelcraftConfig {
        &self.config
    }

    pub fn catalog(&self) -> &ExampleCatalog {
        &self.catalog
    }

    /// Execute a CLI command via the single route table.
    pub fn execute(&self, command: &Commands) -> Result<String, ApiError> {
        let started = Instant::now();
        let result = self.execute_inner(command);
        let duration_ms = started.elapsed().as_millis() as u64;
        match &result {
            Ok(_) => info!(duration_ms, "Command finished"),
            Err(e) => warn!(duration_ms, error = %e, "Command failed"),
        }
        result
    }

    fn execute_inner(&self, command: &Commands) -> Result<String, ApiError> {
        match command {
            Commands::Generate {
                video_url,
                out,
                format,
            } => self.handle_generate(video_url, out, format),
            Commands::Regenerate {
                from,
                spec_file,
                video,
                format,
            } => self.handle_regenerate(from, spec_file, video.as_deref(), format),
            Commands::Examples { catalog, format } => {
                let loaded;
                let catalog = match catalog {
                    Some(path) => {
                        loaded = ExampleCatalog::load_from_file(&self.resolve(path))?;
                        &loaded
                    }
                    None => &self.catalog,
                };
                if format == "json" {
                    Ok(format_examples_json(catalog))
                } else {
                    Ok(format_examples_text(catalog))
                }
            }
        }
    }

    fn handle_generate(&self, video_url: &str, out: &Path, format: &str) -> Result<String, ApiError> {
        let host = self.session_host()?;
        let out = self.resolve(out);
        let rt = tokio::runtime::Runtime::new()?;

        let snapshot = rt.block_on(async {
            let orchestrator = host.switch_to(ContentBasis::new(video_url));
            with_progress(&orchestrator, orchestrator.start()).await
        })?;

        write_artifacts(&out, &snapshot)?;
        finish(&snapshot, &out, format)
    }

    fn handle_regenerate(
        &self,
        from: &Path,
        spec_file: &Path,
        video: Option<&str>,
        format: &str,
    ) -> Result<String, ApiError> {
        let from = self.resolve(from);
        let seed = read_seed(&from)?;
        let edited = std::fs::read_to_string(self.resolve(spec_file))?;
        let basis = ContentBasis::new(
            video
                .map(str::to_string)
                .unwrap_or_else(|| from.display().to_string()),
        );

        let host = self.session_host()?;
        let rt = tokio::runtime::Runtime::new()?;
        let outcome = rt.block_on(async {
            let orchestrator = host.switch_to_seeded(basis, seed);
            orchestrator.start().await?;

            let mut edit = EditSession::begin(&orchestrator);
            edit.set_draft(edited);
            if !edit.is_dirty() {
                edit.discard();
                return Ok(RegenerateOutcome::Unchanged);
            }
            with_progress(&orchestrator, edit.commit()).await
        })?;

        match outcome {
            RegenerateOutcome::Unchanged => Ok(format_unchanged(format)),
            RegenerateOutcome::Completed(snapshot) => {
                write_artifacts(&from, &snapshot)?;
                finish(&snapshot, &from, format)
            }
        }
    }

    /// Build the host lazily so `examples` works without an API key
    fn session_host(&self) -> Result<SessionHost, ApiError> {
        let service = match &self.service {
            Some(service) => Arc::clone(service),
            None => ProviderFactory::create_service(&self.config.provider)?,
        };
        debug!(provider = service.provider_name(), "Generation service ready");
        Ok(SessionHost::new(
            service,
            self.config.generation.clone(),
            self.catalog.clone(),
        ))
    }

    fn resolve(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.workspace_root.join(path)
        }
    }
}

/// Drive `task` while echoing busy-state changes to stderr
async fn with_progress<F: Future>(orchestrator: &GenerationOrchestrator, task: F) -> F::Output {
    let mut updates = orchestrator.subscribe();
    let watcher = async move {
        let mut last: Option<LoadingState> = None;
        loop {
            let state = updates.borrow_and_update().state;
            if last != Some(state) {
                if let Some(line) = format_progress_line(state) {
                    eprintln!("{}", line);
                }
                last = Some(state);
            }
            if updates.changed().await.is_err() {
                break;
            }
        }
    };

    pin_mut!(task, watcher);
    match future::select(task, watcher).await {
        Either::Left((output, _)) => output,
        Either::Right(((), task)) => task.await,
    }
}

fn read_seed(dir: &Path) -> Result<Seed, ApiError> {
    let spec = std::fs::read_to_string(dir.join(SPEC_FILE_NAME))?;
    let code = std::fs::read_to_string(dir.join(CODE_FILE_NAME))?;
    Seed::new(spec, code).ok_or_else(|| {
        ApiError::InvalidInput(format!(
            "{} needs a non-empty {} and {}",
            dir.display(),
            SPEC_FILE_NAME,
            CODE_FILE_NAME
        ))
    })
}

/// Write whichever artifacts the session holds; a code-stage failure still leaves the spec.
///
/// An `index.html` on disk must have been built from the `spec.md` beside it, so a spec
/// written without code removes any older code file.
fn write_artifacts(dir: &Path, snapshot: &SessionSnapshot) -> Result<(), ApiError> {
    if snapshot.spec.is_empty() && snapshot.code.is_empty() {
        return Ok(());
    }
    std::fs::create_dir_all(dir)?;
    if !snapshot.spec.is_empty() {
        std::fs::write(dir.join(SPEC_FILE_NAME), &snapshot.spec)?;
    }
    if !snapshot.code.is_empty() {
        std::fs::write(dir.join(CODE_FILE_NAME), &snapshot.code)?;
    } else {
        remove_stale_code(&dir.join(CODE_FILE_NAME))?;
    }
    debug!(dir = %dir.display(), "Artifacts written");
    Ok(())
}

fn remove_stale_code(path: &Path) -> Result<(), ApiError> {
    match std::fs::remove_file(path) {
        Ok(()) => {
            debug!(path = %path.display(), "Removed code built from an older spec");
            Ok(())
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(e.into()),
    }
}

fn finish(snapshot: &SessionSnapshot, dir: &Path, format: &str) -> Result<String, ApiError> {
    if let Some(report) = &snapshot.error {
        return Err(ApiError::GenerationFailed {
            message: report.message.clone(),
            detail: report.detail.clone(),
        });
    }
    if format == "json" {
        Ok(format_snapshot_json(snapshot, Some(dir)))
    } else {
        Ok(format_snapshot_text(snapshot, Some(dir)))
    }
}
