//! Shared test utilities for integration tests
//!
//! Provides a scripted generation service whose calls can be held in flight, and
//! centralized setup/teardown for XDG directories and `REELCRAFT__` variables.

use async_trait::async_trait;
use parking_lot::Mutex as PlMutex;
use reelcraft::error::ServiceError;
use reelcraft::provider::{GenerationRequest, TextGenerationService};
use std::collections::VecDeque;
use std::sync::Mutex;
use tempfile::TempDir;
use tokio::sync::{oneshot, Notify};

/// Opens a held call
pub struct Gate(oneshot::Sender<()>);

impl Gate {
    pub fn open(self) {
        let _ = self.0.send(());
    }
}

struct Step {
    response: Result<String, ServiceError>,
    hold: Option<oneshot::Receiver<()>>,
}

/// Generation service that replays scripted responses in call order
#[derive(Default)]
pub struct ScriptedService {
    steps: PlMutex<VecDeque<Step>>,
    requests: PlMutex<Vec<GenerationRequest>>,
    call_started: Notify,
}

impl ScriptedService {
    pub fn new() -> Self {
        Self::default()
    }

    /// Next call returns `response` immediately
    pub fn reply(&self, response: Result<String, ServiceError>) {
        self.steps.lock().push_back(Step {
            response,
            hold: None,
        });
    }

    /// Next call returns `response` once the returned gate is opened
    pub fn reply_when_opened(&self, response: Result<String, ServiceError>) -> Gate {
        let (tx, rx) = oneshot::channel();
        self.steps.lock().push_back(Step {
            response,
            hold: Some(rx),
        });
        Gate(tx)
    }

    pub fn requests(&self) -> Vec<GenerationRequest> {
        self.requests.lock().clone()
    }

    pub fn call_count(&self) -> usize {
        self.requests.lock().len()
    }

    /// Wait until at least `n` calls have reached the service
    pub async fn wait_for_calls(&self, n: usize) {
        loop {
            let notified = self.call_started.notified();
            if self.call_count() >= n {
                return;
            }
            notified.await;
        }
    }
}

#[async_trait]
impl TextGenerationService for ScriptedService {
    async fn generate(&self, request: GenerationRequest) -> Result<String, ServiceError> {
        let step = self.steps.lock().pop_front();
        self.requests.lock().push(request);
        self.call_started.notify_waiters();

        let Some(step) = step else {
            return Err(ServiceError::Provider("script exhausted".to_string()));
        };
        if let Some(hold) = step.hold {
            let _ = hold.await;
        }
        step.response
    }

    fn provider_name(&self) -> &str {
        "scripted"
    }
}

pub fn spec_reply(spec: &str) -> Result<String, ServiceError> {
    Ok(serde_json::json!({ "spec": spec }).to_string())
}

pub fn code_reply(code: &str) -> Result<String, ServiceError> {
    Ok(format!("Here you go!\n```html\n{}\n```", code))
}

/// Global mutex to serialize environment variable access across all tests
static ENV_MUTEX: Mutex<()> = Mutex::new(());

/// Environment variable state to restore after test
struct EnvState {
    saved: Vec<(String, Option<String>)>,
}

impl EnvState {
    fn capture(keys: &[&str]) -> Self {
        Self {
            saved: keys
                .iter()
                .map(|key| (key.to_string(), std::env::var(key).ok()))
                .collect(),
        }
    }

    fn restore(self) {
        for (key, value) in self.saved {
            match value {
                Some(value) => std::env::set_var(&key, value),
                None => std::env::remove_var(&key),
            }
        }
    }
}

/// Run `f` with HOME and XDG_CONFIG_HOME inside `test_dir`, `REELCRAFT_ENV` unset, and
/// the given `REELCRAFT__*` variables set. The environment is restored afterwards.
pub fn with_isolated_env<F, R>(test_dir: &TempDir, vars: &[(&str, &str)], f: F) -> R
where
    F: FnOnce() -> R,
{
    let _guard = ENV_MUTEX.lock().unwrap_or_else(|e| e.into_inner());

    let mut keys = vec!["HOME", "XDG_CONFIG_HOME", "REELCRAFT_ENV"];
    keys.extend(vars.iter().map(|(key, _)| *key));
    let env_state = EnvState::capture(&keys);

    let test_config_home = test_dir.path().join("xdg");
    let test_home = test_dir.path().join("home");
    std::fs::create_dir_all(&test_config_home).unwrap();
    std::fs::create_dir_all(&test_home).unwrap();

    std::env::set_var("HOME", test_home.to_str().unwrap());
    std::env::set_var("XDG_CONFIG_HOME", test_config_home.to_str().unwrap());
    std::env::remove_var("REELCRAFT_ENV");
    for (key, value) in vars {
        std::env::set_var(key, value);
    }

    let result = f();

    env_state.restore();

    result
}
