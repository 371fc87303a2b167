//! Text Generation Provider Abstraction
//!
//! A single stateless call: model id, prompt, optional video reference, temperature and
//! safety settings in, raw completion text (or a classified failure) out. The pipeline
//! only talks to [`TextGenerationService`]; the Gemini REST client is the one concrete
//! transport shipped with the crate.

use crate::error::{ApiError, ServiceError};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;

pub mod gemini;

pub use gemini::GeminiClient;

/// Default sampling temperature for both stages
pub const DEFAULT_TEMPERATURE: f32 = 0.75;

/// Attachment MIME type for video references
pub const VIDEO_MIME_TYPE: &str = "video/mp4";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum HarmCategory {
    #[serde(rename = "HARM_CATEGORY_HARASSMENT")]
    Harassment,
    #[serde(rename = "HARM_CATEGORY_HATE_SPEECH")]
    HateSpeech,
    #[serde(rename = "HARM_CATEGORY_SEXUALLY_EXPLICIT")]
    SexuallyExplicit,
    #[serde(rename = "HARM_CATEGORY_DANGEROUS_CONTENT")]
    DangerousContent,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum HarmBlockThreshold {
    BlockNone,
    BlockOnlyHigh,
    BlockMediumAndAbove,
    BlockLowAndAbove,
}

/// Per-category safety override sent with a request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SafetySetting {
    pub category: HarmCategory,
    pub threshold: HarmBlockThreshold,
}

/// One generation call
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationRequest {
    pub model: String,
    pub prompt: String,
    pub video_reference: Option<String>,
    pub temperature: f32,
    pub safety_settings: Option<Vec<SafetySetting>>,
}

impl GenerationRequest {
    pub fn new(model: impl Into<String>, prompt: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            prompt: prompt.into(),
            video_reference: None,
            temperature: DEFAULT_TEMPERATURE,
            safety_settings: None,
        }
    }

    pub fn with_video(mut self, video_reference: impl Into<String>) -> Self {
        self.video_reference = Some(video_reference.into());
        self
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn with_safety_settings(mut self, settings: Vec<SafetySetting>) -> Self {
        self.safety_settings = Some(settings);
        self
    }
}

/// Stateless text generation call
#[async_trait]
pub trait TextGenerationService: Send + Sync {
    /// Send one request and return the first candidate's text
    async fn generate(&self, request: GenerationRequest) -> Result<String, ServiceError>;

    /// Get the provider name
    fn provider_name(&self) -> &str;
}

/// Provider kinds the factory can build
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderType {
    #[default]
    Gemini,
}

/// Provider connection settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderConfig {
    #[serde(default)]
    pub provider_type: ProviderType,

    /// Base URL; the provider default is used when unset
    #[serde(default)]
    pub endpoint: Option<String>,

    /// Inline API key. Prefer `api_key_env`.
    #[serde(default)]
    pub api_key: Option<String>,

    /// Environment variable holding the API key
    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,

    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

fn default_api_key_env() -> String {
    "GEMINI_API_KEY".to_string()
}

fn default_request_timeout_secs() -> u64 {
    300
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            provider_type: ProviderType::default(),
            endpoint: None,
            api_key: None,
            api_key_env: default_api_key_env(),
            request_timeout_secs: default_request_timeout_secs(),
        }
    }
}

impl ProviderConfig {
    pub fn validate(&self) -> Result<(), String> {
        if let Some(endpoint) = &self.endpoint {
            if !endpoint.starts_with("http://") && !endpoint.starts_with("https://") {
                return Err(format!("Invalid endpoint URL: {}", endpoint));
            }
        }
        if self.api_key_env.trim().is_empty() && self.api_key.is_none() {
            return Err("Either api_key or api_key_env must be set".to_string());
        }
        if self.request_timeout_secs == 0 {
            return Err("request_timeout_secs must be greater than zero".to_string());
        }
        Ok(())
    }

    /// Inline key first, then the configured environment variable
    pub fn resolve_api_key(&self) -> Result<String, ApiError> {
        if let Some(key) = self.api_key.as_ref().filter(|k| !k.is_empty()) {
            return Ok(key.clone());
        }
        std::env::var(&self.api_key_env)
            .ok()
            .filter(|k| !k.is_empty())
            .ok_or_else(|| {
                ApiError::ProviderNotConfigured(format!(
                    "API key not found; set {} or provider.api_key",
                    self.api_key_env
                ))
            })
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

/// Provider factory for creating generation services
pub struct ProviderFactory;

impl ProviderFactory {
    pub fn create_service(
        config: &ProviderConfig,
    ) -> Result<Arc<dyn TextGenerationService>, ApiError> {
        config.validate().map_err(ApiError::ConfigError)?;
        match config.provider_type {
            ProviderType::Gemini => {
                let api_key = config.resolve_api_key()?;
                let client =
                    GeminiClient::new(api_key, config.endpoint.clone(), config.request_timeout())?;
                Ok(Arc::new(client))
            }
        }
    }
}

// Mock provider for testing
#[cfg(test)]
pub struct MockProvider {
    responses: parking_lot::Mutex<std::collections::VecDeque<Result<String, ServiceError>>>,
    requests: parking_lot::Mutex<Vec<GenerationRequest>>,
}

#[cfg(test)]
impl MockProvider {
    pub fn new(responses: Vec<Result<String, ServiceError>>) -> Self {
        Self {
            responses: parking_lot::Mutex::new(responses.into()),
            requests: parking_lot::Mutex::new(Vec::new()),
        }
    }

    pub fn requests(&self) -> Vec<GenerationRequest> {
        self.requests.lock().clone()
    }
}

#[cfg(test)]
#[async_trait]
impl TextGenerationService for MockProvider {
    async fn generate(&self, request: GenerationRequest) -> Result<String, ServiceError> {
        self.requests.lock().push(request);
        self.responses
            .lock()
            .pop_front()
            .unwrap_or_else(|| Err(ServiceError::Provider("Mock exhausted".to_string())))
    }

    fn provider_name(&self) -> &str {
        "mock"
    }
}
