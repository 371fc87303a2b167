//! Configuration System
//!
//! Layered configuration for models, provider connection, example catalog and logging.
//! Sources merge in order: built-in defaults, the user-level file, workspace files, then
//! `REELCRAFT__*` environment variables.

use crate::error::ApiError;
use crate::logging::LoggingConfig;
use crate::provider::DEFAULT_TEMPERATURE;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

mod merge;
mod sources;

pub use crate::provider::{ProviderConfig, ProviderType};
pub use sources::global_file::global_config_path;

/// Root configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ReelcraftConfig {
    /// Model settings for both stages
    #[serde(default)]
    pub generation: GenerationConfig,

    /// Model provider connection
    #[serde(default)]
    pub provider: ProviderConfig,

    /// Pre-seeded example catalog
    #[serde(default)]
    pub catalog: CatalogConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Model settings for the spec and code stages
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationConfig {
    #[serde(default = "default_model")]
    pub spec_model: String,

    #[serde(default = "default_model")]
    pub code_model: String,

    #[serde(default = "default_temperature")]
    pub temperature: f32,
}

fn default_model() -> String {
    "gemini-2.5-flash".to_string()
}

fn default_temperature() -> f32 {
    DEFAULT_TEMPERATURE
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            spec_model: default_model(),
            code_model: default_model(),
            temperature: default_temperature(),
        }
    }
}

impl GenerationConfig {
    pub fn validate(&self) -> Result<(), String> {
        if self.spec_model.trim().is_empty() {
            return Err("spec_model cannot be empty".to_string());
        }
        if self.code_model.trim().is_empty() {
            return Err("code_model cannot be empty".to_string());
        }
        if !(0.0..=2.0).contains(&self.temperature) {
            return Err(format!(
                "temperature must be between 0.0 and 2.0, got {}",
                self.temperature
            ));
        }
        Ok(())
    }
}

/// Example catalog location
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CatalogConfig {
    /// JSON file of examples; relative paths resolve against the workspace root
    #[serde(default)]
    pub path: Option<PathBuf>,
}

impl CatalogConfig {
    pub fn resolve(&self, workspace_root: &Path) -> Option<PathBuf> {
        self.path.as_ref().map(|path| {
            if path.is_absolute() {
                path.clone()
            } else {
                workspace_root.join(path)
            }
        })
    }
}

/// Configuration validation errors
#[derive(Debug, Clone)]
pub enum ValidationError {
    Generation(String),
    Provider(String),
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ValidationError::Generation(msg) => write!(f, "Generation: {}", msg),
            ValidationError::Provider(msg) => write!(f, "Provider: {}", msg),
        }
    }
}

impl std::error::Error for ValidationError {}

impl ReelcraftConfig {
    /// Validate the entire configuration
    pub fn validate(&self) -> Result<(), Vec<ValidationError>> {
        let mut errors = Vec::new();

        if let Err(e) = self.generation.validate() {
            errors.push(ValidationError::Generation(e));
        }
        if let Err(e) = self.provider.validate() {
            errors.push(ValidationError::Provider(e));
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }

    /// Validate and fold all errors into one `ApiError`
    pub fn validated(self) -> Result<Self, ApiError> {
        self.validate().map_err(|errors| {
            let error_msgs: Vec<String> = errors.iter().map(|e| e.to_string()).collect();
            ApiError::ConfigError(format!(
                "Configuration validation failed:\n{}",
                error_msgs.join("\n")
            ))
        })?;
        Ok(self)
    }
}

/// Loads `ReelcraftConfig` from the layered sources
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load config for a workspace: defaults, global file, workspace files, environment
    pub fn load(workspace_root: &Path) -> Result<ReelcraftConfig, config::ConfigError> {
        let builder = merge::merge_policy::builder_with_defaults()?;
        let builder = sources::global_file::add_to_builder(builder)?;
        let builder = sources::workspace_file::add_to_builder(builder, workspace_root)?;
        let builder = sources::environment::add_to_builder(builder);
        builder.build()?.try_deserialize()
    }

    /// Load config from an explicit file; environment overrides still apply
    pub fn load_from_file(path: &Path) -> Result<ReelcraftConfig, config::ConfigError> {
        let builder = merge::merge_policy::builder_with_defaults()?
            .add_source(config::File::from(path).required(true));
        let builder = sources::environment::add_to_builder(builder);
        builder.build()?.try_deserialize()
    }

    pub fn xdg_config_path() -> Option<PathBuf> {
        global_config_path()
    }
}
