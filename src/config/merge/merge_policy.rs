//! Merge rules: defaults, override order, conflict handling.

use config::Config;
use config::ConfigBuilder;
use config::ConfigError;

/// Create a Config builder with merge policy defaults applied.
pub fn builder_with_defaults() -> Result<ConfigBuilder<config::builder::DefaultState>, ConfigError>
{
    Config::builder()
        .set_default("generation.spec_model", "gemini-2.5-flash")?
        .set_default("generation.code_model", "gemini-2.5-flash")?
        .set_default("generation.temperature", 0.75)?
        .set_default("provider.provider_type", "gemini")?
        .set_default("provider.api_key_env", "GEMINI_API_KEY")?
        .set_default("provider.request_timeout_secs", 300)
}
