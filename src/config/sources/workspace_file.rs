//! Per-workspace overrides: `config/config.toml`, then the `config/{REELCRAFT_ENV}.toml` overlay.

use config::builder::DefaultState;
use config::ConfigBuilder;
use config::ConfigError;
use config::File;
use std::path::{Path, PathBuf};

/// Overlay used when `REELCRAFT_ENV` is unset
pub const DEFAULT_ENV: &str = "development";

/// Overlay name picked from `REELCRAFT_ENV`, e.g. `classroom` for `config/classroom.toml`
pub fn env_name() -> String {
    std::env::var("REELCRAFT_ENV")
        .ok()
        .filter(|name| !name.trim().is_empty())
        .unwrap_or_else(|| DEFAULT_ENV.to_string())
}

/// Files this workspace contributes, lowest precedence first. Missing files are skipped.
pub fn workspace_files(workspace_root: &Path) -> Vec<PathBuf> {
    let config_dir = workspace_root.join("config");
    [
        config_dir.join("config.toml"),
        config_dir.join(format!("{}.toml", env_name())),
    ]
    .into_iter()
    .filter(|path| path.is_file())
    .collect()
}

/// Layer the workspace's model, provider and catalog overrides on top of the global file.
pub fn add_to_builder(
    builder: ConfigBuilder<DefaultState>,
    workspace_root: &Path,
) -> Result<ConfigBuilder<DefaultState>, ConfigError> {
    Ok(workspace_files(workspace_root)
        .into_iter()
        .fold(builder, |builder, path| {
            builder.add_source(File::from(path).required(false))
        }))
}
