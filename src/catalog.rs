//! Example catalog: curated videos with ready-made spec and code.
//!
//! Selecting a video that is in the catalog yields a pre-seeded session, so no
//! generation call is made for it.

use crate::error::ApiError;
use crate::session::{ContentBasis, Seed};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::{debug, info};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Example {
    pub title: String,
    pub url: String,
    #[serde(default)]
    pub subject: String,
    #[serde(default)]
    pub channel: String,
    #[serde(default)]
    pub age_range: String,
    #[serde(default)]
    pub grade: String,
    #[serde(default)]
    pub spec: String,
    #[serde(default)]
    pub code: String,
}

impl Example {
    pub fn seed(&self) -> Option<Seed> {
        Seed::new(self.spec.clone(), self.code.clone())
    }
}

#[derive(Debug, Clone, Default)]
pub struct ExampleCatalog {
    examples: Vec<Example>,
}

impl ExampleCatalog {
    pub fn new(examples: Vec<Example>) -> Self {
        Self { examples }
    }

    /// Load a JSON array of examples
    pub fn load_from_file(path: &Path) -> Result<Self, ApiError> {
        let raw = std::fs::read_to_string(path).map_err(|e| {
            ApiError::CatalogError(format!("Failed to read {}: {}", path.display(), e))
        })?;
        let catalog = Self::from_json(&raw).map_err(|e| match e {
            ApiError::CatalogError(msg) => {
                ApiError::CatalogError(format!("{}: {}", path.display(), msg))
            }
            other => other,
        })?;
        info!(
            path = %path.display(),
            examples = catalog.len(),
            "Loaded example catalog"
        );
        Ok(catalog)
    }

    pub fn from_json(raw: &str) -> Result<Self, ApiError> {
        let examples: Vec<Example> = serde_json::from_str(raw)
            .map_err(|e| ApiError::CatalogError(format!("Invalid catalog JSON: {}", e)))?;
        Ok(Self::new(examples))
    }

    pub fn examples(&self) -> &[Example] {
        &self.examples
    }

    pub fn len(&self) -> usize {
        self.examples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.examples.is_empty()
    }

    /// Exact match on the trimmed URL
    pub fn find_by_url(&self, url: &str) -> Option<&Example> {
        let url = url.trim();
        self.examples.iter().find(|example| example.url.trim() == url)
    }

    /// Seed for a content basis, if a complete example exists for it
    pub fn seed_for(&self, basis: &ContentBasis) -> Option<Seed> {
        let seed = self.find_by_url(basis.as_str()).and_then(Example::seed);
        if seed.is_some() {
            debug!(basis = %basis, "Content basis matches a catalog example");
        }
        seed
    }
}
