//! Stage one: video reference to activity spec.

use crate::config::GenerationConfig;
use crate::error::SynthesisError;
use crate::extract::parse_structured;
use crate::prompts::{with_addendum, SPEC_FROM_VIDEO_PROMPT};
use crate::provider::{GenerationRequest, TextGenerationService};
use crate::session::{ContentBasis, Stage};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};

pub struct SpecSynthesizer {
    service: Arc<dyn TextGenerationService>,
    model: String,
    temperature: f32,
}

impl SpecSynthesizer {
    pub fn new(service: Arc<dyn TextGenerationService>, config: &GenerationConfig) -> Self {
        Self {
            service,
            model: config.spec_model.clone(),
            temperature: config.temperature,
        }
    }

    /// Fixed instruction prompt with the video attached; no safety overrides
    pub fn build_request(&self, basis: &ContentBasis) -> GenerationRequest {
        GenerationRequest::new(&self.model, SPEC_FROM_VIDEO_PROMPT)
            .with_video(basis.as_str())
            .with_temperature(self.temperature)
    }

    /// Derive a spec from the content basis. The returned text already carries the addendum.
    pub async fn synthesize(&self, basis: &ContentBasis) -> Result<String, SynthesisError> {
        let request = self.build_request(basis);
        let started = Instant::now();
        info!(basis = %basis, model = %self.model, "Generating spec from video");

        let raw = self.service.generate(request).await.map_err(|e| {
            warn!(basis = %basis, error = %e, "Spec generation call failed");
            SynthesisError::from_service(Stage::Spec, e)
        })?;

        let spec = parse_structured(&raw).map_err(|e| {
            warn!(basis = %basis, error = %e, "Spec response could not be parsed");
            SynthesisError::parse(Stage::Spec, e)
        })?;

        debug!(
            spec_chars = spec.len(),
            duration_ms = started.elapsed().as_millis() as u64,
            "Spec generated"
        );
        Ok(with_addendum(&spec))
    }
}
