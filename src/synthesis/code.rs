//! Stage two: committed spec to HTML.
//!
//! The extracted code is returned exactly as the model wrote it. Rendering it
//! safely (e.g. a sandboxed frame) is the consumer's job.

use crate::config::GenerationConfig;
use crate::error::SynthesisError;
use crate::extract::parse_delimited;
use crate::prompts::{CODE_REGION_CLOSER, CODE_REGION_OPENER};
use crate::provider::{GenerationRequest, TextGenerationService};
use crate::session::Stage;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};

pub struct CodeSynthesizer {
    service: Arc<dyn TextGenerationService>,
    model: String,
    temperature: f32,
}

impl CodeSynthesizer {
    pub fn new(service: Arc<dyn TextGenerationService>, config: &GenerationConfig) -> Self {
        Self {
            service,
            model: config.code_model.clone(),
            temperature: config.temperature,
        }
    }

    /// The spec is the whole prompt; no video is attached
    pub fn build_request(&self, spec: &str) -> GenerationRequest {
        GenerationRequest::new(&self.model, spec).with_temperature(self.temperature)
    }

    pub async fn synthesize(&self, spec: &str) -> Result<String, SynthesisError> {
        let request = self.build_request(spec);
        let started = Instant::now();
        info!(model = %self.model, spec_chars = spec.len(), "Generating code from spec");

        let raw = self.service.generate(request).await.map_err(|e| {
            warn!(error = %e, "Code generation call failed");
            SynthesisError::from_service(Stage::Code, e)
        })?;

        let code = parse_delimited(&raw, CODE_REGION_OPENER, CODE_REGION_CLOSER).map_err(|e| {
            warn!(error = %e, "Code response could not be parsed");
            SynthesisError::parse(Stage::Code, e)
        })?;

        debug!(
            code_chars = code.len(),
            duration_ms = started.elapsed().as_millis() as u64,
            "Code generated"
        );
        Ok(code)
    }
}
