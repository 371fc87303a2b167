//! Gemini `generateContent` client.

use super::{GenerationRequest, SafetySetting, TextGenerationService, VIDEO_MIME_TYPE};
use crate::error::ServiceError;
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, warn};

pub const DEFAULT_GEMINI_ENDPOINT: &str = "https://generativelanguage.googleapis.com/v1beta";

const PROVIDER_HTTP_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Finish reasons that mean the completion was cut off by a safety filter
const SAFETY_FINISH_REASONS: &[&str] = &[
    "SAFETY",
    "PROHIBITED_CONTENT",
    "BLOCKLIST",
    "SPII",
    "IMAGE_SAFETY",
];

// Wire structures for the generateContent endpoint
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest {
    contents: Vec<Content>,
    generation_config: GenerationConfigBody,
    #[serde(skip_serializing_if = "Option::is_none")]
    safety_settings: Option<Vec<SafetySetting>>,
}

#[derive(Debug, Serialize)]
struct GenerationConfigBody {
    temperature: f32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Content {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    #[serde(default)]
    pub parts: Vec<Part>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Part {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_data: Option<FileData>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileData {
    pub mime_type: String,
    pub file_uri: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateContentResponse {
    #[serde(default)]
    pub candidates: Vec<Candidate>,
    #[serde(default)]
    pub prompt_feedback: Option<PromptFeedback>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Candidate {
    #[serde(default)]
    pub content: Option<Content>,
    #[serde(default)]
    pub finish_reason: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PromptFeedback {
    #[serde(default)]
    pub block_reason: Option<String>,
}

fn build_body(request: &GenerationRequest) -> GenerateContentRequest {
    let mut parts = vec![Part {
        text: Some(request.prompt.clone()),
        file_data: None,
    }];
    if let Some(video) = &request.video_reference {
        parts.push(Part {
            text: None,
            file_data: Some(FileData {
                mime_type: VIDEO_MIME_TYPE.to_string(),
                file_uri: video.clone(),
            }),
        });
    }

    GenerateContentRequest {
        contents: vec![Content {
            role: Some("user".to_string()),
            parts,
        }],
        generation_config: GenerationConfigBody {
            temperature: request.temperature,
        },
        safety_settings: request.safety_settings.clone(),
    }
}

/// Apply the completion taxonomy to a decoded response.
///
/// Checked in order: prompt block, missing candidate, finish reason. The text of
/// a normal completion is the concatenation of the first candidate's text parts.
pub fn interpret_response(response: GenerateContentResponse) -> Result<String, ServiceError> {
    if let Some(reason) = response
        .prompt_feedback
        .as_ref()
        .and_then(|feedback| feedback.block_reason.clone())
    {
        return Err(ServiceError::BlockedPrompt(reason));
    }

    let candidate = response
        .candidates
        .into_iter()
        .next()
        .ok_or(ServiceError::NoCandidate)?;

    if let Some(reason) = candidate.finish_reason.as_deref() {
        if reason != "STOP" {
            if SAFETY_FINISH_REASONS.contains(&reason) {
                return Err(ServiceError::SafetyFinish(reason.to_string()));
            }
            return Err(ServiceError::AbnormalFinish(reason.to_string()));
        }
    }

    Ok(candidate
        .content
        .map(|content| {
            content
                .parts
                .into_iter()
                .filter_map(|part| part.text)
                .collect::<String>()
        })
        .unwrap_or_default())
}

fn map_status(status: reqwest::StatusCode, body: String) -> ServiceError {
    match status.as_u16() {
        401 | 403 => ServiceError::Auth(format!("status {}: {}", status, body)),
        429 => ServiceError::RateLimited(format!("status {}: {}", status, body)),
        _ => ServiceError::Request(format!("Request failed with status {}: {}", status, body)),
    }
}

// Helper function to map HTTP errors to ServiceError
fn map_http_error(error: reqwest::Error) -> ServiceError {
    if error.is_timeout() {
        ServiceError::Request(format!("Request timeout: {}", error))
    } else if error.is_connect() {
        ServiceError::Request(format!("Connection error: {}", error))
    } else {
        ServiceError::Provider(format!("HTTP error: {}", error))
    }
}

/// Gemini REST client
pub struct GeminiClient {
    client: Client,
    api_key: String,
    endpoint: String,
}

impl GeminiClient {
    pub fn new(
        api_key: String,
        endpoint: Option<String>,
        request_timeout: Duration,
    ) -> Result<Self, ServiceError> {
        let client = Client::builder()
            .connect_timeout(PROVIDER_HTTP_CONNECT_TIMEOUT)
            .timeout(request_timeout)
            .build()
            .map_err(|e| ServiceError::Provider(format!("Failed to create HTTP client: {}", e)))?;
        let endpoint = endpoint
            .unwrap_or_else(|| DEFAULT_GEMINI_ENDPOINT.to_string())
            .trim_end_matches('/')
            .to_string();

        Ok(Self {
            client,
            api_key,
            endpoint,
        })
    }

    fn url_for(&self, model: &str) -> String {
        format!("{}/models/{}:generateContent", self.endpoint, model)
    }
}

#[async_trait]
impl TextGenerationService for GeminiClient {
    async fn generate(&self, request: GenerationRequest) -> Result<String, ServiceError> {
        let url = self.url_for(&request.model);
        let body = build_body(&request);
        debug!(
            model = %request.model,
            with_video = request.video_reference.is_some(),
            temperature = request.temperature,
            "Sending generateContent request"
        );

        let response = self
            .client
            .post(&url)
            .header("x-goog-api-key", &self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(map_http_error)?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            warn!(model = %request.model, %status, "generateContent request failed");
            return Err(map_status(status, error_text));
        }

        let decoded: GenerateContentResponse = response
            .json()
            .await
            .map_err(|e| ServiceError::Provider(format!("Failed to parse response: {}", e)))?;

        interpret_response(decoded).map_err(|e| {
            warn!(model = %request.model, error = %e, "Completion rejected");
            e
        })
    }

    fn provider_name(&self) -> &str {
        "gemini"
    }
}
