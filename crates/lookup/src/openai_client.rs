//! OpenAI Responses API client
//!
//! POSTs `{model, instructions, input}` to `{api_base}/v1/responses` and
//! extracts the concatenated output text.

use std::time::{Duration, Instant};

use serde::Deserialize;
use serde_json::json;
use tracing::{debug, instrument, warn};

use contracts::{LookupConfig, LookupError};

use crate::client::{ResponsesClient, ResponsesRequest};

/// Real HTTP client
#[derive(Clone)]
pub struct OpenAiClient {
    http: reqwest::Client,
    api_key: String,
    endpoint: String,
    timeout: Duration,
}

impl std::fmt::Debug for OpenAiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpenAiClient")
            .field("endpoint", &self.endpoint)
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}

impl OpenAiClient {
    /// Build a client; an empty key is rejected up front
    pub fn new(api_key: impl Into<String>, config: &LookupConfig) -> Result<Self, LookupError> {
        let api_key = api_key.into();
        if api_key.trim().is_empty() {
            return Err(LookupError::MissingApiKey);
        }

        let timeout = Duration::from_secs(config.request_timeout_secs);
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| LookupError::Network(e.to_string()))?;

        Ok(Self {
            http,
            api_key,
            endpoint: format!("{}/v1/responses", config.api_base.trim_end_matches('/')),
            timeout,
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    fn transport_error(&self, e: reqwest::Error) -> LookupError {
        if e.is_timeout() {
            LookupError::Timeout {
                secs: self.timeout.as_secs(),
            }
        } else {
            LookupError::Network(e.to_string())
        }
    }
}

#[derive(Debug, Deserialize)]
struct ResponsesBody {
    #[serde(default)]
    output_text: Option<String>,
    #[serde(default)]
    output: Vec<OutputItem>,
}

#[derive(Debug, Deserialize)]
struct OutputItem {
    #[serde(default)]
    content: Vec<ContentPart>,
}

#[derive(Debug, Deserialize)]
struct ContentPart {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    text: Option<String>,
}

/// Output text of a Responses API body
///
/// Prefers the top-level `output_text`, otherwise joins every `output_text`
/// content part in order.
pub fn extract_output_text(body: &str) -> Result<String, LookupError> {
    let body: ResponsesBody =
        serde_json::from_str(body).map_err(|e| LookupError::decode(e.to_string()))?;

    if let Some(text) = body.output_text.filter(|t| !t.trim().is_empty()) {
        return Ok(text);
    }

    let text: String = body
        .output
        .iter()
        .flat_map(|item| item.content.iter())
        .filter(|part| part.kind == "output_text")
        .filter_map(|part| part.text.as_deref())
        .collect();

    if text.trim().is_empty() {
        return Err(LookupError::decode("no output text in response"));
    }
    Ok(text)
}

impl ResponsesClient for OpenAiClient {
    #[instrument(
        name = "openai_respond",
        skip(self, request),
        fields(model = %request.model)
    )]
    async fn respond(&self, request: &ResponsesRequest) -> Result<String, LookupError> {
        let body = json!({
            "model": request.model,
            "instructions": request.instructions,
            "input": request.input,
        });

        let started = Instant::now();
        let response = self
            .http
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| self.transport_error(e))?;

        let status = response.status();
        let text = response.text().await.map_err(|e| self.transport_error(e))?;
        debug!(
            status = status.as_u16(),
            bytes = text.len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Response received"
        );

        if !status.is_success() {
            warn!(status = status.as_u16(), "Request rejected");
            return Err(LookupError::from_status(status.as_u16(), status.to_string()));
        }

        extract_output_text(&text)
    }
}
