//! HTTP client for `generateContent` / `streamGenerateContent`.

use std::time::Duration;

use tracing::{debug, info};

use super::types::{GenerateContentRequest, GenerateContentResponse};
use super::{GenerationBackend, ResponseBody, sse};
use crate::constants::{
    API_BASE_ENV, API_KEY_HEADER, DEFAULT_API_BASE, DEFAULT_MODEL, DEFAULT_TIMEOUT_SECONDS,
};
use crate::error::GemimgError;
use crate::request::{CallShape, GenerationRequest};

/// Connection settings for [`GeminiClient`].
#[derive(Clone)]
pub struct ClientSettings {
    /// API key sent in the `x-goog-api-key` header
    pub api_key: String,
    /// Model id, e.g. `gemini-3-pro-image-preview`
    pub model: String,
    /// REST base URL without trailing slash
    pub api_base: String,
    /// Upper bound on a whole call, streamed body included
    pub timeout: Duration,
}

impl std::fmt::Debug for ClientSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClientSettings")
            .field("api_key", &"<redacted>")
            .field("model", &self.model)
            .field("api_base", &self.api_base)
            .field("timeout", &self.timeout)
            .finish()
    }
}

impl ClientSettings {
    /// Defaults for everything but the key; `GEMINI_API_BASE` overrides the base URL.
    pub fn new(api_key: impl Into<String>) -> Self {
        let api_base = std::env::var(API_BASE_ENV)
            .ok()
            .map(|value| value.trim().trim_end_matches('/').to_string())
            .filter(|value| !value.is_empty())
            .unwrap_or_else(|| DEFAULT_API_BASE.to_string());
        Self {
            api_key: api_key.into(),
            model: DEFAULT_MODEL.to_string(),
            api_base,
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECONDS),
        }
    }

    /// Sets the model id.
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Sets the per-call timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Full URL for a call of the given shape.
    pub fn endpoint(&self, shape: CallShape) -> String {
        let model = self.model.trim();
        let model_path = if model.starts_with("models/") {
            model.to_string()
        } else {
            format!("models/{model}")
        };
        match shape {
            CallShape::Composite => format!("{}/{model_path}:generateContent", self.api_base),
            CallShape::Streaming { .. } => {
                format!("{}/{model_path}:streamGenerateContent?alt=sse", self.api_base)
            }
        }
    }
}

/// Gemini REST client.
#[derive(Clone, Debug)]
pub struct GeminiClient {
    http: reqwest::Client,
    settings: ClientSettings,
}

impl GeminiClient {
    /// Builds the underlying HTTP client with the configured timeout.
    pub fn new(settings: ClientSettings) -> Result<Self, GemimgError> {
        let http = reqwest::Client::builder()
            .timeout(settings.timeout)
            .build()?;
        Ok(Self { http, settings })
    }
}

impl GenerationBackend for GeminiClient {
    async fn send(&self, request: &GenerationRequest) -> Result<ResponseBody, GemimgError> {
        let url = self.settings.endpoint(request.shape);
        let body = GenerateContentRequest::from(request);

        info!(
            "Calling {} with {} image(s)",
            self.settings.model,
            request.image_count()
        );
        debug!("POST {url}");

        let response = self
            .http
            .post(&url)
            .header(API_KEY_HEADER, &self.settings.api_key)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(GemimgError::Api {
                status: status.as_u16(),
                body,
            });
        }

        match request.shape {
            CallShape::Composite => {
                let bytes = response.bytes().await?;
                let unit: GenerateContentResponse = serde_json::from_slice(&bytes)?;
                Ok(ResponseBody::Composite(unit))
            }
            CallShape::Streaming { .. } => Ok(ResponseBody::Streamed(sse::decode_units(
                response.bytes_stream(),
            ))),
        }
    }
}
