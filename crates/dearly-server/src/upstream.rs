//! Client for the hosted generative-language API.

use reqwest::Client;
use tracing::error;

use dearly_protocol::{GenerateContentRequest, GenerateContentResponse};

use crate::error::{ApiError, ApiResult};

/// Client for the hosted model API. Stateless apart from connection reuse;
/// the API key is validated per request so a misconfigured server fails fast
/// with a descriptive error instead of at startup.
#[derive(Debug, Clone)]
pub struct ModelClient {
    /// HTTP client. No request timeout: streaming responses stay open for
    /// the lifetime of the generation.
    http: Client,
    /// Base URL of the hosted API (e.g. "https://generativelanguage.googleapis.com").
    base_url: String,
    /// Model name to request.
    model: String,
    /// API credential, if configured.
    api_key: Option<String>,
}

impl ModelClient {
    pub fn new(
        base_url: impl Into<String>,
        model: impl Into<String>,
        api_key: Option<String>,
    ) -> Self {
        Self {
            http: Client::new(),
            base_url: base_url.into(),
            model: model.into(),
            api_key,
        }
    }

    fn require_key(&self) -> ApiResult<&str> {
        self.api_key
            .as_deref()
            .filter(|key| !key.is_empty())
            .ok_or_else(|| ApiError::internal("GEMINI_API_KEY is not configured"))
    }

    /// Issue a streaming generation request and hand back the raw response
    /// for relaying. Upstream 429/402 pass through; other failures collapse
    /// to a 500.
    pub async fn stream_generate(
        &self,
        request: &GenerateContentRequest,
    ) -> ApiResult<reqwest::Response> {
        let key = self.require_key()?;
        let url = format!(
            "{}/v1beta/models/{}:streamGenerateContent",
            self.base_url, self.model
        );

        let response = self
            .http
            .post(&url)
            .query(&[("key", key), ("alt", "sse")])
            .json(request)
            .send()
            .await
            .map_err(|err| {
                error!(%err, "model request failed");
                ApiError::internal("AI service error")
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            error!(%status, %body, "model API error");
            return Err(ApiError::from_upstream_status(status));
        }

        Ok(response)
    }

    /// Issue a single non-streaming generation request.
    pub async fn generate(
        &self,
        request: &GenerateContentRequest,
    ) -> ApiResult<GenerateContentResponse> {
        let key = self.require_key()?;
        let url = format!(
            "{}/v1beta/models/{}:generateContent",
            self.base_url, self.model
        );

        let response = self
            .http
            .post(&url)
            .query(&[("key", key)])
            .json(request)
            .send()
            .await
            .map_err(|err| {
                error!(%err, "model request failed");
                ApiError::internal("Failed to format diary entry")
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            error!(%status, %body, "model API error");
            return Err(ApiError::internal("Failed to format diary entry"));
        }

        response.json().await.map_err(|err| {
            error!(%err, "failed to parse model response");
            ApiError::internal("Failed to format diary entry")
        })
    }
}
