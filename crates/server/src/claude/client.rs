//! Claude API client.

use std::sync::Arc;

use reqwest::header::{CONTENT_TYPE, HeaderMap, HeaderValue};
use secrecy::ExposeSecret;
use tracing::instrument;

use crate::config::ClaudeConfig;

use super::error::{ClaudeError, ErrorEnvelope};
use super::types::{ChatRequest, ChatResponse, Message, Tool};

const ANTHROPIC_VERSION: &str = "2023-06-01";
const DEFAULT_MAX_TOKENS: u32 = 1024;

/// Claude API client.
///
/// Cheap to clone; all clones share one connection pool.
#[derive(Clone)]
pub struct ClaudeClient {
    inner: Arc<ClaudeClientInner>,
}

struct ClaudeClientInner {
    client: reqwest::Client,
    model: String,
    api_url: String,
}

impl ClaudeClient {
    /// Create a new Claude client.
    ///
    /// # Errors
    ///
    /// Returns `ClaudeError::InvalidApiKey` if the API key contains characters
    /// that cannot be sent in a header, or `ClaudeError::Http` if the HTTP
    /// client cannot be built.
    pub fn new(config: &ClaudeConfig) -> Result<Self, ClaudeError> {
        let mut api_key = HeaderValue::from_str(config.api_key.expose_secret()).map_err(|_| {
            ClaudeError::InvalidApiKey("API key contains invalid header characters".to_string())
        })?;
        api_key.set_sensitive(true);

        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert("x-api-key", api_key);
        headers.insert(
            "anthropic-version",
            HeaderValue::from_static(ANTHROPIC_VERSION),
        );

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .build()?;

        Ok(Self {
            inner: Arc::new(ClaudeClientInner {
                client,
                model: config.model.clone(),
                api_url: config.api_url.clone(),
            }),
        })
    }

    /// Send a chat request and get a complete response.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails or returns an error response.
    #[instrument(skip(self, messages, system, tools), fields(model = %self.inner.model))]
    pub async fn chat(
        &self,
        messages: Vec<Message>,
        system: Option<String>,
        tools: Option<Vec<Tool>>,
    ) -> Result<ChatResponse, ClaudeError> {
        let request = ChatRequest {
            model: self.inner.model.clone(),
            max_tokens: DEFAULT_MAX_TOKENS,
            messages,
            system,
            tools,
        };

        let response = self
            .inner
            .client
            .post(&self.inner.api_url)
            .json(&request)
            .send()
            .await?;

        Self::handle_response(response).await
    }

    /// One-shot completion: a single user prompt, text answer.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the answer has no text.
    pub async fn complete(&self, system: String, prompt: String) -> Result<String, ClaudeError> {
        let response = self
            .chat(vec![Message::user(prompt)], Some(system), None)
            .await?;
        let text = response.text();
        if text.is_empty() {
            return Err(ClaudeError::MalformedResponse("response contained no text".to_string()));
        }
        Ok(text)
    }

    async fn handle_response(response: reqwest::Response) -> Result<ChatResponse, ClaudeError> {
        let status = response.status();

        if status.is_success() {
            let body = response.text().await?;
            serde_json::from_str(&body)
                .map_err(|e| ClaudeError::MalformedResponse(format!("Failed to parse response: {e}")))
        } else {
            Err(Self::handle_error_status(status, response).await)
        }
    }

    async fn handle_error_status(
        status: reqwest::StatusCode,
        response: reqwest::Response,
    ) -> ClaudeError {
        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            let retry_after = response
                .headers()
                .get("Retry-After")
                .and_then(|v| v.to_str().ok())
                .and_then(|s| s.parse().ok())
                .unwrap_or(60);
            return ClaudeError::RateLimited(retry_after);
        }

        if status == reqwest::StatusCode::UNAUTHORIZED {
            return ClaudeError::InvalidApiKey("Invalid API key".to_string());
        }

        match response.text().await {
            Ok(body) => match serde_json::from_str::<ErrorEnvelope>(&body) {
                Ok(envelope) => ClaudeError::Api {
                    status: status.as_u16(),
                    kind: envelope.error.kind,
                    message: envelope.error.message,
                },
                Err(_) => ClaudeError::Api {
                    status: status.as_u16(),
                    kind: "unknown".to_string(),
                    message: body,
                },
            },
            Err(e) => ClaudeError::Http(e),
        }
    }
}
