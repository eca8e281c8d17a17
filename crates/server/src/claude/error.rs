//! Claude client errors.

use serde::Deserialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ClaudeError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Non-success status with the API's own error kind when it sent one.
    #[error("Claude returned {status} ({kind}): {message}")]
    Api {
        status: u16,
        kind: String,
        message: String,
    },

    #[error("rate limited by Claude, retry in {0}s")]
    RateLimited(u64),

    /// Key rejected by the API or not usable as a header.
    #[error("invalid API key: {0}")]
    InvalidApiKey(String),

    #[error("malformed response: {0}")]
    MalformedResponse(String),

    /// A tool call from the model could not be served.
    #[error("tool failed: {0}")]
    Tool(String),
}

impl ClaudeError {
    /// Whether retrying the same request later could succeed.
    #[must_use]
    pub const fn is_transient(&self) -> bool {
        match self {
            Self::Http(_) | Self::RateLimited(_) => true,
            Self::Api { status, .. } => *status >= 500,
            Self::InvalidApiKey(_) | Self::MalformedResponse(_) | Self::Tool(_) => false,
        }
    }
}

/// Body of a non-success response: `{"type":"error","error":{...}}`.
#[derive(Debug, Deserialize)]
pub(super) struct ErrorEnvelope {
    pub error: ErrorBody,
}

#[derive(Debug, Deserialize)]
pub(super) struct ErrorBody {
    #[serde(rename = "type")]
    pub kind: String,
    pub message: String,
}
