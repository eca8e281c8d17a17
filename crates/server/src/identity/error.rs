//! Error types for the identity provider client.

use thiserror::Error;

/// Errors from the OAuth sign-in flow.
#[derive(Debug, Error)]
pub enum IdentityError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The provider rejected the exchange or returned an unusable profile.
    #[error("OAuth error: {0}")]
    OAuth(String),
}
