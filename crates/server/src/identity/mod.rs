//! OAuth 2.0 / OpenID Connect client for admin sign-in.
//!
//! Defaults to Google's endpoints; any provider with an authorization code
//! flow and a userinfo endpoint works.
//!
//! # Flow
//!
//! 1. Redirect the visitor to [`IdentityClient::authorization_url`]
//! 2. The provider redirects back with an authorization code
//! 3. Exchange it with [`IdentityClient::exchange_code`]
//! 4. Resolve the signed-in [`Identity`] with [`IdentityClient::fetch_identity`]

mod error;

pub use error::IdentityError;

use std::sync::Arc;

use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use tracing::instrument;

use folio_core::{Identity, SubjectId};

use crate::config::OAuthConfig;

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
}

/// Claims returned by the userinfo endpoint.
#[derive(Debug, Deserialize)]
struct UserInfo {
    sub: String,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    email: Option<String>,
    #[serde(default)]
    picture: Option<String>,
}

impl UserInfo {
    fn into_identity(self) -> Result<Identity, IdentityError> {
        if self.sub.trim().is_empty() {
            return Err(IdentityError::OAuth("userinfo has no subject".to_string()));
        }
        let name = self
            .name
            .filter(|n| !n.trim().is_empty())
            .or_else(|| self.email.clone())
            .unwrap_or_else(|| self.sub.clone());
        Ok(Identity {
            subject: SubjectId::new(self.sub),
            name,
            email: self.email,
            photo_url: self.picture,
        })
    }
}

/// Client for the configured identity provider.
#[derive(Clone)]
pub struct IdentityClient {
    inner: Arc<IdentityClientInner>,
}

struct IdentityClientInner {
    client: reqwest::Client,
    client_id: String,
    client_secret: SecretString,
    authorize_url: String,
    token_url: String,
    userinfo_url: String,
}

impl IdentityClient {
    /// Create a client from OAuth settings.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(config: &OAuthConfig) -> Result<Self, IdentityError> {
        let client = reqwest::Client::builder()
            .user_agent(concat!("folio/", env!("CARGO_PKG_VERSION")))
            .timeout(std::time::Duration::from_secs(15))
            .build()?;

        Ok(Self {
            inner: Arc::new(IdentityClientInner {
                client,
                client_id: config.client_id.clone(),
                client_secret: config.client_secret.clone(),
                authorize_url: config.authorize_url.clone(),
                token_url: config.token_url.clone(),
                userinfo_url: config.userinfo_url.clone(),
            }),
        })
    }

    /// Build the provider URL that starts sign-in.
    ///
    /// `state` guards the callback against CSRF and must be kept in the
    /// session. Identity comes from userinfo and the ID token is never read,
    /// so no nonce is sent.
    #[must_use]
    pub fn authorization_url(&self, redirect_uri: &str, state: &str) -> String {
        let separator = if self.inner.authorize_url.contains('?') {
            '&'
        } else {
            '?'
        };
        format!(
            "{}{separator}\
            client_id={}&\
            response_type=code&\
            redirect_uri={}&\
            scope=openid%20email%20profile&\
            state={}",
            self.inner.authorize_url,
            urlencoding::encode(&self.inner.client_id),
            urlencoding::encode(redirect_uri),
            urlencoding::encode(state)
        )
    }

    /// Exchange an authorization code for an access token.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the provider rejects the code.
    #[instrument(skip(self, code))]
    pub async fn exchange_code(
        &self,
        code: &str,
        redirect_uri: &str,
    ) -> Result<String, IdentityError> {
        let params = [
            ("grant_type", "authorization_code"),
            ("client_id", self.inner.client_id.as_str()),
            ("client_secret", self.inner.client_secret.expose_secret()),
            ("code", code),
            ("redirect_uri", redirect_uri),
        ];

        let response = self
            .inner
            .client
            .post(&self.inner.token_url)
            .form(&params)
            .send()
            .await?;

        if !response.status().is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(IdentityError::OAuth(format!(
                "Token exchange failed: {text}"
            )));
        }

        let token: TokenResponse = response.json().await?;
        Ok(token.access_token)
    }

    /// Look up who owns `access_token`.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the profile has no subject.
    #[instrument(skip(self, access_token))]
    pub async fn fetch_identity(&self, access_token: &str) -> Result<Identity, IdentityError> {
        let response = self
            .inner
            .client
            .get(&self.inner.userinfo_url)
            .bearer_auth(access_token)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            return Err(IdentityError::OAuth(format!(
                "userinfo returned {status}"
            )));
        }

        let info: UserInfo = response.json().await?;
        info.into_identity()
    }
}
