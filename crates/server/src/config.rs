//! Site configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `FOLIO_BASE_URL` - Public URL of the site (used for the OAuth redirect)
//! - `FOLIO_ADMIN_SUBJECT` - Identity provider subject allowed to edit projects
//! - `CLAUDE_API_KEY` - Anthropic Claude API key
//! - `OAUTH_CLIENT_ID` - OAuth client ID registered with the identity provider
//! - `OAUTH_CLIENT_SECRET` - OAuth client secret
//!
//! ## Optional
//! - `FOLIO_HOST` - Bind address (default: 127.0.0.1)
//! - `FOLIO_PORT` - Listen port (default: 3000)
//! - `FOLIO_STORE` - `memory`, `postgres` or `firebase` (default: memory)
//! - `FOLIO_PROFILE_PATH` - YAML biography overriding the built-in profile
//! - `FOLIO_LOG_JSON` - Emit JSON logs when set
//! - `CLAUDE_MODEL` - Claude model ID (default: claude-sonnet-4-20250514)
//! - `CLAUDE_API_URL` - Messages endpoint (default: Anthropic)
//! - `OAUTH_AUTHORIZE_URL`, `OAUTH_TOKEN_URL`, `OAUTH_USERINFO_URL` - Provider
//!   endpoints (default: Google)
//! - `SENTRY_DSN`, `SENTRY_ENVIRONMENT`, `SENTRY_SAMPLE_RATE`,
//!   `SENTRY_TRACES_SAMPLE_RATE` - Error tracking
//!
//! ## Store specific
//! - `FOLIO_DATABASE_URL` (or `DATABASE_URL`) - required when `FOLIO_STORE=postgres`
//! - `FIREBASE_DATABASE_URL` - required when `FOLIO_STORE=firebase`
//! - `FIREBASE_AUTH_TOKEN` - optional database secret or ID token

use std::collections::HashMap;
use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;

use folio_core::SubjectId;
use secrecy::SecretString;
use thiserror::Error;
use url::Url;

const MIN_ENTROPY_BITS_PER_CHAR: f64 = 3.3;
pub const DEFAULT_CLAUDE_MODEL: &str = "claude-sonnet-4-20250514";
pub const DEFAULT_CLAUDE_API_URL: &str = "https://api.anthropic.com/v1/messages";
pub const DEFAULT_OAUTH_AUTHORIZE_URL: &str = "https://accounts.google.com/o/oauth2/v2/auth";
pub const DEFAULT_OAUTH_TOKEN_URL: &str = "https://oauth2.googleapis.com/token";
pub const DEFAULT_OAUTH_USERINFO_URL: &str = "https://openidconnect.googleapis.com/v1/userinfo";

/// Blocklist of common placeholder patterns (case-insensitive)
const PLACEHOLDER_PATTERNS: &[&str] = &[
    "your-",
    "changeme",
    "replace",
    "placeholder",
    "example",
    "password",
    "xxx",
    "todo",
    "fixme",
    "insert",
    "enter-",
    "put-your",
    "add-your",
];

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
    #[error("Insecure secret in {0}: {1}")]
    InsecureSecret(String, String),
}

/// Site configuration.
#[derive(Debug, Clone)]
pub struct SiteConfig {
    /// IP address to bind the server to
    pub host: IpAddr,
    /// Port to listen on
    pub port: u16,
    /// Public base URL, without trailing slash
    pub base_url: String,
    /// The only subject allowed to mutate projects
    pub admin_subject: SubjectId,
    /// Which hosted store backs the project list
    pub store: StoreConfig,
    /// Claude AI configuration
    pub claude: ClaudeConfig,
    /// Identity provider configuration
    pub oauth: OAuthConfig,
    /// Biography override
    pub profile_path: Option<PathBuf>,
    /// JSON log output
    pub log_json: bool,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
    /// Sentry environment (e.g., "development", "production")
    pub sentry_environment: Option<String>,
    /// Sentry error sample rate (0.0 to 1.0)
    pub sentry_sample_rate: f32,
    /// Sentry traces sample rate (0.0 to 1.0)
    pub sentry_traces_sample_rate: f32,
}

/// Backing store selection.
#[derive(Clone)]
pub enum StoreConfig {
    /// Process-local list; lost on restart.
    Memory,
    /// `PostgreSQL` via sqlx.
    Postgres { database_url: SecretString },
    /// Firebase Realtime Database REST API.
    Firebase {
        database_url: Url,
        auth_token: Option<SecretString>,
    },
}

impl StoreConfig {
    /// Short backend name for logs.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Memory => "memory",
            Self::Postgres { .. } => "postgres",
            Self::Firebase { .. } => "firebase",
        }
    }
}

impl std::fmt::Debug for StoreConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Memory => f.write_str("Memory"),
            Self::Postgres { .. } => f
                .debug_struct("Postgres")
                .field("database_url", &"[REDACTED]")
                .finish(),
            Self::Firebase {
                database_url,
                auth_token,
            } => f
                .debug_struct("Firebase")
                .field("database_url", &database_url.as_str())
                .field("auth_token", &auth_token.as_ref().map(|_| "[REDACTED]"))
                .finish(),
        }
    }
}

/// Claude AI API configuration.
///
/// Implements `Debug` manually to redact the API key.
#[derive(Clone)]
pub struct ClaudeConfig {
    /// Anthropic API key
    pub api_key: SecretString,
    /// Model ID (e.g., claude-sonnet-4-20250514)
    pub model: String,
    /// Messages endpoint
    pub api_url: String,
}

impl std::fmt::Debug for ClaudeConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClaudeConfig")
            .field("api_key", &"[REDACTED]")
            .field("model", &self.model)
            .field("api_url", &self.api_url)
            .finish()
    }
}

/// OAuth 2.0 / OpenID Connect client configuration.
///
/// Implements `Debug` manually to redact the client secret.
#[derive(Clone)]
pub struct OAuthConfig {
    pub client_id: String,
    pub client_secret: SecretString,
    pub authorize_url: String,
    pub token_url: String,
    pub userinfo_url: String,
}

impl std::fmt::Debug for OAuthConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OAuthConfig")
            .field("client_id", &self.client_id)
            .field("client_secret", &"[REDACTED]")
            .field("authorize_url", &self.authorize_url)
            .field("token_url", &self.token_url)
            .field("userinfo_url", &self.userinfo_url)
            .finish()
    }
}

/// Source of configuration values.
///
/// Production reads the process environment; tests pass a map.
type Lookup<'a> = &'a dyn Fn(&str) -> Option<String>;

impl SiteConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing, invalid, or
    /// if secrets fail validation (placeholder detection, entropy check).
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();
        Self::from_lookup(&|key| std::env::var(key).ok())
    }

    /// Load configuration from an explicit set of variables.
    ///
    /// # Errors
    ///
    /// Same as [`SiteConfig::from_env`].
    pub fn from_vars(vars: &HashMap<String, String>) -> Result<Self, ConfigError> {
        Self::from_lookup(&|key| vars.get(key).cloned())
    }

    fn from_lookup(env: Lookup<'_>) -> Result<Self, ConfigError> {
        let host = get_env_or_default(env, "FOLIO_HOST", "127.0.0.1")
            .parse::<IpAddr>()
            .map_err(|e| ConfigError::InvalidEnvVar("FOLIO_HOST".to_string(), e.to_string()))?;
        let port = get_env_or_default(env, "FOLIO_PORT", "3000")
            .parse::<u16>()
            .map_err(|e| ConfigError::InvalidEnvVar("FOLIO_PORT".to_string(), e.to_string()))?;
        let base_url = get_required_env(env, "FOLIO_BASE_URL")?;
        Url::parse(&base_url)
            .map_err(|e| ConfigError::InvalidEnvVar("FOLIO_BASE_URL".to_string(), e.to_string()))?;
        let base_url = base_url.trim_end_matches('/').to_string();

        let admin_subject = admin_subject_from_lookup(env)?;
        let store = StoreConfig::from_lookup(env)?;
        let claude = ClaudeConfig::from_lookup(env)?;
        let oauth = OAuthConfig::from_lookup(env)?;
        let profile_path = get_optional_env(env, "FOLIO_PROFILE_PATH").map(PathBuf::from);
        let log_json = get_optional_env(env, "FOLIO_LOG_JSON").is_some();
        let sentry_dsn = get_optional_env(env, "SENTRY_DSN");
        let sentry_environment = get_optional_env(env, "SENTRY_ENVIRONMENT");
        let sentry_sample_rate = get_optional_env(env, "SENTRY_SAMPLE_RATE")
            .and_then(|s| s.parse().ok())
            .unwrap_or(1.0);
        let sentry_traces_sample_rate = get_optional_env(env, "SENTRY_TRACES_SAMPLE_RATE")
            .and_then(|s| s.parse().ok())
            .unwrap_or(0.1);

        Ok(Self {
            host,
            port,
            base_url,
            admin_subject,
            store,
            claude,
            oauth,
            profile_path,
            log_json,
            sentry_dsn,
            sentry_environment,
            sentry_sample_rate,
            sentry_traces_sample_rate,
        })
    }

    /// Returns the socket address for binding the server.
    #[must_use]
    pub const fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }

    /// Where the identity provider sends the browser back to.
    #[must_use]
    pub fn oauth_redirect_uri(&self) -> String {
        format!("{}/auth/callback", self.base_url)
    }

    /// Whether session cookies should carry the `Secure` flag.
    #[must_use]
    pub fn secure_cookies(&self) -> bool {
        self.base_url.starts_with("https://")
    }
}

impl StoreConfig {
    /// Load only the store selection, for tools that need nothing else.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if the selected backend is missing settings.
    pub fn from_env() -> Result<Self, ConfigError> {
        let _ = dotenvy::dotenv();
        Self::from_lookup(&|key| std::env::var(key).ok())
    }

    fn from_lookup(env: Lookup<'_>) -> Result<Self, ConfigError> {
        match get_env_or_default(env, "FOLIO_STORE", "memory").as_str() {
            "memory" => Ok(Self::Memory),
            "postgres" => Ok(Self::Postgres {
                database_url: get_database_url(env, "FOLIO_DATABASE_URL")?,
            }),
            "firebase" => {
                let raw = get_required_env(env, "FIREBASE_DATABASE_URL")?;
                let database_url = Url::parse(&raw).map_err(|e| {
                    ConfigError::InvalidEnvVar("FIREBASE_DATABASE_URL".to_string(), e.to_string())
                })?;
                let auth_token = get_optional_env(env, "FIREBASE_AUTH_TOKEN").map(|token| {
                    if let Err(e) = validate_secret_strength(&token, "FIREBASE_AUTH_TOKEN") {
                        tracing::warn!("FIREBASE_AUTH_TOKEN validation warning: {e}");
                    }
                    SecretString::from(token)
                });
                Ok(Self::Firebase {
                    database_url,
                    auth_token,
                })
            }
            other => Err(ConfigError::InvalidEnvVar(
                "FOLIO_STORE".to_string(),
                format!("unknown store '{other}' (expected memory, postgres or firebase)"),
            )),
        }
    }
}

impl ClaudeConfig {
    fn from_lookup(env: Lookup<'_>) -> Result<Self, ConfigError> {
        Ok(Self {
            api_key: get_validated_secret(env, "CLAUDE_API_KEY")?,
            model: get_env_or_default(env, "CLAUDE_MODEL", DEFAULT_CLAUDE_MODEL),
            api_url: get_env_or_default(env, "CLAUDE_API_URL", DEFAULT_CLAUDE_API_URL),
        })
    }
}

impl OAuthConfig {
    fn from_lookup(env: Lookup<'_>) -> Result<Self, ConfigError> {
        Ok(Self {
            client_id: get_required_env(env, "OAUTH_CLIENT_ID")?,
            client_secret: get_validated_secret(env, "OAUTH_CLIENT_SECRET")?,
            authorize_url: get_env_or_default(env, "OAUTH_AUTHORIZE_URL", DEFAULT_OAUTH_AUTHORIZE_URL),
            token_url: get_env_or_default(env, "OAUTH_TOKEN_URL", DEFAULT_OAUTH_TOKEN_URL),
            userinfo_url: get_env_or_default(env, "OAUTH_USERINFO_URL", DEFAULT_OAUTH_USERINFO_URL),
        })
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Get a required environment variable.
fn get_required_env(env: Lookup<'_>, key: &str) -> Result<String, ConfigError> {
    env(key).ok_or_else(|| ConfigError::MissingEnvVar(key.to_string()))
}

/// Load only the admin subject.
///
/// # Errors
///
/// Returns `ConfigError` if `FOLIO_ADMIN_SUBJECT` is unset or blank.
pub fn admin_subject_from_env() -> Result<SubjectId, ConfigError> {
    let _ = dotenvy::dotenv();
    admin_subject_from_lookup(&|key| std::env::var(key).ok())
}

/// Load only the `PostgreSQL` URL (`FOLIO_DATABASE_URL`, then `DATABASE_URL`).
///
/// # Errors
///
/// Returns `ConfigError::MissingEnvVar` if neither is set.
pub fn database_url_from_env() -> Result<SecretString, ConfigError> {
    let _ = dotenvy::dotenv();
    get_database_url(&|key| std::env::var(key).ok(), "FOLIO_DATABASE_URL")
}

fn admin_subject_from_lookup(env: Lookup<'_>) -> Result<SubjectId, ConfigError> {
    let admin_subject = get_required_env(env, "FOLIO_ADMIN_SUBJECT")?;
    let admin_subject = admin_subject.trim();
    if admin_subject.is_empty() {
        return Err(ConfigError::InvalidEnvVar(
            "FOLIO_ADMIN_SUBJECT".to_string(),
            "must not be empty".to_string(),
        ));
    }
    Ok(SubjectId::new(admin_subject))
}

/// Get database URL with fallback to generic `DATABASE_URL`.
fn get_database_url(env: Lookup<'_>, primary_key: &str) -> Result<SecretString, ConfigError> {
    env(primary_key)
        .or_else(|| env("DATABASE_URL"))
        .map(SecretString::from)
        .ok_or_else(|| ConfigError::MissingEnvVar(primary_key.to_string()))
}

/// Get an optional environment variable. Empty values count as unset.
fn get_optional_env(env: Lookup<'_>, key: &str) -> Option<String> {
    env(key).filter(|v| !v.is_empty())
}

/// Get an environment variable with a default value.
fn get_env_or_default(env: Lookup<'_>, key: &str, default: &str) -> String {
    get_optional_env(env, key).unwrap_or_else(|| default.to_string())
}

/// Calculate Shannon entropy in bits per character.
fn shannon_entropy(s: &str) -> f64 {
    if s.is_empty() {
        return 0.0;
    }

    let mut freq: HashMap<char, usize> = HashMap::new();
    for c in s.chars() {
        *freq.entry(c).or_insert(0) += 1;
    }

    #[allow(clippy::cast_precision_loss)] // String length will never exceed f64 precision
    let len = s.chars().count() as f64;
    freq.values()
        .map(|&count| {
            #[allow(clippy::cast_precision_loss)]
            let p = count as f64 / len;
            -p * p.log2()
        })
        .sum()
}

/// Validate that a secret is not a placeholder and has sufficient entropy.
fn validate_secret_strength(secret: &str, var_name: &str) -> Result<(), ConfigError> {
    let lower = secret.to_lowercase();

    for pattern in PLACEHOLDER_PATTERNS {
        if lower.contains(pattern) {
            return Err(ConfigError::InsecureSecret(
                var_name.to_string(),
                format!("appears to be a placeholder (contains '{pattern}')"),
            ));
        }
    }

    let entropy = shannon_entropy(secret);
    if entropy < MIN_ENTROPY_BITS_PER_CHAR {
        return Err(ConfigError::InsecureSecret(
            var_name.to_string(),
            format!(
                "entropy too low ({entropy:.2} bits/char, need >= {MIN_ENTROPY_BITS_PER_CHAR:.1}). Use the credential issued by the provider."
            ),
        ));
    }

    Ok(())
}

/// Load and validate a secret.
fn get_validated_secret(env: Lookup<'_>, key: &str) -> Result<SecretString, ConfigError> {
    let value = get_required_env(env, key)?;
    validate_secret_strength(&value, key)?;
    Ok(SecretString::from(value))
}
