//! Session middleware configuration.
//!
//! The layer is generic over the store: `PostgresStore` when a pool exists,
//! `MemoryStore` otherwise.

use tower_sessions::{Expiry, SessionManagerLayer, SessionStore};

use crate::config::SiteConfig;

/// Session cookie name.
pub const SESSION_COOKIE_NAME: &str = "folio_session";

/// Session expiry time in seconds (24 hours).
const SESSION_EXPIRY_SECONDS: i64 = 24 * 60 * 60;

/// Create the session layer over `store`.
///
/// `SameSite=Lax` so the cookie survives the redirect back from the identity
/// provider.
#[must_use]
pub fn create_session_layer<S: SessionStore + Clone>(
    store: S,
    config: &SiteConfig,
) -> SessionManagerLayer<S> {
    SessionManagerLayer::new(store)
        .with_name(SESSION_COOKIE_NAME)
        .with_expiry(Expiry::OnInactivity(
            tower_sessions::cookie::time::Duration::seconds(SESSION_EXPIRY_SECONDS),
        ))
        .with_secure(config.secure_cookies())
        .with_same_site(tower_sessions::cookie::SameSite::Lax)
        .with_http_only(true)
        .with_path("/")
}
