//! HTTP middleware.
//!
//! # Middleware Order (bottom to top in Router)
//!
//! 1. Sentry layers (capture errors)
//! 2. `TraceLayer` (request tracing)
//! 3. Request ID (add unique ID to each request)
//! 4. Session layer (tower-sessions)
//! 5. Security headers (CSP, frame denial, nosniff)
//!
//! Authorization is not a layer: handlers take the `RequireAdmin` or
//! `OptionalUser` extractor.

pub mod auth;
pub mod request_id;
pub mod security_headers;
pub mod session;

pub use auth::{
    AdminRejection, OptionalUser, RequireAdmin, clear_current_user, set_current_user,
};
pub use request_id::request_id_middleware;
pub use security_headers::security_headers_middleware;
pub use session::create_session_layer;
