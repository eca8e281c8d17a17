//! Authentication extractors.
//!
//! `RequireAdmin` guards the admin surface. It only decides what the browser
//! sees; `ProjectService` checks the same rule again before any write.

use axum::{
    extract::FromRequestParts,
    http::{StatusCode, request::Parts},
    response::{IntoResponse, Redirect, Response},
};
use tower_sessions::Session;

use crate::error::{clear_sentry_user, set_sentry_user};
use crate::models::{CurrentUser, session_keys};
use crate::state::AppState;

/// Paths under this prefix answer with status codes instead of redirects.
const ADMIN_API_PREFIX: &str = "/admin/api/";

/// Extractor that requires the configured admin to be signed in.
///
/// # Example
///
/// ```rust,ignore
/// async fn protected_handler(RequireAdmin(admin): RequireAdmin) -> impl IntoResponse {
///     format!("Hello, {}!", admin.identity.name)
/// }
/// ```
pub struct RequireAdmin(pub CurrentUser);

/// Why `RequireAdmin` turned a request away.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdminRejection {
    /// Nobody signed in (HTML).
    RedirectToLogin,
    /// Signed in, but not as the admin (HTML).
    RedirectNotAuthorized,
    /// Nobody signed in (JSON API).
    Unauthorized,
    /// Signed in, but not as the admin (JSON API).
    Forbidden,
}

impl IntoResponse for AdminRejection {
    fn into_response(self) -> Response {
        match self {
            Self::RedirectToLogin => Redirect::to("/login").into_response(),
            Self::RedirectNotAuthorized => {
                Redirect::to("/login?error=not_authorized").into_response()
            }
            Self::Unauthorized => StatusCode::UNAUTHORIZED.into_response(),
            Self::Forbidden => StatusCode::FORBIDDEN.into_response(),
        }
    }
}

async fn session_user(parts: &Parts) -> Option<CurrentUser> {
    let session = parts.extensions.get::<Session>()?;
    session
        .get::<CurrentUser>(session_keys::CURRENT_USER)
        .await
        .ok()
        .flatten()
}

impl FromRequestParts<AppState> for RequireAdmin {
    type Rejection = AdminRejection;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let is_api = parts.uri.path().starts_with(ADMIN_API_PREFIX);

        let Some(user) = session_user(parts).await else {
            return Err(if is_api {
                AdminRejection::Unauthorized
            } else {
                AdminRejection::RedirectToLogin
            });
        };

        if !user.is_admin(state.policy()) {
            tracing::warn!(subject = %user.identity.subject, "Non-admin tried the admin surface");
            return Err(if is_api {
                AdminRejection::Forbidden
            } else {
                AdminRejection::RedirectNotAuthorized
            });
        }

        Ok(Self(user))
    }
}

/// Extractor that optionally gets the signed-in user.
///
/// Never rejects.
pub struct OptionalUser(pub Option<CurrentUser>);

impl<S> FromRequestParts<S> for OptionalUser
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(Self(session_user(parts).await))
    }
}

/// Store `user` as the signed-in user.
///
/// The session id is cycled first so a pre-login id cannot be reused.
///
/// # Errors
///
/// Returns an error if the session cannot be modified.
pub async fn set_current_user(
    session: &Session,
    user: &CurrentUser,
) -> Result<(), tower_sessions::session::Error> {
    session.cycle_id().await?;
    session.insert(session_keys::CURRENT_USER, user).await?;
    set_sentry_user(user.identity.subject.as_str(), user.identity.email.as_deref());
    Ok(())
}

/// Clear the signed-in user (logout).
///
/// # Errors
///
/// Returns an error if the session cannot be modified.
pub async fn clear_current_user(session: &Session) -> Result<(), tower_sessions::session::Error> {
    session
        .remove::<CurrentUser>(session_keys::CURRENT_USER)
        .await?;
    clear_sentry_user();
    Ok(())
}
