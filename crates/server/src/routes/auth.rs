//! Sign-in with the identity provider.
//!
//! - Login: store a CSRF state in the session, redirect to the provider
//! - Callback: check state, exchange the code, store the signed-in user
//! - Logout: clear the signed-in user
//!
//! Any provider account can sign in. Only the admin subject gets further
//! than the login page.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Router,
    extract::{Query, State},
    response::{IntoResponse, Redirect, Response},
    routing::{get, post},
};
use rand::{Rng, distr::Alphanumeric};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use crate::filters;
use crate::middleware::{OptionalUser, clear_current_user, set_current_user};
use crate::models::{CurrentUser, session_keys};
use crate::state::AppState;

use super::NavView;

/// Length of the generated CSRF state.
const OAUTH_TOKEN_LEN: usize = 32;

/// Login page template.
#[derive(Template, WebTemplate)]
#[template(path = "login.html")]
pub struct LoginTemplate {
    pub nav: NavView,
    pub error: Option<&'static str>,
}

#[derive(Debug, Deserialize)]
pub struct LoginQuery {
    pub error: Option<String>,
}

/// Query parameters from the provider callback.
#[derive(Debug, Deserialize)]
pub struct CallbackQuery {
    pub code: Option<String>,
    pub state: Option<String>,
    pub error: Option<String>,
    pub error_description: Option<String>,
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/login", get(login_page))
        .route("/auth/login", get(login))
        .route("/auth/callback", get(callback))
        .route("/auth/logout", post(logout))
}

/// Human message for a `?error=` code.
fn error_message(code: &str) -> &'static str {
    match code {
        "not_authorized" => "This account is not allowed to manage projects.",
        "denied" => "Sign-in was cancelled.",
        "invalid_state" | "missing_state" | "missing_code" => {
            "Sign-in expired or was tampered with. Please try again."
        }
        "session" => "Could not start a session. Please try again.",
        _ => "Sign-in failed. Please try again.",
    }
}

fn random_token() -> String {
    rand::rng()
        .sample_iter(&Alphanumeric)
        .take(OAUTH_TOKEN_LEN)
        .map(char::from)
        .collect()
}

/// `GET /login`
async fn login_page(
    State(state): State<AppState>,
    OptionalUser(user): OptionalUser,
    Query(query): Query<LoginQuery>,
) -> Response {
    LoginTemplate {
        nav: NavView::new(user, state.policy(), "/login"),
        error: query.error.as_deref().map(error_message),
    }
    .into_response()
}

/// `GET /auth/login`
#[instrument(skip(state, session))]
async fn login(State(state): State<AppState>, session: Session) -> Response {
    let oauth_state = random_token();

    if let Err(e) = session.insert(session_keys::OAUTH_STATE, &oauth_state).await {
        tracing::error!("Failed to store OAuth state in session: {}", e);
        return Redirect::to("/login?error=session").into_response();
    }

    let redirect_uri = state.config().oauth_redirect_uri();
    let auth_url = state
        .identity()
        .authorization_url(&redirect_uri, &oauth_state);

    Redirect::to(&auth_url).into_response()
}

/// `GET /auth/callback`
#[instrument(skip_all)]
async fn callback(
    State(state): State<AppState>,
    session: Session,
    Query(query): Query<CallbackQuery>,
) -> Response {
    if let Some(error) = query.error {
        let description = query.error_description.unwrap_or_default();
        tracing::warn!("OAuth error from provider: {} - {}", error, description);
        return Redirect::to("/login?error=denied").into_response();
    }

    let Some(code) = query.code else {
        tracing::warn!("OAuth callback missing code");
        return Redirect::to("/login?error=missing_code").into_response();
    };

    let Some(returned_state) = query.state else {
        tracing::warn!("OAuth callback missing state");
        return Redirect::to("/login?error=missing_state").into_response();
    };

    let stored_state: Option<String> = session
        .remove(session_keys::OAUTH_STATE)
        .await
        .ok()
        .flatten();

    if stored_state.as_ref() != Some(&returned_state) {
        tracing::warn!("OAuth state mismatch");
        return Redirect::to("/login?error=invalid_state").into_response();
    }

    let redirect_uri = state.config().oauth_redirect_uri();
    let identity = match state.identity().exchange_code(&code, &redirect_uri).await {
        Ok(token) => state.identity().fetch_identity(&token).await,
        Err(e) => Err(e),
    };
    let identity = match identity {
        Ok(identity) => identity,
        Err(e) => {
            tracing::error!("Failed to complete sign-in: {}", e);
            return Redirect::to("/login?error=token_exchange").into_response();
        }
    };

    let user = CurrentUser::new(identity);
    let is_admin = user.is_admin(state.policy());
    if let Err(e) = set_current_user(&session, &user).await {
        tracing::error!("Failed to store signed-in user: {}", e);
        return Redirect::to("/login?error=session").into_response();
    }

    tracing::info!(subject = %user.identity.subject, is_admin, "User signed in");

    if is_admin {
        Redirect::to("/admin").into_response()
    } else {
        Redirect::to("/login?error=not_authorized").into_response()
    }
}

/// `POST /auth/logout`
async fn logout(session: Session) -> impl IntoResponse {
    if let Err(e) = clear_current_user(&session).await {
        tracing::warn!("Failed to clear session user: {}", e);
    }
    Redirect::to("/")
}
