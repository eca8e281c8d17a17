//! HTTP route handlers.
//!
//! # Route Structure
//!
//! ```text
//! # Public
//! GET  /                                profile and project cards
//! GET  /ai                              assistant chat page
//! POST /api/ask                         {question} -> {answer}
//!
//! # Auth
//! GET  /login                           login page
//! GET  /auth/login                      redirect to the identity provider
//! GET  /auth/callback                   provider callback
//! POST /auth/logout                     sign out
//!
//! # Admin (RequireAdmin)
//! GET  /admin                           project table
//! GET  /admin/projects/new              table + create form
//! POST /admin/projects                  create
//! GET  /admin/projects/{id}/edit        table + edit form
//! POST /admin/projects/{id}             update
//! GET  /admin/projects/{id}/delete      confirm delete
//! POST /admin/projects/{id}/delete      delete
//! POST /admin/api/tagline               suggest a tagline
//! POST /admin/api/improve-description   rewrite a description
//! ```

use axum::Router;

use folio_core::AdminPolicy;

use crate::models::CurrentUser;
use crate::state::AppState;

pub mod admin;
pub mod assistant;
pub mod auth;
pub mod home;

/// All page and API routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .merge(home::router())
        .merge(assistant::router())
        .merge(auth::router())
        .merge(admin::router())
}

/// Header navigation state shared by every page.
#[derive(Debug, Clone)]
pub struct NavView {
    pub user: Option<CurrentUser>,
    pub is_admin: bool,
    pub current_path: &'static str,
}

impl NavView {
    #[must_use]
    pub fn new(user: Option<CurrentUser>, policy: &AdminPolicy, current_path: &'static str) -> Self {
        let is_admin = user.as_ref().is_some_and(|u| u.is_admin(policy));
        Self {
            user,
            is_admin,
            current_path,
        }
    }
}
