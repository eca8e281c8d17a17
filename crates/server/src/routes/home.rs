//! Public home page.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Router,
    extract::State,
    response::{IntoResponse, Response},
    routing::get,
};
use tracing::instrument;

use folio_core::Project;

use crate::filters;
use crate::middleware::OptionalUser;
use crate::profile::Profile;
use crate::state::AppState;

use super::NavView;

/// Home page template.
#[derive(Template, WebTemplate)]
#[template(path = "home.html")]
pub struct HomeTemplate<'a> {
    pub nav: NavView,
    pub profile: &'a Profile,
    pub projects: Vec<Project>,
    pub load_failed: bool,
}

pub fn router() -> Router<AppState> {
    Router::new().route("/", get(index))
}

/// Render the biography and project cards.
///
/// A store failure still renders the page, without projects.
#[instrument(skip(state, user))]
async fn index(State(state): State<AppState>, OptionalUser(user): OptionalUser) -> Response {
    let (projects, load_failed) = match state.projects().list_projects().await {
        Ok(projects) => (projects, false),
        Err(e) => {
            tracing::error!(error = %e, "Failed to load projects for home page");
            (Vec::new(), true)
        }
    };

    HomeTemplate {
        nav: NavView::new(user, state.policy(), "/"),
        profile: state.profile(),
        projects,
        load_failed,
    }
    .into_response()
}
