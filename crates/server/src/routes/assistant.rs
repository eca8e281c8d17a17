//! Assistant chat page and question endpoint.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Json, Router,
    extract::State,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use serde::{Deserialize, Serialize};
use tracing::instrument;

use folio_core::Question;

use crate::error::AppError;
use crate::filters;
use crate::middleware::OptionalUser;
use crate::profile::Profile;
use crate::state::AppState;

use super::NavView;

/// Chat page template. History lives in the browser only.
#[derive(Template, WebTemplate)]
#[template(path = "assistant.html")]
pub struct AssistantTemplate<'a> {
    pub nav: NavView,
    pub profile: &'a Profile,
}

#[derive(Debug, Deserialize)]
pub struct AskRequest {
    #[serde(default)]
    pub question: String,
}

#[derive(Debug, Serialize)]
pub struct AskResponse {
    pub answer: String,
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/ai", get(page))
        .route("/api/ask", post(ask))
}

async fn page(State(state): State<AppState>, OptionalUser(user): OptionalUser) -> Response {
    AssistantTemplate {
        nav: NavView::new(user, state.policy(), "/ai"),
        profile: state.profile(),
    }
    .into_response()
}

/// Answer a visitor question.
///
/// Blank questions are rejected with 400; everything after that returns 200,
/// with the fallback answer standing in for failures.
#[instrument(skip(state, request))]
async fn ask(State(state): State<AppState>, Json(request): Json<AskRequest>) -> Response {
    let question = match Question::parse(&request.question) {
        Ok(question) => question,
        Err(e) => return AppError::BadRequest(e.to_string()).into_json_response(),
    };

    let answer = state.assistant().answer(&question).await;
    Json(AskResponse { answer }).into_response()
}
