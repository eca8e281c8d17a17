//! Admin project management.
//!
//! Each request rebuilds an [`AdminPanel`] from the store, drives it through
//! one transition and renders the state it ends in. Successful writes
//! redirect (303) back to the table with a notice code so a refresh cannot
//! resubmit.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form, Json, Router,
    extract::{Path, Query, State},
    response::{IntoResponse, Redirect, Response},
    routing::{get, post},
};
use serde::{Deserialize, Serialize};
use tracing::instrument;

use folio_core::{FieldErrors, Project, ProjectForm, ProjectId};

use crate::error::AppError;
use crate::filters;
use crate::middleware::RequireAdmin;
use crate::models::CurrentUser;
use crate::services::{
    AdminPanel, FormMode, FormState, ImprovedDescription, Notice, ProjectError, SubmitOutcome,
};
use crate::state::AppState;

use super::NavView;

/// An open project form, ready for the template.
#[derive(Debug, Clone)]
pub struct FormView {
    pub heading: &'static str,
    pub action: String,
    pub submit_label: &'static str,
    pub draft: ProjectForm,
    pub errors: FieldErrors,
}

impl FormView {
    fn from_state(state: &FormState) -> Option<Self> {
        let FormState::Open {
            mode,
            draft,
            errors,
        } = state
        else {
            return None;
        };

        let (heading, action, submit_label) = match mode {
            FormMode::Create => ("Add Project", "/admin/projects".to_string(), "Add Project"),
            FormMode::Edit(id) => (
                "Edit Project",
                format!("/admin/projects/{id}"),
                "Save Changes",
            ),
        };

        Some(Self {
            heading,
            action,
            submit_label,
            draft: draft.clone(),
            errors: errors.clone(),
        })
    }

    /// Error for a form field, by input name.
    #[must_use]
    pub fn error(&self, name: &str) -> Option<&str> {
        self.errors.for_name(name)
    }
}

/// Project table, with the form open when there is one.
#[derive(Template, WebTemplate)]
#[template(path = "admin/index.html")]
pub struct AdminIndexTemplate {
    pub nav: NavView,
    pub projects: Vec<Project>,
    pub form: Option<FormView>,
    pub notice: Option<Notice>,
}

impl AdminIndexTemplate {
    fn new(user: CurrentUser, state: &AppState, panel: &AdminPanel) -> Self {
        Self {
            nav: NavView::new(Some(user), state.policy(), "/admin"),
            projects: panel.projects().to_vec(),
            form: FormView::from_state(panel.form()),
            notice: panel.notice().cloned(),
        }
    }
}

/// Delete confirmation page.
#[derive(Template, WebTemplate)]
#[template(path = "admin/confirm_delete.html")]
pub struct ConfirmDeleteTemplate {
    pub nav: NavView,
    pub project: Project,
}

#[derive(Debug, Deserialize)]
pub struct NoticeQuery {
    pub notice: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct TaglineRequest {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
}

#[derive(Debug, Serialize)]
pub struct TaglineResponse {
    pub tagline: String,
}

#[derive(Debug, Deserialize)]
pub struct ImproveDescriptionRequest {
    #[serde(default)]
    pub description: String,
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/admin", get(index))
        .route("/admin/projects", post(create))
        .route("/admin/projects/new", get(new_form))
        .route("/admin/projects/{id}", post(update))
        .route("/admin/projects/{id}/edit", get(edit_form))
        .route(
            "/admin/projects/{id}/delete",
            get(confirm_delete).post(delete),
        )
        .route("/admin/api/tagline", post(suggest_tagline))
        .route("/admin/api/improve-description", post(improve_description))
}

/// Success notice for a redirect code. Unknown codes show nothing.
fn notice_for_code(code: &str) -> Option<Notice> {
    let message = match code {
        "added" => "Project added.",
        "updated" => "Project updated.",
        "deleted" => "Project deleted.",
        _ => return None,
    };
    Some(Notice::Success(message.to_string()))
}

/// Load the panel from the store.
async fn load_panel(state: &AppState) -> Result<AdminPanel, ProjectError> {
    AdminPanel::load(state.projects())
        .await
        .inspect_err(|e| tracing::error!(error = %e, "Failed to load projects for admin"))
}

/// Load the panel; a store failure yields an empty table with an error notice.
async fn load_panel_or_notice(state: &AppState) -> AdminPanel {
    load_panel(state).await.unwrap_or_else(|_| {
        let mut panel = AdminPanel::from_projects(Vec::new());
        panel.set_notice(Notice::Error(
            "Could not load projects. Please try again.".to_string(),
        ));
        panel
    })
}

/// `GET /admin`
#[instrument(skip(admin, state))]
async fn index(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
    Query(query): Query<NoticeQuery>,
) -> Response {
    let mut panel = load_panel_or_notice(&state).await;
    if panel.notice().is_none()
        && let Some(notice) = query.notice.as_deref().and_then(notice_for_code)
    {
        panel.set_notice(notice);
    }
    AdminIndexTemplate::new(admin, &state, &panel).into_response()
}

/// `GET /admin/projects/new`
async fn new_form(RequireAdmin(admin): RequireAdmin, State(state): State<AppState>) -> Response {
    let mut panel = load_panel_or_notice(&state).await;
    panel.open_create();
    AdminIndexTemplate::new(admin, &state, &panel).into_response()
}

/// `POST /admin/projects`
#[instrument(skip(admin, state, input))]
async fn create(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
    Form(input): Form<ProjectForm>,
) -> Response {
    let mut panel = load_panel_or_notice(&state).await;
    panel.open_create();
    let outcome = panel
        .submit(state.projects(), &admin.identity, input)
        .await;
    finish_submit(admin, &state, &panel, outcome, "added")
}

/// `GET /admin/projects/{id}/edit`
async fn edit_form(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
    Path(id): Path<ProjectId>,
) -> Result<Response, AppError> {
    let mut panel = load_panel(&state).await?;
    panel.open_edit(&id)?;
    Ok(AdminIndexTemplate::new(admin, &state, &panel).into_response())
}

/// `POST /admin/projects/{id}`
#[instrument(skip(admin, state, input))]
async fn update(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
    Path(id): Path<ProjectId>,
    Form(input): Form<ProjectForm>,
) -> Result<Response, AppError> {
    let mut panel = match load_panel(&state).await {
        Ok(panel) => panel,
        Err(e) => {
            // The row cannot be checked, so nothing is written; the draft survives.
            let mut panel = AdminPanel::from_projects(Vec::new());
            panel.hold_draft(FormMode::Edit(id), input, &e);
            return Ok(AdminIndexTemplate::new(admin, &state, &panel).into_response());
        }
    };
    panel.open_edit(&id)?;
    let outcome = panel
        .submit(state.projects(), &admin.identity, input)
        .await;
    Ok(finish_submit(admin, &state, &panel, outcome, "updated"))
}

fn finish_submit(
    admin: CurrentUser,
    state: &AppState,
    panel: &AdminPanel,
    outcome: SubmitOutcome,
    notice_code: &str,
) -> Response {
    match outcome {
        SubmitOutcome::Saved => {
            Redirect::to(&format!("/admin?notice={notice_code}")).into_response()
        }
        SubmitOutcome::Invalid | SubmitOutcome::Failed | SubmitOutcome::NoForm => {
            AdminIndexTemplate::new(admin, state, panel).into_response()
        }
    }
}

/// `GET /admin/projects/{id}/delete`
async fn confirm_delete(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
    Path(id): Path<ProjectId>,
) -> Result<Response, AppError> {
    let project = state.projects().get_project(&id).await?;
    Ok(ConfirmDeleteTemplate {
        nav: NavView::new(Some(admin), state.policy(), "/admin"),
        project,
    }
    .into_response())
}

/// `POST /admin/projects/{id}/delete`
#[instrument(skip(admin, state))]
async fn delete(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
    Path(id): Path<ProjectId>,
) -> Response {
    let mut panel = load_panel_or_notice(&state).await;
    if panel.delete(state.projects(), &admin.identity, &id).await {
        Redirect::to("/admin?notice=deleted").into_response()
    } else {
        AdminIndexTemplate::new(admin, &state, &panel).into_response()
    }
}

/// `POST /admin/api/tagline`
#[instrument(skip_all)]
async fn suggest_tagline(
    RequireAdmin(_admin): RequireAdmin,
    State(state): State<AppState>,
    Json(request): Json<TaglineRequest>,
) -> Response {
    match state
        .drafting()
        .suggest_tagline(&request.title, &request.description)
        .await
    {
        Ok(tagline) => Json(TaglineResponse { tagline }).into_response(),
        Err(e) => AppError::from(e).into_json_response(),
    }
}

/// `POST /admin/api/improve-description`
#[instrument(skip_all)]
async fn improve_description(
    RequireAdmin(_admin): RequireAdmin,
    State(state): State<AppState>,
    Json(request): Json<ImproveDescriptionRequest>,
) -> Response {
    match state
        .drafting()
        .improve_description(&request.description)
        .await
    {
        Ok(improved) => Json::<ImprovedDescription>(improved).into_response(),
        Err(e) => AppError::from(e).into_json_response(),
    }
}
