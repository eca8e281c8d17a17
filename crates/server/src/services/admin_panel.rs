//! Admin panel state machine.
//!
//! The panel moves through these states:
//!
//! ```text
//! load ──► list-ready ──open_create/open_edit──► form-open
//!              ▲                                    │
//!              └──── submit ok / close_form ────────┘
//! ```
//!
//! A submit that fails validation or storage stays in form-open with the
//! draft intact. The state is independent of any rendering; routes rebuild a
//! panel per request and render whatever state it ends in.

use tracing::{info, warn};

use folio_core::{FieldErrors, Identity, Project, ProjectForm, ProjectId};

use super::projects::{ProjectError, ProjectService};

/// What the open form will do on submit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormMode {
    Create,
    Edit(ProjectId),
}

/// Whether the project form is showing, and with what.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormState {
    Closed,
    Open {
        mode: FormMode,
        draft: ProjectForm,
        errors: FieldErrors,
    },
}

/// Transient message shown above the table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notice {
    Success(String),
    Error(String),
}

impl Notice {
    #[must_use]
    pub fn message(&self) -> &str {
        match self {
            Self::Success(m) | Self::Error(m) => m,
        }
    }

    #[must_use]
    pub const fn is_error(&self) -> bool {
        matches!(self, Self::Error(_))
    }
}

/// Result of [`AdminPanel::submit`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitOutcome {
    /// Stored; form closed.
    Saved,
    /// Validation failed; the store was not called.
    Invalid,
    /// The store rejected the change; form still open.
    Failed,
    /// There was no open form to submit.
    NoForm,
}

/// Admin list plus form state.
#[derive(Debug, Clone)]
pub struct AdminPanel {
    projects: Vec<Project>,
    form: FormState,
    notice: Option<Notice>,
}

impl AdminPanel {
    /// Load the project list (list-loading → list-ready).
    ///
    /// # Errors
    ///
    /// Returns `ProjectError` if the store cannot be read.
    pub async fn load(service: &ProjectService) -> Result<Self, ProjectError> {
        Ok(Self::from_projects(service.list_projects().await?))
    }

    /// A ready panel over an already-loaded list.
    #[must_use]
    pub const fn from_projects(projects: Vec<Project>) -> Self {
        Self {
            projects,
            form: FormState::Closed,
            notice: None,
        }
    }

    #[must_use]
    pub fn projects(&self) -> &[Project] {
        &self.projects
    }

    #[must_use]
    pub const fn form(&self) -> &FormState {
        &self.form
    }

    #[must_use]
    pub const fn notice(&self) -> Option<&Notice> {
        self.notice.as_ref()
    }

    pub fn set_notice(&mut self, notice: Notice) {
        self.notice = Some(notice);
    }

    /// Open an empty create form.
    pub fn open_create(&mut self) {
        self.form = FormState::Open {
            mode: FormMode::Create,
            draft: ProjectForm::default(),
            errors: FieldErrors::new(),
        };
    }

    /// Open the edit form pre-filled from project `id`.
    ///
    /// # Errors
    ///
    /// Returns `ProjectError::NotFound` if `id` is not in the loaded list;
    /// the form state is left unchanged.
    pub fn open_edit(&mut self, id: &ProjectId) -> Result<(), ProjectError> {
        let project = self
            .projects
            .iter()
            .find(|p| &p.id == id)
            .ok_or(ProjectError::NotFound)?;

        self.form = FormState::Open {
            mode: FormMode::Edit(id.clone()),
            draft: ProjectForm::from(project),
            errors: FieldErrors::new(),
        };
        Ok(())
    }

    pub fn close_form(&mut self) {
        self.form = FormState::Closed;
    }

    /// Submit `input` through the open form.
    ///
    /// Validation runs first; the service is only called with a valid draft.
    pub async fn submit(
        &mut self,
        service: &ProjectService,
        identity: &Identity,
        input: ProjectForm,
    ) -> SubmitOutcome {
        let FormState::Open { mode, .. } = &self.form else {
            return SubmitOutcome::NoForm;
        };
        let mode = mode.clone();

        let draft = match input.validate() {
            Ok(draft) => draft,
            Err(errors) => {
                self.form = FormState::Open {
                    mode,
                    draft: input,
                    errors,
                };
                return SubmitOutcome::Invalid;
            }
        };

        let result = match &mode {
            FormMode::Create => service
                .create_project(identity, draft)
                .await
                .map(|project| {
                    self.projects.push(project);
                    "Project added."
                }),
            FormMode::Edit(id) => service
                .update_project(identity, id, draft.clone())
                .await
                .map(|()| {
                    if let Some(slot) = self.projects.iter_mut().find(|p| &p.id == id) {
                        *slot = draft.with_id(id.clone());
                    }
                    "Project updated."
                }),
        };

        match result {
            Ok(message) => {
                info!(?mode, "Admin form saved");
                self.form = FormState::Closed;
                self.notice = Some(Notice::Success(message.to_string()));
                SubmitOutcome::Saved
            }
            Err(e) => {
                warn!(error = %e, ?mode, "Admin form save failed");
                self.hold_draft(mode, input, &e);
                SubmitOutcome::Failed
            }
        }
    }

    /// Keep `draft` open in `mode` after `err`, with an error notice.
    ///
    /// Used when a submit cannot proceed, including when the list itself
    /// could not be read and the row to edit is unknown.
    pub fn hold_draft(&mut self, mode: FormMode, draft: ProjectForm, err: &ProjectError) {
        self.form = FormState::Open {
            mode,
            draft,
            errors: FieldErrors::new(),
        };
        self.notice = Some(Notice::Error(failure_message(err)));
    }

    /// Delete project `id`; on success the row leaves the list.
    ///
    /// Returns whether the delete succeeded. Failures set an error notice.
    pub async fn delete(
        &mut self,
        service: &ProjectService,
        identity: &Identity,
        id: &ProjectId,
    ) -> bool {
        match service.delete_project(identity, id).await {
            Ok(()) => {
                self.projects.retain(|p| &p.id != id);
                self.notice = Some(Notice::Success("Project deleted.".to_string()));
                true
            }
            Err(e) => {
                warn!(error = %e, project_id = %id, "Admin delete failed");
                self.notice = Some(Notice::Error(failure_message(&e)));
                false
            }
        }
    }
}

fn failure_message(err: &ProjectError) -> String {
    match err {
        ProjectError::Forbidden => "You are not allowed to change projects.".to_string(),
        ProjectError::NotFound => "That project no longer exists.".to_string(),
        ProjectError::Store(_) => "Could not save changes. Please try again.".to_string(),
    }
}
