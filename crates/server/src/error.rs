//! Unified error handling for HTTP handlers.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

use crate::claude::ClaudeError;
use crate::identity::IdentityError;
use crate::services::{DraftingError, ProjectError};

/// Application-level error type.
#[derive(Debug, Error)]
pub enum AppError {
    /// Project service failed.
    #[error("Project error: {0}")]
    Project(#[from] ProjectError),

    /// Claude API operation failed.
    #[error("Claude error: {0}")]
    Claude(#[from] ClaudeError),

    /// Sign-in with the identity provider failed.
    #[error("Identity provider error: {0}")]
    Identity(#[from] IdentityError),

    /// Tagline or description suggestion failed.
    #[error("Drafting error: {0}")]
    Drafting(#[from] DraftingError),

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// User is not authenticated.
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// User lacks permission.
    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// Bad request from client.
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Internal server error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// HTTP status for this error.
    #[must_use]
    pub const fn status(&self) -> StatusCode {
        match self {
            Self::Project(ProjectError::Forbidden) | Self::Forbidden(_) => StatusCode::FORBIDDEN,
            Self::Project(ProjectError::NotFound) | Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Drafting(DraftingError::MissingInput(_)) | Self::BadRequest(_) => {
                StatusCode::BAD_REQUEST
            }
            Self::Claude(_) | Self::Identity(_) | Self::Drafting(_) => StatusCode::BAD_GATEWAY,
            Self::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            Self::Project(ProjectError::Store(_)) | Self::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// Message safe to show a client.
    fn public_message(&self) -> String {
        match self {
            Self::Project(ProjectError::Store(_)) | Self::Internal(_) => {
                "Internal server error".to_string()
            }
            Self::Claude(_) | Self::Drafting(_) if self.status() == StatusCode::BAD_GATEWAY => {
                "AI service error, please try again".to_string()
            }
            Self::Identity(_) => "Sign-in failed".to_string(),
            _ => self.to_string(),
        }
    }

    /// Render as `{"error": "..."}` for JSON endpoints.
    #[must_use]
    pub fn into_json_response(self) -> Response {
        self.report();
        let status = self.status();
        (status, Json(json!({ "error": self.public_message() }))).into_response()
    }

    fn report(&self) {
        if self.status().is_server_error() {
            let event_id = sentry::capture_error(self);
            tracing::error!(
                error = %self,
                sentry_event_id = %event_id,
                "Request error"
            );
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        self.report();
        (self.status(), self.public_message()).into_response()
    }
}

/// Set the Sentry user context from the signed-in subject.
pub fn set_sentry_user(subject: &str, email: Option<&str>) {
    sentry::configure_scope(|scope| {
        scope.set_user(Some(sentry::User {
            id: Some(subject.to_string()),
            email: email.map(String::from),
            ..Default::default()
        }));
    });
}

/// Clear the Sentry user context.
pub fn clear_sentry_user() {
    sentry::configure_scope(|scope| {
        scope.set_user(None);
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::StoreError;

    #[test]
    fn test_app_error_display() {
        let err = AppError::NotFound("project-123".to_string());
        assert_eq!(err.to_string(), "Not found: project-123");

        let err = AppError::BadRequest("invalid input".to_string());
        assert_eq!(err.to_string(), "Bad request: invalid input");
    }

    #[test]
    fn test_app_error_status_codes() {
        fn get_status(err: AppError) -> StatusCode {
            err.into_response().status()
        }

        assert_eq!(
            get_status(AppError::Project(ProjectError::Forbidden)),
            StatusCode::FORBIDDEN
        );
        assert_eq!(
            get_status(AppError::Project(ProjectError::NotFound)),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            get_status(AppError::Project(ProjectError::Store(StoreError::Backend(
                "down".to_string()
            )))),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            get_status(AppError::Drafting(DraftingError::MissingInput("title"))),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            get_status(AppError::Drafting(DraftingError::Parse("x".to_string()))),
            StatusCode::BAD_GATEWAY
        );
        assert_eq!(
            get_status(AppError::Unauthorized("test".to_string())),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            get_status(AppError::BadRequest("test".to_string())),
            StatusCode::BAD_REQUEST
        );
    }

    #[test]
    fn test_internal_details_hidden() {
        let err = AppError::Internal("connection string leaked".to_string());
        assert_eq!(err.public_message(), "Internal server error");

        let err = AppError::Drafting(DraftingError::MissingInput("description"));
        assert_eq!(
            err.public_message(),
            "Drafting error: description is required"
        );
    }
}
