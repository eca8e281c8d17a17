//! Core types for Folio.
//!
//! This module provides type-safe wrappers for the portfolio domain.

pub mod auth;
pub mod form;
pub mod id;
pub mod project;
pub mod question;

pub use auth::{AdminPolicy, Identity};
pub use form::{Field, FieldErrors, PLACEHOLDER_IMAGE_URL, ProjectForm, parse_tags};
pub use id::*;
pub use project::{Project, ProjectDraft};
pub use question::{Question, QuestionError};
