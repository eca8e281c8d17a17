//! Business logic services.
//!
//! # Services
//!
//! - `projects` - Project CRUD with admin enforcement
//! - `admin_panel` - Admin list/form state machine
//! - `assistant` - Visitor questions answered by Claude with the project tool
//! - `drafting` - Tagline and description suggestions for the admin form

pub mod admin_panel;
pub mod assistant;
pub mod drafting;
pub mod projects;

pub use admin_panel::{AdminPanel, FormMode, FormState, Notice, SubmitOutcome};
pub use assistant::{AssistantService, FALLBACK_ANSWER};
pub use drafting::{DraftingError, DraftingService, ImprovedDescription};
pub use projects::{ProjectError, ProjectService};
