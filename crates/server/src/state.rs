//! Application state shared across handlers.

use std::sync::Arc;

use crate::claude::{ClaudeClient, ClaudeError};
use crate::config::SiteConfig;
use crate::identity::{IdentityClient, IdentityError};
use crate::profile::Profile;
use crate::services::{AssistantService, DraftingService, ProjectService};
use crate::store::ProjectStore;

use folio_core::AdminPolicy;

/// Error building application state.
#[derive(Debug, thiserror::Error)]
pub enum AppStateError {
    #[error("failed to build Claude client: {0}")]
    Claude(#[from] ClaudeError),
    #[error("failed to build identity client: {0}")]
    Identity(#[from] IdentityError),
}

/// Application state shared across all handlers.
///
/// Cheaply cloneable via `Arc`; nothing in it changes after startup.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: SiteConfig,
    profile: Arc<Profile>,
    projects: ProjectService,
    assistant: AssistantService,
    drafting: DraftingService,
    identity: IdentityClient,
}

impl AppState {
    /// Wire services over `store`.
    ///
    /// # Errors
    ///
    /// Returns an error if an HTTP client cannot be built.
    pub fn new(
        config: SiteConfig,
        store: Arc<dyn ProjectStore>,
        profile: Profile,
    ) -> Result<Self, AppStateError> {
        let profile = Arc::new(profile);
        let policy = AdminPolicy::new(config.admin_subject.clone());
        let projects = ProjectService::new(store, policy);
        let claude = ClaudeClient::new(&config.claude)?;
        let assistant = AssistantService::new(claude.clone(), projects.clone(), profile.clone());
        let drafting = DraftingService::new(claude);
        let identity = IdentityClient::new(&config.oauth)?;

        Ok(Self {
            inner: Arc::new(AppStateInner {
                config,
                profile,
                projects,
                assistant,
                drafting,
                identity,
            }),
        })
    }

    #[must_use]
    pub fn config(&self) -> &SiteConfig {
        &self.inner.config
    }

    #[must_use]
    pub fn profile(&self) -> &Profile {
        &self.inner.profile
    }

    #[must_use]
    pub fn projects(&self) -> &ProjectService {
        &self.inner.projects
    }

    #[must_use]
    pub fn assistant(&self) -> &AssistantService {
        &self.inner.assistant
    }

    #[must_use]
    pub fn drafting(&self) -> &DraftingService {
        &self.inner.drafting
    }

    #[must_use]
    pub fn identity(&self) -> &IdentityClient {
        &self.inner.identity
    }

    /// The single-admin rule.
    #[must_use]
    pub fn policy(&self) -> &AdminPolicy {
        self.inner.projects.policy()
    }
}
