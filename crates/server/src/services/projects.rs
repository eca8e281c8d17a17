//! Authorizing access to the project store.
//!
//! Every mutation goes through [`ProjectService`], which checks the
//! [`AdminPolicy`] before the store is touched. Route extractors redirect
//! non-admins earlier, but this check does not rely on them.

use std::sync::Arc;

use thiserror::Error;
use tracing::{info, instrument, warn};

use folio_core::{AdminPolicy, Identity, Project, ProjectDraft, ProjectId};

use crate::store::{ProjectStore, StoreError};

/// Errors returned by project operations.
#[derive(Debug, Error)]
pub enum ProjectError {
    /// The caller is not the configured admin.
    #[error("not authorized to modify projects")]
    Forbidden,

    /// No project with that id.
    #[error("project not found")]
    NotFound,

    /// Backing store failed.
    #[error("store error: {0}")]
    Store(#[source] StoreError),
}

impl From<StoreError> for ProjectError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound => Self::NotFound,
            other => Self::Store(other),
        }
    }
}

/// Project CRUD with admin enforcement.
#[derive(Clone)]
pub struct ProjectService {
    store: Arc<dyn ProjectStore>,
    policy: AdminPolicy,
}

impl ProjectService {
    #[must_use]
    pub fn new(store: Arc<dyn ProjectStore>, policy: AdminPolicy) -> Self {
        Self { store, policy }
    }

    /// The admin policy this service enforces.
    #[must_use]
    pub const fn policy(&self) -> &AdminPolicy {
        &self.policy
    }

    /// List every project. Public; no identity required.
    ///
    /// # Errors
    ///
    /// Returns `ProjectError::Store` if the store cannot be read.
    #[instrument(skip(self))]
    pub async fn list_projects(&self) -> Result<Vec<Project>, ProjectError> {
        Ok(self.store.list().await?)
    }

    /// Find one project by id.
    ///
    /// # Errors
    ///
    /// Returns `ProjectError::NotFound` if no project has this id.
    pub async fn get_project(&self, id: &ProjectId) -> Result<Project, ProjectError> {
        self.list_projects()
            .await?
            .into_iter()
            .find(|p| &p.id == id)
            .ok_or(ProjectError::NotFound)
    }

    /// Create a project as `identity`.
    ///
    /// # Errors
    ///
    /// Returns `ProjectError::Forbidden` for non-admins, or a store error.
    #[instrument(skip(self, identity, draft), fields(subject = %identity.subject, title = %draft.title))]
    pub async fn create_project(
        &self,
        identity: &Identity,
        draft: ProjectDraft,
    ) -> Result<Project, ProjectError> {
        self.authorize(identity)?;
        let project = self.store.create(draft).await?;
        info!(project_id = %project.id, "Project created");
        Ok(project)
    }

    /// Replace every field of project `id` as `identity`.
    ///
    /// # Errors
    ///
    /// Returns `ProjectError::Forbidden` for non-admins,
    /// `ProjectError::NotFound` if `id` does not exist, or a store error.
    #[instrument(skip(self, identity, draft), fields(subject = %identity.subject, project_id = %id))]
    pub async fn update_project(
        &self,
        identity: &Identity,
        id: &ProjectId,
        draft: ProjectDraft,
    ) -> Result<(), ProjectError> {
        self.authorize(identity)?;
        self.store.update(id, draft).await?;
        info!("Project updated");
        Ok(())
    }

    /// Delete project `id` as `identity`. Deleting a missing id succeeds.
    ///
    /// # Errors
    ///
    /// Returns `ProjectError::Forbidden` for non-admins, or a store error.
    #[instrument(skip(self, identity), fields(subject = %identity.subject, project_id = %id))]
    pub async fn delete_project(
        &self,
        identity: &Identity,
        id: &ProjectId,
    ) -> Result<(), ProjectError> {
        self.authorize(identity)?;
        self.store.delete(id).await?;
        info!("Project deleted");
        Ok(())
    }

    fn authorize(&self, identity: &Identity) -> Result<(), ProjectError> {
        if self.policy.is_authorized(Some(identity)) {
            Ok(())
        } else {
            warn!(subject = %identity.subject, "Rejected project mutation from non-admin");
            Err(ProjectError::Forbidden)
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
pub(crate) mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;
    use folio_core::{ProjectForm, SubjectId};

    use super::*;
    use crate::store::MemoryStore;

    /// Memory store that counts calls, to prove a path never reached storage.
    #[derive(Default)]
    pub(crate) struct CountingStore {
        inner: MemoryStore,
        pub(crate) calls: AtomicUsize,
    }

    impl CountingStore {
        pub(crate) fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl ProjectStore for CountingStore {
        async fn list(&self) -> Result<Vec<Project>, StoreError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.inner.list().await
        }

        async fn create(&self, draft: ProjectDraft) -> Result<Project, StoreError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.inner.create(draft).await
        }

        async fn update(&self, id: &ProjectId, draft: ProjectDraft) -> Result<(), StoreError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.inner.update(id, draft).await
        }

        async fn delete(&self, id: &ProjectId) -> Result<(), StoreError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.inner.delete(id).await
        }
    }

    pub(crate) fn identity(subject: &str) -> Identity {
        Identity {
            subject: SubjectId::new(subject),
            name: "Aditya Raj".to_string(),
            email: Some("ccidcop@gmail.com".to_string()),
            photo_url: None,
        }
    }

    pub(crate) fn form(title: &str) -> ProjectForm {
        ProjectForm {
            title: title.to_string(),
            description: format!("About {title}"),
            tagline: String::new(),
            live_url: "https://live.example.net/".to_string(),
            github_url: "https://github.com/adibxr/demo".to_string(),
            tags: "Rust, Axum".to_string(),
            ..ProjectForm::default()
        }
    }

    fn draft(title: &str) -> ProjectDraft {
        form(title).validate().unwrap()
    }

    fn service() -> (ProjectService, Arc<CountingStore>) {
        let store = Arc::new(CountingStore::default());
        let service = ProjectService::new(
            store.clone(),
            AdminPolicy::new(SubjectId::new("admin-uid")),
        );
        (service, store)
    }

    #[tokio::test]
    async fn test_create_then_list() {
        let (service, _) = service();
        let admin = identity("admin-uid");

        let created = service.create_project(&admin, draft("DevCard")).await.unwrap();
        let projects = service.list_projects().await.unwrap();

        assert_eq!(projects.len(), 1);
        assert_eq!(projects[0], created);
        assert!(!created.id.is_empty());
    }

    #[tokio::test]
    async fn test_update_changes_only_target() {
        let (service, _) = service();
        let admin = identity("admin-uid");
        let a = service.create_project(&admin, draft("A")).await.unwrap();
        let b = service.create_project(&admin, draft("B")).await.unwrap();

        service
            .update_project(&admin, &a.id, draft("A2"))
            .await
            .unwrap();

        assert_eq!(service.get_project(&a.id).await.unwrap().title, "A2");
        assert_eq!(service.get_project(&b.id).await.unwrap(), b);
    }

    #[tokio::test]
    async fn test_update_missing_is_not_found() {
        let (service, _) = service();
        let err = service
            .update_project(&identity("admin-uid"), &ProjectId::new("nope"), draft("X"))
            .await
            .unwrap_err();
        assert!(matches!(err, ProjectError::NotFound));
    }

    #[tokio::test]
    async fn test_delete_twice_is_ok() {
        let (service, _) = service();
        let admin = identity("admin-uid");
        let a = service.create_project(&admin, draft("A")).await.unwrap();

        service.delete_project(&admin, &a.id).await.unwrap();
        service.delete_project(&admin, &a.id).await.unwrap();
        assert!(service.list_projects().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_non_admin_mutations_are_forbidden_without_store_calls() {
        let (service, store) = service();
        let visitor = identity("visitor-uid");
        let id = ProjectId::new("any");

        let create = service.create_project(&visitor, draft("X")).await;
        let update = service.update_project(&visitor, &id, draft("X")).await;
        let delete = service.delete_project(&visitor, &id).await;

        assert!(matches!(create, Err(ProjectError::Forbidden)));
        assert!(matches!(update, Err(ProjectError::Forbidden)));
        assert!(matches!(delete, Err(ProjectError::Forbidden)));
        assert_eq!(store.calls(), 0);
    }
}
