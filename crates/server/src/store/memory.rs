//! In-process project store.

use async_trait::async_trait;
use tokio::sync::RwLock;
use uuid::Uuid;

use folio_core::{Project, ProjectDraft, ProjectId};

use super::{ProjectStore, StoreError};

/// Projects held in memory, in insertion order.
///
/// Contents are lost on restart.
#[derive(Debug, Default)]
pub struct MemoryStore {
    projects: RwLock<Vec<Project>>,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ProjectStore for MemoryStore {
    async fn list(&self) -> Result<Vec<Project>, StoreError> {
        Ok(self.projects.read().await.clone())
    }

    async fn create(&self, draft: ProjectDraft) -> Result<Project, StoreError> {
        let project = draft.with_id(ProjectId::new(Uuid::new_v4().to_string()));
        self.projects.write().await.push(project.clone());
        Ok(project)
    }

    async fn update(&self, id: &ProjectId, draft: ProjectDraft) -> Result<(), StoreError> {
        let mut projects = self.projects.write().await;
        let slot = projects
            .iter_mut()
            .find(|p| &p.id == id)
            .ok_or(StoreError::NotFound)?;
        *slot = draft.with_id(id.clone());
        Ok(())
    }

    async fn delete(&self, id: &ProjectId) -> Result<(), StoreError> {
        self.projects.write().await.retain(|p| &p.id != id);
        Ok(())
    }
}
