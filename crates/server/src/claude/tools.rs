//! Tool definitions and executor for Claude tool use.
//!
//! The assistant gets exactly one tool, `list_projects`, so it can answer
//! from the live project list instead of a stale copy in the prompt.

use serde::Serialize;
use serde_json::json;
use tracing::instrument;

use folio_core::Project;

use crate::services::ProjectService;

use super::error::ClaudeError;
use super::types::Tool;

/// Name of the project listing tool.
pub const LIST_PROJECTS_TOOL: &str = "list_projects";

/// Get the tools available to the assistant.
#[must_use]
pub fn assistant_tools() -> Vec<Tool> {
    vec![Tool {
        name: LIST_PROJECTS_TOOL.to_string(),
        description: "Returns every project in the portfolio with its title, description, tagline, technologies (tags) and links. Takes no input.".to_string(),
        input_schema: json!({
            "type": "object",
            "properties": {}
        }),
    }]
}

/// What the model sees for each project.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ProjectSummary<'a> {
    title: &'a str,
    description: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    tagline: Option<&'a str>,
    tags: &'a [String],
    live_url: &'a str,
    github_url: &'a str,
}

impl<'a> From<&'a Project> for ProjectSummary<'a> {
    fn from(project: &'a Project) -> Self {
        Self {
            title: &project.title,
            description: &project.description,
            tagline: project.tagline.as_deref(),
            tags: &project.tags,
            live_url: project.live_url.as_str(),
            github_url: project.github_url.as_str(),
        }
    }
}

/// Executes tool calls against the project service.
pub struct ToolExecutor<'a> {
    projects: &'a ProjectService,
}

impl<'a> ToolExecutor<'a> {
    #[must_use]
    pub const fn new(projects: &'a ProjectService) -> Self {
        Self { projects }
    }

    /// Execute a tool and return the result as a string.
    ///
    /// # Errors
    ///
    /// Returns `ClaudeError::Tool` for unknown tools or if the
    /// project list cannot be read.
    #[instrument(skip(self, _input), fields(tool_name = %name))]
    pub async fn execute(
        &self,
        name: &str,
        _input: &serde_json::Value,
    ) -> Result<String, ClaudeError> {
        match name {
            LIST_PROJECTS_TOOL => self.list_projects().await,
            _ => Err(ClaudeError::Tool(format!("Unknown tool: {name}"))),
        }
    }

    async fn list_projects(&self) -> Result<String, ClaudeError> {
        let projects = self
            .projects
            .list_projects()
            .await
            .map_err(|e| ClaudeError::Tool(format!("Failed to list projects: {e}")))?;

        let summary: Vec<ProjectSummary<'_>> = projects.iter().map(ProjectSummary::from).collect();
        serde_json::to_string(&summary)
            .map_err(|e| ClaudeError::Tool(format!("Failed to serialize projects: {e}")))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::Arc;

    use folio_core::{AdminPolicy, SubjectId};

    use super::*;
    use crate::services::projects::tests::{form, identity};
    use crate::store::MemoryStore;

    fn service() -> ProjectService {
        ProjectService::new(
            Arc::new(MemoryStore::new()),
            AdminPolicy::new(SubjectId::new("admin-uid")),
        )
    }

    #[test]
    fn test_exactly_one_tool() {
        let tools = assistant_tools();
        assert_eq!(tools.len(), 1);
        assert_eq!(tools.first().map(|t| t.name.as_str()), Some("list_projects"));
    }

    #[tokio::test]
    async fn test_empty_store_yields_empty_array() {
        let service = service();
        let result = ToolExecutor::new(&service)
            .execute(LIST_PROJECTS_TOOL, &json!({}))
            .await
            .unwrap();
        assert_eq!(result, "[]");
    }

    #[tokio::test]
    async fn test_list_projects_summarizes() {
        let service = service();
        service
            .create_project(&identity("admin-uid"), form("DevCard").validate().unwrap())
            .await
            .unwrap();

        let result = ToolExecutor::new(&service)
            .execute(LIST_PROJECTS_TOOL, &json!({}))
            .await
            .unwrap();
        let value: serde_json::Value = serde_json::from_str(&result).unwrap();
        assert_eq!(value[0]["title"], "DevCard");
        assert_eq!(value[0]["tags"], json!(["Rust", "Axum"]));
        assert_eq!(value[0]["githubUrl"], "https://github.com/adibxr/demo");
        assert!(value[0].get("id").is_none());
    }

    #[tokio::test]
    async fn test_unknown_tool() {
        let service = service();
        let err = ToolExecutor::new(&service)
            .execute("get_weather", &json!({}))
            .await
            .unwrap_err();
        assert!(matches!(err, ClaudeError::Tool(_)));
    }
}
