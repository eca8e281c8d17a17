//! Visitor-facing assistant.
//!
//! Answers one question at a time from the biography in the system prompt,
//! calling `list_projects` when it needs the portfolio. Nothing is kept
//! between calls. Any failure becomes [`FALLBACK_ANSWER`].

use std::sync::Arc;

use askama::Template;
use thiserror::Error;
use tracing::{info, instrument, warn};

use folio_core::Question;

use crate::claude::{
    ClaudeClient, ClaudeError, ContentBlock, Message, StopReason, ToolExecutor, assistant_tools,
};
use crate::profile::Profile;

use super::projects::ProjectService;

/// Returned verbatim whenever an answer cannot be produced.
pub const FALLBACK_ANSWER: &str = "Sorry, I encountered an error. Please try again.";

/// Model rounds per question: one to ask for the tool, one to answer, one spare.
const MAX_MODEL_ROUNDS: usize = 3;

/// System prompt template for the assistant.
#[derive(Template)]
#[template(path = "prompts/assistant_system.txt")]
struct SystemPromptTemplate<'a> {
    profile: &'a Profile,
    tool_name: &'a str,
}

/// Why an answer could not be produced.
#[derive(Debug, Error)]
pub enum AssistantError {
    #[error("Claude API error: {0}")]
    Claude(#[from] ClaudeError),

    #[error("failed to render system prompt: {0}")]
    Prompt(#[from] askama::Error),

    #[error("model returned no text")]
    EmptyAnswer,

    #[error("model asked for a tool without naming one")]
    MissingToolCall,

    #[error("no answer after {MAX_MODEL_ROUNDS} rounds")]
    TooManyRounds,
}

/// Stateless question answering.
#[derive(Clone)]
pub struct AssistantService {
    claude: ClaudeClient,
    projects: ProjectService,
    profile: Arc<Profile>,
}

impl AssistantService {
    #[must_use]
    pub const fn new(claude: ClaudeClient, projects: ProjectService, profile: Arc<Profile>) -> Self {
        Self {
            claude,
            projects,
            profile,
        }
    }

    /// Answer `question`. Never fails; errors yield [`FALLBACK_ANSWER`].
    #[instrument(skip(self, question), fields(question_len = question.as_str().len()))]
    pub async fn answer(&self, question: &Question) -> String {
        match self.try_answer(question).await {
            Ok(answer) => answer,
            Err(e) => {
                let transient = matches!(&e, AssistantError::Claude(c) if c.is_transient());
                warn!(error = %e, transient, "Assistant failed, returning fallback");
                FALLBACK_ANSWER.to_string()
            }
        }
    }

    async fn try_answer(&self, question: &Question) -> Result<String, AssistantError> {
        let system = SystemPromptTemplate {
            profile: &self.profile,
            tool_name: crate::claude::LIST_PROJECTS_TOOL,
        }
        .render()?;
        let tools = assistant_tools();
        let executor = ToolExecutor::new(&self.projects);

        let mut messages = vec![Message::user(question.as_str())];

        for round in 1..=MAX_MODEL_ROUNDS {
            let response = self
                .claude
                .chat(messages.clone(), Some(system.clone()), Some(tools.clone()))
                .await?;

            info!(
                round,
                stop_reason = ?response.stop_reason,
                content_blocks = response.content.len(),
                "Claude response received"
            );

            if response.stop_reason == Some(StopReason::ToolUse) {
                let mut results = Vec::new();
                for (id, name, input) in response.tool_uses() {
                    let content = executor.execute(name, input).await?;
                    results.push(ContentBlock::ToolResult {
                        tool_use_id: id.to_string(),
                        content,
                        is_error: None,
                    });
                }
                if results.is_empty() {
                    return Err(AssistantError::MissingToolCall);
                }

                messages.push(Message::assistant_blocks(response.content));
                messages.push(Message::user_blocks(results));
                continue;
            }

            let text = response.text();
            if text.is_empty() {
                return Err(AssistantError::EmptyAnswer);
            }
            return Ok(text);
        }

        Err(AssistantError::TooManyRounds)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use folio_core::{AdminPolicy, SubjectId};
    use mockito::Matcher;
    use secrecy::SecretString;
    use serde_json::json;

    use super::*;
    use crate::config::ClaudeConfig;
    use crate::store::MemoryStore;

    fn assistant(server: &mockito::Server) -> AssistantService {
        let claude = ClaudeClient::new(&ClaudeConfig {
            api_key: SecretString::from("sk-ant-test-Zq8vN2mK7pL4"),
            model: "claude-test".to_string(),
            api_url: format!("{}/v1/messages", server.url()),
        })
        .unwrap();
        let projects = ProjectService::new(
            Arc::new(MemoryStore::new()),
            AdminPolicy::new(SubjectId::new("admin-uid")),
        );
        AssistantService::new(claude, projects, Arc::new(Profile::load(None).unwrap()))
    }

    fn text_reply(text: &str) -> String {
        json!({
            "id": "msg_text",
            "model": "claude-test",
            "stop_reason": "end_turn",
            "content": [{"type": "text", "text": text}],
            "usage": {"input_tokens": 1, "output_tokens": 1}
        })
        .to_string()
    }

    fn tool_reply() -> String {
        json!({
            "id": "msg_tool",
            "model": "claude-test",
            "stop_reason": "tool_use",
            "content": [
                {"type": "tool_use", "id": "toolu_01", "name": "list_projects", "input": {}}
            ],
            "usage": {"input_tokens": 1, "output_tokens": 1}
        })
        .to_string()
    }

    #[tokio::test]
    async fn test_project_question_calls_tool_and_feeds_back_empty_list() {
        let mut server = mockito::Server::new_async().await;

        // Second round: must carry the tool result `[]` for the tool call.
        let answer = server
            .mock("POST", "/v1/messages")
            .match_body(Matcher::AllOf(vec![
                Matcher::Regex(r#""tool_use_id":"toolu_01""#.to_string()),
                Matcher::Regex(r#""content":"\[\]""#.to_string()),
            ]))
            .with_status(200)
            .with_body(text_reply("Aditya has no projects listed yet."))
            .expect(1)
            .create_async()
            .await;

        // First round: the question goes out with the tool offered.
        let ask = server
            .mock("POST", "/v1/messages")
            .match_body(Matcher::AllOf(vec![
                Matcher::PartialJson(json!({
                    "messages": [{"role": "user", "content": "What are Aditya's projects?"}],
                    "tools": [{"name": "list_projects"}]
                })),
                Matcher::Regex("AdiBot".to_string()),
            ]))
            .with_status(200)
            .with_body(tool_reply())
            .expect(1)
            .create_async()
            .await;

        let question = Question::parse("What are Aditya's projects?").unwrap();
        let reply = assistant(&server).answer(&question).await;

        assert_eq!(reply, "Aditya has no projects listed yet.");
        ask.assert_async().await;
        answer.assert_async().await;
    }

    #[tokio::test]
    async fn test_api_failure_returns_fallback() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/v1/messages")
            .with_status(500)
            .with_body(r#"{"type":"error","error":{"type":"api_error","message":"boom"}}"#)
            .create_async()
            .await;

        let question = Question::parse("Who are you?").unwrap();
        assert_eq!(assistant(&server).answer(&question).await, FALLBACK_ANSWER);
    }

    #[tokio::test]
    async fn test_empty_text_returns_fallback() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/v1/messages")
            .with_status(200)
            .with_body(text_reply("   "))
            .create_async()
            .await;

        let question = Question::parse("Hello?").unwrap();
        assert_eq!(assistant(&server).answer(&question).await, FALLBACK_ANSWER);
    }

    #[tokio::test]
    async fn test_endless_tool_use_is_bounded() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/v1/messages")
            .with_status(200)
            .with_body(tool_reply())
            .expect(MAX_MODEL_ROUNDS)
            .create_async()
            .await;

        let question = Question::parse("Projects?").unwrap();
        assert_eq!(assistant(&server).answer(&question).await, FALLBACK_ANSWER);
        mock.assert_async().await;
    }
}
