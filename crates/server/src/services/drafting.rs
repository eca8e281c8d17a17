//! AI writing help for the admin project form.
//!
//! Unlike the visitor assistant, failures here are reported to the admin
//! instead of being replaced with a canned answer.

use askama::Template;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::instrument;

use crate::claude::{ClaudeClient, ClaudeError};

const DRAFTING_SYSTEM_PROMPT: &str = "You are a creative marketing expert who writes copy for software portfolio projects. Reply with a single JSON object and nothing else.";

#[derive(Template)]
#[template(path = "prompts/tagline.txt")]
struct TaglinePrompt<'a> {
    title: &'a str,
    description: &'a str,
}

#[derive(Template)]
#[template(path = "prompts/improve_description.txt")]
struct ImproveDescriptionPrompt<'a> {
    description: &'a str,
}

/// Errors from the drafting helpers.
#[derive(Debug, Error)]
pub enum DraftingError {
    /// A required input was blank.
    #[error("{0} is required")]
    MissingInput(&'static str),

    #[error("Claude API error: {0}")]
    Claude(#[from] ClaudeError),

    #[error("failed to render prompt: {0}")]
    Prompt(#[from] askama::Error),

    /// The model's reply was not the JSON we asked for.
    #[error("unexpected model reply: {0}")]
    Parse(String),
}

#[derive(Debug, Deserialize)]
struct TaglineReply {
    tagline: String,
}

/// A rewritten description, optionally with a tagline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImprovedDescription {
    pub improved_description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub suggested_tagline: Option<String>,
}

/// Tagline and description suggestions.
#[derive(Clone)]
pub struct DraftingService {
    claude: ClaudeClient,
}

impl DraftingService {
    #[must_use]
    pub const fn new(claude: ClaudeClient) -> Self {
        Self { claude }
    }

    /// Suggest a short tagline for a project.
    ///
    /// # Errors
    ///
    /// Returns `DraftingError` if an input is blank, the API call fails, or
    /// the reply cannot be parsed.
    #[instrument(skip(self, title, description))]
    pub async fn suggest_tagline(
        &self,
        title: &str,
        description: &str,
    ) -> Result<String, DraftingError> {
        let title = require(title, "title")?;
        let description = require(description, "description")?;

        let prompt = TaglinePrompt { title, description }.render()?;
        let reply = self
            .claude
            .complete(DRAFTING_SYSTEM_PROMPT.to_string(), prompt)
            .await?;

        let parsed: TaglineReply = parse_json_reply(&reply)?;
        let tagline = parsed.tagline.trim();
        if tagline.is_empty() {
            return Err(DraftingError::Parse("empty tagline".to_string()));
        }
        Ok(tagline.to_string())
    }

    /// Rewrite a description to be more engaging.
    ///
    /// # Errors
    ///
    /// Returns `DraftingError` if the description is blank, the API call
    /// fails, or the reply cannot be parsed.
    #[instrument(skip(self, description))]
    pub async fn improve_description(
        &self,
        description: &str,
    ) -> Result<ImprovedDescription, DraftingError> {
        let description = require(description, "description")?;

        let prompt = ImproveDescriptionPrompt { description }.render()?;
        let reply = self
            .claude
            .complete(DRAFTING_SYSTEM_PROMPT.to_string(), prompt)
            .await?;

        let mut improved: ImprovedDescription = parse_json_reply(&reply)?;
        if improved.improved_description.trim().is_empty() {
            return Err(DraftingError::Parse("empty description".to_string()));
        }
        improved.suggested_tagline = improved
            .suggested_tagline
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty());
        Ok(improved)
    }
}

fn require<'a>(value: &'a str, name: &'static str) -> Result<&'a str, DraftingError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        Err(DraftingError::MissingInput(name))
    } else {
        Ok(trimmed)
    }
}

/// Parse the JSON object out of a reply, tolerating a code fence around it.
fn parse_json_reply<T: for<'de> Deserialize<'de>>(reply: &str) -> Result<T, DraftingError> {
    let start = reply.find('{');
    let end = reply.rfind('}');
    let json = match (start, end) {
        (Some(start), Some(end)) if start < end => reply.get(start..=end).unwrap_or(reply),
        _ => return Err(DraftingError::Parse("no JSON object in reply".to_string())),
    };
    serde_json::from_str(json).map_err(|e| DraftingError::Parse(e.to_string()))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use mockito::Matcher;
    use secrecy::SecretString;
    use serde_json::json;

    use super::*;
    use crate::config::ClaudeConfig;

    fn drafting(server: &mockito::Server) -> DraftingService {
        DraftingService::new(
            ClaudeClient::new(&ClaudeConfig {
                api_key: SecretString::from("sk-ant-test-Zq8vN2mK7pL4"),
                model: "claude-test".to_string(),
                api_url: format!("{}/v1/messages", server.url()),
            })
            .unwrap(),
        )
    }

    fn reply(text: &str) -> String {
        json!({
            "id": "msg_1",
            "model": "claude-test",
            "stop_reason": "end_turn",
            "content": [{"type": "text", "text": text}],
            "usage": {"input_tokens": 1, "output_tokens": 1}
        })
        .to_string()
    }

    #[test]
    fn test_parse_json_reply_strips_fence() {
        let parsed: TaglineReply =
            parse_json_reply("```json\n{\"tagline\": \"Cards for devs\"}\n```").unwrap();
        assert_eq!(parsed.tagline, "Cards for devs");
    }

    #[test]
    fn test_parse_json_reply_rejects_prose() {
        let err = parse_json_reply::<TaglineReply>("Sure! Here you go.").unwrap_err();
        assert!(matches!(err, DraftingError::Parse(_)));
    }

    #[tokio::test]
    async fn test_suggest_tagline() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/v1/messages")
            .match_body(Matcher::Regex("DevCard".to_string()))
            .with_status(200)
            .with_body(reply(r#"{"tagline": " Your portfolio, one card away. "}"#))
            .create_async()
            .await;

        let tagline = drafting(&server)
            .suggest_tagline("DevCard", "A portfolio generator")
            .await
            .unwrap();
        assert_eq!(tagline, "Your portfolio, one card away.");
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_suggest_tagline_requires_title() {
        let server = mockito::Server::new_async().await;
        let err = drafting(&server)
            .suggest_tagline("  ", "desc")
            .await
            .unwrap_err();
        assert!(matches!(err, DraftingError::MissingInput("title")));
    }

    #[tokio::test]
    async fn test_improve_description_drops_blank_tagline() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/v1/messages")
            .with_status(200)
            .with_body(reply(
                r#"{"improvedDescription": "A sharper pitch.", "suggestedTagline": ""}"#,
            ))
            .create_async()
            .await;

        let improved = drafting(&server)
            .improve_description("a pitch")
            .await
            .unwrap();
        assert_eq!(improved.improved_description, "A sharper pitch.");
        assert!(improved.suggested_tagline.is_none());
    }

    #[tokio::test]
    async fn test_improve_description_surfaces_api_errors() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/v1/messages")
            .with_status(401)
            .create_async()
            .await;

        let err = drafting(&server)
            .improve_description("a pitch")
            .await
            .unwrap_err();
        assert!(matches!(err, DraftingError::Claude(ClaudeError::InvalidApiKey(_))));
    }
}
