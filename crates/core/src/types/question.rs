//! Visitor questions for the assistant.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors that can occur when parsing a question.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum QuestionError {
    #[error("question cannot be empty")]
    Empty,
}

/// A non-blank question.
///
/// No further checks are made; keeping answers on topic is the assistant
/// prompt's job.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Question(String);

impl Question {
    /// Parse a question from visitor input.
    ///
    /// # Errors
    ///
    /// Returns `QuestionError::Empty` if the text is empty or whitespace.
    pub fn parse(text: &str) -> Result<Self, QuestionError> {
        let trimmed = text.trim();
        if trimmed.is_empty() {
            return Err(QuestionError::Empty);
        }
        Ok(Self(trimmed.to_owned()))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Question {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for Question {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Self::parse(&s).map_err(serde::de::Error::custom)
    }
}
