//! Claude API integration for the site assistant and drafting helpers.
//!
//! # Features
//!
//! - Non-streaming Messages API client with tool use
//! - A single read-only tool, `list_projects`, backed by the project store
//!
//! Conversations are not persisted; each call sends one user message.

mod client;
mod error;
pub mod tools;
pub mod types;

pub use client::ClaudeClient;
pub use error::ClaudeError;
pub use tools::{LIST_PROJECTS_TOOL, ToolExecutor, assistant_tools};
pub use types::{ChatResponse, ContentBlock, Message, MessageContent, StopReason, Tool};
