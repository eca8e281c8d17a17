//! Raw admin form input and its validation.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use url::Url;

use super::project::{Project, ProjectDraft};

/// Image shown on cards until the admin supplies a real one.
pub const PLACEHOLDER_IMAGE_URL: &str = "https://placehold.co/600x400.png";

/// A form field that can carry a validation error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Field {
    Title,
    Description,
    Tagline,
    ImageUrl,
    LiveUrl,
    GithubUrl,
    Tags,
}

impl Field {
    /// The HTML form name of this field.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Title => "title",
            Self::Description => "description",
            Self::Tagline => "tagline",
            Self::ImageUrl => "image_url",
            Self::LiveUrl => "live_url",
            Self::GithubUrl => "github_url",
            Self::Tags => "tags",
        }
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Per-field validation messages.
///
/// Every failing field is collected before anything is returned, so the form
/// can show all problems at once.
#[derive(Debug, Clone, Default, PartialEq, Eq, Error)]
#[error("{}", self.joined())]
pub struct FieldErrors(BTreeMap<Field, String>);

impl FieldErrors {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record an error for `field`, replacing any earlier one.
    pub fn insert(&mut self, field: Field, message: impl Into<String>) {
        self.0.insert(field, message.into());
    }

    /// The message for `field`, if it failed.
    #[must_use]
    pub fn get(&self, field: Field) -> Option<&str> {
        self.0.get(&field).map(String::as_str)
    }

    /// Template helper: the message for a field by its form name.
    #[must_use]
    pub fn for_name(&self, name: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|(field, _)| field.name() == name)
            .map(|(_, message)| message.as_str())
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (Field, &str)> {
        self.0.iter().map(|(field, message)| (*field, message.as_str()))
    }

    /// `field: message` pairs joined with `; `, in field order.
    #[must_use]
    pub fn joined(&self) -> String {
        self.0
            .iter()
            .map(|(field, message)| format!("{field}: {message}"))
            .collect::<Vec<_>>()
            .join("; ")
    }
}


/// Split a comma-separated tag field into trimmed, non-empty tags.
#[must_use]
pub fn parse_tags(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|tag| !tag.is_empty())
        .map(ToOwned::to_owned)
        .collect()
}

/// The project form exactly as the browser posts it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectForm {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub tagline: String,
    #[serde(default)]
    pub image_url: String,
    #[serde(default)]
    pub live_url: String,
    #[serde(default)]
    pub github_url: String,
    /// Comma-separated.
    #[serde(default)]
    pub tags: String,
}

impl Default for ProjectForm {
    fn default() -> Self {
        Self {
            title: String::new(),
            description: String::new(),
            tagline: String::new(),
            image_url: PLACEHOLDER_IMAGE_URL.to_string(),
            live_url: String::new(),
            github_url: String::new(),
            tags: String::new(),
        }
    }
}

impl From<&Project> for ProjectForm {
    fn from(project: &Project) -> Self {
        Self {
            title: project.title.clone(),
            description: project.description.clone(),
            tagline: project.tagline.clone().unwrap_or_default(),
            image_url: project.image_url.to_string(),
            live_url: project.live_url.to_string(),
            github_url: project.github_url.to_string(),
            tags: project.tags.join(", "),
        }
    }
}

impl ProjectForm {
    /// Validate every field and build a draft.
    ///
    /// # Errors
    ///
    /// Returns all failing fields together. No draft is produced unless every
    /// field is valid.
    pub fn validate(&self) -> Result<ProjectDraft, FieldErrors> {
        let mut errors = FieldErrors::new();

        let title = required(&self.title, Field::Title, "Title is required", &mut errors);
        let description = required(
            &self.description,
            Field::Description,
            "Description is required",
            &mut errors,
        );
        let image_url = absolute_url(&self.image_url, Field::ImageUrl, &mut errors);
        let live_url = absolute_url(&self.live_url, Field::LiveUrl, &mut errors);
        let github_url = absolute_url(&self.github_url, Field::GithubUrl, &mut errors);

        let tags = if self.tags.trim().is_empty() {
            errors.insert(Field::Tags, "At least one tag is required");
            Vec::new()
        } else {
            parse_tags(&self.tags)
        };

        let tagline = Some(self.tagline.trim())
            .filter(|t| !t.is_empty())
            .map(ToOwned::to_owned);

        match (title, description, image_url, live_url, github_url) {
            (Some(title), Some(description), Some(image_url), Some(live_url), Some(github_url))
                if errors.is_empty() =>
            {
                Ok(ProjectDraft {
                    title,
                    description,
                    tagline,
                    image_url,
                    live_url,
                    github_url,
                    tags,
                })
            }
            _ => Err(errors),
        }
    }
}

fn required(value: &str, field: Field, message: &str, errors: &mut FieldErrors) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        errors.insert(field, message);
        None
    } else {
        Some(trimmed.to_owned())
    }
}

fn absolute_url(value: &str, field: Field, errors: &mut FieldErrors) -> Option<Url> {
    match Url::parse(value.trim()) {
        Ok(url) if url.has_host() => Some(url),
        _ => {
            errors.insert(field, "Please enter a valid URL");
            None
        }
    }
}
