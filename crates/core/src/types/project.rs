//! The portfolio project entity.

use serde::{Deserialize, Serialize};
use url::Url;

use super::id::ProjectId;

/// A portfolio entry as stored by the hosted store.
///
/// The `id` is assigned by the store on creation and stays stable for the
/// lifetime of the record. Every other field is replaced wholesale on update.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    /// Store-assigned identifier.
    pub id: ProjectId,
    /// Display name.
    pub title: String,
    /// Free-text description.
    pub description: String,
    /// Optional short pitch shown under the title.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tagline: Option<String>,
    /// Card image.
    pub image_url: Url,
    /// Live demo link.
    pub live_url: Url,
    /// Source repository link.
    pub github_url: Url,
    /// Technologies, in display order.
    #[serde(default)]
    pub tags: Vec<String>,
}

/// A project without its identifier.
///
/// This is what the admin form produces and what `create` and `update`
/// accept. Constructing one through [`crate::ProjectForm::validate`]
/// guarantees the field invariants hold.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectDraft {
    pub title: String,
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tagline: Option<String>,
    pub image_url: Url,
    pub live_url: Url,
    pub github_url: Url,
    #[serde(default)]
    pub tags: Vec<String>,
}

impl ProjectDraft {
    /// Attach a store-assigned id, producing the stored record.
    #[must_use]
    pub fn with_id(self, id: ProjectId) -> Project {
        Project {
            id,
            title: self.title,
            description: self.description,
            tagline: self.tagline,
            image_url: self.image_url,
            live_url: self.live_url,
            github_url: self.github_url,
            tags: self.tags,
        }
    }
}

impl Project {
    /// Split the record into its id and the replaceable fields.
    #[must_use]
    pub fn into_parts(self) -> (ProjectId, ProjectDraft) {
        (
            self.id,
            ProjectDraft {
                title: self.title,
                description: self.description,
                tagline: self.tagline,
                image_url: self.image_url,
                live_url: self.live_url,
                github_url: self.github_url,
                tags: self.tags,
            },
        )
    }

    /// Tags joined for table display.
    #[must_use]
    pub fn tags_display(&self) -> String {
        self.tags.join(", ")
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn draft() -> ProjectDraft {
        ProjectDraft {
            title: "DevCard".to_string(),
            description: "A portfolio site".to_string(),
            tagline: None,
            image_url: Url::parse("https://placehold.co/600x400.png").unwrap(),
            live_url: Url::parse("https://devcard.example.com").unwrap(),
            github_url: Url::parse("https://github.com/adibxr/devcard").unwrap(),
            tags: vec!["Rust".to_string(), "Axum".to_string()],
        }
    }

    #[test]
    fn test_with_id_and_into_parts_are_inverse() {
        let project = draft().with_id(ProjectId::new("p1"));
        assert_eq!(project.id.as_str(), "p1");

        let (id, back) = project.into_parts();
        assert_eq!(id.as_str(), "p1");
        assert_eq!(back, draft());
    }

    #[test]
    fn test_json_uses_camel_case_field_names() {
        let json = serde_json::to_value(draft().with_id(ProjectId::new("p1"))).unwrap();
        assert_eq!(json["imageUrl"], "https://placehold.co/600x400.png");
        assert_eq!(json["githubUrl"], "https://github.com/adibxr/devcard");
        assert!(json.get("tagline").is_none());
    }

    #[test]
    fn test_deserialize_without_tags_defaults_to_empty() {
        let json = r#"{
            "title": "T",
            "description": "D",
            "imageUrl": "https://a.example/i.png",
            "liveUrl": "https://a.example",
            "githubUrl": "https://github.com/a/b"
        }"#;
        let parsed: ProjectDraft = serde_json::from_str(json).unwrap();
        assert!(parsed.tags.is_empty());
        assert!(parsed.tagline.is_none());
    }

    #[test]
    fn test_tags_display() {
        let project = draft().with_id(ProjectId::new("p1"));
        assert_eq!(project.tags_display(), "Rust, Axum");
    }
}
