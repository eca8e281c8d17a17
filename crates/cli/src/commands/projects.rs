//! Project commands.
//!
//! Both go through `ProjectService`, so imports are subject to the same
//! admin check as the web form.
//!
//! # Import file
//!
//! ```yaml
//! - title: DevCard
//!   description: Generate a developer portfolio card from a GitHub profile.
//!   tagline: Your portfolio, one card away.   # optional
//!   image_url: https://example.com/card.png    # optional, placeholder if absent
//!   live_url: https://devcard.example.com
//!   github_url: https://github.com/adibxr/devcard
//!   tags: [react, nextjs]
//! ```

use std::path::Path;

use serde::Deserialize;
use tracing::{info, warn};

use folio_core::{AdminPolicy, Identity, PLACEHOLDER_IMAGE_URL, ProjectDraft, ProjectForm};
use folio_server::config::{ConfigError, StoreConfig, admin_subject_from_env};
use folio_server::services::{ProjectError, ProjectService};
use folio_server::store::{self, StoreError};

#[derive(Debug, thiserror::Error)]
pub enum ProjectsError {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("store error: {0}")]
    Store(#[from] StoreError),

    #[error("{0}")]
    Project(#[from] ProjectError),

    #[error("failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("failed to encode projects: {0}")]
    Json(#[from] serde_json::Error),

    #[error("{0} invalid project(s); nothing was imported")]
    Invalid(usize),
}

/// One project in an import file.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct ImportEntry {
    title: String,
    description: String,
    #[serde(default)]
    tagline: Option<String>,
    #[serde(default)]
    image_url: Option<String>,
    live_url: String,
    github_url: String,
    #[serde(default)]
    tags: Vec<String>,
}

impl From<ImportEntry> for ProjectForm {
    fn from(entry: ImportEntry) -> Self {
        Self {
            title: entry.title,
            description: entry.description,
            tagline: entry.tagline.unwrap_or_default(),
            image_url: entry
                .image_url
                .unwrap_or_else(|| PLACEHOLDER_IMAGE_URL.to_string()),
            live_url: entry.live_url,
            github_url: entry.github_url,
            tags: entry.tags.join(", "),
        }
    }
}

/// Parse and validate an import file. Every entry must pass before any is
/// returned.
fn parse_entries(raw: &str) -> Result<Vec<ProjectDraft>, ProjectsError> {
    let entries: Vec<ImportEntry> = serde_yaml::from_str(raw)?;

    let mut drafts = Vec::with_capacity(entries.len());
    let mut invalid = 0;
    for (index, entry) in entries.into_iter().enumerate() {
        let title = entry.title.clone();
        match ProjectForm::from(entry).validate() {
            Ok(draft) => drafts.push(draft),
            Err(errors) => {
                invalid += 1;
                warn!(entry = index + 1, title = %title, "Invalid project: {errors}");
            }
        }
    }

    if invalid > 0 {
        return Err(ProjectsError::Invalid(invalid));
    }
    Ok(drafts)
}

/// Reject stores that would drop everything when the process exits.
fn require_persistent(config: StoreConfig) -> Result<StoreConfig, ProjectsError> {
    match config {
        StoreConfig::Memory => Err(ConfigError::InvalidEnvVar(
            "FOLIO_STORE".to_string(),
            "the CLI needs a persistent store (postgres or firebase)".to_string(),
        )
        .into()),
        persistent => Ok(persistent),
    }
}

async fn service() -> Result<ProjectService, ProjectsError> {
    let store_config = require_persistent(StoreConfig::from_env()?)?;
    let admin = admin_subject_from_env()?;
    let connected = store::connect(&store_config).await?;
    info!(store = store_config.kind(), "Connected to project store");
    Ok(ProjectService::new(connected.store, AdminPolicy::new(admin)))
}

/// Print every project as pretty JSON on stdout.
///
/// # Errors
///
/// Returns an error if the store cannot be reached.
pub async fn list() -> Result<(), ProjectsError> {
    let projects = service().await?.list_projects().await?;
    let json = serde_json::to_string_pretty(&projects)?;

    #[allow(clippy::print_stdout)]
    {
        println!("{json}");
    }
    Ok(())
}

/// Create every project in `path`, acting as the configured admin.
///
/// # Errors
///
/// Returns an error if the file is unreadable or invalid, or a create fails.
/// Validation happens up front, so an invalid file writes nothing.
pub async fn import(path: &Path, dry_run: bool) -> Result<(), ProjectsError> {
    let raw = tokio::fs::read_to_string(path)
        .await
        .map_err(|source| ProjectsError::Io {
            path: path.display().to_string(),
            source,
        })?;
    let drafts = parse_entries(&raw)?;
    info!(count = drafts.len(), "Import file is valid");

    if dry_run {
        info!("Dry run; nothing written");
        return Ok(());
    }

    let service = service().await?;
    let admin = Identity {
        subject: service.policy().admin_subject().clone(),
        name: "folio-cli".to_string(),
        email: None,
        photo_url: None,
    };

    for draft in drafts {
        let title = draft.title.clone();
        let project = service.create_project(&admin, draft).await?;
        info!(id = %project.id, title = %title, "Imported project");
    }

    info!("Import complete!");
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;

    const VALID: &str = r"
- title: DevCard
  description: Generate a developer card.
  live_url: https://devcard.example.com
  github_url: https://github.com/adibxr/devcard
  tags: [react, nextjs]
- title: Sketchbook
  description: Digital concept art gallery.
  tagline: Art, online.
  image_url: https://img.example.com/sketch.png
  live_url: https://sketch.example.com
  github_url: https://github.com/adibxr/sketchbook
  tags: [art]
";

    #[test]
    fn test_parse_valid_file() {
        let drafts = parse_entries(VALID).unwrap();
        assert_eq!(drafts.len(), 2);
        assert_eq!(drafts[0].tags, vec!["react", "nextjs"]);
        assert_eq!(drafts[0].image_url.as_str(), PLACEHOLDER_IMAGE_URL);
        assert!(drafts[0].tagline.is_none());
        assert_eq!(drafts[1].tagline.as_deref(), Some("Art, online."));
    }

    #[test]
    fn test_one_invalid_entry_rejects_file() {
        let raw = r"
- title: ''
  description: Missing a title.
  live_url: https://a.example.com
  github_url: https://github.com/a/b
  tags: [x]
- title: Fine
  description: This one is fine.
  live_url: https://b.example.com
  github_url: https://github.com/a/c
  tags: [y]
";
        let err = parse_entries(raw).unwrap_err();
        assert!(matches!(err, ProjectsError::Invalid(1)));
    }

    #[test]
    fn test_memory_store_is_rejected() {
        let err = require_persistent(StoreConfig::Memory).unwrap_err();
        assert!(matches!(
            err,
            ProjectsError::Config(ConfigError::InvalidEnvVar(ref name, _)) if name == "FOLIO_STORE"
        ));
    }

    #[test]
    fn test_postgres_store_is_accepted() {
        let config = StoreConfig::Postgres {
            database_url: secrecy::SecretString::from("postgres://localhost/folio"),
        };
        assert_eq!(require_persistent(config).unwrap().kind(), "postgres");
    }

    #[test]
    fn test_unknown_field_rejected() {
        let raw = "- title: X\n  colour: red\n";
        assert!(matches!(
            parse_entries(raw).unwrap_err(),
            ProjectsError::Yaml(_)
        ));
    }
}
