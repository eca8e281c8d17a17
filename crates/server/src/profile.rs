//! The site owner's biography.
//!
//! Shown on the home page and given to the assistant as its only source of
//! facts about the owner. A default ships inside the binary; a YAML file at
//! `FOLIO_PROFILE_PATH` replaces it.

use std::path::Path;

use serde::Deserialize;
use thiserror::Error;

const DEFAULT_PROFILE: &str = include_str!("../profile.yaml");

/// Errors loading a profile.
#[derive(Debug, Error)]
pub enum ProfileError {
    #[error("failed to read profile {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid profile YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

/// A social or contact link.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SocialLink {
    pub label: String,
    pub url: String,
}

/// Biography and assistant persona.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Profile {
    pub name: String,
    pub tagline: String,
    pub bio: String,
    pub email: String,
    #[serde(default)]
    pub socials: Vec<SocialLink>,
    /// Name the assistant introduces itself with.
    pub assistant_name: String,
    /// First message shown on the chat page.
    pub greeting: String,
}

impl Profile {
    /// Load from `path`, or the built-in profile when `None`.
    ///
    /// # Errors
    ///
    /// Returns `ProfileError` if the file cannot be read or parsed.
    pub fn load(path: Option<&Path>) -> Result<Self, ProfileError> {
        match path {
            Some(path) => {
                let raw = std::fs::read_to_string(path).map_err(|source| ProfileError::Io {
                    path: path.display().to_string(),
                    source,
                })?;
                Self::from_yaml(&raw)
            }
            None => Self::from_yaml(DEFAULT_PROFILE),
        }
    }

    /// Parse a profile from YAML text.
    ///
    /// # Errors
    ///
    /// Returns `ProfileError::Yaml` if the text is not a valid profile.
    pub fn from_yaml(raw: &str) -> Result<Self, ProfileError> {
        Ok(serde_yaml::from_str(raw)?)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_profile_parses() {
        let profile = Profile::load(None).unwrap();
        assert_eq!(profile.name, "Aditya Raj");
        assert_eq!(profile.assistant_name, "AdiBot");
        assert_eq!(profile.socials.len(), 4);
        assert!(profile.bio.starts_with("Hi! My name is Aditya."));
        assert!(!profile.bio.ends_with('\n'));
    }

    #[test]
    fn test_missing_file() {
        let err = Profile::load(Some(Path::new("/nonexistent/profile.yaml"))).unwrap_err();
        assert!(matches!(err, ProfileError::Io { .. }));
    }

    #[test]
    fn test_missing_field() {
        let err = Profile::from_yaml("name: Someone\n").unwrap_err();
        assert!(matches!(err, ProfileError::Yaml(_)));
    }
}
