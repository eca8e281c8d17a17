//! Signed-in identity and the single-admin authorization rule.

use serde::{Deserialize, Serialize};

use super::id::SubjectId;

/// The user returned by the identity provider after sign-in.
///
/// Read-only; Folio never edits identities.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    /// Stable provider subject (`sub` claim).
    pub subject: SubjectId,
    /// Display name.
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub photo_url: Option<String>,
}

/// Decides who may mutate projects.
///
/// Exactly one subject is the admin. Everyone else, including anonymous
/// visitors, is denied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdminPolicy {
    admin: SubjectId,
}

impl AdminPolicy {
    #[must_use]
    pub const fn new(admin: SubjectId) -> Self {
        Self { admin }
    }

    /// The configured admin subject.
    #[must_use]
    pub const fn admin_subject(&self) -> &SubjectId {
        &self.admin
    }

    /// True iff a user is signed in and is the configured admin.
    #[must_use]
    pub fn is_authorized(&self, identity: Option<&Identity>) -> bool {
        identity.is_some_and(|identity| identity.subject == self.admin)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn identity(subject: &str) -> Identity {
        Identity {
            subject: SubjectId::new(subject),
            name: "Someone".to_string(),
            email: None,
            photo_url: None,
        }
    }

    #[test]
    fn test_admin_subject_is_authorized() {
        let policy = AdminPolicy::new(SubjectId::new("admin-uid"));
        assert!(policy.is_authorized(Some(&identity("admin-uid"))));
    }

    #[test]
    fn test_other_subject_is_denied() {
        let policy = AdminPolicy::new(SubjectId::new("admin-uid"));
        assert!(!policy.is_authorized(Some(&identity("visitor-uid"))));
        assert!(!policy.is_authorized(Some(&identity("ADMIN-UID"))));
    }

    #[test]
    fn test_anonymous_is_denied() {
        let policy = AdminPolicy::new(SubjectId::new("admin-uid"));
        assert!(!policy.is_authorized(None));
    }
}
