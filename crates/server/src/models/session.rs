//! Session-related types.
//!
//! Types stored in the session for authentication state.

use serde::{Deserialize, Serialize};

use folio_core::{AdminPolicy, Identity};

/// Session-stored identity of whoever signed in.
///
/// Any provider account can sign in; only the admin subject gets past
/// `RequireAdmin`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CurrentUser {
    pub identity: Identity,
}

impl CurrentUser {
    #[must_use]
    pub const fn new(identity: Identity) -> Self {
        Self { identity }
    }

    #[must_use]
    pub fn is_admin(&self, policy: &AdminPolicy) -> bool {
        policy.is_authorized(Some(&self.identity))
    }

    /// First letter of the display name, for the avatar fallback.
    #[must_use]
    pub fn initial(&self) -> String {
        self.identity
            .name
            .chars()
            .next()
            .map(|c| c.to_uppercase().to_string())
            .unwrap_or_default()
    }
}

/// Session keys for authentication data.
pub mod keys {
    /// Key for storing the current signed-in user.
    pub const CURRENT_USER: &str = "current_user";

    /// Key for OAuth state (CSRF protection).
    pub const OAUTH_STATE: &str = "oauth_state";
}

#[cfg(test)]
mod tests {
    use folio_core::SubjectId;

    use super::*;

    fn user(subject: &str, name: &str) -> CurrentUser {
        CurrentUser::new(Identity {
            subject: SubjectId::new(subject),
            name: name.to_string(),
            email: None,
            photo_url: None,
        })
    }

    #[test]
    fn test_is_admin() {
        let policy = AdminPolicy::new(SubjectId::new("admin-uid"));
        assert!(user("admin-uid", "Aditya").is_admin(&policy));
        assert!(!user("guest", "Guest").is_admin(&policy));
    }

    #[test]
    fn test_initial() {
        assert_eq!(user("a", "aditya").initial(), "A");
        assert_eq!(user("a", "").initial(), "");
    }
}
