// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! User model for storage and API.

use serde::{Deserialize, Serialize};
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

/// Role attached to a user record.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
#[serde(rename_all = "snake_case")]
pub enum UserRole {
    #[default]
    User,
    Rider,
    Admin,
}

impl UserRole {
    pub fn as_str(self) -> &'static str {
        match self {
            UserRole::User => "user",
            UserRole::Rider => "rider",
            UserRole::Admin => "admin",
        }
    }
}

/// User profile stored in Firestore.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
#[serde(rename_all = "camelCase")]
pub struct User {
    /// Document ID
    pub id: String,
    /// Sign-in email (unique)
    pub email: String,
    /// Display name from the identity provider
    #[serde(default)]
    pub display_name: String,
    /// Profile picture URL
    #[serde(default, rename = "photoURL")]
    pub photo_url: Option<String>,
    #[serde(default)]
    pub role: UserRole,
    /// When the user first signed in
    pub created_at: String,
}

impl User {
    /// Case-insensitive substring match on display name or email.
    ///
    /// `needle` must already be lowercased.
    pub fn matches_search(&self, needle: &str) -> bool {
        needle.is_empty()
            || self.display_name.to_lowercase().contains(needle)
            || self.email.to_lowercase().contains(needle)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user(name: &str, email: &str) -> User {
        User {
            id: "u1".to_string(),
            email: email.to_string(),
            display_name: name.to_string(),
            photo_url: None,
            role: UserRole::User,
            created_at: "2026-01-01T00:00:00.000Z".to_string(),
        }
    }

    #[test]
    fn search_matches_name_or_email_case_insensitively() {
        let u = user("Nadia Rahman", "nadia@Example.com");
        assert!(u.matches_search("rahman"));
        assert!(u.matches_search("example.com"));
        assert!(u.matches_search(""));
        assert!(!u.matches_search("karim"));
    }

    #[test]
    fn role_defaults_to_user_when_absent() {
        let json = r#"{"id":"x","email":"a@b.c","createdAt":"2026-01-01T00:00:00.000Z"}"#;
        let u: User = serde_json::from_str(json).unwrap();
        assert_eq!(u.role, UserRole::User);
        assert_eq!(u.display_name, "");
    }

    #[test]
    fn unknown_role_is_rejected() {
        assert!(serde_json::from_str::<UserRole>("\"superuser\"").is_err());
        assert_eq!(
            serde_json::from_str::<UserRole>("\"admin\"").unwrap(),
            UserRole::Admin
        );
    }
}
