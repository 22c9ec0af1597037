//! Profile document schema
//!
//! The role-tagged domain record behind an account. Created lazily on first
//! successful login; the role comes from the login surface used and never
//! changes afterwards.

use bson::{doc, oid::ObjectId, Document};
use mongodb::options::IndexOptions;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::db::mongo::{IntoIndexes, MutMetadata};
use crate::db::schemas::Metadata;

/// Collection name for profiles
pub const PROFILE_COLLECTION: &str = "profiles";

/// User role: seniors ask, youth answer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "UPPERCASE")]
pub enum Role {
    #[default]
    Senior,
    Youth,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::Senior => write!(f, "SENIOR"),
            Role::Youth => write!(f, "YOUTH"),
        }
    }
}

impl std::str::FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "SENIOR" => Ok(Role::Senior),
            "YOUTH" => Ok(Role::Youth),
            other => Err(format!("Unknown role: {}", other)),
        }
    }
}

/// Profile document stored in MongoDB
#[derive(Serialize, Deserialize, Clone, Debug, Default)]
pub struct ProfileDoc {
    /// MongoDB document ID
    #[serde(skip_serializing_if = "Option::is_none")]
    pub _id: Option<ObjectId>,

    /// Common metadata (created_at, updated_at, is_deleted)
    #[serde(default)]
    pub metadata: Metadata,

    /// Owning account ID (hex ObjectId of the accounts document)
    pub account_id: String,

    /// Login email, denormalized for display
    pub email: String,

    /// Display name, derived from the email local part at creation
    pub username: String,

    /// Role chosen by the login surface at first login
    pub role: Role,

    /// Cached point balance; the point_history ledger is authoritative
    #[serde(default)]
    pub points: i64,

    /// Number of accepted answers (youth only, display counter)
    #[serde(default)]
    pub answer_count: i64,
}

impl ProfileDoc {
    /// Create a new profile for an account
    ///
    /// Username falls back to the account ID when the email has no local part.
    pub fn new(account_id: String, email: String, role: Role) -> Self {
        let username = email
            .split('@')
            .next()
            .filter(|s| !s.is_empty())
            .map(|s| s.to_string())
            .unwrap_or_else(|| account_id.clone());

        Self {
            _id: None,
            metadata: Metadata::new(),
            account_id,
            email,
            username,
            role,
            points: 0,
            answer_count: 0,
        }
    }
}

impl IntoIndexes for ProfileDoc {
    fn into_indices() -> Vec<(Document, Option<IndexOptions>)> {
        vec![
            // Unique index on account_id — concurrent first logins from two
            // tabs cannot produce two profiles for one identity
            (
                doc! { "account_id": 1 },
                Some(
                    IndexOptions::builder()
                        .unique(true)
                        .name("account_id_unique".to_string())
                        .build(),
                ),
            ),
            // Index on email for login-surface role checks
            (
                doc! { "email": 1 },
                Some(
                    IndexOptions::builder()
                        .name("email_index".to_string())
                        .build(),
                ),
            ),
        ]
    }
}

impl MutMetadata for ProfileDoc {
    fn mut_metadata(&mut self) -> &mut Metadata {
        &mut self.metadata
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_username_from_email_local_part() {
        let p = ProfileDoc::new("abc123".into(), "grandma@example.com".into(), Role::Senior);
        assert_eq!(p.username, "grandma");
    }

    #[test]
    fn test_username_falls_back_to_account_id() {
        let p = ProfileDoc::new("abc123".into(), "@example.com".into(), Role::Youth);
        assert_eq!(p.username, "abc123");
    }

    #[test]
    fn test_role_round_trip() {
        assert_eq!("SENIOR".parse::<Role>().unwrap(), Role::Senior);
        assert_eq!("youth".parse::<Role>().unwrap(), Role::Youth);
        assert!("elder".parse::<Role>().is_err());
        assert_eq!(Role::Youth.to_string(), "YOUTH");
    }
}
