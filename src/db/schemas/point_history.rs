//! Point history document schema
//!
//! Append-only ledger of point-earning and point-spending events. Entries
//! are never updated or deleted; balances are folds over this collection.

use bson::{doc, oid::ObjectId, Document};
use mongodb::options::IndexOptions;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::db::mongo::{IntoIndexes, MutMetadata};
use crate::db::schemas::Metadata;

/// Collection name for point history entries
pub const POINT_HISTORY_COLLECTION: &str = "point_history";

/// Ledger entry direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "UPPERCASE")]
pub enum PointKind {
    #[default]
    Earn,
    Use,
}

impl fmt::Display for PointKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PointKind::Earn => write!(f, "EARN"),
            PointKind::Use => write!(f, "USE"),
        }
    }
}

/// Point history document stored in MongoDB
#[derive(Serialize, Deserialize, Clone, Debug, Default)]
pub struct PointHistoryDoc {
    /// MongoDB document ID
    #[serde(skip_serializing_if = "Option::is_none")]
    pub _id: Option<ObjectId>,

    /// Common metadata (created_at, updated_at, is_deleted)
    #[serde(default)]
    pub metadata: Metadata,

    /// Profile ID the entry belongs to (hex ObjectId)
    pub user_id: String,

    /// Always positive; the kind decides the sign in the fold
    pub amount: i64,

    pub kind: PointKind,

    pub description: String,

    /// Accepted answer that produced an EARN entry. Unique (sparse) so a
    /// retried acceptance cannot credit twice.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_answer_id: Option<String>,
}

impl PointHistoryDoc {
    /// Create an EARN entry tied to an accepted answer
    pub fn earn(user_id: String, amount: i64, description: String, source_answer_id: String) -> Self {
        Self {
            _id: None,
            metadata: Metadata::new(),
            user_id,
            amount,
            kind: PointKind::Earn,
            description,
            source_answer_id: Some(source_answer_id),
        }
    }

    /// Create a USE entry (point redemption)
    pub fn spend(user_id: String, amount: i64, description: String) -> Self {
        Self {
            _id: None,
            metadata: Metadata::new(),
            user_id,
            amount,
            kind: PointKind::Use,
            description,
            source_answer_id: None,
        }
    }
}

impl IntoIndexes for PointHistoryDoc {
    fn into_indices() -> Vec<(Document, Option<IndexOptions>)> {
        vec![
            // Per-user history, newest first
            (
                doc! { "user_id": 1, "metadata.created_at": -1 },
                Some(
                    IndexOptions::builder()
                        .name("user_created_index".to_string())
                        .build(),
                ),
            ),
            // One EARN entry per accepted answer
            (
                doc! { "source_answer_id": 1 },
                Some(
                    IndexOptions::builder()
                        .unique(true)
                        .sparse(true)
                        .name("source_answer_unique".to_string())
                        .build(),
                ),
            ),
        ]
    }
}

impl MutMetadata for PointHistoryDoc {
    fn mut_metadata(&mut self) -> &mut Metadata {
        &mut self.metadata
    }
}
