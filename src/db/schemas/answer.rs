//! Answer document schema

use bson::{doc, oid::ObjectId, Document};
use mongodb::options::IndexOptions;
use serde::{Deserialize, Serialize};

use crate::db::mongo::{IntoIndexes, MutMetadata};
use crate::db::schemas::Metadata;

/// Collection name for answers
pub const ANSWER_COLLECTION: &str = "answers";

/// Answer document stored in MongoDB
///
/// At most one answer per question ever has `is_selected = true`.
#[derive(Serialize, Deserialize, Clone, Debug, Default)]
pub struct AnswerDoc {
    /// MongoDB document ID
    #[serde(skip_serializing_if = "Option::is_none")]
    pub _id: Option<ObjectId>,

    /// Common metadata (created_at, updated_at, is_deleted)
    #[serde(default)]
    pub metadata: Metadata,

    /// Owning question ID (hex ObjectId)
    pub question_id: String,

    /// Profile ID of the answering youth (hex ObjectId)
    pub author_id: String,

    pub content: String,

    /// True only for the accepted answer
    #[serde(default)]
    pub is_selected: bool,
}

impl AnswerDoc {
    /// Create a new unselected answer
    pub fn new(question_id: String, author_id: String, content: String) -> Self {
        Self {
            _id: None,
            metadata: Metadata::new(),
            question_id,
            author_id,
            content,
            is_selected: false,
        }
    }

    /// Hex string of the document ID, empty if not yet inserted
    pub fn id_hex(&self) -> String {
        self._id.map(|id| id.to_hex()).unwrap_or_default()
    }
}

impl IntoIndexes for AnswerDoc {
    fn into_indices() -> Vec<(Document, Option<IndexOptions>)> {
        vec![
            // Answers-for-question listing, newest first
            (
                doc! { "question_id": 1, "metadata.created_at": -1 },
                Some(
                    IndexOptions::builder()
                        .name("question_created_index".to_string())
                        .build(),
                ),
            ),
            // Author listing for the activity feed
            (
                doc! { "author_id": 1, "metadata.created_at": -1 },
                Some(
                    IndexOptions::builder()
                        .name("author_created_index".to_string())
                        .build(),
                ),
            ),
        ]
    }
}

impl MutMetadata for AnswerDoc {
    fn mut_metadata(&mut self) -> &mut Metadata {
        &mut self.metadata
    }
}
