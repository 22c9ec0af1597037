//! Question document schema

use bson::{doc, oid::ObjectId, DateTime, Document};
use mongodb::options::IndexOptions;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::db::mongo::{IntoIndexes, MutMetadata};
use crate::db::schemas::Metadata;

/// Collection name for questions
pub const QUESTION_COLLECTION: &str = "questions";

/// Question lifecycle status
///
/// Transitions are monotonic: pending → answered → completed. The answered
/// step is skipped only when the first answer is accepted straight from
/// pending.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum QuestionStatus {
    #[default]
    Pending,
    Answered,
    Completed,
}

impl fmt::Display for QuestionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QuestionStatus::Pending => write!(f, "pending"),
            QuestionStatus::Answered => write!(f, "answered"),
            QuestionStatus::Completed => write!(f, "completed"),
        }
    }
}

/// Satisfaction rating recorded when an answer is accepted
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Satisfaction {
    Neutral,
    Good,
    Excellent,
}

impl Satisfaction {
    /// Wire/storage form
    pub fn as_str(&self) -> &'static str {
        match self {
            Satisfaction::Neutral => "neutral",
            Satisfaction::Good => "good",
            Satisfaction::Excellent => "excellent",
        }
    }
}

impl std::str::FromStr for Satisfaction {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "neutral" => Ok(Satisfaction::Neutral),
            "good" => Ok(Satisfaction::Good),
            "excellent" => Ok(Satisfaction::Excellent),
            other => Err(format!("Unknown satisfaction rating: {}", other)),
        }
    }
}

/// Question document stored in MongoDB
#[derive(Serialize, Deserialize, Clone, Debug, Default)]
pub struct QuestionDoc {
    /// MongoDB document ID
    #[serde(skip_serializing_if = "Option::is_none")]
    pub _id: Option<ObjectId>,

    /// Common metadata (created_at, updated_at, is_deleted)
    #[serde(default)]
    pub metadata: Metadata,

    /// Profile ID of the asking senior (hex ObjectId)
    pub owner_id: String,

    pub title: String,

    pub content: String,

    #[serde(default)]
    pub status: QuestionStatus,

    /// Set at acceptance time, absent before
    #[serde(skip_serializing_if = "Option::is_none")]
    pub satisfaction: Option<Satisfaction>,

    /// AI-directed question variant, excluded from youth browsing
    #[serde(default)]
    pub is_ai: bool,

    /// Profile ID of the first answering youth
    #[serde(skip_serializing_if = "Option::is_none")]
    pub answered_by: Option<String>,

    /// When the first answer arrived
    #[serde(skip_serializing_if = "Option::is_none")]
    pub answered_at: Option<DateTime>,

    /// Answer ID stamped by the acceptance commit; the consistency sweep
    /// uses it to repair selection and credit if later writes failed
    #[serde(skip_serializing_if = "Option::is_none")]
    pub accepted_answer_id: Option<String>,
}

impl QuestionDoc {
    /// Create a new pending question
    pub fn new(owner_id: String, title: String, content: String) -> Self {
        Self {
            _id: None,
            metadata: Metadata::new(),
            owner_id,
            title,
            content,
            status: QuestionStatus::Pending,
            satisfaction: None,
            is_ai: false,
            answered_by: None,
            answered_at: None,
            accepted_answer_id: None,
        }
    }

    /// Hex string of the document ID, empty if not yet inserted
    pub fn id_hex(&self) -> String {
        self._id.map(|id| id.to_hex()).unwrap_or_default()
    }
}

impl IntoIndexes for QuestionDoc {
    fn into_indices() -> Vec<(Document, Option<IndexOptions>)> {
        vec![
            // Owner listing ("my questions", newest first)
            (
                doc! { "owner_id": 1, "metadata.created_at": -1 },
                Some(
                    IndexOptions::builder()
                        .name("owner_created_index".to_string())
                        .build(),
                ),
            ),
            // Pending-question browsing for youth
            (
                doc! { "status": 1, "metadata.created_at": -1 },
                Some(
                    IndexOptions::builder()
                        .name("status_created_index".to_string())
                        .build(),
                ),
            ),
        ]
    }
}

impl MutMetadata for QuestionDoc {
    fn mut_metadata(&mut self) -> &mut Metadata {
        &mut self.metadata
    }
}
