//! Question store
//!
//! Questions are owned exclusively by the senior who asked them. Status only
//! moves forward (pending → answered → completed); the transitions themselves
//! live in `crate::answers` and `crate::acceptance`.

use bson::doc;
use std::sync::Arc;
use tracing::info;

use crate::db::schemas::{
    AnswerDoc, ProfileDoc, QuestionDoc, Role, ANSWER_COLLECTION, QUESTION_COLLECTION,
};
use crate::db::{parse_object_id, MongoClient, MongoCollection};
use crate::events::{ChangeEvent, ChangeOp, EventHub, StoreCollection};
use crate::types::{BridgewayError, Result};

/// Validate and trim a new question's title and content
///
/// Returns the trimmed pair; empty either way is rejected before it reaches
/// the store.
pub fn validate_new_question(title: &str, content: &str) -> Result<(String, String)> {
    let title = title.trim();
    let content = content.trim();

    if title.is_empty() {
        return Err(BridgewayError::Validation("title must not be empty".into()));
    }
    if content.is_empty() {
        return Err(BridgewayError::Validation(
            "content must not be empty".into(),
        ));
    }

    Ok((title.to_string(), content.to_string()))
}

/// Question store backed by MongoDB
pub struct QuestionStore {
    questions: MongoCollection<QuestionDoc>,
    answers: MongoCollection<AnswerDoc>,
    events: Arc<EventHub>,
    pending_page_size: i64,
}

impl QuestionStore {
    /// Open the store against a connected client
    pub async fn open(
        mongo: &MongoClient,
        events: Arc<EventHub>,
        pending_page_size: i64,
    ) -> Result<Self> {
        Ok(Self {
            questions: mongo.collection(QUESTION_COLLECTION).await?,
            answers: mongo.collection(ANSWER_COLLECTION).await?,
            events,
            pending_page_size,
        })
    }

    /// Create a new pending question owned by a senior
    pub async fn create(
        &self,
        owner: &ProfileDoc,
        title: &str,
        content: &str,
    ) -> Result<QuestionDoc> {
        if owner.role != Role::Senior {
            return Err(BridgewayError::Permission(
                "only seniors can ask questions".into(),
            ));
        }

        let (title, content) = validate_new_question(title, content)?;

        let owner_id = owner
            ._id
            .map(|id| id.to_hex())
            .ok_or_else(|| BridgewayError::Validation("owner profile has no id".into()))?;

        let mut question = QuestionDoc::new(owner_id, title, content);
        let id = self.questions.insert_one(question.clone()).await?;
        question._id = Some(id);

        info!(question = %question.id_hex(), owner = %question.owner_id, "Question created");
        self.events
            .publish(ChangeEvent::new(StoreCollection::Questions, ChangeOp::Insert));

        Ok(question)
    }

    /// A senior's own questions, newest first
    pub async fn list_for_owner(&self, owner_id: &str) -> Result<Vec<QuestionDoc>> {
        self.questions
            .find_sorted(
                doc! { "owner_id": owner_id },
                Some(doc! { "metadata.created_at": -1 }),
                None,
            )
            .await
    }

    /// Pending questions for youth browsing, newest first, capped at the
    /// configured page size. AI-directed questions never appear here.
    pub async fn list_pending(&self) -> Result<Vec<QuestionDoc>> {
        self.questions
            .find_sorted(
                doc! { "status": "pending", "is_ai": { "$ne": true } },
                Some(doc! { "metadata.created_at": -1 }),
                Some(self.pending_page_size),
            )
            .await
    }

    /// Fetch one question by ID
    pub async fn get(&self, question_id: &str) -> Result<QuestionDoc> {
        let oid = parse_object_id(question_id, "question")?;
        self.questions
            .find_one(doc! { "_id": oid })
            .await?
            .ok_or_else(|| BridgewayError::NotFound(format!("question {}", question_id)))
    }

    /// Answers attached to a question, newest first
    pub async fn answers_for(&self, question_id: &str) -> Result<Vec<AnswerDoc>> {
        // Validate existence first so a bad ID surfaces as NotFound,
        // not an empty list
        let question = self.get(question_id).await?;

        self.answers
            .find_sorted(
                doc! { "question_id": question.id_hex() },
                Some(doc! { "metadata.created_at": -1 }),
                None,
            )
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_trims_and_accepts() {
        let (t, c) = validate_new_question("  How do I save photos?  ", "  details  ").unwrap();
        assert_eq!(t, "How do I save photos?");
        assert_eq!(c, "details");
    }

    #[test]
    fn test_validate_rejects_blank_title() {
        let err = validate_new_question("   ", "body").unwrap_err();
        assert!(matches!(err, BridgewayError::Validation(_)));
    }

    #[test]
    fn test_validate_rejects_blank_content() {
        let err = validate_new_question("title", "\n\t ").unwrap_err();
        assert!(matches!(err, BridgewayError::Validation(_)));
    }

    #[test]
    fn test_parse_object_id_rejects_garbage() {
        assert!(parse_object_id("not-an-oid", "question").is_err());
        assert!(parse_object_id("65f1a2b3c4d5e6f7a8b9c0d1", "question").is_ok());
    }
}
