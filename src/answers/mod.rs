//! Answer store
//!
//! Answers attach to a question until it completes; the first answer flips
//! the question from pending to answered. All preconditions are checked
//! server-side because two youths can submit at the same moment.
//!
//! The insert and the status flip are logically one transaction but land as
//! two single-row writes. A failed flip leaves a pending question that
//! already has answers; the consistency sweep converges that state instead
//! of deleting the youth's committed answer (see `crate::sweep`).

use bson::{doc, DateTime};
use std::sync::Arc;
use tracing::{info, warn};

use crate::db::schemas::{
    AnswerDoc, ProfileDoc, QuestionDoc, QuestionStatus, Role, ANSWER_COLLECTION,
    QUESTION_COLLECTION,
};
use crate::db::{parse_object_id, MongoClient, MongoCollection};
use crate::events::{ChangeEvent, ChangeOp, EventHub, StoreCollection};
use crate::types::{BridgewayError, Result};

/// Minimum answer length after trimming
pub const MIN_ANSWER_CHARS: usize = 10;

/// Validate and trim answer content
pub fn validate_answer_content(content: &str) -> Result<String> {
    let content = content.trim();
    if content.chars().count() < MIN_ANSWER_CHARS {
        return Err(BridgewayError::Validation(format!(
            "answer must be at least {} characters",
            MIN_ANSWER_CHARS
        )));
    }
    Ok(content.to_string())
}

/// Server-side preconditions for submitting an answer
///
/// Ownership is checked before status so a senior answering their own
/// question is rejected for that reason regardless of the question's state.
pub fn check_submit(question: &QuestionDoc, author: &ProfileDoc) -> Result<()> {
    let author_id = author._id.map(|id| id.to_hex()).unwrap_or_default();

    if author_id == question.owner_id {
        return Err(BridgewayError::SelfAnswerForbidden);
    }

    if author.role != Role::Youth {
        return Err(BridgewayError::Permission(
            "only youth can submit answers".into(),
        ));
    }

    if question.status == QuestionStatus::Completed {
        return Err(BridgewayError::StateConflict(
            "question is already completed".into(),
        ));
    }

    Ok(())
}

/// Answer store backed by MongoDB
pub struct AnswerStore {
    questions: MongoCollection<QuestionDoc>,
    answers: MongoCollection<AnswerDoc>,
    events: Arc<EventHub>,
}

impl AnswerStore {
    /// Open the store against a connected client
    pub async fn open(mongo: &MongoClient, events: Arc<EventHub>) -> Result<Self> {
        Ok(Self {
            questions: mongo.collection(QUESTION_COLLECTION).await?,
            answers: mongo.collection(ANSWER_COLLECTION).await?,
            events,
        })
    }

    /// Submit an answer to a question
    ///
    /// On success the answer is inserted and, when it is the first one, the
    /// question moves pending → answered with answered_by/answered_at
    /// stamped.
    pub async fn submit(
        &self,
        question_id: &str,
        author: &ProfileDoc,
        content: &str,
    ) -> Result<AnswerDoc> {
        let content = validate_answer_content(content)?;
        let qid = parse_object_id(question_id, "question")?;

        let question = self
            .questions
            .find_one(doc! { "_id": qid })
            .await?
            .ok_or_else(|| BridgewayError::NotFound(format!("question {}", question_id)))?;

        check_submit(&question, author)?;

        let author_id = author
            ._id
            .map(|id| id.to_hex())
            .ok_or_else(|| BridgewayError::Validation("author profile has no id".into()))?;

        let mut answer = AnswerDoc::new(question.id_hex(), author_id.clone(), content);
        let id = self.answers.insert_one(answer.clone()).await?;
        answer._id = Some(id);

        info!(
            answer = %answer.id_hex(),
            question = %question.id_hex(),
            author = %author_id,
            "Answer submitted"
        );

        // First answer flips the question to answered. The status filter in
        // the update doubles as the guard: when another answer already won
        // the flip, modified_count is 0 and there is nothing left to do.
        if question.status == QuestionStatus::Pending {
            let flip = doc! {
                "$set": {
                    "status": "answered",
                    "answered_by": &author_id,
                    "answered_at": DateTime::now(),
                    "metadata.updated_at": DateTime::now(),
                }
            };
            let filter = doc! { "_id": qid, "status": "pending" };

            let mut flipped = self.questions.update_one(filter.clone(), flip.clone()).await;
            if flipped.is_err() {
                // One retry, then leave the residue to the sweep; the
                // answer itself is committed and must not be lost
                flipped = self.questions.update_one(filter, flip).await;
            }

            match flipped {
                Ok(result) if result.modified_count > 0 => {
                    self.events.publish(ChangeEvent::new(
                        StoreCollection::Questions,
                        ChangeOp::Update,
                    ));
                }
                Ok(_) => {
                    // Lost the race to another first answer
                }
                Err(e) => {
                    warn!(
                        question = %question.id_hex(),
                        error = %e,
                        "Status flip failed after answer insert; sweep will reconcile"
                    );
                }
            }
        }

        self.events
            .publish(ChangeEvent::new(StoreCollection::Answers, ChangeOp::Insert));

        Ok(answer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bson::oid::ObjectId;
    use crate::db::schemas::Satisfaction;

    fn profile(id: &str, role: Role) -> ProfileDoc {
        let mut p = ProfileDoc::new(
            "acct".into(),
            format!("{}@example.com", id),
            role,
        );
        p._id = Some(ObjectId::parse_str(id).unwrap());
        p
    }

    fn question(owner_hex: &str, status: QuestionStatus) -> QuestionDoc {
        let mut q = QuestionDoc::new(owner_hex.into(), "T".into(), "C".into());
        q._id = Some(ObjectId::new());
        q.status = status;
        q
    }

    const SENIOR_ID: &str = "65f1a2b3c4d5e6f7a8b9c0d1";
    const YOUTH_ID: &str = "65f1a2b3c4d5e6f7a8b9c0d2";

    #[test]
    fn test_owner_cannot_answer_own_question_regardless_of_status() {
        // The owner's profile is a senior, but the self-answer rejection
        // must win over both the role check and the status check
        let owner = profile(SENIOR_ID, Role::Senior);
        for status in [
            QuestionStatus::Pending,
            QuestionStatus::Answered,
            QuestionStatus::Completed,
        ] {
            let q = question(SENIOR_ID, status);
            let err = check_submit(&q, &owner).unwrap_err();
            assert!(matches!(err, BridgewayError::SelfAnswerForbidden));
        }
    }

    #[test]
    fn test_senior_cannot_answer_someone_elses_question() {
        let other_senior = profile(YOUTH_ID, Role::Senior);
        let q = question(SENIOR_ID, QuestionStatus::Pending);
        let err = check_submit(&q, &other_senior).unwrap_err();
        assert!(matches!(err, BridgewayError::Permission(_)));
    }

    #[test]
    fn test_youth_can_answer_pending_and_answered() {
        let youth = profile(YOUTH_ID, Role::Youth);
        let q = question(SENIOR_ID, QuestionStatus::Pending);
        assert!(check_submit(&q, &youth).is_ok());

        let q = question(SENIOR_ID, QuestionStatus::Answered);
        assert!(check_submit(&q, &youth).is_ok());
    }

    #[test]
    fn test_completed_question_rejects_answers() {
        let youth = profile(YOUTH_ID, Role::Youth);
        let mut q = question(SENIOR_ID, QuestionStatus::Completed);
        q.satisfaction = Some(Satisfaction::Good);
        let err = check_submit(&q, &youth).unwrap_err();
        assert!(matches!(err, BridgewayError::StateConflict(_)));
    }

    #[test]
    fn test_content_length_floor() {
        assert!(validate_answer_content("too short").is_err());
        assert!(validate_answer_content("   padded but still short   ").is_ok());
        assert!(validate_answer_content("Open the photo app, then tap albums.").is_ok());
    }
}
