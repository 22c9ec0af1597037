//! Acceptance workflow
//!
//! A senior closes their question by accepting exactly one answer with a
//! satisfaction rating. The commit point is a conditional single-row update
//! on the question (`status ≠ completed` in the filter) that also stamps
//! `accepted_answer_id`; with a last-write-wins backend and no locks, that
//! guarded update is what makes a divergent second accept lose. Answer
//! selection and the ledger credit follow the commit and are idempotent, so
//! a retry after a partial failure converges instead of double-crediting.

pub mod machine;

pub use machine::{check_accept, check_reject, AcceptDecision};

use bson::{doc, DateTime};
use std::sync::Arc;
use tracing::{info, warn};

use crate::db::schemas::{
    AnswerDoc, ProfileDoc, QuestionDoc, QuestionStatus, Satisfaction, ANSWER_COLLECTION,
    PROFILE_COLLECTION, QUESTION_COLLECTION,
};
use crate::db::{parse_object_id, MongoClient, MongoCollection};
use crate::events::{ChangeEvent, ChangeOp, EventHub, StoreCollection};
use crate::points::PointsLedger;
use crate::types::{BridgewayError, Result};

/// Acceptance workflow backed by MongoDB
pub struct AcceptanceWorkflow {
    questions: MongoCollection<QuestionDoc>,
    answers: MongoCollection<AnswerDoc>,
    profiles: MongoCollection<ProfileDoc>,
    ledger: PointsLedger,
    events: Arc<EventHub>,
    award_points: i64,
}

impl AcceptanceWorkflow {
    /// Open the workflow against a connected client
    pub async fn open(
        mongo: &MongoClient,
        events: Arc<EventHub>,
        award_points: i64,
    ) -> Result<Self> {
        Ok(Self {
            questions: mongo.collection(QUESTION_COLLECTION).await?,
            answers: mongo.collection(ANSWER_COLLECTION).await?,
            profiles: mongo.collection(PROFILE_COLLECTION).await?,
            ledger: PointsLedger::open(mongo, Arc::clone(&events)).await?,
            events,
            award_points,
        })
    }

    /// Accept an answer, completing the question and crediting its author
    ///
    /// Idempotent to retries of the same answer; a second accept naming a
    /// different answer fails once the first has committed.
    pub async fn accept(
        &self,
        question_id: &str,
        answer_id: &str,
        satisfaction: Satisfaction,
        caller: &ProfileDoc,
    ) -> Result<QuestionDoc> {
        let qid = parse_object_id(question_id, "question")?;
        let aid = parse_object_id(answer_id, "answer")?;

        let question = self
            .questions
            .find_one(doc! { "_id": qid })
            .await?
            .ok_or_else(|| BridgewayError::NotFound(format!("question {}", question_id)))?;
        let answer = self
            .answers
            .find_one(doc! { "_id": aid })
            .await?
            .ok_or_else(|| BridgewayError::NotFound(format!("answer {}", answer_id)))?;

        let caller_id = caller._id.map(|id| id.to_hex()).unwrap_or_default();

        let decision = check_accept(&question, &answer, &caller_id)?;
        match decision {
            machine::AcceptDecision::Proceed => {
                // Commit point: only one accept can move the question to
                // completed; everyone else sees modified_count == 0
                let commit = self
                    .questions
                    .update_one(
                        doc! { "_id": qid, "status": { "$ne": "completed" } },
                        doc! {
                            "$set": {
                                "status": "completed",
                                "satisfaction": satisfaction.as_str(),
                                "accepted_answer_id": answer.id_hex(),
                                "metadata.updated_at": DateTime::now(),
                            }
                        },
                    )
                    .await?;

                if commit.modified_count == 0 {
                    // A concurrent accept won; re-read and decide again
                    let current = self
                        .questions
                        .find_one(doc! { "_id": qid })
                        .await?
                        .ok_or_else(|| {
                            BridgewayError::NotFound(format!("question {}", question_id))
                        })?;

                    if current.accepted_answer_id.as_deref()
                        != Some(answer.id_hex().as_str())
                    {
                        return Err(BridgewayError::AlreadyAccepted);
                    }
                }

                info!(
                    question = %question.id_hex(),
                    answer = %answer.id_hex(),
                    satisfaction = satisfaction.as_str(),
                    "Answer accepted"
                );
                self.events.publish(ChangeEvent::new(
                    StoreCollection::Questions,
                    ChangeOp::Update,
                ));
            }
            machine::AcceptDecision::AlreadyAcceptedSame => {
                // Retry of a committed accept: fall through to finalize so a
                // partial earlier run (unselected answer, missing credit)
                // gets completed now
            }
        }

        self.finalize_accept(&question, &answer).await?;

        let mut completed = question;
        completed.status = QuestionStatus::Completed;
        completed.accepted_answer_id = Some(answer.id_hex());
        if decision == machine::AcceptDecision::Proceed {
            completed.satisfaction = Some(satisfaction);
        }
        Ok(completed)
    }

    /// Post-commit effects: select the answer, credit its author
    ///
    /// Every step is idempotent; failures here are retryable because the
    /// commit is already durable and the sweep repairs whatever a retry
    /// does not.
    async fn finalize_accept(&self, question: &QuestionDoc, answer: &AnswerDoc) -> Result<()> {
        let selected = self
            .answers
            .update_one(
                doc! { "_id": answer._id },
                doc! { "$set": { "is_selected": true, "metadata.updated_at": DateTime::now() } },
            )
            .await;

        if let Err(e) = selected {
            warn!(
                answer = %answer.id_hex(),
                error = %e,
                "Answer selection failed after acceptance commit"
            );
            return Err(e);
        }
        self.events
            .publish(ChangeEvent::new(StoreCollection::Answers, ChangeOp::Update));

        let description = format!("Accepted answer: {}", question.title);
        let credited = self
            .ledger
            .credit_for_answer(
                &answer.author_id,
                self.award_points,
                &description,
                &answer.id_hex(),
            )
            .await?;

        if credited {
            // Display counter; the ledger row above is the durable record
            self.profiles
                .update_one(
                    doc! { "_id": parse_object_id(&answer.author_id, "profile")? },
                    doc! { "$inc": { "answer_count": 1 } },
                )
                .await?;
        }

        Ok(())
    }

    /// Reject an answer, explicitly clearing any tentative selection
    ///
    /// Legal only while the owning question has no selected answer; the
    /// question's status does not change.
    pub async fn reject(&self, answer_id: &str, caller: &ProfileDoc) -> Result<()> {
        let aid = parse_object_id(answer_id, "answer")?;

        let answer = self
            .answers
            .find_one(doc! { "_id": aid })
            .await?
            .ok_or_else(|| BridgewayError::NotFound(format!("answer {}", answer_id)))?;

        let qid = parse_object_id(&answer.question_id, "question")?;
        let question = self
            .questions
            .find_one(doc! { "_id": qid })
            .await?
            .ok_or_else(|| BridgewayError::NotFound(format!("question {}", answer.question_id)))?;

        let has_selected = self
            .answers
            .count(doc! { "question_id": &answer.question_id, "is_selected": true })
            .await?
            > 0;

        let caller_id = caller._id.map(|id| id.to_hex()).unwrap_or_default();
        check_reject(&question, &answer, &caller_id, has_selected)?;

        self.answers
            .update_one(
                doc! { "_id": aid },
                doc! { "$set": { "is_selected": false, "metadata.updated_at": DateTime::now() } },
            )
            .await?;

        info!(answer = %answer.id_hex(), question = %question.id_hex(), "Answer rejected");
        self.events
            .publish(ChangeEvent::new(StoreCollection::Answers, ChangeOp::Update));

        Ok(())
    }
}
