//! Consistency sweep
//!
//! The two-row write sequences (answer insert + status flip, acceptance
//! commit + selection + credit) have no transaction around them, so a crash
//! or failed second write leaves residue. This sweep walks the collections
//! on an interval and converges them back to the invariants:
//!
//! - pending questions that already have answers → answered
//! - answered questions with no live answers → pending
//! - completed questions whose accepted answer is not selected → select it,
//!   and unselect any other answer of that question
//! - completed questions missing their EARN ledger entry → credit it
//! - profile point caches that drifted from the ledger fold → rewrite

use bson::{doc, DateTime};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::db::schemas::{
    AnswerDoc, PointHistoryDoc, ProfileDoc, QuestionDoc, ANSWER_COLLECTION,
    POINT_HISTORY_COLLECTION, PROFILE_COLLECTION, QUESTION_COLLECTION,
};
use crate::db::{parse_object_id, MongoClient};
use crate::events::{ChangeEvent, ChangeOp, EventHub, StoreCollection};
use crate::points::{summarize_entries, PointsLedger};
use crate::types::Result;

/// Counts of repairs applied by one sweep run
#[derive(Debug, Default, Clone, Copy)]
pub struct SweepStats {
    pub questions_answered: u64,
    pub questions_requeued: u64,
    pub selections_repaired: u64,
    pub credits_repaired: u64,
    pub balances_rewritten: u64,
}

impl SweepStats {
    pub fn total(&self) -> u64 {
        self.questions_answered
            + self.questions_requeued
            + self.selections_repaired
            + self.credits_repaired
            + self.balances_rewritten
    }
}

/// Run one sweep pass over all collections
pub async fn run_sweep(
    mongo: &MongoClient,
    events: &Arc<EventHub>,
    award_points: i64,
) -> Result<SweepStats> {
    let questions = mongo.collection::<QuestionDoc>(QUESTION_COLLECTION).await?;
    let answers = mongo.collection::<AnswerDoc>(ANSWER_COLLECTION).await?;
    let profiles = mongo.collection::<ProfileDoc>(PROFILE_COLLECTION).await?;
    let entries = mongo
        .collection::<PointHistoryDoc>(POINT_HISTORY_COLLECTION)
        .await?;
    let ledger = PointsLedger::open(mongo, Arc::clone(events)).await?;

    let mut stats = SweepStats::default();

    // Pending questions that already have answers: the status flip after the
    // answer insert never landed
    for question in questions.find_many(doc! { "status": "pending" }).await? {
        let qid = question.id_hex();
        let first = answers
            .find_sorted(
                doc! { "question_id": &qid },
                Some(doc! { "metadata.created_at": 1 }),
                Some(1),
            )
            .await?;

        if let Some(first) = first.first() {
            let updated = questions
                .update_one(
                    doc! { "_id": question._id, "status": "pending" },
                    doc! {
                        "$set": {
                            "status": "answered",
                            "answered_by": &first.author_id,
                            "answered_at": first.metadata.created_at.unwrap_or_else(DateTime::now),
                            "metadata.updated_at": DateTime::now(),
                        }
                    },
                )
                .await?;
            if updated.modified_count > 0 {
                info!(question = %qid, "Sweep: flipped answered question out of pending");
                stats.questions_answered += 1;
            }
        }
    }

    // Answered questions with no live answers (an answer was removed after
    // the flip): back to pending so youth can see them again
    for question in questions.find_many(doc! { "status": "answered" }).await? {
        let qid = question.id_hex();
        let count = answers.count(doc! { "question_id": &qid }).await?;
        if count == 0 {
            let updated = questions
                .update_one(
                    doc! { "_id": question._id, "status": "answered" },
                    doc! {
                        "$set": { "status": "pending", "metadata.updated_at": DateTime::now() },
                        "$unset": { "answered_by": "", "answered_at": "" },
                    },
                )
                .await?;
            if updated.modified_count > 0 {
                info!(question = %qid, "Sweep: requeued answered question with no answers");
                stats.questions_requeued += 1;
            }
        }
    }

    // Completed questions: selection and credit must both exist
    for question in questions.find_many(doc! { "status": "completed" }).await? {
        let qid = question.id_hex();
        let Some(ref accepted_id) = question.accepted_answer_id else {
            // Completed before the accepted_answer_id stamp existed;
            // nothing to anchor a repair on
            warn!(question = %qid, "Sweep: completed question without accepted answer id");
            continue;
        };

        let Ok(aid) = parse_object_id(accepted_id, "answer") else {
            warn!(question = %qid, answer = %accepted_id, "Sweep: malformed accepted answer id");
            continue;
        };

        let accepted = answers.find_one(doc! { "_id": aid }).await?;
        let Some(accepted) = accepted else {
            warn!(question = %qid, answer = %accepted_id, "Sweep: accepted answer missing");
            continue;
        };

        if !accepted.is_selected {
            answers
                .update_one(
                    doc! { "_id": aid },
                    doc! { "$set": { "is_selected": true, "metadata.updated_at": DateTime::now() } },
                )
                .await?;
            info!(question = %qid, answer = %accepted_id, "Sweep: repaired answer selection");
            stats.selections_repaired += 1;
            events.publish(ChangeEvent::new(StoreCollection::Answers, ChangeOp::Update));
        }

        // At most one selected answer per question
        let strays = answers
            .update_many(
                doc! {
                    "question_id": &qid,
                    "_id": { "$ne": aid },
                    "is_selected": true,
                },
                doc! { "$set": { "is_selected": false, "metadata.updated_at": DateTime::now() } },
            )
            .await?;
        if strays.modified_count > 0 {
            info!(
                question = %qid,
                count = strays.modified_count,
                "Sweep: unselected stray answers"
            );
            stats.selections_repaired += strays.modified_count;
            events.publish(ChangeEvent::new(StoreCollection::Answers, ChangeOp::Update));
        }

        // Missing EARN entry for the accepted answer
        let existing = entries
            .find_one(doc! { "source_answer_id": accepted_id })
            .await?;
        if existing.is_none() {
            let description = format!("Accepted answer: {}", question.title);
            if ledger
                .credit_for_answer(&accepted.author_id, award_points, &description, accepted_id)
                .await?
            {
                info!(
                    question = %qid,
                    author = %accepted.author_id,
                    "Sweep: credited missing acceptance award"
                );
                stats.credits_repaired += 1;
            }
        }
    }

    // Cached profile balances: the ledger fold is authoritative
    for profile in profiles.find_many(doc! {}).await? {
        let Some(pid) = profile._id else { continue };
        let ledger_entries = entries
            .find_many(doc! { "user_id": pid.to_hex() })
            .await?;
        let summary = summarize_entries(&ledger_entries);

        if profile.points != summary.total_points {
            profiles
                .update_one(
                    doc! { "_id": pid },
                    doc! { "$set": {
                        "points": summary.total_points,
                        "metadata.updated_at": DateTime::now(),
                    } },
                )
                .await?;
            info!(
                profile = %pid.to_hex(),
                cached = profile.points,
                ledger = summary.total_points,
                "Sweep: rewrote drifted point balance"
            );
            stats.balances_rewritten += 1;
            events.publish(ChangeEvent::new(StoreCollection::Profiles, ChangeOp::Update));
        }
    }

    Ok(stats)
}

/// Spawn the periodic sweep task
pub fn spawn_sweep_task(
    mongo: MongoClient,
    events: Arc<EventHub>,
    award_points: i64,
    interval: Duration,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        // The first tick fires immediately; skip it so startup stays quiet
        ticker.tick().await;

        loop {
            ticker.tick().await;
            match run_sweep(&mongo, &events, award_points).await {
                Ok(stats) if stats.total() > 0 => {
                    info!(
                        answered = stats.questions_answered,
                        requeued = stats.questions_requeued,
                        selections = stats.selections_repaired,
                        credits = stats.credits_repaired,
                        balances = stats.balances_rewritten,
                        "Consistency sweep applied repairs"
                    );
                }
                Ok(_) => debug!("Consistency sweep: nothing to repair"),
                Err(e) => warn!("Consistency sweep failed: {}", e),
            }
        }
    })
}
