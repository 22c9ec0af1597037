//! Points ledger
//!
//! Append-only EARN/USE entries per profile. The ledger is the source of
//! truth for balances; the `points` field on a profile is a display cache
//! that the sweep rewrites whenever it drifts.

use bson::doc;
use serde::Serialize;
use std::sync::Arc;
use tracing::info;

use crate::db::schemas::{
    PointHistoryDoc, PointKind, ProfileDoc, POINT_HISTORY_COLLECTION, PROFILE_COLLECTION,
};
use crate::db::{parse_object_id, MongoClient, MongoCollection};
use crate::events::{ChangeEvent, ChangeOp, EventHub, StoreCollection};
use crate::types::{BridgewayError, Result};

/// Balance summary folded from the ledger
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PointSummary {
    pub total_earned: i64,
    pub total_used: i64,
    pub total_points: i64,
}

/// Fold ledger entries into a summary
///
/// EARN amounts count toward earned, USE amounts toward used; the balance is
/// exactly earned − used. Integer arithmetic, no drift.
pub fn summarize_entries(entries: &[PointHistoryDoc]) -> PointSummary {
    let (earned, used) = entries.iter().fold((0i64, 0i64), |(e, u), entry| {
        match entry.kind {
            PointKind::Earn => (e + entry.amount, u),
            PointKind::Use => (e, u + entry.amount),
        }
    });

    PointSummary {
        total_earned: earned,
        total_used: used,
        total_points: earned - used,
    }
}

/// Points ledger backed by MongoDB
pub struct PointsLedger {
    entries: MongoCollection<PointHistoryDoc>,
    profiles: MongoCollection<ProfileDoc>,
    events: Arc<EventHub>,
}

impl PointsLedger {
    /// Open the ledger against a connected client
    pub async fn open(mongo: &MongoClient, events: Arc<EventHub>) -> Result<Self> {
        Ok(Self {
            entries: mongo.collection(POINT_HISTORY_COLLECTION).await?,
            profiles: mongo.collection(PROFILE_COLLECTION).await?,
            events,
        })
    }

    /// A profile's ledger entries, newest first
    pub async fn history(&self, user_id: &str) -> Result<Vec<PointHistoryDoc>> {
        self.entries
            .find_sorted(
                doc! { "user_id": user_id },
                Some(doc! { "metadata.created_at": -1 }),
                None,
            )
            .await
    }

    /// Fold the full ledger for a profile
    pub async fn summarize(&self, user_id: &str) -> Result<PointSummary> {
        let entries = self.entries.find_many(doc! { "user_id": user_id }).await?;
        Ok(summarize_entries(&entries))
    }

    /// Credit an acceptance award to an answer's author
    ///
    /// Idempotent per answer: the unique sparse index on source_answer_id
    /// absorbs retries. Returns false when the entry already existed.
    pub async fn credit_for_answer(
        &self,
        user_id: &str,
        amount: i64,
        description: &str,
        answer_id: &str,
    ) -> Result<bool> {
        let entry = PointHistoryDoc::earn(
            user_id.to_string(),
            amount,
            description.to_string(),
            answer_id.to_string(),
        );

        match self.entries.insert_one(entry).await {
            Ok(_) => {}
            Err(BridgewayError::Database(msg)) if msg.contains("E11000") => {
                return Ok(false);
            }
            Err(e) => return Err(e),
        }

        // Maintain the cached balance; ledger remains authoritative
        self.profiles
            .update_one(
                doc! { "_id": parse_object_id(user_id, "profile")? },
                doc! { "$inc": { "points": amount } },
            )
            .await?;

        info!(user = %user_id, amount, answer = %answer_id, "Points credited");
        self.events.publish(ChangeEvent::new(
            StoreCollection::PointHistory,
            ChangeOp::Insert,
        ));

        Ok(true)
    }

    /// Spend points (gift voucher exchange and the like)
    ///
    /// The balance check folds the ledger rather than trusting the cached
    /// profile field.
    pub async fn redeem(
        &self,
        profile: &ProfileDoc,
        amount: i64,
        description: &str,
    ) -> Result<PointHistoryDoc> {
        if amount <= 0 {
            return Err(BridgewayError::Validation(
                "redeem amount must be positive".into(),
            ));
        }
        let description = description.trim();
        if description.is_empty() {
            return Err(BridgewayError::Validation(
                "redeem description must not be empty".into(),
            ));
        }

        let oid = profile
            ._id
            .ok_or_else(|| BridgewayError::Validation("profile has no id".into()))?;
        let user_id = oid.to_hex();

        let summary = self.summarize(&user_id).await?;
        if summary.total_points < amount {
            return Err(BridgewayError::StateConflict(format!(
                "insufficient points: have {}, need {}",
                summary.total_points, amount
            )));
        }

        let mut entry = PointHistoryDoc::spend(user_id.clone(), amount, description.to_string());
        let id = self.entries.insert_one(entry.clone()).await?;
        entry._id = Some(id);

        self.profiles
            .update_one(doc! { "_id": oid }, doc! { "$inc": { "points": -amount } })
            .await?;

        info!(user = %user_id, amount, "Points redeemed");
        self.events.publish(ChangeEvent::new(
            StoreCollection::PointHistory,
            ChangeOp::Insert,
        ));

        Ok(entry)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn earn(amount: i64) -> PointHistoryDoc {
        PointHistoryDoc::earn("u1".into(), amount, "accepted answer".into(), "a1".into())
    }

    fn spend(amount: i64) -> PointHistoryDoc {
        PointHistoryDoc::spend("u1".into(), amount, "gift voucher".into())
    }

    #[test]
    fn test_summarize_empty_ledger() {
        let s = summarize_entries(&[]);
        assert_eq!(
            s,
            PointSummary {
                total_earned: 0,
                total_used: 0,
                total_points: 0
            }
        );
    }

    #[test]
    fn test_summarize_separates_kinds() {
        let s = summarize_entries(&[earn(100), spend(50)]);
        assert_eq!(s.total_earned, 100);
        assert_eq!(s.total_used, 50);
        assert_eq!(s.total_points, 50);
    }

    #[test]
    fn test_summarize_exact_integer_fold() {
        let entries: Vec<_> = (0..7)
            .map(|_| earn(100))
            .chain((0..3).map(|_| spend(33)))
            .collect();
        let s = summarize_entries(&entries);
        assert_eq!(s.total_earned, 700);
        assert_eq!(s.total_used, 99);
        assert_eq!(s.total_points, 601);
    }

    #[test]
    fn test_summarize_can_go_negative() {
        // The fold never clamps; a drifted ledger shows its true state
        let s = summarize_entries(&[earn(10), spend(25)]);
        assert_eq!(s.total_points, -15);
    }
}
