//! Acceptance transition rules
//!
//! Pure decision logic for accepting and rejecting answers, separated from
//! the writes so the rules can be tested without a store. The effectful
//! workflow in the parent module consults these before touching MongoDB.

use crate::db::schemas::{AnswerDoc, QuestionDoc, QuestionStatus};
use crate::types::{BridgewayError, Result};

/// Outcome of checking an accept request against current state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AcceptDecision {
    /// Question is open; proceed to the commit
    Proceed,
    /// This exact answer was already accepted — a retry, not a conflict
    AlreadyAcceptedSame,
}

/// Decide whether an accept may proceed
///
/// Rules, in order:
/// - the answer must belong to the question
/// - only the question's owner may accept
/// - a completed question accepts nothing new; retrying the accepted answer
///   is recognized as idempotent, any other answer conflicts
pub fn check_accept(
    question: &QuestionDoc,
    answer: &AnswerDoc,
    caller_profile_id: &str,
) -> Result<AcceptDecision> {
    if answer.question_id != question.id_hex() {
        return Err(BridgewayError::Validation(
            "answer does not belong to this question".into(),
        ));
    }

    if caller_profile_id != question.owner_id {
        return Err(BridgewayError::Permission(
            "only the question owner can accept an answer".into(),
        ));
    }

    if question.status == QuestionStatus::Completed {
        if question.accepted_answer_id.as_deref() == Some(answer.id_hex().as_str()) {
            return Ok(AcceptDecision::AlreadyAcceptedSame);
        }
        return Err(BridgewayError::AlreadyAccepted);
    }

    Ok(AcceptDecision::Proceed)
}

/// Decide whether a reject may proceed
///
/// Rejection is only legal while the owning question has no currently
/// selected answer; it exists to reverse a tentative selection, never to
/// undo an acceptance.
pub fn check_reject(
    question: &QuestionDoc,
    answer: &AnswerDoc,
    caller_profile_id: &str,
    has_selected_answer: bool,
) -> Result<()> {
    if answer.question_id != question.id_hex() {
        return Err(BridgewayError::Validation(
            "answer does not belong to this question".into(),
        ));
    }

    if caller_profile_id != question.owner_id {
        return Err(BridgewayError::Permission(
            "only the question owner can reject an answer".into(),
        ));
    }

    if question.status == QuestionStatus::Completed || has_selected_answer {
        return Err(BridgewayError::StateConflict(
            "an answer has already been selected for this question".into(),
        ));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use bson::oid::ObjectId;
    use crate::db::schemas::Satisfaction;

    const OWNER: &str = "65f1a2b3c4d5e6f7a8b9c0d1";
    const STRANGER: &str = "65f1a2b3c4d5e6f7a8b9c0d9";

    fn open_question(status: QuestionStatus) -> QuestionDoc {
        let mut q = QuestionDoc::new(OWNER.into(), "T".into(), "C".into());
        q._id = Some(ObjectId::new());
        q.status = status;
        q
    }

    fn answer_for(q: &QuestionDoc) -> AnswerDoc {
        let mut a = AnswerDoc::new(q.id_hex(), "youth-1".into(), "Tap the albums button.".into());
        a._id = Some(ObjectId::new());
        a
    }

    fn completed_with(a: &AnswerDoc) -> QuestionDoc {
        let mut q = QuestionDoc::new(OWNER.into(), "T".into(), "C".into());
        q._id = Some(ObjectId::parse_str(&a.question_id).unwrap());
        q.status = QuestionStatus::Completed;
        q.satisfaction = Some(Satisfaction::Good);
        q.accepted_answer_id = Some(a.id_hex());
        q
    }

    #[test]
    fn test_accept_from_pending_and_answered() {
        for status in [QuestionStatus::Pending, QuestionStatus::Answered] {
            let q = open_question(status);
            let a = answer_for(&q);
            assert_eq!(check_accept(&q, &a, OWNER).unwrap(), AcceptDecision::Proceed);
        }
    }

    #[test]
    fn test_second_accept_of_different_answer_conflicts() {
        let q = open_question(QuestionStatus::Answered);
        let winner = answer_for(&q);
        let q = completed_with(&winner);

        let loser = answer_for(&q);
        let err = check_accept(&q, &loser, OWNER).unwrap_err();
        assert!(matches!(err, BridgewayError::AlreadyAccepted));
    }

    #[test]
    fn test_retry_of_same_accept_is_idempotent() {
        let q = open_question(QuestionStatus::Answered);
        let winner = answer_for(&q);
        let q = completed_with(&winner);

        assert_eq!(
            check_accept(&q, &winner, OWNER).unwrap(),
            AcceptDecision::AlreadyAcceptedSame
        );
    }

    #[test]
    fn test_only_owner_accepts() {
        let q = open_question(QuestionStatus::Answered);
        let a = answer_for(&q);
        let err = check_accept(&q, &a, STRANGER).unwrap_err();
        assert!(matches!(err, BridgewayError::Permission(_)));
    }

    #[test]
    fn test_accept_rejects_foreign_answer() {
        let q = open_question(QuestionStatus::Answered);
        let other_q = open_question(QuestionStatus::Answered);
        let a = answer_for(&other_q);
        let err = check_accept(&q, &a, OWNER).unwrap_err();
        assert!(matches!(err, BridgewayError::Validation(_)));
    }

    #[test]
    fn test_reject_legal_before_any_selection() {
        let q = open_question(QuestionStatus::Answered);
        let a = answer_for(&q);
        assert!(check_reject(&q, &a, OWNER, false).is_ok());
    }

    #[test]
    fn test_reject_blocked_once_selected() {
        let q = open_question(QuestionStatus::Answered);
        let a = answer_for(&q);
        let err = check_reject(&q, &a, OWNER, true).unwrap_err();
        assert!(matches!(err, BridgewayError::StateConflict(_)));
    }

    #[test]
    fn test_reject_blocked_on_completed_question() {
        let q = open_question(QuestionStatus::Answered);
        let winner = answer_for(&q);
        let q = completed_with(&winner);
        let err = check_reject(&q, &winner, OWNER, true).unwrap_err();
        assert!(matches!(err, BridgewayError::StateConflict(_)));
    }

    #[test]
    fn test_only_owner_rejects() {
        let q = open_question(QuestionStatus::Answered);
        let a = answer_for(&q);
        let err = check_reject(&q, &a, STRANGER, false).unwrap_err();
        assert!(matches!(err, BridgewayError::Permission(_)));
    }

    #[test]
    fn test_question_lifecycle_decisions() {
        use crate::answers::check_submit;
        use crate::db::schemas::{ProfileDoc, Role};

        let youth1 = {
            let mut p = ProfileDoc::new("acct-y1".into(), "y1@example.com".into(), Role::Youth);
            p._id = Some(ObjectId::new());
            p
        };
        let youth2 = {
            let mut p = ProfileDoc::new("acct-y2".into(), "y2@example.com".into(), Role::Youth);
            p._id = Some(ObjectId::new());
            p
        };

        // Senior asks: question starts pending, both youths may answer
        let mut q = open_question(QuestionStatus::Pending);
        assert!(check_submit(&q, &youth1).is_ok());

        // First answer lands: pending → answered, second answer still welcome
        q.status = QuestionStatus::Answered;
        let a1 = answer_for(&q);
        assert!(check_submit(&q, &youth2).is_ok());
        let a2 = answer_for(&q);

        // Owner accepts a1 with a rating: question completes
        assert_eq!(check_accept(&q, &a1, OWNER).unwrap(), AcceptDecision::Proceed);
        q.status = QuestionStatus::Completed;
        q.satisfaction = Some(Satisfaction::Good);
        q.accepted_answer_id = Some(a1.id_hex());

        // Once completed: no new answers, no divergent accept, retry is a no-op
        let err = check_submit(&q, &youth2).unwrap_err();
        assert!(matches!(err, BridgewayError::StateConflict(_)));
        let err = check_accept(&q, &a2, OWNER).unwrap_err();
        assert!(matches!(err, BridgewayError::AlreadyAccepted));
        assert_eq!(
            check_accept(&q, &a1, OWNER).unwrap(),
            AcceptDecision::AlreadyAcceptedSame
        );
    }
}
