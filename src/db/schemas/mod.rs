//! Database schemas for Bridgeway
//!
//! Defines MongoDB document structures for accounts, profiles, questions,
//! answers, and the point ledger.

mod account;
mod answer;
mod metadata;
mod point_history;
mod profile;
mod question;

pub use account::{AccountDoc, ACCOUNT_COLLECTION};
pub use answer::{AnswerDoc, ANSWER_COLLECTION};
pub use metadata::Metadata;
pub use point_history::{PointHistoryDoc, PointKind, POINT_HISTORY_COLLECTION};
pub use profile::{ProfileDoc, Role, PROFILE_COLLECTION};
pub use question::{QuestionDoc, QuestionStatus, Satisfaction, QUESTION_COLLECTION};
