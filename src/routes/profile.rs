//! HTTP routes for the caller's profile
//!
//! - GET /api/v1/profile            - Profile record behind the token
//! - GET /api/v1/profile/activities - Recent activity feed, newest first
//!
//! The activity feed is derived at read time from the question, answer, and
//! ledger collections; there is no stored activities table to drift.

use bson::doc;
use hyper::{Method, Request, Response, StatusCode};
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;

use crate::db::schemas::{
    AnswerDoc, PointHistoryDoc, PointKind, QuestionDoc, Role, ANSWER_COLLECTION,
    POINT_HISTORY_COLLECTION, QUESTION_COLLECTION,
};
use crate::db::parse_object_id;
use crate::routes::helpers::{
    authenticate, cors_preflight, error_response, json_response, method_not_allowed,
    not_found_response, require_mongo, require_profile, BoxBody,
};
use crate::server::AppState;
use crate::types::Result;

/// Number of entries in the activity feed
const ACTIVITY_LIMIT: usize = 10;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileResponse {
    pub id: String,
    pub email: String,
    pub username: String,
    pub role: Role,
    pub points: i64,
    pub answer_count: i64,
    pub created_at: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ActivityResponse {
    pub id: String,
    /// "question", "answer", or "point"
    pub kind: &'static str,
    pub title: String,
    pub date: String,
    pub status: String,
    #[serde(skip)]
    sort_key: i64,
}

async fn handle_profile(
    req: Request<hyper::body::Incoming>,
    state: Arc<AppState>,
) -> Result<Response<BoxBody>> {
    let claims = authenticate(&req, &state)?;

    let mongo = require_mongo(&state)?;
    let profile = require_profile(mongo, &claims).await?;

    Ok(json_response(
        StatusCode::OK,
        &ProfileResponse {
            id: claims.profile_id,
            email: profile.email,
            username: profile.username,
            role: profile.role,
            points: profile.points,
            answer_count: profile.answer_count,
            created_at: profile.metadata.created_rfc3339(),
        },
    ))
}

async fn handle_activities(
    req: Request<hyper::body::Incoming>,
    state: Arc<AppState>,
) -> Result<Response<BoxBody>> {
    let claims = authenticate(&req, &state)?;

    let mongo = require_mongo(&state)?;
    let profile = require_profile(mongo, &claims).await?;
    let profile_id = claims.profile_id.clone();

    let mut activities: Vec<ActivityResponse> = Vec::new();
    let limit = ACTIVITY_LIMIT as i64;

    match profile.role {
        Role::Senior => {
            let questions = mongo.collection::<QuestionDoc>(QUESTION_COLLECTION).await?;
            for q in questions
                .find_sorted(
                    doc! { "owner_id": &profile_id },
                    Some(doc! { "metadata.created_at": -1 }),
                    Some(limit),
                )
                .await?
            {
                activities.push(ActivityResponse {
                    id: q.id_hex(),
                    kind: "question",
                    title: q.title.clone(),
                    date: q.metadata.created_rfc3339(),
                    status: q.status.to_string(),
                    sort_key: q.metadata.created_at.map(|t| t.timestamp_millis()).unwrap_or(0),
                });
            }
        }
        Role::Youth => {
            let answers = mongo.collection::<AnswerDoc>(ANSWER_COLLECTION).await?;
            let questions = mongo.collection::<QuestionDoc>(QUESTION_COLLECTION).await?;

            let own_answers = answers
                .find_sorted(
                    doc! { "author_id": &profile_id },
                    Some(doc! { "metadata.created_at": -1 }),
                    Some(limit),
                )
                .await?;

            // Resolve question titles for the answers in the window
            let mut titles: HashMap<String, String> = HashMap::new();
            for a in &own_answers {
                if titles.contains_key(&a.question_id) {
                    continue;
                }
                if let Ok(qid) = parse_object_id(&a.question_id, "question") {
                    if let Some(q) = questions.find_one(doc! { "_id": qid }).await? {
                        titles.insert(a.question_id.clone(), q.title);
                    }
                }
            }

            for a in own_answers {
                let title = titles
                    .get(&a.question_id)
                    .cloned()
                    .unwrap_or_else(|| "(question removed)".to_string());
                activities.push(ActivityResponse {
                    id: a.id_hex(),
                    kind: "answer",
                    title,
                    date: a.metadata.created_rfc3339(),
                    status: if a.is_selected { "selected" } else { "submitted" }.to_string(),
                    sort_key: a.metadata.created_at.map(|t| t.timestamp_millis()).unwrap_or(0),
                });
            }
        }
    }

    let entries = mongo
        .collection::<PointHistoryDoc>(POINT_HISTORY_COLLECTION)
        .await?;
    for e in entries
        .find_sorted(
            doc! { "user_id": &profile_id },
            Some(doc! { "metadata.created_at": -1 }),
            Some(limit),
        )
        .await?
    {
        let signed = match e.kind {
            PointKind::Earn => format!("+{}", e.amount),
            PointKind::Use => format!("-{}", e.amount),
        };
        activities.push(ActivityResponse {
            id: e._id.map(|id| id.to_hex()).unwrap_or_default(),
            kind: "point",
            title: e.description.clone(),
            date: e.metadata.created_rfc3339(),
            status: signed,
            sort_key: e.metadata.created_at.map(|t| t.timestamp_millis()).unwrap_or(0),
        });
    }

    activities.sort_by(|a, b| b.sort_key.cmp(&a.sort_key));
    activities.truncate(ACTIVITY_LIMIT);

    Ok(json_response(StatusCode::OK, &activities))
}

/// Handle /api/v1/profile* requests
pub async fn handle_profile_request(
    req: Request<hyper::body::Incoming>,
    state: Arc<AppState>,
) -> Response<BoxBody> {
    let method = req.method().clone();
    let path = req.uri().path().to_string();
    let path = path.split('?').next().unwrap_or(&path).to_string();

    if method == Method::OPTIONS {
        return cors_preflight();
    }

    let result = match (method, path.as_str()) {
        (Method::GET, "/api/v1/profile") => handle_profile(req, state).await,
        (Method::GET, "/api/v1/profile/activities") => handle_activities(req, state).await,

        (_, "/api/v1/profile") | (_, "/api/v1/profile/activities") => {
            return method_not_allowed()
        }

        _ => return not_found_response(&path),
    };

    result.unwrap_or_else(|e| error_response(&e))
}
