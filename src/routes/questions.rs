//! HTTP routes for questions and question-scoped answer operations
//!
//! - POST /api/v1/questions                 - Ask a question (senior)
//! - GET  /api/v1/questions/mine            - Own questions, newest first (senior)
//! - GET  /api/v1/questions/pending         - Browse pending questions (youth)
//! - GET  /api/v1/questions/{id}            - Fetch one question
//! - GET  /api/v1/questions/{id}/answers    - Answers, newest first
//! - POST /api/v1/questions/{id}/answers    - Submit an answer (youth)
//! - POST /api/v1/questions/{id}/accept     - Accept an answer (senior owner)

use hyper::{Method, Request, Response, StatusCode};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::acceptance::AcceptanceWorkflow;
use crate::answers::AnswerStore;
use crate::auth::is_operation_allowed;
use crate::db::schemas::{AnswerDoc, QuestionDoc, QuestionStatus, Satisfaction};
use crate::questions::QuestionStore;
use crate::routes::helpers::{
    authenticate, cors_preflight, error_response, json_response, method_not_allowed,
    not_found_response, parse_json_body, require_mongo, require_profile, BoxBody,
};
use crate::server::AppState;
use crate::types::{BridgewayError, Result};

// =============================================================================
// Request/Response Types
// =============================================================================

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateQuestionRequest {
    pub title: String,
    pub content: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitAnswerRequest {
    pub content: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AcceptAnswerRequest {
    pub answer_id: String,
    /// "neutral", "good", or "excellent"
    pub satisfaction: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QuestionResponse {
    pub id: String,
    pub title: String,
    pub content: String,
    pub status: QuestionStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub satisfaction: Option<Satisfaction>,
    pub created_at: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub accepted_answer_id: Option<String>,
}

impl From<&QuestionDoc> for QuestionResponse {
    fn from(q: &QuestionDoc) -> Self {
        Self {
            id: q.id_hex(),
            title: q.title.clone(),
            content: q.content.clone(),
            status: q.status,
            satisfaction: q.satisfaction,
            created_at: q.metadata.created_rfc3339(),
            accepted_answer_id: q.accepted_answer_id.clone(),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnswerResponse {
    pub id: String,
    pub question_id: String,
    pub author_id: String,
    pub content: String,
    pub is_selected: bool,
    pub created_at: String,
}

impl From<&AnswerDoc> for AnswerResponse {
    fn from(a: &AnswerDoc) -> Self {
        Self {
            id: a.id_hex(),
            question_id: a.question_id.clone(),
            author_id: a.author_id.clone(),
            content: a.content.clone(),
            is_selected: a.is_selected,
            created_at: a.metadata.created_rfc3339(),
        }
    }
}

// =============================================================================
// Route Handlers
// =============================================================================

async fn handle_create(
    req: Request<hyper::body::Incoming>,
    state: Arc<AppState>,
) -> Result<Response<BoxBody>> {
    let claims = authenticate(&req, &state)?;
    if !is_operation_allowed("create_question", claims.role) {
        return Err(BridgewayError::Permission(
            "only seniors can ask questions".into(),
        ));
    }

    let body: CreateQuestionRequest = parse_json_body(req).await?;

    let mongo = require_mongo(&state)?;
    let profile = require_profile(mongo, &claims).await?;
    let store = QuestionStore::open(mongo, Arc::clone(&state.events), state.args.pending_page_size)
        .await?;

    let question = store.create(&profile, &body.title, &body.content).await?;

    Ok(json_response(
        StatusCode::CREATED,
        &QuestionResponse::from(&question),
    ))
}

async fn handle_list_mine(
    req: Request<hyper::body::Incoming>,
    state: Arc<AppState>,
) -> Result<Response<BoxBody>> {
    let claims = authenticate(&req, &state)?;
    if !is_operation_allowed("list_own_questions", claims.role) {
        return Err(BridgewayError::Permission(
            "only seniors have their own question list".into(),
        ));
    }

    let mongo = require_mongo(&state)?;
    let store = QuestionStore::open(mongo, Arc::clone(&state.events), state.args.pending_page_size)
        .await?;

    let questions = store.list_for_owner(&claims.profile_id).await?;
    let body: Vec<QuestionResponse> = questions.iter().map(QuestionResponse::from).collect();

    Ok(json_response(StatusCode::OK, &body))
}

async fn handle_list_pending(
    req: Request<hyper::body::Incoming>,
    state: Arc<AppState>,
) -> Result<Response<BoxBody>> {
    let claims = authenticate(&req, &state)?;
    if !is_operation_allowed("list_pending_questions", claims.role) {
        return Err(BridgewayError::Permission(
            "only youth browse pending questions".into(),
        ));
    }

    let mongo = require_mongo(&state)?;
    let store = QuestionStore::open(mongo, Arc::clone(&state.events), state.args.pending_page_size)
        .await?;

    let questions = store.list_pending().await?;
    let body: Vec<QuestionResponse> = questions.iter().map(QuestionResponse::from).collect();

    Ok(json_response(StatusCode::OK, &body))
}

async fn handle_get(
    req: Request<hyper::body::Incoming>,
    state: Arc<AppState>,
    question_id: &str,
) -> Result<Response<BoxBody>> {
    let _claims = authenticate(&req, &state)?;

    let mongo = require_mongo(&state)?;
    let store = QuestionStore::open(mongo, Arc::clone(&state.events), state.args.pending_page_size)
        .await?;

    let question = store.get(question_id).await?;
    Ok(json_response(
        StatusCode::OK,
        &QuestionResponse::from(&question),
    ))
}

async fn handle_list_answers(
    req: Request<hyper::body::Incoming>,
    state: Arc<AppState>,
    question_id: &str,
) -> Result<Response<BoxBody>> {
    let _claims = authenticate(&req, &state)?;

    let mongo = require_mongo(&state)?;
    let store = QuestionStore::open(mongo, Arc::clone(&state.events), state.args.pending_page_size)
        .await?;

    let answers = store.answers_for(question_id).await?;
    let body: Vec<AnswerResponse> = answers.iter().map(AnswerResponse::from).collect();

    Ok(json_response(StatusCode::OK, &body))
}

async fn handle_submit_answer(
    req: Request<hyper::body::Incoming>,
    state: Arc<AppState>,
    question_id: &str,
) -> Result<Response<BoxBody>> {
    let claims = authenticate(&req, &state)?;
    if !is_operation_allowed("submit_answer", claims.role) {
        return Err(BridgewayError::Permission(
            "only youth can submit answers".into(),
        ));
    }

    let body: SubmitAnswerRequest = parse_json_body(req).await?;

    let mongo = require_mongo(&state)?;
    let profile = require_profile(mongo, &claims).await?;
    let store = AnswerStore::open(mongo, Arc::clone(&state.events)).await?;

    let answer = store.submit(question_id, &profile, &body.content).await?;

    Ok(json_response(
        StatusCode::CREATED,
        &AnswerResponse::from(&answer),
    ))
}

async fn handle_accept(
    req: Request<hyper::body::Incoming>,
    state: Arc<AppState>,
    question_id: &str,
) -> Result<Response<BoxBody>> {
    let claims = authenticate(&req, &state)?;
    if !is_operation_allowed("accept_answer", claims.role) {
        return Err(BridgewayError::Permission(
            "only seniors can accept answers".into(),
        ));
    }

    let body: AcceptAnswerRequest = parse_json_body(req).await?;
    let satisfaction: Satisfaction = body
        .satisfaction
        .parse()
        .map_err(|_| {
            BridgewayError::Validation(
                "satisfaction must be 'neutral', 'good', or 'excellent'".into(),
            )
        })?;

    let mongo = require_mongo(&state)?;
    let profile = require_profile(mongo, &claims).await?;
    let workflow =
        AcceptanceWorkflow::open(mongo, Arc::clone(&state.events), state.args.accept_award_points)
            .await?;

    let question = workflow
        .accept(question_id, &body.answer_id, satisfaction, &profile)
        .await?;

    Ok(json_response(
        StatusCode::OK,
        &QuestionResponse::from(&question),
    ))
}

// =============================================================================
// Dispatcher
// =============================================================================

/// Handle /api/v1/questions* requests
pub async fn handle_questions_request(
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
        (Method::POST, "/api/v1/questions") => handle_create(req, state).await,
        (Method::GET, "/api/v1/questions/mine") => handle_list_mine(req, state).await,
        (Method::GET, "/api/v1/questions/pending") => handle_list_pending(req, state).await,

        (method, p) => {
            let Some(rest) = p.strip_prefix("/api/v1/questions/") else {
                return not_found_response(&path);
            };

            match (method, rest.split('/').collect::<Vec<_>>().as_slice()) {
                (Method::GET, [id]) if !id.is_empty() => handle_get(req, state, id).await,
                (Method::GET, [id, "answers"]) => handle_list_answers(req, state, id).await,
                (Method::POST, [id, "answers"]) => handle_submit_answer(req, state, id).await,
                (Method::POST, [id, "accept"]) => handle_accept(req, state, id).await,
                (_, [_]) | (_, [_, "answers"]) | (_, [_, "accept"]) => {
                    return method_not_allowed()
                }
                _ => return not_found_response(&path),
            }
        }
    };

    result.unwrap_or_else(|e| error_response(&e))
}
