//! HTTP routes for answer-scoped operations
//!
//! - POST /api/v1/answers/{id}/reject - Clear an answer's selection (senior owner)

use hyper::{Method, Request, Response, StatusCode};
use std::sync::Arc;

use crate::acceptance::AcceptanceWorkflow;
use crate::auth::is_operation_allowed;
use crate::routes::helpers::{
    authenticate, cors_preflight, error_response, json_response, method_not_allowed,
    not_found_response, require_mongo, require_profile, BoxBody, SuccessResponse,
};
use crate::server::AppState;
use crate::types::{BridgewayError, Result};

async fn handle_reject(
    req: Request<hyper::body::Incoming>,
    state: Arc<AppState>,
    answer_id: &str,
) -> Result<Response<BoxBody>> {
    let claims = authenticate(&req, &state)?;
    if !is_operation_allowed("reject_answer", claims.role) {
        return Err(BridgewayError::Permission(
            "only seniors can reject answers".into(),
        ));
    }

    let mongo = require_mongo(&state)?;
    let profile = require_profile(mongo, &claims).await?;
    let workflow =
        AcceptanceWorkflow::open(mongo, Arc::clone(&state.events), state.args.accept_award_points)
            .await?;

    workflow.reject(answer_id, &profile).await?;

    Ok(json_response(
        StatusCode::OK,
        &SuccessResponse {
            success: true,
            message: "Answer rejected".into(),
        },
    ))
}

/// Handle /api/v1/answers/* requests
pub async fn handle_answers_request(
    req: Request<hyper::body::Incoming>,
    state: Arc<AppState>,
) -> Response<BoxBody> {
    let method = req.method().clone();
    let path = req.uri().path().to_string();
    let path = path.split('?').next().unwrap_or(&path).to_string();

    if method == Method::OPTIONS {
        return cors_preflight();
    }

    let Some(rest) = path.strip_prefix("/api/v1/answers/") else {
        return not_found_response(&path);
    };

    let result = match (method, rest.split('/').collect::<Vec<_>>().as_slice()) {
        (Method::POST, [id, "reject"]) if !id.is_empty() => handle_reject(req, state, id).await,
        (_, [_, "reject"]) => return method_not_allowed(),
        _ => return not_found_response(&path),
    };

    result.unwrap_or_else(|e| error_response(&e))
}
