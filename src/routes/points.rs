//! HTTP routes for the points ledger
//!
//! - GET  /api/v1/points/summary - Earned/used/balance fold for the caller
//! - GET  /api/v1/points/history - Ledger entries, newest first
//! - POST /api/v1/points/redeem  - Spend points (youth)

use hyper::{Method, Request, Response, StatusCode};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::auth::is_operation_allowed;
use crate::db::schemas::{PointHistoryDoc, PointKind};
use crate::points::PointsLedger;
use crate::routes::helpers::{
    authenticate, cors_preflight, error_response, json_response, method_not_allowed,
    not_found_response, parse_json_body, require_mongo, require_profile, BoxBody,
};
use crate::server::AppState;
use crate::types::{BridgewayError, Result};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RedeemRequest {
    pub amount: i64,
    pub description: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PointEntryResponse {
    pub id: String,
    pub amount: i64,
    pub kind: PointKind,
    pub description: String,
    pub created_at: String,
}

impl From<&PointHistoryDoc> for PointEntryResponse {
    fn from(e: &PointHistoryDoc) -> Self {
        Self {
            id: e._id.map(|id| id.to_hex()).unwrap_or_default(),
            amount: e.amount,
            kind: e.kind,
            description: e.description.clone(),
            created_at: e.metadata.created_rfc3339(),
        }
    }
}

async fn handle_summary(
    req: Request<hyper::body::Incoming>,
    state: Arc<AppState>,
) -> Result<Response<BoxBody>> {
    let claims = authenticate(&req, &state)?;

    let mongo = require_mongo(&state)?;
    let ledger = PointsLedger::open(mongo, Arc::clone(&state.events)).await?;

    let summary = ledger.summarize(&claims.profile_id).await?;
    Ok(json_response(StatusCode::OK, &summary))
}

async fn handle_history(
    req: Request<hyper::body::Incoming>,
    state: Arc<AppState>,
) -> Result<Response<BoxBody>> {
    let claims = authenticate(&req, &state)?;

    let mongo = require_mongo(&state)?;
    let ledger = PointsLedger::open(mongo, Arc::clone(&state.events)).await?;

    let entries = ledger.history(&claims.profile_id).await?;
    let body: Vec<PointEntryResponse> = entries.iter().map(PointEntryResponse::from).collect();

    Ok(json_response(StatusCode::OK, &body))
}

async fn handle_redeem(
    req: Request<hyper::body::Incoming>,
    state: Arc<AppState>,
) -> Result<Response<BoxBody>> {
    let claims = authenticate(&req, &state)?;
    if !is_operation_allowed("redeem_points", claims.role) {
        return Err(BridgewayError::Permission(
            "only youth can redeem points".into(),
        ));
    }

    let body: RedeemRequest = parse_json_body(req).await?;

    let mongo = require_mongo(&state)?;
    let profile = require_profile(mongo, &claims).await?;
    let ledger = PointsLedger::open(mongo, Arc::clone(&state.events)).await?;

    let entry = ledger
        .redeem(&profile, body.amount, &body.description)
        .await?;

    Ok(json_response(
        StatusCode::CREATED,
        &PointEntryResponse::from(&entry),
    ))
}

/// Handle /api/v1/points* requests
pub async fn handle_points_request(
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
        (Method::GET, "/api/v1/points/summary") => handle_summary(req, state).await,
        (Method::GET, "/api/v1/points/history") => handle_history(req, state).await,
        (Method::POST, "/api/v1/points/redeem") => handle_redeem(req, state).await,

        (_, "/api/v1/points/summary") | (_, "/api/v1/points/history")
        | (_, "/api/v1/points/redeem") => return method_not_allowed(),

        _ => return not_found_response(&path),
    };

    result.unwrap_or_else(|e| error_response(&e))
}
