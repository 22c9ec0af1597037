//! Shared plumbing for route handlers
//!
//! JSON envelopes, CORS headers, body parsing, and the authentication
//! helper every /api/v1 handler starts with.

use bytes::Bytes;
use http_body_util::{BodyExt, Full};
use hyper::{Request, Response, StatusCode};
use serde::{Deserialize, Serialize};

use crate::auth::{extract_token_from_header, Claims};
use crate::db::schemas::{ProfileDoc, PROFILE_COLLECTION};
use crate::db::{parse_object_id, MongoClient};
use crate::server::AppState;
use crate::types::{BridgewayError, Result};

pub type BoxBody = http_body_util::combinators::BoxBody<Bytes, hyper::Error>;

/// JSON error envelope
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
}

/// JSON success envelope for bodyless operations
#[derive(Debug, Serialize)]
pub struct SuccessResponse {
    pub success: bool,
    pub message: String,
}

pub fn full_body(data: impl Into<Bytes>) -> BoxBody {
    Full::new(data.into())
        .map_err(|never| match never {})
        .boxed()
}

pub fn empty_body() -> BoxBody {
    Full::new(Bytes::new())
        .map_err(|never| match never {})
        .boxed()
}

pub fn json_response<T: Serialize>(status: StatusCode, body: &T) -> Response<BoxBody> {
    let json = serde_json::to_string(body).unwrap_or_else(|_| "{}".to_string());

    Response::builder()
        .status(status)
        .header("Content-Type", "application/json")
        .header("Access-Control-Allow-Origin", "*")
        .header("Access-Control-Allow-Methods", "GET, POST, OPTIONS")
        .header("Access-Control-Allow-Headers", "Content-Type, Authorization")
        .body(full_body(json))
        .unwrap()
}

/// Translate a crate error into its JSON envelope
pub fn error_response(err: &BridgewayError) -> Response<BoxBody> {
    json_response(
        err.status_code(),
        &ErrorResponse {
            error: err.to_string(),
            code: Some(err.code().to_string()),
        },
    )
}

pub fn cors_preflight() -> Response<BoxBody> {
    Response::builder()
        .status(StatusCode::NO_CONTENT)
        .header("Access-Control-Allow-Origin", "*")
        .header("Access-Control-Allow-Methods", "GET, POST, OPTIONS")
        .header("Access-Control-Allow-Headers", "Content-Type, Authorization")
        .header("Access-Control-Max-Age", "86400")
        .body(empty_body())
        .unwrap()
}

pub fn not_found_response(path: &str) -> Response<BoxBody> {
    json_response(
        StatusCode::NOT_FOUND,
        &ErrorResponse {
            error: format!("Not found: {}", path),
            code: Some("NOT_FOUND".into()),
        },
    )
}

pub fn method_not_allowed() -> Response<BoxBody> {
    json_response(
        StatusCode::METHOD_NOT_ALLOWED,
        &ErrorResponse {
            error: "Method not allowed".into(),
            code: None,
        },
    )
}

/// Parse a JSON request body, bounded to 64 KiB
pub async fn parse_json_body<T: for<'de> Deserialize<'de>>(
    req: Request<hyper::body::Incoming>,
) -> Result<T> {
    let body = req
        .collect()
        .await
        .map_err(|e| BridgewayError::Http(format!("Failed to read body: {}", e)))?;

    let bytes = body.to_bytes();
    if bytes.len() > 65536 {
        return Err(BridgewayError::Http("Request body too large".into()));
    }

    serde_json::from_slice(&bytes)
        .map_err(|e| BridgewayError::Http(format!("Invalid JSON: {}", e)))
}

pub fn get_auth_header(req: &Request<hyper::body::Incoming>) -> Option<&str> {
    req.headers()
        .get(hyper::header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
}

/// Verify the bearer token on a request
pub fn authenticate(req: &Request<hyper::body::Incoming>, state: &AppState) -> Result<Claims> {
    let token = extract_token_from_header(get_auth_header(req))
        .ok_or_else(|| BridgewayError::Auth("Missing bearer token".into()))?;

    let result = state.jwt.verify_token(token);
    if !result.valid {
        return Err(BridgewayError::Auth(
            result.error.unwrap_or_else(|| "Invalid token".into()),
        ));
    }

    result
        .claims
        .ok_or_else(|| BridgewayError::Auth("Invalid token".into()))
}

/// Get the MongoDB client or fail as backend-unavailable
pub fn require_mongo(state: &AppState) -> Result<&MongoClient> {
    state
        .mongo
        .as_ref()
        .ok_or_else(|| BridgewayError::Database("Database not available".into()))
}

/// Load the caller's profile from token claims
pub async fn require_profile(mongo: &MongoClient, claims: &Claims) -> Result<ProfileDoc> {
    let profiles = mongo.collection::<ProfileDoc>(PROFILE_COLLECTION).await?;
    let oid = parse_object_id(&claims.profile_id, "profile")?;

    profiles
        .find_one(bson::doc! { "_id": oid })
        .await?
        .ok_or_else(|| BridgewayError::Auth("Profile no longer exists".into()))
}
