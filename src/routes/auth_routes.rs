//! HTTP Routes for Authentication
//!
//! Provides REST API endpoints for account credentials and sessions:
//! - POST /auth/register - Create an account (email + password)
//! - POST /auth/login    - Authenticate via a login surface and get a JWT
//! - POST /auth/logout   - Stateless logout (client discards the token)
//! - GET  /auth/me       - Current profile from token
//!
//! The login body names the surface used (senior or youth tab). First login
//! creates the profile with that role; later logins from the wrong surface
//! are rejected, never silently re-roled.

use bson::doc;
use hyper::{Method, Request, Response, StatusCode};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, warn};

use crate::auth::{hash_password, verify_password};
use crate::db::schemas::{AccountDoc, Role, ACCOUNT_COLLECTION};
use crate::directory::{get_or_create_profile, Identity};
use crate::routes::helpers::{
    authenticate, cors_preflight, error_response, json_response, method_not_allowed,
    not_found_response, parse_json_body, require_mongo, require_profile, BoxBody, ErrorResponse,
    SuccessResponse,
};
use crate::server::AppState;
use crate::types::BridgewayError;

// =============================================================================
// Request/Response Types
// =============================================================================

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
    /// Login surface used: "senior" or "youth"
    pub surface: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthResponse {
    pub token: String,
    pub profile_id: String,
    pub email: String,
    pub username: String,
    pub role: Role,
    pub points: i64,
    pub expires_at: u64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MeResponse {
    pub profile_id: String,
    pub email: String,
    pub username: String,
    pub role: Role,
    pub points: i64,
    pub answer_count: i64,
    pub created_at: String,
}

// =============================================================================
// Route Handlers
// =============================================================================

/// POST /auth/register
///
/// Create account credentials. The profile is NOT created here; it appears
/// on first login, when the surface decides the role.
async fn handle_register(
    req: Request<hyper::body::Incoming>,
    state: Arc<AppState>,
) -> Response<BoxBody> {
    let body: RegisterRequest = match parse_json_body(req).await {
        Ok(b) => b,
        Err(e) => return error_response(&e),
    };

    let email = body.email.trim().to_lowercase();
    if email.is_empty() || !email.contains('@') {
        return error_response(&BridgewayError::Validation(
            "a valid email is required".into(),
        ));
    }

    // Minimum 8 characters
    if body.password.len() < 8 {
        return error_response(&BridgewayError::Validation(
            "password must be at least 8 characters".into(),
        ));
    }

    let mongo = match require_mongo(&state) {
        Ok(m) => m,
        Err(e) => return error_response(&e),
    };

    let accounts = match mongo.collection::<AccountDoc>(ACCOUNT_COLLECTION).await {
        Ok(c) => c,
        Err(e) => return error_response(&e),
    };

    match accounts.find_one(doc! { "email": &email }).await {
        Ok(Some(_)) => {
            return json_response(
                StatusCode::CONFLICT,
                &ErrorResponse {
                    error: "An account with this email already exists".into(),
                    code: Some("EMAIL_TAKEN".into()),
                },
            );
        }
        Ok(None) => {}
        Err(e) => return error_response(&e),
    }

    let password_hash = match hash_password(&body.password) {
        Ok(h) => h,
        Err(e) => return error_response(&e),
    };

    if let Err(e) = accounts
        .insert_one(AccountDoc::new(email.clone(), password_hash))
        .await
    {
        // Unique index on email absorbs register races
        if let BridgewayError::Database(ref msg) = e {
            if msg.contains("E11000") {
                return json_response(
                    StatusCode::CONFLICT,
                    &ErrorResponse {
                        error: "An account with this email already exists".into(),
                        code: Some("EMAIL_TAKEN".into()),
                    },
                );
            }
        }
        return error_response(&e);
    }

    info!("Account registered: {}", email);

    json_response(
        StatusCode::CREATED,
        &SuccessResponse {
            success: true,
            message: "Account created. Log in to choose your side of the bridge.".into(),
        },
    )
}

/// POST /auth/login
///
/// Verify credentials, resolve (or lazily create) the profile for the login
/// surface, and issue a JWT. No token is issued when profile resolution
/// fails, so there is never a session without a profile behind it.
async fn handle_login(
    req: Request<hyper::body::Incoming>,
    state: Arc<AppState>,
) -> Response<BoxBody> {
    let body: LoginRequest = match parse_json_body(req).await {
        Ok(b) => b,
        Err(e) => return error_response(&e),
    };

    let email = body.email.trim().to_lowercase();
    if email.is_empty() || body.password.is_empty() {
        return error_response(&BridgewayError::Validation(
            "email and password are required".into(),
        ));
    }

    let surface: Role = match body.surface.parse() {
        Ok(r) => r,
        Err(_) => {
            return error_response(&BridgewayError::Validation(
                "surface must be 'senior' or 'youth'".into(),
            ));
        }
    };

    let mongo = match require_mongo(&state) {
        Ok(m) => m,
        Err(e) => return error_response(&e),
    };

    let accounts = match mongo.collection::<AccountDoc>(ACCOUNT_COLLECTION).await {
        Ok(c) => c,
        Err(e) => return error_response(&e),
    };

    // Look up the account; generic error to prevent user enumeration
    let account = match accounts
        .find_one(doc! { "email": &email, "is_active": true })
        .await
    {
        Ok(Some(a)) => a,
        Ok(None) => {
            warn!("Login failed - account not found: {}", email);
            return json_response(
                StatusCode::UNAUTHORIZED,
                &ErrorResponse {
                    error: "Invalid credentials".into(),
                    code: Some("INVALID_CREDENTIALS".into()),
                },
            );
        }
        Err(e) => return error_response(&e),
    };

    let password_valid = match verify_password(&body.password, &account.password_hash) {
        Ok(valid) => valid,
        Err(e) => {
            warn!("Password verification error: {}", e);
            return error_response(&e);
        }
    };

    if !password_valid {
        warn!("Login failed - invalid password: {}", email);
        return json_response(
            StatusCode::UNAUTHORIZED,
            &ErrorResponse {
                error: "Invalid credentials".into(),
                code: Some("INVALID_CREDENTIALS".into()),
            },
        );
    }

    let account_id = account._id.map(|id| id.to_hex()).unwrap_or_default();
    let identity = Identity {
        account_id,
        email: email.clone(),
    };

    // Role mismatch and creation failure both surface to the user; a failed
    // creation issues no token, so there is no session to invalidate
    let profile = match get_or_create_profile(mongo, &identity, surface).await {
        Ok(p) => p,
        Err(e) => return error_response(&e),
    };

    let profile_id = profile._id.map(|id| id.to_hex()).unwrap_or_default();

    let (token, expires_at) = match state.jwt.generate_token(
        &identity.account_id,
        &profile_id,
        &email,
        profile.role,
        account.token_version,
    ) {
        Ok(t) => t,
        Err(e) => return error_response(&e),
    };

    info!("Login successful: {} ({})", email, profile.role);

    json_response(
        StatusCode::OK,
        &AuthResponse {
            token,
            profile_id,
            email,
            username: profile.username,
            role: profile.role,
            points: profile.points,
            expires_at,
        },
    )
}

/// POST /auth/logout
///
/// Tokens are stateless; logout is handled client-side by discarding the
/// token.
async fn handle_logout(
    _req: Request<hyper::body::Incoming>,
    _state: Arc<AppState>,
) -> Response<BoxBody> {
    json_response(
        StatusCode::OK,
        &SuccessResponse {
            success: true,
            message: "Logged out successfully".into(),
        },
    )
}

/// GET /auth/me
///
/// Current profile info from the token.
async fn handle_me(
    req: Request<hyper::body::Incoming>,
    state: Arc<AppState>,
) -> Response<BoxBody> {
    let claims = match authenticate(&req, &state) {
        Ok(c) => c,
        Err(e) => return error_response(&e),
    };

    let mongo = match require_mongo(&state) {
        Ok(m) => m,
        Err(e) => return error_response(&e),
    };

    let profile = match require_profile(mongo, &claims).await {
        Ok(p) => p,
        Err(e) => return error_response(&e),
    };

    json_response(
        StatusCode::OK,
        &MeResponse {
            profile_id: claims.profile_id,
            email: profile.email,
            username: profile.username,
            role: profile.role,
            points: profile.points,
            answer_count: profile.answer_count,
            created_at: profile.metadata.created_rfc3339(),
        },
    )
}

// =============================================================================
// Dispatcher
// =============================================================================

/// Handle /auth/* requests; None when the path is outside /auth
pub async fn handle_auth_request(
    req: Request<hyper::body::Incoming>,
    state: Arc<AppState>,
) -> Option<Response<BoxBody>> {
    let path = req.uri().path();
    let method = req.method();

    // Only handle /auth/* routes
    if !path.starts_with("/auth") {
        return None;
    }

    // Handle CORS preflight
    if method == Method::OPTIONS {
        return Some(cors_preflight());
    }

    // Remove query string for matching
    let path = path.split('?').next().unwrap_or(path).to_string();

    let response = match (method.clone(), path.as_str()) {
        (Method::POST, "/auth/register") => handle_register(req, state).await,
        (Method::POST, "/auth/login") => handle_login(req, state).await,
        (Method::POST, "/auth/logout") => handle_logout(req, state).await,
        (Method::GET, "/auth/me") => handle_me(req, state).await,

        (_, "/auth/register") | (_, "/auth/login") | (_, "/auth/logout") | (_, "/auth/me") => {
            method_not_allowed()
        }

        _ => not_found_response(&path),
    };

    Some(response)
}
