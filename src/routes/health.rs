//! Health check endpoints
//!
//! Provides Kubernetes-style health probes:
//! - /health, /healthz - Liveness probe (is the service running?)
//! - /ready, /readyz - Readiness probe (is the service ready for traffic?)
//! - /version - Build stamps for deployment verification
//!
//! Liveness returns 200 whenever the process is up. Readiness returns 200
//! only when MongoDB is connected, unless dev_mode allows running without
//! a store.

use chrono::Utc;
use hyper::{Response, StatusCode};
use serde::Serialize;
use std::sync::Arc;

use crate::routes::helpers::{json_response, BoxBody};
use crate::server::AppState;

#[derive(Serialize)]
pub struct HealthResponse {
    /// Overall health status (true if service is running)
    pub healthy: bool,
    /// 'online' or 'degraded' (running without a store in dev mode)
    pub status: &'static str,
    /// Service version
    pub version: &'static str,
    /// Uptime in seconds
    pub uptime: u64,
    /// Current timestamp
    pub timestamp: String,
    /// Operating mode
    pub mode: String,
    /// Node identifier
    pub node_id: String,
    /// Store connection status
    pub mongo: MongoHealth,
    /// Change-feed subscriber count
    pub events: EventsHealth,
}

#[derive(Serialize)]
pub struct MongoHealth {
    pub connected: bool,
}

#[derive(Serialize)]
pub struct EventsHealth {
    pub subscribers: usize,
}

fn build_health_response(state: &AppState) -> HealthResponse {
    let connected = state.mongo.is_some();

    HealthResponse {
        healthy: true,
        status: if connected { "online" } else { "degraded" },
        version: env!("CARGO_PKG_VERSION"),
        uptime: state.started_at.elapsed().as_secs(),
        timestamp: Utc::now().to_rfc3339(),
        mode: if state.args.dev_mode {
            "development".to_string()
        } else {
            "production".to_string()
        },
        node_id: state.args.node_id.to_string(),
        mongo: MongoHealth { connected },
        events: EventsHealth {
            subscribers: state.events.subscriber_count(),
        },
    }
}

/// GET /health - liveness probe
pub fn health_check(state: Arc<AppState>) -> Response<BoxBody> {
    json_response(StatusCode::OK, &build_health_response(&state))
}

/// GET /ready - readiness probe
pub fn readiness_check(state: Arc<AppState>) -> Response<BoxBody> {
    let ready = state.mongo.is_some() || state.args.dev_mode;
    let status = if ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    json_response(status, &build_health_response(&state))
}

#[derive(Serialize)]
struct VersionResponse {
    version: &'static str,
    commit: &'static str,
    build_time: &'static str,
    service: &'static str,
}

/// GET /version - build stamps for deployment verification
pub fn version_info() -> Response<BoxBody> {
    json_response(
        StatusCode::OK,
        &VersionResponse {
            version: env!("CARGO_PKG_VERSION"),
            commit: option_env!("GIT_COMMIT_SHORT").unwrap_or("unknown"),
            build_time: option_env!("BUILD_TIMESTAMP").unwrap_or("unknown"),
            service: "bridgeway",
        },
    )
}
