//! HTTP server implementation
//!
//! Uses hyper http1 with TokioIo for async handling; one spawned task per
//! connection, match-based routing.

use hyper::body::Incoming;
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper::{Method, Request, Response};
use hyper_util::rt::TokioIo;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;
use tokio::net::TcpListener;
use tracing::{error, info, warn};

use crate::auth::JwtValidator;
use crate::config::Args;
use crate::db::MongoClient;
use crate::events::EventHub;
use crate::routes;
use crate::routes::helpers::{cors_preflight, not_found_response, BoxBody};
use crate::types::BridgewayError;

/// Shared application state
pub struct AppState {
    pub args: Args,
    pub mongo: Option<MongoClient>,
    /// Session token issue/verify
    pub jwt: JwtValidator,
    /// Change notification hub feeding /events subscribers
    pub events: Arc<EventHub>,
    /// Process start, for uptime reporting
    pub started_at: Instant,
}

impl AppState {
    /// Create application state
    ///
    /// Mongo is optional only in dev mode; handlers that need it answer 503
    /// when it is absent.
    pub fn new(args: Args, mongo: Option<MongoClient>) -> Self {
        let jwt = JwtValidator::new(&args.jwt_secret(), args.jwt_expiry_seconds);

        Self {
            args,
            mongo,
            jwt,
            events: Arc::new(EventHub::new()),
            started_at: Instant::now(),
        }
    }
}

/// Run the HTTP server until the process exits
pub async fn run(state: Arc<AppState>) -> Result<(), BridgewayError> {
    let listener = TcpListener::bind(state.args.listen).await?;

    info!(
        "Bridgeway listening on {} as node {}",
        state.args.listen, state.args.node_id
    );

    if state.args.dev_mode {
        warn!("Development mode enabled - insecure JWT fallback in use");
    }

    info!("Change feed enabled at /events");

    loop {
        match listener.accept().await {
            Ok((stream, addr)) => {
                let state = Arc::clone(&state);
                tokio::spawn(async move {
                    let io = TokioIo::new(stream);

                    let service = service_fn(move |req| {
                        let state = Arc::clone(&state);
                        async move { handle_request(state, addr, req).await }
                    });

                    if let Err(err) = http1::Builder::new()
                        .serve_connection(io, service)
                        .with_upgrades()
                        .await
                    {
                        error!("Error serving connection from {}: {:?}", addr, err);
                    }
                });
            }
            Err(e) => {
                error!("Error accepting connection: {:?}", e);
            }
        }
    }
}

/// Route incoming HTTP requests
async fn handle_request(
    state: Arc<AppState>,
    addr: SocketAddr,
    req: Request<Incoming>,
) -> Result<Response<BoxBody>, hyper::Error> {
    let method = req.method().clone();
    let path = req.uri().path().to_string();

    info!("[{}] {} {}", addr, method, path);

    // Auth routes (/auth/*) consume the request
    if path.starts_with("/auth") {
        if let Some(response) = routes::handle_auth_request(req, Arc::clone(&state)).await {
            return Ok(response);
        }
        return Ok(not_found_response(&path));
    }

    let response = match (method, path.as_str()) {
        // Liveness probe - returns 200 if bridgeway is running
        (Method::GET, "/health") | (Method::GET, "/healthz") => {
            routes::health_check(Arc::clone(&state))
        }

        // Readiness probe - returns 200 only if the store is connected
        (Method::GET, "/ready") | (Method::GET, "/readyz") => {
            routes::readiness_check(Arc::clone(&state))
        }

        // Version info for deployment verification
        (Method::GET, "/version") => routes::version_info(),

        // Real-time change feed
        (Method::GET, "/events") => {
            return Ok(routes::handle_events_ws(Arc::clone(&state), req).await);
        }

        // CORS preflight
        (Method::OPTIONS, _) => cors_preflight(),

        // Question store and question-scoped answer operations
        (_, p) if p.starts_with("/api/v1/questions") => {
            return Ok(routes::handle_questions_request(req, Arc::clone(&state)).await);
        }

        // Answer-scoped operations (reject)
        (_, p) if p.starts_with("/api/v1/answers") => {
            return Ok(routes::handle_answers_request(req, Arc::clone(&state)).await);
        }

        // Points ledger
        (_, p) if p.starts_with("/api/v1/points") => {
            return Ok(routes::handle_points_request(req, Arc::clone(&state)).await);
        }

        // Caller profile and activity feed
        (_, p) if p.starts_with("/api/v1/profile") => {
            return Ok(routes::handle_profile_request(req, Arc::clone(&state)).await);
        }

        _ => not_found_response(&path),
    };

    Ok(response)
}
