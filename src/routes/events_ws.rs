//! Real-time WebSocket change feed
//!
//! ## Protocol
//!
//! Connect: `ws://localhost:8080/events`
//!
//! Messages (server → client):
//! - `hello` - Sent once after connect, lists the collections that exist
//! - `change` - A collection changed; re-fetch everything in `invalidates`
//!
//! Messages (client → server):
//! - `ping` - Keep-alive ping, answered with `pong`
//!
//! Delivery is at-least-once and unordered across collections. Clients are
//! expected to re-fetch the named collections rather than patch local state,
//! so duplicates and reordering are harmless.
//!
//! ## Example Messages
//!
//! ```json
//! // Server announces a change
//! {
//!   "type": "change",
//!   "collection": "answers",
//!   "op": "insert",
//!   "invalidates": ["answers", "questions"],
//!   "timestamp": "2024-01-15T10:30:00Z"
//! }
//! ```

use futures_util::{SinkExt, StreamExt};
use hyper::body::Incoming;
use hyper::{Request, Response, StatusCode};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::broadcast::error::RecvError;
use tokio_tungstenite::tungstenite::Message as WsMessage;
use tracing::{debug, error, info, warn};

use crate::events::{ChangeEvent, ChangeOp, EventHub, StoreCollection};
use crate::routes::helpers::{empty_body, full_body, BoxBody};
use crate::server::AppState;

/// WebSocket type after upgrade
type HyperWebSocket =
    hyper_tungstenite::WebSocketStream<hyper_util::rt::TokioIo<hyper::upgrade::Upgraded>>;

/// Message sent from server to client
#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum FeedMessage<'a> {
    /// Initial greeting after connection
    Hello { collections: &'a [&'a str] },
    /// A collection changed
    Change {
        collection: StoreCollection,
        op: ChangeOp,
        invalidates: &'static [&'static str],
        timestamp: &'a str,
    },
    /// Keep-alive reply
    Pong,
}

/// Message received from client
#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ClientMessage {
    /// Keep-alive ping
    Ping,
}

fn change_json(event: &ChangeEvent) -> String {
    serde_json::to_string(&FeedMessage::Change {
        collection: event.collection,
        op: event.op,
        invalidates: event.invalidates(),
        timestamp: &event.timestamp,
    })
    .unwrap_or_else(|_| "{}".to_string())
}

/// Handle WebSocket upgrade for the change feed
pub async fn handle_events_ws(state: Arc<AppState>, req: Request<Incoming>) -> Response<BoxBody> {
    if !hyper_tungstenite::is_upgrade_request(&req) {
        return Response::builder()
            .status(StatusCode::BAD_REQUEST)
            .header("Content-Type", "application/json")
            .body(full_body(
                r#"{"error": "WebSocket upgrade required"}"#,
            ))
            .unwrap();
    }

    let (response, websocket) = match hyper_tungstenite::upgrade(req, None) {
        Ok((resp, ws)) => (resp, ws),
        Err(e) => {
            error!("WebSocket upgrade failed: {}", e);
            return Response::builder()
                .status(StatusCode::INTERNAL_SERVER_ERROR)
                .body(full_body("WebSocket upgrade failed"))
                .unwrap();
        }
    };

    let events = Arc::clone(&state.events);
    tokio::spawn(async move {
        match websocket.await {
            Ok(ws) => {
                if let Err(e) = handle_feed_connection(ws, events).await {
                    warn!("Change feed WebSocket error: {}", e);
                }
            }
            Err(e) => {
                error!("WebSocket connection failed: {}", e);
            }
        }
    });

    // Return the upgrade response with the body type converted
    let (parts, _body) = response.into_parts();
    Response::from_parts(parts, empty_body())
}

/// Handle an individual change feed connection
async fn handle_feed_connection(
    ws: HyperWebSocket,
    events: Arc<EventHub>,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let (mut sender, mut receiver) = ws.split();

    info!("Change feed client connected");

    let hello = serde_json::to_string(&FeedMessage::Hello {
        collections: &["questions", "answers", "point_history", "profiles"],
    })?;
    sender.send(WsMessage::Text(hello)).await?;

    let mut rx = events.subscribe();

    loop {
        tokio::select! {
            event = rx.recv() => {
                match event {
                    Ok(event) => {
                        sender.send(WsMessage::Text(change_json(&event))).await?;
                    }
                    Err(RecvError::Lagged(skipped)) => {
                        // Missed events are fine: clients re-fetch on the
                        // next one they do see
                        debug!("Change feed client lagged, skipped {} events", skipped);
                    }
                    Err(RecvError::Closed) => break,
                }
            }
            msg = receiver.next() => {
                match msg {
                    Some(Ok(WsMessage::Text(text))) => {
                        if let Ok(ClientMessage::Ping) = serde_json::from_str(&text) {
                            let pong = serde_json::to_string(&FeedMessage::Pong)?;
                            sender.send(WsMessage::Text(pong)).await?;
                        }
                    }
                    Some(Ok(WsMessage::Close(_))) | None => break,
                    Some(Ok(_)) => {}
                    Some(Err(e)) => {
                        debug!("Change feed client read error: {}", e);
                        break;
                    }
                }
            }
        }
    }

    info!("Change feed client disconnected");
    Ok(())
}
