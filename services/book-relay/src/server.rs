//! Downstream HTTP surface
//!
//! Two routes: `/ws` upgrades to a websocket and streams book snapshots,
//! `/metrics` reports the relay counters. Each websocket session drains
//! its hub queue into the socket and detaches on any close or error.

use std::collections::BTreeMap;
use std::sync::Arc;

use axum::extract::ws::{Message, WebSocket};
use axum::extract::{State, WebSocketUpgrade};
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};
use futures::{SinkExt, StreamExt};

use crate::hub::BroadcastHub;
use crate::metrics::RelayMetrics;

/// Shared handles for the HTTP handlers.
#[derive(Clone)]
pub struct AppState {
    pub hub: Arc<BroadcastHub>,
    pub metrics: Arc<RelayMetrics>,
}

/// Build the relay router.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/ws", get(ws_handler))
        .route("/metrics", get(metrics_handler))
        .with_state(state)
}

async fn ws_handler(ws: WebSocketUpgrade, State(state): State<AppState>) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

async fn handle_socket(socket: WebSocket, state: AppState) {
    let (id, mut feed) = state.hub.attach();
    let (mut sink, mut source) = socket.split();

    loop {
        tokio::select! {
            payload = feed.recv() => match payload {
                Some(payload) => {
                    if sink.send(Message::Text(payload)).await.is_err() {
                        break;
                    }
                }
                // The hub dropped our sender; the session is over.
                None => break,
            },
            inbound = source.next() => match inbound {
                Some(Ok(Message::Close(_))) | Some(Err(_)) | None => break,
                Some(Ok(_)) => {}
            },
        }
    }

    state.hub.detach(id);
}

async fn metrics_handler(State(state): State<AppState>) -> Json<BTreeMap<String, u64>> {
    let mut counters = state.metrics.export();
    counters.insert(
        "subscribers_active".to_string(),
        state.hub.subscriber_count() as u64,
    );
    Json(counters)
}
