//! Upstream connection management
//!
//! Owns the single venue link and the authoritative book. The loop runs
//! forever: connect, subscribe, stream frames into the book, publish a
//! snapshot per relevant frame, and on any closure or error wait a fixed
//! delay and start over. The book is never reset on reconnect; only
//! merged deltas change it. Exactly one upstream link exists at a time,
//! and the old link is explicitly closed before a new one is opened.

use std::fmt;
use std::sync::Arc;

use futures::stream::{SplitSink, SplitStream};
use futures::{SinkExt, StreamExt};
use thiserror::Error;
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};
use tracing::{debug, error, info, warn};

use crate::book::BookState;
use crate::config::RelayConfig;
use crate::feed::{parse_frame, SubscribeRequest};
use crate::hub::BroadcastHub;
use crate::metrics::RelayMetrics;
use crate::scaling::Scaler;

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;
type WsSink = SplitSink<WsStream, Message>;
type WsSource = SplitStream<WsStream>;

/// Lifecycle of the upstream link.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Idle,
    Connecting,
    Subscribed,
    Streaming,
    Closed,
    Errored,
    Reconnecting,
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ConnectionState::Idle => "idle",
            ConnectionState::Connecting => "connecting",
            ConnectionState::Subscribed => "subscribed",
            ConnectionState::Streaming => "streaming",
            ConnectionState::Closed => "closed",
            ConnectionState::Errored => "errored",
            ConnectionState::Reconnecting => "reconnecting",
        })
    }
}

/// Failures that end one connection attempt. None of these are fatal to
/// the relay; the loop reconnects after each.
#[derive(Debug, Error)]
pub enum UpstreamError {
    #[error("Websocket transport error: {0}")]
    Transport(#[from] tokio_tungstenite::tungstenite::Error),
    #[error("Failed to encode subscribe request: {0}")]
    Subscribe(#[from] serde_json::Error),
}

/// The upstream task: one link, one book, one publisher.
pub struct UpstreamFeed {
    config: RelayConfig,
    scaler: Scaler,
    book: BookState,
    state: ConnectionState,
    hub: Arc<BroadcastHub>,
    metrics: Arc<RelayMetrics>,
}

impl UpstreamFeed {
    pub fn new(config: RelayConfig, hub: Arc<BroadcastHub>, metrics: Arc<RelayMetrics>) -> Self {
        let scaler = Scaler::new(config.price_scale, config.quantity_scale);
        Self {
            config,
            scaler,
            book: BookState::new(),
            state: ConnectionState::Idle,
            hub,
            metrics,
        }
    }

    /// Current lifecycle state.
    pub fn state(&self) -> ConnectionState {
        self.state
    }

    /// Drive the connection loop forever.
    pub async fn run(mut self) {
        loop {
            self.transition(ConnectionState::Connecting);
            match self.stream_once().await {
                Ok(()) => self.transition(ConnectionState::Closed),
                Err(err) => {
                    warn!(error = %err, "Upstream connection failed");
                    self.transition(ConnectionState::Errored);
                }
            }

            self.transition(ConnectionState::Reconnecting);
            self.metrics.record_reconnect_attempt();
            tokio::time::sleep(self.config.reconnect_delay).await;
        }
    }

    /// One full connection: dial, subscribe, stream until closure.
    async fn stream_once(&mut self) -> Result<(), UpstreamError> {
        let (ws, _) = connect_async(&self.config.upstream_url).await?;
        let (mut sink, mut source) = ws.split();
        self.transition(ConnectionState::Subscribed);

        let outcome = self.pump(&mut sink, &mut source).await;
        // The venue must never see two live links from one relay, so the
        // old one is closed before the loop dials again.
        sink.close().await.ok();
        outcome
    }

    async fn pump(
        &mut self,
        sink: &mut WsSink,
        source: &mut WsSource,
    ) -> Result<(), UpstreamError> {
        let subscribe = SubscribeRequest::book_depth(self.config.product_id);
        sink.send(Message::Text(serde_json::to_string(&subscribe)?))
            .await?;
        self.transition(ConnectionState::Streaming);

        while let Some(frame) = source.next().await {
            match frame? {
                Message::Text(text) => self.handle_text(&text),
                Message::Ping(payload) => sink.send(Message::Pong(payload)).await?,
                Message::Close(_) => return Ok(()),
                _ => {}
            }
        }
        Ok(())
    }

    /// Process one text frame: normalize, scale, merge, publish.
    fn handle_text(&mut self, text: &str) {
        self.metrics.record_frame_received();

        let Some(frame) = parse_frame(text, self.config.product_id) else {
            self.metrics.record_frame_ignored();
            return;
        };

        let update = self.scaler.scale_update(&frame);
        let outcome = self.book.apply(&update);
        self.metrics.record_update_applied();
        if outcome.rejected > 0 {
            self.metrics.record_levels_rejected(outcome.rejected as u64);
        }
        debug!(
            upserts = outcome.upserts,
            removals = outcome.removals,
            "Merged depth update"
        );

        match serde_json::to_string(&self.book.snapshot()) {
            Ok(payload) => {
                self.hub.publish(payload);
                self.metrics.record_snapshot_published();
            }
            Err(err) => error!(error = %err, "Failed to serialize snapshot"),
        }
    }

    fn transition(&mut self, next: ConnectionState) {
        info!(from = %self.state, to = %next, "Upstream connection state changed");
        self.state = next;
    }
}
