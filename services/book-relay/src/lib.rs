//! Order-Book Relay Service
//!
//! Subscribes to one upstream depth feed for a single instrument and:
//! - Normalizes raw frames into canonical price/quantity deltas
//! - Scales fixed-point integer encodings into two-decimal values
//! - Merges deltas into persistent bid/ask ledgers (absolute replace,
//!   remove on zero)
//! - Rebroadcasts the full consolidated snapshot to WebSocket subscribers
//!   on every update, with bounded per-subscriber queues
//! - Reconnects to the upstream on a fixed delay, forever
//!
//! # Architecture
//!
//! ```text
//!  Upstream venue (WebSocket)
//!        │
//!   ┌────▼─────┐
//!   │ Upstream │  ← connect / subscribe / reconnect loop
//!   └────┬─────┘
//!        │ raw frames
//!   ┌────▼─────┐
//!   │   Feed   │  ← parse + filter (malformed → dropped)
//!   └────┬─────┘
//!        │ raw string pairs
//!   ┌────▼─────┐
//!   │ Scaling  │  ← fixed-point → decimal, 2 dp
//!   └────┬─────┘
//!        │ canonical deltas
//!   ┌────▼─────┐
//!   │  Ledger  │  ← absolute replace / remove-on-zero
//!   │   Book   │
//!   └────┬─────┘
//!        │ serialized snapshot
//!   ┌────▼─────┐
//!   │   Hub    │  ← bounded fan-out to subscribers
//!   └────┬─────┘
//!        │
//!  Subscribers (WebSocket, axum)
//! ```

pub mod book;
pub mod config;
pub mod feed;
pub mod hub;
pub mod ledger;
pub mod metrics;
pub mod scaling;
pub mod server;
pub mod upstream;

// Library version
pub const SERVICE_VERSION: &str = "0.1.0";
