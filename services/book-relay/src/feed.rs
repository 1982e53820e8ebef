//! Upstream wire messages and frame normalization
//!
//! The venue tags every depth update with a stream type and a product id,
//! and encodes prices/quantities as fixed-point integer strings.
//! `parse_frame` accepts one raw text frame and yields a typed update only
//! when the frame is well-formed JSON, is a depth update, and names the
//! subscribed instrument; everything else is dropped here, so nothing
//! downstream ever sees malformed input.

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// Stream type discriminator for depth updates.
pub const BOOK_DEPTH_STREAM: &str = "book_depth";

/// Subscription request sent once per upstream connection.
///
/// Serializes as
/// `{"method":"subscribe","stream":{"type":"book_depth","product_id":N},"id":1}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SubscribeRequest {
    pub method: String,
    pub stream: StreamDescriptor,
    pub id: u32,
}

/// The stream half of a subscription request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StreamDescriptor {
    #[serde(rename = "type")]
    pub stream_type: String,
    pub product_id: u32,
}

impl SubscribeRequest {
    /// Build the depth-stream subscription for one instrument.
    pub fn book_depth(product_id: u32) -> Self {
        Self {
            method: "subscribe".to_string(),
            stream: StreamDescriptor {
                stream_type: BOOK_DEPTH_STREAM.to_string(),
                product_id,
            },
            id: 1,
        }
    }
}

/// One depth update as sent by the venue: side-wise lists of raw
/// `(price, quantity)` fixed-point strings.
///
/// Raw values are strings on the wire because x18 integers exceed both
/// `u64` and the exact range of a JSON double. A missing side is an empty
/// list; unknown extra fields are ignored.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct DepthFrame {
    #[serde(rename = "type")]
    pub stream_type: String,
    pub product_id: u32,
    #[serde(default)]
    pub bids: Vec<(String, String)>,
    #[serde(default)]
    pub asks: Vec<(String, String)>,
}

/// Parse one raw upstream frame into a depth update.
///
/// Returns `None` for anything that is not a depth update for
/// `product_id`. Malformed JSON is logged at warn; well-formed frames of
/// other kinds (acknowledgments, other streams, other instruments) at
/// debug. Never panics, never propagates an error.
pub fn parse_frame(raw: &str, product_id: u32) -> Option<DepthFrame> {
    let value: serde_json::Value = match serde_json::from_str(raw) {
        Ok(value) => value,
        Err(err) => {
            warn!(error = %err, "Discarding malformed upstream frame");
            return None;
        }
    };

    let frame: DepthFrame = match serde_json::from_value(value) {
        Ok(frame) => frame,
        Err(_) => {
            debug!("Ignoring non-depth upstream frame");
            return None;
        }
    };

    if frame.stream_type != BOOK_DEPTH_STREAM {
        debug!(stream_type = %frame.stream_type, "Ignoring frame for unsubscribed stream");
        return None;
    }
    if frame.product_id != product_id {
        debug!(
            product_id = frame.product_id,
            "Ignoring frame for different instrument"
        );
        return None;
    }

    Some(frame)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_subscribe_request_wire_format() {
        let request = SubscribeRequest::book_depth(2);
        let json = serde_json::to_string(&request).unwrap();
        assert_eq!(
            json,
            r#"{"method":"subscribe","stream":{"type":"book_depth","product_id":2},"id":1}"#
        );
    }

    #[test]
    fn test_parse_valid_depth_frame() {
        let raw = r#"{
            "type": "book_depth",
            "product_id": 2,
            "bids": [["100000000000000000000", "2000000000000000000"]],
            "asks": [["101000000000000000000", "1000000000000000000"]]
        }"#;

        let frame = parse_frame(raw, 2).unwrap();
        assert_eq!(frame.bids.len(), 1);
        assert_eq!(frame.asks.len(), 1);
        assert_eq!(frame.bids[0].0, "100000000000000000000");
        assert_eq!(frame.bids[0].1, "2000000000000000000");
    }

    #[test]
    fn test_parse_rejects_malformed_json() {
        assert!(parse_frame("not json at all", 2).is_none());
        assert!(parse_frame("{\"unterminated\": ", 2).is_none());
        assert!(parse_frame("", 2).is_none());
    }

    #[test]
    fn test_parse_ignores_subscription_ack() {
        // The venue acknowledges a subscription with a result frame
        assert!(parse_frame(r#"{"result":null,"id":1}"#, 2).is_none());
    }

    #[test]
    fn test_parse_ignores_other_stream_types() {
        let raw = r#"{"type":"trade","product_id":2,"bids":[],"asks":[]}"#;
        assert!(parse_frame(raw, 2).is_none());
    }

    #[test]
    fn test_parse_ignores_other_instruments() {
        let raw = r#"{"type":"book_depth","product_id":7,"bids":[],"asks":[]}"#;
        assert!(parse_frame(raw, 2).is_none());
    }

    #[test]
    fn test_parse_defaults_missing_sides_to_empty() {
        let raw = r#"{"type":"book_depth","product_id":2,"bids":[["1","1"]]}"#;
        let frame = parse_frame(raw, 2).unwrap();
        assert_eq!(frame.bids.len(), 1);
        assert!(frame.asks.is_empty());
    }

    #[test]
    fn test_parse_ignores_unknown_fields() {
        let raw = r#"{
            "type": "book_depth",
            "product_id": 2,
            "bids": [],
            "asks": [],
            "timestamp": "1708123456789",
            "last_max_timestamp": "1708123456000"
        }"#;
        assert!(parse_frame(raw, 2).is_some());
    }
}
