//! Relay configuration
//!
//! A plain struct with defaults for every knob; `from_env` overlays the
//! `RELAY_*` environment variables. A variable that is set but invalid is a
//! startup error, never silently replaced by the default.

use std::net::SocketAddr;
use std::str::FromStr;
use std::time::Duration;

use rust_decimal::Decimal;
use thiserror::Error;

use crate::hub::DropPolicy;

/// Upstream venue WebSocket endpoint.
pub const DEFAULT_UPSTREAM_URL: &str = "wss://gateway.prod.vertexprotocol.com/v1/subscribe";
/// Instrument subscribed to on the upstream venue.
pub const DEFAULT_PRODUCT_ID: u32 = 2;
/// x18 fixed-point divisor the venue uses for both prices and quantities.
pub const DEFAULT_SCALE: i64 = 1_000_000_000_000_000_000;
/// Fixed delay between reconnect attempts.
pub const DEFAULT_RECONNECT_DELAY_MS: u64 = 5_000;
/// Subscriber server port.
pub const DEFAULT_LISTEN_PORT: u16 = 5_000;
/// Per-subscriber outbound queue bound.
pub const DEFAULT_QUEUE_CAPACITY: usize = 64;

/// Configuration errors surfaced at startup.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    #[error("Invalid value {value:?} for {key}: {reason}")]
    Invalid {
        key: &'static str,
        value: String,
        reason: String,
    },

    #[error("Scaling divisor {key} must be strictly positive, got {value}")]
    NonPositiveScale { key: &'static str, value: Decimal },
}

/// Complete configuration for the relay process.
#[derive(Debug, Clone)]
pub struct RelayConfig {
    /// Upstream WebSocket endpoint.
    pub upstream_url: String,
    /// Instrument id named in the subscription request.
    pub product_id: u32,
    /// Fixed-point divisor for raw prices.
    pub price_scale: Decimal,
    /// Fixed-point divisor for raw quantities.
    pub quantity_scale: Decimal,
    /// Delay between upstream reconnect attempts.
    pub reconnect_delay: Duration,
    /// Bind address for the subscriber server.
    pub listen_addr: SocketAddr,
    /// Per-subscriber outbound queue capacity.
    pub queue_capacity: usize,
    /// What to do with a subscriber whose queue is full.
    pub drop_policy: DropPolicy,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            upstream_url: DEFAULT_UPSTREAM_URL.to_string(),
            product_id: DEFAULT_PRODUCT_ID,
            price_scale: Decimal::new(DEFAULT_SCALE, 0),
            quantity_scale: Decimal::new(DEFAULT_SCALE, 0),
            reconnect_delay: Duration::from_millis(DEFAULT_RECONNECT_DELAY_MS),
            listen_addr: SocketAddr::from(([0, 0, 0, 0], DEFAULT_LISTEN_PORT)),
            queue_capacity: DEFAULT_QUEUE_CAPACITY,
            drop_policy: DropPolicy::Disconnect,
        }
    }
}

impl RelayConfig {
    /// Build the configuration from defaults overlaid with `RELAY_*`
    /// environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut config = Self::default();

        if let Some(url) = env_var("RELAY_UPSTREAM_URL") {
            config.upstream_url = url;
        }
        if let Some(raw) = env_var("RELAY_PRODUCT_ID") {
            config.product_id = parse_number("RELAY_PRODUCT_ID", &raw)?;
        }
        if let Some(raw) = env_var("RELAY_PRICE_SCALE") {
            config.price_scale = parse_scale("RELAY_PRICE_SCALE", &raw)?;
        }
        if let Some(raw) = env_var("RELAY_QUANTITY_SCALE") {
            config.quantity_scale = parse_scale("RELAY_QUANTITY_SCALE", &raw)?;
        }
        if let Some(raw) = env_var("RELAY_RECONNECT_DELAY_MS") {
            let ms: u64 = parse_number("RELAY_RECONNECT_DELAY_MS", &raw)?;
            config.reconnect_delay = Duration::from_millis(ms);
        }
        if let Some(raw) = env_var("RELAY_LISTEN_ADDR") {
            config.listen_addr = parse_addr("RELAY_LISTEN_ADDR", &raw)?;
        }
        if let Some(raw) = env_var("RELAY_QUEUE_CAPACITY") {
            config.queue_capacity = parse_queue_capacity("RELAY_QUEUE_CAPACITY", &raw)?;
        }
        if let Some(raw) = env_var("RELAY_DROP_POLICY") {
            config.drop_policy = parse_policy("RELAY_DROP_POLICY", &raw)?;
        }

        Ok(config)
    }
}

/// Read an environment variable, treating empty values as unset.
fn env_var(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|value| !value.is_empty())
}

/// Parse any `FromStr` number, attributing failures to the variable.
fn parse_number<T>(key: &'static str, raw: &str) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    raw.trim().parse().map_err(|err: T::Err| ConfigError::Invalid {
        key,
        value: raw.to_string(),
        reason: err.to_string(),
    })
}

/// Parse a scaling divisor; must be a strictly positive decimal.
fn parse_scale(key: &'static str, raw: &str) -> Result<Decimal, ConfigError> {
    let value: Decimal = parse_number(key, raw)?;
    if value <= Decimal::ZERO {
        return Err(ConfigError::NonPositiveScale { key, value });
    }
    Ok(value)
}

/// Parse a socket address such as `0.0.0.0:5000`.
fn parse_addr(key: &'static str, raw: &str) -> Result<SocketAddr, ConfigError> {
    parse_number(key, raw)
}

/// Parse a queue capacity; zero-capacity queues cannot hold the attach
/// snapshot, so at least 1 is required.
fn parse_queue_capacity(key: &'static str, raw: &str) -> Result<usize, ConfigError> {
    let capacity: usize = parse_number(key, raw)?;
    if capacity == 0 {
        return Err(ConfigError::Invalid {
            key,
            value: raw.to_string(),
            reason: "capacity must be at least 1".to_string(),
        });
    }
    Ok(capacity)
}

/// Parse a drop policy name.
fn parse_policy(key: &'static str, raw: &str) -> Result<DropPolicy, ConfigError> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "disconnect" => Ok(DropPolicy::Disconnect),
        "drop-newest" => Ok(DropPolicy::DropNewest),
        _ => Err(ConfigError::Invalid {
            key,
            value: raw.to_string(),
            reason: "expected \"disconnect\" or \"drop-newest\"".to_string(),
        }),
    }
}
