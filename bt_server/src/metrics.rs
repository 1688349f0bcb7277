//! Prometheus metrics for monitoring the blackjack server.
//!
//! Metrics are exposed in Prometheus text format on a separate listener
//! when `METRICS_BIND` is set. Without an installed recorder every call here
//! is a no-op.
//!
//! # Metrics Categories
//!
//! - **WebSocket Metrics**: Active connections, messages sent/received
//! - **Room Metrics**: Rooms created, open rooms
//! - **Session Metrics**: Forced logouts
//! - **Rate Limiting Metrics**: Blocked messages
//!
//! # Example Usage
//!
//! ```rust,no_run
//! use bt_server::metrics;
//! use std::net::SocketAddr;
//!
//! let addr: SocketAddr = "127.0.0.1:9090".parse().unwrap();
//! metrics::init_metrics(addr).unwrap();
//!
//! metrics::websocket_connections_total();
//! metrics::rooms_created_total();
//! ```

use metrics_exporter_prometheus::PrometheusBuilder;
use std::{
    net::SocketAddr,
    sync::atomic::{AtomicI64, Ordering},
};

static ACTIVE_CONNECTIONS: AtomicI64 = AtomicI64::new(0);

/// Initialize Prometheus metrics exporter.
///
/// Metrics will be available at `http://<addr>/metrics`.
///
/// # Arguments
///
/// - `addr`: Address to bind the metrics server to (e.g., `0.0.0.0:9090`)
pub fn init_metrics(addr: SocketAddr) -> Result<(), String> {
    PrometheusBuilder::new()
        .with_http_listener(addr)
        .install()
        .map_err(|e| format!("Failed to install Prometheus exporter: {}", e))
}

// ============================================================================
// WebSocket Metrics
// ============================================================================

/// Track a WebSocket connection opening.
pub fn websocket_connected() {
    let active = ACTIVE_CONNECTIONS.fetch_add(1, Ordering::Relaxed) + 1;
    metrics::gauge!("websocket_connections_active").set(active as f64);
    websocket_connections_total();
}

/// Track a WebSocket connection closing.
pub fn websocket_disconnected() {
    let active = ACTIVE_CONNECTIONS.fetch_sub(1, Ordering::Relaxed) - 1;
    metrics::gauge!("websocket_connections_active").set(active.max(0) as f64);
}

/// Increment total WebSocket connections counter.
pub fn websocket_connections_total() {
    metrics::counter!("websocket_connections_total").increment(1);
}

/// Increment WebSocket messages sent counter.
pub fn websocket_messages_sent(event: &str) {
    metrics::counter!("websocket_messages_sent", "event" => event_family(event)).increment(1);
}

/// Increment WebSocket messages received counter.
pub fn websocket_messages_received(kind: &'static str) {
    metrics::counter!("websocket_messages_received", "type" => kind).increment(1);
}

/// Event names carry the room code; strip it to keep label cardinality bounded.
fn event_family(event: &str) -> String {
    match event.rsplit_once('_') {
        Some((family, code))
            if code.len() == 6
                && code
                    .chars()
                    .all(|c| c.is_ascii_uppercase() || c.is_ascii_digit()) =>
        {
            family.to_string()
        }
        _ => event.to_string(),
    }
}

// ============================================================================
// Room Metrics
// ============================================================================

/// Increment rooms created counter.
pub fn rooms_created_total() {
    metrics::counter!("rooms_created_total").increment(1);
}

/// Set current open rooms count.
pub fn active_rooms(count: usize) {
    metrics::gauge!("active_rooms").set(count as f64);
}

// ============================================================================
// Session Metrics
// ============================================================================

/// Increment forced logout counter.
pub fn forced_logouts_total() {
    metrics::counter!("forced_logouts_total").increment(1);
}

// ============================================================================
// Rate Limiting Metrics
// ============================================================================

/// Increment rate limit hits counter.
pub fn rate_limit_hits_total(window: &'static str) {
    metrics::counter!("rate_limit_hits_total", "window" => window).increment(1);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_family_strips_room_code() {
        assert_eq!(event_family("game_update_AB12CD"), "game_update");
        assert_eq!(event_family("chat_message_ZZZZZZ"), "chat_message");
        assert_eq!(event_family("force_logout"), "force_logout");
        assert_eq!(event_family("error"), "error");
    }

    #[test]
    fn test_recording_without_exporter_is_noop() {
        websocket_connected();
        websocket_messages_sent("game_update_AB12CD");
        websocket_messages_received("hit");
        rate_limit_hits_total("burst");
        websocket_disconnected();
    }
}
