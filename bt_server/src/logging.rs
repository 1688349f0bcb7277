//! Structured logging configuration.
//!
//! The library logs through the `log` facade; the server logs with `tracing`.
//! Both end up in the same subscriber.

use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

/// Default filter when `RUST_LOG` is unset
pub const DEFAULT_FILTER: &str = "info,hyper=warn,tower_http=warn";

/// Initialize structured logging
///
/// Log levels come from the `RUST_LOG` env var. Installing the subscriber
/// also installs the `log` bridge, so `log::info!` records from the game
/// library show up alongside `tracing` events.
///
/// # Example
///
/// ```no_run
/// use bt_server::logging;
///
/// #[tokio::main]
/// async fn main() {
///     logging::init();
///     tracing::info!("Server starting");
/// }
/// ```
pub fn init() {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_target(true)
        .with_thread_ids(true)
        .with_line_number(true);

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer)
        .init();

    tracing::info!("Structured logging initialized");
}

/// Log a security-relevant connection event
///
/// # Arguments
///
/// * `event_type` - Type of security event
/// * `player_id` - Player involved, if known
/// * `message` - Event message
pub fn log_security_event(event_type: &str, player_id: Option<i64>, message: &str) {
    tracing::warn!(
        event_type = event_type,
        player_id = player_id,
        "SECURITY: {}",
        message
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_filter_parses() {
        assert!(EnvFilter::try_new(DEFAULT_FILTER).is_ok());
    }

    #[test]
    fn test_log_security_event() {
        // Just ensure it doesn't panic without a subscriber
        log_security_event("force_logout", Some(1), "Displaced by a newer login");
        log_security_event("bad_token", None, "Rejected WebSocket upgrade");
    }
}
