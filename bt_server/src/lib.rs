//! Blackjack room server library.
//!
//! Exposes the HTTP/WebSocket API together with the configuration, logging
//! and metrics plumbing the `bt_server` binary wires up.

pub mod api;
pub mod config;
pub mod logging;
pub mod metrics;
