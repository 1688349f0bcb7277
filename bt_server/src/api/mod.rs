//! HTTP/WebSocket API for the blackjack server.
//!
//! # Modules
//!
//! - [`auth`]: Guest login
//! - [`rooms`]: Room creation and read-only room views
//! - [`players`]: The caller's balance and statistics, and the leaderboard
//! - [`websocket`]: The live game connection
//! - [`middleware`]: Bearer-token authentication for protected endpoints
//!
//! # Endpoints Overview
//!
//! ```text
//! GET  /health                          - Health check (public)
//! POST /api/v1/auth/guest               - Guest login (public)
//! POST /api/v1/rooms                    - Create room (auth required)
//! GET  /api/v1/rooms/{code}             - Room snapshot (public)
//! GET  /api/v1/rooms/{code}/chat        - Chat history (public)
//! GET  /api/v1/players/me               - Balance and stats (auth required)
//! GET  /api/v1/leaderboard              - Players by balance (public)
//! GET  /ws?token=<jwt>                  - WebSocket (auth via query)
//! ```
//!
//! # CORS
//!
//! CORS is configured permissively for development. In production, configure
//! appropriate origins, methods, and headers.

pub mod auth;
pub mod middleware;
pub mod players;
pub mod rate_limiter;
pub mod rooms;
pub mod websocket;

use axum::{
    Router,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Json},
    routing::{get, post},
};
use blackjack_table::{
    auth::SessionManager, room::RoomManager, stats::StatsStore, wallet::BalanceStore,
};
use serde::Serialize;
use serde_json::json;
use std::sync::Arc;
use tower_http::cors::CorsLayer;

/// Application state shared across all HTTP handlers and WebSocket connections.
///
/// Cloned per request; every field is behind an `Arc`.
#[derive(Clone)]
pub struct AppState {
    pub sessions: Arc<SessionManager>,
    pub rooms: Arc<RoomManager>,
    pub balances: Arc<dyn BalanceStore>,
    pub stats: Arc<dyn StatsStore>,
}

/// Error body returned by every endpoint
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

/// Shorthand for a failed handler result
pub fn error_response(status: StatusCode, error: impl Into<String>) -> (StatusCode, Json<ErrorResponse>) {
    (
        status,
        Json(ErrorResponse {
            error: error.into(),
        }),
    )
}

/// Create the complete API router with all endpoints and middleware.
///
/// # Arguments
///
/// - `state`: Application state with managers
///
/// # Example
///
/// ```rust,no_run
/// # use bt_server::api::{create_router, AppState};
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// # let state: AppState = unimplemented!();
/// let app = create_router(state);
/// let listener = tokio::net::TcpListener::bind("0.0.0.0:3000").await?;
/// axum::serve(listener, app).await?;
/// # Ok(())
/// # }
/// ```
pub fn create_router(state: AppState) -> Router {
    let v1_routes = create_v1_router(state.clone());

    // WebSocket route handles its own auth via query parameter
    let root_routes = Router::new()
        .route("/health", get(health_check))
        .route("/ws", get(websocket::websocket_handler));

    Router::new()
        .merge(root_routes)
        .nest("/api/v1", v1_routes)
        .layer(CorsLayer::permissive())
        .with_state(state)
}

fn create_v1_router(state: AppState) -> Router<AppState> {
    let public_routes = Router::new()
        .route("/auth/guest", post(auth::guest_login))
        .route("/rooms/{code}", get(rooms::get_room))
        .route("/rooms/{code}/chat", get(rooms::get_chat_history))
        .route("/leaderboard", get(players::leaderboard));

    let protected_routes = Router::new()
        .route("/rooms", post(rooms::create_room))
        .route("/players/me", get(players::me))
        .layer(axum::middleware::from_fn_with_state(
            state,
            middleware::auth_middleware,
        ));

    Router::new().merge(public_routes).merge(protected_routes)
}

/// Health check endpoint for monitoring and load balancers.
///
/// # Example
///
/// ```bash
/// curl http://localhost:6969/health
/// # {"status":"healthy","version":"0.1.0","rooms":2,"timestamp":"2026-10-16T10:30:00Z"}
/// ```
async fn health_check(State(state): State<AppState>) -> impl IntoResponse {
    let room_count = state.rooms.room_count().await;

    let response = json!({
        "status": "healthy",
        "version": env!("CARGO_PKG_VERSION"),
        "rooms": room_count,
        "timestamp": chrono::Utc::now().to_rfc3339(),
    });

    (StatusCode::OK, Json(response))
}
