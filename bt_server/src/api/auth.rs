//! Authentication API handlers.
//!
//! Players join as guests: a display name buys an access token for a fresh
//! identity.
//!
//! ```bash
//! curl -X POST http://localhost:6969/api/v1/auth/guest \
//!   -H "Content-Type: application/json" \
//!   -d '{"username": "player1"}'
//! ```

use axum::{Json, extract::State, http::StatusCode};
use serde::{Deserialize, Serialize};

use super::{AppState, ErrorResponse, error_response};

#[derive(Debug, Deserialize)]
pub struct GuestPayload {
    pub username: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct AuthResponse {
    pub token: String,
    pub user_id: i64,
    pub username: String,
    pub balance: i64,
}

/// Issue a guest identity and its access token.
///
/// # Response
///
/// ```json
/// {
///   "token": "eyJhbGciOiJIUzI1NiIs...",
///   "user_id": 42,
///   "username": "player1",
///   "balance": 1000
/// }
/// ```
///
/// # Errors
///
/// - `400 Bad Request`: Username is not 3-20 letters, digits or underscores
/// - `500 Internal Server Error`: Balance store unavailable
pub async fn guest_login(
    State(state): State<AppState>,
    Json(payload): Json<GuestPayload>,
) -> Result<Json<AuthResponse>, (StatusCode, Json<ErrorResponse>)> {
    let (identity, token) = state
        .sessions
        .issue_guest_token(&payload.username)
        .map_err(|e| error_response(StatusCode::BAD_REQUEST, e.client_message()))?;

    let balance = state
        .balances
        .get_balance(identity.player_id)
        .await
        .map_err(|e| error_response(StatusCode::INTERNAL_SERVER_ERROR, e.client_message()))?;

    Ok(Json(AuthResponse {
        token,
        user_id: identity.player_id,
        username: identity.username,
        balance,
    }))
}
