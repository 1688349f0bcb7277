//! Authentication middleware for protected endpoints.
//!
//! Validates the `Authorization: Bearer <token>` header and injects the
//! caller's [`Identity`] into request extensions.
//!
//! ```rust,no_run
//! use axum::extract::Extension;
//! use blackjack_table::auth::Identity;
//!
//! async fn protected_handler(Extension(identity): Extension<Identity>) -> String {
//!     format!("Authenticated as {}", identity.username)
//! }
//! # let _ = protected_handler;
//! ```

use axum::{
    extract::{Request, State},
    http::{StatusCode, header::AUTHORIZATION},
    middleware::Next,
    response::Response,
};
use blackjack_table::auth::Identity;

use super::AppState;

/// Authentication middleware that validates JWT tokens and injects the identity.
///
/// # Behavior
///
/// - **Success**: Token valid → Injects `Identity` → Calls next handler
/// - **Missing header / bad format / invalid or expired token**: `401 Unauthorized`
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, StatusCode> {
    let token = request
        .headers()
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .ok_or(StatusCode::UNAUTHORIZED)?;

    let identity: Identity = state
        .sessions
        .resolve_identity(token)
        .map_err(|_| StatusCode::UNAUTHORIZED)?;

    request.extensions_mut().insert(identity);
    Ok(next.run(request).await)
}
