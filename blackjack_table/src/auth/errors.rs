//! Authentication error types.

use jsonwebtoken::errors::ErrorKind;
use thiserror::Error;

/// Authentication errors
#[derive(Debug, Error)]
pub enum AuthError {
    /// Display name rejected for guest login
    #[error("Invalid username: {0}")]
    InvalidUsername(String),

    /// Token was well-formed but its lifetime is over
    #[error("Access token expired")]
    TokenExpired,

    /// Token failed signature or claim validation
    #[error("JWT error: {0}")]
    JwtError(jsonwebtoken::errors::Error),

    /// Connection is not the identity's live session
    #[error("Session not found")]
    SessionNotFound,
}

impl From<jsonwebtoken::errors::Error> for AuthError {
    fn from(err: jsonwebtoken::errors::Error) -> Self {
        match err.kind() {
            ErrorKind::ExpiredSignature => AuthError::TokenExpired,
            _ => AuthError::JwtError(err),
        }
    }
}

impl AuthError {
    /// Message safe to show a client; token internals are never echoed back.
    pub fn client_message(&self) -> String {
        match self {
            AuthError::TokenExpired => "Session expired, please log in again".to_string(),
            AuthError::JwtError(_) => "Authentication failed".to_string(),
            _ => self.to_string(),
        }
    }
}

/// Result type for authentication operations
pub type AuthResult<T> = Result<T, AuthError>;
