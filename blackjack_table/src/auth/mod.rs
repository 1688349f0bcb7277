//! Authentication module providing access tokens and live-session tracking.
//!
//! This module implements:
//! - HS256 JWT access tokens
//! - Guest identities for players without an account
//! - One live connection per identity; a newer login displaces the older one
//!
//! ## Example
//!
//! ```
//! use blackjack_table::auth::SessionManager;
//!
//! let sessions = SessionManager::new("a_long_enough_secret_for_signing_tokens".to_string());
//! let (identity, token) = sessions.issue_guest_token("player1").unwrap();
//! assert_eq!(sessions.resolve_identity(&token).unwrap(), identity);
//! ```

pub mod errors;
pub mod manager;
pub mod models;

pub use errors::{AuthError, AuthResult};
pub use manager::SessionManager;
pub use models::{AccessTokenClaims, Identity, SessionSignal, UserId};
