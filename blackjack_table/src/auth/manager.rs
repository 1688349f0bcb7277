//! Session manager: access tokens, guest identities and single-session enforcement.

use super::{
    errors::{AuthError, AuthResult},
    models::{AccessTokenClaims, Identity, SessionSignal, UserId},
};
use chrono::{Duration, Utc};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use std::{
    collections::HashMap,
    sync::atomic::{AtomicI64, Ordering},
};
use tokio::sync::{RwLock, mpsc};
use uuid::Uuid;

struct LiveSession {
    connection_id: Uuid,
    signals: mpsc::Sender<SessionSignal>,
}

/// Session manager
pub struct SessionManager {
    jwt_secret: String,
    access_token_duration: Duration,
    next_guest_id: AtomicI64,
    live: RwLock<HashMap<UserId, LiveSession>>,
}

impl SessionManager {
    /// Create a new session manager
    ///
    /// # Arguments
    ///
    /// * `jwt_secret` - HS256 signing secret
    ///
    /// # Returns
    ///
    /// * `SessionManager` - New session manager instance
    pub fn new(jwt_secret: String) -> Self {
        let token_hours = std::env::var("ACCESS_TOKEN_HOURS")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(24);

        Self {
            jwt_secret,
            access_token_duration: Duration::hours(token_hours),
            next_guest_id: AtomicI64::new(1),
            live: RwLock::new(HashMap::new()),
        }
    }

    /// Issue a token for a fresh guest identity
    ///
    /// # Returns
    ///
    /// * `AuthResult<(Identity, String)>` - The new identity and its access token
    pub fn issue_guest_token(&self, username: &str) -> AuthResult<(Identity, String)> {
        let username = username.trim();
        Self::validate_username(username)?;
        let player_id = self.next_guest_id.fetch_add(1, Ordering::Relaxed);
        let token = self.generate_access_token(player_id, username)?;
        log::info!("Issued guest identity {} ({})", player_id, username);
        Ok((
            Identity {
                player_id,
                username: username.to_string(),
            },
            token,
        ))
    }

    /// Verify an access token
    ///
    /// # Arguments
    ///
    /// * `token` - JWT access token
    ///
    /// # Returns
    ///
    /// * `AuthResult<AccessTokenClaims>` - Decoded claims or error
    pub fn verify_access_token(&self, token: &str) -> AuthResult<AccessTokenClaims> {
        let token_data = decode::<AccessTokenClaims>(
            token,
            &DecodingKey::from_secret(self.jwt_secret.as_bytes()),
            &Validation::default(),
        )?;

        Ok(token_data.claims)
    }

    /// Resolve a connection's token to the identity it acts as
    pub fn resolve_identity(&self, token: &str) -> AuthResult<Identity> {
        self.verify_access_token(token).map(Identity::from)
    }

    /// Register a connection as the only live session for an identity
    ///
    /// Any previous connection is sent `ForceLogout` and forgotten.
    ///
    /// # Returns
    ///
    /// * `Option<Uuid>` - Connection that was displaced, if any
    pub async fn enforce_single_session(
        &self,
        player_id: UserId,
        connection_id: Uuid,
        signals: mpsc::Sender<SessionSignal>,
    ) -> Option<Uuid> {
        let mut live = self.live.write().await;
        let previous = live.insert(
            player_id,
            LiveSession {
                connection_id,
                signals,
            },
        )?;
        if previous.connection_id == connection_id {
            return None;
        }

        let signal = SessionSignal::ForceLogout {
            reason: "Logged in from another location".to_string(),
            new_login_time: Utc::now(),
        };
        if previous.signals.try_send(signal).is_err() {
            log::debug!(
                "Displaced connection {} for player {} already gone",
                previous.connection_id,
                player_id
            );
        }
        log::info!(
            "Player {} logged in again; displacing connection {}",
            player_id,
            previous.connection_id
        );
        Some(previous.connection_id)
    }

    /// Forget a connection's session if it is still the live one
    pub async fn release(&self, player_id: UserId, connection_id: Uuid) -> AuthResult<()> {
        let mut live = self.live.write().await;
        match live.get(&player_id) {
            Some(session) if session.connection_id == connection_id => {
                live.remove(&player_id);
                Ok(())
            }
            _ => Err(AuthError::SessionNotFound),
        }
    }

    /// Generate JWT access token for a guest
    fn generate_access_token(&self, user_id: UserId, username: &str) -> AuthResult<String> {
        let now = Utc::now();
        let claims = AccessTokenClaims {
            sub: user_id,
            username: username.to_string(),
            is_guest: true,
            exp: (now + self.access_token_duration).timestamp(),
            iat: now.timestamp(),
        };

        let token = encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(self.jwt_secret.as_bytes()),
        )?;

        Ok(token)
    }

    /// Validate username format
    fn validate_username(username: &str) -> AuthResult<()> {
        let len = username.chars().count();
        if !(3..=20).contains(&len) {
            return Err(AuthError::InvalidUsername(
                "Username must be 3-20 characters".to_string(),
            ));
        }

        if !username.chars().all(|c| c.is_alphanumeric() || c == '_') {
            return Err(AuthError::InvalidUsername(
                "Username can only contain letters, numbers, and underscores".to_string(),
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &str = "test_secret_that_is_long_enough_for_hs256";

    fn manager() -> SessionManager {
        SessionManager::new(SECRET.to_string())
    }

    // === Token Tests ===

    #[test]
    fn test_guest_token_round_trip() {
        let sessions = manager();
        let (identity, token) = sessions.issue_guest_token("alice").unwrap();
        let claims = sessions.verify_access_token(&token).unwrap();
        assert_eq!(claims.sub, identity.player_id);
        assert_eq!(claims.username, "alice");
        assert!(claims.is_guest);
        assert!(claims.exp > claims.iat);
    }

    #[test]
    fn test_guest_ids_are_unique() {
        let sessions = manager();
        let (a, _) = sessions.issue_guest_token("alice").unwrap();
        let (b, _) = sessions.issue_guest_token("alice").unwrap();
        assert_ne!(a.player_id, b.player_id);
    }

    #[test]
    fn test_token_from_other_secret_rejected() {
        let other = SessionManager::new("a_completely_different_secret_value!".to_string());
        let (_, token) = other.issue_guest_token("mallory").unwrap();
        let err = manager().resolve_identity(&token).unwrap_err();
        assert_eq!(err.client_message(), "Authentication failed");
    }

    #[test]
    fn test_expired_token_rejected() {
        let now = Utc::now();
        let claims = AccessTokenClaims {
            sub: 9,
            username: "late".to_string(),
            is_guest: true,
            exp: (now - Duration::hours(2)).timestamp(),
            iat: (now - Duration::hours(3)).timestamp(),
        };
        let token = encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(SECRET.as_bytes()),
        )
        .unwrap();

        assert!(matches!(
            manager().resolve_identity(&token),
            Err(AuthError::TokenExpired)
        ));
    }

    #[test]
    fn test_garbage_token_rejected() {
        assert!(manager().verify_access_token("not.a.jwt").is_err());
    }

    #[test]
    fn test_invalid_usernames() {
        let sessions = manager();
        assert!(matches!(
            sessions.issue_guest_token("ab"),
            Err(AuthError::InvalidUsername(_))
        ));
        assert!(matches!(
            sessions.issue_guest_token("bad name!"),
            Err(AuthError::InvalidUsername(_))
        ));
        assert!(sessions.issue_guest_token("  padded_ok  ").is_ok());
    }

    #[test]
    fn test_resolve_identity_from_guest_token() {
        let sessions = manager();
        let (identity, token) = sessions.issue_guest_token("bob").unwrap();
        assert_eq!(sessions.resolve_identity(&token).unwrap(), identity);
    }

    // === Single Session Tests ===

    #[tokio::test]
    async fn test_second_login_displaces_first() {
        let sessions = manager();
        let (tx1, mut rx1) = mpsc::channel(4);
        let (tx2, _rx2) = mpsc::channel(4);
        let first = Uuid::new_v4();
        let second = Uuid::new_v4();

        assert_eq!(sessions.enforce_single_session(1, first, tx1).await, None);
        assert_eq!(
            sessions.enforce_single_session(1, second, tx2).await,
            Some(first)
        );

        match rx1.recv().await {
            Some(SessionSignal::ForceLogout { reason, .. }) => {
                assert_eq!(reason, "Logged in from another location");
            }
            other => panic!("expected force logout, got {other:?}"),
        }
        assert!(matches!(
            sessions.release(1, first).await,
            Err(AuthError::SessionNotFound)
        ));
        assert!(sessions.release(1, second).await.is_ok());
    }

    #[tokio::test]
    async fn test_release_only_removes_live_connection() {
        let sessions = manager();
        let (tx, _rx) = mpsc::channel(4);
        let live = Uuid::new_v4();
        sessions.enforce_single_session(5, live, tx).await;

        assert!(matches!(
            sessions.release(5, Uuid::new_v4()).await,
            Err(AuthError::SessionNotFound)
        ));
        sessions.release(5, live).await.unwrap();
        assert!(matches!(
            sessions.release(5, live).await,
            Err(AuthError::SessionNotFound)
        ));
    }

    #[test]
    fn test_force_logout_wire_shape() {
        let signal = SessionSignal::ForceLogout {
            reason: "x".to_string(),
            new_login_time: Utc::now(),
        };
        let json = serde_json::to_value(&signal).unwrap();
        assert_eq!(json["type"], "force_logout");
        assert!(json.get("newLoginTime").is_some());
    }
}
