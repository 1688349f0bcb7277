//! Authentication data models.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::game::PlayerId;

/// User ID type
pub type UserId = PlayerId;

/// JWT claims for access token
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccessTokenClaims {
    pub sub: UserId,
    pub username: String,
    pub is_guest: bool,
    pub exp: i64,
    pub iat: i64,
}

/// Who a connection acts as.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    pub player_id: UserId,
    pub username: String,
}

impl From<AccessTokenClaims> for Identity {
    fn from(claims: AccessTokenClaims) -> Self {
        Self {
            player_id: claims.sub,
            username: claims.username,
        }
    }
}

/// Out-of-band notices pushed to a live connection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case", rename_all_fields = "camelCase")]
pub enum SessionSignal {
    /// The identity logged in elsewhere; this connection must close.
    ForceLogout {
        reason: String,
        new_login_time: DateTime<Utc>,
    },
}
