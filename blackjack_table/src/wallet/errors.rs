//! Wallet error types.

use thiserror::Error;

use crate::game::{Chips, PlayerId};

/// Wallet errors
#[derive(Debug, Error)]
pub enum WalletError {
    /// Balance would overflow
    #[error("Balance overflow for player {player_id} applying {delta}")]
    Overflow { player_id: PlayerId, delta: Chips },

    /// Backing store failure
    #[error("Balance store unavailable: {0}")]
    Unavailable(String),
}

impl WalletError {
    /// Get a client-safe error message that doesn't leak player IDs or store details
    pub fn client_message(&self) -> String {
        match self {
            WalletError::Overflow { .. } => "Balance limit reached".to_string(),
            WalletError::Unavailable(_) => "Internal server error".to_string(),
        }
    }
}

/// Result type for wallet operations
pub type WalletResult<T> = Result<T, WalletError>;
