//! Balance store trait and the in-memory implementation.

use async_trait::async_trait;
use std::{collections::HashMap, sync::Arc};
use tokio::sync::RwLock;

use super::errors::{WalletError, WalletResult};
use crate::game::{Chips, PlayerId};

/// Starting balance for a player the store has not seen before.
pub const DEFAULT_STARTING_BALANCE: Chips = 1000;

/// Where settled chips land.
///
/// Bets are not reserved up front; a room applies one signed delta per
/// player when a round is settled.
#[async_trait]
pub trait BalanceStore: Send + Sync {
    /// Applies a settlement delta.
    ///
    /// # Arguments
    ///
    /// * `player_id` - Player whose balance changes
    /// * `delta` - Signed chip change
    ///
    /// # Returns
    ///
    /// * `WalletResult<Chips>` - New balance
    async fn apply_balance_delta(&self, player_id: PlayerId, delta: Chips) -> WalletResult<Chips>;

    async fn get_balance(&self, player_id: PlayerId) -> WalletResult<Chips>;
}

/// Balances held in process memory.
#[derive(Clone)]
pub struct InMemoryBalanceStore {
    balances: Arc<RwLock<HashMap<PlayerId, Chips>>>,
    starting_balance: Chips,
}

impl InMemoryBalanceStore {
    pub fn new() -> Self {
        Self::with_starting_balance(DEFAULT_STARTING_BALANCE)
    }

    pub fn with_starting_balance(starting_balance: Chips) -> Self {
        Self {
            balances: Arc::new(RwLock::new(HashMap::new())),
            starting_balance,
        }
    }
}

impl Default for InMemoryBalanceStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl BalanceStore for InMemoryBalanceStore {
    async fn apply_balance_delta(&self, player_id: PlayerId, delta: Chips) -> WalletResult<Chips> {
        let mut balances = self.balances.write().await;
        let balance = balances.entry(player_id).or_insert(self.starting_balance);
        *balance = balance
            .checked_add(delta)
            .ok_or(WalletError::Overflow { player_id, delta })?;
        log::debug!(
            "Player {} balance {:+} -> {}",
            player_id,
            delta,
            *balance
        );
        Ok(*balance)
    }

    async fn get_balance(&self, player_id: PlayerId) -> WalletResult<Chips> {
        let balances = self.balances.read().await;
        Ok(balances
            .get(&player_id)
            .copied()
            .unwrap_or(self.starting_balance))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_unknown_player_has_starting_balance() {
        let store = InMemoryBalanceStore::new();
        assert_eq!(store.get_balance(42).await.unwrap(), 1000);
    }

    #[tokio::test]
    async fn test_apply_delta() {
        let store = InMemoryBalanceStore::new();
        assert_eq!(store.apply_balance_delta(1, 150).await.unwrap(), 1150);
        assert_eq!(store.apply_balance_delta(1, -200).await.unwrap(), 950);
        assert_eq!(store.get_balance(1).await.unwrap(), 950);
    }

    #[tokio::test]
    async fn test_balance_may_go_negative() {
        let store = InMemoryBalanceStore::with_starting_balance(10);
        assert_eq!(store.apply_balance_delta(1, -50).await.unwrap(), -40);
    }

    #[tokio::test]
    async fn test_overflow_is_rejected() {
        let store = InMemoryBalanceStore::with_starting_balance(Chips::MAX);
        let err = store.apply_balance_delta(1, 1).await.unwrap_err();
        assert!(matches!(err, WalletError::Overflow { .. }));
        assert_eq!(err.client_message(), "Balance limit reached");
    }
}
