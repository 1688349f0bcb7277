//! Wallet module: player chip balances.
//!
//! Rooms credit or debit each player once per settled round through
//! [`BalanceStore::apply_balance_delta`].
//!
//! ## Example
//!
//! ```
//! use blackjack_table::wallet::{BalanceStore, InMemoryBalanceStore};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let wallet = InMemoryBalanceStore::new();
//!     let balance = wallet.apply_balance_delta(1, 150).await?;
//!     assert_eq!(balance, 1150);
//!     Ok(())
//! }
//! ```

pub mod errors;
pub mod store;

pub use errors::{WalletError, WalletResult};
pub use store::{BalanceStore, DEFAULT_STARTING_BALANCE, InMemoryBalanceStore};
