//! # Blackjack Table
//!
//! A multiplayer blackjack engine: an authoritative per-room round state
//! machine, and the machinery that keeps every connected client in sync with it.
//!
//! ## Architecture
//!
//! A round moves through six phases:
//!
//! - **Betting**: Players place main and side bets, then lock in
//! - **Dealing**: Shuffle pause once every seated player has locked
//! - **CardDealing**: Two cards each, one at a time, dealer included
//! - **Playing**: Seats act in order, hand by hand
//! - **Dealer**: The dealer draws to 17
//! - **RoundOver**: Results are shown, then the next round opens
//!
//! ## Core Modules
//!
//! - [`game`]: Synchronous game core (cards, scoring, side bets, settlement, the `Room` aggregate)
//! - [`room`]: Per-room actors, timers, throttled broadcasts and the room repository
//! - [`wallet`]: Balance store that settlement deltas are applied to
//! - [`stats`]: Per-player round statistics
//! - [`auth`]: Access tokens and single-session enforcement
//!
//! ## Example
//!
//! ```
//! use blackjack_table::{BetTarget, PlayerAction, Room, RoundStatus, TableRules};
//!
//! let mut room = Room::new("ABC123", TableRules::default(), None);
//! room.join(1, "alice");
//! room.apply(1, PlayerAction::PlaceBet { amount: 25, target: BetTarget::Main }).unwrap();
//! room.apply(1, PlayerAction::LockBet).unwrap();
//! assert_eq!(room.status(), RoundStatus::Dealing);
//! ```

/// Authentication and session tracking.
pub mod auth;

/// Core game logic, entities, and state machine.
pub mod game;
pub use game::{
    BetTarget, GameError, GameResult, PlayerAction, Room, RoomSnapshot, RoundStatus, TableRules,
};

/// Room actors and the room repository.
pub mod room;
pub use room::{RoomConfig, RoomManager};

/// Player statistics.
pub mod stats;

/// Chip balances.
pub mod wallet;
