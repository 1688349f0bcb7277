//! Blackjack round engine - entities, scoring and the room state machine.
//!
//! This module provides the synchronous game core:
//! - Cards, hands, players and the dealer
//! - Hand scoring with player-chosen Ace values
//! - Turn order across seats and split hands
//! - Settlement of main hands and side bets
//! - [`Room`], the aggregate every mutation goes through

pub mod actions;
pub mod entities;
pub mod errors;
pub mod room;
pub mod scoring;
pub mod settlement;
pub mod side_bets;
pub mod turns;

pub use actions::{BetTarget, PlayerAction};
pub use entities::{
    AceValue, Card, Chips, DealerHand, Deck, Hand, HandStatus, Player, PlayerId, Rank,
    RoundStatus, SeatIndex, Suit,
};
pub use errors::{GameError, GameResult};
pub use room::{DealerProgress, DealerView, Fingerprint, JoinOutcome, Room, RoomSnapshot, TableRules};
pub use settlement::{HandOutcome, HandResult, PlayerRoundResult, RoundResult, SideBetResult};
pub use side_bets::{SideBetEvaluator, SideBetKind};
pub use turns::TurnCursor;
