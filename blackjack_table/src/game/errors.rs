use thiserror::Error;

use super::entities::{Chips, RoundStatus};

/// Reasons the room rejects a request.
#[derive(Clone, Debug, Error, Eq, PartialEq)]
pub enum GameError {
    #[error("not your turn")]
    OutOfTurnAction,

    #[error("can't {action} during {status}")]
    WrongPhase {
        action: &'static str,
        status: RoundStatus,
    },

    #[error("player is not in this room")]
    PlayerNotFound,

    #[error("only the host can {0}")]
    NotHost(&'static str),

    #[error("minimum bet is {min}")]
    BetBelowMinimum { min: Chips },

    #[error("maximum bet is {max}")]
    BetAboveMaximum { max: Chips },

    #[error("bet is already locked")]
    BetLocked,

    #[error("spectators can't {0}")]
    Spectating(&'static str),

    #[error("choose a value for your Ace first")]
    AceValuePending,

    #[error("{0}")]
    InvalidAction(String),

    #[error("deck exhausted mid-round")]
    InsufficientDeck,

    #[error("round {0} was already settled")]
    ConcurrentSettlementAttempt(u64),
}

impl GameError {
    /// Message safe to show the player.
    pub fn client_message(&self) -> String {
        match self {
            Self::InsufficientDeck => "The deck ran out; this round is void".to_string(),
            Self::ConcurrentSettlementAttempt(_) => "Round already settled".to_string(),
            other => {
                let mut msg = other.to_string();
                if let Some(first) = msg.get_mut(0..1) {
                    first.make_ascii_uppercase();
                }
                msg
            }
        }
    }
}

pub type GameResult<T> = Result<T, GameError>;
