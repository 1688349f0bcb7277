use std::fmt;
use uuid::Uuid;

use super::{
    entities::{AceValue, Chips},
    side_bets::SideBetKind,
};

/// Where placed chips go.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum BetTarget {
    Main,
    Side(SideBetKind),
}

/// Everything a player can ask the room to do.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum PlayerAction {
    PlaceBet {
        amount: Chips,
        target: BetTarget,
    },
    ClearBets,
    LockBet,
    Hit,
    Stand,
    Double,
    Split,
    /// Accepted and ignored; surrender is not offered at this table.
    Surrender,
    ChooseAce {
        hand_index: usize,
        card_id: Uuid,
        value: AceValue,
    },
    ToggleSpectator,
    ForceStart,
    NewRound,
    SetKeepBets {
        keep_main_bet: bool,
        keep_side_bets: bool,
    },
}

impl fmt::Display for PlayerAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::PlaceBet {
                amount,
                target: BetTarget::Main,
            } => write!(f, "bet {amount}"),
            Self::PlaceBet {
                amount,
                target: BetTarget::Side(kind),
            } => write!(f, "bet {amount} on {kind}"),
            Self::ClearBets => write!(f, "clear bets"),
            Self::LockBet => write!(f, "lock bet"),
            Self::Hit => write!(f, "hit"),
            Self::Stand => write!(f, "stand"),
            Self::Double => write!(f, "double"),
            Self::Split => write!(f, "split"),
            Self::Surrender => write!(f, "surrender"),
            Self::ChooseAce {
                hand_index, value, ..
            } => write!(
                f,
                "count an Ace as {} in hand {hand_index}",
                value.points()
            ),
            Self::ToggleSpectator => write!(f, "toggle spectator"),
            Self::ForceStart => write!(f, "force start"),
            Self::NewRound => write!(f, "new round"),
            Self::SetKeepBets {
                keep_main_bet,
                keep_side_bets,
            } => write!(f, "keep bets (main: {keep_main_bet}, side: {keep_side_bets})"),
        }
    }
}
