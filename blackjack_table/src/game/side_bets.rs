//! Side-bet evaluation.
//!
//! Side bets are judged on the player's first two cards and the dealer's
//! hand, independently of how the main hand plays out.

use enum_dispatch::enum_dispatch;
use serde::{Deserialize, Serialize};
use std::fmt;

use super::entities::{Card, Chips, Rank, Suit};

/// Payout odds: `to` chips won for every `per` staked.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Odds {
    pub to: Chips,
    pub per: Chips,
}

impl Odds {
    pub const fn new(to: Chips, per: Chips) -> Self {
        Self { to, per }
    }

    /// Winnings for `stake`, rounded down to whole chips.
    ///
    /// Saturates at `Chips::MAX` rather than wrapping.
    pub fn winnings(self, stake: Chips) -> Chips {
        let won = i128::from(stake) * i128::from(self.to) / i128::from(self.per);
        Chips::try_from(won).unwrap_or(if won < 0 { Chips::MIN } else { Chips::MAX })
    }
}

impl fmt::Display for Odds {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.to, self.per)
    }
}

/// Cards a side bet is judged on.
#[derive(Clone, Copy, Debug)]
pub struct SideBetContext<'a> {
    /// The player's first two cards as dealt.
    pub player_cards: &'a [Card],
    /// The dealer's final hand; the first card is the up-card.
    pub dealer_cards: &'a [Card],
}

impl SideBetContext<'_> {
    fn pair(&self) -> Option<(&Card, &Card)> {
        match self.player_cards {
            [first, second, ..] => Some((first, second)),
            _ => None,
        }
    }

    fn dealer_up_card(&self) -> Option<&Card> {
        self.dealer_cards.first()
    }

    fn dealer_natural(&self) -> bool {
        super::scoring::is_natural(self.dealer_cards)
    }

    fn dealer_bust(&self) -> bool {
        super::scoring::is_bust(self.dealer_cards)
    }
}

/// A winning side-bet tier.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct SideBetWin {
    pub label: &'static str,
    pub odds: Odds,
}

impl SideBetWin {
    const fn new(label: &'static str, to: Chips, per: Chips) -> Self {
        Self {
            label,
            odds: Odds::new(to, per),
        }
    }
}

#[enum_dispatch]
pub trait SideBetEvaluator {
    /// The winning tier, or `None` when the bet loses.
    fn evaluate(&self, ctx: &SideBetContext) -> Option<SideBetWin>;
}

#[derive(Clone, Copy, Debug, Default)]
pub struct PerfectPairs;

impl SideBetEvaluator for PerfectPairs {
    fn evaluate(&self, ctx: &SideBetContext) -> Option<SideBetWin> {
        let (a, b) = ctx.pair()?;
        if a.rank != b.rank {
            return None;
        }
        Some(if a.suit == b.suit {
            SideBetWin::new("Perfect Pair", 25, 1)
        } else if a.suit.is_red() == b.suit.is_red() {
            SideBetWin::new("Colored Pair", 12, 1)
        } else {
            SideBetWin::new("Mixed Pair", 6, 1)
        })
    }
}

/// Poker hand formed by the player's two cards and the dealer's up-card.
#[derive(Clone, Copy, Debug, Default)]
pub struct TwentyOnePlusThree;

impl SideBetEvaluator for TwentyOnePlusThree {
    fn evaluate(&self, ctx: &SideBetContext) -> Option<SideBetWin> {
        let (a, b) = ctx.pair()?;
        let up = ctx.dealer_up_card()?;
        let three = [a, b, up];

        let flush = three.iter().all(|c| c.suit == a.suit);
        let trips = three.iter().all(|c| c.rank == a.rank);
        let mut idx: Vec<u8> = three.iter().map(|c| c.rank.index()).collect();
        idx.sort_unstable();
        let straight = idx[1] == idx[0] + 1 && idx[2] == idx[1] + 1;

        match (straight, flush, trips) {
            (true, true, _) => Some(SideBetWin::new("Straight Flush", 40, 1)),
            (_, _, true) => Some(SideBetWin::new("Three of a Kind", 30, 1)),
            (true, false, _) => Some(SideBetWin::new("Straight", 10, 1)),
            (false, true, _) => Some(SideBetWin::new("Flush", 5, 1)),
            _ => None,
        }
    }
}

/// Pays on a two-card 20.
#[derive(Clone, Copy, Debug, Default)]
pub struct LuckyLadies;

impl SideBetEvaluator for LuckyLadies {
    fn evaluate(&self, ctx: &SideBetContext) -> Option<SideBetWin> {
        let (a, b) = ctx.pair()?;
        if a.rank.value() + b.rank.value() != 20 {
            return None;
        }
        let queen_of_hearts = |c: &Card| c.rank == Rank::Queen && c.suit == Suit::Hearts;
        Some(if queen_of_hearts(a) && queen_of_hearts(b) {
            if ctx.dealer_natural() {
                SideBetWin::new("Queen of Hearts Pair with Dealer Blackjack", 1000, 1)
            } else {
                SideBetWin::new("Queen of Hearts Pair", 200, 1)
            }
        } else if a.rank == b.rank && a.suit == b.suit {
            SideBetWin::new("Matched 20", 25, 1)
        } else if a.suit == b.suit {
            SideBetWin::new("Suited 20", 10, 1)
        } else {
            SideBetWin::new("Any 20", 4, 1)
        })
    }
}

#[derive(Clone, Copy, Debug, Default)]
pub struct RoyalMatch;

impl SideBetEvaluator for RoyalMatch {
    fn evaluate(&self, ctx: &SideBetContext) -> Option<SideBetWin> {
        let (a, b) = ctx.pair()?;
        if a.suit != b.suit {
            return None;
        }
        let royal = matches!(
            (a.rank, b.rank),
            (Rank::King, Rank::Queen) | (Rank::Queen, Rank::King)
        );
        Some(if royal {
            SideBetWin::new("Royal Match", 25, 1)
        } else {
            SideBetWin::new("Suited Match", 5, 2)
        })
    }
}

/// Pays when the dealer busts, scaled by the number of dealer cards.
#[derive(Clone, Copy, Debug, Default)]
pub struct BusterBlackjack;

impl SideBetEvaluator for BusterBlackjack {
    fn evaluate(&self, ctx: &SideBetContext) -> Option<SideBetWin> {
        if !ctx.dealer_bust() {
            return None;
        }
        match ctx.dealer_cards.len() {
            n if n >= 8 => Some(SideBetWin::new("Dealer Bust with 8+ Cards", 200, 1)),
            7 => Some(SideBetWin::new("Dealer Bust with 7 Cards", 50, 1)),
            6 => Some(SideBetWin::new("Dealer Bust with 6 Cards", 15, 1)),
            5 => Some(SideBetWin::new("Dealer Bust with 5 Cards", 4, 1)),
            4 => Some(SideBetWin::new("Dealer Bust with 4 Cards", 2, 1)),
            3 => Some(SideBetWin::new("Dealer Bust with 3 Cards", 1, 1)),
            _ => None,
        }
    }
}

#[enum_dispatch(SideBetEvaluator)]
#[derive(Clone, Copy, Debug)]
pub enum SideBet {
    PerfectPairs,
    TwentyOnePlusThree,
    LuckyLadies,
    RoyalMatch,
    BusterBlackjack,
}

/// Named side bets a player can stake.
#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum SideBetKind {
    PerfectPairs,
    #[serde(rename = "21+3", alias = "twentyOnePlusThree")]
    TwentyOnePlusThree,
    LuckyLadies,
    RoyalMatch,
    BusterBlackjack,
}

impl SideBetKind {
    pub const ALL: [SideBetKind; 5] = [
        Self::PerfectPairs,
        Self::TwentyOnePlusThree,
        Self::LuckyLadies,
        Self::RoyalMatch,
        Self::BusterBlackjack,
    ];

    pub fn evaluator(self) -> SideBet {
        match self {
            Self::PerfectPairs => PerfectPairs.into(),
            Self::TwentyOnePlusThree => TwentyOnePlusThree.into(),
            Self::LuckyLadies => LuckyLadies.into(),
            Self::RoyalMatch => RoyalMatch.into(),
            Self::BusterBlackjack => BusterBlackjack.into(),
        }
    }

    pub fn display_name(self) -> &'static str {
        match self {
            Self::PerfectPairs => "Perfect Pairs",
            Self::TwentyOnePlusThree => "21+3",
            Self::LuckyLadies => "Lucky Ladies",
            Self::RoyalMatch => "Royal Match",
            Self::BusterBlackjack => "Buster Blackjack",
        }
    }
}

impl fmt::Display for SideBetKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.display_name())
    }
}
