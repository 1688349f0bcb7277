use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};
use std::{
    collections::{BTreeMap, VecDeque},
    fmt::{self},
};
use uuid::Uuid;

use super::{scoring, side_bets::SideBetKind};

/// Player identifier, shared with the session registry.
pub type PlayerId = i64;

/// Type alias for whole chips. Bets are non-negative; winnings are signed.
pub type Chips = i64;

/// Type alias for table positions.
pub type SeatIndex = usize;

#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Suit {
    Clubs,
    Diamonds,
    Hearts,
    Spades,
}

impl Suit {
    pub const ALL: [Suit; 4] = [Self::Clubs, Self::Diamonds, Self::Hearts, Self::Spades];

    pub fn is_red(self) -> bool {
        matches!(self, Self::Diamonds | Self::Hearts)
    }
}

impl fmt::Display for Suit {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let repr = match self {
            Self::Clubs => "♣",
            Self::Diamonds => "♦",
            Self::Hearts => "♥",
            Self::Spades => "♠",
        };
        write!(f, "{repr}")
    }
}

#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize)]
pub enum Rank {
    #[serde(rename = "A")]
    Ace,
    #[serde(rename = "2")]
    Two,
    #[serde(rename = "3")]
    Three,
    #[serde(rename = "4")]
    Four,
    #[serde(rename = "5")]
    Five,
    #[serde(rename = "6")]
    Six,
    #[serde(rename = "7")]
    Seven,
    #[serde(rename = "8")]
    Eight,
    #[serde(rename = "9")]
    Nine,
    #[serde(rename = "10")]
    Ten,
    #[serde(rename = "J")]
    Jack,
    #[serde(rename = "Q")]
    Queen,
    #[serde(rename = "K")]
    King,
}

impl Rank {
    pub const ALL: [Rank; 13] = [
        Self::Ace,
        Self::Two,
        Self::Three,
        Self::Four,
        Self::Five,
        Self::Six,
        Self::Seven,
        Self::Eight,
        Self::Nine,
        Self::Ten,
        Self::Jack,
        Self::Queen,
        Self::King,
    ];

    /// Position in A, 2, ..., K order (ace low).
    pub fn index(self) -> u8 {
        self as u8
    }

    /// Blackjack value with an Ace counted high.
    pub fn value(self) -> u32 {
        match self {
            Self::Ace => 11,
            Self::Ten | Self::Jack | Self::Queen | Self::King => 10,
            other => u32::from(other.index()) + 1,
        }
    }

    pub fn is_ace(self) -> bool {
        self == Self::Ace
    }
}

impl fmt::Display for Rank {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let repr = match self {
            Self::Ace => "A",
            Self::Jack => "J",
            Self::Queen => "Q",
            Self::King => "K",
            other => return write!(f, "{}", other.value()),
        };
        write!(f, "{repr}")
    }
}

/// The value a player fixes for an Ace.
#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, PartialEq, Serialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum AceValue {
    One,
    Eleven,
}

impl AceValue {
    pub fn points(self) -> u32 {
        match self {
            Self::One => 1,
            Self::Eleven => 11,
        }
    }
}

impl From<AceValue> for u8 {
    fn from(value: AceValue) -> Self {
        match value {
            AceValue::One => 1,
            AceValue::Eleven => 11,
        }
    }
}

impl TryFrom<u8> for AceValue {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(Self::One),
            11 => Ok(Self::Eleven),
            other => Err(format!("an Ace is worth 1 or 11, not {other}")),
        }
    }
}

/// A physical card in play. Only `chosen_value` changes after the deal.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Card {
    pub rank: Rank,
    pub suit: Suit,
    pub instance_id: Uuid,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chosen_value: Option<AceValue>,
}

impl Card {
    pub fn new(rank: Rank, suit: Suit) -> Self {
        Self {
            rank,
            suit,
            instance_id: Uuid::new_v4(),
            chosen_value: None,
        }
    }

    pub fn is_ace(&self) -> bool {
        self.rank.is_ace()
    }

    /// An Ace whose value has not been fixed yet.
    pub fn is_unresolved_ace(&self) -> bool {
        self.is_ace() && self.chosen_value.is_none()
    }
}

impl fmt::Display for Card {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let repr = format!("{}/{}", self.rank, self.suit);
        write!(f, "{repr:>4}")
    }
}

/// A single 52-card shoe, drawn from the top.
#[derive(Debug, Default)]
pub struct Deck {
    cards: VecDeque<Card>,
}

impl Deck {
    /// A fresh deck in suit-major, rank-minor order.
    pub fn ordered() -> Self {
        let cards = Suit::ALL
            .into_iter()
            .flat_map(|suit| Rank::ALL.into_iter().map(move |rank| Card::new(rank, suit)))
            .collect();
        Self { cards }
    }

    pub fn shuffled() -> Self {
        let mut cards: Vec<Card> = Self::ordered().cards.into();
        cards.shuffle(&mut rand::rng());
        Self {
            cards: cards.into(),
        }
    }

    /// A stacked deck; the first card is drawn first.
    pub fn from_cards(cards: impl IntoIterator<Item = Card>) -> Self {
        Self {
            cards: cards.into_iter().collect(),
        }
    }

    pub fn draw(&mut self) -> Option<Card> {
        self.cards.pop_front()
    }

    pub fn len(&self) -> usize {
        self.cards.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cards.is_empty()
    }
}

#[derive(Clone, Copy, Debug, Default, Deserialize, Eq, Hash, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum HandStatus {
    #[default]
    Betting,
    Playing,
    Stand,
    Bust,
}

/// One blackjack hand: cards, the bet riding on it and its cached score.
#[derive(Clone, Debug, Default, Deserialize, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Hand {
    pub cards: Vec<Card>,
    pub bet: Chips,
    pub status: HandStatus,
    pub score: u32,
    /// Set by a double; the hand stands as soon as its last Ace is resolved.
    #[serde(default)]
    pub doubled: bool,
}

impl Hand {
    pub fn new(bet: Chips) -> Self {
        Self {
            bet,
            ..Self::default()
        }
    }

    pub fn push(&mut self, card: Card) {
        self.cards.push(card);
        self.rescore();
    }

    pub fn rescore(&mut self) {
        self.score = scoring::score(&self.cards);
    }

    pub fn is_playing(&self) -> bool {
        self.status == HandStatus::Playing
    }

    pub fn has_unresolved_ace(&self) -> bool {
        self.cards.iter().any(Card::is_unresolved_ace)
    }

    pub fn is_natural(&self) -> bool {
        scoring::is_natural(&self.cards)
    }
}

/// A seat occupant or spectator.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Player {
    pub id: PlayerId,
    pub username: String,
    pub seat_index: Option<SeatIndex>,
    pub is_host: bool,
    pub is_spectating: bool,
    pub has_placed_bet: bool,
    pub is_connected: bool,
    pub hands: Vec<Hand>,
    pub side_bets: BTreeMap<SideBetKind, Chips>,
    pub keep_main_bet: bool,
    pub keep_side_bets: bool,
    /// Main bet at lock time, before any double or split.
    #[serde(skip)]
    pub(crate) locked_bet: Chips,
    /// First two cards as dealt; side bets are judged on these.
    #[serde(skip)]
    pub(crate) initial_cards: Vec<Card>,
}

impl Player {
    pub fn new(id: PlayerId, username: &str, seat_index: Option<SeatIndex>) -> Self {
        Self {
            id,
            username: username.to_string(),
            seat_index,
            is_host: false,
            is_spectating: seat_index.is_none(),
            has_placed_bet: false,
            is_connected: true,
            hands: if seat_index.is_some() {
                vec![Hand::new(0)]
            } else {
                Vec::new()
            },
            side_bets: BTreeMap::new(),
            keep_main_bet: false,
            keep_side_bets: false,
            locked_bet: 0,
            initial_cards: Vec::new(),
        }
    }

    /// Holds a seat and is not spectating.
    pub fn is_seated(&self) -> bool {
        self.seat_index.is_some() && !self.is_spectating
    }

    pub fn main_bet(&self) -> Chips {
        self.hands.first().map_or(0, |hand| hand.bet)
    }

    pub fn holds_cards(&self) -> bool {
        self.hands.iter().any(|hand| !hand.cards.is_empty())
    }

    pub fn initial_cards(&self) -> &[Card] {
        &self.initial_cards
    }

    /// Re-initializes the player for the next round, honoring the keep-bet toggles.
    pub(crate) fn reset_for_round(&mut self) {
        self.hands = if self.is_seated() {
            let bet = if self.keep_main_bet { self.locked_bet } else { 0 };
            vec![Hand::new(bet)]
        } else {
            Vec::new()
        };
        if !self.keep_side_bets || !self.is_seated() {
            self.side_bets.clear();
        }
        self.has_placed_bet = false;
        self.initial_cards.clear();
    }

    /// Drops every bet and hand; used when the player leaves their seat.
    pub(crate) fn clear_seat(&mut self) {
        self.seat_index = None;
        self.is_spectating = true;
        self.has_placed_bet = false;
        self.hands.clear();
        self.side_bets.clear();
        self.locked_bet = 0;
    }
}

#[derive(Clone, Debug, Default, Deserialize, PartialEq, Serialize)]
pub struct DealerHand {
    pub cards: Vec<Card>,
    pub score: u32,
}

impl DealerHand {
    pub fn push(&mut self, card: Card) {
        self.cards.push(card);
        self.score = scoring::score(&self.cards);
    }

    pub fn is_natural(&self) -> bool {
        scoring::is_natural(&self.cards)
    }

    pub fn is_bust(&self) -> bool {
        self.score > scoring::BLACKJACK
    }
}

#[derive(Clone, Copy, Debug, Default, Deserialize, Eq, Hash, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum RoundStatus {
    #[default]
    Betting,
    Dealing,
    CardDealing,
    Playing,
    Dealer,
    RoundOver,
}

impl fmt::Display for RoundStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let repr = match self {
            Self::Betting => "betting",
            Self::Dealing => "dealing",
            Self::CardDealing => "cardDealing",
            Self::Playing => "playing",
            Self::Dealer => "dealer",
            Self::RoundOver => "roundOver",
        };
        write!(f, "{repr}")
    }
}
