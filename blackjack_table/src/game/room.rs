//! The authoritative room aggregate and its round state machine.
//!
//! A round moves `betting -> dealing -> cardDealing -> playing -> dealer ->
//! roundOver -> betting`. Every mutation goes through a method here; the
//! owning actor decides when timed transitions fire.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, VecDeque};
use uuid::Uuid;

use super::{
    actions::{BetTarget, PlayerAction},
    entities::{
        AceValue, Card, Chips, DealerHand, Deck, Hand, HandStatus, Player, PlayerId, RoundStatus,
        SeatIndex,
    },
    errors::{GameError, GameResult},
    scoring::{self, BLACKJACK, DEALER_STANDS_ON},
    settlement::{self, RoundResult},
    turns::{self, TurnCursor},
};

/// Rules a room enforces.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct TableRules {
    pub num_seats: usize,
    pub min_bet: Chips,
    /// Cap on the main bet, and separately on each side bet
    pub max_bet: Chips,
    pub max_hands_per_seat: usize,
}

impl Default for TableRules {
    fn default() -> Self {
        Self {
            num_seats: 5,
            min_bet: 10,
            max_bet: 10_000,
            max_hands_per_seat: 3,
        }
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum JoinOutcome {
    Seated(SeatIndex),
    Spectating,
    Rejoined,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum DealerProgress {
    Drew,
    Finished,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
enum DealTarget {
    Dealer,
    Player(PlayerId),
}

/// Full room state as broadcast to subscribers.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RoomSnapshot {
    pub room_code: String,
    pub status: RoundStatus,
    pub host_id: Option<PlayerId>,
    pub players: BTreeMap<PlayerId, Player>,
    pub dealer: DealerView,
    pub active_player_id: Option<PlayerId>,
    pub active_hand_index: usize,
    pub round_counter: u64,
    pub deck_remaining: usize,
    pub min_bet: Chips,
    pub max_bet: Chips,
    pub num_seats: usize,
    pub round_result: Option<RoundResult>,
}

/// The dealer's hand as players see it.
///
/// Only the up-card is shown until the dealer plays; `score` counts visible
/// cards only.
#[derive(Clone, Debug, Default, Deserialize, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DealerView {
    pub cards: Vec<Card>,
    pub hidden_cards: usize,
    pub score: u32,
}

impl DealerView {
    pub fn new(dealer: &DealerHand, status: RoundStatus) -> Self {
        let revealed = matches!(status, RoundStatus::Dealer | RoundStatus::RoundOver);
        if revealed {
            return Self {
                cards: dealer.cards.clone(),
                hidden_cards: 0,
                score: dealer.score,
            };
        }
        let cards: Vec<Card> = dealer.cards.iter().take(1).cloned().collect();
        Self {
            hidden_cards: dealer.cards.len() - cards.len(),
            score: scoring::score(&cards),
            cards,
        }
    }
}

/// The parts of room state whose change warrants an immediate broadcast.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub struct Fingerprint {
    pub status: RoundStatus,
    pub active_player_id: Option<PlayerId>,
    pub active_hand_index: usize,
    pub player_count: usize,
    pub round_counter: u64,
}

#[derive(Debug)]
pub struct Room {
    code: String,
    rules: TableRules,
    host_id: Option<PlayerId>,
    players: BTreeMap<PlayerId, Player>,
    dealer: DealerHand,
    status: RoundStatus,
    active: Option<TurnCursor>,
    round_counter: u64,
    deck: Deck,
    deal_queue: VecDeque<DealTarget>,
    round_result: Option<RoundResult>,
    settled_round: Option<u64>,
}

impl Room {
    /// Creates an empty room in the betting phase.
    ///
    /// # Arguments
    ///
    /// * `code` - Room code
    /// * `rules` - Table rules
    /// * `host_id` - Creator, if known; otherwise the first seated joiner hosts
    pub fn new(code: impl Into<String>, rules: TableRules, host_id: Option<PlayerId>) -> Self {
        Self {
            code: code.into(),
            rules,
            host_id,
            players: BTreeMap::new(),
            dealer: DealerHand::default(),
            status: RoundStatus::Betting,
            active: None,
            round_counter: 1,
            deck: Deck::default(),
            deal_queue: VecDeque::new(),
            round_result: None,
            settled_round: None,
        }
    }

    // === Accessors ===

    pub fn code(&self) -> &str {
        &self.code
    }

    pub fn rules(&self) -> TableRules {
        self.rules
    }

    pub fn status(&self) -> RoundStatus {
        self.status
    }

    pub fn host_id(&self) -> Option<PlayerId> {
        self.host_id
    }

    pub fn players(&self) -> &BTreeMap<PlayerId, Player> {
        &self.players
    }

    pub fn player(&self, player_id: PlayerId) -> Option<&Player> {
        self.players.get(&player_id)
    }

    pub fn dealer(&self) -> &DealerHand {
        &self.dealer
    }

    pub fn round_counter(&self) -> u64 {
        self.round_counter
    }

    pub fn active(&self) -> Option<TurnCursor> {
        self.active
    }

    pub fn active_player_id(&self) -> Option<PlayerId> {
        self.active.map(|c| c.player_id)
    }

    pub fn active_hand_index(&self) -> usize {
        self.active.map_or(0, |c| c.hand_index)
    }

    pub fn round_result(&self) -> Option<&RoundResult> {
        self.round_result.as_ref()
    }

    pub fn deck_remaining(&self) -> usize {
        self.deck.len()
    }

    pub fn is_empty(&self) -> bool {
        self.players.is_empty()
    }

    pub fn fingerprint(&self) -> Fingerprint {
        Fingerprint {
            status: self.status,
            active_player_id: self.active_player_id(),
            active_hand_index: self.active_hand_index(),
            player_count: self.players.len(),
            round_counter: self.round_counter,
        }
    }

    pub fn snapshot(&self) -> RoomSnapshot {
        RoomSnapshot {
            room_code: self.code.clone(),
            status: self.status,
            host_id: self.host_id,
            players: self.players.clone(),
            dealer: DealerView::new(&self.dealer, self.status),
            active_player_id: self.active_player_id(),
            active_hand_index: self.active_hand_index(),
            round_counter: self.round_counter,
            deck_remaining: self.deck.len(),
            min_bet: self.rules.min_bet,
            max_bet: self.rules.max_bet,
            num_seats: self.rules.num_seats,
            round_result: self.round_result.clone(),
        }
    }

    // === Membership ===

    fn free_seat(&self) -> Option<SeatIndex> {
        (0..self.rules.num_seats)
            .find(|seat| !self.players.values().any(|p| p.seat_index == Some(*seat)))
    }

    fn sync_host_flags(&mut self) {
        for player in self.players.values_mut() {
            player.is_host = Some(player.id) == self.host_id;
        }
    }

    /// Adds a player, or reconnects one who is still in the room.
    ///
    /// New players take the lowest free seat; with none free they spectate.
    pub fn join(&mut self, player_id: PlayerId, username: &str) -> JoinOutcome {
        if let Some(player) = self.players.get_mut(&player_id) {
            player.username = username.to_string();
            player.is_connected = true;
            return JoinOutcome::Rejoined;
        }

        let seat = self.free_seat();
        self.players
            .insert(player_id, Player::new(player_id, username, seat));
        if self.host_id.is_none() && seat.is_some() {
            self.host_id = Some(player_id);
        }
        self.sync_host_flags();

        log::info!(
            "Room {}: player {} joined ({})",
            self.code,
            player_id,
            seat.map_or("spectating".to_string(), |s| format!("seat {s}"))
        );
        match seat {
            Some(seat) => JoinOutcome::Seated(seat),
            None => JoinOutcome::Spectating,
        }
    }

    pub fn set_connected(&mut self, player_id: PlayerId, connected: bool) -> GameResult<()> {
        self.player_mut(player_id)?.is_connected = connected;
        Ok(())
    }

    /// Removes a player for good.
    ///
    /// Hands the host role to the lowest seated player, advances the turn if
    /// it was theirs, and abandons the round when no participant remains.
    pub fn remove_player(&mut self, player_id: PlayerId) -> GameResult<()> {
        self.players
            .remove(&player_id)
            .ok_or(GameError::PlayerNotFound)?;
        log::info!("Room {}: player {} removed", self.code, player_id);

        if self.host_id == Some(player_id) {
            self.host_id = self
                .players
                .values()
                .filter(|p| p.is_seated())
                .min_by_key(|p| p.seat_index)
                .map(|p| p.id);
            self.sync_host_flags();
        }

        match self.status {
            RoundStatus::Betting => {
                self.check_auto_start();
            }
            RoundStatus::RoundOver => {}
            RoundStatus::Dealing
            | RoundStatus::CardDealing
            | RoundStatus::Playing
            | RoundStatus::Dealer => {
                if !self.players.values().any(Self::is_participant) {
                    log::info!(
                        "Room {}: no players left in round {}, back to betting",
                        self.code,
                        self.round_counter
                    );
                    self.begin_next_round();
                } else if self.status == RoundStatus::Playing
                    && self.active_player_id() == Some(player_id)
                {
                    self.advance_turn()?;
                }
            }
        }
        Ok(())
    }

    fn is_participant(player: &Player) -> bool {
        player.is_seated() && player.has_placed_bet
    }

    // === Dispatch ===

    pub fn apply(&mut self, player_id: PlayerId, action: PlayerAction) -> GameResult<()> {
        match action {
            PlayerAction::PlaceBet { amount, target } => self.place_bet(player_id, amount, target),
            PlayerAction::ClearBets => self.clear_bets(player_id),
            PlayerAction::LockBet => self.lock_bet(player_id),
            PlayerAction::Hit => self.hit(player_id),
            PlayerAction::Stand => self.stand(player_id),
            PlayerAction::Double => self.double(player_id),
            PlayerAction::Split => self.split(player_id),
            PlayerAction::Surrender => self.surrender(player_id),
            PlayerAction::ChooseAce {
                hand_index,
                card_id,
                value,
            } => self.choose_ace(player_id, hand_index, card_id, value),
            PlayerAction::ToggleSpectator => self.toggle_spectator(player_id),
            PlayerAction::ForceStart => self.force_start(player_id),
            PlayerAction::NewRound => self.new_round(player_id),
            PlayerAction::SetKeepBets {
                keep_main_bet,
                keep_side_bets,
            } => self.set_keep_bets(player_id, keep_main_bet, keep_side_bets),
        }
    }

    fn player_mut(&mut self, player_id: PlayerId) -> GameResult<&mut Player> {
        self.players
            .get_mut(&player_id)
            .ok_or(GameError::PlayerNotFound)
    }

    fn require_status(&self, action: &'static str, expected: RoundStatus) -> GameResult<()> {
        if self.status == expected {
            Ok(())
        } else {
            Err(GameError::WrongPhase {
                action,
                status: self.status,
            })
        }
    }

    fn require_host(&self, player_id: PlayerId, action: &'static str) -> GameResult<()> {
        if !self.players.contains_key(&player_id) {
            return Err(GameError::PlayerNotFound);
        }
        if self.host_id != Some(player_id) {
            return Err(GameError::NotHost(action));
        }
        Ok(())
    }

    // === Betting ===

    pub fn place_bet(
        &mut self,
        player_id: PlayerId,
        amount: Chips,
        target: BetTarget,
    ) -> GameResult<()> {
        self.require_status("place a bet", RoundStatus::Betting)?;
        if amount <= 0 {
            return Err(GameError::InvalidAction(
                "bet amount must be positive".to_string(),
            ));
        }
        let max = self.rules.max_bet;
        let player = self.player_mut(player_id)?;
        if !player.is_seated() {
            return Err(GameError::Spectating("place bets"));
        }
        if player.has_placed_bet {
            return Err(GameError::BetLocked);
        }
        let current = match target {
            BetTarget::Main => player.main_bet(),
            BetTarget::Side(kind) => player.side_bets.get(&kind).copied().unwrap_or(0),
        };
        let total = current
            .checked_add(amount)
            .filter(|total| *total <= max)
            .ok_or(GameError::BetAboveMaximum { max })?;
        match target {
            BetTarget::Main => match player.hands.first_mut() {
                Some(hand) => hand.bet = total,
                None => player.hands.push(Hand::new(total)),
            },
            BetTarget::Side(kind) => {
                player.side_bets.insert(kind, total);
            }
        }
        Ok(())
    }

    pub fn clear_bets(&mut self, player_id: PlayerId) -> GameResult<()> {
        self.require_status("clear bets", RoundStatus::Betting)?;
        let player = self.player_mut(player_id)?;
        if player.has_placed_bet {
            return Err(GameError::BetLocked);
        }
        for hand in &mut player.hands {
            hand.bet = 0;
        }
        player.side_bets.clear();
        Ok(())
    }

    /// Locks the player's bet. When every seated player has locked, dealing starts.
    pub fn lock_bet(&mut self, player_id: PlayerId) -> GameResult<()> {
        self.require_status("lock a bet", RoundStatus::Betting)?;
        let min_bet = self.rules.min_bet;
        let player = self.player_mut(player_id)?;
        if !player.is_seated() {
            return Err(GameError::Spectating("lock bets"));
        }
        if player.has_placed_bet {
            return Err(GameError::BetLocked);
        }
        if player.main_bet() < min_bet {
            return Err(GameError::BetBelowMinimum { min: min_bet });
        }
        player.has_placed_bet = true;
        player.locked_bet = player.main_bet();
        self.check_auto_start();
        Ok(())
    }

    /// Moves to dealing once every seated player has locked a bet.
    fn check_auto_start(&mut self) -> bool {
        if self.status != RoundStatus::Betting {
            return false;
        }
        let mut seated = self.players.values().filter(|p| p.is_seated()).peekable();
        if seated.peek().is_none() || !seated.all(|p| p.has_placed_bet) {
            return false;
        }
        log::info!(
            "Room {}: all bets locked, starting round {}",
            self.code,
            self.round_counter
        );
        self.status = RoundStatus::Dealing;
        true
    }

    pub fn force_start(&mut self, player_id: PlayerId) -> GameResult<()> {
        self.require_host(player_id, "force the start")?;
        self.require_status("force the start", RoundStatus::Betting)?;
        if !self.players.values().any(Self::is_participant) {
            return Err(GameError::InvalidAction(
                "nobody has locked a bet yet".to_string(),
            ));
        }
        log::info!(
            "Room {}: host {} forced round {} to start",
            self.code,
            player_id,
            self.round_counter
        );
        self.status = RoundStatus::Dealing;
        Ok(())
    }

    pub fn set_keep_bets(
        &mut self,
        player_id: PlayerId,
        keep_main_bet: bool,
        keep_side_bets: bool,
    ) -> GameResult<()> {
        let player = self.player_mut(player_id)?;
        player.keep_main_bet = keep_main_bet;
        player.keep_side_bets = keep_side_bets;
        Ok(())
    }

    /// Swaps between a seat and the rail. Only allowed outside a live hand.
    pub fn toggle_spectator(&mut self, player_id: PlayerId) -> GameResult<()> {
        let status = self.status;
        let free_seat = self.free_seat();
        let player = self.player_mut(player_id)?;

        let dealing_in = player.has_placed_bet
            && matches!(status, RoundStatus::Dealing | RoundStatus::CardDealing);
        if player.holds_cards() || dealing_in {
            return Err(GameError::InvalidAction(
                "can't change seats during a hand".to_string(),
            ));
        }

        if player.is_spectating {
            let seat = free_seat
                .ok_or_else(|| GameError::InvalidAction("no free seat".to_string()))?;
            player.seat_index = Some(seat);
            player.is_spectating = false;
            player.hands = vec![Hand::new(0)];
            if self.host_id.is_none() {
                self.host_id = Some(player_id);
                self.sync_host_flags();
            }
        } else {
            player.clear_seat();
        }
        self.check_auto_start();
        Ok(())
    }

    // === Dealing ===

    /// Starts the visible deal with a fresh deck.
    ///
    /// Queues two rounds of cards, dealer first, then seats in ascending order.
    pub fn start_card_dealing(&mut self, deck: Deck) -> GameResult<()> {
        self.require_status("deal", RoundStatus::Dealing)?;

        let mut order: Vec<(SeatIndex, PlayerId)> = self
            .players
            .values()
            .filter(|p| Self::is_participant(p))
            .filter_map(|p| p.seat_index.map(|seat| (seat, p.id)))
            .collect();
        order.sort_unstable();
        if order.is_empty() {
            self.begin_next_round();
            return Ok(());
        }

        for (_, id) in &order {
            if let Some(player) = self.players.get_mut(id) {
                let bet = player.main_bet();
                player.hands = vec![Hand::new(bet)];
            }
        }

        self.deck = deck;
        self.dealer = DealerHand::default();
        self.deal_queue.clear();
        for _ in 0..2 {
            self.deal_queue.push_back(DealTarget::Dealer);
            self.deal_queue
                .extend(order.iter().map(|(_, id)| DealTarget::Player(*id)));
        }
        self.status = RoundStatus::CardDealing;
        log::debug!(
            "Room {}: dealing to {} seats",
            self.code,
            order.len()
        );
        Ok(())
    }

    fn draw(&mut self) -> GameResult<Card> {
        self.deck.draw().ok_or(GameError::InsufficientDeck)
    }

    /// Deals one card from the queue.
    ///
    /// # Returns
    ///
    /// * `bool` - `true` while more cards remain to be dealt
    pub fn deal_next_card(&mut self) -> GameResult<bool> {
        self.require_status("deal", RoundStatus::CardDealing)?;

        while let Some(target) = self.deal_queue.pop_front() {
            match target {
                DealTarget::Dealer => {
                    let card = self.draw()?;
                    self.dealer.push(card);
                    break;
                }
                DealTarget::Player(id) => {
                    let dealt_in = self
                        .players
                        .get(&id)
                        .is_some_and(|p| p.is_seated() && !p.hands.is_empty());
                    if !dealt_in {
                        continue;
                    }
                    let card = self.draw()?;
                    if let Some(hand) = self.players.get_mut(&id).and_then(|p| p.hands.first_mut())
                    {
                        hand.push(card);
                    }
                    break;
                }
            }
        }

        if self.deal_queue.is_empty() {
            self.finish_dealing();
            return Ok(false);
        }
        Ok(true)
    }

    fn finish_dealing(&mut self) {
        for player in self.players.values_mut() {
            if !Self::is_participant(player) {
                continue;
            }
            let Some(hand) = player.hands.first_mut() else {
                continue;
            };
            if hand.cards.is_empty() {
                continue;
            }
            player.initial_cards = hand.cards.clone();
            if hand.is_natural() {
                scoring::resolve_flexible_aces(&mut hand.cards);
                hand.rescore();
                hand.status = HandStatus::Stand;
            } else {
                scoring::fix_forced_aces(&mut hand.cards);
                hand.rescore();
                hand.status = HandStatus::Playing;
            }
        }

        self.status = RoundStatus::Playing;
        self.active = turns::next_turn(&self.players, None);
        if self.active.is_none() {
            self.enter_dealer();
        }
    }

    // === Playing ===

    fn turn_for(&self, player_id: PlayerId, action: &'static str) -> GameResult<TurnCursor> {
        self.require_status(action, RoundStatus::Playing)?;
        if !self.players.contains_key(&player_id) {
            return Err(GameError::PlayerNotFound);
        }
        match self.active {
            Some(cursor) if cursor.player_id == player_id => Ok(cursor),
            _ => Err(GameError::OutOfTurnAction),
        }
    }

    fn hand_mut(&mut self, cursor: TurnCursor) -> GameResult<&mut Hand> {
        self.players
            .get_mut(&cursor.player_id)
            .and_then(|p| p.hands.get_mut(cursor.hand_index))
            .ok_or_else(|| GameError::InvalidAction("no such hand".to_string()))
    }

    /// Settles a hand's status after it changes: forced Aces, bust demotion,
    /// auto-stand on 21 and the stand that follows a double.
    fn after_card(hand: &mut Hand) {
        scoring::fix_forced_aces(&mut hand.cards);
        hand.rescore();
        if hand.score > BLACKJACK {
            hand.score = scoring::demote_for_bust(&mut hand.cards);
        }
        if hand.score > BLACKJACK {
            hand.status = HandStatus::Bust;
        } else if hand.score == BLACKJACK {
            scoring::resolve_flexible_aces(&mut hand.cards);
            hand.rescore();
            hand.status = HandStatus::Stand;
        } else if hand.doubled && !hand.has_unresolved_ace() {
            hand.status = HandStatus::Stand;
        }
    }

    pub fn hit(&mut self, player_id: PlayerId) -> GameResult<()> {
        let cursor = self.turn_for(player_id, "hit")?;
        if self.hand_mut(cursor)?.has_unresolved_ace() {
            return Err(GameError::AceValuePending);
        }
        let card = self.draw()?;
        let hand = self.hand_mut(cursor)?;
        hand.push(card);
        Self::after_card(hand);
        if !hand.is_playing() {
            self.advance_turn()?;
        }
        Ok(())
    }

    pub fn stand(&mut self, player_id: PlayerId) -> GameResult<()> {
        let cursor = self.turn_for(player_id, "stand")?;
        let hand = self.hand_mut(cursor)?;
        scoring::resolve_flexible_aces(&mut hand.cards);
        hand.rescore();
        hand.status = HandStatus::Stand;
        self.advance_turn()
    }

    /// Doubles the bet on a two-card hand, deals exactly one card and stands.
    pub fn double(&mut self, player_id: PlayerId) -> GameResult<()> {
        let cursor = self.turn_for(player_id, "double")?;
        let hand = self.hand_mut(cursor)?;
        if hand.cards.len() != 2 {
            return Err(GameError::InvalidAction(
                "can only double on two cards".to_string(),
            ));
        }
        if hand.has_unresolved_ace() {
            return Err(GameError::AceValuePending);
        }
        let doubled_bet = hand.bet.checked_mul(2).ok_or_else(|| {
            GameError::InvalidAction("bet is too large to double".to_string())
        })?;
        let card = self.draw()?;
        let hand = self.hand_mut(cursor)?;
        hand.bet = doubled_bet;
        hand.doubled = true;
        hand.push(card);
        Self::after_card(hand);
        if !hand.is_playing() {
            self.advance_turn()?;
        }
        Ok(())
    }

    /// Splits a two-card pair of equal value into two hands with the same bet.
    ///
    /// The first hand gets its second card now; the second waits for its turn.
    /// Split Aces count 11, get one card each and stand.
    pub fn split(&mut self, player_id: PlayerId) -> GameResult<()> {
        let cursor = self.turn_for(player_id, "split")?;
        let max_hands = self.rules.max_hands_per_seat;
        let player = self
            .players
            .get(&player_id)
            .ok_or(GameError::PlayerNotFound)?;
        if player.hands.len() >= max_hands {
            return Err(GameError::InvalidAction(format!(
                "a seat can play at most {max_hands} hands"
            )));
        }
        let hand = player
            .hands
            .get(cursor.hand_index)
            .ok_or_else(|| GameError::InvalidAction("no such hand".to_string()))?;
        let splittable = match hand.cards.as_slice() {
            [a, b] => a.rank.value() == b.rank.value(),
            _ => false,
        };
        if !splittable {
            return Err(GameError::InvalidAction(
                "can only split two cards of equal value".to_string(),
            ));
        }
        let splitting_aces = hand.cards[0].is_ace();
        let needed = if splitting_aces { 2 } else { 1 };
        if self.deck.len() < needed {
            return Err(GameError::InsufficientDeck);
        }
        let mut drawn = Vec::with_capacity(needed);
        for _ in 0..needed {
            drawn.push(self.draw()?);
        }

        let player = self.player_mut(player_id)?;
        let original = player.hands.remove(cursor.hand_index);
        let bet = original.bet;
        let mut new_hands: Vec<Hand> = original
            .cards
            .into_iter()
            .map(|mut card| {
                if splitting_aces {
                    card.chosen_value = Some(AceValue::Eleven);
                }
                let mut hand = Hand::new(bet);
                hand.status = HandStatus::Playing;
                hand.push(card);
                hand
            })
            .collect();

        let mut drawn = drawn.into_iter();
        if splitting_aces {
            for hand in &mut new_hands {
                if let Some(mut card) = drawn.next() {
                    if card.is_ace() {
                        card.chosen_value = Some(AceValue::One);
                    }
                    hand.push(card);
                }
                Self::after_card(hand);
                hand.status = HandStatus::Stand;
            }
        } else if let (Some(first), Some(card)) = (new_hands.first_mut(), drawn.next()) {
            first.push(card);
            Self::after_card(first);
        }

        let first_done = new_hands.first().is_some_and(|h| !h.is_playing());
        for (offset, hand) in new_hands.into_iter().enumerate() {
            player.hands.insert(cursor.hand_index + offset, hand);
        }
        log::debug!(
            "Room {}: player {} split hand {}",
            self.code,
            player_id,
            cursor.hand_index
        );

        if first_done {
            self.advance_turn()?;
        }
        Ok(())
    }

    /// Surrender is not offered; the request is acknowledged and ignored.
    pub fn surrender(&mut self, player_id: PlayerId) -> GameResult<()> {
        if !self.players.contains_key(&player_id) {
            return Err(GameError::PlayerNotFound);
        }
        log::debug!(
            "Room {}: player {} asked to surrender, ignoring",
            self.code,
            player_id
        );
        Ok(())
    }

    /// Fixes the value of one Ace in a playing hand.
    ///
    /// A value that would bust the hand is refused.
    pub fn choose_ace(
        &mut self,
        player_id: PlayerId,
        hand_index: usize,
        card_id: Uuid,
        value: AceValue,
    ) -> GameResult<()> {
        self.require_status("choose an Ace value", RoundStatus::Playing)?;
        let player = self.player_mut(player_id)?;
        let hand = player
            .hands
            .get_mut(hand_index)
            .ok_or_else(|| GameError::InvalidAction("no such hand".to_string()))?;
        if !hand.is_playing() {
            return Err(GameError::InvalidAction(
                "that hand is finished".to_string(),
            ));
        }
        let pos = hand
            .cards
            .iter()
            .position(|c| c.instance_id == card_id)
            .ok_or_else(|| GameError::InvalidAction("no such card".to_string()))?;
        if !hand.cards[pos].is_ace() {
            return Err(GameError::InvalidAction(
                "only Aces take a chosen value".to_string(),
            ));
        }
        if hand.cards[pos].chosen_value.is_some() {
            return Err(GameError::InvalidAction(
                "that Ace already has a value".to_string(),
            ));
        }

        hand.cards[pos].chosen_value = Some(value);
        if scoring::is_bust(&hand.cards) {
            hand.cards[pos].chosen_value = None;
            return Err(GameError::InvalidAction(
                "that value would bust the hand".to_string(),
            ));
        }
        Self::after_card(hand);
        let finished = !hand.is_playing();

        let is_active = self
            .active
            .is_some_and(|c| c.player_id == player_id && c.hand_index == hand_index);
        if finished && is_active {
            self.advance_turn()?;
        }
        Ok(())
    }

    /// Moves the cursor to the next playing hand, dealing the second card to
    /// split hands that still hold one. Enters the dealer phase when none remain.
    fn advance_turn(&mut self) -> GameResult<()> {
        loop {
            let Some(cursor) = turns::next_turn(&self.players, self.active) else {
                self.enter_dealer();
                return Ok(());
            };
            self.active = Some(cursor);

            if self.hand_mut(cursor)?.cards.len() == 1 {
                let card = self.draw()?;
                let hand = self.hand_mut(cursor)?;
                hand.push(card);
                Self::after_card(hand);
                if !hand.is_playing() {
                    continue;
                }
            }
            return Ok(());
        }
    }

    fn enter_dealer(&mut self) {
        self.active = None;
        self.status = RoundStatus::Dealer;
    }

    // === Dealer and settlement ===

    /// Draws one dealer card while the dealer is below 17.
    pub fn dealer_step(&mut self) -> GameResult<DealerProgress> {
        self.require_status("play the dealer", RoundStatus::Dealer)?;
        if self.dealer.score < DEALER_STANDS_ON {
            let card = self.draw()?;
            self.dealer.push(card);
        }
        if self.dealer.score >= DEALER_STANDS_ON {
            self.status = RoundStatus::RoundOver;
            Ok(DealerProgress::Finished)
        } else {
            Ok(DealerProgress::Drew)
        }
    }

    /// Computes the round result. Runs once per round.
    pub fn settle(&mut self) -> GameResult<&RoundResult> {
        self.require_status("settle", RoundStatus::RoundOver)?;
        if self.settled_round == Some(self.round_counter) {
            return Err(GameError::ConcurrentSettlementAttempt(self.round_counter));
        }
        let result = match self.round_result.take() {
            Some(result) => result,
            None => settlement::settle_round(&self.players, &self.dealer, self.round_counter),
        };
        self.settled_round = Some(self.round_counter);
        let result: &RoundResult = self.round_result.insert(result);
        Ok(result)
    }

    /// Voids the round in progress; every stake is returned.
    pub fn abort_round(&mut self) {
        log::error!(
            "Room {}: deck exhausted in round {}, voiding it",
            self.code,
            self.round_counter
        );
        self.round_result = Some(settlement::void_round(&self.players, self.round_counter));
        self.deal_queue.clear();
        self.active = None;
        self.status = RoundStatus::RoundOver;
    }

    pub fn new_round(&mut self, player_id: PlayerId) -> GameResult<()> {
        self.require_host(player_id, "start a new round")?;
        self.reset_for_next_round()
    }

    /// Clears the table for the next round, keeping bets as each player asked.
    pub fn reset_for_next_round(&mut self) -> GameResult<()> {
        self.require_status("start a new round", RoundStatus::RoundOver)?;
        self.begin_next_round();
        Ok(())
    }

    fn begin_next_round(&mut self) {
        for player in self.players.values_mut() {
            player.reset_for_round();
        }
        self.dealer = DealerHand::default();
        self.deck = Deck::default();
        self.deal_queue.clear();
        self.active = None;
        self.round_result = None;
        self.round_counter += 1;
        self.status = RoundStatus::Betting;
        log::debug!("Room {}: round {} open for bets", self.code, self.round_counter);
    }
}
