//! Round settlement: main hands against the dealer, then side bets.

use serde::{Deserialize, Serialize};
use std::{collections::BTreeMap, fmt};

use super::{
    entities::{Chips, DealerHand, Hand, HandStatus, Player, PlayerId},
    scoring::BLACKJACK,
    side_bets::{Odds, SideBetContext, SideBetEvaluator, SideBetKind},
};

/// A natural pays 3:2.
pub const NATURAL_ODDS: Odds = Odds::new(3, 2);

#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub enum HandOutcome {
    Bust,
    #[serde(rename = "Blackjack!")]
    Blackjack,
    Win,
    Lose,
    Push,
}

impl fmt::Display for HandOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let repr = match self {
            Self::Bust => "Bust",
            Self::Blackjack => "Blackjack!",
            Self::Win => "Win",
            Self::Lose => "Lose",
            Self::Push => "Push",
        };
        write!(f, "{repr}")
    }
}

#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HandResult {
    pub hand_index: usize,
    pub result: HandOutcome,
    pub winnings: Chips,
}

#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SideBetResult {
    pub bet_name: SideBetKind,
    pub result: String,
    pub winnings: Chips,
}

#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerRoundResult {
    pub total_winnings: Chips,
    pub main_hand_results: Vec<HandResult>,
    pub side_bet_results: Vec<SideBetResult>,
}

impl PlayerRoundResult {
    fn from_parts(main_hand_results: Vec<HandResult>, side_bet_results: Vec<SideBetResult>) -> Self {
        let total_winnings = main_hand_results
            .iter()
            .map(|r| r.winnings)
            .chain(side_bet_results.iter().map(|r| r.winnings))
            .fold(0, Chips::saturating_add);
        Self {
            total_winnings,
            main_hand_results,
            side_bet_results,
        }
    }
}

/// Outcome of one round, computed once and broadcast with the snapshot.
#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RoundResult {
    pub round_counter: u64,
    /// The round was voided and every stake returned.
    pub aborted: bool,
    pub players: BTreeMap<PlayerId, PlayerRoundResult>,
}

/// Settles one hand against the dealer.
///
/// # Arguments
///
/// * `hand_index` - Position of the hand within the seat
/// * `hand` - The finished hand
/// * `single_hand` - Whether the seat played only this hand; naturals require it
/// * `dealer` - The dealer's final hand
pub fn settle_hand(
    hand_index: usize,
    hand: &Hand,
    single_hand: bool,
    dealer: &DealerHand,
) -> HandResult {
    let bet = hand.bet;
    let (result, winnings) = if hand.status == HandStatus::Bust || hand.score > BLACKJACK {
        (HandOutcome::Bust, -bet)
    } else if single_hand && hand.is_natural() && !dealer.is_natural() {
        (HandOutcome::Blackjack, NATURAL_ODDS.winnings(bet))
    } else if dealer.is_bust() || hand.score > dealer.score {
        (HandOutcome::Win, bet)
    } else if hand.score < dealer.score {
        (HandOutcome::Lose, -bet)
    } else {
        (HandOutcome::Push, 0)
    };
    HandResult {
        hand_index,
        result,
        winnings,
    }
}

fn settle_side_bets(player: &Player, dealer: &DealerHand) -> Vec<SideBetResult> {
    let ctx = SideBetContext {
        player_cards: player.initial_cards(),
        dealer_cards: &dealer.cards,
    };
    player
        .side_bets
        .iter()
        .filter(|(_, amount)| **amount > 0)
        .map(|(kind, amount)| match kind.evaluator().evaluate(&ctx) {
            Some(win) => SideBetResult {
                bet_name: *kind,
                result: format!("{}! ({})", win.label, win.odds),
                winnings: win.odds.winnings(*amount),
            },
            None => SideBetResult {
                bet_name: *kind,
                result: format!("{kind}: Lose"),
                winnings: -amount,
            },
        })
        .collect()
}

pub fn settle_player(player: &Player, dealer: &DealerHand) -> PlayerRoundResult {
    let single_hand = player.hands.len() == 1;
    let hands = player
        .hands
        .iter()
        .enumerate()
        .filter(|(_, hand)| !hand.cards.is_empty())
        .map(|(idx, hand)| settle_hand(idx, hand, single_hand, dealer))
        .collect();
    PlayerRoundResult::from_parts(hands, settle_side_bets(player, dealer))
}

fn was_dealt(player: &Player) -> bool {
    player.is_seated() && player.holds_cards()
}

/// Settles every player who was dealt into the round.
pub fn settle_round(
    players: &BTreeMap<PlayerId, Player>,
    dealer: &DealerHand,
    round_counter: u64,
) -> RoundResult {
    let players = players
        .values()
        .filter(|p| was_dealt(p))
        .map(|p| (p.id, settle_player(p, dealer)))
        .collect();
    RoundResult {
        round_counter,
        aborted: false,
        players,
    }
}

/// Voids the round: every dealt hand pushes and side bets are returned.
pub fn void_round(players: &BTreeMap<PlayerId, Player>, round_counter: u64) -> RoundResult {
    let players = players
        .values()
        .filter(|p| was_dealt(p))
        .map(|p| {
            let hands = p
                .hands
                .iter()
                .enumerate()
                .filter(|(_, hand)| !hand.cards.is_empty())
                .map(|(hand_index, _)| HandResult {
                    hand_index,
                    result: HandOutcome::Push,
                    winnings: 0,
                })
                .collect();
            let side_bets = p
                .side_bets
                .iter()
                .filter(|(_, amount)| **amount > 0)
                .map(|(kind, _)| SideBetResult {
                    bet_name: *kind,
                    result: format!("{kind}: Refunded"),
                    winnings: 0,
                })
                .collect();
            (p.id, PlayerRoundResult::from_parts(hands, side_bets))
        })
        .collect();
    RoundResult {
        round_counter,
        aborted: true,
        players,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::entities::{Card, Rank, Suit};

    fn hand(ranks: &[Rank], bet: Chips, status: HandStatus) -> Hand {
        let mut hand = Hand::new(bet);
        for rank in ranks {
            hand.push(Card::new(*rank, Suit::Spades));
        }
        hand.status = status;
        hand
    }

    fn dealer(ranks: &[Rank]) -> DealerHand {
        let mut dealer = DealerHand::default();
        for rank in ranks {
            dealer.push(Card::new(*rank, Suit::Clubs));
        }
        dealer
    }

    // === Main Hand Tests ===

    #[test]
    fn test_bust_loses_even_when_dealer_busts() {
        let h = hand(&[Rank::King, Rank::Six, Rank::Nine], 100, HandStatus::Bust);
        let d = dealer(&[Rank::King, Rank::Six, Rank::Queen]);
        let result = settle_hand(0, &h, true, &d);
        assert_eq!(result.result, HandOutcome::Bust);
        assert_eq!(result.winnings, -100);
    }

    #[test]
    fn test_natural_pays_three_to_two() {
        let h = hand(&[Rank::Ace, Rank::King], 100, HandStatus::Stand);
        let d = dealer(&[Rank::Nine, Rank::Eight]);
        let result = settle_hand(0, &h, true, &d);
        assert_eq!(result.result, HandOutcome::Blackjack);
        assert_eq!(result.winnings, 150);
    }

    #[test]
    fn test_natural_rounds_down() {
        let h = hand(&[Rank::Ace, Rank::King], 15, HandStatus::Stand);
        let d = dealer(&[Rank::Nine, Rank::Eight]);
        assert_eq!(settle_hand(0, &h, true, &d).winnings, 22);
    }

    #[test]
    fn test_natural_against_dealer_natural_pushes() {
        let h = hand(&[Rank::Ace, Rank::King], 100, HandStatus::Stand);
        let d = dealer(&[Rank::Ace, Rank::Queen]);
        let result = settle_hand(0, &h, true, &d);
        assert_eq!(result.result, HandOutcome::Push);
        assert_eq!(result.winnings, 0);
    }

    #[test]
    fn test_split_twenty_one_is_plain_win() {
        let h = hand(&[Rank::Ace, Rank::King], 100, HandStatus::Stand);
        let d = dealer(&[Rank::Nine, Rank::Eight]);
        let result = settle_hand(1, &h, false, &d);
        assert_eq!(result.result, HandOutcome::Win);
        assert_eq!(result.winnings, 100);
    }

    #[test]
    fn test_win_lose_push_against_dealer() {
        let d = dealer(&[Rank::King, Rank::Eight]);
        let higher = hand(&[Rank::King, Rank::Nine], 50, HandStatus::Stand);
        let lower = hand(&[Rank::King, Rank::Seven], 50, HandStatus::Stand);
        let equal = hand(&[Rank::Queen, Rank::Eight], 50, HandStatus::Stand);

        assert_eq!(settle_hand(0, &higher, true, &d).winnings, 50);
        assert_eq!(settle_hand(0, &lower, true, &d).winnings, -50);
        assert_eq!(settle_hand(0, &equal, true, &d).result, HandOutcome::Push);
    }

    #[test]
    fn test_dealer_bust_pays_standing_hands() {
        let d = dealer(&[Rank::King, Rank::Six, Rank::Six]);
        let h = hand(&[Rank::Two, Rank::Three], 40, HandStatus::Stand);
        assert_eq!(settle_hand(0, &h, true, &d).result, HandOutcome::Win);
    }

    // === Player Tests ===

    #[test]
    fn test_player_totals_include_side_bets() {
        let mut player = Player::new(7, "p", Some(0));
        player.hands = vec![hand(&[Rank::Eight, Rank::Eight], 20, HandStatus::Stand)];
        player.initial_cards = player.hands[0].cards.clone();
        player.side_bets.insert(SideBetKind::PerfectPairs, 5);
        player.side_bets.insert(SideBetKind::RoyalMatch, 10);

        // dealer 19 beats 16
        let d = dealer(&[Rank::King, Rank::Nine]);
        let result = settle_player(&player, &d);

        assert_eq!(result.main_hand_results[0].winnings, -20);
        let pairs = &result.side_bet_results[0];
        assert_eq!(pairs.bet_name, SideBetKind::PerfectPairs);
        assert_eq!(pairs.result, "Perfect Pair! (25:1)");
        assert_eq!(pairs.winnings, 125);
        // suited match pays 5:2
        assert_eq!(result.side_bet_results[1].winnings, 25);
        assert_eq!(result.total_winnings, -20 + 125 + 25);
    }

    #[test]
    fn test_losing_side_bet_label() {
        let mut player = Player::new(7, "p", Some(0));
        player.hands = vec![hand(&[Rank::Eight, Rank::Nine], 20, HandStatus::Stand)];
        player.initial_cards = player.hands[0].cards.clone();
        player.side_bets.insert(SideBetKind::LuckyLadies, 10);

        let result = settle_player(&player, &dealer(&[Rank::King, Rank::Seven]));
        assert_eq!(result.side_bet_results[0].result, "Lucky Ladies: Lose");
        assert_eq!(result.side_bet_results[0].winnings, -10);
    }

    // === Round Tests ===

    #[test]
    fn test_round_skips_undealt_players() {
        let mut players = BTreeMap::new();
        let mut dealt = Player::new(1, "dealt", Some(0));
        dealt.hands = vec![hand(&[Rank::King, Rank::Nine], 10, HandStatus::Stand)];
        players.insert(1, dealt);
        players.insert(2, Player::new(2, "late", Some(1)));
        players.insert(3, Player::new(3, "watcher", None));

        let result = settle_round(&players, &dealer(&[Rank::King, Rank::Seven]), 4);
        assert_eq!(result.round_counter, 4);
        assert_eq!(result.players.len(), 1);
        assert_eq!(result.players[&1].total_winnings, 10);
    }

    #[test]
    fn test_void_round_refunds_everything() {
        let mut players = BTreeMap::new();
        let mut dealt = Player::new(1, "dealt", Some(0));
        dealt.hands = vec![hand(&[Rank::King, Rank::Nine], 10, HandStatus::Playing)];
        dealt.side_bets.insert(SideBetKind::BusterBlackjack, 5);
        players.insert(1, dealt);

        let result = void_round(&players, 2);
        assert!(result.aborted);
        let player = &result.players[&1];
        assert_eq!(player.total_winnings, 0);
        assert_eq!(player.main_hand_results[0].result, HandOutcome::Push);
        assert_eq!(player.side_bet_results[0].winnings, 0);
    }

    #[test]
    fn test_round_result_wire_format() {
        let h = hand(&[Rank::Ace, Rank::King], 10, HandStatus::Stand);
        let result = settle_hand(0, &h, true, &dealer(&[Rank::Nine, Rank::Eight]));
        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["result"], "Blackjack!");
        assert_eq!(json["handIndex"], 0);
    }
}
