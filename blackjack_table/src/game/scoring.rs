//! Blackjack hand scoring.
//!
//! Aces without a chosen value are flexible: they count 11 and are demoted
//! to 1, first dealt first, while the total exceeds 21. A chosen value is
//! authoritative and only changes through [`demote_for_bust`].

use super::entities::{AceValue, Card};

pub const BLACKJACK: u32 = 21;

/// The dealer draws below this total and stands on it or above (soft 17 included).
pub const DEALER_STANDS_ON: u32 = 17;

fn fixed_points(card: &Card) -> Option<u32> {
    if card.is_ace() {
        card.chosen_value.map(AceValue::points)
    } else {
        Some(card.rank.value())
    }
}

/// Values the scorer gives each flexible Ace, paired with its position in `cards`.
fn flexible_values(cards: &[Card]) -> Vec<(usize, AceValue)> {
    let mut total: u32 = cards.iter().map(|c| fixed_points(c).unwrap_or(11)).sum();
    cards
        .iter()
        .enumerate()
        .filter(|(_, card)| fixed_points(card).is_none())
        .map(|(idx, _)| {
            if total > BLACKJACK {
                total -= 10;
                (idx, AceValue::One)
            } else {
                (idx, AceValue::Eleven)
            }
        })
        .collect()
}

/// Scores a hand.
///
/// # Arguments
///
/// * `cards` - Cards in deal order
///
/// # Returns
///
/// * `u32` - Hand total, possibly above 21
pub fn score(cards: &[Card]) -> u32 {
    let mut total = 0;
    let mut flexible = 0;
    for card in cards {
        match fixed_points(card) {
            Some(points) => total += points,
            None => {
                total += 11;
                flexible += 1;
            }
        }
    }
    while total > BLACKJACK && flexible > 0 {
        total -= 10;
        flexible -= 1;
    }
    total
}

/// Two cards totalling 21.
pub fn is_natural(cards: &[Card]) -> bool {
    cards.len() == 2 && score(cards) == BLACKJACK
}

pub fn is_bust(cards: &[Card]) -> bool {
    score(cards) > BLACKJACK
}

/// Fixes every flexible Ace at the value the scorer currently gives it.
pub fn resolve_flexible_aces(cards: &mut [Card]) {
    for (idx, value) in flexible_values(cards) {
        cards[idx].chosen_value = Some(value);
    }
}

/// Fixes at 1 every flexible Ace that could not count 11 without busting.
pub fn fix_forced_aces(cards: &mut [Card]) {
    for idx in 0..cards.len() {
        if !cards[idx].is_unresolved_ace() {
            continue;
        }
        cards[idx].chosen_value = Some(AceValue::Eleven);
        cards[idx].chosen_value = if score(cards) > BLACKJACK {
            Some(AceValue::One)
        } else {
            None
        };
    }
}

/// Demotes Aces fixed at 11, most recently dealt first, until the hand stops busting.
///
/// Returns the new score.
pub fn demote_for_bust(cards: &mut [Card]) -> u32 {
    for idx in (0..cards.len()).rev() {
        if score(cards) <= BLACKJACK {
            break;
        }
        if cards[idx].is_ace() && cards[idx].chosen_value == Some(AceValue::Eleven) {
            cards[idx].chosen_value = Some(AceValue::One);
        }
    }
    score(cards)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::entities::{Rank, Suit};

    fn cards(ranks: &[Rank]) -> Vec<Card> {
        ranks.iter().map(|r| Card::new(*r, Suit::Spades)).collect()
    }

    fn chosen(rank: Rank, value: AceValue) -> Card {
        let mut card = Card::new(rank, Suit::Hearts);
        card.chosen_value = Some(value);
        card
    }

    // === Score Tests ===

    #[test]
    fn test_score_soft_seventeen() {
        let hand = cards(&[Rank::Ace, Rank::Six]);
        assert_eq!(score(&hand), 17);
    }

    #[test]
    fn test_score_hard_seventeen_after_demotion() {
        let hand = cards(&[Rank::Ace, Rank::Six, Rank::King]);
        assert_eq!(score(&hand), 17);
    }

    #[test]
    fn test_score_pair_of_aces() {
        assert_eq!(score(&cards(&[Rank::Ace, Rank::Ace])), 12);
        assert_eq!(score(&cards(&[Rank::Ace, Rank::Ace, Rank::Nine])), 21);
    }

    #[test]
    fn test_score_bust() {
        let hand = cards(&[Rank::King, Rank::Queen, Rank::Five]);
        assert_eq!(score(&hand), 25);
        assert!(is_bust(&hand));
    }

    #[test]
    fn test_chosen_value_is_authoritative() {
        let hand = vec![
            chosen(Rank::Ace, AceValue::Eleven),
            Card::new(Rank::Six, Suit::Clubs),
            Card::new(Rank::Ten, Suit::Clubs),
        ];
        assert_eq!(score(&hand), 27);
    }

    #[test]
    fn test_natural() {
        assert!(is_natural(&cards(&[Rank::Ace, Rank::Jack])));
        assert!(!is_natural(&cards(&[Rank::Seven, Rank::Seven, Rank::Seven])));
    }

    // === Ace Resolution Tests ===

    #[test]
    fn test_demote_for_bust_latest_first() {
        let mut hand = vec![
            chosen(Rank::Ace, AceValue::Eleven),
            chosen(Rank::Ace, AceValue::Eleven),
            Card::new(Rank::Nine, Suit::Clubs),
        ];
        // 31 -> demote the second Ace -> 21
        assert_eq!(demote_for_bust(&mut hand), 21);
        assert_eq!(hand[0].chosen_value, Some(AceValue::Eleven));
        assert_eq!(hand[1].chosen_value, Some(AceValue::One));
    }

    #[test]
    fn test_demote_for_bust_leaves_unbusted_hand() {
        let mut hand = vec![
            chosen(Rank::Ace, AceValue::Eleven),
            Card::new(Rank::Five, Suit::Clubs),
        ];
        assert_eq!(demote_for_bust(&mut hand), 16);
        assert_eq!(hand[0].chosen_value, Some(AceValue::Eleven));
    }

    #[test]
    fn test_resolve_flexible_aces() {
        let mut hand = cards(&[Rank::Ace, Rank::Ace, Rank::Nine]);
        resolve_flexible_aces(&mut hand);
        assert_eq!(hand[0].chosen_value, Some(AceValue::One));
        assert_eq!(hand[1].chosen_value, Some(AceValue::Eleven));
        assert_eq!(score(&hand), 21);
    }

    #[test]
    fn test_fix_forced_aces() {
        let mut hand = cards(&[Rank::Ten, Rank::Five, Rank::Ace]);
        fix_forced_aces(&mut hand);
        assert_eq!(hand[2].chosen_value, Some(AceValue::One));
        assert_eq!(score(&hand), 16);
    }

    #[test]
    fn test_fix_forced_aces_keeps_open_choice() {
        let mut hand = cards(&[Rank::Ace, Rank::Ace]);
        fix_forced_aces(&mut hand);
        assert!(hand.iter().all(Card::is_unresolved_ace));

        hand[0].chosen_value = Some(AceValue::Eleven);
        fix_forced_aces(&mut hand);
        assert_eq!(hand[1].chosen_value, Some(AceValue::One));
    }
}
