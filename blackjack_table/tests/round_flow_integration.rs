/// Integration tests for full rounds on a stacked deck
///
/// These tests drive a `Room` through betting, dealing, play, the dealer
/// and settlement, checking the payouts the table promises.
use blackjack_table::game::{
    BetTarget, Card, Chips, Deck, GameError, HandOutcome, PlayerAction, PlayerId, Rank, Room,
    RoundStatus, SideBetKind, Suit, TableRules,
};

fn stacked(cards: &[(Rank, Suit)]) -> Deck {
    Deck::from_cards(cards.iter().map(|(rank, suit)| Card::new(*rank, *suit)))
}

fn room_with_bets(bets: &[(PlayerId, Chips)]) -> Room {
    let mut room = Room::new("FLOW01", TableRules::default(), None);
    for (id, _) in bets {
        room.join(*id, &format!("player{id}"));
    }
    for (id, amount) in bets {
        room.apply(
            *id,
            PlayerAction::PlaceBet {
                amount: *amount,
                target: BetTarget::Main,
            },
        )
        .unwrap();
        room.apply(*id, PlayerAction::LockBet).unwrap();
    }
    assert_eq!(room.status(), RoundStatus::Dealing);
    room
}

fn deal(room: &mut Room, deck: Deck) {
    room.start_card_dealing(deck).unwrap();
    while room.deal_next_card().unwrap() {}
}

fn run_dealer(room: &mut Room) {
    while room.status() == RoundStatus::Dealer {
        room.dealer_step().unwrap();
    }
}

#[test]
fn test_split_nines_against_dealer_eighteen() {
    let mut room = room_with_bets(&[(1, 100)]);
    deal(
        &mut room,
        stacked(&[
            (Rank::Seven, Suit::Clubs),
            (Rank::Nine, Suit::Spades),
            (Rank::Ace, Suit::Diamonds),
            (Rank::Nine, Suit::Hearts),
            (Rank::King, Suit::Spades),
            (Rank::Six, Suit::Clubs),
        ]),
    );
    assert_eq!(room.status(), RoundStatus::Playing);
    assert_eq!(room.active_player_id(), Some(1));

    room.apply(1, PlayerAction::Split).unwrap();
    let player = room.player(1).unwrap();
    assert_eq!(player.hands.len(), 2);
    assert_eq!(player.hands[0].score, 19);
    assert_eq!(player.hands[1].cards.len(), 1);

    room.apply(1, PlayerAction::Stand).unwrap();
    assert_eq!(room.active_hand_index(), 1);
    assert_eq!(room.player(1).unwrap().hands[1].score, 15);

    room.apply(1, PlayerAction::Stand).unwrap();
    assert_eq!(room.status(), RoundStatus::Dealer);
    run_dealer(&mut room);
    assert_eq!(room.dealer().score, 18);

    let result = room.settle().unwrap();
    let outcome = &result.players[&1];
    assert_eq!(outcome.main_hand_results[0].result, HandOutcome::Win);
    assert_eq!(outcome.main_hand_results[0].winnings, 100);
    assert_eq!(outcome.main_hand_results[1].result, HandOutcome::Lose);
    assert_eq!(outcome.main_hand_results[1].winnings, -100);
    assert_eq!(outcome.total_winnings, 0);
}

#[test]
fn test_natural_pays_three_to_two() {
    let mut room = room_with_bets(&[(1, 100)]);
    deal(
        &mut room,
        stacked(&[
            (Rank::Nine, Suit::Clubs),
            (Rank::Ace, Suit::Spades),
            (Rank::Eight, Suit::Diamonds),
            (Rank::King, Suit::Hearts),
        ]),
    );

    // the natural stands itself, so play goes straight to the dealer
    assert_eq!(room.status(), RoundStatus::Dealer);
    run_dealer(&mut room);

    let result = room.settle().unwrap();
    let outcome = &result.players[&1];
    assert_eq!(outcome.main_hand_results[0].result, HandOutcome::Blackjack);
    assert_eq!(outcome.total_winnings, 150);
}

#[test]
fn test_dealer_bust_pays_every_standing_hand() {
    let mut room = room_with_bets(&[(1, 50), (2, 20)]);
    deal(
        &mut room,
        stacked(&[
            (Rank::Six, Suit::Clubs),
            (Rank::Ten, Suit::Spades),
            (Rank::Ten, Suit::Hearts),
            (Rank::Ten, Suit::Diamonds),
            (Rank::Eight, Suit::Spades),
            (Rank::Five, Suit::Hearts),
            (Rank::King, Suit::Clubs),
        ]),
    );

    room.apply(1, PlayerAction::Stand).unwrap();
    assert_eq!(
        room.apply(1, PlayerAction::Stand),
        Err(GameError::OutOfTurnAction)
    );
    room.apply(2, PlayerAction::Stand).unwrap();

    assert_eq!(room.status(), RoundStatus::Dealer);
    assert_eq!(
        room.dealer_step().unwrap(),
        blackjack_table::game::DealerProgress::Finished
    );
    assert!(room.dealer().is_bust());

    let result = room.settle().unwrap();
    assert_eq!(result.players[&1].total_winnings, 50);
    assert_eq!(result.players[&2].total_winnings, 20);
}

#[test]
fn test_bust_loses_even_when_dealer_busts() {
    let mut room = room_with_bets(&[(1, 40)]);
    deal(
        &mut room,
        stacked(&[
            (Rank::Six, Suit::Clubs),
            (Rank::Ten, Suit::Spades),
            (Rank::Ten, Suit::Hearts),
            (Rank::Six, Suit::Diamonds),
            (Rank::Queen, Suit::Spades),
            (Rank::Nine, Suit::Clubs),
        ]),
    );

    room.apply(1, PlayerAction::Hit).unwrap();
    assert_eq!(room.status(), RoundStatus::Dealer);
    run_dealer(&mut room);
    assert!(room.dealer().is_bust());

    let result = room.settle().unwrap();
    assert_eq!(result.players[&1].main_hand_results[0].result, HandOutcome::Bust);
    assert_eq!(result.players[&1].total_winnings, -40);
}

#[test]
fn test_side_bet_settles_alongside_main_hand() {
    let mut room = Room::new("FLOW02", TableRules::default(), None);
    room.join(1, "alice");
    room.apply(
        1,
        PlayerAction::PlaceBet {
            amount: 10,
            target: BetTarget::Main,
        },
    )
    .unwrap();
    room.apply(
        1,
        PlayerAction::PlaceBet {
            amount: 5,
            target: BetTarget::Side(SideBetKind::PerfectPairs),
        },
    )
    .unwrap();
    room.apply(1, PlayerAction::LockBet).unwrap();

    deal(
        &mut room,
        stacked(&[
            (Rank::Ten, Suit::Clubs),
            (Rank::Eight, Suit::Spades),
            (Rank::Seven, Suit::Hearts),
            (Rank::Eight, Suit::Spades),
        ]),
    );
    room.apply(1, PlayerAction::Stand).unwrap();
    run_dealer(&mut room);

    // 16 against the dealer's 17 loses, but the perfect pair pays 25:1
    let result = room.settle().unwrap();
    let outcome = &result.players[&1];
    assert_eq!(outcome.main_hand_results[0].winnings, -10);
    assert_eq!(outcome.side_bet_results[0].winnings, 125);
    assert_eq!(outcome.total_winnings, 115);
}

#[test]
fn test_settlement_runs_once_per_round() {
    let mut room = room_with_bets(&[(1, 10)]);
    deal(
        &mut room,
        stacked(&[
            (Rank::Ten, Suit::Clubs),
            (Rank::Ten, Suit::Spades),
            (Rank::Seven, Suit::Hearts),
            (Rank::Nine, Suit::Spades),
        ]),
    );
    room.apply(1, PlayerAction::Stand).unwrap();
    run_dealer(&mut room);

    assert_eq!(room.settle().unwrap().players[&1].total_winnings, 10);
    assert_eq!(
        room.settle(),
        Err(GameError::ConcurrentSettlementAttempt(1))
    );

    room.apply(1, PlayerAction::NewRound).unwrap();
    assert_eq!(room.status(), RoundStatus::Betting);
    assert_eq!(room.round_counter(), 2);
    assert!(room.round_result().is_none());
}

#[test]
fn test_exhausted_deck_voids_round() {
    let mut room = room_with_bets(&[(1, 10)]);
    room.start_card_dealing(stacked(&[(Rank::Two, Suit::Clubs), (Rank::Three, Suit::Clubs)]))
        .unwrap();
    assert!(room.deal_next_card().unwrap());
    assert!(room.deal_next_card().unwrap());
    assert_eq!(room.deal_next_card(), Err(GameError::InsufficientDeck));

    room.abort_round();
    assert_eq!(room.status(), RoundStatus::RoundOver);
    let result = room.settle().unwrap();
    assert!(result.aborted);
    let outcome = &result.players[&1];
    assert_eq!(outcome.main_hand_results[0].result, HandOutcome::Push);
    assert_eq!(outcome.total_winnings, 0);
}
