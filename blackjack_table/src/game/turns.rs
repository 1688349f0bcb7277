//! Turn order across seats and split hands.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::entities::{Player, PlayerId, SeatIndex};

/// The hand currently allowed to act.
#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TurnCursor {
    pub seat_index: SeatIndex,
    pub player_id: PlayerId,
    pub hand_index: usize,
}

fn first_playing_hand(player: &Player, from: usize) -> Option<usize> {
    player
        .hands
        .iter()
        .enumerate()
        .skip(from)
        .find(|(_, hand)| hand.is_playing())
        .map(|(idx, _)| idx)
}

/// Finds the next hand to act.
///
/// The current player's later hands come first, then seats in ascending
/// order starting after the current seat and wrapping around. A player
/// whose turn has passed is never revisited.
///
/// # Arguments
///
/// * `players` - Everyone in the room
/// * `current` - The hand that just finished, or `None` at the start of play
///
/// # Returns
///
/// * `Option<TurnCursor>` - The next hand, or `None` when the dealer should play
pub fn next_turn(
    players: &BTreeMap<PlayerId, Player>,
    current: Option<TurnCursor>,
) -> Option<TurnCursor> {
    if let Some(cursor) = current
        && let Some(player) = players.get(&cursor.player_id)
        && let Some(hand_index) = first_playing_hand(player, cursor.hand_index + 1)
    {
        return Some(TurnCursor {
            hand_index,
            ..cursor
        });
    }

    let mut seated: Vec<(SeatIndex, &Player)> = players
        .values()
        .filter(|p| !p.is_spectating)
        .filter_map(|p| p.seat_index.map(|seat| (seat, p)))
        .collect();
    seated.sort_by_key(|(seat, _)| *seat);

    let (after, before): (Vec<_>, Vec<_>) = match current {
        Some(cursor) => seated
            .into_iter()
            .filter(|(_, p)| p.id != cursor.player_id)
            .partition(|(seat, _)| *seat > cursor.seat_index),
        None => (seated, Vec::new()),
    };

    after
        .into_iter()
        .chain(before)
        .find_map(|(seat_index, player)| {
            first_playing_hand(player, 0).map(|hand_index| TurnCursor {
                seat_index,
                player_id: player.id,
                hand_index,
            })
        })
}
