//! Per-player round statistics.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::{collections::HashMap, sync::Arc};
use tokio::sync::RwLock;

use super::errors::StatsResult;
use crate::game::{Chips, HandOutcome, HandResult, PlayerId, SideBetResult};

/// Lifetime tallies for one player.
#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerStats {
    pub rounds_played: u64,
    pub hands_played: u64,
    pub blackjacks: u64,
    pub wins: u64,
    pub losses: u64,
    pub pushes: u64,
    pub busts: u64,
    pub side_bets_won: u64,
    pub side_bets_lost: u64,
    pub money_won: Chips,
    pub money_lost: Chips,
    pub last_played: Option<DateTime<Utc>>,
}

impl PlayerStats {
    /// Folds one round into the tallies.
    ///
    /// A blackjack also counts as a win and a bust also counts as a loss.
    pub fn record(&mut self, main_hand_results: &[HandResult], side_bet_results: &[SideBetResult]) {
        self.rounds_played += 1;
        for hand in main_hand_results {
            self.hands_played += 1;
            match hand.result {
                HandOutcome::Blackjack => {
                    self.blackjacks += 1;
                    self.wins += 1;
                }
                HandOutcome::Win => self.wins += 1,
                HandOutcome::Bust => {
                    self.busts += 1;
                    self.losses += 1;
                }
                HandOutcome::Lose => self.losses += 1,
                HandOutcome::Push => self.pushes += 1,
            }
            self.tally_money(hand.winnings);
        }
        for side_bet in side_bet_results {
            if side_bet.winnings > 0 {
                self.side_bets_won += 1;
            } else if side_bet.winnings < 0 {
                self.side_bets_lost += 1;
            }
            self.tally_money(side_bet.winnings);
        }
        self.last_played = Some(Utc::now());
    }

    fn tally_money(&mut self, winnings: Chips) {
        if winnings > 0 {
            self.money_won += winnings;
        } else {
            self.money_lost += -winnings;
        }
    }

    pub fn net(&self) -> Chips {
        self.money_won - self.money_lost
    }
}

/// A player's tallies together with the name they last played under.
#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatsRecord {
    pub player_id: PlayerId,
    pub username: String,
    pub stats: PlayerStats,
}

#[async_trait]
pub trait StatsStore: Send + Sync {
    /// Records one settled round for a player.
    async fn record_round_outcome(
        &self,
        player_id: PlayerId,
        username: &str,
        main_hand_results: &[HandResult],
        side_bet_results: &[SideBetResult],
    ) -> StatsResult<()>;

    async fn get_stats(&self, player_id: PlayerId) -> StatsResult<PlayerStats>;

    /// Every player with at least one recorded round, in no particular order.
    async fn list_stats(&self) -> StatsResult<Vec<StatsRecord>>;
}

#[derive(Clone, Default)]
pub struct InMemoryStatsStore {
    records: Arc<RwLock<HashMap<PlayerId, StatsRecord>>>,
}

impl InMemoryStatsStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl StatsStore for InMemoryStatsStore {
    async fn record_round_outcome(
        &self,
        player_id: PlayerId,
        username: &str,
        main_hand_results: &[HandResult],
        side_bet_results: &[SideBetResult],
    ) -> StatsResult<()> {
        let mut records = self.records.write().await;
        let record = records.entry(player_id).or_insert_with(|| StatsRecord {
            player_id,
            username: username.to_string(),
            stats: PlayerStats::default(),
        });
        if record.username != username {
            record.username = username.to_string();
        }
        record.stats.record(main_hand_results, side_bet_results);
        Ok(())
    }

    async fn get_stats(&self, player_id: PlayerId) -> StatsResult<PlayerStats> {
        Ok(self
            .records
            .read()
            .await
            .get(&player_id)
            .map(|record| record.stats.clone())
            .unwrap_or_default())
    }

    async fn list_stats(&self) -> StatsResult<Vec<StatsRecord>> {
        Ok(self.records.read().await.values().cloned().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::SideBetKind;

    fn hand(result: HandOutcome, winnings: Chips) -> HandResult {
        HandResult {
            hand_index: 0,
            result,
            winnings,
        }
    }

    #[test]
    fn test_blackjack_counts_as_win() {
        let mut stats = PlayerStats::default();
        stats.record(&[hand(HandOutcome::Blackjack, 150)], &[]);
        assert_eq!(stats.blackjacks, 1);
        assert_eq!(stats.wins, 1);
        assert_eq!(stats.money_won, 150);
        assert!(stats.last_played.is_some());
    }

    #[test]
    fn test_bust_counts_as_loss() {
        let mut stats = PlayerStats::default();
        stats.record(&[hand(HandOutcome::Bust, -50)], &[]);
        assert_eq!(stats.busts, 1);
        assert_eq!(stats.losses, 1);
        assert_eq!(stats.money_lost, 50);
    }

    #[test]
    fn test_split_round_counts_hands() {
        let mut stats = PlayerStats::default();
        stats.record(
            &[hand(HandOutcome::Win, 100), hand(HandOutcome::Push, 0)],
            &[SideBetResult {
                bet_name: SideBetKind::PerfectPairs,
                result: "Perfect Pairs: Lose".to_string(),
                winnings: -5,
            }],
        );
        assert_eq!(stats.rounds_played, 1);
        assert_eq!(stats.hands_played, 2);
        assert_eq!(stats.pushes, 1);
        assert_eq!(stats.side_bets_lost, 1);
        assert_eq!(stats.net(), 95);
    }

    #[tokio::test]
    async fn test_store_accumulates() {
        let store = InMemoryStatsStore::new();
        store
            .record_round_outcome(3, "dana", &[hand(HandOutcome::Win, 10)], &[])
            .await
            .unwrap();
        store
            .record_round_outcome(3, "dana", &[hand(HandOutcome::Lose, -10)], &[])
            .await
            .unwrap();
        let stats = store.get_stats(3).await.unwrap();
        assert_eq!(stats.rounds_played, 2);
        assert_eq!(stats.net(), 0);
        assert_eq!(store.get_stats(4).await.unwrap(), PlayerStats::default());
    }

    #[tokio::test]
    async fn test_list_stats_keeps_latest_name() {
        let store = InMemoryStatsStore::new();
        assert!(store.list_stats().await.unwrap().is_empty());

        store
            .record_round_outcome(1, "erin", &[hand(HandOutcome::Win, 20)], &[])
            .await
            .unwrap();
        store
            .record_round_outcome(1, "erin_2", &[hand(HandOutcome::Push, 0)], &[])
            .await
            .unwrap();
        store
            .record_round_outcome(2, "finn", &[hand(HandOutcome::Bust, -10)], &[])
            .await
            .unwrap();

        let mut records = store.list_stats().await.unwrap();
        records.sort_by_key(|r| r.player_id);
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].username, "erin_2");
        assert_eq!(records[0].stats.rounds_played, 2);
        assert_eq!(records[1].stats.net(), -10);
    }
}
