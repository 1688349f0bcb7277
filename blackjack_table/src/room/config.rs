//! Room configuration.

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::game::{Chips, TableRules};

/// Room configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoomConfig {
    /// Number of seats (default: 5)
    pub num_seats: usize,

    /// Minimum main bet to lock
    pub min_bet: Chips,

    /// Largest main bet, and largest stake on each side bet
    pub max_bet: Chips,

    /// Hands a seat may hold after splitting
    pub max_hands_per_seat: usize,

    /// Pause in `dealing` before the first card
    pub shuffle_delay_ms: u64,

    /// Pause between dealt cards
    pub deal_delay_ms: u64,

    /// Pause between dealer draws
    pub dealer_draw_delay_ms: u64,

    /// How long results stay on screen before the next round opens
    pub round_over_delay_ms: u64,

    /// How long a disconnected player keeps their seat
    pub disconnect_grace_ms: u64,

    /// Minimum gap between broadcasts during active play
    pub active_throttle_ms: u64,

    /// Minimum gap between broadcasts in `dealer` and `roundOver`
    pub slow_throttle_ms: u64,

    /// Actor tick; flushes broadcasts the throttle held back
    pub tick_interval_ms: u64,

    /// Chat messages kept per room
    pub chat_history_limit: usize,

    /// How long a room with nobody in it stays open for rejoins
    pub empty_room_timeout_ms: u64,
}

impl Default for RoomConfig {
    fn default() -> Self {
        Self {
            num_seats: 5,
            min_bet: 10,
            max_bet: 10_000,
            max_hands_per_seat: 3,
            shuffle_delay_ms: 2000,
            deal_delay_ms: 800,
            dealer_draw_delay_ms: 1000,
            round_over_delay_ms: 8000,
            disconnect_grace_ms: 30_000,
            active_throttle_ms: 100,
            slow_throttle_ms: 300,
            tick_interval_ms: 100,
            chat_history_limit: 200,
            empty_room_timeout_ms: 600_000,
        }
    }
}

impl RoomConfig {
    /// Validate configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.num_seats == 0 || self.num_seats > 7 {
            return Err("Seats must be between 1 and 7".to_string());
        }

        if self.min_bet <= 0 {
            return Err("Minimum bet must be positive".to_string());
        }

        if self.max_bet < self.min_bet {
            return Err("Maximum bet must not be below the minimum bet".to_string());
        }

        if self.max_hands_per_seat == 0 {
            return Err("A seat must allow at least one hand".to_string());
        }

        if self.tick_interval_ms == 0 {
            return Err("Tick interval must be positive".to_string());
        }

        if self.slow_throttle_ms < self.active_throttle_ms {
            return Err("Slow throttle must not be shorter than the active throttle".to_string());
        }

        Ok(())
    }

    pub fn rules(&self) -> TableRules {
        TableRules {
            num_seats: self.num_seats,
            min_bet: self.min_bet,
            max_bet: self.max_bet,
            max_hands_per_seat: self.max_hands_per_seat,
        }
    }

    pub fn shuffle_delay(&self) -> Duration {
        Duration::from_millis(self.shuffle_delay_ms)
    }

    pub fn deal_delay(&self) -> Duration {
        Duration::from_millis(self.deal_delay_ms)
    }

    pub fn dealer_draw_delay(&self) -> Duration {
        Duration::from_millis(self.dealer_draw_delay_ms)
    }

    pub fn round_over_delay(&self) -> Duration {
        Duration::from_millis(self.round_over_delay_ms)
    }

    pub fn disconnect_grace(&self) -> Duration {
        Duration::from_millis(self.disconnect_grace_ms)
    }

    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms)
    }

    pub fn empty_room_timeout(&self) -> Duration {
        Duration::from_millis(self.empty_room_timeout_ms)
    }
}
