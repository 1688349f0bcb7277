//! Player statistics recorded after every settled round.

pub mod errors;
pub mod store;

pub use errors::{StatsError, StatsResult};
pub use store::{InMemoryStatsStore, PlayerStats, StatsRecord, StatsStore};
