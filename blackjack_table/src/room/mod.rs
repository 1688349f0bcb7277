//! Room module: one async actor per blackjack room, plus the repository of rooms.
//!
//! This module implements:
//! - RoomActor: the single writer for one room's `Room` state
//! - RoomManager: creates rooms under short codes and routes requests to them
//! - Timed phase transitions, disconnect grace and throttled broadcasts
//!
//! ## Architecture
//!
//! Each room runs in its own Tokio task with an mpsc inbox. Requests carry a
//! oneshot responder. Timers never touch state directly; they post a message
//! back into the inbox, tagged so that a superseded timer is ignored.
//!
//! ## Example
//!
//! ```
//! use blackjack_table::{
//!     room::{RoomConfig, RoomManager},
//!     stats::InMemoryStatsStore,
//!     wallet::InMemoryBalanceStore,
//! };
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() {
//!     let manager = RoomManager::new(
//!         RoomConfig::default(),
//!         Arc::new(InMemoryBalanceStore::new()),
//!         Arc::new(InMemoryStatsStore::new()),
//!     );
//!     let code = manager.create_room(None).await.unwrap();
//!     assert!(manager.get_snapshot(&code).await.is_some());
//! }
//! ```

pub mod actor;
pub mod config;
pub mod manager;
pub mod messages;
pub mod sync;

pub use actor::{RoomActor, RoomHandle};
pub use config::RoomConfig;
pub use manager::{RoomManager, generate_room_code};
pub use messages::{ChatMessage, RoomEvent, RoomMessage, RoomResponse, WireEvent};
pub use sync::Throttle;
