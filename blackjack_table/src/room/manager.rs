//! Room manager for spawning and looking up room actors.

use super::{
    actor::{RoomActor, RoomHandle},
    config::RoomConfig,
    messages::{ChatMessage, RoomEvent, RoomMessage, RoomResponse},
};
use crate::{
    game::{PlayerAction, PlayerId, RoomSnapshot},
    stats::StatsStore,
    wallet::BalanceStore,
};
use rand::Rng;
use std::{collections::HashMap, sync::Arc};
use tokio::sync::{RwLock, mpsc, oneshot};
use uuid::Uuid;

/// Length of a room code
pub const ROOM_CODE_LEN: usize = 6;

const ROOM_CODE_ALPHABET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

/// Generates a random room code of uppercase letters and digits.
pub fn generate_room_code() -> String {
    let mut rng = rand::rng();
    (0..ROOM_CODE_LEN)
        .map(|_| ROOM_CODE_ALPHABET[rng.random_range(0..ROOM_CODE_ALPHABET.len())] as char)
        .collect()
}

/// Room manager for managing multiple room instances
pub struct RoomManager {
    /// Configuration every new room starts with
    config: RoomConfig,

    balances: Arc<dyn BalanceStore>,

    stats: Arc<dyn StatsStore>,

    /// Active room handles
    rooms: Arc<RwLock<HashMap<String, RoomHandle>>>,
}

impl RoomManager {
    /// Create a new room manager
    ///
    /// # Arguments
    ///
    /// * `config` - Configuration for rooms created by this manager
    /// * `balances` - Balance store settlement deltas go to
    /// * `stats` - Stats store round outcomes go to
    ///
    /// # Returns
    ///
    /// * `RoomManager` - New room manager instance
    pub fn new(
        config: RoomConfig,
        balances: Arc<dyn BalanceStore>,
        stats: Arc<dyn StatsStore>,
    ) -> Self {
        Self {
            config,
            balances,
            stats,
            rooms: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Create a new room and spawn its actor
    ///
    /// # Arguments
    ///
    /// * `host_id` - Creator, who becomes host once they join
    ///
    /// # Returns
    ///
    /// * `Result<String, String>` - Code of the new room, or error
    pub async fn create_room(&self, host_id: Option<PlayerId>) -> Result<String, String> {
        self.config.validate()?;

        let mut rooms = self.rooms.write().await;
        rooms.retain(|_, handle| !handle.is_closed());
        let code = loop {
            let code = generate_room_code();
            if !rooms.contains_key(&code) {
                break code;
            }
        };

        let (actor, handle) = RoomActor::new(
            code.clone(),
            self.config.clone(),
            host_id,
            self.balances.clone(),
            self.stats.clone(),
        );
        tokio::spawn(actor.run());
        rooms.insert(code.clone(), handle);

        log::info!(
            "Created room {} (host: {})",
            code,
            host_id.map_or("none".to_string(), |id| id.to_string())
        );
        Ok(code)
    }

    /// Get room handle by code (case-insensitive)
    ///
    /// Rooms that closed themselves after standing empty are not returned.
    pub async fn get_room(&self, code: &str) -> Option<RoomHandle> {
        self.rooms
            .read()
            .await
            .get(&code.to_ascii_uppercase())
            .filter(|handle| !handle.is_closed())
            .cloned()
    }

    /// Close a room and forget its handle
    pub async fn close_room(&self, code: &str) -> RoomResponse {
        let Some(handle) = self.rooms.write().await.remove(&code.to_ascii_uppercase()) else {
            return RoomResponse::RoomNotFound;
        };
        log::info!("Closing room {}", handle.code());
        self.request(&handle, |response| RoomMessage::Close { response })
            .await
            .unwrap_or(RoomResponse::Success)
    }

    /// Number of open rooms
    pub async fn room_count(&self) -> usize {
        self.prune_closed().await;
        self.rooms.read().await.len()
    }

    /// Codes of all open rooms
    pub async fn room_codes(&self) -> Vec<String> {
        self.prune_closed().await;
        let mut codes: Vec<String> = self.rooms.read().await.keys().cloned().collect();
        codes.sort();
        codes
    }

    /// Close every open room, e.g. on server shutdown
    ///
    /// # Returns
    ///
    /// * `usize` - Number of rooms closed
    pub async fn close_all(&self) -> usize {
        let mut closed = 0;
        for code in self.room_codes().await {
            if self.close_room(&code).await.is_success() {
                closed += 1;
            }
        }
        closed
    }

    /// Forget handles whose actor has stopped
    async fn prune_closed(&self) {
        let mut rooms = self.rooms.write().await;
        let before = rooms.len();
        rooms.retain(|_, handle| !handle.is_closed());
        if rooms.len() < before {
            log::debug!("Pruned {} closed rooms", before - rooms.len());
        }
    }

    // === Request helpers ===

    /// Join a room on behalf of a connection
    ///
    /// # Arguments
    ///
    /// * `code` - Room code
    /// * `player_id` - Joining player
    /// * `username` - Display name
    /// * `connection_id` - Connection the subscription belongs to
    /// * `sender` - Where room events for this connection go
    pub async fn join_room(
        &self,
        code: &str,
        player_id: PlayerId,
        username: String,
        connection_id: Uuid,
        sender: mpsc::Sender<RoomEvent>,
    ) -> RoomResponse {
        let Some(handle) = self.get_room(code).await else {
            return RoomResponse::RoomNotFound;
        };
        self.request(&handle, |response| RoomMessage::Join {
            player_id,
            username,
            connection_id,
            sender,
            response,
        })
        .await
        .unwrap_or_else(RoomResponse::Error)
    }

    /// Leave a room right away
    pub async fn leave_room(&self, code: &str, player_id: PlayerId) -> RoomResponse {
        let Some(handle) = self.get_room(code).await else {
            return RoomResponse::RoomNotFound;
        };
        self.request(&handle, |response| RoomMessage::Leave {
            player_id,
            response,
        })
        .await
        .unwrap_or_else(RoomResponse::Error)
    }

    /// Report a dropped connection; the room starts the player's grace period
    pub async fn disconnect(&self, code: &str, player_id: PlayerId, connection_id: Uuid) {
        if let Some(handle) = self.get_room(code).await
            && let Err(e) = handle
                .send(RoomMessage::Disconnected {
                    player_id,
                    connection_id,
                })
                .await
        {
            log::debug!("Disconnect for room {} not delivered: {}", code, e);
        }
    }

    /// Submit a player action
    pub async fn submit_action(
        &self,
        code: &str,
        player_id: PlayerId,
        action: PlayerAction,
    ) -> RoomResponse {
        let Some(handle) = self.get_room(code).await else {
            return RoomResponse::RoomNotFound;
        };
        self.request(&handle, |response| RoomMessage::Action {
            player_id,
            action,
            response,
        })
        .await
        .unwrap_or_else(RoomResponse::Error)
    }

    /// Post a chat message
    pub async fn send_chat(&self, code: &str, player_id: PlayerId, message: String) -> RoomResponse {
        let Some(handle) = self.get_room(code).await else {
            return RoomResponse::RoomNotFound;
        };
        self.request(&handle, |response| RoomMessage::SendChat {
            player_id,
            message,
            response,
        })
        .await
        .unwrap_or_else(RoomResponse::Error)
    }

    /// Current room snapshot, if the room exists
    pub async fn get_snapshot(&self, code: &str) -> Option<RoomSnapshot> {
        let handle = self.get_room(code).await?;
        self.request(&handle, |response| RoomMessage::GetSnapshot { response })
            .await
            .ok()
    }

    /// Retained chat history, if the room exists
    pub async fn chat_history(&self, code: &str) -> Option<Vec<ChatMessage>> {
        let handle = self.get_room(code).await?;
        self.request(&handle, |response| RoomMessage::GetChatHistory { response })
            .await
            .ok()
    }

    /// Sends a request built around a fresh responder and waits for the answer.
    async fn request<T>(
        &self,
        handle: &RoomHandle,
        build: impl FnOnce(oneshot::Sender<T>) -> RoomMessage,
    ) -> Result<T, String> {
        let (tx, rx) = oneshot::channel();
        handle.send(build(tx)).await?;
        rx.await
            .map_err(|_| format!("Room {} did not respond", handle.code()))
    }
}
