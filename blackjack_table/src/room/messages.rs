//! Room actor message types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot};
use uuid::Uuid;

use crate::game::{GameError, PlayerAction, PlayerId, RoomSnapshot};

/// Messages that can be sent to a RoomActor
#[derive(Debug)]
pub enum RoomMessage {
    /// Subscribe a connection and seat (or reconnect) its player
    Join {
        player_id: PlayerId,
        username: String,
        connection_id: Uuid,
        sender: mpsc::Sender<RoomEvent>,
        response: oneshot::Sender<RoomResponse>,
    },

    /// A connection went away
    Disconnected {
        player_id: PlayerId,
        connection_id: Uuid,
    },

    /// Leave the room immediately, without grace
    Leave {
        player_id: PlayerId,
        response: oneshot::Sender<RoomResponse>,
    },

    /// Player command
    Action {
        player_id: PlayerId,
        action: PlayerAction,
        response: oneshot::Sender<RoomResponse>,
    },

    /// Post a chat message
    SendChat {
        player_id: PlayerId,
        message: String,
        response: oneshot::Sender<RoomResponse>,
    },

    /// Get the full room snapshot
    GetSnapshot {
        response: oneshot::Sender<RoomSnapshot>,
    },

    /// Get the retained chat history
    GetChatHistory {
        response: oneshot::Sender<Vec<ChatMessage>>,
    },

    /// A phase timer fired
    PhaseTimer { generation: u64 },

    /// A disconnect grace period ran out
    GraceExpired { player_id: PlayerId },

    /// The room has been empty for the configured timeout
    IdleExpired { generation: u64 },

    /// Shut the room down
    Close {
        response: oneshot::Sender<RoomResponse>,
    },
}

/// Response from room operations
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RoomResponse {
    /// Operation succeeded
    Success,

    /// Operation failed
    Error(String),

    /// Not your turn
    NotYourTurn,

    /// Invalid action for current game state
    InvalidAction(String),

    /// Player is not in the room
    NotInRoom,

    /// No room with that code
    RoomNotFound,
}

impl RoomResponse {
    /// Check if response is success
    pub fn is_success(&self) -> bool {
        matches!(self, RoomResponse::Success)
    }

    /// Get error message if response is error
    pub fn error_message(&self) -> Option<String> {
        match self {
            RoomResponse::Success => None,
            RoomResponse::Error(msg) | RoomResponse::InvalidAction(msg) => Some(msg.clone()),
            RoomResponse::NotYourTurn => Some("Not your turn".to_string()),
            RoomResponse::NotInRoom => Some("You are not in this room".to_string()),
            RoomResponse::RoomNotFound => Some("Room not found".to_string()),
        }
    }
}

impl From<GameError> for RoomResponse {
    fn from(err: GameError) -> Self {
        match err {
            GameError::OutOfTurnAction => RoomResponse::NotYourTurn,
            GameError::PlayerNotFound => RoomResponse::NotInRoom,
            GameError::InsufficientDeck | GameError::ConcurrentSettlementAttempt(_) => {
                RoomResponse::Error(err.client_message())
            }
            other => RoomResponse::InvalidAction(other.client_message()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatMessage {
    pub id: u64,
    pub room_code: String,
    pub player_id: PlayerId,
    pub username: String,
    pub message: String,
    pub created_at: DateTime<Utc>,
}

/// Notifications a room pushes to its subscribers.
#[derive(Debug, Clone)]
pub enum RoomEvent {
    GameUpdate {
        room_code: String,
        snapshot: Arc<RoomSnapshot>,
    },
    ChatHistory {
        room_code: String,
        messages: Vec<ChatMessage>,
    },
    ChatMessage(ChatMessage),
}

/// An outbound frame: `{"event": "...", "data": {...}}`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WireEvent {
    pub event: String,
    pub data: serde_json::Value,
}

impl RoomEvent {
    pub fn room_code(&self) -> &str {
        match self {
            RoomEvent::GameUpdate { room_code, .. } | RoomEvent::ChatHistory { room_code, .. } => {
                room_code
            }
            RoomEvent::ChatMessage(msg) => &msg.room_code,
        }
    }

    /// Event name, scoped to the room code
    pub fn event_name(&self) -> String {
        let prefix = match self {
            RoomEvent::GameUpdate { .. } => "game_update",
            RoomEvent::ChatHistory { .. } => "chat_history",
            RoomEvent::ChatMessage(_) => "chat_message",
        };
        format!("{prefix}_{}", self.room_code())
    }

    pub fn to_wire(&self) -> serde_json::Result<WireEvent> {
        let data = match self {
            RoomEvent::GameUpdate { snapshot, .. } => serde_json::to_value(snapshot.as_ref())?,
            RoomEvent::ChatHistory { messages, .. } => serde_json::to_value(messages)?,
            RoomEvent::ChatMessage(msg) => serde_json::to_value(msg)?,
        };
        Ok(WireEvent {
            event: self.event_name(),
            data,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::{Room, TableRules};

    #[test]
    fn test_game_error_mapping() {
        assert_eq!(
            RoomResponse::from(GameError::OutOfTurnAction),
            RoomResponse::NotYourTurn
        );
        assert_eq!(
            RoomResponse::from(GameError::PlayerNotFound),
            RoomResponse::NotInRoom
        );
        assert_eq!(
            RoomResponse::from(GameError::BetLocked),
            RoomResponse::InvalidAction("Bet is already locked".to_string())
        );
    }

    #[test]
    fn test_error_messages() {
        assert!(RoomResponse::Success.is_success());
        assert_eq!(RoomResponse::Success.error_message(), None);
        assert_eq!(
            RoomResponse::RoomNotFound.error_message().as_deref(),
            Some("Room not found")
        );
    }

    #[test]
    fn test_event_names_are_room_scoped() {
        let room = Room::new("QWERTY", TableRules::default(), None);
        let update = RoomEvent::GameUpdate {
            room_code: "QWERTY".to_string(),
            snapshot: Arc::new(room.snapshot()),
        };
        assert_eq!(update.event_name(), "game_update_QWERTY");

        let wire = update.to_wire().unwrap();
        assert_eq!(wire.data["roomCode"], "QWERTY");

        let history = RoomEvent::ChatHistory {
            room_code: "QWERTY".to_string(),
            messages: Vec::new(),
        };
        assert_eq!(history.event_name(), "chat_history_QWERTY");
        assert_eq!(history.to_wire().unwrap().data, serde_json::json!([]));
    }
}
