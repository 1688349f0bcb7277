//! Room API handlers.
//!
//! Rooms are created over HTTP; play itself happens on the WebSocket.
//!
//! ```bash
//! curl -X POST http://localhost:6969/api/v1/rooms -H "Authorization: Bearer TOKEN"
//! curl http://localhost:6969/api/v1/rooms/AB12CD
//! ```

use axum::{
    Json,
    extract::{Extension, Path, State},
    http::StatusCode,
};
use blackjack_table::{auth::Identity, game::RoomSnapshot, room::ChatMessage};
use serde::{Deserialize, Serialize};

use super::{AppState, ErrorResponse, error_response};
use crate::metrics;

#[derive(Debug, Serialize, Deserialize)]
pub struct CreateRoomResponse {
    pub room_code: String,
}

/// Create a room hosted by the caller.
///
/// # Response
///
/// `201 Created` with `{"room_code": "AB12CD"}`. The caller becomes host and
/// takes a seat when they join over the WebSocket.
pub async fn create_room(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
) -> Result<(StatusCode, Json<CreateRoomResponse>), (StatusCode, Json<ErrorResponse>)> {
    let room_code = state
        .rooms
        .create_room(Some(identity.player_id))
        .await
        .map_err(|e| {
            tracing::error!("Failed to create room for player {}: {}", identity.player_id, e);
            error_response(StatusCode::INTERNAL_SERVER_ERROR, "Failed to create room")
        })?;

    metrics::rooms_created_total();
    metrics::active_rooms(state.rooms.room_count().await);
    tracing::info!(
        "Player {} ({}) created room {}",
        identity.player_id,
        identity.username,
        room_code
    );

    Ok((StatusCode::CREATED, Json(CreateRoomResponse { room_code })))
}

/// Get the full snapshot of a room.
///
/// # Errors
///
/// - `404 Not Found`: No room with that code
pub async fn get_room(
    State(state): State<AppState>,
    Path(code): Path<String>,
) -> Result<Json<RoomSnapshot>, (StatusCode, Json<ErrorResponse>)> {
    state
        .rooms
        .get_snapshot(&code)
        .await
        .map(Json)
        .ok_or_else(|| error_response(StatusCode::NOT_FOUND, "Room not found"))
}

/// Get the chat messages a room still holds, oldest first.
///
/// # Errors
///
/// - `404 Not Found`: No room with that code
pub async fn get_chat_history(
    State(state): State<AppState>,
    Path(code): Path<String>,
) -> Result<Json<Vec<ChatMessage>>, (StatusCode, Json<ErrorResponse>)> {
    state
        .rooms
        .chat_history(&code)
        .await
        .map(Json)
        .ok_or_else(|| error_response(StatusCode::NOT_FOUND, "Room not found"))
}
