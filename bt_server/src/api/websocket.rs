//! WebSocket handler for live blackjack rooms.
//!
//! # Connection Flow
//!
//! 1. Client connects via `GET /ws?token=<jwt_token>`
//! 2. Server resolves the token to an identity and upgrades
//! 3. The connection becomes the identity's only live session; an older
//!    connection for the same identity receives `force_logout` and closes
//! 4. Client sends `join_room` for each room it wants to follow
//! 5. On disconnect the rooms start the player's reconnect grace period
//!
//! # Client Messages
//!
//! JSON objects tagged by `type`, each carrying the `roomCode` it targets:
//!
//! ```json
//! {"type": "join_room", "roomCode": "AB12CD"}
//! {"type": "place_bet", "roomCode": "AB12CD", "amount": 25, "betType": "main"}
//! {"type": "place_bet", "roomCode": "AB12CD", "amount": 5, "betType": "side", "sideBetName": "perfectPairs"}
//! {"type": "choose_ace", "roomCode": "AB12CD", "handIndex": 0, "cardInstanceId": "...", "value": 11}
//! ```
//!
//! # Server Messages
//!
//! Every frame is `{"event": "<name>", "data": {...}}`:
//!
//! - `game_update_<roomCode>`: full room snapshot
//! - `chat_history_<roomCode>` / `chat_message_<roomCode>`: chat
//! - `error`: a rejected message, sent only to this connection
//! - `force_logout`: this connection was displaced by a newer login

use axum::{
    extract::{
        Query, State,
        ws::{Message, WebSocket, WebSocketUpgrade},
    },
    http::StatusCode,
    response::{IntoResponse, Response},
};
use blackjack_table::{
    auth::{Identity, SessionSignal},
    game::{AceValue, BetTarget, Chips, PlayerAction, SideBetKind},
    room::{RoomEvent, RoomResponse, WireEvent},
};
use futures_util::{SinkExt, StreamExt};
use serde::Deserialize;
use serde_json::json;
use std::collections::HashSet;
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use super::{AppState, rate_limiter::ConnectionLimits};
use crate::{logging, metrics};

#[derive(Debug, Deserialize)]
pub struct WsQuery {
    token: String,
}

/// Which stake a `place_bet` adds to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BetType {
    Main,
    Side,
}

/// Client messages received via WebSocket
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(
    tag = "type",
    rename_all = "snake_case",
    rename_all_fields = "camelCase"
)]
pub enum ClientMessage {
    JoinRoom {
        room_code: String,
    },
    LeaveRoom {
        room_code: String,
    },
    PlaceBet {
        room_code: String,
        amount: Chips,
        bet_type: BetType,
        side_bet_name: Option<SideBetKind>,
    },
    ClearBets {
        room_code: String,
    },
    LockBet {
        room_code: String,
    },
    Hit {
        room_code: String,
    },
    Stand {
        room_code: String,
    },
    Double {
        room_code: String,
    },
    Split {
        room_code: String,
    },
    Surrender {
        room_code: String,
    },
    ChooseAce {
        room_code: String,
        hand_index: usize,
        card_instance_id: Uuid,
        value: AceValue,
    },
    ToggleSpectator {
        room_code: String,
    },
    ForceStart {
        room_code: String,
    },
    NewRound {
        room_code: String,
    },
    SetKeepBets {
        room_code: String,
        keep_main_bet: bool,
        keep_side_bets: bool,
    },
    SendChat {
        room_code: String,
        message: String,
    },
}

impl ClientMessage {
    pub fn room_code(&self) -> &str {
        match self {
            ClientMessage::JoinRoom { room_code }
            | ClientMessage::LeaveRoom { room_code }
            | ClientMessage::PlaceBet { room_code, .. }
            | ClientMessage::ClearBets { room_code }
            | ClientMessage::LockBet { room_code }
            | ClientMessage::Hit { room_code }
            | ClientMessage::Stand { room_code }
            | ClientMessage::Double { room_code }
            | ClientMessage::Split { room_code }
            | ClientMessage::Surrender { room_code }
            | ClientMessage::ChooseAce { room_code, .. }
            | ClientMessage::ToggleSpectator { room_code }
            | ClientMessage::ForceStart { room_code }
            | ClientMessage::NewRound { room_code }
            | ClientMessage::SetKeepBets { room_code, .. }
            | ClientMessage::SendChat { room_code, .. } => room_code,
        }
    }

    /// Wire name of the message, for metrics
    pub fn kind(&self) -> &'static str {
        match self {
            ClientMessage::JoinRoom { .. } => "join_room",
            ClientMessage::LeaveRoom { .. } => "leave_room",
            ClientMessage::PlaceBet { .. } => "place_bet",
            ClientMessage::ClearBets { .. } => "clear_bets",
            ClientMessage::LockBet { .. } => "lock_bet",
            ClientMessage::Hit { .. } => "hit",
            ClientMessage::Stand { .. } => "stand",
            ClientMessage::Double { .. } => "double",
            ClientMessage::Split { .. } => "split",
            ClientMessage::Surrender { .. } => "surrender",
            ClientMessage::ChooseAce { .. } => "choose_ace",
            ClientMessage::ToggleSpectator { .. } => "toggle_spectator",
            ClientMessage::ForceStart { .. } => "force_start",
            ClientMessage::NewRound { .. } => "new_round",
            ClientMessage::SetKeepBets { .. } => "set_keep_bets",
            ClientMessage::SendChat { .. } => "send_chat",
        }
    }

    /// The room action this message asks for.
    ///
    /// # Returns
    ///
    /// * `Ok(None)` - Membership and chat messages, which are not room actions
    /// * `Err(String)` - A malformed bet
    pub fn to_action(&self) -> Result<Option<PlayerAction>, String> {
        let action = match self {
            ClientMessage::JoinRoom { .. }
            | ClientMessage::LeaveRoom { .. }
            | ClientMessage::SendChat { .. } => return Ok(None),
            ClientMessage::PlaceBet {
                amount,
                bet_type,
                side_bet_name,
                ..
            } => {
                let target = match (bet_type, side_bet_name) {
                    (BetType::Main, _) => BetTarget::Main,
                    (BetType::Side, Some(kind)) => BetTarget::Side(*kind),
                    (BetType::Side, None) => {
                        return Err("Side bets need a sideBetName".to_string());
                    }
                };
                PlayerAction::PlaceBet {
                    amount: *amount,
                    target,
                }
            }
            ClientMessage::ClearBets { .. } => PlayerAction::ClearBets,
            ClientMessage::LockBet { .. } => PlayerAction::LockBet,
            ClientMessage::Hit { .. } => PlayerAction::Hit,
            ClientMessage::Stand { .. } => PlayerAction::Stand,
            ClientMessage::Double { .. } => PlayerAction::Double,
            ClientMessage::Split { .. } => PlayerAction::Split,
            ClientMessage::Surrender { .. } => PlayerAction::Surrender,
            ClientMessage::ChooseAce {
                hand_index,
                card_instance_id,
                value,
                ..
            } => PlayerAction::ChooseAce {
                hand_index: *hand_index,
                card_id: *card_instance_id,
                value: *value,
            },
            ClientMessage::ToggleSpectator { .. } => PlayerAction::ToggleSpectator,
            ClientMessage::ForceStart { .. } => PlayerAction::ForceStart,
            ClientMessage::NewRound { .. } => PlayerAction::NewRound,
            ClientMessage::SetKeepBets {
                keep_main_bet,
                keep_side_bets,
                ..
            } => PlayerAction::SetKeepBets {
                keep_main_bet: *keep_main_bet,
                keep_side_bets: *keep_side_bets,
            },
        };
        Ok(Some(action))
    }
}

fn error_frame(message: impl Into<String>) -> WireEvent {
    WireEvent {
        event: "error".to_string(),
        data: json!({ "message": message.into() }),
    }
}

fn signal_frame(signal: &SessionSignal) -> WireEvent {
    match signal {
        SessionSignal::ForceLogout {
            reason,
            new_login_time,
        } => WireEvent {
            event: "force_logout".to_string(),
            data: json!({ "reason": reason, "newLoginTime": new_login_time }),
        },
    }
}

/// Upgrade HTTP connection to WebSocket.
///
/// # Query Parameters
///
/// - `token`: JWT access token for authentication
///
/// # Response
///
/// `101 Switching Protocols` on success, `401 Unauthorized` for a bad token.
pub async fn websocket_handler(
    ws: WebSocketUpgrade,
    Query(query): Query<WsQuery>,
    State(state): State<AppState>,
) -> Response {
    let identity = match state.sessions.resolve_identity(&query.token) {
        Ok(identity) => identity,
        Err(e) => {
            logging::log_security_event("bad_token", None, "Rejected WebSocket upgrade");
            return (StatusCode::UNAUTHORIZED, e.client_message()).into_response();
        }
    };

    ws.on_upgrade(move |socket| handle_socket(socket, identity, state))
}

/// Handle an established WebSocket connection.
///
/// # Arguments
///
/// - `socket`: The WebSocket connection
/// - `identity`: Who the connection acts as
/// - `state`: Shared application state
async fn handle_socket(socket: WebSocket, identity: Identity, state: AppState) {
    let connection_id = Uuid::new_v4();
    let player_id = identity.player_id;
    let (mut sender, mut receiver) = socket.split();

    info!(
        "WebSocket connected: player={} ({}), connection={}",
        player_id, identity.username, connection_id
    );
    metrics::websocket_connected();

    let mut limits = ConnectionLimits::new();
    let mut joined: HashSet<String> = HashSet::new();

    // Everything the client receives goes through the single writer task
    let (reply_tx, mut reply_rx) = mpsc::channel::<WireEvent>(32);
    let (event_tx, mut event_rx) = mpsc::channel::<RoomEvent>(256);
    let (signal_tx, mut signal_rx) = mpsc::channel::<SessionSignal>(4);

    if let Some(displaced) = state
        .sessions
        .enforce_single_session(player_id, connection_id, signal_tx)
        .await
    {
        metrics::forced_logouts_total();
        logging::log_security_event(
            "force_logout",
            Some(player_id),
            &format!("Connection {displaced} displaced by {connection_id}"),
        );
    }

    let mut send_task = tokio::spawn(async move {
        loop {
            let (frame, close_after) = tokio::select! {
                Some(event) = event_rx.recv() => match event.to_wire() {
                    Ok(frame) => (frame, false),
                    Err(e) => {
                        error!("Failed to serialize {}: {}", event.event_name(), e);
                        continue;
                    }
                },
                Some(reply) = reply_rx.recv() => (reply, false),
                Some(signal) = signal_rx.recv() => (signal_frame(&signal), true),
                else => break,
            };

            let text = match serde_json::to_string(&frame) {
                Ok(text) => text,
                Err(e) => {
                    error!("Failed to serialize {} frame: {}", frame.event, e);
                    continue;
                }
            };
            if sender.send(Message::Text(text.into())).await.is_err() {
                break;
            }
            metrics::websocket_messages_sent(&frame.event);

            if close_after {
                let _ = sender.send(Message::Close(None)).await;
                break;
            }
        }
    });

    loop {
        let msg = tokio::select! {
            msg = receiver.next() => msg,
            _ = &mut send_task => {
                debug!("Writer for connection {} finished", connection_id);
                break;
            }
        };

        match msg {
            Some(Ok(Message::Text(text))) => {
                if let Err(limit) = limits.check() {
                    warn!(
                        "{} rate limit exceeded for player {}. Blocking message.",
                        limit.label(),
                        player_id
                    );
                    metrics::rate_limit_hits_total(limit.label());
                    let _ = reply_tx.send(error_frame(limit.client_message())).await;
                    continue;
                }

                let reply = match serde_json::from_str::<ClientMessage>(text.as_str()) {
                    Ok(client_msg) => {
                        metrics::websocket_messages_received(client_msg.kind());
                        handle_client_message(
                            client_msg,
                            &identity,
                            connection_id,
                            &event_tx,
                            &mut joined,
                            &state,
                        )
                        .await
                    }
                    Err(e) => {
                        warn!("Failed to parse client message: {}", e);
                        Some(error_frame("Invalid message format"))
                    }
                };

                if let Some(frame) = reply
                    && reply_tx.send(frame).await.is_err()
                {
                    break;
                }
            }
            Some(Ok(Message::Close(_))) | None => {
                info!("WebSocket closed: player={}", player_id);
                break;
            }
            Some(Err(e)) => {
                error!("WebSocket error: {}", e);
                break;
            }
            Some(Ok(_)) => {}
        }
    }

    send_task.abort();

    // Rooms hold the seat for the grace period rather than removing the player
    for code in &joined {
        state.rooms.disconnect(code, player_id, connection_id).await;
    }
    if state.sessions.release(player_id, connection_id).await.is_err() {
        debug!(
            "Connection {} was no longer the live session for player {}",
            connection_id, player_id
        );
    }

    metrics::websocket_disconnected();
    info!(
        "WebSocket disconnected: player={}, connection={}",
        player_id, connection_id
    );
}

/// Process one client message.
///
/// # Returns
///
/// * `Some(WireEvent)` - An `error` frame for the client
/// * `None` - Accepted; the effect arrives as room events
async fn handle_client_message(
    msg: ClientMessage,
    identity: &Identity,
    connection_id: Uuid,
    events: &mpsc::Sender<RoomEvent>,
    joined: &mut HashSet<String>,
    state: &AppState,
) -> Option<WireEvent> {
    let player_id = identity.player_id;
    let code = msg.room_code().trim().to_ascii_uppercase();

    let response = match &msg {
        ClientMessage::JoinRoom { .. } => {
            let response = state
                .rooms
                .join_room(
                    &code,
                    player_id,
                    identity.username.clone(),
                    connection_id,
                    events.clone(),
                )
                .await;
            if response.is_success() {
                joined.insert(code.clone());
            }
            response
        }
        ClientMessage::LeaveRoom { .. } => {
            joined.remove(&code);
            state.rooms.leave_room(&code, player_id).await
        }
        ClientMessage::SendChat { message, .. } => {
            state.rooms.send_chat(&code, player_id, message.clone()).await
        }
        _ => match msg.to_action() {
            Ok(Some(action)) => state.rooms.submit_action(&code, player_id, action).await,
            Ok(None) => RoomResponse::Success,
            Err(message) => RoomResponse::InvalidAction(message),
        },
    };

    if !response.is_success() {
        debug!(
            "Player {} {} in room {} rejected: {:?}",
            player_id,
            msg.kind(),
            code,
            response
        );
    }
    response.error_message().map(error_frame)
}
