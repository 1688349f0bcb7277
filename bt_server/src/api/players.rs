//! Player API handlers: the caller's profile and the public leaderboard.

use axum::{
    Json,
    extract::{Extension, State},
    http::StatusCode,
};
use blackjack_table::{
    auth::Identity,
    stats::{PlayerStats, StatsRecord},
};
use serde::{Deserialize, Serialize};

use super::{AppState, ErrorResponse, error_response};

#[derive(Debug, Serialize, Deserialize)]
pub struct PlayerProfile {
    pub user_id: i64,
    pub username: String,
    pub balance: i64,
    pub stats: PlayerStats,
}

/// One row of the leaderboard
#[derive(Debug, Serialize, Deserialize)]
pub struct LeaderboardEntry {
    pub user_id: i64,
    pub username: String,
    pub balance: i64,
    pub net_profit: i64,
    pub stats: PlayerStats,
}

/// The caller's balance and lifetime statistics.
pub async fn me(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
) -> Result<Json<PlayerProfile>, (StatusCode, Json<ErrorResponse>)> {
    let balance = state
        .balances
        .get_balance(identity.player_id)
        .await
        .map_err(|e| error_response(StatusCode::INTERNAL_SERVER_ERROR, e.client_message()))?;
    let stats = state
        .stats
        .get_stats(identity.player_id)
        .await
        .map_err(|e| error_response(StatusCode::INTERNAL_SERVER_ERROR, e.client_message()))?;

    Ok(Json(PlayerProfile {
        user_id: identity.player_id,
        username: identity.username,
        balance,
        stats,
    }))
}

/// Every player who has finished a round, richest first.
///
/// Ties on balance go to the larger net profit, then to the username.
///
/// # Example
///
/// ```bash
/// curl http://localhost:6969/api/v1/leaderboard
/// # [{"user_id":3,"username":"alice","balance":1450,"net_profit":450,"stats":{...}}]
/// ```
pub async fn leaderboard(
    State(state): State<AppState>,
) -> Result<Json<Vec<LeaderboardEntry>>, (StatusCode, Json<ErrorResponse>)> {
    let records = state.stats.list_stats().await.map_err(|e| {
        tracing::error!("Failed to list stats: {}", e);
        error_response(StatusCode::INTERNAL_SERVER_ERROR, e.client_message())
    })?;

    let mut entries = Vec::with_capacity(records.len());
    for StatsRecord {
        player_id,
        username,
        stats,
    } in records
    {
        let balance = state
            .balances
            .get_balance(player_id)
            .await
            .map_err(|e| error_response(StatusCode::INTERNAL_SERVER_ERROR, e.client_message()))?;
        entries.push(LeaderboardEntry {
            user_id: player_id,
            username,
            balance,
            net_profit: stats.net(),
            stats,
        });
    }

    entries.sort_by(|a, b| {
        b.balance
            .cmp(&a.balance)
            .then(b.net_profit.cmp(&a.net_profit))
            .then_with(|| a.username.cmp(&b.username))
    });
    Ok(Json(entries))
}
