//! Room actor: the single writer for one room's state.

use super::{
    config::RoomConfig,
    messages::{ChatMessage, RoomEvent, RoomMessage, RoomResponse},
    sync::Throttle,
};
use crate::{
    game::{Deck, GameError, GameResult, PlayerId, Room, RoundStatus},
    stats::StatsStore,
    wallet::BalanceStore,
};
use chrono::Utc;
use std::{
    collections::{HashMap, VecDeque},
    sync::Arc,
};
use tokio::{
    sync::mpsc,
    task::JoinHandle,
    time::{Duration, Instant, MissedTickBehavior, interval, sleep},
};
use uuid::Uuid;

/// Longest chat message accepted, in characters.
pub const MAX_CHAT_MESSAGE_CHARS: usize = 500;

/// Room actor handle for sending messages
#[derive(Clone, Debug)]
pub struct RoomHandle {
    sender: mpsc::Sender<RoomMessage>,
    code: String,
}

impl RoomHandle {
    /// Create a new room handle
    pub fn new(sender: mpsc::Sender<RoomMessage>, code: String) -> Self {
        Self { sender, code }
    }

    /// Get room code
    pub fn code(&self) -> &str {
        &self.code
    }

    /// Whether the actor has stopped
    pub fn is_closed(&self) -> bool {
        self.sender.is_closed()
    }

    /// Send a message to the room
    pub async fn send(&self, message: RoomMessage) -> Result<(), String> {
        self.sender
            .send(message)
            .await
            .map_err(|_| "Room is closed".to_string())
    }
}

struct Subscriber {
    player_id: PlayerId,
    sender: mpsc::Sender<RoomEvent>,
}

/// One pending timed transition. Rescheduling cancels the previous one.
#[derive(Default)]
struct PhaseTimer {
    generation: u64,
    task: Option<JoinHandle<()>>,
}

impl PhaseTimer {
    fn schedule(&mut self, delay: Duration, inbox: mpsc::WeakSender<RoomMessage>) {
        self.schedule_with(delay, inbox, |generation| RoomMessage::PhaseTimer { generation });
    }

    fn schedule_with(
        &mut self,
        delay: Duration,
        inbox: mpsc::WeakSender<RoomMessage>,
        message: fn(u64) -> RoomMessage,
    ) {
        self.cancel();
        let generation = self.generation;
        self.task = Some(tokio::spawn(async move {
            sleep(delay).await;
            if let Some(inbox) = inbox.upgrade() {
                let _ = inbox.send(message(generation)).await;
            }
        }));
    }

    fn is_armed(&self) -> bool {
        self.task.is_some()
    }

    fn cancel(&mut self) {
        self.generation += 1;
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }

    fn is_current(&self, generation: u64) -> bool {
        self.generation == generation
    }
}

/// Room actor managing a single blackjack room
pub struct RoomActor {
    /// Room code
    code: String,

    /// Room configuration
    config: RoomConfig,

    /// Game state
    room: Room,

    /// Message inbox
    inbox: mpsc::Receiver<RoomMessage>,

    /// Timers post back through this without keeping the room alive
    weak_sender: mpsc::WeakSender<RoomMessage>,

    balances: Arc<dyn BalanceStore>,

    stats: Arc<dyn StatsStore>,

    /// Subscribers keyed by connection
    subscribers: HashMap<Uuid, Subscriber>,

    phase_timer: PhaseTimer,

    /// Disconnect grace timers keyed by player
    grace_timers: HashMap<PlayerId, JoinHandle<()>>,

    /// Runs while nobody is in the room
    idle_timer: PhaseTimer,

    throttle: Throttle,

    /// A broadcast was held back and the next tick should flush it
    dirty: bool,

    chat: VecDeque<ChatMessage>,

    next_chat_id: u64,

    /// Is room closed
    is_closed: bool,
}

impl RoomActor {
    /// Create a new room actor
    ///
    /// # Arguments
    ///
    /// * `code` - Room code
    /// * `config` - Room configuration
    /// * `host_id` - Creator of the room, if known
    /// * `balances` - Where settlement deltas are applied
    /// * `stats` - Where round outcomes are recorded
    ///
    /// # Returns
    ///
    /// * `(RoomActor, RoomHandle)` - Actor and handle for sending messages
    pub fn new(
        code: String,
        config: RoomConfig,
        host_id: Option<PlayerId>,
        balances: Arc<dyn BalanceStore>,
        stats: Arc<dyn StatsStore>,
    ) -> (Self, RoomHandle) {
        let (sender, inbox) = mpsc::channel(100);
        let weak_sender = sender.downgrade();

        let throttle = Throttle::new(
            Duration::from_millis(config.active_throttle_ms),
            Duration::from_millis(config.slow_throttle_ms),
        );

        let actor = Self {
            room: Room::new(code.clone(), config.rules(), host_id),
            code: code.clone(),
            config,
            inbox,
            weak_sender,
            balances,
            stats,
            subscribers: HashMap::new(),
            phase_timer: PhaseTimer::default(),
            grace_timers: HashMap::new(),
            idle_timer: PhaseTimer::default(),
            throttle,
            dirty: false,
            chat: VecDeque::new(),
            next_chat_id: 1,
            is_closed: false,
        };

        (actor, RoomHandle::new(sender, code))
    }

    /// Run the room actor event loop
    pub async fn run(mut self) {
        log::info!("Room {} opening", self.code);

        let mut tick_interval = interval(self.config.tick_interval());
        tick_interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        self.refresh_idle_timer();

        loop {
            tokio::select! {
                message = self.inbox.recv() => {
                    let Some(message) = message else {
                        break;
                    };
                    self.handle_message(message).await;

                    if self.is_closed {
                        break;
                    }
                    self.refresh_idle_timer();
                }

                _ = tick_interval.tick() => {
                    if self.dirty {
                        self.broadcast_state();
                    }
                }
            }
        }

        self.phase_timer.cancel();
        for (_, timer) in self.grace_timers.drain() {
            timer.abort();
        }
        self.idle_timer.cancel();
        log::info!("Room {} closed", self.code);
    }

    /// Handle a room message
    async fn handle_message(&mut self, message: RoomMessage) {
        match message {
            RoomMessage::Join {
                player_id,
                username,
                connection_id,
                sender,
                response,
            } => {
                let result = self
                    .handle_join(player_id, username, connection_id, sender)
                    .await;
                let _ = response.send(result);
            }

            RoomMessage::Disconnected {
                player_id,
                connection_id,
            } => self.handle_disconnect(player_id, connection_id),

            RoomMessage::Leave {
                player_id,
                response,
            } => {
                self.subscribers.retain(|_, sub| sub.player_id != player_id);
                if let Some(timer) = self.grace_timers.remove(&player_id) {
                    timer.abort();
                }
                let result = self.remove_player(player_id).await;
                let _ = response.send(result);
            }

            RoomMessage::Action {
                player_id,
                action,
                response,
            } => {
                log::debug!("Room {}: player {} -> {}", self.code, player_id, action);
                let before = self.room.status();
                let result = self.room.apply(player_id, action);
                let changed = result.is_ok() || result == Err(GameError::InsufficientDeck);
                let result = self.recover(result);
                if changed {
                    self.after_mutation(before).await;
                }
                let _ = response.send(result);
            }

            RoomMessage::SendChat {
                player_id,
                message,
                response,
            } => {
                let result = self.handle_chat(player_id, &message);
                let _ = response.send(result);
            }

            RoomMessage::GetSnapshot { response } => {
                let _ = response.send(self.room.snapshot());
            }

            RoomMessage::GetChatHistory { response } => {
                let _ = response.send(self.chat.iter().cloned().collect());
            }

            RoomMessage::PhaseTimer { generation } => self.on_phase_timer(generation).await,

            RoomMessage::GraceExpired { player_id } => self.on_grace_expired(player_id).await,

            RoomMessage::IdleExpired { generation } => {
                if !self.idle_timer.is_current(generation) {
                    return;
                }
                self.idle_timer.cancel();
                if self.is_vacant() {
                    log::info!(
                        "Room {}: empty for {:?}, closing",
                        self.code,
                        self.config.empty_room_timeout()
                    );
                    self.is_closed = true;
                }
            }

            RoomMessage::Close { response } => {
                self.is_closed = true;
                let _ = response.send(RoomResponse::Success);
            }
        }
    }

    /// Maps a game result to a response, voiding the round if the deck ran out.
    fn recover(&mut self, result: GameResult<()>) -> RoomResponse {
        match result {
            Ok(()) => RoomResponse::Success,
            Err(GameError::InsufficientDeck) => {
                self.room.abort_round();
                GameError::InsufficientDeck.into()
            }
            Err(err) => {
                log::debug!("Room {}: rejected: {}", self.code, err);
                err.into()
            }
        }
    }

    async fn handle_join(
        &mut self,
        player_id: PlayerId,
        username: String,
        connection_id: Uuid,
        sender: mpsc::Sender<RoomEvent>,
    ) -> RoomResponse {
        let before = self.room.status();
        let outcome = self.room.join(player_id, &username);
        log::debug!(
            "Room {}: connection {} joined as player {} ({:?})",
            self.code,
            connection_id,
            player_id,
            outcome
        );

        if let Some(timer) = self.grace_timers.remove(&player_id) {
            timer.abort();
            log::info!("Room {}: player {} reconnected", self.code, player_id);
        }

        // Joiners always get the current state, whatever the throttle says.
        self.send_direct(
            &sender,
            RoomEvent::ChatHistory {
                room_code: self.code.clone(),
                messages: self.chat.iter().cloned().collect(),
            },
        );
        self.send_direct(
            &sender,
            RoomEvent::GameUpdate {
                room_code: self.code.clone(),
                snapshot: Arc::new(self.room.snapshot()),
            },
        );

        self.subscribers.insert(connection_id, Subscriber { player_id, sender });
        self.after_mutation(before).await;
        RoomResponse::Success
    }

    fn handle_disconnect(&mut self, player_id: PlayerId, connection_id: Uuid) {
        if self.subscribers.remove(&connection_id).is_none() {
            return;
        }
        let still_connected = self.subscribers.values().any(|s| s.player_id == player_id);
        if still_connected || self.room.set_connected(player_id, false).is_err() {
            return;
        }

        log::info!(
            "Room {}: player {} disconnected, holding seat for {:?}",
            self.code,
            player_id,
            self.config.disconnect_grace()
        );
        self.schedule_grace(player_id);
        self.broadcast_state();
    }

    fn schedule_grace(&mut self, player_id: PlayerId) {
        if let Some(previous) = self.grace_timers.remove(&player_id) {
            previous.abort();
        }
        let inbox = self.weak_sender.clone();
        let delay = self.config.disconnect_grace();
        let timer = tokio::spawn(async move {
            sleep(delay).await;
            if let Some(inbox) = inbox.upgrade() {
                let _ = inbox.send(RoomMessage::GraceExpired { player_id }).await;
            }
        });
        self.grace_timers.insert(player_id, timer);
    }

    async fn on_grace_expired(&mut self, player_id: PlayerId) {
        self.grace_timers.remove(&player_id);
        let returned = self.subscribers.values().any(|s| s.player_id == player_id)
            || self.room.player(player_id).is_none_or(|p| p.is_connected);
        if returned {
            return;
        }
        log::info!(
            "Room {}: player {} did not return in time, removing",
            self.code,
            player_id
        );
        self.remove_player(player_id).await;
    }

    fn is_vacant(&self) -> bool {
        self.room.is_empty() && self.subscribers.is_empty()
    }

    /// Arms the idle timer while the room is vacant and cancels it otherwise.
    fn refresh_idle_timer(&mut self) {
        if !self.is_vacant() {
            if self.idle_timer.is_armed() {
                self.idle_timer.cancel();
            }
            return;
        }
        if !self.idle_timer.is_armed() {
            self.idle_timer.schedule_with(
                self.config.empty_room_timeout(),
                self.weak_sender.clone(),
                |generation| RoomMessage::IdleExpired { generation },
            );
        }
    }

    async fn remove_player(&mut self, player_id: PlayerId) -> RoomResponse {
        let before = self.room.status();
        let result = self.room.remove_player(player_id);
        if result == Err(GameError::PlayerNotFound) {
            return RoomResponse::NotInRoom;
        }
        let response = self.recover(result);
        self.after_mutation(before).await;
        response
    }

    fn handle_chat(&mut self, player_id: PlayerId, message: &str) -> RoomResponse {
        let Some(player) = self.room.player(player_id) else {
            return RoomResponse::NotInRoom;
        };
        let text = message.trim();
        if text.is_empty() {
            return RoomResponse::InvalidAction("Message can't be empty".to_string());
        }
        if text.chars().count() > MAX_CHAT_MESSAGE_CHARS {
            return RoomResponse::InvalidAction(format!(
                "Message is longer than {MAX_CHAT_MESSAGE_CHARS} characters"
            ));
        }

        let chat = ChatMessage {
            id: self.next_chat_id,
            room_code: self.code.clone(),
            player_id,
            username: player.username.clone(),
            message: text.to_string(),
            created_at: Utc::now(),
        };
        self.next_chat_id += 1;
        self.chat.push_back(chat.clone());
        while self.chat.len() > self.config.chat_history_limit {
            self.chat.pop_front();
        }
        self.notify(RoomEvent::ChatMessage(chat));
        RoomResponse::Success
    }

    // === Phases ===

    /// Arms timers and settles after any change that may have moved the phase.
    async fn after_mutation(&mut self, before: RoundStatus) {
        let status = self.room.status();
        if status != before {
            self.on_phase_entered(status).await;
        }
        self.broadcast_state();
    }

    async fn on_phase_entered(&mut self, status: RoundStatus) {
        log::debug!("Room {}: entering {}", self.code, status);
        match status {
            RoundStatus::Dealing => self.schedule_phase(self.config.shuffle_delay()),
            RoundStatus::CardDealing => self.schedule_phase(self.config.deal_delay()),
            RoundStatus::Dealer => self.schedule_phase(self.config.dealer_draw_delay()),
            RoundStatus::RoundOver => {
                self.settle_round().await;
                self.schedule_phase(self.config.round_over_delay());
            }
            RoundStatus::Betting | RoundStatus::Playing => self.phase_timer.cancel(),
        }
    }

    fn schedule_phase(&mut self, delay: Duration) {
        self.phase_timer.schedule(delay, self.weak_sender.clone());
    }

    async fn on_phase_timer(&mut self, generation: u64) {
        if !self.phase_timer.is_current(generation) {
            log::debug!("Room {}: ignoring stale timer {}", self.code, generation);
            return;
        }

        let before = self.room.status();
        let result = match before {
            RoundStatus::Dealing => self
                .room
                .start_card_dealing(Deck::shuffled())
                .and_then(|()| match self.room.status() {
                    RoundStatus::CardDealing => self.room.deal_next_card().map(|_| ()),
                    _ => Ok(()),
                }),
            RoundStatus::CardDealing => self.room.deal_next_card().map(|_| ()),
            RoundStatus::Dealer => self.room.dealer_step().map(|_| ()),
            RoundStatus::RoundOver => self.room.reset_for_next_round(),
            RoundStatus::Betting | RoundStatus::Playing => Ok(()),
        };
        if let Err(err) = result {
            if err == GameError::InsufficientDeck {
                self.room.abort_round();
            } else {
                log::warn!("Room {}: timed step failed: {}", self.code, err);
            }
        }

        let status = self.room.status();
        if status == before {
            match status {
                RoundStatus::CardDealing => self.schedule_phase(self.config.deal_delay()),
                RoundStatus::Dealer => self.schedule_phase(self.config.dealer_draw_delay()),
                _ => {}
            }
            self.broadcast_state();
        } else {
            self.after_mutation(before).await;
        }
    }

    /// Applies the round result to balances and stats, once per round.
    async fn settle_round(&mut self) {
        let result = match self.room.settle() {
            Ok(result) => result.clone(),
            Err(err) => {
                log::warn!("Room {}: settlement skipped: {}", self.code, err);
                return;
            }
        };

        for (player_id, outcome) in &result.players {
            if outcome.total_winnings != 0
                && let Err(err) = self
                    .balances
                    .apply_balance_delta(*player_id, outcome.total_winnings)
                    .await
            {
                log::error!(
                    "Room {}: failed to apply {} to player {}: {}",
                    self.code,
                    outcome.total_winnings,
                    player_id,
                    err
                );
            }
            if result.aborted {
                continue;
            }
            let username = self
                .room
                .player(*player_id)
                .map_or_else(|| format!("player{player_id}"), |p| p.username.clone());
            if let Err(err) = self
                .stats
                .record_round_outcome(
                    *player_id,
                    &username,
                    &outcome.main_hand_results,
                    &outcome.side_bet_results,
                )
                .await
            {
                log::error!(
                    "Room {}: failed to record stats for player {}: {}",
                    self.code,
                    player_id,
                    err
                );
            }
        }

        log::info!(
            "Room {}: round {} settled for {} players{}",
            self.code,
            result.round_counter,
            result.players.len(),
            if result.aborted { " (void)" } else { "" }
        );
    }

    // === Broadcasting ===

    /// Broadcasts the snapshot unless the throttle holds it back.
    fn broadcast_state(&mut self) {
        let fingerprint = self.room.fingerprint();
        let result_round = self.room.round_result().map(|r| r.round_counter);
        let now = Instant::now().into_std();

        if !self.throttle.should_emit(fingerprint, result_round, now) {
            self.dirty = true;
            return;
        }
        self.throttle.record(fingerprint, result_round, now);
        self.dirty = false;
        self.notify(RoomEvent::GameUpdate {
            room_code: self.code.clone(),
            snapshot: Arc::new(self.room.snapshot()),
        });
    }

    fn send_direct(&self, sender: &mpsc::Sender<RoomEvent>, event: RoomEvent) {
        if sender.try_send(event).is_err() {
            log::warn!("Room {}: joiner channel unavailable, dropping event", self.code);
        }
    }

    /// Broadcast an event to all subscribers
    fn notify(&mut self, event: RoomEvent) {
        let code = &self.code;
        self.subscribers.retain(|connection_id, sub| {
            match sub.sender.try_send(event.clone()) {
                Ok(_) => true,
                Err(mpsc::error::TrySendError::Full(_)) => {
                    log::warn!(
                        "Room {}: subscriber {} channel full, dropping notification",
                        code,
                        connection_id
                    );
                    true
                }
                Err(mpsc::error::TrySendError::Closed(_)) => {
                    log::debug!(
                        "Room {}: subscriber {} disconnected, removing",
                        code,
                        connection_id
                    );
                    false
                }
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        game::{BetTarget, PlayerAction},
        stats::InMemoryStatsStore,
        wallet::InMemoryBalanceStore,
    };
    use tokio::sync::oneshot;

    fn fast_config() -> RoomConfig {
        RoomConfig {
            shuffle_delay_ms: 5,
            deal_delay_ms: 1,
            dealer_draw_delay_ms: 1,
            round_over_delay_ms: 20,
            disconnect_grace_ms: 30,
            active_throttle_ms: 0,
            slow_throttle_ms: 0,
            tick_interval_ms: 5,
            ..RoomConfig::default()
        }
    }

    fn spawn_room(config: RoomConfig) -> RoomHandle {
        let (actor, handle) = RoomActor::new(
            "TESTER".to_string(),
            config,
            None,
            Arc::new(InMemoryBalanceStore::new()),
            Arc::new(InMemoryStatsStore::new()),
        );
        tokio::spawn(actor.run());
        handle
    }

    async fn join(
        handle: &RoomHandle,
        player_id: PlayerId,
    ) -> (Uuid, mpsc::Receiver<RoomEvent>, RoomResponse) {
        let (tx, rx) = mpsc::channel(256);
        let (resp_tx, resp_rx) = oneshot::channel();
        let connection_id = Uuid::new_v4();
        handle
            .send(RoomMessage::Join {
                player_id,
                username: format!("player{player_id}"),
                connection_id,
                sender: tx,
                response: resp_tx,
            })
            .await
            .unwrap();
        (connection_id, rx, resp_rx.await.unwrap())
    }

    async fn act(handle: &RoomHandle, player_id: PlayerId, action: PlayerAction) -> RoomResponse {
        let (tx, rx) = oneshot::channel();
        handle
            .send(RoomMessage::Action {
                player_id,
                action,
                response: tx,
            })
            .await
            .unwrap();
        rx.await.unwrap()
    }

    async fn snapshot(handle: &RoomHandle) -> crate::game::RoomSnapshot {
        let (tx, rx) = oneshot::channel();
        handle
            .send(RoomMessage::GetSnapshot { response: tx })
            .await
            .unwrap();
        rx.await.unwrap()
    }

    // === PhaseTimer Tests ===

    #[tokio::test]
    async fn test_phase_timer_generations() {
        let (tx, mut rx) = mpsc::channel(4);
        let mut timer = PhaseTimer::default();
        timer.schedule(Duration::from_millis(50), tx.downgrade());
        let stale = timer.generation;
        timer.schedule(Duration::from_millis(1), tx.downgrade());
        assert!(!timer.is_current(stale));

        match rx.recv().await {
            Some(RoomMessage::PhaseTimer { generation }) => assert!(timer.is_current(generation)),
            other => panic!("unexpected {other:?}"),
        }
    }

    // === Join Tests ===

    #[tokio::test]
    async fn test_join_sends_history_then_snapshot() {
        let handle = spawn_room(fast_config());
        let (_, mut rx, response) = join(&handle, 1).await;
        assert!(response.is_success());

        assert!(matches!(rx.recv().await, Some(RoomEvent::ChatHistory { .. })));
        match rx.recv().await {
            Some(RoomEvent::GameUpdate { snapshot, .. }) => {
                assert_eq!(snapshot.players.len(), 1);
                assert_eq!(snapshot.host_id, Some(1));
            }
            other => panic!("expected snapshot, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_wrong_turn_is_reported() {
        let handle = spawn_room(RoomConfig {
            shuffle_delay_ms: 60_000,
            ..fast_config()
        });
        join(&handle, 1).await;
        let response = act(&handle, 1, PlayerAction::Hit).await;
        assert!(matches!(response, RoomResponse::InvalidAction(_)));
        assert_eq!(
            act(&handle, 2, PlayerAction::LockBet).await,
            RoomResponse::NotInRoom
        );
    }

    // === Round Tests ===

    #[tokio::test]
    async fn test_locking_starts_timed_deal() {
        let handle = spawn_room(RoomConfig {
            round_over_delay_ms: 60_000,
            ..fast_config()
        });
        join(&handle, 1).await;
        act(
            &handle,
            1,
            PlayerAction::PlaceBet {
                amount: 10,
                target: BetTarget::Main,
            },
        )
        .await;
        assert!(act(&handle, 1, PlayerAction::LockBet).await.is_success());

        // the deal runs on timers; wait until cards are out
        let mut dealt = false;
        for _ in 0..100 {
            let snap = snapshot(&handle).await;
            if snap.dealer.cards.len() + snap.dealer.hidden_cards >= 2 {
                dealt = true;
                break;
            }
            sleep(Duration::from_millis(5)).await;
        }
        assert!(dealt, "cards were never dealt");
    }

    // === Chat Tests ===

    #[tokio::test]
    async fn test_chat_is_broadcast_and_kept() {
        let handle = spawn_room(fast_config());
        let (_, mut rx, _) = join(&handle, 1).await;

        let (tx, resp) = oneshot::channel();
        handle
            .send(RoomMessage::SendChat {
                player_id: 1,
                message: "  hello table  ".to_string(),
                response: tx,
            })
            .await
            .unwrap();
        assert!(resp.await.unwrap().is_success());

        let mut seen = None;
        while let Some(event) = rx.recv().await {
            if let RoomEvent::ChatMessage(msg) = event {
                seen = Some(msg);
                break;
            }
        }
        assert_eq!(seen.unwrap().message, "hello table");

        let (tx, history) = oneshot::channel();
        handle
            .send(RoomMessage::GetChatHistory { response: tx })
            .await
            .unwrap();
        assert_eq!(history.await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_chat_validation() {
        let handle = spawn_room(fast_config());
        join(&handle, 1).await;

        for (player_id, message) in [(1, "   ".to_string()), (1, "x".repeat(501)), (9, "hi".to_string())] {
            let (tx, resp) = oneshot::channel();
            handle
                .send(RoomMessage::SendChat {
                    player_id,
                    message,
                    response: tx,
                })
                .await
                .unwrap();
            assert!(!resp.await.unwrap().is_success());
        }
    }

    // === Close Tests ===

    #[tokio::test]
    async fn test_vacant_room_closes_after_timeout() {
        let handle = spawn_room(RoomConfig {
            empty_room_timeout_ms: 40,
            ..fast_config()
        });
        join(&handle, 1).await;
        sleep(Duration::from_millis(80)).await;
        assert!(!handle.is_closed());

        let (tx, rx) = oneshot::channel();
        handle
            .send(RoomMessage::Leave {
                player_id: 1,
                response: tx,
            })
            .await
            .unwrap();
        assert!(rx.await.unwrap().is_success());

        for _ in 0..100 {
            if handle.is_closed() {
                return;
            }
            sleep(Duration::from_millis(5)).await;
        }
        panic!("vacant room never closed");
    }

    #[tokio::test]
    async fn test_close_stops_actor() {
        let handle = spawn_room(fast_config());
        let (tx, rx) = oneshot::channel();
        handle
            .send(RoomMessage::Close { response: tx })
            .await
            .unwrap();
        assert!(rx.await.unwrap().is_success());
        sleep(Duration::from_millis(10)).await;
        assert_eq!(
            handle.send(RoomMessage::GetSnapshot { response: oneshot::channel().0 }).await,
            Err("Room is closed".to_string())
        );
    }
}
