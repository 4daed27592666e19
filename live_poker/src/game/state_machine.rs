//! Hold'em table state machine.
//!
//! [`PokerTable`] owns every piece of per-table state and is driven by four
//! inputs: join, leave, act and timer firings. It never sleeps or spawns;
//! instead each input returns the [`TimerRequest`]s the caller has to arm.
//! Timers carry the epoch they were armed under, and a firing whose epoch no
//! longer matches is ignored.

use rand::{SeedableRng, rngs::StdRng};
use std::{sync::Arc, time::Duration};
use thiserror::Error;

use super::{
    entities::{
        Action, Blinds, Card, Chips, Deck, DeckError, GameView, Player, PlayerId, PlayerView,
        TableId, display_name,
    },
    functional::{HandStrength, argmax, eval},
    states::Stage,
};
use crate::{
    net::messages::{GameOverReason, MessageSender, ServerMessage},
    table::config::TableConfig,
};

/// Reasons an input is refused. A refused input never changes table state.
#[derive(Clone, Debug, Eq, Error, PartialEq)]
pub enum TableError {
    #[error("not your turn")]
    NotYourTurn,
    #[error("not seated at this table")]
    NotSeated,
    #[error("illegal raise to {amount}")]
    InvalidRaise { amount: Chips },
    #[error("no hand in progress")]
    NoHandInProgress,
    #[error("table is full")]
    TableFull,
}

/// Scheduled inputs, tagged with the epoch they were armed under.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum TimerKind {
    /// The current player ran out of time.
    Turn { epoch: u64 },
    /// A pending hand start or restart is due.
    StartHand { epoch: u64 },
}

/// Ask the owner of the table to deliver `kind` back after `after`.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct TimerRequest {
    pub kind: TimerKind,
    pub after: Duration,
}

pub struct PokerTable {
    id: TableId,
    config: TableConfig,
    deck: Deck,
    rng: StdRng,
    players: Vec<Player>,
    pot: Chips,
    board: Vec<Card>,
    stage: Stage,
    current_turn: usize,
    min_bet: Chips,
    blinds: Blinds,
    is_active: bool,
    /// Unix milliseconds.
    turn_started_at: i64,
    turn_epoch: u64,
    hand_epoch: u64,
    start_pending: bool,
    hands_played: u64,
}

impl PokerTable {
    #[must_use]
    pub fn new(id: TableId, config: TableConfig) -> Self {
        Self::with_rng(id, config, StdRng::from_os_rng())
    }

    /// Table with a deterministic shuffle sequence.
    #[must_use]
    pub fn with_seed(id: TableId, config: TableConfig, seed: u64) -> Self {
        Self::with_rng(id, config, StdRng::seed_from_u64(seed))
    }

    fn with_rng(id: TableId, config: TableConfig, rng: StdRng) -> Self {
        let blinds = config.blinds();
        Self {
            id,
            config,
            deck: Deck::default(),
            rng,
            players: Vec::new(),
            pot: 0,
            board: Vec::with_capacity(5),
            stage: Stage::PreFlop,
            current_turn: 0,
            min_bet: 0,
            blinds,
            is_active: false,
            turn_started_at: 0,
            turn_epoch: 0,
            hand_epoch: 0,
            start_pending: false,
            hands_played: 0,
        }
    }

    // === Accessors ===

    #[must_use]
    pub fn id(&self) -> &TableId {
        &self.id
    }

    #[must_use]
    pub fn config(&self) -> &TableConfig {
        &self.config
    }

    #[must_use]
    pub fn players(&self) -> &[Player] {
        &self.players
    }

    #[must_use]
    pub fn player(&self, id: &PlayerId) -> Option<&Player> {
        self.players.iter().find(|p| &p.id == id)
    }

    #[must_use]
    pub fn pot(&self) -> Chips {
        self.pot
    }

    #[must_use]
    pub fn board(&self) -> &[Card] {
        &self.board
    }

    #[must_use]
    pub fn stage(&self) -> Stage {
        self.stage
    }

    #[must_use]
    pub fn min_bet(&self) -> Chips {
        self.min_bet
    }

    #[must_use]
    pub fn blinds(&self) -> Blinds {
        self.blinds
    }

    #[must_use]
    pub fn is_active(&self) -> bool {
        self.is_active
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.players.is_empty()
    }

    #[must_use]
    pub fn is_start_pending(&self) -> bool {
        self.start_pending
    }

    #[must_use]
    pub fn hands_played(&self) -> u64 {
        self.hands_played
    }

    /// Index of the seat whose turn it is, while a hand is running.
    #[must_use]
    pub fn current_turn(&self) -> Option<usize> {
        (self.is_active && self.current_turn < self.players.len()).then_some(self.current_turn)
    }

    #[must_use]
    pub fn current_player_id(&self) -> Option<&PlayerId> {
        self.current_turn().map(|idx| &self.players[idx].id)
    }

    /// Chips on the table: the pot plus every seated stack.
    #[must_use]
    pub fn chips_in_play(&self) -> Chips {
        self.pot + self.players.iter().map(|p| p.balance).sum::<Chips>()
    }

    // === Inputs ===

    /// Seat a player, or re-attach a returning player's connection.
    ///
    /// # Arguments
    ///
    /// * `id` - Verified identity of the joining player
    /// * `name` - Display name, clipped before use
    /// * `sender` - Outbound queue for this player's connection
    ///
    /// # Returns
    ///
    /// * `Ok(Vec<TimerRequest>)` - Timers to arm (a pending hand start)
    /// * `Err(TableError::TableFull)` - No free seat
    pub fn join(
        &mut self,
        id: PlayerId,
        name: &str,
        sender: Option<MessageSender>,
    ) -> Result<Vec<TimerRequest>, TableError> {
        if let Some(player) = self.players.iter_mut().find(|p| p.id == id) {
            if let Some(sender) = sender {
                player.attach(sender);
            }
            log::info!("Table {}: {} reconnected", self.id, id);
            self.broadcast_state();
            return Ok(Vec::new());
        }

        if self.players.len() >= self.config.max_players {
            log::warn!(
                "Table {}: {} turned away, all {} seats taken",
                self.id,
                id,
                self.config.max_players
            );
            return Err(TableError::TableFull);
        }

        let player = Player::new(id, display_name(name), self.config.starting_stack, sender);
        log::info!(
            "Table {}: {} ({}) sat down with {}",
            self.id,
            player.name,
            player.id,
            player.balance
        );
        let summary = player.summary();
        self.players.push(player);
        self.broadcast(ServerMessage::PlayerJoined { player: summary });

        let timers = self
            .schedule_start(self.config.start_delay(), true)
            .into_iter()
            .collect();
        self.broadcast_state();
        Ok(timers)
    }

    /// Remove a player's seat. Their remaining stack leaves with them and
    /// anything they already put in stays in the pot.
    pub fn leave(&mut self, id: &PlayerId) -> Result<Vec<TimerRequest>, TableError> {
        let idx = self.seat_of(id).ok_or(TableError::NotSeated)?;
        let was_turn = self.is_active && idx == self.current_turn;
        let removed = self.players.remove(idx);
        log::info!(
            "Table {}: {} left with {}",
            self.id,
            removed.id,
            removed.balance
        );
        self.broadcast(ServerMessage::PlayerLeft {
            player_id: removed.id,
        });

        let timers = if !self.is_active {
            if self.players.len() < 2 && self.start_pending {
                self.start_pending = false;
                self.hand_epoch += 1;
                log::info!("Table {}: pending start cancelled", self.id);
            }
            Vec::new()
        } else {
            if idx < self.current_turn {
                self.current_turn -= 1;
            }
            if self.players.len() < 2 {
                self.abandon_hand();
                Vec::new()
            } else if self.active_count() == 1 {
                self.finish_fold_out()
            } else if was_turn {
                // Resume the search from the seat just before the vacated one.
                self.current_turn = idx
                    .checked_sub(1)
                    .unwrap_or(self.players.len() - 1)
                    .min(self.players.len() - 1);
                self.advance_turn()
            } else {
                Vec::new()
            }
        };

        self.broadcast_state();
        Ok(timers)
    }

    /// Apply a betting action from `id`.
    ///
    /// # Returns
    ///
    /// * `Ok(Vec<TimerRequest>)` - Action applied; arm these timers
    /// * `Err(TableError)` - Action refused, nothing changed
    pub fn act(&mut self, id: &PlayerId, action: Action) -> Result<Vec<TimerRequest>, TableError> {
        let idx = self.seat_of(id).ok_or(TableError::NotSeated)?;
        if !self.is_active {
            return Err(TableError::NoHandInProgress);
        }
        if idx != self.current_turn {
            log::debug!(
                "Table {}: {} tried to act out of turn",
                self.id,
                self.players[idx].id
            );
            return Err(TableError::NotYourTurn);
        }

        let timers = self.apply_action(idx, action)?;
        self.broadcast_state();
        Ok(timers)
    }

    /// Handle a timer armed earlier. Stale timers do nothing.
    pub fn on_timer(&mut self, kind: TimerKind) -> Vec<TimerRequest> {
        match kind {
            TimerKind::Turn { epoch } => {
                if epoch != self.turn_epoch || !self.is_active {
                    log::trace!("Table {}: stale turn timer {epoch}", self.id);
                    return Vec::new();
                }
                let idx = self.current_turn;
                log::info!(
                    "Table {}: {} timed out and folds",
                    self.id,
                    self.players[idx].id
                );
                let timers = match self.apply_action(idx, Action::Fold) {
                    Ok(timers) => timers,
                    Err(error) => {
                        log::error!("Table {}: timeout fold refused: {error}", self.id);
                        Vec::new()
                    }
                };
                self.broadcast_state();
                timers
            }
            TimerKind::StartHand { epoch } => {
                if epoch != self.hand_epoch || !self.start_pending {
                    log::trace!("Table {}: stale start timer {epoch}", self.id);
                    return Vec::new();
                }
                self.start_pending = false;
                if self.is_active {
                    return Vec::new();
                }
                if self.funded_count() < 2 {
                    log::info!("Table {}: not enough funded players to deal", self.id);
                    self.broadcast_state();
                    return Vec::new();
                }
                let timers = self.start_hand();
                self.broadcast_state();
                timers
            }
        }
    }

    // === Views ===

    /// The table as `viewer` sees it, or as an outsider when `viewer` is
    /// not seated.
    #[must_use]
    pub fn view_for(&self, viewer: Option<&PlayerId>) -> GameView {
        let community_cards = Arc::new(self.board.clone());
        let players = Arc::new(self.player_views());
        let my_hand = viewer
            .and_then(|id| self.player(id))
            .map(|p| p.cards.clone())
            .unwrap_or_default();
        self.view_with(community_cards, players, my_hand)
    }

    fn player_views(&self) -> Vec<PlayerView> {
        let turn = self.current_turn();
        self.players
            .iter()
            .enumerate()
            .map(|(idx, p)| PlayerView {
                id: p.id.clone(),
                name: p.name.clone(),
                balance: p.balance,
                current_bet: p.current_bet,
                is_active: p.is_active,
                is_turn: turn == Some(idx),
            })
            .collect()
    }

    fn view_with(
        &self,
        community_cards: Arc<Vec<Card>>,
        players: Arc<Vec<PlayerView>>,
        my_hand: Vec<Card>,
    ) -> GameView {
        GameView {
            table_id: self.id.clone(),
            pot: self.pot,
            community_cards,
            players,
            my_hand,
            current_turn: self.current_player_id().cloned(),
            min_bet: self.min_bet,
            small_blind: self.blinds.small,
            big_blind: self.blinds.big,
            stage: self.stage,
            turn_start_time: self.turn_started_at,
            is_active: self.is_active,
        }
    }

    /// Send every seat its own view. Shared parts are built once.
    pub fn broadcast_state(&self) {
        let community_cards = Arc::new(self.board.clone());
        let players = Arc::new(self.player_views());
        for player in &self.players {
            let view = self.view_with(
                Arc::clone(&community_cards),
                Arc::clone(&players),
                player.cards.clone(),
            );
            player.send(ServerMessage::GameState(view));
        }
    }

    fn broadcast(&self, message: ServerMessage) {
        for player in &self.players {
            player.send(message.clone());
        }
    }

    // === Hand flow ===

    fn seat_of(&self, id: &PlayerId) -> Option<usize> {
        self.players.iter().position(|p| &p.id == id)
    }

    fn active_count(&self) -> usize {
        self.players.iter().filter(|p| p.is_active).count()
    }

    fn funded_count(&self) -> usize {
        self.players.iter().filter(|p| p.balance > 0).count()
    }

    fn schedule_start(&mut self, after: Duration, announce: bool) -> Option<TimerRequest> {
        if self.is_active || self.start_pending || self.funded_count() < 2 {
            return None;
        }
        self.start_pending = true;
        self.hand_epoch += 1;
        if announce {
            let delay_seconds = after.as_secs();
            self.broadcast(ServerMessage::GameStarting {
                delay_seconds,
                message: format!("Game starting in {delay_seconds} seconds..."),
            });
        }
        log::debug!(
            "Table {}: next hand in {}s (epoch {})",
            self.id,
            after.as_secs(),
            self.hand_epoch
        );
        Some(TimerRequest {
            kind: TimerKind::StartHand {
                epoch: self.hand_epoch,
            },
            after,
        })
    }

    fn start_hand(&mut self) -> Vec<TimerRequest> {
        self.deck.reset();
        self.deck.shuffle(&mut self.rng);
        self.board.clear();
        self.pot = 0;
        self.min_bet = 0;
        self.stage = Stage::PreFlop;
        for player in &mut self.players {
            player.reset();
            if player.balance > 0 {
                player.is_active = true;
            } else {
                player.sitting_out = true;
            }
        }

        if let Err(error) = self.deal_hole_cards() {
            return self.abort_hand(error);
        }

        let dealt: Vec<usize> = (0..self.players.len())
            .filter(|&idx| self.players[idx].is_active)
            .collect();
        let (sb, bb) = (dealt[0], dealt[1]);
        self.pot += self.players[sb].commit(self.blinds.small);
        self.pot += self.players[bb].commit(self.blinds.big);
        self.min_bet = self.blinds.big;
        self.is_active = true;
        self.hands_played += 1;
        metrics::counter!("hands_played_total").increment(1);
        log::info!(
            "Table {}: hand #{} dealt to {} players, blinds {} by {} and {}",
            self.id,
            self.hands_played,
            dealt.len(),
            self.blinds,
            self.players[sb].id,
            self.players[bb].id
        );

        self.current_turn = bb;
        self.advance_turn()
    }

    fn deal_hole_cards(&mut self) -> Result<(), DeckError> {
        for _ in 0..2 {
            for idx in 0..self.players.len() {
                if self.players[idx].is_active {
                    let card = self.deck.draw()?;
                    self.players[idx].cards.push(card);
                }
            }
        }
        Ok(())
    }

    fn apply_action(&mut self, idx: usize, action: Action) -> Result<Vec<TimerRequest>, TableError> {
        let min_bet = self.min_bet;
        let player = &mut self.players[idx];
        match action {
            Action::Fold => {
                player.is_active = false;
            }
            Action::CallCheck => {
                let owed = min_bet.saturating_sub(player.current_bet);
                self.pot += player.commit(owed);
            }
            Action::RaiseTo(amount) => {
                let added = amount.saturating_sub(player.current_bet);
                if amount < min_bet || added == 0 || added > player.balance {
                    return Err(TableError::InvalidRaise { amount });
                }
                self.pot += player.commit(added);
                self.min_bet = amount;
            }
        }
        player.has_acted = true;
        log::info!("Table {}: {} {}", self.id, player.id, action);

        // A raise-to that only matches the current bet does not reopen action.
        if matches!(action, Action::RaiseTo(amount) if amount > min_bet) {
            for (other, p) in self.players.iter_mut().enumerate() {
                if other != idx {
                    p.has_acted = false;
                }
            }
        }
        Ok(self.advance_turn())
    }

    /// Every seat that can still bet has acted since the last raise and
    /// matched it.
    fn round_closed(&self) -> bool {
        self.players
            .iter()
            .filter(|p| p.can_act())
            .all(|p| p.has_acted && p.current_bet == self.min_bet)
    }

    fn advance_turn(&mut self) -> Vec<TimerRequest> {
        self.turn_epoch += 1;

        match self.active_count() {
            0 => {
                self.abandon_hand();
                return Vec::new();
            }
            1 => return self.finish_fold_out(),
            _ => {}
        }

        if self.round_closed() {
            return self.advance_stage();
        }

        let n = self.players.len();
        let next = (1..=n)
            .map(|offset| (self.current_turn + offset) % n)
            .find(|&idx| {
                let p = &self.players[idx];
                p.can_act() && (!p.has_acted || p.current_bet < self.min_bet)
            });
        match next {
            Some(idx) => {
                self.current_turn = idx;
                vec![self.arm_turn_timer()]
            }
            None => self.advance_stage(),
        }
    }

    fn arm_turn_timer(&mut self) -> TimerRequest {
        self.turn_started_at = chrono::Utc::now().timestamp_millis();
        let player_id = self.players[self.current_turn].id.clone();
        self.broadcast(ServerMessage::TurnChange {
            player_id,
            time_left: self.config.action_timeout_secs,
        });
        TimerRequest {
            kind: TimerKind::Turn {
                epoch: self.turn_epoch,
            },
            after: self.config.action_timeout(),
        }
    }

    fn advance_stage(&mut self) -> Vec<TimerRequest> {
        loop {
            for player in &mut self.players {
                player.current_bet = 0;
                player.has_acted = false;
            }
            self.min_bet = 0;
            self.stage = self.stage.next();
            if self.stage == Stage::Showdown {
                return self.showdown();
            }

            while self.board.len() < self.stage.board_len() {
                match self.deck.draw() {
                    Ok(card) => self.board.push(card),
                    Err(error) => return self.abort_hand(error),
                }
            }
            log::debug!(
                "Table {}: {} [{}]",
                self.id,
                self.stage,
                self.board
                    .iter()
                    .map(ToString::to_string)
                    .collect::<Vec<_>>()
                    .join(" ")
            );

            if self.players.iter().filter(|p| p.can_act()).count() >= 2 {
                if let Some(first) = self.players.iter().position(Player::can_act) {
                    self.current_turn = first;
                    return vec![self.arm_turn_timer()];
                }
            }
        }
    }

    fn showdown(&mut self) -> Vec<TimerRequest> {
        let mut contenders: Vec<(usize, HandStrength)> = Vec::new();
        for (idx, player) in self.players.iter().enumerate() {
            if !player.is_active {
                continue;
            }
            match eval(&player.cards, &self.board) {
                Ok(strength) => contenders.push((idx, strength)),
                Err(error) => {
                    log::error!("Table {}: can't score {}: {error}", self.id, player.id);
                }
            }
        }

        let strengths: Vec<HandStrength> = contenders.iter().map(|(_, s)| s.clone()).collect();
        let Some(best) = argmax(&strengths) else {
            return self.abort_hand(DeckError::EmptyDeck);
        };
        let (winner, strength) = &contenders[best];
        let hand = strength.to_string();
        let amount = self.award(*winner);
        log::info!(
            "Table {}: {} wins {} at showdown with {}",
            self.id,
            self.players[*winner].id,
            amount,
            hand
        );
        self.broadcast(ServerMessage::GameOver {
            winner_id: self.players[*winner].id.clone(),
            amount,
            reason: None,
            hand: Some(hand),
        });
        self.end_hand(self.config.showdown_restart())
    }

    fn finish_fold_out(&mut self) -> Vec<TimerRequest> {
        let Some(winner) = self.players.iter().position(|p| p.is_active) else {
            self.abandon_hand();
            return Vec::new();
        };
        let amount = self.award(winner);
        log::info!(
            "Table {}: {} wins {} uncontested",
            self.id,
            self.players[winner].id,
            amount
        );
        self.broadcast(ServerMessage::GameOver {
            winner_id: self.players[winner].id.clone(),
            amount,
            reason: Some(GameOverReason::Fold),
            hand: None,
        });
        self.end_hand(self.config.fold_restart())
    }

    /// Move the whole pot to `winner`. Returns the amount moved.
    fn award(&mut self, winner: usize) -> Chips {
        let amount = self.pot;
        self.players[winner].balance += amount;
        self.pot = 0;
        amount
    }

    fn end_hand(&mut self, restart_after: Duration) -> Vec<TimerRequest> {
        self.is_active = false;
        self.turn_epoch += 1;
        self.schedule_start(restart_after, false)
            .into_iter()
            .collect()
    }

    /// Fewer than two seats are left mid-hand. Whoever remains takes the pot.
    fn abandon_hand(&mut self) {
        if let Some(remaining) = self.players.first() {
            let winner_id = remaining.id.clone();
            let amount = self.award(0);
            log::info!(
                "Table {}: hand abandoned, {} collects {}",
                self.id,
                winner_id,
                amount
            );
            self.broadcast(ServerMessage::GameOver {
                winner_id,
                amount,
                reason: Some(GameOverReason::Abandoned),
                hand: None,
            });
        } else {
            log::info!(
                "Table {}: hand abandoned by everyone, {} chips forfeited",
                self.id,
                self.pot
            );
            self.pot = 0;
        }
        self.is_active = false;
        self.turn_epoch += 1;
    }

    /// The hand can't continue. Everyone gets back what they put in.
    fn abort_hand(&mut self, error: DeckError) -> Vec<TimerRequest> {
        log::error!("Table {}: hand aborted: {error}", self.id);
        for player in &mut self.players {
            player.balance += player.hand_contribution;
            player.hand_contribution = 0;
            player.current_bet = 0;
            player.cards.clear();
            player.is_active = false;
        }
        self.pot = 0;
        self.board.clear();
        self.is_active = false;
        self.turn_epoch += 1;
        self.broadcast(ServerMessage::error("Hand aborted, bets refunded"));
        self.schedule_start(self.config.start_delay(), true)
            .into_iter()
            .collect()
    }
}
