//! Table actor implementation with async message handling.

use super::{
    config::TableConfig,
    messages::{TableMessage, TableResponse, TableSnapshot},
};
use crate::game::{
    PokerTable, TimerRequest,
    entities::{PlayerId, TableId},
};
use tokio::{
    sync::mpsc,
    time::{Duration, Instant, interval, sleep},
};

/// Inbox capacity per table.
const INBOX_CAPACITY: usize = 100;

/// How often an empty table checks whether it has been idle too long.
const IDLE_CHECK_PERIOD: Duration = Duration::from_secs(1);

/// Table actor handle for sending messages
#[derive(Clone, Debug)]
pub struct TableHandle {
    sender: mpsc::Sender<TableMessage>,
    table_id: TableId,
}

impl TableHandle {
    /// Create a new table handle
    pub fn new(sender: mpsc::Sender<TableMessage>, table_id: TableId) -> Self {
        Self { sender, table_id }
    }

    /// Get table ID
    pub fn table_id(&self) -> &TableId {
        &self.table_id
    }

    /// Whether the actor behind this handle has shut down
    pub fn is_closed(&self) -> bool {
        self.sender.is_closed()
    }

    /// Send a message to the table
    pub async fn send(&self, message: TableMessage) -> Result<(), String> {
        self.sender
            .send(message)
            .await
            .map_err(|_| "Table is closed".to_string())
    }
}

/// Table actor managing a single poker table
pub struct TableActor {
    /// Game state
    table: PokerTable,

    /// Message inbox
    inbox: mpsc::Receiver<TableMessage>,

    /// Route back into the inbox for fired timers. Weak so that timers
    /// alone never keep a table alive.
    timer_sender: mpsc::WeakSender<TableMessage>,

    /// When the last player left, if the table is empty
    empty_since: Option<Instant>,

    /// Is table closed
    is_closed: bool,
}

impl TableActor {
    /// Create a new table actor
    ///
    /// # Arguments
    ///
    /// * `id` - Table ID
    /// * `config` - Table configuration
    ///
    /// # Returns
    ///
    /// * `(TableActor, TableHandle)` - Actor and handle for sending messages
    pub fn new(id: TableId, config: TableConfig) -> (Self, TableHandle) {
        Self::from_table(PokerTable::new(id, config))
    }

    /// Wrap an existing state machine, e.g. one with a fixed shuffle seed
    pub fn from_table(table: PokerTable) -> (Self, TableHandle) {
        let (sender, inbox) = mpsc::channel(INBOX_CAPACITY);
        let handle = TableHandle::new(sender.clone(), table.id().clone());
        let actor = Self {
            table,
            inbox,
            timer_sender: sender.downgrade(),
            empty_since: Some(Instant::now()),
            is_closed: false,
        };
        (actor, handle)
    }

    /// Run the table actor event loop
    pub async fn run(mut self) {
        log::info!(
            "Table {} '{}' starting ({} blinds, {} seats)",
            self.table.id(),
            self.table.config().name,
            self.table.blinds(),
            self.table.config().max_players
        );

        let mut idle_check = interval(IDLE_CHECK_PERIOD);

        loop {
            tokio::select! {
                message = self.inbox.recv() => {
                    let Some(message) = message else {
                        break;
                    };
                    self.handle_message(message);
                    self.track_idle();

                    if self.is_closed {
                        break;
                    }
                }

                _ = idle_check.tick() => {
                    // Queued messages (a join, say) get handled before closing.
                    if self.idle_expired() && self.inbox.is_empty() {
                        log::info!(
                            "Table {} idle for {}s, closing",
                            self.table.id(),
                            self.table.config().idle_timeout_secs
                        );
                        break;
                    }
                }
            }
        }

        self.inbox.close();
        log::info!(
            "Table {} '{}' closed after {} hands",
            self.table.id(),
            self.table.config().name,
            self.table.hands_played()
        );
    }

    /// Handle a table message
    fn handle_message(&mut self, message: TableMessage) {
        match message {
            TableMessage::Join {
                player_id,
                name,
                sender,
                response,
            } => {
                let result = self.table.join(player_id, &name, Some(sender));
                let _ = response.send(self.settle(result));
            }

            TableMessage::Leave {
                player_id,
                response,
            } => {
                let result = self.table.leave(&player_id);
                let _ = response.send(self.settle(result));
            }

            TableMessage::TakeAction {
                player_id,
                action,
                response,
            } => {
                let result = self.table.act(&player_id, action);
                if let Err(error) = &result {
                    log::debug!(
                        "Table {}: {} {} refused: {}",
                        self.table.id(),
                        player_id,
                        action,
                        error
                    );
                }
                let _ = response.send(self.settle(result));
            }

            TableMessage::GetState { viewer, response } => {
                let _ = response.send(self.snapshot(viewer.as_ref()));
            }

            TableMessage::Timer(kind) => {
                let timers = self.table.on_timer(kind);
                self.arm(timers);
            }

            TableMessage::Close => {
                self.is_closed = true;
            }
        }
    }

    /// Arm any timers an accepted input produced and turn it into a reply
    fn settle(&self, result: Result<Vec<TimerRequest>, crate::game::TableError>) -> TableResponse {
        match result {
            Ok(timers) => {
                self.arm(timers);
                TableResponse::Success
            }
            Err(error) => TableResponse::Rejected(error),
        }
    }

    fn arm(&self, timers: Vec<TimerRequest>) {
        for timer in timers {
            let sender = self.timer_sender.clone();
            tokio::spawn(async move {
                sleep(timer.after).await;
                if let Some(sender) = sender.upgrade() {
                    let _ = sender.send(TableMessage::Timer(timer.kind)).await;
                }
            });
        }
    }

    fn track_idle(&mut self) {
        if self.table.is_empty() {
            self.empty_since.get_or_insert_with(Instant::now);
        } else {
            self.empty_since = None;
        }
    }

    fn idle_expired(&self) -> bool {
        self.empty_since
            .is_some_and(|since| since.elapsed() >= self.table.config().idle_timeout())
    }

    fn snapshot(&self, viewer: Option<&PlayerId>) -> TableSnapshot {
        let view = self.table.view_for(viewer);
        TableSnapshot {
            table_id: self.table.id().clone(),
            name: self.table.config().name.clone(),
            players: view.players.as_ref().clone(),
            max_players: self.table.config().max_players,
            small_blind: self.table.blinds().small,
            big_blind: self.table.blinds().big,
            pot: self.table.pot(),
            stage: self.table.stage(),
            is_active: self.table.is_active(),
            current_turn: self.table.current_player_id().cloned(),
            hands_played: self.table.hands_played(),
            chips_in_play: self.table.chips_in_play(),
            view,
        }
    }
}
