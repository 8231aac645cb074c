//! A user's working session over one storage backend.
//!
//! [`Session`] owns the entity store, the drag controller, the removal
//! queue and the small bits of UI state that outlive a single event
//! (pending rename, pending delete confirmation, card being edited).
//! Operations are grouped by entity in the submodules.

mod board;
mod card;
mod column;

pub use board::{BoardDeleteRequest, DEFAULT_BOARD_TITLE, DEFAULT_COLUMN_TITLE};
pub use card::CardEdit;
pub use column::ColumnDeleteRequest;

use crate::config::Config;
use crate::drag::{DragItem, DragSession, DropOutcome, DropTarget};
use crate::error::{Result, TaskboardError};
use crate::persist::{Notice, Write};
use crate::removal::RemovalQueue;
use crate::storage::{self, BoardStorage, StorageMode};
use crate::store::EntityStore;
use crate::types::{Board, BoardId, CardId, ColumnId, UserPreferences};
use std::sync::Arc;
use tokio::sync::broadcast;
use tokio::time::Instant;
use tracing::{debug, info};

pub struct Session {
    store: EntityStore,
    drag: DragSession,
    removals: RemovalQueue,
    preferences: UserPreferences,
    /// Freshly created board whose title the UI should open for editing
    pending_rename: Option<BoardId>,
    pending_board_delete: Option<BoardDeleteRequest>,
    pending_column_delete: Option<ColumnDeleteRequest>,
    editing_card: Option<CardId>,
}

impl Session {
    /// Open the backend the configuration selects and load it
    pub async fn connect(config: &Config) -> Result<Self> {
        let storage = storage::open(config)?;
        Self::open(storage, config).await
    }

    /// Load boards and preferences and restore the last active board
    pub async fn open(storage: Arc<dyn BoardStorage>, config: &Config) -> Result<Self> {
        let preferences = storage.get_preferences().await?;
        let mut store = EntityStore::new(storage);
        store.load().await?;
        store.set_active_board(preferences.last_active_board_id.as_ref());

        info!(
            mode = ?store.storage().mode(),
            boards = store.boards().len(),
            "session opened"
        );
        Ok(Self {
            store,
            drag: DragSession::new(),
            removals: RemovalQueue::new(config.exit_delay()),
            preferences,
            pending_rename: None,
            pending_board_delete: None,
            pending_column_delete: None,
            editing_card: None,
        })
    }

    pub fn mode(&self) -> StorageMode {
        self.store.storage().mode()
    }

    pub fn store(&self) -> &EntityStore {
        &self.store
    }

    pub fn boards(&self) -> &[Board] {
        self.store.boards()
    }

    pub fn active_board(&self) -> Option<&Board> {
        self.store.active_board()
    }

    pub fn preferences(&self) -> &UserPreferences {
        &self.preferences
    }

    /// Notifications for background writes that failed
    pub fn notices(&self) -> broadcast::Receiver<Notice> {
        self.store.subscribe()
    }

    /// Wait for all background writes
    pub async fn flush(&mut self) {
        self.store.flush().await;
    }

    fn require_active(&self) -> Result<BoardId> {
        self.store
            .active_board_id()
            .cloned()
            .ok_or_else(|| TaskboardError::Validation {
                message: "no board selected".to_string(),
            })
    }

    /// Make another board active.
    ///
    /// Drag, edit and pending confirmation state belong to the old board
    /// and are dropped.
    pub fn switch_board(&mut self, id: &BoardId) -> Result<()> {
        id.validate()?;
        if self.store.board(id).is_none() {
            return Err(TaskboardError::BoardNotFound { id: id.to_string() });
        }
        self.drag.cancel(&mut self.store);
        self.editing_card = None;
        self.pending_rename = None;
        self.pending_board_delete = None;
        self.pending_column_delete = None;

        self.store.set_active_board(Some(id));
        debug!(board = %id, "switched board");
        self.remember_active_board();
        Ok(())
    }

    /// Persist the active board as the one to restore next time
    fn remember_active_board(&mut self) {
        let active = self.store.active_board_id().cloned();
        if self.preferences.last_active_board_id != active {
            self.preferences.last_active_board_id = active;
            self.save_preferences();
        }
    }

    fn save_preferences(&mut self) {
        self.store
            .dispatch(vec![Write::UpdatePreferences(self.preferences.clone())]);
    }

    pub fn select_wallpaper(&mut self, wallpaper: Option<String>) {
        self.preferences.wallpaper = wallpaper.filter(|w| !w.trim().is_empty());
        self.save_preferences();
    }

    /// Remember an uploaded wallpaper and select it
    pub fn add_custom_wallpaper(&mut self, url: &str) -> Result<()> {
        let url = url.trim();
        if url.is_empty() {
            return Err(TaskboardError::missing_field("url"));
        }
        self.preferences.add_custom_wallpaper(url);
        self.preferences.wallpaper = Some(url.to_string());
        self.save_preferences();
        Ok(())
    }

    pub fn remove_custom_wallpaper(&mut self, url: &str) -> bool {
        let removed = self.preferences.remove_custom_wallpaper(url);
        if removed {
            self.save_preferences();
        }
        removed
    }

    pub fn drag_start(&mut self, item: DragItem) -> bool {
        self.drag.start(&mut self.store, item)
    }

    pub fn drag_over(&mut self, target: Option<&DropTarget>) -> bool {
        self.drag.over(&mut self.store, target)
    }

    pub fn drag_end(&mut self, target: Option<&DropTarget>) -> DropOutcome {
        self.drag.end(&mut self.store, &mut self.removals, target)
    }

    pub fn drag_cancel(&mut self) {
        self.drag.cancel(&mut self.store);
    }

    pub fn drag(&self) -> &DragSession {
        &self.drag
    }

    pub fn removals(&self) -> &RemovalQueue {
        &self.removals
    }

    pub fn is_card_exiting(&self, id: &CardId) -> bool {
        self.removals.is_card_exiting(id)
    }

    pub fn is_column_exiting(&self, id: &ColumnId) -> bool {
        self.removals.is_column_exiting(id)
    }

    /// Remove everything whose exit delay has elapsed. Returns how many
    /// entities left the store.
    pub fn apply_due_removals(&mut self) -> usize {
        let due = self.removals.take_due(Instant::now());
        let mut removed = 0;
        for target in due {
            let board = target.board().clone();
            if self.store.mutate_board(&board, |b| target.remove_from(b)) {
                removed += 1;
            }
        }
        if removed > 0 {
            debug!(removed, "applied deferred removals");
        }
        removed
    }

    /// Sleep through pending exit delays until the queue is empty
    pub async fn settle_removals(&mut self) {
        while let Some(deadline) = self.removals.next_deadline() {
            tokio::time::sleep_until(deadline).await;
            self.apply_due_removals();
        }
    }
}
