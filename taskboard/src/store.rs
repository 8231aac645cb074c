//! The in-memory board collection and its commit protocol.
//!
//! All mutations go through an updater that receives the current snapshot
//! and returns the next one. The store swaps the new snapshot in, bumps its
//! revision and hands the difference to the background [`Writer`].

use crate::error::Result;
use crate::persist::{plan_board_list_writes, plan_board_writes, Notice, Write, Writer};
use crate::storage::BoardStorage;
use crate::types::{Board, BoardId};
use std::sync::Arc;
use tokio::sync::broadcast;
use tracing::debug;

/// Owner of the loaded boards and the active board selection
pub struct EntityStore {
    boards: Vec<Board>,
    active: Option<BoardId>,
    revision: u64,
    /// Snapshot taken by `defer_writes`; commits since then are unpersisted
    baseline: Option<Vec<Board>>,
    writer: Writer,
}

impl EntityStore {
    pub fn new(storage: Arc<dyn BoardStorage>) -> Self {
        Self {
            boards: Vec::new(),
            active: None,
            revision: 0,
            baseline: None,
            writer: Writer::new(storage),
        }
    }

    /// Load boards from the adapter, replacing whatever is held
    pub async fn load(&mut self) -> Result<()> {
        let boards = self.writer.storage().load_boards().await?;
        self.replace_all(boards);
        Ok(())
    }

    pub fn storage(&self) -> &Arc<dyn BoardStorage> {
        self.writer.storage()
    }

    /// Boards in display order
    pub fn boards(&self) -> &[Board] {
        &self.boards
    }

    pub fn board(&self, id: &BoardId) -> Option<&Board> {
        self.boards.iter().find(|b| &b.id == id)
    }

    pub fn active_board_id(&self) -> Option<&BoardId> {
        self.active.as_ref()
    }

    pub fn active_board(&self) -> Option<&Board> {
        self.active.as_ref().and_then(|id| self.board(id))
    }

    /// Incremented by every commit
    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// Replace everything without persisting (bulk load).
    pub fn replace_all(&mut self, mut boards: Vec<Board>) {
        boards.sort_by_key(|b| b.order);
        for board in &mut boards {
            board.sort();
        }
        self.boards = boards;
        self.baseline = None;
        self.revision += 1;
        let current = self.active.clone();
        self.set_active_board(current.as_ref());
        debug!(boards = self.boards.len(), "store replaced");
    }

    /// Select a board. Unknown or absent ids fall back to the first board,
    /// or to none when there are no boards. Returns the resulting selection.
    pub fn set_active_board(&mut self, id: Option<&BoardId>) -> Option<BoardId> {
        self.active = id
            .filter(|id| self.board(id).is_some())
            .cloned()
            .or_else(|| self.boards.first().map(|b| b.id.clone()));
        self.active.clone()
    }

    /// Commit a new snapshot of the active board.
    ///
    /// The updater may return `None` to signal "no change". Returns whether
    /// a commit happened.
    pub fn mutate_active_board<F, R>(&mut self, updater: F) -> bool
    where
        F: FnOnce(&Board) -> R,
        R: Into<Option<Board>>,
    {
        match self.active.clone() {
            Some(id) => self.mutate_board(&id, updater),
            None => false,
        }
    }

    /// Commit a new snapshot of a specific board; unknown ids are a no-op.
    pub fn mutate_board<F, R>(&mut self, id: &BoardId, updater: F) -> bool
    where
        F: FnOnce(&Board) -> R,
        R: Into<Option<Board>>,
    {
        let Some(idx) = self.boards.iter().position(|b| &b.id == id) else {
            return false;
        };
        let Some(next) = updater(&self.boards[idx]).into() else {
            return false;
        };
        if next == self.boards[idx] {
            return false;
        }

        let before = std::mem::replace(&mut self.boards[idx], next);
        self.revision += 1;
        debug!(board = %id, revision = self.revision, "board committed");
        if self.baseline.is_none() {
            let writes = plan_board_writes(&before, &self.boards[idx]);
            self.writer.dispatch(writes);
        }
        true
    }

    /// Commit a new board list (create, delete, reorder of boards).
    ///
    /// The active selection is revalidated afterwards.
    pub fn mutate_boards<F, R>(&mut self, updater: F) -> bool
    where
        F: FnOnce(&[Board]) -> R,
        R: Into<Option<Vec<Board>>>,
    {
        let Some(next) = updater(&self.boards).into() else {
            return false;
        };
        if next == self.boards {
            return false;
        }

        let before = std::mem::replace(&mut self.boards, next);
        self.revision += 1;
        debug!(boards = self.boards.len(), revision = self.revision, "board list committed");
        if self.baseline.is_none() {
            let writes = plan_board_list_writes(&before, &self.boards);
            self.writer.dispatch(writes);
        }
        let current = self.active.clone();
        self.set_active_board(current.as_ref());
        true
    }

    /// Hold back persistence until [`flush_deferred`](Self::flush_deferred).
    ///
    /// Calling it while already deferred keeps the first baseline.
    pub fn defer_writes(&mut self) {
        if self.baseline.is_none() {
            self.baseline = Some(self.boards.clone());
        }
    }

    pub fn is_deferred(&self) -> bool {
        self.baseline.is_some()
    }

    /// Persist everything committed since `defer_writes` as one batch
    pub fn flush_deferred(&mut self) {
        if let Some(baseline) = self.baseline.take() {
            let writes = plan_board_list_writes(&baseline, &self.boards);
            self.writer.dispatch(writes);
        }
    }

    /// Queue writes that are not derived from a board commit
    pub fn dispatch(&mut self, writes: Vec<Write>) {
        self.writer.dispatch(writes);
    }

    /// Wait until every background write has finished
    pub async fn flush(&mut self) {
        self.writer.flush().await;
    }

    /// Failed background writes
    pub fn subscribe(&self) -> broadcast::Receiver<Notice> {
        self.writer.subscribe()
    }
}
