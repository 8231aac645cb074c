//! Board lifecycle: create, rename, two-phase delete, reorder

use super::Session;
use crate::error::{Result, TaskboardError};
use crate::reorder;
use crate::types::{require_title, Board, BoardId, NewBoard, NewColumn};
use tracing::info;

/// Title of a board created without one
pub const DEFAULT_BOARD_TITLE: &str = "New Board";

/// Every new board starts with this single column
pub const DEFAULT_COLUMN_TITLE: &str = "To Do";

/// First phase of a board delete, shown to the user for confirmation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BoardDeleteRequest {
    pub board: BoardId,
    pub title: String,
    /// Cards that go with it
    pub cards: usize,
}

impl Session {
    /// Create a board with one default column and make it active.
    ///
    /// The board is flagged for inline rename (see
    /// [`take_pending_rename`](Self::take_pending_rename)).
    pub async fn create_board(&mut self, title: Option<&str>) -> Result<BoardId> {
        let title = title
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .unwrap_or(DEFAULT_BOARD_TITLE);
        let data = NewBoard::new(title).with_columns(vec![NewColumn::new(DEFAULT_COLUMN_TITLE)]);

        let mut board = self.store.storage().create_board(&data).await?;
        board.sort();
        let id = board.id.clone();

        self.store.mutate_boards(|boards: &[Board]| {
            let mut next = boards.to_vec();
            board.order = next.len();
            next.push(board);
            next
        });
        self.store.set_active_board(Some(&id));
        self.remember_active_board();
        self.pending_rename = Some(id.clone());

        info!(board = %id, title, "created board");
        Ok(id)
    }

    /// Board the UI should open for title editing, once
    pub fn take_pending_rename(&mut self) -> Option<BoardId> {
        self.pending_rename.take()
    }

    pub fn rename_board(&mut self, id: &BoardId, title: &str) -> Result<()> {
        let title = require_title("title", title)?;
        if self.store.board(id).is_none() {
            return Err(TaskboardError::BoardNotFound { id: id.to_string() });
        }
        self.store.mutate_board(id, |board| Board {
            title,
            ..board.clone()
        });
        if self.pending_rename.as_ref() == Some(id) {
            self.pending_rename = None;
        }
        Ok(())
    }

    /// Ask to delete a board. Nothing changes until the request is
    /// confirmed.
    pub fn request_board_delete(&mut self, id: &BoardId) -> Result<BoardDeleteRequest> {
        let board = self
            .store
            .board(id)
            .ok_or_else(|| TaskboardError::BoardNotFound { id: id.to_string() })?;
        let request = BoardDeleteRequest {
            board: board.id.clone(),
            title: board.title.clone(),
            cards: board.cards().count(),
        };
        self.pending_board_delete = Some(request.clone());
        Ok(request)
    }

    pub fn pending_board_delete(&self) -> Option<&BoardDeleteRequest> {
        self.pending_board_delete.as_ref()
    }

    pub fn cancel_board_delete(&mut self) {
        self.pending_board_delete = None;
    }

    /// Delete the board named by a pending request.
    ///
    /// Surviving boards are renumbered and their order persisted. Returns
    /// the board that is active afterwards.
    pub fn confirm_board_delete(
        &mut self,
        request: &BoardDeleteRequest,
    ) -> Result<Option<BoardId>> {
        if self.pending_board_delete.as_ref() != Some(request) {
            return Err(TaskboardError::Validation {
                message: format!("board delete of {} was not requested", request.board),
            });
        }
        self.pending_board_delete = None;
        let id = &request.board;
        if self.store.board(id).is_none() {
            return Err(TaskboardError::BoardNotFound { id: id.to_string() });
        }

        let was_active = self.store.active_board_id() == Some(id);
        if was_active {
            self.drag.cancel(&mut self.store);
            self.editing_card = None;
            self.pending_column_delete = None;
        }
        self.removals.forget_board(id);

        self.store.mutate_boards(|boards: &[Board]| {
            let mut next: Vec<Board> = boards.iter().filter(|b| &b.id != id).cloned().collect();
            reorder::renumber(&mut next);
            next
        });
        if self.pending_rename.as_ref() == Some(id) {
            self.pending_rename = None;
        }
        self.remember_active_board();

        info!(board = %id, "deleted board");
        Ok(self.store.active_board_id().cloned())
    }

    /// Move a board onto another board's position in the list
    pub fn move_board(&mut self, active: &BoardId, over: &BoardId) -> bool {
        self.store
            .mutate_boards(|boards: &[Board]| reorder::move_board(boards, active, over))
    }
}

#[cfg(test)]
mod tests {
    use crate::config::Config;
    use crate::session::{Session, DEFAULT_COLUMN_TITLE};
    use crate::storage::{BoardStorage, LocalStorage};
    use std::sync::Arc;
    use tempfile::TempDir;

    async fn session() -> (TempDir, Arc<dyn BoardStorage>, Session) {
        let temp = TempDir::new().unwrap();
        let storage: Arc<dyn BoardStorage> = Arc::new(LocalStorage::new(temp.path()));
        let session = Session::open(Arc::clone(&storage), &Config::default())
            .await
            .unwrap();
        (temp, storage, session)
    }

    #[tokio::test]
    async fn test_create_board_defaults() {
        let (_temp, storage, mut session) = session().await;
        let id = session.create_board(None).await.unwrap();

        let board = session.active_board().unwrap();
        assert_eq!(board.id, id);
        assert_eq!(board.order, 0);
        assert_eq!(board.columns.len(), 1);
        assert_eq!(board.columns[0].title, DEFAULT_COLUMN_TITLE);
        assert_eq!(session.take_pending_rename(), Some(id.clone()));
        assert_eq!(session.take_pending_rename(), None);

        session.flush().await;
        let prefs = storage.get_preferences().await.unwrap();
        assert_eq!(prefs.last_active_board_id, Some(id));
    }

    #[tokio::test]
    async fn test_rename_rejects_blank() {
        let (_temp, _storage, mut session) = session().await;
        let id = session.create_board(Some("Work")).await.unwrap();
        let revision = session.store().revision();

        let err = session.rename_board(&id, "   ").unwrap_err();
        assert!(err.is_validation());
        assert_eq!(session.store().revision(), revision);

        session.rename_board(&id, "  Home ").unwrap();
        assert_eq!(session.active_board().unwrap().title, "Home");
    }

    #[tokio::test]
    async fn test_delete_needs_matching_request() {
        let (_temp, _storage, mut session) = session().await;
        let id = session.create_board(Some("Work")).await.unwrap();
        let request = session.request_board_delete(&id).unwrap();
        session.cancel_board_delete();

        assert!(session.confirm_board_delete(&request).is_err());
        assert_eq!(session.boards().len(), 1);
    }

    #[tokio::test]
    async fn test_move_board_persists_full_order() {
        let (_temp, storage, mut session) = session().await;
        let a = session.create_board(Some("A")).await.unwrap();
        let b = session.create_board(Some("B")).await.unwrap();
        let c = session.create_board(Some("C")).await.unwrap();

        assert!(session.move_board(&c, &a));
        assert!(!session.move_board(&c, &c));
        session.flush().await;

        let ids: Vec<_> = storage
            .list_boards()
            .await
            .unwrap()
            .into_iter()
            .map(|s| s.id)
            .collect();
        assert_eq!(ids, vec![c, a, b]);
    }
}
