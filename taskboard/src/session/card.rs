//! Card operations on the active board

use super::Session;
use crate::error::{Result, TaskboardError};
use crate::removal::RemovalTarget;
use crate::types::{BoardId, CardId, ColumnId, NewCard};
use tracing::debug;

/// What finishing an inline edit did
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CardEdit {
    Saved,
    /// The text was empty; the card is on its way out
    Discarded,
}

impl Session {
    fn board_of_card(&self, id: &CardId) -> Result<BoardId> {
        self.store
            .active_board()
            .filter(|board| board.card(id).is_some())
            .map(|board| board.id.clone())
            .ok_or_else(|| TaskboardError::CardNotFound { id: id.to_string() })
    }

    /// Append a card to a column of the active board.
    ///
    /// Cards may start empty; an empty card opens in edit mode.
    pub async fn add_card(&mut self, column: &ColumnId, title: &str) -> Result<CardId> {
        let board_id = self.require_active()?;
        let board = self
            .store
            .board(&board_id)
            .ok_or_else(|| TaskboardError::BoardNotFound { id: board_id.to_string() })?;
        if board.column(column).is_none() {
            return Err(TaskboardError::ColumnNotFound {
                id: column.to_string(),
            });
        }

        let title = title.trim();
        let card = self
            .store
            .storage()
            .create_card(column, &NewCard::new(title))
            .await?;
        let id = card.id.clone();

        self.store.mutate_board(&board_id, |board| {
            let mut next = board.clone();
            let target = next.column_mut(column)?;
            let mut card = card;
            card.order = target.cards.len();
            target.cards.push(card);
            Some(next)
        });
        if title.is_empty() {
            self.editing_card = Some(id.clone());
        }
        debug!(card = %id, column = %column, "added card");
        Ok(id)
    }

    pub fn editing_card(&self) -> Option<&CardId> {
        self.editing_card.as_ref()
    }

    pub fn start_card_edit(&mut self, id: &CardId) -> Result<()> {
        self.board_of_card(id)?;
        self.editing_card = Some(id.clone());
        Ok(())
    }

    /// Commit the inline editor's text. Empty text removes the card.
    pub fn finish_card_edit(&mut self, id: &CardId, text: &str) -> Result<CardEdit> {
        let board_id = self.board_of_card(id)?;
        if self.editing_card.as_ref() == Some(id) {
            self.editing_card = None;
        }

        let title = text.trim();
        if title.is_empty() {
            self.removals.mark(RemovalTarget::Card {
                board: board_id,
                id: id.clone(),
            });
            return Ok(CardEdit::Discarded);
        }

        self.store.mutate_board(&board_id, |board| {
            let mut next = board.clone();
            let card = next
                .columns
                .iter_mut()
                .flat_map(|c| c.cards.iter_mut())
                .find(|c| &c.id == id)?;
            card.title = title.to_string();
            Some(next)
        });
        Ok(CardEdit::Saved)
    }

    /// Start the card's exit; it leaves the store after the exit delay
    pub fn delete_card(&mut self, id: &CardId) -> Result<()> {
        let board_id = self.board_of_card(id)?;
        if self.editing_card.as_ref() == Some(id) {
            self.editing_card = None;
        }
        self.removals.mark(RemovalTarget::Card {
            board: board_id,
            id: id.clone(),
        });
        Ok(())
    }

    /// Keep a card that is still exiting
    pub fn restore_card(&mut self, id: &CardId) -> bool {
        self.removals.cancel_card(id)
    }
}

#[cfg(test)]
mod tests {
    use crate::config::Config;
    use crate::session::{CardEdit, Session};
    use crate::storage::{BoardStorage, LocalStorage};
    use std::sync::Arc;
    use std::time::Duration;
    use tempfile::TempDir;

    async fn session() -> (TempDir, Arc<dyn BoardStorage>, Session) {
        let temp = TempDir::new().unwrap();
        let storage: Arc<dyn BoardStorage> = Arc::new(LocalStorage::new(temp.path()));
        let mut session = Session::open(Arc::clone(&storage), &Config::default())
            .await
            .unwrap();
        session.create_board(Some("Work")).await.unwrap();
        (temp, storage, session)
    }

    #[tokio::test]
    async fn test_add_card_appends() {
        let (_temp, _storage, mut session) = session().await;
        let column = session.active_board().unwrap().columns[0].id.clone();
        session.add_card(&column, "first").await.unwrap();
        let second = session.add_card(&column, " second ").await.unwrap();

        let board = session.active_board().unwrap();
        let card = board.card(&second).unwrap();
        assert_eq!(card.order, 1);
        assert_eq!(card.title, "second");
        assert!(session.editing_card().is_none());
    }

    #[tokio::test]
    async fn test_empty_card_opens_editor() {
        let (_temp, _storage, mut session) = session().await;
        let column = session.active_board().unwrap().columns[0].id.clone();
        let id = session.add_card(&column, "").await.unwrap();
        assert_eq!(session.editing_card(), Some(&id));

        assert_eq!(session.finish_card_edit(&id, "Milk").unwrap(), CardEdit::Saved);
        assert_eq!(session.active_board().unwrap().card(&id).unwrap().title, "Milk");
        assert!(session.editing_card().is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_restore_exiting_card() {
        let (_temp, _storage, mut session) = session().await;
        let column = session.active_board().unwrap().columns[0].id.clone();
        let id = session.add_card(&column, "keep").await.unwrap();

        session.delete_card(&id).unwrap();
        assert!(session.is_card_exiting(&id));
        assert!(session.restore_card(&id));

        tokio::time::advance(Duration::from_millis(500)).await;
        assert_eq!(session.apply_due_removals(), 0);
        assert!(session.active_board().unwrap().card(&id).is_some());
    }

    #[tokio::test(start_paused = true)]
    async fn test_restore_after_switching_boards() {
        let (_temp, _storage, mut session) = session().await;
        let work = session.active_board().unwrap().id.clone();
        let column = session.active_board().unwrap().columns[0].id.clone();
        let id = session.add_card(&column, "keep").await.unwrap();

        session.delete_card(&id).unwrap();
        session.create_board(Some("Home")).await.unwrap();
        assert_ne!(session.active_board().unwrap().id, work);
        assert!(session.restore_card(&id));
        assert!(!session.is_card_exiting(&id));

        tokio::time::advance(Duration::from_millis(500)).await;
        assert_eq!(session.apply_due_removals(), 0);
        let work = session.boards().iter().find(|b| b.id == work).unwrap();
        assert!(work.card(&id).is_some());
    }

    #[tokio::test]
    async fn test_add_card_to_unknown_column() {
        let (_temp, _storage, mut session) = session().await;
        let err = session.add_card(&"nope".into(), "x").await.unwrap_err();
        assert!(err.is_not_found());
    }
}
