//! Background persistence of store commits.
//!
//! A commit is turned into a batch of [`Write`]s by diffing the snapshot
//! before and after it. Each batch runs in its own spawned task, one write
//! after the other. Batches are independent of each other and nothing is
//! retried or rolled back; a failure becomes a [`Notice`].

use crate::error::{ErrorKind, Result, TaskboardError};
use crate::storage::BoardStorage;
use crate::types::{
    Board, BoardId, BoardPatch, CardId, CardPatch, CardPlacement, ColumnId, ColumnPatch,
    UserPreferences,
};
use serde::Serialize;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

/// Capacity of the notice channel; slow subscribers miss old notices
const NOTICE_CAPACITY: usize = 32;

/// A single adapter call derived from a commit
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Write {
    UpdateBoard(BoardId, BoardPatch),
    DeleteBoard(BoardId),
    ReorderBoards(Vec<BoardId>),
    UpdateColumn(ColumnId, ColumnPatch),
    DeleteColumn(ColumnId),
    ReorderColumns(BoardId, Vec<ColumnId>),
    UpdateCard(CardId, CardPatch),
    DeleteCard(CardId),
    ReorderCards(BoardId, Vec<CardPlacement>),
    UpdatePreferences(UserPreferences),
}

impl Write {
    /// Adapter operation name, used in logs and notices
    pub fn operation(&self) -> &'static str {
        match self {
            Self::UpdateBoard(..) => "update_board",
            Self::DeleteBoard(_) => "delete_board",
            Self::ReorderBoards(_) => "reorder_boards",
            Self::UpdateColumn(..) => "update_column",
            Self::DeleteColumn(_) => "delete_column",
            Self::ReorderColumns(..) => "reorder_columns",
            Self::UpdateCard(..) => "update_card",
            Self::DeleteCard(_) => "delete_card",
            Self::ReorderCards(..) => "reorder_cards",
            Self::UpdatePreferences(_) => "update_preferences",
        }
    }

    pub async fn apply(&self, storage: &dyn BoardStorage) -> Result<()> {
        match self {
            Self::UpdateBoard(id, patch) => storage.update_board(id, patch).await.map(drop),
            Self::DeleteBoard(id) => storage.delete_board(id).await,
            Self::ReorderBoards(ids) => storage.reorder_boards(ids).await,
            Self::UpdateColumn(id, patch) => storage.update_column(id, patch).await.map(drop),
            Self::DeleteColumn(id) => storage.delete_column(id).await,
            Self::ReorderColumns(board, ids) => storage.reorder_columns(board, ids).await,
            Self::UpdateCard(id, patch) => storage.update_card(id, patch).await.map(drop),
            Self::DeleteCard(id) => storage.delete_card(id).await,
            Self::ReorderCards(board, placements) => {
                storage.reorder_cards(board, placements).await
            }
            Self::UpdatePreferences(prefs) => storage.update_preferences(prefs).await.map(drop),
        }
    }
}

/// Transient notification of a failed background write
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notice {
    pub operation: String,
    pub message: String,
    pub kind: ErrorKind,
}

impl Notice {
    fn from_error(operation: &str, err: &TaskboardError) -> Self {
        Self {
            operation: operation.to_string(),
            message: err.to_string(),
            kind: err.kind(),
        }
    }
}

/// Writes that bring the backend from `before` to `after` for one board.
///
/// Columns and cards present only in `after` are assumed to exist already.
pub fn plan_board_writes(before: &Board, after: &Board) -> Vec<Write> {
    let mut writes = Vec::new();

    if before.title != after.title {
        writes.push(Write::UpdateBoard(
            after.id.clone(),
            BoardPatch {
                title: after.title.clone(),
            },
        ));
    }

    let after_columns: HashMap<&ColumnId, _> = after.columns.iter().map(|c| (&c.id, c)).collect();
    let removed_columns: HashSet<&ColumnId> = before
        .columns
        .iter()
        .map(|c| &c.id)
        .filter(|id| !after_columns.contains_key(id))
        .collect();

    for id in &removed_columns {
        writes.push(Write::DeleteColumn((*id).clone()));
    }

    let mut columns_moved = false;
    for old in &before.columns {
        let Some(new) = after_columns.get(&old.id) else {
            continue;
        };
        let patch = ColumnPatch {
            title: (old.title != new.title).then(|| new.title.clone()),
            color: (old.color != new.color).then(|| new.color.clone()),
        };
        if !patch.is_empty() {
            writes.push(Write::UpdateColumn(old.id.clone(), patch));
        }
        columns_moved |= old.order != new.order;
    }
    let surviving: Vec<&ColumnId> = before
        .columns
        .iter()
        .map(|c| &c.id)
        .filter(|id| !removed_columns.contains(id))
        .collect();
    let sequence: Vec<&ColumnId> = after
        .columns
        .iter()
        .map(|c| &c.id)
        .filter(|id| surviving.contains(id))
        .collect();
    if columns_moved || sequence != surviving {
        writes.push(Write::ReorderColumns(after.id.clone(), after.column_ids()));
    }

    let after_cards: HashMap<&CardId, _> = after.cards().map(|c| (&c.id, c)).collect();
    let mut placements = Vec::new();
    for old in before.cards() {
        match after_cards.get(&old.id) {
            None if removed_columns.contains(&old.column_id) => {}
            None => writes.push(Write::DeleteCard(old.id.clone())),
            Some(new) => {
                if old.title != new.title {
                    writes.push(Write::UpdateCard(
                        old.id.clone(),
                        CardPatch {
                            title: Some(new.title.clone()),
                        },
                    ));
                }
                if old.column_id != new.column_id || old.order != new.order {
                    placements.push(CardPlacement {
                        id: new.id.clone(),
                        column_id: new.column_id.clone(),
                        order: new.order,
                    });
                }
            }
        }
    }
    if !placements.is_empty() {
        writes.push(Write::ReorderCards(after.id.clone(), placements));
    }

    writes
}

/// Writes that bring the backend from one board list to another.
pub fn plan_board_list_writes(before: &[Board], after: &[Board]) -> Vec<Write> {
    let mut writes = Vec::new();
    let after_by_id: HashMap<&BoardId, &Board> = after.iter().map(|b| (&b.id, b)).collect();

    let mut moved = false;
    let mut surviving = Vec::new();
    for old in before {
        match after_by_id.get(&old.id) {
            None => writes.push(Write::DeleteBoard(old.id.clone())),
            Some(new) => {
                moved |= old.order != new.order;
                surviving.push(&old.id);
            }
        }
    }
    let sequence: Vec<&BoardId> = after
        .iter()
        .map(|b| &b.id)
        .filter(|id| surviving.contains(id))
        .collect();
    if moved || sequence != surviving {
        writes.push(Write::ReorderBoards(
            after.iter().map(|b| b.id.clone()).collect(),
        ));
    }

    for old in before {
        if let Some(new) = after_by_id.get(&old.id) {
            writes.extend(plan_board_writes(old, new));
        }
    }
    writes
}

/// Runs write batches in the background.
pub struct Writer {
    storage: Arc<dyn BoardStorage>,
    notices: broadcast::Sender<Notice>,
    in_flight: Vec<JoinHandle<()>>,
}

impl Writer {
    pub fn new(storage: Arc<dyn BoardStorage>) -> Self {
        let (notices, _) = broadcast::channel(NOTICE_CAPACITY);
        Self {
            storage,
            notices,
            in_flight: Vec::new(),
        }
    }

    pub fn storage(&self) -> &Arc<dyn BoardStorage> {
        &self.storage
    }

    /// Receive notices for failed writes from now on
    pub fn subscribe(&self) -> broadcast::Receiver<Notice> {
        self.notices.subscribe()
    }

    /// Spawn a task running `writes` in order. Must be called within a
    /// tokio runtime.
    pub fn dispatch(&mut self, writes: Vec<Write>) {
        self.in_flight.retain(|handle| !handle.is_finished());
        if writes.is_empty() {
            return;
        }
        debug!(
            writes = writes.len(),
            first = writes[0].operation(),
            "dispatching write batch"
        );

        let storage = Arc::clone(&self.storage);
        let notices = self.notices.clone();
        let handle = tokio::spawn(async move {
            for write in writes {
                if let Err(err) = write.apply(storage.as_ref()).await {
                    warn!(operation = write.operation(), error = %err, "background write failed");
                    // No subscribers is fine: the failure is already logged.
                    let _ = notices.send(Notice::from_error(write.operation(), &err));
                }
            }
        });
        self.in_flight.push(handle);
    }

    /// Wait for every dispatched batch to finish
    pub async fn flush(&mut self) {
        for handle in self.in_flight.drain(..) {
            if let Err(err) = handle.await {
                warn!(error = %err, "write task aborted");
            }
        }
    }

    pub fn pending(&self) -> usize {
        self.in_flight.iter().filter(|h| !h.is_finished()).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reorder;
    use crate::storage::LocalStorage;
    use crate::types::{Card, Column};
    use tempfile::TempDir;

    fn board() -> Board {
        let mut board = Board::new("Work", 0);
        board.id = BoardId::from_string("b");
        for (idx, name) in ["todo", "done"].iter().enumerate() {
            let mut column = Column::new(board.id.clone(), *name, "#111111", idx);
            column.id = ColumnId::from_string(*name);
            for order in 0..2 {
                let mut card = Card::new(column.id.clone(), format!("{name}{order}"), order);
                card.id = CardId::from_string(format!("{name}{order}"));
                column.cards.push(card);
            }
            board.columns.push(column);
        }
        board
    }

    #[test]
    fn test_unchanged_board_plans_nothing() {
        let b = board();
        assert!(plan_board_writes(&b, &b.clone()).is_empty());
    }

    #[test]
    fn test_title_and_color_changes() {
        let before = board();
        let mut after = before.clone();
        after.title = "Home".into();
        after.columns[1].color = "#222222".into();

        let writes = plan_board_writes(&before, &after);
        assert_eq!(
            writes,
            vec![
                Write::UpdateBoard("b".into(), BoardPatch { title: "Home".into() }),
                Write::UpdateColumn(
                    "done".into(),
                    ColumnPatch {
                        title: None,
                        color: Some("#222222".into())
                    }
                ),
            ]
        );
    }

    #[test]
    fn test_column_move_sends_full_order() {
        let before = board();
        let after = reorder::move_column(&before, &"done".into(), &"todo".into()).unwrap();
        let writes = plan_board_writes(&before, &after);
        assert_eq!(
            writes,
            vec![Write::ReorderColumns(
                "b".into(),
                vec!["done".into(), "todo".into()]
            )]
        );
    }

    #[test]
    fn test_column_delete_does_not_delete_its_cards_separately() {
        let before = board();
        let mut after = before.clone();
        after.columns.remove(0);
        let writes = plan_board_writes(&before, &after);
        assert_eq!(writes, vec![Write::DeleteColumn("todo".into())]);
    }

    #[test]
    fn test_card_reassign_is_one_reorder_batch() {
        let before = board();
        let after = reorder::reassign_card(
            &before,
            &"todo0".into(),
            &reorder::CardTarget::Column("done".into()),
        )
        .unwrap();
        let writes = plan_board_writes(&before, &after);
        assert_eq!(writes.len(), 1);
        let Write::ReorderCards(board, placements) = &writes[0] else {
            panic!("expected reorder_cards, got {writes:?}");
        };
        assert_eq!(board.as_str(), "b");
        assert!(placements.contains(&CardPlacement {
            id: "todo0".into(),
            column_id: "done".into(),
            order: 2
        }));
        assert!(placements.contains(&CardPlacement {
            id: "todo1".into(),
            column_id: "todo".into(),
            order: 0
        }));
    }

    #[test]
    fn test_removed_and_edited_cards() {
        let before = board();
        let mut after = before.clone();
        after.columns[0].cards.remove(1);
        after.columns[1].cards[0].title = "renamed".into();
        let writes = plan_board_writes(&before, &after);
        assert_eq!(
            writes,
            vec![
                Write::DeleteCard("todo1".into()),
                Write::UpdateCard(
                    "done0".into(),
                    CardPatch {
                        title: Some("renamed".into())
                    }
                ),
            ]
        );
    }

    #[test]
    fn test_added_entities_are_not_written() {
        let before = board();
        let mut after = before.clone();
        after.columns[0]
            .cards
            .push(Card::new("todo".into(), "fresh", 2));
        after
            .columns
            .push(Column::new("b".into(), "Later", "#333333", 2));
        assert!(plan_board_writes(&before, &after).is_empty());
    }

    #[test]
    fn test_board_delete_renumbers_survivors() {
        let boards: Vec<Board> = ["b1", "b2", "b3"]
            .iter()
            .enumerate()
            .map(|(i, id)| {
                let mut b = Board::new(*id, i);
                b.id = BoardId::from_string(*id);
                b
            })
            .collect();
        let mut after: Vec<Board> = boards
            .iter()
            .filter(|b| b.id.as_str() != "b2")
            .cloned()
            .collect();
        reorder::renumber(&mut after);

        let writes = plan_board_list_writes(&boards, &after);
        assert_eq!(
            writes,
            vec![
                Write::DeleteBoard("b2".into()),
                Write::ReorderBoards(vec!["b1".into(), "b3".into()]),
            ]
        );
    }

    #[tokio::test]
    async fn test_failed_write_becomes_notice() {
        let temp = TempDir::new().unwrap();
        let storage: Arc<dyn BoardStorage> = Arc::new(LocalStorage::new(temp.path()));
        let mut writer = Writer::new(storage);
        let mut notices = writer.subscribe();

        writer.dispatch(vec![Write::DeleteCard("missing".into())]);
        writer.flush().await;

        let notice = notices.recv().await.unwrap();
        assert_eq!(notice.operation, "delete_card");
        assert_eq!(notice.kind, ErrorKind::NotFound);
        assert_eq!(writer.pending(), 0);
    }
}
