//! LocalStorage - device-local persistence for guest sessions
//!
//! The whole board collection lives in one JSON document. Every call takes
//! the lock, reads the document, applies one change and writes it back
//! through a temp file, so a caller never observes a half-applied cascade.

use super::migrate;
use super::{BoardStorage, StorageMode};
use crate::error::{Result, TaskboardError};
use crate::types::{
    require_title, Board, BoardId, BoardPatch, BoardSummary, Card, CardId, CardPatch,
    CardPlacement, Column, ColumnId, ColumnPatch, NewBoard, NewCard, NewColumn, UserPreferences,
};
use async_trait::async_trait;
use fs2::FileExt;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::sync::Mutex;
use tracing::debug;

/// Name of the document inside the data directory
pub const SNAPSHOT_FILE_NAME: &str = "taskboard.json";

/// Current document layout
pub const SNAPSHOT_VERSION: u32 = 2;

fn current_version() -> u32 {
    SNAPSHOT_VERSION
}

/// Board as stored on the device: columns referenced by id
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BoardRecord {
    pub id: BoardId,
    pub title: String,
    #[serde(default)]
    pub order: usize,
    #[serde(default)]
    pub column_ids: Vec<ColumnId>,
}

/// Column as stored on the device: cards live in their own array
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ColumnRecord {
    pub id: ColumnId,
    pub board_id: BoardId,
    pub title: String,
    #[serde(default)]
    pub color: String,
    #[serde(default)]
    pub order: usize,
}

impl ColumnRecord {
    fn to_column(&self, cards: Vec<Card>) -> Column {
        Column {
            id: self.id.clone(),
            board_id: self.board_id.clone(),
            title: self.title.clone(),
            color: self.color.clone(),
            order: self.order,
            cards,
        }
    }
}

/// The persisted document
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Snapshot {
    #[serde(default = "current_version")]
    pub version: u32,
    #[serde(default)]
    pub boards: Vec<BoardRecord>,
    #[serde(default)]
    pub columns: Vec<ColumnRecord>,
    #[serde(default)]
    pub cards: Vec<Card>,
    #[serde(default)]
    pub preferences: UserPreferences,
}

impl Default for Snapshot {
    fn default() -> Self {
        Self {
            version: SNAPSHOT_VERSION,
            boards: Vec::new(),
            columns: Vec::new(),
            cards: Vec::new(),
            preferences: UserPreferences::default(),
        }
    }
}

impl Snapshot {
    fn board(&self, id: &BoardId) -> Result<&BoardRecord> {
        self.boards
            .iter()
            .find(|b| &b.id == id)
            .ok_or_else(|| TaskboardError::BoardNotFound { id: id.to_string() })
    }

    fn board_mut(&mut self, id: &BoardId) -> Result<&mut BoardRecord> {
        self.boards
            .iter_mut()
            .find(|b| &b.id == id)
            .ok_or_else(|| TaskboardError::BoardNotFound { id: id.to_string() })
    }

    fn column(&self, id: &ColumnId) -> Result<&ColumnRecord> {
        self.columns
            .iter()
            .find(|c| &c.id == id)
            .ok_or_else(|| TaskboardError::ColumnNotFound { id: id.to_string() })
    }

    fn column_mut(&mut self, id: &ColumnId) -> Result<&mut ColumnRecord> {
        self.columns
            .iter_mut()
            .find(|c| &c.id == id)
            .ok_or_else(|| TaskboardError::ColumnNotFound { id: id.to_string() })
    }

    fn card_mut(&mut self, id: &CardId) -> Result<&mut Card> {
        self.cards
            .iter_mut()
            .find(|c| &c.id == id)
            .ok_or_else(|| TaskboardError::CardNotFound { id: id.to_string() })
    }

    fn cards_of(&self, column: &ColumnId) -> Vec<Card> {
        let mut cards: Vec<Card> = self
            .cards
            .iter()
            .filter(|c| &c.column_id == column)
            .cloned()
            .collect();
        cards.sort_by_key(|c| c.order);
        cards
    }

    /// Board list in display order
    pub fn summaries(&self) -> Vec<BoardSummary> {
        let mut boards: Vec<BoardSummary> = self
            .boards
            .iter()
            .map(|b| BoardSummary {
                id: b.id.clone(),
                title: b.title.clone(),
                order: b.order,
            })
            .collect();
        boards.sort_by_key(|b| b.order);
        boards
    }

    /// Build the populated tree for one board
    pub fn assemble(&self, id: &BoardId) -> Result<Board> {
        let record = self.board(id)?;
        let position = |c: &ColumnRecord| {
            record
                .column_ids
                .iter()
                .position(|id| id == &c.id)
                .unwrap_or(usize::MAX)
        };
        let mut columns: Vec<&ColumnRecord> =
            self.columns.iter().filter(|c| &c.board_id == id).collect();
        columns.sort_by_key(|c| (c.order, position(*c)));

        Ok(Board {
            id: record.id.clone(),
            title: record.title.clone(),
            order: record.order,
            columns: columns
                .into_iter()
                .map(|c| c.to_column(self.cards_of(&c.id)))
                .collect(),
        })
    }

    /// Every board populated, in display order
    pub fn assemble_all(&self) -> Result<Vec<Board>> {
        self.summaries()
            .iter()
            .map(|s| self.assemble(&s.id))
            .collect()
    }

    fn renumber_boards(&mut self) {
        self.boards.sort_by_key(|b| b.order);
        for (idx, board) in self.boards.iter_mut().enumerate() {
            board.order = idx;
        }
    }

    fn create_board(&mut self, data: &NewBoard) -> Result<Board> {
        let title = require_title("title", &data.title)?;
        let seed = data.columns.clone().unwrap_or_default();
        let mut columns = Vec::with_capacity(seed.len());
        for column in &seed {
            columns.push((require_title("columns.title", &column.title)?, column.resolved_color()));
        }

        let board = BoardRecord {
            id: BoardId::new(),
            title,
            order: self.boards.len(),
            column_ids: Vec::new(),
        };
        let board_id = board.id.clone();
        self.boards.push(board);

        for (title, color) in columns {
            self.insert_column(&board_id, title, color)?;
        }
        self.assemble(&board_id)
    }

    fn delete_board(&mut self, id: &BoardId) -> Result<()> {
        self.board(id)?;
        self.boards.retain(|b| &b.id != id);

        let doomed: HashSet<ColumnId> = self
            .columns
            .iter()
            .filter(|c| &c.board_id == id)
            .map(|c| c.id.clone())
            .collect();
        self.columns.retain(|c| !doomed.contains(&c.id));
        self.cards.retain(|c| !doomed.contains(&c.column_id));
        self.renumber_boards();

        if self.preferences.last_active_board_id.as_ref() == Some(id) {
            self.preferences.last_active_board_id = None;
        }
        Ok(())
    }

    fn reorder_boards(&mut self, ordered: &[BoardId]) -> Result<()> {
        for id in ordered {
            self.board(id)?;
        }
        for (idx, id) in ordered.iter().enumerate() {
            self.board_mut(id)?.order = idx;
        }
        Ok(())
    }

    fn insert_column(
        &mut self,
        board_id: &BoardId,
        title: String,
        color: String,
    ) -> Result<Column> {
        let order = self
            .columns
            .iter()
            .filter(|c| &c.board_id == board_id)
            .count();
        let record = ColumnRecord {
            id: ColumnId::new(),
            board_id: board_id.clone(),
            title,
            color,
            order,
        };
        self.board_mut(board_id)?.column_ids.push(record.id.clone());
        let column = record.to_column(Vec::new());
        self.columns.push(record);
        Ok(column)
    }

    fn create_column(&mut self, board_id: &BoardId, data: &NewColumn) -> Result<Column> {
        self.board(board_id)?;
        let title = require_title("title", &data.title)?;
        self.insert_column(board_id, title, data.resolved_color())
    }

    fn update_column(&mut self, id: &ColumnId, patch: &ColumnPatch) -> Result<Column> {
        let title = patch
            .title
            .as_deref()
            .map(|t| require_title("title", t))
            .transpose()?;
        let column = self.column_mut(id)?;
        if let Some(title) = title {
            column.title = title;
        }
        if let Some(color) = &patch.color {
            column.color = color.clone();
        }
        let column = column.clone();
        Ok(column.to_column(self.cards_of(id)))
    }

    fn delete_column(&mut self, id: &ColumnId) -> Result<()> {
        let board_id = self.column(id)?.board_id.clone();
        self.columns.retain(|c| &c.id != id);
        self.cards.retain(|c| &c.column_id != id);
        if let Ok(board) = self.board_mut(&board_id) {
            board.column_ids.retain(|c| c != id);
        }
        Ok(())
    }

    fn reorder_columns(&mut self, board_id: &BoardId, ordered: &[ColumnId]) -> Result<()> {
        self.board(board_id)?;
        for id in ordered {
            if &self.column(id)?.board_id != board_id {
                return Err(TaskboardError::ColumnNotFound { id: id.to_string() });
            }
        }
        for (idx, id) in ordered.iter().enumerate() {
            self.column_mut(id)?.order = idx;
        }

        let board = self.board_mut(board_id)?;
        let mut column_ids = ordered.to_vec();
        column_ids.extend(
            board
                .column_ids
                .iter()
                .filter(|id| !ordered.contains(*id))
                .cloned(),
        );
        board.column_ids = column_ids;
        Ok(())
    }

    fn create_card(&mut self, column_id: &ColumnId, data: &NewCard) -> Result<Card> {
        self.column(column_id)?;
        let order = self
            .cards
            .iter()
            .filter(|c| &c.column_id == column_id)
            .count();
        let card = Card::new(column_id.clone(), data.title.clone(), order);
        self.cards.push(card.clone());
        Ok(card)
    }

    fn update_card(&mut self, id: &CardId, patch: &CardPatch) -> Result<Card> {
        let card = self.card_mut(id)?;
        if let Some(title) = &patch.title {
            card.title = title.clone();
        }
        Ok(card.clone())
    }

    fn delete_card(&mut self, id: &CardId) -> Result<()> {
        let before = self.cards.len();
        self.cards.retain(|c| &c.id != id);
        if self.cards.len() == before {
            return Err(TaskboardError::CardNotFound { id: id.to_string() });
        }
        Ok(())
    }

    fn reorder_cards(&mut self, board_id: &BoardId, placements: &[CardPlacement]) -> Result<()> {
        self.board(board_id)?;
        for placement in placements {
            if &self.column(&placement.column_id)?.board_id != board_id {
                return Err(TaskboardError::ColumnNotFound {
                    id: placement.column_id.to_string(),
                });
            }
            // The card must already live on this board
            let on_board = match self.cards.iter().find(|c| c.id == placement.id) {
                Some(card) => &self.column(&card.column_id)?.board_id == board_id,
                None => false,
            };
            if !on_board {
                return Err(TaskboardError::CardNotFound {
                    id: placement.id.to_string(),
                });
            }
        }
        for placement in placements {
            let card = self.card_mut(&placement.id)?;
            card.column_id = placement.column_id.clone();
            card.order = placement.order;
        }
        Ok(())
    }
}

/// Guest-mode storage backed by a JSON document in a data directory
pub struct LocalStorage {
    /// Directory holding the document and its lock file
    root: PathBuf,
    /// Serializes read-modify-write cycles within this process
    guard: Mutex<()>,
}

impl LocalStorage {
    /// Create storage rooted at the given directory
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            guard: Mutex::new(()),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Path to the document
    pub fn snapshot_path(&self) -> PathBuf {
        self.root.join(SNAPSHOT_FILE_NAME)
    }

    /// Path to the lock file
    pub fn lock_path(&self) -> PathBuf {
        self.root.join(".lock")
    }

    /// Read the document, upgrading legacy layouts.
    ///
    /// The flag is true when the stored bytes are out of date.
    pub async fn read_snapshot(&self) -> Result<(Snapshot, bool)> {
        let path = self.snapshot_path();
        if !path.exists() {
            return Ok((Snapshot::default(), false));
        }

        let content = fs::read_to_string(&path).await?;
        if content.trim().is_empty() {
            return Ok((Snapshot::default(), false));
        }
        let value: serde_json::Value = serde_json::from_str(&content)?;
        migrate::upgrade(value)
    }

    /// Write the document (atomic write via temp file)
    pub async fn write_snapshot(&self, snapshot: &Snapshot) -> Result<()> {
        let content = serde_json::to_string_pretty(snapshot)?;
        atomic_write(&self.snapshot_path(), content.as_bytes()).await
    }

    /// Try to acquire an exclusive lock (non-blocking)
    pub async fn lock(&self) -> Result<StorageLock> {
        let lock_path = self.lock_path();
        fs::create_dir_all(&self.root).await?;

        let file = std::fs::OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(true)
            .open(&lock_path)?;

        match file.try_lock_exclusive() {
            Ok(()) => Ok(StorageLock { file }),
            Err(_) => Err(TaskboardError::LockBusy),
        }
    }

    /// Read-only access; a migrated document is still written back.
    async fn inspect<T>(&self, f: impl FnOnce(&Snapshot) -> Result<T>) -> Result<T> {
        let _guard = self.guard.lock().await;
        let _lock = self.lock().await?;
        let (snapshot, upgraded) = self.read_snapshot().await?;
        if upgraded {
            self.write_snapshot(&snapshot).await?;
        }
        f(&snapshot)
    }

    /// One read-modify-write cycle. Nothing is written when `f` fails.
    async fn transact<T>(&self, op: &str, f: impl FnOnce(&mut Snapshot) -> Result<T>) -> Result<T> {
        let _guard = self.guard.lock().await;
        let _lock = self.lock().await?;
        let (mut snapshot, _) = self.read_snapshot().await?;
        let value = f(&mut snapshot)?;
        self.write_snapshot(&snapshot).await?;
        debug!(op, "local document written");
        Ok(value)
    }
}

/// RAII lock guard - releases on drop
pub struct StorageLock {
    file: std::fs::File,
}

impl Drop for StorageLock {
    fn drop(&mut self) {
        let _ = FileExt::unlock(&self.file);
    }
}

/// Atomic write via temp file and rename
async fn atomic_write(path: &Path, content: &[u8]) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).await?;
    }

    let temp_path = path.with_extension("tmp");
    fs::write(&temp_path, content).await?;
    fs::rename(&temp_path, path).await?;

    Ok(())
}

#[async_trait]
impl BoardStorage for LocalStorage {
    fn mode(&self) -> StorageMode {
        StorageMode::Local
    }

    async fn list_boards(&self) -> Result<Vec<BoardSummary>> {
        self.inspect(|s| Ok(s.summaries())).await
    }

    async fn load_boards(&self) -> Result<Vec<Board>> {
        self.inspect(Snapshot::assemble_all).await
    }

    async fn get_board_details(&self, id: &BoardId) -> Result<Board> {
        self.inspect(|s| s.assemble(id)).await
    }

    async fn create_board(&self, data: &NewBoard) -> Result<Board> {
        self.transact("create board", |s| s.create_board(data)).await
    }

    async fn update_board(&self, id: &BoardId, patch: &BoardPatch) -> Result<Board> {
        let title = require_title("title", &patch.title)?;
        self.transact("update board", |s| {
            s.board_mut(id)?.title = title;
            s.assemble(id)
        })
        .await
    }

    async fn delete_board(&self, id: &BoardId) -> Result<()> {
        self.transact("delete board", |s| s.delete_board(id)).await
    }

    async fn reorder_boards(&self, ordered: &[BoardId]) -> Result<()> {
        self.transact("reorder boards", |s| s.reorder_boards(ordered))
            .await
    }

    async fn create_column(&self, board_id: &BoardId, data: &NewColumn) -> Result<Column> {
        self.transact("create column", |s| s.create_column(board_id, data))
            .await
    }

    async fn update_column(&self, id: &ColumnId, patch: &ColumnPatch) -> Result<Column> {
        self.transact("update column", |s| s.update_column(id, patch))
            .await
    }

    async fn delete_column(&self, id: &ColumnId) -> Result<()> {
        self.transact("delete column", |s| s.delete_column(id)).await
    }

    async fn reorder_columns(&self, board_id: &BoardId, ordered: &[ColumnId]) -> Result<()> {
        self.transact("reorder columns", |s| s.reorder_columns(board_id, ordered))
            .await
    }

    async fn create_card(&self, column_id: &ColumnId, data: &NewCard) -> Result<Card> {
        self.transact("create card", |s| s.create_card(column_id, data))
            .await
    }

    async fn update_card(&self, id: &CardId, patch: &CardPatch) -> Result<Card> {
        self.transact("update card", |s| s.update_card(id, patch)).await
    }

    async fn delete_card(&self, id: &CardId) -> Result<()> {
        self.transact("delete card", |s| s.delete_card(id)).await
    }

    async fn reorder_cards(
        &self,
        board_id: &BoardId,
        placements: &[CardPlacement],
    ) -> Result<()> {
        self.transact("reorder cards", |s| s.reorder_cards(board_id, placements))
            .await
    }

    async fn get_preferences(&self) -> Result<UserPreferences> {
        self.inspect(|s| Ok(s.preferences.clone())).await
    }

    async fn update_preferences(&self, prefs: &UserPreferences) -> Result<UserPreferences> {
        let mut prefs = prefs.clone();
        prefs.normalize();
        self.transact("update preferences", |s| {
            s.preferences = prefs.clone();
            Ok(prefs)
        })
        .await
    }
}
