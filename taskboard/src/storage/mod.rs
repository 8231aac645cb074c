//! Persistence adapters.
//!
//! [`BoardStorage`] is the single contract the rest of the crate talks to.
//! Two implementations exist:
//!
//! - [`RemoteStorage`]: one REST request per call, used when the user is
//!   signed in.
//! - [`LocalStorage`]: a JSON document on the device, read, modified and
//!   written back whole on every call. Used for guests.
//!
//! The adapter is picked once per session by [`open`] and never swapped.

use crate::config::Config;
use crate::error::Result;
use crate::types::{
    Board, BoardId, BoardPatch, BoardSummary, Card, CardId, CardPatch, CardPlacement, Column,
    ColumnId, ColumnPatch, NewBoard, NewCard, NewColumn, UserPreferences,
};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::info;

mod local;
mod migrate;
mod remote;

pub use local::{LocalStorage, Snapshot, SNAPSHOT_FILE_NAME};
pub use remote::RemoteStorage;

/// Which adapter a session runs on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StorageMode {
    /// Authenticated, REST backend
    Remote,
    /// Guest, on-device storage
    Local,
}

/// Operations every persistence backend provides.
#[async_trait]
pub trait BoardStorage: Send + Sync {
    /// Which backend this is (for logging and the UI badge)
    fn mode(&self) -> StorageMode;

    /// Boards without their columns, in order
    async fn list_boards(&self) -> Result<Vec<BoardSummary>>;

    /// Every board populated with columns and cards, in order
    async fn load_boards(&self) -> Result<Vec<Board>>;

    async fn get_board_details(&self, id: &BoardId) -> Result<Board>;
    async fn create_board(&self, data: &NewBoard) -> Result<Board>;
    async fn update_board(&self, id: &BoardId, patch: &BoardPatch) -> Result<Board>;

    /// Cascades to the board's columns and cards
    async fn delete_board(&self, id: &BoardId) -> Result<()>;

    /// Assign `order = index` to each listed board
    async fn reorder_boards(&self, ordered: &[BoardId]) -> Result<()>;

    async fn create_column(&self, board_id: &BoardId, data: &NewColumn) -> Result<Column>;
    async fn update_column(&self, id: &ColumnId, patch: &ColumnPatch) -> Result<Column>;

    /// Cascades to the column's cards
    async fn delete_column(&self, id: &ColumnId) -> Result<()>;

    async fn reorder_columns(&self, board_id: &BoardId, ordered: &[ColumnId]) -> Result<()>;

    async fn create_card(&self, column_id: &ColumnId, data: &NewCard) -> Result<Card>;
    async fn update_card(&self, id: &CardId, patch: &CardPatch) -> Result<Card>;
    async fn delete_card(&self, id: &CardId) -> Result<()>;

    /// Apply final column/order placements for moved cards
    async fn reorder_cards(&self, board_id: &BoardId, placements: &[CardPlacement])
        -> Result<()>;

    async fn get_preferences(&self) -> Result<UserPreferences>;
    async fn update_preferences(&self, prefs: &UserPreferences) -> Result<UserPreferences>;
}

/// Open the adapter the configuration calls for.
pub fn open(config: &Config) -> Result<Arc<dyn BoardStorage>> {
    let storage: Arc<dyn BoardStorage> = match config.mode() {
        StorageMode::Remote => Arc::new(RemoteStorage::from_config(config)?),
        StorageMode::Local => Arc::new(LocalStorage::new(&config.data_dir)),
    };
    info!(mode = ?storage.mode(), "opened board storage");
    Ok(storage)
}
