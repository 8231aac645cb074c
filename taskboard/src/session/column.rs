//! Column operations on the active board

use super::Session;
use crate::error::{Result, TaskboardError};
use crate::removal::RemovalTarget;
use crate::types::{require_title, Board, BoardId, Column, ColumnId, NewColumn};
use tracing::info;

/// First phase of a column delete
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnDeleteRequest {
    pub board: BoardId,
    pub column: ColumnId,
    pub title: String,
    pub cards: usize,
}

impl Session {
    fn active_column(&self, id: &ColumnId) -> Result<(&Board, &Column)> {
        let board = self
            .store
            .active_board()
            .ok_or_else(|| TaskboardError::ColumnNotFound { id: id.to_string() })?;
        let column = board
            .column(id)
            .ok_or_else(|| TaskboardError::ColumnNotFound { id: id.to_string() })?;
        Ok((board, column))
    }

    /// Append a column to the active board.
    ///
    /// A missing color is derived from the title.
    pub async fn add_column(&mut self, title: &str, color: Option<&str>) -> Result<ColumnId> {
        let board_id = self.require_active()?;
        let mut data = NewColumn::new(require_title("title", title)?);
        if let Some(color) = color.map(str::trim).filter(|c| !c.is_empty()) {
            data = data.with_color(color);
        }

        let column = self
            .store
            .storage()
            .create_column(&board_id, &data)
            .await?;
        let id = column.id.clone();

        self.store.mutate_board(&board_id, |board| {
            let mut next = board.clone();
            let mut column = column;
            column.order = next.columns.len();
            next.columns.push(column);
            next
        });
        info!(board = %board_id, column = %id, "added column");
        Ok(id)
    }

    pub fn rename_column(&mut self, id: &ColumnId, title: &str) -> Result<()> {
        let title = require_title("title", title)?;
        self.update_column(id, |column| column.title = title)
    }

    pub fn recolor_column(&mut self, id: &ColumnId, color: &str) -> Result<()> {
        let color = require_title("color", color)?;
        self.update_column(id, |column| column.color = color)
    }

    fn update_column(&mut self, id: &ColumnId, edit: impl FnOnce(&mut Column)) -> Result<()> {
        let board_id = self.active_column(id)?.0.id.clone();
        self.store.mutate_board(&board_id, |board| {
            let mut next = board.clone();
            if let Some(column) = next.column_mut(id) {
                edit(column);
            }
            next
        });
        Ok(())
    }

    pub fn request_column_delete(&mut self, id: &ColumnId) -> Result<ColumnDeleteRequest> {
        let (board, column) = self.active_column(id)?;
        let request = ColumnDeleteRequest {
            board: board.id.clone(),
            column: column.id.clone(),
            title: column.title.clone(),
            cards: column.cards.len(),
        };
        self.pending_column_delete = Some(request.clone());
        Ok(request)
    }

    pub fn pending_column_delete(&self) -> Option<&ColumnDeleteRequest> {
        self.pending_column_delete.as_ref()
    }

    pub fn cancel_column_delete(&mut self) {
        self.pending_column_delete = None;
    }

    /// Start the column's exit; it and its cards leave the store once the
    /// exit delay has passed.
    pub fn confirm_column_delete(&mut self, request: &ColumnDeleteRequest) -> Result<()> {
        if self.pending_column_delete.as_ref() != Some(request) {
            return Err(TaskboardError::Validation {
                message: format!("column delete of {} was not requested", request.column),
            });
        }
        self.pending_column_delete = None;
        self.active_column(&request.column)?;

        self.removals.mark(RemovalTarget::Column {
            board: request.board.clone(),
            id: request.column.clone(),
        });
        info!(column = %request.column, "column delete confirmed");
        Ok(())
    }
}
