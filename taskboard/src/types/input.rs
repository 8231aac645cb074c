//! Request payloads for the persistence adapters

use super::ids::{CardId, ColumnId};
use crate::auto_color::column_color;
use crate::error::{Result, TaskboardError};
use serde::{Deserialize, Serialize};

/// Trim a title and reject it when nothing is left
pub fn require_title(field: &str, title: &str) -> Result<String> {
    let trimmed = title.trim();
    if trimmed.is_empty() {
        return Err(TaskboardError::missing_field(field));
    }
    Ok(trimmed.to_string())
}

/// Payload for creating a board
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewBoard {
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub columns: Option<Vec<NewColumn>>,
}

impl NewBoard {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            columns: None,
        }
    }

    /// Seed the board with initial columns
    pub fn with_columns(mut self, columns: Vec<NewColumn>) -> Self {
        self.columns = Some(columns);
        self
    }
}

/// Payload for creating a column
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewColumn {
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
}

impl NewColumn {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            color: None,
        }
    }

    pub fn with_color(mut self, color: impl Into<String>) -> Self {
        self.color = Some(color.into());
        self
    }

    /// The explicit color, or the palette color for the title
    pub fn resolved_color(&self) -> String {
        self.color
            .clone()
            .unwrap_or_else(|| column_color(&self.title))
    }
}

/// Payload for creating a card
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewCard {
    #[serde(default)]
    pub title: String,
}

impl NewCard {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
        }
    }
}

/// Board update
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BoardPatch {
    pub title: String,
}

/// Column update; absent fields are left alone
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ColumnPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
}

impl ColumnPatch {
    pub fn is_empty(&self) -> bool {
        self.title.is_none() && self.color.is_none()
    }
}

/// Card update; absent fields are left alone
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CardPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
}

/// Final placement of a card after a drag, one entry per moved card
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CardPlacement {
    pub id: CardId,
    pub column_id: ColumnId,
    pub order: usize,
}
