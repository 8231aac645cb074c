//! Board tree types: Board, Column, Card

use super::ids::{BoardId, CardId, ColumnId};
use serde::{Deserialize, Serialize};

/// A board populated with its columns and their cards.
///
/// This is the in-memory shape the store works on and the shape the REST
/// backend returns for `GET /boards/:id`. Columns are kept sorted by `order`,
/// cards likewise within their column.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Board {
    pub id: BoardId,
    pub title: String,
    #[serde(default)]
    pub order: usize,
    #[serde(default)]
    pub columns: Vec<Column>,
}

impl Board {
    /// Create an empty board
    pub fn new(title: impl Into<String>, order: usize) -> Self {
        Self {
            id: BoardId::new(),
            title: title.into(),
            order,
            columns: Vec::new(),
        }
    }

    /// Identifiers of the columns this board owns, in display order
    pub fn column_ids(&self) -> Vec<ColumnId> {
        self.columns.iter().map(|c| c.id.clone()).collect()
    }

    pub fn column(&self, id: &ColumnId) -> Option<&Column> {
        self.columns.iter().find(|c| &c.id == id)
    }

    pub fn column_mut(&mut self, id: &ColumnId) -> Option<&mut Column> {
        self.columns.iter_mut().find(|c| &c.id == id)
    }

    /// Index of a column in display order
    pub fn column_index(&self, id: &ColumnId) -> Option<usize> {
        self.columns.iter().position(|c| &c.id == id)
    }

    pub fn card(&self, id: &CardId) -> Option<&Card> {
        self.columns.iter().find_map(|c| c.card(id))
    }

    /// Column currently holding the card
    pub fn column_of(&self, card: &CardId) -> Option<&Column> {
        self.columns.iter().find(|c| c.card(card).is_some())
    }

    /// Every card on the board
    pub fn cards(&self) -> impl Iterator<Item = &Card> {
        self.columns.iter().flat_map(|c| c.cards.iter())
    }

    /// Sort columns and cards by their `order` fields.
    ///
    /// The sort is stable so ties keep their incoming position.
    pub fn sort(&mut self) {
        self.columns.sort_by_key(|c| c.order);
        for column in &mut self.columns {
            column.cards.sort_by_key(|c| c.order);
        }
    }

    /// Summary row as returned by `GET /boards/list`
    pub fn summary(&self) -> BoardSummary {
        BoardSummary {
            id: self.id.clone(),
            title: self.title.clone(),
            order: self.order,
        }
    }
}

/// A named, colored lane within a board
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Column {
    pub id: ColumnId,
    pub board_id: BoardId,
    pub title: String,
    #[serde(default)]
    pub color: String,
    #[serde(default)]
    pub order: usize,
    #[serde(default)]
    pub cards: Vec<Card>,
}

impl Column {
    /// Create an empty column for a board
    pub fn new(
        board_id: BoardId,
        title: impl Into<String>,
        color: impl Into<String>,
        order: usize,
    ) -> Self {
        Self {
            id: ColumnId::new(),
            board_id,
            title: title.into(),
            color: color.into(),
            order,
            cards: Vec::new(),
        }
    }

    pub fn card(&self, id: &CardId) -> Option<&Card> {
        self.cards.iter().find(|c| &c.id == id)
    }

    /// Index of a card in display order
    pub fn card_index(&self, id: &CardId) -> Option<usize> {
        self.cards.iter().position(|c| &c.id == id)
    }
}

/// A single task/note item
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Card {
    pub id: CardId,
    pub column_id: ColumnId,
    /// May be empty while the card is being edited
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub order: usize,
}

impl Card {
    pub fn new(column_id: ColumnId, title: impl Into<String>, order: usize) -> Self {
        Self {
            id: CardId::new(),
            column_id,
            title: title.into(),
            order,
        }
    }
}

/// Board list entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BoardSummary {
    pub id: BoardId,
    pub title: String,
    #[serde(default)]
    pub order: usize,
}
