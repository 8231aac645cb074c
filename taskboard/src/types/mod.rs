//! Core types for the taskboard engine

mod board;
mod ids;
mod input;
mod preferences;

// Re-export all types
pub use board::{Board, BoardSummary, Card, Column};
pub use ids::{BoardId, CardId, ColumnId};
pub use input::{
    require_title, BoardPatch, CardPatch, CardPlacement, ColumnPatch, NewBoard, NewCard,
    NewColumn,
};
pub use preferences::{UserPreferences, MAX_CUSTOM_WALLPAPERS};
