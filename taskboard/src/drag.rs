//! Drag-and-drop session state machine.
//!
//! A drag moves through `start` → any number of `over` → `end` (or
//! `cancel`). Cards hovering another column are reassigned immediately, so
//! the lists update live; settling within a column and persistence happen
//! at the end. Writes are deferred for the whole gesture and flushed once.

use crate::removal::{RemovalQueue, RemovalTarget};
use crate::reorder::{self, CardTarget};
use crate::store::EntityStore;
use crate::types::{CardId, ColumnId};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// What the pointer picked up
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "id", rename_all = "snake_case")]
pub enum DragItem {
    Card(CardId),
    Column(ColumnId),
    /// A drag this board does not own (files, text, other widgets)
    Other(String),
}

/// What the pointer is over
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "id", rename_all = "snake_case")]
pub enum DropTarget {
    Card(CardId),
    Column(ColumnId),
    DeleteZone,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum DragState {
    #[default]
    Idle,
    DraggingCard {
        card: CardId,
    },
    DraggingColumn {
        column: ColumnId,
    },
}

/// Result of releasing a drag
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DropOutcome {
    /// Nothing beyond returning to idle (hover changes may still persist)
    Nothing,
    /// Card settled at a new index in its column
    CardMoved,
    /// Card ended up in a different column on release
    CardReassigned,
    ColumnMoved,
    /// Card dropped on the delete zone; it leaves after the exit delay
    CardExiting(CardId),
}

#[derive(Debug, Default)]
pub struct DragSession {
    state: DragState,
    over_delete_zone: bool,
    /// Card whose hover last pulled the dragged card into its column; the
    /// dragged card already sits at its index
    reassigned_over: Option<CardId>,
}

impl DragSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> &DragState {
        &self.state
    }

    pub fn is_dragging(&self) -> bool {
        self.state != DragState::Idle
    }

    /// Whether the pointer is currently over the delete zone
    pub fn over_delete_zone(&self) -> bool {
        self.over_delete_zone
    }

    /// Begin a drag. Foreign items and drags while one is running are
    /// ignored. Returns whether a drag started.
    pub fn start(&mut self, store: &mut EntityStore, item: DragItem) -> bool {
        if self.is_dragging() {
            return false;
        }
        self.state = match item {
            DragItem::Card(card) => DragState::DraggingCard { card },
            DragItem::Column(column) => DragState::DraggingColumn { column },
            DragItem::Other(kind) => {
                debug!(kind, "ignoring foreign drag");
                return false;
            }
        };
        self.over_delete_zone = false;
        self.reassigned_over = None;
        store.defer_writes();
        debug!(state = ?self.state, "drag started");
        true
    }

    /// Pointer moved over `target` (or over nothing).
    ///
    /// Returns whether the store changed.
    pub fn over(&mut self, store: &mut EntityStore, target: Option<&DropTarget>) -> bool {
        self.over_delete_zone = matches!(target, Some(DropTarget::DeleteZone));

        let DragState::DraggingCard { card } = &self.state else {
            return false;
        };
        let Some(target) = target.and_then(card_target) else {
            return false;
        };
        let card = card.clone();
        let over_card = match &target {
            CardTarget::Card(id) => Some(id.clone()),
            CardTarget::Column(_) => None,
        };
        let changed =
            store.mutate_active_board(|board| reorder::reassign_card(board, &card, &target));
        if changed {
            self.reassigned_over = over_card;
        } else if self.reassigned_over != over_card {
            self.reassigned_over = None;
        }
        changed
    }

    /// Release the drag. Always returns to idle and persists the gesture's
    /// accumulated changes as one batch.
    pub fn end(
        &mut self,
        store: &mut EntityStore,
        removals: &mut RemovalQueue,
        target: Option<&DropTarget>,
    ) -> DropOutcome {
        let state = std::mem::take(&mut self.state);
        let reassigned_over = self.reassigned_over.take();
        self.over_delete_zone = false;

        let outcome = match (state, target) {
            (_, None) | (DragState::Idle, _) => DropOutcome::Nothing,
            (DragState::DraggingCard { card }, Some(DropTarget::DeleteZone)) => {
                match store.active_board() {
                    Some(board) if board.card(&card).is_some() => {
                        removals.mark(RemovalTarget::Card {
                            board: board.id.clone(),
                            id: card.clone(),
                        });
                        DropOutcome::CardExiting(card)
                    }
                    _ => DropOutcome::Nothing,
                }
            }
            (DragState::DraggingCard { .. }, Some(DropTarget::Card(over)))
                if reassigned_over.as_ref() == Some(over) =>
            {
                DropOutcome::CardReassigned
            }
            (DragState::DraggingCard { card }, Some(target)) => drop_card(store, &card, target),
            (DragState::DraggingColumn { column }, Some(target)) => {
                drop_column(store, &column, target)
            }
        };

        store.flush_deferred();
        debug!(?outcome, "drag ended");
        outcome
    }

    /// Abort the drag. Hover changes already applied are kept and persisted.
    pub fn cancel(&mut self, store: &mut EntityStore) {
        self.state = DragState::Idle;
        self.over_delete_zone = false;
        self.reassigned_over = None;
        store.flush_deferred();
    }
}

fn card_target(target: &DropTarget) -> Option<CardTarget> {
    match target {
        DropTarget::Card(id) => Some(CardTarget::Card(id.clone())),
        DropTarget::Column(id) => Some(CardTarget::Column(id.clone())),
        DropTarget::DeleteZone => None,
    }
}

fn drop_card(store: &mut EntityStore, card: &CardId, target: &DropTarget) -> DropOutcome {
    let Some(target) = card_target(target) else {
        return DropOutcome::Nothing;
    };
    if let CardTarget::Card(over) = &target {
        if store.mutate_active_board(|board| reorder::move_card(board, card, over)) {
            return DropOutcome::CardMoved;
        }
    }
    // Release without a preceding hover over the other column
    if store.mutate_active_board(|board| reorder::reassign_card(board, card, &target)) {
        return DropOutcome::CardReassigned;
    }
    DropOutcome::Nothing
}

fn drop_column(store: &mut EntityStore, column: &ColumnId, target: &DropTarget) -> DropOutcome {
    let Some(board) = store.active_board() else {
        return DropOutcome::Nothing;
    };
    let over = match target {
        DropTarget::Column(id) => id.clone(),
        DropTarget::Card(card) => match board.column_of(card) {
            Some(col) => col.id.clone(),
            None => return DropOutcome::Nothing,
        },
        DropTarget::DeleteZone => return DropOutcome::Nothing,
    };
    if store.mutate_active_board(|board| reorder::move_column(board, column, &over)) {
        DropOutcome::ColumnMoved
    } else {
        DropOutcome::Nothing
    }
}
