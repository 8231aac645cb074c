//! Deferred removal of cards and columns.
//!
//! Removing something is two-phase: it is first marked *exiting* (the UI
//! plays its exit transition) and only leaves the store once its deadline
//! has passed. The queue holds no timers of its own; the owner asks for
//! [`RemovalQueue::next_deadline`] and collects due targets with
//! [`RemovalQueue::take_due`].

use crate::types::{Board, BoardId, CardId, ColumnId};
use std::time::Duration;
use tokio::time::Instant;
use tracing::debug;

/// Something waiting to be removed, with the board it lives on
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum RemovalTarget {
    Card { board: BoardId, id: CardId },
    Column { board: BoardId, id: ColumnId },
}

impl RemovalTarget {
    pub fn board(&self) -> &BoardId {
        match self {
            Self::Card { board, .. } | Self::Column { board, .. } => board,
        }
    }

    /// The board without the target; `None` when it is already gone.
    ///
    /// Removing a column takes its cards with it. Sibling orders are left
    /// as they are.
    pub fn remove_from(&self, board: &Board) -> Option<Board> {
        let mut next = board.clone();
        match self {
            Self::Card { id, .. } => {
                let column = next.columns.iter_mut().find(|c| c.card(id).is_some())?;
                column.cards.retain(|c| &c.id != id);
            }
            Self::Column { id, .. } => {
                next.column(id)?;
                next.columns.retain(|c| &c.id != id);
            }
        }
        Some(next)
    }
}

#[derive(Debug)]
struct Pending {
    target: RemovalTarget,
    due: Instant,
}

/// Targets in their exit phase, ordered by deadline
#[derive(Debug)]
pub struct RemovalQueue {
    delay: Duration,
    pending: Vec<Pending>,
}

impl RemovalQueue {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            pending: Vec::new(),
        }
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// Start the exit phase. Marking an exiting target again keeps its
    /// original deadline.
    pub fn mark(&mut self, target: RemovalTarget) -> Instant {
        if let Some(existing) = self.pending.iter().find(|p| p.target == target) {
            return existing.due;
        }
        let due = Instant::now() + self.delay;
        debug!(?target, "marked for removal");
        self.pending.push(Pending { target, due });
        due
    }

    /// Abort the exit phase; the target stays
    pub fn cancel(&mut self, target: &RemovalTarget) -> bool {
        let before = self.pending.len();
        self.pending.retain(|p| &p.target != target);
        self.pending.len() != before
    }

    /// Abort a card's exit whichever board it is on
    pub fn cancel_card(&mut self, card: &CardId) -> bool {
        let before = self.pending.len();
        self.pending
            .retain(|p| !matches!(&p.target, RemovalTarget::Card { id, .. } if id == card));
        self.pending.len() != before
    }

    pub fn is_exiting(&self, target: &RemovalTarget) -> bool {
        self.pending.iter().any(|p| &p.target == target)
    }

    pub fn is_card_exiting(&self, card: &CardId) -> bool {
        self.pending
            .iter()
            .any(|p| matches!(&p.target, RemovalTarget::Card { id, .. } if id == card))
    }

    pub fn is_column_exiting(&self, column: &ColumnId) -> bool {
        self.pending
            .iter()
            .any(|p| matches!(&p.target, RemovalTarget::Column { id, .. } if id == column))
    }

    pub fn next_deadline(&self) -> Option<Instant> {
        self.pending.iter().map(|p| p.due).min()
    }

    /// Remove and return every target whose deadline is at or before `now`,
    /// earliest first.
    pub fn take_due(&mut self, now: Instant) -> Vec<RemovalTarget> {
        let (mut due, rest): (Vec<_>, Vec<_>) =
            self.pending.drain(..).partition(|p| p.due <= now);
        self.pending = rest;
        due.sort_by_key(|p| p.due);
        due.into_iter().map(|p| p.target).collect()
    }

    /// Drop everything pending on a board (e.g. the board itself is gone)
    pub fn forget_board(&mut self, board: &BoardId) {
        self.pending.retain(|p| p.target.board() != board);
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }
}
