//! Reordering of boards, columns and cards.
//!
//! Every function here is pure: it takes a snapshot and returns a new one
//! (or `None` when the move is a no-op). Sibling `order` values are always
//! renumbered to `0..N-1` afterwards.

use crate::types::{Board, BoardId, Card, CardId, Column, ColumnId};

/// Where a dragged card is headed
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CardTarget {
    /// Drop onto a column: append at its end
    Column(ColumnId),
    /// Drop onto another card: take that card's index
    Card(CardId),
}

/// Anything that carries a sibling `order`
pub trait Ordered {
    fn set_order(&mut self, order: usize);
}

impl Ordered for Board {
    fn set_order(&mut self, order: usize) {
        self.order = order;
    }
}

impl Ordered for Column {
    fn set_order(&mut self, order: usize) {
        self.order = order;
    }
}

impl Ordered for Card {
    fn set_order(&mut self, order: usize) {
        self.order = order;
    }
}

/// Remove the element at `from` and insert it at `to`.
///
/// Out-of-range indices leave the slice untouched; `to` past the end
/// appends.
pub fn move_to_index<T>(items: &mut Vec<T>, from: usize, to: usize) {
    if from >= items.len() || from == to {
        return;
    }
    let item = items.remove(from);
    let to = to.min(items.len());
    items.insert(to, item);
}

/// Assign `order = index`
pub fn renumber<T: Ordered>(items: &mut [T]) {
    for (idx, item) in items.iter_mut().enumerate() {
        item.set_order(idx);
    }
}

/// Move a column onto the position of another column.
pub fn move_column(board: &Board, active: &ColumnId, over: &ColumnId) -> Option<Board> {
    if active == over {
        return None;
    }
    let from = board.column_index(active)?;
    let to = board.column_index(over)?;

    let mut next = board.clone();
    move_to_index(&mut next.columns, from, to);
    renumber(&mut next.columns);
    Some(next)
}

/// Settle a card onto the index of another card in the same column.
///
/// Cross-column targets go through [`reassign_card`].
pub fn move_card(board: &Board, active: &CardId, over: &CardId) -> Option<Board> {
    if active == over {
        return None;
    }
    let column = board.column_of(active)?;
    let from = column.card_index(active)?;
    let to = column.card_index(over)?;
    let column_id = column.id.clone();

    let mut next = board.clone();
    let column = next.column_mut(&column_id)?;
    move_to_index(&mut column.cards, from, to);
    renumber(&mut column.cards);
    Some(next)
}

/// Move a card into a different column.
///
/// A column target appends; a card target inserts at that card's index.
/// Returns `None` when the target is in the card's own column or unknown.
pub fn reassign_card(board: &Board, active: &CardId, target: &CardTarget) -> Option<Board> {
    let source = board.column_of(active)?;
    let (dest_id, insert_at) = match target {
        CardTarget::Column(id) => {
            let column = board.column(id)?;
            (column.id.clone(), column.cards.len())
        }
        CardTarget::Card(id) => {
            let column = board.column_of(id)?;
            (column.id.clone(), column.card_index(id)?)
        }
    };
    if dest_id == source.id {
        return None;
    }
    let source_id = source.id.clone();
    let from = source.card_index(active)?;

    let mut next = board.clone();
    let mut card = {
        let source = next.column_mut(&source_id)?;
        let card = source.cards.remove(from);
        renumber(&mut source.cards);
        card
    };
    card.column_id = dest_id.clone();

    let dest = next.column_mut(&dest_id)?;
    let insert_at = insert_at.min(dest.cards.len());
    dest.cards.insert(insert_at, card);
    renumber(&mut dest.cards);
    Some(next)
}

/// Move a board onto the position of another board in the list.
pub fn move_board(boards: &[Board], active: &BoardId, over: &BoardId) -> Option<Vec<Board>> {
    if active == over {
        return None;
    }
    let from = boards.iter().position(|b| &b.id == active)?;
    let to = boards.iter().position(|b| &b.id == over)?;

    let mut next = boards.to_vec();
    move_to_index(&mut next, from, to);
    renumber(&mut next);
    Some(next)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn board(columns: &[(&str, &[&str])]) -> Board {
        let mut board = Board::new("Test", 0);
        board.id = BoardId::from_string("b");
        for (idx, (col, cards)) in columns.iter().enumerate() {
            let mut column = Column::new(board.id.clone(), *col, "#000000", idx);
            column.id = ColumnId::from_string(*col);
            for (order, title) in cards.iter().enumerate() {
                let mut card = Card::new(column.id.clone(), *title, order);
                card.id = CardId::from_string(*title);
                column.cards.push(card);
            }
            board.columns.push(column);
        }
        board
    }

    fn titles(board: &Board, column: &str) -> Vec<(String, usize)> {
        board
            .column(&ColumnId::from_string(column))
            .unwrap()
            .cards
            .iter()
            .map(|c| (c.title.clone(), c.order))
            .collect()
    }

    #[test]
    fn test_move_to_index() {
        let mut v = vec!['a', 'b', 'c', 'd'];
        move_to_index(&mut v, 0, 2);
        assert_eq!(v, vec!['b', 'c', 'a', 'd']);
        move_to_index(&mut v, 3, 0);
        assert_eq!(v, vec!['d', 'b', 'c', 'a']);
        move_to_index(&mut v, 9, 0);
        assert_eq!(v, vec!['d', 'b', 'c', 'a']);
    }

    #[test]
    fn test_move_column_forward() {
        let b = board(&[("c1", &[]), ("c2", &[]), ("c3", &[])]);
        let next = move_column(&b, &"c1".into(), &"c3".into()).unwrap();
        let ids: Vec<_> = next.columns.iter().map(|c| c.id.to_string()).collect();
        assert_eq!(ids, vec!["c2", "c3", "c1"]);
        assert!(next.columns.iter().enumerate().all(|(i, c)| c.order == i));
    }

    #[test]
    fn test_move_column_onto_itself_is_noop() {
        let b = board(&[("c1", &[]), ("c2", &[])]);
        assert!(move_column(&b, &"c1".into(), &"c1".into()).is_none());
        assert!(move_column(&b, &"c1".into(), &"missing".into()).is_none());
    }

    #[test]
    fn test_move_card_within_column() {
        let b = board(&[("todo", &["x", "y", "z"])]);
        let next = move_card(&b, &"x".into(), &"y".into()).unwrap();
        assert_eq!(
            titles(&next, "todo"),
            vec![("y".into(), 0), ("x".into(), 1), ("z".into(), 2)]
        );
        // input untouched
        assert_eq!(titles(&b, "todo")[0].0, "x");
    }

    #[test]
    fn test_move_card_other_column_is_not_a_settle() {
        let b = board(&[("a", &["x"]), ("b", &["y"])]);
        assert!(move_card(&b, &"x".into(), &"y".into()).is_none());
    }

    #[test]
    fn test_reassign_to_column_appends() {
        let b = board(&[("a", &["x", "y"]), ("b", &["z"])]);
        let next = reassign_card(&b, &"x".into(), &CardTarget::Column("b".into())).unwrap();
        assert_eq!(titles(&next, "a"), vec![("y".into(), 0)]);
        assert_eq!(titles(&next, "b"), vec![("z".into(), 0), ("x".into(), 1)]);
        assert_eq!(next.card(&"x".into()).unwrap().column_id.as_str(), "b");
    }

    #[test]
    fn test_reassign_onto_card_takes_its_index() {
        let b = board(&[("a", &["x"]), ("b", &["y", "z"])]);
        let next = reassign_card(&b, &"x".into(), &CardTarget::Card("z".into())).unwrap();
        assert_eq!(
            titles(&next, "b"),
            vec![("y".into(), 0), ("x".into(), 1), ("z".into(), 2)]
        );
        assert!(titles(&next, "a").is_empty());
    }

    #[test]
    fn test_reassign_same_column_is_noop() {
        let b = board(&[("a", &["x", "y"])]);
        assert!(reassign_card(&b, &"x".into(), &CardTarget::Column("a".into())).is_none());
        assert!(reassign_card(&b, &"x".into(), &CardTarget::Card("y".into())).is_none());
    }

    #[test]
    fn test_move_board() {
        let boards: Vec<Board> = (0..3)
            .map(|i| {
                let mut b = Board::new(format!("B{i}"), i);
                b.id = BoardId::from_string(format!("b{i}"));
                b
            })
            .collect();
        let next = move_board(&boards, &"b2".into(), &"b0".into()).unwrap();
        let order: Vec<_> = next.iter().map(|b| (b.title.as_str(), b.order)).collect();
        assert_eq!(order, vec![("B2", 0), ("B0", 1), ("B1", 2)]);
    }
}
