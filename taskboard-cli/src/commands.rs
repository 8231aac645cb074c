//! Command implementations over a taskboard session.

use crate::cli::Commands;
use taskboard::{
    Board, BoardId, CardId, ColumnId, DragItem, DropOutcome, DropTarget, Result, Session,
    TaskboardError,
};

/// Run one command. Background writes are flushed before returning.
pub async fn run(session: &mut Session, command: Commands) -> Result<()> {
    let result = dispatch(session, command).await;
    session.flush().await;
    result
}

async fn dispatch(session: &mut Session, command: Commands) -> Result<()> {
    match command {
        Commands::Boards => {
            let active = session.active_board().map(|b| b.id.clone());
            for board in session.boards() {
                let marker = if Some(&board.id) == active.as_ref() { "*" } else { " " };
                println!("{marker} {}  {}", board.id, board.title);
            }
        }

        Commands::Show { board } => {
            let board = match board {
                Some(id) => {
                    let id = BoardId::parse(id)?;
                    session
                        .boards()
                        .iter()
                        .find(|b| b.id == id)
                        .ok_or_else(|| TaskboardError::BoardNotFound { id: id.to_string() })?
                }
                None => active(session)?,
            };
            print!("{}", render(board));
        }

        Commands::AddBoard { title } => {
            let id = session.create_board(title.as_deref()).await?;
            println!("{id}");
        }

        Commands::RenameBoard { id, title } => {
            session.rename_board(&BoardId::parse(id)?, &title)?;
        }

        Commands::DeleteBoard { id, yes } => {
            let request = session.request_board_delete(&BoardId::parse(id)?)?;
            if !yes {
                session.cancel_board_delete();
                println!(
                    "Board '{}' and its {} card(s) would be deleted. Re-run with --yes to confirm.",
                    request.title, request.cards
                );
                return Ok(());
            }
            match session.confirm_board_delete(&request)? {
                Some(active) => println!("deleted; active board is now {active}"),
                None => println!("deleted; no boards left"),
            }
        }

        Commands::Switch { id } => {
            session.switch_board(&BoardId::parse(id)?)?;
        }

        Commands::AddColumn { title, color } => {
            let id = session.add_column(&title, color.as_deref()).await?;
            println!("{id}");
        }

        Commands::AddCard { column, title } => {
            let id = session.add_card(&ColumnId::parse(column)?, &title).await?;
            println!("{id}");
        }

        Commands::MoveCard { card, to } => {
            let card = CardId::parse(card)?;
            let target = resolve_target(active(session)?, &to)?;
            session.drag_start(DragItem::Card(card));
            session.drag_over(Some(&target));
            match session.drag_end(Some(&target)) {
                DropOutcome::Nothing => println!("nothing to move"),
                outcome => println!("{outcome:?}"),
            }
        }

        Commands::MoveColumn { column, over } => {
            let column = ColumnId::parse(column)?;
            let over = ColumnId::parse(over)?;
            session.drag_start(DragItem::Column(column));
            match session.drag_end(Some(&DropTarget::Column(over))) {
                DropOutcome::ColumnMoved => {}
                _ => println!("nothing to move"),
            }
        }

        Commands::DeleteCard { card } => {
            session.delete_card(&CardId::parse(card)?)?;
            session.settle_removals().await;
        }

        Commands::Json => {
            let board = active(session)?;
            println!("{}", serde_json::to_string_pretty(board)?);
        }
    }
    Ok(())
}

fn active(session: &Session) -> Result<&Board> {
    session.active_board().ok_or_else(|| TaskboardError::Validation {
        message: "no board selected; create one with add-board".to_string(),
    })
}

/// A target id names either a column or a card of the board
fn resolve_target(board: &Board, id: &str) -> Result<DropTarget> {
    let column = ColumnId::parse(id)?;
    if board.column(&column).is_some() {
        return Ok(DropTarget::Column(column));
    }
    let card = CardId::from_string(id);
    if board.card(&card).is_some() {
        return Ok(DropTarget::Card(card));
    }
    Err(TaskboardError::NotFound {
        resource: "column or card".to_string(),
        id: id.to_string(),
    })
}

fn render(board: &Board) -> String {
    let mut out = format!("{} ({})\n", board.title, board.id);
    for column in &board.columns {
        out.push_str(&format!(
            "\n  {} [{}] {}\n",
            column.title, column.color, column.id
        ));
        if column.cards.is_empty() {
            out.push_str("    (empty)\n");
        }
        for card in &column.cards {
            out.push_str(&format!("    - {}  {}\n", card.title, card.id));
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use taskboard::{Card, Column};

    fn board() -> Board {
        let mut board = Board::new("Home", 0);
        let mut column = Column::new(board.id.clone(), "Todo", "#ef4444", 0);
        column.id = ColumnId::from_string("todo");
        let mut card = Card::new(column.id.clone(), "Milk", 0);
        card.id = CardId::from_string("milk");
        column.cards.push(card);
        board.columns.push(column);
        board
    }

    #[test]
    fn test_resolve_target() {
        let board = board();
        assert_eq!(
            resolve_target(&board, "todo").unwrap(),
            DropTarget::Column("todo".into())
        );
        assert_eq!(
            resolve_target(&board, "milk").unwrap(),
            DropTarget::Card("milk".into())
        );
        assert!(resolve_target(&board, "nope").unwrap_err().is_not_found());
        assert!(resolve_target(&board, "../x").unwrap_err().is_validation());
    }

    #[test]
    fn test_render_lists_cards() {
        let text = render(&board());
        assert!(text.starts_with("Home"));
        assert!(text.contains("Todo [#ef4444] todo"));
        assert!(text.contains("- Milk  milk"));
    }
}
