//! Taskboard CLI - personal kanban boards from the terminal.
//!
//! Commands:
//! - `taskboard boards`: List boards
//! - `taskboard show [board]`: Print a board
//! - `taskboard add-board [title]`: Create a board and switch to it
//! - `taskboard rename-board <id> <title>`
//! - `taskboard delete-board <id> --yes`
//! - `taskboard switch <id>`: Make a board active
//! - `taskboard add-column <title> [--color]`
//! - `taskboard add-card <column> <title>`
//! - `taskboard move-card <card> --to <column|card>`
//! - `taskboard move-column <column> --over <column>`
//! - `taskboard delete-card <card>`
//! - `taskboard json`: Dump the active board
//!
//! Exit codes:
//! - 0: Success
//! - 1: Error

mod cli;
mod commands;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use cli::Cli;
use taskboard::{Config, Session};

async fn run(cli: Cli) -> taskboard::Result<()> {
    let mut config = Config::load(cli.config.as_deref())?;
    if cli.local {
        config = config.into_local();
    }
    tracing::debug!(mode = ?config.mode(), api_url = %config.api_url, "configuration loaded");

    let mut session = Session::connect(&config).await?;
    commands::run(&mut session, cli.command).await
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // Initialize tracing with appropriate level
    let filter = if cli.debug {
        EnvFilter::new("taskboard=debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_ansi(false)
        .with_writer(std::io::stderr)
        .init();

    let exit_code = match run(cli).await {
        Ok(()) => 0,
        Err(e) => {
            eprintln!("Error: {}", e);
            1
        }
    };
    std::process::exit(exit_code);
}

#[cfg(test)]
mod tests {
    use super::*;
    use cli::Commands;

    #[test]
    fn test_cli_parsing_global_flags() {
        let cli = Cli::parse_from(["taskboard", "boards", "--local", "--debug"]);
        assert!(cli.local);
        assert!(cli.debug);
        assert!(matches!(cli.command, Commands::Boards));
    }

    #[test]
    fn test_cli_parsing_move_card() {
        let cli = Cli::parse_from(["taskboard", "move-card", "k1", "--to", "done"]);
        match cli.command {
            Commands::MoveCard { card, to } => {
                assert_eq!(card, "k1");
                assert_eq!(to, "done");
            }
            _ => panic!("Expected MoveCard command"),
        }
    }

    #[test]
    fn test_cli_parsing_move_card_requires_target() {
        let result = Cli::try_parse_from(["taskboard", "move-card", "k1"]);
        assert!(result.is_err(), "--to is required");
    }

    #[test]
    fn test_cli_parsing_delete_board_unconfirmed() {
        let cli = Cli::parse_from(["taskboard", "delete-board", "b1"]);
        assert!(matches!(cli.command, Commands::DeleteBoard { yes: false, .. }));
    }

    #[tokio::test]
    async fn test_commands_against_guest_storage() {
        let temp = tempfile::TempDir::new().unwrap();
        let config = Config {
            data_dir: temp.path().to_path_buf(),
            ..Config::default()
        };
        let mut session = Session::connect(&config).await.unwrap();

        commands::run(
            &mut session,
            Commands::AddBoard {
                title: Some("Chores".into()),
            },
        )
        .await
        .unwrap();
        commands::run(
            &mut session,
            Commands::AddColumn {
                title: "Done".into(),
                color: None,
            },
        )
        .await
        .unwrap();

        let session = Session::connect(&config).await.unwrap();
        let board = session.active_board().unwrap();
        assert_eq!(board.title, "Chores");
        assert_eq!(board.columns.len(), 2);
    }
}
