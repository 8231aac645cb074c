//! CLI definition for the taskboard command-line interface.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Taskboard - personal kanban boards from the terminal.
///
/// Runs against the REST backend when an API token is configured
/// (TASKBOARD_API_TOKEN or `api_token` in taskboard.toml), otherwise against
/// the guest document in the data directory.
#[derive(Parser, Debug)]
#[command(name = "taskboard")]
#[command(version)]
#[command(about = "Personal kanban boards over REST or local storage")]
#[command(
    long_about = "Taskboard keeps boards of ordered columns and cards.\n\n\
    Environment variables:\n  \
    TASKBOARD_API_URL        REST API root (default http://localhost:5000/api)\n  \
    TASKBOARD_API_TOKEN      Bearer token; selects the REST backend\n  \
    TASKBOARD_DATA_DIR       Directory of the guest document\n  \
    TASKBOARD_EXIT_DELAY_MS  Delay before deleted cards disappear"
)]
pub struct Cli {
    /// Enable debug output to stderr
    #[arg(short, long, global = true)]
    pub debug: bool,

    /// Configuration file (default: ./taskboard.toml if present)
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Use guest storage even when a token is configured
    #[arg(long, global = true)]
    pub local: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// List boards; the active one is marked
    Boards,

    /// Print a board with its columns and cards
    Show {
        /// Board id (default: the active board)
        board: Option<String>,
    },

    /// Create a board with a default column and switch to it
    AddBoard {
        title: Option<String>,
    },

    RenameBoard {
        id: String,
        title: String,
    },

    /// Delete a board with all its columns and cards
    DeleteBoard {
        id: String,
        /// Confirm the deletion
        #[arg(long)]
        yes: bool,
    },

    /// Make a board active
    Switch {
        id: String,
    },

    /// Append a column to the active board
    AddColumn {
        title: String,
        /// CSS color (default: derived from the title)
        #[arg(long)]
        color: Option<String>,
    },

    /// Append a card to a column of the active board
    AddCard {
        column: String,
        title: String,
    },

    /// Move a card onto a column (append) or onto another card (take its place)
    MoveCard {
        card: String,
        #[arg(long, value_name = "COLUMN_OR_CARD")]
        to: String,
    },

    /// Move a column onto another column's position
    MoveColumn {
        column: String,
        #[arg(long, value_name = "COLUMN")]
        over: String,
    },

    DeleteCard {
        card: String,
    },

    /// Dump the active board as JSON
    Json,
}
