//! Kanban board engine with drag-and-drop reordering
//!
//! Boards hold ordered columns, columns hold ordered cards. All state lives
//! in an in-memory [`EntityStore`] that is changed optimistically and
//! persisted in the background through a [`BoardStorage`] backend: a REST
//! API for signed-in users, or a JSON document on the device for guests.
//!
//! ## Overview
//!
//! - **Snapshot commits** - every mutation produces a new board snapshot;
//!   the writes to persist are derived by diffing old and new
//! - **Live drag** - cards hovering another column move there immediately;
//!   the whole gesture is persisted once on release
//! - **Deferred removal** - deleted cards and columns stay visible while
//!   their exit transition plays, then leave the store
//! - **Fire-and-forget writes** - failures are reported as [`Notice`]s,
//!   never rolled back
//!
//! ## Basic Usage
//!
//! ```rust,no_run
//! use taskboard::{Config, Session, DragItem, DropTarget};
//!
//! # async fn example() -> taskboard::Result<()> {
//! let config = Config::load(None)?;
//! let mut session = Session::connect(&config).await?;
//!
//! let board = session.create_board(Some("Groceries")).await?;
//! let todo = session.active_board().unwrap().columns[0].id.clone();
//! let done = session.add_column("Done", None).await?;
//! let card = session.add_card(&todo, "Milk").await?;
//!
//! session.drag_start(DragItem::Card(card));
//! session.drag_over(Some(&DropTarget::Column(done.clone())));
//! session.drag_end(Some(&DropTarget::Column(done)));
//!
//! session.flush().await;
//! # let _ = board;
//! # Ok(())
//! # }
//! ```
//!
//! ## Local document
//!
//! ```text
//! <data_dir>/
//! ├── taskboard.json   # {version, boards, columns, cards, preferences}
//! └── .lock            # exclusive lock held during each read-modify-write
//! ```

pub mod auto_color;
pub mod config;
pub mod drag;
mod error;
pub mod persist;
pub mod removal;
pub mod reorder;
pub mod session;
pub mod storage;
pub mod store;
pub mod types;

pub use config::Config;
pub use drag::{DragItem, DragSession, DragState, DropOutcome, DropTarget};
pub use error::{ErrorKind, Result, TaskboardError};
pub use persist::{Notice, Write};
pub use removal::{RemovalQueue, RemovalTarget};
pub use session::Session;
pub use storage::{BoardStorage, LocalStorage, RemoteStorage, StorageMode};
pub use store::EntityStore;
pub use types::*;
