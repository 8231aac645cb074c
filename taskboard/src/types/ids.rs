//! Identifier newtypes for boards, columns and cards.
//!
//! New identifiers are ULIDs. Identifiers coming back from storage are kept
//! verbatim: data written by older clients used other formats, so `parse`
//! only checks that the value is safe to embed in a URL path.

use crate::error::{Result, TaskboardError};
use serde::{Deserialize, Serialize};
use std::fmt;

const MAX_ID_LEN: usize = 64;

fn is_valid_id(s: &str) -> bool {
    !s.is_empty()
        && s.len() <= MAX_ID_LEN
        && s
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || b == b'-' || b == b'_')
}

macro_rules! define_id {
    ($(#[$meta:meta])* $name:ident, $kind:literal) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// Generate a fresh ULID-based identifier
            pub fn new() -> Self {
                Self(ulid::Ulid::new().to_string())
            }

            /// Wrap a string without validation (trusted sources only)
            pub fn from_string(s: impl Into<String>) -> Self {
                Self(s.into())
            }

            /// Validate and wrap user or network supplied input
            pub fn parse(s: impl Into<String>) -> Result<Self> {
                let s = s.into();
                if is_valid_id(&s) {
                    Ok(Self(s))
                } else {
                    Err(TaskboardError::InvalidId { kind: $kind, id: s })
                }
            }

            /// Re-check the format of an identifier of unknown provenance
            pub fn validate(&self) -> Result<()> {
                if is_valid_id(&self.0) {
                    Ok(())
                } else {
                    Err(TaskboardError::InvalidId {
                        kind: $kind,
                        id: self.0.clone(),
                    })
                }
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<&str> for $name {
            fn from(s: &str) -> Self {
                Self(s.to_string())
            }
        }

        impl From<String> for $name {
            fn from(s: String) -> Self {
                Self(s)
            }
        }
    };
}

define_id!(
    /// Identifier of a board
    BoardId,
    "board"
);
define_id!(
    /// Identifier of a column
    ColumnId,
    "column"
);
define_id!(
    /// Identifier of a card
    CardId,
    "card"
);
