//! Upgrade of device-local documents written by older clients.
//!
//! Older guests stored a flat document: `columns` and `cards` arrays with no
//! surrounding board, columns without a `boardId`, and ids that were
//! sometimes plain numbers. That shape is folded into a single board.

use super::local::{BoardRecord, ColumnRecord, Snapshot, SNAPSHOT_VERSION};
use crate::auto_color::column_color;
use crate::error::{Result, TaskboardError};
use crate::types::{BoardId, Card, CardId, ColumnId, UserPreferences};
use serde::Deserialize;
use serde_json::Value;
use std::collections::HashSet;
use tracing::{info, warn};

/// Title given to the board that adopts legacy columns
pub const MIGRATED_BOARD_TITLE: &str = "My Board";

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LegacyDocument {
    #[serde(default)]
    columns: Vec<LegacyColumn>,
    #[serde(default)]
    cards: Vec<LegacyCard>,
    #[serde(default)]
    wallpaper: Option<String>,
    #[serde(default)]
    custom_wallpapers: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct LegacyColumn {
    id: Value,
    #[serde(default)]
    title: String,
    #[serde(default)]
    color: Option<String>,
    #[serde(default)]
    order: Option<usize>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LegacyCard {
    id: Value,
    #[serde(alias = "column")]
    column_id: Value,
    #[serde(default)]
    title: String,
    #[serde(default)]
    order: Option<usize>,
}

/// Legacy ids were strings or numbers
fn legacy_id(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Decode a stored document, upgrading it when needed.
///
/// Returns the snapshot and whether it changed shape (and so must be
/// written back).
pub(crate) fn upgrade(value: Value) -> Result<(Snapshot, bool)> {
    let Value::Object(map) = &value else {
        if value.is_null() {
            return Ok((Snapshot::default(), false));
        }
        return Err(TaskboardError::invalid_value(
            "snapshot",
            "expected a JSON object",
        ));
    };

    if map.contains_key("boards") {
        let version = map
            .get("version")
            .and_then(Value::as_u64)
            .unwrap_or(SNAPSHOT_VERSION as u64);
        if version > SNAPSHOT_VERSION as u64 {
            return Err(TaskboardError::invalid_value(
                "version",
                format!("document version {version} is newer than supported {SNAPSHOT_VERSION}"),
            ));
        }
        let mut snapshot: Snapshot = serde_json::from_value(value)?;
        snapshot.preferences.normalize();
        let upgraded = snapshot.version != SNAPSHOT_VERSION;
        snapshot.version = SNAPSHOT_VERSION;
        return Ok((snapshot, upgraded));
    }

    if !map.contains_key("columns") && !map.contains_key("cards") {
        return Ok((Snapshot::default(), false));
    }

    let legacy: LegacyDocument = serde_json::from_value(value)?;
    Ok((from_legacy(legacy), true))
}

fn from_legacy(legacy: LegacyDocument) -> Snapshot {
    let board_id = BoardId::new();

    let mut columns: Vec<(usize, LegacyColumn)> = legacy.columns.into_iter().enumerate().collect();
    columns.sort_by_key(|(idx, c)| c.order.unwrap_or(*idx));

    let mut column_records = Vec::with_capacity(columns.len());
    for (_, column) in columns {
        let Some(id) = legacy_id(&column.id) else {
            warn!(id = ?column.id, "dropping legacy column without usable id");
            continue;
        };
        let color = column.color.unwrap_or_else(|| column_color(&column.title));
        column_records.push(ColumnRecord {
            id: ColumnId::from_string(id),
            board_id: board_id.clone(),
            title: column.title,
            color,
            order: column_records.len(),
        });
    }

    let known: HashSet<&ColumnId> = column_records.iter().map(|c| &c.id).collect();
    let mut cards: Vec<(usize, Card)> = Vec::new();
    for (idx, card) in legacy.cards.into_iter().enumerate() {
        let (Some(id), Some(column)) = (legacy_id(&card.id), legacy_id(&card.column_id)) else {
            warn!(id = ?card.id, "dropping legacy card without usable ids");
            continue;
        };
        let column_id = ColumnId::from_string(column);
        if !known.contains(&column_id) {
            warn!(card = %id, column = %column_id, "dropping legacy card of unknown column");
            continue;
        }
        cards.push((
            card.order.unwrap_or(idx),
            Card {
                id: CardId::from_string(id),
                column_id,
                title: card.title,
                order: 0,
            },
        ));
    }
    cards.sort_by_key(|(order, _)| *order);

    let mut renumbered: Vec<Card> = Vec::with_capacity(cards.len());
    for column in &column_records {
        let mut next = 0;
        for (_, card) in cards.iter().filter(|(_, c)| c.column_id == column.id) {
            let mut card = card.clone();
            card.order = next;
            next += 1;
            renumbered.push(card);
        }
    }

    let mut preferences = UserPreferences {
        last_active_board_id: Some(board_id.clone()),
        wallpaper: legacy.wallpaper,
        custom_wallpapers: legacy.custom_wallpapers,
    };
    preferences.normalize();

    info!(
        columns = column_records.len(),
        cards = renumbered.len(),
        "migrated legacy local document into a single board"
    );

    Snapshot {
        version: SNAPSHOT_VERSION,
        boards: vec![BoardRecord {
            id: board_id,
            title: MIGRATED_BOARD_TITLE.to_string(),
            order: 0,
            column_ids: column_records
                .iter()
                .map(|c| c.id.clone())
                .collect(),
        }],
        columns: column_records,
        cards: renumbered,
        preferences,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_null_is_empty() {
        let (snapshot, migrated) = upgrade(Value::Null).unwrap();
        assert!(snapshot.boards.is_empty());
        assert!(!migrated);
    }

    #[test]
    fn test_current_document_untouched() {
        let doc = json!({"version": SNAPSHOT_VERSION, "boards": [], "columns": [], "cards": []});
        let (_, migrated) = upgrade(doc).unwrap();
        assert!(!migrated);
    }

    #[test]
    fn test_future_version_rejected() {
        let doc = json!({"version": SNAPSHOT_VERSION + 1, "boards": []});
        assert!(matches!(
            upgrade(doc),
            Err(TaskboardError::InvalidValue { .. })
        ));
    }

    #[test]
    fn test_legacy_flat_document() {
        let doc = json!({
            "columns": [
                {"id": "done", "title": "Done", "order": 1},
                {"id": 17, "title": "Todo", "color": "#111111", "order": 0}
            ],
            "cards": [
                {"id": "a", "columnId": "done", "title": "Shipped", "order": 4},
                {"id": 99, "columnId": 17, "title": "Write", "order": 2},
                {"id": "b", "columnId": 17, "title": "Read", "order": 1},
                {"id": "ghost", "columnId": "nope", "title": "Lost"}
            ],
            "wallpaper": "forest"
        });

        let (snapshot, migrated) = upgrade(doc).unwrap();
        assert!(migrated);
        assert_eq!(snapshot.boards.len(), 1);
        let board = &snapshot.boards[0];
        assert_eq!(board.title, MIGRATED_BOARD_TITLE);
        assert_eq!(
            board.column_ids,
            vec![ColumnId::from_string("17"), ColumnId::from_string("done")]
        );
        assert!(snapshot.columns.iter().all(|c| c.board_id == board.id));
        assert_eq!(snapshot.columns[0].color, "#111111");
        assert_eq!(snapshot.columns[1].color, column_color("Done"));

        assert_eq!(snapshot.cards.len(), 3);
        let todo: Vec<_> = snapshot
            .cards
            .iter()
            .filter(|c| c.column_id.as_str() == "17")
            .map(|c| (c.title.as_str(), c.order))
            .collect();
        assert_eq!(todo, vec![("Read", 0), ("Write", 1)]);
        assert_eq!(snapshot.preferences.last_active_board_id, Some(board.id.clone()));
        assert_eq!(snapshot.preferences.wallpaper.as_deref(), Some("forest"));
    }
}
