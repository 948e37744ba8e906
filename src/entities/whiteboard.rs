use std::str::FromStr;

use rusqlite::types::Value;
use rusqlite::Row;
use serde::Serialize;

use super::EntityKind;
use crate::guard::Versioned;
use crate::search::{NoStatus, ParseSortError, Searchable, SortField, SortTarget};
use crate::store::Table;

/// A drawing surface inside a space. `content` is an opaque JSON document
/// produced by the drawing client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WhiteboardRecord {
    pub id: i64,
    pub space_id: i64,
    pub title: String,
    pub content: String,
    pub created_at: String,
    pub modified_at: String,
}

impl Versioned for WhiteboardRecord {
    type Id = i64;
    const KIND: EntityKind = EntityKind::Whiteboard;

    fn record_id(&self) -> &i64 {
        &self.id
    }

    fn modified_at(&self) -> &str {
        &self.modified_at
    }
}

impl Table for WhiteboardRecord {
    const TABLE: &'static str = "whiteboards";
    const SOURCE: &'static str = "whiteboards w JOIN spaces s ON s.id = w.space_id";
    const OWNER_COLUMN: &'static str = "s.owner_id";
    const ID_COLUMN: &'static str = "w.id";
    const COLUMNS: &'static str =
        "w.id, w.space_id, w.title, w.content, w.created_at, w.modified_at";

    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            space_id: row.get(1)?,
            title: row.get(2)?,
            content: row.get(3)?,
            created_at: row.get(4)?,
            modified_at: row.get(5)?,
        })
    }

    fn id_value(id: &i64) -> Value {
        Value::Integer(*id)
    }
}

impl Searchable for WhiteboardRecord {
    type Status = NoStatus;
    type Sort = WhiteboardSort;

    const KEYWORD_COLUMNS: &'static [&'static str] = &["w.title"];
    const ID_LIST_COLUMN: &'static str = "w.space_id";
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum WhiteboardSort {
    Title,
    CreatedAt,
    #[default]
    ModifiedAt,
    Space,
}

impl SortField for WhiteboardSort {
    fn target(self) -> SortTarget {
        match self {
            WhiteboardSort::Title => SortTarget::Column("w.title"),
            WhiteboardSort::CreatedAt => SortTarget::Column("w.created_at"),
            WhiteboardSort::ModifiedAt => SortTarget::Column("w.modified_at"),
            WhiteboardSort::Space => SortTarget::Parent {
                order_column: "s.rank",
                key_column: "s.id",
            },
        }
    }
}

impl FromStr for WhiteboardSort {
    type Err = ParseSortError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "title" => Ok(WhiteboardSort::Title),
            "created_at" | "created" => Ok(WhiteboardSort::CreatedAt),
            "modified_at" | "modified" => Ok(WhiteboardSort::ModifiedAt),
            "space" | "parent" => Ok(WhiteboardSort::Space),
            _ => Err(ParseSortError {
                what: "whiteboard sort field",
                value: value.to_string(),
                expected: "title, created_at, modified_at, space",
            }),
        }
    }
}
