use std::str::FromStr;

use rusqlite::types::Value;
use rusqlite::Row;
use serde::Serialize;

use super::EntityKind;
use crate::guard::{Owned, Versioned};
use crate::search::{NoStatus, ParseSortError, Searchable, SortField, SortTarget};
use crate::store::Table;

/// Metadata for an uploaded file. The bytes live behind `storage_key` in an
/// external object store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileRecord {
    pub id: i64,
    pub owner_id: String,
    pub space_id: Option<i64>,
    pub name: String,
    pub mime_type: String,
    pub size_bytes: i64,
    pub storage_key: String,
    pub created_at: String,
    pub modified_at: String,
}

impl Versioned for FileRecord {
    type Id = i64;
    const KIND: EntityKind = EntityKind::File;

    fn record_id(&self) -> &i64 {
        &self.id
    }

    fn modified_at(&self) -> &str {
        &self.modified_at
    }
}

impl Owned for FileRecord {
    fn owner_id(&self) -> &str {
        &self.owner_id
    }
}

impl Table for FileRecord {
    const TABLE: &'static str = "files";
    const SOURCE: &'static str = "files f LEFT JOIN spaces s ON s.id = f.space_id";
    const OWNER_COLUMN: &'static str = "f.owner_id";
    const ID_COLUMN: &'static str = "f.id";
    const COLUMNS: &'static str = "f.id, f.owner_id, f.space_id, f.name, f.mime_type, \
                                   f.size_bytes, f.storage_key, f.created_at, f.modified_at";

    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            owner_id: row.get(1)?,
            space_id: row.get(2)?,
            name: row.get(3)?,
            mime_type: row.get(4)?,
            size_bytes: row.get(5)?,
            storage_key: row.get(6)?,
            created_at: row.get(7)?,
            modified_at: row.get(8)?,
        })
    }

    fn id_value(id: &i64) -> Value {
        Value::Integer(*id)
    }
}

impl Searchable for FileRecord {
    type Status = NoStatus;
    type Sort = FileSort;

    const KEYWORD_COLUMNS: &'static [&'static str] = &["f.name", "f.mime_type"];
    const ID_LIST_COLUMN: &'static str = "f.space_id";
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum FileSort {
    Name,
    Size,
    #[default]
    CreatedAt,
    ModifiedAt,
    Space,
}

impl SortField for FileSort {
    fn target(self) -> SortTarget {
        match self {
            FileSort::Name => SortTarget::Column("f.name"),
            FileSort::Size => SortTarget::Column("f.size_bytes"),
            FileSort::CreatedAt => SortTarget::Column("f.created_at"),
            FileSort::ModifiedAt => SortTarget::Column("f.modified_at"),
            FileSort::Space => SortTarget::Parent {
                order_column: "s.rank",
                key_column: "s.id",
            },
        }
    }
}

impl FromStr for FileSort {
    type Err = ParseSortError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "name" => Ok(FileSort::Name),
            "size" | "size_bytes" => Ok(FileSort::Size),
            "created_at" | "created" => Ok(FileSort::CreatedAt),
            "modified_at" | "modified" => Ok(FileSort::ModifiedAt),
            "space" | "parent" => Ok(FileSort::Space),
            _ => Err(ParseSortError {
                what: "file sort field",
                value: value.to_string(),
                expected: "name, size, created_at, modified_at, space",
            }),
        }
    }
}
