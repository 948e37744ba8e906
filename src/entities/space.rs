use std::str::FromStr;

use rusqlite::types::Value;
use rusqlite::Row;
use serde::Serialize;

use super::EntityKind;
use crate::guard::{Owned, Versioned};
use crate::search::{NoStatus, ParseSortError, Searchable, SortField, SortTarget};
use crate::store::Table;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SpaceRecord {
    pub id: i64,
    pub owner_id: String,
    pub name: String,
    pub rank: i64,
    pub created_at: String,
    pub modified_at: String,
}

impl Versioned for SpaceRecord {
    type Id = i64;
    const KIND: EntityKind = EntityKind::Space;

    fn record_id(&self) -> &i64 {
        &self.id
    }

    fn modified_at(&self) -> &str {
        &self.modified_at
    }
}

impl Owned for SpaceRecord {
    fn owner_id(&self) -> &str {
        &self.owner_id
    }
}

impl Table for SpaceRecord {
    const TABLE: &'static str = "spaces";
    const SOURCE: &'static str = "spaces s";
    const OWNER_COLUMN: &'static str = "s.owner_id";
    const ID_COLUMN: &'static str = "s.id";
    const COLUMNS: &'static str = "s.id, s.owner_id, s.name, s.rank, s.created_at, s.modified_at";

    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            owner_id: row.get(1)?,
            name: row.get(2)?,
            rank: row.get(3)?,
            created_at: row.get(4)?,
            modified_at: row.get(5)?,
        })
    }

    fn id_value(id: &i64) -> Value {
        Value::Integer(*id)
    }
}

impl Searchable for SpaceRecord {
    type Status = NoStatus;
    type Sort = SpaceSort;

    const KEYWORD_COLUMNS: &'static [&'static str] = &["s.name"];
    const ID_LIST_COLUMN: &'static str = "s.id";
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SpaceSort {
    Name,
    #[default]
    Rank,
    CreatedAt,
}

impl SortField for SpaceSort {
    fn target(self) -> SortTarget {
        match self {
            SpaceSort::Name => SortTarget::Column("s.name"),
            SpaceSort::Rank => SortTarget::Column("s.rank"),
            SpaceSort::CreatedAt => SortTarget::Column("s.created_at"),
        }
    }
}

impl FromStr for SpaceSort {
    type Err = ParseSortError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "name" => Ok(SpaceSort::Name),
            "rank" | "order" => Ok(SpaceSort::Rank),
            "created_at" | "created" => Ok(SpaceSort::CreatedAt),
            _ => Err(ParseSortError {
                what: "space sort field",
                value: value.to_string(),
                expected: "name, rank, created_at",
            }),
        }
    }
}
