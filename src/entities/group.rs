use std::str::FromStr;

use rusqlite::types::Value;
use rusqlite::Row;
use serde::Serialize;

use super::EntityKind;
use crate::guard::{Owned, Versioned};
use crate::search::{NoStatus, ParseSortError, Searchable, SortField, SortTarget};
use crate::store::Table;

/// A named, ranked list of todos. Its `rank` is the order todos sort by when
/// sorted "by group".
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GroupRecord {
    pub id: i64,
    pub owner_id: String,
    pub space_id: Option<i64>,
    pub name: String,
    pub rank: i64,
    pub created_at: String,
    pub modified_at: String,
}

impl Versioned for GroupRecord {
    type Id = i64;
    const KIND: EntityKind = EntityKind::Group;

    fn record_id(&self) -> &i64 {
        &self.id
    }

    fn modified_at(&self) -> &str {
        &self.modified_at
    }
}

impl Owned for GroupRecord {
    fn owner_id(&self) -> &str {
        &self.owner_id
    }
}

impl Table for GroupRecord {
    const TABLE: &'static str = "todo_groups";
    const SOURCE: &'static str = "todo_groups g LEFT JOIN spaces s ON s.id = g.space_id";
    const OWNER_COLUMN: &'static str = "g.owner_id";
    const ID_COLUMN: &'static str = "g.id";
    const COLUMNS: &'static str =
        "g.id, g.owner_id, g.space_id, g.name, g.rank, g.created_at, g.modified_at";

    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            owner_id: row.get(1)?,
            space_id: row.get(2)?,
            name: row.get(3)?,
            rank: row.get(4)?,
            created_at: row.get(5)?,
            modified_at: row.get(6)?,
        })
    }

    fn id_value(id: &i64) -> Value {
        Value::Integer(*id)
    }
}

impl Searchable for GroupRecord {
    type Status = NoStatus;
    type Sort = GroupSort;

    const KEYWORD_COLUMNS: &'static [&'static str] = &["g.name"];
    const ID_LIST_COLUMN: &'static str = "g.space_id";
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum GroupSort {
    Name,
    #[default]
    Rank,
    CreatedAt,
    Space,
}

impl SortField for GroupSort {
    fn target(self) -> SortTarget {
        match self {
            GroupSort::Name => SortTarget::Column("g.name"),
            GroupSort::Rank => SortTarget::Column("g.rank"),
            GroupSort::CreatedAt => SortTarget::Column("g.created_at"),
            GroupSort::Space => SortTarget::Parent {
                order_column: "s.rank",
                key_column: "s.id",
            },
        }
    }
}

impl FromStr for GroupSort {
    type Err = ParseSortError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "name" => Ok(GroupSort::Name),
            "rank" | "order" => Ok(GroupSort::Rank),
            "created_at" | "created" => Ok(GroupSort::CreatedAt),
            "space" | "parent" => Ok(GroupSort::Space),
            _ => Err(ParseSortError {
                what: "group sort field",
                value: value.to_string(),
                expected: "name, rank, created_at, space",
            }),
        }
    }
}
