use std::fmt;
use std::str::FromStr;

use rusqlite::types::Value;
use rusqlite::Row;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use thiserror::Error;

use super::EntityKind;
use crate::guard::Versioned;
use crate::search::{Clause, ParseSortError, Searchable, SortField, SortTarget, StatusValue};
use crate::store::Table;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TodoRecord {
    pub id: i64,
    pub group_id: i64,
    pub title: String,
    pub description: Option<String>,
    pub rank: i64,
    pub due_at: Option<String>,
    pub done_at: Option<String>,
    pub created_at: String,
    pub modified_at: String,
}

impl TodoRecord {
    pub fn status(&self) -> TodoStatus {
        if self.done_at.is_some() {
            TodoStatus::Done
        } else {
            TodoStatus::Active
        }
    }
}

impl Versioned for TodoRecord {
    type Id = i64;
    const KIND: EntityKind = EntityKind::Todo;

    fn record_id(&self) -> &i64 {
        &self.id
    }

    fn modified_at(&self) -> &str {
        &self.modified_at
    }
}

impl Table for TodoRecord {
    const TABLE: &'static str = "todos";
    const SOURCE: &'static str = "todos t JOIN todo_groups g ON g.id = t.group_id";
    const OWNER_COLUMN: &'static str = "g.owner_id";
    const ID_COLUMN: &'static str = "t.id";
    const COLUMNS: &'static str = "t.id, t.group_id, t.title, t.description, t.rank, t.due_at, \
                                   t.done_at, t.created_at, t.modified_at";

    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            group_id: row.get(1)?,
            title: row.get(2)?,
            description: row.get(3)?,
            rank: row.get(4)?,
            due_at: row.get(5)?,
            done_at: row.get(6)?,
            created_at: row.get(7)?,
            modified_at: row.get(8)?,
        })
    }

    fn id_value(id: &i64) -> Value {
        Value::Integer(*id)
    }
}

impl Searchable for TodoRecord {
    type Status = TodoStatus;
    type Sort = TodoSort;

    const KEYWORD_COLUMNS: &'static [&'static str] = &["t.title", "t.description"];
    const ID_LIST_COLUMN: &'static str = "t.group_id";
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TodoStatus {
    Active,
    Done,
}

impl TodoStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            TodoStatus::Active => "active",
            TodoStatus::Done => "done",
        }
    }
}

impl StatusValue for TodoStatus {
    const ALL: &'static [Self] = &[TodoStatus::Active, TodoStatus::Done];

    fn clause(self) -> Clause {
        match self {
            TodoStatus::Active => Clause::IsNull("t.done_at"),
            TodoStatus::Done => Clause::IsNotNull("t.done_at"),
        }
    }
}

impl fmt::Display for TodoStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TodoStatus {
    type Err = ParseTodoStatusError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "active" | "open" | "todo" => Ok(TodoStatus::Active),
            "done" | "completed" => Ok(TodoStatus::Done),
            _ => Err(ParseTodoStatusError {
                value: value.to_string(),
            }),
        }
    }
}

impl Serialize for TodoStatus {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for TodoStatus {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        TodoStatus::from_str(&raw).map_err(serde::de::Error::custom)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid todo status '{value}': expected one of active, done")]
pub struct ParseTodoStatusError {
    value: String,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum TodoSort {
    Title,
    CreatedAt,
    ModifiedAt,
    DueAt,
    #[default]
    Rank,
    /// Order of the owning group.
    Group,
}

impl SortField for TodoSort {
    fn target(self) -> SortTarget {
        match self {
            TodoSort::Title => SortTarget::Column("t.title"),
            TodoSort::CreatedAt => SortTarget::Column("t.created_at"),
            TodoSort::ModifiedAt => SortTarget::Column("t.modified_at"),
            TodoSort::DueAt => SortTarget::Column("t.due_at"),
            TodoSort::Rank => SortTarget::Column("t.rank"),
            TodoSort::Group => SortTarget::Parent {
                order_column: "g.rank",
                key_column: "g.id",
            },
        }
    }
}

impl FromStr for TodoSort {
    type Err = ParseSortError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "title" => Ok(TodoSort::Title),
            "created_at" | "created" => Ok(TodoSort::CreatedAt),
            "modified_at" | "modified" | "updated_at" => Ok(TodoSort::ModifiedAt),
            "due_at" | "due" => Ok(TodoSort::DueAt),
            "rank" | "order" => Ok(TodoSort::Rank),
            "group" | "parent" => Ok(TodoSort::Group),
            _ => Err(ParseSortError {
                what: "todo sort field",
                value: value.to_string(),
                expected: "title, created_at, modified_at, due_at, rank, group",
            }),
        }
    }
}
