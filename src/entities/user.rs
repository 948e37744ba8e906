use rusqlite::types::Value;
use rusqlite::Row;
use serde::Serialize;

use super::EntityKind;
use crate::guard::{Owned, Versioned};
use crate::store::Table;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UserRecord {
    pub id: String,
    pub email: String,
    pub display_name: String,
    pub created_at: String,
    pub modified_at: String,
}

impl Versioned for UserRecord {
    type Id = String;
    const KIND: EntityKind = EntityKind::User;

    fn record_id(&self) -> &String {
        &self.id
    }

    fn modified_at(&self) -> &str {
        &self.modified_at
    }
}

/// A user is the root of its own ownership chain.
impl Owned for UserRecord {
    fn owner_id(&self) -> &str {
        &self.id
    }
}

impl Table for UserRecord {
    const TABLE: &'static str = "users";
    const SOURCE: &'static str = "users u";
    const OWNER_COLUMN: &'static str = "u.id";
    const ID_COLUMN: &'static str = "u.id";
    const COLUMNS: &'static str = "u.id, u.email, u.display_name, u.created_at, u.modified_at";

    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            email: row.get(1)?,
            display_name: row.get(2)?,
            created_at: row.get(3)?,
            modified_at: row.get(4)?,
        })
    }

    fn id_value(id: &String) -> Value {
        Value::Text(id.clone())
    }
}
