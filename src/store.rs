//! Record store adapter over SQLite.
//!
//! Every entity implements [`Table`], which tells the adapter where the
//! entity lives, how its owner is reached, and how to map a row. The adapter
//! itself never opens transactions; callers pass a `Connection` or a
//! `Transaction` (which derefs to one).

use rusqlite::types::Value;
use rusqlite::{params_from_iter, Connection, OptionalExtension, Row};

use crate::db;
use crate::guard::Versioned;
use crate::search::{Clause, Predicate, SortKey};

pub trait Table: Versioned + Sized {
    /// Physical table written by create/update/delete.
    const TABLE: &'static str;
    /// FROM clause used for reads, including the joins needed to reach the
    /// owner column.
    const SOURCE: &'static str;
    /// Column (qualified) holding the principal at the root of the
    /// ownership chain.
    const OWNER_COLUMN: &'static str;
    /// Qualified primary key column, e.g. `t.id`.
    const ID_COLUMN: &'static str;
    /// Qualified column list matching `from_row`.
    const COLUMNS: &'static str;

    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self>;

    fn id_value(id: &Self::Id) -> Value;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Window {
    pub limit: u64,
    pub offset: u64,
}

/// Ordered list of column assignments for create/update.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FieldSet {
    fields: Vec<(&'static str, Value)>,
}

impl FieldSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(mut self, column: &'static str, value: impl Into<Value>) -> Self {
        self.push(column, value.into());
        self
    }

    pub fn set_opt<V: Into<Value>>(mut self, column: &'static str, value: Option<V>) -> Self {
        self.push(column, value.map_or(Value::Null, Into::into));
        self
    }

    pub fn columns(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.fields.iter().map(|(column, _)| *column)
    }

    fn push(&mut self, column: &'static str, value: Value) {
        if let Some(existing) = self.fields.iter_mut().find(|(name, _)| *name == column) {
            existing.1 = value;
        } else {
            self.fields.push((column, value));
        }
    }
}

pub fn id_clause<T: Table>(id: &T::Id) -> Clause {
    Clause::Eq {
        column: T::ID_COLUMN,
        value: T::id_value(id),
    }
}

pub fn find_one<T: Table>(conn: &Connection, predicate: &Predicate) -> rusqlite::Result<Option<T>> {
    let (where_sql, params) = predicate.render();
    let sql = format!(
        "SELECT {} FROM {}{} LIMIT 1",
        T::COLUMNS,
        T::SOURCE,
        where_sql
    );
    conn.query_row(&sql, params_from_iter(params), T::from_row)
        .optional()
}

pub fn find_by_id<T: Table>(conn: &Connection, id: &T::Id) -> rusqlite::Result<Option<T>> {
    find_one(conn, &Predicate::unscoped().and(id_clause::<T>(id)))
}

pub fn find_many<T: Table>(
    conn: &Connection,
    predicate: &Predicate,
    sort: Option<&SortKey>,
    window: Option<Window>,
) -> rusqlite::Result<Vec<T>> {
    let (where_sql, mut params) = predicate.render();
    let mut sql = format!("SELECT {} FROM {}{}", T::COLUMNS, T::SOURCE, where_sql);
    if let Some(sort) = sort {
        sql.push_str(" ORDER BY ");
        sql.push_str(&sort.order_by());
    }
    if let Some(window) = window {
        sql.push_str(" LIMIT ? OFFSET ?");
        params.push(Value::Integer(clamp_i64(window.limit)));
        params.push(Value::Integer(clamp_i64(window.offset)));
    }

    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map(params_from_iter(params), T::from_row)?;
    rows.collect()
}

pub fn count<T: Table>(conn: &Connection, predicate: &Predicate) -> rusqlite::Result<u64> {
    let (where_sql, params) = predicate.render();
    let sql = format!("SELECT COUNT(*) FROM {}{}", T::SOURCE, where_sql);
    let total: i64 = conn.query_row(&sql, params_from_iter(params), |row| row.get(0))?;
    Ok(u64::try_from(total).unwrap_or(0))
}

pub fn create<T: Table>(conn: &Connection, fields: &FieldSet) -> rusqlite::Result<T> {
    let stamp = db::next_version(None);
    let mut columns: Vec<&str> = fields.columns().collect();
    let mut values: Vec<Value> = fields.fields.iter().map(|(_, value)| value.clone()).collect();
    columns.push("created_at");
    values.push(Value::Text(stamp.clone()));
    columns.push("modified_at");
    values.push(Value::Text(stamp));

    let placeholders = vec!["?"; columns.len()].join(", ");
    let sql = format!(
        "INSERT INTO {} ({}) VALUES ({})",
        T::TABLE,
        columns.join(", "),
        placeholders
    );
    conn.execute(&sql, params_from_iter(values))?;

    let id: Value = conn.query_row(
        &format!("SELECT id FROM {} WHERE rowid = ?1", T::TABLE),
        [conn.last_insert_rowid()],
        |row| row.get(0),
    )?;
    let predicate = Predicate::unscoped().and(Clause::Eq {
        column: T::ID_COLUMN,
        value: id,
    });
    find_one(conn, &predicate)?.ok_or(rusqlite::Error::QueryReturnedNoRows)
}

/// Conditional write: applies `fields` and bumps `modified_at` only while the
/// stored version still equals `expected_version` (or, without one, the
/// version read at the start of this call). `Ok(None)` means no row matched:
/// the record is gone or a concurrent writer got there first.
pub fn update<T: Table>(
    conn: &Connection,
    id: &T::Id,
    fields: &FieldSet,
    expected_version: Option<&str>,
) -> rusqlite::Result<Option<T>> {
    let current: Option<String> = conn
        .query_row(
            &format!("SELECT modified_at FROM {} WHERE id = ?1", T::TABLE),
            [T::id_value(id)],
            |row| row.get(0),
        )
        .optional()?;
    let Some(current) = current else {
        return Ok(None);
    };
    let precondition = expected_version.unwrap_or(current.as_str());
    if precondition != current {
        return Ok(None);
    }

    let next = db::next_version(Some(&current));
    let mut assignments: Vec<String> = fields.columns().map(|col| format!("{col} = ?")).collect();
    assignments.push("modified_at = ?".to_string());
    let mut values: Vec<Value> = fields.fields.iter().map(|(_, value)| value.clone()).collect();
    values.push(Value::Text(next));
    values.push(T::id_value(id));
    values.push(Value::Text(precondition.to_string()));

    let sql = format!(
        "UPDATE {} SET {} WHERE id = ? AND modified_at = ?",
        T::TABLE,
        assignments.join(", ")
    );
    let changed = conn.execute(&sql, params_from_iter(values))?;
    if changed == 0 {
        return Ok(None);
    }
    find_by_id(conn, id)
}

/// Deletes by id and returns the removed record, or `None` if it was absent.
pub fn delete<T: Table>(conn: &Connection, id: &T::Id) -> rusqlite::Result<Option<T>> {
    let Some(existing) = find_by_id::<T>(conn, id)? else {
        return Ok(None);
    };
    conn.execute(
        &format!("DELETE FROM {} WHERE id = ?1", T::TABLE),
        [T::id_value(id)],
    )?;
    Ok(Some(existing))
}

fn clamp_i64(value: u64) -> i64 {
    i64::try_from(value).unwrap_or(i64::MAX)
}
