//! Predicate composition, sort resolution and pagination shared by every
//! list/search path.

use std::fmt::Write as _;
use std::str::FromStr;

use rusqlite::types::Value;
use rusqlite::Connection;
use serde::Serialize;
use thiserror::Error;

use crate::context::OperatorContext;
use crate::store::{self, Table, Window};

#[derive(Debug, Clone, PartialEq)]
pub enum Clause {
    Eq {
        column: &'static str,
        value: Value,
    },
    In {
        column: &'static str,
        values: Vec<Value>,
    },
    /// OR of `column LIKE %keyword%` across `columns`.
    Contains {
        columns: &'static [&'static str],
        keyword: String,
    },
    IsNull(&'static str),
    IsNotNull(&'static str),
    AnyOf(Vec<Clause>),
}

impl Clause {
    fn render_into(&self, sql: &mut String, params: &mut Vec<Value>) {
        match self {
            Clause::Eq { column, value } => {
                let _ = write!(sql, "{column} = ?");
                params.push(value.clone());
            }
            Clause::In { column, values } => {
                if values.is_empty() {
                    sql.push_str("0 = 1");
                    return;
                }
                let placeholders = vec!["?"; values.len()].join(", ");
                let _ = write!(sql, "{column} IN ({placeholders})");
                params.extend(values.iter().cloned());
            }
            Clause::Contains { columns, keyword } => {
                if columns.is_empty() {
                    sql.push_str("0 = 1");
                    return;
                }
                let pattern = format!("%{}%", escape_like(keyword));
                let parts: Vec<String> = columns
                    .iter()
                    .map(|column| format!("{column} LIKE ? ESCAPE '\\'"))
                    .collect();
                let _ = write!(sql, "({})", parts.join(" OR "));
                params.extend(columns.iter().map(|_| Value::Text(pattern.clone())));
            }
            Clause::IsNull(column) => {
                let _ = write!(sql, "{column} IS NULL");
            }
            Clause::IsNotNull(column) => {
                let _ = write!(sql, "{column} IS NOT NULL");
            }
            Clause::AnyOf(clauses) => {
                if clauses.is_empty() {
                    sql.push_str("0 = 1");
                    return;
                }
                sql.push('(');
                for (index, clause) in clauses.iter().enumerate() {
                    if index > 0 {
                        sql.push_str(" OR ");
                    }
                    clause.render_into(sql, params);
                }
                sql.push(')');
            }
        }
    }
}

fn escape_like(raw: &str) -> String {
    let mut escaped = String::with_capacity(raw.len());
    for ch in raw.chars() {
        if matches!(ch, '\\' | '%' | '_') {
            escaped.push('\\');
        }
        escaped.push(ch);
    }
    escaped
}

/// AND of clauses. An empty predicate matches every row.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Predicate {
    clauses: Vec<Clause>,
}

impl Predicate {
    pub fn unscoped() -> Self {
        Self::default()
    }

    /// Starts from the mandatory owner scope of `T`.
    pub fn owned_by<T: Table>(operator_id: &str) -> Self {
        Self::unscoped().and(Clause::Eq {
            column: T::OWNER_COLUMN,
            value: Value::Text(operator_id.to_string()),
        })
    }

    pub fn and(mut self, clause: Clause) -> Self {
        self.clauses.push(clause);
        self
    }

    #[cfg(test)]
    pub fn clauses(&self) -> &[Clause] {
        &self.clauses
    }

    /// Renders ` WHERE ...` (or nothing) plus positional parameters.
    pub fn render(&self) -> (String, Vec<Value>) {
        let mut sql = String::new();
        let mut params = Vec::new();
        for (index, clause) in self.clauses.iter().enumerate() {
            sql.push_str(if index == 0 { " WHERE " } else { " AND " });
            clause.render_into(&mut sql, &mut params);
        }
        (sql, params)
    }
}

/// A closed set of status values that can be filtered on. Each value knows the
/// clause selecting it.
pub trait StatusValue: Copy + Eq + 'static {
    const ALL: &'static [Self];

    fn clause(self) -> Clause;
}

/// Status type for entities without a status filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoStatus {}

impl StatusValue for NoStatus {
    const ALL: &'static [Self] = &[];

    fn clause(self) -> Clause {
        match self {}
    }
}

/// `None` when nothing or everything is selected; both mean "no filter".
pub fn status_clause<S: StatusValue>(selected: &[S]) -> Option<Clause> {
    let chosen: Vec<S> = S::ALL
        .iter()
        .copied()
        .filter(|value| selected.contains(value))
        .collect();
    if chosen.is_empty() || chosen.len() == S::ALL.len() {
        return None;
    }
    Some(Clause::AnyOf(
        chosen.into_iter().map(StatusValue::clause).collect(),
    ))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortTarget {
    Column(&'static str),
    /// Sort by the parent's rank, reached through the ownership join.
    /// `key_column` keeps children of the same parent together when ranks tie.
    Parent {
        order_column: &'static str,
        key_column: &'static str,
    },
}

pub trait SortField: Copy {
    fn target(self) -> SortTarget;
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SortOrder {
    #[default]
    Asc,
    Desc,
}

impl SortOrder {
    fn as_sql(self) -> &'static str {
        match self {
            SortOrder::Asc => "ASC",
            SortOrder::Desc => "DESC",
        }
    }
}

impl FromStr for SortOrder {
    type Err = ParseSortError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "asc" | "ascending" => Ok(SortOrder::Asc),
            "desc" | "descending" => Ok(SortOrder::Desc),
            _ => Err(ParseSortError {
                what: "sort order",
                value: value.to_string(),
                expected: "asc, desc",
            }),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid {what} '{value}': expected one of {expected}")]
pub struct ParseSortError {
    pub what: &'static str,
    pub value: String,
    pub expected: &'static str,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SortKey {
    terms: Vec<(&'static str, SortOrder)>,
}

impl SortKey {
    #[cfg(test)]
    pub fn terms(&self) -> &[(&'static str, SortOrder)] {
        &self.terms
    }

    pub fn order_by(&self) -> String {
        self.terms
            .iter()
            .map(|(column, order)| format!("{column} {}", order.as_sql()))
            .collect::<Vec<_>>()
            .join(", ")
    }
}

/// An entity that list/search endpoints can filter and sort.
pub trait Searchable: Table {
    type Status: StatusValue;
    type Sort: SortField;

    /// Text columns matched by the keyword filter.
    const KEYWORD_COLUMNS: &'static [&'static str];
    /// Foreign key matched by the id-list filter.
    const ID_LIST_COLUMN: &'static str;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchFilters<S> {
    pub ids: Vec<i64>,
    pub keyword: Option<String>,
    pub statuses: Vec<S>,
}

impl<S> Default for SearchFilters<S> {
    fn default() -> Self {
        Self {
            ids: Vec::new(),
            keyword: None,
            statuses: Vec::new(),
        }
    }
}

/// Owner scope AND whichever optional clauses were actually supplied. An
/// empty id list, a blank keyword and an empty or complete status set add
/// nothing.
pub fn build_predicate<T: Searchable>(
    ctx: &OperatorContext,
    filters: &SearchFilters<T::Status>,
) -> Predicate {
    let mut predicate = Predicate::owned_by::<T>(&ctx.operator_id);

    if !filters.ids.is_empty() {
        predicate = predicate.and(Clause::In {
            column: T::ID_LIST_COLUMN,
            values: filters.ids.iter().map(|id| Value::Integer(*id)).collect(),
        });
    }

    let keyword = filters.keyword.as_deref().filter(|keyword| !keyword.is_empty());
    if let Some(keyword) = keyword {
        predicate = predicate.and(Clause::Contains {
            columns: T::KEYWORD_COLUMNS,
            keyword: keyword.to_string(),
        });
    }

    if let Some(clause) = status_clause(&filters.statuses) {
        predicate = predicate.and(clause);
    }

    predicate
}

/// Resolves a sort field to ORDER BY terms, always ending with the entity id
/// so pages are stable.
pub fn resolve_sort<T: Searchable>(field: T::Sort, order: SortOrder) -> SortKey {
    let mut terms = match field.target() {
        SortTarget::Column(column) => vec![(column, order)],
        SortTarget::Parent {
            order_column,
            key_column,
        } => vec![(order_column, order), (key_column, order)],
    };
    if terms.iter().all(|(column, _)| *column != T::ID_COLUMN) {
        terms.push((T::ID_COLUMN, SortOrder::Asc));
    }
    SortKey { terms }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub limit: u64,
    /// 1-based; 0 is read as 1.
    pub page: u64,
}

impl PageRequest {
    pub fn new(limit: u64, page: u64) -> Self {
        Self { limit, page }
    }

    pub fn offset(&self) -> u64 {
        self.limit.saturating_mul(self.page.max(1) - 1)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PageResult<T> {
    pub total: u64,
    pub items: Vec<T>,
}

/// Count and page slice against the same predicate.
pub fn paginate<T: Table>(
    conn: &Connection,
    predicate: &Predicate,
    sort: &SortKey,
    page: PageRequest,
) -> rusqlite::Result<PageResult<T>> {
    let total = store::count::<T>(conn, predicate)?;
    let items = store::find_many(
        conn,
        predicate,
        Some(sort),
        Some(Window {
            limit: page.limit,
            offset: page.offset(),
        }),
    )?;
    Ok(PageResult { total, items })
}

#[cfg(test)]
mod tests;
