//! Per-entity resource services.
//!
//! Every service runs the guard checks and search engine in a fixed order
//! before touching the store:
//!
//! - get: owner scoped existence.
//! - create: parent ownership, then duplicate key, then insert.
//! - update: current version, then ownership (current and new parent), then
//!   a conditional write.
//! - delete: existence, then ownership, then delete.
//! - bulk update/delete: the same checks per item in a validate phase, then
//!   the writes in a commit phase inside one transaction.
//! - list/search: owner scoped predicate, then fetch (list) or count plus
//!   page (search).

use rusqlite::Connection;

use crate::app::AppError;
use crate::context::OperatorContext;
use crate::entities::UserRecord;
use crate::guard;
use crate::search::{
    self, PageRequest, PageResult, Predicate, SearchFilters, Searchable, SortOrder,
};
use crate::store::{self, Table};

mod files;
mod groups;
mod spaces;
mod todos;
mod users;
mod whiteboards;

pub use files::{FilePatch, Files, NewFile};
pub use groups::{GroupPatch, GroupUpdate, Groups, NewGroup};
pub use spaces::{NewSpace, SpacePatch, Spaces};
pub use todos::{NewTodo, TodoPatch, TodoUpdate, Todos};
pub use users::{NewUser, UserPatch, Users};
pub use whiteboards::{NewWhiteboard, WhiteboardPatch, WhiteboardSave, Whiteboards};

/// Filters, sort and page for a search call.
#[derive(Debug, Clone)]
pub struct SearchQuery<S, F> {
    pub filters: SearchFilters<S>,
    pub sort: F,
    pub order: SortOrder,
    pub page: PageRequest,
}

/// Unscoped lookup by id. Used by mutations, where ownership is checked
/// separately after existence so a foreign record reports `Forbidden`.
fn find<T: Table>(conn: &Connection, id: &T::Id) -> Result<Option<T>, AppError> {
    Ok(store::find_by_id(conn, id)?)
}

/// Lookup by id restricted to what the operator owns. Used by reads, where a
/// foreign record is indistinguishable from a missing one.
fn find_owned<T: Table>(
    conn: &Connection,
    ctx: &OperatorContext,
    id: &T::Id,
) -> Result<Option<T>, AppError> {
    let predicate = Predicate::owned_by::<T>(&ctx.operator_id).and(store::id_clause::<T>(id));
    Ok(store::find_one(conn, &predicate)?)
}

fn get_owned<T: Table>(conn: &Connection, ctx: &OperatorContext, id: &T::Id) -> Result<T, AppError> {
    guard::require_exists(ctx, id, || find_owned::<T>(conn, ctx, id))
}

/// Maps the store's "no row matched" outcome of a conditional write to the
/// conflict a client sees.
fn written<T: Table>(
    ctx: &OperatorContext,
    id: &T::Id,
    expected_version: &str,
    outcome: Option<T>,
) -> Result<T, AppError> {
    match outcome {
        Some(record) => {
            log_write(ctx, "updated", &record);
            Ok(record)
        }
        None => Err(guard::stale_write::<T>(ctx, id, expected_version).into()),
    }
}

/// Delete after the guard checks passed. A row that vanished in between
/// reports `NotFound`.
fn remove<T: Table>(conn: &Connection, ctx: &OperatorContext, id: &T::Id) -> Result<T, AppError> {
    let removed = guard::require_exists(ctx, id, || Ok::<_, AppError>(store::delete::<T>(conn, id)?))?;
    log_write(ctx, "deleted", &removed);
    Ok(removed)
}

fn log_write<T: Table>(ctx: &OperatorContext, action: &'static str, record: &T) {
    tracing::info!(
        request_id = %ctx.request_id,
        operator_id = %ctx.operator_id,
        kind = %T::KIND,
        id = %guard::Versioned::record_id(record),
        version = guard::Versioned::modified_at(record),
        action,
        "write committed"
    );
}

/// Directly owned records reference their owner; an operator that is not a
/// registered user is an invalid reference, not a store failure.
fn require_operator(conn: &Connection, ctx: &OperatorContext) -> Result<(), AppError> {
    guard::require_ownership::<UserRecord, AppError, _>(ctx, &ctx.operator_id, || {
        find::<UserRecord>(conn, &ctx.operator_id)
    })?;
    Ok(())
}

fn require_changes(has_changes: bool) -> Result<(), AppError> {
    if has_changes {
        Ok(())
    } else {
        Err(AppError::InvalidArgument(
            "no fields to update; pass at least one field".to_string(),
        ))
    }
}

/// Trimmed, non-empty text for a required field.
fn require_text(field: &str, raw: &str) -> Result<String, AppError> {
    let value = raw.trim();
    if value.is_empty() {
        return Err(AppError::InvalidArgument(format!("{field} must not be empty")));
    }
    Ok(value.to_string())
}

fn list_records<T: Searchable>(
    conn: &Connection,
    ctx: &OperatorContext,
    filters: &SearchFilters<T::Status>,
    default_sort: T::Sort,
) -> Result<Vec<T>, AppError> {
    let predicate = search::build_predicate::<T>(ctx, filters);
    let sort = search::resolve_sort::<T>(default_sort, SortOrder::Asc);
    Ok(store::find_many(conn, &predicate, Some(&sort), None)?)
}

fn search_records<T: Searchable>(
    conn: &Connection,
    ctx: &OperatorContext,
    query: &SearchQuery<T::Status, T::Sort>,
) -> Result<PageResult<T>, AppError> {
    let predicate = search::build_predicate::<T>(ctx, &query.filters);
    let sort = search::resolve_sort::<T>(query.sort, query.order);
    let result = search::paginate(conn, &predicate, &sort, query.page)?;
    tracing::debug!(
        request_id = %ctx.request_id,
        kind = %T::KIND,
        total = result.total,
        returned = result.items.len(),
        page = query.page.page,
        limit = query.page.limit,
        "search served"
    );
    Ok(result)
}
