use rusqlite::Connection;
use serde::Deserialize;

use super::{
    find, get_owned, list_records, log_write, remove, require_changes, require_text,
    search_records, written, SearchQuery,
};
use crate::app::AppError;
use crate::context::OperatorContext;
use crate::db;
use crate::entities::{GroupRecord, TodoRecord, TodoSort, TodoStatus};
use crate::guard;
use crate::search::{PageResult, SearchFilters};
use crate::store::{self, FieldSet};

#[derive(Debug, Clone, Deserialize)]
pub struct NewTodo {
    pub group_id: i64,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub rank: Option<i64>,
    #[serde(default)]
    pub due_at: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct TodoPatch {
    pub title: Option<String>,
    pub description: Option<String>,
    pub rank: Option<i64>,
    pub due_at: Option<String>,
    /// Moves the todo into another group.
    pub group_id: Option<i64>,
    /// `true` marks the todo done now, `false` reopens it.
    pub done: Option<bool>,
}

impl TodoPatch {
    fn has_changes(&self) -> bool {
        self.title.is_some()
            || self.description.is_some()
            || self.rank.is_some()
            || self.due_at.is_some()
            || self.group_id.is_some()
            || self.done.is_some()
    }
}

/// One item of a bulk update.
#[derive(Debug, Clone, Deserialize)]
pub struct TodoUpdate {
    pub id: i64,
    pub if_match: String,
    #[serde(flatten)]
    pub patch: TodoPatch,
}

struct TodoWrite {
    id: i64,
    if_match: String,
    fields: FieldSet,
}

pub struct Todos<'c> {
    conn: &'c Connection,
}

impl<'c> Todos<'c> {
    pub(crate) fn new(conn: &'c Connection) -> Self {
        Self { conn }
    }

    pub fn get(&self, ctx: &OperatorContext, id: i64) -> Result<TodoRecord, AppError> {
        get_owned(self.conn, ctx, &id)
    }

    pub fn create(&self, ctx: &OperatorContext, input: NewTodo) -> Result<TodoRecord, AppError> {
        self.require_group(ctx, input.group_id)?;
        let fields = FieldSet::new()
            .set("group_id", input.group_id)
            .set("title", require_text("title", &input.title)?)
            .set_opt("description", input.description)
            .set("rank", input.rank.unwrap_or(0))
            .set_opt("due_at", input.due_at);
        let todo: TodoRecord = store::create(self.conn, &fields)?;
        log_write(ctx, "created", &todo);
        Ok(todo)
    }

    pub fn update(
        &self,
        ctx: &OperatorContext,
        id: i64,
        if_match: &str,
        patch: TodoPatch,
    ) -> Result<TodoRecord, AppError> {
        let write = self.validate_update(
            ctx,
            &TodoUpdate {
                id,
                if_match: if_match.to_string(),
                patch,
            },
        )?;
        self.commit_update(ctx, write)
    }

    /// Applies every item or none. A stale token or foreign group on any item
    /// fails the batch before anything is written.
    pub fn update_many(
        &self,
        ctx: &OperatorContext,
        items: &[TodoUpdate],
    ) -> Result<Vec<TodoRecord>, AppError> {
        let tx = self.conn.unchecked_transaction()?;
        let scoped = Todos::new(&tx);
        let updated = guard::commit_batch(
            ctx,
            items,
            |item| scoped.validate_update(ctx, item),
            |write| scoped.commit_update(ctx, write),
        )?;
        tx.commit()?;
        Ok(updated)
    }

    pub fn delete(&self, ctx: &OperatorContext, id: i64) -> Result<TodoRecord, AppError> {
        self.validate_delete(ctx, &id)?;
        remove::<TodoRecord>(self.conn, ctx, &id)
    }

    pub fn delete_many(&self, ctx: &OperatorContext, ids: &[i64]) -> Result<Vec<TodoRecord>, AppError> {
        let tx = self.conn.unchecked_transaction()?;
        let scoped = Todos::new(&tx);
        let removed = guard::commit_batch(
            ctx,
            ids,
            |id| scoped.validate_delete(ctx, id),
            |id| remove::<TodoRecord>(&tx, ctx, &id),
        )?;
        tx.commit()?;
        Ok(removed)
    }

    /// Every todo in scope, ordered by group rank then group, without paging.
    pub fn list(
        &self,
        ctx: &OperatorContext,
        filters: &SearchFilters<TodoStatus>,
    ) -> Result<Vec<TodoRecord>, AppError> {
        list_records(self.conn, ctx, filters, TodoSort::Group)
    }

    pub fn search(
        &self,
        ctx: &OperatorContext,
        query: &SearchQuery<TodoStatus, TodoSort>,
    ) -> Result<PageResult<TodoRecord>, AppError> {
        search_records(self.conn, ctx, query)
    }

    fn validate_update(&self, ctx: &OperatorContext, item: &TodoUpdate) -> Result<TodoWrite, AppError> {
        require_changes(item.patch.has_changes())?;
        let current = guard::require_current_version(ctx, &item.id, &item.if_match, || {
            find::<TodoRecord>(self.conn, &item.id)
        })?;
        self.require_group(ctx, current.group_id)?;

        let patch = &item.patch;
        let mut fields = FieldSet::new();
        if let Some(group_id) = patch.group_id {
            if group_id != current.group_id {
                self.require_group(ctx, group_id)?;
            }
            fields = fields.set("group_id", group_id);
        }
        if let Some(title) = patch.title.as_deref() {
            fields = fields.set("title", require_text("title", title)?);
        }
        if let Some(description) = patch.description.as_deref() {
            fields = fields.set_opt("description", non_blank(description));
        }
        if let Some(rank) = patch.rank {
            fields = fields.set("rank", rank);
        }
        if let Some(due_at) = patch.due_at.as_deref() {
            fields = fields.set_opt("due_at", non_blank(due_at));
        }
        match (patch.done, current.done_at.is_some()) {
            (Some(true), false) => fields = fields.set("done_at", db::next_version(None)),
            (Some(false), true) => fields = fields.set_opt::<String>("done_at", None),
            _ => {}
        }
        Ok(TodoWrite {
            id: item.id,
            if_match: item.if_match.clone(),
            fields,
        })
    }

    fn commit_update(&self, ctx: &OperatorContext, write: TodoWrite) -> Result<TodoRecord, AppError> {
        let outcome =
            store::update::<TodoRecord>(self.conn, &write.id, &write.fields, Some(&write.if_match))?;
        written(ctx, &write.id, &write.if_match, outcome)
    }

    fn validate_delete(&self, ctx: &OperatorContext, id: &i64) -> Result<i64, AppError> {
        let current = guard::require_exists(ctx, id, || find::<TodoRecord>(self.conn, id))?;
        self.require_group(ctx, current.group_id)?;
        Ok(current.id)
    }

    /// Todos have no owner of their own; the group they sit in decides.
    fn require_group(&self, ctx: &OperatorContext, group_id: i64) -> Result<GroupRecord, AppError> {
        guard::require_ownership(ctx, &group_id, || find::<GroupRecord>(self.conn, &group_id))
    }
}

/// Blank optional text clears the field.
fn non_blank(raw: &str) -> Option<String> {
    let value = raw.trim();
    (!value.is_empty()).then(|| value.to_string())
}
