use rusqlite::Connection;
use serde::Deserialize;

use super::{
    find, get_owned, list_records, log_write, remove, require_changes, require_text, written,
};
use crate::app::AppError;
use crate::context::OperatorContext;
use crate::entities::whiteboard::WhiteboardSort;
use crate::entities::{SpaceRecord, WhiteboardRecord};
use crate::guard;
use crate::search::{NoStatus, SearchFilters};
use crate::store::{self, FieldSet};

const EMPTY_BOARD: &str = "{}";

#[derive(Debug, Clone, Deserialize)]
pub struct NewWhiteboard {
    pub space_id: i64,
    pub title: String,
    #[serde(default)]
    pub content: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct WhiteboardPatch {
    pub title: Option<String>,
    pub content: Option<String>,
}

impl WhiteboardPatch {
    fn has_changes(&self) -> bool {
        self.title.is_some() || self.content.is_some()
    }
}

/// Save-from-editor payload: overwrites the board with `id` when it exists,
/// otherwise creates it (under `id` when one is given).
#[derive(Debug, Clone, Deserialize)]
pub struct WhiteboardSave {
    #[serde(default)]
    pub id: Option<i64>,
    pub space_id: i64,
    pub title: String,
    pub content: String,
}

pub struct Whiteboards<'c> {
    conn: &'c Connection,
}

impl<'c> Whiteboards<'c> {
    pub(crate) fn new(conn: &'c Connection) -> Self {
        Self { conn }
    }

    pub fn get(&self, ctx: &OperatorContext, id: i64) -> Result<WhiteboardRecord, AppError> {
        get_owned(self.conn, ctx, &id)
    }

    pub fn create(
        &self,
        ctx: &OperatorContext,
        input: NewWhiteboard,
    ) -> Result<WhiteboardRecord, AppError> {
        self.require_space(ctx, input.space_id)?;
        let content = match input.content {
            Some(content) => validate_content(content)?,
            None => EMPTY_BOARD.to_string(),
        };
        let fields = FieldSet::new()
            .set("space_id", input.space_id)
            .set("title", require_text("title", &input.title)?)
            .set("content", content);
        self.insert(ctx, &fields)
    }

    pub fn update(
        &self,
        ctx: &OperatorContext,
        id: i64,
        if_match: &str,
        patch: WhiteboardPatch,
    ) -> Result<WhiteboardRecord, AppError> {
        require_changes(patch.has_changes())?;
        let current = guard::require_current_version(ctx, &id, if_match, || {
            find::<WhiteboardRecord>(self.conn, &id)
        })?;
        self.require_space(ctx, current.space_id)?;

        let mut fields = FieldSet::new();
        if let Some(title) = patch.title.as_deref() {
            fields = fields.set("title", require_text("title", title)?);
        }
        if let Some(content) = patch.content {
            fields = fields.set("content", validate_content(content)?);
        }
        let outcome = store::update::<WhiteboardRecord>(self.conn, &id, &fields, Some(if_match))?;
        written(ctx, &id, if_match, outcome)
    }

    /// Last-writer-wins save. The target space must be the operator's; an
    /// existing board must also sit in one of the operator's spaces before
    /// it is overwritten (and may be moved to `space_id`).
    pub fn upsert(
        &self,
        ctx: &OperatorContext,
        input: WhiteboardSave,
    ) -> Result<WhiteboardRecord, AppError> {
        self.require_space(ctx, input.space_id)?;
        let title = require_text("title", &input.title)?;
        let content = validate_content(input.content)?;

        let existing = match input.id {
            Some(id) => find::<WhiteboardRecord>(self.conn, &id)?,
            None => None,
        };
        let Some(existing) = existing else {
            let fields = FieldSet::new()
                .set_opt("id", input.id)
                .set("space_id", input.space_id)
                .set("title", title)
                .set("content", content);
            return self.insert(ctx, &fields);
        };

        if existing.space_id != input.space_id {
            self.require_space(ctx, existing.space_id)?;
        }
        let fields = FieldSet::new()
            .set("space_id", input.space_id)
            .set("title", title)
            .set("content", content);
        let outcome = store::update::<WhiteboardRecord>(
            self.conn,
            &existing.id,
            &fields,
            Some(&existing.modified_at),
        )?;
        written(ctx, &existing.id, &existing.modified_at, outcome)
    }

    pub fn delete(&self, ctx: &OperatorContext, id: i64) -> Result<WhiteboardRecord, AppError> {
        let current =
            guard::require_exists(ctx, &id, || find::<WhiteboardRecord>(self.conn, &id))?;
        self.require_space(ctx, current.space_id)?;
        remove::<WhiteboardRecord>(self.conn, ctx, &id)
    }

    /// Boards in scope grouped by space rank.
    pub fn list(
        &self,
        ctx: &OperatorContext,
        filters: &SearchFilters<NoStatus>,
    ) -> Result<Vec<WhiteboardRecord>, AppError> {
        list_records(self.conn, ctx, filters, WhiteboardSort::Space)
    }

    fn insert(&self, ctx: &OperatorContext, fields: &FieldSet) -> Result<WhiteboardRecord, AppError> {
        let board: WhiteboardRecord = store::create(self.conn, fields)?;
        log_write(ctx, "created", &board);
        Ok(board)
    }

    /// Whiteboards are owned through their space.
    fn require_space(&self, ctx: &OperatorContext, space_id: i64) -> Result<SpaceRecord, AppError> {
        guard::require_ownership(ctx, &space_id, || find::<SpaceRecord>(self.conn, &space_id))
    }
}

/// Board content is an opaque JSON document; only well-formedness is
/// checked.
fn validate_content(content: String) -> Result<String, AppError> {
    serde_json::from_str::<serde_json::Value>(&content)?;
    Ok(content)
}
