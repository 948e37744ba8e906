use rusqlite::Connection;
use serde::Deserialize;

use super::{
    find, get_owned, list_records, log_write, remove, require_changes, require_operator,
    require_text, search_records, written, SearchQuery,
};
use crate::app::AppError;
use crate::context::OperatorContext;
use crate::entities::space::SpaceSort;
use crate::entities::SpaceRecord;
use crate::guard;
use crate::search::{NoStatus, PageResult, SearchFilters};
use crate::store::{self, FieldSet};

#[derive(Debug, Clone, Deserialize)]
pub struct NewSpace {
    pub name: String,
    #[serde(default)]
    pub rank: Option<i64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SpacePatch {
    pub name: Option<String>,
    pub rank: Option<i64>,
}

impl SpacePatch {
    fn has_changes(&self) -> bool {
        self.name.is_some() || self.rank.is_some()
    }
}

pub struct Spaces<'c> {
    conn: &'c Connection,
}

impl<'c> Spaces<'c> {
    pub(crate) fn new(conn: &'c Connection) -> Self {
        Self { conn }
    }

    pub fn get(&self, ctx: &OperatorContext, id: i64) -> Result<SpaceRecord, AppError> {
        get_owned(self.conn, ctx, &id)
    }

    /// Spaces sit at the top of the ownership chain; the only reference to
    /// check is the operator itself.
    pub fn create(&self, ctx: &OperatorContext, input: NewSpace) -> Result<SpaceRecord, AppError> {
        require_operator(self.conn, ctx)?;
        let fields = FieldSet::new()
            .set("owner_id", ctx.operator_id.clone())
            .set("name", require_text("name", &input.name)?)
            .set("rank", input.rank.unwrap_or(0));
        let space: SpaceRecord = store::create(self.conn, &fields)?;
        log_write(ctx, "created", &space);
        Ok(space)
    }

    pub fn update(
        &self,
        ctx: &OperatorContext,
        id: i64,
        if_match: &str,
        patch: SpacePatch,
    ) -> Result<SpaceRecord, AppError> {
        require_changes(patch.has_changes())?;
        let current = guard::require_current_version(ctx, &id, if_match, || {
            find::<SpaceRecord>(self.conn, &id)
        })?;
        guard::require_owner(ctx, &current)?;

        let mut fields = FieldSet::new();
        if let Some(name) = patch.name.as_deref() {
            fields = fields.set("name", require_text("name", name)?);
        }
        if let Some(rank) = patch.rank {
            fields = fields.set("rank", rank);
        }
        let outcome = store::update::<SpaceRecord>(self.conn, &id, &fields, Some(if_match))?;
        written(ctx, &id, if_match, outcome)
    }

    /// Removes the space and its whiteboards; groups and files are detached.
    pub fn delete(&self, ctx: &OperatorContext, id: i64) -> Result<SpaceRecord, AppError> {
        let current = guard::require_exists(ctx, &id, || find::<SpaceRecord>(self.conn, &id))?;
        guard::require_owner(ctx, &current)?;
        remove::<SpaceRecord>(self.conn, ctx, &id)
    }

    pub fn list(
        &self,
        ctx: &OperatorContext,
        filters: &SearchFilters<NoStatus>,
    ) -> Result<Vec<SpaceRecord>, AppError> {
        list_records(self.conn, ctx, filters, SpaceSort::Rank)
    }

    pub fn search(
        &self,
        ctx: &OperatorContext,
        query: &SearchQuery<NoStatus, SpaceSort>,
    ) -> Result<PageResult<SpaceRecord>, AppError> {
        search_records(self.conn, ctx, query)
    }
}
