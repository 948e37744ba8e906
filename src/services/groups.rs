use rusqlite::Connection;
use serde::Deserialize;

use super::{
    find, get_owned, list_records, log_write, remove, require_changes, require_operator,
    require_text, written,
};
use crate::app::AppError;
use crate::context::OperatorContext;
use crate::entities::group::GroupSort;
use crate::entities::{GroupRecord, SpaceRecord};
use crate::guard;
use crate::search::{NoStatus, SearchFilters};
use crate::store::{self, FieldSet};

#[derive(Debug, Clone, Deserialize)]
pub struct NewGroup {
    pub name: String,
    #[serde(default)]
    pub space_id: Option<i64>,
    #[serde(default)]
    pub rank: Option<i64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct GroupPatch {
    pub name: Option<String>,
    pub rank: Option<i64>,
    /// Moves the group into another space.
    pub space_id: Option<i64>,
}

impl GroupPatch {
    fn has_changes(&self) -> bool {
        self.name.is_some() || self.rank.is_some() || self.space_id.is_some()
    }
}

/// One item of a bulk update.
#[derive(Debug, Clone, Deserialize)]
pub struct GroupUpdate {
    pub id: i64,
    pub if_match: String,
    #[serde(flatten)]
    pub patch: GroupPatch,
}

struct GroupWrite {
    id: i64,
    if_match: String,
    fields: FieldSet,
}

pub struct Groups<'c> {
    conn: &'c Connection,
}

impl<'c> Groups<'c> {
    pub(crate) fn new(conn: &'c Connection) -> Self {
        Self { conn }
    }

    pub fn get(&self, ctx: &OperatorContext, id: i64) -> Result<GroupRecord, AppError> {
        get_owned(self.conn, ctx, &id)
    }

    pub fn create(&self, ctx: &OperatorContext, input: NewGroup) -> Result<GroupRecord, AppError> {
        require_operator(self.conn, ctx)?;
        if let Some(space_id) = input.space_id {
            self.require_space(ctx, space_id)?;
        }
        let fields = FieldSet::new()
            .set("owner_id", ctx.operator_id.clone())
            .set_opt("space_id", input.space_id)
            .set("name", require_text("name", &input.name)?)
            .set("rank", input.rank.unwrap_or(0));
        let group: GroupRecord = store::create(self.conn, &fields)?;
        log_write(ctx, "created", &group);
        Ok(group)
    }

    pub fn update(
        &self,
        ctx: &OperatorContext,
        id: i64,
        if_match: &str,
        patch: GroupPatch,
    ) -> Result<GroupRecord, AppError> {
        let write = self.validate_update(
            ctx,
            &GroupUpdate {
                id,
                if_match: if_match.to_string(),
                patch,
            },
        )?;
        self.commit_update(ctx, write)
    }

    /// Applies every item or none. Each item carries its own version token.
    pub fn update_many(
        &self,
        ctx: &OperatorContext,
        items: &[GroupUpdate],
    ) -> Result<Vec<GroupRecord>, AppError> {
        let tx = self.conn.unchecked_transaction()?;
        let scoped = Groups::new(&tx);
        let updated = guard::commit_batch(
            ctx,
            items,
            |item| scoped.validate_update(ctx, item),
            |write| scoped.commit_update(ctx, write),
        )?;
        tx.commit()?;
        Ok(updated)
    }

    pub fn delete(&self, ctx: &OperatorContext, id: i64) -> Result<GroupRecord, AppError> {
        let current = guard::require_exists(ctx, &id, || find::<GroupRecord>(self.conn, &id))?;
        guard::require_owner(ctx, &current)?;
        remove::<GroupRecord>(self.conn, ctx, &id)
    }

    /// Groups in scope ordered by rank.
    pub fn list(
        &self,
        ctx: &OperatorContext,
        filters: &SearchFilters<NoStatus>,
    ) -> Result<Vec<GroupRecord>, AppError> {
        list_records(self.conn, ctx, filters, GroupSort::Rank)
    }

    fn validate_update(&self, ctx: &OperatorContext, item: &GroupUpdate) -> Result<GroupWrite, AppError> {
        require_changes(item.patch.has_changes())?;
        let current = guard::require_current_version(ctx, &item.id, &item.if_match, || {
            find::<GroupRecord>(self.conn, &item.id)
        })?;
        guard::require_owner(ctx, &current)?;

        let mut fields = FieldSet::new();
        if let Some(space_id) = item.patch.space_id {
            if current.space_id != Some(space_id) {
                self.require_space(ctx, space_id)?;
            }
            fields = fields.set("space_id", space_id);
        }
        if let Some(name) = item.patch.name.as_deref() {
            fields = fields.set("name", require_text("name", name)?);
        }
        if let Some(rank) = item.patch.rank {
            fields = fields.set("rank", rank);
        }
        Ok(GroupWrite {
            id: item.id,
            if_match: item.if_match.clone(),
            fields,
        })
    }

    fn commit_update(&self, ctx: &OperatorContext, write: GroupWrite) -> Result<GroupRecord, AppError> {
        let outcome =
            store::update::<GroupRecord>(self.conn, &write.id, &write.fields, Some(&write.if_match))?;
        written(ctx, &write.id, &write.if_match, outcome)
    }

    fn require_space(&self, ctx: &OperatorContext, space_id: i64) -> Result<SpaceRecord, AppError> {
        guard::require_ownership(ctx, &space_id, || find::<SpaceRecord>(self.conn, &space_id))
    }
}
