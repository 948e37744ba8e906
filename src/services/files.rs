use rusqlite::Connection;
use serde::Deserialize;

use super::{
    find, get_owned, log_write, remove, require_changes, require_operator, require_text,
    search_records, written, SearchQuery,
};
use crate::app::AppError;
use crate::context::OperatorContext;
use crate::entities::file::FileSort;
use crate::entities::{FileRecord, SpaceRecord};
use crate::guard;
use crate::search::{Clause, NoStatus, PageResult, Predicate};
use crate::store::{self, FieldSet};

/// Metadata recorded after the bytes were stored elsewhere.
#[derive(Debug, Clone, Deserialize)]
pub struct NewFile {
    pub name: String,
    pub mime_type: String,
    pub size_bytes: i64,
    pub storage_key: String,
    #[serde(default)]
    pub space_id: Option<i64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct FilePatch {
    pub name: Option<String>,
    pub space_id: Option<i64>,
}

impl FilePatch {
    fn has_changes(&self) -> bool {
        self.name.is_some() || self.space_id.is_some()
    }
}

pub struct Files<'c> {
    conn: &'c Connection,
}

impl<'c> Files<'c> {
    pub(crate) fn new(conn: &'c Connection) -> Self {
        Self { conn }
    }

    pub fn get(&self, ctx: &OperatorContext, id: i64) -> Result<FileRecord, AppError> {
        get_owned(self.conn, ctx, &id)
    }

    pub fn create(&self, ctx: &OperatorContext, input: NewFile) -> Result<FileRecord, AppError> {
        require_operator(self.conn, ctx)?;
        if let Some(space_id) = input.space_id {
            self.require_space(ctx, space_id)?;
        }
        let name = require_text("name", &input.name)?;
        guard::require_no_duplicate::<FileRecord, _, _>(ctx, "name", &name, None, || {
            self.find_by_name(ctx, &name)
        })?;
        if input.size_bytes < 0 {
            return Err(AppError::InvalidArgument(
                "size_bytes must not be negative".to_string(),
            ));
        }

        let fields = FieldSet::new()
            .set("owner_id", ctx.operator_id.clone())
            .set_opt("space_id", input.space_id)
            .set("name", name)
            .set("mime_type", require_text("mime_type", &input.mime_type)?)
            .set("size_bytes", input.size_bytes)
            .set("storage_key", require_text("storage_key", &input.storage_key)?);
        let file: FileRecord = store::create(self.conn, &fields)?;
        log_write(ctx, "created", &file);
        Ok(file)
    }

    /// Rename and/or move. Renaming onto the file's own name is allowed.
    pub fn update(
        &self,
        ctx: &OperatorContext,
        id: i64,
        if_match: &str,
        patch: FilePatch,
    ) -> Result<FileRecord, AppError> {
        require_changes(patch.has_changes())?;
        let current = guard::require_current_version(ctx, &id, if_match, || {
            find::<FileRecord>(self.conn, &id)
        })?;
        guard::require_owner(ctx, &current)?;

        let mut fields = FieldSet::new();
        if let Some(space_id) = patch.space_id {
            if current.space_id != Some(space_id) {
                self.require_space(ctx, space_id)?;
            }
            fields = fields.set("space_id", space_id);
        }
        if let Some(name) = patch.name.as_deref() {
            let name = require_text("name", name)?;
            guard::require_no_duplicate(ctx, "name", &name, Some(&id), || {
                self.find_by_name(ctx, &name)
            })?;
            fields = fields.set("name", name);
        }
        let outcome = store::update::<FileRecord>(self.conn, &id, &fields, Some(if_match))?;
        written(ctx, &id, if_match, outcome)
    }

    /// Removes the metadata row. Releasing the stored bytes is the caller's job.
    pub fn delete(&self, ctx: &OperatorContext, id: i64) -> Result<FileRecord, AppError> {
        self.validate_delete(ctx, &id)?;
        remove::<FileRecord>(self.conn, ctx, &id)
    }

    pub fn delete_many(&self, ctx: &OperatorContext, ids: &[i64]) -> Result<Vec<FileRecord>, AppError> {
        let tx = self.conn.unchecked_transaction()?;
        let scoped = Files::new(&tx);
        let removed = guard::commit_batch(
            ctx,
            ids,
            |id| scoped.validate_delete(ctx, id),
            |id| remove::<FileRecord>(&tx, ctx, &id),
        )?;
        tx.commit()?;
        Ok(removed)
    }

    pub fn search(
        &self,
        ctx: &OperatorContext,
        query: &SearchQuery<NoStatus, FileSort>,
    ) -> Result<PageResult<FileRecord>, AppError> {
        search_records(self.conn, ctx, query)
    }

    fn validate_delete(&self, ctx: &OperatorContext, id: &i64) -> Result<i64, AppError> {
        let current = guard::require_exists(ctx, id, || find::<FileRecord>(self.conn, id))?;
        guard::require_owner(ctx, &current)?;
        Ok(current.id)
    }

    /// File names are unique per owner.
    fn find_by_name(&self, ctx: &OperatorContext, name: &str) -> Result<Option<FileRecord>, AppError> {
        let predicate = Predicate::owned_by::<FileRecord>(&ctx.operator_id).and(Clause::Eq {
            column: "f.name",
            value: name.to_string().into(),
        });
        Ok(store::find_one(self.conn, &predicate)?)
    }

    fn require_space(&self, ctx: &OperatorContext, space_id: i64) -> Result<SpaceRecord, AppError> {
        guard::require_ownership(ctx, &space_id, || find::<SpaceRecord>(self.conn, &space_id))
    }
}
