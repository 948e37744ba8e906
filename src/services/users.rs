use rusqlite::Connection;
use serde::Deserialize;
use uuid::Uuid;

use super::{find, get_owned, log_write, remove, require_changes, require_text, written};
use crate::app::AppError;
use crate::context::OperatorContext;
use crate::entities::UserRecord;
use crate::guard;
use crate::search::{Clause, Predicate};
use crate::store::{self, FieldSet};

#[derive(Debug, Clone, Deserialize)]
pub struct NewUser {
    pub email: String,
    pub display_name: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct UserPatch {
    pub email: Option<String>,
    pub display_name: Option<String>,
}

impl UserPatch {
    fn has_changes(&self) -> bool {
        self.email.is_some() || self.display_name.is_some()
    }
}

pub struct Users<'c> {
    conn: &'c Connection,
}

impl<'c> Users<'c> {
    pub(crate) fn new(conn: &'c Connection) -> Self {
        Self { conn }
    }

    /// Registers a new principal. `ctx` only carries the request id; the new
    /// user becomes its own owner.
    pub fn register(&self, ctx: &OperatorContext, input: NewUser) -> Result<UserRecord, AppError> {
        let email = normalize_email(&input.email)?;
        let display_name = require_text("display_name", &input.display_name)?;
        guard::require_no_duplicate::<UserRecord, _, _>(ctx, "email", &email, None, || {
            self.find_by_email(&email)
        })?;

        let fields = FieldSet::new()
            .set("id", Uuid::now_v7().to_string())
            .set("email", email)
            .set("display_name", display_name);
        let user: UserRecord = store::create(self.conn, &fields)?;
        log_write(ctx, "created", &user);
        Ok(user)
    }

    pub fn get(&self, ctx: &OperatorContext, id: &str) -> Result<UserRecord, AppError> {
        get_owned(self.conn, ctx, &id.to_string())
    }

    pub fn update(
        &self,
        ctx: &OperatorContext,
        id: &str,
        if_match: &str,
        patch: UserPatch,
    ) -> Result<UserRecord, AppError> {
        require_changes(patch.has_changes())?;
        let id = id.to_string();
        let current = guard::require_current_version(ctx, &id, if_match, || {
            find::<UserRecord>(self.conn, &id)
        })?;
        guard::require_owner(ctx, &current)?;

        let mut fields = FieldSet::new();
        if let Some(email) = patch.email.as_deref() {
            let email = normalize_email(email)?;
            guard::require_no_duplicate(ctx, "email", &email, Some(&id), || {
                self.find_by_email(&email)
            })?;
            fields = fields.set("email", email);
        }
        if let Some(display_name) = patch.display_name.as_deref() {
            fields = fields.set("display_name", require_text("display_name", display_name)?);
        }

        let outcome = store::update::<UserRecord>(self.conn, &id, &fields, Some(if_match))?;
        written(ctx, &id, if_match, outcome)
    }

    /// Deletes the account and, through foreign keys, everything it owns.
    pub fn delete(&self, ctx: &OperatorContext, id: &str) -> Result<UserRecord, AppError> {
        let id = id.to_string();
        let current = guard::require_exists(ctx, &id, || find::<UserRecord>(self.conn, &id))?;
        guard::require_owner(ctx, &current)?;
        remove::<UserRecord>(self.conn, ctx, &id)
    }

    fn find_by_email(&self, email: &str) -> Result<Option<UserRecord>, AppError> {
        let predicate = Predicate::unscoped().and(Clause::Eq {
            column: "u.email",
            value: email.to_string().into(),
        });
        Ok(store::find_one(self.conn, &predicate)?)
    }
}

fn normalize_email(raw: &str) -> Result<String, AppError> {
    let email = raw.trim().to_ascii_lowercase();
    match email.split_once('@') {
        Some((local, domain)) if !local.is_empty() && !domain.is_empty() => Ok(email),
        _ => Err(AppError::InvalidArgument(format!(
            "invalid email address '{}'",
            raw.trim()
        ))),
    }
}
