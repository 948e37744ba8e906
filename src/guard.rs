//! Precondition checks every create/update/delete path runs before writing.
//!
//! Each check is a read-then-decide helper: it runs a caller supplied lookup
//! against the store and either hands back the record or fails with a
//! [`GuardError`]. Lookups return `Result<Option<R>, E>` so store errors pass
//! through untouched; guard failures are converted into `E`.

use std::fmt;

use thiserror::Error;

use crate::context::OperatorContext;
use crate::entities::EntityKind;

/// A record carrying an identifier and the version token (`modified_at`)
/// a client must echo back on update.
pub trait Versioned {
    type Id: Clone + PartialEq + fmt::Display + fmt::Debug;

    const KIND: EntityKind;

    fn record_id(&self) -> &Self::Id;
    fn modified_at(&self) -> &str;
}

/// A record that names its owning principal directly.
pub trait Owned: Versioned {
    fn owner_id(&self) -> &str;
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GuardError {
    #[error("{kind} '{id}' not found")]
    NotFound { kind: EntityKind, id: String },
    #[error("{kind} '{id}' changed since version {expected}; refetch and retry")]
    Conflict {
        kind: EntityKind,
        id: String,
        expected: String,
    },
    #[error("{kind} with {key} '{value}' already exists")]
    Duplicate {
        kind: EntityKind,
        key: &'static str,
        value: String,
    },
    #[error("{kind} '{id}' belongs to another owner")]
    Forbidden { kind: EntityKind, id: String },
    #[error("referenced {kind} '{id}' does not exist")]
    InvalidReference { kind: EntityKind, id: String },
}

impl GuardError {
    pub fn status_code(&self) -> &'static str {
        match self {
            GuardError::NotFound { .. } => "NOT_FOUND",
            GuardError::Conflict { .. } => "CONFLICT",
            GuardError::Duplicate { .. } => "CONFLICT",
            GuardError::Forbidden { .. } => "FORBIDDEN",
            GuardError::InvalidReference { .. } => "BAD_REQUEST",
        }
    }
}

fn reject(ctx: &OperatorContext, err: GuardError) -> GuardError {
    tracing::debug!(
        request_id = %ctx.request_id,
        operator_id = %ctx.operator_id,
        status = err.status_code(),
        error = %err,
        "mutation guard rejected request"
    );
    err
}

pub fn require_exists<R, E, F>(ctx: &OperatorContext, id: &R::Id, lookup: F) -> Result<R, E>
where
    R: Versioned,
    E: From<GuardError>,
    F: FnOnce() -> Result<Option<R>, E>,
{
    match lookup()? {
        Some(record) => Ok(record),
        None => Err(reject(
            ctx,
            GuardError::NotFound {
                kind: R::KIND,
                id: id.to_string(),
            },
        )
        .into()),
    }
}

/// Existence first, then exact equality between the stored `modified_at` and
/// the token the caller observed. Older, newer and malformed tokens all fail.
pub fn require_current_version<R, E, F>(
    ctx: &OperatorContext,
    id: &R::Id,
    expected_version: &str,
    lookup: F,
) -> Result<R, E>
where
    R: Versioned,
    E: From<GuardError>,
    F: FnOnce() -> Result<Option<R>, E>,
{
    let record = require_exists(ctx, id, lookup)?;
    if record.modified_at() != expected_version {
        return Err(reject(
            ctx,
            GuardError::Conflict {
                kind: R::KIND,
                id: id.to_string(),
                expected: expected_version.to_string(),
            },
        )
        .into());
    }
    Ok(record)
}

/// `current_id` is `None` on create and the record's own id on update; a
/// record is never a duplicate of itself.
pub fn require_no_duplicate<R, E, F>(
    ctx: &OperatorContext,
    key: &'static str,
    value: &str,
    current_id: Option<&R::Id>,
    lookup: F,
) -> Result<(), E>
where
    R: Versioned,
    E: From<GuardError>,
    F: FnOnce() -> Result<Option<R>, E>,
{
    match lookup()? {
        Some(existing) if Some(existing.record_id()) != current_id => Err(reject(
            ctx,
            GuardError::Duplicate {
                kind: R::KIND,
                key,
                value: value.to_string(),
            },
        )
        .into()),
        _ => Ok(()),
    }
}

/// Resolves the parent at the root of an ownership chain. A missing parent is
/// a bad foreign key (`InvalidReference`), not a missing record.
pub fn require_ownership<P, E, F>(ctx: &OperatorContext, parent_id: &P::Id, lookup: F) -> Result<P, E>
where
    P: Owned,
    E: From<GuardError>,
    F: FnOnce() -> Result<Option<P>, E>,
{
    let parent = match lookup()? {
        Some(parent) => parent,
        None => {
            return Err(reject(
                ctx,
                GuardError::InvalidReference {
                    kind: P::KIND,
                    id: parent_id.to_string(),
                },
            )
            .into())
        }
    };
    require_owner(ctx, &parent)?;
    Ok(parent)
}

/// Ownership check on a record that has already passed its existence or
/// version check.
pub fn require_owner<R: Owned>(ctx: &OperatorContext, record: &R) -> Result<(), GuardError> {
    if ctx.is(record.owner_id()) {
        return Ok(());
    }
    Err(reject(
        ctx,
        GuardError::Forbidden {
            kind: R::KIND,
            id: record.record_id().to_string(),
        },
    ))
}

/// Conflict raised when the store's conditional write matched no row, i.e. a
/// concurrent writer landed between the version check and the write.
pub fn stale_write<R: Versioned>(ctx: &OperatorContext, id: &R::Id, expected: &str) -> GuardError {
    reject(
        ctx,
        GuardError::Conflict {
            kind: R::KIND,
            id: id.to_string(),
            expected: expected.to_string(),
        },
    )
}

/// Plans for every item of a batch that passed validation. Only obtainable
/// from [`validate_batch`], so a commit can never start on a partially
/// validated batch.
#[derive(Debug)]
pub struct ValidatedBatch<P> {
    plans: Vec<P>,
}

impl<P> ValidatedBatch<P> {
    #[cfg(test)]
    pub fn is_empty(&self) -> bool {
        self.plans.is_empty()
    }

    /// Commits the plans in input order, stopping at the first failure.
    pub fn commit<R, E>(self, mut commit: impl FnMut(P) -> Result<R, E>) -> Result<Vec<R>, E> {
        let mut committed = Vec::with_capacity(self.plans.len());
        for plan in self.plans {
            committed.push(commit(plan)?);
        }
        Ok(committed)
    }
}

/// Phase one of a batch: validates every item without side effects. The
/// first failing item (in input order) fails the whole batch.
pub fn validate_batch<T, P, E>(
    ctx: &OperatorContext,
    items: &[T],
    mut validate: impl FnMut(&T) -> Result<P, E>,
) -> Result<ValidatedBatch<P>, E> {
    let mut plans = Vec::with_capacity(items.len());
    for (index, item) in items.iter().enumerate() {
        match validate(item) {
            Ok(plan) => plans.push(plan),
            Err(err) => {
                tracing::debug!(
                    request_id = %ctx.request_id,
                    index,
                    size = items.len(),
                    "batch item failed validation; nothing committed"
                );
                return Err(err);
            }
        }
    }
    Ok(ValidatedBatch { plans })
}

/// All-or-nothing batch: validate every item, then commit each in order.
/// Items are validated one after another on the caller's connection.
pub fn commit_batch<T, P, R, E>(
    ctx: &OperatorContext,
    items: &[T],
    validate: impl FnMut(&T) -> Result<P, E>,
    commit: impl FnMut(P) -> Result<R, E>,
) -> Result<Vec<R>, E> {
    let batch = validate_batch(ctx, items, validate)?;
    tracing::debug!(
        request_id = %ctx.request_id,
        size = batch.plans.len(),
        "batch validated; committing"
    );
    batch.commit(commit)
}

#[cfg(test)]
mod tests;
