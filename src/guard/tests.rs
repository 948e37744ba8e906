use std::cell::RefCell;

use thiserror::Error;

use super::{
    commit_batch, require_current_version, require_exists, require_no_duplicate, require_owner,
    require_ownership, validate_batch, GuardError, Owned, Versioned,
};
use crate::context::OperatorContext;
use crate::entities::EntityKind;

#[derive(Debug, Clone, PartialEq, Eq)]
struct Card {
    id: i64,
    owner: String,
    version: String,
}

impl Versioned for Card {
    type Id = i64;
    const KIND: EntityKind = EntityKind::Todo;

    fn record_id(&self) -> &i64 {
        &self.id
    }

    fn modified_at(&self) -> &str {
        &self.version
    }
}

impl Owned for Card {
    fn owner_id(&self) -> &str {
        &self.owner
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
enum TestError {
    #[error(transparent)]
    Guard(#[from] GuardError),
    #[error("store unavailable")]
    Store,
}

fn card(id: i64, owner: &str, version: &str) -> Card {
    Card {
        id,
        owner: owner.to_string(),
        version: version.to_string(),
    }
}

fn ctx() -> OperatorContext {
    OperatorContext::with_request_id("alice", "req-1")
}

const V1: &str = "2026-03-01T10:00:00.000000001Z";

#[test]
fn require_exists_returns_the_record_or_not_found() {
    let found: Result<Card, GuardError> =
        require_exists(&ctx(), &7, || Ok(Some(card(7, "alice", V1))));
    assert_eq!(found.expect("record should be returned").id, 7);

    let missing: Result<Card, GuardError> = require_exists(&ctx(), &7, || Ok(None));
    assert_eq!(
        missing,
        Err(GuardError::NotFound {
            kind: EntityKind::Todo,
            id: "7".to_string(),
        })
    );
}

#[test]
fn lookup_failures_propagate_unchanged() {
    let result: Result<Card, TestError> = require_exists(&ctx(), &1, || Err(TestError::Store));
    assert_eq!(result, Err(TestError::Store));

    let result: Result<(), TestError> =
        require_no_duplicate::<Card, _, _>(&ctx(), "email", "a@x", None, || Err(TestError::Store));
    assert_eq!(result, Err(TestError::Store));
}

#[test]
fn current_version_requires_exact_equality() {
    let ok: Result<Card, GuardError> =
        require_current_version(&ctx(), &1, V1, || Ok(Some(card(1, "alice", V1))));
    assert!(ok.is_ok());

    let rejected = [
        "2026-03-01T10:00:00.000000000Z",
        "2026-03-01T10:00:00.000000002Z",
        "2026-03-01T10:00:00Z",
        "garbage",
        "",
    ];
    for token in rejected {
        let result: Result<Card, GuardError> =
            require_current_version(&ctx(), &1, token, || Ok(Some(card(1, "alice", V1))));
        assert!(
            matches!(result, Err(GuardError::Conflict { .. })),
            "token {token:?} should conflict"
        );
    }
}

#[test]
fn current_version_reports_not_found_before_conflict() {
    let result: Result<Card, GuardError> =
        require_current_version(&ctx(), &9, "stale", || Ok(None));
    assert!(matches!(result, Err(GuardError::NotFound { .. })));
}

#[test]
fn a_record_is_never_a_duplicate_of_itself() {
    let existing = card(3, "alice", V1);

    let on_update: Result<(), GuardError> =
        require_no_duplicate(&ctx(), "email", "a@x", Some(&3), || Ok(Some(existing.clone())));
    assert!(on_update.is_ok());

    let on_create: Result<(), GuardError> =
        require_no_duplicate(&ctx(), "email", "a@x", None, || Ok(Some(existing.clone())));
    assert_eq!(
        on_create,
        Err(GuardError::Duplicate {
            kind: EntityKind::Todo,
            key: "email",
            value: "a@x".to_string(),
        })
    );

    let other_record: Result<(), GuardError> =
        require_no_duplicate(&ctx(), "email", "a@x", Some(&4), || Ok(Some(existing)));
    assert!(matches!(other_record, Err(GuardError::Duplicate { .. })));

    let free: Result<(), GuardError> =
        require_no_duplicate::<Card, _, _>(&ctx(), "email", "a@x", None, || Ok(None));
    assert!(free.is_ok());
}

#[test]
fn ownership_distinguishes_missing_parent_from_foreign_owner() {
    let missing: Result<Card, GuardError> = require_ownership(&ctx(), &999999, || Ok(None));
    assert_eq!(
        missing,
        Err(GuardError::InvalidReference {
            kind: EntityKind::Todo,
            id: "999999".to_string(),
        })
    );

    let foreign: Result<Card, GuardError> =
        require_ownership(&ctx(), &5, || Ok(Some(card(5, "bob", V1))));
    assert!(matches!(foreign, Err(GuardError::Forbidden { .. })));

    let own: Result<Card, GuardError> =
        require_ownership(&ctx(), &5, || Ok(Some(card(5, "alice", V1))));
    assert_eq!(own.expect("own parent should resolve").id, 5);
}

#[test]
fn require_owner_checks_resolved_records() {
    assert!(require_owner(&ctx(), &card(1, "alice", V1)).is_ok());
    assert_eq!(
        require_owner(&ctx(), &card(1, "mallory", V1)),
        Err(GuardError::Forbidden {
            kind: EntityKind::Todo,
            id: "1".to_string(),
        })
    );
}

#[test]
fn batch_commits_every_item_in_input_order() {
    let committed = RefCell::new(Vec::new());
    let result: Result<Vec<i64>, GuardError> = commit_batch(
        &ctx(),
        &[3_i64, 1, 2],
        |id| Ok(*id * 10),
        |plan| {
            committed.borrow_mut().push(plan);
            Ok(plan)
        },
    );
    assert_eq!(result.expect("batch should commit"), vec![30, 10, 20]);
    assert_eq!(*committed.borrow(), vec![30, 10, 20]);
}

#[test]
fn batch_failure_commits_nothing_and_reports_first_failing_item() {
    for failing in 0..4usize {
        let committed = RefCell::new(Vec::new());
        let validated = RefCell::new(0usize);
        let items: Vec<usize> = (0..4).collect();
        let result: Result<Vec<usize>, GuardError> = commit_batch(
            &ctx(),
            &items,
            |index| {
                *validated.borrow_mut() += 1;
                if *index >= failing {
                    return Err(GuardError::Conflict {
                        kind: EntityKind::Todo,
                        id: index.to_string(),
                        expected: V1.to_string(),
                    });
                }
                Ok(*index)
            },
            |plan| {
                committed.borrow_mut().push(plan);
                Ok(plan)
            },
        );

        assert_eq!(
            result,
            Err(GuardError::Conflict {
                kind: EntityKind::Todo,
                id: failing.to_string(),
                expected: V1.to_string(),
            })
        );
        assert!(committed.borrow().is_empty(), "no item may be committed");
        assert_eq!(*validated.borrow(), failing + 1);
    }
}

#[test]
fn empty_batches_are_a_no_op() {
    let batch = validate_batch::<i64, i64, GuardError>(&ctx(), &[], |id| Ok(*id))
        .expect("empty batch should validate");
    assert!(batch.is_empty());
    let committed: Vec<i64> = batch
        .commit(|plan| Ok::<_, GuardError>(plan))
        .expect("empty batch should commit");
    assert!(committed.is_empty());
}

#[test]
fn status_codes_follow_the_transport_mapping() {
    let cases = [
        (
            GuardError::NotFound {
                kind: EntityKind::Todo,
                id: "1".to_string(),
            },
            "NOT_FOUND",
        ),
        (
            GuardError::Conflict {
                kind: EntityKind::Todo,
                id: "1".to_string(),
                expected: V1.to_string(),
            },
            "CONFLICT",
        ),
        (
            GuardError::Duplicate {
                kind: EntityKind::User,
                key: "email",
                value: "a@x".to_string(),
            },
            "CONFLICT",
        ),
        (
            GuardError::Forbidden {
                kind: EntityKind::Group,
                id: "1".to_string(),
            },
            "FORBIDDEN",
        ),
        (
            GuardError::InvalidReference {
                kind: EntityKind::Group,
                id: "999999".to_string(),
            },
            "BAD_REQUEST",
        ),
    ];
    for (err, code) in cases {
        assert_eq!(err.status_code(), code, "{err}");
    }
}
