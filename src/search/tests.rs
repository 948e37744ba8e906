use rusqlite::types::Value;
use rusqlite::Connection;
use uuid::Uuid;

use super::{
    build_predicate, paginate, resolve_sort, status_clause, Clause, PageRequest, Predicate,
    SearchFilters, SortOrder,
};
use crate::context::OperatorContext;
use crate::db::open_connection;
use crate::entities::group::GroupSort;
use crate::entities::{GroupRecord, SpaceRecord, TodoRecord, TodoSort, TodoStatus};
use crate::store::{self, FieldSet};

fn unique_db_path() -> String {
    std::env::temp_dir()
        .join(format!("taskden-search-{}.sqlite", Uuid::now_v7()))
        .display()
        .to_string()
}

fn cleanup_db_files(path: &str) {
    for suffix in ["", "-wal", "-shm"] {
        let _ = std::fs::remove_file(format!("{path}{suffix}"));
    }
}

fn ctx(operator: &str) -> OperatorContext {
    OperatorContext::with_request_id(operator, "req-search")
}

fn todo_filters(
    ids: Vec<i64>,
    keyword: Option<&str>,
    statuses: Vec<TodoStatus>,
) -> SearchFilters<TodoStatus> {
    SearchFilters {
        ids,
        keyword: keyword.map(str::to_string),
        statuses,
    }
}

#[test]
fn empty_predicate_renders_no_where_clause() {
    let (sql, params) = Predicate::unscoped().render();
    assert_eq!(sql, "");
    assert!(params.is_empty());
}

#[test]
fn renders_clauses_in_order_with_positional_params() {
    let predicate = Predicate::owned_by::<TodoRecord>("alice")
        .and(Clause::In {
            column: "t.group_id",
            values: vec![Value::Integer(3), Value::Integer(4)],
        })
        .and(Clause::AnyOf(vec![
            Clause::IsNull("t.done_at"),
            Clause::IsNotNull("t.due_at"),
        ]));
    let (sql, params) = predicate.render();
    assert_eq!(
        sql,
        " WHERE g.owner_id = ? AND t.group_id IN (?, ?) AND (t.done_at IS NULL OR t.due_at IS NOT NULL)"
    );
    assert_eq!(
        params,
        vec![
            Value::Text("alice".to_string()),
            Value::Integer(3),
            Value::Integer(4),
        ]
    );
}

#[test]
fn keyword_clause_escapes_like_wildcards() {
    let predicate = Predicate::unscoped().and(Clause::Contains {
        columns: &["t.title", "t.description"],
        keyword: "50%_off\\".to_string(),
    });
    let (sql, params) = predicate.render();
    assert_eq!(
        sql,
        " WHERE (t.title LIKE ? ESCAPE '\\' OR t.description LIKE ? ESCAPE '\\')"
    );
    let expected = Value::Text("%50\\%\\_off\\\\%".to_string());
    assert_eq!(params, vec![expected.clone(), expected]);
}

#[test]
fn every_predicate_starts_with_owner_scope() {
    let predicate = build_predicate::<TodoRecord>(&ctx("alice"), &SearchFilters::default());
    assert_eq!(
        predicate.clauses(),
        &[Clause::Eq {
            column: "g.owner_id",
            value: Value::Text("alice".to_string()),
        }]
    );
}

#[test]
fn empty_id_list_and_empty_keyword_add_no_clause() {
    let bare = build_predicate::<TodoRecord>(&ctx("alice"), &SearchFilters::default());
    let empty = build_predicate::<TodoRecord>(
        &ctx("alice"),
        &todo_filters(Vec::new(), Some(""), Vec::new()),
    );
    assert_eq!(bare, empty);
}

#[test]
fn keyword_is_matched_as_given_including_whitespace() {
    let spaced = build_predicate::<TodoRecord>(
        &ctx("alice"),
        &todo_filters(Vec::new(), Some("  milk "), Vec::new()),
    );
    assert_eq!(spaced.clauses().len(), 2);
    assert!(matches!(
        &spaced.clauses()[1],
        Clause::Contains { keyword, .. } if keyword == "  milk "
    ));

    let whitespace = build_predicate::<TodoRecord>(
        &ctx("alice"),
        &todo_filters(Vec::new(), Some("   "), Vec::new()),
    );
    assert_eq!(whitespace.clauses().len(), 2);
}

#[test]
fn full_or_empty_status_set_collapses_to_no_filter() {
    let bare = build_predicate::<TodoRecord>(&ctx("alice"), &SearchFilters::default());
    let both = build_predicate::<TodoRecord>(
        &ctx("alice"),
        &todo_filters(Vec::new(), None, vec![TodoStatus::Done, TodoStatus::Active]),
    );
    let repeated = build_predicate::<TodoRecord>(
        &ctx("alice"),
        &todo_filters(
            Vec::new(),
            None,
            vec![TodoStatus::Active, TodoStatus::Active, TodoStatus::Done],
        ),
    );
    assert_eq!(bare, both);
    assert_eq!(bare, repeated);
    assert_eq!(status_clause::<TodoStatus>(&[]), None);
}

#[test]
fn partial_status_set_becomes_any_of() {
    assert_eq!(
        status_clause(&[TodoStatus::Done, TodoStatus::Done]),
        Some(Clause::AnyOf(vec![Clause::IsNotNull("t.done_at")]))
    );
    assert_eq!(
        status_clause(&[TodoStatus::Active]),
        Some(Clause::AnyOf(vec![Clause::IsNull("t.done_at")]))
    );
}

#[test]
fn supplied_filters_are_anded_after_scope() {
    let predicate = build_predicate::<TodoRecord>(
        &ctx("alice"),
        &todo_filters(vec![7], Some(" milk "), vec![TodoStatus::Active]),
    );
    assert_eq!(
        predicate.clauses(),
        &[
            Clause::Eq {
                column: "g.owner_id",
                value: Value::Text("alice".to_string()),
            },
            Clause::In {
                column: "t.group_id",
                values: vec![Value::Integer(7)],
            },
            Clause::Contains {
                columns: &["t.title", "t.description"],
                keyword: "milk".to_string(),
            },
            Clause::AnyOf(vec![Clause::IsNull("t.done_at")]),
        ]
    );
}

#[test]
fn plain_sort_field_appends_id_tiebreak() {
    let key = resolve_sort::<TodoRecord>(TodoSort::Title, SortOrder::Desc);
    assert_eq!(key.order_by(), "t.title DESC, t.id ASC");
}

#[test]
fn parent_sort_resolves_through_the_ownership_join() {
    let key = resolve_sort::<TodoRecord>(TodoSort::Group, SortOrder::Asc);
    assert_eq!(
        key.terms(),
        &[
            ("g.rank", SortOrder::Asc),
            ("g.id", SortOrder::Asc),
            ("t.id", SortOrder::Asc),
        ]
    );

    let key = resolve_sort::<GroupRecord>(GroupSort::Space, SortOrder::Desc);
    assert_eq!(key.order_by(), "s.rank DESC, s.id DESC, g.id ASC");
}

#[test]
fn page_zero_reads_as_first_page() {
    assert_eq!(PageRequest::new(10, 0).offset(), 0);
    assert_eq!(PageRequest::new(10, 1).offset(), 0);
    assert_eq!(PageRequest::new(10, 3).offset(), 20);
    assert_eq!(PageRequest::new(u64::MAX, 3).offset(), u64::MAX);
}

#[test]
fn parses_sort_order_names() {
    assert_eq!("DESC".parse::<SortOrder>().unwrap(), SortOrder::Desc);
    assert_eq!("ascending".parse::<SortOrder>().unwrap(), SortOrder::Asc);
    let err = "sideways".parse::<SortOrder>().unwrap_err();
    assert!(err.to_string().contains("sideways"));
}

struct Fixture {
    path: String,
    conn: Connection,
    alice: String,
    groups: Vec<GroupRecord>,
}

/// Alice owns three groups ranked 2, 0, 1 with three todos each (the middle
/// todo of every group done); Bob owns one group with two todos.
fn seeded() -> Fixture {
    let path = unique_db_path();
    let conn = open_connection(&path).expect("connection should open");
    let alice = Uuid::now_v7().to_string();
    let bob = Uuid::now_v7().to_string();
    for (id, email) in [(&alice, "alice@example.com"), (&bob, "bob@example.com")] {
        conn.execute(
            "INSERT INTO users (id, email, display_name, created_at, modified_at)
             VALUES (?1, ?2, 'x', '2026-01-01T00:00:00.000000000Z', '2026-01-01T00:00:00.000000000Z')",
            [id.as_str(), email],
        )
        .expect("user should insert");
    }

    let space: SpaceRecord = store::create(
        &conn,
        &FieldSet::new()
            .set("owner_id", alice.clone())
            .set("name", "Home".to_string()),
    )
    .expect("space should insert");

    let mut groups = Vec::new();
    for (name, rank) in [("Later", 2_i64), ("Now", 0), ("Soon", 1)] {
        let group: GroupRecord = store::create(
            &conn,
            &FieldSet::new()
                .set("owner_id", alice.clone())
                .set("space_id", space.id)
                .set("name", name.to_string())
                .set("rank", rank),
        )
        .expect("group should insert");
        for index in 0..3_i64 {
            let fields = FieldSet::new()
                .set("group_id", group.id)
                .set("title", format!("{name} task {index}"))
                .set("rank", index)
                .set_opt(
                    "done_at",
                    (index == 1).then(|| "2026-02-01T00:00:00.000000000Z".to_string()),
                );
            store::create::<TodoRecord>(&conn, &fields).expect("todo should insert");
        }
        groups.push(group);
    }

    let foreign: GroupRecord = store::create(
        &conn,
        &FieldSet::new()
            .set("owner_id", bob.clone())
            .set("name", "Bob".to_string()),
    )
    .expect("group should insert");
    for title in ["Bob task milk", "Bob task eggs"] {
        store::create::<TodoRecord>(
            &conn,
            &FieldSet::new()
                .set("group_id", foreign.id)
                .set("title", title.to_string()),
        )
        .expect("todo should insert");
    }

    Fixture {
        path,
        conn,
        alice,
        groups,
    }
}

#[test]
fn total_is_independent_of_limit_and_page() {
    let fixture = seeded();
    let ctx = ctx(&fixture.alice);
    let predicate = build_predicate::<TodoRecord>(&ctx, &SearchFilters::default());
    let sort = resolve_sort::<TodoRecord>(TodoSort::Rank, SortOrder::Asc);

    for (limit, page) in [(1, 1), (4, 1), (4, 3), (50, 1), (3, 99)] {
        let result =
            paginate::<TodoRecord>(&fixture.conn, &predicate, &sort, PageRequest::new(limit, page))
                .expect("paginate should run");
        assert_eq!(result.total, 9, "limit {limit} page {page}");
        assert!((result.items.len() as u64) <= limit);
    }

    let last = paginate::<TodoRecord>(&fixture.conn, &predicate, &sort, PageRequest::new(4, 3))
        .expect("paginate should run");
    assert_eq!(last.items.len(), 1);

    let beyond = paginate::<TodoRecord>(&fixture.conn, &predicate, &sort, PageRequest::new(3, 99))
        .expect("paginate should run");
    assert!(beyond.items.is_empty());

    cleanup_db_files(&fixture.path);
}

#[test]
fn collapsed_status_filter_returns_identical_results() {
    let fixture = seeded();
    let ctx = ctx(&fixture.alice);
    let sort = resolve_sort::<TodoRecord>(TodoSort::Title, SortOrder::Asc);
    let page = PageRequest::new(100, 1);

    let none = build_predicate::<TodoRecord>(&ctx, &todo_filters(Vec::new(), None, Vec::new()));
    let both = build_predicate::<TodoRecord>(
        &ctx,
        &todo_filters(Vec::new(), None, vec![TodoStatus::Active, TodoStatus::Done]),
    );
    let none = paginate::<TodoRecord>(&fixture.conn, &none, &sort, page).expect("paginate");
    let both = paginate::<TodoRecord>(&fixture.conn, &both, &sort, page).expect("paginate");
    assert_eq!(none, both);

    let done = build_predicate::<TodoRecord>(
        &ctx,
        &todo_filters(Vec::new(), None, vec![TodoStatus::Done]),
    );
    let done = paginate::<TodoRecord>(&fixture.conn, &done, &sort, page).expect("paginate");
    assert_eq!(done.total, 3);
    assert!(done.items.iter().all(|todo| todo.status() == TodoStatus::Done));

    cleanup_db_files(&fixture.path);
}

#[test]
fn owner_scope_hides_foreign_records_even_on_keyword_match() {
    let fixture = seeded();
    let ctx = ctx(&fixture.alice);
    let sort = resolve_sort::<TodoRecord>(TodoSort::Title, SortOrder::Asc);

    let predicate = build_predicate::<TodoRecord>(&ctx, &todo_filters(Vec::new(), Some("MILK"), Vec::new()));
    let result = paginate::<TodoRecord>(&fixture.conn, &predicate, &sort, PageRequest::new(10, 1))
        .expect("paginate should run");
    assert_eq!(result.total, 0);
    assert!(result.items.is_empty());

    let predicate = build_predicate::<TodoRecord>(&ctx, &todo_filters(Vec::new(), Some("soon"), Vec::new()));
    let result = paginate::<TodoRecord>(&fixture.conn, &predicate, &sort, PageRequest::new(10, 1))
        .expect("paginate should run");
    assert_eq!(result.total, 3);

    for untrimmed in ["task 2 ", "  "] {
        let predicate =
            build_predicate::<TodoRecord>(&ctx, &todo_filters(Vec::new(), Some(untrimmed), Vec::new()));
        let result = paginate::<TodoRecord>(&fixture.conn, &predicate, &sort, PageRequest::new(10, 1))
            .expect("paginate should run");
        assert_eq!(result.total, 0, "keyword {untrimmed:?} must not be trimmed");
    }

    cleanup_db_files(&fixture.path);
}

#[test]
fn id_list_filter_restricts_to_given_parents() {
    let fixture = seeded();
    let ctx = ctx(&fixture.alice);
    let sort = resolve_sort::<TodoRecord>(TodoSort::Rank, SortOrder::Asc);
    let wanted = fixture.groups[1].id;

    let predicate = build_predicate::<TodoRecord>(&ctx, &todo_filters(vec![wanted], None, Vec::new()));
    let result = paginate::<TodoRecord>(&fixture.conn, &predicate, &sort, PageRequest::new(10, 1))
        .expect("paginate should run");
    assert_eq!(result.total, 3);
    assert!(result.items.iter().all(|todo| todo.group_id == wanted));

    cleanup_db_files(&fixture.path);
}

#[test]
fn group_sort_orders_todos_by_group_rank() {
    let fixture = seeded();
    let ctx = ctx(&fixture.alice);
    let predicate = build_predicate::<TodoRecord>(&ctx, &SearchFilters::default());
    let sort = resolve_sort::<TodoRecord>(TodoSort::Group, SortOrder::Asc);

    let result = paginate::<TodoRecord>(&fixture.conn, &predicate, &sort, PageRequest::new(100, 1))
        .expect("paginate should run");
    let group_order: Vec<i64> = result.items.iter().map(|todo| todo.group_id).collect();

    // Groups ranked Now (0), Soon (1), Later (2); todos of a group stay together.
    let now = fixture.groups[1].id;
    let soon = fixture.groups[2].id;
    let later = fixture.groups[0].id;
    assert_eq!(
        group_order,
        vec![now, now, now, soon, soon, soon, later, later, later]
    );

    let sort = resolve_sort::<TodoRecord>(TodoSort::Group, SortOrder::Desc);
    let result = paginate::<TodoRecord>(&fixture.conn, &predicate, &sort, PageRequest::new(3, 1))
        .expect("paginate should run");
    assert!(result.items.iter().all(|todo| todo.group_id == later));

    cleanup_db_files(&fixture.path);
}
