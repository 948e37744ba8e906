//! Per-resource command handlers: map parsed arguments onto service calls and
//! render the outcome.

use std::io::Read;
use std::str::FromStr;

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::app::{App, AppError};
use crate::cli::{
    BatchInputArgs, BoardSubcommands, FileSubcommands, GroupSubcommands, PageArgs, SortArgs,
    SpaceSubcommands, TodoListArgs, TodoSubcommands, UserSubcommands,
};
use crate::context::OperatorContext;
use crate::entities::TodoStatus;
use crate::search::{PageRequest, PageResult, ParseSortError, SearchFilters, SortOrder};
use crate::services::{
    FilePatch, GroupPatch, GroupUpdate, NewFile, NewGroup, NewSpace, NewTodo, NewUser,
    NewWhiteboard, SearchQuery, SpacePatch, TodoPatch, TodoUpdate, UserPatch, WhiteboardPatch,
    WhiteboardSave,
};
use crate::ui::{self, Describe};
use crate::{operator_context, print_json, Output};

pub fn run_user(
    app: &App,
    operator: Option<&str>,
    out: Output,
    command: UserSubcommands,
) -> Result<(), AppError> {
    let users = app.users();
    match command {
        UserSubcommands::Register(args) => {
            let ctx = OperatorContext::new("anonymous");
            let user = users.register(
                &ctx,
                NewUser {
                    email: args.email,
                    display_name: args.display_name,
                },
            )?;
            emit_written(out, "registered", &user);
        }
        UserSubcommands::Show => {
            let ctx = operator_context(operator)?;
            emit_record(out, &users.get(&ctx, &ctx.operator_id)?);
        }
        UserSubcommands::Update(args) => {
            let ctx = operator_context(operator)?;
            let patch = UserPatch {
                email: args.email,
                display_name: args.display_name,
            };
            let user = users.update(&ctx, &ctx.operator_id, &args.if_match, patch)?;
            emit_written(out, "updated", &user);
        }
        UserSubcommands::Rm => {
            let ctx = operator_context(operator)?;
            let user = users.delete(&ctx, &ctx.operator_id)?;
            emit_written(out, "deleted", &user);
        }
    }
    Ok(())
}

pub fn run_space(
    app: &App,
    ctx: &OperatorContext,
    out: Output,
    command: SpaceSubcommands,
) -> Result<(), AppError> {
    let spaces = app.spaces();
    match command {
        SpaceSubcommands::New(args) => {
            let space = spaces.create(
                ctx,
                NewSpace {
                    name: args.name,
                    rank: args.rank,
                },
            )?;
            emit_written(out, "created", &space);
        }
        SpaceSubcommands::Show(args) => emit_record(out, &spaces.get(ctx, args.id)?),
        SpaceSubcommands::Update(args) => {
            let patch = SpacePatch {
                name: args.name,
                rank: args.rank,
            };
            let space = spaces.update(ctx, args.id, &args.if_match, patch)?;
            emit_written(out, "updated", &space);
        }
        SpaceSubcommands::Rm(args) => emit_written(out, "deleted", &spaces.delete(ctx, args.id)?),
        SpaceSubcommands::Ls(args) => {
            let filters = SearchFilters {
                keyword: args.query,
                ..SearchFilters::default()
            };
            if args.sort.sort.is_some() || args.page.requested() {
                let (sort, order) = sort_and_order(&args.sort)?;
                let query = SearchQuery {
                    filters,
                    sort,
                    order,
                    page: page_request(out, &args.page)?,
                };
                emit_page(out, "Spaces", &spaces.search(ctx, &query)?, query.page);
            } else {
                emit_list(out, "Spaces", &spaces.list(ctx, &filters)?);
            }
        }
    }
    Ok(())
}

pub fn run_group(
    app: &App,
    ctx: &OperatorContext,
    out: Output,
    command: GroupSubcommands,
) -> Result<(), AppError> {
    let groups = app.groups();
    match command {
        GroupSubcommands::New(args) => {
            let group = groups.create(
                ctx,
                NewGroup {
                    name: args.name,
                    space_id: args.space_id,
                    rank: args.rank,
                },
            )?;
            emit_written(out, "created", &group);
        }
        GroupSubcommands::Show(args) => emit_record(out, &groups.get(ctx, args.id)?),
        GroupSubcommands::Update(args) => {
            let patch = GroupPatch {
                name: args.name,
                rank: args.rank,
                space_id: args.space_id,
            };
            let group = groups.update(ctx, args.id, &args.if_match, patch)?;
            emit_written(out, "updated", &group);
        }
        GroupSubcommands::Reorder(args) => {
            let items: Vec<GroupUpdate> = read_batch(&args)?;
            emit_many(out, "updated", &groups.update_many(ctx, &items)?);
        }
        GroupSubcommands::Rm(args) => emit_written(out, "deleted", &groups.delete(ctx, args.id)?),
        GroupSubcommands::Ls(args) => {
            let filters = SearchFilters {
                ids: args.space_ids,
                keyword: args.query,
                statuses: Vec::new(),
            };
            emit_list(out, "Groups", &groups.list(ctx, &filters)?);
        }
    }
    Ok(())
}

pub fn run_todo(
    app: &App,
    ctx: &OperatorContext,
    out: Output,
    command: TodoSubcommands,
) -> Result<(), AppError> {
    let todos = app.todos();
    match command {
        TodoSubcommands::New(args) => {
            let todo = todos.create(
                ctx,
                NewTodo {
                    group_id: args.group_id,
                    title: args.title,
                    description: args.description,
                    rank: args.rank,
                    due_at: args.due_at,
                },
            )?;
            emit_written(out, "created", &todo);
        }
        TodoSubcommands::Show(args) => emit_record(out, &todos.get(ctx, args.id)?),
        TodoSubcommands::Update(args) => {
            let patch = TodoPatch {
                title: args.title,
                description: args.description,
                rank: args.rank,
                due_at: args.due_at,
                group_id: args.group_id,
                done: None,
            };
            let todo = todos.update(ctx, args.id, &args.if_match, patch)?;
            emit_written(out, "updated", &todo);
        }
        TodoSubcommands::Done(args) => {
            let todo = todos.update(ctx, args.id, &args.if_match, completion(true))?;
            emit_written(out, "completed", &todo);
        }
        TodoSubcommands::Undone(args) => {
            let todo = todos.update(ctx, args.id, &args.if_match, completion(false))?;
            emit_written(out, "reopened", &todo);
        }
        TodoSubcommands::Batch(args) => {
            let items: Vec<TodoUpdate> = read_batch(&args)?;
            emit_many(out, "updated", &todos.update_many(ctx, &items)?);
        }
        TodoSubcommands::Rm(args) => emit_written(out, "deleted", &todos.delete(ctx, args.id)?),
        TodoSubcommands::RmMany(args) => {
            emit_many(out, "deleted", &todos.delete_many(ctx, &args.ids)?);
        }
        TodoSubcommands::Ls(args) => {
            let filters = todo_filters(args)?;
            emit_list(out, "Todos", &todos.list(ctx, &filters)?);
        }
        TodoSubcommands::Search(args) => {
            let (sort, order) = sort_and_order(&args.sort)?;
            let query = SearchQuery {
                filters: todo_filters(args.filters)?,
                sort,
                order,
                page: page_request(out, &args.page)?,
            };
            emit_page(out, "Todos", &todos.search(ctx, &query)?, query.page);
        }
    }
    Ok(())
}

pub fn run_board(
    app: &App,
    ctx: &OperatorContext,
    out: Output,
    command: BoardSubcommands,
) -> Result<(), AppError> {
    let boards = app.whiteboards();
    match command {
        BoardSubcommands::New(args) => {
            let board = boards.create(
                ctx,
                NewWhiteboard {
                    space_id: args.space_id,
                    title: args.title,
                    content: args.content,
                },
            )?;
            emit_written(out, "created", &board);
        }
        BoardSubcommands::Show(args) => {
            let board = boards.get(ctx, args.id)?;
            if out.json {
                print_json(&board);
            } else {
                ui::print_record(&board);
                println!("{}", board.content);
            }
        }
        BoardSubcommands::Update(args) => {
            let patch = WhiteboardPatch {
                title: args.title,
                content: args.content,
            };
            let board = boards.update(ctx, args.id, &args.if_match, patch)?;
            emit_written(out, "updated", &board);
        }
        BoardSubcommands::Save(args) => {
            let board = boards.upsert(
                ctx,
                WhiteboardSave {
                    id: args.id,
                    space_id: args.space_id,
                    title: args.title,
                    content: args.content,
                },
            )?;
            emit_written(out, "saved", &board);
        }
        BoardSubcommands::Rm(args) => emit_written(out, "deleted", &boards.delete(ctx, args.id)?),
        BoardSubcommands::Ls(args) => {
            let filters = SearchFilters {
                ids: args.space_ids,
                keyword: args.query,
                statuses: Vec::new(),
            };
            emit_list(out, "Whiteboards", &boards.list(ctx, &filters)?);
        }
    }
    Ok(())
}

pub fn run_file(
    app: &App,
    ctx: &OperatorContext,
    out: Output,
    command: FileSubcommands,
) -> Result<(), AppError> {
    let files = app.files();
    match command {
        FileSubcommands::Add(args) => {
            let file = files.create(
                ctx,
                NewFile {
                    name: args.name,
                    mime_type: args.mime_type,
                    size_bytes: args.size_bytes,
                    storage_key: args.storage_key,
                    space_id: args.space_id,
                },
            )?;
            emit_written(out, "added", &file);
        }
        FileSubcommands::Show(args) => emit_record(out, &files.get(ctx, args.id)?),
        FileSubcommands::Update(args) => {
            let patch = FilePatch {
                name: args.name,
                space_id: args.space_id,
            };
            let file = files.update(ctx, args.id, &args.if_match, patch)?;
            emit_written(out, "updated", &file);
        }
        FileSubcommands::Rm(args) => emit_written(out, "deleted", &files.delete(ctx, args.id)?),
        FileSubcommands::RmMany(args) => {
            emit_many(out, "deleted", &files.delete_many(ctx, &args.ids)?);
        }
        FileSubcommands::Search(args) => {
            let (sort, order) = sort_and_order(&args.sort)?;
            let query = SearchQuery {
                filters: SearchFilters {
                    ids: args.space_ids,
                    keyword: args.query,
                    statuses: Vec::new(),
                },
                sort,
                order,
                page: page_request(out, &args.page)?,
            };
            emit_page(out, "Files", &files.search(ctx, &query)?, query.page);
        }
    }
    Ok(())
}

fn completion(done: bool) -> TodoPatch {
    TodoPatch {
        done: Some(done),
        ..TodoPatch::default()
    }
}

fn todo_filters(args: TodoListArgs) -> Result<SearchFilters<TodoStatus>, AppError> {
    let statuses = args
        .statuses
        .iter()
        .map(|raw| TodoStatus::from_str(raw))
        .collect::<Result<Vec<_>, _>>()?;
    Ok(SearchFilters {
        ids: args.group_ids,
        keyword: args.query,
        statuses,
    })
}

pub(crate) fn sort_and_order<F>(args: &SortArgs) -> Result<(F, SortOrder), AppError>
where
    F: FromStr<Err = ParseSortError> + Default,
{
    let sort = match args.sort.as_deref() {
        Some(raw) => F::from_str(raw)?,
        None => F::default(),
    };
    Ok((sort, SortOrder::from_str(&args.order)?))
}

pub(crate) fn page_request(out: Output, args: &PageArgs) -> Result<PageRequest, AppError> {
    let limit = args.limit.unwrap_or(out.page_size);
    if limit == 0 {
        return Err(AppError::InvalidArgument(
            "--limit must be at least 1".to_string(),
        ));
    }
    Ok(PageRequest::new(limit, args.page.unwrap_or(1)))
}

fn read_batch<T: DeserializeOwned>(args: &BatchInputArgs) -> Result<Vec<T>, AppError> {
    let raw = match args.file.as_deref() {
        Some(path) if path.as_os_str() != "-" => std::fs::read_to_string(path)?,
        _ => {
            let mut raw = String::new();
            std::io::stdin().read_to_string(&mut raw)?;
            raw
        }
    };
    let items: Vec<T> = serde_json::from_str(&raw)?;
    if items.is_empty() {
        return Err(AppError::InvalidArgument("batch is empty".to_string()));
    }
    Ok(items)
}

fn emit_written<T: Describe + Serialize>(out: Output, verb: &str, record: &T) {
    if out.json {
        print_json(record);
    } else {
        ui::print_written(verb, record);
    }
}

fn emit_record<T: Describe + Serialize>(out: Output, record: &T) {
    if out.json {
        print_json(record);
    } else {
        ui::print_record(record);
    }
}

fn emit_many<T: Describe + Serialize>(out: Output, verb: &str, records: &[T]) {
    if out.json {
        print_json(&records);
    } else {
        for record in records {
            ui::print_written(verb, record);
        }
    }
}

fn emit_list<T: Describe + Serialize>(out: Output, heading: &str, records: &[T]) {
    if out.json {
        print_json(&records);
    } else {
        ui::print_list(heading, records);
    }
}

fn emit_page<T: Describe + Serialize>(
    out: Output,
    heading: &str,
    page: &PageResult<T>,
    request: PageRequest,
) {
    if out.json {
        print_json(page);
    } else {
        ui::print_page(heading, page, request.page);
    }
}
