use std::path::PathBuf;

use clap::{Args, Subcommand};

use crate::cli::{IdArg, IdsArg};

#[derive(Debug, Args)]
pub struct SortArgs {
    #[arg(short = 's', long, help = "Sort field; `group`/`space` sorts by the parent's rank.")]
    pub sort: Option<String>,

    #[arg(long, default_value = "asc", help = "Sort order: asc or desc.")]
    pub order: String,
}

#[derive(Debug, Args)]
pub struct PageArgs {
    #[arg(short = 'p', long, help = "1-based page number.")]
    pub page: Option<u64>,

    #[arg(short = 'l', long, help = "Page size (defaults to page_size from config).")]
    pub limit: Option<u64>,
}

impl PageArgs {
    pub fn requested(&self) -> bool {
        self.page.is_some() || self.limit.is_some()
    }
}

#[derive(Debug, Args)]
pub struct GroupArgs {
    #[command(subcommand)]
    pub command: GroupSubcommands,
}

#[derive(Debug, Subcommand)]
pub enum GroupSubcommands {
    #[command(about = "Create a todo group.")]
    New(GroupNewArgs),
    #[command(about = "Show one group.")]
    Show(IdArg),
    #[command(about = "Rename, rerank or move a group.")]
    Update(GroupUpdateArgs),
    #[command(
        about = "Apply a batch of group updates from JSON; all or nothing.",
        long_about = "Reads a JSON array of {\"id\", \"if_match\", \"name\"?, \"rank\"?, \"space_id\"?} \
                      objects from a file or stdin and applies every item or none."
    )]
    Reorder(BatchInputArgs),
    #[command(about = "Delete a group and its todos.")]
    Rm(IdArg),
    #[command(about = "List groups by rank.")]
    Ls(GroupListArgs),
}

#[derive(Debug, Args)]
pub struct GroupNewArgs {
    #[arg(help = "Group name.")]
    pub name: String,

    #[arg(long = "space", help = "Space the group belongs to.")]
    pub space_id: Option<i64>,

    #[arg(short = 'r', long, help = "Sort rank (lower first).")]
    pub rank: Option<i64>,
}

#[derive(Debug, Args)]
pub struct GroupUpdateArgs {
    #[arg(help = "Group id.")]
    pub id: i64,

    #[arg(long = "if-match", help = "Version (modified_at) last read.")]
    pub if_match: String,

    #[arg(long, help = "New name.")]
    pub name: Option<String>,

    #[arg(short = 'r', long, help = "New rank.")]
    pub rank: Option<i64>,

    #[arg(long = "space", help = "Move into this space.")]
    pub space_id: Option<i64>,
}

#[derive(Debug, Args)]
pub struct GroupListArgs {
    #[arg(long = "space", help = "Only groups in these spaces (repeatable).")]
    pub space_ids: Vec<i64>,

    #[arg(short = 'q', long = "query", help = "Keyword matched against the name.")]
    pub query: Option<String>,
}

#[derive(Debug, Args)]
pub struct TodoArgs {
    #[command(subcommand)]
    pub command: TodoSubcommands,
}

#[derive(Debug, Subcommand)]
pub enum TodoSubcommands {
    #[command(about = "Create a todo in a group.")]
    New(TodoNewArgs),
    #[command(about = "Show one todo.")]
    Show(IdArg),
    #[command(about = "Update todo fields.")]
    Update(TodoUpdateArgs),
    #[command(about = "Mark a todo done.")]
    Done(VersionedIdArgs),
    #[command(about = "Reopen a done todo.")]
    Undone(VersionedIdArgs),
    #[command(
        about = "Apply a batch of todo updates from JSON; all or nothing.",
        long_about = "Reads a JSON array of {\"id\", \"if_match\", ...fields} objects from a \
                      file or stdin. Every item is validated before any is written."
    )]
    Batch(BatchInputArgs),
    #[command(about = "Delete one todo.")]
    Rm(IdArg),
    #[command(about = "Delete several todos; all or nothing.")]
    RmMany(IdsArg),
    #[command(about = "List todos ordered by group.")]
    Ls(TodoListArgs),
    #[command(about = "Search todos with sorting and pagination.")]
    Search(TodoSearchArgs),
}

#[derive(Debug, Args)]
pub struct TodoNewArgs {
    #[arg(help = "Todo title.")]
    pub title: String,

    #[arg(short = 'g', long = "group", help = "Group the todo belongs to.")]
    pub group_id: i64,

    #[arg(long = "desc", help = "Optional description.")]
    pub description: Option<String>,

    #[arg(short = 'r', long, help = "Sort rank within the group.")]
    pub rank: Option<i64>,

    #[arg(long = "due", help = "Due date/time text.")]
    pub due_at: Option<String>,
}

#[derive(Debug, Args)]
pub struct TodoUpdateArgs {
    #[arg(help = "Todo id.")]
    pub id: i64,

    #[arg(long = "if-match", help = "Version (modified_at) last read.")]
    pub if_match: String,

    #[arg(long, help = "New title.")]
    pub title: Option<String>,

    #[arg(long = "desc", help = "New description; empty clears it.")]
    pub description: Option<String>,

    #[arg(short = 'r', long, help = "New rank.")]
    pub rank: Option<i64>,

    #[arg(long = "due", help = "New due date; empty clears it.")]
    pub due_at: Option<String>,

    #[arg(short = 'g', long = "group", help = "Move into this group.")]
    pub group_id: Option<i64>,
}

#[derive(Debug, Args)]
pub struct VersionedIdArgs {
    #[arg(help = "Record id.")]
    pub id: i64,

    #[arg(long = "if-match", help = "Version (modified_at) last read.")]
    pub if_match: String,
}

#[derive(Debug, Args)]
pub struct BatchInputArgs {
    #[arg(
        short = 'f',
        long = "file",
        help = "JSON file with the batch; reads stdin when omitted or '-'."
    )]
    pub file: Option<PathBuf>,
}

#[derive(Debug, Args)]
pub struct TodoListArgs {
    #[arg(short = 'g', long = "group", help = "Only todos in these groups (repeatable).")]
    pub group_ids: Vec<i64>,

    #[arg(long = "status", help = "Status filter: active or done (repeatable).")]
    pub statuses: Vec<String>,

    #[arg(short = 'q', long = "query", help = "Keyword matched against title and description.")]
    pub query: Option<String>,
}

#[derive(Debug, Args)]
pub struct TodoSearchArgs {
    #[command(flatten)]
    pub filters: TodoListArgs,

    #[command(flatten)]
    pub sort: SortArgs,

    #[command(flatten)]
    pub page: PageArgs,
}

#[derive(Debug, Args)]
pub struct BoardArgs {
    #[command(subcommand)]
    pub command: BoardSubcommands,
}

#[derive(Debug, Subcommand)]
pub enum BoardSubcommands {
    #[command(about = "Create a whiteboard in a space.")]
    New(BoardNewArgs),
    #[command(about = "Show one whiteboard including its content.")]
    Show(IdArg),
    #[command(about = "Retitle a whiteboard or replace its content.")]
    Update(BoardUpdateArgs),
    #[command(about = "Save a whiteboard, creating it when the id is unknown.")]
    Save(BoardSaveArgs),
    #[command(about = "Delete a whiteboard.")]
    Rm(IdArg),
    #[command(about = "List whiteboards.")]
    Ls(BoardListArgs),
}

#[derive(Debug, Args)]
pub struct BoardNewArgs {
    #[arg(help = "Whiteboard title.")]
    pub title: String,

    #[arg(long = "space", help = "Space the whiteboard belongs to.")]
    pub space_id: i64,

    #[arg(long, help = "Initial JSON content.")]
    pub content: Option<String>,
}

#[derive(Debug, Args)]
pub struct BoardUpdateArgs {
    #[arg(help = "Whiteboard id.")]
    pub id: i64,

    #[arg(long = "if-match", help = "Version (modified_at) last read.")]
    pub if_match: String,

    #[arg(long, help = "New title.")]
    pub title: Option<String>,

    #[arg(long, help = "New JSON content.")]
    pub content: Option<String>,
}

#[derive(Debug, Args)]
pub struct BoardSaveArgs {
    #[arg(long, help = "Whiteboard id to overwrite or create.")]
    pub id: Option<i64>,

    #[arg(long = "space", help = "Space the whiteboard belongs to.")]
    pub space_id: i64,

    #[arg(long, help = "Whiteboard title.")]
    pub title: String,

    #[arg(long, help = "JSON content.")]
    pub content: String,
}

#[derive(Debug, Args)]
pub struct BoardListArgs {
    #[arg(long = "space", help = "Only whiteboards in these spaces (repeatable).")]
    pub space_ids: Vec<i64>,

    #[arg(short = 'q', long = "query", help = "Keyword matched against the title.")]
    pub query: Option<String>,
}

#[derive(Debug, Args)]
pub struct FileArgs {
    #[command(subcommand)]
    pub command: FileSubcommands,
}

#[derive(Debug, Subcommand)]
pub enum FileSubcommands {
    #[command(about = "Record metadata for an uploaded file.")]
    Add(FileAddArgs),
    #[command(about = "Show one file record.")]
    Show(IdArg),
    #[command(about = "Rename or move a file.")]
    Update(FileUpdateArgs),
    #[command(about = "Delete one file record.")]
    Rm(IdArg),
    #[command(about = "Delete several file records; all or nothing.")]
    RmMany(IdsArg),
    #[command(about = "Search file records with sorting and pagination.")]
    Search(FileSearchArgs),
}

#[derive(Debug, Args)]
pub struct FileAddArgs {
    #[arg(help = "File name; unique per owner.")]
    pub name: String,

    #[arg(short = 'm', long = "mime", help = "MIME type.")]
    pub mime_type: String,

    #[arg(long = "size", help = "Size in bytes.")]
    pub size_bytes: i64,

    #[arg(short = 'k', long = "key", help = "Storage key of the uploaded bytes.")]
    pub storage_key: String,

    #[arg(long = "space", help = "Space the file belongs to.")]
    pub space_id: Option<i64>,
}

#[derive(Debug, Args)]
pub struct FileUpdateArgs {
    #[arg(help = "File id.")]
    pub id: i64,

    #[arg(long = "if-match", help = "Version (modified_at) last read.")]
    pub if_match: String,

    #[arg(long, help = "New name.")]
    pub name: Option<String>,

    #[arg(long = "space", help = "Move into this space.")]
    pub space_id: Option<i64>,
}

#[derive(Debug, Args)]
pub struct FileSearchArgs {
    #[arg(long = "space", help = "Only files in these spaces (repeatable).")]
    pub space_ids: Vec<i64>,

    #[arg(short = 'q', long = "query", help = "Keyword matched against name and MIME type.")]
    pub query: Option<String>,

    #[command(flatten)]
    pub sort: SortArgs,

    #[command(flatten)]
    pub page: PageArgs,
}
