use std::path::PathBuf;

use clap::builder::styling::{AnsiColor, Effects, Styles};
use clap::{Args, Parser, Subcommand};

pub use crate::cli_ops::*;

fn cli_styles() -> Styles {
    Styles::styled()
        .header(AnsiColor::BrightCyan.on_default() | Effects::BOLD)
        .usage(AnsiColor::BrightYellow.on_default() | Effects::BOLD)
        .literal(AnsiColor::BrightGreen.on_default() | Effects::BOLD)
        .placeholder(AnsiColor::BrightMagenta.on_default())
}

#[derive(Debug, Parser)]
#[command(name = "den")]
#[command(bin_name = "den")]
#[command(version)]
#[command(about = "Owner-scoped todos, whiteboards and files over a local SQLite store")]
#[command(styles = cli_styles())]
pub struct Cli {
    #[arg(
        short = 'c',
        long,
        global = true,
        env = "TASKDEN_CONFIG",
        help = "Path to a TOML config file (defaults to .taskden/config.toml when present)."
    )]
    pub config: Option<PathBuf>,

    #[arg(
        short = 'd',
        long,
        global = true,
        env = "TASKDEN_DB_PATH",
        help = "Path to the SQLite database; overrides db_path from config."
    )]
    pub db: Option<String>,

    #[arg(
        long = "as",
        global = true,
        env = "TASKDEN_OPERATOR",
        value_name = "USER_ID",
        help = "Id of the authenticated user the command runs as."
    )]
    pub operator: Option<String>,

    #[arg(long, global = true, help = "Print machine readable JSON.")]
    pub json: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    #[command(about = "Register and manage user accounts.")]
    User(UserArgs),
    #[command(about = "Manage spaces.")]
    Space(SpaceArgs),
    #[command(about = "Manage todo groups.")]
    Group(GroupArgs),
    #[command(about = "Manage todos.")]
    Todo(TodoArgs),
    #[command(about = "Manage whiteboards.")]
    Board(BoardArgs),
    #[command(about = "Manage file metadata.")]
    File(FileArgs),
}

#[derive(Debug, Args)]
pub struct UserArgs {
    #[command(subcommand)]
    pub command: UserSubcommands,
}

#[derive(Debug, Subcommand)]
pub enum UserSubcommands {
    #[command(about = "Register a new user; prints the new user id.")]
    Register(UserRegisterArgs),
    #[command(about = "Show the current user.")]
    Show,
    #[command(about = "Update the current user.")]
    Update(UserUpdateArgs),
    #[command(about = "Delete the current user and everything it owns.")]
    Rm,
}

#[derive(Debug, Args)]
pub struct UserRegisterArgs {
    #[arg(help = "Email address; must be unique.")]
    pub email: String,

    #[arg(short = 'n', long = "name", help = "Display name.")]
    pub display_name: String,
}

#[derive(Debug, Args)]
pub struct UserUpdateArgs {
    #[arg(long = "if-match", help = "Version (modified_at) last read.")]
    pub if_match: String,

    #[arg(long, help = "New email address.")]
    pub email: Option<String>,

    #[arg(short = 'n', long = "name", help = "New display name.")]
    pub display_name: Option<String>,
}

#[derive(Debug, Args)]
pub struct SpaceArgs {
    #[command(subcommand)]
    pub command: SpaceSubcommands,
}

#[derive(Debug, Subcommand)]
pub enum SpaceSubcommands {
    #[command(about = "Create a space.")]
    New(SpaceNewArgs),
    #[command(about = "Show one space.")]
    Show(IdArg),
    #[command(about = "Rename or reorder a space.")]
    Update(SpaceUpdateArgs),
    #[command(about = "Delete a space and its whiteboards.")]
    Rm(IdArg),
    #[command(about = "List spaces by rank, or page through them with --page.")]
    Ls(SpaceListArgs),
}

#[derive(Debug, Args)]
pub struct SpaceNewArgs {
    #[arg(help = "Space name.")]
    pub name: String,

    #[arg(short = 'r', long, help = "Sort rank (lower first).")]
    pub rank: Option<i64>,
}

#[derive(Debug, Args)]
pub struct SpaceUpdateArgs {
    #[arg(help = "Space id.")]
    pub id: i64,

    #[arg(long = "if-match", help = "Version (modified_at) last read.")]
    pub if_match: String,

    #[arg(long, help = "New name.")]
    pub name: Option<String>,

    #[arg(short = 'r', long, help = "New rank.")]
    pub rank: Option<i64>,
}

#[derive(Debug, Args)]
pub struct SpaceListArgs {
    #[arg(short = 'q', long = "query", help = "Keyword matched against the name.")]
    pub query: Option<String>,

    #[command(flatten)]
    pub sort: SortArgs,

    #[command(flatten)]
    pub page: PageArgs,
}

#[derive(Debug, Args)]
pub struct IdArg {
    #[arg(help = "Record id.")]
    pub id: i64,
}

#[derive(Debug, Args)]
pub struct IdsArg {
    #[arg(required = true, num_args = 1.., help = "Record ids.")]
    pub ids: Vec<i64>,
}
