mod app;
mod cli;
mod cli_ops;
mod config;
mod context;
mod db;
mod dispatch;
mod entities;
mod guard;
mod logging;
mod search;
mod services;
mod store;
mod ui;

use app::AppError;
use context::OperatorContext;

fn main() {
    if let Err(err) = run() {
        eprintln!("error[{}]: {}", err.status_code(), err);
        std::process::exit(1);
    }
}

fn print_json(value: &impl serde::Serialize) {
    println!(
        "{}",
        serde_json::to_string_pretty(value).expect("json serialization should work")
    );
}

/// How results are rendered for this invocation.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Output {
    pub json: bool,
    pub page_size: u64,
}

fn run() -> Result<(), AppError> {
    use clap::Parser;
    use cli::Commands;

    let cli = cli::Cli::parse();
    let config = config::Config::load(cli.config.as_deref())?;
    logging::init(&config.log_filter, config.log_format);

    let db_path = cli.db.clone().unwrap_or_else(|| config.db_path.clone());
    let app = app::App::open(&db_path)?;
    let out = Output {
        json: cli.json,
        page_size: config.page_size,
    };
    let operator = cli.operator.as_deref();

    match cli.command {
        Commands::User(args) => dispatch::run_user(&app, operator, out, args.command),
        Commands::Space(args) => {
            dispatch::run_space(&app, &operator_context(operator)?, out, args.command)
        }
        Commands::Group(args) => {
            dispatch::run_group(&app, &operator_context(operator)?, out, args.command)
        }
        Commands::Todo(args) => {
            dispatch::run_todo(&app, &operator_context(operator)?, out, args.command)
        }
        Commands::Board(args) => {
            dispatch::run_board(&app, &operator_context(operator)?, out, args.command)
        }
        Commands::File(args) => {
            dispatch::run_file(&app, &operator_context(operator)?, out, args.command)
        }
    }
}

/// Identity for commands that act on owned data. The CLI trusts `--as`; it
/// stands in for an already authenticated session.
fn operator_context(operator: Option<&str>) -> Result<OperatorContext, AppError> {
    let operator = operator.map(str::trim).filter(|value| !value.is_empty());
    match operator {
        Some(operator_id) => {
            let ctx = OperatorContext::new(operator_id);
            tracing::debug!(
                request_id = %ctx.request_id,
                operator_id = %ctx.operator_id,
                "request context established"
            );
            Ok(ctx)
        }
        None => Err(AppError::InvalidArgument(
            "no operator; pass --as <USER_ID> or set TASKDEN_OPERATOR".to_string(),
        )),
    }
}
