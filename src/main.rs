use clap::Parser;
use sheetbook::args::{Args, Command};
use sheetbook::commands::{self, Session};
use sheetbook::{Config, Mode, Result};
use std::process::ExitCode;
use tracing::level_filters::LevelFilter;
use tracing::{debug, error, trace};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();
    let log_level = args.common().log_level();
    init_logger(log_level);
    debug!("Log level set to {}", log_level.to_string().to_lowercase());

    match main_inner(args).await {
        Ok(_) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{}", e.error_type().user_message());
            error!("Exiting with error: {e}");
            ExitCode::FAILURE
        }
    }
}

pub async fn main_inner(args: Args) -> Result<()> {
    trace!("{args:?}");
    let home = args.common().sheetbook_home().path();
    let user = args.common().user();

    // This allows for running the program without a backend. When SHEETBOOK_IN_TEST_MODE is set
    // and non-zero in length, then the mode will be Mode::Test, otherwise it will be Mode::Http.
    let mode = Mode::from_env();

    let _: () = match args.command() {
        Command::Init(init_args) => commands::init(home, init_args.api_url()).await?.print(),

        Command::Categories(categories_args) => commands::categories(categories_args.clone())
            .await?
            .print(),

        Command::List(list_args) => {
            let session = Session::open(Config::load(home).await?, mode, user).await?;
            commands::list(&session, list_args.clone()).await?.print()
        }

        Command::Add(add_args) => {
            let session = Session::open(Config::load(home).await?, mode, user).await?;
            commands::add(&session, add_args.clone()).await?.print()
        }

        Command::Update(update_args) => {
            let session = Session::open(Config::load(home).await?, mode, user).await?;
            commands::update(&session, update_args.clone())
                .await?
                .print()
        }

        Command::Delete(delete_args) => {
            let session = Session::open(Config::load(home).await?, mode, user).await?;
            commands::delete(&session, delete_args.clone())
                .await?
                .print()
        }

        Command::Summary => {
            let session = Session::open(Config::load(home).await?, mode, user).await?;
            commands::summary(&session).await?.print()
        }

        Command::Budget(budget_args) => {
            let mut session = Session::open(Config::load(home).await?, mode, user).await?;
            commands::budget(&mut session, budget_args.clone())
                .await?
                .print()
        }
    };
    Ok(())
}

/// Initializes the tracing subscriber.
pub fn init_logger(level: LevelFilter) {
    let filter = match std::env::var("RUST_LOG").ok() {
        Some(_) => {
            // RUST_LOG exists; use it.
            EnvFilter::from_default_env()
        }
        None => {
            // RUST_LOG does not exist; use default log level for this crate only.
            EnvFilter::new(format!(
                "{}={},{}={}",
                env!("CARGO_CRATE_NAME"),
                level,
                env!("CARGO_BIN_NAME"),
                level
            ))
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}
