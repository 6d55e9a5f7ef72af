use clap::Parser;
use gastos_ledger::args::{Args, Command};
use gastos_ledger::{commands, Config, Mode, Result};
use std::process::ExitCode;
use tracing::{debug, error, trace};
use tracing_subscriber::filter::LevelFilter;
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
            error!("Exiting with error: {e}");
            ExitCode::FAILURE
        }
    }
}

pub async fn main_inner(args: Args) -> Result<()> {
    trace!("{args:?}");
    let home = args.common().gastos_home().path();

    // This allows for testing the program without hitting the Google APIs.
    // When GASTOS_LEDGER_IN_TEST_MODE is set and non-zero in length, the
    // mode will be Mode::Test, otherwise it will be Mode::Google.
    let mode = Mode::from_env();
    debug!("Store mode: {mode}");

    // Route to appropriate command handler
    let _: () = match args.command() {
        Command::Init(init_args) => {
            commands::init(home, init_args.credentials(), init_args.spreadsheets())
                .await?
                .print()
        }

        Command::Years => commands::years(Config::load(home).await?, mode).await?.print(),

        Command::Annual => commands::annual(Config::load(home).await?, mode)
            .await?
            .print(),

        Command::Months(months_args) => {
            commands::months(Config::load(home).await?, mode, months_args.year())
                .await?
                .print()
        }

        Command::Expenses(month_args) => commands::expenses(
            Config::load(home).await?,
            mode,
            month_args.year(),
            month_args.month(),
        )
        .await?
        .print(),

        Command::Summary(month_args) => commands::summary(
            Config::load(home).await?,
            mode,
            month_args.year(),
            month_args.month(),
        )
        .await?
        .print(),

        Command::Add(add_args) => {
            commands::add(Config::load(home).await?, mode, add_args.clone())
                .await?
                .print()
        }

        Command::Edit(edit_args) => {
            commands::edit(Config::load(home).await?, mode, edit_args.clone())
                .await?
                .print()
        }

        Command::Delete(delete_args) => {
            commands::delete(Config::load(home).await?, mode, delete_args.clone())
                .await?
                .print()
        }

        Command::Pension(pension_args) => {
            commands::pension(Config::load(home).await?, mode, pension_args.clone())
                .await?
                .print()
        }

        Command::CacheClear => commands::cache_clear(Config::load(home).await?)
            .await?
            .print(),
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
