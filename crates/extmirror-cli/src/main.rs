//! CLI entry point - the composition root.

use std::process::ExitCode;

use clap::{CommandFactory, Parser};
use tracing_subscriber::EnvFilter;

use extmirror_cli::{Cli, CliError, Commands, handlers};

fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

async fn dispatch(command: Commands) -> Result<(), CliError> {
    match command {
        Commands::Download(cmd) => handlers::download::execute(&cmd).await.map(|_| ()),
        Commands::Inventory(cmd) => handlers::inventory::execute(&cmd).await.map(|_| ()),
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    // Load environment variables before clap reads EXTMIRROR_*
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let Some(command) = cli.command else {
        Cli::command().print_help()?;
        return Ok(ExitCode::SUCCESS);
    };

    match dispatch(command).await {
        Ok(()) => Ok(ExitCode::SUCCESS),
        Err(err) => {
            eprintln!("Error: {err}");
            Ok(ExitCode::from(u8::try_from(err.exit_code()).unwrap_or(1)))
        }
    }
}
