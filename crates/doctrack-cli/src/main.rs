//! CLI entry point - the composition root.
//!
//! Settings are resolved and the context is bootstrapped here; command
//! dispatch routes to handlers which delegate to `doctrack-store`.

use std::process::ExitCode;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use doctrack_cli::{Cli, CliError, Commands, bootstrap, handlers, load_settings};

fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn run(cli: Cli) -> anyhow::Result<ExitCode> {
    let Some(command) = cli.command.as_ref() else {
        use clap::CommandFactory;
        Cli::command().print_help()?;
        return Ok(ExitCode::SUCCESS);
    };

    let settings = load_settings(&cli)?;
    let ctx = bootstrap(settings)?;

    match command {
        Commands::Add { id, file, filename } => {
            handlers::add::execute(&ctx, id, file, filename.as_deref())?;
        }
        Commands::List => {
            handlers::list::execute(&ctx)?;
        }
        Commands::Verify => {
            let report = handlers::verify::execute(&ctx)?;
            if !report.is_clean() {
                return Ok(ExitCode::FAILURE);
            }
        }
        Commands::Cleanup { steps, .. } => {
            handlers::cleanup::execute(&ctx, steps.as_deref())?;
        }
        Commands::Report => {
            handlers::report::execute(&ctx)?;
        }
    }

    Ok(ExitCode::SUCCESS)
}

fn main() -> ExitCode {
    // Load environment variables before clap reads `env` defaults
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match run(cli) {
        Ok(code) => code,
        Err(err) => {
            eprintln!("Error: {err:#}");
            let code = err
                .downcast_ref::<CliError>()
                .map_or(1, CliError::exit_code);
            ExitCode::from(u8::try_from(code).unwrap_or(1))
        }
    }
}
