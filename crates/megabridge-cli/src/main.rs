//! CLI entry point.
//!
//! Loads `.env`, parses arguments, initialises logging and dispatches to a
//! handler. Errors are printed once here and mapped to an exit code.

use std::process::ExitCode;

use clap::{CommandFactory, Parser};
use megabridge_cli::handlers::{self, download::DownloadArgs};
use megabridge_cli::{Cli, CliConfig, CliError, Commands, bootstrap};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> ExitCode {
    // Load environment variables before clap reads its `env` fallbacks
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    init_logging(cli.verbose);

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("Error: {err}");
            ExitCode::from(err.exit_code())
        }
    }
}

/// `-v` forces debug output; otherwise `RUST_LOG` decides, defaulting to
/// warnings only.
fn init_logging(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

async fn run(cli: Cli) -> Result<(), CliError> {
    let Some(command) = cli.command else {
        // No command provided - show help
        Cli::command().print_help()?;
        return Ok(());
    };

    let megatools = bootstrap(CliConfig {
        executable: cli.executable,
    })?;

    match command {
        Commands::Download {
            url,
            path,
            limit_speed,
            username,
            password,
            proxy,
            disable_resume,
            no_progress,
            raw,
            json,
        } => {
            let args = DownloadArgs {
                url,
                path,
                limit_speed,
                username,
                password,
                proxy,
                disable_resume,
                no_progress,
                raw,
                json,
            };
            handlers::download::execute(&megatools, args).await?;
        }
        Commands::Filename { url } => {
            handlers::filename::execute(&megatools, &url).await?;
        }
        Commands::Version => {
            handlers::version::execute(&megatools).await?;
        }
        Commands::Which => {
            handlers::which::execute(&megatools);
        }
    }

    Ok(())
}
