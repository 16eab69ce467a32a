use std::io;

use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::EnvFilter;

use gtm_cli::commands::record::RecordArgs;
use gtm_cli::commands::{commit, init, record, report, status};
use gtm_cli::{Cli, Commands};
use gtm_core::SystemClock;

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize tracing with verbose flag support
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::from_default_env()
    };
    // Use try_init to avoid panic if tracing is already initialized (e.g., in tests)
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .try_init();

    let cwd = std::env::current_dir().context("failed to read current directory")?;
    let config_path = cli.config.as_deref();
    let mut stdout = io::stdout().lock();

    match cli.command {
        Some(Commands::Init) => init::run(&mut stdout, &cwd, config_path)?,
        Some(Commands::Record {
            terminal,
            status: print_status,
            file,
        }) => {
            let args = RecordArgs {
                terminal,
                status: print_status,
                file,
            };
            record::run(&mut stdout, &SystemClock, &cwd, config_path, &args)?;
        }
        Some(Commands::Commit { rev }) => commit::run(&mut stdout, &cwd, config_path, &rev)?,
        Some(Commands::Status { total_only, json }) => {
            status::run(&mut stdout, &cwd, config_path, total_only, json)?;
        }
        Some(Commands::Report { rev, json }) => {
            report::run(&mut stdout, &cwd, config_path, &rev, json)?;
        }
        None => {
            // No subcommand, show help
            use clap::CommandFactory;
            Cli::command().print_help()?;
            println!();
        }
    }

    Ok(())
}
