use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::EnvFilter;

use cometa_cli::commands::{change, day, history, roster, week};
use cometa_cli::{Cli, Commands, Config};

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
        .with_writer(std::io::stderr)
        .try_init();

    let config = Config::load_from(cli.config.as_deref()).context("failed to load configuration")?;
    tracing::debug!(?config, "loaded configuration");

    let mut stdout = std::io::stdout().lock();
    match &cli.command {
        Some(Commands::Day(args)) => day::run(&mut stdout, args, &config)?,
        Some(Commands::Week(args)) => week::run(&mut stdout, args, &config)?,
        Some(Commands::Change(args)) => change::run(&mut stdout, args, &config)?,
        Some(Commands::Edit(args)) => change::edit(&mut stdout, args, &config)?,
        Some(Commands::Revert(args)) => change::revert(&mut stdout, args, &config)?,
        Some(Commands::History(args)) => history::run(&mut stdout, args, &config)?,
        Some(Commands::Classroom { action }) => roster::classroom(&mut stdout, action, &config)?,
        Some(Commands::Child { action }) => roster::child(&mut stdout, action, &config)?,
        None => {
            // No subcommand, show help
            use clap::CommandFactory;
            Cli::command().print_help()?;
            println!();
        }
    }

    Ok(())
}
